use convoy_providers::vehicle_type::VehicleType;

#[derive(Debug, Clone)]
pub struct VehicleView {
    id: i64,
    vehicle_type: VehicleType,
}

impl VehicleView {
    pub fn new(id: i64, vehicle_type: VehicleType) -> Self {
        VehicleView { id, vehicle_type }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn vehicle_type(&self) -> VehicleType {
        self.vehicle_type
    }
}
