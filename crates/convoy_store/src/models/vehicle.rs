use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "vehicle_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VehicleTypeColumn {
    Car,
    Van,
    Truck,
    Bike,
    Scooter,
    Foot,
}

impl From<VehicleTypeColumn> for convoy_providers::vehicle_type::VehicleType {
    fn from(column: VehicleTypeColumn) -> Self {
        use convoy_providers::vehicle_type::VehicleType;

        match column {
            VehicleTypeColumn::Car => VehicleType::Car,
            VehicleTypeColumn::Van => VehicleType::Van,
            VehicleTypeColumn::Truck => VehicleType::Truck,
            VehicleTypeColumn::Bike => VehicleType::Bike,
            VehicleTypeColumn::Scooter => VehicleType::Scooter,
            VehicleTypeColumn::Foot => VehicleType::Foot,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct VehicleRow {
    pub id: i64,
    pub tenant_id: i64,
    pub name: String,
    pub vehicle_type: VehicleTypeColumn,
    pub capacity_weight: Option<f64>,
    pub capacity_volume: Option<f64>,
}
