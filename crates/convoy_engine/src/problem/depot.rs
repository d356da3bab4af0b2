use geo_types::Point;

/// Origin and terminus of every route in a request.
#[derive(Debug, Clone)]
pub struct DepotView {
    id: i64,
    name: String,
    location: Point<f64>,
}

impl DepotView {
    pub fn new(id: i64, name: String, location: Point<f64>) -> Self {
        DepotView { id, name, location }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> Point<f64> {
        self.location
    }
}
