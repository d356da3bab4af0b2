use geo_types::Point;
use sqlx::FromRow;

/// Depot row with its PostGIS point projected to plain coordinates
/// (`ST_X`/`ST_Y` aliases in every query).
#[derive(Debug, Clone, FromRow)]
pub struct DepotRow {
    pub id: i64,
    pub tenant_id: i64,
    pub name: String,
    pub lng: Option<f64>,
    pub lat: Option<f64>,
    pub address: Option<String>,
}

impl DepotRow {
    pub fn location(&self) -> Option<Point<f64>> {
        match (self.lng, self.lat) {
            (Some(lng), Some(lat)) => Some(Point::new(lng, lat)),
            _ => None,
        }
    }
}
