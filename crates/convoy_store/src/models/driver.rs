use chrono::NaiveTime;
use sqlx::FromRow;

/// Default break length when a driver has a break window but no explicit
/// duration.
pub const DEFAULT_BREAK_MINUTES: i32 = 30;

#[derive(Debug, Clone, FromRow)]
pub struct DriverRow {
    pub id: i64,
    pub tenant_id: i64,
    pub vehicle_id: Option<i64>,
    pub name: String,
    pub work_start_time: Option<NaiveTime>,
    pub work_end_time: Option<NaiveTime>,
    pub allowed_overtime: bool,
    pub max_distance_km: Option<f64>,
    pub break_time_start: Option<NaiveTime>,
    pub break_time_end: Option<NaiveTime>,
    pub break_duration_minutes: Option<i32>,
    pub skills: Option<Vec<String>>,
}
