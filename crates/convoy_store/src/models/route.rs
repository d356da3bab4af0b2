use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "route_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RouteStatus {
    Scheduled,
    InTransit,
    Completed,
    Failed,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "stop_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StopType {
    DepotStart,
    Job,
    DepotEnd,
}

#[derive(Debug, Clone, FromRow)]
pub struct RouteRow {
    pub id: i64,
    pub tenant_id: i64,
    pub optimization_request_id: i64,
    pub driver_id: Option<i64>,
    pub vehicle_id: Option<i64>,
    pub depot_id: Option<i64>,
    pub status: RouteStatus,
    pub scheduled_date: Option<NaiveDate>,
    pub total_distance_meters: f64,
    pub total_duration_seconds: f64,
    pub total_distance_saved_meters: f64,
    pub total_time_saved_seconds: f64,
    pub route_polyline: Option<String>,
}

/// Stops of a route form a contiguous `0..n-1` sequence: `depot_start`,
/// then jobs, then `depot_end`.
#[derive(Debug, Clone, FromRow)]
pub struct RouteStopRow {
    pub id: i64,
    pub route_id: i64,
    pub job_id: Option<i64>,
    pub sequence_order: i32,
    pub stop_type: StopType,
    pub planned_arrival_time: Option<NaiveDateTime>,
    pub planned_departure_time: Option<NaiveDateTime>,
    pub estimated_distance_from_prev: Option<f64>,
}
