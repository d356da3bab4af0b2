//! Shape of the `result` JSON persisted on a completed request. The
//! formatter in the service crate builds these; the persister reads them
//! back when writing route and stop rows.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{request::OptimizationGoal, route::StopType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub status: String,
    pub optimization_goal: OptimizationGoal,
    pub total_distance_meters: i64,
    pub total_duration_seconds: i64,
    pub routes: Vec<RouteResult>,
    pub unassigned_jobs: Vec<UnassignedJob>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteResult {
    pub driver_id: i64,
    pub driver_name: String,
    pub vehicle_id: Option<i64>,
    pub vehicle_type: Option<String>,
    pub total_distance_meters: i64,
    pub total_duration_seconds: i64,
    pub total_distance_saved_meters: i64,
    pub total_time_saved_seconds: i64,
    pub polyline: Option<String>,
    pub stops: Vec<StopResult>,
    pub break_info: Option<BreakInfo>,
    pub idle_blocks: Vec<IdleBlock>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopResult {
    pub stop_type: StopType,
    pub job_id: Option<i64>,
    pub arrival_time: NaiveDateTime,
    pub departure_time: Option<NaiveDateTime>,
    pub address: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub distance_to_next_stop_meters: Option<i64>,
    pub time_to_next_stop_seconds: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakInfo {
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub duration_minutes: i64,
    pub break_after_stop_index: usize,
    /// Whether the break happens at a stop location or en route between two
    /// stops.
    pub at_stop: bool,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdleBlock {
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub duration_seconds: i64,
    /// Index (into `stops`) of the stop the driver is idling ahead of.
    pub before_stop_index: usize,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnassignedJob {
    pub job_id: i64,
    pub reason: String,
    pub address: Option<String>,
}
