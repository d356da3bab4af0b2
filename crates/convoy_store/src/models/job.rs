use chrono::{NaiveDate, NaiveTime};
use geo_types::Point;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Draft,
    Assigned,
    InTransit,
    Completed,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "priority_level", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PriorityLevel {
    Low,
    Medium,
    High,
}

impl From<PriorityLevel> for convoy_engine::problem::job::Priority {
    fn from(priority: PriorityLevel) -> Self {
        match priority {
            PriorityLevel::Low => convoy_engine::problem::job::Priority::Low,
            PriorityLevel::Medium => convoy_engine::problem::job::Priority::Medium,
            PriorityLevel::High => convoy_engine::problem::job::Priority::High,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct JobRow {
    pub id: i64,
    pub tenant_id: i64,
    pub status: JobStatus,
    pub scheduled_date: Option<NaiveDate>,
    pub lng: Option<f64>,
    pub lat: Option<f64>,
    pub address_formatted: Option<String>,
    pub time_window_start: Option<NaiveTime>,
    pub time_window_end: Option<NaiveTime>,
    pub service_duration_minutes: Option<i32>,
    pub priority_level: PriorityLevel,
    pub assigned_to: Option<i64>,
    pub route_id: Option<i64>,
}

impl JobRow {
    pub fn location(&self) -> Option<Point<f64>> {
        match (self.lng, self.lat) {
            (Some(lng), Some(lat)) => Some(Point::new(lng, lat)),
            _ => None,
        }
    }
}
