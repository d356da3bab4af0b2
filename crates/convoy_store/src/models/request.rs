use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "optimization_goal", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OptimizationGoal {
    MinTime,
    MinDistance,
}

impl From<OptimizationGoal> for convoy_engine::problem::goal::Goal {
    fn from(goal: OptimizationGoal) -> Self {
        match goal {
            OptimizationGoal::MinTime => convoy_engine::problem::goal::Goal::MinTime,
            OptimizationGoal::MinDistance => convoy_engine::problem::goal::Goal::MinDistance,
        }
    }
}

impl From<convoy_engine::problem::goal::Goal> for OptimizationGoal {
    fn from(goal: convoy_engine::problem::goal::Goal) -> Self {
        match goal {
            convoy_engine::problem::goal::Goal::MinTime => OptimizationGoal::MinTime,
            convoy_engine::problem::goal::Goal::MinDistance => OptimizationGoal::MinDistance,
        }
    }
}

/// `queued -> processing -> (completed | failed)`. Terminal states are
/// immutable except for the display name.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "optimization_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OptimizationStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl OptimizationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OptimizationStatus::Completed | OptimizationStatus::Failed
        )
    }
}

/// A snapshot of what was submitted: `job_ids` and `driver_ids` are the
/// arrays given at submission time, not re-derived from job rows.
#[derive(Debug, Clone, FromRow)]
pub struct OptimizationRequestRow {
    pub id: i64,
    pub tenant_id: i64,
    pub route_name: String,
    pub depot_id: i64,
    pub job_ids: Vec<i64>,
    pub driver_ids: Vec<i64>,
    pub scheduled_date: NaiveDate,
    pub goal: OptimizationGoal,
    pub status: OptimizationStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub result: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parameters of a new request, written by the submitter.
#[derive(Debug, Clone)]
pub struct NewOptimizationRequest {
    pub route_name: String,
    pub depot_id: i64,
    pub job_ids: Vec<i64>,
    pub driver_ids: Vec<i64>,
    pub scheduled_date: NaiveDate,
    pub goal: OptimizationGoal,
}
