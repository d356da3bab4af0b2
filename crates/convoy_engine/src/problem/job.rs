use geo_types::Point;
use serde::{Deserialize, Serialize};

use super::time_window::TimeWindow;

/// Penalty paid by the solver for leaving a job unserved. Orders of magnitude
/// above any plausible routing gain so that high-priority jobs are only
/// dropped when genuinely infeasible.
#[derive(Deserialize, Serialize, Debug, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn drop_penalty(&self) -> i64 {
        match self {
            Priority::High => 10_000_000,
            Priority::Medium => 5_000_000,
            Priority::Low => 1_000_000,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

#[derive(Debug, Clone)]
pub struct JobView {
    id: i64,
    location: Point<f64>,
    address: Option<String>,
    time_window: Option<TimeWindow>,
    service_duration: i64,
    priority: Priority,
}

impl JobView {
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn location(&self) -> Point<f64> {
        self.location
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn time_window(&self) -> Option<&TimeWindow> {
        self.time_window.as_ref()
    }

    /// Service time at the job location, in seconds.
    pub fn service_duration(&self) -> i64 {
        self.service_duration
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }
}

#[derive(Default)]
pub struct JobViewBuilder {
    id: Option<i64>,
    location: Option<Point<f64>>,
    address: Option<String>,
    time_window: Option<TimeWindow>,
    service_duration: Option<i64>,
    priority: Option<Priority>,
}

impl JobViewBuilder {
    pub fn set_id(&mut self, id: i64) -> &mut JobViewBuilder {
        self.id = Some(id);
        self
    }

    pub fn set_location(&mut self, location: Point<f64>) -> &mut JobViewBuilder {
        self.location = Some(location);
        self
    }

    pub fn set_address(&mut self, address: String) -> &mut JobViewBuilder {
        self.address = Some(address);
        self
    }

    pub fn set_time_window(&mut self, time_window: TimeWindow) -> &mut JobViewBuilder {
        self.time_window = Some(time_window);
        self
    }

    pub fn set_service_duration(&mut self, service_duration: i64) -> &mut JobViewBuilder {
        self.service_duration = Some(service_duration);
        self
    }

    pub fn set_priority(&mut self, priority: Priority) -> &mut JobViewBuilder {
        self.priority = Some(priority);
        self
    }

    pub fn build(self) -> JobView {
        JobView {
            id: self.id.expect("Job ID is required"),
            location: self.location.expect("Job location is required"),
            address: self.address,
            time_window: self.time_window,
            service_duration: self.service_duration.unwrap_or(0),
            priority: self.priority.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_penalty_ordering() {
        assert!(Priority::High.drop_penalty() > Priority::Medium.drop_penalty());
        assert!(Priority::Medium.drop_penalty() > Priority::Low.drop_penalty());
    }
}
