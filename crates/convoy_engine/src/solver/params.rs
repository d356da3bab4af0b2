use std::time::Duration;

/// Problems below this many locations (depot included) skip guided local
/// search and run a plain descent with a short cap.
pub const SMALL_PROBLEM_LOCATIONS: usize = 12;

pub const SMALL_PROBLEM_BUDGET: Duration = Duration::from_secs(5);

#[derive(Debug, Copy, Clone)]
pub struct SolverParams {
    /// Wall-clock budget for the search once a first solution exists.
    pub time_budget: Duration,
}

impl Default for SolverParams {
    fn default() -> Self {
        SolverParams {
            time_budget: Duration::from_secs(30),
        }
    }
}

impl SolverParams {
    pub fn with_budget_seconds(seconds: u64) -> Self {
        SolverParams {
            time_budget: Duration::from_secs(seconds),
        }
    }
}
