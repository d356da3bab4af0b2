use serde::{Deserialize, Serialize};

/// The single active objective of a request. A global span cost is attached
/// to the matching dimension; the other dimension only constrains.
#[derive(Deserialize, Serialize, Debug, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    MinTime,
    MinDistance,
}

impl Default for Goal {
    fn default() -> Self {
        Goal::MinTime
    }
}
