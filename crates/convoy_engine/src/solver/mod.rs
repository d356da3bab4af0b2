pub mod construction;
pub mod guided;
pub mod local_search;
pub mod params;
pub mod schedule;
pub mod solution;
pub mod vrp_solver;
pub mod working_solution;
