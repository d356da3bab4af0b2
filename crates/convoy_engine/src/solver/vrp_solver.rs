use std::time::Instant;

use convoy_providers::matrix::TravelMatrices;
use tracing::{debug, info, warn};

use crate::problem::routing_problem::Problem;

use super::{
    construction::parallel_cheapest_insertion,
    guided::ArcPenalties,
    local_search::descent,
    params::{SMALL_PROBLEM_BUDGET, SMALL_PROBLEM_LOCATIONS, SolverParams},
    solution::Solution,
    working_solution::WorkingSolution,
};

/// Anytime VRP solver: parallel cheapest insertion for the first solution,
/// then plain descent on small problems or guided local search under the
/// caller's wall-clock budget on larger ones.
pub struct VrpSolver<'a> {
    problem: &'a Problem,
    matrices: &'a TravelMatrices,
}

impl<'a> VrpSolver<'a> {
    pub fn new(problem: &'a Problem, matrices: &'a TravelMatrices) -> Self {
        VrpSolver { problem, matrices }
    }

    pub fn solve(&self, params: SolverParams) -> Option<Solution> {
        let started = Instant::now();

        let mut working = match WorkingSolution::empty(self.problem, self.matrices) {
            Ok(working) => working,
            Err(violation) => {
                warn!("no feasible solution: {violation}");
                return None;
            }
        };

        parallel_cheapest_insertion(self.problem, self.matrices, &mut working);
        debug!(
            assigned = working.num_assigned(),
            dropped = working.unassigned().len(),
            "first solution constructed"
        );

        let small = self.problem.num_locations() < SMALL_PROBLEM_LOCATIONS;
        let budget = if small {
            SMALL_PROBLEM_BUDGET
        } else {
            params.time_budget
        };
        let deadline = started + budget;

        let best = if small {
            descent(self.problem, self.matrices, &mut working, None, deadline);
            working
        } else {
            self.guided_search(working, deadline)
        };

        info!(
            routes = best.routes().iter().filter(|r| !r.is_empty()).count(),
            dropped = best.unassigned().len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "search finished"
        );

        Some(Solution::extract(self.problem, self.matrices, &best))
    }

    fn guided_search(&self, mut working: WorkingSolution, deadline: Instant) -> WorkingSolution {
        descent(self.problem, self.matrices, &mut working, None, deadline);

        let mut best = working.clone();
        let mut best_cost = best.cost(self.problem);

        // Scale the penalty weight to the average arc cost of the first
        // local optimum.
        let goal = self.problem.goal();
        let transit: i64 = working
            .schedules()
            .iter()
            .map(|schedule| WorkingSolution::route_dimension_total(schedule, goal))
            .sum();
        let num_arcs = working.arcs().count().max(1) as i64;
        let lambda = (transit / (10 * num_arcs)).max(1);

        let mut penalties = ArcPenalties::new(self.problem.num_locations(), lambda);

        while Instant::now() < deadline {
            penalties.penalize_worst(&working, self.matrices, goal);
            descent(
                self.problem,
                self.matrices,
                &mut working,
                Some(&penalties),
                deadline,
            );

            let cost = working.cost(self.problem);
            if cost < best_cost {
                best = working.clone();
                best_cost = cost;
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::job::Priority;
    use crate::test_utils::{self, minutes};

    fn quick_params() -> SolverParams {
        SolverParams::with_budget_seconds(2)
    }

    #[test]
    fn test_single_job_single_driver() {
        let problem = test_utils::problem_with_jobs(1, minutes(5), test_utils::driver_9_to_5());
        let matrices = test_utils::symmetric_matrices(2, 3000, minutes(10));

        let solution = VrpSolver::new(&problem, &matrices)
            .solve(quick_params())
            .unwrap();

        assert_eq!(solution.routes.len(), 1);
        assert_eq!(solution.routes[0].stops.len(), 1);
        assert!(solution.unassigned_job_ids.is_empty());
    }

    #[test]
    fn test_happy_two_stop_route() {
        // Two jobs, symmetric 10-minute legs, 5 minutes of service each:
        // 09:00 depot, 09:10 J1, 09:25 J2, 09:40 back.
        let problem = test_utils::problem_with_jobs(2, minutes(5), test_utils::driver_9_to_5());
        let matrices = test_utils::symmetric_matrices(3, 5000, minutes(10));

        let solution = VrpSolver::new(&problem, &matrices)
            .solve(quick_params())
            .unwrap();

        assert_eq!(solution.routes.len(), 1);
        let route = &solution.routes[0];
        assert_eq!(route.duration_seconds, 2400);
        assert_eq!(route.start_time_seconds, 9 * 3600);
        assert_eq!(route.end_time_seconds, 9 * 3600 + minutes(40));
        assert!(solution.unassigned_job_ids.is_empty());
    }

    #[test]
    fn test_infeasible_shift_returns_none() {
        let driver = test_utils::driver_with_hours(17 * 3600, 9 * 3600, false);
        let problem = test_utils::problem_with_jobs(1, 0, driver);
        let matrices = test_utils::symmetric_matrices(2, 1000, minutes(10));

        assert!(VrpSolver::new(&problem, &matrices).solve(quick_params()).is_none());
    }

    #[test]
    fn test_job_outside_working_hours_is_dropped() {
        let mut problem =
            test_utils::problem_with_jobs(2, minutes(5), test_utils::driver_9_to_5());
        test_utils::set_time_window(&mut problem, 0, 2 * 3600, 3 * 3600);
        let matrices = test_utils::symmetric_matrices(3, 5000, minutes(10));

        let solution = VrpSolver::new(&problem, &matrices)
            .solve(quick_params())
            .unwrap();

        // Job ids are 101, 102; the 02:00-03:00 window on job 101 is
        // unreachable from a 9-to-5 shift.
        assert_eq!(solution.unassigned_job_ids, vec![101]);
        assert_eq!(solution.routes.len(), 1);
        assert_eq!(solution.routes[0].stops.len(), 1);
        assert_eq!(solution.routes[0].stops[0].job_id, 102);
    }

    #[test]
    fn test_high_priority_job_survives_expensive_leg() {
        let mut problem =
            test_utils::problem_with_jobs(3, minutes(5), test_utils::driver_9_to_5());
        test_utils::set_priority(&mut problem, 2, Priority::High);
        let mut matrices = test_utils::symmetric_matrices(4, 5000, minutes(10));
        // Job 3 (index 3) is a 30-minute detour from everything.
        for other in 0..3 {
            matrices.set(other, 3, 20_000, minutes(30));
            matrices.set(3, other, 20_000, minutes(30));
        }

        let solution = VrpSolver::new(&problem, &matrices)
            .solve(quick_params())
            .unwrap();

        let assigned: Vec<i64> = solution
            .routes
            .iter()
            .flat_map(|route| route.stops.iter().map(|stop| stop.job_id))
            .collect();
        assert!(assigned.contains(&103));
    }

    #[test]
    fn test_larger_problem_assigns_everything() {
        // 13 locations crosses into the guided-local-search path.
        let problem = test_utils::problem_with_jobs(12, minutes(5), test_utils::driver_9_to_5());
        let matrices = test_utils::symmetric_matrices(13, 2000, minutes(5));

        let solution = VrpSolver::new(&problem, &matrices)
            .solve(SolverParams::with_budget_seconds(1))
            .unwrap();

        assert!(solution.unassigned_job_ids.is_empty());
    }

    #[test]
    fn test_savings_are_non_negative() {
        let problem = test_utils::problem_with_jobs(3, minutes(5), test_utils::driver_9_to_5());
        let matrices = test_utils::symmetric_matrices(4, 4000, minutes(12));

        let solution = VrpSolver::new(&problem, &matrices)
            .solve(quick_params())
            .unwrap();

        for route in &solution.routes {
            assert!(route.saved_distance_meters >= 0);
            assert!(route.saved_time_seconds >= 0);
        }
    }
}
