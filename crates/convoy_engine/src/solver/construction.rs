use convoy_providers::matrix::TravelMatrices;
use rayon::prelude::*;

use crate::problem::routing_problem::Problem;

use super::{
    schedule::{RouteSchedule, compute_schedule},
    working_solution::WorkingSolution,
};

struct Insertion {
    job_index: usize,
    driver_idx: usize,
    jobs: Vec<usize>,
    schedule: RouteSchedule,
    delta: i64,
}

/// First-solution strategy: repeatedly insert the globally cheapest feasible
/// (job, route, position) triple until nothing fits anymore. Candidate
/// evaluation fans out across jobs.
pub fn parallel_cheapest_insertion(
    problem: &Problem,
    matrices: &TravelMatrices,
    solution: &mut WorkingSolution,
) {
    loop {
        let unassigned: Vec<usize> = solution.unassigned().iter().copied().collect();
        if unassigned.is_empty() {
            break;
        }

        let best = unassigned
            .par_iter()
            .filter_map(|&job_index| best_insertion_for_job(problem, matrices, solution, job_index))
            .min_by_key(|insertion| insertion.delta);

        let Some(best) = best else {
            break;
        };

        solution.set_route(best.driver_idx, best.jobs, best.schedule);
    }
}

fn best_insertion_for_job(
    problem: &Problem,
    matrices: &TravelMatrices,
    solution: &WorkingSolution,
    job_index: usize,
) -> Option<Insertion> {
    let goal = problem.goal();
    let mut best: Option<Insertion> = None;

    for (driver_idx, route) in solution.routes().iter().enumerate() {
        let current =
            WorkingSolution::route_dimension_total(solution.schedule(driver_idx), goal);

        for position in 0..=route.len() {
            let mut jobs = route.clone();
            jobs.insert(position, job_index);

            let Ok(schedule) =
                compute_schedule(&jobs, problem.driver(driver_idx), problem, matrices)
            else {
                continue;
            };

            let delta = WorkingSolution::route_dimension_total(&schedule, goal) - current;

            if best.as_ref().is_none_or(|b| delta < b.delta) {
                best = Some(Insertion {
                    job_index,
                    driver_idx,
                    jobs,
                    schedule,
                    delta,
                });
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{self, minutes};

    #[test]
    fn test_insertion_assigns_everything_that_fits() {
        let problem = test_utils::problem_with_jobs(3, minutes(5), test_utils::driver_9_to_5());
        let matrices = test_utils::symmetric_matrices(4, 2000, minutes(10));

        let mut solution = WorkingSolution::empty(&problem, &matrices).unwrap();
        parallel_cheapest_insertion(&problem, &matrices, &mut solution);

        assert!(solution.unassigned().is_empty());
        assert_eq!(solution.num_assigned(), 3);
    }

    #[test]
    fn test_insertion_leaves_unreachable_job_dropped() {
        let problem = test_utils::problem_with_jobs(2, minutes(5), test_utils::driver_9_to_5());
        let mut matrices = test_utils::symmetric_matrices(3, 2000, minutes(10));
        matrices = test_utils::cut_off_location(matrices, 3, 2);

        let mut solution = WorkingSolution::empty(&problem, &matrices).unwrap();
        parallel_cheapest_insertion(&problem, &matrices, &mut solution);

        assert_eq!(solution.num_assigned(), 1);
        assert!(solution.unassigned().contains(&2));
    }
}
