use std::time::Instant;

use convoy_providers::matrix::TravelMatrices;

use crate::problem::routing_problem::Problem;

use super::{
    guided::ArcPenalties,
    schedule::{RouteSchedule, compute_schedule},
    working_solution::WorkingSolution,
};

/// A feasible candidate move: replacement routes with their schedules and
/// the objective delta (augmented with GLS penalties when active).
struct EvaluatedMove {
    replacements: Vec<(usize, Vec<usize>, RouteSchedule)>,
    delta_augmented: i64,
}

#[derive(Default)]
struct MoveTracker {
    best: Option<EvaluatedMove>,
}

impl MoveTracker {
    fn consider(&mut self, candidate: EvaluatedMove) {
        if self
            .best
            .as_ref()
            .is_none_or(|best| candidate.delta_augmented < best.delta_augmented)
        {
            self.best = Some(candidate);
        }
    }
}

/// Best-improvement descent over relocate, swap, intra-route two-opt and
/// reinsertion of dropped jobs. When `penalties` is given the move ranking
/// uses the GLS-augmented objective. Returns whether anything improved.
pub fn descent(
    problem: &Problem,
    matrices: &TravelMatrices,
    solution: &mut WorkingSolution,
    penalties: Option<&ArcPenalties>,
    deadline: Instant,
) -> bool {
    let mut improved_any = false;

    loop {
        if Instant::now() >= deadline {
            break;
        }

        let current_augmented = solution.cost(problem)
            + penalties.map_or(0, |p| p.lambda() * p.solution_penalty(solution));

        let Some(best) = best_move(
            problem,
            matrices,
            solution,
            penalties,
            current_augmented,
            deadline,
        ) else {
            break;
        };

        if best.delta_augmented >= 0 {
            break;
        }

        for (driver_idx, jobs, schedule) in best.replacements {
            solution.set_route(driver_idx, jobs, schedule);
        }

        improved_any = true;
    }

    improved_any
}

fn evaluate(
    problem: &Problem,
    solution: &WorkingSolution,
    penalties: Option<&ArcPenalties>,
    current_augmented: i64,
    replacements: Vec<(usize, Vec<usize>, RouteSchedule)>,
    newly_assigned: Option<usize>,
) -> EvaluatedMove {
    let refs: Vec<(usize, &RouteSchedule)> = replacements
        .iter()
        .map(|(driver_idx, _, schedule)| (*driver_idx, schedule))
        .collect();
    let assigned: Vec<usize> = newly_assigned.into_iter().collect();

    let mut new_cost = solution.cost_with(problem, &refs, &assigned, &[]);

    if let Some(penalties) = penalties {
        let mut penalty = penalties.solution_penalty(solution);
        for (driver_idx, jobs, _) in &replacements {
            penalty -= penalties.route_penalty(solution.route(*driver_idx));
            penalty += penalties.route_penalty(jobs);
        }
        new_cost += penalties.lambda() * penalty;
    }

    EvaluatedMove {
        replacements,
        delta_augmented: new_cost - current_augmented,
    }
}

fn best_move(
    problem: &Problem,
    matrices: &TravelMatrices,
    solution: &WorkingSolution,
    penalties: Option<&ArcPenalties>,
    current_augmented: i64,
    deadline: Instant,
) -> Option<EvaluatedMove> {
    let mut tracker = MoveTracker::default();

    let try_route = |driver_idx: usize, jobs: &[usize]| -> Option<RouteSchedule> {
        compute_schedule(jobs, problem.driver(driver_idx), problem, matrices).ok()
    };

    // Reinsertion of dropped jobs.
    let unassigned: Vec<usize> = solution.unassigned().iter().copied().collect();
    for &job_index in &unassigned {
        for (driver_idx, route) in solution.routes().iter().enumerate() {
            for position in 0..=route.len() {
                let mut jobs = route.clone();
                jobs.insert(position, job_index);

                if let Some(schedule) = try_route(driver_idx, &jobs) {
                    tracker.consider(evaluate(
                        problem,
                        solution,
                        penalties,
                        current_augmented,
                        vec![(driver_idx, jobs, schedule)],
                        Some(job_index),
                    ));
                }
            }
        }

        if Instant::now() >= deadline {
            return tracker.best;
        }
    }

    // Relocate, within and across routes.
    for (from_route, route) in solution.routes().iter().enumerate() {
        for from_pos in 0..route.len() {
            let job_index = route[from_pos];

            let mut source = route.clone();
            source.remove(from_pos);

            for (to_route, target) in solution.routes().iter().enumerate() {
                if to_route == from_route {
                    for to_pos in 0..=source.len() {
                        if to_pos == from_pos {
                            continue;
                        }

                        let mut jobs = source.clone();
                        jobs.insert(to_pos, job_index);

                        if let Some(schedule) = try_route(from_route, &jobs) {
                            tracker.consider(evaluate(
                                problem,
                                solution,
                                penalties,
                                current_augmented,
                                vec![(from_route, jobs, schedule)],
                                None,
                            ));
                        }
                    }
                } else {
                    let Some(source_schedule) = try_route(from_route, &source) else {
                        continue;
                    };

                    for to_pos in 0..=target.len() {
                        let mut jobs = target.clone();
                        jobs.insert(to_pos, job_index);

                        if let Some(schedule) = try_route(to_route, &jobs) {
                            tracker.consider(evaluate(
                                problem,
                                solution,
                                penalties,
                                current_augmented,
                                vec![
                                    (from_route, source.clone(), source_schedule.clone()),
                                    (to_route, jobs, schedule),
                                ],
                                None,
                            ));
                        }
                    }
                }
            }
        }

        if Instant::now() >= deadline {
            return tracker.best;
        }
    }

    // Swap two jobs between (or within) routes.
    for (route_a, jobs_a) in solution.routes().iter().enumerate() {
        for pos_a in 0..jobs_a.len() {
            for (route_b, jobs_b) in solution.routes().iter().enumerate().skip(route_a) {
                let start_b = if route_a == route_b { pos_a + 1 } else { 0 };

                for pos_b in start_b..jobs_b.len() {
                    if route_a == route_b {
                        let mut jobs = jobs_a.clone();
                        jobs.swap(pos_a, pos_b);

                        if let Some(schedule) = try_route(route_a, &jobs) {
                            tracker.consider(evaluate(
                                problem,
                                solution,
                                penalties,
                                current_augmented,
                                vec![(route_a, jobs, schedule)],
                                None,
                            ));
                        }
                    } else {
                        let mut new_a = jobs_a.clone();
                        let mut new_b = jobs_b.clone();
                        std::mem::swap(&mut new_a[pos_a], &mut new_b[pos_b]);

                        let Some(schedule_a) = try_route(route_a, &new_a) else {
                            continue;
                        };
                        let Some(schedule_b) = try_route(route_b, &new_b) else {
                            continue;
                        };

                        tracker.consider(evaluate(
                            problem,
                            solution,
                            penalties,
                            current_augmented,
                            vec![(route_a, new_a, schedule_a), (route_b, new_b, schedule_b)],
                            None,
                        ));
                    }
                }
            }
        }

        if Instant::now() >= deadline {
            return tracker.best;
        }
    }

    // Intra-route two-opt (segment reversal).
    for (route_idx, route) in solution.routes().iter().enumerate() {
        for from in 0..route.len() {
            for to in (from + 1)..route.len() {
                let mut jobs = route.clone();
                jobs[from..=to].reverse();

                if let Some(schedule) = try_route(route_idx, &jobs) {
                    tracker.consider(evaluate(
                        problem,
                        solution,
                        penalties,
                        current_augmented,
                        vec![(route_idx, jobs, schedule)],
                        None,
                    ));
                }
            }
        }
    }

    tracker.best
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::solver::construction::parallel_cheapest_insertion;
    use crate::test_utils::{self, minutes};

    fn far_deadline() -> Instant {
        Instant::now() + Duration::from_secs(5)
    }

    #[test]
    fn test_descent_reinserts_dropped_job() {
        let problem = test_utils::problem_with_jobs(2, 0, test_utils::driver_9_to_5());
        let matrices = test_utils::symmetric_matrices(3, 1000, minutes(10));

        let mut solution = WorkingSolution::empty(&problem, &matrices).unwrap();
        let schedule =
            compute_schedule(&[1], problem.driver(0), &problem, &matrices).unwrap();
        solution.set_route(0, vec![1], schedule);

        let improved = descent(&problem, &matrices, &mut solution, None, far_deadline());

        assert!(improved);
        assert!(solution.unassigned().is_empty());
    }

    #[test]
    fn test_descent_untangles_bad_ordering() {
        // Line of jobs where visiting 2 before 1 is clearly worse.
        let problem = test_utils::problem_with_jobs(2, 0, test_utils::driver_9_to_5());
        let mut matrices = test_utils::symmetric_matrices(3, 1000, minutes(10));
        matrices.set(0, 1, 1000, minutes(5));
        matrices.set(1, 0, 1000, minutes(5));
        matrices.set(0, 2, 4000, minutes(20));
        matrices.set(2, 0, 4000, minutes(20));
        matrices.set(1, 2, 2000, minutes(10));
        matrices.set(2, 1, 2000, minutes(10));

        let mut solution = WorkingSolution::empty(&problem, &matrices).unwrap();
        let schedule =
            compute_schedule(&[2, 1], problem.driver(0), &problem, &matrices).unwrap();
        solution.set_route(0, vec![2, 1], schedule);

        descent(&problem, &matrices, &mut solution, None, far_deadline());

        assert_eq!(solution.route(0), &[1, 2]);
    }

    #[test]
    fn test_descent_balances_two_drivers() {
        let drivers = vec![test_utils::driver_9_to_5(), test_utils::driver_9_to_5()];
        let problem = test_utils::problem_with_jobs_and_drivers(4, minutes(30), drivers);
        let matrices = test_utils::symmetric_matrices(5, 1000, minutes(20));

        let mut solution = WorkingSolution::empty(&problem, &matrices).unwrap();
        parallel_cheapest_insertion(&problem, &matrices, &mut solution);
        descent(&problem, &matrices, &mut solution, None, far_deadline());

        assert!(solution.unassigned().is_empty());
        // The global span term pushes work onto both drivers.
        assert!(!solution.route(0).is_empty());
        assert!(!solution.route(1).is_empty());
    }
}
