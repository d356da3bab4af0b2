use convoy_providers::matrix::TravelMatrices;
use fxhash::FxHashSet;

use crate::problem::{goal::Goal, routing_problem::Problem};

use super::schedule::{RouteSchedule, ScheduleViolation, compute_schedule};

/// Weight of the global span term in the objective. Applied to the time
/// dimension under `min_time` and the distance dimension under
/// `min_distance`.
pub const SPAN_COST_COEFFICIENT: i64 = 100;

/// One route per driver (job matrix indices, in visit order) plus the set of
/// dropped jobs. Schedules are kept in sync with the routes at all times.
#[derive(Clone)]
pub struct WorkingSolution {
    routes: Vec<Vec<usize>>,
    schedules: Vec<RouteSchedule>,
    unassigned: FxHashSet<usize>,
}

impl WorkingSolution {
    /// All-empty routes with every job dropped. Fails when a driver cannot
    /// even run an empty route, which is the solver's "no feasible solution"
    /// case.
    pub fn empty(problem: &Problem, matrices: &TravelMatrices) -> Result<Self, ScheduleViolation> {
        let mut schedules = Vec::with_capacity(problem.drivers().len());

        for driver in problem.drivers() {
            schedules.push(compute_schedule(&[], driver, problem, matrices)?);
        }

        Ok(WorkingSolution {
            routes: vec![Vec::new(); problem.drivers().len()],
            schedules,
            unassigned: (1..problem.num_locations()).collect(),
        })
    }

    pub fn routes(&self) -> &[Vec<usize>] {
        &self.routes
    }

    pub fn route(&self, driver_idx: usize) -> &[usize] {
        &self.routes[driver_idx]
    }

    pub fn schedule(&self, driver_idx: usize) -> &RouteSchedule {
        &self.schedules[driver_idx]
    }

    pub fn schedules(&self) -> &[RouteSchedule] {
        &self.schedules
    }

    pub fn unassigned(&self) -> &FxHashSet<usize> {
        &self.unassigned
    }

    pub fn num_assigned(&self) -> usize {
        self.routes.iter().map(|route| route.len()).sum()
    }

    /// Replaces a route wholesale. The caller is responsible for having
    /// validated `schedule` against `jobs`.
    pub fn set_route(&mut self, driver_idx: usize, jobs: Vec<usize>, schedule: RouteSchedule) {
        for &job_index in &jobs {
            self.unassigned.remove(&job_index);
        }

        self.routes[driver_idx] = jobs;
        self.schedules[driver_idx] = schedule;
    }

    pub fn drop_job(&mut self, job_index: usize) {
        self.unassigned.insert(job_index);
    }

    pub fn route_dimension_total(schedule: &RouteSchedule, goal: Goal) -> i64 {
        match goal {
            Goal::MinTime => schedule.duration_seconds(),
            Goal::MinDistance => schedule.distance_meters,
        }
    }

    fn span_of(schedules: &[&RouteSchedule], goal: Goal) -> i64 {
        match goal {
            Goal::MinTime => {
                let max_end = schedules.iter().map(|s| s.end_time).max().unwrap_or(0);
                let min_start = schedules.iter().map(|s| s.start_time).min().unwrap_or(0);
                max_end - min_start
            }
            Goal::MinDistance => schedules
                .iter()
                .map(|s| s.distance_meters)
                .max()
                .unwrap_or(0),
        }
    }

    /// Full objective: per-route totals on the goal dimension, the global
    /// span weighted by `SPAN_COST_COEFFICIENT`, and the drop penalty of
    /// every unassigned job.
    pub fn cost(&self, problem: &Problem) -> i64 {
        let schedules: Vec<&RouteSchedule> = self.schedules.iter().collect();
        self.cost_of(problem, &schedules, &self.unassigned)
    }

    fn cost_of(
        &self,
        problem: &Problem,
        schedules: &[&RouteSchedule],
        unassigned: &FxHashSet<usize>,
    ) -> i64 {
        let goal = problem.goal();

        let transit: i64 = schedules
            .iter()
            .map(|schedule| WorkingSolution::route_dimension_total(schedule, goal))
            .sum();

        let penalties: i64 = unassigned
            .iter()
            .map(|&job_index| problem.job(job_index).priority().drop_penalty())
            .sum();

        transit + SPAN_COST_COEFFICIENT * WorkingSolution::span_of(schedules, goal) + penalties
    }

    /// Objective as it would be after swapping in replacement schedules and
    /// adjusting the dropped set, without mutating anything.
    pub fn cost_with(
        &self,
        problem: &Problem,
        replacements: &[(usize, &RouteSchedule)],
        newly_assigned: &[usize],
        newly_dropped: &[usize],
    ) -> i64 {
        let schedules: Vec<&RouteSchedule> = self
            .schedules
            .iter()
            .enumerate()
            .map(|(driver_idx, schedule)| {
                replacements
                    .iter()
                    .find(|(idx, _)| *idx == driver_idx)
                    .map(|(_, replacement)| *replacement)
                    .unwrap_or(schedule)
            })
            .collect();

        let mut unassigned = self.unassigned.clone();
        for job_index in newly_assigned {
            unassigned.remove(job_index);
        }
        for &job_index in newly_dropped {
            unassigned.insert(job_index);
        }

        self.cost_of(problem, &schedules, &unassigned)
    }

    /// Directed arcs of every non-empty route, depot legs included. This is
    /// the feature set penalized by guided local search.
    pub fn arcs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.routes.iter().filter(|route| !route.is_empty()).flat_map(|route| {
            let interior = route.windows(2).map(|pair| (pair[0], pair[1]));

            std::iter::once((0, route[0]))
                .chain(interior)
                .chain(std::iter::once((route[route.len() - 1], 0)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{self, minutes};

    #[test]
    fn test_empty_solution_drops_everything() {
        let problem = test_utils::problem_with_jobs(3, 0, test_utils::driver_9_to_5());
        let matrices = test_utils::symmetric_matrices(4, 1000, minutes(10));

        let solution = WorkingSolution::empty(&problem, &matrices).unwrap();

        assert_eq!(solution.unassigned().len(), 3);
        assert_eq!(solution.num_assigned(), 0);
        // 3 medium jobs dropped; empty routes contribute no transit or span
        assert_eq!(solution.cost(&problem), 3 * 5_000_000);
    }

    #[test]
    fn test_empty_solution_fails_for_impossible_shift() {
        let driver = test_utils::driver_with_hours(17 * 3600, 9 * 3600, false);
        let problem = test_utils::problem_with_jobs(1, 0, driver);
        let matrices = test_utils::symmetric_matrices(2, 1000, minutes(10));

        assert!(WorkingSolution::empty(&problem, &matrices).is_err());
    }

    #[test]
    fn test_arcs_cover_depot_legs() {
        let problem = test_utils::problem_with_jobs(3, 0, test_utils::driver_9_to_5());
        let matrices = test_utils::symmetric_matrices(4, 1000, minutes(5));

        let mut solution = WorkingSolution::empty(&problem, &matrices).unwrap();
        let schedule = crate::solver::schedule::compute_schedule(
            &[1, 2],
            problem.driver(0),
            &problem,
            &matrices,
        )
        .unwrap();
        solution.set_route(0, vec![1, 2], schedule);

        let arcs: Vec<_> = solution.arcs().collect();

        assert_eq!(arcs, vec![(0, 1), (1, 2), (2, 0)]);
    }
}
