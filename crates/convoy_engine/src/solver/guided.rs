use convoy_providers::matrix::TravelMatrices;

use crate::problem::goal::Goal;

use super::working_solution::WorkingSolution;

/// Arc-feature penalties for guided local search. The augmented objective is
/// `f(s) + lambda * sum of penalties over the arcs of s`; at every local
/// optimum the arcs with maximal utility `cost / (1 + penalty)` get
/// penalized, steering the descent away from expensive recurring features.
pub struct ArcPenalties {
    penalties: Vec<i32>,
    num_locations: usize,
    lambda: i64,
}

impl ArcPenalties {
    pub fn new(num_locations: usize, lambda: i64) -> Self {
        ArcPenalties {
            penalties: vec![0; num_locations * num_locations],
            num_locations,
            lambda: lambda.max(1),
        }
    }

    pub fn lambda(&self) -> i64 {
        self.lambda
    }

    #[inline(always)]
    fn slot(&self, from: usize, to: usize) -> usize {
        from * self.num_locations + to
    }

    pub fn penalty(&self, from: usize, to: usize) -> i64 {
        self.penalties[self.slot(from, to)] as i64
    }

    /// Penalty mass of a route given as job indices, depot legs included.
    pub fn route_penalty(&self, jobs: &[usize]) -> i64 {
        if jobs.is_empty() {
            return 0;
        }

        let mut total = self.penalty(0, jobs[0]) + self.penalty(jobs[jobs.len() - 1], 0);
        for pair in jobs.windows(2) {
            total += self.penalty(pair[0], pair[1]);
        }

        total
    }

    pub fn solution_penalty(&self, solution: &WorkingSolution) -> i64 {
        solution
            .routes()
            .iter()
            .map(|route| self.route_penalty(route))
            .sum()
    }

    /// Penalizes every arc of the current solution whose utility is maximal.
    pub fn penalize_worst(
        &mut self,
        solution: &WorkingSolution,
        matrices: &TravelMatrices,
        goal: Goal,
    ) {
        let arc_cost = |from: usize, to: usize| match goal {
            Goal::MinTime => matrices.duration(from, to),
            Goal::MinDistance => matrices.distance(from, to),
        };

        let mut worst_utility = 0f64;
        let mut worst_arcs: Vec<(usize, usize)> = Vec::new();

        for (from, to) in solution.arcs() {
            let utility = arc_cost(from, to) as f64 / (1.0 + self.penalty(from, to) as f64);

            if utility > worst_utility {
                worst_utility = utility;
                worst_arcs.clear();
                worst_arcs.push((from, to));
            } else if utility == worst_utility {
                worst_arcs.push((from, to));
            }
        }

        for (from, to) in worst_arcs {
            let slot = self.slot(from, to);
            self.penalties[slot] += 1;
        }
    }
}
