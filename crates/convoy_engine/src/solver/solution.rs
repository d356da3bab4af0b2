use convoy_providers::matrix::TravelMatrices;

use crate::problem::routing_problem::Problem;

use super::{schedule::BreakAssignment, working_solution::WorkingSolution};

#[derive(Debug, Clone)]
pub struct SolvedStop {
    pub job_id: i64,
    pub location_index: usize,
    pub arrival_time_seconds: i64,
    pub departure_time_seconds: i64,
    pub distance_to_next_meters: i64,
    pub duration_to_next_seconds: i64,
}

#[derive(Debug, Clone)]
pub struct SolvedRoute {
    pub driver_id: i64,
    pub vehicle_id: Option<i64>,
    pub stops: Vec<SolvedStop>,
    pub distance_meters: i64,
    pub duration_seconds: i64,
    pub start_time_seconds: i64,
    pub end_time_seconds: i64,
    pub start_distance_meters: i64,
    pub start_duration_seconds: i64,
    pub saved_distance_meters: i64,
    pub saved_time_seconds: i64,
    pub break_assignment: Option<BreakAssignment>,
    pub waiting_seconds: i64,
}

/// Final solver output: one entry per vehicle that visits at least one job,
/// plus the jobs nothing could absorb.
#[derive(Debug, Clone)]
pub struct Solution {
    pub routes: Vec<SolvedRoute>,
    pub unassigned_job_ids: Vec<i64>,
    pub total_distance_meters: i64,
    pub total_duration_seconds: i64,
}

impl Solution {
    pub fn extract(
        problem: &Problem,
        matrices: &TravelMatrices,
        working: &WorkingSolution,
    ) -> Solution {
        let mut routes = Vec::new();
        let mut total_distance = 0i64;
        let mut total_duration = 0i64;

        for (driver_idx, jobs) in working.routes().iter().enumerate() {
            if jobs.is_empty() {
                continue;
            }

            let driver = problem.driver(driver_idx);
            let schedule = working.schedule(driver_idx);

            let stops: Vec<SolvedStop> = schedule
                .stops
                .iter()
                .map(|stop| SolvedStop {
                    job_id: problem.job(stop.job_index).id(),
                    location_index: stop.job_index,
                    arrival_time_seconds: stop.arrival,
                    departure_time_seconds: stop.departure,
                    distance_to_next_meters: stop.distance_to_next,
                    duration_to_next_seconds: stop.duration_to_next,
                })
                .collect();

            // Savings against serving every assigned job with its own
            // out-and-back trip from the depot.
            let mut baseline_distance = 0i64;
            let mut baseline_time = 0i64;
            for &job_index in jobs {
                baseline_distance +=
                    matrices.distance(0, job_index) + matrices.distance(job_index, 0);
                baseline_time += matrices.duration(0, job_index)
                    + matrices.duration(job_index, 0)
                    + problem.service_duration(job_index);
            }

            let duration_seconds = schedule.duration_seconds();
            total_distance += schedule.distance_meters;
            total_duration += duration_seconds;

            routes.push(SolvedRoute {
                driver_id: driver.id(),
                vehicle_id: driver.vehicle_id(),
                stops,
                distance_meters: schedule.distance_meters,
                duration_seconds,
                start_time_seconds: schedule.start_time,
                end_time_seconds: schedule.end_time,
                start_distance_meters: schedule.start_distance,
                start_duration_seconds: schedule.start_duration,
                saved_distance_meters: (baseline_distance - schedule.distance_meters).max(0),
                saved_time_seconds: (baseline_time - duration_seconds).max(0),
                break_assignment: schedule.break_assignment,
                waiting_seconds: schedule.waiting_seconds,
            });
        }

        let mut unassigned_job_ids: Vec<i64> = working
            .unassigned()
            .iter()
            .map(|&job_index| problem.job(job_index).id())
            .collect();
        unassigned_job_ids.sort_unstable();

        Solution {
            routes,
            unassigned_job_ids,
            total_distance_meters: total_distance,
            total_duration_seconds: total_duration,
        }
    }
}
