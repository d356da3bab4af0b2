use chrono::NaiveDate;
use convoy_providers::matrix::{TravelMatrices, UNREACHABLE};
use geo_types::Point;

use crate::problem::{
    depot::DepotView,
    driver::{BreakSpec, DriverView, DriverViewBuilder},
    job::{JobView, JobViewBuilder, Priority},
    routing_problem::{Problem, ProblemBuilder},
    time_window::TimeWindow,
};

pub(crate) fn minutes(n: i64) -> i64 {
    n * 60
}

pub(crate) fn driver_with_hours(start: i64, end: i64, overtime: bool) -> DriverView {
    let mut builder = DriverViewBuilder::default();
    builder.set_id(501);
    builder.set_work_hours(start, end);
    builder.set_allowed_overtime(overtime);
    builder.build()
}

pub(crate) fn driver_9_to_5() -> DriverView {
    driver_with_hours(9 * 3600, 17 * 3600, false)
}

fn rebuild_driver(
    driver: &DriverView,
    break_spec: Option<BreakSpec>,
    max_distance: Option<i64>,
) -> DriverView {
    let mut builder = DriverViewBuilder::default();
    builder.set_id(driver.id());
    if let Some(name) = driver.name() {
        builder.set_name(name.to_string());
    }
    if let Some(vehicle_id) = driver.vehicle_id() {
        builder.set_vehicle_id(vehicle_id);
    }
    if let (Some(start), Some(end)) = (driver.work_start(), driver.work_end()) {
        builder.set_work_hours(start, end);
    }
    builder.set_allowed_overtime(driver.allowed_overtime());
    if let Some(meters) = max_distance.or(driver.max_distance_meters()) {
        builder.set_max_distance_meters(meters);
    }
    if let Some(break_spec) = break_spec.or(driver.break_spec().copied()) {
        builder.set_break(break_spec);
    }
    builder.set_skills(driver.skills().to_vec());
    builder.build()
}

pub(crate) fn with_break(
    driver: DriverView,
    window_start: i64,
    window_end: i64,
    duration: i64,
) -> DriverView {
    rebuild_driver(
        &driver,
        Some(BreakSpec::new(window_start, window_end, duration)),
        None,
    )
}

pub(crate) fn with_max_distance(driver: DriverView, meters: i64) -> DriverView {
    rebuild_driver(&driver, None, Some(meters))
}

/// Jobs get ids 101, 102, ... and sit on a line east of the depot.
pub(crate) fn problem_with_jobs_and_drivers(
    num_jobs: usize,
    service_duration: i64,
    drivers: Vec<DriverView>,
) -> Problem {
    let jobs: Vec<JobView> = (0..num_jobs)
        .map(|i| {
            let mut builder = JobViewBuilder::default();
            builder.set_id(101 + i as i64);
            builder.set_location(Point::new(4.36 + 0.01 * i as f64, 50.85));
            builder.set_service_duration(service_duration);
            builder.build()
        })
        .collect();

    let mut builder = ProblemBuilder::default();
    builder.set_depot(DepotView::new(1, "Depot".to_string(), Point::new(4.35, 50.85)));
    builder.set_jobs(jobs);
    builder.set_drivers(drivers);
    builder.set_scheduled_date(NaiveDate::from_ymd_opt(2025, 6, 10).unwrap());
    builder.build()
}

pub(crate) fn problem_with_jobs(
    num_jobs: usize,
    service_duration: i64,
    driver: DriverView,
) -> Problem {
    problem_with_jobs_and_drivers(num_jobs, service_duration, vec![driver])
}

fn rebuild_problem<F>(problem: &Problem, mut adjust_job: F) -> Problem
where
    F: FnMut(usize, &JobView) -> JobView,
{
    let jobs = problem
        .jobs()
        .iter()
        .enumerate()
        .map(|(position, job)| adjust_job(position, job))
        .collect();

    let mut builder = ProblemBuilder::default();
    builder.set_depot(problem.depot().clone());
    builder.set_jobs(jobs);
    builder.set_drivers(problem.drivers().to_vec());
    builder.set_scheduled_date(problem.scheduled_date());
    builder.set_goal(problem.goal());
    for driver in problem.drivers() {
        if let Some(vehicle) = problem.vehicle_for_driver(driver.id()) {
            builder.add_vehicle(driver.id(), vehicle.clone());
        }
    }
    builder.build()
}

fn rebuild_job(
    job: &JobView,
    time_window: Option<TimeWindow>,
    priority: Option<Priority>,
) -> JobView {
    let mut builder = JobViewBuilder::default();
    builder.set_id(job.id());
    builder.set_location(job.location());
    if let Some(address) = job.address() {
        builder.set_address(address.to_string());
    }
    if let Some(window) = time_window.or(job.time_window().copied()) {
        builder.set_time_window(window);
    }
    builder.set_service_duration(job.service_duration());
    builder.set_priority(priority.unwrap_or(job.priority()));
    builder.build()
}

pub(crate) fn set_time_window(problem: &mut Problem, job_position: usize, start: i64, end: i64) {
    *problem = rebuild_problem(problem, |position, job| {
        if position == job_position {
            rebuild_job(job, Some(TimeWindow::new(start, end)), None)
        } else {
            job.clone()
        }
    });
}

pub(crate) fn set_priority(problem: &mut Problem, job_position: usize, priority: Priority) {
    *problem = rebuild_problem(problem, |position, job| {
        if position == job_position {
            rebuild_job(job, None, Some(priority))
        } else {
            job.clone()
        }
    });
}

/// All off-diagonal pairs share one leg cost.
pub(crate) fn symmetric_matrices(
    num_locations: usize,
    leg_distance: i64,
    leg_duration: i64,
) -> TravelMatrices {
    let mut matrices = TravelMatrices::filled(num_locations);

    for from in 0..num_locations {
        for to in 0..num_locations {
            if from != to {
                matrices.set(from, to, leg_distance, leg_duration);
            }
        }
    }

    matrices
}

/// Makes one location unreachable from everywhere (and back).
pub(crate) fn cut_off_location(
    mut matrices: TravelMatrices,
    num_locations: usize,
    location: usize,
) -> TravelMatrices {
    for other in 0..num_locations {
        if other != location {
            matrices.set(other, location, UNREACHABLE, UNREACHABLE);
            matrices.set(location, other, UNREACHABLE, UNREACHABLE);
        }
    }

    matrices
}
