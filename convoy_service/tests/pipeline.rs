//! Solver-to-formatter scenarios on synthetic matrices. The TomTom adapter
//! is used as the provider because its polyline call never touches the
//! network.

use chrono::{NaiveDate, NaiveTime};
use convoy_engine::problem::{
    depot::DepotView,
    driver::{BreakSpec, DriverView, DriverViewBuilder},
    job::JobViewBuilder,
    routing_problem::{Problem, ProblemBuilder},
    time_window::TimeWindow,
};
use convoy_engine::solver::{params::SolverParams, vrp_solver::VrpSolver};
use convoy_providers::matrix::TravelMatrices;
use convoy_providers::provider::{ProviderKind, RoutingProvider};
use convoy_service::formatter::{REASON_OUTSIDE_WORKING_HOURS, ResultFormatter};
use convoy_store::models::route::StopType;
use geo_types::Point;

fn offline_provider() -> RoutingProvider {
    RoutingProvider::from_kind(ProviderKind::TomTom, "test-key".to_string())
}

fn driver_9_to_5() -> DriverView {
    let mut builder = DriverViewBuilder::default();
    builder.set_id(501);
    builder.set_name("Asha".to_string());
    builder.set_work_hours(9 * 3600, 17 * 3600);
    builder.build()
}

struct JobSpec {
    id: i64,
    window: Option<(i64, i64)>,
}

fn scenario_problem(jobs: Vec<JobSpec>, driver: DriverView) -> Problem {
    let views = jobs
        .into_iter()
        .enumerate()
        .map(|(index, spec)| {
            let mut builder = JobViewBuilder::default();
            builder.set_id(spec.id);
            builder.set_location(Point::new(72.55 + 0.01 * index as f64, 23.03));
            builder.set_address(format!("Job site {}", spec.id));
            builder.set_service_duration(5 * 60);
            if let Some((start, end)) = spec.window {
                builder.set_time_window(TimeWindow::new(start, end));
            }
            builder.build()
        })
        .collect();

    let mut builder = ProblemBuilder::default();
    builder.set_depot(DepotView::new(1, "Depot".to_string(), Point::new(72.54, 23.02)));
    builder.set_jobs(views);
    builder.set_drivers(vec![driver]);
    builder.set_scheduled_date(NaiveDate::from_ymd_opt(2025, 6, 10).unwrap());
    builder.build()
}

fn symmetric_matrices(num_locations: usize, leg_minutes: i64) -> TravelMatrices {
    let mut matrices = TravelMatrices::filled(num_locations);

    for from in 0..num_locations {
        for to in 0..num_locations {
            if from != to {
                matrices.set(from, to, 5000, leg_minutes * 60);
            }
        }
    }

    matrices
}

fn time_of(datetime: chrono::NaiveDateTime) -> NaiveTime {
    datetime.time()
}

#[tokio::test]
async fn test_happy_single_route() {
    let problem = scenario_problem(
        vec![JobSpec { id: 101, window: None }, JobSpec { id: 102, window: None }],
        driver_9_to_5(),
    );
    let matrices = symmetric_matrices(3, 10);

    let solution = VrpSolver::new(&problem, &matrices)
        .solve(SolverParams::with_budget_seconds(2))
        .expect("feasible problem");

    let provider = offline_provider();
    let result = ResultFormatter::new(&problem, &provider)
        .format(&solution)
        .await;

    assert!(result.unassigned_jobs.is_empty());
    assert_eq!(result.routes.len(), 1);
    assert_eq!(result.total_duration_seconds, 2400);

    let route = &result.routes[0];
    assert_eq!(route.stops.len(), 4);
    assert_eq!(route.stops[0].stop_type, StopType::DepotStart);
    assert_eq!(route.stops[3].stop_type, StopType::DepotEnd);

    assert_eq!(
        time_of(route.stops[0].arrival_time),
        NaiveTime::from_hms_opt(9, 0, 0).unwrap()
    );
    assert_eq!(
        time_of(route.stops[1].arrival_time),
        NaiveTime::from_hms_opt(9, 10, 0).unwrap()
    );
    assert_eq!(
        time_of(route.stops[2].arrival_time),
        NaiveTime::from_hms_opt(9, 25, 0).unwrap()
    );
    assert_eq!(
        time_of(route.stops[3].arrival_time),
        NaiveTime::from_hms_opt(9, 40, 0).unwrap()
    );

    // No polyline without a live provider
    assert!(route.polyline.is_none());
}

#[tokio::test]
async fn test_unreachable_time_window_reported_with_reason() {
    let problem = scenario_problem(
        vec![
            JobSpec {
                id: 101,
                window: Some((2 * 3600, 3 * 3600)),
            },
            JobSpec { id: 102, window: None },
        ],
        driver_9_to_5(),
    );
    let matrices = symmetric_matrices(3, 10);

    let solution = VrpSolver::new(&problem, &matrices)
        .solve(SolverParams::with_budget_seconds(2))
        .expect("partially feasible problem");

    let provider = offline_provider();
    let result = ResultFormatter::new(&problem, &provider)
        .format(&solution)
        .await;

    assert_eq!(result.unassigned_jobs.len(), 1);
    let unassigned = &result.unassigned_jobs[0];
    assert_eq!(unassigned.job_id, 101);
    assert_eq!(unassigned.reason, REASON_OUTSIDE_WORKING_HOURS);
    assert_eq!(unassigned.address.as_deref(), Some("Job site 101"));

    // The other job is still served.
    assert_eq!(result.routes.len(), 1);
    let job_ids: Vec<_> = result.routes[0]
        .stops
        .iter()
        .filter_map(|stop| stop.job_id)
        .collect();
    assert_eq!(job_ids, vec![102]);
}

#[tokio::test]
async fn test_break_shows_up_in_schedule() {
    let mut driver = DriverViewBuilder::default();
    driver.set_id(501);
    driver.set_name("Asha".to_string());
    driver.set_work_hours(9 * 3600, 17 * 3600);
    driver.set_break(BreakSpec::new(12 * 3600, 14 * 3600, 30 * 60));

    let problem = scenario_problem(
        vec![JobSpec { id: 101, window: None }, JobSpec { id: 102, window: None }],
        driver.build(),
    );
    // 90-minute legs stretch the route across the break window.
    let matrices = symmetric_matrices(3, 90);

    let solution = VrpSolver::new(&problem, &matrices)
        .solve(SolverParams::with_budget_seconds(2))
        .expect("feasible problem");

    let provider = offline_provider();
    let result = ResultFormatter::new(&problem, &provider)
        .format(&solution)
        .await;

    let break_info = result.routes[0].break_info.as_ref().expect("break scheduled");
    assert_eq!(break_info.duration_minutes, 30);

    let start = time_of(break_info.start_time);
    assert!(start >= NaiveTime::from_hms_opt(12, 0, 0).unwrap());
    assert!(start <= NaiveTime::from_hms_opt(13, 30, 0).unwrap());
}
