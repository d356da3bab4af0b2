use chrono::{NaiveDateTime, NaiveTime, TimeDelta, Utc};
use convoy_engine::{
    problem::{job::JobView, routing_problem::Problem},
    solver::{
        schedule::HORIZON,
        solution::{Solution, SolvedRoute},
    },
};
use convoy_providers::provider::RoutingProvider;
use convoy_store::result::{
    BreakInfo, IdleBlock, OptimizationResult, RouteResult, StopResult, UnassignedJob,
};
use convoy_store::models::route::StopType;
use geo_types::Point;
use tracing::warn;

/// Gaps between stops shorter than this are not worth reporting.
const IDLE_THRESHOLD_SECONDS: i64 = 60;

/// A break starting within this many seconds of a stop's departure counts as
/// taken at the stop rather than en route.
const AT_STOP_TOLERANCE_SECONDS: i64 = 60;

pub const REASON_OUTSIDE_WORKING_HOURS: &str =
    "Time window is outside of all team member's working hours";
pub const REASON_SERVICE_TOO_LONG: &str =
    "Service duration exceeds all team member's shift lengths";
pub const REASON_CONSTRAINTS: &str = "Could not be visited within constraints";

/// Rewrites the solver's raw output into the result JSON persisted on the
/// request: absolute timestamps, depot stops, break and idle blocks, route
/// polylines and unassigned-job reasons.
pub struct ResultFormatter<'a> {
    problem: &'a Problem,
    provider: &'a RoutingProvider,
}

impl<'a> ResultFormatter<'a> {
    pub fn new(problem: &'a Problem, provider: &'a RoutingProvider) -> Self {
        ResultFormatter { problem, provider }
    }

    pub async fn format(&self, solution: &Solution) -> OptimizationResult {
        let mut routes = Vec::with_capacity(solution.routes.len());

        for route in &solution.routes {
            routes.push(self.format_route(route).await);
        }

        let unassigned_jobs = solution
            .unassigned_job_ids
            .iter()
            .filter_map(|&job_id| {
                self.problem
                    .jobs()
                    .iter()
                    .find(|job| job.id() == job_id)
                    .map(|job| UnassignedJob {
                        job_id,
                        reason: self.unassigned_reason(job).to_string(),
                        address: job.address().map(str::to_string),
                    })
            })
            .collect();

        OptimizationResult {
            status: "success".to_string(),
            optimization_goal: self.problem.goal().into(),
            total_distance_meters: solution.total_distance_meters,
            total_duration_seconds: solution.total_duration_seconds,
            routes,
            unassigned_jobs,
            generated_at: Utc::now(),
        }
    }

    async fn format_route(&self, route: &SolvedRoute) -> RouteResult {
        let depot = self.problem.depot();
        let driver_name = self
            .problem
            .drivers()
            .iter()
            .find(|driver| driver.id() == route.driver_id)
            .and_then(|driver| driver.name())
            .unwrap_or_default()
            .to_string();

        let mut stops = Vec::with_capacity(route.stops.len() + 2);

        stops.push(StopResult {
            stop_type: StopType::DepotStart,
            job_id: None,
            arrival_time: self.seconds_to_datetime(route.start_time_seconds),
            departure_time: Some(self.seconds_to_datetime(route.start_time_seconds)),
            address: None,
            lat: Some(depot.location().y()),
            lng: Some(depot.location().x()),
            distance_to_next_stop_meters: Some(route.start_distance_meters),
            time_to_next_stop_seconds: Some(route.start_duration_seconds),
        });

        for stop in &route.stops {
            let job = self.problem.job(stop.location_index);

            stops.push(StopResult {
                stop_type: StopType::Job,
                job_id: Some(stop.job_id),
                arrival_time: self.seconds_to_datetime(stop.arrival_time_seconds),
                departure_time: Some(self.seconds_to_datetime(stop.departure_time_seconds)),
                address: job.address().map(str::to_string),
                lat: Some(job.location().y()),
                lng: Some(job.location().x()),
                distance_to_next_stop_meters: Some(stop.distance_to_next_meters),
                time_to_next_stop_seconds: Some(stop.duration_to_next_seconds),
            });
        }

        stops.push(StopResult {
            stop_type: StopType::DepotEnd,
            job_id: None,
            arrival_time: self
                .seconds_to_datetime(route.start_time_seconds + route.duration_seconds),
            departure_time: None,
            address: None,
            lat: Some(depot.location().y()),
            lng: Some(depot.location().x()),
            distance_to_next_stop_meters: None,
            time_to_next_stop_seconds: None,
        });

        let break_info = route.break_assignment.map(|assignment| {
            let anchor = &stops[assignment.after_stop.min(stops.len() - 1)];
            let at_stop = anchor
                .departure_time
                .map(|departure| {
                    let departure_seconds =
                        departure.signed_duration_since(self.midnight()).num_seconds();
                    (assignment.start - departure_seconds).abs() <= AT_STOP_TOLERANCE_SECONDS
                })
                .unwrap_or(false);

            // En-route breaks have no exact point; fall back to the depot.
            let (lat, lng) = if at_stop {
                (
                    anchor.lat.unwrap_or(depot.location().y()),
                    anchor.lng.unwrap_or(depot.location().x()),
                )
            } else {
                (depot.location().y(), depot.location().x())
            };

            BreakInfo {
                start_time: self.seconds_to_datetime(assignment.start),
                end_time: self.seconds_to_datetime(assignment.end),
                duration_minutes: (assignment.end - assignment.start) / 60,
                break_after_stop_index: assignment.after_stop,
                at_stop,
                lat,
                lng,
            }
        });

        let idle_blocks = self.idle_blocks(&stops);

        let polyline = self.fetch_polyline(route).await;

        RouteResult {
            driver_id: route.driver_id,
            driver_name,
            vehicle_id: route.vehicle_id,
            vehicle_type: route
                .vehicle_id
                .map(|_| self.problem.vehicle_type_for_driver(route.driver_id).to_string()),
            total_distance_meters: route.distance_meters,
            total_duration_seconds: route.duration_seconds,
            total_distance_saved_meters: route.saved_distance_meters,
            total_time_saved_seconds: route.saved_time_seconds,
            polyline,
            stops,
            break_info,
            idle_blocks,
        }
    }

    /// Gaps where the driver arrives later than departure plus travel time:
    /// waiting ahead of time windows and break-induced delays.
    fn idle_blocks(&self, stops: &[StopResult]) -> Vec<IdleBlock> {
        let midnight = self.midnight();
        let mut blocks = Vec::new();

        for (index, pair) in stops.windows(2).enumerate() {
            let (current, next) = (&pair[0], &pair[1]);

            let (Some(departure), Some(travel)) =
                (current.departure_time, current.time_to_next_stop_seconds)
            else {
                continue;
            };

            let expected = departure.signed_duration_since(midnight).num_seconds() + travel;
            let arrival = next.arrival_time.signed_duration_since(midnight).num_seconds();
            let idle = arrival - expected;

            if idle > IDLE_THRESHOLD_SECONDS {
                blocks.push(IdleBlock {
                    start_time: self.seconds_to_datetime(expected),
                    end_time: next.arrival_time,
                    duration_seconds: idle,
                    before_stop_index: index + 1,
                    lat: next.lat,
                    lng: next.lng,
                });
            }
        }

        blocks
    }

    async fn fetch_polyline(&self, route: &SolvedRoute) -> Option<String> {
        let depot = self.problem.depot().location();

        let mut points: Vec<Point<f64>> = Vec::with_capacity(route.stops.len() + 2);
        points.push(depot);
        points.extend(
            route
                .stops
                .iter()
                .map(|stop| self.problem.job(stop.location_index).location()),
        );
        points.push(depot);

        let vehicle_type = self.problem.vehicle_type_for_driver(route.driver_id);

        let polyline = self.provider.polyline(&points, vehicle_type).await;
        if polyline.is_none() {
            warn!(driver_id = route.driver_id, "no polyline for route");
        }

        polyline
    }

    fn unassigned_reason(&self, job: &JobView) -> &'static str {
        let drivers = self.problem.drivers();

        if let Some(window) = job.time_window() {
            let overlaps_any = drivers.iter().any(|driver| {
                window.overlaps(
                    driver.work_start().unwrap_or(0),
                    driver.work_end().unwrap_or(HORIZON),
                )
            });

            if !overlaps_any {
                return REASON_OUTSIDE_WORKING_HOURS;
            }
        }

        if job.service_duration() > 0
            && drivers
                .iter()
                .all(|driver| job.service_duration() > driver.shift_length())
        {
            return REASON_SERVICE_TOO_LONG;
        }

        REASON_CONSTRAINTS
    }

    fn midnight(&self) -> NaiveDateTime {
        self.problem.scheduled_date().and_time(NaiveTime::MIN)
    }

    /// Seconds from midnight of the scheduled date; values past 86 400 roll
    /// into the next day.
    fn seconds_to_datetime(&self, seconds: i64) -> NaiveDateTime {
        self.midnight() + TimeDelta::seconds(seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate};
    use convoy_engine::problem::{
        depot::DepotView,
        driver::DriverViewBuilder,
        job::JobViewBuilder,
        routing_problem::ProblemBuilder,
        time_window::TimeWindow,
    };

    fn test_problem(window: Option<(i64, i64)>, service_minutes: i64) -> Problem {
        let mut job = JobViewBuilder::default();
        job.set_id(101);
        job.set_location(Point::new(72.55, 23.03));
        job.set_service_duration(service_minutes * 60);
        if let Some((start, end)) = window {
            job.set_time_window(TimeWindow::new(start, end));
        }

        let mut driver = DriverViewBuilder::default();
        driver.set_id(501);
        driver.set_work_hours(9 * 3600, 17 * 3600);

        let mut builder = ProblemBuilder::default();
        builder.set_depot(DepotView::new(1, "Depot".to_string(), Point::new(72.54, 23.02)));
        builder.set_jobs(vec![job.build()]);
        builder.set_drivers(vec![driver.build()]);
        builder.set_scheduled_date(NaiveDate::from_ymd_opt(2025, 6, 10).unwrap());
        builder.build()
    }

    fn formatter_provider() -> RoutingProvider {
        // The TomTom adapter never fetches polylines, which keeps tests
        // offline.
        RoutingProvider::from_kind(
            convoy_providers::provider::ProviderKind::TomTom,
            "test-key".to_string(),
        )
    }

    #[test]
    fn test_seconds_roll_into_next_day() {
        let problem = test_problem(None, 0);
        let provider = formatter_provider();
        let formatter = ResultFormatter::new(&problem, &provider);

        let datetime = formatter.seconds_to_datetime(86_400 + 3600);

        assert_eq!(datetime.day(), 11);
        assert_eq!(datetime.time(), NaiveTime::from_hms_opt(1, 0, 0).unwrap());
    }

    #[test]
    fn test_reason_outside_working_hours() {
        let problem = test_problem(Some((2 * 3600, 3 * 3600)), 5);
        let provider = formatter_provider();
        let formatter = ResultFormatter::new(&problem, &provider);

        let reason = formatter.unassigned_reason(&problem.jobs()[0]);

        assert_eq!(reason, REASON_OUTSIDE_WORKING_HOURS);
    }

    #[test]
    fn test_reason_service_too_long() {
        // Window overlaps the shift but twelve hours of service never fit.
        let problem = test_problem(Some((9 * 3600, 17 * 3600)), 12 * 60);
        let provider = formatter_provider();
        let formatter = ResultFormatter::new(&problem, &provider);

        let reason = formatter.unassigned_reason(&problem.jobs()[0]);

        assert_eq!(reason, REASON_SERVICE_TOO_LONG);
    }

    #[test]
    fn test_reason_falls_back_to_constraints() {
        let problem = test_problem(Some((10 * 3600, 11 * 3600)), 5);
        let provider = formatter_provider();
        let formatter = ResultFormatter::new(&problem, &provider);

        let reason = formatter.unassigned_reason(&problem.jobs()[0]);

        assert_eq!(reason, REASON_CONSTRAINTS);
    }

    #[test]
    fn test_idle_block_between_stops() {
        let problem = test_problem(None, 0);
        let provider = formatter_provider();
        let formatter = ResultFormatter::new(&problem, &provider);

        let nine = 9 * 3600;
        let stops = vec![
            StopResult {
                stop_type: StopType::DepotStart,
                job_id: None,
                arrival_time: formatter.seconds_to_datetime(nine),
                departure_time: Some(formatter.seconds_to_datetime(nine)),
                address: None,
                lat: Some(23.02),
                lng: Some(72.54),
                distance_to_next_stop_meters: Some(5000),
                time_to_next_stop_seconds: Some(600),
            },
            StopResult {
                stop_type: StopType::Job,
                job_id: Some(101),
                // Arrives 10 minutes of travel plus 30 minutes of waiting
                arrival_time: formatter.seconds_to_datetime(nine + 600 + 1800),
                departure_time: Some(formatter.seconds_to_datetime(nine + 600 + 1800)),
                address: None,
                lat: Some(23.03),
                lng: Some(72.55),
                distance_to_next_stop_meters: Some(5000),
                time_to_next_stop_seconds: Some(600),
            },
        ];

        let blocks = formatter.idle_blocks(&stops);

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].duration_seconds, 1800);
        assert_eq!(blocks[0].before_stop_index, 1);
        assert_eq!(blocks[0].start_time, formatter.seconds_to_datetime(nine + 600));
    }
}
