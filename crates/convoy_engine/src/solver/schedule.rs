use convoy_providers::matrix::{TravelMatrices, UNREACHABLE};
use thiserror::Error;

use crate::problem::{
    driver::{BreakSpec, DriverView},
    routing_problem::Problem,
};

/// Cap on the time dimension: no route runs past the end of the scheduled
/// day's 24-hour clock.
pub const HORIZON: i64 = 86_400;

/// Waiting allowed ahead of a time window (slack on the time dimension).
pub const MAX_WAIT: i64 = 28_800;

/// Cap on the distance dimension per vehicle.
pub const MAX_ROUTE_DISTANCE: i64 = 100_000_000;

#[derive(Debug, Error, Copy, Clone, PartialEq, Eq)]
pub enum ScheduleViolation {
    #[error("leg between locations is unreachable")]
    Unreachable,

    #[error("arrival misses the time window of job at index {0}")]
    TimeWindow(usize),

    #[error("waiting ahead of a time window exceeds the slack limit")]
    WaitTooLong,

    #[error("route returns after the driver's latest end")]
    ShiftEnd,

    #[error("route runs past the 24h horizon")]
    Horizon,

    #[error("route exceeds the maximum distance")]
    MaxDistance,
}

/// Timing of one job stop. `arrival` is the service start (waiting already
/// absorbed), `distance_to_next`/`duration_to_next` describe the outgoing
/// leg (to the following stop or back to the depot).
#[derive(Debug, Copy, Clone)]
pub struct StopTiming {
    pub job_index: usize,
    pub arrival: i64,
    pub departure: i64,
    pub distance_to_next: i64,
    pub duration_to_next: i64,
}

/// A scheduled mandatory break. `after_stop` indexes the full stop sequence:
/// 0 is the depot start, `k` the k-th job stop.
#[derive(Debug, Copy, Clone)]
pub struct BreakAssignment {
    pub start: i64,
    pub end: i64,
    pub after_stop: usize,
}

#[derive(Debug, Clone)]
pub struct RouteSchedule {
    pub stops: Vec<StopTiming>,
    pub start_time: i64,
    pub end_time: i64,
    pub distance_meters: i64,
    pub start_distance: i64,
    pub start_duration: i64,
    pub break_assignment: Option<BreakAssignment>,
    pub waiting_seconds: i64,
}

impl RouteSchedule {
    pub fn duration_seconds(&self) -> i64 {
        self.end_time - self.start_time
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }
}

struct BreakState {
    spec: Option<BreakSpec>,
    assignment: Option<BreakAssignment>,
}

impl BreakState {
    fn new(driver: &DriverView) -> Self {
        BreakState {
            spec: driver.break_spec().copied(),
            assignment: None,
        }
    }

    fn pending(&self) -> Option<&BreakSpec> {
        if self.assignment.is_some() {
            None
        } else {
            self.spec.as_ref()
        }
    }

    /// Break taken at a leg boundary or en route, delaying the remaining
    /// schedule by its full duration. Returns the delay.
    fn take_on_leg(&mut self, departure: i64, leg_duration: i64, after_stop: usize) -> i64 {
        let Some(spec) = self.pending().copied() else {
            return 0;
        };

        let earliest = departure.max(spec.window_start());

        // The window opens only after this leg is done; postpone.
        if earliest > departure + leg_duration {
            return 0;
        }

        if earliest > spec.latest_start() {
            return 0;
        }

        let duration = spec.duration();
        self.assignment = Some(BreakAssignment {
            start: earliest,
            end: earliest + duration,
            after_stop,
        });

        duration
    }

    /// Break absorbed into waiting time ahead of a time window. Returns the
    /// adjusted service start.
    fn take_during_wait(
        &mut self,
        arrival: i64,
        service_start: i64,
        after_stop: usize,
    ) -> i64 {
        let Some(spec) = self.pending().copied() else {
            return service_start;
        };

        if service_start <= arrival {
            return service_start;
        }

        let earliest = arrival.max(spec.window_start());

        if earliest >= service_start || earliest > spec.latest_start() {
            return service_start;
        }

        let end = earliest + spec.duration();
        self.assignment = Some(BreakAssignment {
            start: earliest,
            end,
            after_stop,
        });

        service_start.max(end)
    }

    /// Any break still pending once the route is back at the depot is laid
    /// down inside its window without delaying anything.
    fn finish(&mut self, end_time: i64, after_stop: usize) -> Option<BreakAssignment> {
        if let Some(spec) = self.pending().copied() {
            let start = end_time.max(spec.window_start()).min(spec.latest_start());
            self.assignment = Some(BreakAssignment {
                start,
                end: start + spec.duration(),
                after_stop,
            });
        }

        self.assignment
    }
}

/// Propagates the cumulative time and distance variables along one route:
/// fixed start at the driver's work start, service time folded into each
/// transit, waiting for time windows, mandatory break placement at the
/// earliest feasible slot.
pub fn compute_schedule(
    jobs: &[usize],
    driver: &DriverView,
    problem: &Problem,
    matrices: &TravelMatrices,
) -> Result<RouteSchedule, ScheduleViolation> {
    let start_time = driver.start_time();
    let latest_end = driver.latest_end();

    let mut breaks = BreakState::new(driver);
    let mut stops: Vec<StopTiming> = Vec::with_capacity(jobs.len());
    let mut clock = start_time;
    let mut distance = 0i64;
    let mut waiting = 0i64;
    let mut start_distance = 0i64;
    let mut start_duration = 0i64;
    let mut previous = 0usize;

    for (position, &job_index) in jobs.iter().enumerate() {
        let leg_duration = matrices.duration(previous, job_index);
        let leg_distance = matrices.distance(previous, job_index);

        if leg_duration >= UNREACHABLE || leg_distance >= UNREACHABLE {
            return Err(ScheduleViolation::Unreachable);
        }

        if position == 0 {
            start_distance = leg_distance;
            start_duration = leg_duration;
        }

        let break_delay = breaks.take_on_leg(clock, leg_duration, position);
        let arrival = clock + leg_duration + break_delay;

        let job = problem.job(job_index);
        let mut service_start = arrival;

        if let Some(window) = job.time_window() {
            if arrival < window.start() {
                service_start = breaks.take_during_wait(arrival, window.start(), position);

                let wait = service_start - arrival;
                if wait > MAX_WAIT {
                    return Err(ScheduleViolation::WaitTooLong);
                }
                waiting += wait;
            }

            if service_start > window.end() {
                return Err(ScheduleViolation::TimeWindow(job_index));
            }
        }

        let departure = service_start + job.service_duration();

        if let Some(last) = stops.last_mut() {
            last.distance_to_next = leg_distance;
            last.duration_to_next = leg_duration;
        }

        stops.push(StopTiming {
            job_index,
            arrival: service_start,
            departure,
            distance_to_next: 0,
            duration_to_next: 0,
        });

        distance += leg_distance;
        clock = departure;
        previous = job_index;
    }

    // Return leg to the depot.
    let mut end_time = clock;
    if !jobs.is_empty() {
        let leg_duration = matrices.duration(previous, 0);
        let leg_distance = matrices.distance(previous, 0);

        if leg_duration >= UNREACHABLE || leg_distance >= UNREACHABLE {
            return Err(ScheduleViolation::Unreachable);
        }

        let break_delay = breaks.take_on_leg(clock, leg_duration, jobs.len());
        end_time = clock + leg_duration + break_delay;
        distance += leg_distance;

        if let Some(last) = stops.last_mut() {
            last.distance_to_next = leg_distance;
            last.duration_to_next = leg_duration;
        }
    }

    if end_time > latest_end {
        return Err(ScheduleViolation::ShiftEnd);
    }

    if end_time > HORIZON {
        return Err(ScheduleViolation::Horizon);
    }

    let max_distance = driver
        .max_distance_meters()
        .map_or(MAX_ROUTE_DISTANCE, |limit| limit.min(MAX_ROUTE_DISTANCE));
    if distance > max_distance {
        return Err(ScheduleViolation::MaxDistance);
    }

    let break_assignment = breaks.finish(end_time, jobs.len());

    Ok(RouteSchedule {
        stops,
        start_time,
        end_time,
        distance_meters: distance,
        start_distance,
        start_duration,
        break_assignment,
        waiting_seconds: waiting,
    })
}
