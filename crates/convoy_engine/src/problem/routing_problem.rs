use chrono::NaiveDate;
use convoy_providers::vehicle_type::VehicleType;
use fxhash::FxHashMap;
use geo_types::Point;
use tracing::warn;

use super::{
    depot::DepotView, driver::DriverView, goal::Goal, job::JobView, vehicle::VehicleView,
};

/// Normalized input to the solver. Jobs occupy matrix indices `1..=N`;
/// index 0 is the depot.
pub struct Problem {
    depot: DepotView,
    jobs: Vec<JobView>,
    drivers: Vec<DriverView>,
    vehicles_by_driver: FxHashMap<i64, VehicleView>,
    scheduled_date: NaiveDate,
    goal: Goal,
}

impl Problem {
    pub fn depot(&self) -> &DepotView {
        &self.depot
    }

    pub fn jobs(&self) -> &[JobView] {
        &self.jobs
    }

    pub fn drivers(&self) -> &[DriverView] {
        &self.drivers
    }

    pub fn driver(&self, driver_idx: usize) -> &DriverView {
        &self.drivers[driver_idx]
    }

    pub fn scheduled_date(&self) -> NaiveDate {
        self.scheduled_date
    }

    pub fn goal(&self) -> Goal {
        self.goal
    }

    pub fn num_locations(&self) -> usize {
        1 + self.jobs.len()
    }

    /// The job sitting at a matrix index (`1..=N`).
    pub fn job(&self, matrix_index: usize) -> &JobView {
        &self.jobs[matrix_index - 1]
    }

    pub fn service_duration(&self, matrix_index: usize) -> i64 {
        if matrix_index == 0 {
            0
        } else {
            self.job(matrix_index).service_duration()
        }
    }

    pub fn vehicle_for_driver(&self, driver_id: i64) -> Option<&VehicleView> {
        self.vehicles_by_driver.get(&driver_id)
    }

    /// Ordered location list for matrix and polyline requests.
    pub fn location_points(&self) -> Vec<Point<f64>> {
        let mut points = Vec::with_capacity(self.num_locations());
        points.push(self.depot.location());
        points.extend(self.jobs.iter().map(|job| job.location()));
        points
    }

    /// Vehicle profile used for the request-wide matrix: the first driver
    /// with a vehicle decides, everyone else defaults to car.
    pub fn matrix_vehicle_type(&self) -> VehicleType {
        self.drivers
            .iter()
            .find_map(|driver| self.vehicles_by_driver.get(&driver.id()))
            .map(|vehicle| vehicle.vehicle_type())
            .unwrap_or_default()
    }

    pub fn vehicle_type_for_driver(&self, driver_id: i64) -> VehicleType {
        self.vehicles_by_driver
            .get(&driver_id)
            .map(|vehicle| vehicle.vehicle_type())
            .unwrap_or_default()
    }
}

#[derive(Default)]
pub struct ProblemBuilder {
    depot: Option<DepotView>,
    jobs: Vec<JobView>,
    drivers: Vec<DriverView>,
    vehicles_by_driver: FxHashMap<i64, VehicleView>,
    scheduled_date: Option<NaiveDate>,
    goal: Option<Goal>,
}

impl ProblemBuilder {
    pub fn set_depot(&mut self, depot: DepotView) -> &mut ProblemBuilder {
        self.depot = Some(depot);
        self
    }

    pub fn set_jobs(&mut self, jobs: Vec<JobView>) -> &mut ProblemBuilder {
        self.jobs = jobs;
        self
    }

    pub fn set_drivers(&mut self, drivers: Vec<DriverView>) -> &mut ProblemBuilder {
        self.drivers = drivers;
        self
    }

    pub fn add_vehicle(&mut self, driver_id: i64, vehicle: VehicleView) -> &mut ProblemBuilder {
        self.vehicles_by_driver.insert(driver_id, vehicle);
        self
    }

    pub fn set_scheduled_date(&mut self, scheduled_date: NaiveDate) -> &mut ProblemBuilder {
        self.scheduled_date = Some(scheduled_date);
        self
    }

    pub fn set_goal(&mut self, goal: Goal) -> &mut ProblemBuilder {
        self.goal = Some(goal);
        self
    }

    pub fn build(self) -> Problem {
        let mut drivers = self.drivers;

        for driver in drivers.iter_mut() {
            if let Some(break_spec) = driver.break_spec() {
                if !break_spec.fits_window() {
                    warn!(
                        driver_id = driver.id(),
                        "break window shorter than break duration, dropping break"
                    );
                    driver.clear_break();
                }
            }
        }

        Problem {
            depot: self.depot.expect("Depot is required"),
            jobs: self.jobs,
            drivers,
            vehicles_by_driver: self.vehicles_by_driver,
            scheduled_date: self.scheduled_date.expect("Scheduled date is required"),
            goal: self.goal.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::driver::{BreakSpec, DriverViewBuilder};

    #[test]
    fn test_too_tight_break_is_dropped_on_build() {
        let mut driver = DriverViewBuilder::default();
        driver.set_id(7);
        driver.set_work_hours(32400, 61200);
        driver.set_break(BreakSpec::new(43200, 44000, 1800));

        let mut builder = ProblemBuilder::default();
        builder.set_depot(DepotView::new(1, "Depot".to_string(), Point::new(4.35, 50.85)));
        builder.set_drivers(vec![driver.build()]);
        builder.set_scheduled_date(NaiveDate::from_ymd_opt(2025, 6, 10).unwrap());

        let problem = builder.build();

        assert!(problem.driver(0).break_spec().is_none());
    }
}
