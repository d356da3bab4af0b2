use std::collections::HashMap;

use chrono::NaiveTime;
use chrono::Timelike;
use convoy_engine::problem::{
    depot::DepotView,
    driver::{BreakSpec, DriverView, DriverViewBuilder},
    job::{JobView, JobViewBuilder},
    routing_problem::{Problem, ProblemBuilder},
    time_window::TimeWindow,
    vehicle::VehicleView,
};
use sqlx::PgPool;
use tracing::debug;

use crate::{
    error::StoreError,
    models::{
        depot::DepotRow,
        driver::{DEFAULT_BREAK_MINUTES, DriverRow},
        job::JobRow,
        request::OptimizationRequestRow,
        vehicle::VehicleRow,
    },
};

fn time_to_seconds(time: NaiveTime) -> i64 {
    time.num_seconds_from_midnight() as i64
}

/// Loads and validates everything a request references, producing the
/// solver's normalized `Problem`.
#[derive(Clone)]
pub struct DataLoader {
    pool: PgPool,
}

impl DataLoader {
    pub fn new(pool: PgPool) -> Self {
        DataLoader { pool }
    }

    pub async fn load(&self, request: &OptimizationRequestRow) -> Result<Problem, StoreError> {
        debug!(
            request_id = request.id,
            depot_id = request.depot_id,
            jobs = request.job_ids.len(),
            drivers = request.driver_ids.len(),
            "loading optimization data"
        );

        self.load_parts(
            request.tenant_id,
            request.depot_id,
            &request.job_ids,
            &request.driver_ids,
            request.scheduled_date,
            request.goal,
        )
        .await
    }

    /// Submitter-side validation: same loading path, result discarded.
    pub async fn validate(
        &self,
        tenant_id: i64,
        request: &crate::models::request::NewOptimizationRequest,
    ) -> Result<(), StoreError> {
        self.load_parts(
            tenant_id,
            request.depot_id,
            &request.job_ids,
            &request.driver_ids,
            request.scheduled_date,
            request.goal,
        )
        .await
        .map(|_| ())
    }

    async fn load_parts(
        &self,
        tenant_id: i64,
        depot_id: i64,
        job_ids: &[i64],
        driver_ids: &[i64],
        scheduled_date: chrono::NaiveDate,
        goal: crate::models::request::OptimizationGoal,
    ) -> Result<Problem, StoreError> {
        if job_ids.is_empty() {
            return Err(StoreError::validation("No jobs to optimize"));
        }

        if driver_ids.is_empty() {
            return Err(StoreError::validation("No team members available"));
        }

        let depot = self.load_depot(depot_id, tenant_id).await?;
        let jobs = self.load_jobs(job_ids, tenant_id).await?;
        let drivers = self.load_drivers(driver_ids, tenant_id).await?;
        let vehicles = self.load_vehicles(&drivers, tenant_id).await?;

        let mut builder = ProblemBuilder::default();
        builder.set_depot(depot);
        builder.set_jobs(jobs.iter().map(job_view).collect::<Result<_, _>>()?);
        builder.set_drivers(drivers.iter().map(driver_view).collect());
        builder.set_scheduled_date(scheduled_date);
        builder.set_goal(goal.into());

        for driver in &drivers {
            if let Some(vehicle) = driver.vehicle_id.and_then(|id| vehicles.get(&id)) {
                builder.add_vehicle(
                    driver.id,
                    VehicleView::new(vehicle.id, vehicle.vehicle_type.into()),
                );
            }
        }

        Ok(builder.build())
    }

    async fn load_depot(&self, depot_id: i64, tenant_id: i64) -> Result<DepotView, StoreError> {
        let row = sqlx::query_as::<_, DepotRow>(
            "SELECT id, tenant_id, name, \
                 ST_X(location::geometry) AS lng, ST_Y(location::geometry) AS lat, address \
             FROM depot WHERE id = $1 AND tenant_id = $2",
        )
        .bind(depot_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::Validation(format!("Depot {depot_id} not found")))?;

        let location = row
            .location()
            .ok_or_else(|| StoreError::Validation(format!("Depot {depot_id} has no location")))?;

        Ok(DepotView::new(row.id, row.name, location))
    }

    async fn load_jobs(&self, job_ids: &[i64], tenant_id: i64) -> Result<Vec<JobRow>, StoreError> {
        let rows = sqlx::query_as::<_, JobRow>(
            "SELECT id, tenant_id, status, scheduled_date, \
                 ST_X(location::geometry) AS lng, ST_Y(location::geometry) AS lat, \
                 address_formatted, time_window_start, time_window_end, \
                 service_duration_minutes, priority_level, assigned_to, route_id \
             FROM job WHERE id = ANY($1) AND tenant_id = $2 AND status = 'draft'",
        )
        .bind(job_ids)
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        if rows.len() != job_ids.len() {
            let found: Vec<i64> = rows.iter().map(|job| job.id).collect();
            let missing: Vec<i64> = job_ids
                .iter()
                .copied()
                .filter(|id| !found.contains(id))
                .collect();
            return Err(StoreError::Validation(format!(
                "Jobs not found or not in draft status: {missing:?}"
            )));
        }

        // Matrix indices follow the order jobs were submitted in.
        let mut by_id: HashMap<i64, JobRow> =
            rows.into_iter().map(|job| (job.id, job)).collect();
        let ordered = job_ids
            .iter()
            .filter_map(|id| by_id.remove(id))
            .collect::<Vec<_>>();

        Ok(ordered)
    }

    async fn load_drivers(
        &self,
        driver_ids: &[i64],
        tenant_id: i64,
    ) -> Result<Vec<DriverRow>, StoreError> {
        let rows = sqlx::query_as::<_, DriverRow>(
            "SELECT id, tenant_id, vehicle_id, name, work_start_time, work_end_time, \
                 allowed_overtime, max_distance_km, break_time_start, break_time_end, \
                 break_duration_minutes, skills \
             FROM team_member WHERE id = ANY($1) AND tenant_id = $2",
        )
        .bind(driver_ids)
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        if rows.len() != driver_ids.len() {
            let found: Vec<i64> = rows.iter().map(|driver| driver.id).collect();
            let missing: Vec<i64> = driver_ids
                .iter()
                .copied()
                .filter(|id| !found.contains(id))
                .collect();
            return Err(StoreError::Validation(format!(
                "Team members not found: {missing:?}"
            )));
        }

        let mut by_id: HashMap<i64, DriverRow> =
            rows.into_iter().map(|driver| (driver.id, driver)).collect();
        let ordered = driver_ids
            .iter()
            .filter_map(|id| by_id.remove(id))
            .collect::<Vec<_>>();

        Ok(ordered)
    }

    async fn load_vehicles(
        &self,
        drivers: &[DriverRow],
        tenant_id: i64,
    ) -> Result<HashMap<i64, VehicleRow>, StoreError> {
        let vehicle_ids: Vec<i64> = drivers.iter().filter_map(|driver| driver.vehicle_id).collect();

        if vehicle_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, VehicleRow>(
            "SELECT id, tenant_id, name, vehicle_type, capacity_weight, capacity_volume \
             FROM vehicle WHERE id = ANY($1) AND tenant_id = $2",
        )
        .bind(&vehicle_ids)
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|vehicle| (vehicle.id, vehicle)).collect())
    }
}

fn job_view(row: &JobRow) -> Result<JobView, StoreError> {
    let location = row
        .location()
        .ok_or_else(|| StoreError::Validation(format!("Job {} has no location", row.id)))?;

    let mut builder = JobViewBuilder::default();
    builder.set_id(row.id);
    builder.set_location(location);
    if let Some(address) = &row.address_formatted {
        builder.set_address(address.clone());
    }
    if let (Some(start), Some(end)) = (row.time_window_start, row.time_window_end) {
        builder.set_time_window(TimeWindow::new(time_to_seconds(start), time_to_seconds(end)));
    }
    builder.set_service_duration(row.service_duration_minutes.unwrap_or(0) as i64 * 60);
    builder.set_priority(row.priority_level.into());

    Ok(builder.build())
}

fn driver_view(row: &DriverRow) -> DriverView {
    let mut builder = DriverViewBuilder::default();
    builder.set_id(row.id);
    builder.set_name(row.name.clone());
    if let Some(vehicle_id) = row.vehicle_id {
        builder.set_vehicle_id(vehicle_id);
    }
    if let (Some(start), Some(end)) = (row.work_start_time, row.work_end_time) {
        builder.set_work_hours(time_to_seconds(start), time_to_seconds(end));
    }
    builder.set_allowed_overtime(row.allowed_overtime);
    if let Some(max_distance_km) = row.max_distance_km {
        builder.set_max_distance_meters((max_distance_km * 1000.0) as i64);
    }
    if let (Some(break_start), Some(break_end)) = (row.break_time_start, row.break_time_end) {
        let duration_minutes = row.break_duration_minutes.unwrap_or(DEFAULT_BREAK_MINUTES);
        builder.set_break(BreakSpec::new(
            time_to_seconds(break_start),
            time_to_seconds(break_end),
            duration_minutes as i64 * 60,
        ));
    }
    if let Some(skills) = &row.skills {
        builder.set_skills(skills.clone());
    }

    builder.build()
}
