use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;

use crate::{
    error::StoreError,
    models::{request::OptimizationRequestRow, route::StopType},
    result::OptimizationResult,
};

/// Writes the formatted result as `route` and `route_stop` rows and flips
/// every assigned job to `assigned` in one statement. Everything happens in
/// a single transaction; a failure rolls the whole request back.
#[derive(Clone)]
pub struct RoutePersister {
    pool: PgPool,
}

impl RoutePersister {
    pub fn new(pool: PgPool) -> Self {
        RoutePersister { pool }
    }

    pub async fn persist(
        &self,
        request: &OptimizationRequestRow,
        result: &OptimizationResult,
    ) -> Result<Vec<i64>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut route_ids = Vec::with_capacity(result.routes.len());
        let mut assignments: Vec<(i64, i64, i64)> = Vec::new();

        for route in &result.routes {
            let route_id: i64 = sqlx::query_scalar(
                "INSERT INTO route \
                     (tenant_id, optimization_request_id, driver_id, vehicle_id, depot_id, \
                      status, scheduled_date, total_distance_meters, total_duration_seconds, \
                      total_distance_saved_meters, total_time_saved_seconds, route_polyline) \
                 VALUES ($1, $2, $3, $4, $5, 'scheduled', $6, $7, $8, $9, $10, $11) \
                 RETURNING id",
            )
            .bind(request.tenant_id)
            .bind(request.id)
            .bind(route.driver_id)
            .bind(route.vehicle_id)
            .bind(request.depot_id)
            .bind(request.scheduled_date)
            .bind(route.total_distance_meters as f64)
            .bind(route.total_duration_seconds as f64)
            .bind(route.total_distance_saved_meters as f64)
            .bind(route.total_time_saved_seconds as f64)
            .bind(&route.polyline)
            .fetch_one(&mut *tx)
            .await?;

            let mut distance_from_prev: Option<i64> = None;
            for (sequence_order, stop) in route.stops.iter().enumerate() {
                sqlx::query(
                    "INSERT INTO route_stop \
                         (route_id, job_id, sequence_order, stop_type, \
                          planned_arrival_time, planned_departure_time, \
                          estimated_distance_from_prev) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7)",
                )
                .bind(route_id)
                .bind(stop.job_id)
                .bind(sequence_order as i32)
                .bind(stop.stop_type)
                .bind(stop.arrival_time)
                .bind(stop.departure_time)
                .bind(distance_from_prev.map(|meters| meters as f64))
                .execute(&mut *tx)
                .await?;

                distance_from_prev = stop.distance_to_next_stop_meters;

                if stop.stop_type == StopType::Job {
                    if let Some(job_id) = stop.job_id {
                        assignments.push((job_id, route.driver_id, route_id));
                    }
                }
            }

            route_ids.push(route_id);
        }

        if !assignments.is_empty() {
            self.assign_jobs(&mut tx, request.tenant_id, &assignments)
                .await?;
        }

        tx.commit().await?;

        info!(
            request_id = request.id,
            routes = route_ids.len(),
            jobs = assignments.len(),
            "persisted optimization result"
        );

        Ok(route_ids)
    }

    /// One `UPDATE ... CASE id` statement so every job gets its own driver
    /// and route in a single round-trip.
    async fn assign_jobs(
        &self,
        tx: &mut sqlx::Transaction<'_, Postgres>,
        tenant_id: i64,
        assignments: &[(i64, i64, i64)],
    ) -> Result<(), StoreError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE job SET status = 'assigned', assigned_to = CASE id ");

        for (job_id, driver_id, _) in assignments {
            builder.push("WHEN ");
            builder.push_bind(job_id);
            builder.push(" THEN ");
            builder.push_bind(driver_id);
            builder.push(" ");
        }

        builder.push("END, route_id = CASE id ");
        for (job_id, _, route_id) in assignments {
            builder.push("WHEN ");
            builder.push_bind(job_id);
            builder.push(" THEN ");
            builder.push_bind(route_id);
            builder.push(" ");
        }

        builder.push("END, updated_at = now() WHERE tenant_id = ");
        builder.push_bind(tenant_id);
        builder.push(" AND id IN (");

        let mut separated = builder.separated(", ");
        for (job_id, _, _) in assignments {
            separated.push_bind(job_id);
        }
        builder.push(")");

        builder.build().execute(&mut **tx).await?;

        Ok(())
    }
}
