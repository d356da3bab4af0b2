use std::time::Duration;

use sqlx::PgPool;
use tracing::debug;

use crate::{
    error::StoreError,
    models::request::{NewOptimizationRequest, OptimizationRequestRow},
};

const REQUEST_COLUMNS: &str = "id, tenant_id, route_name, depot_id, job_ids, driver_ids, \
     scheduled_date, goal, status, started_at, completed_at, error_message, result, \
     created_at, updated_at";

/// Durable row per optimization request. All reads and writes carry an
/// explicit `tenant_id` predicate.
#[derive(Clone)]
pub struct RequestStore {
    pool: PgPool,
}

impl RequestStore {
    pub fn new(pool: PgPool) -> Self {
        RequestStore { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn create(
        &self,
        tenant_id: i64,
        request: &NewOptimizationRequest,
    ) -> Result<OptimizationRequestRow, StoreError> {
        let row = sqlx::query_as::<_, OptimizationRequestRow>(&format!(
            "INSERT INTO optimization_request \
                 (tenant_id, route_name, depot_id, job_ids, driver_ids, scheduled_date, goal, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, 'queued') \
             RETURNING {REQUEST_COLUMNS}"
        ))
        .bind(tenant_id)
        .bind(&request.route_name)
        .bind(request.depot_id)
        .bind(&request.job_ids)
        .bind(&request.driver_ids)
        .bind(request.scheduled_date)
        .bind(request.goal)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get(
        &self,
        tenant_id: i64,
        request_id: i64,
    ) -> Result<Option<OptimizationRequestRow>, StoreError> {
        let row = sqlx::query_as::<_, OptimizationRequestRow>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM optimization_request WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(request_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list(&self, tenant_id: i64) -> Result<Vec<OptimizationRequestRow>, StoreError> {
        let rows = sqlx::query_as::<_, OptimizationRequestRow>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM optimization_request \
             WHERE tenant_id = $1 ORDER BY created_at DESC"
        ))
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Renames the request and nothing else; allowed in any state.
    pub async fn rename(
        &self,
        tenant_id: i64,
        request_id: i64,
        route_name: &str,
    ) -> Result<Option<OptimizationRequestRow>, StoreError> {
        let row = sqlx::query_as::<_, OptimizationRequestRow>(&format!(
            "UPDATE optimization_request SET route_name = $3, updated_at = now() \
             WHERE id = $1 AND tenant_id = $2 \
             RETURNING {REQUEST_COLUMNS}"
        ))
        .bind(request_id)
        .bind(tenant_id)
        .bind(route_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Deletes the request; routes and their stops go with it via cascade.
    pub async fn delete(&self, tenant_id: i64, request_id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM optimization_request WHERE id = $1 AND tenant_id = $2")
            .bind(request_id)
            .bind(tenant_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Claims a queued request for processing, stamping `started_at`. Returns
    /// false when the row was already claimed (at-least-once delivery can
    /// hand the same id to two workers).
    pub async fn mark_processing(
        &self,
        tenant_id: i64,
        request_id: i64,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE optimization_request \
             SET status = 'processing', started_at = now(), updated_at = now() \
             WHERE id = $1 AND tenant_id = $2 AND status = 'queued'",
        )
        .bind(request_id)
        .bind(tenant_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn mark_completed(
        &self,
        tenant_id: i64,
        request_id: i64,
        result: &serde_json::Value,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE optimization_request \
             SET status = 'completed', result = $3, completed_at = now(), updated_at = now() \
             WHERE id = $1 AND tenant_id = $2 AND status = 'processing'",
        )
        .bind(request_id)
        .bind(tenant_id)
        .bind(result)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn mark_failed(
        &self,
        tenant_id: i64,
        request_id: i64,
        error_message: &str,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE optimization_request \
             SET status = 'failed', error_message = $3, completed_at = now(), updated_at = now() \
             WHERE id = $1 AND tenant_id = $2 AND status = 'processing'",
        )
        .bind(request_id)
        .bind(tenant_id)
        .bind(error_message)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Crash recovery: requests stuck in `processing` longer than the job
    /// timeout are terminally failed. Returns how many rows were swept.
    pub async fn sweep_stale_processing(&self, older_than: Duration) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE optimization_request \
             SET status = 'failed', error_message = 'Optimization timed out', \
                 completed_at = now(), updated_at = now() \
             WHERE status = 'processing' AND started_at < now() - $1::interval",
        )
        .bind(format!("{} seconds", older_than.as_secs()))
        .execute(&self.pool)
        .await?;

        let swept = result.rows_affected();
        if swept > 0 {
            debug!(swept, "swept stale processing requests");
        }

        Ok(swept)
    }
}
