use std::sync::Arc;

use convoy_store::models::request::{NewOptimizationRequest, OptimizationRequestRow};
use tracing::{error, info};

use crate::{context::AppContext, error::OptimizeError, queue::QueuedRequest};

/// The inbound interface of the core: submit a request, poll it, rename,
/// delete, list. Everything is tenant-scoped.
#[derive(Clone)]
pub struct OptimizationService {
    ctx: Arc<AppContext>,
}

impl OptimizationService {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        OptimizationService { ctx }
    }

    /// Validates the request, inserts a `queued` row and hands its id to the
    /// worker queue. If the queue is unreachable the row is removed again so
    /// no orphaned `queued` request survives.
    pub async fn submit(
        &self,
        tenant_id: i64,
        request: NewOptimizationRequest,
    ) -> Result<OptimizationRequestRow, OptimizeError> {
        if request.route_name.trim().is_empty() {
            return Err(OptimizeError::Validation(
                "Route name must not be empty".to_string(),
            ));
        }

        self.ctx.loader.validate(tenant_id, &request).await?;

        let row = self.ctx.requests.create(tenant_id, &request).await?;

        let enqueued = self
            .ctx
            .queue
            .enqueue(QueuedRequest {
                tenant_id,
                request_id: row.id,
            })
            .await;

        if let Err(queue_error) = enqueued {
            error!(
                request_id = row.id,
                "failed to enqueue optimization request: {queue_error}"
            );
            self.ctx.requests.delete(tenant_id, row.id).await?;
            return Err(OptimizeError::ServiceUnavailable);
        }

        info!(
            request_id = row.id,
            tenant_id,
            jobs = row.job_ids.len(),
            drivers = row.driver_ids.len(),
            "optimization request queued"
        );

        Ok(row)
    }

    pub async fn get(
        &self,
        tenant_id: i64,
        request_id: i64,
    ) -> Result<OptimizationRequestRow, OptimizeError> {
        self.ctx
            .requests
            .get(tenant_id, request_id)
            .await?
            .ok_or(OptimizeError::NotFound)
    }

    pub async fn rename(
        &self,
        tenant_id: i64,
        request_id: i64,
        route_name: &str,
    ) -> Result<OptimizationRequestRow, OptimizeError> {
        if route_name.trim().is_empty() {
            return Err(OptimizeError::Validation(
                "Route name must not be empty".to_string(),
            ));
        }

        self.ctx
            .requests
            .rename(tenant_id, request_id, route_name)
            .await?
            .ok_or(OptimizeError::NotFound)
    }

    pub async fn delete(&self, tenant_id: i64, request_id: i64) -> Result<(), OptimizeError> {
        if self.ctx.requests.delete(tenant_id, request_id).await? {
            Ok(())
        } else {
            Err(OptimizeError::NotFound)
        }
    }

    pub async fn list(
        &self,
        tenant_id: i64,
    ) -> Result<Vec<OptimizationRequestRow>, OptimizeError> {
        Ok(self.ctx.requests.list(tenant_id).await?)
    }
}
