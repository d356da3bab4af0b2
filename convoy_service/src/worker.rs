use std::sync::Arc;
use std::time::Duration;

use convoy_engine::solver::{params::SolverParams, vrp_solver::VrpSolver};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::{
    context::AppContext, error::OptimizeError, formatter::ResultFormatter, queue::QueuedRequest,
};

/// Wall-clock budget per request; exceeding it terminally fails the request.
pub const JOB_TIMEOUT: Duration = Duration::from_secs(300);

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Spawns the worker pool and the crash-recovery sweeper.
pub fn spawn_workers(ctx: Arc<AppContext>) -> Vec<JoinHandle<()>> {
    let mut handles = Vec::with_capacity(ctx.max_workers + 1);

    for worker_id in 0..ctx.max_workers {
        let ctx = Arc::clone(&ctx);
        handles.push(tokio::spawn(async move {
            worker_loop(ctx, worker_id).await;
        }));
    }

    let sweeper_ctx = Arc::clone(&ctx);
    handles.push(tokio::spawn(async move {
        sweeper_loop(sweeper_ctx).await;
    }));

    handles
}

/// The orchestrator: claim a request, run load -> matrix -> solve -> format
/// -> persist, translate any failure into a terminal `failed` status. Errors
/// never escape to kill the loop.
async fn worker_loop(ctx: Arc<AppContext>, worker_id: usize) {
    info!(worker_id, "optimization worker started");

    while let Some(item) = ctx.queue.dequeue().await {
        let claimed = match ctx
            .requests
            .mark_processing(item.tenant_id, item.request_id)
            .await
        {
            Ok(claimed) => claimed,
            Err(db_error) => {
                error!(
                    request_id = item.request_id,
                    "failed to claim request: {db_error}"
                );
                continue;
            }
        };

        // Re-delivered or already handled by another worker.
        if !claimed {
            warn!(request_id = item.request_id, "request not claimable, skipping");
            continue;
        }

        info!(worker_id, request_id = item.request_id, "processing request");

        let outcome = tokio::time::timeout(JOB_TIMEOUT, process_request(&ctx, item)).await;

        let update = match outcome {
            Ok(Ok(result)) => {
                ctx.requests
                    .mark_completed(item.tenant_id, item.request_id, &result)
                    .await
            }
            Ok(Err(optimize_error)) => {
                warn!(
                    request_id = item.request_id,
                    "optimization failed: {optimize_error}"
                );
                ctx.requests
                    .mark_failed(item.tenant_id, item.request_id, &optimize_error.to_string())
                    .await
            }
            Err(_elapsed) => {
                warn!(request_id = item.request_id, "optimization timed out");
                ctx.requests
                    .mark_failed(
                        item.tenant_id,
                        item.request_id,
                        &OptimizeError::Timeout.to_string(),
                    )
                    .await
            }
        };

        if let Err(db_error) = update {
            error!(
                request_id = item.request_id,
                "failed to update request status: {db_error}"
            );
        }
    }

    info!(worker_id, "optimization worker stopped");
}

async fn process_request(
    ctx: &AppContext,
    item: QueuedRequest,
) -> Result<serde_json::Value, OptimizeError> {
    let request = ctx
        .requests
        .get(item.tenant_id, item.request_id)
        .await?
        .ok_or(OptimizeError::NotFound)?;

    let problem = ctx.loader.load(&request).await?;

    let job_points: Vec<_> = problem.jobs().iter().map(|job| job.location()).collect();
    let matrices = ctx
        .provider
        .matrix(
            problem.depot().location(),
            &job_points,
            problem.matrix_vehicle_type(),
        )
        .await?;

    // The solver is CPU-bound for its whole budget; give it its own thread.
    let (problem, solution) = tokio::task::spawn_blocking(move || {
        let solution = VrpSolver::new(&problem, &matrices).solve(SolverParams::default());
        (problem, solution)
    })
    .await
    .map_err(|join_error| OptimizeError::Internal(join_error.to_string()))?;

    let solution = solution.ok_or(OptimizeError::Infeasible)?;

    let formatted = ResultFormatter::new(&problem, &ctx.provider)
        .format(&solution)
        .await;

    ctx.persister.persist(&request, &formatted).await?;

    serde_json::to_value(&formatted)
        .map_err(|serde_error| OptimizeError::Internal(serde_error.to_string()))
}

/// Re-marks `processing` rows whose worker died (crash, kill) as failed once
/// they are older than the job timeout.
async fn sweeper_loop(ctx: Arc<AppContext>) {
    loop {
        tokio::time::sleep(SWEEP_INTERVAL).await;

        if let Err(db_error) = ctx.requests.sweep_stale_processing(JOB_TIMEOUT).await {
            error!("sweeper failed: {db_error}");
        }
    }
}
