//! Database-backed tests. Each test runs against a fresh database created by
//! `#[sqlx::test]` from the crate migrations; `DATABASE_URL` must point at a
//! Postgres server with PostGIS available.

use chrono::NaiveDate;
use convoy_store::{
    loader::DataLoader,
    models::{
        job::JobStatus,
        request::{NewOptimizationRequest, OptimizationGoal, OptimizationStatus},
        route::{RouteRow, RouteStatus, RouteStopRow, StopType},
    },
    persister::RoutePersister,
    requests::RequestStore,
    result::{OptimizationResult, RouteResult, StopResult, UnassignedJob},
};
use sqlx::PgPool;

struct Fixture {
    tenant_id: i64,
    depot_id: i64,
    job_ids: Vec<i64>,
    driver_id: i64,
}

async fn seed(pool: &PgPool) -> Fixture {
    let tenant_id: i64 =
        sqlx::query_scalar("INSERT INTO tenant (name) VALUES ('acme') RETURNING id")
            .fetch_one(pool)
            .await
            .unwrap();

    let depot_id: i64 = sqlx::query_scalar(
        "INSERT INTO depot (tenant_id, name, location, address) \
         VALUES ($1, 'Main depot', ST_GeomFromText('POINT(72.54 23.02)', 4326), 'Depot street 1') \
         RETURNING id",
    )
    .bind(tenant_id)
    .fetch_one(pool)
    .await
    .unwrap();

    let driver_id: i64 = sqlx::query_scalar(
        "INSERT INTO team_member \
             (tenant_id, name, work_start_time, work_end_time, allowed_overtime) \
         VALUES ($1, 'Asha', '09:00', '17:00', false) RETURNING id",
    )
    .bind(tenant_id)
    .fetch_one(pool)
    .await
    .unwrap();

    let mut job_ids = Vec::new();
    for index in 0..2 {
        let job_id: i64 = sqlx::query_scalar(
            "INSERT INTO job \
                 (tenant_id, status, location, address_formatted, service_duration_minutes) \
             VALUES ($1, 'draft', ST_GeomFromText($2, 4326), $3, 5) RETURNING id",
        )
        .bind(tenant_id)
        .bind(format!("POINT({} 23.03)", 72.55 + 0.01 * index as f64))
        .bind(format!("Job site {index}"))
        .fetch_one(pool)
        .await
        .unwrap();
        job_ids.push(job_id);
    }

    Fixture {
        tenant_id,
        depot_id,
        job_ids,
        driver_id,
    }
}

fn new_request(fixture: &Fixture) -> NewOptimizationRequest {
    NewOptimizationRequest {
        route_name: "Monday run".to_string(),
        depot_id: fixture.depot_id,
        job_ids: fixture.job_ids.clone(),
        driver_ids: vec![fixture.driver_id],
        scheduled_date: NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
        goal: OptimizationGoal::MinTime,
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_request_lifecycle(pool: PgPool) {
    let fixture = seed(&pool).await;
    let store = RequestStore::new(pool);

    let row = store
        .create(fixture.tenant_id, &new_request(&fixture))
        .await
        .unwrap();
    assert_eq!(row.status, OptimizationStatus::Queued);
    assert_eq!(row.job_ids, fixture.job_ids);

    // Exactly one claim wins.
    assert!(store.mark_processing(fixture.tenant_id, row.id).await.unwrap());
    assert!(!store.mark_processing(fixture.tenant_id, row.id).await.unwrap());

    store
        .mark_completed(fixture.tenant_id, row.id, &serde_json::json!({"status": "success"}))
        .await
        .unwrap();

    let fetched = store.get(fixture.tenant_id, row.id).await.unwrap().unwrap();
    assert_eq!(fetched.status, OptimizationStatus::Completed);
    assert!(fetched.started_at.is_some());
    assert!(fetched.completed_at.is_some());

    // Terminal states stay put; a late failure update must not apply.
    store
        .mark_failed(fixture.tenant_id, row.id, "too late")
        .await
        .unwrap();
    let fetched = store.get(fixture.tenant_id, row.id).await.unwrap().unwrap();
    assert_eq!(fetched.status, OptimizationStatus::Completed);
    assert!(fetched.error_message.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_rename_changes_nothing_else(pool: PgPool) {
    let fixture = seed(&pool).await;
    let store = RequestStore::new(pool);

    let row = store
        .create(fixture.tenant_id, &new_request(&fixture))
        .await
        .unwrap();

    let renamed = store
        .rename(fixture.tenant_id, row.id, "Tuesday run")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(renamed.route_name, "Tuesday run");
    assert_eq!(renamed.status, row.status);
    assert_eq!(renamed.job_ids, row.job_ids);
    assert_eq!(renamed.driver_ids, row.driver_ids);
    assert_eq!(renamed.scheduled_date, row.scheduled_date);
    assert_eq!(renamed.created_at, row.created_at);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_tenant_isolation_on_reads(pool: PgPool) {
    let fixture = seed(&pool).await;
    let store = RequestStore::new(pool.clone());

    let row = store
        .create(fixture.tenant_id, &new_request(&fixture))
        .await
        .unwrap();

    let other_tenant: i64 =
        sqlx::query_scalar("INSERT INTO tenant (name) VALUES ('intruder') RETURNING id")
            .fetch_one(&pool)
            .await
            .unwrap();

    assert!(store.get(other_tenant, row.id).await.unwrap().is_none());
    assert!(store.list(other_tenant).await.unwrap().is_empty());
    assert!(!store.delete(other_tenant, row.id).await.unwrap());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_loader_rejects_foreign_job(pool: PgPool) {
    let fixture = seed(&pool).await;

    let other_tenant: i64 =
        sqlx::query_scalar("INSERT INTO tenant (name) VALUES ('other') RETURNING id")
            .fetch_one(&pool)
            .await
            .unwrap();
    let foreign_job: i64 = sqlx::query_scalar(
        "INSERT INTO job (tenant_id, status, location) \
         VALUES ($1, 'draft', ST_GeomFromText('POINT(72.6 23.0)', 4326)) RETURNING id",
    )
    .bind(other_tenant)
    .fetch_one(&pool)
    .await
    .unwrap();

    let loader = DataLoader::new(pool);
    let mut request = new_request(&fixture);
    request.job_ids.push(foreign_job);

    let error = loader.validate(fixture.tenant_id, &request).await.unwrap_err();
    assert!(error.to_string().contains("not found"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_loader_builds_problem(pool: PgPool) {
    let fixture = seed(&pool).await;
    let store = RequestStore::new(pool.clone());
    let loader = DataLoader::new(pool);

    let row = store
        .create(fixture.tenant_id, &new_request(&fixture))
        .await
        .unwrap();

    let problem = loader.load(&row).await.unwrap();

    assert_eq!(problem.jobs().len(), 2);
    assert_eq!(problem.drivers().len(), 1);
    // Job order follows the submitted id array.
    assert_eq!(problem.jobs()[0].id(), fixture.job_ids[0]);
    assert_eq!(problem.jobs()[0].service_duration(), 300);
    assert_eq!(problem.drivers()[0].work_start(), Some(9 * 3600));
    assert_eq!(problem.depot().location().x(), 72.54);
}

fn formatted_result(fixture: &Fixture) -> OptimizationResult {
    let arrival = NaiveDate::from_ymd_opt(2025, 6, 10)
        .unwrap()
        .and_hms_opt(9, 10, 0)
        .unwrap();

    let stops = vec![
        StopResult {
            stop_type: StopType::DepotStart,
            job_id: None,
            arrival_time: arrival,
            departure_time: Some(arrival),
            address: None,
            lat: Some(23.02),
            lng: Some(72.54),
            distance_to_next_stop_meters: Some(5000),
            time_to_next_stop_seconds: Some(600),
        },
        StopResult {
            stop_type: StopType::Job,
            job_id: Some(fixture.job_ids[0]),
            arrival_time: arrival,
            departure_time: Some(arrival),
            address: Some("Job site 0".to_string()),
            lat: Some(23.03),
            lng: Some(72.55),
            distance_to_next_stop_meters: Some(5000),
            time_to_next_stop_seconds: Some(600),
        },
        StopResult {
            stop_type: StopType::DepotEnd,
            job_id: None,
            arrival_time: arrival,
            departure_time: None,
            address: None,
            lat: Some(23.02),
            lng: Some(72.54),
            distance_to_next_stop_meters: None,
            time_to_next_stop_seconds: None,
        },
    ];

    OptimizationResult {
        status: "success".to_string(),
        optimization_goal: OptimizationGoal::MinTime,
        total_distance_meters: 10_000,
        total_duration_seconds: 1800,
        routes: vec![RouteResult {
            driver_id: fixture.driver_id,
            driver_name: "Asha".to_string(),
            vehicle_id: None,
            vehicle_type: None,
            total_distance_meters: 10_000,
            total_duration_seconds: 1800,
            total_distance_saved_meters: 0,
            total_time_saved_seconds: 0,
            polyline: None,
            stops,
            break_info: None,
            idle_blocks: vec![],
        }],
        unassigned_jobs: vec![UnassignedJob {
            job_id: fixture.job_ids[1],
            reason: "Could not be visited within constraints".to_string(),
            address: None,
        }],
        generated_at: chrono::Utc::now(),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_persister_writes_routes_and_assigns_jobs(pool: PgPool) {
    let fixture = seed(&pool).await;
    let store = RequestStore::new(pool.clone());
    let persister = RoutePersister::new(pool.clone());

    let request = store
        .create(fixture.tenant_id, &new_request(&fixture))
        .await
        .unwrap();

    let route_ids = persister
        .persist(&request, &formatted_result(&fixture))
        .await
        .unwrap();
    assert_eq!(route_ids.len(), 1);

    let route: RouteRow = sqlx::query_as(
        "SELECT id, tenant_id, optimization_request_id, driver_id, vehicle_id, depot_id, \
                status, scheduled_date, total_distance_meters, total_duration_seconds, \
                total_distance_saved_meters, total_time_saved_seconds, route_polyline \
         FROM route WHERE id = $1",
    )
    .bind(route_ids[0])
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(route.status, RouteStatus::Scheduled);
    assert_eq!(route.driver_id, Some(fixture.driver_id));
    assert_eq!(route.total_distance_meters, 10_000.0);
    assert_eq!(route.scheduled_date, Some(request.scheduled_date));

    let stops: Vec<RouteStopRow> = sqlx::query_as(
        "SELECT id, route_id, job_id, sequence_order, stop_type, planned_arrival_time, \
                planned_departure_time, estimated_distance_from_prev \
         FROM route_stop WHERE route_id = $1 ORDER BY sequence_order",
    )
    .bind(route_ids[0])
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(stops.len(), 3);
    assert_eq!(stops[0].stop_type, StopType::DepotStart);
    assert_eq!(stops[1].stop_type, StopType::Job);
    assert_eq!(stops[1].job_id, Some(fixture.job_ids[0]));
    assert_eq!(stops[1].estimated_distance_from_prev, Some(5000.0));
    assert_eq!(stops[2].stop_type, StopType::DepotEnd);

    let (status, assigned_to, route_id): (JobStatus, Option<i64>, Option<i64>) = sqlx::query_as(
        "SELECT status, assigned_to, route_id FROM job WHERE id = $1",
    )
    .bind(fixture.job_ids[0])
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(status, JobStatus::Assigned);
    assert_eq!(assigned_to, Some(fixture.driver_id));
    assert_eq!(route_id, Some(route_ids[0]));

    // The dropped job stays draft.
    let (status,): (JobStatus,) =
        sqlx::query_as("SELECT status FROM job WHERE id = $1")
            .bind(fixture.job_ids[1])
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(status, JobStatus::Draft);

    // Deleting the request cascades to routes and stops.
    assert!(store.delete(fixture.tenant_id, request.id).await.unwrap());
    let (remaining,): (i64,) = sqlx::query_as("SELECT count(*) FROM route")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}
