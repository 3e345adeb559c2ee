use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use sqlx::PgPool;
use utoipa::{IntoParams, OpenApi};

use super::{
    dto::{DashboardResponse, DeviceDto, IngestRequest, SeriesDto},
    errors::AppError,
};
use crate::{
    aggregate::{DayBucket, TrendBucket, WindowStats},
    dashboard::DashboardService,
    db::models::{LightsState, Period},
    ingest::IngestService,
    timeline::Granularity,
};

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, IntoParams)]
pub struct DashboardParams {
    /// Owner whose devices are aggregated. Supplied by the presentation
    /// layer from its authenticated session.
    pub user_id: i64,
    /// View granularity; defaults to `day`.
    pub view: Option<Granularity>,
    /// Anchor token in the granularity's format (`YYYY-MM-DD`, `YYYY-Www`,
    /// `YYYY-MM`). Malformed or absent tokens resolve to today.
    pub date: Option<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Serve one aggregated dashboard window for a user's device set.
#[utoipa::path(
    get,
    path = "/dashboard",
    params(DashboardParams),
    responses(
        (status = 200, description = "Bucket rows, window stats, and navigation anchors", body = DashboardResponse),
        (status = 400, description = "Unknown view granularity"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "dashboard"
)]
pub async fn get_dashboard(
    State(pool): State<PgPool>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<DashboardResponse>, AppError> {
    let view = DashboardService::new(pool)
        .view(
            params.user_id,
            params.view.unwrap_or_default(),
            params.date.as_deref(),
        )
        .await?;
    Ok(Json(view.into()))
}

/// Accept one telemetry sample from a device.
///
/// Date, weekday, and period bucket are stamped from the server clock;
/// telemetry values are stored as given, without range validation.
#[utoipa::path(
    post,
    path = "/telemetry",
    request_body = IngestRequest,
    responses(
        (status = 200, description = "Sample stored", body = serde_json::Value),
        (status = 400, description = "Malformed payload"),
        (status = 404, description = "Unknown device id"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "telemetry"
)]
pub async fn ingest_telemetry(
    State(pool): State<PgPool>,
    Json(req): Json<IngestRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let lights = req
        .lights
        .parse::<LightsState>()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let service = IngestService::new(pool);
    if !service.device_exists(req.device_id).await? {
        return Err(AppError::NotFound(format!(
            "unknown device id: {}",
            req.device_id
        )));
    }

    service
        .record(req.device_id, req.temperature, req.humidity, req.voltage, lights)
        .await?;

    Ok(Json(serde_json::json!({ "status": "success" })))
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Returns `200 OK` with `{"status":"ok"}` when the server is running.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
    ),
    tag = "system"
)]
pub async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// OpenAPI spec
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    paths(get_dashboard, ingest_telemetry, health),
    components(schemas(
        DashboardResponse,
        SeriesDto,
        DeviceDto,
        DayBucket,
        TrendBucket,
        WindowStats,
        IngestRequest,
        Period,
        LightsState,
        Granularity,
    )),
    tags(
        (name = "dashboard", description = "Aggregated telemetry views"),
        (name = "telemetry", description = "Sample ingestion"),
        (name = "system",    description = "System endpoints"),
    ),
    info(
        title = "Greenhouse Telemetry API",
        version = "0.1.0",
        description = "Ingests greenhouse sensor samples and serves day/week/month aggregations"
    )
)]
pub struct ApiDoc;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use sqlx::PgPool;

    use crate::api::router;

    fn test_server(pool: PgPool) -> TestServer {
        TestServer::new(router(pool)).unwrap()
    }

    async fn insert_device(pool: &PgPool, user_id: i64, name: &str) -> i64 {
        sqlx::query_scalar(
            "INSERT INTO devices (user_id, device_name) VALUES ($1, $2) RETURNING id",
        )
        .bind(user_id)
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    #[allow(clippy::too_many_arguments)]
    async fn insert_sample(
        pool: &PgPool,
        device_id: i64,
        date: &str,
        period: &str,
        temperature: f64,
        voltage: f64,
        lights: &str,
        recorded_at: &str,
    ) {
        sqlx::query(
            "INSERT INTO samples \
               (device_id, sample_date, day_name, period, temperature, \
                humidity, voltage, lights, recorded_at) \
             VALUES ($1, $2::date, $3, $4::period, $5, $6, $7, \
                     $8::lights_state, $9::timestamptz)",
        )
        .bind(device_id)
        .bind(date)
        .bind("Wednesday")
        .bind(period)
        .bind(temperature)
        .bind(55.0)
        .bind(voltage)
        .bind(lights)
        .bind(recorded_at)
        .execute(pool)
        .await
        .unwrap();
    }

    async fn sample_count(pool: &PgPool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM samples")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    // -----------------------------------------------------------------------
    // GET /dashboard
    // -----------------------------------------------------------------------

    #[sqlx::test(migrations = "./migrations")]
    async fn dashboard_without_devices_returns_empty_series(pool: PgPool) {
        let server = test_server(pool);
        let resp = server
            .get("/dashboard")
            .add_query_param("user_id", 1)
            .await;
        resp.assert_status_ok();

        let body: Value = resp.json();
        assert_eq!(body["data"], json!([]));
        assert_eq!(body["devices"], json!([]));
        assert!(body["stats"]["low_temp"].is_null());
        assert!(body["stats"]["avg_voltage"].is_null());
        assert!(body["selected_date"].is_string());
        assert!(body["prev_date"].is_string());
        assert!(body["next_date"].is_string());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn dashboard_day_view_latest_sample_wins(pool: PgPool) {
        let device = insert_device(&pool, 1, "greenhouse-1").await;
        insert_sample(&pool, device, "2025-01-01", "Morning", 20.0, 3.6, "OFF",
            "2025-01-01T08:00:00Z").await;
        insert_sample(&pool, device, "2025-01-01", "Morning", 25.0, 3.8, "ON",
            "2025-01-01T09:00:00Z").await;

        let server = test_server(pool);
        let resp = server
            .get("/dashboard")
            .add_query_param("user_id", 1)
            .add_query_param("view", "day")
            .add_query_param("date", "2025-01-01")
            .await;
        resp.assert_status_ok();

        let body: Value = resp.json();
        assert_eq!(body["selected_date"], "2025-01-01");
        assert_eq!(body["prev_date"], "2024-12-31");
        assert_eq!(body["next_date"], "2025-01-02");

        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["period"], "Morning");
        assert_eq!(data[0]["temperature"], 25.0);
        assert_eq!(data[0]["lights"], "ON");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn dashboard_week_view_averages_per_date(pool: PgPool) {
        let device = insert_device(&pool, 1, "greenhouse-1").await;
        // 2025-01-01 is a Wednesday in ISO week 2025-W01.
        insert_sample(&pool, device, "2025-01-01", "Morning", 20.0, 3.6, "ON",
            "2025-01-01T08:00:00Z").await;
        insert_sample(&pool, device, "2025-01-01", "Evening", 22.0, 3.8, "OFF",
            "2025-01-01T20:00:00Z").await;

        let server = test_server(pool);
        let resp = server
            .get("/dashboard")
            .add_query_param("user_id", 1)
            .add_query_param("view", "week")
            .add_query_param("date", "2025-W01")
            .await;
        resp.assert_status_ok();

        let body: Value = resp.json();
        assert_eq!(body["selected_date"], "2025-W01");
        assert_eq!(body["prev_date"], "2024-W52");
        assert_eq!(body["next_date"], "2025-W02");

        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["date"], "2025-01-01");
        assert_eq!(data[0]["avg_temp"], 21.0);
        assert_eq!(data[0]["avg_voltage"], 3.7);
        assert_eq!(data[0]["lights_on_pct"], 50.0);

        assert_eq!(body["stats"]["low_temp"], 20.0);
        assert_eq!(body["stats"]["high_temp"], 22.0);
        assert_eq!(body["stats"]["avg_voltage"], 3.7);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn dashboard_month_view_handles_leap_february(pool: PgPool) {
        let device = insert_device(&pool, 1, "greenhouse-1").await;
        insert_sample(&pool, device, "2024-02-29", "Morning", 18.0, 3.6, "OFF",
            "2024-02-29T08:00:00Z").await;

        let server = test_server(pool);
        let resp = server
            .get("/dashboard")
            .add_query_param("user_id", 1)
            .add_query_param("view", "month")
            .add_query_param("date", "2024-02")
            .await;
        resp.assert_status_ok();

        let body: Value = resp.json();
        assert_eq!(body["selected_date"], "2024-02");
        assert_eq!(body["prev_date"], "2024-01");
        assert_eq!(body["next_date"], "2024-03");

        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["date"], "2024-02-29");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn dashboard_malformed_date_falls_back_to_today(pool: PgPool) {
        let server = test_server(pool);
        let resp = server
            .get("/dashboard")
            .add_query_param("user_id", 1)
            .add_query_param("view", "day")
            .add_query_param("date", "not-a-date")
            .await;
        resp.assert_status_ok();

        let body: Value = resp.json();
        let today = chrono::Local::now().date_naive().format("%Y-%m-%d").to_string();
        assert_eq!(body["selected_date"], today.as_str());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn dashboard_unknown_view_is_client_error(pool: PgPool) {
        let server = test_server(pool);
        let resp = server
            .get("/dashboard")
            .add_query_param("user_id", 1)
            .add_query_param("view", "fortnight")
            .await;
        assert!(resp.status_code().is_client_error());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn dashboard_excludes_other_users_devices(pool: PgPool) {
        let device = insert_device(&pool, 1, "greenhouse-1").await;
        insert_sample(&pool, device, "2025-01-01", "Morning", 20.0, 3.6, "ON",
            "2025-01-01T08:00:00Z").await;

        let server = test_server(pool);
        let resp = server
            .get("/dashboard")
            .add_query_param("user_id", 2)
            .add_query_param("view", "day")
            .add_query_param("date", "2025-01-01")
            .await;
        resp.assert_status_ok();

        let body: Value = resp.json();
        assert_eq!(body["devices"], json!([]));
        assert_eq!(body["data"], json!([]));
        assert!(body["stats"]["low_temp"].is_null());
    }

    // -----------------------------------------------------------------------
    // POST /telemetry
    // -----------------------------------------------------------------------

    #[sqlx::test(migrations = "./migrations")]
    async fn telemetry_persists_one_sample(pool: PgPool) {
        let device = insert_device(&pool, 1, "greenhouse-1").await;

        let server = test_server(pool.clone());
        let resp = server
            .post("/telemetry")
            .json(&json!({
                "device_id": device,
                "temperature": 21.5,
                "humidity": 60.0,
                "voltage": 3.7,
                "lights": "on"
            }))
            .await;
        resp.assert_status_ok();

        let body: Value = resp.json();
        assert_eq!(body["status"], "success");
        assert_eq!(sample_count(&pool).await, 1);

        // Lights are case-normalized upward; period and weekday are stamped
        // server-side.
        let (lights, day_name): (String, String) = sqlx::query_as(
            "SELECT lights::text, day_name FROM samples WHERE device_id = $1",
        )
        .bind(device)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(lights, "ON");
        assert!(!day_name.is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn telemetry_missing_device_id_is_client_error(pool: PgPool) {
        let server = test_server(pool.clone());
        let resp = server
            .post("/telemetry")
            .json(&json!({
                "temperature": 21.5,
                "humidity": 60.0,
                "voltage": 3.7,
                "lights": "ON"
            }))
            .await;
        assert!(resp.status_code().is_client_error());
        assert_eq!(sample_count(&pool).await, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn telemetry_unknown_device_is_rejected(pool: PgPool) {
        let server = test_server(pool.clone());
        let resp = server
            .post("/telemetry")
            .json(&json!({
                "device_id": 9999,
                "temperature": 21.5,
                "humidity": 60.0,
                "voltage": 3.7,
                "lights": "ON"
            }))
            .await;
        assert!(resp.status_code().is_client_error());
        assert_eq!(sample_count(&pool).await, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn telemetry_invalid_lights_is_rejected(pool: PgPool) {
        let device = insert_device(&pool, 1, "greenhouse-1").await;

        let server = test_server(pool.clone());
        let resp = server
            .post("/telemetry")
            .json(&json!({
                "device_id": device,
                "temperature": 21.5,
                "humidity": 60.0,
                "voltage": 3.7,
                "lights": "DIM"
            }))
            .await;
        assert!(resp.status_code().is_client_error());
        assert_eq!(sample_count(&pool).await, 0);
    }

    // -----------------------------------------------------------------------
    // GET /health
    // -----------------------------------------------------------------------

    #[sqlx::test(migrations = "./migrations")]
    async fn health_returns_ok(pool: PgPool) {
        let server = test_server(pool);
        let resp = server.get("/health").await;
        resp.assert_status_ok();
        let body: Value = resp.json();
        assert_eq!(body["status"], "ok");
    }

    // -----------------------------------------------------------------------
    // GET /api-docs/openapi.json
    // -----------------------------------------------------------------------

    #[sqlx::test(migrations = "./migrations")]
    async fn openapi_spec_is_served(pool: PgPool) {
        let server = test_server(pool);
        let resp = server.get("/api-docs/openapi.json").await;
        resp.assert_status_ok();
        let body: Value = resp.json();
        assert_eq!(body["info"]["title"], "Greenhouse Telemetry API");
    }
}
