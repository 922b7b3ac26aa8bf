#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use tripcheck_api::auth::jwt::{generate_access_token, JwtConfig};
use tripcheck_api::config::{InspectionPolicy, ServerConfig};
use tripcheck_api::router::build_app_router;
use tripcheck_api::state::AppState;
use tripcheck_api::ws::WsManager;
use tripcheck_core::types::DbId;
use tripcheck_events::EventBus;

pub const TEST_JWT_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

/// Build a test `ServerConfig` with safe defaults and the default policy.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            access_token_expiry_mins: 15,
        },
        policy: InspectionPolicy::default(),
        upload_dir: std::env::temp_dir().join("tripcheck-test-uploads"),
        public_base_url: "http://localhost:3000".to_string(),
    }
}

/// Build application state around `pool` with the given policy.
pub fn test_state(pool: PgPool, policy: InspectionPolicy) -> AppState {
    let mut config = test_config();
    config.policy = policy;
    AppState::new(
        pool,
        config,
        Arc::new(WsManager::new()),
        Arc::new(EventBus::default()),
    )
}

/// The production router and middleware stack around `state`.
pub fn app_from_state(state: AppState) -> Router {
    build_app_router(state)
}

pub fn build_test_app(pool: PgPool) -> Router {
    app_from_state(test_state(pool, InspectionPolicy::default()))
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

pub fn token_for(user_id: DbId, role: &str) -> String {
    generate_access_token(user_id, role.parse().unwrap(), &test_config().jwt).unwrap()
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, token: &str, body: serde_json::Value) -> Response {
    json_request(app, Method::POST, uri, token, body).await
}

pub async fn put_json(app: Router, uri: &str, token: &str, body: serde_json::Value) -> Response {
    json_request(app, Method::PUT, uri, token, body).await
}

async fn json_request(
    app: Router,
    method: Method,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

pub async fn seed_org(pool: &PgPool, name: &str, invite_code: &str) -> DbId {
    sqlx::query_scalar("INSERT INTO organizations (name, invite_code) VALUES ($1, $2) RETURNING id")
        .bind(name)
        .bind(invite_code)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn seed_user(pool: &PgPool, email: &str, role: &str, org_id: Option<DbId>) -> DbId {
    sqlx::query_scalar(
        "INSERT INTO users (email, first_name, last_name, role, org_id)
         VALUES ($1, 'Test', 'Driver', $2, $3) RETURNING id",
    )
    .bind(email)
    .bind(role)
    .bind(org_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn seed_vehicle(pool: &PgPool, org_id: Option<DbId>, mileage: Option<i64>) -> DbId {
    sqlx::query_scalar(
        "INSERT INTO vehicles (org_id, license_plate, mileage) VALUES ($1, 'TEST-001', $2) RETURNING id",
    )
    .bind(org_id)
    .bind(mileage)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// A template with one required item. Returns `(template_id, item_id)`.
pub async fn seed_template(pool: &PgPool, org_id: Option<DbId>) -> (DbId, DbId) {
    let template_id: DbId = sqlx::query_scalar(
        "INSERT INTO templates (org_id, name, is_default) VALUES ($1, 'Daily check', TRUE) RETURNING id",
    )
    .bind(org_id)
    .fetch_one(pool)
    .await
    .unwrap();
    let item_id: DbId = sqlx::query_scalar(
        "INSERT INTO template_items (template_id, name, question, required, sort_order)
         VALUES ($1, 'brakes', 'Do the brakes work?', TRUE, 1) RETURNING id",
    )
    .bind(template_id)
    .fetch_one(pool)
    .await
    .unwrap();
    (template_id, item_id)
}

pub async fn vehicle_mileage(pool: &PgPool, vehicle_id: DbId) -> Option<i64> {
    sqlx::query_scalar("SELECT mileage FROM vehicles WHERE id = $1")
        .bind(vehicle_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Shift an inspection's creation time into the past.
pub async fn age_inspection(pool: &PgPool, inspection_id: DbId, minutes: i64) {
    sqlx::query("UPDATE inspections SET created_at = NOW() - make_interval(mins => $2) WHERE id = $1")
        .bind(inspection_id)
        .bind(minutes as i32)
        .execute(pool)
        .await
        .unwrap();
}

/// A typical submission body.
pub fn submission(
    vehicle_id: DbId,
    template_id: DbId,
    kind: &str,
    start_mileage: i64,
) -> serde_json::Value {
    serde_json::json!({
        "vehicle_id": vehicle_id,
        "template_id": template_id,
        "type": kind,
        "results": {"brakes": "ok"},
        "start_mileage": start_mileage,
        "fuel_level": 80.0,
    })
}
