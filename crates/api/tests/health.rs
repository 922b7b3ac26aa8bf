mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use sqlx::PgPool;
use tripcheck_api::config::InspectionPolicy;

#[sqlx::test(migrations = "../db/migrations")]
async fn health_reports_database_and_connections(pool: PgPool) {
    let state = common::test_state(pool, InspectionPolicy::default());
    let _rx = state.ws_manager.add("conn-1".into(), 1, Some(1)).await;
    let _events = state.event_bus.subscribe();

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = common::send(common::app_from_state(state), request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let json = common::body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["db_healthy"], true);
    assert_eq!(json["ws_connections"], 1);
    assert_eq!(json["event_subscribers"], 1);
}
