//! HTTP-level integration tests for the inspection lifecycle: draft
//! creation, submission, continuity checks, and the edit window.

mod common;

use axum::http::StatusCode;
use common::{
    age_inspection, body_json, get, post_json, put_json, seed_org, seed_template, seed_user,
    seed_vehicle, submission, token_for, vehicle_mileage,
};
use serde_json::json;
use sqlx::PgPool;
use tokio::task::JoinSet;
use tripcheck_db::repositories::InspectionRepo;

// ---------------------------------------------------------------------------
// Start
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn start_is_idempotent_per_triple(pool: PgPool) {
    let org = seed_org(&pool, "Fleet", "FLEET7").await;
    let driver = seed_user(&pool, "d1@example.com", "driver", Some(org)).await;
    let vehicle = seed_vehicle(&pool, Some(org), None).await;
    let (template, _) = seed_template(&pool, Some(org)).await;
    let token = token_for(driver, "driver");
    let body = json!({"vehicle_id": vehicle, "template_id": template});

    let first = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/inspections/start",
        &token,
        body.clone(),
    )
    .await;
    assert_eq!(first.status(), StatusCode::OK);
    let first = body_json(first).await;
    assert_eq!(first["type"], "pre-trip");
    assert_eq!(first["stage"], "draft");
    assert_eq!(first["is_draft"], true);
    assert_eq!(first["driver_full_name"], "Test Driver");

    let second = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/inspections/start",
        &token,
        body,
    )
    .await;
    let second = body_json(second).await;
    assert_eq!(second["id"], first["id"]);

    assert_eq!(InspectionRepo::count_drafts(&pool, driver, vehicle).await.unwrap(), 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn concurrent_starts_share_one_draft(pool: PgPool) {
    let driver = seed_user(&pool, "d1@example.com", "driver", None).await;
    let vehicle = seed_vehicle(&pool, None, None).await;
    let (template, _) = seed_template(&pool, None).await;
    let app = common::build_test_app(pool.clone());
    let token = token_for(driver, "driver");
    let body = json!({"vehicle_id": vehicle, "template_id": template});

    let mut requests = JoinSet::new();
    for _ in 0..6 {
        let (app, token, body) = (app.clone(), token.clone(), body.clone());
        requests.spawn(async move {
            let response = post_json(app, "/api/v1/inspections/start", &token, body).await;
            (response.status(), body_json(response).await)
        });
    }

    let mut ids = Vec::new();
    while let Some(joined) = requests.join_next().await {
        let (status, view) = joined.unwrap();
        assert_eq!(status, StatusCode::OK, "{view}");
        ids.push(view["id"].as_i64().unwrap());
    }
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 1);
    assert_eq!(InspectionRepo::count_drafts(&pool, driver, vehicle).await.unwrap(), 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn admins_cannot_start_inspections(pool: PgPool) {
    let org = seed_org(&pool, "Fleet", "FLEET7").await;
    let admin = seed_user(&pool, "a@example.com", "admin", Some(org)).await;
    let vehicle = seed_vehicle(&pool, Some(org), None).await;

    let response = post_json(
        common::build_test_app(pool),
        "/api/v1/inspections/start",
        &token_for(admin, "admin"),
        json!({"vehicle_id": vehicle}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn start_with_unknown_vehicle_is_404(pool: PgPool) {
    let driver = seed_user(&pool, "d1@example.com", "driver", None).await;
    let response = post_json(
        common::build_test_app(pool),
        "/api/v1/inspections/start",
        &token_for(driver, "driver"),
        json!({"vehicle_id": 999_999}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn missing_token_is_401(pool: PgPool) {
    let response = post_json(
        common::build_test_app(pool),
        "/api/v1/inspections/start",
        "not-a-jwt",
        json!({"vehicle_id": 1}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Submit and continuity
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn pre_trip_then_post_trip_and_mileage_regression(pool: PgPool) {
    let org = seed_org(&pool, "Fleet", "FLEET7").await;
    let driver = seed_user(&pool, "d1@example.com", "driver", Some(org)).await;
    let vehicle = seed_vehicle(&pool, Some(org), None).await;
    let (template, _) = seed_template(&pool, Some(org)).await;
    let token = token_for(driver, "driver");
    let start = json!({"vehicle_id": vehicle, "template_id": template});

    // Pre-trip.
    let draft = body_json(
        post_json(
            common::build_test_app(pool.clone()),
            "/api/v1/inspections/start",
            &token,
            start.clone(),
        )
        .await,
    )
    .await;
    assert_eq!(draft["type"], "pre-trip");

    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/inspections/submit",
        &token,
        submission(vehicle, template, "pre-trip", 1000),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let submitted = body_json(response).await;
    assert_eq!(submitted["id"], draft["id"]);
    assert_eq!(submitted["is_draft"], false);
    assert_eq!(submitted["stage"], "submitted");
    assert_eq!(submitted["editability"], "editable");
    assert!(submitted["mileage"].is_null());
    assert_eq!(vehicle_mileage(&pool, vehicle).await, Some(1000));

    // Post-trip draft follows automatically.
    let draft = body_json(
        post_json(
            common::build_test_app(pool.clone()),
            "/api/v1/inspections/start",
            &token,
            start,
        )
        .await,
    )
    .await;
    assert_eq!(draft["type"], "post-trip");

    // Mileage below the vehicle's recorded value is rejected and nothing changes.
    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/inspections/submit",
        &token,
        json!({
            "inspection_id": draft["id"],
            "results": {"brakes": "ok"},
            "start_mileage": 950,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = body_json(response).await;
    assert_eq!(error["code"], "VALIDATION_ERROR");
    assert!(error["error"]
        .as_str()
        .unwrap()
        .contains("cannot be less than vehicle's current mileage"));
    assert_eq!(vehicle_mileage(&pool, vehicle).await, Some(1000));
    assert_eq!(InspectionRepo::count_drafts(&pool, driver, vehicle).await.unwrap(), 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn post_trip_mismatch_is_reported_as_warning(pool: PgPool) {
    let driver = seed_user(&pool, "d1@example.com", "driver", None).await;
    let vehicle = seed_vehicle(&pool, None, None).await;
    let (template, _) = seed_template(&pool, None).await;
    let token = token_for(driver, "driver");

    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/inspections/submit",
        &token,
        submission(vehicle, template, "pre-trip", 1000),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/inspections/submit",
        &token,
        submission(vehicle, template, "post-trip", 1120),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let view = body_json(response).await;
    assert_eq!(view["warnings"][0]["code"], "POST_TRIP_MILEAGE_MISMATCH");
    assert_eq!(view["mileage"], 120);
    assert_eq!(vehicle_mileage(&pool, vehicle).await, Some(1120));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn submit_removes_stale_drafts(pool: PgPool) {
    let driver = seed_user(&pool, "d1@example.com", "driver", None).await;
    let vehicle = seed_vehicle(&pool, None, None).await;
    let (template_a, _) = seed_template(&pool, None).await;
    let (template_b, _) = seed_template(&pool, None).await;
    let token = token_for(driver, "driver");

    for template in [template_a, template_b] {
        let response = post_json(
            common::build_test_app(pool.clone()),
            "/api/v1/inspections/start",
            &token,
            json!({"vehicle_id": vehicle, "template_id": template}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(InspectionRepo::count_drafts(&pool, driver, vehicle).await.unwrap(), 2);

    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/inspections/submit",
        &token,
        submission(vehicle, template_a, "pre-trip", 10),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(InspectionRepo::count_drafts(&pool, driver, vehicle).await.unwrap(), 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn concurrent_submits_of_sibling_drafts_settle_cleanly(pool: PgPool) {
    let driver = seed_user(&pool, "d1@example.com", "driver", None).await;
    let (template_a, _) = seed_template(&pool, None).await;
    let (template_b, _) = seed_template(&pool, None).await;
    let app = common::build_test_app(pool.clone());
    let token = token_for(driver, "driver");

    for round in 0..10 {
        let vehicle = seed_vehicle(&pool, None, None).await;
        let mut requests = JoinSet::new();
        for template in [template_a, template_b] {
            let draft = body_json(
                post_json(
                    app.clone(),
                    "/api/v1/inspections/start",
                    &token,
                    json!({"vehicle_id": vehicle, "template_id": template}),
                )
                .await,
            )
            .await;
            let mut body = submission(vehicle, template, "pre-trip", 10);
            body["inspection_id"] = draft["id"].clone();

            let (app, token) = (app.clone(), token.clone());
            requests.spawn(async move {
                post_json(app, "/api/v1/inspections/submit", &token, body)
                    .await
                    .status()
            });
        }

        let mut statuses = Vec::new();
        while let Some(joined) = requests.join_next().await {
            statuses.push(joined.unwrap());
        }
        statuses.sort();
        // The loser's draft was either finalized away under its lock or
        // already gone when it was read.
        assert_eq!(statuses[0], StatusCode::CREATED, "round {round}: {statuses:?}");
        assert!(
            matches!(statuses[1], StatusCode::NOT_FOUND | StatusCode::CONFLICT),
            "round {round}: {statuses:?}"
        );
        assert_eq!(InspectionRepo::count_drafts(&pool, driver, vehicle).await.unwrap(), 0);
        assert_eq!(vehicle_mileage(&pool, vehicle).await, Some(10));
    }
}

#[sqlx::test(migrations = "../db/migrations")]
async fn submit_reattaches_detached_draft(pool: PgPool) {
    let driver = seed_user(&pool, "d1@example.com", "driver", None).await;
    let vehicle = seed_vehicle(&pool, None, None).await;
    let (template, _) = seed_template(&pool, None).await;
    let token = token_for(driver, "driver");

    let draft = body_json(
        post_json(
            common::build_test_app(pool.clone()),
            "/api/v1/inspections/start",
            &token,
            json!({"vehicle_id": vehicle, "template_id": template}),
        )
        .await,
    )
    .await;
    sqlx::query("UPDATE inspections SET vehicle_id = NULL WHERE id = $1")
        .bind(draft["id"].as_i64().unwrap())
        .execute(&pool)
        .await
        .unwrap();

    let mut body = submission(vehicle, template, "pre-trip", 500);
    body["inspection_id"] = draft["id"].clone();
    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/inspections/submit",
        &token,
        body,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let view = body_json(response).await;
    assert_eq!(view["id"], draft["id"]);
    assert_eq!(view["vehicle_id"], vehicle);
    assert_eq!(view["is_draft"], false);
    assert_eq!(vehicle_mileage(&pool, vehicle).await, Some(500));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn submit_validates_results_and_fuel(pool: PgPool) {
    let driver = seed_user(&pool, "d1@example.com", "driver", None).await;
    let vehicle = seed_vehicle(&pool, None, None).await;
    let (template, _) = seed_template(&pool, None).await;
    let token = token_for(driver, "driver");

    let mut empty_results = submission(vehicle, template, "pre-trip", 10);
    empty_results["results"] = json!({});
    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/inspections/submit",
        &token,
        empty_results,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut bad_fuel = submission(vehicle, template, "pre-trip", 10);
    bad_fuel["fuel_level"] = json!(140.0);
    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/inspections/submit",
        &token,
        bad_fuel,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut no_kind = submission(vehicle, template, "pre-trip", 10);
    no_kind.as_object_mut().unwrap().remove("type");
    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/inspections/submit",
        &token,
        no_kind,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(vehicle_mileage(&pool, vehicle).await, None);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn foreign_template_is_forbidden(pool: PgPool) {
    let org_a = seed_org(&pool, "A", "CODE-A").await;
    let org_b = seed_org(&pool, "B", "CODE-B").await;
    let driver = seed_user(&pool, "d1@example.com", "driver", Some(org_a)).await;
    let vehicle = seed_vehicle(&pool, Some(org_a), None).await;
    let (template, _) = seed_template(&pool, Some(org_b)).await;

    let response = post_json(
        common::build_test_app(pool),
        "/api/v1/inspections/submit",
        &token_for(driver, "driver"),
        submission(vehicle, template, "pre-trip", 10),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Update and the edit window
// ---------------------------------------------------------------------------

async fn submitted_inspection(pool: &PgPool, driver: i64, vehicle: i64, template: i64) -> i64 {
    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/inspections/submit",
        &token_for(driver, "driver"),
        submission(vehicle, template, "pre-trip", 1000),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["id"].as_i64().unwrap()
}

#[sqlx::test(migrations = "../db/migrations")]
async fn owner_edits_inside_window(pool: PgPool) {
    let driver = seed_user(&pool, "d1@example.com", "driver", None).await;
    let vehicle = seed_vehicle(&pool, None, None).await;
    let (template, _) = seed_template(&pool, None).await;
    let id = submitted_inspection(&pool, driver, vehicle, template).await;

    let response = put_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/inspections/{id}"),
        &token_for(driver, "driver"),
        json!({"notes": "Left mirror loose", "start_mileage": 1005}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let view = body_json(response).await;
    assert_eq!(view["notes"], "Left mirror loose");
    assert_eq!(view["start_mileage"], 1005);
    assert_eq!(view["type"], "pre-trip");
    assert_eq!(vehicle_mileage(&pool, vehicle).await, Some(1005));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn edit_rejects_oversized_notes(pool: PgPool) {
    let driver = seed_user(&pool, "d1@example.com", "driver", None).await;
    let vehicle = seed_vehicle(&pool, None, None).await;
    let (template, _) = seed_template(&pool, None).await;
    let id = submitted_inspection(&pool, driver, vehicle, template).await;

    let response = put_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/inspections/{id}"),
        &token_for(driver, "driver"),
        json!({"notes": "x".repeat(5001)}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = put_json(
        common::build_test_app(pool),
        &format!("/api/v1/inspections/{id}"),
        &token_for(driver, "driver"),
        json!({"fuel_notes": "x".repeat(1001)}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn edit_after_window_is_forbidden(pool: PgPool) {
    let driver = seed_user(&pool, "d1@example.com", "driver", None).await;
    let vehicle = seed_vehicle(&pool, None, None).await;
    let (template, _) = seed_template(&pool, None).await;
    let id = submitted_inspection(&pool, driver, vehicle, template).await;
    age_inspection(&pool, id, 31).await;

    let response = put_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/inspections/{id}"),
        &token_for(driver, "driver"),
        json!({"notes": "too late"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let view = body_json(
        get(
            common::build_test_app(pool),
            &format!("/api/v1/inspections/{id}"),
            &token_for(driver, "driver"),
        )
        .await,
    )
    .await;
    assert_eq!(view["editability"], "locked");
    assert!(view["notes"].is_null());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn other_driver_cannot_edit(pool: PgPool) {
    let driver = seed_user(&pool, "d1@example.com", "driver", None).await;
    let other = seed_user(&pool, "d2@example.com", "driver", None).await;
    let vehicle = seed_vehicle(&pool, None, None).await;
    let (template, _) = seed_template(&pool, None).await;
    let id = submitted_inspection(&pool, driver, vehicle, template).await;

    let response = put_json(
        common::build_test_app(pool),
        &format!("/api/v1/inspections/{id}"),
        &token_for(other, "driver"),
        json!({"notes": "not mine"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn editing_a_draft_is_rejected(pool: PgPool) {
    let driver = seed_user(&pool, "d1@example.com", "driver", None).await;
    let vehicle = seed_vehicle(&pool, None, None).await;
    let token = token_for(driver, "driver");

    let draft = body_json(
        post_json(
            common::build_test_app(pool.clone()),
            "/api/v1/inspections/start",
            &token,
            json!({"vehicle_id": vehicle}),
        )
        .await,
    )
    .await;

    let response = put_json(
        common::build_test_app(pool),
        &format!("/api/v1/inspections/{}", draft["id"]),
        &token,
        json!({"notes": "x"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
