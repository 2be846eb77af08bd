mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use common::{
    body_json, create_tenant, create_test_grade, create_test_student, create_test_subject,
    create_test_user, get_auth_token, send, setup_test_app,
};
use scolaris_auth::Role;
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;

#[sqlx::test(migrations = "./migrations")]
async fn test_public_result_is_coefficient_weighted(pool: PgPool) {
    let tenant = create_tenant(&pool).await;
    let french = create_test_subject(&pool, tenant.school.id, "French", 2).await;
    let student = create_test_student(&pool, tenant.school.id, tenant.class_id, None).await;

    create_test_grade(&pool, student.id, tenant.subject_id, 12.0).await;
    create_test_grade(&pool, student.id, tenant.subject_id, 14.0).await;
    create_test_grade(&pool, student.id, french, 7.0).await;

    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/public/students/{}", student.nsi),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["nsi"], student.nsi);
    assert_eq!(body["class_name"], "6e A");
    assert_eq!(body["school_name"], tenant.school.name);

    let subjects = body["subjects"].as_array().unwrap();
    assert_eq!(subjects.len(), 2);
    assert_eq!(subjects[0]["subject_name"], "French");
    assert_eq!(subjects[0]["average"], 7.0);
    assert_eq!(subjects[1]["subject_name"], "Mathematics");
    assert_eq!(subjects[1]["average"], 13.0);
    assert_eq!(subjects[1]["grade_count"], 2);
    // (13 * 4 + 7 * 2) / 6
    assert_eq!(body["overall_average"], 11.0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_public_result_accepts_lowercase_nsi(pool: PgPool) {
    let tenant = create_tenant(&pool).await;
    let student = create_test_student(&pool, tenant.school.id, tenant.class_id, None).await;

    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/public/students/{}", student.nsi.to_lowercase()),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["nsi"], student.nsi);
    assert!(body["subjects"].as_array().unwrap().is_empty());
    assert!(body["overall_average"].is_null());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_public_result_unknown_or_malformed_nsi(pool: PgPool) {
    let app = setup_test_app(pool);

    for nsi in ["NOT-AN-NSI", "NSI00AAAAAAAA"] {
        let (status, body) =
            send(&app, "GET", &format!("/api/public/students/{nsi}"), None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{nsi}");
        assert_eq!(body["error"], "Student not found");
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_public_settings_defaults_and_cache_headers(pool: PgPool) {
    let app = setup_test_app(pool);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/public/settings")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CACHE_CONTROL], "public, max-age=300");
    let etag = response.headers()[header::ETAG].clone();

    let body = body_json(response).await;
    assert_eq!(body["platform_name"], "Scolaris");
    assert_eq!(body["trial_days"], 30);
    assert_eq!(body["maintenance_mode"], false);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/public/settings")
                .header(header::IF_NONE_MATCH, etag)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_superadmin_updates_settings(pool: PgPool) {
    let superadmin = create_test_user(&pool, Role::SuperAdmin, None).await;
    let app = setup_test_app(pool);
    let token = get_auth_token(&app, &superadmin.email).await;

    let (status, body) = send(
        &app,
        "PUT",
        "/api/admin/settings",
        Some(&token),
        Some(json!({
            "platform_name": "Scolaris Sénégal",
            "support_email": "help@scolaris.test",
            "trial_days": 14,
            "maintenance_mode": true
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["trial_days"], 14);

    let (status, body) = send(&app, "GET", "/api/public/settings", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["platform_name"], "Scolaris Sénégal");
    assert_eq!(body["support_email"], "help@scolaris.test");
    assert_eq!(body["maintenance_mode"], true);
    assert_eq!(body["ads_enabled"], false);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_settings_update_rules(pool: PgPool) {
    let tenant = create_tenant(&pool).await;
    let superadmin = create_test_user(&pool, Role::SuperAdmin, None).await;
    let app = setup_test_app(pool);

    let admin_token = get_auth_token(&app, &tenant.admin.email).await;
    let (status, _) = send(
        &app,
        "PUT",
        "/api/admin/settings",
        Some(&admin_token),
        Some(json!({ "trial_days": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let token = get_auth_token(&app, &superadmin.email).await;
    let (status, _) = send(
        &app,
        "PUT",
        "/api/admin/settings",
        Some(&token),
        Some(json!({ "trial_days": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
