mod common;

use axum::http::StatusCode;
use chrono::{DateTime, Duration, Utc};
use common::{
    PASSWORD, create_test_school, create_test_user, generate_unique_email,
    generate_unique_school_name, get_auth_token, send, setup_test_app,
};
use scolaris_auth::Role;
use serde_json::json;
use sqlx::PgPool;

fn registration(school_name: &str, email: &str) -> serde_json::Value {
    json!({
        "school_name": school_name,
        "address": "12 Avenue Cheikh Anta Diop, Dakar",
        "first_name": "Mariama",
        "last_name": "Sow",
        "email": email,
        "password": PASSWORD
    })
}

#[sqlx::test(migrations = "./migrations")]
async fn test_register_school_creates_school_and_admin(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let school_name = generate_unique_school_name();
    let email = generate_unique_email();

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register-school",
        None,
        Some(registration(&school_name, &email)),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["role"], "admin");
    assert_eq!(body["user"]["email"], email);
    let token = body["access_token"].as_str().unwrap().to_string();

    let (status, me) = send(&app, "GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["school"]["name"], school_name);
    assert_eq!(me["school"]["subscription"]["state"], "active");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_register_school_uses_configured_trial(pool: PgPool) {
    sqlx::query("INSERT INTO platform_settings (key, value) VALUES ('trial_days', '7')")
        .execute(&pool)
        .await
        .unwrap();

    let app = setup_test_app(pool.clone());
    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register-school",
        None,
        Some(registration(&generate_unique_school_name(), &generate_unique_email())),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let school_id: uuid::Uuid = body["user"]["school_id"].as_str().unwrap().parse().unwrap();
    let end: DateTime<Utc> =
        sqlx::query_scalar("SELECT subscription_end_date FROM schools WHERE id = $1")
            .bind(school_id)
            .fetch_one(&pool)
            .await
            .unwrap();

    let expected = Utc::now() + Duration::days(7);
    assert!((end - expected).num_minutes().abs() < 5);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_register_duplicate_school_name_conflicts(pool: PgPool) {
    let school = create_test_school(&pool, &generate_unique_school_name()).await;
    let app = setup_test_app(pool.clone());

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register-school",
        None,
        Some(registration(&school.name, &generate_unique_email())),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "School name already exists");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_register_duplicate_email_rolls_back_school(pool: PgPool) {
    let school = create_test_school(&pool, &generate_unique_school_name()).await;
    let existing = create_test_user(&pool, Role::Admin, Some(school.id)).await;
    let app = setup_test_app(pool.clone());
    let new_name = generate_unique_school_name();

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/register-school",
        None,
        Some(registration(&new_name, &existing.email)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schools WHERE name = $1")
        .bind(&new_name)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_register_short_password_is_rejected(pool: PgPool) {
    let app = setup_test_app(pool);
    let mut request = registration(&generate_unique_school_name(), &generate_unique_email());
    request["password"] = json!("short");

    let (status, _) = send(&app, "POST", "/api/auth/register-school", None, Some(request)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_with_wrong_password(pool: PgPool) {
    let school = create_test_school(&pool, &generate_unique_school_name()).await;
    let user = create_test_user(&pool, Role::Admin, Some(school.id)).await;
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": user.email, "password": "wrongpassword" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid email or password");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_unknown_email_matches_wrong_password(pool: PgPool) {
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": generate_unique_email(), "password": PASSWORD })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid email or password");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_superadmin_me_has_no_school(pool: PgPool) {
    let admin = create_test_user(&pool, Role::SuperAdmin, None).await;
    let app = setup_test_app(pool);
    let token = get_auth_token(&app, &admin.email).await;

    let (status, me) = send(&app, "GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["user"]["role"], "super_admin");
    assert!(me["school"].is_null());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_me_requires_token(pool: PgPool) {
    let app = setup_test_app(pool);

    let (status, _) = send(&app, "GET", "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/api/auth/me", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
