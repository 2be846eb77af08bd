#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use http_body_util::BodyExt;
use scolaris::router::init_router;
use scolaris::state::test_state;
use scolaris_auth::Role;
use scolaris_models::nsi::generate_nsi;
use serde_json::{Value, json};
use sqlx::PgPool;
use std::path::{Path, PathBuf};
use tower::ServiceExt;
use uuid::Uuid;

pub const PASSWORD: &str = "testpass123";

pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub school_id: Option<Uuid>,
}

pub struct TestSchool {
    pub id: Uuid,
    pub name: String,
}

pub struct TestStudent {
    pub id: Uuid,
    pub nsi: String,
    pub class_id: Uuid,
}

/// A school with an admin, one class and one subject.
pub struct Tenant {
    pub school: TestSchool,
    pub admin: TestUser,
    pub class_id: Uuid,
    pub subject_id: Uuid,
}

pub fn generate_unique_email() -> String {
    format!("test-{}@test.com", Uuid::new_v4())
}

pub fn generate_unique_school_name() -> String {
    format!("Test School {}", Uuid::new_v4())
}

/// A school on a running 30-day subscription.
pub async fn create_test_school(pool: &PgPool, name: &str) -> TestSchool {
    let id: Uuid = sqlx::query_scalar(
        "INSERT INTO schools (name, subscription_end_date) VALUES ($1, NOW() + INTERVAL '30 days') RETURNING id",
    )
    .bind(name)
    .fetch_one(pool)
    .await
    .unwrap();

    TestSchool {
        id,
        name: name.to_string(),
    }
}

pub async fn create_test_user(pool: &PgPool, role: Role, school_id: Option<Uuid>) -> TestUser {
    // Minimum cost keeps the suite fast
    let hashed = bcrypt::hash(PASSWORD, 4).unwrap();
    let email = generate_unique_email();

    let id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO users (first_name, last_name, email, password, role, school_id)
        VALUES ('Test', 'User', $1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(&email)
    .bind(hashed)
    .bind(role)
    .bind(school_id)
    .fetch_one(pool)
    .await
    .unwrap();

    TestUser {
        id,
        email,
        school_id,
    }
}

pub async fn create_test_class(pool: &PgPool, school_id: Uuid, name: &str) -> Uuid {
    sqlx::query_scalar("INSERT INTO classes (school_id, name) VALUES ($1, $2) RETURNING id")
        .bind(school_id)
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn create_test_subject(
    pool: &PgPool,
    school_id: Uuid,
    name: &str,
    coefficient: i32,
) -> Uuid {
    sqlx::query_scalar(
        "INSERT INTO subjects (school_id, name, coefficient) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(school_id)
    .bind(name)
    .bind(coefficient)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn create_test_student(
    pool: &PgPool,
    school_id: Uuid,
    class_id: Uuid,
    parent_id: Option<Uuid>,
) -> TestStudent {
    let nsi = generate_nsi(&mut rand::thread_rng(), Utc::now().date_naive());
    let id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO students (school_id, class_id, parent_id, first_name, last_name, nsi)
        VALUES ($1, $2, $3, 'Awa', 'Ndiaye', $4)
        RETURNING id
        "#,
    )
    .bind(school_id)
    .bind(class_id)
    .bind(parent_id)
    .bind(&nsi)
    .fetch_one(pool)
    .await
    .unwrap();

    TestStudent { id, nsi, class_id }
}

pub async fn create_test_grade(pool: &PgPool, student_id: Uuid, subject_id: Uuid, value: f64) {
    sqlx::query(
        "INSERT INTO grades (student_id, subject_id, value, grade_type, period) VALUES ($1, $2, $3, 'test', 'T1')",
    )
    .bind(student_id)
    .bind(subject_id)
    .bind(value)
    .execute(pool)
    .await
    .unwrap();
}

pub async fn create_tenant(pool: &PgPool) -> Tenant {
    let school = create_test_school(pool, &generate_unique_school_name()).await;
    let admin = create_test_user(pool, Role::Admin, Some(school.id)).await;
    let class_id = create_test_class(pool, school.id, "6e A").await;
    let subject_id = create_test_subject(pool, school.id, "Mathematics", 4).await;

    Tenant {
        school,
        admin,
        class_id,
        subject_id,
    }
}

pub fn setup_test_app(pool: PgPool) -> Router {
    setup_test_app_with_uploads(pool).0
}

/// The app together with the directory its uploads land in.
pub fn setup_test_app_with_uploads(pool: PgPool) -> (Router, PathBuf) {
    let upload_dir = std::env::temp_dir().join(format!("scolaris-test-{}", Uuid::new_v4()));
    (init_router(test_state(pool, upload_dir.clone())), upload_dir)
}

/// Every regular file under `dir`, recursively. Missing directories are empty.
pub fn stored_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            files.extend(stored_files(&path));
        } else {
            files.push(path);
        }
    }
    files
}

pub async fn body_json(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    if body.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&body).unwrap()
}

/// Sends a JSON request and returns the status with the decoded body.
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

pub async fn get_auth_token(app: &Router, email: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["access_token"].as_str().unwrap().to_string()
}

/// Builds a `multipart/form-data` body from text fields and an optional file.
pub fn multipart_body(
    boundary: &str,
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &str, &[u8])>,
) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((name, file_name, content_type, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

pub async fn send_multipart(
    app: &Router,
    uri: &str,
    token: &str,
    body: Vec<u8>,
    boundary: &str,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_json(response).await)
}
