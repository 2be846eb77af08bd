mod common;

use axum::http::StatusCode;
use common::{
    create_tenant, create_test_grade, create_test_student, create_test_user, get_auth_token,
    multipart_body, send, send_multipart, setup_test_app, setup_test_app_with_uploads,
    stored_files,
};
use scolaris_auth::Role;
use scolaris_models::nsi::is_valid_nsi;
use serde_json::json;
use sqlx::PgPool;

const BOUNDARY: &str = "scolaris-test-boundary";

#[sqlx::test(migrations = "./migrations")]
async fn test_create_student_assigns_nsi(pool: PgPool) {
    let tenant = create_tenant(&pool).await;
    let parent = create_test_user(&pool, Role::Parent, Some(tenant.school.id)).await;
    let app = setup_test_app(pool);
    let token = get_auth_token(&app, &tenant.admin.email).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/students",
        Some(&token),
        Some(json!({
            "class_id": tenant.class_id,
            "parent_id": parent.id,
            "first_name": "Fatou",
            "last_name": "Ba",
            "date_of_birth": "2012-04-17"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(is_valid_nsi(body["nsi"].as_str().unwrap()));
    assert_eq!(body["school_id"], tenant.school.id.to_string());
    assert_eq!(body["parent_id"], parent.id.to_string());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_parent_from_another_school_is_rejected(pool: PgPool) {
    let tenant = create_tenant(&pool).await;
    let other = create_tenant(&pool).await;
    let foreign_parent = create_test_user(&pool, Role::Parent, Some(other.school.id)).await;
    let app = setup_test_app(pool);
    let token = get_auth_token(&app, &tenant.admin.email).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/students",
        Some(&token),
        Some(json!({
            "class_id": tenant.class_id,
            "parent_id": foreign_parent.id,
            "first_name": "Fatou",
            "last_name": "Ba"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_unlink_parent(pool: PgPool) {
    let tenant = create_tenant(&pool).await;
    let parent = create_test_user(&pool, Role::Parent, Some(tenant.school.id)).await;
    let student = create_test_student(&pool, tenant.school.id, tenant.class_id, Some(parent.id)).await;
    let app = setup_test_app(pool);
    let token = get_auth_token(&app, &tenant.admin.email).await;

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/students/{}", student.id),
        Some(&token),
        Some(json!({ "unlink_parent": true, "first_name": "Aminata" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["parent_id"].is_null());
    assert_eq!(body["first_name"], "Aminata");
    assert_eq!(body["nsi"], student.nsi);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_class_with_students_cannot_be_deleted(pool: PgPool) {
    let tenant = create_tenant(&pool).await;
    create_test_student(&pool, tenant.school.id, tenant.class_id, None).await;
    let app = setup_test_app(pool.clone());
    let token = get_auth_token(&app, &tenant.admin.email).await;

    let (status, body) = send(
        &app,
        "DELETE",
        &format!("/api/classes/{}", tenant.class_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Cannot delete a class that still has students");

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/classes/{}", tenant.class_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["student_count"], 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_duplicate_class_name_conflicts(pool: PgPool) {
    let tenant = create_tenant(&pool).await;
    let other = create_tenant(&pool).await;
    let app = setup_test_app(pool);

    let token = get_auth_token(&app, &tenant.admin.email).await;
    let (status, _) = send(
        &app,
        "POST",
        "/api/classes",
        Some(&token),
        Some(json!({ "name": "6e A" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // names are unique per school only
    for admin in [&other.admin, &tenant.admin] {
        let (status, _) = send(
            &app,
            "POST",
            "/api/classes",
            Some(&get_auth_token(&app, &admin.email).await),
            Some(json!({ "name": "5e C" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_delete_student_removes_records(pool: PgPool) {
    let tenant = create_tenant(&pool).await;
    let student = create_test_student(&pool, tenant.school.id, tenant.class_id, None).await;
    create_test_grade(&pool, student.id, tenant.subject_id, 11.0).await;
    let (app, upload_dir) = setup_test_app_with_uploads(pool.clone());
    let token = get_auth_token(&app, &tenant.admin.email).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/attendance",
        Some(&token),
        Some(json!({ "student_id": student.id, "date": "2025-03-10", "status": "absent" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let student_id = student.id.to_string();
    let body = multipart_body(
        BOUNDARY,
        &[("title", "Bulletin T1"), ("student_id", &student_id)],
        Some(("file", "bulletin.pdf", "application/pdf", &b"%PDF-1.4 bulletin"[..])),
    );
    let (status, document) = send_multipart(&app, "/api/documents", &token, body, BOUNDARY).await;
    assert_eq!(status, StatusCode::CREATED);
    let stored = upload_dir.join(
        document["file_url"]
            .as_str()
            .unwrap()
            .trim_start_matches("/uploads/"),
    );
    assert!(stored.exists());

    let listings = [
        format!("/api/grades?student_id={}", student.id),
        format!("/api/attendance?student_id={}", student.id),
        format!("/api/documents?student_id={}", student.id),
    ];
    for uri in &listings {
        let (status, body) = send(&app, "GET", uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1, "{uri}");
    }

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/students/{}", student.id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    for uri in &listings {
        let (status, body) = send(&app, "GET", uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"].as_array().unwrap().is_empty(), "{uri}");
        assert_eq!(body["meta"]["total"], 0, "{uri}");
    }
    assert!(!stored.exists());
    assert!(stored_files(&upload_dir).is_empty());

    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/public/students/{}", student.nsi),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_parents_crud_and_children_count(pool: PgPool) {
    let tenant = create_tenant(&pool).await;
    let app = setup_test_app(pool.clone());
    let token = get_auth_token(&app, &tenant.admin.email).await;

    let (status, parent) = send(
        &app,
        "POST",
        "/api/parents",
        Some(&token),
        Some(json!({
            "first_name": "Ibrahima",
            "last_name": "Fall",
            "email": "ibrahima.fall@parents.test",
            "password": "parentpass1"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(parent["role"], "parent");
    let parent_id: uuid::Uuid = parent["id"].as_str().unwrap().parse().unwrap();

    create_test_student(&pool, tenant.school.id, tenant.class_id, Some(parent_id)).await;
    create_test_student(&pool, tenant.school.id, tenant.class_id, Some(parent_id)).await;

    let (status, body) = send(&app, "GET", "/api/parents?search=fall", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["children_count"], 2);

    // the new parent can log in with the password set by the admin
    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "ibrahima.fall@parents.test", "password": "parentpass1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/parents/{parent_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let unlinked: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM students WHERE school_id = $1 AND parent_id IS NULL",
    )
    .bind(tenant.school.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(unlinked, 2);
}
