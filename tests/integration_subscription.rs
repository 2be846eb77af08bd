mod common;

use axum::http::StatusCode;
use common::{
    create_tenant, create_test_student, create_test_user, get_auth_token, multipart_body, send,
    send_multipart, setup_test_app, setup_test_app_with_uploads, stored_files,
};
use scolaris_auth::Role;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

const BOUNDARY: &str = "scolaris-test-boundary";

/// Rows a tenant owns, flattened to text so any insert, update or delete
/// shows up as a difference.
async fn tenant_snapshot(pool: &PgPool, school_id: Uuid) -> Vec<String> {
    let queries = [
        "SELECT COALESCE(string_agg(first_name || ' ' || last_name, ',' ORDER BY id), '') FROM students WHERE school_id = $1",
        "SELECT COALESCE(string_agg(g.value::text || ' ' || g.period, ',' ORDER BY g.id), '') FROM grades g JOIN students s ON s.id = g.student_id WHERE s.school_id = $1",
        "SELECT COALESCE(string_agg(a.status::text || ' ' || a.parent_notified::text, ',' ORDER BY a.id), '') FROM attendance a JOIN students s ON s.id = a.student_id WHERE s.school_id = $1",
        "SELECT COALESCE(string_agg(first_name || ' ' || email, ',' ORDER BY id), '') FROM users WHERE school_id = $1 AND role = 'parent'",
        "SELECT COALESCE(string_agg(title, ',' ORDER BY id), '') FROM documents WHERE school_id = $1",
        "SELECT concat_ws('|', name, address, phone, email) FROM schools WHERE id = $1",
    ];

    let mut snapshot = Vec::new();
    for query in queries {
        let row: String = sqlx::query_scalar(query)
            .bind(school_id)
            .fetch_one(pool)
            .await
            .unwrap();
        snapshot.push(row);
    }
    snapshot
}

async fn class_count(pool: &PgPool, school_id: Uuid) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM classes WHERE school_id = $1")
        .bind(school_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test(migrations = "./migrations")]
async fn test_suspended_school_is_read_only(pool: PgPool) {
    let tenant = create_tenant(&pool).await;
    sqlx::query("UPDATE schools SET status = 'suspended' WHERE id = $1")
        .bind(tenant.school.id)
        .execute(&pool)
        .await
        .unwrap();

    let app = setup_test_app(pool.clone());
    let token = get_auth_token(&app, &tenant.admin.email).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/classes",
        Some(&token),
        Some(json!({ "name": "5e A" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "school_suspended");
    assert_eq!(class_count(&pool, tenant.school.id).await, 1);

    let (status, _) = send(&app, "GET", "/api/classes", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", "/api/school", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subscription"]["state"], "suspended");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_suspended_school_rejects_every_write(pool: PgPool) {
    let tenant = create_tenant(&pool).await;
    let parent = create_test_user(&pool, Role::Parent, Some(tenant.school.id)).await;
    let student =
        create_test_student(&pool, tenant.school.id, tenant.class_id, Some(parent.id)).await;
    let grade_id: Uuid = sqlx::query_scalar(
        "INSERT INTO grades (student_id, subject_id, value, grade_type, period) VALUES ($1, $2, 12, 'test', 'T1') RETURNING id",
    )
    .bind(student.id)
    .bind(tenant.subject_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    let attendance_id: Uuid = sqlx::query_scalar(
        "INSERT INTO attendance (student_id, date, status) VALUES ($1, '2025-03-10', 'absent') RETURNING id",
    )
    .bind(student.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    let document_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO documents (school_id, student_id, title, file_url, storage_key, content_type, size_bytes)
        VALUES ($1, $2, 'Bulletin T1', '/uploads/documents/x.pdf', 'documents/x.pdf', 'application/pdf', 10)
        RETURNING id
        "#,
    )
    .bind(tenant.school.id)
    .bind(student.id)
    .fetch_one(&pool)
    .await
    .unwrap();

    sqlx::query("UPDATE schools SET status = 'suspended' WHERE id = $1")
        .bind(tenant.school.id)
        .execute(&pool)
        .await
        .unwrap();

    let (app, upload_dir) = setup_test_app_with_uploads(pool.clone());
    let token = get_auth_token(&app, &tenant.admin.email).await;
    let before = tenant_snapshot(&pool, tenant.school.id).await;

    let writes = [
        (
            "POST",
            "/api/students".to_string(),
            Some(json!({ "class_id": tenant.class_id, "first_name": "Moussa", "last_name": "Diop" })),
        ),
        (
            "PUT",
            format!("/api/students/{}", student.id),
            Some(json!({ "first_name": "Renamed" })),
        ),
        ("DELETE", format!("/api/students/{}", student.id), None),
        (
            "POST",
            "/api/grades".to_string(),
            Some(json!({
                "student_id": student.id,
                "subject_id": tenant.subject_id,
                "value": 15.0,
                "grade_type": "test",
                "period": "T1"
            })),
        ),
        (
            "POST",
            "/api/grades/bulk".to_string(),
            Some(json!({
                "subject_id": tenant.subject_id,
                "grade_type": "test",
                "period": "T1",
                "entries": [{ "student_id": student.id, "value": 9.5 }]
            })),
        ),
        (
            "PUT",
            format!("/api/grades/{grade_id}"),
            Some(json!({ "value": 19.0 })),
        ),
        ("DELETE", format!("/api/grades/{grade_id}"), None),
        (
            "POST",
            "/api/attendance".to_string(),
            Some(json!({ "student_id": student.id, "date": "2025-03-11", "status": "late" })),
        ),
        (
            "PUT",
            format!("/api/attendance/{attendance_id}"),
            Some(json!({ "status": "excused" })),
        ),
        ("DELETE", format!("/api/attendance/{attendance_id}"), None),
        ("POST", format!("/api/attendance/{attendance_id}/notify"), None),
        (
            "POST",
            "/api/parents".to_string(),
            Some(json!({
                "first_name": "Fatou",
                "last_name": "Sow",
                "email": "fatou.sow@parents.test",
                "password": "parentpass1"
            })),
        ),
        (
            "PUT",
            format!("/api/parents/{}", parent.id),
            Some(json!({ "first_name": "Renamed" })),
        ),
        ("DELETE", format!("/api/parents/{}", parent.id), None),
        ("DELETE", format!("/api/documents/{document_id}"), None),
        (
            "PUT",
            "/api/school".to_string(),
            Some(json!({ "phone": "+221 33 000 00 00" })),
        ),
    ];

    for (method, uri, body) in writes {
        let (status, response) = send(&app, method, &uri, Some(&token), body).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{method} {uri}");
        assert_eq!(response["code"], "school_suspended", "{method} {uri}");
        assert_eq!(
            tenant_snapshot(&pool, tenant.school.id).await,
            before,
            "{method} {uri}"
        );
    }

    let student_id = student.id.to_string();
    let upload = multipart_body(
        BOUNDARY,
        &[("title", "Term calendar"), ("student_id", &student_id)],
        Some(("file", "calendar.pdf", "application/pdf", &b"%PDF-1.4 calendar"[..])),
    );
    let (status, response) =
        send_multipart(&app, "/api/documents", &token, upload, BOUNDARY).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(response["code"], "school_suspended");
    assert_eq!(tenant_snapshot(&pool, tenant.school.id).await, before);
    assert!(stored_files(&upload_dir).is_empty());

    // reads stay open
    let reads = [
        "/api/students",
        "/api/grades",
        "/api/attendance",
        "/api/parents",
        "/api/documents",
    ];
    for uri in reads {
        let (status, _) = send(&app, "GET", uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_expired_school_rejects_every_write(pool: PgPool) {
    let tenant = create_tenant(&pool).await;
    sqlx::query("UPDATE schools SET subscription_end_date = NOW() - INTERVAL '1 day' WHERE id = $1")
        .bind(tenant.school.id)
        .execute(&pool)
        .await
        .unwrap();

    let app = setup_test_app(pool.clone());
    let token = get_auth_token(&app, &tenant.admin.email).await;

    let writes = [
        ("POST", "/api/classes".to_string(), Some(json!({ "name": "5e A" }))),
        (
            "PUT",
            format!("/api/classes/{}", tenant.class_id),
            Some(json!({ "name": "Renamed" })),
        ),
        ("DELETE", format!("/api/subjects/{}", tenant.subject_id), None),
        ("PUT", "/api/school".to_string(), Some(json!({ "phone": "+221 33 000 00 00" }))),
    ];

    for (method, uri, body) in writes {
        let (status, response) = send(&app, method, &uri, Some(&token), body).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{method} {uri}");
        assert_eq!(response["code"], "subscription_expired");
    }

    let name: String = sqlx::query_scalar("SELECT name FROM classes WHERE id = $1")
        .bind(tenant.class_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(name, "6e A");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_paused_school_keeps_write_access(pool: PgPool) {
    let tenant = create_tenant(&pool).await;
    sqlx::query(
        "UPDATE schools SET is_paused = TRUE, paused_remaining_ms = 86400000 WHERE id = $1",
    )
    .bind(tenant.school.id)
    .execute(&pool)
    .await
    .unwrap();

    let app = setup_test_app(pool.clone());
    let token = get_auth_token(&app, &tenant.admin.email).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/classes",
        Some(&token),
        Some(json!({ "name": "5e A" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(class_count(&pool, tenant.school.id).await, 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_pause_resume_extend_cycle(pool: PgPool) {
    let tenant = create_tenant(&pool).await;
    let superadmin = create_test_user(&pool, Role::SuperAdmin, None).await;
    let app = setup_test_app(pool.clone());
    let token = get_auth_token(&app, &superadmin.email).await;
    let base = format!("/api/admin/schools/{}", tenant.school.id);

    let (status, body) = send(&app, "POST", &format!("{base}/pause"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subscription"]["state"], "paused");
    let frozen = body["subscription"]["remaining_ms"].as_i64().unwrap();
    assert!(frozen > 29 * 86_400_000 && frozen <= 30 * 86_400_000);

    let (status, _) = send(&app, "POST", &format!("{base}/pause"), Some(&token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        "POST",
        &format!("{base}/extend"),
        Some(&token),
        Some(json!({ "days": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["subscription"]["remaining_ms"].as_i64().unwrap(),
        frozen + 5 * 86_400_000
    );

    let (status, body) = send(&app, "POST", &format!("{base}/resume"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subscription"]["state"], "active");
    assert_eq!(body["subscription"]["is_paused"], false);

    let (status, _) = send(&app, "POST", &format!("{base}/resume"), Some(&token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let snapshot: Option<i64> =
        sqlx::query_scalar("SELECT paused_remaining_ms FROM schools WHERE id = $1")
            .bind(tenant.school.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert!(snapshot.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_extend_expired_school_restarts_from_now(pool: PgPool) {
    let tenant = create_tenant(&pool).await;
    sqlx::query("UPDATE schools SET subscription_end_date = NOW() - INTERVAL '90 days' WHERE id = $1")
        .bind(tenant.school.id)
        .execute(&pool)
        .await
        .unwrap();
    let superadmin = create_test_user(&pool, Role::SuperAdmin, None).await;
    let app = setup_test_app(pool.clone());
    let token = get_auth_token(&app, &superadmin.email).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/admin/schools/{}/extend", tenant.school.id),
        Some(&token),
        Some(json!({ "days": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subscription"]["state"], "active");
    let remaining = body["subscription"]["remaining_ms"].as_i64().unwrap();
    assert!(remaining > 9 * 86_400_000 && remaining <= 10 * 86_400_000);

    // the school admin can write again
    let admin_token = get_auth_token(&app, &tenant.admin.email).await;
    let (status, _) = send(
        &app,
        "POST",
        "/api/classes",
        Some(&admin_token),
        Some(json!({ "name": "4e A" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_extend_rejects_out_of_range_days(pool: PgPool) {
    let tenant = create_tenant(&pool).await;
    let superadmin = create_test_user(&pool, Role::SuperAdmin, None).await;
    let app = setup_test_app(pool);
    let token = get_auth_token(&app, &superadmin.email).await;

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/admin/schools/{}/extend", tenant.school.id),
        Some(&token),
        Some(json!({ "days": 100000 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_extend_past_the_calendar_is_unprocessable(pool: PgPool) {
    let tenant = create_tenant(&pool).await;
    sqlx::query(
        "UPDATE schools SET subscription_end_date = make_timestamptz(262143, 12, 1, 0, 0, 0, 'UTC') WHERE id = $1",
    )
    .bind(tenant.school.id)
    .execute(&pool)
    .await
    .unwrap();
    let superadmin = create_test_user(&pool, Role::SuperAdmin, None).await;
    let app = setup_test_app(pool.clone());
    let token = get_auth_token(&app, &superadmin.email).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/admin/schools/{}/extend", tenant.school.id),
        Some(&token),
        Some(json!({ "days": 3650 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "Subscription end date is out of range");

    let unchanged: bool = sqlx::query_scalar(
        "SELECT subscription_end_date = make_timestamptz(262143, 12, 1, 0, 0, 0, 'UTC') FROM schools WHERE id = $1",
    )
    .bind(tenant.school.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert!(unchanged);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_suspend_wins_over_pause_and_activate_restores(pool: PgPool) {
    let tenant = create_tenant(&pool).await;
    let superadmin = create_test_user(&pool, Role::SuperAdmin, None).await;
    let app = setup_test_app(pool);
    let token = get_auth_token(&app, &superadmin.email).await;
    let base = format!("/api/admin/schools/{}", tenant.school.id);

    send(&app, "POST", &format!("{base}/pause"), Some(&token), None).await;
    let (status, body) = send(&app, "POST", &format!("{base}/suspend"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subscription"]["state"], "suspended");
    assert_eq!(body["subscription"]["is_paused"], true);

    let (status, _) = send(&app, "POST", &format!("{base}/suspend"), Some(&token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, "POST", &format!("{base}/activate"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subscription"]["state"], "paused");

    let (status, _) = send(&app, "POST", &format!("{base}/activate"), Some(&token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_subscription_actions_need_superadmin(pool: PgPool) {
    let tenant = create_tenant(&pool).await;
    let app = setup_test_app(pool);
    let token = get_auth_token(&app, &tenant.admin.email).await;

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/admin/schools/{}/extend", tenant.school.id),
        Some(&token),
        Some(json!({ "days": 365 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
