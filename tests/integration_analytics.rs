mod common;

use axum::http::StatusCode;
use common::{
    create_tenant, create_test_class, create_test_grade, create_test_student, create_test_subject,
    create_test_user, get_auth_token, send, setup_test_app,
};
use scolaris_auth::Role;
use sqlx::PgPool;
use uuid::Uuid;

async fn add_absences(pool: &PgPool, student_id: Uuid, days: u32) {
    for day in 1..=days {
        sqlx::query(
            "INSERT INTO attendance (student_id, date, status) VALUES ($1, make_date(2025, 2, $2), 'absent')",
        )
        .bind(student_id)
        .bind(day as i32)
        .execute(pool)
        .await
        .unwrap();
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_risk_flags_low_average_and_absences(pool: PgPool) {
    let tenant = create_tenant(&pool).await;
    let struggling = create_test_student(&pool, tenant.school.id, tenant.class_id, None).await;
    let absent = create_test_student(&pool, tenant.school.id, tenant.class_id, None).await;
    let fine = create_test_student(&pool, tenant.school.id, tenant.class_id, None).await;

    create_test_grade(&pool, struggling.id, tenant.subject_id, 7.0).await;
    create_test_grade(&pool, struggling.id, tenant.subject_id, 9.0).await;
    create_test_grade(&pool, absent.id, tenant.subject_id, 15.0).await;
    create_test_grade(&pool, fine.id, tenant.subject_id, 14.0).await;
    add_absences(&pool, absent.id, 4).await;
    add_absences(&pool, fine.id, 1).await;

    let app = setup_test_app(pool);
    let token = get_auth_token(&app, &tenant.admin.email).await;

    let (status, body) = send(&app, "GET", "/api/analytics/risk", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["thresholds"]["average"], 10.0);

    let students = body["students"].as_array().unwrap();
    assert_eq!(students.len(), 2);
    assert_eq!(students[0]["student_id"], absent.id.to_string());
    assert_eq!(students[0]["reasons"], serde_json::json!(["excessive_absences"]));
    assert_eq!(students[1]["student_id"], struggling.id.to_string());
    assert_eq!(students[1]["average"], 8.0);
    assert_eq!(students[1]["reasons"], serde_json::json!(["low_average"]));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_risk_ignores_other_schools(pool: PgPool) {
    let tenant = create_tenant(&pool).await;
    let other = create_tenant(&pool).await;
    let theirs = create_test_student(&pool, other.school.id, other.class_id, None).await;
    create_test_grade(&pool, theirs.id, other.subject_id, 2.0).await;

    let app = setup_test_app(pool);
    let token = get_auth_token(&app, &tenant.admin.email).await;

    let (status, body) = send(&app, "GET", "/api/analytics/risk", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["students"].as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_performance_by_class_and_subject(pool: PgPool) {
    let tenant = create_tenant(&pool).await;
    let other_class = create_test_class(&pool, tenant.school.id, "3e B").await;
    let french = create_test_subject(&pool, tenant.school.id, "French", 2).await;
    let a = create_test_student(&pool, tenant.school.id, tenant.class_id, None).await;
    let b = create_test_student(&pool, tenant.school.id, other_class, None).await;

    create_test_grade(&pool, a.id, tenant.subject_id, 16.0).await;
    create_test_grade(&pool, a.id, french, 12.0).await;
    create_test_grade(&pool, b.id, tenant.subject_id, 8.0).await;

    let app = setup_test_app(pool);
    let token = get_auth_token(&app, &tenant.admin.email).await;

    let (status, body) = send(&app, "GET", "/api/analytics/performance", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["group_by"], "class");
    let groups = body["groups"].as_array().unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0]["group_name"], "6e A");
    assert_eq!(groups[0]["average"], 14.0);
    assert_eq!(groups[1]["group_name"], "3e B");
    assert_eq!(groups[1]["student_count"], 1);

    let (status, body) = send(
        &app,
        "GET",
        "/api/analytics/performance?group_by=subject",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let groups = body["groups"].as_array().unwrap();
    assert_eq!(groups[0]["group_name"], "French");
    assert_eq!(groups[0]["average"], 12.0);
    assert_eq!(groups[1]["group_name"], "Mathematics");
    assert_eq!(groups[1]["grade_count"], 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_parent_cannot_read_analytics(pool: PgPool) {
    let tenant = create_tenant(&pool).await;
    let parent = create_test_user(&pool, Role::Parent, Some(tenant.school.id)).await;

    let app = setup_test_app(pool);
    let token = get_auth_token(&app, &parent.email).await;

    let (status, _) = send(&app, "GET", "/api/analytics/risk", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
