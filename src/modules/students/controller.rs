use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use scolaris_core::AppError;
use scolaris_models::attendance::{AttendanceFilterParams, PaginatedAttendanceResponse};
use scolaris_models::documents::{DocumentFilterParams, PaginatedDocumentsResponse};
use scolaris_models::grades::{GradeFilterParams, PaginatedGradesResponse};

use crate::middleware::auth::{RequireSchoolRead, RequireSchoolWrite};
use crate::modules::attendance::service::AttendanceService;
use crate::modules::documents::service::DocumentService;
use crate::modules::grades::service::GradeService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{
    CreateStudentDto, PaginatedStudentsResponse, Student, StudentFilterParams, StudentWithClass,
    UpdateStudentDto,
};
use super::service::StudentService;

/// Enrol a student; the NSI is generated server-side
#[utoipa::path(
    post,
    path = "/api/students",
    request_body = CreateStudentDto,
    responses(
        (status = 201, description = "Student created", body = Student),
        (status = 403, description = "Not a school admin, or school suspended/expired"),
        (status = 404, description = "Class or parent not found in this school"),
        (status = 422, description = "Validation error")
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_student(
    State(state): State<AppState>,
    RequireSchoolWrite(session): RequireSchoolWrite,
    ValidatedJson(dto): ValidatedJson<CreateStudentDto>,
) -> Result<(StatusCode, Json<Student>), AppError> {
    let school_id = session.school_id()?;
    let student = StudentService::create_student(&state.db, school_id, dto).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

#[utoipa::path(
    get,
    path = "/api/students",
    params(StudentFilterParams),
    responses(
        (status = 200, description = "Paginated students", body = PaginatedStudentsResponse),
        (status = 400, description = "Superadmin without school_id")
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn list_students(
    State(state): State<AppState>,
    RequireSchoolRead(session): RequireSchoolRead,
    Query(filters): Query<StudentFilterParams>,
) -> Result<Json<PaginatedStudentsResponse>, AppError> {
    let school_id = session.resolve_school(filters.school_id)?;
    let students = StudentService::list_students(&state.db, school_id, filters).await?;
    Ok(Json(students))
}

#[utoipa::path(
    get,
    path = "/api/students/{id}",
    params(("id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student", body = StudentWithClass),
        (status = 404, description = "Student not found")
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_student(
    State(state): State<AppState>,
    RequireSchoolRead(session): RequireSchoolRead,
    Path(id): Path<Uuid>,
) -> Result<Json<StudentWithClass>, AppError> {
    let student = StudentService::get_student(&state.db, session.read_scope(), id).await?;
    Ok(Json(student))
}

#[utoipa::path(
    put,
    path = "/api/students/{id}",
    params(("id" = Uuid, Path, description = "Student ID")),
    request_body = UpdateStudentDto,
    responses(
        (status = 200, description = "Student updated", body = Student),
        (status = 404, description = "Student, class or parent not found")
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_student(
    State(state): State<AppState>,
    RequireSchoolWrite(session): RequireSchoolWrite,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateStudentDto>,
) -> Result<Json<Student>, AppError> {
    let school_id = session.school_id()?;
    let student =
        StudentService::update_student(&state.db, state.cache.as_ref(), school_id, id, dto)
            .await?;
    Ok(Json(student))
}

#[utoipa::path(
    delete,
    path = "/api/students/{id}",
    params(("id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 204, description = "Student and all their records deleted"),
        (status = 404, description = "Student not found")
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_student(
    State(state): State<AppState>,
    RequireSchoolWrite(session): RequireSchoolWrite,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let school_id = session.school_id()?;
    StudentService::delete_student(
        &state.db,
        state.cache.as_ref(),
        state.storage.as_ref(),
        school_id,
        id,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/students/{id}/grades",
    params(("id" = Uuid, Path, description = "Student ID"), GradeFilterParams),
    responses(
        (status = 200, description = "Grades of the student", body = PaginatedGradesResponse),
        (status = 404, description = "Student not found")
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_student_grades(
    State(state): State<AppState>,
    RequireSchoolRead(session): RequireSchoolRead,
    Path(id): Path<Uuid>,
    Query(mut filters): Query<GradeFilterParams>,
) -> Result<Json<PaginatedGradesResponse>, AppError> {
    let student = StudentService::get_student(&state.db, session.read_scope(), id).await?;
    filters.student_id = Some(student.student.id);
    let grades = GradeService::list_grades(&state.db, student.student.school_id, filters).await?;
    Ok(Json(grades))
}

#[utoipa::path(
    get,
    path = "/api/students/{id}/attendance",
    params(("id" = Uuid, Path, description = "Student ID"), AttendanceFilterParams),
    responses(
        (status = 200, description = "Attendance of the student", body = PaginatedAttendanceResponse),
        (status = 404, description = "Student not found")
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_student_attendance(
    State(state): State<AppState>,
    RequireSchoolRead(session): RequireSchoolRead,
    Path(id): Path<Uuid>,
    Query(mut filters): Query<AttendanceFilterParams>,
) -> Result<Json<PaginatedAttendanceResponse>, AppError> {
    let student = StudentService::get_student(&state.db, session.read_scope(), id).await?;
    filters.student_id = Some(student.student.id);
    let records =
        AttendanceService::list_attendance(&state.db, student.student.school_id, filters).await?;
    Ok(Json(records))
}

#[utoipa::path(
    get,
    path = "/api/students/{id}/documents",
    params(("id" = Uuid, Path, description = "Student ID"), DocumentFilterParams),
    responses(
        (status = 200, description = "Documents of the student", body = PaginatedDocumentsResponse),
        (status = 404, description = "Student not found")
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_student_documents(
    State(state): State<AppState>,
    RequireSchoolRead(session): RequireSchoolRead,
    Path(id): Path<Uuid>,
    Query(mut filters): Query<DocumentFilterParams>,
) -> Result<Json<PaginatedDocumentsResponse>, AppError> {
    let student = StudentService::get_student(&state.db, session.read_scope(), id).await?;
    filters.student_id = Some(student.student.id);
    filters.school_wide = false;
    let documents =
        DocumentService::list_documents(&state.db, student.student.school_id, filters).await?;
    Ok(Json(documents))
}
