use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{
    create_student, delete_student, get_student, get_student_attendance, get_student_documents,
    get_student_grades, list_students, update_student,
};

pub fn init_students_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_students).post(create_student))
        .route(
            "/{id}",
            get(get_student).put(update_student).delete(delete_student),
        )
        .route("/{id}/grades", get(get_student_grades))
        .route("/{id}/attendance", get(get_student_attendance))
        .route("/{id}/documents", get(get_student_documents))
}
