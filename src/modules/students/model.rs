pub use scolaris_models::students::{
    CreateStudentDto, PaginatedStudentsResponse, Student, StudentFilterParams, StudentWithClass,
    UpdateStudentDto,
};
