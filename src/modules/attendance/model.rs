pub use scolaris_models::attendance::{
    Attendance, AttendanceFilterParams, AttendanceStatus, AttendanceWithStudent,
    CreateAttendanceDto, PaginatedAttendanceResponse, UpdateAttendanceDto,
};
