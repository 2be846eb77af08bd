use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use scolaris_auth::Role;
use scolaris_core::{PaginationMeta, PaginationParams};
use scolaris_models::analytics::{
    PerformanceGroup, PerformanceGroupBy, PerformanceResponse, RiskEntry, RiskReason,
    RiskResponse, RiskThresholds,
};
use scolaris_models::attendance::{
    Attendance, AttendanceStatus, AttendanceWithStudent, CreateAttendanceDto,
    PaginatedAttendanceResponse, UpdateAttendanceDto,
};
use scolaris_models::auth::{
    ErrorResponse, LoginRequest, LoginResponse, MeResponse, MessageResponse, RegisterSchoolRequest,
};
use scolaris_models::classes::{
    Class, ClassWithStats, CreateClassDto, PaginatedClassesResponse, UpdateClassDto,
};
use scolaris_models::documents::{Document, PaginatedDocumentsResponse, UploadDocumentForm};
use scolaris_models::grades::{
    BulkGradeDto, BulkGradeEntry, BulkGradeResponse, CreateGradeDto, Grade, GradeType,
    GradeWithDetails, PaginatedGradesResponse, UpdateGradeDto,
};
use scolaris_models::notifications::{CreateNotificationForm, Notification};
use scolaris_models::schools::{
    AdminUpdateSchoolDto, ExtendSubscriptionDto, PaginatedSchoolsResponse, PlatformStats,
    SchoolAdminInfo, SchoolCounts, SchoolDetail, SchoolStateCounts, SchoolStatus, SchoolView,
    UpdateSchoolDto,
};
use scolaris_models::settings::{PlatformSettings, UpdateSettingsDto};
use scolaris_models::students::{
    CreateStudentDto, PaginatedStudentsResponse, PublicStudentResult, Student, StudentWithClass,
    SubjectAverage, UpdateStudentDto,
};
use scolaris_models::subjects::{
    CreateSubjectDto, PaginatedSubjectsResponse, Subject, UpdateSubjectDto,
};
use scolaris_models::subscription::{SubscriptionState, SubscriptionSummary};
use scolaris_models::users::{
    CreateParentDto, PaginatedParentsResponse, ParentWithChildren, UpdateParentDto, User,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::register_school,
        crate::modules::auth::controller::login,
        crate::modules::auth::controller::get_me,
        crate::modules::school::controller::get_my_school,
        crate::modules::school::controller::update_my_school,
        crate::modules::classes::controller::create_class,
        crate::modules::classes::controller::list_classes,
        crate::modules::classes::controller::get_class,
        crate::modules::classes::controller::update_class,
        crate::modules::classes::controller::delete_class,
        crate::modules::classes::controller::get_class_students,
        crate::modules::subjects::controller::create_subject,
        crate::modules::subjects::controller::list_subjects,
        crate::modules::subjects::controller::get_subject,
        crate::modules::subjects::controller::update_subject,
        crate::modules::subjects::controller::delete_subject,
        crate::modules::parents::controller::create_parent,
        crate::modules::parents::controller::list_parents,
        crate::modules::parents::controller::get_parent,
        crate::modules::parents::controller::update_parent,
        crate::modules::parents::controller::delete_parent,
        crate::modules::students::controller::create_student,
        crate::modules::students::controller::list_students,
        crate::modules::students::controller::get_student,
        crate::modules::students::controller::update_student,
        crate::modules::students::controller::delete_student,
        crate::modules::students::controller::get_student_grades,
        crate::modules::students::controller::get_student_attendance,
        crate::modules::students::controller::get_student_documents,
        crate::modules::grades::controller::create_grade,
        crate::modules::grades::controller::bulk_create_grades,
        crate::modules::grades::controller::list_grades,
        crate::modules::grades::controller::get_grade,
        crate::modules::grades::controller::update_grade,
        crate::modules::grades::controller::delete_grade,
        crate::modules::attendance::controller::create_attendance,
        crate::modules::attendance::controller::list_attendance,
        crate::modules::attendance::controller::update_attendance,
        crate::modules::attendance::controller::delete_attendance,
        crate::modules::attendance::controller::notify_parent,
        crate::modules::documents::controller::upload_document,
        crate::modules::documents::controller::list_documents,
        crate::modules::documents::controller::delete_document,
        crate::modules::analytics::controller::get_risk,
        crate::modules::analytics::controller::get_performance,
        crate::modules::parent::controller::list_children,
        crate::modules::parent::controller::get_child_grades,
        crate::modules::parent::controller::get_child_attendance,
        crate::modules::parent::controller::get_child_documents,
        crate::modules::notifications::controller::list_notifications,
        crate::modules::notifications::controller::create_notification,
        crate::modules::notifications::controller::delete_notification,
        crate::modules::public::controller::get_student_result,
        crate::modules::public::controller::list_login_notifications,
        crate::modules::settings::controller::get_public_settings,
        crate::modules::settings::controller::update_settings,
        crate::modules::admin::controller::get_stats,
        crate::modules::admin::controller::list_schools,
        crate::modules::admin::controller::get_school,
        crate::modules::admin::controller::update_school,
        crate::modules::admin::controller::delete_school,
        crate::modules::admin::controller::suspend_school,
        crate::modules::admin::controller::activate_school,
        crate::modules::admin::controller::pause_subscription,
        crate::modules::admin::controller::resume_subscription,
        crate::modules::admin::controller::extend_subscription,
    ),
    components(
        schemas(
            Role,
            User,
            LoginRequest,
            RegisterSchoolRequest,
            LoginResponse,
            MeResponse,
            ErrorResponse,
            MessageResponse,
            SchoolStatus,
            SchoolView,
            UpdateSchoolDto,
            AdminUpdateSchoolDto,
            ExtendSubscriptionDto,
            PaginatedSchoolsResponse,
            SchoolAdminInfo,
            SchoolCounts,
            SchoolDetail,
            SchoolStateCounts,
            PlatformStats,
            SubscriptionState,
            SubscriptionSummary,
            Class,
            ClassWithStats,
            CreateClassDto,
            UpdateClassDto,
            PaginatedClassesResponse,
            Subject,
            CreateSubjectDto,
            UpdateSubjectDto,
            PaginatedSubjectsResponse,
            CreateParentDto,
            UpdateParentDto,
            ParentWithChildren,
            PaginatedParentsResponse,
            Student,
            StudentWithClass,
            CreateStudentDto,
            UpdateStudentDto,
            PaginatedStudentsResponse,
            SubjectAverage,
            PublicStudentResult,
            GradeType,
            Grade,
            GradeWithDetails,
            CreateGradeDto,
            UpdateGradeDto,
            BulkGradeEntry,
            BulkGradeDto,
            BulkGradeResponse,
            PaginatedGradesResponse,
            AttendanceStatus,
            Attendance,
            AttendanceWithStudent,
            CreateAttendanceDto,
            UpdateAttendanceDto,
            PaginatedAttendanceResponse,
            Document,
            UploadDocumentForm,
            PaginatedDocumentsResponse,
            Notification,
            CreateNotificationForm,
            PlatformSettings,
            UpdateSettingsDto,
            RiskReason,
            RiskThresholds,
            RiskEntry,
            RiskResponse,
            PerformanceGroupBy,
            PerformanceGroup,
            PerformanceResponse,
            PaginationMeta,
            PaginationParams,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "School registration, login and the current user"),
        (name = "School", description = "The caller's own school"),
        (name = "Classes", description = "Class management"),
        (name = "Subjects", description = "Subjects and their coefficients"),
        (name = "Parents", description = "Parent accounts of a school"),
        (name = "Students", description = "Student records"),
        (name = "Grades", description = "Grade entry, single and bulk"),
        (name = "Attendance", description = "Daily attendance and parent notification"),
        (name = "Documents", description = "File uploads shared with parents"),
        (name = "Analytics", description = "At-risk students and performance breakdowns"),
        (name = "Parent", description = "Parent portal"),
        (name = "Notifications", description = "Platform announcements"),
        (name = "Public", description = "Unauthenticated endpoints"),
        (name = "Admin", description = "Superadmin console")
    ),
    info(
        title = "Scolaris API",
        version = "0.1.0",
        description = "Multi-tenant school management API built with Axum and PostgreSQL.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
