pub use scolaris_models::schools::{
    AdminUpdateSchoolDto, ExtendSubscriptionDto, PaginatedSchoolsResponse, PlatformStats,
    SchoolAdminInfo, SchoolCounts, SchoolDetail, SchoolFilterParams, SchoolStateCounts,
    SchoolView,
};
