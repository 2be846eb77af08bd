pub use scolaris_models::grades::{
    BulkGradeDto, BulkGradeEntry, BulkGradeResponse, CreateGradeDto, Grade, GradeFilterParams,
    GradeType, GradeWithDetails, PaginatedGradesResponse, UpdateGradeDto,
};
