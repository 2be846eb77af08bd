pub use scolaris_models::users::{
    CreateParentDto, PaginatedParentsResponse, ParentFilterParams, ParentWithChildren,
    UpdateParentDto, User,
};
