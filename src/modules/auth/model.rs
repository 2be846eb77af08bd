pub use scolaris_models::auth::{
    ErrorResponse, LoginRequest, LoginResponse, MeResponse, MessageResponse,
    RegisterSchoolRequest,
};
pub use scolaris_models::users::User;
