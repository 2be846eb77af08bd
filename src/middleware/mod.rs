//! Request-level authentication and tenant guards.
//!
//! - [`auth`]: bearer token extraction and the capability extractors
//!   (`RequireSchoolRead`, `RequireSchoolWrite`, `RequireParent`,
//!   `RequireSuperAdmin`)
//! - [`tenant`]: the subscription write gate layered on tenant routers
//!
//! ```ignore
//! use crate::middleware::auth::RequireSchoolWrite;
//!
//! async fn create_class(
//!     State(state): State<AppState>,
//!     RequireSchoolWrite(session): RequireSchoolWrite,
//!     ValidatedJson(dto): ValidatedJson<CreateClassDto>,
//! ) -> Result<(StatusCode, Json<Class>), AppError> {
//!     let school_id = session.school_id()?;
//!     // ...
//! }
//! ```

pub mod auth;
pub mod tenant;
