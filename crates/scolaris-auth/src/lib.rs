//! # Scolaris Auth
//!
//! Who is calling and what they may do.
//!
//! - [`claims`] / [`jwt`]: signed access tokens
//! - [`session`]: the caller as seen by services
//! - [`policy`]: role, scope and subscription-standing decisions
//!
//! ```ignore
//! use scolaris_auth::{Capability, Session, authorize, verify_token};
//!
//! let session = Session::try_from(verify_token(&token, &jwt_config)?)?;
//! authorize(&session, Capability::ReadSchoolData).into_result()?;
//! ```

pub mod claims;
pub mod jwt;
pub mod policy;
pub mod role;
pub mod session;

pub use claims::Claims;
pub use jwt::{create_access_token, verify_token};
pub use policy::{
    Capability, Decision, DenyReason, SchoolStanding, authorize, authorize_write,
};
pub use role::Role;
pub use session::Session;
