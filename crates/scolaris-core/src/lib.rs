//! # Scolaris Core
//!
//! Foundational types shared by every Scolaris crate:
//!
//! - [`errors`]: [`AppError`] and its HTTP response mapping
//! - [`file_storage`]: storage trait for uploads plus the local-disk backend
//! - [`pagination`]: page/limit query parameters and response metadata
//! - [`password`]: bcrypt hashing
//! - [`serde`]: lenient deserializers for query strings
//! - [`validation`]: validator error formatting

pub mod errors;
pub mod file_storage;
pub mod pagination;
pub mod password;
pub mod serde;
pub mod validation;

pub use errors::AppError;
pub use pagination::{PaginationMeta, PaginationParams};
pub use password::{hash_password, verify_password};
