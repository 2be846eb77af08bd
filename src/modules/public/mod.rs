//! Unauthenticated endpoints: platform settings, result lookup by NSI and
//! login-page notifications.

pub mod controller;
pub mod model;
pub mod router;
pub mod service;

pub use model::*;
pub use router::init_public_router;
