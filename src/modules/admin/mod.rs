//! Superadmin console: every school, its subscription and platform stats.

pub mod controller;
pub mod model;
pub mod router;
pub mod service;

pub use model::*;
pub use router::init_admin_router;
