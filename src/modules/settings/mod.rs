//! Platform settings: public read, superadmin update.
//!
//! There is no router of its own; the handlers are mounted by the `public`
//! and `admin` routers.

pub mod controller;
pub mod model;
pub mod service;

pub use model::*;
