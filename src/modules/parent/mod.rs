//! The parent portal: a parent's own children and their records.

pub mod controller;
pub mod router;

pub use router::init_parent_router;
