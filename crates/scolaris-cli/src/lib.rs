//! # Scolaris CLI
//!
//! Platform bootstrap and database seeding for Scolaris development.
//!
//! ## Usage
//!
//! ```ignore
//! use scolaris_cli::seeder::{seed_all, SeedConfig};
//!
//! let config = SeedConfig::new(3); // 3 schools with defaults
//! seed_all(&pool, config).await?;
//! ```

pub mod seeder;
pub mod superadmin;
