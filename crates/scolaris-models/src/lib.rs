//! # Scolaris Models
//!
//! Database rows, request/response DTOs and the pure domain rules that do
//! not need a connection: the subscription lifecycle, NSI generation,
//! typed platform settings and risk classification.
//!
//! ```ignore
//! use scolaris_models::subscription::SubscriptionState;
//! use chrono::Utc;
//!
//! let mut sub = school.subscription();
//! sub.pause(Utc::now())?;
//! assert_eq!(sub.state(Utc::now()), SubscriptionState::Paused);
//! ```

pub mod analytics;
pub mod attendance;
pub mod auth;
pub mod classes;
pub mod documents;
pub mod grades;
pub mod notifications;
pub mod nsi;
pub mod schools;
pub mod settings;
pub mod students;
pub mod subjects;
pub mod subscription;
pub mod users;

pub use schools::{School, SchoolStatus, SchoolView};
pub use settings::{PlatformSettings, SettingKey, SettingsError};
pub use subscription::{Subscription, SubscriptionError, SubscriptionState, SubscriptionSummary};
pub use users::User;
