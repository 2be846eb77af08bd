pub use scolaris_models::schools::{School, SchoolStatus, SchoolView, UpdateSchoolDto};
pub use scolaris_models::subscription::SubscriptionSummary;
