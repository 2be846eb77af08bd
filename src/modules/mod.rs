pub mod admin;
pub mod analytics;
pub mod attendance;
pub mod auth;
pub mod classes;
pub mod documents;
pub mod grades;
pub mod notifications;
pub mod parent;
pub mod parents;
pub mod public;
pub mod school;
pub mod settings;
pub mod students;
pub mod subjects;

pub use self::auth::model::LoginRequest;
pub use self::students::model::Student;
