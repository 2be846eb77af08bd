pub use scolaris_models::notifications::{
    Audience, CreateNotificationForm, NewNotification, Notification, parse_form_flag,
};

/// Optional media part of a notification form.
#[derive(Debug)]
pub struct MediaUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}
