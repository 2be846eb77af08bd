pub use scolaris_models::settings::{
    DEFAULT_TRIAL_DAYS, PlatformSettings, SettingKey, SettingsError, UpdateSettingsDto,
};
