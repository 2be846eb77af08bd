//! Typed platform settings.
//!
//! Stored as one JSONB value per key in `platform_settings`. Every known key
//! has a typed field and a default, so a missing row is never an error. A
//! stored value of the wrong shape is, and the error names the key.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    PlatformName,
    SupportEmail,
    SupportPhone,
    TrialDays,
    MaintenanceMode,
    AdsEnabled,
}

impl SettingKey {
    pub const ALL: [SettingKey; 6] = [
        SettingKey::PlatformName,
        SettingKey::SupportEmail,
        SettingKey::SupportPhone,
        SettingKey::TrialDays,
        SettingKey::MaintenanceMode,
        SettingKey::AdsEnabled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::PlatformName => "platform_name",
            SettingKey::SupportEmail => "support_email",
            SettingKey::SupportPhone => "support_phone",
            SettingKey::TrialDays => "trial_days",
            SettingKey::MaintenanceMode => "maintenance_mode",
            SettingKey::AdsEnabled => "ads_enabled",
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == key)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("setting `{key}` has an invalid value: {reason}")]
    Malformed { key: &'static str, reason: String },
}

pub const DEFAULT_TRIAL_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PlatformSettings {
    pub platform_name: String,
    pub support_email: Option<String>,
    pub support_phone: Option<String>,
    /// Length of the free trial granted at self-registration
    pub trial_days: i64,
    pub maintenance_mode: bool,
    pub ads_enabled: bool,
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            platform_name: "Scolaris".to_string(),
            support_email: None,
            support_phone: None,
            trial_days: DEFAULT_TRIAL_DAYS,
            maintenance_mode: false,
            ads_enabled: false,
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(key: SettingKey, value: Value) -> Result<T, SettingsError> {
    serde_json::from_value(value).map_err(|e| SettingsError::Malformed {
        key: key.as_str(),
        reason: e.to_string(),
    })
}

impl PlatformSettings {
    /// Builds settings from stored rows over the defaults. Unknown keys are
    /// skipped.
    pub fn from_rows<I>(rows: I) -> Result<Self, SettingsError>
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let mut settings = Self::default();
        for (raw_key, value) in rows {
            let Some(key) = SettingKey::parse(&raw_key) else {
                continue;
            };
            match key {
                SettingKey::PlatformName => settings.platform_name = decode(key, value)?,
                SettingKey::SupportEmail => settings.support_email = decode(key, value)?,
                SettingKey::SupportPhone => settings.support_phone = decode(key, value)?,
                SettingKey::TrialDays => {
                    let days: i64 = decode(key, value)?;
                    if days < 1 {
                        return Err(SettingsError::Malformed {
                            key: key.as_str(),
                            reason: format!("expected a positive number of days, got {days}"),
                        });
                    }
                    settings.trial_days = days;
                }
                SettingKey::MaintenanceMode => settings.maintenance_mode = decode(key, value)?,
                SettingKey::AdsEnabled => settings.ads_enabled = decode(key, value)?,
            }
        }
        Ok(settings)
    }

    pub fn value_of(&self, key: SettingKey) -> Value {
        match key {
            SettingKey::PlatformName => Value::from(self.platform_name.clone()),
            SettingKey::SupportEmail => self.support_email.clone().map_or(Value::Null, Value::from),
            SettingKey::SupportPhone => self.support_phone.clone().map_or(Value::Null, Value::from),
            SettingKey::TrialDays => Value::from(self.trial_days),
            SettingKey::MaintenanceMode => Value::from(self.maintenance_mode),
            SettingKey::AdsEnabled => Value::from(self.ads_enabled),
        }
    }

    /// Applies an update and returns the keys that changed.
    pub fn apply(&mut self, dto: UpdateSettingsDto) -> Vec<SettingKey> {
        let mut changed = Vec::new();

        if let Some(name) = dto.platform_name
            && name != self.platform_name
        {
            self.platform_name = name;
            changed.push(SettingKey::PlatformName);
        }
        if let Some(email) = dto.support_email {
            let email = Some(email).filter(|e| !e.trim().is_empty());
            if email != self.support_email {
                self.support_email = email;
                changed.push(SettingKey::SupportEmail);
            }
        }
        if let Some(phone) = dto.support_phone {
            let phone = Some(phone).filter(|p| !p.trim().is_empty());
            if phone != self.support_phone {
                self.support_phone = phone;
                changed.push(SettingKey::SupportPhone);
            }
        }
        if let Some(days) = dto.trial_days
            && days != self.trial_days
        {
            self.trial_days = days;
            changed.push(SettingKey::TrialDays);
        }
        if let Some(flag) = dto.maintenance_mode
            && flag != self.maintenance_mode
        {
            self.maintenance_mode = flag;
            changed.push(SettingKey::MaintenanceMode);
        }
        if let Some(flag) = dto.ads_enabled
            && flag != self.ads_enabled
        {
            self.ads_enabled = flag;
            changed.push(SettingKey::AdsEnabled);
        }

        changed
    }
}

/// Partial update; an empty string clears the optional contact fields.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateSettingsDto {
    #[validate(length(min = 1, max = 100, message = "platform_name must be between 1 and 100 characters"))]
    pub platform_name: Option<String>,
    #[validate(length(max = 255))]
    pub support_email: Option<String>,
    #[validate(length(max = 50))]
    pub support_phone: Option<String>,
    #[validate(range(min = 1, max = 365, message = "trial_days must be between 1 and 365"))]
    pub trial_days: Option<i64>,
    pub maintenance_mode: Option<bool>,
    pub ads_enabled: Option<bool>,
}
