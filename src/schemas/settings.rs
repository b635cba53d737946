use serde::{Deserialize, Serialize};

use crate::core::time::format_primitive;
use crate::db::models::SystemSetting;

/// `updated_at` is absent for values injected as defaults rather than read
/// from storage.
#[derive(Debug, Serialize)]
pub(crate) struct SettingResponse {
    pub(crate) key: String,
    pub(crate) value: String,
    pub(crate) updated_at: Option<String>,
}

impl SettingResponse {
    pub(crate) fn from_db(setting: SystemSetting) -> Self {
        Self {
            key: setting.key,
            value: setting.value,
            updated_at: Some(format_primitive(setting.updated_at)),
        }
    }

    pub(crate) fn injected(key: &str, value: String) -> Self {
        Self { key: key.to_string(), value, updated_at: None }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SettingUpdate {
    pub(crate) value: String,
}
