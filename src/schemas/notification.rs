use serde::{Deserialize, Serialize};

use crate::core::time::format_primitive;
use crate::db::models::Notification;
use crate::db::types::NotificationKind;

#[derive(Debug, Serialize)]
pub(crate) struct NotificationResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) message: String,
    pub(crate) kind: NotificationKind,
    pub(crate) is_read: bool,
    pub(crate) created_at: String,
}

impl NotificationResponse {
    pub(crate) fn from_db(notification: Notification) -> Self {
        Self {
            id: notification.id,
            title: notification.title,
            message: notification.message,
            kind: notification.kind,
            is_read: notification.is_read,
            created_at: format_primitive(notification.created_at),
        }
    }
}

/// Exactly one of `user_id`, `role`, `user_ids` selects the audience.
#[derive(Debug, Deserialize)]
pub(crate) struct SendNotificationRequest {
    #[serde(default)]
    #[serde(alias = "userId")]
    pub(crate) user_id: Option<String>,
    #[serde(default)]
    pub(crate) role: Option<String>,
    #[serde(default)]
    #[serde(alias = "userIds")]
    pub(crate) user_ids: Option<Vec<String>>,
    pub(crate) title: String,
    pub(crate) message: String,
    #[serde(default = "default_kind")]
    pub(crate) kind: NotificationKind,
}

#[derive(Debug, Serialize)]
pub(crate) struct SendNotificationResponse {
    pub(crate) count: u64,
}

#[derive(Debug, Serialize)]
pub(crate) struct UnreadCountResponse {
    pub(crate) count: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct MarkAllReadResponse {
    pub(crate) updated: u64,
}

fn default_kind() -> NotificationKind {
    NotificationKind::Info
}
