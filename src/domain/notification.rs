use std::collections::BTreeMap;

use serde::Serialize;

pub const ADMIN_TOPIC: &str = "admin_notifications";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum NotificationTarget {
    Topic(String),
    Device(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub target: NotificationTarget,
    pub title: String,
    pub body: String,
    pub data: BTreeMap<String, String>,
}

impl Notification {
    pub fn to_topic(topic: &str, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            target: NotificationTarget::Topic(topic.to_string()),
            title: title.into(),
            body: body.into(),
            data: BTreeMap::new(),
        }
    }

    pub fn to_device(token: &str, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            target: NotificationTarget::Device(token.to_string()),
            title: title.into(),
            body: body.into(),
            data: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.data.insert(key.to_string(), value.to_string());
        self
    }
}
