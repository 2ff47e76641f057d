use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::breadcrumb::{Breadcrumb, Level};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// An error/event report on its way to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub event_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub breadcrumbs: Vec<Breadcrumb>,
}

impl Report {
    pub fn new(level: Level) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            timestamp: Utc::now(),
            level,
            message: None,
            user: None,
            tags: BTreeMap::new(),
            extra: BTreeMap::new(),
            breadcrumbs: Vec::new(),
        }
    }

    pub fn message(level: Level, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::new(level)
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn with_user_id(mut self, id: impl Into<String>) -> Self {
        self.user.get_or_insert_with(User::default).id = Some(id.into());
        self
    }

    /// Set `user.id` unless something already set it. Returns whether it wrote.
    pub fn set_user_id_if_absent(&mut self, id: impl Into<String>) -> bool {
        let user = self.user.get_or_insert_with(User::default);
        if user.id.is_some() {
            return false;
        }
        user.id = Some(id.into());
        true
    }

    /// Insert a tag unless the key is already present. Returns whether it wrote.
    pub fn set_tag_if_absent(&mut self, key: &str, value: impl Into<String>) -> bool {
        set_if_absent(&mut self.tags, key, value)
    }

    /// Insert an extra field unless the key is already present.
    pub fn set_extra_if_absent(&mut self, key: &str, value: impl Into<String>) -> bool {
        set_if_absent(&mut self.extra, key, value)
    }
}

fn set_if_absent(
    map: &mut BTreeMap<String, String>,
    key: &str,
    value: impl Into<String>,
) -> bool {
    match map.entry(key.to_string()) {
        Entry::Occupied(_) => false,
        Entry::Vacant(slot) => {
            slot.insert(value.into());
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_if_absent_never_overwrites() {
        let mut report = Report::new(Level::Error).with_tag("app_name", "X");
        assert!(!report.set_tag_if_absent("app_name", "Y"));
        assert!(report.set_tag_if_absent("master", "yarn"));
        assert_eq!(report.tags["app_name"], "X");
        assert_eq!(report.tags["master"], "yarn");
    }

    #[test]
    fn user_id_respects_existing_value() {
        let mut report = Report::new(Level::Error).with_user_id("alice");
        assert!(!report.set_user_id_if_absent("spark"));
        assert_eq!(report.user.unwrap().id.as_deref(), Some("alice"));

        let mut report = Report::new(Level::Error);
        assert!(report.set_user_id_if_absent("spark"));
        assert_eq!(report.user.unwrap().id.as_deref(), Some("spark"));
    }

    #[test]
    fn empty_sections_are_not_serialized() {
        let json = serde_json::to_value(Report::message(Level::Error, "boom")).unwrap();
        assert_eq!(json["message"], "boom");
        assert_eq!(json["level"], "error");
        assert!(json.get("tags").is_none());
        assert!(json.get("user").is_none());
    }
}
