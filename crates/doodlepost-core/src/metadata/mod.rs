//! Shared metadata record written when a doodle is sent.
//!
//! The record is a flat key-value map consumed by a separate display surface
//! (the home-screen widget). The drawing core never reads it back.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::color::Rgba;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Fixed keys of the shared record.
pub mod keys {
    pub const LATEST_IMAGE_PATH: &str = "latestImagePath";
    pub const SENDER_NAME: &str = "senderName";
    pub const SENDER_INITIALS: &str = "senderInitials";
    pub const SENDER_COLOR: &str = "senderColor";
    pub const DOODLE_ID: &str = "doodleId";
    pub const LAST_UPDATED: &str = "lastUpdated";
    pub const LAST_WIDGET_REFRESH: &str = "lastWidgetRefresh";
}

/// Metadata store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing key: {0}")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Lock error: {0}")]
    Lock(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Key-value backend for the shared record.
pub trait MetadataStore: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Write a value.
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove a value. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> StoreResult<()>;

    /// Write several values. Backends may override to write atomically.
    fn set_many(&self, entries: &[(&'static str, String)]) -> StoreResult<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }
}

/// Initials for a display name.
///
/// Uses the first letter of each of the first two space-separated words, or
/// the first two characters of a single-word name, upper-cased.
pub fn sender_initials(name: &str) -> String {
    let words: Vec<&str> = name.split_whitespace().collect();
    let initials: String = match words.as_slice() {
        [] => String::new(),
        [single] => single.chars().take(2).collect(),
        [first, second, ..] => first.chars().take(1).chain(second.chars().take(1)).collect(),
    };
    initials.to_uppercase()
}

/// The record describing the most recently received doodle.
#[derive(Debug, Clone, PartialEq)]
pub struct DoodleMetadata {
    /// Filesystem path of the PNG.
    pub latest_image_path: String,
    pub sender_name: String,
    pub sender_initials: String,
    /// Sender accent color.
    pub sender_color: Rgba,
    pub doodle_id: Option<String>,
    pub last_updated: DateTime<Utc>,
    pub last_widget_refresh: Option<DateTime<Utc>>,
}

impl DoodleMetadata {
    /// Build a record for a freshly written image; initials are derived from
    /// the name.
    pub fn new(
        latest_image_path: impl Into<String>,
        sender_name: impl Into<String>,
        sender_color: Rgba,
        doodle_id: Option<String>,
        last_updated: DateTime<Utc>,
    ) -> Self {
        let sender_name = sender_name.into();
        Self {
            latest_image_path: latest_image_path.into(),
            sender_initials: sender_initials(&sender_name),
            sender_name,
            sender_color,
            doodle_id,
            last_updated,
            last_widget_refresh: None,
        }
    }

    /// Flatten to the shared key-value contract.
    pub fn to_entries(&self) -> Vec<(&'static str, String)> {
        let mut entries = vec![
            (keys::LATEST_IMAGE_PATH, self.latest_image_path.clone()),
            (keys::SENDER_NAME, self.sender_name.clone()),
            (keys::SENDER_INITIALS, self.sender_initials.clone()),
            (keys::SENDER_COLOR, self.sender_color.to_hex()),
            (keys::LAST_UPDATED, self.last_updated.to_rfc3339()),
        ];
        if let Some(id) = &self.doodle_id {
            entries.push((keys::DOODLE_ID, id.clone()));
        }
        if let Some(refreshed) = &self.last_widget_refresh {
            entries.push((keys::LAST_WIDGET_REFRESH, refreshed.to_rfc3339()));
        }
        entries
    }

    /// Write the record, dropping optional keys this record does not carry.
    pub fn write_to(&self, store: &dyn MetadataStore) -> StoreResult<()> {
        store.set_many(&self.to_entries())?;
        if self.doodle_id.is_none() {
            store.remove(keys::DOODLE_ID)?;
        }
        Ok(())
    }

    /// Read the record back from a store.
    pub fn read_from(store: &dyn MetadataStore) -> StoreResult<Self> {
        let required = |key: &'static str| -> StoreResult<String> {
            store.get(key)?.ok_or(StoreError::Missing(key))
        };

        let sender_color = Rgba::from_hex(&required(keys::SENDER_COLOR)?).map_err(|e| {
            StoreError::InvalidValue {
                key: keys::SENDER_COLOR,
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            latest_image_path: required(keys::LATEST_IMAGE_PATH)?,
            sender_name: required(keys::SENDER_NAME)?,
            sender_initials: required(keys::SENDER_INITIALS)?,
            sender_color,
            doodle_id: store.get(keys::DOODLE_ID)?,
            last_updated: parse_timestamp(keys::LAST_UPDATED, &required(keys::LAST_UPDATED)?)?,
            last_widget_refresh: store
                .get(keys::LAST_WIDGET_REFRESH)?
                .map(|value| parse_timestamp(keys::LAST_WIDGET_REFRESH, &value))
                .transpose()?,
        })
    }
}

/// Stamp the widget refresh time.
pub fn mark_widget_refreshed(store: &dyn MetadataStore, at: DateTime<Utc>) -> StoreResult<()> {
    store.set(keys::LAST_WIDGET_REFRESH, &at.to_rfc3339())
}

fn parse_timestamp(key: &'static str, value: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::InvalidValue {
            key,
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_initials_two_words() {
        assert_eq!(sender_initials("ada lovelace"), "AL");
        assert_eq!(sender_initials("Grace Brewster Hopper"), "GB");
    }

    #[test]
    fn test_initials_single_word() {
        assert_eq!(sender_initials("cher"), "CH");
        assert_eq!(sender_initials("Q"), "Q");
    }

    #[test]
    fn test_initials_empty_and_extra_spaces() {
        assert_eq!(sender_initials(""), "");
        assert_eq!(sender_initials("   "), "");
        assert_eq!(sender_initials("  jane   doe "), "JD");
    }

    #[test]
    fn test_record_roundtrip_through_store() {
        let store = MemoryStore::new();
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let record = DoodleMetadata::new(
            "/tmp/doodle.png",
            "Ada Lovelace",
            Rgba::rgb(0, 122, 255),
            Some("abc".to_string()),
            at,
        );

        record.write_to(&store).unwrap();
        assert_eq!(store.get(keys::SENDER_COLOR).unwrap().as_deref(), Some("#007AFF"));
        assert_eq!(store.get(keys::SENDER_INITIALS).unwrap().as_deref(), Some("AL"));

        let loaded = DoodleMetadata::read_from(&store).unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn test_rewrite_without_id_clears_stale_id() {
        let store = MemoryStore::new();
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        DoodleMetadata::new("a.png", "Ada", Rgba::black(), Some("old".to_string()), at)
            .write_to(&store)
            .unwrap();
        DoodleMetadata::new("b.png", "Ada", Rgba::black(), None, at)
            .write_to(&store)
            .unwrap();
        assert_eq!(store.get(keys::DOODLE_ID).unwrap(), None);
    }

    #[test]
    fn test_widget_refresh_stamp() {
        let store = MemoryStore::new();
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        DoodleMetadata::new("a.png", "Ada", Rgba::black(), None, at)
            .write_to(&store)
            .unwrap();

        let refreshed = Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap();
        mark_widget_refreshed(&store, refreshed).unwrap();
        let loaded = DoodleMetadata::read_from(&store).unwrap();
        assert_eq!(loaded.last_widget_refresh, Some(refreshed));
    }

    #[test]
    fn test_read_missing_key() {
        let store = MemoryStore::new();
        assert!(matches!(
            DoodleMetadata::read_from(&store),
            Err(StoreError::Missing(_))
        ));
    }
}
