//! # Crosstrace Protocol
//!
//! Plain data contract between the correlation engine and its callers.
//!
//! Input rows arrive exactly as the upstream extraction parsers produced
//! them (raw spellings, empty strings for absent fields); output structures
//! are framework-free and serialize directly to any wire format. No engine
//! logic lives here beyond the closed direction/chat-kind enumerations that
//! every downstream pass relies on.

use anyhow::Result;
use serde::{Deserialize, Serialize};

mod report;
mod rows;

pub use report::{
    BucketLabel, ConversationEntry, ConversationPeer, ConversationTurn, CorrelationBucket,
    CorrelationReport, CorrelationSummary, DeviceHeader, DevicePairOverlap, PeerIntensity,
};
pub use rows::{AccountRow, ContactRow, Device, DeviceId, HashRow, MessageRow};

/// Message direction, folded from the many raw spellings observed in
/// extraction exports (`sent`, `Outgoing`, `received`, `incoming`, ...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Outgoing,
    Incoming,
    #[default]
    Unknown,
}

impl Direction {
    /// Fold a raw direction column value into the closed enumeration.
    ///
    /// Total: unknown spellings, numeric codes (`"2"`, `"2 (draft)"`) and
    /// `"(not parsed)"` markers all map to [`Direction::Unknown`].
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Unknown;
        }
        let lower = trimmed.to_lowercase();
        if lower.contains("(not parsed)") {
            return Self::Unknown;
        }
        // Some exports put numeric status codes in the direction column.
        if trimmed.starts_with(|c: char| c.is_ascii_digit()) {
            return Self::Unknown;
        }
        if lower == "sent" || lower.starts_with("out") {
            Self::Outgoing
        } else if lower == "received" || lower.starts_with("in") {
            Self::Incoming
        } else {
            Self::Unknown
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Outgoing => "Outgoing",
            Self::Incoming => "Incoming",
            Self::Unknown => "Unknown",
        }
    }

    #[must_use]
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// Conversation shape, folded from the raw chat-type column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatKind {
    OneOnOne,
    Group,
    Broadcast,
    #[default]
    Unknown,
}

impl ChatKind {
    /// Fold a raw chat-type column value into the closed enumeration.
    ///
    /// Punctuation and spacing are ignored, so `one on one`, `one-on-one`
    /// and `OneOnOne` all fold the same way. Unknown spellings and empty
    /// values map to [`ChatKind::Unknown`].
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        let folded: String = raw
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect::<String>()
            .to_lowercase();
        if folded.is_empty() {
            return Self::Unknown;
        }
        if folded.contains("broadcast") {
            Self::Broadcast
        } else if folded.contains("group") {
            Self::Group
        } else if matches!(
            folded.as_str(),
            "oneonone" | "onetoone" | "private" | "direct" | "individual"
        ) {
            Self::OneOnOne
        } else {
            Self::Unknown
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneOnOne => "one on one",
            Self::Group => "group",
            Self::Broadcast => "broadcast",
            Self::Unknown => "unknown",
        }
    }

    /// Group-like kinds share the group identity rules during resolution.
    #[must_use]
    pub const fn is_group_like(self) -> bool {
        matches!(self, Self::Group | Self::Broadcast)
    }
}

/// Whether a resolved counterparty is a person or a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeerKind {
    Person,
    Group,
}

impl PeerKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Group => "group",
        }
    }
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn direction_folds_observed_spellings() {
        assert_eq!(Direction::from_raw("sent"), Direction::Outgoing);
        assert_eq!(Direction::from_raw("Outgoing"), Direction::Outgoing);
        assert_eq!(Direction::from_raw("OUT"), Direction::Outgoing);
        assert_eq!(Direction::from_raw("received"), Direction::Incoming);
        assert_eq!(Direction::from_raw("incoming"), Direction::Incoming);
        assert_eq!(Direction::from_raw("In"), Direction::Incoming);
    }

    #[test]
    fn direction_rejects_codes_and_markers() {
        assert_eq!(Direction::from_raw(""), Direction::Unknown);
        assert_eq!(Direction::from_raw("2"), Direction::Unknown);
        assert_eq!(Direction::from_raw("2 (draft)"), Direction::Unknown);
        assert_eq!(Direction::from_raw("(not parsed)"), Direction::Unknown);
        assert_eq!(Direction::from_raw("delivered"), Direction::Unknown);
    }

    #[test]
    fn direction_is_idempotent_on_display_form() {
        for d in [Direction::Outgoing, Direction::Incoming, Direction::Unknown] {
            assert_eq!(Direction::from_raw(d.as_str()), d);
        }
    }

    #[test]
    fn chat_kind_folds_punctuation_variants() {
        assert_eq!(ChatKind::from_raw("one on one"), ChatKind::OneOnOne);
        assert_eq!(ChatKind::from_raw("One-On-One"), ChatKind::OneOnOne);
        assert_eq!(ChatKind::from_raw("private"), ChatKind::OneOnOne);
        assert_eq!(ChatKind::from_raw("Group Chat"), ChatKind::Group);
        assert_eq!(ChatKind::from_raw("broadcast"), ChatKind::Broadcast);
        assert_eq!(ChatKind::from_raw("Broadcast Group"), ChatKind::Broadcast);
        assert_eq!(ChatKind::from_raw(""), ChatKind::Unknown);
        assert_eq!(ChatKind::from_raw("channel"), ChatKind::Unknown);
    }

    #[test]
    fn bucket_label_lookup() {
        let bucket = CorrelationBucket {
            key: "628123456789".to_string(),
            fingerprint: "ff".to_string(),
            device_ids: vec![1, 3],
            labels: vec![
                BucketLabel {
                    device_id: 1,
                    label: "Dewi".to_string(),
                },
                BucketLabel {
                    device_id: 3,
                    label: "Dewi Kantor".to_string(),
                },
            ],
        };
        assert_eq!(bucket.device_count(), 2);
        assert_eq!(bucket.label_for(3), Some("Dewi Kantor"));
        assert_eq!(bucket.label_for(2), None);
    }

    #[test]
    fn rows_serialize_round_trip() {
        let row = MessageRow {
            device_id: 7,
            message_id: 42,
            platform: "WhatsApp".to_string(),
            thread_id: "t-1".to_string(),
            direction: "sent".to_string(),
            ..MessageRow::default()
        };
        let json = serialize_json(&row).expect("serialize");
        let back: MessageRow = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, row);
    }
}
