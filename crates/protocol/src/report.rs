use crate::{Direction, PeerKind};
use crate::rows::DeviceId;
use serde::{Deserialize, Serialize};

/// Display header for one device in a correlation view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceHeader {
    pub device_id: DeviceId,

    /// Stable display letter (`A`, `B`, ..., `AA`, ...) assigned per analysis.
    pub label: String,

    pub owner_name: String,
    pub phone_number: String,
}

/// Per-device display string attached to a correlation bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketLabel {
    pub device_id: DeviceId,
    pub label: String,
}

/// One normalized identifier observed on at least `min_devices` devices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationBucket {
    /// Normalized correlation key (phone, `hash::name` pair, account id).
    pub key: String,

    /// SHA-256 hex fingerprint of the key, stable across runs.
    pub fingerprint: String,

    /// Devices the key was observed on, ascending.
    pub device_ids: Vec<DeviceId>,

    /// Human-readable label per device, ordered by device id.
    pub labels: Vec<BucketLabel>,
}

impl CorrelationBucket {
    /// Number of distinct devices carrying this key.
    #[must_use]
    pub fn device_count(&self) -> usize {
        self.device_ids.len()
    }

    /// Label recorded for `device_id`, if the key was seen there.
    #[must_use]
    pub fn label_for(&self, device_id: DeviceId) -> Option<&str> {
        self.labels
            .iter()
            .find(|l| l.device_id == device_id)
            .map(|l| l.label.as_str())
    }
}

/// Aggregate statistics over one correlation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationSummary {
    /// Distinct non-empty keys observed on any device.
    pub total_keys: usize,

    /// Keys observed on exactly one device.
    pub unique_keys: usize,

    /// Keys that met the `min_devices` threshold.
    pub correlated_keys: usize,

    /// `correlated_keys / total_keys` as a percentage, 0.0 when no keys.
    pub correlation_rate: f64,
}

/// Full result of one correlation pass: labeled devices, buckets, stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationReport {
    pub devices: Vec<DeviceHeader>,
    pub buckets: Vec<CorrelationBucket>,
    pub summary: CorrelationSummary,
}

/// Shared-key overlap between one pair of devices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevicePairOverlap {
    pub device_a: DeviceId,
    pub device_b: DeviceId,

    /// Keys present on both devices.
    pub common_keys: usize,

    /// Keys present on either device.
    pub total_keys: usize,

    /// `common / total` as a percentage, 0.0 when neither device has keys.
    pub overlap_pct: f64,

    /// The shared keys themselves, in first-observed order.
    pub common: Vec<String>,
}

/// Interaction strength of one resolved counterparty on a device+platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerIntensity {
    /// Resolved display name (person or group).
    pub peer: String,

    /// Best concrete id found for the peer, empty when none was seen.
    pub peer_id: String,

    pub kind: PeerKind,

    /// Messages attributed to this peer across all of its threads.
    pub intensity: usize,

    /// Dominant direction across the peer's threads.
    pub direction: Direction,
}

/// Resolved counterparty attached to an assembled conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationPeer {
    pub kind: PeerKind,
    pub name: String,
    pub id: String,
}

/// One message inside an assembled conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub message_id: u64,
    pub sender: String,
    pub sender_id: String,
    pub direction: Direction,
    pub text: String,

    /// Display time (`HH:MM`), empty when the raw timestamp was unparsable.
    pub time: String,
}

/// One conversation (chat or thread) with its ordered turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEntry {
    /// `chat_id` of the grouped messages, falling back to `thread_id`.
    pub conversation_id: String,

    pub peer: ConversationPeer,
    pub turns: Vec<ConversationTurn>,
}

impl ConversationEntry {
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.turns.len()
    }
}
