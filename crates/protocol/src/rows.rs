use serde::{Deserialize, Serialize};

/// Identifier of a seized device within one case.
pub type DeviceId = u64;

/// One seized device attached to a case.
///
/// Created when an investigator links an extraction dataset to the case;
/// immutable for the engine's purposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,

    /// Registered owner of the device, used for self-exclusion during
    /// peer resolution.
    pub owner_name: String,

    /// Phone number of the device itself (display only).
    pub phone_number: String,

    /// Extraction dataset this device was populated from.
    pub source_file_id: u64,
}

impl Device {
    #[must_use]
    pub fn new(
        id: DeviceId,
        owner_name: impl Into<String>,
        phone_number: impl Into<String>,
        source_file_id: u64,
    ) -> Self {
        Self {
            id,
            owner_name: owner_name.into(),
            phone_number: phone_number.into(),
            source_file_id,
        }
    }
}

/// One contact record as extracted from a device.
///
/// Fields are raw extraction text; an empty string means the field was
/// absent from the export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRow {
    pub device_id: DeviceId,

    /// Free-form display text (may embed `First name:` style labels).
    pub display_text: String,

    /// Raw field that may contain zero or more phone-like substrings.
    pub phone_text: String,
}

/// One hashed-file record as extracted from a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashRow {
    pub device_id: DeviceId,

    /// Content hash as reported by the extraction tool (hex string).
    pub hash_value: String,

    pub file_name: String,
}

/// One social-media account record as extracted from a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRow {
    pub device_id: DeviceId,

    /// Raw platform name (any spelling; canonicalized by the engine).
    pub platform: String,

    /// Numeric id or handle, whichever the export carried.
    pub account_identifier: String,

    pub display_name: String,
}

/// One chat message as extracted from a device.
///
/// Every text field is raw extraction output: inconsistent spellings,
/// missing values as empty strings, ids mixed into name columns. The
/// engine normalizes these once at ingestion; callers do not need to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRow {
    pub device_id: DeviceId,

    /// Caller-supplied opaque id, preserved through assembly.
    pub message_id: u64,

    pub platform: String,

    /// Platform-specific conversation identifier (empty = absent).
    pub thread_id: String,

    /// Alternative conversation identifier used by some exports.
    pub chat_id: String,

    /// Raw direction column (`sent`, `Outgoing`, `received`, ...).
    pub direction: String,

    /// Raw chat type column (`one on one`, `group`, `broadcast`, or empty).
    pub chat_type: String,

    pub sender_name: String,
    pub sender_id: String,
    pub recipient_name: String,
    pub recipient_id: String,
    pub group_name: String,
    pub group_id: String,

    /// Free-text timestamp in whatever format the export used.
    pub timestamp: String,

    pub text: String,
}
