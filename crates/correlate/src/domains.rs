use crosstrace_normalize::{
    canonical_platform, clean_identifier, extract_phone_candidates, looks_like_id,
    strip_handle_suffix, PhoneRule,
};
use crosstrace_protocol::{
    AccountRow, ContactRow, CorrelationReport, Device, DeviceId, DevicePairOverlap, HashRow,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::index::CorrelationIndex;
use crate::label::DeviceLabeler;
use crate::matrix::device_pair_overlap;

/// Placeholder account/sender ids emitted by some exports; they name a
/// system mailbox, not a person, and must never correlate.
const PLACEHOLDER_IDS: &[&str] = &["0"];

/// Key composition for hashed-file correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashKeyPolicy {
    /// Hash and file name must both match. A byte-identical file that
    /// was renamed between devices will not correlate under this
    /// policy.
    #[default]
    HashAndFileName,

    /// Hash alone decides; renamed copies still correlate.
    HashOnly,
}

impl HashKeyPolicy {
    fn key(self, row: &HashRow) -> String {
        let hash = row.hash_value.trim().to_lowercase();
        if hash.is_empty() {
            return String::new();
        }
        match self {
            Self::HashAndFileName => {
                let name = clean_identifier(&row.file_name).to_lowercase();
                format!("{hash}::{name}")
            }
            Self::HashOnly => hash,
        }
    }
}

/// Correlate contact rows across devices by normalized phone number.
///
/// Every phone-like substring of a row's phone field contributes a key;
/// the per-device label is the cleaned display text, falling back to
/// the number itself when the contact was saved without a name.
pub fn correlate_contacts(
    devices: &[Device],
    rows: &[ContactRow],
    rule: &PhoneRule,
    min_devices: usize,
) -> Result<CorrelationReport> {
    let mut index = CorrelationIndex::new(min_devices)?;
    for row in rows {
        let display = clean_identifier(&row.display_text);
        for candidate in extract_phone_candidates(&row.phone_text) {
            let key = rule.normalize(&candidate);
            let label = if display.is_empty() { &key } else { &display };
            index.insert(row.device_id, &key, label);
        }
    }
    Ok(build_report(devices, index))
}

/// Correlate hashed-file rows across devices.
pub fn correlate_hash_files(
    devices: &[Device],
    rows: &[HashRow],
    policy: HashKeyPolicy,
    min_devices: usize,
) -> Result<CorrelationReport> {
    let mut index = CorrelationIndex::new(min_devices)?;
    for row in rows {
        index.insert(row.device_id, &policy.key(row), &hash_label(row));
    }
    Ok(build_report(devices, index))
}

/// Pairwise file overlap between devices, over every hashed file (the
/// correlation threshold does not apply).
#[must_use]
pub fn hash_overlap_matrix(
    devices: &[Device],
    rows: &[HashRow],
    policy: HashKeyPolicy,
) -> Vec<DevicePairOverlap> {
    let mut index = CorrelationIndex::unthresholded();
    for row in rows {
        index.insert(row.device_id, &policy.key(row), &hash_label(row));
    }
    let labeler = DeviceLabeler::new(&device_ids(devices));
    device_pair_overlap(&index, labeler.ordered_ids())
}

/// Correlate social-media account rows across devices.
///
/// Keys are scoped per platform, so the same handle on two different
/// services never forms one bucket. WhatsApp identifiers are phone
/// numbers and get the phone rule applied, folding local and
/// international spellings together.
pub fn correlate_accounts(
    devices: &[Device],
    rows: &[AccountRow],
    rule: &PhoneRule,
    min_devices: usize,
) -> Result<CorrelationReport> {
    let mut index = CorrelationIndex::new(min_devices)?;
    for row in rows {
        let key = account_key(row, rule);
        let label = {
            let name = clean_identifier(&row.display_name);
            if name.is_empty() {
                strip_handle_suffix(&clean_identifier(&row.account_identifier))
            } else {
                name
            }
        };
        index.insert(row.device_id, &key, &label);
    }
    Ok(build_report(devices, index))
}

fn account_key(row: &AccountRow, rule: &PhoneRule) -> String {
    let platform = canonical_platform(&row.platform);
    if platform.is_empty() {
        return String::new();
    }
    let raw = if row.account_identifier.trim().is_empty() {
        &row.display_name
    } else {
        &row.account_identifier
    };
    let cleaned = clean_identifier(raw);
    // A leading `@` marks a handle, not a host suffix.
    let ident = match cleaned.strip_prefix('@') {
        Some(handle) => handle.trim().to_string(),
        None => strip_handle_suffix(&cleaned),
    };
    if ident.is_empty() || PLACEHOLDER_IDS.contains(&ident.as_str()) {
        return String::new();
    }
    let ident = if platform == "WhatsApp" && looks_like_id(&ident) {
        rule.normalize(&ident)
    } else {
        ident.to_lowercase()
    };
    format!("{}::{ident}", platform.to_lowercase())
}

fn hash_label(row: &HashRow) -> String {
    let name = clean_identifier(&row.file_name);
    if name.is_empty() {
        row.hash_value.trim().to_lowercase()
    } else {
        name
    }
}

fn device_ids(devices: &[Device]) -> Vec<DeviceId> {
    devices.iter().map(|device| device.id).collect()
}

fn build_report(devices: &[Device], index: CorrelationIndex) -> CorrelationReport {
    let labeler = DeviceLabeler::new(&device_ids(devices));
    let (buckets, summary) = index.finish();
    CorrelationReport {
        devices: labeler.headers(devices),
        buckets,
        summary,
    }
}
