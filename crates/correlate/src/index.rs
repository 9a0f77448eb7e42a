use std::collections::{HashMap, HashSet};

use crosstrace_protocol::{BucketLabel, CorrelationBucket, CorrelationSummary, DeviceId};
use sha2::{Digest, Sha256};

use crate::error::{CorrelateError, Result};

/// Default minimum device count for a key to count as a correlation.
pub const DEFAULT_MIN_DEVICES: usize = 2;

/// Accumulates `key -> devices` observations and reports the keys seen
/// on enough distinct devices.
///
/// Keys are held in first-seen order and the final bucket list is
/// sorted explicitly (device count descending, then key ascending), so
/// equal input sequences always produce byte-equal output. No result
/// ever depends on hash-map iteration order.
#[derive(Debug)]
pub struct CorrelationIndex {
    min_devices: usize,
    blacklist: HashSet<String>,

    /// Key -> position in `keys`/`accums`.
    slots: HashMap<String, usize>,
    keys: Vec<String>,
    accums: Vec<KeyAccum>,
}

#[derive(Debug, Default)]
struct KeyAccum {
    /// Devices in first-observed order, no duplicates.
    devices: Vec<DeviceId>,

    /// One label per entry of `devices`, same order.
    labels: Vec<BucketLabel>,
}

impl CorrelationIndex {
    pub fn new(min_devices: usize) -> Result<Self> {
        if min_devices == 0 {
            return Err(CorrelateError::InvalidMinDevices(min_devices));
        }
        Ok(Self::with_min(min_devices))
    }

    /// Accumulator with no threshold, for overlap matrices where every
    /// key counts.
    pub(crate) fn unthresholded() -> Self {
        Self::with_min(1)
    }

    fn with_min(min_devices: usize) -> Self {
        Self {
            min_devices,
            blacklist: HashSet::new(),
            slots: HashMap::new(),
            keys: Vec::new(),
            accums: Vec::new(),
        }
    }

    /// Keys that must never form a bucket (placeholder identifiers such
    /// as a system sender id).
    #[must_use]
    pub fn with_blacklist<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blacklist.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Record one observation of `key` on `device_id`.
    ///
    /// Empty and blacklisted keys are dropped. The first label seen for
    /// a (key, device) pair sticks; a later non-empty label only fills
    /// in if the first was empty.
    pub fn insert(&mut self, device_id: DeviceId, key: &str, label: &str) {
        if key.is_empty() || self.blacklist.contains(key) {
            return;
        }
        let slot = match self.slots.get(key) {
            Some(&slot) => slot,
            None => {
                let slot = self.accums.len();
                self.slots.insert(key.to_string(), slot);
                self.keys.push(key.to_string());
                self.accums.push(KeyAccum::default());
                slot
            }
        };
        let accum = &mut self.accums[slot];
        match accum.devices.iter().position(|id| *id == device_id) {
            None => {
                accum.devices.push(device_id);
                accum.labels.push(BucketLabel {
                    device_id,
                    label: label.to_string(),
                });
            }
            Some(pos) if accum.labels[pos].label.is_empty() && !label.is_empty() => {
                accum.labels[pos].label = label.to_string();
            }
            Some(_) => {}
        }
    }

    /// Distinct keys accepted so far.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// All accepted keys with their device sets, in first-seen order.
    pub(crate) fn entries(&self) -> impl Iterator<Item = (&str, &[DeviceId])> {
        self.keys
            .iter()
            .map(String::as_str)
            .zip(self.accums.iter().map(|accum| accum.devices.as_slice()))
    }

    /// Apply the threshold and produce the final sorted bucket list
    /// with summary statistics.
    #[must_use]
    pub fn finish(self) -> (Vec<CorrelationBucket>, CorrelationSummary) {
        let min_devices = self.min_devices;
        let total_keys = self.keys.len();
        let unique_keys = self
            .accums
            .iter()
            .filter(|accum| accum.devices.len() == 1)
            .count();

        let mut buckets: Vec<CorrelationBucket> = self
            .keys
            .into_iter()
            .zip(self.accums)
            .filter(|(_, accum)| accum.devices.len() >= min_devices)
            .map(|(key, accum)| {
                let fingerprint = key_fingerprint(&key);
                let mut device_ids = accum.devices;
                device_ids.sort_unstable();
                let mut labels = accum.labels;
                labels.sort_by_key(|label| label.device_id);
                CorrelationBucket {
                    key,
                    fingerprint,
                    device_ids,
                    labels,
                }
            })
            .collect();
        buckets.sort_by(|a, b| {
            b.device_ids
                .len()
                .cmp(&a.device_ids.len())
                .then_with(|| a.key.cmp(&b.key))
        });

        let summary = CorrelationSummary {
            total_keys,
            unique_keys,
            correlated_keys: buckets.len(),
            correlation_rate: round2(percentage(buckets.len(), total_keys)),
        };
        log::debug!(
            "correlation pass: {} keys, {} correlated (min_devices={})",
            summary.total_keys,
            summary.correlated_keys,
            min_devices
        );
        (buckets, summary)
    }
}

/// Drive a full correlation pass over `(device_id, payload)` rows.
///
/// `key_fn` may derive zero or more correlation keys per payload (a
/// contact cell can hold several phone numbers); `label_fn` derives the
/// per-device display string recorded alongside each key.
pub fn correlate<P, K, L>(
    rows: &[(DeviceId, P)],
    min_devices: usize,
    mut key_fn: K,
    mut label_fn: L,
) -> Result<(Vec<CorrelationBucket>, CorrelationSummary)>
where
    K: FnMut(&P) -> Vec<String>,
    L: FnMut(&P) -> String,
{
    let mut index = CorrelationIndex::new(min_devices)?;
    for (device_id, payload) in rows {
        let label = label_fn(payload);
        for key in key_fn(payload) {
            index.insert(*device_id, &key, &label);
        }
    }
    Ok(index.finish())
}

/// SHA-256 hex fingerprint of a correlation key, stable across runs.
#[must_use]
pub fn key_fingerprint(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    digest.iter().map(|byte| format!("{byte:02x}")).collect()
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}
