use std::collections::HashMap;

use crosstrace_protocol::{Device, DeviceHeader, DeviceId};

/// Stable display letters for the devices of one analysis.
///
/// Device ids are sorted ascending and mapped to `A, B, C, ..., Z, AA,
/// AB, ...`, so every view over the same device set shows the same
/// letters no matter which correlation ran first.
#[derive(Debug, Clone)]
pub struct DeviceLabeler {
    labels: HashMap<DeviceId, String>,
    ordered: Vec<DeviceId>,
}

impl DeviceLabeler {
    #[must_use]
    pub fn new(device_ids: &[DeviceId]) -> Self {
        let mut ordered = device_ids.to_vec();
        ordered.sort_unstable();
        ordered.dedup();
        let labels = ordered
            .iter()
            .enumerate()
            .map(|(index, &id)| (id, letter_label(index)))
            .collect();
        Self { labels, ordered }
    }

    #[must_use]
    pub fn label_of(&self, device_id: DeviceId) -> Option<&str> {
        self.labels.get(&device_id).map(String::as_str)
    }

    /// Device ids in label order (ascending).
    #[must_use]
    pub fn ordered_ids(&self) -> &[DeviceId] {
        &self.ordered
    }

    /// Display headers for the given devices, in label order.
    ///
    /// Devices whose id was not part of the labeled set are skipped.
    #[must_use]
    pub fn headers(&self, devices: &[Device]) -> Vec<DeviceHeader> {
        let mut headers: Vec<DeviceHeader> = devices
            .iter()
            .filter_map(|device| {
                self.label_of(device.id).map(|label| DeviceHeader {
                    device_id: device.id,
                    label: label.to_string(),
                    owner_name: device.owner_name.clone(),
                    phone_number: device.phone_number.clone(),
                })
            })
            .collect();
        headers.sort_by_key(|header| header.device_id);
        headers
    }
}

/// Spreadsheet-style letter for a zero-based position: `A..Z`, then
/// `AA`, `AB`, and so on.
fn letter_label(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((b'A' + (index % 26) as u8) as char);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.into_iter().rev().collect()
}
