use std::cmp::Ordering;

use crosstrace_protocol::{DeviceId, DevicePairOverlap};

use crate::index::{round2, CorrelationIndex};

/// Pairwise key overlap between devices, computed over every key the
/// index has accepted. The `min_devices` threshold does not apply here;
/// a key held by a single device still counts toward that device's
/// total.
///
/// One entry per unordered pair from `device_order`, scored with the
/// Jaccard percentage of shared keys and sorted descending (ties keep
/// pair enumeration order). A pair with no keys at all scores zero.
#[must_use]
pub fn device_pair_overlap(
    index: &CorrelationIndex,
    device_order: &[DeviceId],
) -> Vec<DevicePairOverlap> {
    let mut out = Vec::new();
    for (i, &device_a) in device_order.iter().enumerate() {
        for &device_b in &device_order[i + 1..] {
            if device_a == device_b {
                continue;
            }
            let mut common = Vec::new();
            let mut union = 0usize;
            for (key, devices) in index.entries() {
                let on_a = devices.contains(&device_a);
                let on_b = devices.contains(&device_b);
                if on_a || on_b {
                    union += 1;
                }
                if on_a && on_b {
                    common.push(key.to_string());
                }
            }
            let overlap_pct = if union == 0 {
                0.0
            } else {
                round2(common.len() as f64 / union as f64 * 100.0)
            };
            out.push(DevicePairOverlap {
                device_a,
                device_b,
                common_keys: common.len(),
                total_keys: union,
                overlap_pct,
                common,
            });
        }
    }
    out.sort_by(|a, b| {
        b.overlap_pct
            .partial_cmp(&a.overlap_pct)
            .unwrap_or(Ordering::Equal)
    });
    out
}
