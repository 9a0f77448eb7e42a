//! # Crosstrace Correlate
//!
//! Cross-device correlation for one investigative case: which contacts,
//! hashed files, and social-media accounts appear on more than one
//! seized device.
//!
//! One parametrized index does the work for every domain; the domain
//! entry points only choose a key function and a label function. All
//! passes are pure and deterministic: equal row sequences produce equal
//! reports, with no dependency on hash-map iteration order.

mod domains;
mod error;
mod index;
mod label;
mod matrix;

pub use domains::{
    correlate_accounts, correlate_contacts, correlate_hash_files, hash_overlap_matrix,
    HashKeyPolicy,
};
pub use error::{CorrelateError, Result};
pub use index::{correlate, key_fingerprint, CorrelationIndex, DEFAULT_MIN_DEVICES};
pub use label::DeviceLabeler;
pub use matrix::device_pair_overlap;
