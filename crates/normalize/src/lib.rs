//! # Crosstrace Normalize
//!
//! Canonicalization primitives shared by every correlation pass.
//!
//! Extraction exports are messy: numbers arrive with separators and
//! inconsistent prefixes, names carry zero-width characters and literal
//! `nan`/`null` placeholders, platform columns use half a dozen spellings
//! for the same service. Everything here is total: malformed input
//! degrades to an empty value, never an error (one bad field must not
//! abort a whole pass).

mod ident;
mod phone;
mod platform;

pub use ident::{
    clean_identifier, looks_like_id, scrub_marks, split_number_name, strip_handle_suffix,
};
pub use phone::{extract_phone_candidates, PhoneRule};
pub use platform::{canonical_platform, same_platform};
