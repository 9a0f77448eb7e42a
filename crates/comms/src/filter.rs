use crosstrace_normalize::{clean_identifier, looks_like_id, same_platform, strip_handle_suffix};
use crosstrace_protocol::{DeviceId, MessageRow};
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::error::{CommsError, Result};
use crate::transcript::clean_text;

/// Caller-side narrowing for conversation listings.
///
/// At least one of `person`/`search` must be supplied; the other two
/// fields only narrow the result further.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationQuery {
    /// Name or id of the counterparty to read a conversation with.
    pub person: Option<String>,

    /// Free-text needle matched against message text.
    pub search: Option<String>,

    /// Platform filter, any spelling.
    pub platform: Option<String>,

    pub device_id: Option<DeviceId>,
}

impl ConversationQuery {
    pub fn for_person(name: impl Into<String>) -> Self {
        Self { person: Some(name.into()), ..Self::default() }
    }

    pub fn for_search(needle: impl Into<String>) -> Self {
        Self { search: Some(needle.into()), ..Self::default() }
    }

    #[must_use]
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    #[must_use]
    pub fn with_device(mut self, device_id: DeviceId) -> Self {
        self.device_id = Some(device_id);
        self
    }

    /// A query that names neither a person nor a search needle would list
    /// every message in the case; reject it.
    pub fn validate(&self) -> Result<()> {
        let has_person = self.person.as_deref().is_some_and(|p| !p.trim().is_empty());
        let has_search = self.search.as_deref().is_some_and(|s| !s.trim().is_empty());
        if has_person || has_search {
            Ok(())
        } else {
            Err(CommsError::InvalidQuery)
        }
    }
}

/// Person matching, relaxed for caller queries: exact; substring either
/// direction when the contained side is longer than two characters;
/// two-character queries as whole tokens only; numeric queries also
/// digit-for-digit against id columns.
pub(crate) fn matches_person(query: &str, msg: &MessageRow) -> bool {
    let query = clean_identifier(query);
    if query.is_empty() {
        return false;
    }
    let needle = query.to_lowercase();
    let needle_len = needle.chars().count();

    let names = [
        clean_identifier(&msg.sender_name),
        clean_identifier(&msg.recipient_name),
        clean_identifier(&msg.group_name),
    ];
    let ids = [
        strip_handle_suffix(&clean_identifier(&msg.sender_id)),
        strip_handle_suffix(&clean_identifier(&msg.recipient_id)),
        clean_identifier(&msg.group_id),
    ];

    for field in names.iter().chain(ids.iter()) {
        if field.is_empty() {
            continue;
        }
        let field = field.to_lowercase();
        if field == needle {
            return true;
        }
        if needle_len > 2 {
            let field_len = field.chars().count();
            if field.contains(&needle) || (field_len > 2 && needle.contains(&field)) {
                return true;
            }
        } else if needle_len == 2 && field.unicode_words().any(|w| w == needle) {
            return true;
        }
    }

    if looks_like_id(&query) {
        let digits: String = query.chars().filter(|c| c.is_ascii_digit()).collect();
        if !digits.is_empty() {
            return ids.iter().any(|id| {
                let id_digits: String = id.chars().filter(|c| c.is_ascii_digit()).collect();
                !id_digits.is_empty() && id_digits == digits
            });
        }
    }
    false
}

/// Case-insensitive needle over cleaned message text.
pub(crate) fn matches_search(needle: &str, msg: &MessageRow) -> bool {
    let needle = clean_text(needle).to_lowercase();
    !needle.is_empty() && clean_text(&msg.text).to_lowercase().contains(&needle)
}

/// All query dimensions must agree for a row to pass.
pub(crate) fn row_matches(query: &ConversationQuery, msg: &MessageRow) -> bool {
    if let Some(device_id) = query.device_id {
        if msg.device_id != device_id {
            return false;
        }
    }
    if let Some(platform) = query.platform.as_deref() {
        if !same_platform(platform, &msg.platform) {
            return false;
        }
    }
    if let Some(person) = query.person.as_deref() {
        if !person.trim().is_empty() && !matches_person(person, msg) {
            return false;
        }
    }
    if let Some(search) = query.search.as_deref() {
        if !search.trim().is_empty() && !matches_search(search, msg) {
            return false;
        }
    }
    true
}

/// Keep the messages exchanged with one person, by name or id.
#[must_use]
pub fn filter_by_person<'a>(messages: &'a [MessageRow], query_name: &str) -> Vec<&'a MessageRow> {
    messages.iter().filter(|msg| matches_person(query_name, msg)).collect()
}
