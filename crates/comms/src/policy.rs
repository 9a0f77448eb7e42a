use std::collections::HashSet;

use crosstrace_normalize::{clean_identifier, split_number_name, strip_handle_suffix};
use crosstrace_protocol::MessageRow;
use unicode_segmentation::UnicodeSegmentation;

/// Phrases the WhatsApp service account (sender id `0`) announces itself
/// with.
const SERVICE_HINTS: &[&str] = &[
    "whatsapp can see",
    "end-to-end",
    "protecting your privacy",
    "new:",
    "add more memories",
    "status photo",
    "tap the sticker",
];

/// Starred promotional blurbs that extraction tools export as ordinary
/// messages.
const PROMO_HINTS: &[&str] = &[
    "not even whatsapp can see",
    "your personal messages",
    "protected with end-to-end",
    "protecting your privacy",
    "new:",
    "add more memories",
    "status photo stickers",
    "tap the sticker button",
    "when creating a status",
    "you never need to choose",
    "share all your favorite photos",
    "whatsapp update",
    "new feature",
    "try the new",
    "check out our",
];

/// Encryption boilerplate that shows up regardless of sender id.
const BOILERPLATE: &[&str] = &[
    "end-to-end encryption",
    "always committed to protecting",
    "share all your favorite photos to your status",
    "select photo when creating a status",
];

/// Guard rails for peer resolution.
///
/// The defaults mirror reliability limits observed in real extraction
/// exports, where a name column occasionally carries a garbled blob or a
/// raw 20+ digit identifier. They are tunable because they are heuristics,
/// not contracts.
#[derive(Debug, Clone)]
pub struct ResolverPolicy {
    /// Longest identifier accepted as a peer id or a stand-in name.
    pub max_id_len: usize,

    /// All-digit names longer than this are treated as unreliable.
    pub max_digit_name_len: usize,

    /// A primary peer name must be longer than this (exclusive).
    pub min_primary_name_len: usize,

    /// Owner-name tokens shorter than this never count as overlap.
    pub min_owner_token_len: usize,

    /// Drop platform service announcements before resolution.
    pub skip_system_messages: bool,
}

impl Default for ResolverPolicy {
    fn default() -> Self {
        Self {
            max_id_len: 50,
            max_digit_name_len: 20,
            min_primary_name_len: 3,
            min_owner_token_len: 2,
            skip_system_messages: true,
        }
    }
}

impl ResolverPolicy {
    /// A name column is usable unless it is empty, longer than
    /// `max_id_len`, or an all-digit run longer than `max_digit_name_len`.
    /// Short numeric names stay usable; a bare phone number is how many
    /// exports spell an unsaved contact.
    pub(crate) fn usable_name(&self, name: &str) -> bool {
        if name.is_empty() {
            return false;
        }
        let len = name.chars().count();
        if len > self.max_id_len {
            return false;
        }
        let all_digits = name.chars().all(|c| c.is_ascii_digit());
        !(all_digits && len > self.max_digit_name_len)
    }

    pub(crate) fn usable_id(&self, id: &str) -> bool {
        !id.is_empty() && id.chars().count() <= self.max_id_len
    }

    /// Good enough to represent a merged thread: carries letters and is
    /// longer than `min_primary_name_len`.
    pub(crate) fn good_primary_name(&self, name: &str) -> bool {
        name.chars().any(|c| c.is_alphabetic()) && name.chars().count() > self.min_primary_name_len
    }

    /// Fuzzy owner comparison: exact, substring either direction, or a
    /// shared word token.
    pub(crate) fn matches_owner(&self, candidate: &str, owner: &str) -> bool {
        if candidate.is_empty() || owner.is_empty() {
            return false;
        }
        let candidate = candidate.to_lowercase();
        let owner = owner.to_lowercase();
        if candidate == owner || candidate.contains(&owner) || owner.contains(&candidate) {
            return true;
        }
        let owner_tokens: HashSet<&str> = owner
            .unicode_words()
            .filter(|w| w.chars().count() >= self.min_owner_token_len)
            .collect();
        candidate
            .unicode_words()
            .filter(|w| w.chars().count() >= self.min_owner_token_len)
            .any(|w| owner_tokens.contains(w))
    }

    /// Pick a person `(name, id)` out of one side of a message, applying
    /// the name-reliability guards. An id alone is acceptable; it then
    /// doubles as the display name.
    pub(crate) fn person_from(&self, side: &Side) -> Option<(String, String)> {
        if self.usable_name(&side.name) {
            let id = if self.usable_id(&side.id) {
                side.id.clone()
            } else {
                String::new()
            };
            return Some((side.name.clone(), id));
        }
        if self.usable_id(&side.id) {
            return Some((side.id.clone(), side.id.clone()));
        }
        None
    }

    /// WhatsApp exports interleave service announcements with real
    /// traffic: messages from sender id `0`, starred promotional blurbs,
    /// and encryption boilerplate.
    pub(crate) fn is_system_message(&self, msg: &MessageRow) -> bool {
        let text = msg.text.trim();
        if text.is_empty() {
            return false;
        }
        let lower = text.to_lowercase();
        let sender = strip_handle_suffix(&clean_identifier(&msg.sender_id));
        if sender == "0"
            && (text.starts_with('*') || SERVICE_HINTS.iter().any(|k| lower.contains(k)))
        {
            return true;
        }
        if text.starts_with('*') && PROMO_HINTS.iter().any(|k| lower.contains(k)) {
            return true;
        }
        BOILERPLATE.iter().any(|k| lower.contains(k))
    }
}

/// One side of a message (sender or recipient) after cleaning.
#[derive(Debug, Clone)]
pub(crate) struct Side {
    pub(crate) name: String,
    pub(crate) id: String,
}

/// Clean one side's name/id columns. A number embedded in the name cell
/// (`"6281234567890 Budi"`) backfills an empty id column.
pub(crate) fn side_of(name_raw: &str, id_raw: &str) -> Side {
    let (embedded, name) = split_number_name(name_raw);
    let mut id = strip_handle_suffix(&clean_identifier(id_raw));
    if id.is_empty() {
        if let Some(number) = embedded {
            id = number;
        }
    }
    Side { name, id }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn policy() -> ResolverPolicy {
        ResolverPolicy::default()
    }

    #[test]
    fn short_numeric_names_are_usable() {
        assert!(policy().usable_name("081234567890"));
        assert!(policy().usable_name("Budi"));
    }

    #[test]
    fn long_digit_runs_are_not_names() {
        let digits = "0".repeat(21);
        assert!(!policy().usable_name(&digits));
        assert!(policy().usable_id(&digits));
    }

    #[test]
    fn oversized_values_are_rejected_everywhere() {
        let blob = "x".repeat(51);
        assert!(!policy().usable_name(&blob));
        assert!(!policy().usable_id(&blob));
    }

    #[test]
    fn owner_matching_covers_exact_substring_and_tokens() {
        let p = policy();
        assert!(p.matches_owner("budi santoso", "Budi Santoso"));
        assert!(p.matches_owner("Budi", "Budi Santoso"));
        assert!(p.matches_owner("Pak Santoso", "Budi Santoso"));
        assert!(!p.matches_owner("Sari Dewi", "Budi Santoso"));
        assert!(!p.matches_owner("", "Budi Santoso"));
    }

    #[test]
    fn single_letter_tokens_do_not_overlap() {
        assert!(!policy().matches_owner("A Rahman", "B A Santoso"));
    }

    #[test]
    fn person_from_prefers_name_then_id() {
        let p = policy();
        let both = Side { name: "Alice".into(), id: "628111".into() };
        assert_eq!(p.person_from(&both), Some(("Alice".into(), "628111".into())));

        let id_only = Side { name: String::new(), id: "628111".into() };
        assert_eq!(p.person_from(&id_only), Some(("628111".into(), "628111".into())));

        let nothing = Side { name: String::new(), id: String::new() };
        assert_eq!(p.person_from(&nothing), None);
    }

    #[test]
    fn side_backfills_id_from_name_cell() {
        let side = side_of("6281234567890 Budi Santoso", "");
        assert_eq!(side.name, "Budi Santoso");
        assert_eq!(side.id, "6281234567890");

        let side = side_of("Budi Santoso", "628123@s.whatsapp.net");
        assert_eq!(side.name, "Budi Santoso");
        assert_eq!(side.id, "628123");
    }

    #[test]
    fn service_announcements_are_flagged() {
        let msg = MessageRow {
            sender_id: "0@s.whatsapp.net".into(),
            text: "Your personal messages are protected with end-to-end encryption".into(),
            ..MessageRow::default()
        };
        assert!(policy().is_system_message(&msg));

        let promo = MessageRow {
            text: "*WhatsApp update: try the new stickers*".into(),
            ..MessageRow::default()
        };
        assert!(policy().is_system_message(&promo));

        let real = MessageRow {
            sender_id: "628111@s.whatsapp.net".into(),
            text: "see you at 7".into(),
            ..MessageRow::default()
        };
        assert!(!policy().is_system_message(&real));
    }
}
