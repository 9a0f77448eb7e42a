use once_cell::sync::Lazy;
use regex::Regex;

/// Messaging-service host suffix glued onto an identifier, e.g.
/// `@s.whatsapp.net` or `@g.us`.
static HANDLE_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@[\w.\-]+").expect("handle suffix pattern"));

/// Placeholder spellings that mean "no value" in extraction exports.
const NA_LITERALS: &[&str] = &["", "nan", "none", "null", "-", "n/a"];

/// Zero-width and directional format characters that exports smuggle
/// into names and ids.
fn is_format_char(c: char) -> bool {
    matches!(c, '\u{200B}'..='\u{200F}' | '\u{202A}'..='\u{202E}' | '\u{FEFF}')
}

/// Drop zero-width and directional marks, turn control characters and
/// non-breaking spaces into ordinary spaces, and collapse whitespace
/// runs to one space. Placeholder spellings survive; message text that
/// happens to read `none` is still text.
#[must_use]
pub fn scrub_marks(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;
    for c in raw.chars() {
        if is_format_char(c) {
            continue;
        }
        if c.is_whitespace() || c.is_control() {
            pending_space = true;
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        out.push(c);
    }
    out
}

/// Canonicalize a free-text identifier or display name.
///
/// On top of [`scrub_marks`], placeholder spellings (`nan`, `none`,
/// `null`, `-`, `n/a`, case-insensitive) map to the empty string.
/// Total: any input yields a string, never an error.
#[must_use]
pub fn clean_identifier(raw: &str) -> String {
    let out = scrub_marks(raw);
    if NA_LITERALS.contains(&out.to_lowercase().as_str()) {
        return String::new();
    }
    out
}

/// Decide whether a string should be treated as a phone or account id
/// rather than a display name.
///
/// True when the text is all digits, or when it is at least five
/// characters long (spaces removed) with digits in the majority.
#[must_use]
pub fn looks_like_id(text: &str) -> bool {
    let compact: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return false;
    }
    let digits = compact.iter().filter(|c| c.is_ascii_digit()).count();
    if digits == compact.len() {
        return true;
    }
    compact.len() >= 5 && digits * 2 > compact.len()
}

/// Remove messaging-service host suffixes from an identifier.
///
/// `6281234567890@s.whatsapp.net` becomes `6281234567890`; text without
/// an `@host` part passes through trimmed.
#[must_use]
pub fn strip_handle_suffix(raw: &str) -> String {
    HANDLE_SUFFIX.replace_all(raw.trim(), "").trim().to_string()
}

/// Split a combined `"<number> <name>"` field into its parts.
///
/// Exports often pack a phone number and a display name into one cell.
/// When the first space-delimited token is a number of at least five
/// digits (optionally `+`-prefixed or carrying a handle suffix), it is
/// returned separately from the remaining name. Otherwise the whole
/// cleaned value is treated as the name.
#[must_use]
pub fn split_number_name(raw: &str) -> (Option<String>, String) {
    let cleaned = clean_identifier(&strip_handle_suffix(raw));
    if cleaned.is_empty() {
        return (None, String::new());
    }
    if let Some((head, tail)) = cleaned.split_once(' ') {
        let head = strip_handle_suffix(head);
        let digits = head.strip_prefix('+').unwrap_or(&head);
        if digits.len() >= 5 && digits.chars().all(|c| c.is_ascii_digit()) {
            return (Some(digits.to_string()), tail.trim().to_string());
        }
    }
    (None, cleaned)
}
