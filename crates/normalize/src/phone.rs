use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Phone-like substring: an optional `+`, then digits with common
/// separators in between. Digit count is validated after the match.
static PHONE_CANDIDATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\+?\d[\d\s().-]{5,18}\d").expect("phone candidate pattern"));

const MIN_PHONE_DIGITS: usize = 7;
const MAX_PHONE_DIGITS: usize = 15;

/// Country-code normalization rule for phone numbers.
///
/// Extraction exports mix local (`0812...`), international (`+62812...`)
/// and bare (`812...`) forms of the same number; correlation needs them
/// to collapse to one key. The rule is configurable because the leading
/// `0` replacement is a regional convention, not a universal law.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneRule {
    /// Country calling code digits, e.g. `"62"`.
    pub country_code: String,
}

impl Default for PhoneRule {
    fn default() -> Self {
        Self::indonesia()
    }
}

impl PhoneRule {
    #[must_use]
    pub fn new(country_code: impl Into<String>) -> Self {
        Self {
            country_code: country_code.into(),
        }
    }

    /// Indonesian numbering plan (`0812...` -> `62812...`).
    #[must_use]
    pub fn indonesia() -> Self {
        Self::new("62")
    }

    /// Canonicalize a raw phone value to digits with the country code
    /// prefixed.
    ///
    /// Everything except digits is stripped (including `+`); a leading
    /// `0` is replaced by the country code; a number that does not
    /// already start with the country code gets it prepended. Idempotent;
    /// input without any digit yields an empty string.
    #[must_use]
    pub fn normalize(&self, raw: &str) -> String {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        if digits.is_empty() {
            return String::new();
        }
        if let Some(rest) = digits.strip_prefix('0') {
            return format!("{}{rest}", self.country_code);
        }
        if digits.starts_with(&self.country_code) {
            return digits;
        }
        format!("{}{digits}", self.country_code)
    }
}

/// Scan free text for phone-like substrings.
///
/// Returns the digit-only form of every plausible number (7 to 15
/// digits), de-duplicated, in order of first appearance. Contact exports
/// routinely pack several numbers into one cell.
#[must_use]
pub fn extract_phone_candidates(raw: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for m in PHONE_CANDIDATE.find_iter(raw) {
        let digits: String = m.as_str().chars().filter(char::is_ascii_digit).collect();
        if digits.len() < MIN_PHONE_DIGITS || digits.len() > MAX_PHONE_DIGITS {
            continue;
        }
        if !seen.contains(&digits) {
            seen.push(digits);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn local_prefix_is_replaced() {
        let rule = PhoneRule::default();
        assert_eq!(rule.normalize("0812-3456-7890"), "6281234567890");
    }

    #[test]
    fn international_form_collapses_to_same_key() {
        let rule = PhoneRule::default();
        assert_eq!(rule.normalize("+62 812-3456-7890"), "6281234567890");
        assert_eq!(
            rule.normalize("+62 812-3456-7890"),
            rule.normalize("0812 3456 7890")
        );
    }

    #[test]
    fn bare_number_gets_country_code() {
        let rule = PhoneRule::default();
        assert_eq!(rule.normalize("81234567890"), "6281234567890");
    }

    #[test]
    fn digit_free_input_yields_empty() {
        let rule = PhoneRule::default();
        assert_eq!(rule.normalize("no number here"), "");
        assert_eq!(rule.normalize(""), "");
    }

    #[test]
    fn custom_country_code() {
        let rule = PhoneRule::new("44");
        assert_eq!(rule.normalize("07911 123456"), "447911123456");
    }

    #[test]
    fn candidates_found_in_free_text() {
        let text = "Mobile: +62 812-3456-7890\nWork: 021 555 0199 ext 12";
        let found = extract_phone_candidates(text);
        assert_eq!(found, vec!["6281234567890", "0215550199"]);
    }

    #[test]
    fn candidates_are_deduplicated_in_order() {
        let text = "0812-3456-7890 or 081234567890";
        assert_eq!(extract_phone_candidates(text), vec!["081234567890"]);
    }

    #[test]
    fn short_codes_are_rejected() {
        assert_eq!(extract_phone_candidates("dial 112 or 14045"), Vec::<String>::new());
    }

    proptest! {
        #[test]
        fn proptest_normalize_idempotent(raw in "\\PC{0,40}") {
            let rule = PhoneRule::default();
            let once = rule.normalize(&raw);
            prop_assert_eq!(rule.normalize(&once), once);
        }

        #[test]
        fn proptest_normalize_yields_digits_only(raw in "\\PC{0,40}") {
            let rule = PhoneRule::default();
            let out = rule.normalize(&raw);
            prop_assert!(out.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
