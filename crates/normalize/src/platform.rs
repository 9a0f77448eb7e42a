/// Fold the many raw platform spellings seen in exports onto one
/// display form per service.
///
/// `twitter` and `x (twitter)` both fold to `X`; spellings not in the
/// table pass through trimmed so an unrecognized platform still groups
/// with itself.
#[must_use]
pub fn canonical_platform(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.to_lowercase().as_str() {
        "whatsapp" => "WhatsApp".to_string(),
        "telegram" => "Telegram".to_string(),
        "instagram" => "Instagram".to_string(),
        "facebook" => "Facebook".to_string(),
        "tiktok" => "TikTok".to_string(),
        "x" | "twitter" | "x (twitter)" => "X".to_string(),
        _ => trimmed.to_string(),
    }
}

/// Case-insensitive platform equality over canonical forms.
#[must_use]
pub fn same_platform(a: &str, b: &str) -> bool {
    canonical_platform(a).eq_ignore_ascii_case(&canonical_platform(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn known_spellings_fold_to_display_form() {
        assert_eq!(canonical_platform("whatsapp"), "WhatsApp");
        assert_eq!(canonical_platform(" WHATSAPP "), "WhatsApp");
        assert_eq!(canonical_platform("twitter"), "X");
        assert_eq!(canonical_platform("X (Twitter)"), "X");
        assert_eq!(canonical_platform("tiktok"), "TikTok");
    }

    #[test]
    fn unknown_spellings_pass_through_trimmed() {
        assert_eq!(canonical_platform("  Signal "), "Signal");
        assert_eq!(canonical_platform(""), "");
    }

    #[test]
    fn aliases_compare_equal() {
        assert!(same_platform("twitter", "X"));
        assert!(same_platform("WhatsApp", "whatsapp"));
        assert!(!same_platform("Telegram", "WhatsApp"));
    }
}
