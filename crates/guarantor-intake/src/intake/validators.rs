//! Stateless format checks shared by live validity and per-field feedback.

use std::sync::LazyLock;

use regex::Regex;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

const SSN_DIGITS: usize = 9;
const MIN_PHONE_DIGITS: usize = 10;

/// Keep only the ASCII digits of `raw`, in order.
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

pub fn is_valid_email(raw: &str) -> bool {
    EMAIL_RE.is_match(raw.trim())
}

/// Dash placement is irrelevant; exactly nine digits must remain.
pub fn is_valid_ssn(raw: &str) -> bool {
    digits_only(raw).len() == SSN_DIGITS
}

/// Phone is optional, so blank input passes.
pub fn is_valid_phone(raw: &str) -> bool {
    if raw.trim().is_empty() {
        return true;
    }
    digits_only(raw).len() >= MIN_PHONE_DIGITS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ssn_ignores_dashes() {
        assert!(is_valid_ssn("123-45-6789"));
        assert!(is_valid_ssn("123456789"));
        assert!(is_valid_ssn(" 123 45 6789 "));
        assert!(!is_valid_ssn("12345678"));
        assert!(!is_valid_ssn("1234567890"));
    }

    #[test]
    fn phone_is_optional_but_needs_ten_digits() {
        assert!(is_valid_phone(""));
        assert!(is_valid_phone("   "));
        assert!(!is_valid_phone("555-1234"));
        assert!(is_valid_phone("555-123-4567"));
        assert!(is_valid_phone("+1 (555) 123-4567"));
    }

    #[test]
    fn email_requires_local_part_and_dotted_domain() {
        assert!(is_valid_email("ada@example.com"));
        assert!(is_valid_email("ada.lovelace+pg@mail.example.co"));
        assert!(!is_valid_email("ada@example"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ada lovelace@example.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn digits_only_drops_everything_else() {
        assert_eq!(digits_only("50309-1234"), "503091234");
        assert_eq!(digits_only("abc"), "");
    }
}
