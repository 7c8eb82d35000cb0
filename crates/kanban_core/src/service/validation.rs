//! Input rules shared by the auth and contact services.

use once_cell::sync::Lazy;
use regex::Regex;

pub const MIN_NAME_CHARS: usize = 2;
pub const MIN_PASSWORD_CHARS: usize = 6;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// At least two characters once trimmed.
pub fn is_valid_name(name: &str) -> bool {
    name.trim().chars().count() >= MIN_NAME_CHARS
}

pub fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_CHARS
}

/// Non-blank phone number.
pub fn is_valid_phone(phone: &str) -> bool {
    !phone.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::{is_valid_email, is_valid_name, is_valid_password, is_valid_phone};

    #[test]
    fn email_needs_local_part_domain_and_dot() {
        assert!(is_valid_email("anton@demo.com"));
        assert!(is_valid_email("  anja.schulz@mail.example.org "));
        assert!(!is_valid_email("anton@demo"));
        assert!(!is_valid_email("anton demo@x.com"));
        assert!(!is_valid_email("@demo.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn names_and_passwords_have_minimum_lengths() {
        assert!(is_valid_name("Al"));
        assert!(!is_valid_name(" A "));
        assert!(is_valid_password("demo12"));
        assert!(!is_valid_password("demo1"));
        assert!(!is_valid_phone("   "));
    }
}
