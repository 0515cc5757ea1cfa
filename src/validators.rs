//! Format checks for applicant-supplied identifiers.
//!
//! Each predicate is an anchored regex match on the raw string. No trimming
//! or normalization happens here; callers decide what to strip first.

use std::sync::LazyLock;

use regex::Regex;

// `\d` would accept non-ASCII digits, so every class is spelled out.
static MOBILE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[6-9][0-9]{9}$").unwrap());
static TAX_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{5}[0-9]{4}[A-Z]$").unwrap());
static NATIONAL_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[2-9][0-9]{11}$").unwrap());

/// 10 digits, first digit 6-9.
pub fn is_valid_mobile(input: &str) -> bool {
    MOBILE.is_match(input)
}

/// 5 uppercase letters, 4 digits, 1 uppercase letter (PAN layout).
pub fn is_valid_tax_id(input: &str) -> bool {
    TAX_ID.is_match(input)
}

/// 12 digits, first digit 2-9 (Aadhaar layout).
pub fn is_valid_national_id(input: &str) -> bool {
    NATIONAL_ID.is_match(input)
}

/// Drop everything except ASCII digits and parse what is left.
///
/// Returns `None` when no digits remain or the number does not fit in a `u64`.
/// `"₹50,000 per month"` parses as `50000`.
pub fn extract_digits(input: &str) -> Option<u64> {
    let digits: String = input.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Mask a mobile number for logging, keeping the last four digits.
pub fn mask_mobile(mobile: &str) -> String {
    let visible: String = mobile
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("******{visible}")
}
