//! Phone number normalization for SMS delivery and inbound matching.
//!
//! Outbound messages always target E.164 (`+15551234567`). Patient records
//! store phone numbers in whatever shape they were typed, so inbound
//! matching compares against several renderings of the same number.

/// Normalize a user-entered phone number to E.164.
///
/// - 10 digits are treated as a North American number (`+1` prefix).
/// - 11 digits starting with `1` get a `+` prefix.
/// - Any other 11-15 digit string is treated as already international.
///
/// Returns `None` for anything else.
pub fn normalize_e164(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    match digits.len() {
        10 => Some(format!("+1{digits}")),
        11..=15 => Some(format!("+{digits}")),
        _ => None,
    }
}

/// National (10-digit) form of a North American number, or all digits
/// for anything else.
pub fn national_digits(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() == 11 && digits.starts_with('1') {
        digits[1..].to_string()
    } else {
        digits
    }
}

/// Every stored rendering a patient phone column may hold for an inbound
/// sender number, most specific first, without duplicates.
pub fn match_candidates(raw: &str) -> Vec<String> {
    let national = national_digits(raw);
    let mut candidates = vec![
        national.clone(),
        format!("+1{national}"),
        format!("1{national}"),
        raw.trim().to_string(),
    ];
    if national.len() == 10 {
        candidates.push(format!(
            "({}) {}-{}",
            &national[..3],
            &national[3..6],
            &national[6..]
        ));
        candidates.push(format!(
            "{}-{}-{}",
            &national[..3],
            &national[3..6],
            &national[6..]
        ));
    }
    let mut seen = Vec::with_capacity(candidates.len());
    for c in candidates {
        if !c.is_empty() && !seen.contains(&c) {
            seen.push(c);
        }
    }
    seen
}

/// Mask all but the last four digits for log output.
pub fn mask(raw: &str) -> String {
    let digits: Vec<char> = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = digits[digits.len() - 4..].iter().collect();
    format!("***{tail}")
}
