//! Delivery-confirmation rules shared by the web-link, SMS-reply and MMS paths.

use chrono::Duration;

use crate::tokens::random_hex;
use crate::types::Timestamp;

/// Replies containing any of these (case-insensitive, substring) confirm a delivery.
pub const CONFIRMATION_KEYWORDS: [&str; 7] = [
    "yes",
    "delivered",
    "confirm",
    "confirmed",
    "received",
    "got it",
    "got them",
];

/// An SMS confirmation request can be answered for this many days after sending.
pub const CONFIRMATION_WINDOW_DAYS: i64 = 7;

/// Random bytes in a confirmation token (rendered as 64 hex characters).
pub const CONFIRMATION_TOKEN_BYTES: usize = 32;

pub const METHOD_WEB_LINK: &str = "web_link";
pub const METHOD_SMS_REPLY: &str = "sms_reply";

/// Whether an inbound message body confirms receipt.
pub fn matches_confirmation_keyword(body: &str) -> bool {
    let lowered = body.trim().to_lowercase();
    !lowered.is_empty() && CONFIRMATION_KEYWORDS.iter().any(|k| lowered.contains(k))
}

/// Whether an SMS sent at `sms_sent_at` is still inside the answer window.
pub fn within_confirmation_window(sms_sent_at: Timestamp, now: Timestamp) -> bool {
    now - sms_sent_at < Duration::days(CONFIRMATION_WINDOW_DAYS)
}

/// New opaque confirmation token.
pub fn generate_confirmation_token() -> String {
    random_hex(CONFIRMATION_TOKEN_BYTES)
}

/// Link included in the delivery-confirmation SMS.
pub fn sms_confirmation_url(public_base_url: &str, token: &str) -> String {
    format!(
        "{}/confirm-delivery?token={token}",
        public_base_url.trim_end_matches('/')
    )
}

/// Link included in the delivery-confirmation email.
pub fn email_confirmation_url(public_base_url: &str, token: &str) -> String {
    format!(
        "{}/patient/confirm-delivery?token={token}",
        public_base_url.trim_end_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn keywords_match_case_insensitively_inside_sentences() {
        assert!(matches_confirmation_keyword("YES"));
        assert!(matches_confirmation_keyword("Yep, got them today, thanks"));
        assert!(matches_confirmation_keyword("It was Delivered"));
        assert!(matches_confirmation_keyword("received!"));
    }

    #[test]
    fn unrelated_replies_do_not_match() {
        assert!(!matches_confirmation_keyword("no"));
        assert!(!matches_confirmation_keyword("not here yet"));
        assert!(!matches_confirmation_keyword("   "));
    }

    #[test]
    fn window_is_seven_days() {
        let now = Utc::now();
        assert!(within_confirmation_window(now - Duration::days(6), now));
        assert!(!within_confirmation_window(now - Duration::days(7), now));
        assert!(!within_confirmation_window(now - Duration::days(30), now));
    }

    #[test]
    fn urls_strip_trailing_slash() {
        assert_eq!(
            sms_confirmation_url("https://example.test/", "abc"),
            "https://example.test/confirm-delivery?token=abc"
        );
        assert_eq!(
            email_confirmation_url("https://example.test", "abc"),
            "https://example.test/patient/confirm-delivery?token=abc"
        );
    }

    #[test]
    fn tokens_are_64_hex_chars() {
        assert_eq!(generate_confirmation_token().len(), 64);
    }
}
