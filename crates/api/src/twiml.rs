//! TwiML responses for the messaging webhooks.
//!
//! Webhooks always answer 200 with `application/xml`; the body is either an
//! empty `<Response/>` or a single `<Message>`.

use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Escape text for inclusion in an XML element body or attribute.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// A TwiML document ready to be returned from a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Twiml(String);

impl Twiml {
    /// `<Response></Response>`: acknowledge without replying.
    pub fn empty() -> Self {
        Self(format!("{XML_DECLARATION}<Response></Response>"))
    }

    /// Reply to the sender with one message.
    pub fn message(text: &str) -> Self {
        Self(format!(
            "{XML_DECLARATION}<Response><Message>{}</Message></Response>",
            escape_xml(text)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl IntoResponse for Twiml {
    fn into_response(self) -> Response {
        (StatusCode::OK, [(CONTENT_TYPE, "application/xml")], self.0).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(
            escape_xml(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &apos;Jerry&apos;&lt;/b&gt;"
        );
    }

    #[test]
    fn message_wraps_escaped_text() {
        let doc = Twiml::message("Thanks, Ann & Bo!");
        assert!(doc
            .as_str()
            .ends_with("<Response><Message>Thanks, Ann &amp; Bo!</Message></Response>"));
    }

    #[test]
    fn empty_response_has_no_message() {
        let doc = Twiml::empty();
        assert!(doc.as_str().ends_with("<Response></Response>"));
        assert!(!doc.as_str().contains("<Message>"));
    }

    #[test]
    fn responses_are_xml() {
        let response = Twiml::empty().into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/xml"
        );
    }
}
