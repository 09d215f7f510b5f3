//! Shipping carrier detection and tracking links.

use std::sync::LazyLock;

use regex::Regex;

use crate::order_status::OrderStatus;

static UPS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^1Z[0-9A-Z]{16}$").expect("valid regex"));
static USPS_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^9[2-5]\d{18,20}$").expect("valid regex"));
static FEDEX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{12}|\d{15}|\d{20}|\d{22})$").expect("valid regex"));
static USPS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{20,22}$").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Carrier {
    Ups,
    Fedex,
    Usps,
}

impl Carrier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ups => "ups",
            Self::Fedex => "fedex",
            Self::Usps => "usps",
        }
    }

    pub fn from_str_db(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ups" => Some(Self::Ups),
            "fedex" => Some(Self::Fedex),
            "usps" => Some(Self::Usps),
            _ => None,
        }
    }
}

/// Strip whitespace and uppercase a tracking number.
pub fn clean_tracking(tracking: &str) -> String {
    tracking
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase()
}

/// Guess the carrier from the shape of a tracking number.
pub fn detect(tracking: &str) -> Option<Carrier> {
    let t = clean_tracking(tracking);
    if UPS_RE.is_match(&t) {
        Some(Carrier::Ups)
    } else if USPS_PREFIX_RE.is_match(&t) {
        Some(Carrier::Usps)
    } else if FEDEX_RE.is_match(&t) {
        Some(Carrier::Fedex)
    } else if USPS_RE.is_match(&t) {
        Some(Carrier::Usps)
    } else {
        None
    }
}

fn encode_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for b in value.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

/// Public tracking page for a shipment; falls back to a web search.
pub fn tracking_url(tracking: &str, carrier: Option<Carrier>) -> String {
    let tracking = tracking.trim();
    let encoded = encode_component(tracking);
    match carrier.or_else(|| detect(tracking)) {
        Some(Carrier::Ups) => format!("https://www.ups.com/track?loc=en_US&tracknum={encoded}"),
        Some(Carrier::Fedex) => format!("https://www.fedex.com/fedextrack/?trknbr={encoded}"),
        Some(Carrier::Usps) => {
            format!("https://tools.usps.com/go/TrackConfirmAction?qtc_tLabels1={encoded}")
        }
        None => format!(
            "https://www.google.com/search?q={}",
            encode_component(&format!("{tracking} tracking"))
        ),
    }
}

/// Order status implied by a carrier event, if any.
pub fn order_status_for_event(carrier_status: &str) -> Option<OrderStatus> {
    match carrier_status.trim().to_ascii_lowercase().as_str() {
        "delivered" => Some(OrderStatus::Delivered),
        "in_transit" | "out_for_delivery" => Some(OrderStatus::Shipped),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_ups() {
        assert_eq!(detect("1Z999AA10123456784"), Some(Carrier::Ups));
        assert_eq!(detect("1z 999aa1 0123456784"), Some(Carrier::Ups));
    }

    #[test]
    fn detects_fedex_lengths() {
        assert_eq!(detect("123456789012"), Some(Carrier::Fedex));
        assert_eq!(detect("123456789012345"), Some(Carrier::Fedex));
        assert_eq!(detect("12345678901234567890"), Some(Carrier::Fedex));
    }

    #[test]
    fn detects_usps() {
        assert_eq!(detect("9400111899223856929423"), Some(Carrier::Usps));
        assert_eq!(detect("92001901755477000000000"), None);
        assert_eq!(detect("123456789012345678901"), Some(Carrier::Usps));
    }

    #[test]
    fn unknown_formats() {
        assert_eq!(detect("ABC123"), None);
        assert_eq!(detect(""), None);
    }

    #[test]
    fn tracking_urls() {
        assert_eq!(
            tracking_url("1Z999AA10123456784", None),
            "https://www.ups.com/track?loc=en_US&tracknum=1Z999AA10123456784"
        );
        assert_eq!(
            tracking_url("ABC 1", None),
            "https://www.google.com/search?q=ABC%201%20tracking"
        );
        assert!(tracking_url("123", Some(Carrier::Usps)).starts_with("https://tools.usps.com/"));
    }

    #[test]
    fn carrier_events_map_to_order_statuses() {
        assert_eq!(order_status_for_event("delivered"), Some(OrderStatus::Delivered));
        assert_eq!(order_status_for_event("OUT_FOR_DELIVERY"), Some(OrderStatus::Shipped));
        assert_eq!(order_status_for_event("in_transit"), Some(OrderStatus::Shipped));
        assert_eq!(order_status_for_event("label_created"), None);
        assert_eq!(order_status_for_event("exception"), None);
    }

    #[test]
    fn carrier_names_parse() {
        assert_eq!(Carrier::from_str_db("UPS"), Some(Carrier::Ups));
        assert_eq!(Carrier::from_str_db("dhl"), None);
    }
}
