//! Order lifecycle statuses and review-queue markers.
//!
//! Values must match the `chk_orders_status` constraint on `orders.status`.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Order status
// ---------------------------------------------------------------------------

/// Every status an order can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Draft,
    Submitted,
    UnderReview,
    Incomplete,
    VerificationPending,
    CashPriceRequired,
    CashPriceApproved,
    Approved,
    InProduction,
    Shipped,
    Delivered,
    Terminated,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 13] = [
        Self::Draft,
        Self::Submitted,
        Self::UnderReview,
        Self::Incomplete,
        Self::VerificationPending,
        Self::CashPriceRequired,
        Self::CashPriceApproved,
        Self::Approved,
        Self::InProduction,
        Self::Shipped,
        Self::Delivered,
        Self::Terminated,
        Self::Cancelled,
    ];

    /// Parse a status string from a request body or the database.
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Invalid status '{s}'")))
    }

    /// Convert to a database-compatible string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::UnderReview => "under_review",
            Self::Incomplete => "incomplete",
            Self::VerificationPending => "verification_pending",
            Self::CashPriceRequired => "cash_price_required",
            Self::CashPriceApproved => "cash_price_approved",
            Self::Approved => "approved",
            Self::InProduction => "in_production",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Terminated => "terminated",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Review queue
// ---------------------------------------------------------------------------

/// `orders.review_status` values that place an order in the admin queue.
pub const REVIEW_PENDING_ADMIN: &str = "pending_admin_review";
pub const REVIEW_UNDER_REVIEW: &str = "under_review";

/// Alert metadata attached when an admin asks for a cash price.
pub const ALERT_CASH_PRICE_REQUIRED: &str = "cash_price_required";
pub const SEVERITY_CRITICAL: &str = "critical";

/// Message shown to the physician when a cash price is requested.
pub fn cash_price_alert_message(cash_price: f64) -> String {
    format!(
        "Insurance verification requires a cash price of ${cash_price:.2}. \
         Please review and approve to continue processing this order."
    )
}

/// Exclusive upper bound for `orders.cash_price` (`NUMERIC(10,2)`).
pub const MAX_CASH_PRICE: f64 = 100_000_000.0;

/// Check a cash price before it is stored: positive, finite and small enough
/// for `NUMERIC(10,2)` once rounded to cents.
pub fn validate_cash_price(price: f64) -> Result<f64, CoreError> {
    let cents = (price * 100.0).round() / 100.0;
    if !price.is_finite() || cents <= 0.0 || cents >= MAX_CASH_PRICE {
        return Err(CoreError::Validation(
            "cash_price must be greater than 0 and less than 100000000".into(),
        ));
    }
    Ok(price)
}
