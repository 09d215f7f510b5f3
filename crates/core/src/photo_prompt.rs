//! Scheduling rules for automated wound-photo prompts.
//!
//! When an order is delivered a schedule is created from the order's
//! frequency and the product's kit length; a daily sweep sends a prompt
//! whenever `next_prompt_date` is due.

use std::sync::LazyLock;

use chrono::{Days, NaiveDate};
use regex::Regex;

/// Days between delivery and the first prompt.
pub const FIRST_PROMPT_DELAY_DAYS: u64 = 2;

/// Kit length assumed when the product name carries none.
pub const DEFAULT_KIT_DAYS: u64 = 30;

/// Longest kit length taken from a product name; anything longer is a typo
/// or not a duration at all, and the default applies.
pub const MAX_KIT_DAYS: u64 = 365;

/// Extra monitoring days after the kit runs out.
pub const END_DATE_BUFFER_DAYS: u64 = 3;

/// Interval used when the frequency cannot be parsed.
pub const DEFAULT_FREQUENCY_DAYS: i32 = 7;

static DAILY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"daily|every\s*day|1\s*per\s*day").expect("valid regex"));
static PER_WEEK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*x?\s*(?:per|/)\s*week").expect("valid regex"));
static BIWEEKLY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"bi-?weekly|every\s*2\s*weeks").expect("valid regex"));
static WEEKLY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"weekly|once\s*a\s*week").expect("valid regex"));
static MONTHLY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"monthly|once\s*a\s*month").expect("valid regex"));
static KIT_DAYS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)[-\s]?day").expect("valid regex"));

/// Convert an order frequency ("3x per week", "Daily", ...) into days between prompts.
pub fn frequency_to_days(frequency: Option<&str>) -> i32 {
    let Some(freq) = frequency.map(|f| f.trim().to_lowercase()).filter(|f| !f.is_empty()) else {
        return DEFAULT_FREQUENCY_DAYS;
    };

    if DAILY_RE.is_match(&freq) {
        return 1;
    }
    if let Some(caps) = PER_WEEK_RE.captures(&freq) {
        let times: u32 = caps[1].parse().unwrap_or(1);
        return match times {
            7.. => 1,
            3..=6 => 2,
            2 => 3,
            _ => 7,
        };
    }
    // Checked before WEEKLY_RE, which would also match "biweekly".
    if BIWEEKLY_RE.is_match(&freq) {
        return 14;
    }
    if WEEKLY_RE.is_match(&freq) {
        return 7;
    }
    if MONTHLY_RE.is_match(&freq) {
        return 30;
    }
    DEFAULT_FREQUENCY_DAYS
}

/// Kit length in days parsed from a product name ("15-Day Alginate Kit").
pub fn kit_days(product_name: &str) -> u64 {
    KIT_DAYS_RE
        .captures(product_name)
        .and_then(|caps| caps[1].parse::<u64>().ok())
        .filter(|days| (1..=MAX_KIT_DAYS).contains(days))
        .unwrap_or(DEFAULT_KIT_DAYS)
}

/// `date + days`, clamped to the last representable date.
fn add_days(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX)
}

/// Computed dates for a new schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptPlan {
    pub frequency_days: i32,
    pub start_date: NaiveDate,
    pub next_prompt_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Plan prompts for an order delivered on `delivered_on`.
pub fn plan(frequency: Option<&str>, product_name: &str, delivered_on: NaiveDate) -> PromptPlan {
    let end_offset = kit_days(product_name) + END_DATE_BUFFER_DAYS;
    PromptPlan {
        frequency_days: frequency_to_days(frequency),
        start_date: delivered_on,
        next_prompt_date: add_days(delivered_on, FIRST_PROMPT_DELAY_DAYS),
        end_date: add_days(delivered_on, end_offset),
    }
}

/// Date of the prompt after one sent on `sent_on`.
pub fn next_prompt_after(sent_on: NaiveDate, frequency_days: i32) -> NaiveDate {
    add_days(sent_on, u64::try_from(frequency_days.max(1)).unwrap_or(1))
}
