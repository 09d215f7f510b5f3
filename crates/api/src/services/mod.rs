//! Workflows shared by several handlers and background jobs.
//!
//! - [`delivery`] -- follow-up messaging and photo schedule for delivered orders.
//! - [`photo_intake`] -- storing wound photos and the inbound MMS flow.

pub mod delivery;
pub mod photo_intake;
