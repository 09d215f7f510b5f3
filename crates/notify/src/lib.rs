//! Outbound patient and physician messaging.
//!
//! - [`sms`]: the [`sms::SmsGateway`] trait and its Twilio REST client
//!   (send + MMS media download).
//! - [`email`]: the [`email::Mailer`] trait and its SMTP implementation.
//! - [`templates`]: message bodies shared by handlers and background jobs.

pub mod email;
pub mod sms;
pub mod templates;
