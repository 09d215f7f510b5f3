//! Background tasks and scheduled jobs.
//!
//! Each submodule provides a long-running async function intended to be
//! spawned via `tokio::spawn`. All tasks accept a [`CancellationToken`]
//! for graceful shutdown. The single-pass functions they call on every tick
//! are public so tests can drive them directly.
//!
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

pub mod delivery_confirmations;
pub mod photo_prompts;
pub mod physician_digest;
