//! Minimal Telegram Bot API client over long polling.
//!
//! Only the handful of methods and types the bot actually uses; no
//! framework, just `reqwest` against `api.telegram.org`.

mod client;
pub mod types;

pub use client::{Api, ApiError};
