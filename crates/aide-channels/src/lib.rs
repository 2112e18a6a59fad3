//! # aide-channels
//!
//! Outbound messaging channels for aide.

pub mod twilio;
pub mod utils;

pub use twilio::TwilioChannel;
