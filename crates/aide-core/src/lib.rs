//! # aide-core
//!
//! Core types, traits, configuration, date handling, and error handling for aide.

pub mod config;
pub mod context;
pub mod dates;
pub mod error;
pub mod message;
pub mod model;
pub mod traits;
