//! # aide-providers
//!
//! Completion provider implementations for aide.

pub mod openai;

pub use openai::OpenAiProvider;
