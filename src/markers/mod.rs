//! Oracle output parsing.
//!
//! - `payload`: fence stripping, sentinel detection, JSON object extraction
//! - `intent`: typed routing decisions and reminder drafts

mod intent;
mod payload;

pub use intent::*;
pub use payload::*;
