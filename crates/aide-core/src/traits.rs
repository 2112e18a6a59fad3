use crate::{context::Context, error::AideError, message::OutgoingMessage};
use async_trait::async_trait;

/// Completion provider trait. Acts as the intent oracle.
///
/// The assistant treats a provider as a possibly-failing function from a
/// prompt to text. Implementations must not retry on their own.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Human-readable provider name.
    fn name(&self) -> &str;

    /// Send a prompt to the provider and get the completion back.
    async fn complete(&self, context: &Context) -> Result<OutgoingMessage, AideError>;

    /// Check if the provider is available and ready.
    async fn is_available(&self) -> bool;
}

/// Outbound messaging channel trait.
///
/// Inbound messages arrive through the webhook; a channel only delivers.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name.
    fn name(&self) -> &str;

    /// Deliver a message to `message.reply_target`.
    async fn send(&self, message: OutgoingMessage) -> Result<(), AideError>;
}
