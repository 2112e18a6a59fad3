use serde::{Deserialize, Serialize};

/// A single prompt exchange passed to a provider.
///
/// The assistant is stateless per message: every oracle call carries one
/// system prompt and one user message, nothing else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    /// System prompt prepended to the request.
    pub system_prompt: String,
    /// The current user message.
    pub current_message: String,
}

/// A structured message for API-based providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMessage {
    /// "user" or "assistant".
    pub role: String,
    /// The message content.
    pub content: String,
}

impl Context {
    /// Create a context with the given system prompt.
    pub fn with_system(system_prompt: &str, message: &str) -> Self {
        Self {
            system_prompt: system_prompt.to_string(),
            current_message: message.to_string(),
        }
    }

    /// Split into the system prompt and the message list expected by chat APIs.
    pub fn to_api_messages(&self) -> (String, Vec<ApiMessage>) {
        (
            self.system_prompt.clone(),
            vec![ApiMessage {
                role: "user".to_string(),
                content: self.current_message.clone(),
            }],
        )
    }
}
