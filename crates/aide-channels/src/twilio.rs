//! WhatsApp delivery through the Twilio Messages REST API.
//!
//! Inbound messages arrive at the HTTP webhook and are answered synchronously
//! in the response envelope; this channel is only used for proactive sends
//! such as reminder notifications.

use crate::utils::split_message;
use aide_core::{config::TwilioConfig, error::AideError, message::OutgoingMessage, traits::Channel};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

/// Twilio rejects WhatsApp bodies longer than this.
pub const WHATSAPP_MAX_LEN: usize = 1600;

const WHATSAPP_PREFIX: &str = "whatsapp:";

/// Outbound WhatsApp channel backed by Twilio.
pub struct TwilioChannel {
    config: TwilioConfig,
    client: reqwest::Client,
}

impl TwilioChannel {
    pub fn new(config: TwilioConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.config.base_url.trim_end_matches('/'),
            self.config.account_sid
        )
    }

    /// Send a single chunk and return Twilio's message SID.
    async fn send_chunk(&self, to: &str, body: &str) -> Result<String, AideError> {
        let from = whatsapp_address(&self.config.from);
        let form = [("From", from.as_str()), ("To", to), ("Body", body)];

        let resp = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(|e| AideError::Channel(format!("twilio request failed: {e}")))?;

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(AideError::Channel(format!(
                "twilio returned {status}: {}",
                error_message(&text)
            )));
        }

        let sent: SentMessage = serde_json::from_str(&text)
            .map_err(|e| AideError::Channel(format!("twilio: failed to parse response: {e}")))?;
        debug!(
            "twilio: queued {} status={}",
            sent.sid.as_deref().unwrap_or("?"),
            sent.status.as_deref().unwrap_or("?")
        );
        Ok(sent.sid.unwrap_or_default())
    }
}

/// Normalize a phone number into Twilio's `whatsapp:+<number>` address form.
pub fn whatsapp_address(raw: &str) -> String {
    let raw = raw.trim();
    if raw.starts_with(WHATSAPP_PREFIX) {
        raw.to_string()
    } else {
        format!("{WHATSAPP_PREFIX}{raw}")
    }
}

/// Render a Twilio error body as `message (code N)`, falling back to the raw body.
pub(crate) fn error_message(body: &str) -> String {
    match serde_json::from_str::<TwilioError>(body) {
        Ok(TwilioError {
            message: Some(message),
            code,
        }) => match code {
            Some(code) => format!("{message} (code {code})"),
            None => message,
        },
        _ => body.chars().take(200).collect(),
    }
}

#[derive(Deserialize)]
struct SentMessage {
    sid: Option<String>,
    status: Option<String>,
}

#[derive(Deserialize)]
struct TwilioError {
    code: Option<i64>,
    message: Option<String>,
}

#[async_trait]
impl Channel for TwilioChannel {
    fn name(&self) -> &str {
        "whatsapp"
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), AideError> {
        let target = message
            .reply_target
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AideError::Channel("twilio: message has no recipient".into()))?;
        let to = whatsapp_address(target);

        let chunks = split_message(&message.text, WHATSAPP_MAX_LEN);
        for chunk in &chunks {
            self.send_chunk(&to, chunk).await?;
        }
        info!("twilio: sent {} part(s) to {to}", chunks.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> TwilioConfig {
        TwilioConfig {
            account_sid: "AC123".into(),
            auth_token: "secret".into(),
            from: "+14155238886".into(),
            base_url: "https://api.twilio.com/".into(),
        }
    }

    #[test]
    fn test_channel_name() {
        assert_eq!(TwilioChannel::new(test_config()).name(), "whatsapp");
    }

    #[test]
    fn test_messages_url() {
        let ch = TwilioChannel::new(test_config());
        assert_eq!(
            ch.messages_url(),
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Messages.json"
        );
    }

    #[test]
    fn test_whatsapp_address() {
        assert_eq!(whatsapp_address("+15550001111"), "whatsapp:+15550001111");
        assert_eq!(
            whatsapp_address(" whatsapp:+15550001111 "),
            "whatsapp:+15550001111"
        );
    }

    #[test]
    fn test_error_message() {
        let body = r#"{"code":21211,"message":"Invalid 'To' Phone Number","status":400}"#;
        assert_eq!(
            error_message(body),
            "Invalid 'To' Phone Number (code 21211)"
        );
        assert_eq!(error_message(r#"{"message":"Nope"}"#), "Nope");
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
    }

    #[tokio::test]
    async fn test_send_without_recipient_fails() {
        let ch = TwilioChannel::new(test_config());
        let msg = OutgoingMessage {
            text: "hi".into(),
            ..Default::default()
        };
        let err = ch.send(msg).await.unwrap_err();
        assert!(err.to_string().contains("no recipient"));
    }
}
