//! Mock oracle and channel shared by gateway and API tests.

use super::Gateway;
use aide_core::{
    config::Prompts,
    context::Context,
    error::AideError,
    message::{MessageMetadata, OutgoingMessage},
    traits::{Channel, Provider},
};
use aide_memory::Store;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One scripted oracle answer.
pub enum Scripted {
    Text(String),
    Fail(String),
    /// Never answers within any reasonable timeout.
    Hang,
    Panic,
}

pub fn text(s: &str) -> Scripted {
    Scripted::Text(s.to_string())
}

/// Provider that replays a fixed script and records every context it saw.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Scripted>>,
    pub seen: Mutex<Vec<Context>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Scripted>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn system_prompt(&self, call: usize) -> String {
        self.seen.lock().unwrap()[call].system_prompt.clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, context: &Context) -> Result<OutgoingMessage, AideError> {
        self.seen.lock().unwrap().push(context.clone());
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Text(text)) => Ok(OutgoingMessage {
                text,
                metadata: MessageMetadata {
                    provider_used: "scripted".into(),
                    ..Default::default()
                },
                reply_target: None,
            }),
            Some(Scripted::Fail(reason)) => Err(AideError::Provider(reason)),
            Some(Scripted::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(AideError::Provider("hung".into()))
            }
            Some(Scripted::Panic) => panic!("scripted provider panic"),
            None => Err(AideError::Provider("script exhausted".into())),
        }
    }

    async fn is_available(&self) -> bool {
        true
    }
}

/// Channel that records sends and can fail for one recipient.
#[derive(Default)]
pub struct RecordingChannel {
    pub sent: Mutex<Vec<OutgoingMessage>>,
    pub fail_for: Option<String>,
}

impl RecordingChannel {
    pub fn failing_for(recipient: &str) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_for: Some(recipient.to_string()),
        }
    }

    pub fn texts(&self) -> Vec<(String, String)> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|m| (m.reply_target.clone().unwrap_or_default(), m.text.clone()))
            .collect()
    }
}

#[async_trait]
impl Channel for RecordingChannel {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), AideError> {
        if self.fail_for.is_some() && message.reply_target == self.fail_for {
            return Err(AideError::Channel("connection reset".into()));
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

/// Gateway over an in-memory store with a short oracle timeout.
pub async fn test_gateway(provider: Arc<ScriptedProvider>) -> Gateway {
    let store = Store::in_memory().await.unwrap();
    Gateway::new(
        provider,
        store,
        Prompts::default(),
        Duration::from_millis(200),
    )
}
