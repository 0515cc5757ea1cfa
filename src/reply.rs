//! Conversational fallback replies for off-script input.
//!
//! Used only when the applicant types something the scripted flow does not
//! expect (after rejection, or while waiting on a one-time code). The reply
//! never changes session state.

use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::{CompletionError, Prompt, PromptError};
use rig::providers::anthropic;
use secrecy::{ExposeSecret, SecretString};

use crate::error::LlmError;
use crate::intake::{Language, Stage};

/// Shown when the reply provider fails.
pub const FALLBACK_REPLY: &str = "I am here to assist you with your loan.";
/// Shown when the reply provider answers with nothing.
pub const EMPTY_REPLY: &str = "I can help you with your loan application.";

const PROVIDER: &str = "anthropic";
const MAX_REPLY_TOKENS: u64 = 300;

/// Context handed to a reply generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyRequest {
    pub stage: Stage,
    pub utterance: String,
    pub language: Language,
}

/// Produces a short assistant reply for off-script input.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn reply(&self, request: &ReplyRequest) -> Result<String, LlmError>;

    /// Identifier for logs.
    fn name(&self) -> &str;
}

/// System prompt for the bank assistant persona.
pub fn system_prompt(request: &ReplyRequest) -> String {
    format!(
        "You are a bank assistant named FinAI. The user is in the middle of a loan \
         application, currently at the {} stage. Answer their message briefly and \
         politely in {}, then steer them back to the application. Never promise \
         approval and never ask for documents or codes in chat.",
        request.stage,
        request.language.english_name()
    )
}

/// Reply generator backed by an Anthropic model through rig.
pub struct AnthropicReplyGenerator {
    client: rig::client::Client<anthropic::client::AnthropicExt>,
    model: String,
}

impl AnthropicReplyGenerator {
    pub fn new(api_key: SecretString, model: impl Into<String>) -> Result<Self, LlmError> {
        let client = anthropic::Client::new(api_key.expose_secret()).map_err(|e| {
            LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: format!("Failed to create Anthropic client: {}", e),
            }
        })?;
        let model = model.into();
        tracing::info!("Using Anthropic for replies (model: {})", model);
        Ok(Self { client, model })
    }
}

fn map_prompt_error(error: PromptError) -> LlmError {
    match error {
        PromptError::CompletionError(CompletionError::ProviderError(reason))
            if reason.contains("authentication_error") =>
        {
            LlmError::AuthFailed {
                provider: PROVIDER.to_string(),
            }
        }
        PromptError::CompletionError(CompletionError::ResponseError(reason)) => {
            LlmError::InvalidResponse {
                provider: PROVIDER.to_string(),
                reason,
            }
        }
        other => LlmError::RequestFailed {
            provider: PROVIDER.to_string(),
            reason: other.to_string(),
        },
    }
}

#[async_trait]
impl ReplyGenerator for AnthropicReplyGenerator {
    async fn reply(&self, request: &ReplyRequest) -> Result<String, LlmError> {
        let agent = self
            .client
            .agent(self.model.as_str())
            .preamble(&system_prompt(request))
            .max_tokens(MAX_REPLY_TOKENS)
            .build();

        agent
            .prompt(request.utterance.as_str())
            .await
            .map_err(map_prompt_error)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// Reply generator that always answers with the same text. Used when no API
/// key is configured.
pub struct StaticReplyGenerator {
    text: String,
}

impl StaticReplyGenerator {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Default for StaticReplyGenerator {
    fn default() -> Self {
        Self::new(FALLBACK_REPLY)
    }
}

#[async_trait]
impl ReplyGenerator for StaticReplyGenerator {
    async fn reply(&self, _request: &ReplyRequest) -> Result<String, LlmError> {
        Ok(self.text.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}
