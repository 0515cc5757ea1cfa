//! Bot messages emitted by the state machine for the presentation layer.

use serde::Serialize;

/// How the presentation layer should render a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    #[default]
    Text,
    /// Render the session's offers as selectable cards.
    OfferCards,
    /// Render the KYC form.
    Upload,
    KycSuccess,
    /// Offer the sanction letter.
    Sanction,
    Error,
}

/// One assistant message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BotMessage {
    pub text: String,
    pub kind: MessageKind,
    /// Quick-reply buttons; clicking one sends its caption as free text
    /// (except restart, which the presentation maps to a restart event).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl BotMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: MessageKind::Text,
            options: Vec::new(),
        }
    }

    pub fn with_kind(mut self, kind: MessageKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }
}
