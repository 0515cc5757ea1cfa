//! Error types for Loan Assist.
//!
//! The conversation state machine never fails: every bad input resolves to a
//! re-prompt. These errors come from configuration loading, from the external
//! collaborators the driver calls, and from document requests.

use std::time::Duration;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors raised by the identity / one-time-code collaborator.
#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("Verification timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("Verification backend failed: {reason}")]
    Backend { reason: String },
}

/// Conversational reply provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },
}

/// Errors from requests made against an intake session.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("No sanction has been issued yet (stage {stage})")]
    NotSanctioned { stage: String },
}
