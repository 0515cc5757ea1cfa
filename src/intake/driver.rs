//! IntakeAgent owns one session and runs the machine's effects against
//! the external collaborators.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use crate::config::IntakeConfig;
use crate::error::{IntakeError, VerificationError};
use crate::reply::{EMPTY_REPLY, FALLBACK_REPLY, ReplyGenerator, ReplyRequest};
use crate::sanction::SanctionLetter;
use crate::validators::mask_mobile;
use crate::verification::{IdentityVerifier, VerificationOutcome};

use super::input::Input;
use super::machine::{Effect, greeting, process_input};
use super::messages::BotMessage;
use super::session::{Session, SessionId};

/// Reason reported when the identity collaborator does not answer in time.
pub const TIMEOUT_REASON: &str = "Verification timed out";

/// Drives a single intake session.
///
/// The session lock is never held across a collaborator call, so a restart
/// can land while a verification is in flight; the late result then carries
/// the old session id and is discarded by the machine.
pub struct IntakeAgent {
    shared: Arc<Shared>,
}

struct Shared {
    config: IntakeConfig,
    verifier: Arc<dyn IdentityVerifier>,
    replies: Arc<dyn ReplyGenerator>,
    session: RwLock<Session>,
}

impl IntakeAgent {
    pub fn new(
        config: IntakeConfig,
        verifier: Arc<dyn IdentityVerifier>,
        replies: Arc<dyn ReplyGenerator>,
    ) -> Self {
        let session = Session::new(config.default_language);
        Self {
            shared: Arc::new(Shared {
                config,
                verifier,
                replies,
                session: RwLock::new(session),
            }),
        }
    }

    /// Opening message for the current session.
    pub async fn start(&self) -> Vec<BotMessage> {
        vec![greeting(self.shared.session.read().await.language)]
    }

    /// Copy of the current session.
    pub async fn snapshot(&self) -> Session {
        self.shared.session.read().await.clone()
    }

    /// Issue the sanction letter for the current session.
    pub async fn sanction_letter(&self) -> Result<SanctionLetter, IntakeError> {
        SanctionLetter::issue(&*self.shared.session.read().await)
    }

    /// Apply an input and every completion it triggers, returning all
    /// messages produced along the way in order.
    ///
    /// The work runs on its own task. If the caller goes away (an HTTP client
    /// disconnecting, say) the pending check still resolves and its
    /// completion is applied to the session.
    pub async fn handle(&self, input: Input) -> Vec<BotMessage> {
        let shared = Arc::clone(&self.shared);
        match tokio::spawn(async move { shared.drive(input).await }).await {
            Ok(messages) => messages,
            Err(e) => {
                error!(error = %e, "Intake task failed");
                Vec::new()
            }
        }
    }
}

impl Shared {
    async fn drive(&self, input: Input) -> Vec<BotMessage> {
        let mut messages = Vec::new();
        let mut queue = VecDeque::from([input]);

        while let Some(input) = queue.pop_front() {
            let effects = {
                let mut session = self.session.write().await;
                let transition = process_input(session.clone(), input, &self.config);
                *session = transition.session;
                messages.extend(transition.messages);
                transition.effects
            };

            for effect in effects {
                if let Some(completion) = self.run_effect(effect, &mut messages).await {
                    queue.push_back(completion);
                }
            }
        }

        messages
    }

    async fn run_effect(&self, effect: Effect, messages: &mut Vec<BotMessage>) -> Option<Input> {
        let timeout = self.config.verification_timeout;
        match effect {
            Effect::VerifyIdentity {
                session_id,
                submission,
            } => {
                let result =
                    tokio::time::timeout(timeout, self.verifier.verify_identity(&submission))
                        .await
                        .unwrap_or(Err(VerificationError::Timeout { timeout }));
                let outcome = match result {
                    Ok(outcome) => outcome,
                    Err(VerificationError::Timeout { .. }) => {
                        warn!(%session_id, ?timeout, "Identity verification timed out");
                        VerificationOutcome::failed(TIMEOUT_REASON)
                    }
                    Err(e) => {
                        warn!(%session_id, error = %e, "Identity verification errored");
                        VerificationOutcome::failed(e.to_string())
                    }
                };
                Some(Input::KycVerified {
                    session_id,
                    outcome,
                })
            }
            Effect::SendOneTimeCode { session_id, mobile } => {
                match tokio::time::timeout(timeout, self.verifier.send_one_time_code(&mobile)).await
                {
                    Ok(Ok(())) => {
                        debug!(%session_id, mobile = %mask_mobile(&mobile), "One-time code dispatched")
                    }
                    Ok(Err(e)) => warn!(%session_id, error = %e, "Failed to send one-time code"),
                    Err(_) => warn!(%session_id, ?timeout, "Sending one-time code timed out"),
                }
                None
            }
            Effect::ConfirmOneTimeCode { session_id, code } => {
                let confirmed =
                    match tokio::time::timeout(timeout, self.verifier.confirm_one_time_code(&code))
                        .await
                    {
                        Ok(Ok(confirmed)) => confirmed,
                        Ok(Err(e)) => {
                            warn!(%session_id, error = %e, "One-time code check errored");
                            false
                        }
                        Err(_) => {
                            warn!(%session_id, ?timeout, "One-time code check timed out");
                            false
                        }
                    };
                Some(Input::OtpChecked {
                    session_id,
                    confirmed,
                })
            }
            Effect::FreeformReply {
                session_id,
                stage,
                utterance,
                language,
            } => {
                let request = ReplyRequest {
                    stage,
                    utterance,
                    language,
                };
                let text = match self.replies.reply(&request).await {
                    Ok(text) if text.trim().is_empty() => EMPTY_REPLY.to_string(),
                    Ok(text) => text.trim().to_string(),
                    Err(e) => {
                        warn!(%session_id, provider = self.replies.name(), error = %e, "Reply generation failed");
                        FALLBACK_REPLY.to_string()
                    }
                };
                if self.current_id().await == session_id {
                    debug!(%session_id, %stage, "Freeform reply delivered");
                    messages.push(BotMessage::text(text));
                } else {
                    debug!(%session_id, "Freeform reply for a restarted session dropped");
                }
                None
            }
        }
    }

    async fn current_id(&self) -> SessionId {
        self.session.read().await.id
    }
}
