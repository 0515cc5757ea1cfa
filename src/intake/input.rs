//! Inputs accepted by the intake state machine.
//!
//! Typed chat and structured UI events travel as distinct variants, so the
//! machine never guesses an event's kind from its payload.

use serde::{Deserialize, Serialize};

use crate::verification::{KycSubmission, VerificationOutcome};

use super::session::{Language, SessionId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Input {
    /// Anything the applicant typed, or a quick-reply button caption.
    FreeText { text: String },
    /// An offer card was clicked.
    OfferChosen { offer_id: String },
    /// The KYC form was submitted.
    KycSubmitted(KycSubmission),
    /// A one-time code was entered.
    OtpSubmitted { code: String },
    /// Completion of an identity check started by `KycSubmitted`.
    KycVerified {
        session_id: SessionId,
        outcome: VerificationOutcome,
    },
    /// Completion of a code check started by `OtpSubmitted`.
    OtpChecked { session_id: SessionId, confirmed: bool },
    SetLanguage { language: Language },
    Restart,
}

impl Input {
    pub fn text(text: impl Into<String>) -> Self {
        Self::FreeText { text: text.into() }
    }

    pub fn choose(offer_id: impl Into<String>) -> Self {
        Self::OfferChosen {
            offer_id: offer_id.into(),
        }
    }

    pub fn otp(code: impl Into<String>) -> Self {
        Self::OtpSubmitted { code: code.into() }
    }

    /// Whether this is a completion event produced by the driver rather than
    /// something the presentation layer sends.
    pub fn is_completion(&self) -> bool {
        matches!(self, Self::KycVerified { .. } | Self::OtpChecked { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format_is_tagged() {
        let json = serde_json::to_value(Input::text("hello")).unwrap();
        assert_eq!(json, serde_json::json!({"type": "free_text", "text": "hello"}));

        let json = serde_json::to_value(Input::Restart).unwrap();
        assert_eq!(json, serde_json::json!({"type": "restart"}));
    }

    #[test]
    fn kyc_submission_fields_are_flattened() {
        let parsed: Input = serde_json::from_value(serde_json::json!({
            "type": "kyc_submitted",
            "tax_id": "ABCDE1234F",
            "national_id": "234567890123",
            "document_present": true
        }))
        .unwrap();
        assert_eq!(
            parsed,
            Input::KycSubmitted(KycSubmission {
                tax_id: "ABCDE1234F".into(),
                national_id: "234567890123".into(),
                document_present: true,
            })
        );
    }

    #[test]
    fn completion_events() {
        let verified = Input::OtpChecked {
            session_id: SessionId::new(),
            confirmed: true,
        };
        assert!(verified.is_completion());
        assert!(!Input::otp("1234").is_completion());
    }
}
