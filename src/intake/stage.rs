//! Intake stages, the linear positions of an application.

use serde::{Deserialize, Serialize};

/// The stages of the loan intake conversation.
///
/// Progresses linearly: Greeting → NameCollection → LoanTypeSelection →
/// FinancialCollection → CreditScoreCollection → OfferGeneration → KycStart →
/// KycUpload → OtpVerification → SanctionGeneration. CreditScoreCollection
/// may branch to Rejected, KycUpload (and OtpVerification, when capped) may
/// branch to Locked. Restart leaves any stage for a fresh Greeting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    #[default]
    Greeting,
    NameCollection,
    LoanTypeSelection,
    FinancialCollection,
    CreditScoreCollection,
    OfferGeneration,
    KycStart,
    KycUpload,
    OtpVerification,
    SanctionGeneration,
    Rejected,
    Locked,
}

impl Stage {
    /// Check if a transition from `self` to `target` is valid.
    ///
    /// Self-transitions are only valid for the verification retries.
    pub fn can_transition_to(&self, target: Stage) -> bool {
        use Stage::*;
        matches!(
            (self, target),
            (Greeting, NameCollection)
                | (NameCollection, LoanTypeSelection)
                | (LoanTypeSelection, FinancialCollection)
                | (FinancialCollection, FinancialCollection)
                | (FinancialCollection, CreditScoreCollection)
                | (CreditScoreCollection, OfferGeneration)
                | (CreditScoreCollection, Rejected)
                | (OfferGeneration, KycStart)
                | (KycStart, KycUpload)
                | (KycUpload, KycUpload)
                | (KycUpload, Locked)
                | (KycUpload, OtpVerification)
                | (OtpVerification, OtpVerification)
                | (OtpVerification, Locked)
                | (OtpVerification, SanctionGeneration)
        )
    }

    /// Dead ends that only a restart escapes.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Locked)
    }

    /// Whether typed chat is accepted. The presentation layer disables the
    /// text box while a form or document is on screen.
    pub fn accepts_free_text(&self) -> bool {
        !matches!(
            self,
            Self::KycUpload | Self::SanctionGeneration | Self::Locked
        )
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Greeting => "GREETING",
            Self::NameCollection => "NAME_COLLECTION",
            Self::LoanTypeSelection => "LOAN_TYPE_SELECTION",
            Self::FinancialCollection => "FINANCIAL_COLLECTION",
            Self::CreditScoreCollection => "CREDIT_SCORE_COLLECTION",
            Self::OfferGeneration => "OFFER_GENERATION",
            Self::KycStart => "KYC_START",
            Self::KycUpload => "KYC_UPLOAD",
            Self::OtpVerification => "OTP_VERIFICATION",
            Self::SanctionGeneration => "SANCTION_GENERATION",
            Self::Rejected => "REJECTED",
            Self::Locked => "LOCKED",
        };
        write!(f, "{s}")
    }
}
