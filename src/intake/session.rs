//! The per-applicant session aggregate.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::eligibility::{CreditTier, Financials, Offer};
use crate::verification::KycSubmission;

use super::stage::Stage;

/// Identity of one session incarnation. A restart mints a new id, which is
/// how late verification results for the old incarnation are recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display locale. Never affects business logic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Hi,
}

impl Language {
    /// Name used when asking the reply provider to answer in this language.
    pub fn english_name(&self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Hi => "Hindi",
        }
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Self::En),
            "hi" | "hindi" => Ok(Self::Hi),
            other => Err(format!("unsupported language: {other}")),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::En => write!(f, "en"),
            Self::Hi => write!(f, "hi"),
        }
    }
}

/// Identity documents accepted by the verification collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KycRecord {
    pub tax_id: String,
    pub national_id: String,
    pub verified: bool,
    pub document_uploaded: bool,
}

/// An external call the session is currently waiting on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum PendingCall {
    Identity { submission: KycSubmission },
    OneTimeCode,
}

/// One applicant's journey. Mutated only by [`super::machine::process_input`];
/// replaced wholesale on restart.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: SessionId,
    pub stage: Stage,
    pub language: Language,
    pub user_name: String,
    pub loan_category: String,
    pub financials: Financials,
    /// Raw label the applicant picked, kept for display on the letter.
    pub credit_tier_label: String,
    pub credit_tier: Option<CreditTier>,
    pub eligibility_score: Option<u32>,
    pub offers: Vec<Offer>,
    pub selected_offer: Option<Offer>,
    pub mobile_number: Option<String>,
    pub kyc: Option<KycRecord>,
    /// Failed KYC submissions over the whole session, never reset by retries.
    pub verification_attempts: u32,
    pub otp_attempts: u32,
    pub otp_confirmed: bool,
    pub pending: Option<PendingCall>,
}

impl Session {
    /// A fresh session at Greeting with every derived field empty.
    pub fn new(language: Language) -> Self {
        Self {
            id: SessionId::new(),
            stage: Stage::Greeting,
            language,
            user_name: String::new(),
            loan_category: String::new(),
            financials: Financials::default(),
            credit_tier_label: String::new(),
            credit_tier: None,
            eligibility_score: None,
            offers: Vec::new(),
            selected_offer: None,
            mobile_number: None,
            kyc: None,
            verification_attempts: 0,
            otp_attempts: 0,
            otp_confirmed: false,
            pending: None,
        }
    }

    /// Whether the first half of financial collection is done. Income below
    /// the floor is never stored, so zero means "not yet asked".
    pub fn income_declared(&self) -> bool {
        self.financials.monthly_income > 0
    }

    /// Move to `target`, logging the transition.
    pub(crate) fn enter(&mut self, target: Stage) {
        debug_assert!(
            self.stage.can_transition_to(target),
            "invalid transition {} -> {}",
            self.stage,
            target
        );
        if self.stage != target {
            tracing::info!(
                session_id = %self.id,
                from = %self.stage,
                to = %target,
                "Intake stage transition"
            );
        }
        self.stage = target;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Language::default())
    }
}
