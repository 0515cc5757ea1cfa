//! Intake state machine: one input in, a new session plus messages out.
//!
//! [`process_input`] is synchronous and pure apart from tracing. When an
//! input needs an external collaborator it records a [`PendingCall`] on the
//! session and returns an [`Effect`]; the driver performs the call and feeds
//! the result back as a completion input (`KycVerified` / `OtpChecked`).

use tracing::{debug, info, warn};

use crate::config::IntakeConfig;
use crate::eligibility::{self, CreditTier, generate_offers};
use crate::validators::{extract_digits, is_valid_mobile, is_valid_national_id, is_valid_tax_id};
use crate::verification::{KycSubmission, VerificationOutcome};

use super::input::Input;
use super::messages::{BotMessage, MessageKind};
use super::session::{KycRecord, Language, PendingCall, Session, SessionId};
use super::stage::Stage;
use super::strings::{Phrase, buttons, format_inr, phrase, render};

/// Lowest monthly income accepted in the first financial question.
pub const MIN_MONTHLY_INCOME: u64 = 5000;
/// Highest monthly income accepted. Keeps every loan amount derived from it
/// well inside `u64`.
pub const MAX_MONTHLY_INCOME: u64 = 100_000_000;
/// Shortest accepted applicant name, in characters.
pub const MIN_NAME_CHARS: usize = 3;

/// An external call the driver must perform on the machine's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Check identity documents; answer with `Input::KycVerified`.
    VerifyIdentity {
        session_id: SessionId,
        submission: KycSubmission,
    },
    /// Send the one-time code. Fire-and-forget.
    SendOneTimeCode {
        session_id: SessionId,
        mobile: String,
    },
    /// Check a one-time code; answer with `Input::OtpChecked`.
    ConfirmOneTimeCode { session_id: SessionId, code: String },
    /// Ask the conversational collaborator for an off-script reply.
    FreeformReply {
        session_id: SessionId,
        stage: Stage,
        utterance: String,
        language: Language,
    },
}

/// Result of processing one input.
#[derive(Debug, Clone)]
pub struct Transition {
    pub session: Session,
    pub messages: Vec<BotMessage>,
    pub effects: Vec<Effect>,
}

/// The message that opens every session.
pub fn greeting(language: Language) -> BotMessage {
    BotMessage::text(phrase(language, Phrase::Welcome))
        .with_options(buttons(language, &[Phrase::ButtonYes]))
}

/// Apply one input to a session.
pub fn process_input(session: Session, input: Input, config: &IntakeConfig) -> Transition {
    let mut step = Step {
        session,
        messages: Vec::new(),
        effects: Vec::new(),
        config,
    };

    match input {
        Input::Restart => step.restart(),
        Input::SetLanguage { language } => step.set_language(language),
        Input::FreeText { text } => step.free_text(text.trim()),
        Input::OfferChosen { offer_id } => step.offer_chosen(&offer_id),
        Input::KycSubmitted(submission) => step.kyc_submitted(submission),
        Input::KycVerified {
            session_id,
            outcome,
        } => step.kyc_verified(session_id, outcome),
        Input::OtpSubmitted { code } => step.otp_submitted(code.trim()),
        Input::OtpChecked {
            session_id,
            confirmed,
        } => step.otp_checked(session_id, confirmed),
    }

    Transition {
        session: step.session,
        messages: step.messages,
        effects: step.effects,
    }
}

/// Working state for a single `process_input` call.
struct Step<'a> {
    session: Session,
    messages: Vec<BotMessage>,
    effects: Vec<Effect>,
    config: &'a IntakeConfig,
}

impl Step<'_> {
    fn lang(&self) -> Language {
        self.session.language
    }

    fn say(&mut self, key: Phrase) {
        self.messages.push(BotMessage::text(phrase(self.lang(), key)));
    }

    fn push(&mut self, message: BotMessage) {
        self.messages.push(message);
    }

    fn restart_button(&self) -> Vec<String> {
        buttons(self.lang(), &[Phrase::ButtonRestart])
    }

    fn restart(&mut self) {
        let previous = self.session.id;
        self.session = Session::new(self.config.default_language);
        info!(
            previous_session = %previous,
            session_id = %self.session.id,
            "Intake session restarted"
        );
        self.push(greeting(self.lang()));
    }

    fn set_language(&mut self, language: Language) {
        self.session.language = language;
        self.say(Phrase::LanguageChanged);
    }

    fn free_text(&mut self, text: &str) {
        match self.session.stage {
            Stage::Greeting => {
                self.session.enter(Stage::NameCollection);
                self.say(Phrase::NameRequest);
            }
            Stage::NameCollection => self.collect_name(text),
            Stage::LoanTypeSelection => {
                self.session.loan_category = text.to_string();
                self.session.enter(Stage::FinancialCollection);
                self.say(Phrase::IncomeRequest);
            }
            Stage::FinancialCollection => self.collect_financials(text),
            Stage::CreditScoreCollection => self.assess_credit(text),
            Stage::OfferGeneration => self.say(Phrase::SelectOffer),
            Stage::KycStart => self.collect_mobile(text),
            Stage::KycUpload | Stage::SanctionGeneration | Stage::Locked => {
                debug!(stage = %self.session.stage, "Free text ignored while input is disabled");
            }
            Stage::OtpVerification | Stage::Rejected => {
                self.effects.push(Effect::FreeformReply {
                    session_id: self.session.id,
                    stage: self.session.stage,
                    utterance: text.to_string(),
                    language: self.lang(),
                });
            }
        }
    }

    fn collect_name(&mut self, text: &str) {
        if text.chars().count() < MIN_NAME_CHARS {
            self.say(Phrase::InvalidName);
            return;
        }
        self.session.user_name = text.to_string();
        self.session.enter(Stage::LoanTypeSelection);

        let prompt = render(self.lang(), Phrase::LoanTypeRequest, &[("name", text)]);
        let options = buttons(
            self.lang(),
            &[
                Phrase::ButtonPersonal,
                Phrase::ButtonHome,
                Phrase::ButtonBusiness,
                Phrase::ButtonEducation,
            ],
        );
        self.push(BotMessage::text(prompt).with_options(options));
    }

    fn collect_financials(&mut self, text: &str) {
        if !self.session.income_declared() {
            match extract_digits(text) {
                Some(income) if (MIN_MONTHLY_INCOME..=MAX_MONTHLY_INCOME).contains(&income) => {
                    self.session.financials.monthly_income = income;
                    self.say(Phrase::ObligationRequest);
                }
                _ => self.say(Phrase::InvalidIncome),
            }
            return;
        }

        self.session.financials.existing_monthly_obligation = extract_digits(text).unwrap_or(0);
        self.session.enter(Stage::CreditScoreCollection);

        let options = buttons(
            self.lang(),
            &[
                Phrase::TierExcellent,
                Phrase::TierGood,
                Phrase::TierFair,
                Phrase::TierPoor,
                Phrase::TierUnknown,
            ],
        );
        self.push(BotMessage::text(phrase(self.lang(), Phrase::CreditScoreRequest)).with_options(options));
    }

    fn assess_credit(&mut self, label: &str) {
        let tier = CreditTier::classify(label);
        let financials = self.session.financials;
        let score = eligibility::score(&financials, tier);
        let offers = generate_offers(&financials, &self.session.loan_category, score, tier);

        info!(
            session_id = %self.session.id,
            tier = %tier,
            score,
            offers = offers.len(),
            "Eligibility assessed"
        );

        self.session.credit_tier_label = label.to_string();
        self.session.credit_tier = Some(tier);
        self.session.eligibility_score = Some(score);
        self.session.offers = offers;

        // The advisory always precedes the outcome.
        if tier == CreditTier::Poor {
            self.say(Phrase::CreditScoreAdvisory);
        }

        if self.session.offers.is_empty() {
            self.session.enter(Stage::Rejected);
            let options = self.restart_button();
            self.push(BotMessage::text(phrase(self.lang(), Phrase::Rejection)).with_options(options));
        } else {
            self.session.enter(Stage::OfferGeneration);
            let income = format_inr(financials.monthly_income);
            let score = score.to_string();
            let text = render(
                self.lang(),
                Phrase::OffersGenerated,
                &[("income", &income), ("score", &score)],
            );
            self.push(BotMessage::text(text).with_kind(MessageKind::OfferCards));
        }
    }

    fn offer_chosen(&mut self, offer_id: &str) {
        if self.session.stage != Stage::OfferGeneration {
            debug!(stage = %self.session.stage, offer_id, "Offer selection outside offer stage ignored");
            return;
        }
        let Some(offer) = self.session.offers.iter().find(|o| o.id() == offer_id).cloned() else {
            debug!(offer_id, "Unknown offer selected");
            self.say(Phrase::SelectOffer);
            return;
        };
        info!(session_id = %self.session.id, offer_id, amount = offer.amount(), "Offer selected");
        self.session.selected_offer = Some(offer);
        self.session.enter(Stage::KycStart);
        self.say(Phrase::MobileRequest);
    }

    fn collect_mobile(&mut self, text: &str) {
        if !is_valid_mobile(text) {
            self.say(Phrase::InvalidMobile);
            return;
        }
        self.session.mobile_number = Some(text.to_string());
        self.session.enter(Stage::KycUpload);
        self.push(BotMessage::text(phrase(self.lang(), Phrase::KycStart)).with_kind(MessageKind::Upload));
    }

    fn kyc_submitted(&mut self, submission: KycSubmission) {
        if self.session.stage != Stage::KycUpload {
            debug!(stage = %self.session.stage, "KYC submission outside upload stage ignored");
            return;
        }
        if self.session.pending.is_some() {
            self.say(Phrase::KycInProgress);
            return;
        }

        let submission = KycSubmission {
            tax_id: submission.tax_id.trim().to_uppercase(),
            national_id: submission
                .national_id
                .chars()
                .filter(char::is_ascii_digit)
                .collect(),
            document_present: submission.document_present,
        };
        if !is_valid_tax_id(&submission.tax_id) || !is_valid_national_id(&submission.national_id) {
            self.push(
                BotMessage::text(phrase(self.lang(), Phrase::InvalidKycInput))
                    .with_kind(MessageKind::Upload),
            );
            return;
        }

        self.session.pending = Some(PendingCall::Identity {
            submission: submission.clone(),
        });
        self.effects.push(Effect::VerifyIdentity {
            session_id: self.session.id,
            submission,
        });
    }

    fn kyc_verified(&mut self, session_id: SessionId, outcome: VerificationOutcome) {
        if session_id != self.session.id {
            debug!(%session_id, current = %self.session.id, "Stale identity result ignored");
            return;
        }
        let Some(PendingCall::Identity { submission }) = self.session.pending.clone() else {
            debug!(%session_id, "Identity result without a pending check ignored");
            return;
        };
        self.session.pending = None;

        if outcome.success {
            self.session.kyc = Some(KycRecord {
                tax_id: submission.tax_id,
                national_id: submission.national_id,
                verified: true,
                document_uploaded: submission.document_present,
            });
            self.session.enter(Stage::OtpVerification);
            self.push(
                BotMessage::text(phrase(self.lang(), Phrase::KycSuccess))
                    .with_kind(MessageKind::KycSuccess),
            );
            if let Some(mobile) = self.session.mobile_number.clone() {
                self.effects.push(Effect::SendOneTimeCode {
                    session_id: self.session.id,
                    mobile,
                });
            }
            return;
        }

        self.session.verification_attempts += 1;
        let attempts = self.session.verification_attempts;
        let max_attempts = self.config.max_kyc_attempts.max(1);
        warn!(
            session_id = %self.session.id,
            attempts,
            reason = %outcome.reason,
            "Identity verification failed"
        );

        if attempts >= max_attempts {
            self.lock();
            return;
        }

        let text = format!(
            "{} Reason: {}. Attempts remaining: {}. Please check your details and try again.",
            phrase(self.lang(), Phrase::KycFail),
            outcome.reason,
            max_attempts - attempts
        );
        self.session.enter(Stage::KycUpload);
        self.push(BotMessage::text(text).with_kind(MessageKind::Upload));
    }

    fn otp_submitted(&mut self, code: &str) {
        if self.session.stage != Stage::OtpVerification {
            debug!(stage = %self.session.stage, "Code submission outside verification stage ignored");
            return;
        }
        if self.session.pending.is_some() {
            debug!("Code submission while a check is pending ignored");
            return;
        }
        if code.len() != 4 || !code.chars().all(|c| c.is_ascii_digit()) {
            self.say(Phrase::InvalidOtp);
            return;
        }
        self.session.pending = Some(PendingCall::OneTimeCode);
        self.effects.push(Effect::ConfirmOneTimeCode {
            session_id: self.session.id,
            code: code.to_string(),
        });
    }

    fn otp_checked(&mut self, session_id: SessionId, confirmed: bool) {
        if session_id != self.session.id {
            debug!(%session_id, current = %self.session.id, "Stale code result ignored");
            return;
        }
        if self.session.pending != Some(PendingCall::OneTimeCode) {
            debug!(%session_id, "Code result without a pending check ignored");
            return;
        }
        self.session.pending = None;

        if confirmed {
            self.session.otp_confirmed = true;
            self.session.enter(Stage::SanctionGeneration);
            self.push(
                BotMessage::text(phrase(self.lang(), Phrase::OtpSuccess))
                    .with_kind(MessageKind::Sanction),
            );
            return;
        }

        self.session.otp_attempts += 1;
        let attempts = self.session.otp_attempts;
        warn!(session_id = %self.session.id, attempts, "One-time code rejected");

        if matches!(self.config.max_otp_attempts, Some(max) if attempts >= max) {
            self.lock();
        } else {
            self.session.enter(Stage::OtpVerification);
            self.say(Phrase::OtpFail);
        }
    }

    fn lock(&mut self) {
        warn!(session_id = %self.session.id, "Session locked after repeated verification failures");
        self.session.enter(Stage::Locked);
        let options = self.restart_button();
        self.push(
            BotMessage::text(phrase(self.lang(), Phrase::Locked))
                .with_kind(MessageKind::Error)
                .with_options(options),
        );
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn config() -> IntakeConfig {
        IntakeConfig::default()
    }

    fn run(session: Session, input: Input) -> Transition {
        process_input(session, input, &config())
    }

    fn feed(session: Session, texts: &[&str]) -> Session {
        texts
            .iter()
            .fold(session, |s, text| run(s, Input::text(*text)).session)
    }

    /// Session sitting at OFFER_GENERATION for a 50k earner with a good score.
    fn at_offers() -> Session {
        let session = feed(
            Session::default(),
            &["yes", "Asha Rao", "Personal Loan", "50000", "0", "Good (700-749)"],
        );
        assert_eq!(session.stage, Stage::OfferGeneration);
        session
    }

    fn at_upload() -> Session {
        let session = run(at_offers(), Input::choose("opt_1")).session;
        run(session, Input::text("9876543210")).session
    }

    fn valid_submission() -> KycSubmission {
        KycSubmission {
            tax_id: "ABCDE1234F".into(),
            national_id: "234567890123".into(),
            document_present: true,
        }
    }

    fn fail_kyc(session: Session) -> Transition {
        let submitted = run(session, Input::KycSubmitted(valid_submission()));
        let id = submitted.session.id;
        run(
            submitted.session,
            Input::KycVerified {
                session_id: id,
                outcome: VerificationOutcome::failed("Mismatch"),
            },
        )
    }

    #[test]
    fn greeting_advances_on_any_input() {
        let t = run(Session::default(), Input::text("hi"));
        assert_eq!(t.session.stage, Stage::NameCollection);
        assert_eq!(t.messages.len(), 1);
        assert!(t.messages[0].text.contains("full name"));
    }

    #[test]
    fn short_name_is_reprompted() {
        let session = feed(Session::default(), &["yes"]);
        let t = run(session, Input::text("Al"));
        assert_eq!(t.session.stage, Stage::NameCollection);
        assert!(t.session.user_name.is_empty());
        assert_eq!(t.messages[0].text, "Please enter a valid full name.");
    }

    #[test]
    fn name_moves_to_loan_type_with_buttons() {
        let session = feed(Session::default(), &["yes"]);
        let t = run(session, Input::text("  Asha Rao "));
        assert_eq!(t.session.stage, Stage::LoanTypeSelection);
        assert_eq!(t.session.user_name, "Asha Rao");
        assert!(t.messages[0].text.contains("Hello Asha Rao"));
        assert_eq!(t.messages[0].options.len(), 4);
    }

    #[test]
    fn loan_category_is_stored_verbatim() {
        let session = feed(Session::default(), &["yes", "Asha Rao"]);
        let t = run(session, Input::text("a loan for my boat"));
        assert_eq!(t.session.loan_category, "a loan for my boat");
        assert_eq!(t.session.stage, Stage::FinancialCollection);
    }

    #[test]
    fn surrounding_whitespace_is_not_part_of_the_answer() {
        let session = feed(Session::default(), &["yes", "Asha Rao"]);
        let t = run(session, Input::text("  Home Loan \n"));
        assert_eq!(t.session.loan_category, "Home Loan");

        let session = feed(Session::default(), &["yes"]);
        let t = run(session, Input::text("  Al  "));
        assert_eq!(t.session.stage, Stage::NameCollection);
    }

    #[test]
    fn low_income_is_rejected_in_place() {
        let session = feed(Session::default(), &["yes", "Asha Rao", "Home Loan"]);
        let t = run(session, Input::text("4999"));
        assert_eq!(t.session.stage, Stage::FinancialCollection);
        assert!(!t.session.income_declared());
        assert_eq!(t.messages[0].text, phrase(Language::En, Phrase::InvalidIncome));

        let session = feed(Session::default(), &["yes", "Asha Rao", "Home Loan"]);
        let t = run(session, Input::text("5000"));
        assert_eq!(t.session.financials.monthly_income, 5000);
    }

    #[test]
    fn implausible_income_is_rejected_in_place() {
        let session = feed(Session::default(), &["yes", "Asha Rao", "Home Loan"]);
        let t = run(session.clone(), Input::text("9999999999999999999"));
        assert!(!t.session.income_declared());
        assert_eq!(t.messages[0].text, phrase(Language::En, Phrase::InvalidIncome));

        let t = run(session.clone(), Input::text("100000001"));
        assert!(!t.session.income_declared());

        let t = run(session, Input::text("100000000"));
        assert_eq!(t.session.financials.monthly_income, MAX_MONTHLY_INCOME);
    }

    #[test]
    fn unparseable_income_is_rejected() {
        let session = feed(Session::default(), &["yes", "Asha Rao", "Home Loan"]);
        let t = run(session, Input::text("a lot"));
        assert!(!t.session.income_declared());
    }

    #[test]
    fn financials_two_phase_collection() {
        let session = feed(Session::default(), &["yes", "Asha Rao", "Home Loan"]);
        let t = run(session, Input::text("₹45,000"));
        assert_eq!(t.session.stage, Stage::FinancialCollection);
        assert_eq!(t.session.financials.monthly_income, 45_000);
        assert!(t.messages[0].text.contains("EMI"));

        let t = run(t.session, Input::text("none"));
        assert_eq!(t.session.stage, Stage::CreditScoreCollection);
        assert_eq!(t.session.financials.existing_monthly_obligation, 0);
        assert_eq!(t.messages[0].options.len(), 5);
    }

    #[test]
    fn good_tier_scenario_produces_offers() {
        let session = at_offers();
        assert_eq!(session.eligibility_score, Some(714));
        assert_eq!(session.credit_tier, Some(CreditTier::Good));
        assert_eq!(session.credit_tier_label, "Good (700-749)");
        assert_eq!(session.offers.len(), 3);
        assert_eq!(session.offers[0].amount(), 750_000);
        assert_eq!(session.offers[0].annual_rate_percent(), dec!(11.50));
        assert_eq!(session.offers[0].tenure_months(), 60);
    }

    #[test]
    fn offers_message_is_a_card_with_income_and_score() {
        let session = feed(
            Session::default(),
            &["yes", "Asha Rao", "Personal Loan", "50000", "0"],
        );
        let t = run(session, Input::text("Good (700-749)"));
        assert_eq!(t.messages.len(), 1);
        assert_eq!(t.messages[0].kind, MessageKind::OfferCards);
        assert!(t.messages[0].text.contains("₹50,000"));
        assert!(t.messages[0].text.contains("714"));
    }

    #[test]
    fn poor_tier_advisory_precedes_offers() {
        let session = feed(
            Session::default(),
            &["yes", "Asha Rao", "Home Loan", "90000", "0"],
        );
        let t = run(session, Input::text("Poor (<650)"));
        assert_eq!(t.session.stage, Stage::OfferGeneration);
        assert_eq!(t.messages.len(), 2);
        assert_eq!(t.messages[0].text, phrase(Language::En, Phrase::CreditScoreAdvisory));
        assert_eq!(t.messages[1].kind, MessageKind::OfferCards);
    }

    #[test]
    fn low_score_is_rejected_with_restart_option() {
        let session = feed(
            Session::default(),
            &["yes", "Asha Rao", "Home Loan", "5000", "0"],
        );
        let t = run(session, Input::text("Poor (<650)"));
        assert_eq!(t.session.eligibility_score, Some(585));
        assert!(t.session.offers.is_empty());
        assert_eq!(t.session.stage, Stage::Rejected);
        assert_eq!(t.messages.len(), 2, "advisory then rejection");
        assert_eq!(t.messages[1].options, vec!["Restart Application"]);
    }

    #[test]
    fn typed_text_during_offers_reprompts() {
        let t = run(at_offers(), Input::text("the first one"));
        assert_eq!(t.session.stage, Stage::OfferGeneration);
        assert!(t.session.selected_offer.is_none());
        assert_eq!(t.messages[0].text, phrase(Language::En, Phrase::SelectOffer));
    }

    #[test]
    fn unknown_offer_id_reprompts() {
        let t = run(at_offers(), Input::choose("opt_9"));
        assert_eq!(t.session.stage, Stage::OfferGeneration);
        assert!(t.session.selected_offer.is_none());
    }

    #[test]
    fn offer_selection_moves_to_mobile() {
        let t = run(at_offers(), Input::choose("opt_2"));
        assert_eq!(t.session.stage, Stage::KycStart);
        assert_eq!(t.session.selected_offer.as_ref().map(|o| o.id()), Some("opt_2"));
    }

    #[test]
    fn offer_selection_elsewhere_is_ignored() {
        let t = run(Session::default(), Input::choose("opt_1"));
        assert_eq!(t.session.stage, Stage::Greeting);
        assert!(t.messages.is_empty());
    }

    #[test]
    fn mobile_validation() {
        let session = run(at_offers(), Input::choose("opt_1")).session;
        let t = run(session, Input::text("1234567890"));
        assert_eq!(t.session.stage, Stage::KycStart);
        assert!(t.session.mobile_number.is_none());

        let t = run(t.session, Input::text("9876543210"));
        assert_eq!(t.session.stage, Stage::KycUpload);
        assert_eq!(t.session.mobile_number.as_deref(), Some("9876543210"));
        assert_eq!(t.messages[0].kind, MessageKind::Upload);
    }

    #[test]
    fn free_text_ignored_during_upload() {
        let t = run(at_upload(), Input::text("hello?"));
        assert_eq!(t.session.stage, Stage::KycUpload);
        assert!(t.messages.is_empty());
        assert!(t.effects.is_empty());
    }

    #[test]
    fn kyc_submission_yields_verify_effect() {
        let session = at_upload();
        let id = session.id;
        let t = run(
            session,
            Input::KycSubmitted(KycSubmission {
                tax_id: " abcde1234f ".into(),
                national_id: "2345 6789 0123".into(),
                document_present: true,
            }),
        );
        assert!(t.messages.is_empty());
        assert_eq!(
            t.effects,
            vec![Effect::VerifyIdentity {
                session_id: id,
                submission: valid_submission(),
            }]
        );
        assert!(matches!(t.session.pending, Some(PendingCall::Identity { .. })));
    }

    #[test]
    fn malformed_kyc_is_rejected_without_attempt() {
        let t = run(
            at_upload(),
            Input::KycSubmitted(KycSubmission {
                tax_id: "ABC123".into(),
                national_id: "123".into(),
                document_present: true,
            }),
        );
        assert!(t.effects.is_empty());
        assert_eq!(t.session.verification_attempts, 0);
        assert_eq!(t.messages[0].kind, MessageKind::Upload);
    }

    #[test]
    fn duplicate_submission_while_pending() {
        let t = run(at_upload(), Input::KycSubmitted(valid_submission()));
        let t = run(t.session, Input::KycSubmitted(valid_submission()));
        assert!(t.effects.is_empty());
        assert_eq!(t.messages[0].text, phrase(Language::En, Phrase::KycInProgress));
    }

    #[test]
    fn kyc_success_moves_to_otp_and_sends_code() {
        let t = run(at_upload(), Input::KycSubmitted(valid_submission()));
        let id = t.session.id;
        let t = run(
            t.session,
            Input::KycVerified {
                session_id: id,
                outcome: VerificationOutcome::passed("ok"),
            },
        );
        assert_eq!(t.session.stage, Stage::OtpVerification);
        assert!(t.session.pending.is_none());
        let kyc = t.session.kyc.as_ref().unwrap();
        assert!(kyc.verified);
        assert_eq!(kyc.tax_id, "ABCDE1234F");
        assert_eq!(t.messages[0].kind, MessageKind::KycSuccess);
        assert_eq!(
            t.effects,
            vec![Effect::SendOneTimeCode {
                session_id: id,
                mobile: "9876543210".into(),
            }]
        );
    }

    #[test]
    fn kyc_failure_reports_reason_and_remaining_attempts() {
        let t = fail_kyc(at_upload());
        assert_eq!(t.session.stage, Stage::KycUpload);
        assert_eq!(t.session.verification_attempts, 1);
        assert!(t.messages[0].text.contains("Reason: Mismatch"));
        assert!(t.messages[0].text.contains("Attempts remaining: 2"));
        assert_eq!(t.messages[0].kind, MessageKind::Upload);
    }

    #[test]
    fn three_failures_lock_the_session() {
        let t = fail_kyc(at_upload());
        let t = fail_kyc(t.session);
        assert_eq!(t.session.stage, Stage::KycUpload);
        let t = fail_kyc(t.session);
        assert_eq!(t.session.stage, Stage::Locked);
        assert_eq!(t.session.verification_attempts, 3);
        assert_eq!(t.messages[0].kind, MessageKind::Error);
        assert_eq!(t.messages[0].options, vec!["Restart Application"]);

        // Nothing but restart moves a locked session.
        let t = run(t.session, Input::text("please"));
        assert_eq!(t.session.stage, Stage::Locked);
        assert!(t.messages.is_empty());
        let t = run(t.session, Input::KycSubmitted(valid_submission()));
        assert_eq!(t.session.stage, Stage::Locked);
        assert!(t.effects.is_empty());
    }

    #[test]
    fn attempt_counter_survives_a_later_success() {
        let t = fail_kyc(at_upload());
        let t = fail_kyc(t.session);
        let t = run(t.session, Input::KycSubmitted(valid_submission()));
        let id = t.session.id;
        let t = run(
            t.session,
            Input::KycVerified {
                session_id: id,
                outcome: VerificationOutcome::passed("ok"),
            },
        );
        assert_eq!(t.session.stage, Stage::OtpVerification);
        assert_eq!(t.session.verification_attempts, 2);
    }

    #[test]
    fn stale_identity_result_is_ignored() {
        let t = run(at_upload(), Input::KycSubmitted(valid_submission()));
        let old_id = t.session.id;
        let restarted = run(t.session, Input::Restart).session;
        let t = run(
            restarted,
            Input::KycVerified {
                session_id: old_id,
                outcome: VerificationOutcome::passed("late"),
            },
        );
        assert_eq!(t.session.stage, Stage::Greeting);
        assert!(t.session.kyc.is_none());
        assert!(t.messages.is_empty());
    }

    #[test]
    fn unsolicited_identity_result_is_ignored() {
        let session = at_upload();
        let id = session.id;
        let t = run(
            session,
            Input::KycVerified {
                session_id: id,
                outcome: VerificationOutcome::failed("x"),
            },
        );
        assert_eq!(t.session.verification_attempts, 0);
        assert!(t.messages.is_empty());
    }

    fn at_otp() -> Session {
        let t = run(at_upload(), Input::KycSubmitted(valid_submission()));
        let id = t.session.id;
        run(
            t.session,
            Input::KycVerified {
                session_id: id,
                outcome: VerificationOutcome::passed("ok"),
            },
        )
        .session
    }

    fn check_otp(session: Session, config: &IntakeConfig, confirmed: bool) -> Transition {
        let t = process_input(session, Input::otp("4321"), config);
        let id = t.session.id;
        process_input(t.session, Input::OtpChecked { session_id: id, confirmed }, config)
    }

    #[test]
    fn malformed_code_is_reprompted_locally() {
        let t = run(at_otp(), Input::otp("12a4"));
        assert!(t.effects.is_empty());
        assert_eq!(t.messages[0].text, "Please enter the 4-digit code.");
        let t = run(t.session, Input::otp("12345"));
        assert!(t.effects.is_empty());
    }

    #[test]
    fn otp_failure_retries_without_cap() {
        let mut session = at_otp();
        for _ in 0..10 {
            let t = check_otp(session, &config(), false);
            assert_eq!(t.session.stage, Stage::OtpVerification);
            assert_eq!(t.messages[0].text, phrase(Language::En, Phrase::OtpFail));
            session = t.session;
        }
        assert_eq!(session.otp_attempts, 10);
    }

    #[test]
    fn otp_cap_locks_when_configured() {
        let capped = IntakeConfig {
            max_otp_attempts: Some(2),
            ..IntakeConfig::default()
        };
        let t = check_otp(at_otp(), &capped, false);
        assert_eq!(t.session.stage, Stage::OtpVerification);
        let t = check_otp(t.session, &capped, false);
        assert_eq!(t.session.stage, Stage::Locked);
    }

    #[test]
    fn otp_success_moves_to_sanction() {
        let t = check_otp(at_otp(), &config(), true);
        assert_eq!(t.session.stage, Stage::SanctionGeneration);
        assert!(t.session.otp_confirmed);
        assert_eq!(t.messages[0].kind, MessageKind::Sanction);
    }

    #[test]
    fn fallback_reply_effect_outside_script() {
        let session = at_otp();
        let id = session.id;
        let t = run(session, Input::text("what is an OTP?"));
        assert_eq!(t.session.stage, Stage::OtpVerification);
        assert!(t.messages.is_empty());
        assert_eq!(
            t.effects,
            vec![Effect::FreeformReply {
                session_id: id,
                stage: Stage::OtpVerification,
                utterance: "what is an OTP?".into(),
                language: Language::En,
            }]
        );
    }

    #[test]
    fn restart_clears_everything() {
        let locked = {
            let t = fail_kyc(at_upload());
            let t = fail_kyc(t.session);
            fail_kyc(t.session).session
        };
        let old_id = locked.id;
        let t = run(locked, Input::Restart);
        assert_eq!(t.session.stage, Stage::Greeting);
        assert_ne!(t.session.id, old_id);
        assert_eq!(t.session.verification_attempts, 0);
        assert!(t.session.offers.is_empty());
        assert!(t.session.selected_offer.is_none());
        assert!(t.session.user_name.is_empty());
        assert_eq!(t.messages, vec![greeting(Language::En)]);
    }

    #[test]
    fn language_switch_keeps_stage() {
        let session = feed(Session::default(), &["yes"]);
        let t = run(session, Input::SetLanguage { language: Language::Hi });
        assert_eq!(t.session.stage, Stage::NameCollection);
        assert_eq!(t.session.language, Language::Hi);
        assert_eq!(t.messages[0].text, "भाषा हिंदी में बदल दी गई है।");

        let t = run(t.session, Input::text("Asha Rao"));
        assert!(t.messages[0].text.starts_with("नमस्ते Asha Rao"));
        assert_eq!(t.messages[0].options[1], "गृह ऋण");
    }

    #[test]
    fn processing_is_deterministic_for_the_engine() {
        let a = at_offers();
        let b = at_offers();
        assert_eq!(a.eligibility_score, b.eligibility_score);
        assert_eq!(a.offers, b.offers);
    }
}
