//! Provisional sanction letter issued at the end of a successful intake.

use chrono::{Duration, NaiveDate, Utc};
use rand::Rng;
use serde::Serialize;

use crate::eligibility::Offer;
use crate::error::IntakeError;
use crate::intake::{Session, Stage};
use crate::intake::strings::format_inr;
use crate::validators::mask_mobile;

/// Days a provisional sanction stays valid.
pub const VALIDITY_DAYS: i64 = 30;
/// Reference numbers are `SL-` followed by a number below this.
const REFERENCE_RANGE: u32 = 10_000_000;

/// The document handed to an applicant who cleared every check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SanctionLetter {
    pub reference: String,
    pub issued_on: NaiveDate,
    pub valid_until: NaiveDate,
    pub applicant: String,
    pub mobile: String,
    pub loan_category: String,
    pub offer: Offer,
    pub total_payable: u64,
    pub total_interest: u64,
}

impl SanctionLetter {
    /// Issue a letter for a sanctioned session, dated today with a random
    /// reference.
    pub fn issue(session: &Session) -> Result<Self, IntakeError> {
        let reference = format!("SL-{}", rand::thread_rng().gen_range(0..REFERENCE_RANGE));
        Self::with_reference(session, reference, Utc::now().date_naive())
    }

    /// Issue a letter with a fixed reference and date.
    pub fn with_reference(
        session: &Session,
        reference: impl Into<String>,
        issued_on: NaiveDate,
    ) -> Result<Self, IntakeError> {
        let not_sanctioned = || IntakeError::NotSanctioned {
            stage: session.stage.to_string(),
        };
        if session.stage != Stage::SanctionGeneration || !session.otp_confirmed {
            return Err(not_sanctioned());
        }
        let offer = session.selected_offer.clone().ok_or_else(not_sanctioned)?;

        Ok(Self {
            reference: reference.into(),
            issued_on,
            valid_until: issued_on + Duration::days(VALIDITY_DAYS),
            applicant: session.user_name.clone(),
            mobile: session.mobile_number.clone().unwrap_or_default(),
            loan_category: session.loan_category.clone(),
            total_payable: offer.total_payable(),
            total_interest: offer.total_interest(),
            offer,
        })
    }

    /// Render the letter as Markdown. The mobile number is masked.
    pub fn to_markdown(&self) -> String {
        let offer = &self.offer;
        format!(
            "# Provisional Sanction Letter\n\
             \n\
             **Reference:** {reference}  \n\
             **Date:** {issued}  \n\
             **Valid until:** {valid}\n\
             \n\
             Dear {applicant},\n\
             \n\
             We are pleased to inform you that your application for a {category} has been \
             provisionally sanctioned on the following terms.\n\
             \n\
             | Term | Value |\n\
             |---|---|\n\
             | Loan amount | {amount} |\n\
             | Interest rate | {rate}% p.a. |\n\
             | Tenure | {tenure} months |\n\
             | Monthly EMI | {emi} |\n\
             | Processing fee | {fee} |\n\
             | Total interest | {interest} |\n\
             | Total payable | {payable} |\n\
             \n\
             Registered mobile: {mobile}\n\
             \n\
             This sanction is provisional and subject to final document verification.\n",
            reference = self.reference,
            issued = self.issued_on.format("%d %b %Y"),
            valid = self.valid_until.format("%d %b %Y"),
            applicant = self.applicant,
            category = self.loan_category,
            amount = format_inr(offer.amount()),
            rate = offer.annual_rate_percent(),
            tenure = offer.tenure_months(),
            emi = format_inr(offer.installment()),
            fee = format_inr(offer.origination_fee()),
            interest = format_inr(self.total_interest),
            payable = format_inr(self.total_payable),
            mobile = mask_mobile(&self.mobile),
        )
    }
}
