//! Eligibility engine: a synthetic score from declared financials and credit
//! tier.
//!
//! Everything here is a pure function of its arguments. The loose label
//! matching for credit tiers and loan categories lives in exactly two places,
//! [`CreditTier::classify`] and [`LoanCategory::classify`].

pub mod offers;

pub use offers::{Offer, generate_offers, installment};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Lowest score the engine ever reports.
pub const MIN_SCORE: u32 = 300;
/// Highest score the engine ever reports.
pub const MAX_SCORE: u32 = 900;

const BASE_SCORE: Decimal = dec!(650);
const INCOME_BONUS_FLOOR: Decimal = dec!(20000);
const INCOME_BONUS_CAP: Decimal = dec!(150);

/// Declared monthly financials, in whole rupees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Financials {
    pub monthly_income: u64,
    pub existing_monthly_obligation: u64,
}

/// Self-declared credit band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditTier {
    Excellent,
    Good,
    Fair,
    Poor,
    Unknown,
}

impl CreditTier {
    /// Map a free-text label (usually a button caption) onto a tier.
    ///
    /// Matching is a case-insensitive substring check on the tier word, or a
    /// literal check on the score band so localized captions such as
    /// `"उत्कृष्ट (750+)"` still classify. Checked in order excellent, good,
    /// poor, fair; anything else is `Unknown`.
    pub fn classify(label: &str) -> Self {
        let lower = label.to_lowercase();
        if lower.contains("excellent") || label.contains("750+") {
            Self::Excellent
        } else if lower.contains("good") || label.contains("700-749") {
            Self::Good
        } else if lower.contains("poor") || label.contains("<650") {
            Self::Poor
        } else if lower.contains("fair") || label.contains("650-699") {
            Self::Fair
        } else {
            Self::Unknown
        }
    }

    /// Multiplier applied to the running score total.
    pub fn score_multiplier(&self) -> Decimal {
        match self {
            Self::Excellent => dec!(1.10),
            Self::Good => dec!(1.05),
            Self::Poor => dec!(0.90),
            Self::Fair | Self::Unknown => Decimal::ONE,
        }
    }

    /// Adjustment in percentage points applied to the base annual rate.
    pub fn rate_adjustment(&self) -> Decimal {
        match self {
            Self::Excellent => dec!(-0.5),
            Self::Poor => dec!(0.5),
            Self::Good | Self::Fair | Self::Unknown => Decimal::ZERO,
        }
    }
}

impl std::fmt::Display for CreditTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
            Self::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// Product family inferred from the free-text loan category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanCategory {
    Home,
    Personal,
    Other,
}

impl LoanCategory {
    /// Classify a loan-type label. English and Hindi button captions are
    /// recognized; business, education and anything typed freely is `Other`.
    pub fn classify(label: &str) -> Self {
        let lower = label.to_lowercase();
        if lower.contains("home") || label.contains("गृह") {
            Self::Home
        } else if lower.contains("personal") || label.contains("व्यक्तिगत") {
            Self::Personal
        } else {
            Self::Other
        }
    }

    /// Base annual interest rate, percent.
    pub fn base_rate(&self) -> Decimal {
        match self {
            Self::Home => dec!(8.5),
            Self::Personal => dec!(11.5),
            Self::Other => dec!(10.0),
        }
    }
}

/// Compute the eligibility score, always within [`MIN_SCORE`, `MAX_SCORE`].
///
/// 650 base, plus one point per ₹1000 of income above ₹20,000 (at most 150),
/// minus two points per ₹1000 of existing obligations, then scaled by the
/// tier multiplier and rounded half away from zero.
pub fn score(financials: &Financials, tier: CreditTier) -> u32 {
    let income = Decimal::from(financials.monthly_income);
    let income_bonus = ((income - INCOME_BONUS_FLOOR) / dec!(1000))
        .max(Decimal::ZERO)
        .min(INCOME_BONUS_CAP);
    let obligation_penalty =
        Decimal::from(financials.existing_monthly_obligation) / dec!(1000) * dec!(2);

    let raw = (BASE_SCORE + income_bonus - obligation_penalty) * tier.score_multiplier();
    raw.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .clamp(Decimal::from(MIN_SCORE), Decimal::from(MAX_SCORE))
        .to_u32()
        .unwrap_or(MIN_SCORE)
}
