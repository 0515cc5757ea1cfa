//! Offer generator: turns a score and declared income into concrete loans.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::Serialize;
use tracing::warn;

use super::{CreditTier, Financials, LoanCategory};

/// Scores below this produce no offers at all.
pub const REJECTION_THRESHOLD: u32 = 600;

/// A proposed loan. Immutable once built: the installment is always derived
/// from amount, rate and tenure by [`Offer::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Offer {
    id: String,
    loan_category: String,
    amount: u64,
    annual_rate_percent: Decimal,
    tenure_months: u32,
    installment: u64,
    origination_fee: u64,
}

impl Offer {
    pub fn new(
        id: impl Into<String>,
        loan_category: impl Into<String>,
        amount: u64,
        annual_rate_percent: Decimal,
        tenure_months: u32,
        origination_fee: u64,
    ) -> Self {
        Self {
            id: id.into(),
            loan_category: loan_category.into(),
            amount,
            annual_rate_percent,
            tenure_months,
            installment: installment(amount, annual_rate_percent, tenure_months),
            origination_fee,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn loan_category(&self) -> &str {
        &self.loan_category
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn annual_rate_percent(&self) -> Decimal {
        self.annual_rate_percent
    }

    pub fn tenure_months(&self) -> u32 {
        self.tenure_months
    }

    /// Monthly payment (EMI).
    pub fn installment(&self) -> u64 {
        self.installment
    }

    pub fn origination_fee(&self) -> u64 {
        self.origination_fee
    }

    /// Sum of every installment over the tenure.
    pub fn total_payable(&self) -> u64 {
        self.installment
            .saturating_mul(u64::from(self.tenure_months))
    }

    /// Interest paid over the tenure.
    pub fn total_interest(&self) -> u64 {
        self.total_payable().saturating_sub(self.amount)
    }
}

/// Monthly payment that amortizes `amount` at `annual_rate_percent` over
/// `tenure_months`, rounded to whole rupees.
///
/// `EMI = P × r × (1+r)^n / ((1+r)^n − 1)` with `r = annual / 12 / 100`.
/// A zero rate degrades to `P / n`; a zero tenure returns the principal.
pub fn installment(amount: u64, annual_rate_percent: Decimal, tenure_months: u32) -> u64 {
    if tenure_months == 0 {
        return amount;
    }
    let principal = Decimal::from(amount);
    let months = Decimal::from(tenure_months);
    let monthly_rate = annual_rate_percent / dec!(12) / dec!(100);

    let emi = if monthly_rate.is_zero() {
        principal / months
    } else {
        let growth = (Decimal::ONE + monthly_rate).powu(u64::from(tenure_months));
        principal * monthly_rate * growth / (growth - Decimal::ONE)
    };

    round_rupees(emi).unwrap_or(u64::MAX)
}

/// One row of the offer ladder, relative to the ceiling amount and base rate.
struct OfferVariant {
    id: &'static str,
    amount_factor: Decimal,
    rate_delta: Decimal,
    tenure_months: u32,
    origination_fee: u64,
}

fn offer_ladder() -> [OfferVariant; 3] {
    [
        OfferVariant {
            id: "opt_1",
            amount_factor: Decimal::ONE,
            rate_delta: Decimal::ZERO,
            tenure_months: 60,
            origination_fee: 1000,
        },
        OfferVariant {
            id: "opt_2",
            amount_factor: dec!(0.8),
            rate_delta: dec!(-0.5),
            tenure_months: 48,
            origination_fee: 500,
        },
        OfferVariant {
            id: "opt_3",
            amount_factor: dec!(1.2),
            rate_delta: dec!(1.0),
            tenure_months: 72,
            origination_fee: 2000,
        },
    ]
}

/// Loan ceiling as a multiple of monthly income, by score band.
fn income_multiplier(score: u32) -> u64 {
    if score > 750 {
        20
    } else if score > 700 {
        15
    } else {
        10
    }
}

/// Produce the offer list for a scored applicant.
///
/// Returns either nothing (score below [`REJECTION_THRESHOLD`], or an amount
/// that does not fit in a `u64`) or exactly three offers in the order
/// `opt_1`, `opt_2`, `opt_3`.
pub fn generate_offers(
    financials: &Financials,
    loan_category: &str,
    score: u32,
    tier: CreditTier,
) -> Vec<Offer> {
    if score < REJECTION_THRESHOLD {
        return Vec::new();
    }

    let base_rate = LoanCategory::classify(loan_category).base_rate() + tier.rate_adjustment();
    let ceiling =
        Decimal::from(financials.monthly_income) * Decimal::from(income_multiplier(score));

    let offers = offer_ladder()
        .into_iter()
        .map(|variant| {
            let rate = (base_rate + variant.rate_delta).round_dp(2);
            let amount = round_rupees(ceiling * variant.amount_factor)?;
            Some(Offer::new(
                variant.id,
                loan_category,
                amount,
                rate,
                variant.tenure_months,
                variant.origination_fee,
            ))
        })
        .collect::<Option<Vec<_>>>();

    offers.unwrap_or_else(|| {
        warn!(income = financials.monthly_income, "Loan amount out of range, no offers");
        Vec::new()
    })
}

fn round_rupees(value: Decimal) -> Option<u64> {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
}
