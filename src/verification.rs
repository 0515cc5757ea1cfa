//! Identity and one-time-code verification collaborator.
//!
//! The intake core only sees the request/response shapes defined here. The
//! [`MockVerificationBackend`] is the reference implementation used by the
//! binary and the tests; a real deployment would plug in its own
//! [`IdentityVerifier`].

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::VerificationError;
use crate::validators::{is_valid_tax_id, mask_mobile};

/// Fields collected by the KYC form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KycSubmission {
    pub tax_id: String,
    pub national_id: String,
    pub document_present: bool,
}

/// What the identity check decided. `reason` is shown to the applicant verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub success: bool,
    pub reason: String,
}

impl VerificationOutcome {
    pub fn passed(reason: impl Into<String>) -> Self {
        Self {
            success: true,
            reason: reason.into(),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            reason: reason.into(),
        }
    }
}

/// Backend that checks identity documents and one-time codes.
///
/// Every method must be safe to call repeatedly; the intake flow retries
/// identity checks after a failure.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Check the submitted documents.
    async fn verify_identity(
        &self,
        submission: &KycSubmission,
    ) -> Result<VerificationOutcome, VerificationError>;

    /// Send a one-time code to the applicant's mobile.
    async fn send_one_time_code(&self, mobile: &str) -> Result<(), VerificationError>;

    /// Check a code the applicant typed back.
    async fn confirm_one_time_code(&self, code: &str) -> Result<bool, VerificationError>;
}

/// Tax ID that the mock backend always flags.
pub const SUSPICIOUS_TAX_ID: &str = "ABCDE0000F";
/// The code the mock backend "sends".
pub const REFERENCE_OTP: &str = "1234";

/// Simulated network delays for the mock backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockLatency {
    pub verify_identity: Duration,
    pub send_code: Duration,
    pub confirm_code: Duration,
}

impl MockLatency {
    /// No artificial delay.
    pub fn none() -> Self {
        Self {
            verify_identity: Duration::ZERO,
            send_code: Duration::ZERO,
            confirm_code: Duration::ZERO,
        }
    }
}

impl Default for MockLatency {
    fn default() -> Self {
        Self {
            verify_identity: Duration::from_millis(2000),
            send_code: Duration::from_millis(1000),
            confirm_code: Duration::from_millis(500),
        }
    }
}

/// In-process stand-in for the bank's verification service.
#[derive(Debug, Clone, Default)]
pub struct MockVerificationBackend {
    latency: MockLatency,
}

impl MockVerificationBackend {
    pub fn new(latency: MockLatency) -> Self {
        Self { latency }
    }

    /// Backend with no simulated delay.
    pub fn instant() -> Self {
        Self::new(MockLatency::none())
    }
}

async fn simulate_latency(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[async_trait]
impl IdentityVerifier for MockVerificationBackend {
    async fn verify_identity(
        &self,
        submission: &KycSubmission,
    ) -> Result<VerificationOutcome, VerificationError> {
        simulate_latency(self.latency.verify_identity).await;

        if submission.tax_id == SUSPICIOUS_TAX_ID {
            return Ok(VerificationOutcome::failed(
                "Backend Verification Failed: Suspicious PAN",
            ));
        }

        // The backend only checks for 12 digits; the leading-digit rule is a
        // form-side check.
        let national_id_ok = submission.national_id.len() == 12
            && submission.national_id.chars().all(|c| c.is_ascii_digit());

        if is_valid_tax_id(&submission.tax_id) && national_id_ok && submission.document_present {
            Ok(VerificationOutcome::passed("Verification Successful"))
        } else {
            Ok(VerificationOutcome::failed(
                "Invalid Document Format or Missing Data",
            ))
        }
    }

    async fn send_one_time_code(&self, mobile: &str) -> Result<(), VerificationError> {
        simulate_latency(self.latency.send_code).await;
        tracing::info!(mobile = %mask_mobile(mobile), "One-time code sent");
        Ok(())
    }

    async fn confirm_one_time_code(&self, code: &str) -> Result<bool, VerificationError> {
        simulate_latency(self.latency.confirm_code).await;
        Ok(code == REFERENCE_OTP)
    }
}
