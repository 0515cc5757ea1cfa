//! Loan Assist: conversational loan intake core.

pub mod config;
pub mod eligibility;
pub mod error;
pub mod intake;
pub mod reply;
pub mod routes;
pub mod sanction;
pub mod telemetry;
pub mod validators;
pub mod verification;
