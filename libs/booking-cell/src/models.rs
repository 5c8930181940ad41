// libs/booking-cell/src/models.rs
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use shared_models::BookingRecord;

// ==============================================================================
// PROPOSAL MODELS
// ==============================================================================

/// The `{date, start, end}` body of a proposed allocation, fractional
/// hours in fixed point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProposedInterval {
    pub date: NaiveDate,
    pub start: Decimal,
    pub end: Decimal,
}

/// A structurally valid proposal: exactly one doctor mapped to one
/// interval. Parsed from the untrusted value the external decision
/// process hands back.
#[derive(Debug, Clone, PartialEq)]
pub struct ProposedAllocation {
    pub doctor: String,
    pub slot: ProposedInterval,
}

impl ProposedAllocation {
    /// Structural validation only: the overlap/range/consistency checks
    /// come later and in order. Free text, empty maps, and malformed
    /// bodies are `NotParseable`; more than one doctor key is
    /// `MultipleDoctors`.
    pub fn parse(proposal: &Value) -> Result<Self, RejectionReason> {
        let entries = proposal
            .as_object()
            .filter(|map| !map.is_empty())
            .ok_or(RejectionReason::NotParseable)?;
        if entries.len() > 1 {
            return Err(RejectionReason::MultipleDoctors);
        }

        let (doctor, body) = entries.iter().next().expect("map checked non-empty");
        let slot: ProposedInterval =
            serde_json::from_value(body.clone()).map_err(|_| RejectionReason::NotParseable)?;

        Ok(Self {
            doctor: doctor.clone(),
            slot,
        })
    }
}

// ==============================================================================
// COMMIT OUTCOMES
// ==============================================================================

/// Why a proposal was turned down. Every rejection is an expected,
/// recoverable outcome the caller branches on; none of them mutate the
/// roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    #[error("proposal is not a structured allocation")]
    NotParseable,

    #[error("proposal names more than one doctor")]
    MultipleDoctors,

    #[error("proposal names a doctor absent from the roster")]
    UnknownDoctor,

    #[error("proposed interval lies outside clinic hours")]
    OutOfRange,

    #[error("doctor's department does not match the patient's request")]
    DepartmentMismatch,

    #[error("proposed length does not match the required duration")]
    DurationMismatch,

    #[error("proposed interval overlaps an existing booking")]
    Overlap,
}

/// Result of a commit attempt. Rejections carry the original proposal
/// untouched for diagnostic replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum CommitOutcome {
    Accepted { record: BookingRecord },
    Rejected { reason: RejectionReason, proposal: Value },
}

impl CommitOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, CommitOutcome::Accepted { .. })
    }

    pub fn rejection(&self) -> Option<RejectionReason> {
        match self {
            CommitOutcome::Rejected { reason, .. } => Some(*reason),
            CommitOutcome::Accepted { .. } => None,
        }
    }
}
