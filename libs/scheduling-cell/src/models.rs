// libs/scheduling-cell/src/models.rs
use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use shared_models::BookedInterval;
use shared_utils::TimeGridError;

// ==============================================================================
// CANDIDATE MODELS
// ==============================================================================

/// The earliest moment a contiguous free run long enough for the
/// required duration begins, for one doctor on one date. Ephemeral:
/// computed fresh per query, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateSlot {
    pub doctor: String,
    /// ISO-8601 timestamp of the slot start.
    pub start: String,
}

impl CandidateSlot {
    pub fn new(doctor: impl Into<String>, start: impl Into<String>) -> Self {
        Self {
            doctor: doctor.into(),
            start: start.into(),
        }
    }
}

/// The three candidate-search strategies. A closed set: every site that
/// combines results matches on it exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum AvailabilityFilter {
    Unfiltered,
    Physician { name: String },
    ValidFrom { date: NaiveDate },
}

/// Every doctor whose candidate timestamp equals the minimum, with the
/// timestamps kept parallel. Ties produce multiple entries; conflict
/// resolution between tied doctors belongs to the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EarliestSelection {
    pub doctors: Vec<String>,
    pub timestamps: Vec<String>,
}

impl EarliestSelection {
    pub fn is_empty(&self) -> bool {
        self.doctors.is_empty()
    }
}

// ==============================================================================
// DEPARTMENT VIEW
// ==============================================================================

/// One doctor's schedule as the filter strategies see it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DoctorScheduleView {
    pub outpatient_duration: Decimal,
    /// Booked appointments against daily capacity, as a percentage.
    pub workload_percent: Decimal,
    pub schedule: BTreeMap<NaiveDate, Vec<BookedInterval>>,
}

/// Department-filtered snapshot of the roster. Built once per query,
/// upstream of every filter strategy; identity fields with no
/// scheduling role are absent by construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DepartmentView {
    pub department: String,
    pub doctors: BTreeMap<String, DoctorScheduleView>,
}

// ==============================================================================
// PROPOSAL DERIVATION
// ==============================================================================

/// A concrete allocation derived from an earliest selection:
/// `{doctor: {date, start, end}}` once serialized. The decision process
/// may hand this back to the committer, or produce its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotProposal {
    pub doctor: String,
    pub date: NaiveDate,
    pub start: Decimal,
    pub end: Decimal,
}

impl SlotProposal {
    /// The wire shape consumed by the booking committer.
    pub fn to_value(&self) -> Value {
        let body = json!({
            "date": self.date,
            "start": self.start,
            "end": self.end,
        });
        let mut proposal = serde_json::Map::new();
        proposal.insert(self.doctor.clone(), body);
        Value::Object(proposal)
    }
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchedulingError {
    #[error("doctor {0} is not in the department-filtered roster")]
    UnknownDoctor(String),

    #[error("doctor preference is active but no preferred doctor was given")]
    MissingPreferredDoctor,

    #[error("date preference is active but no valid-from date was given")]
    MissingValidFrom,

    #[error("duration {duration}h is not a whole number of {interval}h segments")]
    NonIntegralSlotCount { duration: Decimal, interval: Decimal },

    #[error(transparent)]
    Grid(#[from] TimeGridError),
}
