// libs/booking-cell/src/services/booking.rs
use std::collections::HashSet;

use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::TimeGrid;
use shared_models::{BookedInterval, BookingRecord, HospitalRoster, PatientCondition};
use shared_utils::time::interval_to_segments;

use crate::error::BookingError;
use crate::models::{CommitOutcome, ProposedAllocation, RejectionReason};

/// Validates an externally proposed allocation and, when every check
/// passes, appends it to the doctor's calendar.
///
/// Checks run in a fixed order and short-circuit on the first failure;
/// the overlap check and the append happen under the doctor's calendar
/// lock, so two racing commits can never both pass validation against a
/// stale snapshot. Mutation is the last step on the success path only.
pub struct BookingService {
    grid: TimeGrid,
}

impl BookingService {
    pub fn new(grid: TimeGrid) -> Self {
        Self { grid }
    }

    pub async fn commit(
        &self,
        proposal: serde_json::Value,
        patient_id: &str,
        condition: &PatientCondition,
        roster: &HospitalRoster,
    ) -> Result<CommitOutcome, BookingError> {
        // 1. Structural.
        let allocation = match ProposedAllocation::parse(&proposal) {
            Ok(allocation) => allocation,
            Err(reason) => {
                warn!("rejecting proposal for {}: {}", patient_id, reason);
                return Ok(CommitOutcome::Rejected { reason, proposal });
            }
        };
        let slot = allocation.slot;

        // 2. Range.
        if slot.start >= slot.end
            || slot.start < self.grid.start_hour()
            || slot.end > self.grid.end_hour()
        {
            return Ok(CommitOutcome::Rejected {
                reason: RejectionReason::OutOfRange,
                proposal,
            });
        }

        let Some(record) = roster.get(&allocation.doctor) else {
            return Ok(CommitOutcome::Rejected {
                reason: RejectionReason::UnknownDoctor,
                proposal,
            });
        };

        // 3. Consistency.
        if record.profile.department != condition.department {
            return Ok(CommitOutcome::Rejected {
                reason: RejectionReason::DepartmentMismatch,
                proposal,
            });
        }
        if slot.end - slot.start != condition.duration {
            return Ok(CommitOutcome::Rejected {
                reason: RejectionReason::DurationMismatch,
                proposal,
            });
        }

        // 4. Overlap, checked and resolved under the doctor's lock.
        let proposed_segments = interval_to_segments(&self.grid, slot.start, slot.end)?;
        let mut calendar = record.lock_calendar().await;

        let mut occupied: HashSet<usize> = HashSet::new();
        for booked in calendar.booked_on(slot.date) {
            occupied.extend(interval_to_segments(&self.grid, booked.start, booked.end)?);
        }
        if proposed_segments.iter().any(|segment| occupied.contains(segment)) {
            drop(calendar);
            debug!(
                "overlap: {} already booked on {} around [{}, {})",
                allocation.doctor, slot.date, slot.start, slot.end
            );
            return Ok(CommitOutcome::Rejected {
                reason: RejectionReason::Overlap,
                proposal,
            });
        }

        calendar.append(slot.date, BookedInterval::new(slot.start, slot.end));
        drop(calendar);

        info!(
            "booked {} with {} on {} [{}, {})",
            patient_id, allocation.doctor, slot.date, slot.start, slot.end
        );
        Ok(CommitOutcome::Accepted {
            record: BookingRecord {
                id: Uuid::new_v4(),
                patient_id: patient_id.to_string(),
                doctor_id: allocation.doctor,
                department: record.profile.department.clone(),
                date: slot.date,
                start: slot.start,
                end: slot.end,
            },
        })
    }
}
