// libs/scheduling-cell/src/services/selection.rs
use std::cmp::Ordering;

use tracing::debug;

use shared_utils::time::{compare_iso, from_iso};

use crate::models::{CandidateSlot, DepartmentView, EarliestSelection, SchedulingError, SlotProposal};

/// Reduce a candidate set to the minimal timestamp, keeping every
/// doctor tied at that minimum. Candidates earlier than the current
/// simulation time are skipped. An empty input produces empty lists,
/// which callers must treat as "no slot available".
pub fn find_earliest(
    candidates: impl IntoIterator<Item = CandidateSlot>,
    current_time: &str,
) -> Result<EarliestSelection, SchedulingError> {
    let mut selection = EarliestSelection::default();

    for candidate in candidates {
        if compare_iso(&candidate.start, current_time)? == Ordering::Less {
            continue;
        }

        let Some(best) = selection.timestamps.first() else {
            selection.doctors.push(candidate.doctor);
            selection.timestamps.push(candidate.start);
            continue;
        };

        match compare_iso(&candidate.start, best)? {
            Ordering::Equal => {
                selection.doctors.push(candidate.doctor);
                selection.timestamps.push(candidate.start);
            }
            Ordering::Less => {
                selection.doctors = vec![candidate.doctor];
                selection.timestamps = vec![candidate.start];
            }
            Ordering::Greater => {}
        }
    }

    debug!(
        "earliest selection: {} doctor(s) tied",
        selection.doctors.len()
    );
    Ok(selection)
}

/// Derive a concrete allocation from a selection: the first tied
/// doctor, with `end = start + outpatient_duration` computed in fixed
/// point. Returns `None` when nothing was selected.
pub fn derive_proposal(
    selection: &EarliestSelection,
    view: &DepartmentView,
) -> Result<Option<SlotProposal>, SchedulingError> {
    let (Some(doctor), Some(timestamp)) =
        (selection.doctors.first(), selection.timestamps.first())
    else {
        return Ok(None);
    };

    let info = view
        .doctors
        .get(doctor)
        .ok_or_else(|| SchedulingError::UnknownDoctor(doctor.clone()))?;
    let (date, start) = from_iso(timestamp)?;

    Ok(Some(SlotProposal {
        doctor: doctor.clone(),
        date,
        start,
        end: start + info.outpatient_duration,
    }))
}
