// libs/scheduling-cell/src/services/availability.rs
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use chrono::{FixedOffset, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use shared_config::TimeGrid;
use shared_models::{BookedInterval, HospitalRoster, PatientCondition};
use shared_utils::time::{compare_iso, group_consecutive, interval_to_segments, to_iso};

use crate::models::{
    AvailabilityFilter, CandidateSlot, DepartmentView, DoctorScheduleView, SchedulingError,
};

/// Candidate-slot search over the department-filtered roster.
///
/// Holds the calendar grid and the simulation's UTC offset; the current
/// simulation time is an immutable per-call input.
pub struct AvailabilityService {
    grid: TimeGrid,
    utc_offset: FixedOffset,
}

impl AvailabilityService {
    pub fn new(grid: TimeGrid, utc_offset: FixedOffset) -> Self {
        Self { grid, utc_offset }
    }

    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    /// Snapshot the roster for one department. Runs once per query,
    /// upstream of every filter strategy; each doctor's calendar is
    /// cloned under a short lock so the filters themselves never touch
    /// shared state.
    pub async fn department_view(
        &self,
        roster: &HospitalRoster,
        department: &str,
    ) -> DepartmentView {
        let mut doctors = BTreeMap::new();
        for (id, record) in roster.iter() {
            if record.profile.department != department {
                continue;
            }
            let calendar = record.calendar_snapshot().await;
            let workload_percent = if record.profile.capacity == 0 {
                Decimal::ZERO
            } else {
                (Decimal::from(calendar.booking_count())
                    / Decimal::from(record.profile.capacity)
                    * Decimal::from(100))
                .round_dp(2)
            };
            doctors.insert(
                id.clone(),
                DoctorScheduleView {
                    outpatient_duration: record.profile.outpatient_duration(),
                    workload_percent,
                    schedule: calendar.days().clone(),
                },
            );
        }

        debug!(
            "department view for {}: {} of {} doctors",
            department,
            doctors.len(),
            roster.len()
        );
        DepartmentView {
            department: department.to_string(),
            doctors,
        }
    }

    /// Run one filter strategy against the view. The strategy set is
    /// closed; this match is the single dispatch point.
    pub fn run_filter(
        &self,
        view: &DepartmentView,
        filter: &AvailabilityFilter,
        current_time: &str,
    ) -> Result<HashSet<CandidateSlot>, SchedulingError> {
        match filter {
            AvailabilityFilter::Unfiltered => self.unfiltered(view, current_time),
            AvailabilityFilter::Physician { name } => {
                self.physician_filter(view, name, current_time)
            }
            AvailabilityFilter::ValidFrom { date } => self.date_filter(view, *date, current_time),
        }
    }

    /// All candidates for every doctor in the view, dates ascending.
    pub fn unfiltered(
        &self,
        view: &DepartmentView,
        current_time: &str,
    ) -> Result<HashSet<CandidateSlot>, SchedulingError> {
        let mut candidates = HashSet::new();
        for (doctor, info) in &view.doctors {
            let required = self.required_segments(info.outpatient_duration)?;
            for (date, booked) in &info.schedule {
                self.day_candidates(doctor, *date, booked, required, current_time, &mut candidates)?;
            }
        }
        Ok(candidates)
    }

    /// Candidates restricted to a single named doctor. Names are given
    /// the "Dr." honorific when the caller omits it.
    pub fn physician_filter(
        &self,
        view: &DepartmentView,
        preferred_doctor: &str,
        current_time: &str,
    ) -> Result<HashSet<CandidateSlot>, SchedulingError> {
        let (doctor, info) = self
            .resolve_physician(view, preferred_doctor)
            .ok_or_else(|| {
                warn!(
                    "physician filter: {} not found in department {}",
                    preferred_doctor, view.department
                );
                SchedulingError::UnknownDoctor(preferred_doctor.to_string())
            })?;

        let mut candidates = HashSet::new();
        let required = self.required_segments(info.outpatient_duration)?;
        for (date, booked) in &info.schedule {
            self.day_candidates(doctor, *date, booked, required, current_time, &mut candidates)?;
        }
        Ok(candidates)
    }

    /// Candidates on dates at or after `valid_from`, all doctors.
    pub fn date_filter(
        &self,
        view: &DepartmentView,
        valid_from: NaiveDate,
        current_time: &str,
    ) -> Result<HashSet<CandidateSlot>, SchedulingError> {
        let mut candidates = HashSet::new();
        for (doctor, info) in &view.doctors {
            let required = self.required_segments(info.outpatient_duration)?;
            for (date, booked) in info.schedule.range(valid_from..) {
                self.day_candidates(doctor, *date, booked, required, current_time, &mut candidates)?;
            }
        }
        Ok(candidates)
    }

    /// Combine filter results per the patient's active preferences:
    /// none active uses the unfiltered search, one active uses that
    /// filter, both active intersect. An empty intersection is a valid
    /// "no slot satisfies both" outcome and is never widened.
    pub async fn find_candidates(
        &self,
        roster: &HospitalRoster,
        condition: &PatientCondition,
        current_time: &str,
    ) -> Result<HashSet<CandidateSlot>, SchedulingError> {
        let view = self.department_view(roster, &condition.department).await;

        let physician = || -> Result<AvailabilityFilter, SchedulingError> {
            let name = condition
                .preferred_doctor
                .clone()
                .ok_or(SchedulingError::MissingPreferredDoctor)?;
            Ok(AvailabilityFilter::Physician { name })
        };
        let valid_from = || -> Result<AvailabilityFilter, SchedulingError> {
            let date = condition
                .valid_from
                .ok_or(SchedulingError::MissingValidFrom)?;
            Ok(AvailabilityFilter::ValidFrom { date })
        };

        let candidates = match (condition.wants_doctor(), condition.wants_date()) {
            (false, false) => self.run_filter(&view, &AvailabilityFilter::Unfiltered, current_time)?,
            (true, false) => self.run_filter(&view, &physician()?, current_time)?,
            (false, true) => self.run_filter(&view, &valid_from()?, current_time)?,
            (true, true) => {
                let by_doctor = self.run_filter(&view, &physician()?, current_time)?;
                let by_date = self.run_filter(&view, &valid_from()?, current_time)?;
                by_doctor.intersection(&by_date).cloned().collect()
            }
        };

        debug!(
            "candidate query for department {}: {} slots",
            condition.department,
            candidates.len()
        );
        Ok(candidates)
    }

    // ==============================================================================
    // PRIVATE HELPER METHODS
    // ==============================================================================

    /// Free-run search for one doctor on one date. Occupied segments
    /// come from the fixed bookings; every window of `required`
    /// consecutive free segments yields one candidate, kept only when
    /// its start is not before the current simulation time.
    fn day_candidates(
        &self,
        doctor: &str,
        date: NaiveDate,
        booked: &[BookedInterval],
        required: usize,
        current_time: &str,
        candidates: &mut HashSet<CandidateSlot>,
    ) -> Result<(), SchedulingError> {
        let mut occupied: HashSet<usize> = HashSet::new();
        for interval in booked {
            occupied.extend(interval_to_segments(&self.grid, interval.start, interval.end)?);
        }
        let free: Vec<usize> = (0..self.grid.segment_count())
            .filter(|index| !occupied.contains(index))
            .collect();

        for run in group_consecutive(&free) {
            if run.len() < required {
                continue;
            }
            for window in run.windows(required) {
                let start_hour = self.grid.segment_start(window[0]);
                let start_iso = to_iso(start_hour, date, self.utc_offset)?;
                if compare_iso(&start_iso, current_time)? != Ordering::Less {
                    candidates.insert(CandidateSlot::new(doctor, start_iso));
                }
            }
        }
        Ok(())
    }

    fn required_segments(&self, duration: Decimal) -> Result<usize, SchedulingError> {
        let ratio = duration / self.grid.interval_hour();
        if !ratio.fract().is_zero() {
            return Err(SchedulingError::NonIntegralSlotCount {
                duration,
                interval: self.grid.interval_hour(),
            });
        }
        ratio
            .to_usize()
            .filter(|&count| count > 0)
            .ok_or(SchedulingError::NonIntegralSlotCount {
                duration,
                interval: self.grid.interval_hour(),
            })
    }

    fn resolve_physician<'a>(
        &self,
        view: &'a DepartmentView,
        name: &str,
    ) -> Option<(&'a str, &'a DoctorScheduleView)> {
        if let Some((key, info)) = view.doctors.get_key_value(name) {
            return Some((key.as_str(), info));
        }
        if !name.contains("Dr.") {
            let prefixed = format!("Dr. {name}");
            if let Some((key, info)) = view.doctors.get_key_value(&prefixed) {
                return Some((key.as_str(), info));
            }
        }
        None
    }
}
