// libs/shared/models/src/roster.rs
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

// ==============================================================================
// DOCTOR CALENDAR MODELS
// ==============================================================================

/// A previously committed, already-occupied `[start, end)` interval on a
/// doctor's calendar, in fractional hours. Serialized as a two-element
/// array `[start, end]` to match the roster wire shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(Decimal, Decimal)", into = "(Decimal, Decimal)")]
pub struct BookedInterval {
    pub start: Decimal,
    pub end: Decimal,
}

impl BookedInterval {
    pub fn new(start: Decimal, end: Decimal) -> Self {
        Self { start, end }
    }
}

impl From<(Decimal, Decimal)> for BookedInterval {
    fn from((start, end): (Decimal, Decimal)) -> Self {
        Self { start, end }
    }
}

impl From<BookedInterval> for (Decimal, Decimal) {
    fn from(interval: BookedInterval) -> Self {
        (interval.start, interval.end)
    }
}

/// Per-date fixed bookings for one doctor. Dates are kept ordered so
/// filter strategies iterate them ascending without re-sorting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DoctorCalendar {
    days: BTreeMap<NaiveDate, Vec<BookedInterval>>,
}

impl DoctorCalendar {
    pub fn new(days: BTreeMap<NaiveDate, Vec<BookedInterval>>) -> Self {
        Self { days }
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days.keys().copied()
    }

    pub fn booked_on(&self, date: NaiveDate) -> &[BookedInterval] {
        self.days.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn days(&self) -> &BTreeMap<NaiveDate, Vec<BookedInterval>> {
        &self.days
    }

    /// Total committed appointments across all dates.
    pub fn booking_count(&self) -> usize {
        self.days.values().map(Vec::len).sum()
    }

    pub fn append(&mut self, date: NaiveDate, interval: BookedInterval) {
        self.days.entry(date).or_default().push(interval);
    }
}

// ==============================================================================
// ROSTER MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorProfile {
    pub department: String,
    /// Patients per day this doctor can take.
    pub capacity: u32,
    /// Appointments per hour; the outpatient duration derives from it.
    pub capacity_per_hour: Decimal,
}

impl DoctorProfile {
    /// Fixed appointment length in fractional hours.
    pub fn outpatient_duration(&self) -> Decimal {
        Decimal::ONE / self.capacity_per_hour
    }
}

/// Wire shape of one roster entry, as supplied by the simulation
/// environment: `{department, capacity, capacity_per_hour, schedule}`.
#[derive(Debug, Clone, Deserialize)]
pub struct DoctorInfo {
    pub department: String,
    pub capacity: u32,
    pub capacity_per_hour: Decimal,
    #[serde(default)]
    pub schedule: BTreeMap<NaiveDate, Vec<BookedInterval>>,
}

/// One doctor's live state: an immutable profile and the mutable
/// calendar behind a per-doctor lock. The lock is the single-writer
/// resource the commit step serializes on; filters only hold it long
/// enough to clone a snapshot.
#[derive(Debug)]
pub struct DoctorRecord {
    pub profile: DoctorProfile,
    calendar: Mutex<DoctorCalendar>,
}

impl DoctorRecord {
    pub fn new(profile: DoctorProfile, calendar: DoctorCalendar) -> Self {
        Self {
            profile,
            calendar: Mutex::new(calendar),
        }
    }

    /// Clone the calendar under a short lock. Reads never block commits
    /// for longer than the copy takes.
    pub async fn calendar_snapshot(&self) -> DoctorCalendar {
        self.calendar.lock().await.clone()
    }

    /// Exclusive access for the validate-then-append commit step.
    pub async fn lock_calendar(&self) -> MutexGuard<'_, DoctorCalendar> {
        self.calendar.lock().await
    }
}

/// The shared doctor roster. Doctors are keyed by their display id
/// (e.g. "Dr. Kim"); entries are reference-counted so concurrent
/// scheduling pipelines can hold onto a doctor across await points.
#[derive(Debug, Default)]
pub struct HospitalRoster {
    doctors: HashMap<String, Arc<DoctorRecord>>,
}

impl HospitalRoster {
    pub fn new(doctors: HashMap<String, Arc<DoctorRecord>>) -> Self {
        Self { doctors }
    }

    /// Build the live roster from its wire shape.
    pub fn from_info(info: HashMap<String, DoctorInfo>) -> Self {
        let doctors = info
            .into_iter()
            .map(|(id, entry)| {
                let profile = DoctorProfile {
                    department: entry.department,
                    capacity: entry.capacity,
                    capacity_per_hour: entry.capacity_per_hour,
                };
                let calendar = DoctorCalendar::new(entry.schedule);
                (id, Arc::new(DoctorRecord::new(profile, calendar)))
            })
            .collect();
        Self { doctors }
    }

    pub fn get(&self, doctor_id: &str) -> Option<&Arc<DoctorRecord>> {
        self.doctors.get(doctor_id)
    }

    pub fn contains(&self, doctor_id: &str) -> bool {
        self.doctors.contains_key(doctor_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Arc<DoctorRecord>)> {
        self.doctors.iter()
    }

    pub fn len(&self) -> usize {
        self.doctors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doctors.is_empty()
    }
}

// ==============================================================================
// BOOKING RECORD
// ==============================================================================

/// The durable outcome of a successful commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub id: Uuid,
    pub patient_id: String,
    pub doctor_id: String,
    pub department: String,
    pub date: NaiveDate,
    pub start: Decimal,
    pub end: Decimal,
}
