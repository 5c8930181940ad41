// libs/shared/utils/src/test_utils.rs
//
// Fixtures shared by the cells' test suites.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{FixedOffset, NaiveDate};
use rust_decimal::Decimal;

use shared_config::TimeGrid;
use shared_models::{BookedInterval, DoctorInfo, HospitalRoster, PatientCondition};

/// Parse a decimal hour literal; panics on bad input, which is what a
/// fixture should do.
pub fn hours(literal: &str) -> Decimal {
    Decimal::from_str(literal).unwrap()
}

pub fn date(literal: &str) -> NaiveDate {
    NaiveDate::from_str(literal).unwrap()
}

/// The canonical 16-segment clinic day: 09:00-17:00 in half-hour steps.
pub fn sample_grid() -> TimeGrid {
    TimeGrid::new(hours("9"), hours("17"), hours("0.5")).unwrap()
}

pub fn seoul_offset() -> FixedOffset {
    FixedOffset::east_opt(9 * 3600).unwrap()
}

/// Build a roster from `(doctor_id, department, capacity_per_hour,
/// [(date, [[start, end], ...]), ...])` tuples. Daily capacity defaults
/// to 16, the segment count of the sample grid.
pub fn roster_from(
    doctors: &[(&str, &str, &str, &[(&str, &[(&str, &str)])])],
) -> HospitalRoster {
    let mut info = HashMap::new();
    for (id, department, capacity_per_hour, days) in doctors {
        let schedule = days
            .iter()
            .map(|(day, intervals)| {
                let booked: Vec<BookedInterval> = intervals
                    .iter()
                    .map(|(lo, hi)| (hours(lo), hours(hi)).into())
                    .collect();
                (date(day), booked)
            })
            .collect();
        info.insert(
            id.to_string(),
            DoctorInfo {
                department: department.to_string(),
                capacity: 16,
                capacity_per_hour: hours(capacity_per_hour),
                schedule,
            },
        );
    }
    HospitalRoster::from_info(info)
}

/// A cardiology patient needing a one-hour visit, no preferences.
pub fn cardiology_condition() -> PatientCondition {
    PatientCondition {
        department: "Cardiology".to_string(),
        duration: hours("1"),
        preference: Vec::new(),
        preferred_doctor: None,
        valid_from: None,
    }
}
