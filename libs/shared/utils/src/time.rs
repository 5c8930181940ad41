// libs/shared/utils/src/time.rs
//
// Segment codec for the discretized daily calendar: conversions between
// fractional hours, segment indices, and ISO-8601 timestamps with a
// fixed UTC offset. All hour arithmetic is fixed-point decimal.

use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Timelike};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use thiserror::Error;

use shared_config::TimeGrid;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimeGridError {
    #[error("invalid interval [{lo}, {hi}) for the configured grid")]
    InvalidInterval { lo: Decimal, hi: Decimal },

    #[error("segment run is empty")]
    EmptyRun,

    #[error("segment run is not contiguous")]
    NonContiguousRun,

    #[error("hour {0} does not map onto a time of day")]
    InvalidHour(Decimal),

    #[error("invalid ISO timestamp: {0}")]
    InvalidTimestamp(String),
}

/// The enumerated grid: one index per segment.
pub fn segment_indices(grid: &TimeGrid) -> Vec<usize> {
    (0..grid.segment_count()).collect()
}

/// Indices of segments fully covered by `[lo, hi)`. Used to mark fixed
/// bookings as occupied.
pub fn interval_to_segments(
    grid: &TimeGrid,
    lo: Decimal,
    hi: Decimal,
) -> Result<Vec<usize>, TimeGridError> {
    if lo >= hi || lo < grid.start_hour() || hi > grid.end_hour() {
        return Err(TimeGridError::InvalidInterval { lo, hi });
    }

    let covered = (0..grid.segment_count())
        .filter(|&i| grid.segment_start(i) >= lo && grid.segment_end(i) <= hi)
        .collect();
    Ok(covered)
}

/// Inverse of `interval_to_segments` for a contiguous run: the covered
/// `[lo, hi)` interval plus the number of occupied segments.
pub fn segments_to_interval(
    grid: &TimeGrid,
    run: &[usize],
) -> Result<((Decimal, Decimal), usize), TimeGridError> {
    let first = *run.first().ok_or(TimeGridError::EmptyRun)?;
    let last = *run.last().expect("non-empty run has a last element");
    if run.windows(2).any(|w| w[1] != w[0] + 1) {
        return Err(TimeGridError::NonContiguousRun);
    }

    Ok(((grid.segment_start(first), grid.segment_end(last)), run.len()))
}

/// Group sorted segment indices into maximal runs of consecutive
/// indices.
pub fn group_consecutive(indices: &[usize]) -> Vec<Vec<usize>> {
    let mut runs: Vec<Vec<usize>> = Vec::new();
    for &index in indices {
        match runs.last_mut() {
            Some(run) if *run.last().expect("runs are never empty") + 1 == index => {
                run.push(index);
            }
            _ => runs.push(vec![index]),
        }
    }
    runs
}

/// Render a fractional hour on a date as an ISO-8601 timestamp with the
/// given fixed offset, e.g. `2024-01-10T10:00:00+09:00`.
pub fn to_iso(hour: Decimal, date: NaiveDate, offset: FixedOffset) -> Result<String, TimeGridError> {
    let seconds = (hour * Decimal::from(3600))
        .round()
        .to_u32()
        .filter(|&s| s < 86_400)
        .ok_or(TimeGridError::InvalidHour(hour))?;
    let time = NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0)
        .ok_or(TimeGridError::InvalidHour(hour))?;

    let local = date.and_time(time);
    let stamped: DateTime<FixedOffset> = DateTime::from_naive_utc_and_offset(
        local - chrono::Duration::seconds(offset.local_minus_utc() as i64),
        offset,
    );
    Ok(stamped.to_rfc3339_opts(chrono::SecondsFormat::Secs, false))
}

/// Split an ISO-8601 timestamp back into its local date and fractional
/// hour-of-day. Exact inverse of `to_iso` at the grid's precision.
pub fn from_iso(timestamp: &str) -> Result<(NaiveDate, Decimal), TimeGridError> {
    let parsed = DateTime::parse_from_rfc3339(timestamp)
        .map_err(|_| TimeGridError::InvalidTimestamp(timestamp.to_string()))?;
    let hour = Decimal::from(parsed.time().num_seconds_from_midnight()) / Decimal::from(3600);
    Ok((parsed.date_naive(), hour))
}

/// Compare two ISO timestamps as instants. Offsets are normalized
/// before comparison, so timestamps carrying different offsets still
/// order correctly.
pub fn compare_iso(a: &str, b: &str) -> Result<Ordering, TimeGridError> {
    let lhs = DateTime::parse_from_rfc3339(a)
        .map_err(|_| TimeGridError::InvalidTimestamp(a.to_string()))?;
    let rhs = DateTime::parse_from_rfc3339(b)
        .map_err(|_| TimeGridError::InvalidTimestamp(b.to_string()))?;
    Ok(lhs.cmp(&rhs))
}
