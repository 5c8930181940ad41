use thiserror::Error;

use shared_utils::TimeGridError;

/// Infrastructure failures inside the committer. Proposal rejections
/// are not errors; they come back as `CommitOutcome::Rejected` values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BookingError {
    /// A fixed booking already on the calendar failed segment
    /// conversion, which means the roster data itself is corrupt.
    #[error("calendar data error: {0}")]
    Calendar(#[from] TimeGridError),
}
