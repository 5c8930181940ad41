pub mod error;
pub mod models;
pub mod services;

pub use error::BookingError;
pub use models::{CommitOutcome, ProposedAllocation, ProposedInterval, RejectionReason};
pub use services::booking::BookingService;
