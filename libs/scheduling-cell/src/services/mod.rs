pub mod availability;
pub mod selection;

pub use availability::AvailabilityService;
pub use selection::{derive_proposal, find_earliest};
