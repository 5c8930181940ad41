pub mod models;
pub mod services;

pub use models::{
    AvailabilityFilter, CandidateSlot, DepartmentView, DoctorScheduleView, EarliestSelection,
    SchedulingError, SlotProposal,
};
pub use services::availability::AvailabilityService;
pub use services::selection::{derive_proposal, find_earliest};
