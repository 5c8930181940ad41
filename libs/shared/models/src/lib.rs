pub mod patient;
pub mod roster;

pub use patient::{PatientCondition, Preference};
pub use roster::{
    BookedInterval, BookingRecord, DoctorCalendar, DoctorInfo, DoctorProfile, DoctorRecord,
    HospitalRoster,
};
