// libs/scheduling-cell/tests/availability_test.rs
//
// Candidate search, preference combination, and earliest selection
// against a small cardiology roster.

use std::collections::HashSet;

use assert_matches::assert_matches;

use scheduling_cell::services::selection::{derive_proposal, find_earliest};
use scheduling_cell::{AvailabilityFilter, AvailabilityService, CandidateSlot, SchedulingError};
use shared_models::{PatientCondition, Preference};
use shared_utils::test_utils::{cardiology_condition, date, hours, roster_from, sample_grid, seoul_offset};

const EARLY_MORNING: &str = "2024-01-10T08:00:00+09:00";

struct TestSetup {
    service: AvailabilityService,
    roster: shared_models::HospitalRoster,
}

impl TestSetup {
    /// Dr. Lee has 09:00-10:00 booked on 2024-01-10; Dr. Park is free
    /// all day; Dr. Oh belongs to another department entirely.
    fn new() -> Self {
        let service = AvailabilityService::new(sample_grid(), seoul_offset());
        let roster = roster_from(&[
            (
                "Dr. Lee",
                "Cardiology",
                "1",
                &[("2024-01-10", &[("9", "10")])],
            ),
            ("Dr. Park", "Cardiology", "1", &[("2024-01-10", &[])]),
            ("Dr. Oh", "Dermatology", "1", &[("2024-01-10", &[])]),
        ]);
        Self { service, roster }
    }

    async fn cardiology_view(&self) -> scheduling_cell::DepartmentView {
        self.service.department_view(&self.roster, "Cardiology").await
    }
}

fn doctors_in(candidates: &HashSet<CandidateSlot>) -> HashSet<&str> {
    candidates.iter().map(|slot| slot.doctor.as_str()).collect()
}

// ==============================================================================
// DEPARTMENT VIEW
// ==============================================================================

#[tokio::test]
async fn view_excludes_other_departments() {
    let setup = TestSetup::new();
    let view = setup.cardiology_view().await;
    assert_eq!(view.doctors.len(), 2);
    assert!(view.doctors.contains_key("Dr. Lee"));
    assert!(!view.doctors.contains_key("Dr. Oh"));
}

#[tokio::test]
async fn view_reports_outpatient_duration_and_workload() {
    let setup = TestSetup::new();
    let view = setup.cardiology_view().await;
    let lee = &view.doctors["Dr. Lee"];
    assert_eq!(lee.outpatient_duration, hours("1"));
    // One booking against a daily capacity of 16.
    assert_eq!(lee.workload_percent, hours("6.25"));
}

// ==============================================================================
// FILTER STRATEGIES
// ==============================================================================

#[tokio::test]
async fn unfiltered_skips_booked_starts_and_keeps_the_first_free_one() {
    let setup = TestSetup::new();
    let view = setup.cardiology_view().await;
    let candidates = setup.service.unfiltered(&view, EARLY_MORNING).unwrap();

    let ten = CandidateSlot::new("Dr. Lee", "2024-01-10T10:00:00+09:00");
    assert!(candidates.contains(&ten));
    assert!(!candidates.contains(&CandidateSlot::new("Dr. Lee", "2024-01-10T09:00:00+09:00")));
    assert!(!candidates.contains(&CandidateSlot::new("Dr. Lee", "2024-01-10T09:30:00+09:00")));

    // Sliding window: Dr. Lee's free run 10:00-17:00 (14 segments)
    // yields 13 one-hour starts; Dr. Park's full day yields 15.
    let lee_count = candidates.iter().filter(|c| c.doctor == "Dr. Lee").count();
    let park_count = candidates.iter().filter(|c| c.doctor == "Dr. Park").count();
    assert_eq!(lee_count, 13);
    assert_eq!(park_count, 15);
}

#[tokio::test]
async fn candidates_before_the_current_time_are_dropped() {
    let setup = TestSetup::new();
    let view = setup.cardiology_view().await;
    let candidates = setup
        .service
        .unfiltered(&view, "2024-01-10T13:00:00+09:00")
        .unwrap();

    assert!(candidates
        .iter()
        .all(|slot| slot.start.as_str() >= "2024-01-10T13:00:00+09:00"));
    assert!(candidates.contains(&CandidateSlot::new("Dr. Lee", "2024-01-10T13:00:00+09:00")));
}

#[tokio::test]
async fn physician_filter_restricts_to_one_doctor() {
    let setup = TestSetup::new();
    let view = setup.cardiology_view().await;
    let candidates = setup
        .service
        .physician_filter(&view, "Dr. Lee", EARLY_MORNING)
        .unwrap();
    assert_eq!(doctors_in(&candidates), HashSet::from(["Dr. Lee"]));
}

#[tokio::test]
async fn physician_filter_applies_the_honorific() {
    let setup = TestSetup::new();
    let view = setup.cardiology_view().await;
    let bare = setup
        .service
        .physician_filter(&view, "Lee", EARLY_MORNING)
        .unwrap();
    let prefixed = setup
        .service
        .physician_filter(&view, "Dr. Lee", EARLY_MORNING)
        .unwrap();
    assert_eq!(bare, prefixed);
}

#[tokio::test]
async fn physician_filter_rejects_unknown_doctors() {
    let setup = TestSetup::new();
    let view = setup.cardiology_view().await;
    let err = setup
        .service
        .physician_filter(&view, "Dr. Nobody", EARLY_MORNING)
        .unwrap_err();
    assert_matches!(err, SchedulingError::UnknownDoctor(name) if name == "Dr. Nobody");
}

#[tokio::test]
async fn date_filter_skips_dates_before_valid_from() {
    let service = AvailabilityService::new(sample_grid(), seoul_offset());
    let roster = roster_from(&[(
        "Dr. Lee",
        "Cardiology",
        "1",
        &[("2024-01-10", &[("9", "10")]), ("2024-01-12", &[])],
    )]);
    let view = service.department_view(&roster, "Cardiology").await;

    let candidates = service
        .date_filter(&view, date("2024-01-11"), EARLY_MORNING)
        .unwrap();
    assert!(candidates
        .iter()
        .all(|slot| slot.start.starts_with("2024-01-12")));

    // The boundary date itself is kept.
    let candidates = service
        .date_filter(&view, date("2024-01-10"), EARLY_MORNING)
        .unwrap();
    assert!(candidates
        .iter()
        .any(|slot| slot.start.starts_with("2024-01-10")));
}

#[tokio::test]
async fn filters_are_idempotent_on_an_unmodified_roster() {
    let setup = TestSetup::new();
    let view = setup.cardiology_view().await;
    for filter in [
        AvailabilityFilter::Unfiltered,
        AvailabilityFilter::Physician {
            name: "Dr. Lee".to_string(),
        },
        AvailabilityFilter::ValidFrom {
            date: date("2024-01-10"),
        },
    ] {
        let first = setup.service.run_filter(&view, &filter, EARLY_MORNING).unwrap();
        let second = setup.service.run_filter(&view, &filter, EARLY_MORNING).unwrap();
        assert_eq!(first, second);
    }
}

// ==============================================================================
// PREFERENCE COMBINATION
// ==============================================================================

#[tokio::test]
async fn no_active_preference_uses_the_unfiltered_search() {
    let setup = TestSetup::new();
    let condition = cardiology_condition();
    let combined = setup
        .service
        .find_candidates(&setup.roster, &condition, EARLY_MORNING)
        .await
        .unwrap();

    let view = setup.cardiology_view().await;
    let unfiltered = setup.service.unfiltered(&view, EARLY_MORNING).unwrap();
    assert_eq!(combined, unfiltered);
}

#[tokio::test]
async fn both_preferences_intersect_and_stay_within_the_unfiltered_set() {
    let setup = TestSetup::new();
    let condition = PatientCondition {
        preference: vec![Preference::Doctor, Preference::Date],
        preferred_doctor: Some("Dr. Lee".to_string()),
        valid_from: Some(date("2024-01-10")),
        ..cardiology_condition()
    };
    let combined = setup
        .service
        .find_candidates(&setup.roster, &condition, EARLY_MORNING)
        .await
        .unwrap();

    assert_eq!(doctors_in(&combined), HashSet::from(["Dr. Lee"]));

    let view = setup.cardiology_view().await;
    let unfiltered = setup.service.unfiltered(&view, EARLY_MORNING).unwrap();
    assert!(combined.is_subset(&unfiltered));
}

#[tokio::test]
async fn empty_intersection_is_surfaced_not_widened() {
    let setup = TestSetup::new();
    let condition = PatientCondition {
        preference: vec![Preference::Doctor, Preference::Date],
        preferred_doctor: Some("Dr. Lee".to_string()),
        // Dr. Lee has no scheduled dates this far out.
        valid_from: Some(date("2024-02-01")),
        ..cardiology_condition()
    };
    let combined = setup
        .service
        .find_candidates(&setup.roster, &condition, EARLY_MORNING)
        .await
        .unwrap();
    assert!(combined.is_empty());
}

#[tokio::test]
async fn active_preference_without_detail_is_an_error() {
    let setup = TestSetup::new();
    let condition = PatientCondition {
        preference: vec![Preference::Doctor],
        preferred_doctor: None,
        ..cardiology_condition()
    };
    let err = setup
        .service
        .find_candidates(&setup.roster, &condition, EARLY_MORNING)
        .await
        .unwrap_err();
    assert_matches!(err, SchedulingError::MissingPreferredDoctor);
}

// ==============================================================================
// EARLIEST SELECTION
// ==============================================================================

#[tokio::test]
async fn tied_doctors_are_all_selected() {
    let service = AvailabilityService::new(sample_grid(), seoul_offset());
    let roster = roster_from(&[
        ("Dr. Lee", "Cardiology", "1", &[("2024-01-10", &[("9", "10")])]),
        ("Dr. Park", "Cardiology", "1", &[("2024-01-10", &[("9", "10")])]),
    ]);
    let view = service.department_view(&roster, "Cardiology").await;
    let candidates = service.unfiltered(&view, EARLY_MORNING).unwrap();

    let selection = find_earliest(candidates, EARLY_MORNING).unwrap();
    assert_eq!(selection.doctors.len(), 2);
    assert!(selection
        .timestamps
        .iter()
        .all(|t| t == "2024-01-10T10:00:00+09:00"));

    let mut tied: Vec<&str> = selection.doctors.iter().map(String::as_str).collect();
    tied.sort_unstable();
    assert_eq!(tied, ["Dr. Lee", "Dr. Park"]);
}

#[tokio::test]
async fn empty_candidate_set_selects_nothing() {
    let selection = find_earliest(Vec::new(), EARLY_MORNING).unwrap();
    assert!(selection.is_empty());
    assert!(selection.timestamps.is_empty());
}

#[tokio::test]
async fn selection_skips_slots_already_in_the_past() {
    let candidates = vec![
        CandidateSlot::new("Dr. Lee", "2024-01-10T07:00:00+09:00"),
        CandidateSlot::new("Dr. Park", "2024-01-10T11:00:00+09:00"),
    ];
    let selection = find_earliest(candidates, EARLY_MORNING).unwrap();
    assert_eq!(selection.doctors, vec!["Dr. Park".to_string()]);
}

#[tokio::test]
async fn proposal_derivation_adds_the_outpatient_duration() {
    let setup = TestSetup::new();
    let view = setup.cardiology_view().await;
    let candidates = setup.service.unfiltered(&view, EARLY_MORNING).unwrap();
    let selection = find_earliest(candidates, EARLY_MORNING).unwrap();

    let proposal = derive_proposal(&selection, &view).unwrap().unwrap();
    assert_eq!(proposal.date, date("2024-01-10"));
    assert_eq!(proposal.end, proposal.start + hours("1"));

    let value = proposal.to_value();
    let body = &value[&proposal.doctor];
    assert_eq!(body["date"], serde_json::json!("2024-01-10"));
}

#[tokio::test]
async fn proposal_derivation_on_empty_selection_is_none() {
    let setup = TestSetup::new();
    let view = setup.cardiology_view().await;
    let selection = find_earliest(Vec::new(), EARLY_MORNING).unwrap();
    assert!(derive_proposal(&selection, &view).unwrap().is_none());
}
