use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which constraints the patient actually cares about. The filter
/// strategies only run for active preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preference {
    Doctor,
    Date,
}

/// Patient constraints known to the scheduling staff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientCondition {
    pub department: String,
    /// Required appointment length in fractional hours; must equal the
    /// chosen doctor's outpatient duration exactly.
    pub duration: Decimal,
    #[serde(default)]
    pub preference: Vec<Preference>,
    #[serde(default)]
    pub preferred_doctor: Option<String>,
    #[serde(default)]
    pub valid_from: Option<NaiveDate>,
}

impl PatientCondition {
    pub fn wants_doctor(&self) -> bool {
        self.preference.contains(&Preference::Doctor)
    }

    pub fn wants_date(&self) -> bool {
        self.preference.contains(&Preference::Date)
    }
}
