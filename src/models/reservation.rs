//! Reservation lookup models (`GET /reserva/checkins-activos/{document}`).

use serde::Deserialize;

/// Outcome tag of a reservation lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupStatus {
    Ok,
    NotFound,
    Error,
}

/// One active stay found for a document number.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckinData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub property: String,
    /// `dd/mm/yyyy`
    #[serde(default)]
    pub check_in_date: String,
    /// `dd/mm/yyyy`
    #[serde(default)]
    pub check_out_date: String,
}

/// Response of the reservation lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckinsResponse {
    pub status: LookupStatus,
    #[serde(default)]
    pub total: Option<u32>,
    #[serde(default)]
    pub data: Vec<CheckinData>,
    #[serde(default)]
    pub message: Option<String>,
}

impl CheckinsResponse {
    /// Active stays, empty when the lookup found nothing.
    pub fn stays(&self) -> &[CheckinData] {
        match self.status {
            LookupStatus::Ok => &self.data,
            LookupStatus::NotFound | LookupStatus::Error => &[],
        }
    }
}
