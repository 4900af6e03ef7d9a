//! Guest session context.
//!
//! A guest signs in by looking up their active stay with a document number.
//! The resulting [`GuestSession`] is saved locally and passed explicitly to
//! everything that needs the guest's identity (checkout, service requests,
//! the realtime feed).

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::hours::property_offset;
use crate::models::CheckinData;

/// Local hour at which a stay starts on the check-in date.
const CHECK_IN_HOUR: u32 = 15;

/// Local hour at which a stay ends on the check-out date.
const CHECK_OUT_HOUR: u32 = 12;

/// Label used when the guest's unit is unknown.
const DEFAULT_ROOM_LABEL: &str = "Habitación";

/// Short unit name → name shown to guests.
const UNIT_NAMES: &[(&str, &str)] = &[
    ("Bungalow FL 01", "Bungalow Forestal 1"),
    ("Bungalow FL 02", "Bungalow Forestal 2"),
    ("Bungalow FL 03", "Bungalow Forestal 3"),
    ("Bungalow FL 04", "Bungalow Forestal 4"),
    ("Cabaña OY 01", "Cabaña Old Yanashpa 1"),
    ("Cabaña OY 02", "Cabaña Old Yanashpa 2"),
    ("Cabaña OY 03", "Cabaña Old Yanashpa 3"),
    ("Casa YV 5", "Casa Village 5"),
    ("Casa YV 19", "Casa Village 19"),
    ("Casa YV 30", "Casa Village 30"),
    ("Casa YV 33", "Casa Village 33"),
    ("Casa YV 2", "Casa Village 2"),
    ("Casa YV 21", "Casa Village 21"),
    ("Tiny House VB 01", "Casa Vibras 1"),
    ("Casa VB 40", "Casa Vibras 40"),
    ("Casa VB 156", "Casa Vibras 156"),
    ("Casa VB 56", "Casa Vibras 56"),
];

/// Identity and stay of the signed-in guest.
///
/// Serialized with the field names the rest of the product already uses
/// for the stored reservation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestSession {
    #[serde(rename = "nombre", default)]
    pub guest_name: String,
    #[serde(rename = "correo", default)]
    pub email: String,
    #[serde(rename = "telefono", default)]
    pub phone: String,
    #[serde(rename = "propiedad", default)]
    pub property: String,
    /// `dd/mm/yyyy`
    #[serde(rename = "checkIn", default)]
    pub check_in: String,
    /// `dd/mm/yyyy`
    #[serde(rename = "checkOut", default)]
    pub check_out: String,
    #[serde(rename = "dniPasaporte", default)]
    pub document: String,
}

impl GuestSession {
    /// Builds a session from a reservation lookup result.
    pub fn from_checkin(checkin: &CheckinData, document: &str) -> Self {
        Self {
            guest_name: checkin.name.clone(),
            email: checkin.email.clone(),
            phone: checkin.phone.clone(),
            property: checkin.property.clone(),
            check_in: checkin.check_in_date.clone(),
            check_out: checkin.check_out_date.clone(),
            document: document.trim().to_string(),
        }
    }

    /// Returns `true` if both stay dates are present.
    pub fn is_complete(&self) -> bool {
        !self.check_in.is_empty() && !self.check_out.is_empty()
    }

    /// Stay window in UTC: check-in date 15:00 to check-out date 12:00,
    /// property time. `None` if either date does not parse.
    pub fn stay_window(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let start = local_instant(parse_stay_date(&self.check_in)?, CHECK_IN_HOUR)?;
        let end = local_instant(parse_stay_date(&self.check_out)?, CHECK_OUT_HOUR)?;
        Some((start, end))
    }

    /// Returns `true` if `now` falls inside the stay window (inclusive).
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.stay_window()
            .is_some_and(|(start, end)| start <= now && now <= end)
    }

    /// Name of the guest's unit as shown on screen.
    pub fn room_label(&self) -> String {
        if self.property.is_empty() {
            return DEFAULT_ROOM_LABEL.to_string();
        }
        UNIT_NAMES
            .iter()
            .find(|(short, _)| *short == self.property)
            .map_or_else(|| self.property.clone(), |(_, name)| (*name).to_string())
    }

    /// Returns `true` if a pushed request belongs to this guest.
    pub fn owns(&self, guest_name: &str, property: &str) -> bool {
        self.guest_name == guest_name && self.property == property
    }
}

/// Parses a `dd/mm/yyyy` date (leading zeros optional).
fn parse_stay_date(raw: &str) -> Option<NaiveDate> {
    let mut parts = raw.trim().split('/').map(|p| p.trim().parse::<u32>().ok());
    let day = parts.next()??;
    let month = parts.next()??;
    let year = parts.next()??;
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)
}

fn local_instant(date: NaiveDate, hour: u32) -> Option<DateTime<Utc>> {
    let local = NaiveDateTime::new(date, NaiveTime::from_hms_opt(hour, 0, 0)?);
    property_offset()
        .from_local_datetime(&local)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}
