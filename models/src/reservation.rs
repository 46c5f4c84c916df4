// models/src/reservation.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Lifecycle of a hold on facility resources.
///
/// Reserved -> Confirmed -> Utilized on the happy path;
/// Reserved -> Released (reject) or Reserved -> Escalated (re-routing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationStatus {
    Reserved,
    Confirmed,
    Utilized,
    Released,
    Escalated,
}

impl ReservationStatus {
    /// A reservation still holding provisional or confirmed resources.
    pub fn is_active(&self) -> bool {
        matches!(self, ReservationStatus::Reserved | ReservationStatus::Confirmed)
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReservationStatus::Reserved => "Reserved",
            ReservationStatus::Confirmed => "Confirmed",
            ReservationStatus::Utilized => "Utilized",
            ReservationStatus::Released => "Released",
            ReservationStatus::Escalated => "Escalated",
        };
        write!(f, "{}", s)
    }
}

/// A provisional-then-confirmed hold on one facility's resources, tied to a
/// single referral. The three resource holds are independent: a reservation
/// can carry a bed but no ICU slot. Tokens are assigned only when the
/// corresponding resource was actually available at reservation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub referral_id: Uuid,
    pub hospital_id: Uuid,
    pub bed_reserved: bool,
    pub icu_reserved: bool,
    /// Specialty name when a specialist slot was taken.
    pub specialist_reserved: Option<String>,
    pub bed_number: Option<u32>,
    pub icu_slot: Option<u32>,
    pub specialist_slot_time: Option<DateTime<Utc>>,
    pub status: ReservationStatus,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_reserved_and_confirmed_are_active() {
        assert!(ReservationStatus::Reserved.is_active());
        assert!(ReservationStatus::Confirmed.is_active());
        assert!(!ReservationStatus::Utilized.is_active());
        assert!(!ReservationStatus::Released.is_active());
        assert!(!ReservationStatus::Escalated.is_active());
    }
}
