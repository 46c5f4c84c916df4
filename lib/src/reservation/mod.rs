// lib/src/reservation/mod.rs

//! Reservation manager: converts a routing decision into provisional holds
//! on a facility's bed/ICU/specialist counters, and reverses them on
//! release. This module is the only writer of facility counters besides the
//! accept path's permanent allocation, which also lives here.

use chrono::{Duration, Utc};
use log::{debug, warn};
use models::{
    Facility, Referral, Reservation, ReservationStatus, RoutingError, RoutingResult,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::storage::{FacilityRepository, ReservationRepository};

/// Synthetic specialist slot offset: the hold is stamped half an hour out.
const SPECIALIST_SLOT_OFFSET_MINS: i64 = 30;

pub struct ReservationManager {
    facilities: Arc<dyn FacilityRepository>,
    reservations: Arc<dyn ReservationRepository>,
}

impl ReservationManager {
    pub fn new(
        facilities: Arc<dyn FacilityRepository>,
        reservations: Arc<dyn ReservationRepository>,
    ) -> Self {
        ReservationManager {
            facilities,
            reservations,
        }
    }

    /// Takes provisional holds against `facility_id` for the referral.
    ///
    /// The three resource holds are independent and partial: a missing
    /// resource leaves its flag unset rather than failing the reservation.
    /// Each counter mutation is check-then-act against the freshly loaded
    /// record, so counters never go negative.
    pub async fn reserve(
        &self,
        referral: &Referral,
        facility_id: &Uuid,
    ) -> RoutingResult<Reservation> {
        let mut facility: Facility = self
            .facilities
            .get(facility_id)
            .await?
            .ok_or_else(|| RoutingError::facility_not_found(*facility_id))?;

        let now = Utc::now();
        let mut reservation = Reservation {
            id: Uuid::new_v4(),
            referral_id: referral.id,
            hospital_id: facility.id,
            bed_reserved: false,
            icu_reserved: false,
            specialist_reserved: None,
            bed_number: None,
            icu_slot: None,
            specialist_slot_time: None,
            status: ReservationStatus::Reserved,
            expires_at: referral.escalation_deadline,
            created_at: now,
        };

        if facility.available_beds > facility.reserved_beds {
            facility.reserved_beds += 1;
            reservation.bed_reserved = true;
            // Bed number follows the running occupied count.
            reservation.bed_number = Some(
                facility.total_beds.saturating_sub(facility.available_beds)
                    + facility.reserved_beds,
            );
        } else {
            warn!(
                "no free bed at {} for referral {}",
                facility.name, referral.id
            );
        }

        if referral.requires_icu() && facility.icu_beds > facility.reserved_icu {
            facility.reserved_icu += 1;
            reservation.icu_reserved = true;
            reservation.icu_slot = Some(facility.reserved_icu);
        }

        if let Some(specialty) = &referral.specialist_needed {
            let remaining = facility.remaining_specialist_slots(specialty);
            if remaining > 0 {
                facility
                    .specialist_slots
                    .insert(specialty.clone(), remaining - 1);
                reservation.specialist_reserved = Some(specialty.clone());
                reservation.specialist_slot_time =
                    Some(now + Duration::minutes(SPECIALIST_SLOT_OFFSET_MINS));
            }
        }

        facility.updated_at = now;
        self.facilities.save(facility).await?;
        self.reservations.save(reservation.clone()).await?;
        debug!(
            "reserved for referral {}: bed={} icu={} specialist={:?}",
            referral.id,
            reservation.bed_reserved,
            reservation.icu_reserved,
            reservation.specialist_reserved
        );
        Ok(reservation)
    }

    /// Releases a provisional hold, restoring the facility's counters.
    ///
    /// Idempotent: only a reservation still in Reserved state has counters
    /// to give back; any other state is returned unchanged.
    pub async fn release(
        &self,
        reservation_id: &Uuid,
        to: ReservationStatus,
    ) -> RoutingResult<Reservation> {
        debug_assert!(matches!(
            to,
            ReservationStatus::Released | ReservationStatus::Escalated
        ));
        let mut reservation = self.load(reservation_id).await?;
        if reservation.status != ReservationStatus::Reserved {
            return Ok(reservation);
        }

        if let Some(mut facility) = self.facilities.get(&reservation.hospital_id).await? {
            if reservation.bed_reserved {
                facility.reserved_beds = facility.reserved_beds.saturating_sub(1);
            }
            if reservation.icu_reserved {
                facility.reserved_icu = facility.reserved_icu.saturating_sub(1);
            }
            if let Some(specialty) = &reservation.specialist_reserved {
                let remaining = facility.remaining_specialist_slots(specialty);
                facility
                    .specialist_slots
                    .insert(specialty.clone(), remaining + 1);
            }
            facility.updated_at = Utc::now();
            self.facilities.save(facility).await?;
        } else {
            warn!(
                "releasing reservation {} against missing facility {}",
                reservation.id, reservation.hospital_id
            );
        }

        reservation.status = to;
        self.reservations.save(reservation.clone()).await?;
        Ok(reservation)
    }

    /// Promotes a provisional hold into a permanent allocation (accept path):
    /// Reserved -> Confirmed, with the held bed/ICU converted from reserved
    /// counters into occupied capacity.
    pub async fn confirm(&self, reservation_id: &Uuid) -> RoutingResult<Reservation> {
        let mut reservation = self.load(reservation_id).await?;
        if reservation.status != ReservationStatus::Reserved {
            return Err(RoutingError::InvalidState {
                operation: "confirm_reservation",
                expected: "Reserved",
                found: reservation.status.to_string(),
            });
        }

        if let Some(mut facility) = self.facilities.get(&reservation.hospital_id).await? {
            if reservation.bed_reserved {
                facility.available_beds = facility.available_beds.saturating_sub(1);
                facility.reserved_beds = facility.reserved_beds.saturating_sub(1);
            } else if facility.available_beds > 0 {
                // No provisional hold existed; the permanent allocation still
                // consumes a bed.
                facility.available_beds -= 1;
            }
            if reservation.icu_reserved {
                facility.icu_beds = facility.icu_beds.saturating_sub(1);
                facility.reserved_icu = facility.reserved_icu.saturating_sub(1);
            }
            facility.updated_at = Utc::now();
            self.facilities.save(facility).await?;
        } else {
            warn!(
                "confirming reservation {} against missing facility {}",
                reservation.id, reservation.hospital_id
            );
        }

        reservation.status = ReservationStatus::Confirmed;
        self.reservations.save(reservation.clone()).await?;
        Ok(reservation)
    }

    /// Confirmed -> Utilized (patient admitted).
    pub async fn utilize(&self, reservation_id: &Uuid) -> RoutingResult<Reservation> {
        let mut reservation = self.load(reservation_id).await?;
        if reservation.status != ReservationStatus::Confirmed {
            return Err(RoutingError::InvalidState {
                operation: "utilize_reservation",
                expected: "Confirmed",
                found: reservation.status.to_string(),
            });
        }
        reservation.status = ReservationStatus::Utilized;
        self.reservations.save(reservation.clone()).await?;
        Ok(reservation)
    }

    async fn load(&self, reservation_id: &Uuid) -> RoutingResult<Reservation> {
        self.reservations
            .get(reservation_id)
            .await?
            .ok_or_else(|| RoutingError::reservation_not_found(*reservation_id))
    }

    #[cfg(test)]
    async fn facility(&self, id: &Uuid) -> Facility {
        self.facilities.get(id).await.unwrap().unwrap()
    }
}
