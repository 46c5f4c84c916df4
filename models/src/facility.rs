// models/src/facility.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// A care site with finite countable resources.
///
/// `available_beds` and `icu_beds` are the currently *free* counts;
/// `reserved_beds`/`reserved_icu` are provisional holds taken out of those
/// free counts by reservations that have not yet been accepted. The invariants
/// `reserved_beds <= available_beds` and `reserved_icu <= icu_beds` are
/// maintained by the reservation manager, which is the only component allowed
/// to mutate the counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Facility {
    pub id: Uuid,
    pub name: String,
    pub total_beds: u32,
    pub available_beds: u32,
    pub reserved_beds: u32,
    pub total_icu_beds: u32,
    pub icu_beds: u32,
    pub reserved_icu: u32,
    /// Specialties represented on staff, regardless of remaining slots.
    pub specialists: BTreeSet<String>,
    /// Remaining bookable slots per specialty. BTreeMap so iteration order is
    /// deterministic; the storage adapter normalizes whatever shape the
    /// backend hands over into this one mapping type.
    pub specialist_slots: BTreeMap<String, u32>,
    /// Distance in km from the referring catchment's reference origin.
    pub distance_km: f64,
    pub ambulance_eta_min: u32,
    pub equipment: BTreeSet<String>,
    /// Unapproved facilities are invisible to scoring and escalation.
    pub approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Facility {
    /// Beds free after subtracting provisional holds.
    pub fn effective_beds(&self) -> u32 {
        self.available_beds.saturating_sub(self.reserved_beds)
    }

    /// ICU beds free after subtracting provisional holds.
    pub fn effective_icu(&self) -> u32 {
        self.icu_beds.saturating_sub(self.reserved_icu)
    }

    /// Eligible for scoring and escalation: approved with at least one
    /// unreserved bed.
    pub fn is_eligible(&self) -> bool {
        self.approved && self.effective_beds() > 0
    }

    pub fn has_specialist(&self, specialty: &str) -> bool {
        self.specialists.contains(specialty)
    }

    pub fn remaining_specialist_slots(&self, specialty: &str) -> u32 {
        self.specialist_slots.get(specialty).copied().unwrap_or(0)
    }
}
