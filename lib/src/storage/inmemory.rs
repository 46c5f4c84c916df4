// lib/src/storage/inmemory.rs

//! In-memory store: one `RwLock`-guarded map per collection, constructed
//! once at process start and injected wherever a repository is needed.
//! Replaces the ambient module-level arrays of the original deployment.

use async_trait::async_trait;
use models::{
    EscalationLog, Facility, Referral, ReferralStatus, Reservation, RoutingResult,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    EscalationLogRepository, FacilityRepository, ReferralRepository, ReservationRepository,
};

#[derive(Debug, Default)]
pub struct InMemoryStore {
    facilities: Arc<RwLock<HashMap<Uuid, Facility>>>,
    referrals: Arc<RwLock<HashMap<Uuid, Referral>>>,
    reservations: Arc<RwLock<HashMap<Uuid, Reservation>>>,
    escalation_logs: Arc<RwLock<Vec<EscalationLog>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        InMemoryStore::default()
    }
}

#[async_trait]
impl FacilityRepository for InMemoryStore {
    async fn get(&self, id: &Uuid) -> RoutingResult<Option<Facility>> {
        let facilities = self.facilities.read().await;
        Ok(facilities.get(id).cloned())
    }

    async fn list_approved(&self) -> RoutingResult<Vec<Facility>> {
        let facilities = self.facilities.read().await;
        let mut approved: Vec<Facility> =
            facilities.values().filter(|f| f.approved).cloned().collect();
        // HashMap iteration order is unstable; the trait contract is id asc.
        approved.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(approved)
    }

    async fn save(&self, facility: Facility) -> RoutingResult<()> {
        let mut facilities = self.facilities.write().await;
        facilities.insert(facility.id, facility);
        Ok(())
    }
}

#[async_trait]
impl ReferralRepository for InMemoryStore {
    async fn get(&self, id: &Uuid) -> RoutingResult<Option<Referral>> {
        let referrals = self.referrals.read().await;
        Ok(referrals.get(id).cloned())
    }

    async fn save(&self, referral: Referral) -> RoutingResult<()> {
        let mut referrals = self.referrals.write().await;
        referrals.insert(referral.id, referral);
        Ok(())
    }

    async fn list_by_status(&self, status: ReferralStatus) -> RoutingResult<Vec<Referral>> {
        let referrals = self.referrals.read().await;
        let mut matching: Vec<Referral> = referrals
            .values()
            .filter(|r| r.status == status)
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(matching)
    }
}

#[async_trait]
impl ReservationRepository for InMemoryStore {
    async fn get(&self, id: &Uuid) -> RoutingResult<Option<Reservation>> {
        let reservations = self.reservations.read().await;
        Ok(reservations.get(id).cloned())
    }

    async fn save(&self, reservation: Reservation) -> RoutingResult<()> {
        let mut reservations = self.reservations.write().await;
        reservations.insert(reservation.id, reservation);
        Ok(())
    }

    async fn list_for_referral(&self, referral_id: &Uuid) -> RoutingResult<Vec<Reservation>> {
        let reservations = self.reservations.read().await;
        let mut matching: Vec<Reservation> = reservations
            .values()
            .filter(|r| r.referral_id == *referral_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(matching)
    }
}

#[async_trait]
impl EscalationLogRepository for InMemoryStore {
    async fn append(&self, log: EscalationLog) -> RoutingResult<()> {
        let mut logs = self.escalation_logs.write().await;
        logs.push(log);
        Ok(())
    }

    async fn list_for_referral(&self, referral_id: &Uuid) -> RoutingResult<Vec<EscalationLog>> {
        let logs = self.escalation_logs.read().await;
        Ok(logs
            .iter()
            .filter(|l| l.referral_id == *referral_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::{BTreeMap, BTreeSet};

    fn facility(approved: bool) -> Facility {
        Facility {
            id: Uuid::new_v4(),
            name: "Test Facility".to_string(),
            total_beds: 10,
            available_beds: 10,
            reserved_beds: 0,
            total_icu_beds: 2,
            icu_beds: 2,
            reserved_icu: 0,
            specialists: BTreeSet::new(),
            specialist_slots: BTreeMap::new(),
            distance_km: 5.0,
            ambulance_eta_min: 10,
            equipment: BTreeSet::new(),
            approved,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn list_approved_filters_and_orders_by_id() {
        let store = InMemoryStore::new();
        let a = facility(true);
        let b = facility(true);
        let hidden = facility(false);
        FacilityRepository::save(&store, a.clone()).await.unwrap();
        FacilityRepository::save(&store, b.clone()).await.unwrap();
        FacilityRepository::save(&store, hidden).await.unwrap();

        let listed = store.list_approved().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed[0].id < listed[1].id);
    }

    #[tokio::test]
    async fn save_is_insert_or_replace() {
        let store = InMemoryStore::new();
        let mut f = facility(true);
        FacilityRepository::save(&store, f.clone()).await.unwrap();
        f.available_beds = 3;
        FacilityRepository::save(&store, f.clone()).await.unwrap();

        let loaded = FacilityRepository::get(&store, &f.id).await.unwrap().unwrap();
        assert_eq!(loaded.available_beds, 3);
    }

    #[tokio::test]
    async fn escalation_logs_preserve_append_order() {
        let store = InMemoryStore::new();
        let referral_id = Uuid::new_v4();
        for i in 0..3u32 {
            let log = EscalationLog {
                id: Uuid::new_v4(),
                referral_id,
                from_hospital_id: Uuid::new_v4(),
                from_hospital_name: format!("Hospital {}", i),
                to_hospital_id: None,
                to_hospital_name: None,
                reason: "deadline exceeded".to_string(),
                outcome: models::EscalationOutcome::Exhausted,
                time: Utc::now(),
            };
            store.append(log).await.unwrap();
        }
        let logs = EscalationLogRepository::list_for_referral(&store, &referral_id)
            .await
            .unwrap();
        assert_eq!(logs.len(), 3);
        assert_eq!(logs[0].from_hospital_name, "Hospital 0");
        assert_eq!(logs[2].from_hospital_name, "Hospital 2");
    }
}
