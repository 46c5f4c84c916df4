// lib/src/scheduler/mod.rs

//! Background escalation sweep: a recurring task with its own shutdown
//! token, calling the same `run_escalation_sweep` entry point the manual
//! trigger uses. One implementation, one set of invariants.

use log::{error, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::referral::ReferralService;

pub struct EscalationScheduler {
    service: Arc<ReferralService>,
    interval: Duration,
    shutdown: watch::Sender<bool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl EscalationScheduler {
    pub fn new(service: Arc<ReferralService>, interval: Duration) -> Self {
        let (shutdown, _) = watch::channel(false);
        EscalationScheduler {
            service,
            interval,
            shutdown,
            handle: Mutex::new(None),
        }
    }

    /// Spawns the sweep loop. Idempotent: a second call while running is a
    /// no-op.
    pub async fn start(&self) {
        let mut handle = self.handle.lock().await;
        if handle.is_some() {
            return;
        }

        let service = self.service.clone();
        let mut shutdown_rx = self.shutdown.subscribe();
        let period = self.interval;
        *handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // A stalled sweep should not be followed by a burst of catch-ups.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = service.run_escalation_sweep().await {
                            error!("escalation sweep failed: {}", e);
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        info!("escalation scheduler stopping");
                        break;
                    }
                }
            }
        }));
        info!("escalation scheduler started (period {:?})", period);
    }

    pub async fn is_running(&self) -> bool {
        self.handle.lock().await.is_some()
    }

    /// Signals shutdown and waits for the loop to exit.
    pub async fn stop(&self) {
        let task = self.handle.lock().await.take();
        if let Some(task) = task {
            let _ = self.shutdown.send(true);
            let _ = task.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoreConfig;
    use crate::notifications::LogNotifier;
    use crate::referral::CreateReferralRequest;
    use crate::reservation::ReservationManager;
    use crate::storage::{FacilityRepository, InMemoryStore, ReferralRepository};
    use chrono::Utc;
    use models::{Facility, PatientSnapshot, ReferralStatus, Urgency};
    use std::collections::{BTreeMap, BTreeSet};
    use uuid::Uuid;

    fn facility(name: &str, distance_km: f64) -> Facility {
        Facility {
            id: Uuid::new_v4(),
            name: name.to_string(),
            total_beds: 10,
            available_beds: 10,
            reserved_beds: 0,
            total_icu_beds: 2,
            icu_beds: 2,
            reserved_icu: 0,
            specialists: BTreeSet::new(),
            specialist_slots: BTreeMap::new(),
            distance_km,
            ambulance_eta_min: 12,
            equipment: BTreeSet::new(),
            approved: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    async fn service_with(facilities: Vec<Facility>) -> (Arc<InMemoryStore>, Arc<ReferralService>) {
        let store = Arc::new(InMemoryStore::new());
        for f in facilities {
            FacilityRepository::save(store.as_ref(), f).await.unwrap();
        }
        let manager = ReservationManager::new(store.clone(), store.clone());
        let service = Arc::new(ReferralService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            manager,
            Arc::new(LogNotifier::new()),
            CoreConfig::default(),
        ));
        (store, service)
    }

    #[tokio::test]
    async fn scheduler_escalates_overdue_referrals() {
        let origin = facility("Origin", 5.0);
        let alt = facility("Alternative", 9.0);
        let (store, service) = service_with(vec![origin.clone(), alt.clone()]).await;

        let referral = service
            .create_referral(CreateReferralRequest {
                patient: PatientSnapshot {
                    name: "D. Achieng".to_string(),
                    age: 33,
                    village: "Siaya".to_string(),
                    contact: None,
                },
                symptoms: "seizure".to_string(),
                urgency: Urgency::Emergency,
                facility_id: origin.id,
                specialist_needed: None,
                needs_icu: false,
            })
            .await
            .unwrap();

        // Backdate the deadline so the very first tick finds it overdue.
        let mut overdue = ReferralRepository::get(store.as_ref(), &referral.id)
            .await
            .unwrap()
            .unwrap();
        overdue.escalation_deadline = Utc::now() - chrono::Duration::seconds(1);
        ReferralRepository::save(store.as_ref(), overdue)
            .await
            .unwrap();

        let scheduler =
            EscalationScheduler::new(service.clone(), Duration::from_millis(20));
        scheduler.start().await;
        assert!(scheduler.is_running().await);
        tokio::time::sleep(Duration::from_millis(80)).await;
        scheduler.stop().await;
        assert!(!scheduler.is_running().await);

        let current = ReferralRepository::get(store.as_ref(), &referral.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.hospital_id, alt.id);
        assert_eq!(current.status, ReferralStatus::Pending);
        // Escalated once, not once per tick.
        assert_eq!(current.escalation_history.len(), 1);
    }

    #[tokio::test]
    async fn start_twice_spawns_one_task_and_stop_is_idempotent() {
        let (_store, service) = service_with(vec![]).await;
        let scheduler = EscalationScheduler::new(service, Duration::from_millis(10));
        scheduler.start().await;
        scheduler.start().await;
        assert!(scheduler.is_running().await);
        scheduler.stop().await;
        scheduler.stop().await;
        assert!(!scheduler.is_running().await);
    }
}
