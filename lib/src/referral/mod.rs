// lib/src/referral/mod.rs

//! Referral lifecycle orchestration.
//!
//! Owns every status transition: Pending -> {Accepted, Rejected},
//! Accepted -> Admitted, Admitted -> Completed, and the escalation side
//! transition that re-targets a Pending or Rejected referral to the nearest
//! untried facility. Transitions on a referral's status/reservation pair
//! are serialized behind one lock and the status is re-read immediately
//! before committing, so a sweep tick and a concurrent accept/reject cannot
//! interleave on the same referral.

use chrono::Utc;
use log::{error, info, warn};
use models::{
    EscalationLog, EscalationOutcome, EscalationRecord, NotificationSeverity,
    NotificationTarget, PatientSnapshot, Referral, ReferralStatus, ReservationStatus,
    RoutingError, RoutingResult, Urgency,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::CoreConfig;
use crate::notifications::NotificationSink;
use crate::reservation::ReservationManager;
use crate::storage::{EscalationLogRepository, FacilityRepository, ReferralRepository};
use crate::triage::{classify_severity, estimate_delay_risk};

/// Reason attached to sweep-driven escalations.
pub const DEADLINE_EXCEEDED: &str = "deadline exceeded";

#[derive(Debug, Clone)]
pub struct CreateReferralRequest {
    pub patient: PatientSnapshot,
    pub symptoms: String,
    pub urgency: Urgency,
    pub facility_id: Uuid,
    pub specialist_needed: Option<String>,
    pub needs_icu: bool,
}

/// Result of one escalation sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepOutcome {
    pub examined: usize,
    pub escalated: usize,
}

pub struct ReferralService {
    facilities: Arc<dyn FacilityRepository>,
    referrals: Arc<dyn ReferralRepository>,
    escalation_logs: Arc<dyn EscalationLogRepository>,
    reservations: ReservationManager,
    notifier: Arc<dyn NotificationSink>,
    config: CoreConfig,
    /// Critical section for status/reservation transitions (see module doc).
    transition_lock: Mutex<()>,
}

impl ReferralService {
    pub fn new(
        facilities: Arc<dyn FacilityRepository>,
        referrals: Arc<dyn ReferralRepository>,
        escalation_logs: Arc<dyn EscalationLogRepository>,
        reservations: ReservationManager,
        notifier: Arc<dyn NotificationSink>,
        config: CoreConfig,
    ) -> Self {
        ReferralService {
            facilities,
            referrals,
            escalation_logs,
            reservations,
            notifier,
            config,
            transition_lock: Mutex::new(()),
        }
    }

    /// Creates a referral against a facility the caller already picked,
    /// classifying severity once and taking the initial reservation.
    pub async fn create_referral(&self, req: CreateReferralRequest) -> RoutingResult<Referral> {
        let _guard = self.transition_lock.lock().await;

        let facility = self
            .facilities
            .get(&req.facility_id)
            .await?
            .ok_or_else(|| RoutingError::facility_not_found(req.facility_id))?;

        let severity = classify_severity(
            &req.symptoms,
            req.urgency,
            req.needs_icu,
            req.specialist_needed.as_deref(),
        );
        let delay_risk = estimate_delay_risk(&facility, req.urgency);
        let now = Utc::now();

        let mut referral = Referral {
            id: Uuid::new_v4(),
            patient: req.patient,
            symptoms: req.symptoms,
            urgency: req.urgency,
            specialist_needed: req.specialist_needed,
            needs_icu: req.needs_icu,
            hospital_id: facility.id,
            hospital_name: facility.name.clone(),
            status: ReferralStatus::Pending,
            severity,
            delay_risk,
            escalation_deadline: now + self.config.deadline_offset(req.urgency),
            escalation_history: Vec::new(),
            reservation_id: None,
            notes: None,
            rejection_reason: None,
            ward: None,
            created_at: now,
            updated_at: now,
        };

        let reservation = self.reservations.reserve(&referral, &facility.id).await?;
        referral.reservation_id = Some(reservation.id);
        self.referrals.save(referral.clone()).await?;
        info!(
            "referral {} created for {} -> {} ({:?}, severity {:?})",
            referral.id,
            referral.patient.name,
            referral.hospital_name,
            referral.urgency,
            referral.severity.level
        );

        self.emit(
            NotificationTarget::HospitalAdmin,
            "Incoming referral",
            &format!(
                "New {:?} referral for {} ({})",
                referral.urgency, referral.patient.name, referral.severity.score
            ),
            severity_of(&referral),
            Some(referral.id),
        )
        .await;
        Ok(referral)
    }

    /// Pending -> Accepted: promote the hold to a permanent allocation.
    pub async fn accept_referral(&self, id: Uuid, notes: Option<String>) -> RoutingResult<Referral> {
        let _guard = self.transition_lock.lock().await;
        let mut referral = self.load(id).await?;
        require_status(&referral, ReferralStatus::Pending, "accept_referral")?;

        if let Some(reservation_id) = referral.reservation_id {
            self.reservations.confirm(&reservation_id).await?;
        }
        referral.status = ReferralStatus::Accepted;
        referral.notes = notes;
        referral.updated_at = Utc::now();
        self.referrals.save(referral.clone()).await?;
        info!("referral {} accepted by {}", referral.id, referral.hospital_name);

        self.emit(
            NotificationTarget::Doctor,
            "Referral accepted",
            &format!("{} accepted the referral", referral.hospital_name),
            NotificationSeverity::Info,
            Some(referral.id),
        )
        .await;
        self.emit(
            NotificationTarget::Patient,
            "Referral accepted",
            &format!("{} is expecting you", referral.hospital_name),
            NotificationSeverity::Info,
            Some(referral.id),
        )
        .await;
        Ok(referral)
    }

    /// Pending -> Rejected, followed unconditionally by escalation with the
    /// rejection reason as cause.
    pub async fn reject_referral(&self, id: Uuid, reason: String) -> RoutingResult<Referral> {
        let _guard = self.transition_lock.lock().await;
        let mut referral = self.load(id).await?;
        require_status(&referral, ReferralStatus::Pending, "reject_referral")?;

        if let Some(reservation_id) = referral.reservation_id {
            self.reservations
                .release(&reservation_id, ReservationStatus::Released)
                .await?;
        }
        referral.status = ReferralStatus::Rejected;
        referral.rejection_reason = Some(reason.clone());
        referral.updated_at = Utc::now();
        self.referrals.save(referral.clone()).await?;
        warn!(
            "referral {} rejected by {}: {}",
            referral.id, referral.hospital_name, reason
        );

        // The caller sees the rejection it asked for; the re-targeted
        // referral (if escalation found an alternative) lives in the store.
        let rejected = referral.clone();
        self.escalate_locked(&mut referral, &reason).await?;
        Ok(rejected)
    }

    /// Accepted -> Admitted: the patient arrived and the reservation is
    /// marked utilized.
    pub async fn admit_referral(&self, id: Uuid, ward: String) -> RoutingResult<Referral> {
        let _guard = self.transition_lock.lock().await;
        let mut referral = self.load(id).await?;
        require_status(&referral, ReferralStatus::Accepted, "admit_referral")?;

        if let Some(reservation_id) = referral.reservation_id {
            self.reservations.utilize(&reservation_id).await?;
        }
        referral.status = ReferralStatus::Admitted;
        referral.ward = Some(ward);
        referral.updated_at = Utc::now();
        self.referrals.save(referral.clone()).await?;
        info!("referral {} admitted at {}", referral.id, referral.hospital_name);
        Ok(referral)
    }

    /// Admitted -> Completed. Terminal.
    pub async fn complete_referral(&self, id: Uuid) -> RoutingResult<Referral> {
        let _guard = self.transition_lock.lock().await;
        let mut referral = self.load(id).await?;
        require_status(&referral, ReferralStatus::Admitted, "complete_referral")?;

        referral.status = ReferralStatus::Completed;
        referral.updated_at = Utc::now();
        self.referrals.save(referral.clone()).await?;
        info!("referral {} completed", referral.id);
        Ok(referral)
    }

    /// On-demand escalation of a single referral.
    pub async fn escalate_referral(
        &self,
        id: Uuid,
        reason: String,
    ) -> RoutingResult<EscalationOutcome> {
        let _guard = self.transition_lock.lock().await;
        let mut referral = self.load(id).await?;
        if !matches!(
            referral.status,
            ReferralStatus::Pending | ReferralStatus::Rejected
        ) {
            return Err(RoutingError::InvalidState {
                operation: "escalate_referral",
                expected: "Pending or Rejected",
                found: referral.status.to_string(),
            });
        }
        self.escalate_locked(&mut referral, &reason).await
    }

    /// Finds overdue Pending referrals and re-routes each. Idempotent under
    /// immediate re-run: a successful escalation pushes the deadline
    /// forward, so the next sweep skips the referral.
    pub async fn run_escalation_sweep(&self) -> RoutingResult<SweepOutcome> {
        let now = Utc::now();
        let overdue: Vec<Referral> = self
            .referrals
            .list_by_status(ReferralStatus::Pending)
            .await?
            .into_iter()
            .filter(|r| r.escalation_deadline < now)
            .collect();

        let examined = overdue.len();
        let mut escalated = 0;
        for candidate in overdue {
            let _guard = self.transition_lock.lock().await;
            // Decision was made outside the lock; re-read before committing.
            let Some(mut current) = self.referrals.get(&candidate.id).await? else {
                continue;
            };
            if current.status != ReferralStatus::Pending
                || current.escalation_deadline >= Utc::now()
            {
                continue;
            }
            match self.escalate_locked(&mut current, DEADLINE_EXCEEDED).await {
                Ok(EscalationOutcome::AutoEscalated) => escalated += 1,
                Ok(EscalationOutcome::Exhausted) => {}
                Err(e) => {
                    error!("sweep failed to escalate referral {}: {}", candidate.id, e)
                }
            }
        }
        if examined > 0 {
            info!(
                "escalation sweep: {} overdue, {} re-routed",
                examined, escalated
            );
        }
        Ok(SweepOutcome { examined, escalated })
    }

    /// The escalation algorithm proper. Caller must hold the transition
    /// lock. Either completes the full re-routing or leaves the referral
    /// entirely unchanged (exhausted case).
    async fn escalate_locked(
        &self,
        referral: &mut Referral,
        reason: &str,
    ) -> RoutingResult<EscalationOutcome> {
        let excluded = referral.excluded_hospitals();
        let mut alternatives: Vec<_> = self
            .facilities
            .list_approved()
            .await?
            .into_iter()
            .filter(|f| f.is_eligible() && !excluded.contains(&f.id))
            .collect();
        alternatives.sort_by(|a, b| {
            a.distance_km
                .total_cmp(&b.distance_km)
                .then(a.id.cmp(&b.id))
        });

        let Some(target) = alternatives.into_iter().next() else {
            self.escalation_logs
                .append(EscalationLog {
                    id: Uuid::new_v4(),
                    referral_id: referral.id,
                    from_hospital_id: referral.hospital_id,
                    from_hospital_name: referral.hospital_name.clone(),
                    to_hospital_id: None,
                    to_hospital_name: None,
                    reason: reason.to_string(),
                    outcome: EscalationOutcome::Exhausted,
                    time: Utc::now(),
                })
                .await?;
            warn!(
                "escalation exhausted for referral {}: no alternative to {}",
                referral.id, referral.hospital_name
            );
            self.emit(
                NotificationTarget::Doctor,
                "Escalation failed",
                &format!(
                    "No alternative facility found for {} ({})",
                    referral.patient.name, reason
                ),
                NotificationSeverity::Critical,
                Some(referral.id),
            )
            .await;
            return Ok(EscalationOutcome::Exhausted);
        };

        let from_id = referral.hospital_id;
        let from_name = referral.hospital_name.clone();

        if let Some(reservation_id) = referral.reservation_id {
            self.reservations
                .release(&reservation_id, ReservationStatus::Escalated)
                .await?;
        }

        let now = Utc::now();
        referral.escalation_history.push(EscalationRecord {
            hospital_id: from_id,
            hospital_name: from_name.clone(),
            reason: reason.to_string(),
            time: now,
        });
        referral.hospital_id = target.id;
        referral.hospital_name = target.name.clone();
        referral.status = ReferralStatus::Pending;
        referral.escalation_deadline = now + self.config.deadline_offset(referral.urgency);

        let reservation = self.reservations.reserve(referral, &target.id).await?;
        referral.reservation_id = Some(reservation.id);

        // Recompute delay risk against the counters as reserved.
        if let Some(updated) = self.facilities.get(&target.id).await? {
            referral.delay_risk = estimate_delay_risk(&updated, referral.urgency);
        }
        referral.updated_at = now;
        self.referrals.save(referral.clone()).await?;

        self.escalation_logs
            .append(EscalationLog {
                id: Uuid::new_v4(),
                referral_id: referral.id,
                from_hospital_id: from_id,
                from_hospital_name: from_name.clone(),
                to_hospital_id: Some(target.id),
                to_hospital_name: Some(target.name.clone()),
                reason: reason.to_string(),
                outcome: EscalationOutcome::AutoEscalated,
                time: now,
            })
            .await?;
        info!(
            "referral {} escalated from {} to {} ({})",
            referral.id, from_name, target.name, reason
        );

        self.emit(
            NotificationTarget::Doctor,
            "Referral re-routed",
            &format!("Referral moved from {} to {}", from_name, target.name),
            NotificationSeverity::Warning,
            Some(referral.id),
        )
        .await;
        self.emit(
            NotificationTarget::HospitalAdmin,
            "Incoming escalated referral",
            &format!(
                "Escalated {:?} referral for {}",
                referral.urgency, referral.patient.name
            ),
            severity_of(referral),
            Some(referral.id),
        )
        .await;
        self.emit(
            NotificationTarget::Patient,
            "Referral update",
            &format!("You have been re-routed to {}", target.name),
            NotificationSeverity::Info,
            Some(referral.id),
        )
        .await;
        Ok(EscalationOutcome::AutoEscalated)
    }

    async fn load(&self, id: Uuid) -> RoutingResult<Referral> {
        self.referrals
            .get(&id)
            .await?
            .ok_or_else(|| RoutingError::referral_not_found(id))
    }

    /// Fire-and-forget: a failing sink must never fail the transition.
    async fn emit(
        &self,
        target: NotificationTarget,
        title: &str,
        message: &str,
        severity: NotificationSeverity,
        referral_id: Option<Uuid>,
    ) {
        if let Err(e) = self
            .notifier
            .notify(target, title, message, severity, referral_id)
            .await
        {
            warn!("notification to {} failed (ignored): {}", target, e);
        }
    }
}

fn require_status(
    referral: &Referral,
    expected: ReferralStatus,
    operation: &'static str,
) -> RoutingResult<()> {
    if referral.status != expected {
        return Err(RoutingError::InvalidState {
            operation,
            expected: match expected {
                ReferralStatus::Pending => "Pending",
                ReferralStatus::Accepted => "Accepted",
                ReferralStatus::Rejected => "Rejected",
                ReferralStatus::Admitted => "Admitted",
                ReferralStatus::Completed => "Completed",
            },
            found: referral.status.to_string(),
        });
    }
    Ok(())
}

fn severity_of(referral: &Referral) -> NotificationSeverity {
    if referral.urgency.is_emergency() {
        NotificationSeverity::Critical
    } else {
        NotificationSeverity::Info
    }
}
