// models/src/referral.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Urgency {
    Normal,
    Emergency,
}

impl Urgency {
    pub fn is_emergency(&self) -> bool {
        matches!(self, Urgency::Emergency)
    }
}

/// Referral lifecycle states. Transitions are owned exclusively by the
/// referral service; escalation re-targets a Pending or Rejected referral
/// back to Pending against a new facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferralStatus {
    Pending,
    Accepted,
    Rejected,
    Admitted,
    Completed,
}

impl fmt::Display for ReferralStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReferralStatus::Pending => "Pending",
            ReferralStatus::Accepted => "Accepted",
            ReferralStatus::Rejected => "Rejected",
            ReferralStatus::Admitted => "Admitted",
            ReferralStatus::Completed => "Completed",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeverityLevel {
    Critical,
    HighPriority,
    Moderate,
    Stable,
}

/// Triage classification computed once at referral creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeverityAssessment {
    pub level: SeverityLevel,
    /// Clamped to [0, 100].
    pub score: u8,
    /// At most the first five matched reasons, in match order.
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

/// Estimate of transit/admission delay for one facility, recomputed whenever
/// the referral is re-targeted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelayRiskAssessment {
    pub level: RiskLevel,
    /// Clamped to [0, 100].
    pub score: u8,
    /// Joined factors, or the fixed safe-limits sentinel when none apply.
    pub reason: String,
    pub factors: Vec<String>,
}

/// Patient details copied at creation time — not a live reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientSnapshot {
    pub name: String,
    pub age: u32,
    pub village: String,
    pub contact: Option<String>,
}

/// One re-routing step in a referral's history. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationRecord {
    pub hospital_id: Uuid,
    pub hospital_name: String,
    pub reason: String,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Referral {
    pub id: Uuid,
    pub patient: PatientSnapshot,
    pub symptoms: String,
    pub urgency: Urgency,
    pub specialist_needed: Option<String>,
    pub needs_icu: bool,
    /// Current target facility; mutable under escalation only.
    pub hospital_id: Uuid,
    pub hospital_name: String,
    pub status: ReferralStatus,
    pub severity: SeverityAssessment,
    pub delay_risk: DelayRiskAssessment,
    pub escalation_deadline: DateTime<Utc>,
    pub escalation_history: Vec<EscalationRecord>,
    /// The currently active reservation, if any.
    pub reservation_id: Option<Uuid>,
    pub notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub ward: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Referral {
    /// ICU is needed either by explicit request or implicitly for any
    /// emergency referral.
    pub fn requires_icu(&self) -> bool {
        self.needs_icu || self.urgency.is_emergency()
    }

    /// Facilities already tried, including the current target. Escalation
    /// must never re-route to any of these.
    pub fn excluded_hospitals(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = vec![self.hospital_id];
        for record in &self.escalation_history {
            if !ids.contains(&record.hospital_id) {
                ids.push(record.hospital_id);
            }
        }
        ids
    }
}
