// models/src/escalation.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscalationOutcome {
    /// Re-routed to the nearest eligible alternative.
    AutoEscalated,
    /// No alternative facility existed; the referral was left untouched.
    Exhausted,
}

/// Append-only audit record of one re-routing attempt. Never mutated after
/// creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationLog {
    pub id: Uuid,
    pub referral_id: Uuid,
    pub from_hospital_id: Uuid,
    pub from_hospital_name: String,
    /// None when no alternative was found.
    pub to_hospital_id: Option<Uuid>,
    pub to_hospital_name: Option<String>,
    pub reason: String,
    pub outcome: EscalationOutcome,
    pub time: DateTime<Utc>,
}

impl EscalationLog {
    pub fn result_label(&self) -> &'static str {
        match self.outcome {
            EscalationOutcome::AutoEscalated => "Auto-escalated",
            EscalationOutcome::Exhausted => "Failed - no alternatives",
        }
    }
}
