// models/src/lib.rs

//! Shared domain entities for the referral routing core: facilities,
//! referrals, reservations, escalation audit records, notifications, and
//! the error taxonomy every crate in the workspace speaks.

pub mod errors;
pub mod facility;
pub mod referral;
pub mod reservation;
pub mod escalation;
pub mod notifications;

// Explicit re-exports so downstream crates can use `models::Facility` etc.
pub use crate::errors::{RoutingError, RoutingResult};
pub use crate::facility::Facility;
pub use crate::referral::{
    DelayRiskAssessment, EscalationRecord, PatientSnapshot, Referral, ReferralStatus, RiskLevel,
    SeverityAssessment, SeverityLevel, Urgency,
};
pub use crate::reservation::{Reservation, ReservationStatus};
pub use crate::escalation::{EscalationLog, EscalationOutcome};
pub use crate::notifications::{NotificationSeverity, NotificationTarget};
