// lib/src/lib.rs

//! Referral routing and escalation core.
//!
//! The engine ranks facilities for a referral, takes provisional resource
//! holds, drives the referral lifecycle, and re-routes overdue or rejected
//! referrals to the nearest untried alternative. HTTP, auth, and persistence
//! technology live outside this crate; they reach the core through the
//! repository and notification traits in [`storage`] and [`notifications`].

pub mod config;
pub mod triage;
pub mod scoring;
pub mod storage;
pub mod notifications;
pub mod reservation;
pub mod referral;
pub mod scheduler;

// Import shared domain types directly from the 'models' crate.
pub use models::{RoutingError, RoutingResult};

// Explicit re-exports
pub use crate::config::CoreConfig;
pub use crate::triage::{classify_severity, estimate_delay_risk};
pub use crate::scoring::{ScoredFacility, ScoringCriteria, ScoringEngine};
pub use crate::storage::{
    EscalationLogRepository, FacilityRepository, InMemoryStore, ReferralRepository,
    ReservationRepository,
};
pub use crate::notifications::{LogNotifier, NotificationSink};
pub use crate::reservation::ReservationManager;
pub use crate::referral::{CreateReferralRequest, ReferralService, SweepOutcome};
pub use crate::scheduler::EscalationScheduler;
