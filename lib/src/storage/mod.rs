// lib/src/storage/mod.rs

//! Repository traits the core depends on. The engine never branches on
//! which backend is active; a MongoDB-backed implementation and the
//! in-memory adapter below are interchangeable.

pub mod inmemory;

use async_trait::async_trait;
use models::{
    EscalationLog, Facility, Referral, ReferralStatus, Reservation, RoutingResult,
};
use uuid::Uuid;

pub use inmemory::InMemoryStore;

#[async_trait]
pub trait FacilityRepository: Send + Sync {
    async fn get(&self, id: &Uuid) -> RoutingResult<Option<Facility>>;
    /// Approved facilities only, ordered by id ascending. The ordering is a
    /// contract: scoring and escalation tiebreaks depend on it being stable.
    async fn list_approved(&self) -> RoutingResult<Vec<Facility>>;
    /// Insert-or-replace by id.
    async fn save(&self, facility: Facility) -> RoutingResult<()>;
}

#[async_trait]
pub trait ReferralRepository: Send + Sync {
    async fn get(&self, id: &Uuid) -> RoutingResult<Option<Referral>>;
    async fn save(&self, referral: Referral) -> RoutingResult<()>;
    async fn list_by_status(&self, status: ReferralStatus) -> RoutingResult<Vec<Referral>>;
}

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    async fn get(&self, id: &Uuid) -> RoutingResult<Option<Reservation>>;
    async fn save(&self, reservation: Reservation) -> RoutingResult<()>;
    async fn list_for_referral(&self, referral_id: &Uuid) -> RoutingResult<Vec<Reservation>>;
}

#[async_trait]
pub trait EscalationLogRepository: Send + Sync {
    /// Logs are append-only; there is no update or delete.
    async fn append(&self, log: EscalationLog) -> RoutingResult<()>;
    async fn list_for_referral(&self, referral_id: &Uuid) -> RoutingResult<Vec<EscalationLog>>;
}
