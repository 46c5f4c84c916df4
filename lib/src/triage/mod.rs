// lib/src/triage/mod.rs

//! Triage heuristics: symptom severity classification and per-facility
//! delay risk. Both are pure functions; nothing here touches storage.

pub mod delay_risk;
pub mod severity;

pub use delay_risk::estimate_delay_risk;
pub use severity::classify_severity;
