// lib/src/scoring/mod.rs

//! Hospital scoring engine: ranks every eligible facility for a referral
//! request. Read-only — the caller picks a facility and the reservation
//! manager takes the actual holds.

use log::debug;
use models::{DelayRiskAssessment, Facility, RoutingResult, Urgency};
use std::sync::Arc;

use crate::storage::FacilityRepository;
use crate::triage::estimate_delay_risk;

/// What the referring doctor is asking for.
#[derive(Debug, Clone)]
pub struct ScoringCriteria {
    pub symptoms: String,
    pub urgency: Urgency,
    pub specialist_needed: Option<String>,
    pub needs_icu: bool,
}

/// One ranked facility with the evidence behind its rank.
#[derive(Debug, Clone)]
pub struct ScoredFacility {
    pub facility: Facility,
    /// Floored at 0; scores above 100 are legal.
    pub score: u32,
    pub delay_risk: DelayRiskAssessment,
    /// Informational heuristic only, never a scoring input.
    pub survival_chance: u8,
    pub justification: String,
}

pub struct ScoringEngine {
    facilities: Arc<dyn FacilityRepository>,
}

impl ScoringEngine {
    pub fn new(facilities: Arc<dyn FacilityRepository>) -> Self {
        ScoringEngine { facilities }
    }

    /// Ranks all eligible facilities (approved with unreserved beds) for the
    /// given criteria.
    ///
    /// Ordering contract: score descending, ties broken by facility id
    /// ascending. Deterministic regardless of store iteration order.
    pub async fn score_facilities(
        &self,
        criteria: &ScoringCriteria,
    ) -> RoutingResult<Vec<ScoredFacility>> {
        let facilities = self.facilities.list_approved().await?;
        let mut scored: Vec<ScoredFacility> = facilities
            .into_iter()
            .filter(|f| f.is_eligible())
            .map(|f| score_one(f, criteria))
            .collect();
        scored.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then(a.facility.id.cmp(&b.facility.id))
        });
        debug!(
            "scored {} facilities for urgency {:?}",
            scored.len(),
            criteria.urgency
        );
        Ok(scored)
    }
}

fn score_one(facility: Facility, criteria: &ScoringCriteria) -> ScoredFacility {
    let emergency = criteria.urgency.is_emergency();
    let mut score: f64 = 100.0;
    let mut parts: Vec<String> = Vec::new();

    // Long transit is riskier for urgent cases, so the penalty is harsher.
    let distance_factor = if emergency { 1.5 } else { 0.8 };
    let distance_penalty = distance_factor * facility.distance_km;
    score -= distance_penalty;
    parts.push(format!(
        "{:.1} km away (-{:.1})",
        facility.distance_km, distance_penalty
    ));

    if criteria.needs_icu || emergency {
        if facility.effective_icu() > 0 {
            score += 25.0;
            parts.push("ICU capacity available (+25)".to_string());
        } else {
            score -= 40.0;
            parts.push("no ICU capacity (-40)".to_string());
        }
    }

    if let Some(specialty) = &criteria.specialist_needed {
        if facility.has_specialist(specialty) {
            if facility.remaining_specialist_slots(specialty) > 0 {
                score += 30.0;
                parts.push(format!("{} on staff with open slots (+30)", specialty));
            } else {
                score += 10.0;
                parts.push(format!("{} on staff, slots exhausted (+10)", specialty));
            }
        } else {
            score -= 25.0;
            parts.push(format!("no {} on staff (-25)", specialty));
        }
    }

    let bed_ratio = if facility.total_beds == 0 {
        0.0
    } else {
        facility.effective_beds() as f64 / facility.total_beds as f64
    };
    if bed_ratio > 0.5 {
        score += 15.0;
        parts.push("ample free beds (+15)".to_string());
    } else if bed_ratio > 0.2 {
        score += 5.0;
        parts.push("some free beds (+5)".to_string());
    } else {
        score -= 10.0;
        parts.push("beds nearly full (-10)".to_string());
    }

    if emergency && facility.equipment.contains("Ventilator") {
        score += 10.0;
        parts.push("ventilator on site (+10)".to_string());
    }

    if facility.ambulance_eta_min <= 20 {
        score += 10.0;
        parts.push(format!(
            "ambulance ETA {} min (+10)",
            facility.ambulance_eta_min
        ));
    }

    let survival = survival_chance(facility.ambulance_eta_min, criteria.urgency);
    let delay_risk = estimate_delay_risk(&facility, criteria.urgency);
    ScoredFacility {
        score: score.round().max(0.0) as u32,
        delay_risk,
        survival_chance: survival,
        justification: parts.join("; "),
        facility,
    }
}

/// Logistic decay of survival likelihood over ambulance ETA. Steeper for
/// emergencies. Purely informational.
pub fn survival_chance(eta_min: u32, urgency: Urgency) -> u8 {
    let k = if urgency.is_emergency() { 0.08 } else { 0.05 };
    let chance = 100.0 / (1.0 + (k * (eta_min as f64 - 45.0)).exp());
    chance.round().clamp(0.0, 100.0) as u8
}
