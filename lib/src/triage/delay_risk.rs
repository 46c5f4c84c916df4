// lib/src/triage/delay_risk.rs

//! Delay risk estimator: how likely is transit or admission delay for one
//! facility, given its current counters and the referral urgency.

use models::{DelayRiskAssessment, Facility, RiskLevel, Urgency};

/// Reported when no contributing factor applies.
pub const SAFE_LIMITS_SENTINEL: &str = "Hospital is within safe operating limits";

/// Emergency transfers amplify every delay factor.
const EMERGENCY_MULTIPLIER: f64 = 1.3;

/// Estimates delay risk from a facility snapshot. Pure function of the
/// snapshot's counters; the caller re-runs it whenever the referral is
/// re-targeted.
pub fn estimate_delay_risk(facility: &Facility, urgency: Urgency) -> DelayRiskAssessment {
    let mut score: i64 = 0;
    let mut factors: Vec<String> = Vec::new();

    let icu_occupancy = icu_occupancy_pct(facility);
    let load = hospital_load_pct(facility);

    if facility.distance_km > 35.0 {
        score += 35;
        factors.push(format!(
            "Long transfer distance ({:.1} km)",
            facility.distance_km
        ));
    } else if facility.distance_km > 20.0 {
        score += 20;
        factors.push(format!(
            "Moderate transfer distance ({:.1} km)",
            facility.distance_km
        ));
    } else {
        score += 5;
    }

    if icu_occupancy > 80.0 {
        score += 30;
        factors.push(format!("ICU occupancy critical ({:.0}%)", icu_occupancy));
    } else if icu_occupancy > 60.0 {
        score += 15;
        factors.push(format!("ICU occupancy elevated ({:.0}%)", icu_occupancy));
    }

    if load > 85.0 {
        score += 25;
        factors.push(format!("Hospital heavily loaded ({:.0}%)", load));
    } else if load > 65.0 {
        score += 10;
        factors.push(format!("Hospital load elevated ({:.0}%)", load));
    }

    if facility.ambulance_eta_min > 40 {
        score += 20;
        factors.push(format!(
            "Long ambulance ETA ({} min)",
            facility.ambulance_eta_min
        ));
    } else if facility.ambulance_eta_min > 25 {
        score += 10;
        factors.push(format!(
            "Moderate ambulance ETA ({} min)",
            facility.ambulance_eta_min
        ));
    }

    if urgency.is_emergency() {
        score = (score as f64 * EMERGENCY_MULTIPLIER).round() as i64;
    }

    let score = score.clamp(0, 100) as u8;
    let reason = if factors.is_empty() {
        SAFE_LIMITS_SENTINEL.to_string()
    } else {
        factors.join("; ")
    };

    DelayRiskAssessment {
        level: level_for(score),
        score,
        reason,
        factors,
    }
}

/// Share of installed ICU capacity currently in use. Zero when the facility
/// has no ICU at all.
fn icu_occupancy_pct(facility: &Facility) -> f64 {
    if facility.total_icu_beds == 0 {
        return 0.0;
    }
    let occupied = facility.total_icu_beds.saturating_sub(facility.icu_beds);
    occupied as f64 / facility.total_icu_beds as f64 * 100.0
}

/// Share of total beds occupied or provisionally held.
fn hospital_load_pct(facility: &Facility) -> f64 {
    if facility.total_beds == 0 {
        return 0.0;
    }
    let in_use = facility
        .total_beds
        .saturating_sub(facility.available_beds)
        .saturating_add(facility.reserved_beds);
    in_use as f64 / facility.total_beds as f64 * 100.0
}

fn level_for(score: u8) -> RiskLevel {
    if score >= 60 {
        RiskLevel::High
    } else if score >= 30 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::{BTreeMap, BTreeSet};
    use uuid::Uuid;

    fn facility() -> Facility {
        Facility {
            id: Uuid::new_v4(),
            name: "St. Jude Referral".to_string(),
            total_beds: 40,
            available_beds: 30,
            reserved_beds: 0,
            total_icu_beds: 10,
            icu_beds: 8,
            reserved_icu: 0,
            specialists: BTreeSet::new(),
            specialist_slots: BTreeMap::new(),
            distance_km: 10.0,
            ambulance_eta_min: 15,
            equipment: BTreeSet::new(),
            approved: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn quiet_nearby_facility_is_low_risk() {
        let assessment = estimate_delay_risk(&facility(), Urgency::Normal);
        // Only the baseline +5 for a short transfer applies.
        assert_eq!(assessment.score, 5);
        assert_eq!(assessment.level, RiskLevel::Low);
        assert_eq!(assessment.reason, SAFE_LIMITS_SENTINEL);
        assert!(assessment.factors.is_empty());
    }

    #[test]
    fn no_icu_means_zero_occupancy() {
        let mut f = facility();
        f.total_icu_beds = 0;
        f.icu_beds = 0;
        assert_eq!(icu_occupancy_pct(&f), 0.0);
    }

    #[test]
    fn emergency_multiplier_rounds() {
        let mut f = facility();
        f.distance_km = 30.0; // +20
        let normal = estimate_delay_risk(&f, Urgency::Normal);
        let emergency = estimate_delay_risk(&f, Urgency::Emergency);
        assert_eq!(normal.score, 20);
        // 20 * 1.3 = 26
        assert_eq!(emergency.score, 26);
    }

    #[test]
    fn saturated_facility_is_high_risk_and_clamped() {
        let mut f = facility();
        f.distance_km = 50.0; // +35
        f.icu_beds = 0; // 100% occupancy, +30
        f.available_beds = 2;
        f.reserved_beds = 2; // load 100%, +25
        f.ambulance_eta_min = 55; // +20
        let assessment = estimate_delay_risk(&f, Urgency::Emergency);
        // 110 * 1.3 = 143, clamped.
        assert_eq!(assessment.score, 100);
        assert_eq!(assessment.level, RiskLevel::High);
        assert_eq!(assessment.factors.len(), 4);
        assert!(assessment.reason.contains("; "));
    }

    #[test]
    fn load_counts_provisional_holds() {
        let mut f = facility();
        f.total_beds = 10;
        f.available_beds = 4;
        f.reserved_beds = 2;
        // (10 - 4 + 2) / 10 = 80%
        assert!((hospital_load_pct(&f) - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn level_thresholds() {
        assert_eq!(level_for(29), RiskLevel::Low);
        assert_eq!(level_for(30), RiskLevel::Medium);
        assert_eq!(level_for(59), RiskLevel::Medium);
        assert_eq!(level_for(60), RiskLevel::High);
    }
}
