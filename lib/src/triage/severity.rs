// lib/src/triage/severity.rs

//! Keyword-tier severity classifier.
//!
//! Three disjoint tiers of indicator phrases are matched as case-insensitive
//! substrings of the free-text symptoms. Every match contributes its tier
//! weight; context flags (emergency, ICU, named specialist) add fixed
//! bonuses on top. The score is clamped to [0, 100] and mapped to a level.

use models::{SeverityAssessment, SeverityLevel, Urgency};

const CRITICAL_WEIGHT: i32 = 40;
const HIGH_WEIGHT: i32 = 25;
const MODERATE_WEIGHT: i32 = 10;

const EMERGENCY_BONUS: i32 = 30;
const ICU_BONUS: i32 = 20;
const SPECIALIST_BONUS: i32 = 10;

/// Only the first five matched reasons are reported.
const MAX_REASONS: usize = 5;

static CRITICAL_KEYWORDS: &[&str] = &[
    "unconscious",
    "unresponsive",
    "not breathing",
    "shortness of breath",
    "chest pain",
    "cardiac arrest",
    "heart attack",
    "stroke",
    "severe bleeding",
    "seizure",
];

static HIGH_KEYWORDS: &[&str] = &[
    "difficulty breathing",
    "high fever",
    "fracture",
    "head injury",
    "severe pain",
    "burns",
    "poisoning",
    "snake bite",
    "labor",
];

static MODERATE_KEYWORDS: &[&str] = &[
    "fever",
    "vomiting",
    "diarrhea",
    "dizziness",
    "persistent cough",
    "infection",
    "dehydration",
    "abdominal pain",
    "headache",
];

/// Classifies reported symptoms into a triage severity.
///
/// Deterministic and total: empty input yields a Stable assessment scored
/// from the context flags alone.
pub fn classify_severity(
    symptoms: &str,
    urgency: Urgency,
    needs_icu: bool,
    specialist: Option<&str>,
) -> SeverityAssessment {
    let text = symptoms.to_lowercase();
    let mut score: i32 = 0;
    let mut reasons: Vec<String> = Vec::new();

    for keyword in CRITICAL_KEYWORDS {
        if text.contains(keyword) {
            score += CRITICAL_WEIGHT;
            reasons.push(format!("Critical indicator: {}", keyword));
        }
    }
    for keyword in HIGH_KEYWORDS {
        if text.contains(keyword) {
            score += HIGH_WEIGHT;
            reasons.push(format!("Serious indicator: {}", keyword));
        }
    }
    for keyword in MODERATE_KEYWORDS {
        if text.contains(keyword) {
            score += MODERATE_WEIGHT;
            reasons.push(format!("Notable symptom: {}", keyword));
        }
    }

    if urgency.is_emergency() {
        score += EMERGENCY_BONUS;
        reasons.push("Marked as emergency by referring doctor".to_string());
    }
    if needs_icu {
        score += ICU_BONUS;
        reasons.push("ICU care requested".to_string());
    }
    if let Some(name) = specialist {
        if is_named_specialist(name) {
            score += SPECIALIST_BONUS;
            reasons.push(format!("Specialist referral: {}", name));
        }
    }

    let score = score.clamp(0, 100) as u8;
    reasons.truncate(MAX_REASONS);

    SeverityAssessment {
        level: level_for(score),
        score,
        reasons,
    }
}

fn level_for(score: u8) -> SeverityLevel {
    if score >= 60 {
        SeverityLevel::Critical
    } else if score >= 40 {
        SeverityLevel::HighPriority
    } else if score >= 20 {
        SeverityLevel::Moderate
    } else {
        SeverityLevel::Stable
    }
}

/// "General" (or blank) is the default referral target, not a named
/// specialist request.
fn is_named_specialist(name: &str) -> bool {
    let trimmed = name.trim();
    !trimmed.is_empty() && !trimmed.eq_ignore_ascii_case("general")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_stable() {
        let assessment = classify_severity("", Urgency::Normal, false, None);
        assert_eq!(assessment.level, SeverityLevel::Stable);
        assert_eq!(assessment.score, 0);
        assert!(assessment.reasons.is_empty());
    }

    #[test]
    fn score_is_always_clamped() {
        // Every critical keyword at once blows far past 100 before clamping.
        let symptoms = CRITICAL_KEYWORDS.join(", ");
        let assessment =
            classify_severity(&symptoms, Urgency::Emergency, true, Some("Cardiology"));
        assert_eq!(assessment.score, 100);
        assert_eq!(assessment.level, SeverityLevel::Critical);
    }

    #[test]
    fn chest_pain_emergency_is_critical() {
        // "severe chest pain and shortness of breath" hits two critical
        // indicators (80) plus the emergency bonus (30), clamped to 100.
        let assessment = classify_severity(
            "severe chest pain and shortness of breath",
            Urgency::Emergency,
            false,
            None,
        );
        assert!(assessment.score >= 75);
        assert_eq!(assessment.level, SeverityLevel::Critical);
    }

    #[test]
    fn weights_accumulate_across_tiers() {
        // "high fever" matches both the high tier and the moderate "fever".
        let assessment = classify_severity("high fever", Urgency::Normal, false, None);
        assert_eq!(assessment.score, 35);
        assert_eq!(assessment.level, SeverityLevel::Moderate);
        assert_eq!(assessment.reasons.len(), 2);
    }

    #[test]
    fn context_bonuses_apply_without_keywords() {
        let assessment =
            classify_severity("feeling unwell", Urgency::Emergency, true, Some("Neurology"));
        assert_eq!(assessment.score, 60);
        assert_eq!(assessment.level, SeverityLevel::Critical);
    }

    #[test]
    fn general_specialist_earns_no_bonus() {
        let with_general = classify_severity("fever", Urgency::Normal, false, Some("General"));
        let with_none = classify_severity("fever", Urgency::Normal, false, None);
        assert_eq!(with_general.score, with_none.score);
    }

    #[test]
    fn reasons_are_capped_at_five_in_match_order() {
        let symptoms = "unconscious, chest pain, stroke, seizure, high fever, vomiting";
        let assessment = classify_severity(symptoms, Urgency::Emergency, true, None);
        assert_eq!(assessment.reasons.len(), 5);
        assert!(assessment.reasons[0].contains("unconscious"));
        // Truncation keeps the first matches, it never reorders.
        assert!(assessment.reasons.iter().all(|r| !r.contains("vomiting")));
    }

    #[test]
    fn level_thresholds_are_total() {
        assert_eq!(level_for(0), SeverityLevel::Stable);
        assert_eq!(level_for(19), SeverityLevel::Stable);
        assert_eq!(level_for(20), SeverityLevel::Moderate);
        assert_eq!(level_for(39), SeverityLevel::Moderate);
        assert_eq!(level_for(40), SeverityLevel::HighPriority);
        assert_eq!(level_for(59), SeverityLevel::HighPriority);
        assert_eq!(level_for(60), SeverityLevel::Critical);
        assert_eq!(level_for(100), SeverityLevel::Critical);
    }
}
