//! Review Synthesizer
//!
//! One fixed template per risk level.

use crate::models::{EvidenceEntry, RiskLevel};

pub fn synthesize(level: RiskLevel, score: u32, evidence: &[EvidenceEntry]) -> String {
    // Oracle-only escalations carry no lexical evidence
    let terms = if evidence.is_empty() {
        String::new()
    } else {
        let joined = evidence
            .iter()
            .map(|e| e.term.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        format!(" ({})", joined)
    };

    match level {
        RiskLevel::None => {
            "No risk indicators detected in the conversation.".to_string()
        }
        RiskLevel::Low => format!(
            "Low risk (score {}): mild stress indicators present. Routine follow-up is sufficient.",
            score
        ),
        RiskLevel::Medium => format!(
            "Moderate risk (score {}): emotional distress detected{}. Counselling is advised.",
            score, terms
        ),
        RiskLevel::High => format!(
            "High risk (score {}): significant distress indicators{}. Counselling is required.",
            score, terms
        ),
        RiskLevel::Severe => format!(
            "SEVERE RISK (score {}): crisis indicators detected{}. Immediate intervention required.",
            score, terms
        ),
    }
}
