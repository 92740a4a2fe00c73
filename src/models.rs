//! Core data models for transcript risk classification

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

//
// ================= Enums =================
//

/// Ordinal severity assigned to a transcript.
///
/// Serialized with the labels the dashboard glue expects
/// (`"no"`, `"low"`, `"medium"`, `"high"`, `"severe"`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[serde(rename = "no", alias = "none")]
    None,
    Low,
    Medium,
    High,
    Severe,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CounsellingRecommendation {
    #[serde(rename = "no", alias = "none")]
    None,
    Advised,
    #[serde(rename = "yes", alias = "required")]
    Required,
}

/// Vocabulary tier a piece of evidence was matched from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TierName {
    CriticalSevere,
    SeverePlan,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

//
// ================= Ordering =================
//

impl RiskLevel {
    pub const ALL: [RiskLevel; 5] = [
        RiskLevel::None,
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Severe,
    ];

    fn rank(&self) -> u8 {
        match self {
            RiskLevel::None => 0,
            RiskLevel::Low => 1,
            RiskLevel::Medium => 2,
            RiskLevel::High => 3,
            RiskLevel::Severe => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::None => "no",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Severe => "severe",
        }
    }
}

impl PartialOrd for RiskLevel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RiskLevel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl CounsellingRecommendation {
    fn rank(&self) -> u8 {
        match self {
            CounsellingRecommendation::None => 0,
            CounsellingRecommendation::Advised => 1,
            CounsellingRecommendation::Required => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CounsellingRecommendation::None => "no",
            CounsellingRecommendation::Advised => "advised",
            CounsellingRecommendation::Required => "yes",
        }
    }
}

impl PartialOrd for CounsellingRecommendation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CounsellingRecommendation {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl TierName {
    pub fn as_str(&self) -> &'static str {
        match self {
            TierName::CriticalSevere => "critical_severe",
            TierName::SeverePlan => "severe_plan",
            TierName::High => "high",
            TierName::Medium => "medium",
            TierName::Low => "low",
        }
    }
}

//
// ================= Evidence =================
//

/// A matched phrase (or synthetic pattern id) and the tier it came from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvidenceEntry {
    pub term: String,
    pub category: TierName,
}

impl EvidenceEntry {
    pub fn new(term: impl Into<String>, category: TierName) -> Self {
        Self {
            term: term.into(),
            category,
        }
    }
}

//
// ================= Oracle =================
//

/// Second opinion parsed from the external language model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OracleJudgment {
    pub risk_level: RiskLevel,
    pub counselling_needed: CounsellingRecommendation,
    pub immediate_intervention: bool,
    pub assessment_summary: String,
    pub confidence_level: ConfidenceLevel,
    pub concerning_phrases: Vec<String>,
    /// Untouched oracle payload, kept for audit
    pub raw: serde_json::Value,
}

//
// ================= Final Result =================
//

/// The engine's only output. Field names on the wire follow the
/// contract the storage and dashboard layers already read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    #[serde(rename = "tendency")]
    pub risk_level: RiskLevel,
    #[serde(rename = "needsCounselling")]
    pub counselling_recommendation: CounsellingRecommendation,
    pub score: u32,
    #[serde(rename = "detectedTerms")]
    pub evidence: Vec<EvidenceEntry>,
    pub immediate_intervention: bool,
    pub review: String,
    #[serde(rename = "geminiAnalysis")]
    pub oracle_judgment: Option<OracleJudgment>,
}

fn has_critical_evidence(evidence: &[EvidenceEntry]) -> bool {
    evidence
        .iter()
        .any(|e| e.category == TierName::CriticalSevere)
}

/// Immediate intervention is never set on its own; it always follows
/// from the final level, the evidence, and the oracle's own flag.
pub fn requires_immediate_intervention(
    risk_level: RiskLevel,
    evidence: &[EvidenceEntry],
    oracle: Option<&OracleJudgment>,
) -> bool {
    risk_level == RiskLevel::Severe
        || has_critical_evidence(evidence)
        || oracle.map(|o| o.immediate_intervention).unwrap_or(false)
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::None => "None",
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Severe => "Severe",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for CounsellingRecommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CounsellingRecommendation::None => "Not needed",
            CounsellingRecommendation::Advised => "Advised",
            CounsellingRecommendation::Required => "Required",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for TierName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
