//! Score → risk level → counselling mapping

use crate::config::Thresholds;
use crate::models::{CounsellingRecommendation, RiskLevel};

/// Map an accumulated score onto the ordinal risk scale
pub fn classify_tendency(score: u32, thresholds: &Thresholds) -> RiskLevel {
    if score >= thresholds.severe {
        RiskLevel::Severe
    } else if score >= thresholds.high {
        RiskLevel::High
    } else if score >= thresholds.medium {
        RiskLevel::Medium
    } else if score >= thresholds.low {
        RiskLevel::Low
    } else {
        RiskLevel::None
    }
}

/// Counselling is always derived from the level, never set directly
pub fn recommend_counselling(level: RiskLevel) -> CounsellingRecommendation {
    match level {
        RiskLevel::Severe | RiskLevel::High => CounsellingRecommendation::Required,
        RiskLevel::Medium => CounsellingRecommendation::Advised,
        RiskLevel::Low | RiskLevel::None => CounsellingRecommendation::None,
    }
}

/// Smallest score consistent with `level`, never lower than `score`.
///
/// Used when the oracle escalates: the score is re-derived from the new
/// level so `classify_tendency(result.score) == result.risk_level` holds.
pub fn score_consistent_with(level: RiskLevel, score: u32, thresholds: &Thresholds) -> u32 {
    score.max(thresholds.floor(level))
}
