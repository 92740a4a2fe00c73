//! Oracle trait and implementations
//!
//! The oracle is an optional language-model second opinion. It may only
//! escalate the lexical classification, never lower it.

use crate::config::{OracleSettings, Thresholds};
use crate::gemini::GeminiClient;
use crate::models::{CounsellingRecommendation, EvidenceEntry, OracleJudgment, RiskLevel};
use crate::tendency::{recommend_counselling, score_consistent_with};
use crate::Result;
use async_trait::async_trait;
use tracing::debug;

pub mod parser;
pub mod prompt;

pub use parser::parse_oracle_response;

/// What the lexical pass concluded, handed to the oracle as context
#[derive(Debug, Clone, Copy)]
pub struct LexicalFinding<'a> {
    pub risk_level: RiskLevel,
    pub score: u32,
    pub evidence: &'a [EvidenceEntry],
}

/// Trait for risk oracles (LLM backed)
#[async_trait]
pub trait Oracle: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Ok(None)` means the oracle answered but nothing usable came back
    async fn assess(
        &self,
        transcript: &str,
        finding: &LexicalFinding<'_>,
    ) -> Result<Option<OracleJudgment>>;
}

/// Gemini-backed oracle
pub struct GeminiOracle {
    client: GeminiClient,
}

impl GeminiOracle {
    /// `None` when no credential is configured
    pub fn from_settings(settings: &OracleSettings) -> Result<Option<Self>> {
        let Some(api_key) = settings.api_key.clone() else {
            return Ok(None);
        };

        Ok(Some(Self {
            client: GeminiClient::new(api_key, &settings.model, settings.timeout)?,
        }))
    }
}

#[async_trait]
impl Oracle for GeminiOracle {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn assess(
        &self,
        transcript: &str,
        finding: &LexicalFinding<'_>,
    ) -> Result<Option<OracleJudgment>> {
        let user_prompt = prompt::build_prompt(transcript, finding);
        let response = self
            .client
            .generate(prompt::SYSTEM_PROMPT, &user_prompt)
            .await?;

        let judgment = parse_oracle_response(&response);
        if judgment.is_none() {
            debug!(response_len = response.len(), "Gemini response held no usable judgment");
        }
        Ok(judgment)
    }
}

/// Canned oracle for development & testing.
/// Runs its fixed response text through the real parser chain.
pub struct MockOracle {
    response: String,
}

impl MockOracle {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

#[async_trait]
impl Oracle for MockOracle {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn assess(
        &self,
        _transcript: &str,
        _finding: &LexicalFinding<'_>,
    ) -> Result<Option<OracleJudgment>> {
        Ok(parse_oracle_response(&self.response))
    }
}

//
// ================= Reconciliation =================
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciled {
    pub risk_level: RiskLevel,
    pub counselling: CounsellingRecommendation,
    pub score: u32,
    pub escalated: bool,
}

/// Merge an oracle judgment into the lexical outcome.
///
/// The oracle wins only when it is strictly more severe; the score is then
/// re-derived so it sits at or above the new level's threshold. Counselling
/// takes the higher of the level-derived value and the oracle's own.
pub fn reconcile(
    lexical_level: RiskLevel,
    lexical_score: u32,
    judgment: &OracleJudgment,
    thresholds: &Thresholds,
) -> Reconciled {
    let escalated = judgment.risk_level > lexical_level;

    let (risk_level, score) = if escalated {
        (
            judgment.risk_level,
            score_consistent_with(judgment.risk_level, lexical_score, thresholds),
        )
    } else {
        (lexical_level, lexical_score)
    };

    let counselling = std::cmp::max(recommend_counselling(risk_level), judgment.counselling_needed);

    Reconciled {
        risk_level,
        counselling,
        score,
        escalated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConfidenceLevel;
    use crate::tendency::classify_tendency;

    fn judgment(level: RiskLevel, counselling: CounsellingRecommendation) -> OracleJudgment {
        OracleJudgment {
            risk_level: level,
            counselling_needed: counselling,
            immediate_intervention: false,
            assessment_summary: String::new(),
            confidence_level: ConfidenceLevel::Medium,
            concerning_phrases: vec![],
            raw: serde_json::Value::Null,
        }
    }

    #[test]
    fn test_oracle_escalates() {
        let t = Thresholds::default();
        let r = reconcile(
            RiskLevel::Low,
            2,
            &judgment(RiskLevel::High, CounsellingRecommendation::Required),
            &t,
        );

        assert!(r.escalated);
        assert_eq!(r.risk_level, RiskLevel::High);
        assert_eq!(r.score, t.high);
        assert_eq!(classify_tendency(r.score, &t), RiskLevel::High);
        assert_eq!(r.counselling, CounsellingRecommendation::Required);
    }

    #[test]
    fn test_oracle_never_deescalates() {
        let t = Thresholds::default();
        let r = reconcile(
            RiskLevel::Severe,
            25,
            &judgment(RiskLevel::None, CounsellingRecommendation::None),
            &t,
        );

        assert!(!r.escalated);
        assert_eq!(r.risk_level, RiskLevel::Severe);
        assert_eq!(r.score, 25);
        assert_eq!(r.counselling, CounsellingRecommendation::Required);
    }

    #[test]
    fn test_escalation_only_for_every_pair() {
        let threshold_sets = [
            Thresholds::default(),
            Thresholds { low: 1, medium: 4, high: 9, severe: 14 },
            Thresholds { low: 2, medium: 7, high: 8, severe: 12 },
            Thresholds { low: 1, medium: 2, high: 3, severe: 4 },
        ];

        for t in threshold_sets {
            assert!(t.validate().is_ok());
            for score in 0..=t.severe + 3 {
                let lexical = classify_tendency(score, &t);
                for oracle in RiskLevel::ALL {
                    let r = reconcile(
                        lexical,
                        score,
                        &judgment(oracle, CounsellingRecommendation::None),
                        &t,
                    );
                    assert_eq!(r.risk_level, std::cmp::max(lexical, oracle));
                    assert_eq!(r.escalated, oracle > lexical);
                    assert!(r.score >= score);
                    assert_eq!(
                        classify_tendency(r.score, &t),
                        r.risk_level,
                        "thresholds {:?}, score {}, oracle {:?}",
                        t,
                        score,
                        oracle
                    );
                }
            }
        }
    }

    #[test]
    fn test_counselling_takes_higher_without_level_change() {
        let t = Thresholds::default();
        let r = reconcile(
            RiskLevel::Low,
            1,
            &judgment(RiskLevel::Low, CounsellingRecommendation::Advised),
            &t,
        );

        assert!(!r.escalated);
        assert_eq!(r.risk_level, RiskLevel::Low);
        assert_eq!(r.score, 1);
        assert_eq!(r.counselling, CounsellingRecommendation::Advised);
    }

    #[tokio::test]
    async fn test_mock_oracle_uses_parser() {
        let oracle = MockOracle::new(
            "Sure! {\"riskLevel\": \"high\", \"counsellingNeeded\": \"yes\", \"immediateIntervention\": false}",
        );
        let finding = LexicalFinding {
            risk_level: RiskLevel::None,
            score: 0,
            evidence: &[],
        };

        let judgment = oracle.assess("anything", &finding).await.unwrap().unwrap();
        assert_eq!(judgment.risk_level, RiskLevel::High);
        assert_eq!(judgment.counselling_needed, CounsellingRecommendation::Required);
    }

    #[test]
    fn test_gemini_oracle_disabled_without_key() {
        let settings = OracleSettings::default();
        assert!(GeminiOracle::from_settings(&settings).unwrap().is_none());
    }
}
