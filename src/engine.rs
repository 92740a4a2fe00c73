//! Risk engine - runs the classification pipeline
//!
//! TRANSCRIPT → SCORE → TENDENCY → COUNSELLING → ORACLE? → REVIEW → RESULT

use crate::config::ClassifierConfig;
use crate::error::ClassifierError;
use crate::models::{requires_immediate_intervention, ClassificationResult, OracleJudgment};
use crate::oracle::{reconcile, GeminiOracle, LexicalFinding, Oracle};
use crate::review::synthesize;
use crate::scorer::{self, LexicalScore};
use crate::tendency::{classify_tendency, recommend_counselling};
use crate::Result;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Stateless classifier. Cheap to share behind an `Arc`; concurrent
/// `classify` calls share nothing mutable.
pub struct RiskEngine {
    config: ClassifierConfig,
    oracle: Option<Arc<dyn Oracle>>,
}

impl RiskEngine {
    /// Validate `config` and build an engine without an oracle
    pub fn new(config: ClassifierConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            oracle: None,
        })
    }

    /// Validate `config` and attach a Gemini oracle when a key is configured
    pub fn from_config(config: ClassifierConfig) -> Result<Self> {
        let oracle = GeminiOracle::from_settings(&config.oracle)?;
        let engine = Self::new(config)?;

        Ok(match oracle {
            Some(oracle) => engine.with_oracle(Arc::new(oracle)),
            None => engine,
        })
    }

    pub fn with_oracle(mut self, oracle: Arc<dyn Oracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn oracle_enabled(&self) -> bool {
        self.oracle.is_some()
    }

    /// Lexical pass only
    pub fn score(&self, transcript: &str) -> LexicalScore {
        scorer::score(transcript, &self.config.lexicon)
    }

    /// Full result without consulting the oracle
    pub fn classify_lexical(&self, transcript: &str) -> ClassificationResult {
        let lexical = self.score(transcript);
        self.assemble(lexical, None).0
    }

    /// Classify a complete transcript. Never fails: oracle problems degrade
    /// to the lexical-only result.
    pub async fn classify(&self, transcript: &str) -> ClassificationResult {
        let start_time = Instant::now();
        let fingerprint = transcript_fingerprint(transcript);

        let lexical = self.score(transcript);
        let lexical_level = classify_tendency(lexical.score, &self.config.thresholds);

        debug!(
            transcript = %fingerprint,
            score = lexical.score,
            level = %lexical_level,
            evidence = lexical.evidence.len(),
            "Lexical pass complete"
        );

        let judgment = match &self.oracle {
            Some(oracle) if self.worth_consulting(transcript) => {
                let finding = LexicalFinding {
                    risk_level: lexical_level,
                    score: lexical.score,
                    evidence: &lexical.evidence,
                };
                self.consult_oracle(oracle.as_ref(), transcript, &finding, &fingerprint)
                    .await
            }
            Some(_) => {
                debug!(transcript = %fingerprint, "Transcript too short, oracle skipped");
                None
            }
            None => None,
        };

        let consulted = judgment.is_some();
        let (result, escalated) = self.assemble(lexical, judgment);

        info!(
            transcript = %fingerprint,
            level = %result.risk_level,
            score = result.score,
            evidence = result.evidence.len(),
            immediate_intervention = result.immediate_intervention,
            oracle = consulted,
            escalated,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Transcript classified"
        );

        result
    }

    fn worth_consulting(&self, transcript: &str) -> bool {
        transcript.trim().chars().count() >= self.config.oracle.min_transcript_chars
    }

    async fn consult_oracle(
        &self,
        oracle: &dyn Oracle,
        transcript: &str,
        finding: &LexicalFinding<'_>,
        fingerprint: &str,
    ) -> Option<OracleJudgment> {
        let timeout = self.config.oracle.timeout;

        match assess_within(oracle, transcript, finding, timeout).await {
            Ok(Some(judgment)) => {
                debug!(
                    transcript = %fingerprint,
                    oracle = oracle.name(),
                    level = %judgment.risk_level,
                    "Oracle judgment received"
                );
                Some(judgment)
            }
            Ok(None) => {
                warn!(
                    transcript = %fingerprint,
                    oracle = oracle.name(),
                    "Oracle response unparsable, using lexical result"
                );
                None
            }
            Err(e) => {
                warn!(
                    transcript = %fingerprint,
                    oracle = oracle.name(),
                    "Oracle unavailable, using lexical result: {}",
                    e
                );
                None
            }
        }
    }

    /// Build the result in one step from the lexical score and optional judgment.
    /// The flag reports whether the oracle raised the level.
    fn assemble(
        &self,
        lexical: LexicalScore,
        judgment: Option<OracleJudgment>,
    ) -> (ClassificationResult, bool) {
        let thresholds = &self.config.thresholds;
        let lexical_level = classify_tendency(lexical.score, thresholds);

        let (risk_level, counselling_recommendation, score, escalated) = match &judgment {
            Some(j) => {
                let merged = reconcile(lexical_level, lexical.score, j, thresholds);
                (merged.risk_level, merged.counselling, merged.score, merged.escalated)
            }
            None => (lexical_level, recommend_counselling(lexical_level), lexical.score, false),
        };

        let immediate_intervention =
            requires_immediate_intervention(risk_level, &lexical.evidence, judgment.as_ref());
        let review = synthesize(risk_level, score, &lexical.evidence);

        let result = ClassificationResult {
            risk_level,
            counselling_recommendation,
            score,
            evidence: lexical.evidence,
            immediate_intervention,
            review,
            oracle_judgment: judgment,
        };

        (result, escalated)
    }
}

/// Run one oracle assessment, turning an elapsed deadline into
/// [`ClassifierError::OracleTimeout`]
async fn assess_within(
    oracle: &dyn Oracle,
    transcript: &str,
    finding: &LexicalFinding<'_>,
    timeout: Duration,
) -> Result<Option<OracleJudgment>> {
    tokio::time::timeout(timeout, oracle.assess(transcript, finding))
        .await
        .map_err(|_| ClassifierError::OracleTimeout(timeout.as_secs()))?
}

/// Short SHA-256 prefix used to correlate log lines without logging content
pub fn transcript_fingerprint(transcript: &str) -> String {
    let digest = Sha256::digest(transcript.as_bytes());
    hex::encode(&digest[..6])
}
