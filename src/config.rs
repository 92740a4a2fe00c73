//! Classifier configuration
//!
//! Built once at process start and never mutated. Invalid tier tables or
//! thresholds are rejected here so a misconfigured process fails before it
//! serves a single classification.

use crate::error::ClassifierError;
use crate::lexicon::Lexicon;
use crate::models::{RiskLevel, TierName};
use crate::Result;
use std::collections::HashSet;
use std::time::Duration;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_ORACLE_TIMEOUT_SECS: u64 = 15;
pub const MAX_ORACLE_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_MIN_TRANSCRIPT_CHARS: usize = 20;

/// Values shipped in `.env.example` files that mean "not configured"
const PLACEHOLDER_KEYS: &[&str] = &["your_gemini_api_key_here", "mock_key", "changeme"];

/// Score-to-level cut points, inclusive lower bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub low: u32,
    pub medium: u32,
    pub high: u32,
    pub severe: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            low: 1,
            medium: 3,
            high: 8,
            severe: 12,
        }
    }
}

impl Thresholds {
    /// Parses `"low,medium,high,severe"`
    pub fn parse(value: &str) -> Result<Self> {
        let parts = value
            .split(',')
            .map(|p| p.trim().parse::<u32>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| ClassifierError::Config(format!("RISK_THRESHOLDS '{}': {}", value, e)))?;

        match parts.as_slice() {
            [low, medium, high, severe] => Ok(Self {
                low: *low,
                medium: *medium,
                high: *high,
                severe: *severe,
            }),
            _ => Err(ClassifierError::Config(format!(
                "RISK_THRESHOLDS expects 4 values, got {}",
                parts.len()
            ))),
        }
    }

    /// Lowest score that maps to `level`
    pub fn floor(&self, level: RiskLevel) -> u32 {
        match level {
            RiskLevel::None => 0,
            RiskLevel::Low => self.low,
            RiskLevel::Medium => self.medium,
            RiskLevel::High => self.high,
            RiskLevel::Severe => self.severe,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.low < 1 {
            return Err(ClassifierError::Config(
                "low threshold must be at least 1".to_string(),
            ));
        }
        if !(self.low < self.medium && self.medium < self.high && self.high < self.severe) {
            return Err(ClassifierError::Config(format!(
                "thresholds must be strictly ascending, got {}/{}/{}/{}",
                self.low, self.medium, self.high, self.severe
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct OracleSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
    /// Trimmed transcripts shorter than this never reach the oracle
    pub min_transcript_chars: usize,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_ORACLE_TIMEOUT_SECS),
            min_transcript_chars: DEFAULT_MIN_TRANSCRIPT_CHARS,
        }
    }
}

impl OracleSettings {
    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClassifierConfig {
    pub lexicon: Lexicon,
    pub thresholds: Thresholds,
    pub oracle: OracleSettings,
}

impl ClassifierConfig {
    /// Load configuration from the process environment (and `.env`)
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = get("GEMINI_API_KEY")
            .filter(|k| !PLACEHOLDER_KEYS.contains(&k.as_str()));

        let model = get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());

        let timeout_secs = match get("ORACLE_TIMEOUT_SECS") {
            Some(v) => v.parse::<u64>().map_err(|e| {
                ClassifierError::Config(format!("ORACLE_TIMEOUT_SECS '{}': {}", v, e))
            })?,
            None => DEFAULT_ORACLE_TIMEOUT_SECS,
        }
        .clamp(1, MAX_ORACLE_TIMEOUT_SECS);

        let min_transcript_chars = match get("ORACLE_MIN_TRANSCRIPT_CHARS") {
            Some(v) => v.parse::<usize>().map_err(|e| {
                ClassifierError::Config(format!("ORACLE_MIN_TRANSCRIPT_CHARS '{}': {}", v, e))
            })?,
            None => DEFAULT_MIN_TRANSCRIPT_CHARS,
        };

        let thresholds = match get("RISK_THRESHOLDS") {
            Some(v) => Thresholds::parse(&v)?,
            None => Thresholds::default(),
        };

        let lexicon = match get("RISK_LEXICON_PATH") {
            Some(path) => Lexicon::from_file(path)?,
            None => Lexicon::builtin(),
        };

        let config = Self {
            lexicon,
            thresholds,
            oracle: OracleSettings {
                api_key,
                model,
                timeout: Duration::from_secs(timeout_secs),
                min_transcript_chars,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Fail-fast structural checks on tiers, patterns and thresholds
    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;

        let lexicon = &self.lexicon;
        if lexicon.tiers.is_empty() {
            return Err(ClassifierError::Config("lexicon has no tiers".to_string()));
        }

        let mut seen = HashSet::new();
        for tier in &lexicon.tiers {
            if !seen.insert(tier.name) {
                return Err(ClassifierError::Config(format!("tier {} declared twice", tier.name)));
            }
            if tier.weight == 0 {
                return Err(ClassifierError::Config(format!("tier {} has zero weight", tier.name)));
            }
            if tier.terms.is_empty() {
                return Err(ClassifierError::Config(format!("tier {} has no terms", tier.name)));
            }
        }

        // Weights must strictly decrease from CRITICAL_SEVERE down to LOW
        let mut ordered: Vec<_> = lexicon.tiers.iter().collect();
        ordered.sort_by_key(|t| tier_rank(t.name));
        for pair in ordered.windows(2) {
            if pair[0].weight <= pair[1].weight {
                return Err(ClassifierError::Config(format!(
                    "tier {} (weight {}) must outweigh tier {} (weight {})",
                    pair[0].name, pair[0].weight, pair[1].name, pair[1].weight
                )));
            }
        }

        let max_term_weight = lexicon.tiers.iter().map(|t| t.weight).max().unwrap_or(0);
        let mut pattern_ids = HashSet::new();
        for pattern in &lexicon.patterns {
            if !pattern_ids.insert(pattern.id.as_str()) {
                return Err(ClassifierError::Config(format!(
                    "pattern {} declared twice",
                    pattern.id
                )));
            }
            if pattern.weight <= max_term_weight {
                return Err(ClassifierError::Config(format!(
                    "pattern {} (weight {}) must outweigh every term tier (max {})",
                    pattern.id, pattern.weight, max_term_weight
                )));
            }
            if pattern.weight < self.thresholds.severe {
                return Err(ClassifierError::Config(format!(
                    "pattern {} (weight {}) cannot reach the severe threshold {}",
                    pattern.id, pattern.weight, self.thresholds.severe
                )));
            }
        }

        if let Some(critical) = lexicon.tier(TierName::CriticalSevere) {
            if critical.weight < self.thresholds.high {
                return Err(ClassifierError::Config(format!(
                    "a single critical term (weight {}) cannot reach the high threshold {}",
                    critical.weight, self.thresholds.high
                )));
            }
        }

        Ok(())
    }
}

fn tier_rank(name: TierName) -> u8 {
    match name {
        TierName::CriticalSevere => 0,
        TierName::SeverePlan => 1,
        TierName::High => 2,
        TierName::Medium => 3,
        TierName::Low => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::{ImmediateRiskPattern, TermTier};
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = ClassifierConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.oracle.is_enabled());
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = ClassifierConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.thresholds, Thresholds::default());
        assert_eq!(config.oracle.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.oracle.timeout, Duration::from_secs(15));
        assert!(!config.oracle.is_enabled());
    }

    #[test]
    fn test_from_lookup_reads_values() {
        let config = ClassifierConfig::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "abc123"),
            ("GEMINI_MODEL", "gemini-1.5-pro"),
            ("ORACLE_TIMEOUT_SECS", "60"),
            ("ORACLE_MIN_TRANSCRIPT_CHARS", "5"),
            ("RISK_THRESHOLDS", "1, 4, 9, 14"),
        ]))
        .unwrap();

        assert_eq!(config.oracle.api_key.as_deref(), Some("abc123"));
        assert_eq!(config.oracle.model, "gemini-1.5-pro");
        // Clamped to the upper bound
        assert_eq!(config.oracle.timeout, Duration::from_secs(MAX_ORACLE_TIMEOUT_SECS));
        assert_eq!(config.oracle.min_transcript_chars, 5);
        assert_eq!(config.thresholds.severe, 14);
    }

    #[test]
    fn test_placeholder_key_disables_oracle() {
        let config =
            ClassifierConfig::from_lookup(lookup_from(&[("GEMINI_API_KEY", "your_gemini_api_key_here")]))
                .unwrap();
        assert!(!config.oracle.is_enabled());
    }

    #[test]
    fn test_malformed_thresholds_are_fatal() {
        assert!(ClassifierConfig::from_lookup(lookup_from(&[("RISK_THRESHOLDS", "1,2,3")])).is_err());
        assert!(ClassifierConfig::from_lookup(lookup_from(&[("RISK_THRESHOLDS", "a,b,c,d")])).is_err());
        // Non-monotonic
        assert!(ClassifierConfig::from_lookup(lookup_from(&[("RISK_THRESHOLDS", "1,8,3,12")])).is_err());
        // Critical term can no longer reach HIGH
        assert!(ClassifierConfig::from_lookup(lookup_from(&[("RISK_THRESHOLDS", "1,3,11,12")])).is_err());
        // Pattern can no longer reach SEVERE
        assert!(ClassifierConfig::from_lookup(lookup_from(&[("RISK_THRESHOLDS", "1,3,8,20")])).is_err());
        // Two levels sharing a floor
        assert!(ClassifierConfig::from_lookup(lookup_from(&[("RISK_THRESHOLDS", "1,8,8,12")])).is_err());
    }

    #[test]
    fn test_zero_low_threshold_rejected() {
        let thresholds = Thresholds {
            low: 0,
            medium: 3,
            high: 8,
            severe: 12,
        };
        assert!(thresholds.validate().is_err());
    }

    #[test]
    fn test_missing_lexicon_file_is_fatal() {
        let err = ClassifierConfig::from_lookup(lookup_from(&[(
            "RISK_LEXICON_PATH",
            "/nonexistent/lexicon.json",
        )]))
        .unwrap_err();
        assert!(matches!(err, ClassifierError::Config(_)));
    }

    #[test]
    fn test_weight_ordering_enforced() {
        let mut config = ClassifierConfig::default();
        config.lexicon.tiers = vec![
            TermTier::new(TierName::High, 4, ["a"]),
            TermTier::new(TierName::Medium, 4, ["b"]),
        ];
        config.lexicon.patterns.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pattern_must_outweigh_terms() {
        let mut config = ClassifierConfig::default();
        config.lexicon.patterns = vec![ImmediateRiskPattern::new("weak", "x", 10).unwrap()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_tier_rejected() {
        let mut config = ClassifierConfig::default();
        config.lexicon.tiers.push(TermTier::new(TierName::Low, 1, ["again"]));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_floor_matches_thresholds() {
        let t = Thresholds::default();
        assert_eq!(t.floor(RiskLevel::None), 0);
        assert_eq!(t.floor(RiskLevel::Low), 1);
        assert_eq!(t.floor(RiskLevel::Severe), 12);
    }
}
