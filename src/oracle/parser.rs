//! Oracle response parsing
//!
//! Language models do not always return clean JSON. The response is tried
//! against each strategy in turn:
//!
//! 1. direct JSON parse (after stripping markdown fences)
//! 2. the first balanced `{...}` object embedded in the text
//! 3. regex scraping of individual `key: value` fields
//!
//! If all three fail there is no judgment. Nothing here returns an error.

use crate::models::{ConfidenceLevel, CounsellingRecommendation, OracleJudgment, RiskLevel};
use crate::tendency::recommend_counselling;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

const RISK_KEYS: &[&str] = &["riskLevel", "risk_level", "risk", "tendency"];
const COUNSELLING_KEYS: &[&str] = &[
    "counsellingNeeded",
    "counselling_needed",
    "counselingNeeded",
    "counseling_needed",
    "needsCounselling",
];
const INTERVENTION_KEYS: &[&str] = &["immediateIntervention", "immediate_intervention"];
const SUMMARY_KEYS: &[&str] = &["assessmentSummary", "assessment_summary", "summary"];
const CONFIDENCE_KEYS: &[&str] = &["confidenceLevel", "confidence_level", "confidence"];
const PHRASE_KEYS: &[&str] = &["concerningPhrases", "concerning_phrases", "evidence"];

lazy_static! {
    static ref RISK_FIELD: Regex =
        Regex::new(r#"(?i)"?risk[_ ]?level"?\s*[:=]\s*"?([a-z]+)"#).expect("risk field regex");
    static ref COUNSELLING_FIELD: Regex =
        Regex::new(r#"(?i)"?counsel+ing[_ ]?needed"?\s*[:=]\s*"?([a-z]+)"#)
            .expect("counselling field regex");
    static ref INTERVENTION_FIELD: Regex =
        Regex::new(r#"(?i)"?immediate[_ ]?intervention"?\s*[:=]\s*"?([a-z]+)"#)
            .expect("intervention field regex");
    static ref SUMMARY_FIELD: Regex =
        Regex::new(r#"(?i)"?assessment[_ ]?summary"?\s*[:=]\s*"([^"]*)""#)
            .expect("summary field regex");
    static ref CONFIDENCE_FIELD: Regex =
        Regex::new(r#"(?i)"?confidence[_ ]?level"?\s*[:=]\s*"?([a-z]+)"#)
            .expect("confidence field regex");
}

/// Run the full strategy chain
pub fn parse_oracle_response(raw: &str) -> Option<OracleJudgment> {
    parse_direct(raw)
        .or_else(|| parse_embedded(raw))
        .or_else(|| scrape_fields(raw))
}

/// Strategy 1: the whole response is JSON
pub fn parse_direct(raw: &str) -> Option<OracleJudgment> {
    let cleaned = raw
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let value: Value = serde_json::from_str(cleaned).ok()?;
    judgment_from_value(value)
}

/// Strategy 2: JSON object surrounded by prose
pub fn parse_embedded(raw: &str) -> Option<OracleJudgment> {
    let object = extract_balanced_object(raw)?;
    let value: Value = serde_json::from_str(object).ok()?;
    judgment_from_value(value)
}

/// Strategy 3: no parseable JSON, pull fields out one by one
pub fn scrape_fields(raw: &str) -> Option<OracleJudgment> {
    let risk_level = capture(&RISK_FIELD, raw).and_then(|s| parse_risk_label(&s))?;

    let counselling_needed = capture(&COUNSELLING_FIELD, raw)
        .and_then(|s| parse_counselling_label(&s))
        .unwrap_or_else(|| recommend_counselling(risk_level));

    let immediate_intervention = capture(&INTERVENTION_FIELD, raw)
        .and_then(|s| parse_flag(&s))
        .unwrap_or(false);

    let confidence_level = capture(&CONFIDENCE_FIELD, raw)
        .and_then(|s| parse_confidence_label(&s))
        .unwrap_or(ConfidenceLevel::Low);

    Some(OracleJudgment {
        risk_level,
        counselling_needed,
        immediate_intervention,
        assessment_summary: capture(&SUMMARY_FIELD, raw).unwrap_or_default(),
        confidence_level,
        concerning_phrases: vec![],
        raw: Value::String(raw.to_string()),
    })
}

fn capture(re: &Regex, raw: &str) -> Option<String> {
    re.captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// First `{...}` whose braces balance, ignoring braces inside strings
pub fn extract_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

fn judgment_from_value(value: Value) -> Option<OracleJudgment> {
    let object = value.as_object()?;

    let risk_level = field(object, RISK_KEYS)
        .and_then(Value::as_str)
        .and_then(parse_risk_label)?;

    let counselling_needed = field(object, COUNSELLING_KEYS)
        .and_then(|v| match v {
            Value::Bool(true) => Some(CounsellingRecommendation::Required),
            Value::Bool(false) => Some(CounsellingRecommendation::None),
            Value::String(s) => parse_counselling_label(s),
            _ => None,
        })
        .unwrap_or_else(|| recommend_counselling(risk_level));

    let immediate_intervention = field(object, INTERVENTION_KEYS)
        .and_then(|v| match v {
            Value::Bool(b) => Some(*b),
            Value::String(s) => parse_flag(s),
            _ => None,
        })
        .unwrap_or(false);

    let assessment_summary = field(object, SUMMARY_KEYS)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let confidence_level = field(object, CONFIDENCE_KEYS)
        .and_then(|v| match v {
            Value::String(s) => parse_confidence_label(s),
            Value::Number(n) => n.as_f64().map(confidence_from_probability),
            _ => None,
        })
        .unwrap_or(ConfidenceLevel::Low);

    let concerning_phrases: Vec<String> = field(object, PHRASE_KEYS)
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(|s| s.to_string()))
                .collect()
        })
        .unwrap_or_default();

    Some(OracleJudgment {
        risk_level,
        counselling_needed,
        immediate_intervention,
        assessment_summary,
        confidence_level,
        concerning_phrases,
        raw: value,
    })
}

fn field<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| object.get(*k))
}

pub fn parse_risk_label(label: &str) -> Option<RiskLevel> {
    match label.trim().to_lowercase().as_str() {
        "none" | "no" | "minimal" | "nil" => Some(RiskLevel::None),
        "low" | "mild" => Some(RiskLevel::Low),
        "medium" | "moderate" => Some(RiskLevel::Medium),
        "high" | "elevated" => Some(RiskLevel::High),
        "severe" | "critical" | "extreme" | "imminent" => Some(RiskLevel::Severe),
        _ => None,
    }
}

pub fn parse_counselling_label(label: &str) -> Option<CounsellingRecommendation> {
    match label.trim().to_lowercase().as_str() {
        "no" | "none" | "false" | "not_needed" => Some(CounsellingRecommendation::None),
        "advised" | "recommended" | "maybe" | "optional" => Some(CounsellingRecommendation::Advised),
        "yes" | "required" | "true" | "urgent" | "needed" => Some(CounsellingRecommendation::Required),
        _ => None,
    }
}

fn parse_confidence_label(label: &str) -> Option<ConfidenceLevel> {
    match label.trim().to_lowercase().as_str() {
        "low" => Some(ConfidenceLevel::Low),
        "medium" | "moderate" => Some(ConfidenceLevel::Medium),
        "high" => Some(ConfidenceLevel::High),
        _ => None,
    }
}

fn confidence_from_probability(p: f64) -> ConfidenceLevel {
    if p >= 0.75 {
        ConfidenceLevel::High
    } else if p >= 0.4 {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::Low
    }
}

fn parse_flag(label: &str) -> Option<bool> {
    match label.trim().to_lowercase().as_str() {
        "true" | "yes" => Some(true),
        "false" | "no" => Some(false),
        _ => None,
    }
}
