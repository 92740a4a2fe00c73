//! Risk vocabulary
//!
//! Weighted term tiers (English and Latin-script Hindi) plus the
//! immediate-risk regex patterns. Built-in tables are static; a JSON
//! lexicon file can replace them at startup.

use crate::error::ClassifierError;
use crate::models::TierName;
use crate::Result;
use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

pub const CRITICAL_SEVERE_WEIGHT: u32 = 10;
pub const SEVERE_PLAN_WEIGHT: u32 = 7;
pub const HIGH_WEIGHT: u32 = 4;
pub const MEDIUM_WEIGHT: u32 = 2;
pub const LOW_WEIGHT: u32 = 1;
pub const IMMEDIATE_RISK_WEIGHT: u32 = 15;

/// Static term lists, no allocation
const CRITICAL_SEVERE_TERMS: &[&str] = &[
    // English
    "kill myself", "end my life", "take my own life", "suicide", "suicidal",
    "want to die", "better off dead", "end it all",
    // Hindi (transliterated)
    "marna chahta", "marna chahti", "mar jaunga", "mar jaungi",
    "mar jana chahta", "mar jana chahti", "khudkushi", "aatmahatya",
    "atmahatya", "jaan de dunga", "jaan de dungi", "khud ko khatam",
    "zindagi khatam",
];

const SEVERE_PLAN_TERMS: &[&str] = &[
    // Means and preparation
    "bought pills", "sleeping pills", "overdose", "hang myself", "jump off",
    "slit my wrist", "cut my wrist", "suicide note", "wrote a note",
    "goodbye letter", "said my goodbyes", "giving away my things",
    // Hindi (transliterated)
    "neend ki goliyan", "goliyan kha", "phanda", "fansi", "faansi",
    "chhat se kood", "zeher",
];

const HIGH_TERMS: &[&str] = &[
    "no reason to live", "hopeless", "worthless", "can't go on", "cannot go on",
    "no way out", "nobody would miss me", "no one would miss me",
    "burden to everyone", "hurt myself", "self harm", "self-harm",
    "cutting myself", "don't want to live", "tired of living",
    // Hindi (transliterated)
    "koi raah nahi", "koi rasta nahi", "jeene ka mann nahi",
    "jeene ki ichha nahi", "sab khatam", "bekaar hoon", "bojh hoon",
    "koi fayda nahi",
];

const MEDIUM_TERMS: &[&str] = &[
    "depressed", "depression", "lonely", "panic attack", "can't sleep",
    "cannot sleep", "crying", "empty inside", "no one cares", "nobody cares",
    "give up", "giving up", "failure",
    // Hindi (transliterated)
    "akela", "akeli", "udaas", "rona aata", "neend nahi", "pareshan hoon",
    "dil nahi lagta", "tension bahut",
];

const LOW_TERMS: &[&str] = &[
    "stressed", "stressful", "overwhelmed", "anxious", "anxiety", "worried",
    "feeling sad", "upset", "frustrated", "exhausted",
    // Hindi (transliterated)
    "chinta", "ghabrahat", "thak gaya", "thak gayi", "tanav",
];

/// (id, pattern) pairs; compiled case-insensitively
const IMMEDIATE_RISK_PATTERNS: &[(&str, &str)] = &[
    (
        "pattern:first_person_intent",
        r"\bi\s*(?:am\s+going\s+to|'m\s+going\s+to|am\s+gonna|'m\s+gonna|will|'ll|am\s+planning\s+to|plan\s+to|have\s+decided\s+to|'ve\s+decided\s+to)\s+(?:kill|end|hurt)\s+(?:myself|my\s+life)\b",
    ),
    (
        "pattern:timed_intent",
        r"\b(?:tonight|today|tomorrow|this\s+weekend)\b.{0,40}\b(?:kill\s+myself|end\s+my\s+life|end\s+it\s+all)\b",
    ),
    (
        "pattern:hindi_first_person_intent",
        r"\b(?:main|mai|mein)\s+(?:khud\s*ko\s+)?(?:maar|khatam\s+kar)\s+(?:dunga|dungi|lunga|lungi)\b",
    ),
    (
        "pattern:hindi_timed_intent",
        r"\b(?:aaj\s+raat|aaj|kal)\b.{0,40}\b(?:mar\s+jaunga|mar\s+jaungi|khudkushi|jaan\s+de\s+dunga|jaan\s+de\s+dungi)\b",
    ),
];

lazy_static! {
    static ref BUILTIN_PATTERNS: Vec<ImmediateRiskPattern> = IMMEDIATE_RISK_PATTERNS
        .iter()
        .map(|(id, source)| ImmediateRiskPattern {
            id: (*id).to_string(),
            regex: compile_pattern(source).expect("built-in immediate-risk pattern"),
            weight: IMMEDIATE_RISK_WEIGHT,
        })
        .collect();
}

/// A named bucket of vocabulary sharing one weight
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TermTier {
    pub name: TierName,
    pub weight: u32,
    pub terms: Vec<String>,
}

impl TermTier {
    /// Lowercases, trims and deduplicates terms, keeping first-seen order
    pub fn new(name: TierName, weight: u32, terms: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        let mut seen = HashSet::new();
        let terms = terms
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .filter(|t| seen.insert(t.clone()))
            .collect();

        Self {
            name,
            weight,
            terms,
        }
    }
}

/// Regex for constructions fixed phrases miss. Always reported as
/// `CRITICAL_SEVERE` evidence under its synthetic `id`.
#[derive(Debug, Clone)]
pub struct ImmediateRiskPattern {
    pub id: String,
    pub regex: Regex,
    pub weight: u32,
}

impl ImmediateRiskPattern {
    pub fn new(id: impl Into<String>, source: &str, weight: u32) -> Result<Self> {
        Ok(Self {
            id: id.into(),
            regex: compile_pattern(source)?,
            weight,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Lexicon {
    pub tiers: Vec<TermTier>,
    pub patterns: Vec<ImmediateRiskPattern>,
}

impl Lexicon {
    /// The built-in English + Hindi tables
    pub fn builtin() -> Self {
        Self {
            tiers: vec![
                TermTier::new(TierName::CriticalSevere, CRITICAL_SEVERE_WEIGHT, CRITICAL_SEVERE_TERMS),
                TermTier::new(TierName::SeverePlan, SEVERE_PLAN_WEIGHT, SEVERE_PLAN_TERMS),
                TermTier::new(TierName::High, HIGH_WEIGHT, HIGH_TERMS),
                TermTier::new(TierName::Medium, MEDIUM_WEIGHT, MEDIUM_TERMS),
                TermTier::new(TierName::Low, LOW_WEIGHT, LOW_TERMS),
            ],
            patterns: BUILTIN_PATTERNS.clone(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: LexiconFile = serde_json::from_str(json)?;

        let tiers = file
            .tiers
            .into_iter()
            .map(|t| TermTier::new(t.name, t.weight, t.terms))
            .collect();

        let patterns = file
            .patterns
            .into_iter()
            .map(|p| {
                ImmediateRiskPattern::new(p.id.clone(), &p.regex, p.weight).map_err(|e| {
                    ClassifierError::Config(format!("pattern '{}' does not compile: {}", p.id, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { tiers, patterns })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ClassifierError::Config(format!("cannot read lexicon {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&contents)
    }

    pub fn tier(&self, name: TierName) -> Option<&TermTier> {
        self.tiers.iter().find(|t| t.name == name)
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::builtin()
    }
}

//
// ================= Lexicon File =================
//

#[derive(Debug, Deserialize)]
struct LexiconFile {
    tiers: Vec<TermTier>,
    #[serde(default)]
    patterns: Vec<PatternSpec>,
}

#[derive(Debug, Deserialize)]
struct PatternSpec {
    id: String,
    regex: String,
    #[serde(default = "default_pattern_weight")]
    weight: u32,
}

fn default_pattern_weight() -> u32 {
    IMMEDIATE_RISK_WEIGHT
}

fn compile_pattern(source: &str) -> std::result::Result<Regex, regex::Error> {
    RegexBuilder::new(source).case_insensitive(true).build()
}
