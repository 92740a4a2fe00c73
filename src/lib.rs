//! Call Risk Classifier
//!
//! Classifies support-call transcripts (English, transliterated Hindi, or a
//! mix of both) for suicide and self-harm risk:
//! - Weighted lexical scoring over fixed term tiers and intent patterns
//! - Ordinal risk level and derived counselling recommendation
//! - Optional Gemini second opinion that may escalate but never lower the result
//! - Short human-readable review and an immediate-intervention flag
//!
//! PIPELINE:
//! TRANSCRIPT → SCORE → TENDENCY → COUNSELLING → ORACLE? → REVIEW → RESULT

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod gemini;
pub mod lexicon;
pub mod models;
pub mod oracle;
pub mod review;
pub mod scorer;
pub mod tendency;

pub use error::Result;

// Re-export common types
pub use config::ClassifierConfig;
pub use engine::RiskEngine;
pub use models::*;
