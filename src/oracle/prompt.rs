//! Structured prompt for the risk oracle

use super::LexicalFinding;

/// Transcripts beyond this many characters are cut before prompting
pub const MAX_TRANSCRIPT_CHARS: usize = 12_000;

pub const SYSTEM_PROMPT: &str = r#"You are a clinical risk assessor reviewing transcripts of support phone calls.
Callers speak English, Hindi written in Latin script, or a mix of both.

Guidelines:
- Weight English AND transliterated Hindi distress vocabulary equally
  (for example "marna chahta", "khudkushi", "koi raah nahi", "jeene ka mann nahi").
- Look for suicidal ideation, self-harm, plans, means, timelines and hopelessness.
- Be conservative: if in doubt between two levels, choose the higher one.
- Respond with a single JSON object and nothing else."#;

/// Build the per-transcript prompt
pub fn build_prompt(transcript: &str, finding: &LexicalFinding<'_>) -> String {
    let evidence = if finding.evidence.is_empty() {
        "none".to_string()
    } else {
        finding
            .evidence
            .iter()
            .map(|e| format!("{} ({})", e.term, e.category))
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        r#"Assess the suicide and self-harm risk in this call transcript.

A keyword screen already rated it "{}" (score {}) with matches: {}.
Treat that as context only and form your own judgment.

TRANSCRIPT:
---
{}
---

Return ONLY valid JSON in exactly this format:

{{
  "riskLevel": "none" | "low" | "medium" | "high" | "severe",
  "counsellingNeeded": "no" | "advised" | "yes",
  "immediateIntervention": true | false,
  "concerningPhrases": ["<exact phrase from the transcript>", ...],
  "assessmentSummary": "<two sentences at most>",
  "confidenceLevel": "low" | "medium" | "high"
}}
"#,
        finding.risk_level.as_str(),
        finding.score,
        evidence,
        truncate_transcript(transcript),
    )
}

fn truncate_transcript(transcript: &str) -> &str {
    match transcript.char_indices().nth(MAX_TRANSCRIPT_CHARS) {
        Some((idx, _)) => &transcript[..idx],
        None => transcript,
    }
}
