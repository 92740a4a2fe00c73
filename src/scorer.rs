//! Lexical Scorer
//!
//! Case-folds a transcript and checks it against every term tier and every
//! immediate-risk pattern. There is no early exit: weak signals from
//! several tiers are meant to compound.

use crate::lexicon::Lexicon;
use crate::models::{EvidenceEntry, TierName};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LexicalScore {
    pub score: u32,
    pub evidence: Vec<EvidenceEntry>,
}

/// Score a transcript. Each distinct term contributes at most once,
/// however often it occurs.
pub fn score(transcript: &str, lexicon: &Lexicon) -> LexicalScore {
    let text = transcript.to_lowercase();
    if text.trim().is_empty() {
        return LexicalScore::default();
    }

    let mut result = LexicalScore::default();

    for tier in &lexicon.tiers {
        for term in tier.terms.iter().filter(|t| text.contains(t.as_str())) {
            result.score = result.score.saturating_add(tier.weight);
            result.evidence.push(EvidenceEntry::new(term.clone(), tier.name));
        }
    }

    for pattern in lexicon.patterns.iter().filter(|p| p.regex.is_match(&text)) {
        result.score = result.score.saturating_add(pattern.weight);
        result
            .evidence
            .push(EvidenceEntry::new(pattern.id.clone(), TierName::CriticalSevere));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::{ImmediateRiskPattern, TermTier};

    fn test_lexicon() -> Lexicon {
        Lexicon {
            tiers: vec![
                TermTier::new(TierName::CriticalSevere, 10, ["disappear forever"]),
                TermTier::new(TierName::High, 4, ["hopeless"]),
                TermTier::new(TierName::Medium, 2, ["lonely"]),
                TermTier::new(TierName::Low, 1, ["tired", "stressed"]),
            ],
            patterns: vec![
                ImmediateRiskPattern::new("pattern:plan", r"\bi will vanish\b", 15).unwrap(),
            ],
        }
    }

    #[test]
    fn test_empty_transcript() {
        let lexicon = test_lexicon();
        assert_eq!(score("", &lexicon), LexicalScore::default());
        assert_eq!(score("   \n\t", &lexicon), LexicalScore::default());
    }

    #[test]
    fn test_case_folding() {
        let lexicon = test_lexicon();
        let result = score("I feel HOPELESS", &lexicon);
        assert_eq!(result.score, 4);
        assert_eq!(result.evidence, vec![EvidenceEntry::new("hopeless", TierName::High)]);
    }

    #[test]
    fn test_tiers_accumulate_without_early_exit() {
        let lexicon = test_lexicon();
        let result = score("Tired, lonely and hopeless. I will vanish.", &lexicon);

        assert_eq!(result.score, 1 + 2 + 4 + 15);
        let categories: Vec<_> = result.evidence.iter().map(|e| e.category).collect();
        assert_eq!(
            categories,
            vec![
                TierName::High,
                TierName::Medium,
                TierName::Low,
                TierName::CriticalSevere,
            ]
        );
        assert_eq!(result.evidence[3].term, "pattern:plan");
    }

    #[test]
    fn test_repeated_term_counts_once() {
        let lexicon = test_lexicon();
        let result = score("stressed stressed stressed", &lexicon);
        assert_eq!(result.score, 1);
        assert_eq!(result.evidence.len(), 1);
    }

    #[test]
    fn test_substring_matching() {
        // Pure substring search, no word boundaries
        let lexicon = test_lexicon();
        let result = score("so stressedout", &lexicon);
        assert_eq!(result.score, 1);
    }

    #[test]
    fn test_scoring_is_idempotent() {
        let lexicon = Lexicon::builtin();
        let text = "Main bahut akela hoon, koi raah nahi hai, I feel hopeless";
        assert_eq!(score(text, &lexicon), score(text, &lexicon));
    }

    #[test]
    fn test_builtin_hindi_terms() {
        let lexicon = Lexicon::builtin();
        let result = score("Main marna chahta hun. Koi raah nahi hai.", &lexicon);
        assert!(result
            .evidence
            .contains(&EvidenceEntry::new("marna chahta", TierName::CriticalSevere)));
        assert!(result
            .evidence
            .contains(&EvidenceEntry::new("koi raah nahi", TierName::High)));
    }

    #[test]
    fn test_neutral_text_scores_zero() {
        let lexicon = Lexicon::builtin();
        let result = score("Thank you, I feel better now after talking.", &lexicon);
        assert_eq!(result.score, 0);
        assert!(result.evidence.is_empty());
    }
}
