//! Keyword-based alert severity.

use crate::types::Severity;
use crate::vocab::Vocabulary;

/// First matching tier wins: high risk → medium watch → positive → neutral.
pub fn classify_severity(text: &str, vocab: &Vocabulary) -> Severity {
    let text = text.to_lowercase();
    let sv = &vocab.severity;
    if tier_hit(&text, &sv.high_risk) {
        Severity::HighRisk
    } else if tier_hit(&text, &sv.medium_watch) {
        Severity::MediumWatch
    } else if tier_hit(&text, &sv.positive) {
        Severity::Positive
    } else {
        Severity::Neutral
    }
}

// Keywords may come from an uncleaned vocabulary; blank entries never match.
fn tier_hit(text: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| {
        let k = k.trim().to_lowercase();
        !k.is_empty() && text.contains(&k)
    })
}
