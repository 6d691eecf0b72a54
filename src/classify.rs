// src/classify.rs
//! Result classifier: category, relevance score and quality filter for search results.
//!
//! Decision chain for `classify` (first match wins):
//! 1. company TLD **and** company keyword in title+snippet → `company_website`
//! 2. news outlet domain **or** announcement verb in title → `news_article`
//! 3. research indicator in title+snippet                  → `research_report`
//! 4. regulatory domain **or** policy word in title        → `regulatory`
//! 5. everything else                                      → `other`
//!
//! Score = position term + keyword density term + type bonus, clamped to ⟨0..1⟩.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::normalize::contains_any;
use crate::types::{ClassifiedResult, ResultType, SearchResult};
use crate::vocab::{TypeBonus, Vocabulary};

/// Classifier over a shared, read-only vocabulary.
#[derive(Debug, Clone)]
pub struct Classifier {
    vocab: Arc<Vocabulary>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(Vocabulary::default())
    }
}

impl Classifier {
    /// Lists are cleaned (trimmed, lowercased, deduped) before use.
    pub fn new(vocab: Vocabulary) -> Self {
        Self {
            vocab: Arc::new(vocab.cleaned()),
        }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Deterministic and total: unmatched input falls through to `Other`.
    pub fn classify(&self, r: &SearchResult) -> ResultType {
        let c = &self.vocab.classify;
        let domain = r.source_domain.to_lowercase();
        let title = r.title.to_lowercase();
        let text = r.folded_text();

        let company_tld = c
            .company_domain_suffixes
            .iter()
            .any(|s| domain.ends_with(s.as_str()));
        if company_tld && contains_any(&text, &c.company_keywords) {
            return ResultType::CompanyWebsite;
        }
        if contains_any(&domain, &c.news_domains) || contains_any(&title, &c.news_title_keywords) {
            return ResultType::NewsArticle;
        }
        if contains_any(&text, &c.research_keywords) {
            return ResultType::ResearchReport;
        }
        if contains_any(&domain, &c.regulatory_domains)
            || contains_any(&title, &c.regulatory_title_keywords)
        {
            return ResultType::Regulatory;
        }
        ResultType::Other
    }

    /// Relevance in ⟨0..1⟩. Non-increasing in `position`; ranks at or past the
    /// horizon (and ranks before 0) are clamped.
    pub fn score(&self, r: &SearchResult, result_type: ResultType) -> f32 {
        let s = &self.vocab.scoring;

        let horizon = s.position_horizon.max(1) as f32;
        let rank_fraction = ((horizon - r.position as f32) / horizon).clamp(0.0, 1.0);
        let position_term = rank_fraction * s.position_weight;

        let keyword_term = if s.relevance_keywords.is_empty() {
            0.0
        } else {
            let text = r.folded_text();
            let hits = s
                .relevance_keywords
                .iter()
                .filter(|k| text.contains(k.as_str()))
                .count();
            (hits as f32 / s.relevance_keywords.len() as f32) * s.keyword_weight
        };

        let bonus = type_bonus(&s.type_bonus, result_type);

        (position_term + keyword_term + bonus).clamp(0.0, 1.0)
    }

    /// Classify + score in one step.
    pub fn classify_result(&self, r: SearchResult) -> ClassifiedResult {
        let result_type = self.classify(&r);
        let relevance_score = self.score(&r, result_type);
        debug!(
            target: "classify",
            domain = %r.source_domain,
            position = r.position,
            %result_type,
            score = relevance_score,
            "classified"
        );
        ClassifiedResult {
            result: r,
            result_type,
            relevance_score,
            authority_bonus: false,
        }
    }

    /// Drop low-relevance and denylisted results, flag authoritative publishers and
    /// sort: authoritative first, then by score, both descending. The sort is stable,
    /// so equal keys keep their input order.
    pub fn filter_high_quality(
        &self,
        results: Vec<ClassifiedResult>,
        min_relevance: f32,
    ) -> Vec<ClassifiedResult> {
        let q = &self.vocab.quality;
        let total = results.len();

        let mut kept: Vec<ClassifiedResult> = results
            .into_iter()
            .filter(|r| r.relevance_score >= min_relevance)
            .filter_map(|mut r| {
                let domain = r.result.source_domain.to_lowercase();
                if contains_any(&domain, &q.denylist_domains) {
                    return None;
                }
                r.authority_bonus = contains_any(&domain, &q.authority_domains);
                Some(r)
            })
            .collect();

        kept.sort_by(|a, b| {
            b.authority_bonus
                .cmp(&a.authority_bonus)
                .then(b.relevance_score.total_cmp(&a.relevance_score))
        });

        debug!(
            target: "classify",
            kept = kept.len(),
            total,
            min_relevance,
            "filtered to high-quality results"
        );
        kept
    }

    /// Title or snippet mentions a company indicator (inc, ltd, solutions, …).
    pub fn is_company_result(&self, r: &SearchResult) -> bool {
        contains_any(&r.folded_text(), &self.vocab.classify.company_indicators)
    }

    /// The result looks like `company_name`'s own site: the name appears in the title,
    /// or any word of it appears in the domain.
    pub fn is_official_site(&self, r: &SearchResult, company_name: &str) -> bool {
        let name = company_name.trim().to_lowercase();
        if name.is_empty() {
            return false;
        }
        let domain = r.source_domain.to_lowercase();
        r.title.to_lowercase().contains(&name)
            || name.split_whitespace().any(|w| domain.contains(w))
    }
}

fn type_bonus(b: &TypeBonus, t: ResultType) -> f32 {
    match t {
        ResultType::CompanyWebsite => b.company_website,
        ResultType::ResearchReport => b.research_report,
        ResultType::NewsArticle => b.news_article,
        ResultType::Regulatory => b.regulatory,
        ResultType::Other => b.other,
    }
}

/// Keep the first result per link; results with an empty link are dropped.
pub fn dedup_by_link(results: Vec<SearchResult>) -> Vec<SearchResult> {
    let mut seen: HashSet<String> = HashSet::new();
    results
        .into_iter()
        .filter(|r| !r.link.is_empty() && seen.insert(r.link.clone()))
        .collect()
}
