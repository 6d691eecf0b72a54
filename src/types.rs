// src/types.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::normalize::{extract_domain, normalize_text, truncate_chars};
use crate::severity::classify_severity;
use crate::vocab::Vocabulary;

/// Alert descriptions are cut to this many characters.
pub const ALERT_DESCRIPTION_CHARS: usize = 200;

/// One organic row as a search provider returns it. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSearchResult {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub position: Option<i64>,
}

/// A validated search result. `source_domain` is derived from `link`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub link: String,
    pub snippet: String,
    pub position: i64,
    pub source_domain: String,
    /// Query that produced the result, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl SearchResult {
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        snippet: impl Into<String>,
        position: i64,
    ) -> Self {
        let link = link.into();
        Self {
            title: title.into(),
            source_domain: extract_domain(&link),
            link,
            snippet: snippet.into(),
            position,
            query: None,
        }
    }

    /// Validate and normalize a provider row. Rows without a title or link are invalid.
    /// `fallback_position` is used when the provider omitted the rank.
    pub fn from_raw(raw: RawSearchResult, fallback_position: i64) -> Option<Self> {
        let title = normalize_text(raw.title.as_deref().unwrap_or_default());
        let link = raw.link.unwrap_or_default().trim().to_string();
        if title.is_empty() || link.is_empty() {
            return None;
        }
        let snippet = normalize_text(raw.snippet.as_deref().unwrap_or_default());
        Some(Self::new(
            title,
            link,
            snippet,
            raw.position.unwrap_or(fallback_position),
        ))
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Case-folded "title snippet" used by every keyword check.
    pub fn folded_text(&self) -> String {
        format!("{} {}", self.title, self.snippet).to_lowercase()
    }
}

/// Coarse category of a search result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultType {
    CompanyWebsite,
    NewsArticle,
    ResearchReport,
    Regulatory,
    Other,
}

impl ResultType {
    pub const ALL: [ResultType; 5] = [
        ResultType::CompanyWebsite,
        ResultType::NewsArticle,
        ResultType::ResearchReport,
        ResultType::Regulatory,
        ResultType::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResultType::CompanyWebsite => "company_website",
            ResultType::NewsArticle => "news_article",
            ResultType::ResearchReport => "research_report",
            ResultType::Regulatory => "regulatory",
            ResultType::Other => "other",
        }
    }
}

impl fmt::Display for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A search result with its category and relevance score attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedResult {
    #[serde(flatten)]
    pub result: SearchResult,
    pub result_type: ResultType,
    pub relevance_score: f32,
    /// Set by `filter_high_quality` for curated publishers; sort priority only.
    #[serde(default)]
    pub authority_bonus: bool,
}

/// Alert severity, as shown on the dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    #[serde(rename = "High Risk")]
    HighRisk,
    #[serde(rename = "Medium Watch")]
    MediumWatch,
    Positive,
    Neutral,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::HighRisk => "High Risk",
            Severity::MediumWatch => "Medium Watch",
            Severity::Positive => "Positive",
            Severity::Neutral => "Neutral",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub title: String,
    #[serde(alias = "supplier")]
    pub entity_name: String,
    pub description: String,
    pub severity: Severity,
    pub source_url: String,
    pub date_found: NaiveDate,
}

impl Alert {
    /// Build an alert about `entity_name` from a classified search hit.
    pub fn from_classified(
        result: &ClassifiedResult,
        entity_name: &str,
        vocab: &Vocabulary,
        date_found: NaiveDate,
    ) -> Self {
        let r = &result.result;
        let severity = classify_severity(&format!("{} {}", r.title, r.snippet), vocab);
        let description = if r.snippet.chars().count() > ALERT_DESCRIPTION_CHARS {
            format!("{}...", truncate_chars(&r.snippet, ALERT_DESCRIPTION_CHARS))
        } else {
            r.snippet.clone()
        };
        Self {
            title: r.title.clone(),
            entity_name: entity_name.to_string(),
            description,
            severity,
            source_url: r.link.clone(),
            date_found,
        }
    }
}
