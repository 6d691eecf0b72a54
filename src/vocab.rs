//! # Vocabulary
//!
//! Keyword and domain lists that drive classification, scoring, filtering and
//! severity detection. Nothing in the classifier hard-codes a word; it all lives here.
//!
//! - Loads from TOML or JSON (same file shape either way).
//! - Every section is optional; missing sections fall back to the built-in seed.
//! - Lists are cleaned on load: trimmed, lowercased, empties and duplicates removed.
//! - Lookup order for `load_default()`: `$TRIAGE_VOCAB_PATH` → `config/vocabulary.toml`
//!   → `config/vocabulary.json` → built-in seed.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_VOCAB_PATH: &str = "TRIAGE_VOCAB_PATH";
pub const ENV_MIN_RELEVANCE: &str = "TRIAGE_MIN_RELEVANCE";
pub const DEFAULT_MIN_RELEVANCE: f32 = 0.3;

const DEFAULT_TOML_PATH: &str = "config/vocabulary.toml";
const DEFAULT_JSON_PATH: &str = "config/vocabulary.json";

/// Domain + keyword lists for the classification decision chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyVocab {
    /// Domain endings that look like a generic company site.
    pub company_domain_suffixes: Vec<String>,
    /// Title/snippet words that confirm a company site.
    pub company_keywords: Vec<String>,
    /// Domain fragments of news outlets.
    pub news_domains: Vec<String>,
    /// Announcement verbs in the title.
    pub news_title_keywords: Vec<String>,
    /// Title/snippet indicators of a research report.
    pub research_keywords: Vec<String>,
    /// Domain fragments of government/regulatory hosts.
    pub regulatory_domains: Vec<String>,
    /// Policy words in the title.
    pub regulatory_title_keywords: Vec<String>,
    /// Indicators used by `is_company_result`.
    pub company_indicators: Vec<String>,
}

impl Default for ClassifyVocab {
    fn default() -> Self {
        Self {
            company_domain_suffixes: strings(&[".com", ".co.uk", ".org"]),
            company_keywords: strings(&["company", "solutions", "products", "services", "about"]),
            news_domains: strings(&["news", "reuters", "bloomberg", "techcrunch", "forbes"]),
            news_title_keywords: strings(&["news", "announces", "launches", "acquires"]),
            research_keywords: strings(&[
                "report",
                "market research",
                "analysis",
                "study",
                "forecast",
            ]),
            regulatory_domains: strings(&[".gov", ".mil", "regulation"]),
            regulatory_title_keywords: strings(&[
                "regulation",
                "policy",
                "government",
                "regulatory",
            ]),
            company_indicators: strings(&[
                "company",
                "corporation",
                "inc",
                "ltd",
                "llc",
                "solutions",
                "services",
                "technologies",
            ]),
        }
    }
}

/// Per-type bonus added to the relevance score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeBonus {
    pub company_website: f32,
    pub research_report: f32,
    pub news_article: f32,
    pub regulatory: f32,
    pub other: f32,
}

impl Default for TypeBonus {
    fn default() -> Self {
        Self {
            company_website: 0.3,
            research_report: 0.2,
            news_article: 0.1,
            regulatory: 0.1,
            other: 0.0,
        }
    }
}

/// Relevance scoring parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringVocab {
    /// Rank beyond which the position term is zero.
    pub position_horizon: u32,
    pub position_weight: f32,
    pub keyword_weight: f32,
    /// The relevance vocabulary; keyword density is hits / len.
    pub relevance_keywords: Vec<String>,
    pub type_bonus: TypeBonus,
}

impl Default for ScoringVocab {
    fn default() -> Self {
        Self {
            position_horizon: 10,
            position_weight: 0.3,
            keyword_weight: 0.4,
            relevance_keywords: strings(&[
                "innovative",
                "leading",
                "technology",
                "solutions",
                "market leader",
                "enterprise",
                "industry",
                "advanced",
                "next-generation",
                "ai",
                "digital",
                "platform",
                "software",
                "services",
                "partnership",
            ]),
            type_bonus: TypeBonus::default(),
        }
    }
}

/// Domain lists used by `filter_high_quality`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityVocab {
    /// Social-media hosts that are always dropped.
    pub denylist_domains: Vec<String>,
    /// Publishers that get the authority flag.
    pub authority_domains: Vec<String>,
}

impl Default for QualityVocab {
    fn default() -> Self {
        Self {
            denylist_domains: strings(&["pinterest", "facebook", "twitter", "instagram"]),
            authority_domains: strings(&[
                "reuters.com",
                "bloomberg.com",
                "techcrunch.com",
                "forbes.com",
                "mckinsey.com",
                "bcg.com",
                "deloitte.com",
                "accenture.com",
                "gartner.com",
                "forrester.com",
                "idc.com",
            ]),
        }
    }
}

/// Severity keyword sets, checked in order high → medium → positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityVocab {
    pub high_risk: Vec<String>,
    pub medium_watch: Vec<String>,
    pub positive: Vec<String>,
}

impl Default for SeverityVocab {
    fn default() -> Self {
        Self {
            high_risk: strings(&[
                "bankruptcy",
                "financial trouble",
                "lawsuit",
                "investigation",
                "defaulted",
                "crisis",
            ]),
            medium_watch: strings(&[
                "restructuring",
                "changes",
                "delays",
                "issues",
                "concerns",
                "review",
            ]),
            positive: strings(&[
                "growth",
                "expansion",
                "success",
                "award",
                "contract",
                "investment",
            ]),
        }
    }
}

/// Full vocabulary. `Default` is the built-in seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    pub classify: ClassifyVocab,
    pub scoring: ScoringVocab,
    pub quality: QualityVocab,
    pub severity: SeverityVocab,
    /// Legal-form tokens ignored when comparing alert titles.
    pub entity_suffixes: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            classify: ClassifyVocab::default(),
            scoring: ScoringVocab::default(),
            quality: QualityVocab::default(),
            severity: SeverityVocab::default(),
            entity_suffixes: default_entity_suffixes(),
        }
    }
}

impl Vocabulary {

    /// Load from an explicit path. Supports TOML or JSON.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading vocabulary from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        parse_vocabulary(&content, &ext)
            .with_context(|| format!("parsing vocabulary at {}", path.display()))
    }

    /// Load using env var + fallbacks; the seed when nothing is configured.
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_VOCAB_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_VOCAB_PATH} points to non-existent path"));
            }
            return Self::load_from(&pb);
        }
        for candidate in [DEFAULT_TOML_PATH, DEFAULT_JSON_PATH] {
            let pb = PathBuf::from(candidate);
            if pb.exists() {
                return Self::load_from(&pb);
            }
        }
        tracing::debug!(target: "vocab", "no vocabulary file found, using built-in seed");
        Ok(Self::default())
    }

    /// Trim, lowercase and dedup every list in place.
    pub(crate) fn cleaned(mut self) -> Self {
        let c = &mut self.classify;
        for list in [
            &mut c.company_domain_suffixes,
            &mut c.company_keywords,
            &mut c.news_domains,
            &mut c.news_title_keywords,
            &mut c.research_keywords,
            &mut c.regulatory_domains,
            &mut c.regulatory_title_keywords,
            &mut c.company_indicators,
        ] {
            clean_list(list);
        }
        clean_list(&mut self.scoring.relevance_keywords);
        clean_list(&mut self.quality.denylist_domains);
        clean_list(&mut self.quality.authority_domains);
        clean_list(&mut self.severity.high_risk);
        clean_list(&mut self.severity.medium_watch);
        clean_list(&mut self.severity.positive);
        clean_list(&mut self.entity_suffixes);
        if self.scoring.position_horizon == 0 {
            self.scoring.position_horizon = 1;
        }
        self
    }
}

/// Default legal-form suffixes.
pub fn default_entity_suffixes() -> Vec<String> {
    strings(&[
        "ltd",
        "limited",
        "inc",
        "incorporated",
        "plc",
        "llc",
        "llp",
        "corp",
        "corporation",
        "co",
        "gmbh",
        "ag",
        "sa",
    ])
}

/// `TRIAGE_MIN_RELEVANCE` clamped to [0,1], or the default threshold.
pub fn min_relevance_from_env() -> f32 {
    parse_threshold(std::env::var(ENV_MIN_RELEVANCE).ok()).unwrap_or(DEFAULT_MIN_RELEVANCE)
}

/// Parse a threshold, clamped to [0,1]. Non-numeric and non-finite input is `None`.
pub fn parse_threshold(raw: Option<String>) -> Option<f32> {
    raw.and_then(|s| s.trim().parse::<f32>().ok())
        .filter(|v| v.is_finite())
        .map(|v| v.clamp(0.0, 1.0))
}

fn parse_vocabulary(s: &str, hint_ext: &str) -> Result<Vocabulary> {
    let try_toml_first = hint_ext == "toml" || !s.trim_start().starts_with('{');
    let (first, second): (fn(&str) -> Result<Vocabulary>, fn(&str) -> Result<Vocabulary>) =
        if try_toml_first {
            (parse_toml, parse_json)
        } else {
            (parse_json, parse_toml)
        };
    match first(s) {
        Ok(v) => Ok(v),
        Err(first_err) => second(s).map_err(|_| {
            first_err.context(if try_toml_first {
                "invalid vocabulary (tried TOML, then JSON)"
            } else {
                "invalid vocabulary (tried JSON, then TOML)"
            })
        }),
    }
}

fn parse_toml(s: &str) -> Result<Vocabulary> {
    let v: Vocabulary = toml::from_str(s)?;
    Ok(v.cleaned())
}

fn parse_json(s: &str) -> Result<Vocabulary> {
    let v: Vocabulary = serde_json::from_str(s)?;
    Ok(v.cleaned())
}

fn clean_list(items: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    let cleaned: Vec<String> = items
        .iter()
        .map(|it| it.trim().to_lowercase())
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect();
    *items = cleaned;
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs};

    #[test]
    fn seed_has_fifteen_relevance_keywords() {
        let v = Vocabulary::default();
        assert_eq!(v.scoring.relevance_keywords.len(), 15);
        assert!(!v.entity_suffixes.is_empty());
    }

    #[test]
    fn partial_toml_keeps_seed_sections() {
        let toml = r#"
[quality]
denylist_domains = [" TikTok ", "", "tiktok"]
"#;
        let v = parse_vocabulary(toml, "toml").unwrap();
        assert_eq!(v.quality.denylist_domains, vec!["tiktok".to_string()]);
        // untouched sections come from the seed
        assert_eq!(v.classify, ClassifyVocab::default());
        assert_eq!(v.scoring, ScoringVocab::default());
        assert_eq!(v.entity_suffixes, default_entity_suffixes());
    }

    #[test]
    fn json_is_accepted() {
        let json = r#"{"severity": {"high_risk": ["Recall"]}}"#;
        let v = parse_vocabulary(json, "json").unwrap();
        assert_eq!(v.severity.high_risk, vec!["recall".to_string()]);
        assert_eq!(v.severity.positive, SeverityVocab::default().positive);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_vocabulary("[[[ nope", "toml").is_err());
    }

    #[test]
    fn threshold_env_parsing_clamps() {
        assert_eq!(parse_threshold(Some(" 0.45 ".into())), Some(0.45));
        assert_eq!(parse_threshold(Some("7".into())), Some(1.0));
        assert_eq!(parse_threshold(Some("-1".into())), Some(0.0));
        assert_eq!(parse_threshold(Some("NaN".into())), None);
        assert_eq!(parse_threshold(Some("abc".into())), None);
        assert_eq!(parse_threshold(None), None);
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_fallbacks() {
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        env::remove_var(ENV_VOCAB_PATH);

        // nothing on disk -> seed
        assert_eq!(Vocabulary::load_default().unwrap(), Vocabulary::default());

        // ./config/vocabulary.toml fallback
        fs::create_dir_all(tmp.path().join("config")).unwrap();
        fs::write(
            tmp.path().join("config/vocabulary.toml"),
            "entity_suffixes = [\"Pty\"]\n",
        )
        .unwrap();
        let v = Vocabulary::load_default().unwrap();
        assert_eq!(v.entity_suffixes, vec!["pty".to_string()]);

        // env wins
        let p = tmp.path().join("custom.json");
        fs::write(&p, r#"{"entity_suffixes": ["KK"]}"#).unwrap();
        env::set_var(ENV_VOCAB_PATH, p.display().to_string());
        let v = Vocabulary::load_default().unwrap();
        assert_eq!(v.entity_suffixes, vec!["kk".to_string()]);

        // env pointing nowhere is an error
        env::set_var(ENV_VOCAB_PATH, tmp.path().join("missing.toml").display().to_string());
        assert!(Vocabulary::load_default().is_err());
        env::remove_var(ENV_VOCAB_PATH);

        env::set_current_dir(&old).unwrap();
    }
}
