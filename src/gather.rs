// src/gather.rs
//! One gathering run: query providers → validate → link dedup → classify → quality
//! filter → alerts → session dedup.

use anyhow::Result;
use chrono::NaiveDate;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::time::Instant;

use crate::classify::{dedup_by_link, Classifier};
use crate::dedup::DedupSession;
use crate::types::{Alert, ClassifiedResult, RawSearchResult, SearchResult};
use crate::vocab::DEFAULT_MIN_RELEVANCE;

/// Placeholder replaced by the entity name in query templates.
pub const ENTITY_PLACEHOLDER: &str = "{entity}";

/// The external search collaborator.
#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<RawSearchResult>>;
    fn name(&self) -> &'static str;
}

/// One-time metrics registration.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("triage_results_total", "Raw rows returned by providers.");
        describe_counter!(
            "triage_invalid_total",
            "Rows discarded for a missing title or link."
        );
        describe_counter!(
            "triage_filtered_total",
            "Results dropped by link dedup or the quality filter."
        );
        describe_counter!(
            "triage_alert_dedup_total",
            "Alerts suppressed by the session deduplicator."
        );
        describe_counter!(
            "triage_provider_errors_total",
            "Provider search errors."
        );
        describe_histogram!("triage_gather_ms", "Gather run time in milliseconds.");
    });
}

#[derive(Debug, Clone)]
pub struct GatherCfg {
    /// Query templates; `{entity}` is substituted.
    pub queries: Vec<String>,
    pub min_relevance: f32,
}

impl Default for GatherCfg {
    fn default() -> Self {
        Self {
            queries: vec![
                "{entity} financial news updates".into(),
                "{entity} company news".into(),
                "{entity} market analysis report".into(),
            ],
            min_relevance: DEFAULT_MIN_RELEVANCE,
        }
    }
}

impl GatherCfg {
    pub fn queries_for(&self, entity: &str) -> Vec<String> {
        self.queries
            .iter()
            .map(|q| q.replace(ENTITY_PLACEHOLDER, entity))
            .collect()
    }
}

/// Outcome of one entity's run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GatherReport {
    pub entity: String,
    /// Results that passed the quality filter, best first.
    pub results: Vec<ClassifiedResult>,
    /// Alerts that survived session dedup.
    pub alerts: Vec<Alert>,
    pub fetched: usize,
    pub invalid: usize,
    pub link_duplicates: usize,
    pub low_quality: usize,
    pub duplicate_alerts: usize,
    pub provider_errors: usize,
}

/// Run every query against every provider for `entity` and feed the alerts through
/// `session`. The session is **not** reset here; see `DedupSession`.
pub async fn gather_entity(
    providers: &[Box<dyn SearchProvider>],
    entity: &str,
    classifier: &Classifier,
    session: &mut DedupSession,
    cfg: &GatherCfg,
    today: NaiveDate,
) -> GatherReport {
    ensure_metrics_described();
    let t0 = Instant::now();

    let mut report = GatherReport {
        entity: entity.to_string(),
        ..Default::default()
    };

    // Fetch + validate
    let mut valid: Vec<SearchResult> = Vec::new();
    for query in cfg.queries_for(entity) {
        for p in providers {
            let rows = match p.search(&query).await {
                Ok(rows) => rows,
                Err(e) => {
                    tracing::warn!(target: "gather", error = ?e, provider = p.name(), %query, "provider error");
                    counter!("triage_provider_errors_total").increment(1);
                    report.provider_errors += 1;
                    continue;
                }
            };
            report.fetched += rows.len();
            for (i, raw) in rows.into_iter().enumerate() {
                match SearchResult::from_raw(raw, i as i64 + 1) {
                    Some(r) => valid.push(r.with_query(query.clone())),
                    None => report.invalid += 1,
                }
            }
        }
    }

    // Link dedup across queries/providers
    let before = valid.len();
    let unique = dedup_by_link(valid);
    report.link_duplicates = before - unique.len();

    // Classify + quality filter
    let classified: Vec<ClassifiedResult> = unique
        .into_iter()
        .map(|r| classifier.classify_result(r))
        .collect();
    let candidates = classified.len();
    report.results = classifier.filter_high_quality(classified, cfg.min_relevance);
    report.low_quality = candidates - report.results.len();

    // Alerts + session dedup
    for r in &report.results {
        let alert = Alert::from_classified(r, entity, classifier.vocabulary(), today);
        if session.is_duplicate(&alert) {
            report.duplicate_alerts += 1;
        } else {
            report.alerts.push(alert);
        }
    }

    // Telemetry
    let elapsed_ms = t0.elapsed().as_secs_f64() * 1000.0;
    counter!("triage_results_total").increment(report.fetched as u64);
    counter!("triage_invalid_total").increment(report.invalid as u64);
    counter!("triage_filtered_total")
        .increment((report.link_duplicates + report.low_quality) as u64);
    counter!("triage_alert_dedup_total").increment(report.duplicate_alerts as u64);
    histogram!("triage_gather_ms").record(elapsed_ms);

    tracing::info!(
        target: "gather",
        entity,
        fetched = report.fetched,
        invalid = report.invalid,
        link_duplicates = report.link_duplicates,
        low_quality = report.low_quality,
        kept = report.results.len(),
        alerts = report.alerts.len(),
        duplicate_alerts = report.duplicate_alerts,
        "gather run finished"
    );

    report
}

/// Gather several entities in turn, resetting `session` before each one.
pub async fn gather_entities(
    providers: &[Box<dyn SearchProvider>],
    entities: &[String],
    classifier: &Classifier,
    session: &mut DedupSession,
    cfg: &GatherCfg,
    today: NaiveDate,
) -> Vec<GatherReport> {
    let mut out = Vec::with_capacity(entities.len());
    for entity in entities {
        session.reset_session();
        out.push(gather_entity(providers, entity, classifier, session, cfg, today).await);
    }
    out
}

/// Serves a fixed set of rows for every query. Used by the CLI and tests.
pub struct FixtureProvider {
    rows: Vec<RawSearchResult>,
}

impl FixtureProvider {
    pub fn new(rows: Vec<RawSearchResult>) -> Self {
        Self { rows }
    }

    /// Parse a JSON array of provider rows.
    pub fn from_json(content: &str) -> Result<Self> {
        let rows: Vec<RawSearchResult> = serde_json::from_str(content)?;
        Ok(Self::new(rows))
    }
}

#[async_trait::async_trait]
impl SearchProvider for FixtureProvider {
    async fn search(&self, _query: &str) -> Result<Vec<RawSearchResult>> {
        Ok(self.rows.clone())
    }
    fn name(&self) -> &'static str {
        "fixture"
    }
}
