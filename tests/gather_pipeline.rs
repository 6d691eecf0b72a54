// tests/gather_pipeline.rs
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use intel_triage::gather::{gather_entities, gather_entity, FixtureProvider, GatherCfg, SearchProvider};
use intel_triage::types::{RawSearchResult, ResultType};
use intel_triage::{Classifier, DedupSession};

fn row(title: Option<&str>, link: Option<&str>, snippet: &str) -> RawSearchResult {
    RawSearchResult {
        title: title.map(Into::into),
        link: link.map(Into::into),
        snippet: Some(snippet.into()),
        position: None,
    }
}

fn rows() -> Vec<RawSearchResult> {
    vec![
        row(
            Some("Acme Water Solutions — About"),
            Some("https://acmewater.com/about"),
            "leading water technology services",
        ),
        row(
            Some("Acme Water wins £10m contract"),
            Some("https://www.reuters.com/acme"),
            "<b>Acme</b> Water secured a &pound;10m contract",
        ),
        row(None, Some("https://broken.example/x"), "no title"),
        row(Some("Acme on Pinterest"), Some("https://www.pinterest.com/acme"), "services"),
        row(Some("Acme Water"), Some(""), "no link"),
    ]
}

struct FailingProvider;

#[async_trait]
impl SearchProvider for FailingProvider {
    async fn search(&self, _query: &str) -> Result<Vec<RawSearchResult>> {
        Err(anyhow!("quota exceeded"))
    }
    fn name(&self) -> &'static str {
        "failing"
    }
}

fn cfg() -> GatherCfg {
    GatherCfg {
        queries: vec!["{entity} news".into()],
        min_relevance: 0.0,
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
}

#[tokio::test]
async fn pipeline_filters_and_builds_alerts() {
    let providers: Vec<Box<dyn SearchProvider>> = vec![
        Box::new(FailingProvider),
        Box::new(FixtureProvider::new(rows())),
    ];
    let classifier = Classifier::default();
    let mut session = DedupSession::new();

    let report =
        gather_entity(&providers, "Acme Water", &classifier, &mut session, &cfg(), today()).await;

    assert_eq!(report.provider_errors, 1);
    assert_eq!(report.fetched, 5);
    assert_eq!(report.invalid, 2);
    // pinterest dropped by the denylist
    assert_eq!(report.low_quality, 1);
    assert_eq!(report.results.len(), 2);
    // reuters is authoritative and sorts first
    assert!(report.results[0].authority_bonus);
    assert_eq!(report.results[0].result.snippet, "Acme Water secured a £10m contract");
    assert_eq!(report.results[1].result_type, ResultType::CompanyWebsite);
    assert_eq!(report.results[1].result.query.as_deref(), Some("Acme Water news"));

    assert_eq!(report.alerts.len(), 2);
    assert!(report.alerts.iter().all(|a| a.entity_name == "Acme Water"));
    assert!(report.alerts.iter().all(|a| a.date_found == today()));
}

#[tokio::test]
async fn repeated_queries_dedup_links_and_session_persists() {
    let providers: Vec<Box<dyn SearchProvider>> = vec![Box::new(FixtureProvider::new(rows()))];
    let classifier = Classifier::default();
    let mut session = DedupSession::new();
    let cfg = GatherCfg {
        queries: vec!["{entity} news".into(), "{entity} report".into()],
        min_relevance: 0.0,
    };

    let first = gather_entity(&providers, "Acme Water", &classifier, &mut session, &cfg, today()).await;
    // second query returned the same links
    assert_eq!(first.link_duplicates, 3);
    assert_eq!(first.alerts.len(), 2);

    // no reset: everything is a duplicate now
    let second = gather_entity(&providers, "Acme Water", &classifier, &mut session, &cfg, today()).await;
    assert!(second.alerts.is_empty());
    assert_eq!(second.duplicate_alerts, 2);
}

#[tokio::test]
async fn gather_entities_resets_between_entities() {
    let providers: Vec<Box<dyn SearchProvider>> = vec![Box::new(FixtureProvider::new(rows()))];
    let classifier = Classifier::default();
    let mut session = DedupSession::new();
    let entities = vec!["Acme Water".to_string(), "Acme Water".to_string()];

    let reports =
        gather_entities(&providers, &entities, &classifier, &mut session, &cfg(), today()).await;
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].alerts.len(), 2);
    // reset before the second run accepts the same alerts again
    assert_eq!(reports[1].alerts.len(), 2);
}

#[tokio::test]
async fn high_threshold_keeps_nothing() {
    let providers: Vec<Box<dyn SearchProvider>> = vec![Box::new(FixtureProvider::new(rows()))];
    let cfg = GatherCfg {
        queries: vec!["{entity}".into()],
        min_relevance: 1.0,
    };
    let mut session = DedupSession::new();
    let report = gather_entity(&providers, "Acme", &Classifier::default(), &mut session, &cfg, today()).await;
    assert!(report.results.is_empty());
    assert!(report.alerts.is_empty());
    assert_eq!(session.len(), 0);
}
