//! intel-triage: classify a batch of search results for one entity and print the
//! surviving results and alerts as JSON.
//!
//! Usage: `intel-triage <results.json> <entity> [--min-relevance X] [--store alerts.json]`

use anyhow::{anyhow, bail, Context, Result};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use intel_triage::gather::FixtureProvider;
use intel_triage::store::{load_alerts, AlertSink, JsonFileSink};
use intel_triage::vocab::{min_relevance_from_env, parse_threshold};
use intel_triage::{gather_entity, Classifier, DedupSession, GatherCfg, SearchProvider, Vocabulary};

struct Args {
    results: PathBuf,
    entity: String,
    min_relevance: Option<f32>,
    store: Option<PathBuf>,
}

fn parse_args(mut it: impl Iterator<Item = String>) -> Result<Args> {
    let mut positional = Vec::new();
    let mut min_relevance = None;
    let mut store = None;
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--min-relevance" => {
                let v = it.next().ok_or_else(|| anyhow!("--min-relevance needs a value"))?;
                let parsed = parse_threshold(Some(v.clone()))
                    .ok_or_else(|| anyhow!("invalid --min-relevance `{v}`"))?;
                min_relevance = Some(parsed);
            }
            "--store" => {
                let v = it.next().ok_or_else(|| anyhow!("--store needs a path"))?;
                store = Some(PathBuf::from(v));
            }
            _ => positional.push(arg),
        }
    }
    if positional.len() != 2 {
        bail!("usage: intel-triage <results.json> <entity> [--min-relevance X] [--store alerts.json]");
    }
    let entity = positional.pop().unwrap_or_default();
    let results = PathBuf::from(positional.pop().unwrap_or_default());
    Ok(Args {
        results,
        entity,
        min_relevance,
        store,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("intel_triage=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env in local/dev; no-op elsewhere.
    let _ = dotenvy::dotenv();
    init_tracing();

    let args = parse_args(std::env::args().skip(1))?;

    let vocab = Vocabulary::load_default().context("loading vocabulary")?;
    let mut session = DedupSession::for_vocabulary(&vocab);
    let classifier = Classifier::new(vocab);

    let content = std::fs::read_to_string(&args.results)
        .with_context(|| format!("reading {}", args.results.display()))?;
    let provider = FixtureProvider::from_json(&content)
        .with_context(|| format!("parsing {}", args.results.display()))?;
    let providers: Vec<Box<dyn SearchProvider>> = vec![Box::new(provider)];

    // Previously stored alerts count as already seen.
    if let Some(path) = &args.store {
        let previous = load_alerts(path).await?;
        let seeded = session.seed(previous.iter().filter(|a| a.entity_name == args.entity));
        tracing::info!(seeded, "session seeded from store");
    }

    let cfg = GatherCfg {
        queries: vec!["{entity}".into()],
        min_relevance: args.min_relevance.unwrap_or_else(min_relevance_from_env),
    };
    let today = chrono::Local::now().date_naive();
    let report = gather_entity(&providers, &args.entity, &classifier, &mut session, &cfg, today).await;

    if let Some(path) = &args.store {
        JsonFileSink::new(path).store(&report.alerts).await?;
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
