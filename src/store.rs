// src/store.rs
//! Alert persistence: a flat JSON file, one array of alerts.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::types::Alert;

#[async_trait::async_trait]
pub trait AlertSink: Send + Sync {
    /// Persist a batch of accepted alerts (best-effort, no transactions).
    async fn store(&self, alerts: &[Alert]) -> Result<()>;
}

/// Keeps every stored alert in a single JSON array file.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl AlertSink for JsonFileSink {
    async fn store(&self, alerts: &[Alert]) -> Result<()> {
        let mut all = load_alerts(&self.path).await?;
        all.extend_from_slice(alerts);
        let body = serde_json::to_vec_pretty(&all).context("serializing alerts")?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        tokio::fs::write(&self.path, body)
            .await
            .with_context(|| format!("writing alerts to {}", self.path.display()))?;
        tracing::debug!(target: "store", path = %self.path.display(), added = alerts.len(), total = all.len(), "alerts stored");
        Ok(())
    }
}

/// Read alerts back from a JSON file. A missing file is an empty list.
pub async fn load_alerts(path: &Path) -> Result<Vec<Alert>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(e).with_context(|| format!("reading alerts from {}", path.display()))
        }
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    serde_json::from_slice(&bytes)
        .with_context(|| format!("parsing alerts at {}", path.display()))
}

/// In-memory sink; records every batch it receives.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub batches: std::sync::Mutex<Vec<Vec<Alert>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All stored alerts, flattened in arrival order.
    pub fn all(&self) -> Vec<Alert> {
        let batches = self
            .batches
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        batches.iter().flatten().cloned().collect()
    }
}

#[async_trait::async_trait]
impl AlertSink for MemorySink {
    async fn store(&self, alerts: &[Alert]) -> Result<()> {
        self.batches
            .lock()
            .map_err(|_| anyhow::anyhow!("memory sink mutex poisoned"))?
            .push(alerts.to_vec());
        Ok(())
    }
}
