//! Alert deduplication for one gathering session.
//!
//! An alert is a duplicate when either
//! - its signature (lowercased title + entity + first 100 chars of description) was
//!   already accepted in this session, or
//! - an accepted alert for the **same** `entity_name` has a title that contains, or is
//!   contained in, this alert's title (case-insensitive). Titles are compared both
//!   verbatim and with legal-form tokens (ltd, inc, plc, …) removed.
//!
//! The title rule is loose on purpose: a short generic title ("Water") swallows every
//! later alert for that entity. That is a known false-positive source, kept as is.
//!
//! Session contract: the session is owned by the caller and is never reset implicitly.
//! Call `reset_session()` before gathering alerts for a different entity, or alerts
//! about unrelated entities with identical signatures keep suppressing each other.
//! The check-then-insert in `is_duplicate` is not atomic; share a session across
//! threads only behind a lock.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;

use crate::normalize::truncate_chars;
use crate::types::Alert;
use crate::vocab::{default_entity_suffixes, Vocabulary};

/// Characters of the description that take part in the signature.
pub const SIGNATURE_DESCRIPTION_CHARS: usize = 100;

const FIELD_SEP: u8 = 0x1f;

/// 128-bit content digest of an alert.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlertSignature([u8; 16]);

impl AlertSignature {
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(32);
        for b in self.0.iter() {
            use std::fmt::Write as _;
            let _ = write!(&mut out, "{:02x}", b);
        }
        out
    }
}

impl fmt::Display for AlertSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for AlertSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AlertSignature({})", self.to_hex())
    }
}

/// Pure function of the three fields; see module docs for normalization.
pub fn signature(title: &str, entity_name: &str, description: &str) -> AlertSignature {
    let description = truncate_chars(description, SIGNATURE_DESCRIPTION_CHARS).to_lowercase();

    let mut hasher = Sha256::new();
    hasher.update(title.to_lowercase().as_bytes());
    hasher.update([FIELD_SEP]);
    hasher.update(entity_name.to_lowercase().as_bytes());
    hasher.update([FIELD_SEP]);
    hasher.update(description.as_bytes());
    let digest = hasher.finalize();

    let mut out = [0u8; 16];
    out.copy_from_slice(&digest[..16]);
    AlertSignature(out)
}

/// Signature of an alert's own fields.
pub fn alert_signature(alert: &Alert) -> AlertSignature {
    signature(&alert.title, &alert.entity_name, &alert.description)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing accepted since construction or the last reset.
    Empty,
    /// At least one alert accepted.
    Accumulating,
}

#[derive(Debug, Clone)]
struct Accepted {
    alert: Alert,
    title_lc: String,
    title_core: String,
}

/// Caller-owned dedup state for one gathering run.
#[derive(Debug, Clone)]
pub struct DedupSession {
    entity_suffixes: Vec<String>,
    accepted: HashMap<AlertSignature, Accepted>,
    order: Vec<AlertSignature>,
}

impl Default for DedupSession {
    fn default() -> Self {
        Self::with_suffixes(default_entity_suffixes())
    }
}

impl DedupSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session using the vocabulary's legal-form suffix list.
    pub fn for_vocabulary(vocab: &Vocabulary) -> Self {
        Self::with_suffixes(vocab.entity_suffixes.clone())
    }

    pub fn with_suffixes(entity_suffixes: Vec<String>) -> Self {
        Self {
            entity_suffixes: entity_suffixes
                .into_iter()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
            accepted: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        if self.order.is_empty() {
            SessionState::Empty
        } else {
            SessionState::Accumulating
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Accepted alerts, in acceptance order.
    pub fn accepted(&self) -> impl Iterator<Item = &Alert> + '_ {
        self.order
            .iter()
            .filter_map(move |sig| self.accepted.get(sig).map(|a| &a.alert))
    }

    pub fn get(&self, sig: &AlertSignature) -> Option<&Alert> {
        self.accepted.get(sig).map(|a| &a.alert)
    }

    /// Returns `true` for a duplicate (state untouched); otherwise records the alert and
    /// returns `false`.
    pub fn is_duplicate(&mut self, alert: &Alert) -> bool {
        let sig = alert_signature(alert);
        if self.accepted.contains_key(&sig) {
            tracing::debug!(target: "dedup", signature = %sig, "signature already seen");
            return true;
        }

        let title_lc = alert.title.to_lowercase();
        let title_core = self.core_title(&title_lc);
        let overlapping = self
            .order
            .iter()
            .filter_map(|s| self.accepted.get(s))
            .filter(|prev| prev.alert.entity_name == alert.entity_name)
            .any(|prev| {
                contains_either(&prev.title_lc, &title_lc)
                    || (!prev.title_core.is_empty()
                        && !title_core.is_empty()
                        && contains_either(&prev.title_core, &title_core))
            });
        if overlapping {
            tracing::debug!(
                target: "dedup",
                signature = %sig,
                entity = %alert.entity_name,
                "title overlaps an accepted alert"
            );
            return true;
        }

        self.accepted.insert(
            sig,
            Accepted {
                alert: alert.clone(),
                title_lc,
                title_core,
            },
        );
        self.order.push(sig);
        false
    }

    /// Back to `Empty`.
    pub fn reset_session(&mut self) {
        self.accepted.clear();
        self.order.clear();
    }

    /// Keep only non-duplicates, in input order.
    pub fn filter_batch<I>(&mut self, alerts: I) -> Vec<Alert>
    where
        I: IntoIterator<Item = Alert>,
    {
        alerts
            .into_iter()
            .filter(|a| !self.is_duplicate(a))
            .collect()
    }

    /// Replay previously persisted alerts into the session. Returns how many were accepted.
    pub fn seed<'a, I>(&mut self, alerts: I) -> usize
    where
        I: IntoIterator<Item = &'a Alert>,
    {
        alerts
            .into_iter()
            .filter(|a| !self.is_duplicate(a))
            .count()
    }

    /// Lowercased title without legal-form tokens, single-spaced.
    fn core_title(&self, title_lc: &str) -> String {
        title_lc
            .split_whitespace()
            .filter(|tok| {
                let bare = tok.trim_matches(|c: char| !c.is_alphanumeric());
                !self.entity_suffixes.iter().any(|s| s == bare)
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn contains_either(a: &str, b: &str) -> bool {
    a.contains(b) || b.contains(a)
}
