// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod classify;
pub mod dedup;
pub mod gather;
pub mod normalize;
pub mod severity;
pub mod store;
pub mod types;
pub mod vocab;

// ---- Re-exports for stable public API ----
pub use crate::classify::{dedup_by_link, Classifier};
pub use crate::dedup::{signature, AlertSignature, DedupSession, SessionState};
pub use crate::gather::{gather_entities, gather_entity, GatherCfg, GatherReport, SearchProvider};
pub use crate::types::{Alert, ClassifiedResult, RawSearchResult, ResultType, SearchResult, Severity};
pub use crate::vocab::Vocabulary;
