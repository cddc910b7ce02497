//! Signature registry and store-wide verification.
//!
//! The store persists registered signatures and hands them back for a
//! linear best-match scan. Two backends exist: an in-memory table and an
//! append-only JSON lines file. The process entry point opens one from
//! [`StoreConfig`], passes it by reference to whatever verifies, and closes
//! it on shutdown.

mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use crate::score::{best_match, ConstellationConfig};
use crate::signature::Signature;
use crate::trace::{trace_event, trace_span};
use crate::util::{ConstellationError, ConstellationResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Capture details submitted with a new signature.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub image_id: String,
    pub author: String,
    pub device_model: String,
    /// Capture time as reported by the device.
    pub timestamp: String,
    #[serde(alias = "constellation")]
    pub signature: Signature,
}

impl RegistrationRequest {
    /// Parses a JSON request; a missing or malformed signature is rejected.
    pub fn from_json(text: &str) -> ConstellationResult<Self> {
        serde_json::from_str(text).map_err(|err| ConstellationError::MalformedRequest {
            reason: err.to_string(),
        })
    }
}

/// An immutable registered signature.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignatureRecord {
    pub id: u64,
    pub image_id: String,
    pub author: String,
    pub device_model: String,
    pub timestamp: String,
    pub signature: Signature,
    pub created_at: DateTime<Utc>,
}

impl SignatureRecord {
    pub(crate) fn from_request(id: u64, request: RegistrationRequest) -> Self {
        Self {
            id,
            image_id: request.image_id,
            author: request.author,
            device_model: request.device_model,
            timestamp: request.timestamp,
            signature: request.signature,
            created_at: Utc::now(),
        }
    }
}

impl AsRef<Signature> for SignatureRecord {
    fn as_ref(&self) -> &Signature {
        &self.signature
    }
}

/// Persistence contract used by verification.
pub trait SignatureStore: Send {
    /// Stores a signature and returns its generated id.
    fn register_signature(&mut self, request: RegistrationRequest) -> ConstellationResult<u64>;

    /// Returns every registered record in registration order.
    fn all_signatures(&self) -> ConstellationResult<Vec<SignatureRecord>>;

    /// Flushes and releases the backend. Later calls fail with `StoreClosed`.
    fn close(&mut self) -> ConstellationResult<()>;
}

/// Backend selection.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Memory,
    JsonFile { path: PathBuf },
}

/// Store configuration read at startup.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
}

/// Opens the configured backend.
pub fn open_store(cfg: &StoreConfig) -> ConstellationResult<Box<dyn SignatureStore>> {
    let _span = trace_span!("open_store").entered();
    Ok(match &cfg.backend {
        StoreBackend::Memory => Box::new(MemoryStore::new()),
        StoreBackend::JsonFile { path } => Box::new(JsonFileStore::open(path)?),
    })
}

/// Details of the registered capture that matched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchMetadata {
    pub image_id: String,
    pub author: String,
    pub device: String,
    pub original_timestamp: String,
    pub registered_at: DateTime<Utc>,
}

/// Result of a store-wide verification query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerificationResponse {
    #[serde(rename = "match")]
    pub is_match: bool,
    /// Best score seen; zero for an empty store.
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MatchMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Scans every stored signature and reports the best match.
///
/// A match requires the best score to exceed `cfg.global_threshold`. A query
/// whose grid differs from any stored record fails with `GridSizeMismatch`.
pub fn verify_signature(
    store: &dyn SignatureStore,
    query: &Signature,
    cfg: &ConstellationConfig,
) -> ConstellationResult<VerificationResponse> {
    let _span = trace_span!("verify_signature", grid = query.grid_size()).entered();

    let records = store.all_signatures()?;
    let best = best_match(query, &records, cfg)?;
    let response = match best {
        Some(best) if best.score > cfg.global_threshold => {
            let record = &records[best.index];
            VerificationResponse {
                is_match: true,
                score: best.score,
                metadata: Some(MatchMetadata {
                    image_id: record.image_id.clone(),
                    author: record.author.clone(),
                    device: record.device_model.clone(),
                    original_timestamp: record.timestamp.clone(),
                    registered_at: record.created_at,
                }),
                message: None,
            }
        }
        other => VerificationResponse {
            is_match: false,
            score: other.map(|best| best.score).unwrap_or(0.0),
            metadata: None,
            message: Some("No authentic record found for this image.".to_string()),
        },
    };

    trace_event!(
        "signature_verified",
        records = records.len(),
        score = response.score,
        matched = response.is_match
    );
    Ok(response)
}
