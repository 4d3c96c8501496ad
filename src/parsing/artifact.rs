//! JSON artifacts with a version envelope.
//!
//! Every artifact is written as
//! `{"version": ..., "created_at": ..., "kind": ..., "data": ...}` so a kmer
//! map cannot be mistaken for an alignment when a manifest is wrong.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::alignment::KmerAlignment;
use crate::core::kmer::KmerMap;
use crate::core::reconstruction::{ReconstructionMap, ReconstructionSummary};
use crate::parsing::ParseError;

/// Artifact format version for compatibility checking
pub const ARTIFACT_VERSION: &str = "1.0.0";

/// A type that can be stored as an artifact
pub trait Artifact: Serialize + DeserializeOwned {
    /// Kind tag stored in the envelope
    const KIND: &'static str;
}

impl Artifact for KmerMap {
    const KIND: &'static str = "kmer-map";
}

impl Artifact for KmerAlignment {
    const KIND: &'static str = "kmer-alignment";
}

impl Artifact for ReconstructionMap {
    const KIND: &'static str = "reconstruction-map";
}

impl Artifact for ReconstructionSummary {
    const KIND: &'static str = "reconstruction-summary";
}

/// Serializable envelope around an artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactData<T> {
    pub version: String,
    pub created_at: String,
    pub kind: String,
    pub data: T,
}

/// Serialize an artifact to pretty JSON
///
/// # Errors
///
/// Returns `ParseError::Json` if serialization fails.
pub fn to_json<T: Artifact>(artifact: &T) -> Result<String, ParseError> {
    let envelope = ArtifactData {
        version: ARTIFACT_VERSION.to_string(),
        created_at: chrono::Utc::now().to_rfc3339(),
        kind: T::KIND.to_string(),
        data: artifact,
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

/// Parse an artifact from JSON, checking its kind
///
/// # Errors
///
/// Returns `ParseError::Json` for malformed JSON and
/// `ParseError::InvalidFormat` when the stored kind differs from `T`.
pub fn from_json<T: Artifact>(json: &str) -> Result<T, ParseError> {
    // Check the kind before committing to T's layout
    let envelope: ArtifactData<serde_json::Value> = serde_json::from_str(json)?;

    if envelope.kind != T::KIND {
        return Err(ParseError::InvalidFormat(format!(
            "expected a {} artifact, found {}",
            T::KIND,
            envelope.kind
        )));
    }
    // Version check (warn but don't fail)
    if envelope.version != ARTIFACT_VERSION {
        warn!(
            expected = ARTIFACT_VERSION,
            found = %envelope.version,
            kind = T::KIND,
            "Artifact version mismatch"
        );
    }
    Ok(serde_json::from_value(envelope.data)?)
}

/// Write an artifact file
///
/// # Errors
///
/// Returns `ParseError::Io` or `ParseError::Json` on failure.
pub fn save<T: Artifact>(path: &Path, artifact: &T) -> Result<(), ParseError> {
    std::fs::write(path, to_json(artifact)?)?;
    Ok(())
}

/// Read an artifact file
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, otherwise as
/// [`from_json`].
pub fn load<T: Artifact>(path: &Path) -> Result<T, ParseError> {
    let content = std::fs::read_to_string(path)?;
    from_json(&content)
}
