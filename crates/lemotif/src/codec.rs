// Exemplar Codec
//
// *Le Codec* (The Codec) - Versioned JSON envelope for persisted exemplars

use crate::error::{Result, StoreError};
use crate::types::Exemplar;
use serde::{Deserialize, Serialize};

/// Format version written by this build
pub const FORMAT_VERSION: u32 = 1;

/// On-disk envelope around the exemplar list
#[derive(Debug, Serialize)]
struct EnvelopeRef<'a> {
    format_version: u32,
    exemplars: &'a [Exemplar],
}

#[derive(Debug, Deserialize)]
struct Envelope {
    exemplars: Vec<Exemplar>,
}

/// Only the version field, so a newer layout is reported as a version
/// mismatch instead of corruption.
#[derive(Debug, Deserialize)]
struct VersionHeader {
    format_version: u32,
}

/// Serialize exemplars into a versioned blob
pub fn encode_exemplars(exemplars: &[Exemplar]) -> Result<Vec<u8>> {
    let envelope = EnvelopeRef {
        format_version: FORMAT_VERSION,
        exemplars,
    };
    serde_json::to_vec_pretty(&envelope).map_err(|e| StoreError::Encode(e.to_string()))
}

/// Deserialize a blob produced by [`encode_exemplars`]
///
/// # Errors
///
/// * [`StoreError::Corrupt`] - the bytes are not an envelope at all
/// * [`StoreError::UnsupportedVersion`] - the envelope has another version
pub fn decode_exemplars(bytes: &[u8]) -> Result<Vec<Exemplar>> {
    let header: VersionHeader =
        serde_json::from_slice(bytes).map_err(|e| StoreError::Corrupt(e.to_string()))?;

    if header.format_version != FORMAT_VERSION {
        return Err(StoreError::UnsupportedVersion {
            found: header.format_version,
            expected: FORMAT_VERSION,
        });
    }

    let envelope: Envelope =
        serde_json::from_slice(bytes).map_err(|e| StoreError::Corrupt(e.to_string()))?;

    Ok(envelope.exemplars)
}
