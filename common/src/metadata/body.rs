// Metadata body: the JSON payload stored after the header

use log::trace;
use serde_json::{Map, Value};

use crate::config::{MAX_METADATA_SIZE, MAX_PAYLOAD_SIZE, PAGE_SIZE, SHORT_METADATA_SIZE};
use crate::error::{RegistryError, RegistryResult};

/// Raw JSON-encoded metadata payload
///
/// An empty JSON object is stored as an empty body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssetMetadataBody {
    bytes: Vec<u8>,
}

impl AssetMetadataBody {
    /// Wrap already-encoded bytes, rejecting bodies that cannot fit in a box
    pub fn new(bytes: Vec<u8>) -> RegistryResult<Self> {
        if bytes.len() > MAX_METADATA_SIZE {
            return Err(RegistryError::InvalidSize(format!(
                "metadata size {} exceeds maximum {}",
                bytes.len(),
                MAX_METADATA_SIZE
            )));
        }
        Ok(Self { bytes })
    }

    /// Encode a JSON object as compact UTF-8 JSON
    pub fn from_json(json_obj: &Map<String, Value>) -> RegistryResult<Self> {
        if json_obj.is_empty() {
            return Ok(Self::default());
        }

        let bytes = serde_json::to_vec(json_obj)
            .map_err(|e| RegistryError::InvalidPayload(e.to_string()))?;
        Self::new(bytes)
    }

    /// Same as [`Self::from_json`] but for an arbitrary JSON value,
    /// which must be an object at the top level
    pub fn from_value(value: &Value) -> RegistryResult<Self> {
        match value {
            Value::Object(map) => Self::from_json(map),
            _ => Err(RegistryError::InvalidPayload(
                "metadata JSON must be an object at the top level".to_string(),
            )),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn is_short(&self) -> bool {
        self.size() <= SHORT_METADATA_SIZE
    }

    /// Decode the body back into a JSON object
    pub fn json(&self) -> RegistryResult<Map<String, Value>> {
        if self.is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_slice(&self.bytes) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(RegistryError::MalformedRecord(
                "metadata body is not a JSON object".to_string(),
            )),
            Err(e) => Err(RegistryError::MalformedRecord(format!(
                "metadata body is not valid JSON: {}",
                e
            ))),
        }
    }

    /// Payload chunks for the create call and its extra-payload calls
    pub fn chunked_payload(&self) -> Vec<Vec<u8>> {
        split_chunks(&self.bytes, MAX_PAYLOAD_SIZE)
    }

    /// Fixed-size pages used for hashing
    pub fn pages(&self) -> Vec<Vec<u8>> {
        split_chunks(&self.bytes, PAGE_SIZE)
    }
}

/// Split `bytes` into ordered chunks of at most `max_chunk_size` bytes
///
/// Always returns at least one chunk: an empty body yields a single
/// empty chunk so a create call always has a first payload.
pub fn chunk_body(bytes: &[u8], max_chunk_size: usize) -> RegistryResult<Vec<Vec<u8>>> {
    if max_chunk_size == 0 {
        return Err(RegistryError::InvalidSize(
            "max chunk size must be positive".to_string(),
        ));
    }
    Ok(split_chunks(bytes, max_chunk_size))
}

fn split_chunks(bytes: &[u8], max_chunk_size: usize) -> Vec<Vec<u8>> {
    if bytes.is_empty() {
        return vec![Vec::new()];
    }

    let chunks: Vec<Vec<u8>> = bytes
        .chunks(max_chunk_size)
        .map(|chunk| chunk.to_vec())
        .collect();
    trace!(
        "split {} bytes into {} chunks of at most {} bytes",
        bytes.len(),
        chunks.len(),
        max_chunk_size
    );
    chunks
}
