// ASA Metadata Registry Operations
// This module contains the create / update / delete / read logic for
// metadata records.
//
// The operations are backend-agnostic:
// - Asset facts and box storage are abstracted via traits
// - The caller and registry identity are passed in a context
// - Every write is handed to the backend as one atomic group

mod create;
mod delete;
mod memory;
mod query;
mod update;
mod validation;

pub use create::*;
pub use delete::*;
pub use memory::*;
pub use query::*;
pub use update::*;
pub use validation::*;

use serde::{Deserialize, Serialize};

use crate::crypto::Hash;
use crate::error::RegistryResult;
use crate::metadata::{AssetMetadata, MbrDelta};
use crate::network::RegistryConfig;

// ========================================
// Collaborator Traits (for dependency injection)
// ========================================

/// Externally visible ASA parameters
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetParams {
    pub asset_id: u64,
    pub manager: Option<String>,
    pub name: Option<String>,
    pub url: Option<String>,
}

/// Source of on-chain asset parameters
pub trait AssetProvider {
    /// `Ok(None)` when the asset does not exist
    fn asset_params(&self, asset_id: u64) -> Result<Option<AssetParams>, anyhow::Error>;
}

/// Lifecycle state of a metadata record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetadataState {
    Absent,
    Created,
    Deleted,
}

/// Box storage backend holding one record per asset id
pub trait MetadataStore {
    fn metadata_state(&self, asset_id: u64) -> Result<MetadataState, anyhow::Error>;

    /// Raw box value (header followed by body)
    fn load(&self, asset_id: u64) -> Result<Option<Vec<u8>>, anyhow::Error>;

    /// Apply a write group atomically and return the round it was applied at
    ///
    /// A create must fail with `AlreadyExists` if a record exists at commit
    /// time, regardless of earlier checks.
    fn commit(&mut self, group: WriteGroup) -> RegistryResult<u64>;
}

// ========================================
// Write Groups
// ========================================

/// Header fields and payload calls for a create or replace
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetadataWrite {
    pub identifiers: u8,
    pub reversible_flags: u8,
    pub irreversible_flags: u8,
    pub metadata_hash: Hash,
    pub deprecated_by: u64,
    pub metadata_size: usize,
    /// First chunk, attached to the create / replace call
    pub payload: Vec<u8>,
    /// Remaining chunks, one extra-payload call each, in order
    pub extra_payloads: Vec<Vec<u8>>,
}

impl MetadataWrite {
    /// Derive header fields and split the body into payload calls
    pub fn from_metadata(metadata: &AssetMetadata) -> RegistryResult<Self> {
        let metadata_hash = metadata.compute_metadata_hash()?;
        let mut chunks = metadata.body.chunked_payload().into_iter();
        Ok(Self {
            identifiers: metadata.identifiers_byte(),
            reversible_flags: metadata.flags.reversible_byte(),
            irreversible_flags: metadata.flags.irreversible_byte(),
            metadata_hash,
            deprecated_by: metadata.deprecated_by,
            metadata_size: metadata.body.size(),
            payload: chunks.next().unwrap_or_default(),
            extra_payloads: chunks.collect(),
        })
    }

    /// Concatenate all payload calls back into the body
    pub fn assemble_body(&self) -> Vec<u8> {
        let mut body = Vec::with_capacity(self.metadata_size);
        body.extend_from_slice(&self.payload);
        for chunk in &self.extra_payloads {
            body.extend_from_slice(chunk);
        }
        body
    }

    pub fn payload_calls(&self) -> usize {
        1 + self.extra_payloads.len()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteAction {
    Create(MetadataWrite),
    Replace(MetadataWrite),
    Delete,
}

/// One atomic group submitted to the backend
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteGroup {
    pub asset_id: u64,
    pub action: WriteAction,
    /// MBR payment (positive) or refund (negative) carried by the group
    pub mbr_delta: MbrDelta,
}

// ========================================
// Runtime Context
// ========================================

/// Caller and registry identity for an operation
pub struct RegistryContext<'a> {
    pub config: &'a RegistryConfig,
    /// Address of the signing account
    pub caller: &'a str,
}

impl<'a> RegistryContext<'a> {
    pub fn new(config: &'a RegistryConfig, caller: &'a str) -> Self {
        Self { config, caller }
    }
}
