// Asset metadata, write side and read side

use log::debug;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::crypto::Hash;
use crate::error::{RegistryError, RegistryResult};

use super::{
    compute_header_hash, compute_storage_delta, derive_identifiers_byte, encode_header,
    split_box_value, AssetMetadataBody, AssetMetadataHeader, MbrDelta, MetadataFlags,
};

/// Metadata as supplied by the ASA manager before it is written
///
/// The identifiers byte and both hashes are always derived, never supplied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetMetadata {
    pub asset_id: u64,
    pub body: AssetMetadataBody,
    pub flags: MetadataFlags,
    pub deprecated_by: u64,
}

impl AssetMetadata {
    pub fn new(
        asset_id: u64,
        body: AssetMetadataBody,
        flags: MetadataFlags,
        deprecated_by: u64,
    ) -> Self {
        Self {
            asset_id,
            body,
            flags,
            deprecated_by,
        }
    }

    pub fn from_json(
        asset_id: u64,
        json_obj: &Map<String, Value>,
        flags: MetadataFlags,
        deprecated_by: u64,
    ) -> RegistryResult<Self> {
        let body = AssetMetadataBody::from_json(json_obj)?;
        Ok(Self::new(asset_id, body, flags, deprecated_by))
    }

    pub fn identifiers_byte(&self) -> u8 {
        derive_identifiers_byte(self.body.size())
    }

    pub fn is_short(&self) -> bool {
        self.body.is_short()
    }

    pub fn compute_header_hash(&self) -> Hash {
        compute_header_hash(
            self.identifiers_byte(),
            self.flags.reversible_byte(),
            self.flags.irreversible_byte(),
        )
    }

    pub fn compute_metadata_hash(&self) -> RegistryResult<Hash> {
        encode_header(
            self.identifiers_byte(),
            self.flags.reversible_byte(),
            self.flags.irreversible_byte(),
            &self.body.pages(),
        )
    }

    /// MBR delta against the currently stored body size, if any
    pub fn get_mbr_delta(&self, old_size: Option<usize>) -> RegistryResult<MbrDelta> {
        compute_storage_delta(self.body.size() as i64, old_size.map(|s| s as i64))
    }

    /// Header as it will be persisted at `last_modified_round`
    pub fn to_header(&self, last_modified_round: u64) -> RegistryResult<AssetMetadataHeader> {
        Ok(AssetMetadataHeader {
            identifiers: self.identifiers_byte(),
            flags: self.flags,
            metadata_hash: self.compute_metadata_hash()?,
            last_modified_round,
            deprecated_by: self.deprecated_by,
        })
    }
}

/// Human-readable summary of the header fields derived for a write
#[derive(Clone, Debug, Serialize)]
pub struct HeaderDescription {
    pub metadata_size_bytes: usize,
    pub identifiers_byte: u8,
    pub reversible_flags_byte: u8,
    pub irreversible_flags_byte: u8,
    pub is_short: bool,
    pub header_hash_hex: String,
    pub arc89_metadata_hash_hex: String,
    pub deprecated_by: u64,
}

pub fn describe_header(metadata: &AssetMetadata) -> RegistryResult<HeaderDescription> {
    Ok(HeaderDescription {
        metadata_size_bytes: metadata.body.size(),
        identifiers_byte: metadata.identifiers_byte(),
        reversible_flags_byte: metadata.flags.reversible_byte(),
        irreversible_flags_byte: metadata.flags.irreversible_byte(),
        is_short: metadata.is_short(),
        header_hash_hex: metadata.compute_header_hash().to_hex(),
        arc89_metadata_hash_hex: metadata.compute_metadata_hash()?.to_hex(),
        deprecated_by: metadata.deprecated_by,
    })
}

/// A record read back from storage, with its hash verified
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetMetadataRecord {
    pub app_id: u64,
    pub asset_id: u64,
    pub header: AssetMetadataHeader,
    pub body: AssetMetadataBody,
}

impl AssetMetadataRecord {
    /// Decode a raw box value and verify its metadata hash
    pub fn from_box(app_id: u64, asset_id: u64, value: &[u8]) -> RegistryResult<Self> {
        let (header, body) = split_box_value(value)?;
        let body = AssetMetadataBody::new(body.to_vec())
            .map_err(|e| RegistryError::MalformedRecord(e.to_string()))?;
        let record = Self {
            app_id,
            asset_id,
            header,
            body,
        };
        record.verify()?;
        Ok(record)
    }

    /// Recompute the metadata hash from the stored bytes
    pub fn compute_metadata_hash(&self) -> RegistryResult<Hash> {
        encode_header(
            self.header.identifiers,
            self.header.flags.reversible_byte(),
            self.header.flags.irreversible_byte(),
            &self.body.pages(),
        )
    }

    pub fn verify(&self) -> RegistryResult<()> {
        let expected = derive_identifiers_byte(self.body.size());
        if self.header.identifiers != expected {
            debug!(
                "asset {}: identifiers {:#04x} do not match body size {}",
                self.asset_id,
                self.header.identifiers,
                self.body.size()
            );
            return Err(RegistryError::MalformedRecord(format!(
                "identifiers byte {:#04x} does not match body size {}",
                self.header.identifiers,
                self.body.size()
            )));
        }

        let computed = self.compute_metadata_hash()?;
        if computed != self.header.metadata_hash {
            debug!(
                "asset {}: stored hash {} != computed {}",
                self.asset_id, self.header.metadata_hash, computed
            );
            return Err(RegistryError::MalformedRecord(format!(
                "metadata hash mismatch (stored={}, computed={})",
                self.header.metadata_hash, computed
            )));
        }
        Ok(())
    }

    pub fn json(&self) -> RegistryResult<Map<String, Value>> {
        self.body.json()
    }

    /// Back to the write-side representation
    pub fn to_metadata(&self) -> AssetMetadata {
        AssetMetadata::new(
            self.asset_id,
            self.body.clone(),
            self.header.flags,
            self.header.deprecated_by,
        )
    }
}
