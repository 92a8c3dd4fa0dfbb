// In-memory registry backend
//
// Mirrors what the on-chain registry enforces when a group is submitted:
// a group is fully validated against a staged copy before anything is
// applied, so a failing group leaves the store untouched.

use std::collections::{HashMap, HashSet};

use log::{debug, info};

use crate::config::MAX_PAYLOAD_SIZE;
use crate::error::{RegistryError, RegistryResult};
use crate::metadata::{
    compute_delete_delta, compute_storage_delta, split_box_value, unpack_flags,
    AssetMetadataHeader, AssetMetadataRecord, MbrDelta,
};

use super::{AssetParams, AssetProvider, MetadataState, MetadataStore, MetadataWrite, WriteAction, WriteGroup};

#[derive(Debug, Default)]
pub struct MemoryMetadataStore {
    boxes: HashMap<u64, Vec<u8>>,
    deleted: HashSet<u64>,
    round: u64,
    // MBR currently locked by stored boxes
    mbr_balance: u64,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting rounds from `round`
    pub fn with_round(round: u64) -> Self {
        Self {
            round,
            ..Self::default()
        }
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn mbr_balance(&self) -> u64 {
        self.mbr_balance
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Place a raw box value as if it had been written by another client
    pub fn insert_raw(&mut self, asset_id: u64, value: Vec<u8>) {
        self.deleted.remove(&asset_id);
        self.boxes.insert(asset_id, value);
    }

    fn stored_size(&self, asset_id: u64) -> RegistryResult<Option<(AssetMetadataHeader, usize)>> {
        match self.boxes.get(&asset_id) {
            Some(value) => {
                let (header, body) = split_box_value(value)?;
                Ok(Some((header, body.len())))
            }
            None => Ok(None),
        }
    }

    fn build_box(asset_id: u64, write: &MetadataWrite, round: u64) -> RegistryResult<Vec<u8>> {
        if let Some(chunk) = std::iter::once(&write.payload)
            .chain(write.extra_payloads.iter())
            .find(|chunk| chunk.len() > MAX_PAYLOAD_SIZE)
        {
            return Err(RegistryError::InvalidSize(format!(
                "payload chunk of {} bytes exceeds {}",
                chunk.len(),
                MAX_PAYLOAD_SIZE
            )));
        }

        let body = write.assemble_body();
        if body.len() != write.metadata_size {
            return Err(RegistryError::InvalidSize(format!(
                "declared metadata size {} but payloads carry {} bytes",
                write.metadata_size,
                body.len()
            )));
        }

        let header = AssetMetadataHeader {
            identifiers: write.identifiers,
            flags: unpack_flags(write.reversible_flags, write.irreversible_flags)?,
            metadata_hash: write.metadata_hash,
            last_modified_round: round,
            deprecated_by: write.deprecated_by,
        };

        let mut value = header.to_bytes().to_vec();
        value.extend_from_slice(&body);

        // Reject groups whose declared hash does not match the payloads
        AssetMetadataRecord::from_box(0, asset_id, &value)?;
        Ok(value)
    }

    fn expect_mbr(group: &WriteGroup, expected: MbrDelta) -> RegistryResult<()> {
        if group.mbr_delta != expected {
            return Err(RegistryError::Backend(format!(
                "MBR delta mismatch for asset {}: expected {}, got {}",
                group.asset_id,
                expected.as_signed(),
                group.mbr_delta.as_signed()
            )));
        }
        Ok(())
    }
}

impl MetadataStore for MemoryMetadataStore {
    fn metadata_state(&self, asset_id: u64) -> Result<MetadataState, anyhow::Error> {
        let state = if self.boxes.contains_key(&asset_id) {
            MetadataState::Created
        } else if self.deleted.contains(&asset_id) {
            MetadataState::Deleted
        } else {
            MetadataState::Absent
        };
        Ok(state)
    }

    fn load(&self, asset_id: u64) -> Result<Option<Vec<u8>>, anyhow::Error> {
        Ok(self.boxes.get(&asset_id).cloned())
    }

    fn commit(&mut self, group: WriteGroup) -> RegistryResult<u64> {
        let asset_id = group.asset_id;
        let round = self.round + 1;

        // Stage
        let staged: Option<Vec<u8>> = match &group.action {
            WriteAction::Create(write) => {
                if self.boxes.contains_key(&asset_id) {
                    debug!("rejecting duplicate create for asset {}", asset_id);
                    return Err(RegistryError::AlreadyExists(asset_id));
                }
                Self::expect_mbr(&group, compute_storage_delta(write.metadata_size as i64, None)?)?;
                Some(Self::build_box(asset_id, write, round)?)
            }
            WriteAction::Replace(write) => {
                let (stored, old_size) = self
                    .stored_size(asset_id)?
                    .ok_or(RegistryError::MetadataNotFound(asset_id))?;
                let stored_irreversible = stored.flags.irreversible_byte();
                if stored_irreversible != write.irreversible_flags {
                    return Err(RegistryError::IrreversibleFlagChange {
                        stored: stored_irreversible,
                        requested: write.irreversible_flags,
                    });
                }
                Self::expect_mbr(
                    &group,
                    compute_storage_delta(write.metadata_size as i64, Some(old_size as i64))?,
                )?;
                Some(Self::build_box(asset_id, write, round)?)
            }
            WriteAction::Delete => {
                let (_, old_size) = self
                    .stored_size(asset_id)?
                    .ok_or(RegistryError::MetadataNotFound(asset_id))?;
                Self::expect_mbr(&group, compute_delete_delta(old_size as i64)?)?;
                None
            }
        };

        let mbr_balance = self
            .mbr_balance
            .checked_add_signed(group.mbr_delta.as_signed())
            .ok_or_else(|| RegistryError::Backend("MBR balance out of range".to_string()))?;

        // Apply
        match staged {
            Some(value) => {
                self.deleted.remove(&asset_id);
                self.boxes.insert(asset_id, value);
            }
            None => {
                self.boxes.remove(&asset_id);
                self.deleted.insert(asset_id);
            }
        }
        self.mbr_balance = mbr_balance;
        self.round = round;

        info!(
            "Committed {} for asset {} at round {} (MBR delta {})",
            match group.action {
                WriteAction::Create(_) => "create",
                WriteAction::Replace(_) => "replace",
                WriteAction::Delete => "delete",
            },
            asset_id,
            round,
            group.mbr_delta.as_signed()
        );
        Ok(round)
    }
}

/// In-memory source of asset parameters
#[derive(Clone, Debug, Default)]
pub struct MemoryAssetProvider {
    assets: HashMap<u64, AssetParams>,
}

impl MemoryAssetProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, params: AssetParams) {
        self.assets.insert(params.asset_id, params);
    }

    pub fn remove(&mut self, asset_id: u64) -> Option<AssetParams> {
        self.assets.remove(&asset_id)
    }
}

impl AssetProvider for MemoryAssetProvider {
    fn asset_params(&self, asset_id: u64) -> Result<Option<AssetParams>, anyhow::Error> {
        Ok(self.assets.get(&asset_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::metadata::{AssetMetadata, AssetMetadataBody, MetadataFlags};

    fn sample(size: usize) -> AssetMetadata {
        let body = AssetMetadataBody::new(vec![b'a'; size]).unwrap();
        AssetMetadata::new(5, body, MetadataFlags::default(), 0)
    }

    fn create_group(metadata: &AssetMetadata) -> WriteGroup {
        WriteGroup {
            asset_id: metadata.asset_id,
            action: WriteAction::Create(MetadataWrite::from_metadata(metadata).unwrap()),
            mbr_delta: metadata.get_mbr_delta(None).unwrap(),
        }
    }

    #[test]
    fn test_commit_create_assigns_round() {
        let mut store = MemoryMetadataStore::with_round(100);
        let metadata = sample(3000);
        let round = store.commit(create_group(&metadata)).unwrap();
        assert_eq!(round, 101);
        assert_eq!(store.metadata_state(5).unwrap(), MetadataState::Created);

        let value = store.load(5).unwrap().unwrap();
        let record = AssetMetadataRecord::from_box(0, 5, &value).unwrap();
        assert_eq!(record.header.last_modified_round, 101);
        assert_eq!(record.body, metadata.body);
        assert_eq!(store.mbr_balance(), metadata.get_mbr_delta(None).unwrap().amount);
    }

    #[test]
    fn test_duplicate_create_rejected_at_commit() {
        let mut store = MemoryMetadataStore::new();
        let metadata = sample(10);
        store.commit(create_group(&metadata)).unwrap();

        let err = store.commit(create_group(&metadata)).unwrap_err();
        assert_eq!(err, RegistryError::AlreadyExists(5));
        assert_eq!(store.round(), 1);
    }

    #[test]
    fn test_failed_group_leaves_store_untouched() {
        let mut store = MemoryMetadataStore::new();
        let metadata = sample(10);
        let mut group = create_group(&metadata);
        if let WriteAction::Create(write) = &mut group.action {
            write.metadata_hash = crate::crypto::hash(b"wrong");
        }

        let err = store.commit(group).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedRecord);
        assert!(store.is_empty());
        assert_eq!(store.round(), 0);
        assert_eq!(store.mbr_balance(), 0);
        assert_eq!(store.metadata_state(5).unwrap(), MetadataState::Absent);
    }

    #[test]
    fn test_wrong_mbr_payment_rejected() {
        let mut store = MemoryMetadataStore::new();
        let metadata = sample(10);
        let mut group = create_group(&metadata);
        group.mbr_delta = MbrDelta::from_signed(1);

        let err = store.commit(group).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Backend);
        assert!(store.is_empty());
    }

    #[test]
    fn test_size_mismatch_rejected() {
        let mut store = MemoryMetadataStore::new();
        let metadata = sample(10);
        let mut group = create_group(&metadata);
        if let WriteAction::Create(write) = &mut group.action {
            write.extra_payloads.push(vec![b'a']);
        }

        let err = store.commit(group).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSize);
    }

    #[test]
    fn test_delete_then_state_is_deleted() {
        let mut store = MemoryMetadataStore::new();
        let metadata = sample(500);
        store.commit(create_group(&metadata)).unwrap();

        let refund = compute_delete_delta(500).unwrap();
        store
            .commit(WriteGroup {
                asset_id: 5,
                action: WriteAction::Delete,
                mbr_delta: refund,
            })
            .unwrap();

        assert_eq!(store.metadata_state(5).unwrap(), MetadataState::Deleted);
        assert_eq!(store.load(5).unwrap(), None);
        assert_eq!(store.mbr_balance(), 0);
    }

    #[test]
    fn test_delete_missing_record() {
        let mut store = MemoryMetadataStore::new();
        let err = store
            .commit(WriteGroup {
                asset_id: 9,
                action: WriteAction::Delete,
                mbr_delta: MbrDelta::ZERO,
            })
            .unwrap_err();
        assert_eq!(err, RegistryError::MetadataNotFound(9));
    }
}
