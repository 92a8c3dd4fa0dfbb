// Read-side registry queries

use log::trace;
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, RegistryResult};
use crate::metadata::AssetMetadataRecord;
use crate::network::RegistryConfig;

use super::{AssetProvider, MetadataState, MetadataStore};

/// Whether the ASA and its metadata record exist
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataExistence {
    pub asa_exists: bool,
    pub state: MetadataState,
}

impl MetadataExistence {
    pub fn metadata_exists(&self) -> bool {
        self.state == MetadataState::Created
    }
}

pub fn check_metadata_exists<A, S>(
    assets: &A,
    store: &S,
    asset_id: u64,
) -> RegistryResult<MetadataExistence>
where
    A: AssetProvider + ?Sized,
    S: MetadataStore + ?Sized,
{
    let asa_exists = assets
        .asset_params(asset_id)
        .map_err(RegistryError::backend)?
        .is_some();
    let state = store
        .metadata_state(asset_id)
        .map_err(RegistryError::backend)?;
    trace!(
        "asset {}: asa_exists={}, state={:?}",
        asset_id,
        asa_exists,
        state
    );
    Ok(MetadataExistence { asa_exists, state })
}

/// Read a record and verify its hash against the stored body
pub fn get_metadata<S: MetadataStore + ?Sized>(
    store: &S,
    config: &RegistryConfig,
    asset_id: u64,
) -> RegistryResult<AssetMetadataRecord> {
    config.validate()?;

    let value = store
        .load(asset_id)
        .map_err(RegistryError::backend)?
        .ok_or(RegistryError::MetadataNotFound(asset_id))?;
    AssetMetadataRecord::from_box(config.app_id, asset_id, &value)
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::*;
    use crate::error::ErrorKind;
    use crate::metadata::{AssetMetadata, MetadataFlags};
    use crate::network::Network;
    use crate::registry::{AssetParams, MemoryAssetProvider, MemoryMetadataStore, WriteGroup};
    use serde_json::json;

    struct FailingStore;

    impl MetadataStore for FailingStore {
        fn metadata_state(&self, _asset_id: u64) -> Result<MetadataState, anyhow::Error> {
            Err(anyhow!("node unreachable"))
        }

        fn load(&self, _asset_id: u64) -> Result<Option<Vec<u8>>, anyhow::Error> {
            Err(anyhow!("node unreachable"))
        }

        fn commit(&mut self, _group: WriteGroup) -> RegistryResult<u64> {
            Err(RegistryError::Backend("node unreachable".to_string()))
        }
    }

    fn config() -> RegistryConfig {
        RegistryConfig::for_network(Network::Testnet, 9).unwrap()
    }

    #[test]
    fn test_existence_states() {
        let mut assets = MemoryAssetProvider::new();
        let store = MemoryMetadataStore::new();

        let existence = check_metadata_exists(&assets, &store, 1).unwrap();
        assert!(!existence.asa_exists);
        assert!(!existence.metadata_exists());
        assert_eq!(existence.state, MetadataState::Absent);

        assets.insert(AssetParams {
            asset_id: 1,
            ..AssetParams::default()
        });
        let existence = check_metadata_exists(&assets, &store, 1).unwrap();
        assert!(existence.asa_exists);
        assert!(!existence.metadata_exists());
    }

    #[test]
    fn test_get_metadata_verifies() {
        let meta = AssetMetadata::from_json(
            4,
            json!({"name": "X"}).as_object().unwrap(),
            MetadataFlags::default(),
            0,
        )
        .unwrap();
        let mut value = meta.to_header(10).unwrap().to_bytes().to_vec();
        value.extend_from_slice(meta.body.bytes());

        let mut store = MemoryMetadataStore::new();
        store.insert_raw(4, value.clone());
        let record = get_metadata(&store, &config(), 4).unwrap();
        assert_eq!(record.app_id, 9);
        assert_eq!(record.header.last_modified_round, 10);

        // Flip a body byte
        let last = value.len() - 3;
        value[last] ^= 0x01;
        store.insert_raw(4, value);
        let err = get_metadata(&store, &config(), 4).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedRecord);
    }

    #[test]
    fn test_get_metadata_missing() {
        let store = MemoryMetadataStore::new();
        assert_eq!(
            get_metadata(&store, &config(), 4).unwrap_err(),
            RegistryError::MetadataNotFound(4)
        );
    }

    #[test]
    fn test_backend_failures_are_wrapped() {
        let err = check_metadata_exists(&MemoryAssetProvider::new(), &FailingStore, 1).unwrap_err();
        assert_eq!(err, RegistryError::Backend("node unreachable".to_string()));
        assert!(err.is_retryable());

        let err = get_metadata(&FailingStore, &config(), 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Backend);
    }

    #[test]
    fn test_get_metadata_rejects_unvalidated_config() {
        let config: RegistryConfig = serde_json::from_str("{}").unwrap();
        let store = MemoryMetadataStore::new();

        let err = get_metadata(&store, &config, 4).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
