// Metadata Update Operation
// This module contains the update operation logic.
//
// Only the body, the reversible flags and deprecated_by may change after
// creation. Irreversible flags and the identifiers byte are fixed.

use log::{debug, info};
use serde_json::{Map, Value};

use crate::config::FIXED_GROUP_CALLS;
use crate::error::{RegistryError, RegistryResult};
use crate::metadata::{
    AssetMetadata, AssetMetadataBody, AssetMetadataHeader, AssetMetadataRecord, IrreversibleFlags,
    MbrDelta, MetadataFlags, ReversibleFlags,
};

use super::validation::{check_existence, check_manager, load_asset};
use super::{AssetProvider, MetadataStore, MetadataWrite, RegistryContext, WriteAction, WriteGroup};

// ========================================
// Update Parameters
// ========================================

/// Parameters for updating a metadata record
///
/// Fields left as `None` keep their stored value.
#[derive(Clone, Debug, Default)]
pub struct UpdateParams {
    pub asset_id: u64,
    pub body: Option<Map<String, Value>>,
    pub reversible: Option<ReversibleFlags>,
    /// Must equal the stored selection when given
    pub irreversible: Option<IrreversibleFlags>,
    pub deprecated_by: Option<u64>,
}

impl UpdateParams {
    pub fn new(asset_id: u64) -> Self {
        Self {
            asset_id,
            ..Self::default()
        }
    }

    pub fn with_body(mut self, body: Map<String, Value>) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_reversible(mut self, reversible: ReversibleFlags) -> Self {
        self.reversible = Some(reversible);
        self
    }

    pub fn with_irreversible(mut self, irreversible: IrreversibleFlags) -> Self {
        self.irreversible = Some(irreversible);
        self
    }

    pub fn with_deprecated_by(mut self, deprecated_by: u64) -> Self {
        self.deprecated_by = Some(deprecated_by);
        self
    }
}

/// Outcome of a committed update
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateReceipt {
    pub metadata: AssetMetadata,
    pub header: AssetMetadataHeader,
    /// Positive when the body grew, negative when it shrank
    pub mbr_delta: MbrDelta,
    pub fee_calls: usize,
}

// ========================================
// Update Operation
// ========================================

/// Replace the mutable parts of an existing record
pub fn update_metadata<S, A>(
    store: &mut S,
    assets: &A,
    ctx: &RegistryContext,
    params: UpdateParams,
) -> RegistryResult<UpdateReceipt>
where
    S: MetadataStore + ?Sized,
    A: AssetProvider + ?Sized,
{
    // Step 0: Registry identity
    ctx.config.validate()?;

    // Step 1: Preconditions
    let asset = load_asset(assets, params.asset_id)?;
    check_manager(&asset, ctx.caller)?;
    check_existence(store, params.asset_id, true)?;

    // Step 2: Load the stored record
    let stored = load_record(store, ctx.config.app_id, params.asset_id)?;
    let stored_irreversible = stored.header.flags.irreversible;

    if let Some(requested) = params.irreversible {
        if requested != stored_irreversible {
            debug!(
                "asset {}: irreversible flags {:#04x} cannot become {:#04x}",
                params.asset_id,
                stored_irreversible.to_byte(),
                requested.to_byte()
            );
            return Err(RegistryError::IrreversibleFlagChange {
                stored: stored_irreversible.to_byte(),
                requested: requested.to_byte(),
            });
        }
    }

    // Step 3: Build the replacement
    let body = match &params.body {
        Some(json_obj) => {
            if stored.header.is_immutable() {
                return Err(RegistryError::ImmutableMetadata(params.asset_id));
            }
            AssetMetadataBody::from_json(json_obj)?
        }
        None => stored.body.clone(),
    };

    let flags = MetadataFlags::new(
        params.reversible.unwrap_or(stored.header.flags.reversible),
        stored_irreversible,
    );
    let metadata = AssetMetadata::new(
        params.asset_id,
        body,
        flags,
        params.deprecated_by.unwrap_or(stored.header.deprecated_by),
    );

    let derived = metadata.identifiers_byte();
    if derived != stored.header.identifiers {
        return Err(RegistryError::IdentifiersChange {
            stored: stored.header.identifiers,
            derived,
        });
    }

    let mbr_delta = metadata.get_mbr_delta(Some(stored.body.size()))?;
    let write = MetadataWrite::from_metadata(&metadata)?;
    let header = metadata.to_header(0)?;
    let fee_calls = write.payload_calls() + FIXED_GROUP_CALLS;
    debug!(
        "asset {}: body {} -> {} bytes, MBR delta {}",
        params.asset_id,
        stored.body.size(),
        write.metadata_size,
        mbr_delta.as_signed()
    );

    // Step 4: Commit
    let round = store.commit(WriteGroup {
        asset_id: params.asset_id,
        action: WriteAction::Replace(write),
        mbr_delta,
    })?;
    info!(
        "Updated metadata for asset {} at round {}",
        params.asset_id, round
    );

    Ok(UpdateReceipt {
        header: AssetMetadataHeader {
            last_modified_round: round,
            ..header
        },
        metadata,
        mbr_delta,
        fee_calls,
    })
}

fn load_record<S: MetadataStore + ?Sized>(
    store: &S,
    app_id: u64,
    asset_id: u64,
) -> RegistryResult<AssetMetadataRecord> {
    let value = store
        .load(asset_id)
        .map_err(RegistryError::backend)?
        .ok_or(RegistryError::MetadataNotFound(asset_id))?;
    AssetMetadataRecord::from_box(app_id, asset_id, &value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::metadata::MbrDeltaSign;
    use crate::network::{Network, RegistryConfig};
    use crate::registry::{create_metadata, AssetParams, CreateParams, MemoryAssetProvider, MemoryMetadataStore};
    use serde_json::json;

    const MANAGER: &str = "MANAGERADDRESS";

    fn setup(flags: MetadataFlags, body: Value) -> (RegistryConfig, MemoryAssetProvider, MemoryMetadataStore) {
        let config = RegistryConfig::for_network(Network::Localnet, 1001).unwrap();
        let mut assets = MemoryAssetProvider::new();
        assets.insert(AssetParams {
            asset_id: 7,
            manager: Some(MANAGER.to_string()),
            name: Some("arc3".to_string()),
            url: Some("algorand://net:localnet/app/1001?box=".to_string()),
        });
        let mut store = MemoryMetadataStore::new();
        {
            let ctx = RegistryContext::new(&config, MANAGER);
            let params = CreateParams::new(7, body.as_object().cloned().unwrap()).with_flags(flags);
            create_metadata(&mut store, &assets, &ctx, params).unwrap();
        }
        (config, assets, store)
    }

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn stored(store: &MemoryMetadataStore) -> AssetMetadataRecord {
        load_record(store, 1001, 7).unwrap()
    }

    #[test]
    fn test_irreversible_flags_cannot_change() {
        let (config, assets, mut store) = setup(MetadataFlags::default(), json!({"name": "X"}));
        let ctx = RegistryContext::new(&config, MANAGER);
        let before = stored(&store);

        let params = UpdateParams::new(7).with_irreversible(IrreversibleFlags::new(true, false, false));
        let err = update_metadata(&mut store, &assets, &ctx, params).unwrap_err();

        assert_eq!(
            err,
            RegistryError::IrreversibleFlagChange {
                stored: 0x00,
                requested: 0x01
            }
        );
        assert_eq!(err.kind(), ErrorKind::Update);
        let after = stored(&store);
        assert_eq!(after.header.flags.irreversible_byte(), 0x00);
        assert_eq!(after, before);
        assert_eq!(store.round(), 1);
    }

    #[test]
    fn test_same_irreversible_selection_is_accepted() {
        let flags = MetadataFlags::new(
            ReversibleFlags::default(),
            IrreversibleFlags::new(true, true, false),
        );
        let (config, assets, mut store) = setup(flags, json!({"name": "X"}));
        let ctx = RegistryContext::new(&config, MANAGER);

        let params = UpdateParams::new(7)
            .with_irreversible(IrreversibleFlags::new(true, true, false))
            .with_reversible(ReversibleFlags::new(true, false));
        let receipt = update_metadata(&mut store, &assets, &ctx, params).unwrap();
        assert_eq!(receipt.header.flags.irreversible_byte(), 0x03);
        assert_eq!(receipt.header.flags.reversible_byte(), 0x01);
    }

    #[test]
    fn test_reversible_update_changes_hash_not_mbr() {
        let (config, assets, mut store) = setup(MetadataFlags::default(), json!({"name": "X"}));
        let ctx = RegistryContext::new(&config, MANAGER);
        let before = stored(&store);

        let params = UpdateParams::new(7).with_reversible(ReversibleFlags::new(false, true));
        let receipt = update_metadata(&mut store, &assets, &ctx, params).unwrap();

        assert!(receipt.mbr_delta.is_zero());
        assert_eq!(receipt.mbr_delta.sign, MbrDeltaSign::Null);
        let after = stored(&store);
        assert_ne!(after.header.metadata_hash, before.header.metadata_hash);
        assert_eq!(after.body, before.body);
        assert_eq!(after.header.last_modified_round, 2);
    }

    #[test]
    fn test_body_shrink_refunds_mbr() {
        let (config, assets, mut store) =
            setup(MetadataFlags::default(), json!({"name": "A much longer name"}));
        let ctx = RegistryContext::new(&config, MANAGER);
        let old_size = stored(&store).body.size() as i64;

        let params = UpdateParams::new(7).with_body(obj(json!({"name": "A"})));
        let receipt = update_metadata(&mut store, &assets, &ctx, params).unwrap();

        let new_size = receipt.metadata.body.size() as i64;
        assert_eq!(receipt.mbr_delta.sign, MbrDeltaSign::Negative);
        assert_eq!(receipt.mbr_delta.as_signed(), 400 * (new_size - old_size));
        assert_eq!(stored(&store).json().unwrap()["name"], json!("A"));
    }

    #[test]
    fn test_immutable_blocks_body_but_not_deprecation() {
        let flags = MetadataFlags::new(
            ReversibleFlags::default(),
            IrreversibleFlags::new(false, false, true),
        );
        let (config, assets, mut store) = setup(flags, json!({"name": "X"}));
        let ctx = RegistryContext::new(&config, MANAGER);

        let params = UpdateParams::new(7).with_body(obj(json!({"name": "Y"})));
        let err = update_metadata(&mut store, &assets, &ctx, params).unwrap_err();
        assert_eq!(err, RegistryError::ImmutableMetadata(7));

        let params = UpdateParams::new(7).with_deprecated_by(99);
        let receipt = update_metadata(&mut store, &assets, &ctx, params).unwrap();
        assert!(receipt.header.is_deprecated());
        assert_eq!(stored(&store).header.deprecated_by, 99);
    }

    #[test]
    fn test_identifiers_fixed_at_creation() {
        let (config, assets, mut store) = setup(MetadataFlags::default(), json!({"name": "X"}));
        let ctx = RegistryContext::new(&config, MANAGER);

        let params = UpdateParams::new(7).with_body(obj(json!({"description": "d".repeat(5000)})));
        let err = update_metadata(&mut store, &assets, &ctx, params).unwrap_err();
        assert_eq!(
            err,
            RegistryError::IdentifiersChange {
                stored: 0x80,
                derived: 0x00
            }
        );
    }

    #[test]
    fn test_update_requires_existing_record() {
        let (config, assets, mut store) = setup(MetadataFlags::default(), json!({}));
        let ctx = RegistryContext::new(&config, MANAGER);
        let mut assets = assets;
        assets.insert(AssetParams {
            asset_id: 8,
            manager: Some(MANAGER.to_string()),
            ..AssetParams::default()
        });

        let err = update_metadata(&mut store, &assets, &ctx, UpdateParams::new(8)).unwrap_err();
        assert_eq!(err, RegistryError::MetadataNotFound(8));
    }

    #[test]
    fn test_update_requires_manager() {
        let (config, assets, mut store) = setup(MetadataFlags::default(), json!({}));
        let ctx = RegistryContext::new(&config, "INTRUDER");

        let err = update_metadata(&mut store, &assets, &ctx, UpdateParams::new(7)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }

    #[test]
    fn test_update_rejects_unvalidated_config() {
        let (_, assets, mut store) = setup(MetadataFlags::default(), json!({"name": "X"}));
        let config: RegistryConfig = serde_json::from_str(r#"{"arc90_netauth":"net:localnet"}"#).unwrap();
        let ctx = RegistryContext::new(&config, MANAGER);

        let params = UpdateParams::new(7).with_deprecated_by(1);
        let err = update_metadata(&mut store, &assets, &ctx, params).unwrap_err();
        assert_eq!(err, RegistryError::MissingConfiguration("METADATA_REGISTRY_APP_ID"));
        assert_eq!(store.round(), 1);
    }
}
