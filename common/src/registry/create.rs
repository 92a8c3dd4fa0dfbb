// Metadata Create Operation
// This module contains the create operation logic.

use log::{debug, info};
use serde_json::{Map, Value};

use crate::arc90::complete_partial_asset_url;
use crate::config::FIXED_GROUP_CALLS;
use crate::error::RegistryResult;
use crate::metadata::{AssetMetadata, AssetMetadataHeader, MbrDelta, MetadataFlags};

use super::validation::{check_compliance, check_existence, check_manager, load_asset};
use super::{AssetProvider, MetadataStore, MetadataWrite, RegistryContext, WriteAction, WriteGroup};

// ========================================
// Create Parameters
// ========================================

/// Parameters for creating a metadata record
#[derive(Clone, Debug)]
pub struct CreateParams {
    pub asset_id: u64,
    /// Top-level JSON object stored as the body
    pub metadata_json: Map<String, Value>,
    pub flags: MetadataFlags,
    /// 0 when not deprecated
    pub deprecated_by: u64,
}

impl CreateParams {
    pub fn new(asset_id: u64, metadata_json: Map<String, Value>) -> Self {
        Self {
            asset_id,
            metadata_json,
            flags: MetadataFlags::default(),
            deprecated_by: 0,
        }
    }

    pub fn with_flags(mut self, flags: MetadataFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_deprecated_by(mut self, deprecated_by: u64) -> Self {
        self.deprecated_by = deprecated_by;
        self
    }
}

/// Outcome of a committed create
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateReceipt {
    pub metadata: AssetMetadata,
    /// Header as written, stamped with the commit round
    pub header: AssetMetadataHeader,
    pub mbr_delta: MbrDelta,
    /// Number of calls the group pays fees for
    pub fee_calls: usize,
    /// Completed ARC-90 URI when the ASA URL holds a partial one
    pub metadata_uri: Option<String>,
}

// ========================================
// Create Operation
// ========================================

/// Create the metadata record of an ASA
///
/// All preconditions run before the body is encoded, hashed or sized, and
/// before the store is consulted for anything but existence.
pub fn create_metadata<S, A>(
    store: &mut S,
    assets: &A,
    ctx: &RegistryContext,
    params: CreateParams,
) -> RegistryResult<CreateReceipt>
where
    S: MetadataStore + ?Sized,
    A: AssetProvider + ?Sized,
{
    // Step 0: Registry identity
    ctx.config.validate()?;

    // Step 1: Preconditions
    let asset = load_asset(assets, params.asset_id)?;
    check_manager(&asset, ctx.caller)?;
    check_compliance(&asset, &params.flags.irreversible, ctx.config)?;
    check_existence(store, params.asset_id, false)?;

    // Step 2: Encode, hash and size
    let metadata = AssetMetadata::from_json(
        params.asset_id,
        &params.metadata_json,
        params.flags,
        params.deprecated_by,
    )?;
    let mbr_delta = metadata.get_mbr_delta(None)?;
    let write = MetadataWrite::from_metadata(&metadata)?;
    let header = metadata.to_header(0)?;
    let fee_calls = write.payload_calls() + FIXED_GROUP_CALLS;
    debug!(
        "asset {}: {} byte body in {} payload call(s), MBR {}",
        params.asset_id,
        write.metadata_size,
        write.payload_calls(),
        mbr_delta.amount
    );

    // Step 3: Commit as one group
    let round = store.commit(WriteGroup {
        asset_id: params.asset_id,
        action: WriteAction::Create(write),
        mbr_delta,
    })?;
    info!(
        "Created metadata for asset {} at round {}",
        params.asset_id, round
    );

    let metadata_uri = asset.url.as_deref().and_then(|url| {
        complete_partial_asset_url(url, params.asset_id)
            .inspect_err(|e| debug!("asset {}: url '{}' is not an ARC-90 URI: {}", params.asset_id, url, e))
            .ok()
    });

    Ok(CreateReceipt {
        header: AssetMetadataHeader {
            last_modified_round: round,
            ..header
        },
        metadata,
        mbr_delta,
        fee_calls,
        metadata_uri,
    })
}
