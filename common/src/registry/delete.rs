// Metadata Delete Operation
// This module contains the delete operation logic.

use log::info;

use crate::error::{RegistryError, RegistryResult};
use crate::metadata::{compute_delete_delta, split_box_value, MbrDelta};

use super::validation::{check_existence, check_manager, load_asset};
use super::{AssetProvider, MetadataStore, RegistryContext, WriteAction, WriteGroup};

/// Remove a record's header and body together
///
/// # Returns
/// - `Ok(MbrDelta)`: the refund, always negative
pub fn delete_metadata<S, A>(
    store: &mut S,
    assets: &A,
    ctx: &RegistryContext,
    asset_id: u64,
) -> RegistryResult<MbrDelta>
where
    S: MetadataStore + ?Sized,
    A: AssetProvider + ?Sized,
{
    ctx.config.validate()?;

    let asset = load_asset(assets, asset_id)?;
    check_manager(&asset, ctx.caller)?;
    check_existence(store, asset_id, true)?;

    let value = store
        .load(asset_id)
        .map_err(RegistryError::backend)?
        .ok_or(RegistryError::MetadataNotFound(asset_id))?;
    let (_, body) = split_box_value(&value)?;
    let mbr_delta = compute_delete_delta(body.len() as i64)?;

    let round = store.commit(WriteGroup {
        asset_id,
        action: WriteAction::Delete,
        mbr_delta,
    })?;
    info!(
        "Deleted metadata for asset {} at round {} (refund {})",
        asset_id, round, mbr_delta.amount
    );
    Ok(mbr_delta)
}
