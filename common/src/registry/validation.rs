// Registry precondition checks
//
// These only need asset facts and the existence query; none of them touch
// the body, hashes or MBR sizing.

use log::debug;

use crate::config::{ARC3_NAME, ARC3_NAME_SUFFIX, ARC3_URL_SUFFIX};
use crate::error::{RegistryError, RegistryResult};
use crate::metadata::IrreversibleFlags;
use crate::network::RegistryConfig;

use super::{AssetParams, AssetProvider, MetadataState, MetadataStore};

/// Fetch asset parameters, failing if the asset does not exist
pub fn load_asset<A: AssetProvider + ?Sized>(
    assets: &A,
    asset_id: u64,
) -> RegistryResult<AssetParams> {
    assets
        .asset_params(asset_id)
        .map_err(RegistryError::backend)?
        .ok_or(RegistryError::AssetNotFound(asset_id))
}

/// Only the ASA manager may write metadata
pub fn check_manager(params: &AssetParams, caller: &str) -> RegistryResult<()> {
    let manager = match params.manager.as_deref() {
        Some(m) if !m.is_empty() => m,
        _ => {
            debug!("asset {} has no manager", params.asset_id);
            return Err(RegistryError::NoManager {
                asset_id: params.asset_id,
            });
        }
    };

    if manager != caller {
        debug!(
            "caller {} is not the manager {} of asset {}",
            caller, manager, params.asset_id
        );
        return Err(RegistryError::NotManager {
            manager: manager.to_string(),
            caller: caller.to_string(),
        });
    }
    Ok(())
}

/// ARC-3 naming: exact name, name suffix or URL suffix; any one is enough
pub fn is_arc3_compliant(params: &AssetParams) -> bool {
    let name = params.name.as_deref().unwrap_or_default();
    let url = params.url.as_deref().unwrap_or_default();

    name == ARC3_NAME || name.ends_with(ARC3_NAME_SUFFIX) || url.ends_with(ARC3_URL_SUFFIX)
}

/// Check the requested irreversible flags against the asset's name and URL
pub fn check_compliance(
    params: &AssetParams,
    flags: &IrreversibleFlags,
    config: &RegistryConfig,
) -> RegistryResult<()> {
    if flags.arc3 && !is_arc3_compliant(params) {
        debug!("asset {} is not ARC-3 compliant", params.asset_id);
        return Err(RegistryError::NotArc3Compliant {
            asset_id: params.asset_id,
        });
    }

    if flags.arc89_native {
        let partial_uri = config.partial_uri();
        let url = params.url.as_deref().unwrap_or_default();
        if !url.starts_with(&partial_uri) {
            debug!(
                "asset {} url '{}' does not start with '{}'",
                params.asset_id, url, partial_uri
            );
            return Err(RegistryError::MissingNativePrefix {
                expected: partial_uri,
            });
        }
    }
    Ok(())
}

/// Check the record state against what the operation needs
pub fn check_existence<S: MetadataStore + ?Sized>(
    store: &S,
    asset_id: u64,
    needs_metadata: bool,
) -> RegistryResult<()> {
    let state = store
        .metadata_state(asset_id)
        .map_err(RegistryError::backend)?;
    let exists = state == MetadataState::Created;

    if exists && !needs_metadata {
        return Err(RegistryError::AlreadyExists(asset_id));
    }
    if !exists && needs_metadata {
        return Err(RegistryError::MetadataNotFound(asset_id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::network::Network;

    fn params(manager: Option<&str>, name: &str, url: &str) -> AssetParams {
        AssetParams {
            asset_id: 10,
            manager: manager.map(str::to_string),
            name: Some(name.to_string()),
            url: Some(url.to_string()),
        }
    }

    fn config() -> RegistryConfig {
        RegistryConfig::for_network(Network::Localnet, 1001).unwrap()
    }

    #[test]
    fn test_manager_checks() {
        assert!(check_manager(&params(Some("ALICE"), "", ""), "ALICE").is_ok());

        let err = check_manager(&params(Some("ALICE"), "", ""), "BOB").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);

        let err = check_manager(&params(None, "", ""), "BOB").unwrap_err();
        assert_eq!(err, RegistryError::NoManager { asset_id: 10 });

        let err = check_manager(&params(Some(""), "", ""), "").unwrap_err();
        assert_eq!(err, RegistryError::NoManager { asset_id: 10 });
    }

    #[test]
    fn test_arc3_any_rule_matches() {
        assert!(is_arc3_compliant(&params(None, "arc3", "")));
        assert!(is_arc3_compliant(&params(None, "My Token@arc3", "")));
        assert!(is_arc3_compliant(&params(None, "Token", "ipfs://cid#arc3")));
        // All three at once is still fine
        assert!(is_arc3_compliant(&params(None, "arc3", "ipfs://cid#arc3")));

        assert!(!is_arc3_compliant(&params(None, "ARC3", "")));
        assert!(!is_arc3_compliant(&params(None, "Token", "ipfs://cid")));
        assert!(!is_arc3_compliant(&AssetParams::default()));
    }

    #[test]
    fn test_arc3_flag_requires_compliance() {
        let flags = IrreversibleFlags::new(true, false, false);
        let err = check_compliance(&params(None, "Token", ""), &flags, &config()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Compliance);

        assert!(check_compliance(&params(None, "Token@arc3", ""), &flags, &config()).is_ok());
    }

    #[test]
    fn test_native_flag_requires_partial_uri_prefix() {
        let flags = IrreversibleFlags::new(false, true, false);
        let good = params(None, "Token", "algorand://net:localnet/app/1001?box=#arc89+90");
        assert!(check_compliance(&good, &flags, &config()).is_ok());

        let other_app = params(None, "Token", "algorand://net:localnet/app/1002?box=");
        let err = check_compliance(&other_app, &flags, &config()).unwrap_err();
        assert_eq!(
            err,
            RegistryError::MissingNativePrefix {
                expected: "algorand://net:localnet/app/1001?box=".to_string()
            }
        );
    }

    #[test]
    fn test_no_flags_no_checks() {
        let flags = IrreversibleFlags::default();
        assert!(check_compliance(&AssetParams::default(), &flags, &config()).is_ok());
    }
}
