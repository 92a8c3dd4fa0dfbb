use std::{fmt, str::FromStr};

use log::info;
use serde::{Deserialize, Serialize};

use crate::arc90::Arc90Uri;
use crate::config::{LOCALNET_NETAUTH, MAINNET_NETAUTH, TESTNET_NETAUTH, VERSION};
use crate::error::{RegistryError, RegistryResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
    #[default]
    Localnet,
}

impl Network {
    pub fn default_netauth(&self) -> &'static str {
        match self {
            Network::Mainnet => MAINNET_NETAUTH,
            Network::Testnet => TESTNET_NETAUTH,
            Network::Localnet => LOCALNET_NETAUTH,
        }
    }
}

impl FromStr for Network {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "localnet" => Ok(Network::Localnet),
            other => Err(RegistryError::InvalidConfiguration(format!(
                "unsupported network: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Localnet => "localnet",
        };
        f.write_str(name)
    }
}

/// Registry identity every operation is bound to
///
/// Passed explicitly into operations; there is no process-wide instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub network: Network,
    #[serde(default)]
    pub arc90_netauth: String,
    #[serde(default)]
    pub app_id: u64,
}

impl RegistryConfig {
    pub fn new(network: Network, arc90_netauth: impl Into<String>, app_id: u64) -> RegistryResult<Self> {
        let config = Self {
            network,
            arc90_netauth: arc90_netauth.into(),
            app_id,
        };
        config.validate()?;
        info!(
            "Registry config (v{}): network={}, app_id={}",
            VERSION, config.network, config.app_id
        );
        Ok(config)
    }

    /// Config using the network's default netauth
    pub fn for_network(network: Network, app_id: u64) -> RegistryResult<Self> {
        Self::new(network, network.default_netauth(), app_id)
    }

    pub fn validate(&self) -> RegistryResult<()> {
        if self.arc90_netauth.trim().is_empty() {
            return Err(RegistryError::MissingConfiguration("ARC90_NETAUTH"));
        }
        if self.arc90_netauth.contains('/') {
            return Err(RegistryError::InvalidConfiguration(format!(
                "netauth must not contain '/': {}",
                self.arc90_netauth
            )));
        }
        if self.app_id == 0 {
            return Err(RegistryError::MissingConfiguration("METADATA_REGISTRY_APP_ID"));
        }
        Ok(())
    }

    /// Partial ARC-90 URI that native ASA URLs must start with
    pub fn partial_uri(&self) -> String {
        Arc90Uri::partial(self.arc90_netauth.as_str(), self.app_id).to_uri()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_for_network_uses_default_netauth() {
        let config = RegistryConfig::for_network(Network::Testnet, 42).unwrap();
        assert_eq!(config.arc90_netauth, "net:testnet");
        assert_eq!(config.partial_uri(), "algorand://net:testnet/app/42?box=");
    }

    #[test]
    fn test_missing_values_are_configuration_errors() {
        let err = RegistryConfig::new(Network::Localnet, "", 1).unwrap_err();
        assert_eq!(err, RegistryError::MissingConfiguration("ARC90_NETAUTH"));
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let err = RegistryConfig::new(Network::Localnet, "net:localnet", 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let err = RegistryConfig::new(Network::Localnet, "net/bad", 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_deserialize_then_validate() {
        let config: RegistryConfig =
            serde_json::from_str(r#"{"network":"testnet","arc90_netauth":"net:testnet","app_id":7}"#)
                .unwrap();
        assert!(config.validate().is_ok());

        let config: RegistryConfig = serde_json::from_str(r#"{"network":"testnet"}"#).unwrap();
        assert_eq!(
            config.validate().unwrap_err(),
            RegistryError::MissingConfiguration("ARC90_NETAUTH")
        );
    }

    #[test]
    fn test_network_from_str() {
        assert_eq!("TESTNET".parse::<Network>().unwrap(), Network::Testnet);
        assert_eq!(Network::Mainnet.to_string(), "mainnet");
        assert!("betanet".parse::<Network>().is_err());
    }
}
