// ARC-90 metadata locator URIs
//
// Format:
//   algorand://<netauth>/app/<app_id>?box=<value>[#arc<a>+<b>...]
//
// <value> is the asset id as 8 big-endian bytes, base64url encoded
// (with padding) and percent-encoded. A partial URI has an empty box value
// and is completed by appending the asset id.

use std::fmt;

use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use thiserror::Error;

use crate::config::{ARC90_APP_PATH, ARC90_BOX_QUERY, ARC90_SCHEME};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Arc90ParseError {
    #[error("Invalid URI scheme, expected 'algorand://'")]
    InvalidScheme,
    #[error("Missing network authority")]
    MissingNetauth,
    #[error("Missing '/app/' path")]
    MissingAppPath,
    #[error("Invalid app id")]
    InvalidAppId,
    #[error("Missing '?box=' query")]
    MissingBoxQuery,
    #[error("Invalid box value")]
    InvalidBoxValue,
    #[error("Invalid compliance fragment")]
    InvalidCompliance,
}

/// ARCs an ASA declares compliance with, rendered as `arc89+90`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Arc90Compliance {
    pub arcs: Vec<u32>,
}

impl Arc90Compliance {
    pub fn new(arcs: &[u32]) -> Self {
        Self {
            arcs: arcs.to_vec(),
        }
    }

    fn parse(fragment: &str) -> Result<Self, Arc90ParseError> {
        let arcs = fragment
            .strip_prefix("arc")
            .ok_or(Arc90ParseError::InvalidCompliance)?
            .split('+')
            .map(|n| n.parse().map_err(|_| Arc90ParseError::InvalidCompliance))
            .collect::<Result<Vec<u32>, _>>()?;
        Ok(Self { arcs })
    }
}

impl fmt::Display for Arc90Compliance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arcs: Vec<String> = self.arcs.iter().map(|n| n.to_string()).collect();
        write!(f, "arc{}", arcs.join("+"))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Arc90Uri {
    pub netauth: String,
    pub app_id: u64,
    /// Asset id; `None` for a partial URI
    pub box_value: Option<u64>,
    pub compliance: Option<Arc90Compliance>,
}

impl Arc90Uri {
    pub fn partial(netauth: impl Into<String>, app_id: u64) -> Self {
        Self {
            netauth: netauth.into(),
            app_id,
            box_value: None,
            compliance: None,
        }
    }

    pub fn with_compliance(mut self, compliance: Arc90Compliance) -> Self {
        self.compliance = Some(compliance);
        self
    }

    pub fn with_asset_id(mut self, asset_id: u64) -> Self {
        self.box_value = Some(asset_id);
        self
    }

    pub fn is_partial(&self) -> bool {
        self.box_value.is_none()
    }

    pub fn to_uri(&self) -> String {
        let mut uri = format!(
            "{}{}{}{}{}",
            ARC90_SCHEME, self.netauth, ARC90_APP_PATH, self.app_id, ARC90_BOX_QUERY
        );
        if let Some(asset_id) = self.box_value {
            uri.push_str(&encode_box_value(asset_id));
        }
        // An empty ARC list has no fragment form
        if let Some(compliance) = self.compliance.as_ref().filter(|c| !c.arcs.is_empty()) {
            uri.push('#');
            uri.push_str(&compliance.to_string());
        }
        uri
    }

    pub fn parse(uri: &str) -> Result<Self, Arc90ParseError> {
        let rest = uri
            .strip_prefix(ARC90_SCHEME)
            .ok_or(Arc90ParseError::InvalidScheme)?;

        let (netauth, rest) = rest
            .split_once(ARC90_APP_PATH)
            .ok_or(Arc90ParseError::MissingAppPath)?;
        if netauth.is_empty() {
            return Err(Arc90ParseError::MissingNetauth);
        }

        let (app_id, rest) = rest
            .split_once(ARC90_BOX_QUERY)
            .ok_or(Arc90ParseError::MissingBoxQuery)?;
        let app_id: u64 = app_id.parse().map_err(|_| Arc90ParseError::InvalidAppId)?;

        let (box_part, fragment) = match rest.split_once('#') {
            Some((b, f)) => (b, Some(f)),
            None => (rest, None),
        };

        let box_value = if box_part.is_empty() {
            None
        } else {
            Some(decode_box_value(box_part)?)
        };
        let compliance = fragment.map(Arc90Compliance::parse).transpose()?;

        Ok(Self {
            netauth: netauth.to_string(),
            app_id,
            box_value,
            compliance,
        })
    }
}

impl fmt::Display for Arc90Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uri())
    }
}

fn encode_box_value(asset_id: u64) -> String {
    let encoded = URL_SAFE.encode(asset_id.to_be_bytes());
    urlencoding::encode(&encoded).into_owned()
}

fn decode_box_value(value: &str) -> Result<u64, Arc90ParseError> {
    let decoded = urlencoding::decode(value).map_err(|_| Arc90ParseError::InvalidBoxValue)?;
    let bytes = URL_SAFE
        .decode(decoded.as_bytes())
        .map_err(|_| Arc90ParseError::InvalidBoxValue)?;
    let bytes: [u8; 8] = bytes
        .try_into()
        .map_err(|_| Arc90ParseError::InvalidBoxValue)?;
    Ok(u64::from_be_bytes(bytes))
}

/// Complete the partial ARC-90 URI stored in an ASA URL with its asset id
pub fn complete_partial_asset_url(url: &str, asset_id: u64) -> Result<String, Arc90ParseError> {
    Ok(Arc90Uri::parse(url)?.with_asset_id(asset_id).to_uri())
}
