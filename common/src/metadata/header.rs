// Metadata header wire layout (big-endian integers)
//
// | offset | size | field                    |
// |--------|------|--------------------------|
// | 0      | 1    | identifiers              |
// | 1      | 1    | reversible flags         |
// | 2      | 1    | irreversible flags       |
// | 3      | 32   | metadata hash            |
// | 35     | 8    | last modified round      |
// | 43     | 8    | deprecated by (asset id) |

use serde::Serialize;

use crate::config::{HEADER_SIZE, SHORT_METADATA_SIZE};
use crate::crypto::{Hash, HASH_SIZE};
use crate::error::{RegistryError, RegistryResult};

use super::flags::MetadataFlags;

#[allow(non_snake_case)]
pub mod IdentifierBits {
    /// Body size is at most `SHORT_METADATA_SIZE`
    pub const SHORT: u8 = 1 << 7;
    pub const RESERVED: u8 = !SHORT;
}

const HASH_OFFSET: usize = 3;
const ROUND_OFFSET: usize = HASH_OFFSET + HASH_SIZE;
const DEPRECATED_BY_OFFSET: usize = ROUND_OFFSET + 8;

const _: () = assert!(DEPRECATED_BY_OFFSET + 8 == HEADER_SIZE);

/// Derive the identifiers byte from the body size alone
pub fn derive_identifiers_byte(body_size: usize) -> u8 {
    if body_size <= SHORT_METADATA_SIZE {
        IdentifierBits::SHORT
    } else {
        0
    }
}

/// The persisted header of an asset metadata record
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AssetMetadataHeader {
    pub identifiers: u8,
    pub flags: MetadataFlags,
    pub metadata_hash: Hash,
    pub last_modified_round: u64,
    /// 0 means not deprecated
    pub deprecated_by: u64,
}

impl AssetMetadataHeader {
    pub fn is_short(&self) -> bool {
        self.identifiers & IdentifierBits::SHORT != 0
    }

    pub fn is_immutable(&self) -> bool {
        self.flags.irreversible.immutable
    }

    pub fn is_arc3_compliant(&self) -> bool {
        self.flags.irreversible.arc3
    }

    pub fn is_arc89_native(&self) -> bool {
        self.flags.irreversible.arc89_native
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecated_by != 0
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0] = self.identifiers;
        out[1] = self.flags.reversible_byte();
        out[2] = self.flags.irreversible_byte();
        out[HASH_OFFSET..ROUND_OFFSET].copy_from_slice(self.metadata_hash.as_bytes());
        out[ROUND_OFFSET..DEPRECATED_BY_OFFSET]
            .copy_from_slice(&self.last_modified_round.to_be_bytes());
        out[DEPRECATED_BY_OFFSET..].copy_from_slice(&self.deprecated_by.to_be_bytes());
        out
    }

    /// Decode exactly `HEADER_SIZE` bytes
    pub fn from_bytes(bytes: &[u8]) -> RegistryResult<Self> {
        if bytes.len() != HEADER_SIZE {
            return Err(RegistryError::MalformedRecord(format!(
                "header must be {} bytes, got {}",
                HEADER_SIZE,
                bytes.len()
            )));
        }

        let identifiers = bytes[0];
        if identifiers & IdentifierBits::RESERVED != 0 {
            return Err(RegistryError::MalformedRecord(format!(
                "reserved identifier bits set: {:#04x}",
                identifiers
            )));
        }
        let flags = MetadataFlags::from_bytes(bytes[1], bytes[2])?;
        let metadata_hash = Hash::from_slice(&bytes[HASH_OFFSET..ROUND_OFFSET])
            .ok_or_else(|| RegistryError::MalformedRecord("truncated hash".to_string()))?;

        Ok(Self {
            identifiers,
            flags,
            metadata_hash,
            last_modified_round: read_u64(&bytes[ROUND_OFFSET..DEPRECATED_BY_OFFSET])?,
            deprecated_by: read_u64(&bytes[DEPRECATED_BY_OFFSET..])?,
        })
    }
}

fn read_u64(bytes: &[u8]) -> RegistryResult<u64> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| RegistryError::MalformedRecord("truncated integer".to_string()))?;
    Ok(u64::from_be_bytes(arr))
}

/// Split a raw box value into its header and body bytes
pub fn split_box_value(value: &[u8]) -> RegistryResult<(AssetMetadataHeader, &[u8])> {
    if value.len() < HEADER_SIZE {
        return Err(RegistryError::MalformedRecord(format!(
            "box value of {} bytes is shorter than the header",
            value.len()
        )));
    }
    let (header, body) = value.split_at(HEADER_SIZE);
    Ok((AssetMetadataHeader::from_bytes(header)?, body))
}
