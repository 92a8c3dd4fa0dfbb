// Minimum Balance Requirement (MBR) accounting for metadata boxes
//
// box_mbr(size) = BOX_FLAT_MBR + BOX_BYTE_MBR * (key + header + size)
//
// - create: +box_mbr(new)
// - update: BOX_BYTE_MBR * (new - old)
// - delete: -box_mbr(old)

use serde::{Deserialize, Serialize};

use crate::config::{ASSET_ID_SIZE, BOX_BYTE_MBR, BOX_FLAT_MBR, HEADER_SIZE, MAX_METADATA_SIZE};
use crate::error::{RegistryError, RegistryResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MbrDeltaSign {
    Null = 0,
    Positive = 1,
    Negative = 255,
}

/// Signed MBR change, in microAlgo
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MbrDelta {
    pub sign: MbrDeltaSign,
    pub amount: u64,
}

impl MbrDelta {
    pub const ZERO: MbrDelta = MbrDelta {
        sign: MbrDeltaSign::Null,
        amount: 0,
    };

    pub fn from_signed(delta: i64) -> Self {
        match delta {
            0 => Self::ZERO,
            d if d > 0 => Self {
                sign: MbrDeltaSign::Positive,
                amount: d.unsigned_abs(),
            },
            d => Self {
                sign: MbrDeltaSign::Negative,
                amount: d.unsigned_abs(),
            },
        }
    }

    pub fn as_signed(&self) -> i64 {
        // amount never exceeds box_mbr(MAX_METADATA_SIZE)
        match self.sign {
            MbrDeltaSign::Null => 0,
            MbrDeltaSign::Positive => self.amount as i64,
            MbrDeltaSign::Negative => -(self.amount as i64),
        }
    }

    pub fn is_positive(&self) -> bool {
        self.sign == MbrDeltaSign::Positive
    }

    pub fn is_negative(&self) -> bool {
        self.sign == MbrDeltaSign::Negative
    }

    pub fn is_zero(&self) -> bool {
        self.sign == MbrDeltaSign::Null
    }
}

fn check_size(label: &str, size: i64) -> RegistryResult<u64> {
    if size < 0 {
        return Err(RegistryError::InvalidSize(format!(
            "{} size must not be negative, got {}",
            label, size
        )));
    }
    if size as u64 > MAX_METADATA_SIZE as u64 {
        return Err(RegistryError::InvalidSize(format!(
            "{} size {} exceeds maximum {}",
            label, size, MAX_METADATA_SIZE
        )));
    }
    Ok(size as u64)
}

/// Full MBR of a metadata box holding `body_size` bytes of metadata
pub fn box_mbr(body_size: u64) -> u64 {
    BOX_FLAT_MBR + BOX_BYTE_MBR * (ASSET_ID_SIZE as u64 + HEADER_SIZE as u64 + body_size)
}

/// MBR delta for a create (`old_body_size == None`) or an update
pub fn compute_storage_delta(new_body_size: i64, old_body_size: Option<i64>) -> RegistryResult<MbrDelta> {
    let new_size = check_size("new body", new_body_size)?;
    let delta = match old_body_size {
        None => box_mbr(new_size) as i64,
        Some(old) => {
            let old_size = check_size("old body", old)?;
            BOX_BYTE_MBR as i64 * (new_size as i64 - old_size as i64)
        }
    };
    Ok(MbrDelta::from_signed(delta))
}

/// MBR refunded when a record holding `old_body_size` bytes is deleted
pub fn compute_delete_delta(old_body_size: i64) -> RegistryResult<MbrDelta> {
    let old_size = check_size("old body", old_body_size)?;
    Ok(MbrDelta::from_signed(-(box_mbr(old_size) as i64)))
}
