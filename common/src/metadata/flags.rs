// Metadata flag bytes
//
// Reversible flags (mutable by the ASA manager):
//   bit 0: ARC-20
//   bit 1: ARC-62
//   bit 2-7: reserved
//
// Irreversible flags (write-once at creation):
//   bit 0: ARC-3
//   bit 1: ARC-89 native
//   bit 2-6: reserved
//   bit 7: immutable

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, RegistryResult};

#[allow(non_snake_case)]
pub mod ReversibleBits {
    pub const ARC20: u8 = 1 << 0;
    pub const ARC62: u8 = 1 << 1;
    pub const RESERVED: u8 = !(ARC20 | ARC62);
}

#[allow(non_snake_case)]
pub mod IrreversibleBits {
    pub const ARC3: u8 = 1 << 0;
    pub const ARC89_NATIVE: u8 = 1 << 1;
    pub const IMMUTABLE: u8 = 1 << 7;
    pub const RESERVED: u8 = !(ARC3 | ARC89_NATIVE | IMMUTABLE);
}

#[inline]
fn bit(byte: u8, mask: u8) -> bool {
    byte & mask == mask
}

/// Compliance flags the ASA manager may toggle at any time
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReversibleFlags {
    pub arc20: bool,
    pub arc62: bool,
}

impl ReversibleFlags {
    pub const fn new(arc20: bool, arc62: bool) -> Self {
        Self { arc20, arc62 }
    }

    pub fn to_byte(self) -> u8 {
        let mut byte = 0;
        if self.arc20 {
            byte |= ReversibleBits::ARC20;
        }
        if self.arc62 {
            byte |= ReversibleBits::ARC62;
        }
        byte
    }

    pub fn from_byte(byte: u8) -> RegistryResult<Self> {
        if byte & ReversibleBits::RESERVED != 0 {
            return Err(RegistryError::MalformedRecord(format!(
                "reserved reversible flag bits set: {:#04x}",
                byte
            )));
        }
        Ok(Self {
            arc20: bit(byte, ReversibleBits::ARC20),
            arc62: bit(byte, ReversibleBits::ARC62),
        })
    }
}

/// Compliance flags fixed once the record is created
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IrreversibleFlags {
    pub arc3: bool,
    pub arc89_native: bool,
    pub immutable: bool,
}

impl IrreversibleFlags {
    pub const fn new(arc3: bool, arc89_native: bool, immutable: bool) -> Self {
        Self {
            arc3,
            arc89_native,
            immutable,
        }
    }

    pub fn to_byte(self) -> u8 {
        let mut byte = 0;
        if self.arc3 {
            byte |= IrreversibleBits::ARC3;
        }
        if self.arc89_native {
            byte |= IrreversibleBits::ARC89_NATIVE;
        }
        if self.immutable {
            byte |= IrreversibleBits::IMMUTABLE;
        }
        byte
    }

    pub fn from_byte(byte: u8) -> RegistryResult<Self> {
        if byte & IrreversibleBits::RESERVED != 0 {
            return Err(RegistryError::MalformedRecord(format!(
                "reserved irreversible flag bits set: {:#04x}",
                byte
            )));
        }
        Ok(Self {
            arc3: bit(byte, IrreversibleBits::ARC3),
            arc89_native: bit(byte, IrreversibleBits::ARC89_NATIVE),
            immutable: bit(byte, IrreversibleBits::IMMUTABLE),
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetadataFlags {
    pub reversible: ReversibleFlags,
    pub irreversible: IrreversibleFlags,
}

impl MetadataFlags {
    pub const fn new(reversible: ReversibleFlags, irreversible: IrreversibleFlags) -> Self {
        Self {
            reversible,
            irreversible,
        }
    }

    pub fn reversible_byte(&self) -> u8 {
        self.reversible.to_byte()
    }

    pub fn irreversible_byte(&self) -> u8 {
        self.irreversible.to_byte()
    }

    pub fn from_bytes(reversible: u8, irreversible: u8) -> RegistryResult<Self> {
        unpack_flags(reversible, irreversible)
    }
}

/// Pack both flag sets into `(reversible_byte, irreversible_byte)`
pub fn pack_flags(reversible: &ReversibleFlags, irreversible: &IrreversibleFlags) -> (u8, u8) {
    (reversible.to_byte(), irreversible.to_byte())
}

/// Inverse of [`pack_flags`]; reserved bits are rejected
pub fn unpack_flags(reversible: u8, irreversible: u8) -> RegistryResult<MetadataFlags> {
    Ok(MetadataFlags {
        reversible: ReversibleFlags::from_byte(reversible)?,
        irreversible: IrreversibleFlags::from_byte(irreversible)?,
    })
}
