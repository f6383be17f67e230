//! System Protection Unit (SPU) model.
//!
//! Each peripheral bus has an SPU instance at the start of its address space,
//! always accessed through the secure alias. The SPU holds one
//! `PERIPH[n].PERM` register per slave index on the bus and a set of
//! `FEATURE.*` registers for split-ownership resources (channels, pins).

use crate::address::Address;
use crate::error::Result;

/// Buses that share the SPU instance of another bus.
///
/// Buses with more than 16 slaves use two bus IDs. Both IDs of the 32-slave
/// APB bus are governed by the SPU on bus 146.
pub const BUS_REMAPPING: &[(u32, u32)] = &[(147, 146)];

/// Address of the SPU instance governing the peripheral at `periph`.
///
/// # Errors
///
/// Fails if `periph` is not in the PERIPHERAL or STM region.
pub fn spu_address_for_peripheral(periph: Address) -> Result<Address> {
    let mut addr = periph;
    addr.set_security(true)?;
    addr.set_slave_index(0)?;
    addr.set_address_space(0);

    let bus = addr.bus()?;
    if let Some(&(_, canonical)) = BUS_REMAPPING.iter().find(|(from, _)| *from == bus) {
        addr.set_bus(canonical)?;
    }
    Ok(addr)
}

/// Field names of `SPU.PERIPH[n].PERM`, as used in the register catalog.
pub mod perm_fields {
    /// Secure mapping capability (read-only).
    pub const SECUREMAPPING: &str = "SECUREMAPPING";
    /// DMA capability (read-only).
    pub const DMA: &str = "DMA";
    /// Security attribute.
    pub const SECATTR: &str = "SECATTR";
    /// DMA security attribute.
    pub const DMASEC: &str = "DMASEC";
    /// Lock bit.
    pub const LOCK: &str = "LOCK";
    /// Ownership programmable (read-only).
    pub const OWNERPROG: &str = "OWNERPROG";
    /// Owner ID.
    pub const OWNERID: &str = "OWNERID";
}

/// Values of the `SECUREMAPPING` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecureMapping {
    /// Always non-secure.
    NonSecure = 0,
    /// Always secure.
    Secure = 1,
    /// Security attribute chosen through `SECATTR`.
    UserSelectable = 2,
    /// Split security, handled per feature.
    Split = 3,
}

impl SecureMapping {
    /// Decode the field value; `None` for undefined encodings.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            0 => Some(Self::NonSecure),
            1 => Some(Self::Secure),
            2 => Some(Self::UserSelectable),
            3 => Some(Self::Split),
            _ => None,
        }
    }
}

/// Values of the `DMA` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmaMode {
    /// Peripheral has no DMA.
    NoDma = 0,
    /// DMA uses the peripheral security attribute.
    NoSeparateAttribute = 1,
    /// DMA has its own security attribute (`DMASEC`).
    SeparateAttribute = 2,
}

impl DmaMode {
    /// Decode the field value; `None` for undefined encodings.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            0 => Some(Self::NoDma),
            1 => Some(Self::NoSeparateAttribute),
            2 => Some(Self::SeparateAttribute),
            _ => None,
        }
    }

    /// Whether `DMASEC` is fixed by hardware in this mode.
    #[must_use]
    pub const fn has_fixed_dmasec(self) -> bool {
        matches!(self, Self::NoDma | Self::NoSeparateAttribute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AddressError;
    use proptest::prelude::*;

    #[test]
    fn uarte_maps_to_bus_spu() {
        let spu = spu_address_for_peripheral(Address::decode(0x4F8E_6000)).unwrap();
        assert_eq!(spu.encode(), 0x5F8E_0000);
    }

    #[test]
    fn bus_147_shares_spu_with_146() {
        let periph = Address::decode(0x5F93_5000);
        assert_eq!(periph.bus().unwrap(), 147);
        let spu = spu_address_for_peripheral(periph).unwrap();
        assert_eq!(spu.bus().unwrap(), 146);
        assert_eq!(spu.encode(), 0x5F92_0000);
    }

    #[test]
    fn non_peripheral_address_is_rejected() {
        assert!(matches!(
            spu_address_for_peripheral(Address::decode(0x6000_0000)),
            Err(AddressError::FieldNotApplicable { .. })
        ));
    }

    #[test]
    fn dma_modes() {
        assert!(DmaMode::NoDma.has_fixed_dmasec());
        assert!(!DmaMode::SeparateAttribute.has_fixed_dmasec());
        assert_eq!(DmaMode::from_bits(3), None);
        assert_eq!(SecureMapping::from_bits(2), Some(SecureMapping::UserSelectable));
        assert_eq!(SecureMapping::from_bits(3), Some(SecureMapping::Split));
        assert_eq!(SecureMapping::from_bits(6), None);
    }

    proptest! {
        #[test]
        fn spu_address_is_idempotent(low in 0u32..0x2000_0000) {
            let periph = Address::decode(0x4000_0000 | low);
            let once = spu_address_for_peripheral(periph).unwrap();
            let twice = spu_address_for_peripheral(once).unwrap();
            prop_assert_eq!(once, twice);
            prop_assert!(once.security().unwrap());
            prop_assert_eq!(once.slave_index().unwrap(), 0);
            prop_assert_ne!(once.bus().unwrap(), 147);
        }
    }
}
