//! Address format of Haltium-class SoCs.
//!
//! Every 32-bit address is split into bitfields. Which fields exist depends on
//! the region in the top three bits:
//!
//! ```text
//!  31   29 28  27    24 23        16 15      12 11             0
//! ┌──────┬───┬─────────┬────────────┬──────────┬────────────────┐
//! │region│sec│ domain  │    bus     │slave idx │ address space  │  PERIPHERAL, STM
//! └──────┴───┴─────────┴────────────┴──────────┴────────────────┘
//! ┌──────┬───┬─────────┬──────────────────────────────────────────┐
//! │region│sec│ domain  │           address space (24 bits)        │  PROGRAM, DATA
//! └──────┴───┴─────────┴──────────────────────────────────────────┘
//! ┌──────┬──────────────────────────────────────────────────────────┐
//! │region│               address space (29 bits)                    │  others
//! └──────┴──────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use crate::error::{AddressError, Result};
use crate::ids::{AddressRegion, DomainId};

// ── Field positions and masks ────────────────────────────────────────────────

/// Region field position.
pub const REGION_POS: u32 = 29;
/// Region field mask.
pub const REGION_MASK: u32 = 0x7 << REGION_POS;
/// Security bit position.
pub const SECURITY_POS: u32 = 28;
/// Security bit mask.
pub const SECURITY_MASK: u32 = 0x1 << SECURITY_POS;
/// Domain ID position.
pub const DOMAIN_POS: u32 = 24;
/// Domain ID mask.
pub const DOMAIN_MASK: u32 = 0xF << DOMAIN_POS;
/// Bus ID position.
pub const BUS_POS: u32 = 16;
/// Bus ID mask.
pub const BUS_MASK: u32 = 0xFF << BUS_POS;
/// Slave index position.
pub const SLAVE_POS: u32 = 12;
/// Slave index mask.
pub const SLAVE_MASK: u32 = 0xF << SLAVE_POS;
/// Peripheral ID (bus + slave index, 11 bits) position.
pub const PERIPHID_POS: u32 = 12;
/// Peripheral ID mask.
pub const PERIPHID_MASK: u32 = 0x7FF << PERIPHID_POS;
/// Address space position.
pub const SPACE_POS: u32 = 0;
/// Address space mask in PROGRAM and DATA regions.
pub const PROGRAM_DATA_SPACE_MASK: u32 = 0x00FF_FFFF;
/// Address space mask in PERIPHERAL and STM regions.
pub const PERIPHERAL_SPACE_MASK: u32 = 0x0000_0FFF;
/// Address space mask in all other regions.
pub const DEFAULT_SPACE_MASK: u32 = 0x1FFF_FFFF;

/// Extract a field from a packed value.
#[must_use]
pub const fn get_field(value: u32, pos: u32, mask: u32) -> u32 {
    (value & mask) >> pos
}

/// Replace a field in a packed value. Bits of `new` outside the field are dropped.
#[must_use]
pub const fn update_field(value: u32, new: u32, pos: u32, mask: u32) -> u32 {
    (value & !mask) | ((new << pos) & mask)
}

/// A decoded address. Equality and ordering follow the packed value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(u32);

impl Address {
    /// Interpret a raw 32-bit value.
    #[must_use]
    pub const fn decode(value: u32) -> Self {
        Self(value)
    }

    /// Packed 32-bit value.
    #[must_use]
    pub const fn encode(self) -> u32 {
        self.0
    }

    /// Copy of this address with the security bit set.
    ///
    /// # Errors
    ///
    /// Fails if the region has no security bit.
    pub fn as_secure(self) -> Result<Self> {
        let mut addr = self;
        addr.set_security(true)?;
        Ok(addr)
    }

    /// Address region.
    #[must_use]
    pub const fn region(self) -> AddressRegion {
        AddressRegion::from_bits(get_field(self.0, REGION_POS, REGION_MASK))
    }

    /// Change the region. Other bits are left as they are.
    pub fn set_region(&mut self, region: AddressRegion) {
        self.0 = update_field(self.0, region as u32, REGION_POS, REGION_MASK);
    }

    /// Security bit.
    ///
    /// # Errors
    ///
    /// Fails with [`AddressError::FieldNotApplicable`] outside PROGRAM, DATA,
    /// PERIPHERAL and STM.
    pub fn security(self) -> Result<bool> {
        self.check_domain_security("security bit")?;
        Ok(get_field(self.0, SECURITY_POS, SECURITY_MASK) != 0)
    }

    /// Set the security bit.
    ///
    /// # Errors
    ///
    /// Same applicability as [`Address::security`].
    pub fn set_security(&mut self, secure: bool) -> Result<()> {
        self.check_domain_security("security bit")?;
        self.0 = update_field(self.0, u32::from(secure), SECURITY_POS, SECURITY_MASK);
        Ok(())
    }

    /// Raw domain ID field.
    ///
    /// # Errors
    ///
    /// Same applicability as [`Address::security`].
    pub fn domain_raw(self) -> Result<u32> {
        self.check_domain_security("domain ID")?;
        Ok(get_field(self.0, DOMAIN_POS, DOMAIN_MASK))
    }

    /// Domain ID.
    ///
    /// # Errors
    ///
    /// Same applicability as [`Address::security`], and
    /// [`AddressError::UnknownDomain`] when the field holds an undefined ID.
    pub fn domain(self) -> Result<DomainId> {
        DomainId::try_from(self.domain_raw()?)
    }

    /// Set the domain ID.
    ///
    /// # Errors
    ///
    /// Same applicability as [`Address::security`].
    pub fn set_domain(&mut self, domain: DomainId) -> Result<()> {
        self.check_domain_security("domain ID")?;
        self.0 = update_field(self.0, u32::from(domain.id()), DOMAIN_POS, DOMAIN_MASK);
        Ok(())
    }

    /// Bus ID.
    ///
    /// # Errors
    ///
    /// Fails outside PERIPHERAL and STM.
    pub fn bus(self) -> Result<u32> {
        self.check_peripheral_bits("Peripheral/APB bus number")?;
        Ok(get_field(self.0, BUS_POS, BUS_MASK))
    }

    /// Set the bus ID (8 bits).
    ///
    /// # Errors
    ///
    /// Same applicability as [`Address::bus`].
    pub fn set_bus(&mut self, bus: u32) -> Result<()> {
        self.check_peripheral_bits("Peripheral/APB bus number")?;
        self.0 = update_field(self.0, bus, BUS_POS, BUS_MASK);
        Ok(())
    }

    /// Slave index on the bus.
    ///
    /// # Errors
    ///
    /// Same applicability as [`Address::bus`].
    pub fn slave_index(self) -> Result<u32> {
        self.check_peripheral_bits("Peripheral/APB slave index")?;
        Ok(get_field(self.0, SLAVE_POS, SLAVE_MASK))
    }

    /// Set the slave index (4 bits).
    ///
    /// # Errors
    ///
    /// Same applicability as [`Address::bus`].
    pub fn set_slave_index(&mut self, index: u32) -> Result<()> {
        self.check_peripheral_bits("Peripheral/APB slave index")?;
        self.0 = update_field(self.0, index, SLAVE_POS, SLAVE_MASK);
        Ok(())
    }

    /// Address within the region. Width depends on the region.
    #[must_use]
    pub const fn address_space(self) -> u32 {
        get_field(self.0, SPACE_POS, self.space_mask())
    }

    /// Set the address within the region.
    pub fn set_address_space(&mut self, space: u32) {
        self.0 = update_field(self.0, space, SPACE_POS, self.space_mask());
    }

    /// Peripheral ID: bus and slave index as one 11-bit number.
    #[must_use]
    pub const fn peripheral_id(self) -> u32 {
        get_field(self.0, PERIPHID_POS, PERIPHID_MASK)
    }

    const fn space_mask(self) -> u32 {
        match self.region() {
            AddressRegion::Program | AddressRegion::Data => PROGRAM_DATA_SPACE_MASK,
            AddressRegion::Peripheral | AddressRegion::Stm => PERIPHERAL_SPACE_MASK,
            _ => DEFAULT_SPACE_MASK,
        }
    }

    fn check_domain_security(self, field: &'static str) -> Result<()> {
        let region = self.region();
        if region.has_domain_security() {
            Ok(())
        } else {
            Err(AddressError::FieldNotApplicable { field, region })
        }
    }

    fn check_peripheral_bits(self, field: &'static str) -> Result<()> {
        let region = self.region();
        if region.has_peripheral_bits() {
            Ok(())
        } else {
            Err(AddressError::FieldNotApplicable { field, region })
        }
    }
}

impl From<u32> for Address {
    fn from(value: u32) -> Self {
        Self::decode(value)
    }
}

impl From<Address> for u32 {
    fn from(addr: Address) -> Self {
        addr.encode()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let region = self.region();
        write!(f, "Address(region={region} ({})", region as u32)?;
        if region.has_domain_security() {
            let raw = get_field(self.0, DOMAIN_POS, DOMAIN_MASK);
            match DomainId::try_from(raw) {
                Ok(domain) => write!(f, ", domain={domain} ({raw})")?,
                Err(_) => write!(f, ", domain=? ({raw})")?,
            }
            let secure = get_field(self.0, SECURITY_POS, SECURITY_MASK) != 0;
            write!(f, ", security={secure}")?;
        }
        if region.has_peripheral_bits() {
            let bus = get_field(self.0, BUS_POS, BUS_MASK);
            let slave = get_field(self.0, SLAVE_POS, SLAVE_MASK);
            write!(f, ", bus={bus} (0b{bus:09b}), slave_index={slave} (0b{slave:09b})")?;
        }
        write!(f, ", address_space=0x{:x})", self.address_space())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // UARTE120 on nRF54H20: global domain, secure, APB bus 0x8E, slave 6.
    const UARTE120: u32 = 0x5F8E_6000;

    #[test]
    fn decodes_peripheral_fields() {
        let addr = Address::decode(UARTE120);
        assert_eq!(addr.region(), AddressRegion::Peripheral);
        assert!(addr.security().unwrap());
        assert_eq!(addr.domain().unwrap(), DomainId::Global);
        assert_eq!(addr.bus().unwrap(), 0x8E);
        assert_eq!(addr.slave_index().unwrap(), 6);
        assert_eq!(addr.address_space(), 0);
        assert_eq!(addr.peripheral_id(), 0x0E6);
    }

    #[test]
    fn as_secure_sets_only_security_bit() {
        let nonsecure = Address::decode(UARTE120 & !SECURITY_MASK);
        assert!(!nonsecure.security().unwrap());
        assert_eq!(nonsecure.as_secure().unwrap().encode(), UARTE120);
    }

    #[test]
    fn inapplicable_fields_fail() {
        let mut xip = Address::decode(0x6000_0000);
        assert_eq!(xip.region(), AddressRegion::ExtXip);
        assert!(matches!(
            xip.security(),
            Err(AddressError::FieldNotApplicable { region: AddressRegion::ExtXip, .. })
        ));
        assert!(xip.set_bus(3).is_err());
        assert!(xip.set_domain(DomainId::Global).is_err());
        assert_eq!(xip.encode(), 0x6000_0000);

        let mut ram = Address::decode(0x2F01_0000);
        assert_eq!(ram.region(), AddressRegion::Data);
        assert!(ram.slave_index().is_err());
        ram.set_domain(DomainId::Application).unwrap();
        assert_eq!(ram.encode(), 0x2201_0000);
    }

    #[test]
    fn undefined_domain_is_reported() {
        let addr = Address::decode(0x5500_0000);
        assert!(matches!(addr.domain(), Err(AddressError::UnknownDomain(5))));
        assert_eq!(addr.domain_raw().unwrap(), 5);
    }

    #[test]
    fn address_space_width_follows_region() {
        let mut addr = Address::decode(0x5F8E_6000);
        addr.set_address_space(0xFFFF_FFFF);
        assert_eq!(addr.encode(), 0x5F8E_6FFF);

        let mut cpu = Address::decode(0xE000_0000);
        cpu.set_address_space(0x1234_5678);
        assert_eq!(cpu.encode(), 0xF234_5678);
    }

    #[test]
    fn display_lists_region_fields() {
        let text = Address::decode(UARTE120).to_string();
        assert!(text.starts_with("Address(region=PERIPHERAL (2)"));
        assert!(text.contains("domain=GLOBAL (15)"));
        assert!(text.contains("bus=142"));
    }

    fn peripheral_parts() -> impl Strategy<Value = (bool, usize, u32, u32, u32)> {
        (any::<bool>(), 0..DomainId::ALL.len(), 0u32..=0xFF, 0u32..=0xF, 0u32..=0xFFF)
    }

    proptest! {
        #[test]
        fn encode_decode_round_trip(raw in any::<u32>()) {
            prop_assert_eq!(Address::decode(Address::decode(raw).encode()), Address::decode(raw));
        }

        #[test]
        fn setters_round_trip_through_getters((secure, domain, bus, slave, space) in peripheral_parts()) {
            let domain = DomainId::ALL[domain];
            let mut addr = Address::default();
            addr.set_region(AddressRegion::Peripheral);
            addr.set_security(secure).unwrap();
            addr.set_domain(domain).unwrap();
            addr.set_bus(bus).unwrap();
            addr.set_slave_index(slave).unwrap();
            addr.set_address_space(space);

            let decoded = Address::decode(addr.encode());
            prop_assert_eq!(decoded.region(), AddressRegion::Peripheral);
            prop_assert_eq!(decoded.security().unwrap(), secure);
            prop_assert_eq!(decoded.domain().unwrap(), domain);
            prop_assert_eq!(decoded.bus().unwrap(), bus);
            prop_assert_eq!(decoded.slave_index().unwrap(), slave);
            prop_assert_eq!(decoded.address_space(), space);
        }

        #[test]
        fn non_peripheral_regions_reject_bus(raw in any::<u32>()) {
            let addr = Address::decode(raw);
            if !addr.region().has_peripheral_bits() {
                let is_not_applicable = matches!(
                    addr.bus(),
                    Err(AddressError::FieldNotApplicable { .. })
                );
                prop_assert!(is_not_applicable);
            }
        }
    }
}
