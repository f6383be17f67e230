//! Hardware identifiers: address regions, domains, owners and processors.
//!
//! ```text
//! Domain ID   : address-space partition encoded in address bits 24..=27
//! Owner ID    : permission holder written to SPU OWNERID fields
//! Processor ID: executing core, used for IRQ routing and cpu@N nodes
//! ```

use std::fmt;

use crate::error::AddressError;

/// Address region, bits 29..=31 of every address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AddressRegion {
    /// Code memory.
    Program = 0,
    /// Data memory.
    Data = 1,
    /// Peripheral buses.
    Peripheral = 2,
    /// External execute-in-place memory.
    ExtXip = 3,
    /// Encrypted external execute-in-place memory.
    ExtXipEncrypted = 4,
    /// System trace macrocell.
    Stm = 5,
    /// Encoding 6 has no defined meaning; kept so decoding stays total.
    Reserved = 6,
    /// Processor-private space.
    Cpu = 7,
}

impl AddressRegion {
    /// Region from the three-bit field value. Only the low three bits are used.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        match bits & 0x7 {
            0 => Self::Program,
            1 => Self::Data,
            2 => Self::Peripheral,
            3 => Self::ExtXip,
            4 => Self::ExtXipEncrypted,
            5 => Self::Stm,
            6 => Self::Reserved,
            _ => Self::Cpu,
        }
    }

    /// Regions carrying the security bit and a domain ID.
    #[must_use]
    pub const fn has_domain_security(self) -> bool {
        matches!(self, Self::Program | Self::Data | Self::Peripheral | Self::Stm)
    }

    /// Regions using the peripheral format (bus ID and slave index).
    #[must_use]
    pub const fn has_peripheral_bits(self) -> bool {
        matches!(self, Self::Peripheral | Self::Stm)
    }

    /// Upper-case name as used in hardware documentation.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Program => "PROGRAM",
            Self::Data => "DATA",
            Self::Peripheral => "PERIPHERAL",
            Self::ExtXip => "EXT_XIP",
            Self::ExtXipEncrypted => "EXT_XIP_ENCRYPTED",
            Self::Stm => "STM",
            Self::Reserved => "RESERVED",
            Self::Cpu => "CPU",
        }
    }
}

impl fmt::Display for AddressRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Domain IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DomainId {
    /// Reserved.
    Reserved = 0,
    /// Secure domain.
    Secure = 1,
    /// Application core domain.
    Application = 2,
    /// Radio core domain.
    Radiocore = 3,
    /// Cellular core domain.
    Cellcore = 4,
    /// Global fast domain.
    Globalfast = 12,
    /// Global slow domain.
    Globalslow = 13,
    /// Alias of the global domain.
    GlobalAlias = 14,
    /// Global domain.
    Global = 15,
}

impl DomainId {
    /// All defined domains in ascending ID order.
    pub const ALL: [Self; 9] = [
        Self::Reserved,
        Self::Secure,
        Self::Application,
        Self::Radiocore,
        Self::Cellcore,
        Self::Globalfast,
        Self::Globalslow,
        Self::GlobalAlias,
        Self::Global,
    ];

    /// Numeric ID.
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Upper-case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Reserved => "RESERVED",
            Self::Secure => "SECURE",
            Self::Application => "APPLICATION",
            Self::Radiocore => "RADIOCORE",
            Self::Cellcore => "CELLCORE",
            Self::Globalfast => "GLOBALFAST",
            Self::Globalslow => "GLOBALSLOW",
            Self::GlobalAlias => "GLOBAL_",
            Self::Global => "GLOBAL",
        }
    }

    /// C enumerator used in generated source.
    #[must_use]
    pub fn c_enum(self) -> String {
        format!("NRF_DOMAIN_{}", self.name())
    }
}

impl TryFrom<u32> for DomainId {
    type Error = AddressError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|d| u32::from(d.id()) == value)
            .ok_or(AddressError::UnknownDomain(value))
    }
}

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Owner IDs written to SPU OWNERID fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OwnerId {
    /// No owner.
    None = 0,
    /// Secure domain.
    Secure = 1,
    /// Application core.
    Application = 2,
    /// Radio core.
    Radiocore = 3,
    /// Cellular core.
    Cell = 4,
    /// System controller.
    Sysctrl = 8,
}

impl OwnerId {
    /// Upper-case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Secure => "SECURE",
            Self::Application => "APPLICATION",
            Self::Radiocore => "RADIOCORE",
            Self::Cell => "CELL",
            Self::Sysctrl => "SYSCTRL",
        }
    }

    /// C enumerator used in generated source.
    #[must_use]
    pub fn c_enum(self) -> String {
        format!("NRF_OWNER_{}", self.name())
    }
}

/// Processor IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProcessorId {
    /// Secure domain core.
    Secure = 1,
    /// Application core.
    Application = 2,
    /// Radio core.
    Radiocore = 3,
    /// Cellular core.
    Cellcore = 4,
    /// System controller.
    Sysctrl = 12,
    /// Peripheral processor (VPR).
    Ppr = 13,
    /// Fast lightweight processor (VPR).
    Flpr = 14,
}

impl ProcessorId {
    /// All processors in ascending ID order.
    pub const ALL: [Self; 7] = [
        Self::Secure,
        Self::Application,
        Self::Radiocore,
        Self::Cellcore,
        Self::Sysctrl,
        Self::Ppr,
        Self::Flpr,
    ];

    /// Upper-case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Secure => "SECURE",
            Self::Application => "APPLICATION",
            Self::Radiocore => "RADIOCORE",
            Self::Cellcore => "CELLCORE",
            Self::Sysctrl => "SYSCTRL",
            Self::Ppr => "PPR",
            Self::Flpr => "FLPR",
        }
    }

    /// Substring identifying this processor in devicetree node labels.
    #[must_use]
    pub const fn label_name(self) -> &'static str {
        match self {
            Self::Secure => "cpusec",
            Self::Application => "cpuapp",
            Self::Radiocore => "cpurad",
            Self::Cellcore => "cpucell",
            Self::Sysctrl => "cpusys",
            Self::Ppr => "cpuppr",
            Self::Flpr => "cpuflpr",
        }
    }

    /// Owner ID assigned to resources configured on behalf of this processor.
    /// The VPR coprocessors are owned through the application core.
    #[must_use]
    pub const fn default_owner_id(self) -> OwnerId {
        match self {
            Self::Secure => OwnerId::Secure,
            Self::Application | Self::Ppr | Self::Flpr => OwnerId::Application,
            Self::Radiocore => OwnerId::Radiocore,
            Self::Cellcore => OwnerId::Cell,
            Self::Sysctrl => OwnerId::Sysctrl,
        }
    }

    /// C enumerator used in generated source.
    #[must_use]
    pub fn c_enum(self) -> String {
        format!("NRF_PROCESSOR_{}", self.name())
    }
}

impl TryFrom<u32> for ProcessorId {
    type Error = AddressError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|p| *p as u32 == value)
            .ok_or(AddressError::UnknownProcessor(value))
    }
}

impl fmt::Display for ProcessorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_ids_round_trip() {
        for domain in DomainId::ALL {
            assert_eq!(DomainId::try_from(u32::from(domain.id())).unwrap(), domain);
        }
        assert!(matches!(
            DomainId::try_from(7),
            Err(AddressError::UnknownDomain(7))
        ));
    }

    #[test]
    fn vpr_processors_are_owned_by_application() {
        assert_eq!(ProcessorId::Ppr.default_owner_id(), OwnerId::Application);
        assert_eq!(ProcessorId::Flpr.default_owner_id(), OwnerId::Application);
        assert_eq!(ProcessorId::Cellcore.default_owner_id(), OwnerId::Cell);
    }

    #[test]
    fn c_enum_tokens() {
        assert_eq!(DomainId::GlobalAlias.c_enum(), "NRF_DOMAIN_GLOBAL_");
        assert_eq!(OwnerId::Application.c_enum(), "NRF_OWNER_APPLICATION");
        assert_eq!(ProcessorId::Radiocore.c_enum(), "NRF_PROCESSOR_RADIOCORE");
    }

    #[test]
    fn undefined_region_encoding_decodes() {
        assert_eq!(AddressRegion::from_bits(6), AddressRegion::Reserved);
        assert!(!AddressRegion::Reserved.has_domain_security());
        assert!(AddressRegion::Stm.has_peripheral_bits());
    }
}
