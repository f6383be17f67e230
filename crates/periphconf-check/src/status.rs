//! Validation status flags.
//!
//! A [`ValidationStatus`] is a set of error kinds. The empty set means
//! success. Entries accumulate flags during validation and the combined
//! status of a blob is the union over all entries.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Set of validation error kinds.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ValidationStatus(u16);

// ── Flags ────────────────────────────────────────────────────────────────────

impl ValidationStatus {
    /// No errors.
    pub const SUCCESS: Self = Self(0);
    /// Entries for the same register disagree; the last one wins at boot.
    pub const CONFLICTING_VALUES_NON_FATAL: Self = Self(1 << 0);
    /// Entries for the same lockable register disagree.
    pub const CONFLICTING_VALUES_FATAL: Self = Self(1 << 1);
    /// Register exists in the catalog but not in the hardware.
    pub const UNIMPLEMENTED_REGISTER: Self = Self(1 << 2);
    /// Register pointer is not in the catalog.
    pub const UNRECOGNIZED_REGISTER: Self = Self(1 << 3);
    /// `DMASEC` written on a peripheral with fixed DMA security.
    pub const SPU_PERM_DMASEC_NOT_APPLICABLE: Self = Self(1 << 4);
    /// `OWNERID` written on a peripheral without programmable ownership.
    pub const SPU_PERM_OWNERID_NOT_APPLICABLE: Self = Self(1 << 5);
    /// `SECATTR` written on a peripheral without programmable security.
    pub const SPU_PERM_SECATTR_NOT_APPLICABLE: Self = Self(1 << 6);
    /// Non-default value written to an SPU register that is locked by default.
    pub const SPU_REGISTER_LOCKED: Self = Self(1 << 7);
    /// MEMCONF power register enables a memory region that does not exist.
    pub const MEMCONF_POWER_REGION_NOT_PRESENT: Self = Self(1 << 8);
}

const FLAGS: [(ValidationStatus, &str, &str); 9] = [
    (
        ValidationStatus::CONFLICTING_VALUES_NON_FATAL,
        "CONFLICTING_VALUES_NON_FATAL",
        "Two or more PERIPHCONF entries target the same register but have different values.\n\
         This is likely caused by conflicting configurations in the device tree or source code.\n\
         The targeted register is not lockable, therefore the latest entry in the table will\n\
         take precedence and overwrite previous entries.",
    ),
    (
        ValidationStatus::CONFLICTING_VALUES_FATAL,
        "CONFLICTING_VALUES_FATAL",
        "Two or more PERIPHCONF entries target the same register but have different values.\n\
         This is likely caused by conflicting configurations in the device tree or source code.\n\
         The targeted register is lockable, therefore the second entry will cause a read-back\n\
         error, preventing the device from booting normally.",
    ),
    (
        ValidationStatus::UNIMPLEMENTED_REGISTER,
        "UNIMPLEMENTED_REGISTER",
        "The PERIPHCONF entry targets a register that is not implemented in the hardware.\n\
         This typically means that the hardware feature configured by the entry, e.g. GPIO pin or\n\
         DPPI channel, does not exist. The entry will cause a read-back error, preventing the\n\
         device from booting normally.",
    ),
    (
        ValidationStatus::UNRECOGNIZED_REGISTER,
        "UNRECOGNIZED_REGISTER",
        "The PERIPHCONF entry register address is not recognized. Therefore the entry will cause\n\
         a permission error, preventing the device from booting normally.",
    ),
    (
        ValidationStatus::SPU_PERM_DMASEC_NOT_APPLICABLE,
        "SPU_PERM_DMASEC_NOT_APPLICABLE",
        "The PERIPHCONF entry targets a SPU PERIPH[n].PERM register that does not accept\n\
         the DMA security (DMASEC) setting set by the entry. This is either because the peripheral\n\
         governed by this PERM register does not have DMA, or that the DMA security has a fixed\n\
         value. This entry will cause a read-back error, preventing the device from booting\n\
         normally.",
    ),
    (
        ValidationStatus::SPU_PERM_OWNERID_NOT_APPLICABLE,
        "SPU_PERM_OWNERID_NOT_APPLICABLE",
        "The PERIPHCONF entry targets a SPU PERIPH[n].PERM register that does not accept\n\
         the Owner ID (OWNERID) setting set by the entry. This is because the peripheral\n\
         governed by this PERM register does not have programmable ownership.\n\
         This entry will cause a read-back error, preventing the device from booting normally.",
    ),
    (
        ValidationStatus::SPU_PERM_SECATTR_NOT_APPLICABLE,
        "SPU_PERM_SECATTR_NOT_APPLICABLE",
        "The PERIPHCONF entry targets a SPU PERIPH[n].PERM register that does not accept\n\
         the security (SECATTR) setting set by the entry. This is because the peripheral\n\
         governed by this PERM register does not have programmable security.\n\
         This entry will cause a read-back error, preventing the device from booting normally.",
    ),
    (
        ValidationStatus::SPU_REGISTER_LOCKED,
        "SPU_REGISTER_LOCKED",
        "The PERIPHCONF entry targets a SPU register that is by default locked in the hardware,\n\
         and contains a different value than the default value. This entry will cause a read-back\n\
         error, preventing the device from booting normally.",
    ),
    (
        ValidationStatus::MEMCONF_POWER_REGION_NOT_PRESENT,
        "MEMCONF_POWER_REGION_NOT_PRESENT",
        "The PERIPHCONF entry targets a MEMCONF POWER register, and has enabled a memory region\n\
         index that is not present in the hardware. This entry will cause a read-back\n\
         error, preventing the device from booting normally.",
    ),
];

impl ValidationStatus {
    /// Raw bits.
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// True if every flag in `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if any error is set.
    pub const fn is_error(self) -> bool {
        self.0 != 0
    }

    /// True if any error other than a non-fatal conflict is set. Such errors
    /// prevent the device from booting normally.
    pub const fn is_fatal_error(self) -> bool {
        self.0 & !Self::CONFLICTING_VALUES_NON_FATAL.0 != 0
    }

    /// Set flags, one at a time, in declaration order.
    pub fn iter(self) -> impl Iterator<Item = Self> {
        FLAGS
            .iter()
            .map(|(flag, _, _)| *flag)
            .filter(move |flag| self.contains(*flag))
    }

    /// Name of a single flag.
    pub fn name(self) -> Option<&'static str> {
        if self == Self::SUCCESS {
            return Some("SUCCESS");
        }
        FLAGS.iter().find(|(f, _, _)| *f == self).map(|(_, name, _)| *name)
    }

    /// Prose description of a single flag.
    pub fn description(self) -> Option<&'static str> {
        if self == Self::SUCCESS {
            return Some("No errors");
        }
        FLAGS.iter().find(|(f, _, _)| *f == self).map(|(_, _, desc)| *desc)
    }
}

impl BitOr for ValidationStatus {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ValidationStatus {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for ValidationStatus {
    /// Flag names joined by `, `, or `SUCCESS`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_error() {
            return f.write_str("SUCCESS");
        }
        for (i, flag) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(flag.name().unwrap_or("?"))?;
        }
        Ok(())
    }
}

impl fmt::Debug for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValidationStatus({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_non_fatal_conflict_is_non_fatal() {
        let s = ValidationStatus::CONFLICTING_VALUES_NON_FATAL;
        assert!(s.is_error());
        assert!(!s.is_fatal_error());

        for flag in FLAGS.iter().map(|(f, _, _)| *f).skip(1) {
            assert!(flag.is_fatal_error(), "{flag} should be fatal");
            assert!((flag | s).is_fatal_error());
        }
        assert!(!ValidationStatus::SUCCESS.is_error());
    }

    #[test]
    fn iterates_set_flags_in_order() {
        let s = ValidationStatus::SPU_REGISTER_LOCKED
            | ValidationStatus::UNIMPLEMENTED_REGISTER
            | ValidationStatus::CONFLICTING_VALUES_FATAL;
        let names: Vec<_> = s.iter().filter_map(ValidationStatus::name).collect();
        assert_eq!(
            names,
            ["CONFLICTING_VALUES_FATAL", "UNIMPLEMENTED_REGISTER", "SPU_REGISTER_LOCKED"]
        );
        assert_eq!(ValidationStatus::SUCCESS.iter().count(), 0);
    }

    #[test]
    fn display_and_descriptions() {
        let s = ValidationStatus::UNRECOGNIZED_REGISTER | ValidationStatus::CONFLICTING_VALUES_NON_FATAL;
        assert_eq!(s.to_string(), "CONFLICTING_VALUES_NON_FATAL, UNRECOGNIZED_REGISTER");
        assert_eq!(ValidationStatus::SUCCESS.to_string(), "SUCCESS");
        assert!(s.name().is_none());
        assert!(ValidationStatus::MEMCONF_POWER_REGION_NOT_PRESENT
            .description()
            .is_some_and(|d| d.contains("MEMCONF POWER")));
    }
}
