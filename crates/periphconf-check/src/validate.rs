//! Validation checks.
//!
//! Entries are grouped by register pointer. Each group is checked for
//! conflicting values, then every entry runs the per-register checks. Flags
//! are OR-ed into the entries and into the returned combined status.

use std::collections::HashSet;

use periphconf_chip::spu::{perm_fields, DmaMode, SecureMapping};
use periphconf_chip::RegisterKind;

use crate::entry::ConfEntry;
use crate::error::Result;
use crate::status::ValidationStatus;

/// Validate all entries, updating their status flags.
///
/// # Errors
///
/// Fails only if the catalog lacks a field that a check needs.
pub fn validate_periphconf(entries: &mut [ConfEntry<'_>]) -> Result<ValidationStatus> {
    let mut combined = ValidationStatus::SUCCESS;

    let mut sorted: Vec<&mut ConfEntry<'_>> = entries.iter_mut().collect();
    sorted.sort_by_key(|e| e.reg_ptr);

    for group in sorted.chunk_by_mut(|a, b| a.reg_ptr == b.reg_ptr) {
        combined |= check_conflicting_values(group);

        for entry in group.iter_mut() {
            combined |= check_unrecognized_register(entry);
            combined |= check_unimplemented_register(entry);
            combined |= check_register_config(entry)?;
        }
    }

    tracing::info!("Validated {} PERIPHCONF entries: {combined}", entries.len());
    Ok(combined)
}

/// Flag entries that write different values to the same register.
///
/// All entries must share one register pointer. Conflicts on SPU registers
/// are fatal because those lock on first write.
pub fn check_conflicting_values(group: &mut [&mut ConfEntry<'_>]) -> ValidationStatus {
    if group.len() < 2 {
        return ValidationStatus::SUCCESS;
    }

    let distinct: HashSet<u32> = group.iter().map(|e| e.masked_value()).collect();
    if distinct.len() < 2 {
        return ValidationStatus::SUCCESS;
    }

    let status = match &group[0].kind {
        Some(kind) if kind.is_spu_register() => ValidationStatus::CONFLICTING_VALUES_FATAL,
        _ => ValidationStatus::CONFLICTING_VALUES_NON_FATAL,
    };

    for entry in group.iter_mut() {
        entry.status |= status;
    }
    status
}

/// Flag entries whose register pointer is not in the catalog.
pub fn check_unrecognized_register(entry: &mut ConfEntry<'_>) -> ValidationStatus {
    if entry.info.is_some() {
        return ValidationStatus::SUCCESS;
    }
    entry.status |= ValidationStatus::UNRECOGNIZED_REGISTER;
    ValidationStatus::UNRECOGNIZED_REGISTER
}

/// Flag entries targeting registers the hardware does not implement.
///
/// Registers managed through PERIPHCONF reset to a non-zero value when
/// implemented. IPCMAP and PPIB registers do not follow that rule and are
/// always treated as implemented.
pub fn check_unimplemented_register(entry: &mut ConfEntry<'_>) -> ValidationStatus {
    let (Some(info), Some(kind)) = (entry.info, &entry.kind) else {
        return ValidationStatus::SUCCESS;
    };

    let always_implemented = matches!(
        kind,
        RegisterKind::IpcmapChannelSink { .. }
            | RegisterKind::IpcmapChannelSource { .. }
            | RegisterKind::PpibPublishReceive { .. }
            | RegisterKind::PpibSubscribeSend { .. }
    );
    if always_implemented || info.default != 0 {
        return ValidationStatus::SUCCESS;
    }

    entry.status |= ValidationStatus::UNIMPLEMENTED_REGISTER;
    ValidationStatus::UNIMPLEMENTED_REGISTER
}

/// Register-specific value checks.
///
/// # Errors
///
/// Fails if the catalog lacks a field a check reads.
pub fn check_register_config(entry: &mut ConfEntry<'_>) -> Result<ValidationStatus> {
    let Some(kind) = &entry.kind else {
        return Ok(ValidationStatus::SUCCESS);
    };

    let status = match kind {
        RegisterKind::SpuPeriphPerm { .. } => check_spu_perm(entry)?,
        RegisterKind::SpuFeatureBellsProcessorEvents { .. }
        | RegisterKind::SpuFeatureBellsProcessorInterrupt { .. }
        | RegisterKind::SpuFeatureBellsProcessorTasks { .. }
        | RegisterKind::SpuFeatureDppicCh { .. }
        | RegisterKind::SpuFeatureDppicChg { .. }
        | RegisterKind::SpuFeatureGpioPin { .. }
        | RegisterKind::SpuFeatureGpioteCh { .. }
        | RegisterKind::SpuFeatureGpioteInterrupt { .. }
        | RegisterKind::SpuFeatureGrtcCc { .. }
        | RegisterKind::SpuFeatureGrtcClk { .. }
        | RegisterKind::SpuFeatureGrtcInterrupt { .. }
        | RegisterKind::SpuFeatureGrtcPwmconfig { .. }
        | RegisterKind::SpuFeatureGrtcSyscounter { .. }
        | RegisterKind::SpuFeatureIpctCh { .. }
        | RegisterKind::SpuFeatureIpctInterrupt { .. } => check_spu_lock(entry)?,
        RegisterKind::MemconfPowerControl { .. }
        | RegisterKind::MemconfPowerRet { .. }
        | RegisterKind::MemconfPowerRet2 { .. } => check_memconf_power(entry),
        // No value constraints beyond the generic checks.
        RegisterKind::GpioPinCnf { .. }
        | RegisterKind::IpcmapChannelSink { .. }
        | RegisterKind::IpcmapChannelSource { .. }
        | RegisterKind::IrqmapIrqSink { .. }
        | RegisterKind::PpibPublishReceive { .. }
        | RegisterKind::PpibSubscribeSend { .. } => ValidationStatus::SUCCESS,
    };

    entry.status |= status;
    Ok(status)
}

fn check_spu_perm(entry: &ConfEntry<'_>) -> Result<ValidationStatus> {
    let mut status = ValidationStatus::SUCCESS;

    let fixed_dmasec = DmaMode::from_bits(entry.default_field(perm_fields::DMA)?)
        .is_some_and(DmaMode::has_fixed_dmasec);
    if fixed_dmasec && !entry.field_equals_default(perm_fields::DMASEC)? {
        status |= ValidationStatus::SPU_PERM_DMASEC_NOT_APPLICABLE;
    }

    let fixed_owner = entry.default_field(perm_fields::OWNERPROG)? == 0;
    if fixed_owner && !entry.field_equals_default(perm_fields::OWNERID)? {
        status |= ValidationStatus::SPU_PERM_OWNERID_NOT_APPLICABLE;
    }

    let fixed_secattr = SecureMapping::from_bits(entry.default_field(perm_fields::SECUREMAPPING)?)
        != Some(SecureMapping::UserSelectable);
    if fixed_secattr && !entry.field_equals_default(perm_fields::SECATTR)? {
        status |= ValidationStatus::SPU_PERM_SECATTR_NOT_APPLICABLE;
    }

    Ok(status | check_spu_lock(entry)?)
}

fn check_spu_lock(entry: &ConfEntry<'_>) -> Result<ValidationStatus> {
    let locked = entry.default_field(perm_fields::LOCK)? != 0;
    if locked && Some(entry.masked_value()) != entry.masked_default_value() {
        Ok(ValidationStatus::SPU_REGISTER_LOCKED)
    } else {
        Ok(ValidationStatus::SUCCESS)
    }
}

/// Power registers reset with every implemented region bit set, so a
/// writable bit that differs from the reset value addresses a missing region.
fn check_memconf_power(entry: &ConfEntry<'_>) -> ValidationStatus {
    let Some(default) = entry.masked_default_value() else {
        return ValidationStatus::SUCCESS;
    };
    if (entry.masked_value() ^ default) & entry.mask() != 0 {
        ValidationStatus::MEMCONF_POWER_REGION_NOT_PRESENT
    } else {
        ValidationStatus::SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FieldInfo, RegisterInfo};

    fn info(name: &str, mask: u32, default: u32, fields: &[(&str, u32)]) -> RegisterInfo {
        RegisterInfo {
            name: name.into(),
            mask,
            default,
            fields: fields
                .iter()
                .map(|(n, m)| FieldInfo { name: (*n).into(), mask: *m })
                .collect(),
        }
    }

    #[test]
    fn single_entry_never_conflicts() {
        let reg = info("P0.PIN_CNF[1]", 0xFFFF_FFFF, 2, &[]);
        let mut entry = ConfEntry::new(0, 0x100, 1, Some(&reg)).unwrap();
        assert_eq!(check_conflicting_values(&mut [&mut entry]), ValidationStatus::SUCCESS);
    }

    #[test]
    fn equal_masked_values_do_not_conflict() {
        let reg = info("P0.PIN_CNF[1]", 0x0000_00FF, 2, &[]);
        let mut a = ConfEntry::new(0, 0x100, 0x0000_0011, Some(&reg)).unwrap();
        let mut b = ConfEntry::new(1, 0x100, 0xFF00_0011, Some(&reg)).unwrap();
        assert_eq!(check_conflicting_values(&mut [&mut a, &mut b]), ValidationStatus::SUCCESS);
        assert!(!a.status.is_error());
    }

    #[test]
    fn ipcmap_and_ppib_are_always_implemented() {
        let ipcmap = info("IPCMAP.CHANNEL[3].SOURCE", 0xFFFF_FFFF, 0, &[]);
        let mut entry = ConfEntry::new(0, 0x200, 1, Some(&ipcmap)).unwrap();
        assert_eq!(check_unimplemented_register(&mut entry), ValidationStatus::SUCCESS);

        let pin = info("P2.PIN_CNF[31]", 0xFFFF_FFFF, 0, &[]);
        let mut entry = ConfEntry::new(0, 0x300, 1, Some(&pin)).unwrap();
        assert_eq!(
            check_unimplemented_register(&mut entry),
            ValidationStatus::UNIMPLEMENTED_REGISTER
        );
        assert!(entry.status.contains(ValidationStatus::UNIMPLEMENTED_REGISTER));
    }

    #[test]
    fn irqmap_has_no_value_checks() {
        let reg = info("IRQMAP.IRQ[10].SINK", 0xF, 0x1, &[]);
        let mut entry = ConfEntry::new(0, 0x400, 0x2, Some(&reg)).unwrap();
        assert_eq!(check_register_config(&mut entry).unwrap(), ValidationStatus::SUCCESS);
    }

    #[test]
    fn undefined_securemapping_fixes_secattr() {
        let fields = [
            (perm_fields::SECUREMAPPING, 0x7),
            (perm_fields::DMA, 0x18),
            (perm_fields::SECATTR, 0x20),
            (perm_fields::DMASEC, 0x40),
            (perm_fields::OWNERPROG, 0x80),
            (perm_fields::LOCK, 0x100),
            (perm_fields::OWNERID, 0xF_0000),
        ];
        // SECUREMAPPING=6 is outside the defined encodings, not user selectable.
        let reg = info("SPU131.PERIPH[2].PERM", 0x000F_0160, 0x96, &fields);
        let mut entry = ConfEntry::new(0, 0x600, 0xB6, Some(&reg)).unwrap();
        assert_eq!(
            check_register_config(&mut entry).unwrap(),
            ValidationStatus::SPU_PERM_SECATTR_NOT_APPLICABLE
        );
    }

    #[test]
    fn spu_feature_without_lock_field_is_an_error() {
        let reg = info("SPU131.FEATURE.GPIO[0].PIN[1]", 0xFFFF_FFFF, 1, &[]);
        let mut entry = ConfEntry::new(0, 0x500, 2, Some(&reg)).unwrap();
        assert!(check_register_config(&mut entry).is_err());
    }
}
