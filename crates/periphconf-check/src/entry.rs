//! PERIPHCONF blob decoding.
//!
//! The blob is a table of 8-byte little-endian records: a register pointer
//! (word aligned, the low two bits are ignored) followed by the value to
//! write. The table ends at the first record whose pointer is
//! [`REG_PTR_MASK`] itself.

use bytes::Buf;
use periphconf_chip::RegisterKind;

use crate::catalog::{RegisterCatalog, RegisterInfo};
use crate::error::{CheckError, Result};
use crate::status::ValidationStatus;

/// Mask applied to register pointers. A masked pointer equal to the mask
/// terminates the table.
pub const REG_PTR_MASK: u32 = 0xFFFF_FFFC;

/// Size of one record in bytes.
pub const RECORD_SIZE: usize = 8;

/// One decoded PERIPHCONF record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfEntry<'c> {
    /// Record position in the blob.
    pub index: usize,
    /// Masked register pointer.
    pub reg_ptr: u32,
    /// Value written.
    pub value: u32,
    /// Catalog entry, `None` if the pointer is not in the catalog.
    pub info: Option<&'c RegisterInfo>,
    /// Register kind, classified from the catalog name.
    pub kind: Option<RegisterKind>,
    /// Flags accumulated during validation.
    pub status: ValidationStatus,
}

impl<'c> ConfEntry<'c> {
    /// Create an entry, classifying the register if the catalog knows it.
    ///
    /// # Errors
    ///
    /// Fails if the catalog name matches no known register kind.
    pub fn new(index: usize, reg_ptr: u32, value: u32, info: Option<&'c RegisterInfo>) -> Result<Self> {
        let kind = info.map(|i| RegisterKind::classify(&i.name)).transpose()?;
        Ok(Self {
            index,
            reg_ptr,
            value,
            info,
            kind,
            status: ValidationStatus::SUCCESS,
        })
    }

    /// Register name, or the pointer if the register is unrecognized.
    pub fn name(&self) -> String {
        match self.info {
            Some(info) => info.name.clone(),
            None => format!("{} (unrecognized)", fmt_hex(self.reg_ptr)),
        }
    }

    /// Writable bits; all bits if the register is unrecognized.
    pub fn mask(&self) -> u32 {
        self.info.map_or(u32::MAX, |i| i.mask)
    }

    /// Value restricted to writable bits.
    pub fn masked_value(&self) -> u32 {
        self.value & self.mask()
    }

    /// Reset value restricted to writable bits.
    pub fn masked_default_value(&self) -> Option<u32> {
        self.info.map(|i| i.default & i.mask)
    }

    fn require_info(&self) -> Result<&'c RegisterInfo> {
        self.info.ok_or(CheckError::NoRegisterInfo { reg_ptr: self.reg_ptr })
    }

    fn field_of(&self, name: &str, reg_value: u32) -> Result<u32> {
        let info = self.require_info()?;
        info.field(name)
            .map(|f| f.extract(reg_value))
            .ok_or_else(|| CheckError::missing_field(&info.name, name))
    }

    /// Field value written by this entry.
    ///
    /// # Errors
    ///
    /// Fails if the register or the field is not in the catalog.
    pub fn conf_field(&self, name: &str) -> Result<u32> {
        self.field_of(name, self.value)
    }

    /// Reset value of a field.
    ///
    /// # Errors
    ///
    /// Fails if the register or the field is not in the catalog.
    pub fn default_field(&self, name: &str) -> Result<u32> {
        self.field_of(name, self.require_info()?.default)
    }

    /// True if the entry writes the reset value of the field.
    ///
    /// # Errors
    ///
    /// Fails if the register or the field is not in the catalog.
    pub fn field_equals_default(&self, name: &str) -> Result<bool> {
        Ok(self.conf_field(name)? == self.default_field(name)?)
    }

    /// Writable fields as `NAME=value` pairs, or the raw value if the
    /// register is unrecognized.
    pub fn field_desc(&self) -> String {
        let Some(info) = self.info else {
            return format!("{} (unrecognized)", fmt_hex(self.value));
        };
        info.fields
            .iter()
            .filter(|f| !f.is_read_only(info.mask))
            .map(|f| format!("{}={}", f.name, f.extract(self.value)))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// `0x1234_5678` style hex.
pub fn fmt_hex(value: u32) -> String {
    format!("0x{:04x}_{:04x}", value >> 16, value & 0xFFFF)
}

/// Decode a raw PERIPHCONF blob.
///
/// Records after the terminator are ignored. A trailing partial record is
/// ignored with a warning.
///
/// # Errors
///
/// Fails if a catalog register name cannot be classified.
pub fn load_periphconf<'c>(catalog: &'c RegisterCatalog, mut blob: &[u8]) -> Result<Vec<ConfEntry<'c>>> {
    let mut entries = Vec::new();

    while blob.remaining() >= RECORD_SIZE {
        let reg_ptr = blob.get_u32_le() & REG_PTR_MASK;
        if reg_ptr == REG_PTR_MASK {
            tracing::debug!("End of PERIPHCONF table after {} entries", entries.len());
            return Ok(entries);
        }
        let value = blob.get_u32_le();
        entries.push(ConfEntry::new(entries.len(), reg_ptr, value, catalog.get(reg_ptr))?);
    }

    if blob.has_remaining() {
        tracing::warn!(
            "Ignoring {} trailing bytes after {} PERIPHCONF entries",
            blob.remaining(),
            entries.len()
        );
    }
    Ok(entries)
}
