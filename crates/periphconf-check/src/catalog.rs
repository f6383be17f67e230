//! Register catalog.
//!
//! The catalog describes every register PERIPHCONF may target. It ships as
//! JSON keyed by the decimal register address:
//!
//! ```json
//! { "1603403776": { "name": "SPU131.PERIPH[0].PERM", "mask": 4294967295,
//!                   "default": 0, "fields": [{ "name": "LOCK", "mask": 256 }] } }
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{CheckError, Result};

/// One register field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldInfo {
    /// Field name, e.g. `OWNERID`.
    pub name: String,
    /// Field bits within the register.
    pub mask: u32,
}

impl FieldInfo {
    /// Extract this field from a register value.
    pub const fn extract(&self, value: u32) -> u32 {
        if self.mask == 0 {
            0
        } else {
            (value & self.mask) >> self.mask.trailing_zeros()
        }
    }

    /// True if the field has no writable bits under `register_mask`.
    pub const fn is_read_only(&self, register_mask: u32) -> bool {
        self.mask & !register_mask == self.mask
    }
}

/// Catalog entry for one register.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterInfo {
    /// Dotted register name, e.g. `SPU131.FEATURE.GPIO[1].PIN[7]`.
    pub name: String,
    /// Writable bits.
    pub mask: u32,
    /// Reset value.
    pub default: u32,
    /// Fields in register order.
    #[serde(default)]
    pub fields: Vec<FieldInfo>,
}

impl RegisterInfo {
    /// Field by name.
    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Registers by pointer.
#[derive(Debug, Clone, Default)]
pub struct RegisterCatalog {
    registers: HashMap<u32, RegisterInfo>,
}

impl RegisterCatalog {
    /// Parse a catalog from JSON.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON or keys that are not decimal `u32` values.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: HashMap<String, RegisterInfo> = serde_json::from_str(json)?;
        let registers = raw
            .into_iter()
            .map(|(key, info)| match key.parse::<u32>() {
                Ok(ptr) => Ok((ptr, info)),
                Err(_) => Err(CheckError::CatalogKey { key }),
            })
            .collect::<Result<HashMap<_, _>>>()?;

        tracing::debug!("Loaded register catalog with {} registers", registers.len());
        Ok(Self { registers })
    }

    /// Read and parse a catalog file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not a valid catalog.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| CheckError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Add or replace a register.
    pub fn insert(&mut self, reg_ptr: u32, info: RegisterInfo) {
        self.registers.insert(reg_ptr, info);
    }

    /// Register at `reg_ptr`.
    pub fn get(&self, reg_ptr: u32) -> Option<&RegisterInfo> {
        self.registers.get(&reg_ptr)
    }

    /// Number of registers.
    pub fn len(&self) -> usize {
        self.registers.len()
    }

    /// True if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }
}
