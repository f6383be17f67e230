//! PERIPHCONF checker.
//!
//! Decodes a raw PERIPHCONF blob extracted from a firmware image and checks
//! every entry against a register catalog. Problems that would make the
//! device fail its boot-time read-back are flagged as fatal.
//!
//! # Crate organisation
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`catalog`] | Register catalog: names, writable masks, reset values, fields |
//! | [`entry`] | Blob decoding and [`ConfEntry`] field access |
//! | [`status`] | [`ValidationStatus`] flag set |
//! | [`validate`] | Conflict, catalog and per-register checks |
//! | [`report`] | Text table and flag descriptions |
//!
//! # Quick start
//!
//! ```no_run
//! use periphconf_check::{load_periphconf, validate_periphconf, RegisterCatalog};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = RegisterCatalog::from_file("registers.json")?;
//! let blob = std::fs::read("periphconf.bin")?;
//!
//! let mut entries = load_periphconf(&catalog, &blob)?;
//! let status = validate_periphconf(&mut entries)?;
//! if status.is_fatal_error() {
//!     eprintln!("{status}");
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod catalog;
pub mod entry;
mod error;
pub mod report;
pub mod status;
pub mod validate;

pub use catalog::{FieldInfo, RegisterCatalog, RegisterInfo};
pub use entry::{fmt_hex, load_periphconf, ConfEntry};
pub use error::{CheckError, Result};
pub use report::{render_periphconf_table, render_validation_status, TableStyle};
pub use status::ValidationStatus;
pub use validate::validate_periphconf;
