//! PERIPHCONF builder.
//!
//! Derives the UICR macro calls that populate PERIPHCONF for one processor
//! from a resolved hardware topology snapshot and a set of SoC lookup tables.
//! The output is a C source file consumed by the firmware build.
//!
//! # Crate organisation
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`topology`] | Node arena: labels, compatibles, regs, properties, pin control |
//! | [`tables`] | CTRLSEL, analog pin, PPI bridge and instance name tables |
//! | [`psel`] | `NRF_PSEL` decoding |
//! | [`macro_call`] | Macro call model and C rendering |
//! | [`builder`] | [`PeriphconfBuilder`] |
//!
//! # Quick start
//!
//! ```no_run
//! use periphconf_builder::{PeriphconfBuilder, SocLookupTables, Topology};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let topology = Topology::from_json(&std::fs::read_to_string("topology.json")?)?;
//! let tables = SocLookupTables::from_json(&std::fs::read_to_string("tables.json")?)?;
//!
//! let mut builder = PeriphconfBuilder::new(&topology, &tables)?;
//! builder.add_global_peripheral_cfg("uart120", true, true)?;
//! builder.add_local_peripheral_cfg("cpuapp_ipct")?;
//! println!("{}", builder.build_generated_source(None));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod builder;
mod error;
pub mod macro_call;
pub mod psel;
pub mod tables;
pub mod topology;

pub use builder::{IpcLink, NodeRef, PeripheralOptions, PeriphconfBuilder};
pub use error::{BuildError, Result};
pub use macro_call::{Arg, MacroCall};
pub use tables::{Ctrlsel, SocLookupTables};
pub use topology::{NodeId, Topology};
