//! Silicon model for PERIPHCONF on Haltium-class SoCs (nRF54H/nRF92).
//!
//! This crate has **no hardware access**. It models the parts of the chip
//! that both the PERIPHCONF builder and the PERIPHCONF checker need to agree
//! on: how addresses are laid out, which IDs exist, where SPU instances sit,
//! and how catalog register names map onto register kinds.
//!
//! # Crate organisation
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`address`] | Address bitfields (region, security, domain, bus, slave index) |
//! | [`ids`] | Address region, domain, owner and processor IDs |
//! | [`spu`] | SPU instance lookup and `PERIPH[n].PERM` field model |
//! | [`register`] | Register name classifier |

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod address;
mod error;
pub mod ids;
pub mod register;
pub mod spu;

pub use address::Address;
pub use error::{AddressError, ClassifyError, Result};
pub use ids::{AddressRegion, DomainId, OwnerId, ProcessorId};
pub use register::RegisterKind;
pub use spu::spu_address_for_peripheral;
