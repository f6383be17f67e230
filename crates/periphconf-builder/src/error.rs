//! Error types for PERIPHCONF generation

use periphconf_chip::AddressError;
use thiserror::Error;

/// Result type alias for builder operations
pub type Result<T> = std::result::Result<T, BuildError>;

/// Errors that abort PERIPHCONF generation.
///
/// A failing builder call leaves previously committed output untouched and
/// adds nothing from the failed call.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The topology does not meet the assumptions of the builder
    #[error("bad topology at {path}: {reason}")]
    BadTopology {
        /// Node path or label the problem was found at
        path: String,
        /// What is wrong
        reason: String,
    },

    /// An SPU or PPIB address is missing from the instance name tables
    #[error("no {kind} instance at 0x{address:08x} in the lookup tables")]
    UnknownInstance {
        /// Instance kind (`SPU` or `PPIB`)
        kind: &'static str,
        /// Instance address
        address: u32,
    },

    /// A channel has no entry in a fixed DPPI/PPIB connection map
    #[error("{table}: no connection for 0x{address:08x} channel {channel}")]
    ChannelNotMapped {
        /// Connection table name
        table: &'static str,
        /// Address of the instance the channel belongs to
        address: u32,
        /// Channel number
        channel: u32,
    },

    /// An address field was read outside the regions that define it
    #[error(transparent)]
    Address(#[from] AddressError),

    /// Topology or lookup table JSON could not be parsed
    #[error("failed to parse {what}: {source}")]
    Parse {
        /// Input being parsed
        what: &'static str,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },
}

impl BuildError {
    /// Create a bad topology error
    pub fn bad_topology(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::BadTopology {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// True for errors caused by the topology itself
    pub fn is_bad_topology(&self) -> bool {
        matches!(self, Self::BadTopology { .. })
    }
}
