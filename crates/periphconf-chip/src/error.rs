//! Error types for the silicon model

use thiserror::Error;

use crate::ids::AddressRegion;

/// Result type alias for address operations
pub type Result<T> = std::result::Result<T, AddressError>;

/// Errors raised when interpreting an address or an ID value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// The field does not exist in the address format of this region
    #[error("{field} is not defined for address region {region}")]
    FieldNotApplicable {
        /// Field that was accessed
        field: &'static str,
        /// Region of the address
        region: AddressRegion,
    },

    /// Value is not a defined domain ID
    #[error("{0} is not a valid domain ID")]
    UnknownDomain(u32),

    /// Value is not a defined processor ID
    #[error("{0} is not a valid processor ID")]
    UnknownProcessor(u32),
}

/// Register name that none of the known templates match.
///
/// Every register in the catalog is expected to be classifiable, so this
/// points at a catalog/classifier mismatch rather than bad input data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to parse register name {name}")]
pub struct ClassifyError {
    /// The offending dotted register name
    pub name: String,
}
