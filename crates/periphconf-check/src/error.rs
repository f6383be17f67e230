//! Error types for PERIPHCONF validation

use std::path::PathBuf;

use periphconf_chip::ClassifyError;
use thiserror::Error;

/// Result type alias for validation operations
pub type Result<T> = std::result::Result<T, CheckError>;

/// Errors raised by the checker itself.
///
/// Problems found in the blob are not errors; they are reported through
/// [`ValidationStatus`](crate::ValidationStatus) flags.
#[derive(Debug, Error)]
pub enum CheckError {
    /// Register catalog JSON is malformed
    #[error("invalid register catalog: {0}")]
    Catalog(#[from] serde_json::Error),

    /// Register catalog key is not a decimal register pointer
    #[error("invalid register catalog key {key:?}: expected a decimal register address")]
    CatalogKey {
        /// Offending key
        key: String,
    },

    /// A catalog register name matches no known register kind
    #[error(transparent)]
    Classify(#[from] ClassifyError),

    /// A check needs a field the catalog does not describe
    #[error("register {register} has no field {field} in the catalog")]
    MissingField {
        /// Register name
        register: String,
        /// Field name
        field: String,
    },

    /// A field was read from an entry without catalog information
    #[error("register 0x{reg_ptr:08x} is not in the catalog")]
    NoRegisterInfo {
        /// Register pointer
        reg_ptr: u32,
    },

    /// Input file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl CheckError {
    /// Create a missing field error
    pub fn missing_field(register: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField {
            register: register.into(),
            field: field.into(),
        }
    }
}
