use thiserror::Error;

/// Unified error type for the Fulmen library.
#[derive(Error, Debug)]
pub enum Error {
    /// Read of a key that is neither stored nor a declared field.
    /// Recoverable: callers may probe declared fields before giving up.
    #[error("Missing Field: {0}")]
    MissingField(String),

    /// A truly absent key, surfaced to generic mapping consumers.
    #[error("Key Error: {0}")]
    KeyError(String),

    /// Attribute-style write to a key that is neither stored nor declared.
    /// The permissive index-style path intentionally bypasses this.
    #[error("Attribute Error: {0}")]
    AttributeError(String),

    /// A tag or schema URI claimed by more than one class. Raised at
    /// registration time; a programming error, never recoverable at runtime.
    #[error("Duplicate Registration: {0}")]
    DuplicateRegistration(String),

    /// Error related to schema document parsing or resolution.
    #[error("Schema Error: {0}")]
    SchemaError(String),

    /// A URI with no registered document text.
    #[error("Resource Error: {0}")]
    ResourceError(String),

    /// A raw value whose shape is incompatible with a declared signature.
    #[error("Coercion Error: {0}")]
    CoercionError(String),

    /// Error raised at the converter protocol boundary.
    #[error("Conversion Error: {0}")]
    ConversionError(String),
}

/// A specialized `Result` type for Fulmen operations.
pub type Result<T> = std::result::Result<T, Error>;
