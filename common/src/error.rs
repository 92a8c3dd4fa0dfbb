// Registry Error Codes
//
// Error Code Ranges:
// - 100-199: Configuration errors
// - 200-299: Authorization errors
// - 300-399: Compliance errors
// - 400-499: Existence errors
// - 500-599: Size and payload errors
// - 600-699: Record integrity errors
// - 700-799: Update errors
// - 900-999: Backend errors

use thiserror::Error;

/// Registry operation result type
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Coarse error category, one per failure family a caller can act on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Authorization,
    Compliance,
    AlreadyExists,
    NotFound,
    InvalidSize,
    InvalidPayload,
    MalformedRecord,
    Update,
    Backend,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    // ========================================
    // Configuration errors (100-199)
    // ========================================
    #[error("{0} is not configured")]
    MissingConfiguration(&'static str),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    // ========================================
    // Authorization errors (200-299)
    // ========================================
    #[error("ASA {asset_id} has no manager; metadata updates are not permitted")]
    NoManager { asset_id: u64 },

    #[error("Caller must be ASA manager (manager={manager}, caller={caller})")]
    NotManager { manager: String, caller: String },

    // ========================================
    // Compliance errors (300-399)
    // ========================================
    #[error("ARC-3 flag set but ASA {asset_id} is not ARC-3 compliant")]
    NotArc3Compliant { asset_id: u64 },

    #[error("ARC-89 native flag set but ASA URL does not start with the ARC-90 partial URI {expected}")]
    MissingNativePrefix { expected: String },

    // ========================================
    // Existence errors (400-499)
    // ========================================
    #[error("Metadata already exists for asset {0}")]
    AlreadyExists(u64),

    #[error("ASA {0} does not exist")]
    AssetNotFound(u64),

    #[error("Metadata does not exist for asset {0}")]
    MetadataNotFound(u64),

    // ========================================
    // Size and payload errors (500-599)
    // ========================================
    #[error("Invalid size: {0}")]
    InvalidSize(String),

    #[error("Invalid metadata payload: {0}")]
    InvalidPayload(String),

    // ========================================
    // Record integrity errors (600-699)
    // ========================================
    #[error("Malformed metadata record: {0}")]
    MalformedRecord(String),

    // ========================================
    // Update errors (700-799)
    // ========================================
    #[error("Irreversible flags cannot change (stored={stored:#04x}, requested={requested:#04x})")]
    IrreversibleFlagChange { stored: u8, requested: u8 },

    #[error("Identifiers byte is fixed at creation (stored={stored:#04x}, derived={derived:#04x})")]
    IdentifiersChange { stored: u8, derived: u8 },

    #[error("Metadata for asset {0} is immutable")]
    ImmutableMetadata(u64),

    // ========================================
    // Backend errors (900-999)
    // ========================================
    #[error("Backend error: {0}")]
    Backend(String),
}

impl RegistryError {
    /// Wrap a collaborator failure, keeping its full context chain
    pub fn backend(err: anyhow::Error) -> Self {
        RegistryError::Backend(format!("{:#}", err))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingConfiguration(_) | Self::InvalidConfiguration(_) => {
                ErrorKind::Configuration
            }
            Self::NoManager { .. } | Self::NotManager { .. } => ErrorKind::Authorization,
            Self::NotArc3Compliant { .. } | Self::MissingNativePrefix { .. } => {
                ErrorKind::Compliance
            }
            Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Self::AssetNotFound(_) | Self::MetadataNotFound(_) => ErrorKind::NotFound,
            Self::InvalidSize(_) => ErrorKind::InvalidSize,
            Self::InvalidPayload(_) => ErrorKind::InvalidPayload,
            Self::MalformedRecord(_) => ErrorKind::MalformedRecord,
            Self::IrreversibleFlagChange { .. }
            | Self::IdentifiersChange { .. }
            | Self::ImmutableMetadata(_) => ErrorKind::Update,
            Self::Backend(_) => ErrorKind::Backend,
        }
    }

    /// Stable numeric code
    pub fn code(&self) -> u64 {
        match self {
            Self::MissingConfiguration(_) => 100,
            Self::InvalidConfiguration(_) => 101,
            Self::NoManager { .. } => 200,
            Self::NotManager { .. } => 201,
            Self::NotArc3Compliant { .. } => 300,
            Self::MissingNativePrefix { .. } => 301,
            Self::AlreadyExists(_) => 400,
            Self::AssetNotFound(_) => 401,
            Self::MetadataNotFound(_) => 402,
            Self::InvalidSize(_) => 500,
            Self::InvalidPayload(_) => 501,
            Self::MalformedRecord(_) => 600,
            Self::IrreversibleFlagChange { .. } => 700,
            Self::IdentifiersChange { .. } => 701,
            Self::ImmutableMetadata(_) => 702,
            Self::Backend(_) => 900,
        }
    }

    /// All registry errors are local validation failures except backend ones
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Backend(_))
    }
}
