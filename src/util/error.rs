//! Error types for the skinio library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for skin record and version store operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Sparse weight arrays violate the offset/index invariants
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    /// A field required by the schema is absent from the legend
    #[error("Missing field: {0}")]
    MissingField(String),

    /// A field is present but holds the wrong value type
    #[error("Schema mismatch for '{field}': expected {expected}, got {actual}")]
    SchemaMismatch {
        field: String,
        expected: String,
        actual: String,
    },

    /// Invalid magic bytes at start of file
    #[error("Invalid skin record: expected SKINIO magic bytes")]
    InvalidMagic,

    /// Unsupported record format version
    #[error("Unsupported record format version: {0}")]
    UnsupportedVersion(u16),

    /// Record bytes are truncated
    #[error("Unexpected end of data at position {0}")]
    UnexpectedEof(u64),

    /// Stored vertex count differs from the target geometry
    #[error("Vertex count mismatch on '{object}': record has {expected}, geometry has {actual}")]
    VertexCountMismatch {
        object: String,
        expected: usize,
        actual: usize,
    },

    /// Influences referenced by the record are absent from the scene
    #[error("Missing influences: {}", .0.join(", "))]
    MissingInfluence(Vec<String>),

    /// Object not found in the scene
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    /// File or directory does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Requested version number does not exist for the artifact
    #[error("Version {version} not found for {path}")]
    VersionNotFound { path: PathBuf, version: u32 },

    /// Archive would leave no version of the artifact behind
    #[error("Cannot archive all {count} versions of {path}")]
    CannotArchiveAll { path: PathBuf, count: usize },

    /// Batch export with no qualifying members
    #[error("Nothing to export: no qualifying members")]
    EmptyBatch,

    /// Configuration value out of range
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Memory mapping failed
    #[error("Memory mapping failed: {0}")]
    MmapFailed(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (manifest, config, scene) error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// UTF-8 conversion error
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl Error {
    /// Create a malformed record error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedRecord(msg.into())
    }

    /// Create a schema mismatch error.
    pub fn mismatch(field: &str, expected: &str, actual: &str) -> Self {
        Self::SchemaMismatch {
            field: field.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Map `NotFound` I/O errors onto [`Error::PathNotFound`] for `path`.
    pub fn from_io(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::PathNotFound(path.into())
        } else {
            Self::Io(err)
        }
    }
}

/// Result type alias for skinio operations.
pub type Result<T> = std::result::Result<T, Error>;
