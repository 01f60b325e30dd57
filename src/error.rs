//! Error types for the tab sync layer.
//!
//! Every failure carries a stable machine-readable [`ErrorCode`] and a
//! human-readable message, and belongs to one [`ErrorKind`] of the error
//! taxonomy.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use tab_sync::{Error, Result};
//!
//! fn restore(gate: &SnapshotGate, raw: &serde_json::Value) -> Result<()> {
//!     let snapshot = gate.accept(raw)?;
//!     let params = deserialize_tabs(&snapshot.tabs, &DeserializeOptions::new())?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Kind | Variants |
//! |------|----------|
//! | Structural validation | [`Error::InvalidTabData`], [`Error::InvalidSyncData`], [`Error::Json`] |
//! | Repairable defect | [`Error::TabSerialization`] |
//! | Integrity failure | [`Error::ChecksumMismatch`] |
//! | Version incompatible | [`Error::VersionIncompatible`] |
//! | Batch partial failure | [`Error::BatchPartialFailure`] |
//! | Configuration | [`Error::Config`] |
//! | External | [`Error::Collaborator`] |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::result::Result as StdResult;

use serde::Serialize;
use thiserror::Error;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// ErrorCode
// ============================================================================

/// Stable machine-readable error code.
///
/// Serialized in `SCREAMING_SNAKE_CASE` so codes can be matched by
/// consumers on the other side of the extension boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// A locally produced tab could not be serialized, even after repair.
    TabSerializationError,
    /// A tab record failed validation before deserialization.
    InvalidTabData,
    /// A snapshot failed structural validation.
    InvalidSyncData,
    /// A snapshot checksum did not match its contents.
    ChecksumMismatch,
    /// A snapshot was produced by an incompatible major version.
    VersionIncompatible,
    /// Some items of a batch failed.
    BatchPartialFailure,
    /// Invalid configuration.
    ConfigError,
    /// An external collaborator (tab source or sink) failed.
    CollaboratorError,
    /// JSON encoding or decoding failed.
    JsonError,
}

impl ErrorCode {
    /// Returns the code as it appears on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TabSerializationError => "TAB_SERIALIZATION_ERROR",
            Self::InvalidTabData => "INVALID_TAB_DATA",
            Self::InvalidSyncData => "INVALID_SYNC_DATA",
            Self::ChecksumMismatch => "CHECKSUM_MISMATCH",
            Self::VersionIncompatible => "VERSION_INCOMPATIBLE",
            Self::BatchPartialFailure => "BATCH_PARTIAL_FAILURE",
            Self::ConfigError => "CONFIG_ERROR",
            Self::CollaboratorError => "COLLABORATOR_ERROR",
            Self::JsonError => "JSON_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ErrorKind
// ============================================================================

/// Error taxonomy.
///
/// The kind decides how a caller may react: structural problems are
/// reported back, repairable defects have already had their one repair
/// attempt, integrity and version failures are fatal to the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Shape or type violation.
    StructuralValidation,
    /// Missing-but-fixable field on local data whose repair did not help.
    RepairableDefect,
    /// Checksum mismatch.
    IntegrityFailure,
    /// Major version mismatch.
    VersionIncompatible,
    /// Some items of a batch failed.
    BatchPartialFailure,
    /// Invalid options or builder input.
    Configuration,
    /// Failure reported by a collaborator outside this layer.
    External,
}

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes the context needed to report the failure.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Serialization Errors
    // ========================================================================
    /// Tab serialization failed after the repair attempt.
    #[error("Tab serialization failed for tab {}: {}", display_source(.source_id), .errors.join("; "))]
    TabSerialization {
        /// Browser id of the source tab, if it had one.
        source_id: Option<i64>,
        /// Validation errors remaining after repair.
        errors: Vec<String>,
    },

    // ========================================================================
    // Validation Errors
    // ========================================================================
    /// Tab record is structurally invalid.
    #[error("Invalid tab data: {}", .errors.join("; "))]
    InvalidTabData {
        /// Validation errors.
        errors: Vec<String>,
    },

    /// Snapshot is structurally invalid.
    #[error("Invalid sync data: {}", .errors.join("; "))]
    InvalidSyncData {
        /// Validation errors.
        errors: Vec<String>,
    },

    // ========================================================================
    // Trust Boundary Errors
    // ========================================================================
    /// Snapshot checksum does not match its contents.
    #[error("Checksum mismatch: expected {expected}, computed {actual}")]
    ChecksumMismatch {
        /// Checksum carried by the snapshot.
        expected: String,
        /// Checksum recomputed over the snapshot contents.
        actual: String,
    },

    /// Snapshot major version differs from the local one.
    #[error("Incompatible snapshot version {remote} (local version {local})")]
    VersionIncompatible {
        /// Version carried by the snapshot.
        remote: String,
        /// Local wire-format version.
        local: String,
    },

    // ========================================================================
    // Batch Errors
    // ========================================================================
    /// Some items of a batch failed.
    #[error("Batch partially failed: {failed} of {total} items failed")]
    BatchPartialFailure {
        /// Number of failed items.
        failed: usize,
        /// Number of items in the batch.
        total: usize,
    },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// A tab source or sink failed.
    #[error("Collaborator error: {message}")]
    Collaborator {
        /// Description of the failure.
        message: String,
    },

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn display_source(source_id: &Option<i64>) -> String {
    source_id.map_or_else(|| "unknown".to_string(), |id| id.to_string())
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a tab serialization error.
    #[inline]
    pub fn tab_serialization(source_id: Option<i64>, errors: Vec<String>) -> Self {
        Self::TabSerialization { source_id, errors }
    }

    /// Creates an invalid tab data error.
    #[inline]
    pub fn invalid_tab_data(errors: Vec<String>) -> Self {
        Self::InvalidTabData { errors }
    }

    /// Creates an invalid sync data error.
    #[inline]
    pub fn invalid_sync_data(errors: Vec<String>) -> Self {
        Self::InvalidSyncData { errors }
    }

    /// Creates a checksum mismatch error.
    #[inline]
    pub fn checksum_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::ChecksumMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates a version incompatible error.
    #[inline]
    pub fn version_incompatible(remote: impl Into<String>, local: impl Into<String>) -> Self {
        Self::VersionIncompatible {
            remote: remote.into(),
            local: local.into(),
        }
    }

    /// Creates a batch partial failure error.
    #[inline]
    pub fn batch_partial_failure(failed: usize, total: usize) -> Self {
        Self::BatchPartialFailure { failed, total }
    }

    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a collaborator error.
    #[inline]
    pub fn collaborator(message: impl Into<String>) -> Self {
        Self::Collaborator {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Classification
// ============================================================================

impl Error {
    /// Returns the stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::TabSerialization { .. } => ErrorCode::TabSerializationError,
            Self::InvalidTabData { .. } => ErrorCode::InvalidTabData,
            Self::InvalidSyncData { .. } => ErrorCode::InvalidSyncData,
            Self::ChecksumMismatch { .. } => ErrorCode::ChecksumMismatch,
            Self::VersionIncompatible { .. } => ErrorCode::VersionIncompatible,
            Self::BatchPartialFailure { .. } => ErrorCode::BatchPartialFailure,
            Self::Config { .. } => ErrorCode::ConfigError,
            Self::Collaborator { .. } => ErrorCode::CollaboratorError,
            Self::Json(_) => ErrorCode::JsonError,
        }
    }

    /// Returns the taxonomy kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidTabData { .. } | Self::InvalidSyncData { .. } | Self::Json(_) => {
                ErrorKind::StructuralValidation
            }
            Self::TabSerialization { .. } => ErrorKind::RepairableDefect,
            Self::ChecksumMismatch { .. } => ErrorKind::IntegrityFailure,
            Self::VersionIncompatible { .. } => ErrorKind::VersionIncompatible,
            Self::BatchPartialFailure { .. } => ErrorKind::BatchPartialFailure,
            Self::Config { .. } => ErrorKind::Configuration,
            Self::Collaborator { .. } => ErrorKind::External,
        }
    }

    /// Returns the validation errors carried by this error, if any.
    #[must_use]
    pub fn validation_errors(&self) -> &[String] {
        match self {
            Self::TabSerialization { errors, .. }
            | Self::InvalidTabData { errors }
            | Self::InvalidSyncData { errors } => errors,
            _ => &[],
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if the snapshot that produced this error must be
    /// discarded rather than reported for correction.
    #[inline]
    #[must_use]
    pub fn is_fatal_to_snapshot(&self) -> bool {
        matches!(
            self,
            Self::ChecksumMismatch { .. } | Self::VersionIncompatible { .. }
        )
    }

    /// Returns `true` if this is a structural validation error.
    #[inline]
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        self.kind() == ErrorKind::StructuralValidation
    }

    /// Returns `true` if the caller can fix the input and try again.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::StructuralValidation
                | ErrorKind::BatchPartialFailure
                | ErrorKind::Configuration
                | ErrorKind::External
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::invalid_tab_data(vec!["url is required".into(), "id is required".into()]);
        assert_eq!(
            err.to_string(),
            "Invalid tab data: url is required; id is required"
        );
    }

    #[test]
    fn test_serialization_error_display_without_source() {
        let err = Error::tab_serialization(None, vec!["windowId must be a non-negative integer".into()]);
        assert!(err.to_string().contains("tab unknown"));
    }

    #[test]
    fn test_codes() {
        assert_eq!(
            Error::checksum_mismatch("a", "b").code().as_str(),
            "CHECKSUM_MISMATCH"
        );
        assert_eq!(
            Error::version_incompatible("2.0.0", "1.0.0").code().as_str(),
            "VERSION_INCOMPATIBLE"
        );
        assert_eq!(
            Error::tab_serialization(Some(3), vec![]).code().to_string(),
            "TAB_SERIALIZATION_ERROR"
        );
    }

    #[test]
    fn test_code_serializes_as_wire_string() {
        let json = serde_json::to_string(&ErrorCode::InvalidSyncData).unwrap();
        assert_eq!(json, "\"INVALID_SYNC_DATA\"");
    }

    #[test]
    fn test_kinds() {
        assert_eq!(
            Error::checksum_mismatch("a", "b").kind(),
            ErrorKind::IntegrityFailure
        );
        assert_eq!(
            Error::tab_serialization(None, vec![]).kind(),
            ErrorKind::RepairableDefect
        );
        assert_eq!(
            Error::batch_partial_failure(1, 12).kind(),
            ErrorKind::BatchPartialFailure
        );
    }

    #[test]
    fn test_is_fatal_to_snapshot() {
        assert!(Error::checksum_mismatch("a", "b").is_fatal_to_snapshot());
        assert!(Error::version_incompatible("2.0.0", "1.0.0").is_fatal_to_snapshot());
        assert!(!Error::invalid_sync_data(vec![]).is_fatal_to_snapshot());
    }

    #[test]
    fn test_is_recoverable() {
        assert!(Error::invalid_sync_data(vec![]).is_recoverable());
        assert!(!Error::checksum_mismatch("a", "b").is_recoverable());
    }

    #[test]
    fn test_validation_errors_accessor() {
        let err = Error::invalid_sync_data(vec!["tabs must be an array".into()]);
        assert_eq!(err.validation_errors(), ["tabs must be an array"]);
        assert!(Error::config("x").validation_errors().is_empty());
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
        assert!(err.is_validation_error());
    }
}
