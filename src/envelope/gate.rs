//! Trust-boundary gate for inbound snapshots.
//!
//! An inbound snapshot is trusted only after three checks, in order:
//!
//! 1. Structure: the validator's errors are returned verbatim. Remote data
//!    is never repaired.
//! 2. Integrity: a carried checksum must match the one recomputed over the
//!    snapshot's own tabs and metadata.
//! 3. Version: the major version must equal the local one. Minor and patch
//!    drift are accepted silently.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::schema::{SYNC_FORMAT_VERSION, SyncSnapshot, WireVersion, validate_sync_snapshot};

use super::checksum::verify_checksum;

// ============================================================================
// SnapshotGate
// ============================================================================

/// Accepts or rejects inbound snapshots.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use tab_sync::{ErrorCode, SnapshotGate};
///
/// let gate = SnapshotGate::new();
/// let err = gate.accept(&json!({ "version": "1.0.0" })).unwrap_err();
/// assert_eq!(err.code(), ErrorCode::InvalidSyncData);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotGate {
    /// Local wire-format version.
    local_version: WireVersion,
}

impl Default for SnapshotGate {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotGate {
    /// Creates a gate for this crate's wire-format version.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            local_version: WireVersion::current(),
        }
    }

    /// Creates a gate for a specific local version.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `version` is not a semantic version.
    pub fn with_version(version: &str) -> Result<Self> {
        let local_version = WireVersion::parse(version).ok_or_else(|| {
            Error::config(format!(
                "Local version must be MAJOR.MINOR.PATCH, got {version:?}"
            ))
        })?;
        Ok(Self { local_version })
    }

    /// Returns the local version.
    #[inline]
    #[must_use]
    pub fn local_version(&self) -> WireVersion {
        self.local_version
    }

    /// Accepts a raw inbound snapshot.
    ///
    /// Returns the snapshot unchanged, decoded into its typed form. Any
    /// snapshot that validates also decodes: optional fields the validator
    /// only warns about read as absent, and integral floats read as integers.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidSyncData`] if the structure is invalid
    /// - [`Error::ChecksumMismatch`] if the checksum does not match
    /// - [`Error::VersionIncompatible`] if the major version differs
    pub fn accept(&self, snapshot: &Value) -> Result<SyncSnapshot> {
        let report = validate_sync_snapshot(snapshot);
        if !report.is_valid {
            warn!(
                errors = report.errors.len(),
                "Rejecting structurally invalid snapshot"
            );
            return Err(Error::invalid_sync_data(report.errors));
        }
        for warning in &report.warnings {
            debug!(%warning, "Snapshot validation warning");
        }

        if let Err(e) = verify_checksum(snapshot) {
            warn!(error = %e, "Rejecting snapshot with bad checksum");
            return Err(e);
        }

        let remote = snapshot
            .get("version")
            .and_then(Value::as_str)
            .unwrap_or_default();
        self.check_version(remote)?;

        let decoded: SyncSnapshot = serde_json::from_value(snapshot.clone()).map_err(|e| {
            Error::invalid_sync_data(vec![format!("snapshot could not be decoded: {e}")])
        })?;

        info!(
            device_id = %decoded.device_id,
            tabs = decoded.tabs.len(),
            version = %decoded.version,
            "Snapshot accepted"
        );
        Ok(decoded)
    }

    /// Parses and accepts a JSON-encoded snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if `json` is not JSON, otherwise as
    /// [`accept`](Self::accept).
    pub fn accept_str(&self, json: &str) -> Result<SyncSnapshot> {
        let value: Value = serde_json::from_str(json)?;
        self.accept(&value)
    }

    /// Checks a remote version string against the local version.
    fn check_version(&self, remote: &str) -> Result<()> {
        let compatible = WireVersion::parse(remote)
            .is_some_and(|version| self.local_version.is_compatible_with(&version));

        if compatible {
            Ok(())
        } else {
            warn!(
                remote = %remote,
                local = %self.local_version,
                "Rejecting snapshot from incompatible version"
            );
            Err(Error::version_incompatible(
                remote,
                self.local_version.to_string(),
            ))
        }
    }
}

/// Accepts a raw inbound snapshot at this crate's wire-format version.
///
/// Shorthand for `SnapshotGate::new().accept(snapshot)`; the local version
/// is [`SYNC_FORMAT_VERSION`].
///
/// # Errors
///
/// See [`SnapshotGate::accept`].
pub fn accept_snapshot(snapshot: &Value) -> Result<SyncSnapshot> {
    SnapshotGate::new().accept(snapshot)
}

// ============================================================================
// Tests
// ============================================================================
