//! Sync data model and its validation rules.
//!
//! | Module | Description |
//! |--------|-------------|
//! | `record` | Typed entities: tabs, devices, snapshots, conflicts, tokens |
//! | `validation` | Structural validators over untrusted JSON |
//! | `version` | Wire-format version parsing |
//! | `lenient` | Serde readers that accept what the validators accept |
//!
//! The validators depend on nothing else in the crate; both the serializer
//! and the snapshot gate call into them.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use tab_sync::schema::validate_tab_array;
//!
//! let tab = |url: &str| json!({
//!     "id": "tab_1_1700000000000_abc123",
//!     "url": url,
//!     "title": "Example",
//!     "windowId": 1,
//!     "index": 0,
//!     "timestamp": 1_700_000_000_000_u64,
//!     "deviceId": "device-a",
//! });
//!
//! let result = validate_tab_array(&json!([tab("https://a.com"), tab("https://a.com")]));
//! assert!(result.is_valid);
//! assert_eq!(result.warnings, ["Duplicate URL at index 1: https://a.com"]);
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Lenient serde field readers.
mod lenient;

/// Typed sync entities.
pub mod record;

/// Structural validators.
pub mod validation;

/// Wire-format versions.
pub mod version;

// ============================================================================
// Re-exports
// ============================================================================

pub use record::{
    AuthProvider, AuthTokens, ConflictItem, ConflictKind, ConflictSet, DeviceMetadata,
    ResolutionStrategy, SnapshotMetadata, SyncSnapshot, TabMetadata, TabRecord,
};
pub use validation::{
    ValidationResult, validate_auth_tokens, validate_auth_tokens_at, validate_conflict_item,
    validate_device_metadata, validate_sync_snapshot, validate_tab_array, validate_tab_record,
};
pub use version::{SERIALIZER_VERSION, SYNC_FORMAT_VERSION, WireVersion};
