//! Tab Sync - Data layer for synchronizing browser tabs across devices.
//!
//! This library defines the canonical tab and snapshot model, the rules
//! that validate and sanitize it, and the integrity envelope that lets two
//! devices exchange snapshots safely.
//!
//! # Architecture
//!
//! Data flows one way for each direction of a sync:
//!
//! - **Outbound**: live tabs → [`TabSerializer`] → records → checksummed
//!   [`SyncSnapshot`] → transport
//! - **Inbound**: untrusted JSON → [`SnapshotGate`] → records →
//!   [`TabCreateParams`] → browser
//!
//! Key design principles:
//!
//! - The producing device is configuration passed to the serializer, never
//!   ambient state
//! - Locally produced records get one repair attempt; remote data is never
//!   repaired
//! - Checksum and version checks live in one trust-boundary gate
//! - Every error carries a stable [`ErrorCode`]
//!
//! # Quick Start
//!
//! ```
//! use serde_json::Map;
//! use tab_sync::{
//!     BrowserTab, DeserializeOptions, DeviceMetadata, SerializeOptions, SnapshotGate,
//!     TabSerializer, deserialize_tabs,
//! };
//!
//! # async fn example() -> tab_sync::Result<()> {
//! let serializer = TabSerializer::builder()
//!     .device(
//!         DeviceMetadata::new("laptop-1", "Laptop")
//!             .with_browser("Firefox", "128.0")
//!             .with_platform("linux"),
//!     )
//!     .build()?;
//!
//! // Outbound
//! let tabs = vec![BrowserTab::new(1, "https://example.com/?utm_source=mail").with_title("Example")];
//! let records = serializer
//!     .serialize_tabs(&tabs, &SerializeOptions::new())
//!     .await?
//!     .into_items();
//! let snapshot = serializer.create_sync_snapshot(records, Map::new())?;
//! let wire = serde_json::to_value(&snapshot)?;
//!
//! // Inbound, on another device
//! let accepted = SnapshotGate::new().accept(&wire)?;
//! let restored = deserialize_tabs(&accepted.tabs, &DeserializeOptions::new())?;
//! assert_eq!(restored.items[0].url, "https://example.com/");
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`schema`] | Typed entities, validators and wire versions |
//! | [`serializer`] | Live tab ↔ record mapping and snapshot assembly |
//! | [`envelope`] | Checksums and the inbound snapshot gate |
//! | [`conflict`] | Conflict detection between tab sets |
//! | [`pipeline`] | Outbound and inbound flows over browser collaborators |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |

// ============================================================================
// Modules
// ============================================================================

/// Conflict detection between a local and a remote tab set.
pub mod conflict;

/// Snapshot integrity envelope.
///
/// Outbound checksums and the trust-boundary gate for inbound snapshots.
pub mod envelope;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for records, snapshots and devices.
pub mod identifiers;

/// Sync flows over browser collaborators.
pub mod pipeline;

/// Sync data model and validation rules.
pub mod schema;

/// Tab serialization and restore.
///
/// Use [`TabSerializer::builder()`] to create a configured serializer.
pub mod serializer;

// ============================================================================
// Re-exports
// ============================================================================

// Conflict detection
pub use conflict::detect_conflicts;

// Envelope
pub use envelope::{SnapshotGate, accept_snapshot, compute_checksum, verify_checksum};

// Error types
pub use error::{Error, ErrorCode, ErrorKind, Result};

// Identifier types
pub use identifiers::{DeviceId, RecordId, SyncId};

// Pipeline
pub use pipeline::{InboundSync, OutboundSync, SyncPipeline, TabSink, TabSource};

// Schema types
pub use schema::{
    AuthProvider, AuthTokens, ConflictItem, ConflictKind, ConflictSet, DeviceMetadata,
    ResolutionStrategy, SYNC_FORMAT_VERSION, SnapshotMetadata, SyncSnapshot, TabMetadata,
    TabRecord, ValidationResult, WireVersion,
};

// Serializer types
pub use serializer::{
    BatchFailure, BatchOutcome, BrowserTab, DeserializeOptions, SerializeOptions,
    TabCreateParams, TabSerializer, TabSerializerBuilder, deserialize_tab, deserialize_tabs,
};
