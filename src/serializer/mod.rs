//! Tab serialization and restore.
//!
//! Maps live browser tabs to [`TabRecord`](crate::schema::TabRecord)s and
//! back, and bundles records into checksummed snapshots.
//!
//! # Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | `core` | `TabSerializer`, builder and the repair pipeline |
//! | `batch` | Batched serialization, restore and batch outcomes |
//! | `snapshot` | Outbound snapshot assembly |
//! | `handle` | Browser-facing tab shapes |
//! | `options` | Serialize and restore options |
//! | `sanitize` | URL and title sanitization |
//!
//! # Example
//!
//! ```
//! use serde_json::Map;
//! use tab_sync::{BrowserTab, DeviceMetadata, SerializeOptions, TabSerializer};
//!
//! # async fn example() -> tab_sync::Result<()> {
//! let serializer = TabSerializer::builder()
//!     .device(
//!         DeviceMetadata::new("device-1", "Laptop")
//!             .with_browser("Firefox", "128.0")
//!             .with_platform("linux"),
//!     )
//!     .build()?;
//!
//! let tabs = vec![
//!     BrowserTab::new(1, "https://example.com").with_position(1, 0),
//!     BrowserTab::new(2, "https://example.org").with_position(1, 1),
//! ];
//!
//! let outcome = serializer.serialize_tabs(&tabs, &SerializeOptions::new()).await?;
//! let snapshot = serializer.create_sync_snapshot(outcome.ensure_complete()?, Map::new())?;
//! assert_eq!(snapshot.metadata.tab_count, Some(2));
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

mod batch;
mod core;
mod handle;
mod options;
mod sanitize;
mod snapshot;

// ============================================================================
// Re-exports
// ============================================================================

pub use batch::{BatchFailure, BatchOutcome, deserialize_tab, deserialize_tabs};
pub use self::core::{TabSerializer, TabSerializerBuilder};
pub use handle::{BrowserTab, MutedInfo, TabCreateParams};
pub use options::{DEFAULT_BATCH_SIZE, DeserializeOptions, SerializeOptions};
pub use sanitize::{
    BLANK_URL, DEFAULT_TITLE, MAX_TITLE_CHARS, is_tracking_param, sanitize_title, sanitize_url,
    url_parts,
};
