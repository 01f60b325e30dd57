//! Type-safe identifiers for sync entities.
//!
//! Newtype wrappers prevent mixing record, snapshot and device ids at
//! compile time. All of them serialize as plain strings.
//!
//! | Type | Format |
//! |------|--------|
//! | [`RecordId`] | `tab_<source>_<timestamp>_<6 random chars>` |
//! | [`SyncId`] | `sync_<timestamp>_<8 random chars>` |
//! | [`DeviceId`] | Opaque, chosen by the device |
//!
//! Generated ids are unique per generation event, never per tab: the same
//! browser tab serialized twice gets two different record ids. Collisions
//! are not checked; the random suffix makes them negligible.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Constants
// ============================================================================

/// Length of the random suffix of a [`RecordId`].
const RECORD_SUFFIX_LEN: usize = 6;

/// Length of the random suffix of a [`SyncId`].
const SYNC_SUFFIX_LEN: usize = 8;

// ============================================================================
// Helpers
// ============================================================================

/// Returns the current time in milliseconds since the Unix epoch.
#[must_use]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}

/// Returns `len` random lowercase hex characters.
fn random_suffix(len: usize) -> String {
    let mut suffix = Uuid::new_v4().simple().to_string();
    suffix.truncate(len);
    suffix
}

// ============================================================================
// Macro
// ============================================================================

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps an existing id string.
            #[inline]
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Returns the id as a string slice.
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns `true` if the id is empty.
            #[inline]
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            #[inline]
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            #[inline]
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl AsRef<str> for $name {
            #[inline]
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// ============================================================================
// Identifiers
// ============================================================================

string_id! {
    /// Identifier of one serialized tab record.
    RecordId
}

string_id! {
    /// Identifier of one sync snapshot.
    SyncId
}

string_id! {
    /// Identifier of the device that produced a record or snapshot.
    DeviceId
}

impl RecordId {
    /// Generates a record id for a tab serialized at `timestamp`.
    ///
    /// `source_id` is the browser's id for the tab; tabs without one are
    /// rendered as `unknown`.
    #[must_use]
    pub fn generate(source_id: Option<i64>, timestamp: u64) -> Self {
        let source = source_id.map_or_else(|| "unknown".to_string(), |id| id.to_string());
        Self(format!(
            "tab_{source}_{timestamp}_{}",
            random_suffix(RECORD_SUFFIX_LEN)
        ))
    }
}

impl SyncId {
    /// Generates a sync id for a snapshot created at `timestamp`.
    #[must_use]
    pub fn generate(timestamp: u64) -> Self {
        Self(format!(
            "sync_{timestamp}_{}",
            random_suffix(SYNC_SUFFIX_LEN)
        ))
    }
}

// ============================================================================
// Tests
// ============================================================================
