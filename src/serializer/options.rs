//! Serialization and restore options.
//!
//! # Example
//!
//! ```
//! use tab_sync::{DeserializeOptions, SerializeOptions};
//!
//! let outbound = SerializeOptions::new()
//!     .with_batch_size(25)
//!     .fail_fast();
//!
//! let inbound = DeserializeOptions::new()
//!     .in_window(4)
//!     .without_index();
//!
//! assert!(outbound.validate().is_ok());
//! assert_eq!(inbound.target_window_id, Some(4));
//! ```

// ============================================================================
// Imports
// ============================================================================

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default number of tabs serialized together.
pub const DEFAULT_BATCH_SIZE: usize = 10;

// ============================================================================
// SerializeOptions
// ============================================================================

/// Options for turning live tabs into records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Attempt page content capture. Capture is not implemented, so records
    /// never carry content.
    pub include_content: bool,

    /// Reserved for history capture; ignored.
    pub include_history: bool,

    /// Strip tracking query parameters from URLs.
    pub sanitize_url: bool,

    /// Number of tabs serialized together.
    pub batch_size: usize,

    /// Record per-tab failures and keep going instead of aborting.
    pub continue_on_error: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl SerializeOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            include_content: false,
            include_history: false,
            sanitize_url: true,
            batch_size: DEFAULT_BATCH_SIZE,
            continue_on_error: true,
        }
    }

    /// Requests page content capture.
    #[inline]
    #[must_use]
    pub fn with_content(mut self) -> Self {
        self.include_content = true;
        self
    }

    /// Requests history capture.
    #[inline]
    #[must_use]
    pub fn with_history(mut self) -> Self {
        self.include_history = true;
        self
    }

    /// Keeps URLs exactly as reported by the browser.
    #[inline]
    #[must_use]
    pub fn without_url_sanitization(mut self) -> Self {
        self.sanitize_url = false;
        self
    }

    /// Sets the batch size.
    #[inline]
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Aborts a batch call on the first failing tab.
    #[inline]
    #[must_use]
    pub fn fail_fast(mut self) -> Self {
        self.continue_on_error = false;
        self
    }

    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the batch size is zero.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::config("Batch size must be greater than zero"));
        }
        Ok(())
    }
}

// ============================================================================
// DeserializeOptions
// ============================================================================

/// Options for turning records back into tab-creation instructions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeserializeOptions {
    /// Keep the record's pinned state.
    pub preserve_pinned: bool,

    /// Keep the record's position.
    pub preserve_index: bool,

    /// Window to restore into. Without one the browser picks.
    pub target_window_id: Option<i64>,

    /// Drop invalid records instead of aborting.
    pub continue_on_error: bool,
}

impl Default for DeserializeOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl DeserializeOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            preserve_pinned: true,
            preserve_index: true,
            target_window_id: None,
            continue_on_error: true,
        }
    }

    /// Restores every tab unpinned.
    #[inline]
    #[must_use]
    pub fn without_pinned(mut self) -> Self {
        self.preserve_pinned = false;
        self
    }

    /// Lets the browser choose positions.
    #[inline]
    #[must_use]
    pub fn without_index(mut self) -> Self {
        self.preserve_index = false;
        self
    }

    /// Restores into a specific window.
    #[inline]
    #[must_use]
    pub fn in_window(mut self, window_id: i64) -> Self {
        self.target_window_id = Some(window_id);
        self
    }

    /// Aborts on the first invalid record.
    #[inline]
    #[must_use]
    pub fn fail_fast(mut self) -> Self {
        self.continue_on_error = false;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
