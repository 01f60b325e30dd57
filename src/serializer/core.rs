//! Core serializer: live tab to validated record.
//!
//! A freshly built record goes through a two-state pipeline:
//!
//! ```text
//! Raw ──validate──▶ ok ─────────────────────────▶ record
//!  │
//!  └─ invalid ─▶ repair ─▶ Repaired ──validate──▶ ok ─▶ record
//!                                       │
//!                                       └─ invalid ─▶ TAB_SERIALIZATION_ERROR
//! ```
//!
//! Repair runs at most once and only ever on locally produced records.

// ============================================================================
// Imports
// ============================================================================

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::identifiers::{DeviceId, RecordId, now_millis};
use crate::schema::{
    DeviceMetadata, SERIALIZER_VERSION, SYNC_FORMAT_VERSION, TabMetadata, TabRecord, WireVersion,
};

use super::handle::BrowserTab;
use super::options::SerializeOptions;
use super::sanitize::{BLANK_URL, DEFAULT_TITLE, sanitize_title, sanitize_url, url_parts};

// ============================================================================
// RecordState
// ============================================================================

/// Position of a record in the repair pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordState {
    /// As built from the live tab.
    Raw,
    /// After the single repair pass.
    Repaired,
}

// ============================================================================
// TabSerializer
// ============================================================================

/// Converts live tabs into records and records into snapshots.
///
/// The producing device is fixed at construction; nothing is looked up
/// from ambient state.
///
/// # Example
///
/// ```
/// use tab_sync::{BrowserTab, DeviceMetadata, SerializeOptions, TabSerializer};
///
/// # async fn example() -> tab_sync::Result<()> {
/// let serializer = TabSerializer::builder()
///     .device(
///         DeviceMetadata::new("device-1", "Laptop")
///             .with_browser("Firefox", "128.0")
///             .with_platform("linux"),
///     )
///     .build()?;
///
/// let tab = BrowserTab::new(3, "https://example.com/?utm_source=feed").with_title("Example");
/// let record = serializer.serialize_tab(&tab, &SerializeOptions::new()).await?;
/// assert_eq!(record.url, "https://example.com/");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TabSerializer {
    /// Producing device.
    device: DeviceMetadata,
    /// Wire-format version stamped on snapshots.
    version: String,
}

impl TabSerializer {
    /// Creates a builder.
    #[inline]
    #[must_use]
    pub fn builder() -> TabSerializerBuilder {
        TabSerializerBuilder::new()
    }

    /// Returns the producing device.
    #[inline]
    #[must_use]
    pub fn device(&self) -> &DeviceMetadata {
        &self.device
    }

    /// Returns the producing device id.
    #[inline]
    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        &self.device.device_id
    }

    /// Returns the wire-format version stamped on snapshots.
    #[inline]
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }
}

// ============================================================================
// TabSerializer - Serialization
// ============================================================================

impl TabSerializer {
    /// Serializes one live tab.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TabSerialization`] if the record is still invalid
    /// after the repair pass.
    pub async fn serialize_tab(
        &self,
        tab: &BrowserTab,
        options: &SerializeOptions,
    ) -> Result<TabRecord> {
        let timestamp = now_millis();

        let raw_url = tab.url.as_deref().unwrap_or_default();
        let url = if options.sanitize_url {
            sanitize_url(raw_url)
        } else {
            raw_url.to_string()
        };

        let content = if options.include_content {
            self.capture_content(tab).await
        } else {
            None
        };
        if options.include_history {
            debug!(tab_id = ?tab.id, "History capture not supported, ignoring");
        }

        let record = TabRecord {
            id: RecordId::generate(tab.id, timestamp),
            metadata: Some(self.tab_metadata(tab, &url)),
            url,
            title: sanitize_title(tab.title.as_deref()),
            favicon: tab.fav_icon_url.clone(),
            window_id: tab.window_id,
            index: tab.index,
            timestamp,
            device_id: self.device.device_id.clone(),
            pinned: Some(tab.pinned),
            active: Some(tab.active),
            content,
        };

        self.finalize(record, tab.id)
    }

    /// Captures page content.
    ///
    /// Content capture has no implementation; this always yields `None`.
    async fn capture_content(&self, tab: &BrowserTab) -> Option<String> {
        debug!(tab_id = ?tab.id, "Content capture not available");
        None
    }

    /// Builds the derived metadata for a tab at `url`.
    fn tab_metadata(&self, tab: &BrowserTab, url: &str) -> TabMetadata {
        let (domain, protocol) = url_parts(url);
        TabMetadata {
            domain,
            protocol,
            is_loading: tab.is_loading(),
            is_incognito: tab.incognito,
            is_audible: tab.audible.unwrap_or(false),
            is_muted: tab.is_muted(),
            serializer_version: SERIALIZER_VERSION.to_string(),
        }
    }
}

// ============================================================================
// TabSerializer - Repair
// ============================================================================

impl TabSerializer {
    /// Validates a record, repairing it once if needed.
    fn finalize(&self, mut record: TabRecord, source_id: Option<i64>) -> Result<TabRecord> {
        let mut state = RecordState::Raw;

        loop {
            let report = record.validate();
            if report.is_valid {
                if state == RecordState::Repaired {
                    debug!(source_id = ?source_id, record_id = %record.id, "Tab record repaired");
                }
                return Ok(record);
            }

            match state {
                RecordState::Raw => {
                    debug!(
                        source_id = ?source_id,
                        errors = ?report.errors,
                        "Tab record invalid, attempting repair"
                    );
                    record = self.repair(record);
                    state = RecordState::Repaired;
                }
                RecordState::Repaired => {
                    warn!(
                        source_id = ?source_id,
                        errors = ?report.errors,
                        "Tab record still invalid after repair"
                    );
                    return Err(Error::tab_serialization(source_id, report.errors));
                }
            }
        }
    }

    /// Fills missing fields with fallbacks.
    ///
    /// Only fields that are missing are touched; present-but-wrong values
    /// are left for the second validation to reject.
    fn repair(&self, mut record: TabRecord) -> TabRecord {
        if record.url.trim().is_empty() {
            record.url = BLANK_URL.to_string();
            let (domain, protocol) = url_parts(BLANK_URL);
            if let Some(metadata) = record.metadata.as_mut() {
                metadata.domain = domain;
                metadata.protocol = protocol;
            }
        }
        if record.title.trim().is_empty() {
            record.title = DEFAULT_TITLE.to_string();
        }
        if record.timestamp == 0 {
            record.timestamp = now_millis();
        }
        if record.device_id.as_str().trim().is_empty() {
            record.device_id = self.device.device_id.clone();
        }
        record
    }
}

// ============================================================================
// TabSerializerBuilder
// ============================================================================

/// Builder for a [`TabSerializer`].
#[derive(Debug, Default, Clone)]
pub struct TabSerializerBuilder {
    /// Producing device.
    device: Option<DeviceMetadata>,
    /// Wire-format version override.
    version: Option<String>,
}

impl TabSerializerBuilder {
    /// Creates an empty builder.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the producing device.
    #[inline]
    #[must_use]
    pub fn device(mut self, device: DeviceMetadata) -> Self {
        self.device = Some(device);
        self
    }

    /// Overrides the wire-format version stamped on snapshots.
    #[inline]
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Builds the serializer.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if no device was set
    /// - [`Error::Config`] if the device metadata is invalid
    /// - [`Error::Config`] if the version is not `MAJOR.MINOR.PATCH`
    pub fn build(self) -> Result<TabSerializer> {
        let device = self.validate_device()?;
        let version = self.validate_version()?;
        Ok(TabSerializer { device, version })
    }

    fn validate_device(&self) -> Result<DeviceMetadata> {
        let device = self.device.clone().ok_or_else(|| {
            Error::config(
                "Device metadata is required. Use .device() to set it.\n\
                 Example: TabSerializer::builder().device(DeviceMetadata::new(\"id\", \"name\"))",
            )
        })?;

        let report = device.validate();
        if !report.is_valid {
            return Err(Error::config(format!(
                "Invalid device metadata: {}",
                report.errors.join("; ")
            )));
        }

        Ok(device)
    }

    fn validate_version(&self) -> Result<String> {
        let version = self
            .version
            .clone()
            .unwrap_or_else(|| SYNC_FORMAT_VERSION.to_string());

        if WireVersion::parse(&version).is_none() {
            return Err(Error::config(format!(
                "Version must be MAJOR.MINOR.PATCH, got {version:?}"
            )));
        }

        Ok(version)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::ErrorCode;

    fn device() -> DeviceMetadata {
        DeviceMetadata::new("device-a", "Laptop")
            .with_browser("Firefox", "128.0")
            .with_platform("linux")
    }

    fn serializer() -> TabSerializer {
        TabSerializer::builder().device(device()).build().unwrap()
    }

    // ------------------------------------------------------------------------
    // Builder
    // ------------------------------------------------------------------------

    #[test]
    fn test_build_requires_device() {
        let err = TabSerializer::builder().build().unwrap_err();
        assert_eq!(err.code(), ErrorCode::ConfigError);
        assert!(err.to_string().contains("Device metadata is required"));
    }

    #[test]
    fn test_build_rejects_incomplete_device() {
        let err = TabSerializer::builder()
            .device(DeviceMetadata::new("device-a", "Laptop"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("browserName"));
    }

    #[test]
    fn test_build_rejects_bad_version() {
        let err = TabSerializer::builder()
            .device(device())
            .version("1.0")
            .build()
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ConfigError);
    }

    #[test]
    fn test_build_defaults_version() {
        let serializer = serializer();
        assert_eq!(serializer.version(), SYNC_FORMAT_VERSION);
        assert_eq!(serializer.device_id().as_str(), "device-a");
    }

    // ------------------------------------------------------------------------
    // serialize_tab
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_serialize_full_tab() {
        let tab = BrowserTab::new(5, "https://mail.example.com/inbox?utm_source=x&folder=a")
            .with_title("  Inbox  ")
            .with_position(2, 3)
            .with_favicon("https://mail.example.com/favicon.ico")
            .with_status("loading")
            .pinned()
            .active()
            .audible()
            .muted();

        let record = serializer()
            .serialize_tab(&tab, &SerializeOptions::new())
            .await
            .unwrap();

        assert!(record.id.as_str().starts_with("tab_5_"));
        assert_eq!(record.url, "https://mail.example.com/inbox?folder=a");
        assert_eq!(record.title, "Inbox");
        assert_eq!(record.window_id, 2);
        assert_eq!(record.index, 3);
        assert_eq!(record.device_id.as_str(), "device-a");
        assert_eq!(record.pinned, Some(true));
        assert_eq!(record.active, Some(true));
        assert!(record.timestamp > 0);
        assert!(record.content.is_none());

        let metadata = record.metadata.unwrap();
        assert_eq!(metadata.domain, "mail.example.com");
        assert_eq!(metadata.protocol, "https:");
        assert!(metadata.is_loading);
        assert!(metadata.is_audible);
        assert!(metadata.is_muted);
        assert!(!metadata.is_incognito);
        assert_eq!(metadata.serializer_version, SERIALIZER_VERSION);
    }

    #[tokio::test]
    async fn test_serialize_empty_title_becomes_untitled() {
        let tab = BrowserTab::new(1, "https://example.com").with_title("");
        let record = serializer()
            .serialize_tab(&tab, &SerializeOptions::new())
            .await
            .unwrap();
        assert_eq!(record.title, "Untitled");
    }

    #[tokio::test]
    async fn test_serialize_without_sanitization() {
        let raw = "https://example.com/?utm_source=x";
        let tab = BrowserTab::new(1, raw);
        let options = SerializeOptions::new().without_url_sanitization();
        let record = serializer().serialize_tab(&tab, &options).await.unwrap();
        assert_eq!(record.url, raw);
    }

    #[tokio::test]
    async fn test_serialize_repairs_missing_url() {
        let tab = BrowserTab {
            id: Some(9),
            ..BrowserTab::default()
        };
        let record = serializer()
            .serialize_tab(&tab, &SerializeOptions::new())
            .await
            .unwrap();
        assert_eq!(record.url, "about:blank");
        assert_eq!(record.metadata.unwrap().protocol, "about:");
    }

    #[tokio::test]
    async fn test_serialize_rejects_unrepairable_tab() {
        let tab = BrowserTab::new(4, "https://example.com").with_position(-1, 0);
        let err = serializer()
            .serialize_tab(&tab, &SerializeOptions::new())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::TabSerializationError);
        assert_eq!(
            err.validation_errors(),
            ["windowId must be a non-negative integer"]
        );
    }

    #[tokio::test]
    async fn test_serialize_rejects_malformed_url() {
        let tab = BrowserTab::new(4, "definitely not a url");
        let err = serializer()
            .serialize_tab(&tab, &SerializeOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::TabSerialization { source_id: Some(4), .. }));
    }

    #[tokio::test]
    async fn test_serialize_content_is_never_captured() {
        let tab = BrowserTab::new(1, "https://example.com");
        let options = SerializeOptions::new().with_content().with_history();
        let record = serializer().serialize_tab(&tab, &options).await.unwrap();
        assert!(record.content.is_none());
    }

    #[tokio::test]
    async fn test_serialize_ids_are_fresh() {
        let serializer = serializer();
        let tab = BrowserTab::new(1, "https://example.com");
        let options = SerializeOptions::new();
        let a = serializer.serialize_tab(&tab, &options).await.unwrap();
        let b = serializer.serialize_tab(&tab, &options).await.unwrap();
        assert_ne!(a.id, b.id);
    }

    // ------------------------------------------------------------------------
    // repair
    // ------------------------------------------------------------------------

    #[test]
    fn test_repair_fills_missing_fields_only() {
        let serializer = serializer();
        let record = TabRecord {
            id: RecordId::new("tab_1_1_abcdef"),
            url: String::new(),
            title: " ".into(),
            favicon: None,
            window_id: -3,
            index: 0,
            timestamp: 0,
            device_id: DeviceId::new(""),
            pinned: None,
            active: None,
            content: None,
            metadata: None,
        };

        let repaired = serializer.repair(record);
        assert_eq!(repaired.url, "about:blank");
        assert_eq!(repaired.title, "Untitled");
        assert!(repaired.timestamp > 0);
        assert_eq!(repaired.device_id.as_str(), "device-a");
        assert_eq!(repaired.window_id, -3);
    }
}
