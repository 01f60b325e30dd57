//! Typed sync entities.
//!
//! These are the canonical, immutable values exchanged between devices.
//! None of them holds a live browser resource: a [`TabRecord`] is a
//! snapshot of a tab, not a handle to it.
//!
//! Wire names are camelCase. Optional fields are omitted when absent so a
//! record read from the wire serializes back to the same shape.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::identifiers::{DeviceId, RecordId, SyncId, now_millis};

use super::lenient;
use super::validation::{
    ValidationResult, validate_auth_tokens_at, validate_conflict_item, validate_device_metadata,
    validate_sync_snapshot, validate_tab_record,
};

// ============================================================================
// Helpers
// ============================================================================

/// Runs a JSON validator over a typed value.
fn validate_typed<T: Serialize>(
    value: &T,
    validator: impl FnOnce(&Value) -> ValidationResult,
) -> ValidationResult {
    match serde_json::to_value(value) {
        Ok(json) => validator(&json),
        Err(e) => ValidationResult::invalid(format!("value could not be encoded: {e}")),
    }
}

// ============================================================================
// TabMetadata
// ============================================================================

/// Derived tab state captured at serialization time.
///
/// Missing fields read as their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TabMetadata {
    /// Host of the tab URL, empty if the URL has none.
    pub domain: String,
    /// URL scheme with trailing colon (e.g. `https:`).
    pub protocol: String,
    /// Whether the tab was still loading.
    pub is_loading: bool,
    /// Whether the tab belonged to a private window.
    pub is_incognito: bool,
    /// Whether the tab was playing sound.
    pub is_audible: bool,
    /// Whether the tab was muted.
    pub is_muted: bool,
    /// Serializer version that produced the record.
    pub serializer_version: String,
}

// ============================================================================
// TabRecord
// ============================================================================

/// One browser tab at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabRecord {
    /// Unique per serialization event.
    pub id: RecordId,
    /// Tab URL.
    pub url: String,
    /// Tab title, at most 200 characters.
    pub title: String,
    /// Favicon URL.
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub favicon: Option<String>,
    /// Browser window id.
    #[serde(deserialize_with = "lenient::integer")]
    pub window_id: i64,
    /// Position within the window.
    #[serde(deserialize_with = "lenient::integer")]
    pub index: i64,
    /// Serialization time in milliseconds since the epoch.
    #[serde(deserialize_with = "lenient::integer")]
    pub timestamp: u64,
    /// Device that produced the record.
    pub device_id: DeviceId,
    /// Whether the tab was pinned.
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub pinned: Option<bool>,
    /// Whether the tab was active.
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub active: Option<bool>,
    /// Captured page content. Capture is not implemented; always absent.
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub content: Option<String>,
    /// Derived state. Unreadable metadata reads as absent.
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub metadata: Option<TabMetadata>,
}

impl TabRecord {
    /// Validates the record.
    #[must_use]
    pub fn validate(&self) -> ValidationResult {
        validate_typed(self, validate_tab_record)
    }

    /// Returns `true` if the record is pinned.
    #[inline]
    #[must_use]
    pub fn is_pinned(&self) -> bool {
        self.pinned.unwrap_or(false)
    }
}

// ============================================================================
// DeviceMetadata
// ============================================================================

/// Describes the device that produces records and snapshots.
///
/// # Example
///
/// ```
/// use tab_sync::DeviceMetadata;
///
/// let device = DeviceMetadata::new("device-1", "Work laptop")
///     .with_browser("Firefox", "128.0")
///     .with_platform("linux");
///
/// assert!(device.validate().is_valid);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceMetadata {
    /// Device identifier.
    pub device_id: DeviceId,
    /// Human-readable device name.
    pub device_name: String,
    /// Browser product name.
    pub browser_name: String,
    /// Browser version.
    pub browser_version: String,
    /// Operating system platform.
    pub platform: String,
    /// Last time the device synced, in milliseconds since the epoch.
    #[serde(deserialize_with = "lenient::integer")]
    pub last_seen: u64,
}

impl DeviceMetadata {
    /// Creates device metadata seen now. Browser and platform start empty.
    #[must_use]
    pub fn new(device_id: impl Into<DeviceId>, device_name: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            device_name: device_name.into(),
            browser_name: String::new(),
            browser_version: String::new(),
            platform: String::new(),
            last_seen: now_millis(),
        }
    }

    /// Sets the browser name and version.
    #[inline]
    #[must_use]
    pub fn with_browser(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.browser_name = name.into();
        self.browser_version = version.into();
        self
    }

    /// Sets the platform.
    #[inline]
    #[must_use]
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    /// Returns a copy with `last_seen` refreshed to `at`.
    #[inline]
    #[must_use]
    pub fn seen_at(&self, at: u64) -> Self {
        Self {
            last_seen: at,
            ..self.clone()
        }
    }

    /// Validates the metadata.
    #[must_use]
    pub fn validate(&self) -> ValidationResult {
        validate_typed(self, validate_device_metadata)
    }
}

// ============================================================================
// SnapshotMetadata
// ============================================================================

/// Device metadata merged with per-snapshot fields and caller extras.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMetadata {
    /// Producing device.
    #[serde(flatten)]
    pub device: DeviceMetadata,
    /// Number of tabs in the snapshot.
    #[serde(
        default,
        deserialize_with = "lenient::optional_integer",
        skip_serializing_if = "Option::is_none"
    )]
    pub tab_count: Option<usize>,
    /// Snapshot identifier.
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub sync_id: Option<SyncId>,
    /// Caller-supplied fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SnapshotMetadata {
    /// Wire names owned by the metadata itself; extras may not shadow them.
    pub const RESERVED_KEYS: [&'static str; 8] = [
        "deviceId",
        "deviceName",
        "browserName",
        "browserVersion",
        "platform",
        "lastSeen",
        "tabCount",
        "syncId",
    ];
}

// ============================================================================
// SyncSnapshot
// ============================================================================

/// A transmissible, versioned bundle of one device's tabs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSnapshot {
    /// Wire-format version (`MAJOR.MINOR.PATCH`).
    pub version: String,
    /// Producing device.
    pub device_id: DeviceId,
    /// Creation time in milliseconds since the epoch.
    #[serde(deserialize_with = "lenient::integer")]
    pub timestamp: u64,
    /// Tab records.
    pub tabs: Vec<TabRecord>,
    /// Device and snapshot metadata.
    pub metadata: SnapshotMetadata,
    /// Integrity hash over `{tabs, metadata}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl SyncSnapshot {
    /// Validates the snapshot structure. Does not verify the checksum.
    #[must_use]
    pub fn validate(&self) -> ValidationResult {
        validate_typed(self, validate_sync_snapshot)
    }

    /// Returns the snapshot id, if stamped.
    #[inline]
    #[must_use]
    pub fn sync_id(&self) -> Option<&SyncId> {
        self.metadata.sync_id.as_ref()
    }
}

// ============================================================================
// Conflicts
// ============================================================================

/// Kind of disagreement between a local and a remote tab set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictKind {
    /// Same tab open on both sides.
    Duplicate,
    /// Same URL with differing tab state.
    Modified,
    /// Present locally, absent remotely.
    Deleted,
    /// Remote layout violates browser tab ordering.
    Structural,
}

impl ConflictKind {
    /// Returns the wire name.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Duplicate => "duplicate",
            Self::Modified => "modified",
            Self::Deleted => "deleted",
            Self::Structural => "structural",
        }
    }
}

/// One detected conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictItem {
    /// Conflict kind.
    #[serde(rename = "type")]
    pub kind: ConflictKind,
    /// Local side, if involved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_tab: Option<TabRecord>,
    /// Remote side, if involved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_tab: Option<TabRecord>,
    /// Human-readable explanation.
    pub reason: String,
    /// 1 (informational) to 3 (blocking).
    pub severity: u8,
}

impl ConflictItem {
    /// Validates the conflict item.
    #[must_use]
    pub fn validate(&self) -> ValidationResult {
        validate_typed(self, validate_conflict_item)
    }
}

/// Label for how a conflict set is meant to be resolved.
///
/// The label is informational; nothing in this crate resolves conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionStrategy {
    /// A person decides.
    #[default]
    Manual,
    /// Prefer the local tab set.
    KeepLocal,
    /// Prefer the remote tab set.
    KeepRemote,
    /// Union both sets.
    Merge,
}

/// Local and remote tab sets together with their detected conflicts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictSet {
    /// Local tabs.
    pub local_tabs: Vec<TabRecord>,
    /// Remote tabs.
    pub remote_tabs: Vec<TabRecord>,
    /// Detected conflicts.
    pub conflicts: Vec<ConflictItem>,
    /// Detection time in milliseconds since the epoch.
    pub timestamp: u64,
    /// Resolution label.
    pub resolution_strategy: ResolutionStrategy,
}

impl ConflictSet {
    /// Returns `true` if no conflicts were detected.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Returns the highest severity present, if any.
    #[must_use]
    pub fn max_severity(&self) -> Option<u8> {
        self.conflicts.iter().map(|c| c.severity).max()
    }

    /// Returns the conflicts of one kind.
    pub fn of_kind(&self, kind: ConflictKind) -> impl Iterator<Item = &ConflictItem> {
        self.conflicts.iter().filter(move |c| c.kind == kind)
    }
}

// ============================================================================
// AuthTokens
// ============================================================================

/// Cloud identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    /// Google Drive.
    Google,
    /// GitHub.
    #[serde(rename = "github")]
    GitHub,
}

/// Tokens obtained from a provider. Only their shape is checked here.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    /// Access token.
    pub access_token: String,
    /// Refresh token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Expiry in milliseconds since the epoch.
    pub expires_at: u64,
    /// Granted scopes.
    pub scopes: Vec<String>,
    /// Issuing provider.
    pub provider: AuthProvider,
}

impl std::fmt::Debug for AuthTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthTokens")
            .field("expires_at", &self.expires_at)
            .field("scopes", &self.scopes)
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}

impl AuthTokens {
    /// Returns `true` if the tokens expired before `now`.
    #[inline]
    #[must_use]
    pub fn is_expired_at(&self, now: u64) -> bool {
        self.expires_at < now
    }

    /// Returns `true` if the tokens have expired.
    #[inline]
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now_millis())
    }

    /// Validates the tokens against `now`.
    #[must_use]
    pub fn validate_at(&self, now: u64) -> ValidationResult {
        validate_typed(self, |json| validate_auth_tokens_at(json, now))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn record() -> TabRecord {
        TabRecord {
            id: RecordId::new("tab_1_1000_abcdef"),
            url: "https://example.com/".into(),
            title: "Example".into(),
            favicon: None,
            window_id: 1,
            index: 0,
            timestamp: 1000,
            device_id: DeviceId::new("device-a"),
            pinned: Some(true),
            active: None,
            content: None,
            metadata: None,
        }
    }

    fn device() -> DeviceMetadata {
        DeviceMetadata::new("device-a", "Laptop")
            .with_browser("Firefox", "128.0")
            .with_platform("linux")
    }

    #[test]
    fn test_tab_record_wire_names() {
        let json = serde_json::to_value(record()).unwrap();
        assert_eq!(json["windowId"], 1);
        assert_eq!(json["deviceId"], "device-a");
        assert!(json.get("favicon").is_none());
        assert!(json.get("active").is_none());
    }

    #[test]
    fn test_tab_record_validate() {
        assert!(record().validate().is_valid);
        let mut bad = record();
        bad.window_id = -1;
        assert!(!bad.validate().is_valid);
    }

    #[test]
    fn test_tab_record_reads_what_validation_accepts() {
        let json = json!({
            "id": "tab_1_1000_abcdef",
            "url": "https://example.com/",
            "title": "Example",
            "windowId": 2.0,
            "index": 3,
            "timestamp": 1000,
            "deviceId": "device-a",
            "favicon": 12,
            "pinned": "yes",
            "active": null,
            "metadata": { "domain": "example.com" },
        });
        assert!(validate_tab_record(&json).is_valid);

        let record: TabRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.window_id, 2);
        assert_eq!(record.favicon, None);
        assert_eq!(record.pinned, None);
        assert_eq!(record.active, None);
        let metadata = record.metadata.unwrap();
        assert_eq!(metadata.domain, "example.com");
        assert_eq!(metadata.protocol, "");
    }

    #[test]
    fn test_tab_record_ill_typed_metadata_reads_as_absent() {
        let mut json = serde_json::to_value(record()).unwrap();
        json["metadata"] = json!({ "domain": 5 });
        let decoded: TabRecord = serde_json::from_value(json).unwrap();
        assert!(decoded.metadata.is_none());
    }

    #[test]
    fn test_device_metadata_incomplete_is_invalid() {
        let result = DeviceMetadata::new("device-a", "Laptop").validate();
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 3);
    }

    #[test]
    fn test_seen_at_only_changes_last_seen() {
        let device = device();
        let seen = device.seen_at(42);
        assert_eq!(seen.last_seen, 42);
        assert_eq!(seen.device_id, device.device_id);
    }

    #[test]
    fn test_snapshot_metadata_flattens() {
        let mut extra = Map::new();
        extra.insert("trigger".into(), json!("manual"));
        let metadata = SnapshotMetadata {
            device: device().seen_at(5),
            tab_count: Some(2),
            sync_id: Some(SyncId::new("sync_5_abcdefgh")),
            extra,
        };
        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["deviceId"], "device-a");
        assert_eq!(json["tabCount"], 2);
        assert_eq!(json["syncId"], "sync_5_abcdefgh");
        assert_eq!(json["trigger"], "manual");

        let back: SnapshotMetadata = serde_json::from_value(json).unwrap();
        assert_eq!(back, metadata);
        assert_eq!(back.extra.len(), 1);
    }

    #[test]
    fn test_conflict_item_wire_shape() {
        let item = ConflictItem {
            kind: ConflictKind::Modified,
            local_tab: Some(record()),
            remote_tab: None,
            reason: "title differs".into(),
            severity: 2,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "modified");
        assert!(json.get("remoteTab").is_none());
        assert!(item.validate().is_valid);
    }

    #[test]
    fn test_resolution_strategy_labels() {
        assert_eq!(
            serde_json::to_value(ResolutionStrategy::KeepRemote).unwrap(),
            "keep-remote"
        );
        assert_eq!(ResolutionStrategy::default(), ResolutionStrategy::Manual);
    }

    #[test]
    fn test_auth_tokens() {
        let tokens: AuthTokens = serde_json::from_value(json!({
            "accessToken": "gho_token",
            "expiresAt": 2000,
            "scopes": ["gist"],
            "provider": "github",
        }))
        .unwrap();
        assert_eq!(tokens.provider, AuthProvider::GitHub);
        assert!(tokens.is_expired_at(3000));
        assert!(!tokens.is_expired_at(1000));
        assert!(tokens.validate_at(1000).is_valid);
        assert_eq!(tokens.validate_at(3000).warnings, ["tokens appear expired"]);
    }

    #[test]
    fn test_auth_tokens_debug_hides_secrets() {
        let tokens = AuthTokens {
            access_token: "secret".into(),
            refresh_token: Some("also-secret".into()),
            expires_at: 1,
            scopes: vec![],
            provider: AuthProvider::Google,
        };
        let rendered = format!("{tokens:?}");
        assert!(!rendered.contains("secret"));
    }
}
