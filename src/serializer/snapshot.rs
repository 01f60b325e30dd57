//! Outbound snapshot assembly.

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::envelope::compute_checksum;
use crate::error::{Error, Result};
use crate::identifiers::{SyncId, now_millis};
use crate::schema::{SnapshotMetadata, SyncSnapshot, TabRecord};

use super::core::TabSerializer;

impl TabSerializer {
    /// Bundles records into a checksummed snapshot.
    ///
    /// `extra` is merged into the snapshot metadata. Keys that would shadow
    /// device fields, `tabCount` or `syncId` are dropped. The device's
    /// `lastSeen` is refreshed to the snapshot time.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidSyncData`] if the assembled snapshot is invalid
    /// - [`Error::Json`] if the checksum input cannot be encoded
    pub fn create_sync_snapshot(
        &self,
        tabs: Vec<TabRecord>,
        extra: Map<String, Value>,
    ) -> Result<SyncSnapshot> {
        let timestamp = now_millis();
        let sync_id = SyncId::generate(timestamp);

        let extra: Map<String, Value> = extra
            .into_iter()
            .filter(|(key, _)| {
                let reserved = SnapshotMetadata::RESERVED_KEYS.contains(&key.as_str());
                if reserved {
                    warn!(key = %key, "Dropping extra metadata that shadows a reserved field");
                }
                !reserved
            })
            .collect();

        let metadata = SnapshotMetadata {
            device: self.device().seen_at(timestamp),
            tab_count: Some(tabs.len()),
            sync_id: Some(sync_id),
            extra,
        };

        let checksum = compute_checksum(&tabs, &metadata)?;
        debug!(checksum = %checksum, "Snapshot checksum computed");

        let snapshot = SyncSnapshot {
            version: self.version().to_string(),
            device_id: self.device_id().clone(),
            timestamp,
            tabs,
            metadata,
            checksum: Some(checksum),
        };

        let report = snapshot.validate();
        if !report.is_valid {
            warn!(errors = ?report.errors, "Refusing to emit invalid snapshot");
            return Err(Error::invalid_sync_data(report.errors));
        }

        info!(
            sync_id = ?snapshot.sync_id().map(|id| id.as_str()),
            tabs = snapshot.tabs.len(),
            "Sync snapshot created"
        );

        Ok(snapshot)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::envelope::{SnapshotGate, verify_checksum};
    use crate::error::ErrorCode;
    use crate::identifiers::{DeviceId, RecordId};
    use crate::schema::DeviceMetadata;

    use super::*;

    fn serializer() -> TabSerializer {
        TabSerializer::builder()
            .device(
                DeviceMetadata::new("device-a", "Laptop")
                    .with_browser("Firefox", "128.0")
                    .with_platform("linux"),
            )
            .build()
            .unwrap()
    }

    fn record(url: &str, window_id: i64) -> TabRecord {
        TabRecord {
            id: RecordId::new("tab_1_1700000000000_abcdef"),
            url: url.into(),
            title: "Title".into(),
            favicon: None,
            window_id,
            index: 0,
            timestamp: 1_700_000_000_000,
            device_id: DeviceId::new("device-a"),
            pinned: None,
            active: None,
            content: None,
            metadata: None,
        }
    }

    fn extras(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_snapshot_is_stamped() {
        let snapshot = serializer()
            .create_sync_snapshot(vec![record("https://a.com/", 1)], Map::new())
            .unwrap();

        assert_eq!(snapshot.version, "1.0.0");
        assert_eq!(snapshot.device_id.as_str(), "device-a");
        assert_eq!(snapshot.metadata.tab_count, Some(1));
        assert_eq!(snapshot.metadata.device.last_seen, snapshot.timestamp);
        assert!(snapshot.sync_id().unwrap().as_str().starts_with("sync_"));
        assert!(snapshot.checksum.is_some());
    }

    #[test]
    fn test_snapshot_checksum_verifies() {
        let snapshot = serializer()
            .create_sync_snapshot(vec![record("https://a.com/", 1)], Map::new())
            .unwrap();
        let json = serde_json::to_value(&snapshot).unwrap();
        verify_checksum(&json).unwrap();
    }

    #[test]
    fn test_snapshot_passes_gate_unchanged() {
        let snapshot = serializer()
            .create_sync_snapshot(
                vec![record("https://a.com/", 1), record("https://b.com/", 1)],
                extras(json!({ "reason": "manual", "attempt": 2 })),
            )
            .unwrap();

        let accepted = SnapshotGate::new()
            .accept(&serde_json::to_value(&snapshot).unwrap())
            .unwrap();
        assert_eq!(accepted, snapshot);
    }

    #[test]
    fn test_snapshot_drops_reserved_extras() {
        let snapshot = serializer()
            .create_sync_snapshot(
                vec![],
                extras(json!({
                    "deviceId": "spoofed",
                    "tabCount": 99,
                    "syncId": "sync_0_00000000",
                    "label": "nightly",
                })),
            )
            .unwrap();

        assert_eq!(snapshot.metadata.device.device_id.as_str(), "device-a");
        assert_eq!(snapshot.metadata.tab_count, Some(0));
        assert_eq!(snapshot.metadata.extra.len(), 1);
        assert_eq!(snapshot.metadata.extra["label"], "nightly");
    }

    #[test]
    fn test_snapshot_sync_ids_are_fresh() {
        let serializer = serializer();
        let a = serializer.create_sync_snapshot(vec![], Map::new()).unwrap();
        let b = serializer.create_sync_snapshot(vec![], Map::new()).unwrap();
        assert_ne!(a.sync_id(), b.sync_id());
    }

    #[test]
    fn test_snapshot_refuses_invalid_tabs() {
        let err = serializer()
            .create_sync_snapshot(vec![record("https://a.com/", -1)], Map::new())
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidSyncData);
        assert_eq!(
            err.validation_errors(),
            ["tabs[0]: windowId must be a non-negative integer"]
        );
    }
}
