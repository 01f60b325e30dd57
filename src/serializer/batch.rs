//! Batch serialization and restore.
//!
//! Tabs are serialized in fixed-size batches: every tab of a batch is
//! started together and the batch is awaited as a whole before the next one
//! begins. Nothing runs on another thread.

// ============================================================================
// Imports
// ============================================================================

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::schema::{TabRecord, validate_tab_array};

use super::core::TabSerializer;
use super::handle::{BrowserTab, TabCreateParams};
use super::options::{DeserializeOptions, SerializeOptions};

// ============================================================================
// BatchFailure
// ============================================================================

/// One item of a batch that failed.
#[derive(Debug)]
pub struct BatchFailure {
    /// Position of the item in the input.
    pub index: usize,
    /// Browser id of the source tab, if any.
    pub source_id: Option<i64>,
    /// Why the item failed.
    pub error: Error,
}

// ============================================================================
// BatchOutcome
// ============================================================================

/// Result of a batch call that tolerates per-item failures.
#[derive(Debug)]
pub struct BatchOutcome<T> {
    /// Successful items, in input order.
    pub items: Vec<T>,
    /// Input position of each item, parallel to `items`.
    pub positions: Vec<usize>,
    /// Failed items, in input order.
    pub failures: Vec<BatchFailure>,
    /// Informational findings, such as duplicate URLs.
    pub warnings: Vec<String>,
}

impl<T> Default for BatchOutcome<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            positions: Vec::new(),
            failures: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl<T> BatchOutcome<T> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            positions: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    fn push_item(&mut self, index: usize, item: T) {
        self.items.push(item);
        self.positions.push(index);
    }

    /// Returns `true` if no item failed.
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Returns the number of items processed.
    #[inline]
    #[must_use]
    pub fn total(&self) -> usize {
        self.items.len() + self.failures.len()
    }

    /// Returns the successful items if nothing failed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BatchPartialFailure`] if any item failed.
    pub fn ensure_complete(self) -> Result<Vec<T>> {
        if self.is_complete() {
            return Ok(self.items);
        }
        Err(Error::batch_partial_failure(
            self.failures.len(),
            self.total(),
        ))
    }

    /// Returns the successful items, discarding failures and warnings.
    #[inline]
    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

// ============================================================================
// TabSerializer - Batches
// ============================================================================

impl TabSerializer {
    /// Serializes many live tabs.
    ///
    /// With `continue_on_error` set, failing tabs are recorded in
    /// [`BatchOutcome::failures`] and left out of the items. Duplicate URLs
    /// and other findings on the assembled list are reported as warnings.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the options are invalid
    /// - The first tab's error if `continue_on_error` is unset
    pub async fn serialize_tabs(
        &self,
        tabs: &[BrowserTab],
        options: &SerializeOptions,
    ) -> Result<BatchOutcome<TabRecord>> {
        options.validate()?;

        let mut outcome = BatchOutcome::with_capacity(tabs.len());

        for (batch, chunk) in tabs.chunks(options.batch_size).enumerate() {
            let offset = batch * options.batch_size;
            debug!(batch, size = chunk.len(), "Serializing batch");

            let results = join_all(chunk.iter().map(|tab| self.serialize_tab(tab, options))).await;

            for ((position, tab), result) in chunk.iter().enumerate().zip(results) {
                match result {
                    Ok(record) => outcome.push_item(offset + position, record),
                    Err(error) if options.continue_on_error => {
                        warn!(
                            index = offset + position,
                            source_id = ?tab.id,
                            error = %error,
                            "Skipping tab that failed to serialize"
                        );
                        outcome.failures.push(BatchFailure {
                            index: offset + position,
                            source_id: tab.id,
                            error,
                        });
                    }
                    Err(error) => return Err(error),
                }
            }

            tokio::task::yield_now().await;
        }

        let report = validate_tab_array(&serde_json::to_value(&outcome.items)?);
        outcome.warnings.extend(report.warnings);
        outcome.warnings.extend(report.errors);

        info!(
            serialized = outcome.items.len(),
            failed = outcome.failures.len(),
            warnings = outcome.warnings.len(),
            "Tabs serialized"
        );

        Ok(outcome)
    }
}

// ============================================================================
// Restore
// ============================================================================

/// Converts a record into tab-creation instructions.
///
/// The restored tab is never activated. Its window is set only when the
/// options name one.
///
/// # Errors
///
/// Returns [`Error::InvalidTabData`] if the record is invalid.
pub fn deserialize_tab(record: &TabRecord, options: &DeserializeOptions) -> Result<TabCreateParams> {
    let report = record.validate();
    if !report.is_valid {
        return Err(Error::invalid_tab_data(report.errors));
    }

    Ok(TabCreateParams {
        url: record.url.clone(),
        active: false,
        pinned: options.preserve_pinned && record.is_pinned(),
        window_id: options.target_window_id,
        index: options.preserve_index.then_some(record.index),
    })
}

/// Converts many records into tab-creation instructions.
///
/// The whole list is validated first. With `continue_on_error` set,
/// invalid records are dropped and recorded as failures.
///
/// # Errors
///
/// Returns [`Error::InvalidTabData`] for the list, or the first invalid
/// record, if `continue_on_error` is unset.
pub fn deserialize_tabs(
    records: &[TabRecord],
    options: &DeserializeOptions,
) -> Result<BatchOutcome<TabCreateParams>> {
    let report = validate_tab_array(&serde_json::to_value(records)?);
    if !report.is_valid && !options.continue_on_error {
        return Err(Error::invalid_tab_data(report.errors));
    }

    let mut outcome = BatchOutcome::with_capacity(records.len());
    outcome.warnings = report.warnings;

    for (index, record) in records.iter().enumerate() {
        match deserialize_tab(record, options) {
            Ok(params) => outcome.push_item(index, params),
            Err(error) => {
                warn!(index, record_id = %record.id, error = %error, "Dropping invalid tab record");
                outcome.failures.push(BatchFailure {
                    index,
                    source_id: None,
                    error,
                });
            }
        }
    }

    debug!(
        restored = outcome.items.len(),
        dropped = outcome.failures.len(),
        "Tab records deserialized"
    );

    Ok(outcome)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::ErrorCode;
    use crate::identifiers::{DeviceId, RecordId};
    use crate::schema::DeviceMetadata;

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

    fn tabs(count: usize) -> Vec<BrowserTab> {
        (0..count)
            .map(|i| {
                BrowserTab::new(i as i64, format!("https://site{i}.example.com/"))
                    .with_title(format!("Site {i}"))
                    .with_position(1, i as i64)
            })
            .collect()
    }

    fn record(url: &str, index: i64, pinned: Option<bool>) -> TabRecord {
        TabRecord {
            id: RecordId::new(format!("tab_{index}_1700000000000_abcdef")),
            url: url.into(),
            title: "Title".into(),
            favicon: None,
            window_id: 2,
            index,
            timestamp: 1_700_000_000_000,
            device_id: DeviceId::new("device-b"),
            pinned,
            active: Some(true),
            content: None,
            metadata: None,
        }
    }

    // ------------------------------------------------------------------------
    // serialize_tabs
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_serialize_tabs_all_succeed() {
        let outcome = serializer()
            .serialize_tabs(&tabs(25), &SerializeOptions::new())
            .await
            .unwrap();
        assert!(outcome.is_complete());
        assert_eq!(outcome.items.len(), 25);
        assert!(outcome.warnings.is_empty());
        let indexes: Vec<i64> = outcome.items.iter().map(|r| r.index).collect();
        assert_eq!(indexes, (0..25).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_serialize_tabs_records_one_failure() {
        let mut input = tabs(12);
        input[7] = input[7].clone().with_position(-1, 7);

        let outcome = serializer()
            .serialize_tabs(&input, &SerializeOptions::new())
            .await
            .unwrap();

        assert_eq!(outcome.items.len(), 11);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.total(), 12);
        assert_eq!(outcome.failures[0].index, 7);
        assert!(!outcome.positions.contains(&7));
        assert_eq!(outcome.positions.len(), 11);
        assert_eq!(outcome.failures[0].source_id, Some(7));
        assert_eq!(
            outcome.failures[0].error.code(),
            ErrorCode::TabSerializationError
        );
        assert!(outcome.items.iter().all(|r| r.window_id == 1));
    }

    #[tokio::test]
    async fn test_serialize_tabs_fail_fast() {
        let mut input = tabs(12);
        input[7] = input[7].clone().with_position(-1, 7);

        let err = serializer()
            .serialize_tabs(&input, &SerializeOptions::new().fail_fast())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::TabSerialization { source_id: Some(7), .. }));
    }

    #[tokio::test]
    async fn test_serialize_tabs_partial_outcome_converts_to_error() {
        let mut input = tabs(3);
        input[0] = input[0].clone().with_position(-5, 0);

        let outcome = serializer()
            .serialize_tabs(&input, &SerializeOptions::new().with_batch_size(2))
            .await
            .unwrap();
        let err = outcome.ensure_complete().unwrap_err();
        assert_eq!(err.code(), ErrorCode::BatchPartialFailure);
        assert_eq!(err.to_string(), "Batch partially failed: 1 of 3 items failed");
    }

    #[tokio::test]
    async fn test_serialize_tabs_surfaces_duplicate_urls() {
        let input = vec![
            BrowserTab::new(1, "https://a.com/").with_position(1, 0),
            BrowserTab::new(2, "https://a.com/?utm_source=x").with_position(1, 1),
        ];
        let outcome = serializer()
            .serialize_tabs(&input, &SerializeOptions::new())
            .await
            .unwrap();
        assert_eq!(outcome.items.len(), 2);
        assert_eq!(outcome.warnings, ["Duplicate URL at index 1: https://a.com/"]);
    }

    #[tokio::test]
    async fn test_serialize_tabs_empty_input() {
        let outcome = serializer()
            .serialize_tabs(&[], &SerializeOptions::new())
            .await
            .unwrap();
        assert!(outcome.items.is_empty());
        assert_eq!(outcome.warnings, ["Tab list is empty"]);
    }

    #[tokio::test]
    async fn test_serialize_tabs_rejects_zero_batch_size() {
        let err = serializer()
            .serialize_tabs(&tabs(1), &SerializeOptions::new().with_batch_size(0))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ConfigError);
    }

    // ------------------------------------------------------------------------
    // deserialize_tab
    // ------------------------------------------------------------------------

    #[test]
    fn test_deserialize_tab_defaults() {
        let params =
            deserialize_tab(&record("https://a.com/", 4, Some(true)), &DeserializeOptions::new())
                .unwrap();
        assert_eq!(params.url, "https://a.com/");
        assert!(!params.active);
        assert!(params.pinned);
        assert_eq!(params.index, Some(4));
        assert_eq!(params.window_id, None);
    }

    #[test]
    fn test_deserialize_tab_respects_options() {
        let options = DeserializeOptions::new()
            .without_pinned()
            .without_index()
            .in_window(11);
        let params = deserialize_tab(&record("https://a.com/", 4, Some(true)), &options).unwrap();
        assert!(!params.pinned);
        assert_eq!(params.index, None);
        assert_eq!(params.window_id, Some(11));
    }

    #[test]
    fn test_deserialize_tab_missing_pinned_is_unpinned() {
        let params =
            deserialize_tab(&record("https://a.com/", 0, None), &DeserializeOptions::new()).unwrap();
        assert!(!params.pinned);
    }

    #[test]
    fn test_deserialize_tab_rejects_invalid_record() {
        let err = deserialize_tab(&record("nope", 0, None), &DeserializeOptions::new()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidTabData);
        assert_eq!(err.validation_errors(), ["url is not a valid URL: nope"]);
    }

    // ------------------------------------------------------------------------
    // deserialize_tabs
    // ------------------------------------------------------------------------

    #[test]
    fn test_deserialize_tabs_drops_invalid_records() {
        let records = vec![
            record("https://a.com/", 0, None),
            record("nope", 1, None),
            record("https://b.com/", 2, None),
        ];
        let outcome = deserialize_tabs(&records, &DeserializeOptions::new()).unwrap();
        assert_eq!(outcome.items.len(), 2);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].index, 1);
        assert_eq!(outcome.positions, [0, 2]);
    }

    #[test]
    fn test_deserialize_tabs_fail_fast() {
        let records = vec![record("https://a.com/", 0, None), record("nope", 1, None)];
        let err = deserialize_tabs(&records, &DeserializeOptions::new().fail_fast()).unwrap_err();
        assert_eq!(err.validation_errors(), ["tabs[1]: url is not a valid URL: nope"]);
    }

    #[test]
    fn test_deserialize_tabs_keeps_duplicate_warnings() {
        let records = vec![record("https://a.com/", 0, None), record("https://a.com/", 1, None)];
        let outcome = deserialize_tabs(&records, &DeserializeOptions::new()).unwrap();
        assert!(outcome.is_complete());
        assert_eq!(outcome.warnings, ["Duplicate URL at index 1: https://a.com/"]);
    }

    #[tokio::test]
    async fn test_round_trip_preserves_url_pinned_and_index() {
        let tab = BrowserTab::new(3, "https://docs.example.com/page")
            .with_title("Docs")
            .with_position(1, 6)
            .pinned();
        let record = serializer()
            .serialize_tab(&tab, &SerializeOptions::new())
            .await
            .unwrap();
        let params = deserialize_tab(&record, &DeserializeOptions::new()).unwrap();
        assert_eq!(params.url, record.url);
        assert!(params.pinned);
        assert_eq!(params.index, Some(6));
    }
}
