//! Outbound and inbound sync flows over browser collaborators.
//!
//! The browser side is reached through two traits: [`TabSource`] lists live
//! tabs and [`TabSink`] opens restored ones. Transport is not part of this
//! layer; the outbound flow ends with a snapshot and the inbound flow starts
//! from one.
//!
//! ```text
//! outbound: TabSource ─▶ serialize_tabs ─▶ create_sync_snapshot ─▶ SyncSnapshot
//! inbound:  JSON ─▶ SnapshotGate::accept ─▶ deserialize_tabs ─▶ TabSink
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::envelope::SnapshotGate;
use crate::error::Result;
use crate::schema::SyncSnapshot;
use crate::serializer::{
    BatchFailure, BatchOutcome, BrowserTab, DeserializeOptions, SerializeOptions, TabCreateParams,
    TabSerializer, deserialize_tabs,
};

// ============================================================================
// Collaborators
// ============================================================================

/// Supplies the browser's live tabs.
#[async_trait]
pub trait TabSource: Send + Sync {
    /// Returns every open tab.
    ///
    /// # Errors
    ///
    /// Implementations report failures as [`Error::Collaborator`](crate::Error::Collaborator).
    async fn query_tabs(&self) -> Result<Vec<BrowserTab>>;
}

/// Opens tabs in the browser.
#[async_trait]
pub trait TabSink: Send + Sync {
    /// Opens one tab.
    ///
    /// # Errors
    ///
    /// Implementations report failures as [`Error::Collaborator`](crate::Error::Collaborator).
    async fn create_tab(&self, params: TabCreateParams) -> Result<()>;
}

// ============================================================================
// Reports
// ============================================================================

/// Result of an outbound sync.
#[derive(Debug)]
pub struct OutboundSync {
    /// Checksummed snapshot ready for transport.
    pub snapshot: SyncSnapshot,
    /// Tabs left out because they failed to serialize.
    pub failures: Vec<BatchFailure>,
    /// Informational findings on the serialized tabs.
    pub warnings: Vec<String>,
}

/// Result of an inbound sync.
#[derive(Debug)]
pub struct InboundSync {
    /// The accepted snapshot.
    pub snapshot: SyncSnapshot,
    /// Number of tabs opened.
    pub created: usize,
    /// Records dropped or tabs the sink failed to open.
    pub failures: Vec<BatchFailure>,
    /// Informational findings on the received tabs.
    pub warnings: Vec<String>,
}

// ============================================================================
// SyncPipeline
// ============================================================================

/// Wires the serializer and the snapshot gate to browser collaborators.
pub struct SyncPipeline {
    serializer: TabSerializer,
    gate: SnapshotGate,
    source: Arc<dyn TabSource>,
    sink: Arc<dyn TabSink>,
}

impl std::fmt::Debug for SyncPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncPipeline")
            .field("serializer", &self.serializer)
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

impl SyncPipeline {
    /// Creates a pipeline with a gate for this crate's wire-format version.
    #[must_use]
    pub fn new(
        serializer: TabSerializer,
        source: Arc<dyn TabSource>,
        sink: Arc<dyn TabSink>,
    ) -> Self {
        Self {
            serializer,
            gate: SnapshotGate::new(),
            source,
            sink,
        }
    }

    /// Replaces the inbound gate.
    #[inline]
    #[must_use]
    pub fn with_gate(mut self, gate: SnapshotGate) -> Self {
        self.gate = gate;
        self
    }

    /// Returns the serializer.
    #[inline]
    #[must_use]
    pub fn serializer(&self) -> &TabSerializer {
        &self.serializer
    }

    /// Serializes the live tabs into a snapshot.
    ///
    /// # Errors
    ///
    /// - [`Error::Collaborator`](crate::Error::Collaborator) if the tabs cannot be listed
    /// - Any error of [`TabSerializer::serialize_tabs`] or
    ///   [`TabSerializer::create_sync_snapshot`]
    pub async fn outbound(
        &self,
        options: &SerializeOptions,
        extra: Map<String, Value>,
    ) -> Result<OutboundSync> {
        let tabs = self.source.query_tabs().await?;
        let outcome = self.serializer.serialize_tabs(&tabs, options).await?;
        let snapshot = self.serializer.create_sync_snapshot(outcome.items, extra)?;

        info!(
            tabs = snapshot.tabs.len(),
            failed = outcome.failures.len(),
            "Outbound sync prepared"
        );

        Ok(OutboundSync {
            snapshot,
            failures: outcome.failures,
            warnings: outcome.warnings,
        })
    }

    /// Accepts a received snapshot and opens its tabs.
    ///
    /// Nothing is opened unless the snapshot passes the gate.
    ///
    /// # Errors
    ///
    /// - Any error of [`SnapshotGate::accept`]
    /// - Any error of [`deserialize_tabs`]
    /// - The sink's first error if `continue_on_error` is unset
    pub async fn inbound(
        &self,
        snapshot: &Value,
        options: &DeserializeOptions,
    ) -> Result<InboundSync> {
        let snapshot = self.gate.accept(snapshot)?;
        let outcome = deserialize_tabs(&snapshot.tabs, options)?;
        let warnings = outcome.warnings.clone();
        let (created, failures) = self.open_tabs(outcome, options).await?;

        info!(
            device_id = %snapshot.device_id,
            created,
            failed = failures.len(),
            "Inbound sync applied"
        );

        Ok(InboundSync {
            snapshot,
            created,
            failures,
            warnings,
        })
    }

    /// Hands restored tabs to the sink.
    ///
    /// Failures keep the record's position in the snapshot, whether the
    /// record was dropped on restore or rejected by the sink.
    async fn open_tabs(
        &self,
        outcome: BatchOutcome<TabCreateParams>,
        options: &DeserializeOptions,
    ) -> Result<(usize, Vec<BatchFailure>)> {
        let BatchOutcome {
            items,
            positions,
            mut failures,
            ..
        } = outcome;
        let mut created = 0;

        for (index, params) in positions.into_iter().zip(items) {
            match self.sink.create_tab(params).await {
                Ok(()) => created += 1,
                Err(error) if options.continue_on_error => {
                    warn!(index, error = %error, "Failed to open synced tab");
                    failures.push(BatchFailure {
                        index,
                        source_id: None,
                        error,
                    });
                }
                Err(error) => return Err(error),
            }
        }

        failures.sort_by_key(|failure| failure.index);
        Ok((created, failures))
    }
}

// ============================================================================
// Tests
// ============================================================================
