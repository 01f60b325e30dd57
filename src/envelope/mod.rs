//! Snapshot integrity envelope.
//!
//! | Module | Description |
//! |--------|-------------|
//! | `checksum` | Canonical JSON and SHA-256 checksums |
//! | `gate` | Trust-boundary acceptance of inbound snapshots |
//!
//! Outbound snapshots get their checksum from [`compute_checksum`]; inbound
//! snapshots are only trusted after [`SnapshotGate::accept`]. Swapping the
//! hash function touches this module alone.

// ============================================================================
// Submodules
// ============================================================================

/// Canonical JSON and checksums.
pub mod checksum;

/// Inbound snapshot gate.
pub mod gate;

// ============================================================================
// Re-exports
// ============================================================================

pub use checksum::{canonical_json, checksum_of, compute_checksum, verify_checksum};
pub use gate::{SnapshotGate, accept_snapshot};
