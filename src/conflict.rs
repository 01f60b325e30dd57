//! Conflict detection between a local and a remote tab set.
//!
//! Tabs are matched by URL. Detection only labels disagreements; deciding
//! what to keep is left to the caller.
//!
//! | Kind | Severity | When |
//! |------|----------|------|
//! | `duplicate` | 1 | Same URL on both sides with equal title and pinned state |
//! | `modified` | 2 | Same URL with a different title or pinned state |
//! | `deleted` | 2 | Local URL missing from the remote set |
//! | `structural` | 3 | A remote pinned tab sits after an unpinned one in its window |

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::identifiers::now_millis;
use crate::schema::{ConflictItem, ConflictKind, ConflictSet, ResolutionStrategy, TabRecord};

// ============================================================================
// Severities
// ============================================================================

const SEVERITY_INFO: u8 = 1;
const SEVERITY_REVIEW: u8 = 2;
const SEVERITY_BLOCKING: u8 = 3;

// ============================================================================
// Detection
// ============================================================================

/// Compares two tab sets and labels their disagreements.
///
/// # Example
///
/// ```
/// use tab_sync::{ResolutionStrategy, detect_conflicts};
///
/// let set = detect_conflicts(&[], &[], ResolutionStrategy::Merge);
/// assert!(set.is_empty());
/// assert_eq!(set.resolution_strategy, ResolutionStrategy::Merge);
/// ```
#[must_use]
pub fn detect_conflicts(
    local: &[TabRecord],
    remote: &[TabRecord],
    strategy: ResolutionStrategy,
) -> ConflictSet {
    let mut remote_by_url: FxHashMap<&str, &TabRecord> = FxHashMap::default();
    for tab in remote {
        remote_by_url.entry(tab.url.as_str()).or_insert(tab);
    }

    let mut conflicts: Vec<ConflictItem> = local
        .iter()
        .map(|local_tab| match remote_by_url.get(local_tab.url.as_str()) {
            Some(remote_tab) => compare_pair(local_tab, remote_tab),
            None => ConflictItem {
                kind: ConflictKind::Deleted,
                local_tab: Some(local_tab.clone()),
                remote_tab: None,
                reason: format!("{} is not open on the remote device", local_tab.url),
                severity: SEVERITY_REVIEW,
            },
        })
        .collect();

    conflicts.extend(structural_conflicts(remote));

    debug!(
        local = local.len(),
        remote = remote.len(),
        conflicts = conflicts.len(),
        "Conflict detection finished"
    );

    ConflictSet {
        local_tabs: local.to_vec(),
        remote_tabs: remote.to_vec(),
        conflicts,
        timestamp: now_millis(),
        resolution_strategy: strategy,
    }
}

fn compare_pair(local: &TabRecord, remote: &TabRecord) -> ConflictItem {
    let mut differences = Vec::new();
    if local.title != remote.title {
        differences.push(format!("title {:?} vs {:?}", local.title, remote.title));
    }
    if local.is_pinned() != remote.is_pinned() {
        differences.push(format!(
            "pinned {} vs {}",
            local.is_pinned(),
            remote.is_pinned()
        ));
    }

    let (kind, reason, severity) = if differences.is_empty() {
        (
            ConflictKind::Duplicate,
            format!("{} is open on both devices", local.url),
            SEVERITY_INFO,
        )
    } else {
        (
            ConflictKind::Modified,
            format!("{} differs: {}", local.url, differences.join(", ")),
            SEVERITY_REVIEW,
        )
    };

    ConflictItem {
        kind,
        local_tab: Some(local.clone()),
        remote_tab: Some(remote.clone()),
        reason,
        severity,
    }
}

/// Finds remote pinned tabs placed after an unpinned tab of the same window.
fn structural_conflicts(remote: &[TabRecord]) -> Vec<ConflictItem> {
    let mut windows: FxHashMap<i64, Vec<&TabRecord>> = FxHashMap::default();
    for tab in remote {
        windows.entry(tab.window_id).or_default().push(tab);
    }

    let mut window_ids: Vec<i64> = windows.keys().copied().collect();
    window_ids.sort_unstable();

    let mut conflicts = Vec::new();
    for window_id in window_ids {
        let Some(tabs) = windows.get_mut(&window_id) else {
            continue;
        };
        tabs.sort_by_key(|tab| tab.index);

        let mut seen_unpinned = false;
        for tab in tabs.iter() {
            if !tab.is_pinned() {
                seen_unpinned = true;
            } else if seen_unpinned {
                conflicts.push(ConflictItem {
                    kind: ConflictKind::Structural,
                    local_tab: None,
                    remote_tab: Some((*tab).clone()),
                    reason: format!(
                        "pinned tab at index {} follows an unpinned tab in window {window_id}",
                        tab.index
                    ),
                    severity: SEVERITY_BLOCKING,
                });
            }
        }
    }

    conflicts
}

// ============================================================================
// Tests
// ============================================================================
