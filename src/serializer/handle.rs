//! Browser-facing tab shapes.
//!
//! [`BrowserTab`] is what the browser's tab API reports for a live tab;
//! [`TabCreateParams`] is what the tab-creation API expects when a synced
//! tab is restored. Both use the browser's camelCase field names.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

// ============================================================================
// BrowserTab
// ============================================================================

/// Mute state reported by the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MutedInfo {
    /// Whether the tab is muted.
    pub muted: bool,
}

/// A live tab as reported by the browser.
///
/// Only `windowId` and `index` are always present; everything else may be
/// missing, for example while a tab is still being created.
///
/// # Example
///
/// ```
/// use tab_sync::BrowserTab;
///
/// let tab = BrowserTab::new(7, "https://example.com")
///     .with_title("Example")
///     .with_position(1, 0)
///     .pinned();
///
/// assert_eq!(tab.id, Some(7));
/// assert!(tab.pinned);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserTab {
    /// Browser tab id.
    #[serde(default)]
    pub id: Option<i64>,
    /// Current URL.
    #[serde(default)]
    pub url: Option<String>,
    /// Current title.
    #[serde(default)]
    pub title: Option<String>,
    /// Owning window.
    #[serde(default)]
    pub window_id: i64,
    /// Position within the window.
    #[serde(default)]
    pub index: i64,
    /// Favicon URL.
    #[serde(default)]
    pub fav_icon_url: Option<String>,
    /// Whether the tab is pinned.
    #[serde(default)]
    pub pinned: bool,
    /// Whether the tab is the active tab of its window.
    #[serde(default)]
    pub active: bool,
    /// Loading status (`loading` or `complete`).
    #[serde(default)]
    pub status: Option<String>,
    /// Whether the tab is playing sound.
    #[serde(default)]
    pub audible: Option<bool>,
    /// Mute state.
    #[serde(default)]
    pub muted_info: Option<MutedInfo>,
    /// Whether the tab is in a private window.
    #[serde(default)]
    pub incognito: bool,
}

impl BrowserTab {
    /// Creates a tab with an id and URL at position 0 of window 0.
    #[must_use]
    pub fn new(id: i64, url: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Sets the title.
    #[inline]
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the window and index.
    #[inline]
    #[must_use]
    pub fn with_position(mut self, window_id: i64, index: i64) -> Self {
        self.window_id = window_id;
        self.index = index;
        self
    }

    /// Sets the favicon URL.
    #[inline]
    #[must_use]
    pub fn with_favicon(mut self, url: impl Into<String>) -> Self {
        self.fav_icon_url = Some(url.into());
        self
    }

    /// Sets the loading status.
    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Marks the tab pinned.
    #[inline]
    #[must_use]
    pub fn pinned(mut self) -> Self {
        self.pinned = true;
        self
    }

    /// Marks the tab active.
    #[inline]
    #[must_use]
    pub fn active(mut self) -> Self {
        self.active = true;
        self
    }

    /// Marks the tab audible.
    #[inline]
    #[must_use]
    pub fn audible(mut self) -> Self {
        self.audible = Some(true);
        self
    }

    /// Marks the tab muted.
    #[inline]
    #[must_use]
    pub fn muted(mut self) -> Self {
        self.muted_info = Some(MutedInfo { muted: true });
        self
    }

    /// Marks the tab as belonging to a private window.
    #[inline]
    #[must_use]
    pub fn incognito(mut self) -> Self {
        self.incognito = true;
        self
    }

    /// Returns `true` if the tab is still loading.
    #[inline]
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.status.as_deref() == Some("loading")
    }

    /// Returns `true` if the tab is muted.
    #[inline]
    #[must_use]
    pub fn is_muted(&self) -> bool {
        self.muted_info.is_some_and(|info| info.muted)
    }
}

// ============================================================================
// TabCreateParams
// ============================================================================

/// Instructions for recreating a synced tab.
///
/// Restored tabs are never activated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabCreateParams {
    /// URL to open.
    pub url: String,
    /// Always `false`.
    pub active: bool,
    /// Whether to pin the tab.
    pub pinned: bool,
    /// Target window, if the caller chose one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_id: Option<i64>,
    /// Target position, if preserved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,
}

// ============================================================================
// Tests
// ============================================================================
