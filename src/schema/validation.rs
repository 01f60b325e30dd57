//! Structural validation of sync data.
//!
//! Every validator takes an arbitrary JSON value and returns a
//! [`ValidationResult`]. Validators never panic and never fail: a wrong
//! type, `null` or non-object input yields an invalid result with a single
//! descriptive error.
//!
//! Errors are hard failures. Warnings are soft issues that do not affect
//! `is_valid`. Nested failures are reported with a path prefix such as
//! `tabs[3]: url is not a valid URL`.
//!
//! JSON `null` on an optional field is treated as absent.

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashSet;
use serde::Serialize;
use serde_json::{Map, Value};
use url::Url;

use crate::identifiers::now_millis;

use super::version::WireVersion;

// ============================================================================
// Constants
// ============================================================================

/// Valid values of a conflict item's `type`.
pub const CONFLICT_KINDS: [&str; 4] = ["duplicate", "modified", "deleted", "structural"];

/// Valid values of an auth token record's `provider`.
pub const AUTH_PROVIDERS: [&str; 2] = ["google", "github"];

/// Smallest valid conflict severity.
pub const MIN_SEVERITY: i128 = 1;

/// Largest valid conflict severity.
pub const MAX_SEVERITY: i128 = 3;

// ============================================================================
// ValidationResult
// ============================================================================

/// Outcome of a validation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// `true` if no errors were found.
    pub is_valid: bool,
    /// Hard failures.
    pub errors: Vec<String>,
    /// Soft issues.
    pub warnings: Vec<String>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationResult {
    /// Creates an empty, valid result.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Creates an invalid result with a single error.
    #[must_use]
    pub fn invalid(error: impl Into<String>) -> Self {
        let mut result = Self::new();
        result.error(error);
        result
    }

    /// Records a hard failure.
    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
        self.is_valid = false;
    }

    /// Records a soft issue.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Merges a nested result, prefixing its messages with `path`.
    pub fn absorb(&mut self, path: &str, nested: Self) {
        self.errors
            .extend(nested.errors.into_iter().map(|e| format!("{path}: {e}")));
        self.warnings
            .extend(nested.warnings.into_iter().map(|w| format!("{path}: {w}")));
        self.is_valid &= nested.is_valid;
    }

    /// Returns `true` if there are warnings.
    #[inline]
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

// ============================================================================
// Field Helpers
// ============================================================================

/// Reads a field, treating `null` as absent.
fn field<'a>(obj: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    obj.get(name).filter(|v| !v.is_null())
}

/// Returns the integral value of a JSON number.
///
/// Floats with no fractional part count as integers, as they do on the
/// JavaScript side of the boundary.
pub(crate) fn integer_value(value: &Value) -> Option<i128> {
    if let Some(i) = value.as_i64() {
        return Some(i128::from(i));
    }
    if let Some(u) = value.as_u64() {
        return Some(i128::from(u));
    }
    value
        .as_f64()
        .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15)
        .map(|f| f as i128)
}

/// Checks a required non-empty string. Returns it when valid.
fn require_string<'a>(
    obj: &'a Map<String, Value>,
    name: &str,
    result: &mut ValidationResult,
) -> Option<&'a str> {
    match field(obj, name) {
        None => {
            result.error(format!("Missing required field: {name}"));
            None
        }
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.as_str()),
        Some(_) => {
            result.error(format!("{name} must be a non-empty string"));
            None
        }
    }
}

/// Checks a required integer against a lower bound. Returns it when valid.
fn require_integer(
    obj: &Map<String, Value>,
    name: &str,
    min: i128,
    description: &str,
    result: &mut ValidationResult,
) -> Option<i128> {
    let Some(value) = field(obj, name) else {
        result.error(format!("Missing required field: {name}"));
        return None;
    };
    match integer_value(value) {
        Some(n) if n >= min => Some(n),
        _ => {
            result.error(format!("{name} must be a {description}"));
            None
        }
    }
}

fn require_non_negative(obj: &Map<String, Value>, name: &str, result: &mut ValidationResult) {
    require_integer(obj, name, 0, "non-negative integer", result);
}

fn require_positive(
    obj: &Map<String, Value>,
    name: &str,
    result: &mut ValidationResult,
) -> Option<i128> {
    require_integer(obj, name, 1, "positive integer", result)
}

fn optional_string(obj: &Map<String, Value>, name: &str, result: &mut ValidationResult) {
    if field(obj, name).is_some_and(|v| !v.is_string()) {
        result.warn(format!("{name} should be a string"));
    }
}

fn optional_bool(obj: &Map<String, Value>, name: &str, result: &mut ValidationResult) {
    if field(obj, name).is_some_and(|v| !v.is_boolean()) {
        result.warn(format!("{name} should be a boolean"));
    }
}

fn require_one_of(
    obj: &Map<String, Value>,
    name: &str,
    allowed: &[&str],
    result: &mut ValidationResult,
) {
    match field(obj, name) {
        None => result.error(format!("Missing required field: {name}")),
        Some(Value::String(s)) if allowed.contains(&s.as_str()) => {}
        Some(_) => result.error(format!("{name} must be one of: {}", allowed.join(", "))),
    }
}

// ============================================================================
// Validators
// ============================================================================

/// Validates a single tab record.
#[must_use]
pub fn validate_tab_record(data: &Value) -> ValidationResult {
    let Some(obj) = data.as_object() else {
        return ValidationResult::invalid("Tab record must be an object");
    };
    let mut result = ValidationResult::new();

    require_string(obj, "id", &mut result);
    if let Some(url) = require_string(obj, "url", &mut result)
        && Url::parse(url).is_err()
    {
        result.error(format!("url is not a valid URL: {url}"));
    }
    require_string(obj, "title", &mut result);
    require_string(obj, "deviceId", &mut result);
    require_non_negative(obj, "windowId", &mut result);
    require_non_negative(obj, "index", &mut result);
    require_positive(obj, "timestamp", &mut result);

    optional_string(obj, "favicon", &mut result);
    optional_bool(obj, "pinned", &mut result);
    optional_bool(obj, "active", &mut result);
    if field(obj, "metadata").is_some_and(|v| !v.is_object()) {
        result.warn("metadata should be an object");
    }

    result
}

/// Validates a device metadata record.
#[must_use]
pub fn validate_device_metadata(data: &Value) -> ValidationResult {
    let Some(obj) = data.as_object() else {
        return ValidationResult::invalid("Device metadata must be an object");
    };
    let mut result = ValidationResult::new();

    for name in [
        "deviceId",
        "deviceName",
        "browserName",
        "browserVersion",
        "platform",
    ] {
        require_string(obj, name, &mut result);
    }
    require_positive(obj, "lastSeen", &mut result);

    result
}

/// Validates a sync snapshot, including every tab and the metadata.
///
/// A present `checksum` is only type-checked here; whether it matches the
/// contents is decided at the trust boundary.
#[must_use]
pub fn validate_sync_snapshot(data: &Value) -> ValidationResult {
    let Some(obj) = data.as_object() else {
        return ValidationResult::invalid("Sync snapshot must be an object");
    };
    let mut result = ValidationResult::new();

    if let Some(version) = require_string(obj, "version", &mut result)
        && WireVersion::parse(version).is_none()
    {
        result.warn(format!("version is not a semantic version: {version}"));
    }
    require_string(obj, "deviceId", &mut result);
    require_positive(obj, "timestamp", &mut result);

    match field(obj, "tabs") {
        None => result.error("Missing required field: tabs"),
        Some(Value::Array(tabs)) => {
            for (i, tab) in tabs.iter().enumerate() {
                result.absorb(&format!("tabs[{i}]"), validate_tab_record(tab));
            }
        }
        Some(_) => result.error("tabs must be an array"),
    }

    match field(obj, "metadata") {
        None => result.error("Missing required field: metadata"),
        Some(metadata) => result.absorb("metadata", validate_device_metadata(metadata)),
    }

    optional_string(obj, "checksum", &mut result);

    result
}

/// Validates a conflict item.
#[must_use]
pub fn validate_conflict_item(data: &Value) -> ValidationResult {
    let Some(obj) = data.as_object() else {
        return ValidationResult::invalid("Conflict item must be an object");
    };
    let mut result = ValidationResult::new();

    require_one_of(obj, "type", &CONFLICT_KINDS, &mut result);
    require_string(obj, "reason", &mut result);
    match field(obj, "severity") {
        None => result.error("Missing required field: severity"),
        Some(value) => {
            let in_range = integer_value(value)
                .is_some_and(|s| (MIN_SEVERITY..=MAX_SEVERITY).contains(&s));
            if !in_range {
                result.error("severity must be an integer between 1 and 3");
            }
        }
    }

    for side in ["localTab", "remoteTab"] {
        if let Some(tab) = field(obj, side) {
            result.absorb(side, validate_tab_record(tab));
        }
    }

    result
}

/// Validates an auth token record against the current time.
#[must_use]
pub fn validate_auth_tokens(data: &Value) -> ValidationResult {
    validate_auth_tokens_at(data, now_millis())
}

/// Validates an auth token record against `now` (milliseconds).
///
/// Expired tokens are structurally valid; expiry only produces a warning.
#[must_use]
pub fn validate_auth_tokens_at(data: &Value, now: u64) -> ValidationResult {
    let Some(obj) = data.as_object() else {
        return ValidationResult::invalid("Auth tokens must be an object");
    };
    let mut result = ValidationResult::new();

    require_string(obj, "accessToken", &mut result);
    optional_string(obj, "refreshToken", &mut result);
    if let Some(expires_at) = require_positive(obj, "expiresAt", &mut result)
        && expires_at < i128::from(now)
    {
        result.warn("tokens appear expired");
    }

    match field(obj, "scopes") {
        None => result.error("Missing required field: scopes"),
        Some(Value::Array(scopes)) => {
            for (i, scope) in scopes.iter().enumerate() {
                if !scope.is_string() {
                    result.warn(format!("scopes[{i}] should be a string"));
                }
            }
        }
        Some(_) => result.error("scopes must be an array"),
    }

    require_one_of(obj, "provider", &AUTH_PROVIDERS, &mut result);

    result
}

/// Validates a list of tab records.
///
/// In the same pass, every URL seen more than once produces a warning
/// naming the index of the repeat. Duplicates never invalidate the list.
#[must_use]
pub fn validate_tab_array(data: &Value) -> ValidationResult {
    let Some(tabs) = data.as_array() else {
        return ValidationResult::invalid("Tab list must be an array");
    };
    let mut result = ValidationResult::new();

    if tabs.is_empty() {
        result.warn("Tab list is empty");
        return result;
    }

    let mut seen: FxHashSet<&str> = FxHashSet::default();
    for (i, tab) in tabs.iter().enumerate() {
        result.absorb(&format!("tabs[{i}]"), validate_tab_record(tab));

        if let Some(url) = tab.get("url").and_then(Value::as_str)
            && !seen.insert(url)
        {
            result.warn(format!("Duplicate URL at index {i}: {url}"));
        }
    }

    result
}

// ============================================================================
// Tests
// ============================================================================
