//! Wire-format version parsing.
//!
//! Snapshots carry a `MAJOR.MINOR.PATCH` version string. Only the major
//! component decides compatibility; pre-release and build suffixes are
//! ignored.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

// ============================================================================
// Constants
// ============================================================================

/// Version of the snapshot wire format produced by this crate.
pub const SYNC_FORMAT_VERSION: &str = "1.0.0";

/// Version stamped into each record's metadata by the serializer.
pub const SERIALIZER_VERSION: &str = "1.0.0";

static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(0|[1-9]\d*)\.(0|[1-9]\d*)\.(0|[1-9]\d*)(?:[-+][0-9A-Za-z.+-]*)?$")
        .expect("static version pattern is valid")
});

// ============================================================================
// WireVersion
// ============================================================================

/// A parsed semantic version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WireVersion {
    /// Major component. Must match for two sides to interoperate.
    pub major: u64,
    /// Minor component.
    pub minor: u64,
    /// Patch component.
    pub patch: u64,
}

impl WireVersion {
    /// Creates a version from its components.
    #[inline]
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parses a version string, returning `None` if it is not semantic.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let caps = VERSION_PATTERN.captures(input.trim())?;
        let component = |i: usize| caps.get(i)?.as_str().parse::<u64>().ok();
        Some(Self::new(component(1)?, component(2)?, component(3)?))
    }

    /// Returns the version of the wire format produced by this crate.
    #[must_use]
    pub fn current() -> Self {
        Self::parse(SYNC_FORMAT_VERSION).unwrap_or(Self::new(1, 0, 0))
    }

    /// Returns `true` if data written at `other` can be read at `self`.
    ///
    /// Minor and patch drift are tolerated in both directions.
    #[inline]
    #[must_use]
    pub const fn is_compatible_with(&self, other: &Self) -> bool {
        self.major == other.major
    }
}

impl FromStr for WireVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("not a semantic version: {s}"))
    }
}

impl fmt::Display for WireVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain() {
        assert_eq!(WireVersion::parse("1.5.3"), Some(WireVersion::new(1, 5, 3)));
    }

    #[test]
    fn test_parse_with_suffix() {
        assert_eq!(
            WireVersion::parse("2.0.0-beta.1"),
            Some(WireVersion::new(2, 0, 0))
        );
        assert_eq!(
            WireVersion::parse("1.0.0+build.7"),
            Some(WireVersion::new(1, 0, 0))
        );
    }

    #[test]
    fn test_parse_rejects_non_semver() {
        assert!(WireVersion::parse("1.0").is_none());
        assert!(WireVersion::parse("v1.0.0").is_none());
        assert!(WireVersion::parse("01.0.0").is_none());
        assert!(WireVersion::parse("").is_none());
    }

    #[test]
    fn test_compatibility_is_major_only() {
        let local = WireVersion::new(1, 0, 0);
        assert!(local.is_compatible_with(&WireVersion::new(1, 5, 3)));
        assert!(local.is_compatible_with(&WireVersion::new(1, 0, 9)));
        assert!(!local.is_compatible_with(&WireVersion::new(2, 0, 0)));
        assert!(!local.is_compatible_with(&WireVersion::new(0, 9, 0)));
    }

    #[test]
    fn test_current_matches_constant() {
        assert_eq!(WireVersion::current().to_string(), SYNC_FORMAT_VERSION);
    }

    #[test]
    fn test_from_str() {
        let v: WireVersion = "3.2.1".parse().unwrap();
        assert_eq!(v, WireVersion::new(3, 2, 1));
        assert!("nope".parse::<WireVersion>().is_err());
    }
}
