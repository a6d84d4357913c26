// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Semantic versions for config files, migrations, and the engine itself.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The running engine version (the workspace package version).
pub const ENGINE_VERSION_STR: &str = env!("CARGO_PKG_VERSION");

/// The running engine version.
pub const ENGINE_VERSION: Version = match parse_release(ENGINE_VERSION_STR) {
    Some(v) => v,
    None => Version::ZERO,
};

/// Compile-time parse of a plain `MAJOR.MINOR.PATCH` string.
const fn parse_release(s: &str) -> Option<Version> {
    let bytes = s.as_bytes();
    let mut parts = [0u64; 3];
    let mut part = 0;
    let mut digits = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'0'..=b'9' => {
                parts[part] = parts[part] * 10 + (bytes[i] - b'0') as u64;
                digits += 1;
            }
            b'.' if digits > 0 && part < 2 => {
                part += 1;
                digits = 0;
            }
            _ => return None,
        }
        i += 1;
    }
    if part != 2 || digits == 0 {
        return None;
    }
    Some(Version::new(parts[0], parts[1], parts[2]))
}

/// A `MAJOR.MINOR.PATCH` version.
///
/// Ordering is numeric on each component. Pre-release and build suffixes are
/// not accepted: config files and migrations only ever carry release versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid version '{input}': {reason}")]
pub struct VersionError {
    pub input: String,
    pub reason: &'static str,
}

impl Version {
    /// The version assumed for legacy files when no bootstrap marker exists.
    pub const ZERO: Version = Version::new(0, 0, 0);

    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self { major, minor, patch }
    }

    /// True when both versions share a major component.
    pub fn same_major(&self, other: &Version) -> bool {
        self.major == other.major
    }

    /// True when both versions share major and minor components.
    pub fn same_minor(&self, other: &Version) -> bool {
        self.major == other.major && self.minor == other.minor
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = |reason| VersionError { input: s.to_string(), reason };
        let trimmed = s.trim();
        let body = trimmed.strip_prefix('v').unwrap_or(trimmed);
        if body.is_empty() {
            return Err(err("empty"));
        }

        let mut parts = [0u64; 3];
        let mut count = 0;
        for part in body.split('.') {
            if count == 3 {
                return Err(err("expected exactly three components"));
            }
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(err("components must be unsigned integers"));
            }
            if part.len() > 1 && part.starts_with('0') {
                return Err(err("components must not have leading zeros"));
            }
            parts[count] = part.parse().map_err(|_| err("component out of range"))?;
            count += 1;
        }
        if count != 3 {
            return Err(err("expected exactly three components"));
        }

        Ok(Version::new(parts[0], parts[1], parts[2]))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "version_tests.rs"]
mod tests;
