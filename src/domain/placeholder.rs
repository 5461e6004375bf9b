/*
Copyright 2024 San Francisco Compute Company

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

//! Placeholder filtering for vendor firmware default strings
//!
//! Firmware frequently ships with boilerplate such as "To Be Filled By O.E.M."
//! or all-zero serials. Every raw string goes through [`PlaceholderFilter`]
//! before it is stored or classified.

use std::collections::HashSet;

/// Sentinel values reported by firmware when a field was never populated
pub const DEFAULT_SENTINELS: &[&str] = &[
    "default string",
    "default",
    "unknown",
    "not available",
    "not specified",
    "n/a",
    "na",
    "none",
    "to be filled by o.e.m.",
    "system manufacturer",
    "system product name",
    "system version",
    "system serial number",
    "type1productconfigid",
    "sku",
    "system sku",
    "x.x",
    "0000000000000000",
    "00000000",
    "ffffffff-ffff-ffff-ffff-ffffffffffff",
    "00000000-0000-0000-0000-000000000000",
];

/// Canonicalizes sentinel strings to `None`.
///
/// Matching is an exact, case-insensitive comparison on the trimmed input.
/// Anything that is not a sentinel passes through trimmed.
#[derive(Debug, Clone)]
pub struct PlaceholderFilter {
    sentinels: HashSet<String>,
}

impl Default for PlaceholderFilter {
    fn default() -> Self {
        Self::with_extra(std::iter::empty::<&str>())
    }
}

impl PlaceholderFilter {
    /// Build a filter with the default vocabulary plus additional sentinels
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let sentinels = DEFAULT_SENTINELS
            .iter()
            .map(|s| s.to_string())
            .chain(
                extra
                    .into_iter()
                    .map(|s| s.as_ref().trim().to_lowercase())
                    .filter(|s| !s.is_empty()),
            )
            .collect();
        Self { sentinels }
    }

    /// Filter a raw string.
    ///
    /// # Returns
    /// * `None` for empty input or a known sentinel
    /// * `Some(trimmed)` otherwise
    pub fn filter(&self, raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || self.is_sentinel(trimmed) {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    /// Filter an optional raw string
    pub fn filter_opt(&self, raw: Option<&str>) -> Option<String> {
        raw.and_then(|value| self.filter(value))
    }

    /// Filter and substitute a default for absent values
    pub fn filter_or(&self, raw: Option<&str>, default: &str) -> String {
        self.filter_opt(raw).unwrap_or_else(|| default.to_string())
    }

    pub fn is_sentinel(&self, value: &str) -> bool {
        self.sentinels.contains(&value.trim().to_lowercase())
    }
}
