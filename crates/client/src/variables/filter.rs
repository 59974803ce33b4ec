// RDB - Remote Debugger
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use regex::Regex;

use crate::DebugError;

/// Filter on the names of child variables.
///
/// The pattern must match at the start of the name; an empty pattern keeps
/// every child.
#[derive(Debug, Clone, Default)]
pub struct NameFilter {
    pattern: String,
    regex: Option<Regex>,
}

impl NameFilter {
    /// Compile `pattern`.
    pub fn new(pattern: &str) -> Result<Self, DebugError> {
        let regex = if pattern.is_empty() {
            None
        } else {
            Some(Regex::new(&format!("^(?:{pattern})"))?)
        };
        Ok(Self { pattern: pattern.to_string(), regex })
    }

    /// The pattern as written by the user.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether a child called `name` is shown.
    pub fn matches(&self, name: &str) -> bool {
        self.regex.as_ref().is_none_or(|regex| regex.is_match(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_keeps_everything() {
        let filter = NameFilter::default();
        assert!(filter.matches("__doc__"));
        assert!(filter.matches(""));
    }

    #[test]
    fn test_match_is_anchored_at_start() {
        let filter = NameFilter::new("[^_]").unwrap();
        assert!(filter.matches("x"));
        assert!(!filter.matches("__doc__"));

        let filter = NameFilter::new("a|b").unwrap();
        assert!(filter.matches("bar"));
        assert!(!filter.matches("cab"));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(matches!(NameFilter::new("("), Err(DebugError::InvalidFilter(_))));
    }
}
