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

use std::{
    fmt::Display,
    path::{Path, PathBuf},
    str::FromStr,
};

use eyre::{bail, eyre, Error, Result};
use serde::{Deserialize, Serialize};

/// Opaque identifier the debuggee assigns to a live breakpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BreakpointId(pub u64);

impl Display for BreakpointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A breakpoint as reported by the debuggee.
///
/// The protocol addresses breakpoints by [`BreakpointId`]; the `(file, line)` pair is
/// only a logical location and there is at most one live id per location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakpoint {
    /// Identifier used for every protocol-level operation on this breakpoint.
    pub id: BreakpointId,
    /// Source file the breakpoint is set in.
    pub file: PathBuf,
    /// Line number in the source file (1-based).
    pub line: u32,
    /// Optional condition expression evaluated in the debuggee.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// Whether the breakpoint currently triggers.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Breakpoint {
    /// Whether this breakpoint sits at the given logical location.
    pub fn is_at(&self, file: &Path, line: u32) -> bool {
        self.line == line && self.file == file
    }
}

impl Display for Breakpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}:{}", self.id, self.file.display(), self.line)?;
        if let Some(cond) = &self.condition {
            write!(f, " if {cond}")?;
        }
        if !self.enabled {
            write!(f, " (disabled)")?;
        }
        Ok(())
    }
}

/// A breakpoint location as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BreakpointSpec {
    /// Path to the source file.
    pub file: PathBuf,
    /// Line number in the source file (1-based).
    pub line: u32,
    /// Optional condition expression.
    pub condition: Option<String>,
}

impl Display for BreakpointSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)?;
        if let Some(cond) = &self.condition {
            write!(f, " if {cond}")?;
        }
        Ok(())
    }
}

impl FromStr for BreakpointSpec {
    type Err = Error;

    /// Parses a breakpoint from a string.
    /// Format: `<file>:<line> [if <condition>]`
    /// Examples:
    /// - `src/app.py:42`
    /// - `C:\work\app.py:42 if x > 10`
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            bail!("Empty breakpoint location");
        }

        let (loc_str, condition) = match trimmed.find(" if ") {
            Some(if_pos) => {
                let cond = trimmed[if_pos + 4..].trim();
                if cond.is_empty() {
                    bail!("Missing condition after 'if'");
                }
                (trimmed[..if_pos].trim(), Some(cond.to_string()))
            }
            None => (trimmed, None),
        };

        // Split on the last colon so that drive letters survive
        let (file, line) = loc_str
            .rsplit_once(':')
            .ok_or_else(|| eyre!("Invalid breakpoint format. Expected <file>:<line>, got: {s}"))?;
        if file.is_empty() {
            bail!("Missing file in breakpoint location: {s}");
        }
        let line = line.trim().parse::<u32>().map_err(|e| eyre!("Invalid line number: {e}"))?;
        if line == 0 {
            bail!("Line numbers are 1-based");
        }

        Ok(Self { file: PathBuf::from(file), line, condition })
    }
}
