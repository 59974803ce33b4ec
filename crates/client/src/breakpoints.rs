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

//! Breakpoints placed by the user.
//!
//! The registry outlives sessions: it is edited while no debuggee is attached and
//! installed into the debuggee on its first stop.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use rdb_common::BreakpointSpec;

/// State of one user breakpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserBreakpoint {
    /// Whether the breakpoint triggers
    pub enabled: bool,
    /// Optional condition expression
    pub condition: Option<String>,
}

/// User breakpoints keyed by `(file, line)`.
#[derive(Debug, Clone, Default, derive_more::Deref)]
pub struct BreakpointRegistry {
    entries: BTreeMap<(PathBuf, u32), UserBreakpoint>,
}

impl BreakpointRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an enabled breakpoint; returns false if one already exists there.
    pub fn add(&mut self, spec: BreakpointSpec) -> bool {
        let key = (spec.file, spec.line);
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, UserBreakpoint { enabled: true, condition: spec.condition });
        true
    }

    /// Remove the breakpoint at `file:line`
    pub fn remove(&mut self, file: &Path, line: u32) -> Option<UserBreakpoint> {
        self.entries.remove(&(file.to_path_buf(), line))
    }

    /// Toggle the breakpoint at `file:line`; returns whether one exists afterwards.
    pub fn toggle(&mut self, file: &Path, line: u32) -> bool {
        let key = (file.to_path_buf(), line);
        if self.entries.remove(&key).is_some() {
            false
        } else {
            self.entries.insert(key, UserBreakpoint { enabled: true, condition: None });
            true
        }
    }

    /// Enable or disable the breakpoint at `file:line`; returns false if there is none.
    pub fn set_enabled(&mut self, file: &Path, line: u32, enabled: bool) -> bool {
        match self.entries.get_mut(&(file.to_path_buf(), line)) {
            Some(bp) => {
                bp.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Breakpoint at `file:line`, if any
    pub fn get(&self, file: &Path, line: u32) -> Option<&UserBreakpoint> {
        self.entries.get(&(file.to_path_buf(), line))
    }

    /// Whether a breakpoint exists at `file:line`
    pub fn contains(&self, file: &Path, line: u32) -> bool {
        self.get(file, line).is_some()
    }

    /// Sorted lines with a breakpoint in `file`
    pub fn lines_in(&self, file: &Path) -> Vec<u32> {
        self.entries.keys().filter(|(f, _)| f == file).map(|(_, line)| *line).collect()
    }

    /// Remove every breakpoint
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
