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

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A single frame of the debuggee call stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackFrame {
    /// Source file executing in this frame
    pub file: PathBuf,
    /// Current line in `file` (1-based)
    pub line: u32,
    /// Name of the code object (function, method or module) of this frame
    pub function: String,
}

/// Call stack of the current thread.
///
/// Frames are ordered outermost first, so the innermost (current) frame is the last
/// element. Frame indices used by the protocol count from the innermost frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackInfo {
    /// Frames, outermost first
    #[serde(default)]
    pub frames: Vec<StackFrame>,
    /// Whether the thread owning this stack is stopped
    #[serde(default)]
    pub broken: bool,
    /// Thread the stack belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<u64>,
}

impl StackInfo {
    /// Frame at `index`, counted from the innermost frame.
    pub fn frame(&self, index: usize) -> Option<&StackFrame> {
        let len = self.frames.len();
        if index >= len {
            return None;
        }
        self.frames.get(len - 1 - index)
    }

    /// Whether there are no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// A thread of the debuggee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadInfo {
    /// Thread id
    pub tid: u64,
    /// Thread name
    pub name: String,
    /// Whether the thread is stopped
    #[serde(default)]
    pub broken: bool,
}

/// Threads of the debuggee and the one currently selected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadList {
    /// Selected thread
    #[serde(default)]
    pub current: Option<u64>,
    /// All known threads
    #[serde(default)]
    pub threads: Vec<ThreadInfo>,
}
