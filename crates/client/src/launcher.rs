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

//! The process that hosts the debuggee.

use std::sync::Arc;

use parking_lot::Mutex;

/// Owner of the debuggee process and of its output console.
///
/// The coordinator reads the pid when attaching, echoes session banners into the
/// console and asks the launcher to terminate the process on abort.
pub trait ProcessLauncher: Send + Sync {
    /// Process id of the debuggee.
    fn pid(&self) -> u32;

    /// Append text to the debuggee console.
    fn add_text(&self, text: &str);

    /// Terminate the debuggee process.
    fn abort(&self);
}

/// Launcher for a debuggee started outside of RDB.
///
/// Console text is kept in memory and aborting only records the request.
#[derive(Debug, Clone)]
pub struct ExternalProcess {
    pid: u32,
    output: Arc<Mutex<Vec<String>>>,
    aborted: Arc<Mutex<bool>>,
}

impl ExternalProcess {
    /// Launcher for the already running process `pid`.
    pub fn new(pid: u32) -> Self {
        Self { pid, output: Arc::default(), aborted: Arc::default() }
    }

    /// Drain the console text written since the last call.
    pub fn take_output(&self) -> Vec<String> {
        std::mem::take(&mut *self.output.lock())
    }

    /// Whether an abort was requested.
    pub fn is_aborted(&self) -> bool {
        *self.aborted.lock()
    }
}

impl ProcessLauncher for ExternalProcess {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn add_text(&self, text: &str) {
        self.output.lock().push(text.to_string());
    }

    fn abort(&self) {
        *self.aborted.lock() = true;
    }
}
