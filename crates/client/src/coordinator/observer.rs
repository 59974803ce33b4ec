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

use std::path::Path;

use rdb_common::{StackInfo, ThreadList};

use super::SessionState;

/// Receiver of coordinator notifications.
///
/// Every hook defaults to doing nothing, so views implement only what they show.
/// Hooks are called on the task driving the coordinator.
#[allow(unused_variables)]
pub trait DebugObserver: Send + Sync {
    /// The session attached; `banner` is the text echoed to the debuggee console.
    fn on_attached(&self, banner: &str) {}

    /// The session went from attached to detached.
    fn on_detached(&self) {}

    /// `attached`, `broken` or `analyzing` changed.
    fn on_state_changed(&self, state: &SessionState) {}

    /// Execution stopped at `file:line`.
    fn on_step_marker_set(&self, file: &Path, line: u32) {}

    /// The current execution point is no longer meaningful.
    fn on_step_marker_cleared(&self) {}

    /// A failure must be shown to the user.
    fn on_error_dialog(&self, message: &str) {}

    /// Cached stack, thread and variable views must be emptied.
    fn on_clear_views(&self) {}

    /// A new call stack is available.
    fn on_stack_updated(&self, stack: &StackInfo) {}

    /// The thread list changed.
    fn on_threads_updated(&self, threads: &ThreadList) {}

    /// The inspected frame changed.
    fn on_frame_selected(&self, index: usize) {}

    /// A thread stopped.
    fn on_thread_broken(&self, tid: u64, name: &str) {}

    /// Namespace values may have changed.
    fn on_namespace_changed(&self) {}

    /// The debuggee raised an unhandled exception.
    fn on_unhandled_exception(&self) {}

    /// Modules incompatible with the debugger were loaded.
    fn on_conflicting_modules(&self, modules: &str) {}
}

/// Observer that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl DebugObserver for NoopObserver {}
