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
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use crate::ErrorKind;

/// Session flags as seen by views.
///
/// `broken` and `analyzing` are only ever set while `attached` is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionState {
    /// A debuggee is attached
    pub attached: bool,
    /// The debuggee is stopped
    pub broken: bool,
    /// An exception is being analyzed
    pub analyzing: bool,
    /// An abort was requested and not yet carried out
    pub abort_requested: bool,
    /// The debuggee runs on another host
    pub remote_mode: bool,
    /// Class of the last failure shown to the user
    pub last_error: Option<ErrorKind>,
}

/// Which commands can be issued in the current state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandAvailability {
    /// Resume execution
    pub go: bool,
    /// Step into
    pub step_in: bool,
    /// Step over
    pub step_over: bool,
    /// Step out
    pub step_out: bool,
    /// Pause execution
    pub pause: bool,
    /// Abort the session
    pub abort: bool,
    /// Attach to a debuggee
    pub attach: bool,
}

impl CommandAvailability {
    /// Availability for `state`; everything is disabled while a command is `busy`.
    pub fn from_state(state: &SessionState, busy: bool) -> Self {
        if busy {
            return Self::default();
        }
        let stopped = state.attached && state.broken;
        Self {
            go: stopped,
            step_in: stopped,
            step_over: stopped,
            step_out: stopped,
            pause: state.attached && !state.broken && !state.analyzing,
            abort: state.attached,
            attach: !state.attached,
        }
    }
}

/// How often and how patiently attach is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachPolicy {
    /// Attempts before giving up (at least one is always made)
    pub max_attempts: u32,
    /// Wait before each attempt
    pub backoff: Duration,
}

impl Default for AttachPolicy {
    fn default() -> Self {
        Self { max_attempts: 5, backoff: Duration::from_secs(1) }
    }
}

/// Handle to request an abort from outside the coordinator.
///
/// Checked between attach attempts and whenever the coordinator positions on a
/// frame. Usable while the coordinator itself is locked.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    /// Request an abort.
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether an abort is pending.
    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub(crate) fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
