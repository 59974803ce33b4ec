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

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use super::{StackInfo, ThreadList};

/// Execution state of the debuggee as seen by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebuggeeState {
    /// No debuggee
    Detached,
    /// Detach in progress
    Detaching,
    /// Debuggee process being spawned
    Spawning,
    /// Attach in progress
    Attaching,
    /// Debuggee running freely
    Running,
    /// Debuggee stopped at a breakpoint or after a step
    Broken,
    /// Debuggee stopped while an exception is analyzed
    Analyzing,
}

impl DebuggeeState {
    /// Whether the session has no usable debuggee in this state.
    pub fn is_detached_like(self) -> bool {
        matches!(self, Self::Detached | Self::Detaching | Self::Spawning | Self::Attaching)
    }
}

impl Display for DebuggeeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Detached => "detached",
            Self::Detaching => "detaching",
            Self::Spawning => "spawning",
            Self::Attaching => "attaching",
            Self::Running => "running",
            Self::Broken => "broken",
            Self::Analyzing => "analyzing",
        };
        write!(f, "{s}")
    }
}

/// Notification pushed by the session when the debuggee changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The debuggee changed execution state
    State(DebuggeeState),
    /// A new call stack is available
    Stack(StackInfo),
    /// The selected frame changed
    FrameChanged(usize),
    /// The thread list changed
    Threads(ThreadList),
    /// The debuggee has no threads left
    NoThreads,
    /// A thread stopped
    ThreadBroken {
        /// Thread id
        tid: u64,
        /// Thread name
        name: String,
    },
    /// Namespace values may have changed
    NamespaceChanged,
    /// An unhandled exception was trapped
    UnhandledException,
    /// Modules known to conflict with the debugger were loaded
    ConflictingModules(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detached_like_states() {
        assert!(DebuggeeState::Detached.is_detached_like());
        assert!(DebuggeeState::Attaching.is_detached_like());
        assert!(!DebuggeeState::Running.is_detached_like());
        assert!(!DebuggeeState::Broken.is_detached_like());
    }

    #[test]
    fn test_event_wire_format() {
        let event: SessionEvent =
            serde_json::from_str(r#"{"event": "state", "data": "broken"}"#).unwrap();
        assert_eq!(event, SessionEvent::State(DebuggeeState::Broken));

        let event: SessionEvent = serde_json::from_str(r#"{"event": "no_threads"}"#).unwrap();
        assert_eq!(event, SessionEvent::NoThreads);

        let event: SessionEvent = serde_json::from_str(
            r#"{"event": "thread_broken", "data": {"tid": 7, "name": "worker"}}"#,
        )
        .unwrap();
        assert_eq!(event, SessionEvent::ThreadBroken { tid: 7, name: "worker".to_string() });
    }
}
