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

use rdb_common::{DebuggeeState, SessionEvent, StackInfo};
use tracing::{debug, info, warn};

use super::DebugCoordinator;
use crate::ProtocolSession;

impl<S: ProtocolSession> DebugCoordinator<S> {
    /// Apply a notification pushed by the session.
    ///
    /// Must be called from the task that owns the views, in the order the
    /// notifications were received.
    pub async fn handle_event(&mut self, event: SessionEvent) {
        debug!(?event, "Session event");
        match event {
            SessionEvent::State(state) => self.apply_debuggee_state(state),
            SessionEvent::Stack(stack) => self.apply_stack(stack).await,
            SessionEvent::FrameChanged(index) => self.select_frame(index).await,
            SessionEvent::Threads(threads) => {
                self.observer.on_threads_updated(&threads);
                self.threads = Some(threads);
            }
            SessionEvent::NoThreads => self.reset_session_state(),
            SessionEvent::ThreadBroken { tid, name } => self.observer.on_thread_broken(tid, &name),
            SessionEvent::NamespaceChanged => self.observer.on_namespace_changed(),
            SessionEvent::UnhandledException => {
                self.unhandled_exception = true;
                self.observer.on_unhandled_exception();
            }
            SessionEvent::ConflictingModules(modules) => {
                let modules = modules.join(", ");
                warn!(%modules, "Modules incompatible with the debugger were loaded");
                self.observer.on_conflicting_modules(&modules);
            }
        }
    }

    fn apply_debuggee_state(&mut self, new_state: DebuggeeState) {
        let old_state = std::mem::replace(&mut self.debuggee_state, new_state);
        info!(from = %old_state, to = %new_state, "Debuggee state changed");

        if new_state == DebuggeeState::Detached {
            self.reset_session_state();
        } else if old_state.is_detached_like() && !new_state.is_detached_like() {
            self.state.attached = true;
        }

        let attached = self.state.attached;
        self.state.broken = attached && new_state == DebuggeeState::Broken;
        self.state.analyzing = attached && new_state == DebuggeeState::Analyzing;

        self.observer.on_state_changed(&self.state());
    }

    /// Cache a new stack and position on the frame the session selected.
    pub(super) async fn apply_stack(&mut self, stack: StackInfo) {
        self.observer.on_stack_updated(&stack);
        self.stack = Some(stack);

        match self.frame_index().await {
            Ok(index) => self.select_frame(index).await,
            Err(err) => debug!(%err, "No frame selected for the new stack"),
        }
    }

    async fn select_frame(&mut self, index: usize) {
        self.frame_index = Some(index);
        self.set_position(index).await;
        self.observer.on_frame_selected(index);
    }

    async fn set_position(&mut self, index: usize) {
        if self.abort.is_requested() {
            self.abort().await;
            return;
        }

        let Some(stack) = &self.stack else {
            return;
        };
        let Some(frame) = stack.frame(index) else {
            warn!(index, frames = stack.frames.len(), "Frame index out of range");
            return;
        };
        let (file, line) = (frame.file.clone(), frame.line);
        if !stack.broken {
            return;
        }

        if !self.breakpoints_installed {
            self.install_breakpoints().await;
            self.breakpoints_installed = true;
            if let Err(err) = self.go().await {
                debug!(%err, "Could not resume after installing breakpoints");
            }
            return;
        }

        if self.is_debugger_stop(&file, line) {
            if !self.unhandled_exception {
                debug!(file = %file.display(), line, "Resuming from a stop inside the debugger");
                if let Err(err) = self.go().await {
                    debug!(%err, "Could not resume from debugger stop");
                }
            }
            return;
        }

        self.observer.on_step_marker_set(&file, line);
    }

    /// Whether `file:line` is inside the debugger module and not a user breakpoint.
    fn is_debugger_stop(&self, file: &Path, line: u32) -> bool {
        file.to_string_lossy().contains(self.debugger_module.as_str())
            && !self.user_breakpoints.contains(file, line)
    }
}
