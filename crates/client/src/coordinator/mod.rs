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

//! The debugger session coordinator.
//!
//! [`DebugCoordinator`] is the single control point over a [`ProtocolSession`]. It
//! owns the session and the session flags, turns every session failure into a
//! [`DebugError`] and tells a [`DebugObserver`] about everything views need to
//! follow.
//!
//! Failures are handled in one place:
//! - `NotAttached` flips the coordinator to detached and is never shown;
//! - a finished thread clears the dependent views and is never shown;
//! - anything else is logged, translated and shown exactly once through
//!   [`DebugObserver::on_error_dialog`]. The session stays attached.
//!
//! The coordinator is not safe against two concurrent session-mutating calls;
//! share it as `Arc<tokio::sync::Mutex<_>>` and keep controls disabled while a
//! command is outstanding (see [`CommandAvailability`]).

mod events;
mod observer;
mod state;

pub use observer::{DebugObserver, NoopObserver};
pub use state::{AbortHandle, AttachPolicy, CommandAvailability, SessionState};

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use futures::future;
use rdb_common::{
    Breakpoint, BreakpointId, BreakpointSpec, DebuggeeState, Evaluation, Execution,
    ExpressionRequest, FilterLevel, NamespaceNode, ProtocolError, ServerInfo, SessionEvent,
    StackFrame, StackInfo, ThreadList,
};
use tracing::{debug, error, info, warn};

use crate::{
    config::DebuggerConfig, translate, BreakpointRegistry, DebugError, ErrorKind,
    ProcessLauncher, ProtocolSession, SessionResult,
};

/// Module whose internal stops are resumed automatically.
pub const DEFAULT_DEBUGGER_MODULE: &str = "rpdb2.py";

/// Console banner written after a local attach.
pub const ATTACHED_BANNER: &str = "Debugger attached. Debuggee output starts now...\n\n";

/// Console banner written after attaching to a remote debuggee.
pub const ATTACHED_BANNER_REMOTE: &str = "Debugger attached.\n\n";

/// Console banner written when the session ends.
pub const DETACHED_BANNER: &str = "\n\nDebugger detached.";

/// Single authoritative control point over a debugging session.
pub struct DebugCoordinator<S> {
    session: S,
    observer: Arc<dyn DebugObserver>,
    policy: AttachPolicy,
    encoding: String,
    debugger_module: String,

    state: SessionState,
    debuggee_state: DebuggeeState,
    abort: AbortHandle,
    launcher: Option<Arc<dyn ProcessLauncher>>,

    user_breakpoints: BreakpointRegistry,
    breakpoints_installed: bool,

    stack: Option<StackInfo>,
    frame_index: Option<usize>,
    threads: Option<ThreadList>,
    unhandled_exception: bool,
}

impl<S> std::fmt::Debug for DebugCoordinator<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebugCoordinator")
            .field("state", &self.state)
            .field("debuggee_state", &self.debuggee_state)
            .field("breakpoints_installed", &self.breakpoints_installed)
            .field("frame_index", &self.frame_index)
            .finish_non_exhaustive()
    }
}

impl<S: ProtocolSession> DebugCoordinator<S> {
    /// Create a detached coordinator over `session`.
    pub fn new(session: S) -> Self {
        Self {
            session,
            observer: Arc::new(NoopObserver),
            policy: AttachPolicy::default(),
            encoding: "auto".to_string(),
            debugger_module: DEFAULT_DEBUGGER_MODULE.to_string(),
            state: SessionState::default(),
            debuggee_state: DebuggeeState::Detached,
            abort: AbortHandle::default(),
            launcher: None,
            user_breakpoints: BreakpointRegistry::new(),
            breakpoints_installed: false,
            stack: None,
            frame_index: None,
            threads: None,
            unhandled_exception: false,
        }
    }

    /// Report notifications to `observer`.
    pub fn with_observer(mut self, observer: Arc<dyn DebugObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Use `policy` when attaching.
    pub fn with_attach_policy(mut self, policy: AttachPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Treat stops inside `module` as internal to the debugger.
    pub fn with_debugger_module(mut self, module: impl Into<String>) -> Self {
        self.debugger_module = module.into();
        self
    }

    /// The underlying session.
    pub fn session(&self) -> &S {
        &self.session
    }

    /// Handle to request an abort while the coordinator is busy.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Snapshot of the session flags.
    pub fn state(&self) -> SessionState {
        SessionState { abort_requested: self.abort.is_requested(), ..self.state }
    }

    /// Whether a debuggee is attached.
    pub fn is_attached(&self) -> bool {
        self.state.attached
    }

    /// Whether the debuggee is stopped.
    pub fn is_broken(&self) -> bool {
        self.state.broken
    }

    /// Whether an exception is being analyzed.
    pub fn is_analyzing(&self) -> bool {
        self.state.analyzing
    }

    /// Execution state last reported by the session.
    pub fn debuggee_state(&self) -> DebuggeeState {
        self.debuggee_state
    }

    /// Commands that can be issued now.
    pub fn availability(&self, busy: bool) -> CommandAvailability {
        CommandAvailability::from_state(&self.state, busy)
    }

    /// Run in remote mode, where the debuggee was not started by us.
    pub fn set_remote_mode(&mut self, remote: bool) {
        self.state.remote_mode = remote;
    }

    /// Cached call stack of the inspected thread.
    pub fn stack(&self) -> Option<&StackInfo> {
        self.stack.as_ref()
    }

    /// Cached thread list.
    pub fn threads(&self) -> Option<&ThreadList> {
        self.threads.as_ref()
    }

    /// Index of the selected frame, counted from the innermost frame.
    pub fn selected_frame_index(&self) -> Option<usize> {
        self.frame_index
    }

    /// The selected frame.
    pub fn selected_frame(&self) -> Option<&StackFrame> {
        self.stack.as_ref()?.frame(self.frame_index?)
    }

    /// Whether an unhandled exception was trapped in this run.
    pub fn has_unhandled_exception(&self) -> bool {
        self.unhandled_exception
    }

    /// Whether the user breakpoints were installed in this run.
    pub fn breakpoints_installed(&self) -> bool {
        self.breakpoints_installed
    }

    /// Breakpoints placed by the user.
    pub fn user_breakpoints(&self) -> &BreakpointRegistry {
        &self.user_breakpoints
    }

    /// Mutable access to the user breakpoints, without touching the session.
    pub fn user_breakpoints_mut(&mut self) -> &mut BreakpointRegistry {
        &mut self.user_breakpoints
    }

    // -------- Failure handling --------

    fn ensure_attached(&self) -> Result<(), DebugError> {
        if self.state.attached {
            Ok(())
        } else {
            Err(DebugError::NotAttached)
        }
    }

    /// Turn a session result into a client result, reacting to the failure.
    fn absorb<T>(&mut self, op: &'static str, result: SessionResult<T>) -> Result<T, DebugError> {
        match result {
            Ok(value) => Ok(value),
            Err(ProtocolError::NotAttached) => {
                warn!(op, "Session is no longer attached");
                self.reset_session_state();
                Err(DebugError::NotAttached)
            }
            Err(err) if err.is_thread_gone() => {
                debug!(op, %err, "Inspected thread is gone");
                self.observer.on_clear_views();
                Err(DebugError::ThreadGone)
            }
            Err(err) => {
                let message = translate(&err);
                error!(op, code = err.code(), %err, "Session call failed");
                self.report(ErrorKind::TransportOrProtocol, &message);
                Err(DebugError::Protocol { op, message, source: err })
            }
        }
    }

    fn report(&mut self, kind: ErrorKind, message: &str) {
        self.state.last_error = Some(kind);
        self.observer.on_error_dialog(message);
    }

    /// Back to detached: flags, caches and dependent views are all reset.
    fn reset_session_state(&mut self) {
        let was_attached = self.state.attached;
        if was_attached && self.breakpoints_installed {
            if let Some(launcher) = &self.launcher {
                launcher.add_text(DETACHED_BANNER);
            }
        }

        self.state.attached = false;
        self.state.broken = false;
        self.state.analyzing = false;
        self.debuggee_state = DebuggeeState::Detached;
        self.breakpoints_installed = false;
        self.stack = None;
        self.frame_index = None;
        self.threads = None;
        self.unhandled_exception = false;

        self.observer.on_step_marker_cleared();
        self.observer.on_clear_views();
        if was_attached {
            info!("Debugger detached");
            self.observer.on_detached();
            self.observer.on_state_changed(&self.state());
        }
    }

    // -------- Lifecycle --------

    /// Attach to the debuggee hosted by `launcher`.
    ///
    /// The debuggee needs time to start listening, so attach is retried with a
    /// fixed backoff. When every attempt fails the session is aborted and the
    /// failure is reported through the observer.
    pub async fn attach(&mut self, launcher: Arc<dyn ProcessLauncher>) -> Result<(), DebugError> {
        if self.state.attached {
            return self.absorb("attach", Err(ProtocolError::AlreadyAttached));
        }

        self.launcher = Some(Arc::clone(&launcher));
        let pid = launcher.pid();
        let attempts = self.policy.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            tokio::time::sleep(self.policy.backoff).await;
            info!(pid, attempt, "Trying to attach");

            if self.abort.is_requested() {
                info!(pid, "Attach aborted");
                self.abort().await;
                return Err(DebugError::AttachAborted);
            }

            match self.session.attach(pid, &self.encoding).await {
                Ok(()) => {
                    last_error = None;
                    break;
                }
                Err(err) => {
                    debug!(pid, attempt, %err, "Attach attempt failed");
                    last_error = Some(err);
                }
            }
        }

        if let Some(err) = last_error {
            let message = format!("Failed to attach. Error: {}", translate(&err));
            error!(pid, attempts, "{message}");
            self.abort().await;
            launcher.add_text(&format!("\n{message}\n"));
            self.report(ErrorKind::AttachFailure, &message);
            return Err(DebugError::AttachFailed { attempts, message });
        }

        self.state.attached = true;
        info!(pid, "Debugger attached");
        let banner =
            if self.state.remote_mode { ATTACHED_BANNER_REMOTE } else { ATTACHED_BANNER };
        launcher.add_text(banner);
        self.observer.on_attached(banner);
        self.observer.on_state_changed(&self.state());
        Ok(())
    }

    /// Detach from the debuggee. Does nothing when already detached.
    pub async fn detach(&mut self) -> Result<(), DebugError> {
        if !self.state.attached {
            return Ok(());
        }

        info!("Detaching from debuggee");
        let result = match self.session.detach().await {
            Ok(()) | Err(ProtocolError::NotAttached) => Ok(()),
            Err(err) => self.absorb("detach", Err(err)),
        };
        self.reset_session_state();
        result
    }

    /// Detach, reset every flag and terminate the debuggee process.
    pub async fn abort(&mut self) {
        if let Err(err) = self.detach().await {
            debug!(%err, "Detach during abort failed");
        }
        self.abort.clear();
        self.reset_session_state();

        if let Some(launcher) = self.launcher.take() {
            info!(pid = launcher.pid(), "Aborting debuggee");
            launcher.abort();
        }
    }

    /// Notifications queued by the session since the previous poll.
    ///
    /// Polling repeats, so transport failures are logged rather than shown.
    pub async fn poll_events(&mut self) -> Result<Vec<SessionEvent>, DebugError> {
        self.ensure_attached()?;
        match self.session.poll_events().await {
            Ok(events) => Ok(events),
            Err(ProtocolError::NotAttached) => {
                self.absorb("poll events", Err(ProtocolError::NotAttached))
            }
            Err(err) => {
                warn!(%err, "Polling session events failed");
                Err(DebugError::Protocol { op: "poll events", message: translate(&err), source: err })
            }
        }
    }

    // -------- Execution control --------

    fn clear_step_marker(&self) {
        self.observer.on_step_marker_cleared();
    }

    /// Resume execution.
    pub async fn go(&mut self) -> Result<(), DebugError> {
        self.ensure_attached()?;
        self.clear_step_marker();
        let result = self.session.request_go().await;
        self.absorb("go", result)
    }

    /// Pause execution.
    pub async fn pause(&mut self) -> Result<(), DebugError> {
        self.ensure_attached()?;
        self.clear_step_marker();
        let result = self.session.request_break().await;
        self.absorb("break", result)
    }

    /// Step into the next call.
    pub async fn step_in(&mut self) -> Result<(), DebugError> {
        self.ensure_attached()?;
        self.clear_step_marker();
        let result = self.session.request_step().await;
        self.absorb("step", result)
    }

    /// Step over the next line.
    pub async fn step_over(&mut self) -> Result<(), DebugError> {
        self.ensure_attached()?;
        self.clear_step_marker();
        let result = self.session.request_next().await;
        self.absorb("next", result)
    }

    /// Run until the current function returns.
    pub async fn step_out(&mut self) -> Result<(), DebugError> {
        self.ensure_attached()?;
        self.clear_step_marker();
        let result = self.session.request_return().await;
        self.absorb("return", result)
    }

    /// Move the execution point to `line` of the current frame.
    pub async fn jump(&mut self, line: u32) -> Result<(), DebugError> {
        self.ensure_attached()?;
        self.clear_step_marker();
        let result = self.session.request_jump(line).await;
        self.absorb("jump", result)
    }

    /// Resume until `file:line` is reached.
    pub async fn run_to_line(&mut self, file: &Path, line: u32) -> Result<(), DebugError> {
        self.ensure_attached()?;
        self.clear_step_marker();
        let result = self.session.request_go_breakpoint(file, line).await;
        self.absorb("run to line", result)
    }

    /// Terminate the debuggee.
    pub async fn stop(&mut self) -> Result<(), DebugError> {
        self.ensure_attached()?;
        self.clear_step_marker();
        let result = self.session.stop_debuggee().await;
        self.absorb("stop", result)
    }

    /// Restart the debuggee.
    pub async fn restart(&mut self) -> Result<(), DebugError> {
        self.ensure_attached()?;
        self.clear_step_marker();
        let result = self.session.restart().await;
        self.absorb("restart", result)
    }

    /// Shut down the debugger and the debuggee.
    pub async fn shutdown(&mut self) -> Result<(), DebugError> {
        self.ensure_attached()?;
        self.clear_step_marker();
        let result = self.session.shutdown().await;
        self.absorb("shutdown", result)
    }

    // -------- Breakpoints --------

    /// Install a breakpoint in the debuggee.
    pub async fn set_breakpoint(
        &mut self,
        file: &Path,
        line: u32,
        condition: Option<&str>,
        enabled: bool,
    ) -> Result<(), DebugError> {
        self.ensure_attached()?;
        let result = self.session.set_breakpoint(file, line, enabled, condition).await;
        self.absorb("set breakpoint", result)
    }

    /// Remove the breakpoint at `file:line`; returns whether one was found.
    pub async fn delete_breakpoint(&mut self, file: &Path, line: u32) -> Result<bool, DebugError> {
        let installed = self.breakpoints().await?;
        let Some(bp) = installed.iter().find(|bp| bp.is_at(file, line)) else {
            debug!(file = %file.display(), line, "No breakpoint to delete");
            return Ok(false);
        };
        let result = self.session.delete_breakpoints(&[bp.id]).await;
        self.absorb("delete breakpoint", result)?;
        Ok(true)
    }

    /// Enable an installed breakpoint.
    pub async fn enable_breakpoint(&mut self, id: BreakpointId) -> Result<(), DebugError> {
        self.ensure_attached()?;
        let result = self.session.enable_breakpoints(&[id]).await;
        self.absorb("enable breakpoint", result)
    }

    /// Disable an installed breakpoint.
    pub async fn disable_breakpoint(&mut self, id: BreakpointId) -> Result<(), DebugError> {
        self.ensure_attached()?;
        let result = self.session.disable_breakpoints(&[id]).await;
        self.absorb("disable breakpoint", result)
    }

    /// Remove every installed breakpoint.
    pub async fn clear_breakpoints(&mut self) -> Result<(), DebugError> {
        self.ensure_attached()?;
        let result = self.session.clear_breakpoints().await;
        self.absorb("clear breakpoints", result)
    }

    /// Breakpoints installed in the debuggee.
    pub async fn breakpoints(&mut self) -> Result<Vec<Breakpoint>, DebugError> {
        self.ensure_attached()?;
        let result = self.session.breakpoints().await;
        self.absorb("get breakpoints", result)
    }

    /// Restore the breakpoints saved by the debuggee. Failures are ignored.
    pub async fn load_breakpoints(&mut self) {
        if let Err(err) = self.session.load_breakpoints().await {
            debug!(%err, "No saved breakpoints loaded");
        }
    }

    /// Place a user breakpoint, installing it right away when attached.
    pub async fn add_user_breakpoint(&mut self, spec: BreakpointSpec) -> Result<bool, DebugError> {
        let (file, line, condition) = (spec.file.clone(), spec.line, spec.condition.clone());
        if !self.user_breakpoints.add(spec) {
            return Ok(false);
        }
        if self.state.attached {
            self.set_breakpoint(&file, line, condition.as_deref(), true).await?;
        }
        Ok(true)
    }

    /// Remove a user breakpoint, deleting it from the debuggee when attached.
    pub async fn remove_user_breakpoint(
        &mut self,
        file: &Path,
        line: u32,
    ) -> Result<bool, DebugError> {
        if self.user_breakpoints.remove(file, line).is_none() {
            return Ok(false);
        }
        if self.state.attached {
            self.delete_breakpoint(file, line).await?;
        }
        Ok(true)
    }

    /// Enable or disable the user breakpoint at `file:line`; returns false if
    /// there is none.
    ///
    /// When attached, the matching debuggee breakpoint follows.
    pub async fn set_user_breakpoint_enabled(
        &mut self,
        file: &Path,
        line: u32,
        enabled: bool,
    ) -> Result<bool, DebugError> {
        if !self.user_breakpoints.set_enabled(file, line, enabled) {
            return Ok(false);
        }
        if !self.state.attached {
            return Ok(true);
        }

        let installed = self.breakpoints().await?;
        match installed.iter().find(|bp| bp.is_at(file, line)) {
            Some(bp) if enabled => self.enable_breakpoint(bp.id).await?,
            Some(bp) => self.disable_breakpoint(bp.id).await?,
            None => debug!(file = %file.display(), line, "Breakpoint not installed in debuggee"),
        }
        Ok(true)
    }

    /// Add or remove the user breakpoint at `file:line`; returns whether one
    /// exists afterwards.
    pub async fn toggle_user_breakpoint(
        &mut self,
        file: &Path,
        line: u32,
    ) -> Result<bool, DebugError> {
        let present = self.user_breakpoints.toggle(file, line);
        if self.state.attached {
            if present {
                self.set_breakpoint(file, line, None, true).await?;
            } else {
                self.delete_breakpoint(file, line).await?;
            }
        }
        Ok(present)
    }

    /// Replace the debuggee breakpoints with the user breakpoints.
    ///
    /// Breakpoints in files that do not exist locally are skipped.
    pub async fn install_breakpoints(&mut self) {
        self.load_breakpoints().await;
        if let Err(err) = self.clear_breakpoints().await {
            debug!(%err, "Could not clear breakpoints before installing");
        }

        let entries: Vec<(PathBuf, u32, Option<String>, bool)> = self
            .user_breakpoints
            .iter()
            .map(|((file, line), bp)| (file.clone(), *line, bp.condition.clone(), bp.enabled))
            .collect();

        info!(count = entries.len(), "Installing breakpoints");
        for (file, line, condition, enabled) in entries {
            if !file.is_file() {
                debug!(file = %file.display(), line, "Skipping breakpoint in missing file");
                continue;
            }
            match self.set_breakpoint(&file, line, condition.as_deref(), enabled).await {
                Ok(()) => {
                    info!(file = %file.display(), line, enabled, ?condition, "Breakpoint installed")
                }
                Err(err) => debug!(file = %file.display(), line, %err, "Breakpoint not installed"),
            }
        }
    }

    // -------- Inspection --------

    /// Fetch the call stack and position on its selected frame.
    pub async fn refresh_stack(&mut self) -> Result<(), DebugError> {
        self.ensure_attached()?;
        let result = self.session.stack().await;
        let stack = self.absorb("get stack", result)?;
        self.apply_stack(stack).await;
        Ok(())
    }

    /// Frame selected in the debuggee.
    pub async fn frame_index(&mut self) -> Result<usize, DebugError> {
        self.ensure_attached()?;
        let result = self.session.frame_index().await;
        self.absorb("get frame index", result)
    }

    /// Select the frame to inspect.
    pub async fn set_frame_index(&mut self, index: usize) -> Result<(), DebugError> {
        self.ensure_attached()?;
        let result = self.session.set_frame_index(index).await;
        self.absorb("set frame index", result)
    }

    /// Threads of the debuggee.
    pub async fn thread_list(&mut self) -> Result<ThreadList, DebugError> {
        self.ensure_attached()?;
        let result = self.session.thread_list().await;
        let threads = self.absorb("get thread list", result)?;
        self.threads = Some(threads.clone());
        Ok(threads)
    }

    /// Select the thread to inspect.
    pub async fn set_thread(&mut self, tid: u64) -> Result<(), DebugError> {
        self.ensure_attached()?;
        let result = self.session.set_thread(tid).await;
        self.absorb("set thread", result)
    }

    /// Evaluate a batch of namespace expressions.
    pub async fn namespace(
        &mut self,
        requests: &[ExpressionRequest],
        level: FilterLevel,
    ) -> Result<Vec<NamespaceNode>, DebugError> {
        self.ensure_attached()?;
        let result = self.session.namespace(requests, level).await;
        self.absorb("get namespace", result)
    }

    /// Evaluate an expression in the selected frame.
    pub async fn evaluate(&mut self, expr: &str) -> Result<Evaluation, DebugError> {
        self.ensure_attached()?;
        let result = self.session.evaluate(expr).await;
        self.absorb("evaluate", result)
    }

    /// Evaluate an expression and the name of its type.
    pub async fn evaluate_with_type(
        &mut self,
        expr: &str,
    ) -> Result<(Evaluation, Evaluation), DebugError> {
        self.ensure_attached()?;
        let type_expr = format!("type({expr}).__name__");
        let (value, type_name) =
            future::join(self.session.evaluate(expr), self.session.evaluate(&type_expr)).await;
        let value = self.absorb("evaluate", value)?;
        let type_name = self.absorb("evaluate", type_name)?;
        Ok((value, type_name))
    }

    /// Execute a statement suite in the selected frame.
    pub async fn execute(&mut self, suite: &str) -> Result<Execution, DebugError> {
        self.ensure_attached()?;
        let result = self.session.execute(suite).await;
        self.absorb("execute", result)
    }

    /// Assign `value` to the variable `expr` in the selected frame.
    ///
    /// An error raised by the assignment inside the debuggee is shown to the user.
    pub async fn assign(&mut self, expr: &str, value: &str) -> Result<Execution, DebugError> {
        let execution = self.execute(&format!("{expr} = {value}")).await?;
        if let Some(warning) = execution.warning.as_deref().filter(|w| !w.is_empty()) {
            warn!(expr, warning, "Assignment produced a warning");
        }
        if let Some(error) = execution.error.as_deref().filter(|e| !e.is_empty()) {
            debug!(expr, error, "Assignment failed in the debuggee");
            self.report(ErrorKind::TransportOrProtocol, error);
        }
        Ok(execution)
    }

    // -------- Settings --------

    /// Push the configured debugger settings to the session.
    ///
    /// Each failure is reported on its own; the remaining settings are still applied.
    pub async fn apply_settings(&mut self, config: &DebuggerConfig) {
        self.encoding = config.encoding.clone();
        self.debugger_module = config.debugger_module.clone();
        self.state.remote_mode = config.remote;

        let _ = self.set_trap_unhandled_exceptions(config.trap_exceptions).await;
        let _ = self.set_synchronicity(config.synchronicity).await;
        let _ = self.set_fork_mode(config.fork_mode, config.auto_fork).await;
        let _ = self.set_encoding(&config.encoding, config.escaping).await;
        let _ = self.set_host(&config.default_host).await;
        if !config.default_password.is_empty() {
            let _ = self.set_password(&config.default_password).await;
        }
    }

    /// Whether the inspected frame follows the running thread.
    pub async fn synchronicity(&mut self) -> Result<bool, DebugError> {
        let result = self.session.synchronicity().await;
        self.absorb("get synchronicity", result)
    }

    /// Set whether the inspected frame follows the running thread.
    pub async fn set_synchronicity(&mut self, enabled: bool) -> Result<(), DebugError> {
        let result = self.session.set_synchronicity(enabled).await;
        self.absorb("set synchronicity", result)
    }

    /// Whether unhandled exceptions stop the debuggee.
    pub async fn trap_unhandled_exceptions(&mut self) -> Result<bool, DebugError> {
        let result = self.session.trap_unhandled_exceptions().await;
        self.absorb("get trap exceptions", result)
    }

    /// Set whether unhandled exceptions stop the debuggee.
    pub async fn set_trap_unhandled_exceptions(&mut self, trap: bool) -> Result<(), DebugError> {
        let result = self.session.set_trap_unhandled_exceptions(trap).await;
        self.absorb("set trap exceptions", result)
    }

    /// Fork mode as `(follow_child, automatic)`.
    pub async fn fork_mode(&mut self) -> Result<(bool, bool), DebugError> {
        let result = self.session.fork_mode().await;
        self.absorb("get fork mode", result)
    }

    /// Set the fork mode.
    pub async fn set_fork_mode(
        &mut self,
        follow_child: bool,
        automatic: bool,
    ) -> Result<(), DebugError> {
        let result = self.session.set_fork_mode(follow_child, automatic).await;
        self.absorb("set fork mode", result)
    }

    /// Encoding as `(encoding, escaping)`.
    pub async fn encoding(&mut self) -> Result<(String, bool), DebugError> {
        let result = self.session.encoding().await;
        self.absorb("get encoding", result)
    }

    /// Set the encoding of values sent back by the debuggee.
    pub async fn set_encoding(&mut self, encoding: &str, escaping: bool) -> Result<(), DebugError> {
        let result = self.session.set_encoding(encoding, escaping).await;
        self.absorb("set encoding", result)
    }

    /// Enter or leave exception analysis.
    pub async fn set_analyze(&mut self, analyze: bool) -> Result<(), DebugError> {
        self.ensure_attached()?;
        let result = self.session.set_analyze(analyze).await;
        self.absorb("set analyze", result)
    }

    /// Host the session connects to.
    pub async fn host(&mut self) -> Result<String, DebugError> {
        let result = self.session.host().await;
        self.absorb("get host", result)
    }

    /// Change the host the session connects to.
    pub async fn set_host(&mut self, host: &str) -> Result<(), DebugError> {
        let result = self.session.set_host(host).await;
        self.absorb("set host", result)
    }

    /// Password protecting the channel.
    pub async fn password(&mut self) -> Result<String, DebugError> {
        let result = self.session.password().await;
        self.absorb("get password", result)
    }

    /// Change the password protecting the channel.
    pub async fn set_password(&mut self, password: &str) -> Result<(), DebugError> {
        let result = self.session.set_password(password).await;
        self.absorb("set password", result)
    }

    /// Debuggees waiting for a client on `host`.
    pub async fn server_list(&mut self, host: &str) -> Result<Vec<ServerInfo>, DebugError> {
        self.set_host(host).await?;
        let result = self.session.calc_server_list().await;
        self.absorb("list servers", result)
    }
}
