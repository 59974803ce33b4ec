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

//! The debugging session seen from the client.
//!
//! A [`ProtocolSession`] is the live connection to one debuggee. The client never
//! depends on how requests travel; [`crate::RpcSession`] is the JSON-RPC
//! implementation.

use std::{future::Future, path::Path};

use rdb_common::{
    Breakpoint, BreakpointId, Evaluation, Execution, ExpressionRequest, FilterLevel,
    NamespaceNode, ProtocolError, ServerInfo, SessionEvent, StackInfo, ThreadList,
};

/// Result of a single session call.
pub type SessionResult<T> = Result<T, ProtocolError>;

/// Operations offered by a debugging session.
///
/// Every call may fail with [`ProtocolError::NotAttached`] when the debuggee went
/// away, or with any transport failure.
pub trait ProtocolSession: Send + Sync + 'static {
    /// Attach to the debuggee identified by `pid`.
    fn attach(&self, pid: u32, encoding: &str) -> impl Future<Output = SessionResult<()>> + Send;

    /// Detach from the debuggee, leaving it running.
    fn detach(&self) -> impl Future<Output = SessionResult<()>> + Send;

    /// Notifications queued since the previous call.
    fn poll_events(&self) -> impl Future<Output = SessionResult<Vec<SessionEvent>>> + Send;

    // Connection settings

    /// Host the session connects to.
    fn host(&self) -> impl Future<Output = SessionResult<String>> + Send;

    /// Change the host the session connects to.
    fn set_host(&self, host: &str) -> impl Future<Output = SessionResult<()>> + Send;

    /// Password protecting the channel.
    fn password(&self) -> impl Future<Output = SessionResult<String>> + Send;

    /// Change the password protecting the channel.
    fn set_password(&self, password: &str) -> impl Future<Output = SessionResult<()>> + Send;

    /// Debuggees waiting for a client on the current host.
    fn calc_server_list(&self) -> impl Future<Output = SessionResult<Vec<ServerInfo>>> + Send;

    // Breakpoints

    /// Install a breakpoint.
    fn set_breakpoint(
        &self,
        file: &Path,
        line: u32,
        enabled: bool,
        condition: Option<&str>,
    ) -> impl Future<Output = SessionResult<()>> + Send;

    /// Remove the given breakpoints.
    fn delete_breakpoints(
        &self,
        ids: &[BreakpointId],
    ) -> impl Future<Output = SessionResult<()>> + Send;

    /// Remove every breakpoint.
    fn clear_breakpoints(&self) -> impl Future<Output = SessionResult<()>> + Send;

    /// Enable the given breakpoints.
    fn enable_breakpoints(
        &self,
        ids: &[BreakpointId],
    ) -> impl Future<Output = SessionResult<()>> + Send;

    /// Disable the given breakpoints.
    fn disable_breakpoints(
        &self,
        ids: &[BreakpointId],
    ) -> impl Future<Output = SessionResult<()>> + Send;

    /// Breakpoints currently installed in the debuggee.
    fn breakpoints(&self) -> impl Future<Output = SessionResult<Vec<Breakpoint>>> + Send;

    /// Restore the breakpoints the debuggee saved in a previous run.
    fn load_breakpoints(&self) -> impl Future<Output = SessionResult<()>> + Send;

    // Execution control

    /// Resume execution.
    fn request_go(&self) -> impl Future<Output = SessionResult<()>> + Send;

    /// Pause execution.
    fn request_break(&self) -> impl Future<Output = SessionResult<()>> + Send;

    /// Step into the next call.
    fn request_step(&self) -> impl Future<Output = SessionResult<()>> + Send;

    /// Step over the next line.
    fn request_next(&self) -> impl Future<Output = SessionResult<()>> + Send;

    /// Run until the current function returns.
    fn request_return(&self) -> impl Future<Output = SessionResult<()>> + Send;

    /// Move the execution point to `line` of the current frame.
    fn request_jump(&self, line: u32) -> impl Future<Output = SessionResult<()>> + Send;

    /// Resume and stop at `file:line` once.
    fn request_go_breakpoint(
        &self,
        file: &Path,
        line: u32,
    ) -> impl Future<Output = SessionResult<()>> + Send;

    /// Terminate the debuggee.
    fn stop_debuggee(&self) -> impl Future<Output = SessionResult<()>> + Send;

    /// Restart the debuggee from the beginning.
    fn restart(&self) -> impl Future<Output = SessionResult<()>> + Send;

    /// Shut the debugger down together with the debuggee.
    fn shutdown(&self) -> impl Future<Output = SessionResult<()>> + Send;

    // Inspection

    /// Select the frame to inspect, counted from the innermost frame.
    fn set_frame_index(&self, index: usize) -> impl Future<Output = SessionResult<()>> + Send;

    /// Frame currently inspected.
    fn frame_index(&self) -> impl Future<Output = SessionResult<usize>> + Send;

    /// Call stack of the selected thread.
    fn stack(&self) -> impl Future<Output = SessionResult<StackInfo>> + Send;

    /// Threads of the debuggee.
    fn thread_list(&self) -> impl Future<Output = SessionResult<ThreadList>> + Send;

    /// Select the thread to inspect.
    fn set_thread(&self, tid: u64) -> impl Future<Output = SessionResult<()>> + Send;

    /// Evaluate a batch of namespace expressions.
    fn namespace(
        &self,
        requests: &[ExpressionRequest],
        level: FilterLevel,
    ) -> impl Future<Output = SessionResult<Vec<NamespaceNode>>> + Send;

    /// Evaluate an expression in the selected frame.
    fn evaluate(&self, expr: &str) -> impl Future<Output = SessionResult<Evaluation>> + Send;

    /// Execute a statement suite in the selected frame.
    fn execute(&self, suite: &str) -> impl Future<Output = SessionResult<Execution>> + Send;

    // Session settings

    /// Whether the inspected frame follows the running thread.
    fn synchronicity(&self) -> impl Future<Output = SessionResult<bool>> + Send;

    /// Set whether the inspected frame follows the running thread.
    fn set_synchronicity(&self, enabled: bool) -> impl Future<Output = SessionResult<()>> + Send;

    /// Whether unhandled exceptions stop the debuggee.
    fn trap_unhandled_exceptions(&self) -> impl Future<Output = SessionResult<bool>> + Send;

    /// Set whether unhandled exceptions stop the debuggee.
    fn set_trap_unhandled_exceptions(
        &self,
        trap: bool,
    ) -> impl Future<Output = SessionResult<()>> + Send;

    /// Fork mode as `(follow_child, automatic)`.
    fn fork_mode(&self) -> impl Future<Output = SessionResult<(bool, bool)>> + Send;

    /// Set which process to follow on fork and whether to decide automatically.
    fn set_fork_mode(
        &self,
        follow_child: bool,
        automatic: bool,
    ) -> impl Future<Output = SessionResult<()>> + Send;

    /// Output encoding as `(encoding, escaping)`.
    fn encoding(&self) -> impl Future<Output = SessionResult<(String, bool)>> + Send;

    /// Set the encoding of values sent back by the debuggee.
    fn set_encoding(
        &self,
        encoding: &str,
        escaping: bool,
    ) -> impl Future<Output = SessionResult<()>> + Send;

    /// Enter or leave exception analysis.
    fn set_analyze(&self, analyze: bool) -> impl Future<Output = SessionResult<()>> + Send;
}
