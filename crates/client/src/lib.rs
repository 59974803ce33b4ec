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

// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
// SPDX-License-Identifier: AGPL-3.0
//! RDB client - remote debugger client
//!
//! This crate drives a debugging session with a remote debuggee. The
//! [`DebugCoordinator`] owns the session and its flags; the variable trees of
//! [`NamespaceInspector`] are filled lazily through [`NamespaceFetcher`] without
//! blocking the view task.

mod breakpoints;
pub mod config;
mod console;
mod coordinator;
mod error;
mod fetcher;
mod launcher;
mod rpc;
mod session;
mod variables;
mod watcher;

pub use breakpoints::{BreakpointRegistry, UserBreakpoint};
pub use config::Config;
pub use console::{render_tree, start_console, Command, Console, ConsoleConfig, ConsoleObserver};
pub use coordinator::{
    AbortHandle, AttachPolicy, CommandAvailability, DebugCoordinator, DebugObserver, NoopObserver,
    SessionState, ATTACHED_BANNER, ATTACHED_BANNER_REMOTE, DEFAULT_DEBUGGER_MODULE,
    DETACHED_BANNER,
};
pub use error::{translate, DebugError, ErrorKind};
pub use fetcher::{FetchCompletion, FetchRequest, FetchTarget, NamespaceFetcher, SharedCoordinator};
pub use launcher::{ExternalProcess, ProcessLauncher};
pub use rpc::RpcSession;
pub use session::{ProtocolSession, SessionResult};
pub use variables::{
    ChildState, FetchFailure, IconClass, MergeOutcome, NameFilter, NamespaceInspector, Selection,
    TreeKind, TreeRow, VariableTree, VariableTreeNode, LOADING_TEXT, TIMEOUT_TEXT,
};
pub use watcher::{WatchedExpression, Watcher};
