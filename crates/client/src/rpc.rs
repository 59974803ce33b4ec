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

//! JSON-RPC transport for debugging sessions.

use std::{path::Path, time::Duration};

use eyre::Result;
use jsonrpsee::{
    core::client::{ClientT, Error as ClientError},
    http_client::{HttpClient, HttpClientBuilder},
};
use rdb_common::{
    Breakpoint, BreakpointId, Evaluation, Execution, ExpressionRequest, FilterLevel,
    NamespaceNode, ProtocolError, ServerInfo, SessionEvent, StackInfo, ThreadList,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use crate::{ProtocolSession, SessionResult};

/// Session served by a debugger agent over JSON-RPC.
pub struct RpcSession {
    client: HttpClient,
    server_url: String,
}

impl RpcSession {
    /// Create a new session client
    pub async fn new(server_url: &str) -> Result<Self> {
        let client = HttpClientBuilder::default()
            .request_timeout(Duration::from_secs(30))
            .build(server_url)?;

        debug!("Created RPC session for: {}", server_url);
        Ok(Self { client, server_url: server_url.to_string() })
    }

    /// Test connection to a server URL
    pub async fn test_connection(server_url: &str) -> Result<()> {
        debug!("Testing connection to: {}", server_url);

        let client = HttpClientBuilder::default()
            .request_timeout(Duration::from_secs(5))
            .build(server_url)?;

        match client.request::<Value, _>("session.getHost", rpc_params::build()).await {
            Ok(_) => {
                debug!("Connection test successful for: {}", server_url);
                Ok(())
            }
            Err(e) => {
                debug!("Connection test failed for {}: {}", server_url, e);
                Err(e.into())
            }
        }
    }

    /// Get server URL
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> SessionResult<T> {
        debug!("Making RPC request: {}", method);

        match self.client.request::<T, _>(method, params).await {
            Ok(result) => Ok(result),
            Err(e) => {
                let err = protocol_error(e);
                if matches!(err, ProtocolError::Transport(_) | ProtocolError::ConnectionFailed(_)) {
                    error!("{} failed: {}", method, err);
                } else {
                    debug!("{} failed: {}", method, err);
                }
                Err(err)
            }
        }
    }

    /// Call a method whose answer carries no data.
    async fn call_unit(&self, method: &str, params: Vec<Value>) -> SessionResult<()> {
        self.call::<Value>(method, params).await.map(|_| ())
    }
}

/// Map a JSON-RPC client failure onto the session error it stands for.
fn protocol_error(err: ClientError) -> ProtocolError {
    match err {
        ClientError::Call(obj) => ProtocolError::from_code(obj.code(), obj.message()),
        ClientError::RequestTimeout => ProtocolError::Timeout,
        ClientError::Transport(e) => ProtocolError::ConnectionFailed(e.to_string()),
        other => ProtocolError::Transport(other.to_string()),
    }
}

impl ProtocolSession for RpcSession {
    async fn attach(&self, pid: u32, encoding: &str) -> SessionResult<()> {
        self.call_unit("session.attach", rpc_params::build_with(&[&pid, &encoding])).await
    }

    async fn detach(&self) -> SessionResult<()> {
        self.call_unit("session.detach", rpc_params::build()).await
    }

    async fn poll_events(&self) -> SessionResult<Vec<SessionEvent>> {
        self.call("session.pollEvents", rpc_params::build()).await
    }

    async fn host(&self) -> SessionResult<String> {
        self.call("session.getHost", rpc_params::build()).await
    }

    async fn set_host(&self, host: &str) -> SessionResult<()> {
        self.call_unit("session.setHost", rpc_params::build_with(&[&host])).await
    }

    async fn password(&self) -> SessionResult<String> {
        self.call("session.getPassword", rpc_params::build()).await
    }

    async fn set_password(&self, password: &str) -> SessionResult<()> {
        self.call_unit("session.setPassword", rpc_params::build_with(&[&password])).await
    }

    async fn calc_server_list(&self) -> SessionResult<Vec<ServerInfo>> {
        self.call("session.calcServerList", rpc_params::build()).await
    }

    async fn set_breakpoint(
        &self,
        file: &Path,
        line: u32,
        enabled: bool,
        condition: Option<&str>,
    ) -> SessionResult<()> {
        self.call_unit(
            "session.setBreakpoint",
            rpc_params::build_with(&[&file, &line, &enabled, &condition]),
        )
        .await
    }

    async fn delete_breakpoints(&self, ids: &[BreakpointId]) -> SessionResult<()> {
        self.call_unit("session.deleteBreakpoints", rpc_params::build_with(&[&ids])).await
    }

    async fn clear_breakpoints(&self) -> SessionResult<()> {
        self.call_unit("session.clearBreakpoints", rpc_params::build()).await
    }

    async fn enable_breakpoints(&self, ids: &[BreakpointId]) -> SessionResult<()> {
        self.call_unit("session.enableBreakpoints", rpc_params::build_with(&[&ids])).await
    }

    async fn disable_breakpoints(&self, ids: &[BreakpointId]) -> SessionResult<()> {
        self.call_unit("session.disableBreakpoints", rpc_params::build_with(&[&ids])).await
    }

    async fn breakpoints(&self) -> SessionResult<Vec<Breakpoint>> {
        self.call("session.getBreakpoints", rpc_params::build()).await
    }

    async fn load_breakpoints(&self) -> SessionResult<()> {
        self.call_unit("session.loadBreakpoints", rpc_params::build()).await
    }

    async fn request_go(&self) -> SessionResult<()> {
        self.call_unit("session.requestGo", rpc_params::build()).await
    }

    async fn request_break(&self) -> SessionResult<()> {
        self.call_unit("session.requestBreak", rpc_params::build()).await
    }

    async fn request_step(&self) -> SessionResult<()> {
        self.call_unit("session.requestStep", rpc_params::build()).await
    }

    async fn request_next(&self) -> SessionResult<()> {
        self.call_unit("session.requestNext", rpc_params::build()).await
    }

    async fn request_return(&self) -> SessionResult<()> {
        self.call_unit("session.requestReturn", rpc_params::build()).await
    }

    async fn request_jump(&self, line: u32) -> SessionResult<()> {
        self.call_unit("session.requestJump", rpc_params::build_with(&[&line])).await
    }

    async fn request_go_breakpoint(&self, file: &Path, line: u32) -> SessionResult<()> {
        self.call_unit("session.requestGoBreakpoint", rpc_params::build_with(&[&file, &line]))
            .await
    }

    async fn stop_debuggee(&self) -> SessionResult<()> {
        self.call_unit("session.stopDebuggee", rpc_params::build()).await
    }

    async fn restart(&self) -> SessionResult<()> {
        self.call_unit("session.restart", rpc_params::build()).await
    }

    async fn shutdown(&self) -> SessionResult<()> {
        self.call_unit("session.shutdown", rpc_params::build()).await
    }

    async fn set_frame_index(&self, index: usize) -> SessionResult<()> {
        self.call_unit("session.setFrameIndex", rpc_params::build_with(&[&index])).await
    }

    async fn frame_index(&self) -> SessionResult<usize> {
        self.call("session.getFrameIndex", rpc_params::build()).await
    }

    async fn stack(&self) -> SessionResult<StackInfo> {
        self.call("session.getStack", rpc_params::build()).await
    }

    async fn thread_list(&self) -> SessionResult<ThreadList> {
        self.call("session.getThreadList", rpc_params::build()).await
    }

    async fn set_thread(&self, tid: u64) -> SessionResult<()> {
        self.call_unit("session.setThread", rpc_params::build_with(&[&tid])).await
    }

    async fn namespace(
        &self,
        requests: &[ExpressionRequest],
        level: FilterLevel,
    ) -> SessionResult<Vec<NamespaceNode>> {
        self.call("session.getNamespace", rpc_params::build_with(&[&requests, &level])).await
    }

    async fn evaluate(&self, expr: &str) -> SessionResult<Evaluation> {
        self.call("session.evaluate", rpc_params::build_with(&[&expr])).await
    }

    async fn execute(&self, suite: &str) -> SessionResult<Execution> {
        self.call("session.execute", rpc_params::build_with(&[&suite])).await
    }

    async fn synchronicity(&self) -> SessionResult<bool> {
        self.call("session.getSynchronicity", rpc_params::build()).await
    }

    async fn set_synchronicity(&self, enabled: bool) -> SessionResult<()> {
        self.call_unit("session.setSynchronicity", rpc_params::build_with(&[&enabled])).await
    }

    async fn trap_unhandled_exceptions(&self) -> SessionResult<bool> {
        self.call("session.getTrapUnhandledExceptions", rpc_params::build()).await
    }

    async fn set_trap_unhandled_exceptions(&self, trap: bool) -> SessionResult<()> {
        self.call_unit("session.setTrapUnhandledExceptions", rpc_params::build_with(&[&trap]))
            .await
    }

    async fn fork_mode(&self) -> SessionResult<(bool, bool)> {
        self.call("session.getForkMode", rpc_params::build()).await
    }

    async fn set_fork_mode(&self, follow_child: bool, automatic: bool) -> SessionResult<()> {
        self.call_unit("session.setForkMode", rpc_params::build_with(&[&follow_child, &automatic]))
            .await
    }

    async fn encoding(&self) -> SessionResult<(String, bool)> {
        self.call("session.getEncoding", rpc_params::build()).await
    }

    async fn set_encoding(&self, encoding: &str, escaping: bool) -> SessionResult<()> {
        self.call_unit("session.setEncoding", rpc_params::build_with(&[&encoding, &escaping]))
            .await
    }

    async fn set_analyze(&self, analyze: bool) -> SessionResult<()> {
        self.call_unit("session.setAnalyze", rpc_params::build_with(&[&analyze])).await
    }
}

mod rpc_params {
    use serde::Serialize;
    use serde_json::Value;
    use tracing::debug;

    /// A positional parameter of any serializable type.
    pub(super) trait Param: Sync {
        fn to_value(&self) -> Value;
    }

    impl<T: Serialize + Sync + ?Sized> Param for T {
        fn to_value(&self) -> Value {
            serde_json::to_value(self).unwrap_or_else(|err| {
                debug!(%err, "Parameter is not serializable, sending null");
                Value::Null
            })
        }
    }

    pub(super) fn build() -> Vec<Value> {
        vec![]
    }

    pub(super) fn build_with(params: &[&dyn Param]) -> Vec<Value> {
        params.iter().map(|p| p.to_value()).collect()
    }
}
