//! Shared fixtures: a scripted session and an observer that records notifications.

#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use parking_lot::Mutex;
use rdb_client::{
    AttachPolicy, DebugCoordinator, DebugObserver, ExternalProcess, ProtocolSession,
    SessionResult, SessionState,
};
use rdb_common::{
    Breakpoint, BreakpointId, Evaluation, Execution, ExpressionRequest, FilterLevel,
    NamespaceNode, ProtocolError, ServerInfo, SessionEvent, StackFrame, StackInfo, ThreadList,
};

/// Scripted answers and the log of calls made.
#[derive(Debug, Default)]
pub struct MockState {
    /// Every call, as `method` or `method args`
    pub calls: Vec<String>,
    /// Attach attempts that fail before one succeeds; `None` fails forever
    pub attach_failures: Option<usize>,
    /// Failure injected for a method name, returned on every call
    pub failures: HashMap<&'static str, ProtocolError>,
    /// Batches returned by successive event polls
    pub events: VecDeque<Vec<SessionEvent>>,
    pub stack: StackInfo,
    pub frame_index: usize,
    pub threads: ThreadList,
    pub installed: Vec<Breakpoint>,
    pub next_breakpoint_id: u64,
    /// Namespace entries by expression; unknown expressions are left out of answers
    pub namespace: HashMap<String, NamespaceNode>,
    /// How long namespace queries take to answer
    pub namespace_delay: Duration,
    pub evaluations: HashMap<String, Evaluation>,
    pub execution: Execution,
}

/// Session answering from a [`MockState`].
#[derive(Debug, Clone)]
pub struct MockSession {
    pub state: Arc<Mutex<MockState>>,
}

impl MockSession {
    pub fn new() -> Self {
        let state = MockState { attach_failures: Some(0), ..Default::default() };
        Self { state: Arc::new(Mutex::new(state)) }
    }

    /// Calls made so far.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    /// Number of calls whose log entry starts with `method`.
    pub fn count(&self, method: &str) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| call.split(' ').next() == Some(method))
            .count()
    }

    pub fn fail(&self, method: &'static str, err: ProtocolError) {
        self.state.lock().failures.insert(method, err);
    }

    pub fn heal(&self, method: &'static str) {
        self.state.lock().failures.remove(method);
    }

    pub fn set_namespace(&self, node: NamespaceNode) {
        self.state.lock().namespace.insert(node.expr.clone(), node);
    }

    pub fn set_namespace_delay(&self, delay: Duration) {
        self.state.lock().namespace_delay = delay;
    }

    pub fn push_events(&self, events: Vec<SessionEvent>) {
        self.state.lock().events.push_back(events);
    }

    fn record(&self, method: &'static str, call: String) -> SessionResult<()> {
        let mut state = self.state.lock();
        state.calls.push(call);
        match state.failures.get(method) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

impl ProtocolSession for MockSession {
    async fn attach(&self, pid: u32, _encoding: &str) -> SessionResult<()> {
        self.record("attach", format!("attach {pid}"))?;
        let mut state = self.state.lock();
        match state.attach_failures.as_mut() {
            None => Err(ProtocolError::Timeout),
            Some(0) => Ok(()),
            Some(remaining) => {
                *remaining -= 1;
                Err(ProtocolError::Timeout)
            }
        }
    }

    async fn detach(&self) -> SessionResult<()> {
        self.record("detach", "detach".to_string())
    }

    async fn poll_events(&self) -> SessionResult<Vec<SessionEvent>> {
        self.record("poll_events", "poll_events".to_string())?;
        Ok(self.state.lock().events.pop_front().unwrap_or_default())
    }

    async fn host(&self) -> SessionResult<String> {
        self.record("host", "host".to_string())?;
        Ok("localhost".to_string())
    }

    async fn set_host(&self, host: &str) -> SessionResult<()> {
        self.record("set_host", format!("set_host {host}"))
    }

    async fn password(&self) -> SessionResult<String> {
        self.record("password", "password".to_string())?;
        Ok(String::new())
    }

    async fn set_password(&self, password: &str) -> SessionResult<()> {
        self.record("set_password", format!("set_password {password}"))
    }

    async fn calc_server_list(&self) -> SessionResult<Vec<ServerInfo>> {
        self.record("calc_server_list", "calc_server_list".to_string())?;
        Ok(vec![ServerInfo { rid: "1".to_string(), pid: 4242, filename: "app.py".to_string() }])
    }

    async fn set_breakpoint(
        &self,
        file: &Path,
        line: u32,
        enabled: bool,
        condition: Option<&str>,
    ) -> SessionResult<()> {
        self.record("set_breakpoint", format!("set_breakpoint {}:{line}", file.display()))?;
        let mut state = self.state.lock();
        state.next_breakpoint_id += 1;
        let id = BreakpointId(state.next_breakpoint_id);
        state.installed.push(Breakpoint {
            id,
            file: file.to_path_buf(),
            line,
            condition: condition.map(str::to_string),
            enabled,
        });
        Ok(())
    }

    async fn delete_breakpoints(&self, ids: &[BreakpointId]) -> SessionResult<()> {
        let listed: Vec<String> = ids.iter().map(ToString::to_string).collect();
        self.record("delete_breakpoints", format!("delete_breakpoints {}", listed.join(",")))?;
        self.state.lock().installed.retain(|bp| !ids.contains(&bp.id));
        Ok(())
    }

    async fn clear_breakpoints(&self) -> SessionResult<()> {
        self.record("clear_breakpoints", "clear_breakpoints".to_string())?;
        self.state.lock().installed.clear();
        Ok(())
    }

    async fn enable_breakpoints(&self, ids: &[BreakpointId]) -> SessionResult<()> {
        let listed: Vec<String> = ids.iter().map(ToString::to_string).collect();
        self.record("enable_breakpoints", format!("enable_breakpoints {}", listed.join(",")))
    }

    async fn disable_breakpoints(&self, ids: &[BreakpointId]) -> SessionResult<()> {
        let listed: Vec<String> = ids.iter().map(ToString::to_string).collect();
        self.record("disable_breakpoints", format!("disable_breakpoints {}", listed.join(",")))
    }

    async fn breakpoints(&self) -> SessionResult<Vec<Breakpoint>> {
        self.record("breakpoints", "breakpoints".to_string())?;
        Ok(self.state.lock().installed.clone())
    }

    async fn load_breakpoints(&self) -> SessionResult<()> {
        self.record("load_breakpoints", "load_breakpoints".to_string())
    }

    async fn request_go(&self) -> SessionResult<()> {
        self.record("request_go", "request_go".to_string())
    }

    async fn request_break(&self) -> SessionResult<()> {
        self.record("request_break", "request_break".to_string())
    }

    async fn request_step(&self) -> SessionResult<()> {
        self.record("request_step", "request_step".to_string())
    }

    async fn request_next(&self) -> SessionResult<()> {
        self.record("request_next", "request_next".to_string())
    }

    async fn request_return(&self) -> SessionResult<()> {
        self.record("request_return", "request_return".to_string())
    }

    async fn request_jump(&self, line: u32) -> SessionResult<()> {
        self.record("request_jump", format!("request_jump {line}"))
    }

    async fn request_go_breakpoint(&self, file: &Path, line: u32) -> SessionResult<()> {
        self.record("request_go_breakpoint", format!("request_go_breakpoint {}:{line}", file.display()))
    }

    async fn stop_debuggee(&self) -> SessionResult<()> {
        self.record("stop_debuggee", "stop_debuggee".to_string())
    }

    async fn restart(&self) -> SessionResult<()> {
        self.record("restart", "restart".to_string())
    }

    async fn shutdown(&self) -> SessionResult<()> {
        self.record("shutdown", "shutdown".to_string())
    }

    async fn set_frame_index(&self, index: usize) -> SessionResult<()> {
        self.record("set_frame_index", format!("set_frame_index {index}"))?;
        self.state.lock().frame_index = index;
        Ok(())
    }

    async fn frame_index(&self) -> SessionResult<usize> {
        self.record("frame_index", "frame_index".to_string())?;
        Ok(self.state.lock().frame_index)
    }

    async fn stack(&self) -> SessionResult<StackInfo> {
        self.record("stack", "stack".to_string())?;
        Ok(self.state.lock().stack.clone())
    }

    async fn thread_list(&self) -> SessionResult<ThreadList> {
        self.record("thread_list", "thread_list".to_string())?;
        Ok(self.state.lock().threads.clone())
    }

    async fn set_thread(&self, tid: u64) -> SessionResult<()> {
        self.record("set_thread", format!("set_thread {tid}"))
    }

    async fn namespace(
        &self,
        requests: &[ExpressionRequest],
        _level: FilterLevel,
    ) -> SessionResult<Vec<NamespaceNode>> {
        let delay = self.state.lock().namespace_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let exprs: Vec<&str> = requests.iter().map(|r| r.expr.as_str()).collect();
        self.record("namespace", format!("namespace {}", exprs.join(",")))?;
        let state = self.state.lock();
        Ok(exprs.iter().filter_map(|expr| state.namespace.get(*expr).cloned()).collect())
    }

    async fn evaluate(&self, expr: &str) -> SessionResult<Evaluation> {
        self.record("evaluate", format!("evaluate {expr}"))?;
        let state = self.state.lock();
        Ok(state
            .evaluations
            .get(expr)
            .cloned()
            .unwrap_or_else(|| Evaluation { value: format!("<{expr}>"), ..Default::default() }))
    }

    async fn execute(&self, suite: &str) -> SessionResult<Execution> {
        self.record("execute", format!("execute {suite}"))?;
        Ok(self.state.lock().execution.clone())
    }

    async fn synchronicity(&self) -> SessionResult<bool> {
        self.record("synchronicity", "synchronicity".to_string())?;
        Ok(true)
    }

    async fn set_synchronicity(&self, enabled: bool) -> SessionResult<()> {
        self.record("set_synchronicity", format!("set_synchronicity {enabled}"))
    }

    async fn trap_unhandled_exceptions(&self) -> SessionResult<bool> {
        self.record("trap_unhandled_exceptions", "trap_unhandled_exceptions".to_string())?;
        Ok(true)
    }

    async fn set_trap_unhandled_exceptions(&self, trap: bool) -> SessionResult<()> {
        self.record("set_trap_unhandled_exceptions", format!("set_trap_unhandled_exceptions {trap}"))
    }

    async fn fork_mode(&self) -> SessionResult<(bool, bool)> {
        self.record("fork_mode", "fork_mode".to_string())?;
        Ok((false, true))
    }

    async fn set_fork_mode(&self, follow_child: bool, automatic: bool) -> SessionResult<()> {
        self.record("set_fork_mode", format!("set_fork_mode {follow_child} {automatic}"))
    }

    async fn encoding(&self) -> SessionResult<(String, bool)> {
        self.record("encoding", "encoding".to_string())?;
        Ok(("auto".to_string(), true))
    }

    async fn set_encoding(&self, encoding: &str, escaping: bool) -> SessionResult<()> {
        self.record("set_encoding", format!("set_encoding {encoding} {escaping}"))
    }

    async fn set_analyze(&self, analyze: bool) -> SessionResult<()> {
        self.record("set_analyze", format!("set_analyze {analyze}"))
    }
}

/// Observer keeping every notification as a line of text.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub notifications: Mutex<Vec<String>>,
}

impl RecordingObserver {
    fn push(&self, notification: String) {
        self.notifications.lock().push(notification);
    }

    pub fn all(&self) -> Vec<String> {
        self.notifications.lock().clone()
    }

    /// Messages shown as error dialogs.
    pub fn errors(&self) -> Vec<String> {
        self.all().into_iter().filter_map(|n| n.strip_prefix("error: ").map(str::to_string)).collect()
    }

    pub fn count(&self, notification: &str) -> usize {
        self.notifications.lock().iter().filter(|n| n.as_str() == notification).count()
    }

    pub fn clear(&self) {
        self.notifications.lock().clear();
    }
}

impl DebugObserver for RecordingObserver {
    fn on_attached(&self, _banner: &str) {
        self.push("attached".to_string());
    }

    fn on_detached(&self) {
        self.push("detached".to_string());
    }

    fn on_state_changed(&self, _state: &SessionState) {
        self.push("state".to_string());
    }

    fn on_step_marker_set(&self, file: &Path, line: u32) {
        self.push(format!("marker {}:{line}", file.display()));
    }

    fn on_step_marker_cleared(&self) {
        self.push("marker cleared".to_string());
    }

    fn on_error_dialog(&self, message: &str) {
        self.push(format!("error: {message}"));
    }

    fn on_clear_views(&self) {
        self.push("clear views".to_string());
    }

    fn on_stack_updated(&self, _stack: &StackInfo) {
        self.push("stack".to_string());
    }

    fn on_threads_updated(&self, _threads: &ThreadList) {
        self.push("threads".to_string());
    }

    fn on_frame_selected(&self, index: usize) {
        self.push(format!("frame {index}"));
    }

    fn on_thread_broken(&self, tid: u64, _name: &str) {
        self.push(format!("thread broken {tid}"));
    }

    fn on_namespace_changed(&self) {
        self.push("namespace changed".to_string());
    }

    fn on_unhandled_exception(&self) {
        self.push("unhandled exception".to_string());
    }

    fn on_conflicting_modules(&self, modules: &str) {
        self.push(format!("conflicting {modules}"));
    }
}

pub fn fast_policy(max_attempts: u32) -> AttachPolicy {
    AttachPolicy { max_attempts, backoff: Duration::from_millis(1) }
}

/// Detached coordinator over a fresh mock session.
pub fn coordinator() -> (DebugCoordinator<MockSession>, MockSession, Arc<RecordingObserver>) {
    let session = MockSession::new();
    let observer = Arc::new(RecordingObserver::default());
    let coordinator = DebugCoordinator::new(session.clone())
        .with_observer(observer.clone())
        .with_attach_policy(fast_policy(5));
    (coordinator, session, observer)
}

/// Coordinator attached to pid 4242, with the notifications of attaching cleared.
pub async fn attached_coordinator(
) -> (DebugCoordinator<MockSession>, MockSession, Arc<RecordingObserver>, Arc<ExternalProcess>) {
    let (mut coordinator, session, observer) = coordinator();
    let launcher = Arc::new(ExternalProcess::new(4242));
    coordinator.attach(launcher.clone()).await.unwrap();
    observer.clear();
    (coordinator, session, observer, launcher)
}

pub fn frame(file: impl Into<PathBuf>, line: u32, function: &str) -> StackFrame {
    StackFrame { file: file.into(), line, function: function.to_string() }
}

/// Stack of a stopped thread; `frames` go from outermost to innermost.
pub fn broken_stack(frames: Vec<StackFrame>) -> StackInfo {
    StackInfo { frames, broken: true, thread_id: Some(1) }
}

pub fn leaf(name: &str, expr: &str, repr: &str) -> NamespaceNode {
    NamespaceNode {
        name: name.to_string(),
        expr: expr.to_string(),
        type_name: "int".to_string(),
        repr: repr.to_string(),
        is_valid: true,
        ..Default::default()
    }
}

/// Entry for `expr` listing `children`.
pub fn entry(name: &str, expr: &str, type_name: &str, children: Vec<NamespaceNode>) -> NamespaceNode {
    NamespaceNode {
        name: name.to_string(),
        expr: expr.to_string(),
        type_name: type_name.to_string(),
        repr: format!("<{expr}>"),
        is_valid: true,
        child_count: children.len(),
        children,
        error: None,
    }
}
