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

//! Line-oriented console driving a debugging session from stdin.
//!
//! The console owns the view side: it reads commands, polls session events on a
//! fixed interval and applies namespace fetches as they complete. All three run
//! on one task, so the variable trees are only touched from there.

use std::{
    io::{self, Write},
    path::PathBuf,
    str::FromStr,
    sync::Arc,
    time::Duration,
};

use eyre::{bail, eyre, Result, WrapErr};
use parking_lot::Mutex;
use rdb_common::{BreakpointSpec, StackInfo, ThreadList};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    select,
    sync::mpsc,
    task::JoinHandle,
    time::interval,
};
use tracing::{debug, info};

use crate::{
    AbortHandle, Config, DebugCoordinator, DebugError, DebugObserver, ExternalProcess,
    FetchCompletion, FetchRequest, NameFilter, NamespaceFetcher, NamespaceInspector,
    ProtocolSession, RpcSession, SessionState, SharedCoordinator, TreeKind, TreeRow,
    VariableTree, Watcher,
};

const HELP: &str = "\
Session:     attach <pid> | detach | abort | quit
Execution:   c(ontinue) | pause | s(tep) | n(ext) | r(eturn) | jump <line> | until <file:line>
             stop | restart
Breakpoints: b <file:line> [if <cond>] | clear <file:line> | toggle <file:line> | bl
             enable <file:line> | disable <file:line>
Stack:       bt | threads | frame <n> | thread <tid> | analyze on|off
Variables:   locals | globals | exceptions | expand <tree> <expr> | collapse <tree> <expr>
             set <tree> <expr> = <value> | filter <tree> [regex]
Evaluation:  p <expr> | exec <stmt> | watch <expr> | watch on|off <id> | unwatch <id>
             watches";

/// Configuration for the console
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// RPC endpoint URL
    pub rpc_url: String,
    /// Debuggee to attach to on startup
    pub pid: Option<u32>,
    /// Session event polling interval
    pub poll_interval: Duration,
    /// Settings read from the config file
    pub settings: Config,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:3030".to_string(),
            pid: None,
            poll_interval: Duration::from_millis(100),
            settings: Config::default(),
        }
    }
}

/// A console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Attach to the debuggee with this pid
    Attach(u32),
    /// Detach, leaving the debuggee running
    Detach,
    /// Abort the session and the debuggee
    Abort,
    /// Resume
    Go,
    /// Pause
    Pause,
    /// Step into
    StepIn,
    /// Step over
    StepOver,
    /// Step out
    StepOut,
    /// Move the execution point to a line of the current frame
    Jump(u32),
    /// Resume until a location is reached
    RunTo {
        /// Source file
        file: PathBuf,
        /// Line in `file`
        line: u32,
    },
    /// Terminate the debuggee
    Stop,
    /// Restart the debuggee
    Restart,
    /// Place a breakpoint
    AddBreakpoint(BreakpointSpec),
    /// Remove a breakpoint
    RemoveBreakpoint {
        /// Source file
        file: PathBuf,
        /// Line in `file`
        line: u32,
    },
    /// Add a breakpoint where there is none, remove it otherwise
    ToggleBreakpoint {
        /// Source file
        file: PathBuf,
        /// Line in `file`
        line: u32,
    },
    /// Enable or disable a breakpoint
    SetBreakpointEnabled {
        /// Source file
        file: PathBuf,
        /// Line in `file`
        line: u32,
        /// New state
        enabled: bool,
    },
    /// List breakpoints
    ListBreakpoints,
    /// Show the call stack
    Stack,
    /// Show the threads
    Threads,
    /// Inspect another frame
    Frame(usize),
    /// Inspect another thread
    Thread(u64),
    /// Enter or leave exception analysis
    Analyze(bool),
    /// Print a variable tree
    Show(TreeKind),
    /// Expand a variable
    Expand(TreeKind, String),
    /// Collapse a variable
    Collapse(TreeKind, String),
    /// Assign to a variable
    Assign {
        /// Tree showing the variable
        tree: TreeKind,
        /// Expression of the variable
        expr: String,
        /// New value, as an expression
        value: String,
    },
    /// Filter child names of a tree; an empty pattern shows everything
    Filter(TreeKind, String),
    /// Evaluate an expression
    Eval(String),
    /// Execute a statement
    Exec(String),
    /// Watch an expression
    Watch(String),
    /// Enable or disable a watched expression
    SetWatchEnabled(usize, bool),
    /// Stop watching an expression
    Unwatch(usize),
    /// List watched expressions
    Watches,
    /// Print the command summary
    Help,
    /// Leave the console
    Quit,
}

fn parse_arg<T>(arg: &str, what: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    arg.parse().map_err(|e| eyre!("Invalid {what} `{arg}`: {e}"))
}

fn required(arg: &str, what: &str) -> Result<String> {
    if arg.is_empty() {
        bail!("Missing {what}");
    }
    Ok(arg.to_string())
}

fn parse_switch(arg: &str) -> Result<bool> {
    match arg {
        "on" => Ok(true),
        "off" => Ok(false),
        _ => bail!("Expected `on` or `off`, got `{arg}`"),
    }
}

/// `watch on <id>` and `watch off <id>` switch a watch, anything else is an expression.
fn watch_command(args: &str) -> Result<Command> {
    if let Some((switch, id)) = args.split_once(char::is_whitespace) {
        if let (Ok(enabled), Ok(id)) = (parse_switch(switch), id.trim().parse()) {
            return Ok(Command::SetWatchEnabled(id, enabled));
        }
    }
    Ok(Command::Watch(required(args, "expression")?))
}

fn tree_and_rest(args: &str) -> Result<(TreeKind, &str)> {
    let (tree, rest) = args.split_once(char::is_whitespace).unwrap_or((args, ""));
    Ok((tree.parse()?, rest.trim()))
}

impl FromStr for Command {
    type Err = eyre::Report;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (name, args) = match line.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (line, ""),
        };

        let command = match name {
            "attach" => Self::Attach(parse_arg(args, "pid")?),
            "detach" => Self::Detach,
            "abort" => Self::Abort,
            "c" | "continue" | "go" => Self::Go,
            "pause" => Self::Pause,
            "s" | "step" => Self::StepIn,
            "n" | "next" => Self::StepOver,
            "r" | "return" => Self::StepOut,
            "jump" => Self::Jump(parse_arg(args, "line")?),
            "until" => {
                let spec: BreakpointSpec = args.parse()?;
                Self::RunTo { file: spec.file, line: spec.line }
            }
            "stop" => Self::Stop,
            "restart" => Self::Restart,
            "b" | "break" => Self::AddBreakpoint(args.parse()?),
            "clear" => {
                let spec: BreakpointSpec = args.parse()?;
                Self::RemoveBreakpoint { file: spec.file, line: spec.line }
            }
            "toggle" => {
                let spec: BreakpointSpec = args.parse()?;
                Self::ToggleBreakpoint { file: spec.file, line: spec.line }
            }
            "enable" | "disable" => {
                let spec: BreakpointSpec = args.parse()?;
                Self::SetBreakpointEnabled {
                    file: spec.file,
                    line: spec.line,
                    enabled: name == "enable",
                }
            }
            "bl" | "breakpoints" => Self::ListBreakpoints,
            "bt" | "stack" => Self::Stack,
            "threads" => Self::Threads,
            "frame" => Self::Frame(parse_arg(args, "frame index")?),
            "thread" => Self::Thread(parse_arg(args, "thread id")?),
            "analyze" => Self::Analyze(parse_switch(args)?),
            "locals" | "globals" | "exceptions" => Self::Show(name.parse()?),
            "expand" => {
                let (tree, expr) = tree_and_rest(args)?;
                Self::Expand(tree, required(expr, "expression")?)
            }
            "collapse" => {
                let (tree, expr) = tree_and_rest(args)?;
                Self::Collapse(tree, required(expr, "expression")?)
            }
            "set" => {
                let (tree, assignment) = tree_and_rest(args)?;
                let (expr, value) = assignment
                    .split_once(" = ")
                    .ok_or_else(|| eyre!("Usage: set <tree> <expr> = <value>"))?;
                Self::Assign {
                    tree,
                    expr: required(expr.trim(), "expression")?,
                    value: required(value.trim(), "value")?,
                }
            }
            "filter" => {
                let (tree, pattern) = tree_and_rest(args)?;
                Self::Filter(tree, pattern.to_string())
            }
            "p" | "print" | "eval" => Self::Eval(required(args, "expression")?),
            "exec" => Self::Exec(required(args, "statement")?),
            "watch" => watch_command(args)?,
            "unwatch" => Self::Unwatch(parse_arg(args, "watch id")?),
            "watches" => Self::Watches,
            "h" | "help" | "?" => Self::Help,
            "q" | "quit" | "exit" => Self::Quit,
            "" => bail!("Empty command"),
            other => bail!("Unknown command `{other}`, type `help` for a list"),
        };
        Ok(command)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Notice {
    RefreshViews,
    ClearViews,
}

/// Observer printing session notifications and queuing view updates.
#[derive(Debug, Default)]
pub struct ConsoleObserver {
    notices: Mutex<Vec<Notice>>,
}

impl ConsoleObserver {
    fn push(&self, notice: Notice) {
        let mut notices = self.notices.lock();
        if notices.last() != Some(&notice) {
            notices.push(notice);
        }
    }

    fn take_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock())
    }
}

impl DebugObserver for ConsoleObserver {
    fn on_detached(&self) {
        println!("Detached.");
    }

    fn on_state_changed(&self, state: &SessionState) {
        debug!(?state, "Session state changed");
    }

    fn on_step_marker_set(&self, file: &std::path::Path, line: u32) {
        println!("=> {}:{line}", file.display());
    }

    fn on_error_dialog(&self, message: &str) {
        eprintln!("Error: {message}");
    }

    fn on_clear_views(&self) {
        self.push(Notice::ClearViews);
    }

    fn on_frame_selected(&self, _index: usize) {
        self.push(Notice::RefreshViews);
    }

    fn on_thread_broken(&self, tid: u64, name: &str) {
        println!("Thread {tid} ({name}) stopped.");
    }

    fn on_namespace_changed(&self) {
        self.push(Notice::RefreshViews);
    }

    fn on_unhandled_exception(&self) {
        println!("Unhandled exception, see `exceptions`.");
    }

    fn on_conflicting_modules(&self, modules: &str) {
        println!("Warning: modules incompatible with the debugger were loaded: {modules}");
    }
}

/// Rows of `tree` as indented text lines.
pub fn render_tree(tree: &VariableTree) -> Vec<String> {
    tree.visible_rows()
        .into_iter()
        .map(|row| match row {
            TreeRow::Node { depth, node } => {
                let marker = match (node.has_children, node.expanded) {
                    (false, _) => ' ',
                    (true, true) => '-',
                    (true, false) => '+',
                };
                let indent = "  ".repeat(depth);
                if node.display_type.is_empty() {
                    format!("{indent}{marker} {} = {}", node.label, node.display_value)
                } else {
                    format!(
                        "{indent}{marker} {} = {} ({})",
                        node.label, node.display_value, node.display_type
                    )
                }
            }
            TreeRow::Placeholder { depth, text, .. } => format!("{}  {text}", "  ".repeat(depth)),
        })
        .collect()
}

fn print_stack(stack: Option<&StackInfo>, selected: Option<usize>) {
    let Some(stack) = stack.filter(|stack| !stack.is_empty()) else {
        println!("No stack.");
        return;
    };
    for index in 0..stack.frames.len() {
        if let Some(frame) = stack.frame(index) {
            let marker = if Some(index) == selected { '>' } else { ' ' };
            println!(
                "{marker} #{index} {} at {}:{}",
                frame.function,
                frame.file.display(),
                frame.line
            );
        }
    }
}

fn print_threads(threads: &ThreadList) {
    for thread in &threads.threads {
        let marker = if threads.current == Some(thread.tid) { '>' } else { ' ' };
        let state = if thread.broken { "stopped" } else { "running" };
        println!("{marker} {} {} ({state})", thread.tid, thread.name);
    }
}

/// Interactive console over a session.
pub struct Console<S> {
    coordinator: SharedCoordinator<S>,
    abort: AbortHandle,
    fetcher: NamespaceFetcher<S>,
    completions: mpsc::UnboundedReceiver<FetchCompletion>,
    inspector: NamespaceInspector,
    watcher: Watcher,
    observer: Arc<ConsoleObserver>,
    launcher: Option<Arc<ExternalProcess>>,
    attach_task: Option<JoinHandle<()>>,
    pending_fetches: usize,
}

impl<S: ProtocolSession> Console<S> {
    /// Create a console and push `settings` to the session.
    pub async fn new(session: S, settings: &Config) -> Result<Self> {
        let observer = Arc::new(ConsoleObserver::default());
        let mut coordinator = DebugCoordinator::new(session)
            .with_observer(observer.clone())
            .with_attach_policy(settings.attach.policy())
            .with_debugger_module(settings.debugger.debugger_module.clone());
        coordinator.apply_settings(&settings.debugger).await;

        let abort = coordinator.abort_handle();
        let coordinator = Arc::new(tokio::sync::Mutex::new(coordinator));
        let (fetcher, completions) = NamespaceFetcher::new(Arc::clone(&coordinator));
        let inspector = NamespaceInspector::from_config(&settings.variables)
            .wrap_err("Invalid variable filter in configuration")?;

        Ok(Self {
            coordinator,
            abort,
            fetcher,
            completions,
            inspector,
            watcher: Watcher::default(),
            observer,
            launcher: None,
            attach_task: None,
            pending_fetches: 0,
        })
    }

    /// The shared coordinator.
    pub fn coordinator(&self) -> &SharedCoordinator<S> {
        &self.coordinator
    }

    /// The variable trees.
    pub fn inspector(&self) -> &NamespaceInspector {
        &self.inspector
    }

    /// The watched expressions.
    pub fn watcher(&self) -> &Watcher {
        &self.watcher
    }

    /// Whether an attach is in progress.
    pub fn is_attaching(&self) -> bool {
        self.attach_task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Number of namespace fetches whose result has not been applied yet.
    pub fn pending_fetches(&self) -> usize {
        self.pending_fetches
    }

    /// Whether the session is in use by an attach or a namespace fetch.
    ///
    /// Session commands and event polling are refused while busy, so the
    /// console never waits for the coordinator.
    pub fn is_busy(&self) -> bool {
        self.is_attaching() || self.pending_fetches > 0
    }

    /// Start attaching to `pid` in the background.
    ///
    /// The console keeps reading commands meanwhile, so `abort` can interrupt
    /// the attempts.
    pub fn attach(&mut self, pid: u32) {
        if self.is_busy() {
            println!("Session busy, try again.");
            return;
        }

        let launcher = Arc::new(ExternalProcess::new(pid));
        self.launcher = Some(Arc::clone(&launcher));
        let coordinator = Arc::clone(&self.coordinator);

        self.attach_task = Some(tokio::spawn(async move {
            let mut coordinator = coordinator.lock().await;
            if let Err(err) = coordinator.attach(launcher).await {
                debug!(%err, "Attach did not complete");
            }
        }));
    }

    /// Run one command; returns false when the console should exit.
    pub async fn execute(&mut self, command: Command) -> Result<bool> {
        match command {
            Command::Quit => return Ok(false),
            Command::Help => println!("{HELP}"),
            Command::Attach(pid) => self.attach(pid),
            Command::Abort => {
                // A busy session picks the request up once it is free
                self.abort.request();
                if !self.is_busy() {
                    self.coordinator.lock().await.abort().await;
                }
                println!("Abort requested.");
            }
            Command::Show(kind) => self.print_tree(kind),
            Command::Expand(kind, expr) => match self.inspector.expand(kind, &expr) {
                Some(request) => self.start_fetch(request),
                None => self.print_tree(kind),
            },
            Command::Collapse(kind, expr) => {
                if self.inspector.collapse(kind, &expr) {
                    self.print_tree(kind);
                } else {
                    println!("`{expr}` is not expanded.");
                }
            }
            Command::Filter(kind, pattern) => {
                let filter = NameFilter::new(&pattern)?;
                self.inspector.tree_mut(kind).set_filter(filter);
                self.observer.push(Notice::RefreshViews);
                if !self.is_busy() {
                    self.process_notices().await;
                }
            }
            Command::Watch(expr) => match self.watcher.add_expression(expr) {
                Some(id) => println!("Watching #{id}."),
                None => println!("Already watched."),
            },
            Command::SetWatchEnabled(id, enabled) => {
                if !self.watcher.set_enabled(id, enabled) {
                    println!("No watch #{id}.");
                } else if enabled {
                    self.observer.push(Notice::RefreshViews);
                }
            }
            Command::Unwatch(id) => match self.watcher.remove_expression(id) {
                Some(expr) => println!("Stopped watching `{expr}`."),
                None => println!("No watch #{id}."),
            },
            Command::Watches => self.print_watches(),
            command => {
                if self.is_attaching() {
                    println!("Attaching, wait or `abort`.");
                } else if self.pending_fetches > 0 {
                    println!("Loading variables, try again.");
                } else {
                    self.run_session_command(command).await;
                }
            }
        }

        self.flush_output();
        Ok(true)
    }

    async fn run_session_command(&mut self, command: Command) {
        let coordinator = Arc::clone(&self.coordinator);
        let mut coordinator = coordinator.lock().await;

        let result = match command {
            Command::Detach => coordinator.detach().await,
            Command::Go => coordinator.go().await,
            Command::Pause => coordinator.pause().await,
            Command::StepIn => coordinator.step_in().await,
            Command::StepOver => coordinator.step_over().await,
            Command::StepOut => coordinator.step_out().await,
            Command::Jump(line) => coordinator.jump(line).await,
            Command::RunTo { file, line } => coordinator.run_to_line(&file, line).await,
            Command::Stop => coordinator.stop().await,
            Command::Restart => coordinator.restart().await,
            Command::AddBreakpoint(spec) => {
                let location = spec.to_string();
                coordinator.add_user_breakpoint(spec).await.map(|added| {
                    if !added {
                        println!("Breakpoint already set at {location}.");
                    }
                })
            }
            Command::RemoveBreakpoint { file, line } => {
                coordinator.remove_user_breakpoint(&file, line).await.map(|removed| {
                    if !removed {
                        println!("No breakpoint at {}:{line}.", file.display());
                    }
                })
            }
            Command::ToggleBreakpoint { file, line } => {
                coordinator.toggle_user_breakpoint(&file, line).await.map(|present| {
                    let verb = if present { "set" } else { "removed" };
                    println!("Breakpoint {verb} at {}:{line}.", file.display());
                })
            }
            Command::SetBreakpointEnabled { file, line, enabled } => coordinator
                .set_user_breakpoint_enabled(&file, line, enabled)
                .await
                .map(|found| {
                    if !found {
                        println!("No breakpoint at {}:{line}.", file.display());
                    }
                }),
            Command::ListBreakpoints => {
                for ((file, line), bp) in coordinator.user_breakpoints().iter() {
                    let state = if bp.enabled { "" } else { " (disabled)" };
                    match &bp.condition {
                        Some(condition) => {
                            println!("{}:{line} if {condition}{state}", file.display())
                        }
                        None => println!("{}:{line}{state}", file.display()),
                    }
                }
                Ok(())
            }
            Command::Stack => coordinator.refresh_stack().await.map(|()| {
                print_stack(coordinator.stack(), coordinator.selected_frame_index())
            }),
            Command::Threads => coordinator.thread_list().await.map(|threads| print_threads(&threads)),
            Command::Frame(index) => coordinator.set_frame_index(index).await,
            Command::Thread(tid) => coordinator.set_thread(tid).await,
            Command::Analyze(analyze) => coordinator.set_analyze(analyze).await,
            Command::Assign { tree, expr, value } => self
                .inspector
                .assign(&mut *coordinator, tree, &expr, &value)
                .await
                .map(|_| ()),
            Command::Eval(expr) => coordinator.evaluate_with_type(&expr).await.map(|(value, ty)| {
                println!("{} ({})", value.display_text(), ty.display_text());
            }),
            Command::Exec(suite) => coordinator.execute(&suite).await.map(|execution| {
                if let Some(error) = execution.error.filter(|error| !error.is_empty()) {
                    println!("{error}");
                }
            }),
            other => {
                debug!(?other, "Not a session command");
                Ok(())
            }
        };

        match result {
            Ok(()) => {}
            Err(DebugError::NotAttached) => println!("Not attached to a debuggee."),
            // Already shown by the observer
            Err(err @ DebugError::Protocol { .. }) => debug!(%err, "Command failed"),
            Err(err) if err.is_absorbed() => debug!(%err, "Command had no effect"),
            Err(err) => println!("{err}"),
        }
    }

    /// Fetch session events and apply them. Does nothing while busy.
    pub async fn poll_events(&mut self) {
        if self.is_busy() {
            return;
        }

        {
            let mut coordinator = self.coordinator.lock().await;
            if self.abort.is_requested() {
                coordinator.abort().await;
            } else if coordinator.is_attached() {
                match coordinator.poll_events().await {
                    Ok(events) => {
                        for event in events {
                            coordinator.handle_event(event).await;
                        }
                    }
                    Err(err) => debug!(%err, "No session events"),
                }
            }
        }

        self.process_notices().await;
        self.flush_output();
    }

    fn start_fetch(&mut self, request: FetchRequest) {
        if self.fetcher.spawn(request) {
            self.pending_fetches += 1;
        }
    }

    /// Wait for every outstanding namespace fetch and apply its result.
    pub async fn settle_fetches(&mut self) {
        while self.pending_fetches > 0 {
            match self.completions.recv().await {
                Some(completion) => self.apply_completion(completion),
                None => {
                    self.pending_fetches = 0;
                    break;
                }
            }
        }
    }

    /// Merge a finished namespace fetch into its tree.
    pub fn apply_completion(&mut self, completion: FetchCompletion) {
        self.pending_fetches = self.pending_fetches.saturating_sub(1);
        let kind = completion.target.tree;
        let expanded_node = completion.target.node.is_some();

        match self.inspector.apply(completion) {
            Ok(outcome) => debug!(tree = %kind, ?outcome, "Namespace fetch applied"),
            Err(err @ DebugError::Protocol { .. }) => debug!(%err, "Namespace fetch failed"),
            Err(err) if err.is_absorbed() => debug!(%err, "Namespace fetch dropped"),
            Err(err) => println!("{err}"),
        }

        if expanded_node {
            self.print_tree(kind);
        }
    }

    /// Apply queued view notices: a clear anywhere empties the views, a refresh
    /// last reloads them.
    async fn process_notices(&mut self) {
        let notices = self.observer.take_notices();
        if notices.contains(&Notice::ClearViews) {
            self.inspector.clear_all();
            self.watcher.clear_values();
        }
        if notices.last() == Some(&Notice::RefreshViews) {
            self.refresh_views().await;
        }
    }

    async fn refresh_views(&mut self) {
        if self.is_busy() {
            self.observer.push(Notice::RefreshViews);
            return;
        }

        let frame = {
            let coordinator = Arc::clone(&self.coordinator);
            let mut coordinator = coordinator.lock().await;
            if !coordinator.is_broken() {
                return;
            }
            if let Err(err) = self.watcher.refresh(&mut *coordinator).await {
                debug!(%err, "Watch expressions not refreshed");
            }
            coordinator.selected_frame().cloned()
        };

        for request in self.inspector.begin_refresh(frame.as_ref()) {
            self.start_fetch(request);
        }
    }

    fn print_tree(&self, kind: TreeKind) {
        let tree = self.inspector.tree(kind);
        if tree.is_empty() {
            println!("{kind}: nothing to show.");
            return;
        }
        for line in render_tree(tree) {
            println!("{line}");
        }
    }

    fn print_watches(&self) {
        for (id, watched) in self.watcher.list_expressions() {
            let state = if watched.enabled { "" } else { " (disabled)" };
            match (&watched.value, &watched.type_name) {
                (Some(value), Some(ty)) => println!("#{id} {} = {value} ({ty}){state}", watched.expr),
                (Some(value), None) => println!("#{id} {} = {value}{state}", watched.expr),
                _ => println!("#{id} {}{state}", watched.expr),
            }
        }
    }

    fn flush_output(&self) {
        if let Some(launcher) = &self.launcher {
            for text in launcher.take_output() {
                print!("{text}");
            }
        }
        let _ = io::stdout().flush();
    }

    /// Run the console until `quit` or end of input.
    pub async fn run(mut self, poll_interval: Duration) -> Result<()> {
        info!("Starting console loop");
        println!("Type `help` for a list of commands.");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut ticker = interval(poll_interval);

        let result = loop {
            select! {
                line = lines.next_line() => {
                    let Some(line) = line.wrap_err("Failed to read from stdin")? else {
                        break Ok(());
                    };
                    if line.trim().is_empty() {
                        continue;
                    }
                    match line.parse::<Command>() {
                        Ok(command) => match self.execute(command).await {
                            Ok(true) => {}
                            Ok(false) => break Ok(()),
                            Err(e) => println!("{e}"),
                        },
                        Err(e) => println!("{e}"),
                    }
                }

                _ = ticker.tick() => self.poll_events().await,

                Some(completion) = self.completions.recv() => self.apply_completion(completion),
            }
        };

        self.shutdown().await;
        info!("Console loop ended");
        result
    }

    async fn shutdown(&mut self) {
        if let Some(task) = self.attach_task.take() {
            self.abort.request();
            if let Err(err) = task.await {
                debug!(%err, "Attach task ended abnormally");
            }
        }
        self.settle_fetches().await;

        if let Err(err) = self.coordinator.lock().await.detach().await {
            debug!(%err, "Detach on exit failed");
        }
        self.flush_output();
    }
}

/// Connect to `config.rpc_url` and run the console.
pub async fn start_console(config: ConsoleConfig) -> Result<()> {
    let session = RpcSession::new(&config.rpc_url)
        .await
        .wrap_err_with(|| format!("Failed to create session client for {}", config.rpc_url))?;

    let mut console = Console::new(session, &config.settings).await?;
    if let Some(pid) = config.pid {
        console.attach(pid);
    }
    console.run(config.poll_interval).await
}
