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

use std::{collections::HashMap, fmt::Display, str::FromStr};

use rdb_common::{Execution, ExpressionRequest, StackFrame};
use tracing::debug;

use super::{FetchFailure, MergeOutcome, NameFilter, VariableTree};
use crate::{
    config::{TreeFilterConfig, VariablesConfig},
    DebugCoordinator, DebugError, FetchCompletion, FetchRequest, FetchTarget, ProtocolSession,
};

/// The three variable trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TreeKind {
    /// Variables local to the frame
    Locals,
    /// Module globals of the frame
    Globals,
    /// Information on the exception being handled
    Exceptions,
}

impl TreeKind {
    /// Every tree, in display order.
    pub const ALL: [Self; 3] = [Self::Locals, Self::Globals, Self::Exceptions];

    /// Expression listing the top level of the tree.
    pub fn root_expr(self) -> &'static str {
        match self {
            Self::Locals => "locals()",
            Self::Globals => "globals()",
            Self::Exceptions => "rpdb_exception_info",
        }
    }

    /// Key under which the expansion of this tree is remembered for `frame`.
    ///
    /// Locals belong to the code of the frame and globals to its file. There is a
    /// single exception tree.
    pub fn namespace_key(self, frame: &StackFrame) -> String {
        match self {
            Self::Locals => frame.function.clone(),
            Self::Globals => frame.file.display().to_string(),
            Self::Exceptions => "exception".to_string(),
        }
    }
}

impl Display for TreeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Locals => write!(f, "locals"),
            Self::Globals => write!(f, "globals"),
            Self::Exceptions => write!(f, "exceptions"),
        }
    }
}

impl FromStr for TreeKind {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "locals" | "l" => Ok(Self::Locals),
            "globals" | "g" => Ok(Self::Globals),
            "exceptions" | "exception" | "e" => Ok(Self::Exceptions),
            _ => Err(eyre::eyre!("Unknown variable tree: {s}")),
        }
    }
}

/// Locals, globals and exception trees of the selected frame.
#[derive(Debug, Clone)]
pub struct NamespaceInspector {
    locals: VariableTree,
    globals: VariableTree,
    exceptions: VariableTree,
    /// Expansion of each tree, per namespace key, for frames not shown now
    expansions: HashMap<(TreeKind, String), Vec<ExpressionRequest>>,
}

impl Default for NamespaceInspector {
    fn default() -> Self {
        Self::new()
    }
}

impl NamespaceInspector {
    /// Empty trees without name filters.
    pub fn new() -> Self {
        Self {
            locals: VariableTree::new(TreeKind::Locals.root_expr()),
            globals: VariableTree::new(TreeKind::Globals.root_expr()),
            exceptions: VariableTree::new(TreeKind::Exceptions.root_expr()),
            expansions: HashMap::new(),
        }
    }

    /// Empty trees with the configured filters.
    pub fn from_config(config: &VariablesConfig) -> Result<Self, DebugError> {
        fn tree(kind: TreeKind, config: &TreeFilterConfig) -> Result<VariableTree, DebugError> {
            let filter = NameFilter::new(&config.filter_expr)?;
            Ok(VariableTree::new(kind.root_expr()).with_filter(filter, config.filter_level))
        }

        Ok(Self {
            locals: tree(TreeKind::Locals, &config.locals)?,
            globals: tree(TreeKind::Globals, &config.globals)?,
            exceptions: tree(TreeKind::Exceptions, &config.exceptions)?,
            expansions: HashMap::new(),
        })
    }

    /// The `kind` tree.
    pub fn tree(&self, kind: TreeKind) -> &VariableTree {
        match kind {
            TreeKind::Locals => &self.locals,
            TreeKind::Globals => &self.globals,
            TreeKind::Exceptions => &self.exceptions,
        }
    }

    /// Mutable access to the `kind` tree.
    pub fn tree_mut(&mut self, kind: TreeKind) -> &mut VariableTree {
        match kind {
            TreeKind::Locals => &mut self.locals,
            TreeKind::Globals => &mut self.globals,
            TreeKind::Exceptions => &mut self.exceptions,
        }
    }

    /// Expansion remembered for `kind` under `key`.
    pub fn remembered_expansion(&self, kind: TreeKind, key: &str) -> Option<&[ExpressionRequest]> {
        self.expansions.get(&(kind, key.to_string())).map(Vec::as_slice)
    }

    /// Start reloading every tree for `frame`.
    ///
    /// The expansion of the frame shown so far is remembered, and the expansion
    /// remembered for `frame` is requested again. Without a frame every tree is
    /// cleared and nothing is fetched.
    pub fn begin_refresh(&mut self, frame: Option<&StackFrame>) -> Vec<FetchRequest> {
        let Some(frame) = frame else {
            self.clear_all();
            return Vec::new();
        };
        TreeKind::ALL.into_iter().map(|kind| self.begin_tree_refresh(kind, frame)).collect()
    }

    fn begin_tree_refresh(&mut self, kind: TreeKind, frame: &StackFrame) -> FetchRequest {
        let key = kind.namespace_key(frame);
        let current = self.tree(kind).expression_list();
        let previous_key = self.tree_mut(kind).set_key(key.clone());

        let requested = if previous_key.as_deref() == Some(key.as_str()) {
            current.clone()
        } else {
            self.expansions.get(&(kind, key)).cloned()
        };
        if let (Some(previous_key), Some(current)) = (previous_key, current) {
            self.expansions.insert((kind, previous_key), current);
        }

        let requests =
            requested.unwrap_or_else(|| vec![ExpressionRequest::expanded(kind.root_expr())]);
        let tree = self.tree_mut(kind);
        let generation = tree.invalidate();
        FetchRequest {
            target: FetchTarget { tree: kind, generation, node: None },
            requests,
            level: tree.filter_level(),
        }
    }

    /// Expand `expr` in the `kind` tree, returning the fetch to issue if any.
    pub fn expand(&mut self, kind: TreeKind, expr: &str) -> Option<FetchRequest> {
        let tree = self.tree_mut(kind);
        let request = tree.expand(expr)?;
        Some(FetchRequest {
            target: FetchTarget {
                tree: kind,
                generation: tree.generation(),
                node: Some(expr.to_string()),
            },
            requests: vec![request],
            level: tree.filter_level(),
        })
    }

    /// Collapse `expr` in the `kind` tree.
    pub fn collapse(&mut self, kind: TreeKind, expr: &str) -> bool {
        self.tree_mut(kind).collapse(expr)
    }

    /// Merge a finished fetch into its tree.
    ///
    /// Results requested before the tree was last reset fail with
    /// [`DebugError::StaleResponse`] and change nothing.
    pub fn apply(&mut self, completion: FetchCompletion) -> Result<MergeOutcome, DebugError> {
        let FetchCompletion { target, result } = completion;
        let tree = self.tree_mut(target.tree);

        if target.generation != tree.generation() {
            let expr = target.node.unwrap_or_else(|| tree.root_expr().to_string());
            debug!(tree = %target.tree, %expr, "Dropping result of an outdated fetch");
            return Err(DebugError::StaleResponse { expr });
        }

        let (expr, outcome) = match target.node {
            None => {
                let expr = tree.root_expr().to_string();
                match result {
                    Ok(snapshot) if !snapshot.is_empty() => (expr, tree.populate(&snapshot)),
                    Ok(_) => {
                        tree.cancel_loading();
                        (expr, MergeOutcome::Missing)
                    }
                    Err(err) => {
                        tree.cancel_loading();
                        return Err(err);
                    }
                }
            }
            Some(expr) => match result {
                Ok(variables) if !variables.is_empty() => {
                    let outcome = tree.refresh(&expr, &variables)?;
                    (expr, outcome)
                }
                Ok(_) => {
                    tree.apply_fetch_failure(&expr, FetchFailure::Timeout)?;
                    (expr, MergeOutcome::TimedOut)
                }
                Err(err) => {
                    debug!(%expr, %err, "Fetching children failed");
                    tree.apply_fetch_failure(&expr, FetchFailure::Timeout)?;
                    return Err(err);
                }
            },
        };

        match outcome {
            MergeOutcome::Failed(reason) => Err(DebugError::SubtreeFailed { expr, reason }),
            outcome => Ok(outcome),
        }
    }

    /// Empty every tree and drop outstanding fetches. Remembered expansions are kept.
    pub fn clear_all(&mut self) {
        for kind in TreeKind::ALL {
            self.tree_mut(kind).clear();
        }
    }

    /// Assign `value` to the variable `expr` shown in the `kind` tree.
    pub async fn assign<S: ProtocolSession>(
        &self,
        coordinator: &mut DebugCoordinator<S>,
        kind: TreeKind,
        expr: &str,
        value: &str,
    ) -> Result<Execution, DebugError> {
        let node = self
            .tree(kind)
            .find_node_by_expr(expr)
            .ok_or_else(|| DebugError::StaleResponse { expr: expr.to_string() })?;
        if !node.is_valid {
            return Err(DebugError::ReadOnly { expr: expr.to_string() });
        }
        coordinator.assign(expr, value).await
    }
}
