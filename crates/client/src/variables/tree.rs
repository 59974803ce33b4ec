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

use std::collections::VecDeque;

use rdb_common::{find_namespace_entry, ExpressionRequest, FilterLevel, NamespaceNode};
use tracing::debug;

use super::{ChildState, FetchFailure, NameFilter, VariableTreeNode};
use crate::DebugError;

/// Selected row of a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// A variable, by expression
    Node(String),
    /// The placeholder row under `parent`
    Placeholder {
        /// Expression of the node owning the placeholder
        parent: String,
    },
}

/// What merging a namespace answer into a node did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The answer has no entry for the node; nothing changed
    Missing,
    /// The debuggee could not evaluate the node; only its subtree is abandoned
    Failed(String),
    /// The value has no children
    Leaf,
    /// Nothing came back; the timeout placeholder is shown
    TimedOut,
    /// Children were replaced
    Merged {
        /// Children kept by the name filter
        shown: usize,
        /// Children dropped by the name filter
        filtered: usize,
    },
}

/// A visible row, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeRow<'a> {
    /// A variable
    Node {
        /// Nesting below the root
        depth: usize,
        /// The variable
        node: &'a VariableTreeNode,
    },
    /// Loading or failure placeholder
    Placeholder {
        /// Nesting below the root
        depth: usize,
        /// Expression of the node owning the placeholder
        parent: &'a str,
        /// Text to show
        text: &'a str,
    },
}

/// A lazily expanded tree of debuggee variables.
///
/// Children are fetched only when a node is expanded. Every node is addressed by
/// its expression; a fetch result whose expression is no longer visible is
/// dropped. The generation changes whenever the content is thrown away, so
/// results requested before that can be recognized as stale.
#[derive(Debug, Clone)]
pub struct VariableTree {
    root_expr: String,
    filter: NameFilter,
    level: FilterLevel,
    key: Option<String>,
    generation: u64,
    root: Option<VariableTreeNode>,
    selection: Option<Selection>,
}

impl VariableTree {
    /// Empty tree rooted at `root_expr`.
    pub fn new(root_expr: impl Into<String>) -> Self {
        Self {
            root_expr: root_expr.into(),
            filter: NameFilter::default(),
            level: FilterLevel::default(),
            key: None,
            generation: 0,
            root: None,
            selection: None,
        }
    }

    /// Use `filter` and `level` for the following fetches.
    pub fn with_filter(mut self, filter: NameFilter, level: FilterLevel) -> Self {
        self.filter = filter;
        self.level = level;
        self
    }

    /// Expression listing the top level.
    pub fn root_expr(&self) -> &str {
        &self.root_expr
    }

    /// Filter applied to child names.
    pub fn filter(&self) -> &NameFilter {
        &self.filter
    }

    /// Change the name filter. Shown children are filtered again on the next merge.
    pub fn set_filter(&mut self, filter: NameFilter) {
        self.filter = filter;
    }

    /// Verbosity requested from the debuggee.
    pub fn filter_level(&self) -> FilterLevel {
        self.level
    }

    /// Change the requested verbosity.
    pub fn set_filter_level(&mut self, level: FilterLevel) {
        self.level = level;
    }

    /// Namespace key (frame) the content belongs to.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Switch to another namespace key, returning the previous one.
    pub fn set_key(&mut self, key: String) -> Option<String> {
        self.key.replace(key)
    }

    /// Current generation; fetch results from other generations are stale.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Mark every outstanding fetch as stale.
    pub fn invalidate(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Root node, if anything was loaded.
    pub fn root(&self) -> Option<&VariableTreeNode> {
        self.root.as_ref()
    }

    /// Whether nothing is shown.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Drop the content and every outstanding fetch.
    pub fn clear(&mut self) {
        self.root = None;
        self.selection = None;
        self.invalidate();
    }

    /// Selected row.
    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Select the visible variable `expr`; returns false if it is not shown.
    pub fn select(&mut self, expr: &str) -> bool {
        if self.find_node_by_expr(expr).is_none() {
            return false;
        }
        self.selection = Some(Selection::Node(expr.to_string()));
        true
    }

    /// Rebuild the tree from a full namespace answer.
    ///
    /// Every node that has an entry in `snapshot` is expanded again, which
    /// restores the expansion recorded by [`Self::expression_list`].
    pub fn populate(&mut self, snapshot: &[NamespaceNode]) -> MergeOutcome {
        let mut root = VariableTreeNode::root(&self.root_expr);
        let outcome = fill(&mut root, snapshot, &self.filter, &mut Vec::new());
        self.root = Some(root);

        let selection_visible = match &self.selection {
            Some(Selection::Node(expr)) => self.find_node_by_expr(expr).is_some(),
            _ => false,
        };
        if !selection_visible {
            self.selection = None;
        }
        outcome
    }

    /// Expand the node `expr`.
    ///
    /// Returns the request to send when the children must be fetched. Expanding
    /// a node whose fetch is outstanding, or whose children are already shown,
    /// sends nothing.
    pub fn expand(&mut self, expr: &str) -> Option<ExpressionRequest> {
        let Some(node) = self.find_visible_mut(expr) else {
            debug!(expr, "Cannot expand a node that is not shown");
            return None;
        };
        if !node.has_children {
            return None;
        }

        node.expanded = true;
        let needs_fetch = match &node.children {
            ChildState::Loading => false,
            ChildState::Loaded(children) => children.is_empty(),
            ChildState::Unloaded | ChildState::Failed(_) => true,
        };
        if !needs_fetch {
            return None;
        }
        node.children = ChildState::Loading;
        Some(ExpressionRequest::expanded(expr))
    }

    /// Hide the children of `expr`. They stay loaded.
    pub fn collapse(&mut self, expr: &str) -> bool {
        match self.find_visible_mut(expr) {
            Some(node) if node.expanded => {
                node.expanded = false;
                true
            }
            _ => false,
        }
    }

    /// Replace the children of `expr` with those listed in `variables`.
    ///
    /// Fails with [`DebugError::StaleResponse`] when `expr` is not shown anymore.
    pub fn merge_children(
        &mut self,
        expr: &str,
        variables: &[NamespaceNode],
    ) -> Result<MergeOutcome, DebugError> {
        let filter = &self.filter;
        let node = self
            .root
            .as_mut()
            .and_then(|root| find_visible_mut(root, expr))
            .ok_or_else(|| DebugError::StaleResponse { expr: expr.to_string() })?;
        Ok(merge_into(node, variables, filter))
    }

    /// Apply fresh children to `expr`, keeping the selection on its first row.
    pub fn refresh(
        &mut self,
        expr: &str,
        variables: &[NamespaceNode],
    ) -> Result<MergeOutcome, DebugError> {
        let first_selected = self.is_first_child_selected(expr);
        let outcome = self.merge_children(expr, variables)?;

        if let Some(node) = self.find_visible_mut(expr) {
            if outcome == MergeOutcome::Missing && node.is_loading() {
                node.children = ChildState::Unloaded;
                node.expanded = false;
            }
        }
        if first_selected {
            self.select_first_row(expr);
        }
        Ok(outcome)
    }

    /// Show `failure` in place of the children of `expr`.
    pub fn apply_fetch_failure(
        &mut self,
        expr: &str,
        failure: FetchFailure,
    ) -> Result<(), DebugError> {
        let first_selected = self.is_first_child_selected(expr);
        let node = self
            .find_visible_mut(expr)
            .ok_or_else(|| DebugError::StaleResponse { expr: expr.to_string() })?;
        node.children = ChildState::Failed(failure);
        node.expanded = true;

        if first_selected {
            self.select_first_row(expr);
        }
        Ok(())
    }

    /// Put back every outstanding fetch to unloaded.
    pub fn cancel_loading(&mut self) {
        if let Some(root) = &mut self.root {
            cancel_loading(root);
        }
    }

    /// Requests that fetch the tree with its current expansion.
    ///
    /// Lists every expanded node that shows real children, parents before their
    /// children. `None` when nothing is expanded.
    pub fn expression_list(&self) -> Option<Vec<ExpressionRequest>> {
        let root = self.root.as_ref()?;
        let mut list = Vec::new();
        let mut queue = VecDeque::from([root]);

        while let Some(node) = queue.pop_front() {
            if node.expanded && !node.real_children().is_empty() {
                list.push(ExpressionRequest::expanded(node.key.clone()));
                queue.extend(node.real_children());
            }
        }

        (!list.is_empty()).then_some(list)
    }

    /// The shown node whose expression is `expr`.
    ///
    /// Children of collapsed nodes are not shown.
    pub fn find_node_by_expr(&self, expr: &str) -> Option<&VariableTreeNode> {
        find_visible(self.root.as_ref()?, expr)
    }

    /// Rows to display, in order. The root itself is not displayed.
    pub fn visible_rows(&self) -> Vec<TreeRow<'_>> {
        let mut rows = Vec::new();
        if let Some(root) = &self.root {
            push_children(root, 0, &mut rows);
        }
        rows
    }

    fn find_visible_mut(&mut self, expr: &str) -> Option<&mut VariableTreeNode> {
        find_visible_mut(self.root.as_mut()?, expr)
    }

    fn is_first_child_selected(&self, expr: &str) -> bool {
        match &self.selection {
            Some(Selection::Placeholder { parent }) => parent == expr,
            Some(Selection::Node(selected)) => self
                .find_node_by_expr(expr)
                .and_then(|node| node.real_children().first())
                .is_some_and(|first| &first.key == selected),
            None => false,
        }
    }

    fn select_first_row(&mut self, expr: &str) {
        let Some(node) = self.find_node_by_expr(expr) else {
            return;
        };
        self.selection = if let Some(first) = node.real_children().first() {
            Some(Selection::Node(first.key.clone()))
        } else if node.placeholder().is_some() {
            Some(Selection::Placeholder { parent: expr.to_string() })
        } else {
            None
        };
    }
}

fn merge_into(
    node: &mut VariableTreeNode,
    variables: &[NamespaceNode],
    filter: &NameFilter,
) -> MergeOutcome {
    let Some(entry) = find_namespace_entry(variables, &node.key) else {
        return MergeOutcome::Missing;
    };

    if let Some(reason) = &entry.error {
        debug!(expr = %node.key, %reason, "Debuggee could not expand node");
        node.children = ChildState::Failed(FetchFailure::SubtreeError(reason.clone()));
        node.expanded = true;
        return MergeOutcome::Failed(reason.clone());
    }

    if entry.is_leaf() {
        node.has_children = false;
        node.children = ChildState::Loaded(Vec::new());
        node.expanded = false;
        return MergeOutcome::Leaf;
    }

    let (kept, dropped): (Vec<&NamespaceNode>, Vec<&NamespaceNode>) =
        entry.children.iter().partition(|child| filter.matches(&child.name));
    let children: Vec<VariableTreeNode> =
        kept.into_iter().map(VariableTreeNode::from_namespace).collect();
    let shown = children.len();

    node.has_children = true;
    node.children = ChildState::Loaded(children);
    node.expanded = true;
    MergeOutcome::Merged { shown, filtered: dropped.len() }
}

/// Merge `snapshot` into `node` and its descendants.
///
/// A child whose expression is already expanded above it is left unloaded.
fn fill(
    node: &mut VariableTreeNode,
    snapshot: &[NamespaceNode],
    filter: &NameFilter,
    ancestors: &mut Vec<String>,
) -> MergeOutcome {
    let outcome = merge_into(node, snapshot, filter);
    ancestors.push(node.key.clone());
    if let ChildState::Loaded(children) = &mut node.children {
        for child in children.iter_mut() {
            if ancestors.contains(&child.key) {
                debug!(expr = %child.key, "Not expanding a node inside itself");
                continue;
            }
            if child.has_children && find_namespace_entry(snapshot, &child.key).is_some() {
                fill(child, snapshot, filter, ancestors);
            }
        }
    }
    ancestors.pop();
    outcome
}

fn find_visible<'a>(node: &'a VariableTreeNode, expr: &str) -> Option<&'a VariableTreeNode> {
    if node.key == expr {
        return Some(node);
    }
    if !node.expanded {
        return None;
    }
    node.real_children().iter().find_map(|child| find_visible(child, expr))
}

fn find_visible_mut<'a>(
    node: &'a mut VariableTreeNode,
    expr: &str,
) -> Option<&'a mut VariableTreeNode> {
    if node.key == expr {
        return Some(node);
    }
    if !node.expanded {
        return None;
    }
    match &mut node.children {
        ChildState::Loaded(children) => {
            children.iter_mut().find_map(|child| find_visible_mut(child, expr))
        }
        _ => None,
    }
}

fn cancel_loading(node: &mut VariableTreeNode) {
    if node.is_loading() {
        node.children = ChildState::Unloaded;
        node.expanded = false;
    } else if let ChildState::Loaded(children) = &mut node.children {
        children.iter_mut().for_each(cancel_loading);
    }
}

fn push_children<'a>(node: &'a VariableTreeNode, depth: usize, rows: &mut Vec<TreeRow<'a>>) {
    if !node.expanded {
        return;
    }
    if let Some(text) = node.placeholder() {
        rows.push(TreeRow::Placeholder { depth, parent: &node.key, text });
        return;
    }
    for child in node.real_children() {
        rows.push(TreeRow::Node { depth, node: child });
        push_children(child, depth + 1, rows);
    }
}
