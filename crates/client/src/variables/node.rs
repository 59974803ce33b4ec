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

use rdb_common::NamespaceNode;

/// Text of the placeholder shown while children are fetched.
pub const LOADING_TEXT: &str = "Loading...";

/// Text of the placeholder shown when fetching children failed.
pub const TIMEOUT_TEXT: &str = "Data Retrieval Timeout";

/// Icon of a variable, derived once from its type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IconClass {
    /// Classes and modules
    TypeLike,
    /// Functions and methods
    CallableLike,
    /// Everything else
    PlainVariable,
}

impl IconClass {
    /// Classify a debuggee type name.
    pub fn from_type_name(type_name: &str) -> Self {
        match type_name {
            "type" | "module" => Self::TypeLike,
            "function" | "builtin_function_or_method" | "instancemethod" | "method" => {
                Self::CallableLike
            }
            _ => Self::PlainVariable,
        }
    }
}

/// Why the children of a node could not be shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// The debuggee returned nothing in time
    Timeout,
    /// The debuggee could not evaluate this expression
    SubtreeError(String),
}

impl FetchFailure {
    /// Placeholder text for this failure.
    pub fn placeholder_text(&self) -> &str {
        match self {
            Self::Timeout => TIMEOUT_TEXT,
            Self::SubtreeError(reason) => reason,
        }
    }
}

/// Load state of the children of a node.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChildState {
    /// Never fetched
    #[default]
    Unloaded,
    /// Fetch outstanding; shown as a single placeholder row
    Loading,
    /// Fetched children, after filtering
    Loaded(Vec<VariableTreeNode>),
    /// Fetch failed; shown as a single placeholder row, expanding again retries
    Failed(FetchFailure),
}

/// A row of a variable tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableTreeNode {
    /// Expression used to query this node again
    pub key: String,
    /// Name inside the parent
    pub label: String,
    /// Representation of the value
    pub display_value: String,
    /// Type name of the value
    pub display_type: String,
    /// Whether the expression can be assigned to
    pub is_valid: bool,
    /// Icon derived from the type
    pub icon: IconClass,
    /// Whether the value has children at all
    pub has_children: bool,
    /// Children, fetched on expansion
    pub children: ChildState,
    /// Whether the children are shown
    pub expanded: bool,
}

impl VariableTreeNode {
    /// Root of a tree for `expr` (for instance `locals()`).
    pub fn root(expr: &str) -> Self {
        Self {
            key: expr.to_string(),
            label: expr.to_string(),
            display_value: String::new(),
            display_type: String::new(),
            is_valid: false,
            icon: IconClass::PlainVariable,
            has_children: true,
            children: ChildState::Unloaded,
            expanded: false,
        }
    }

    /// Unexpanded node for a namespace entry.
    pub fn from_namespace(node: &NamespaceNode) -> Self {
        Self {
            key: node.expr.clone(),
            label: node.name.clone(),
            display_value: node.repr.clone(),
            display_type: node.type_name.clone(),
            is_valid: node.is_valid,
            icon: IconClass::from_type_name(&node.type_name),
            has_children: node.child_count > 0,
            children: ChildState::Unloaded,
            expanded: false,
        }
    }

    /// Children that stand for real values; placeholders do not count.
    pub fn real_children(&self) -> &[Self] {
        match &self.children {
            ChildState::Loaded(children) => children,
            _ => &[],
        }
    }

    /// Whether a fetch for the children is outstanding.
    pub fn is_loading(&self) -> bool {
        self.children == ChildState::Loading
    }

    /// Placeholder row shown instead of children, if any.
    pub fn placeholder(&self) -> Option<&str> {
        match &self.children {
            ChildState::Loading => Some(LOADING_TEXT),
            ChildState::Failed(failure) => Some(failure.placeholder_text()),
            _ => None,
        }
    }
}
