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

//! Namespace snapshots returned by the debuggee.
//!
//! A namespace query takes a list of [`ExpressionRequest`]s and answers with one
//! [`NamespaceNode`] per expression. Each node lists its immediate children; deeper
//! levels are fetched by querying the child's `expr`.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Verbosity filter the debuggee applies to the representations it returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterLevel {
    /// Return everything
    #[default]
    Off,
    /// Hide private and special members
    Medium,
    /// Hide everything but plain data
    Maximum,
}

impl FilterLevel {
    /// Numeric level as understood by the debuggee.
    pub fn as_index(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::Medium => 1,
            Self::Maximum => 2,
        }
    }

    /// Level from its numeric form.
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Off),
            1 => Some(Self::Medium),
            2 => Some(Self::Maximum),
            _ => None,
        }
    }
}

impl Display for FilterLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Off => write!(f, "off"),
            Self::Medium => write!(f, "medium"),
            Self::Maximum => write!(f, "maximum"),
        }
    }
}

/// One expression of a namespace query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExpressionRequest {
    /// Expression key to evaluate
    pub expr: String,
    /// Whether the immediate children should be listed
    pub expand: bool,
}

impl ExpressionRequest {
    /// Request `expr` together with its children.
    pub fn expanded(expr: impl Into<String>) -> Self {
        Self { expr: expr.into(), expand: true }
    }
}

/// A node of the debuggee namespace.
///
/// `expr` is the unique key used to query the node again. Nodes with a
/// `child_count` of zero are leaves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceNode {
    /// Display name inside the parent (attribute, key or index)
    #[serde(default)]
    pub name: String,
    /// Expression addressing this node
    pub expr: String,
    /// Type name of the value
    #[serde(default, rename = "type")]
    pub type_name: String,
    /// Representation of the value
    #[serde(default)]
    pub repr: String,
    /// Whether the expression can be assigned to
    #[serde(default, rename = "fvalid")]
    pub is_valid: bool,
    /// Number of children the value has
    #[serde(default, rename = "n_subnodes")]
    pub child_count: usize,
    /// Immediate children, present when the node was requested expanded
    #[serde(default, rename = "subnodes")]
    pub children: Vec<NamespaceNode>,
    /// Evaluation failure for this expression only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NamespaceNode {
    /// Whether the node has no children.
    pub fn is_leaf(&self) -> bool {
        self.child_count == 0
    }
}

/// First entry of a namespace answer whose expression is `expr`.
pub fn find_namespace_entry<'a>(
    snapshot: &'a [NamespaceNode],
    expr: &str,
) -> Option<&'a NamespaceNode> {
    snapshot.iter().find(|node| node.expr == expr)
}
