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

//! Variable inspection.
//!
//! Three lazily expanded trees (locals, globals and exception information) are
//! kept for the selected frame. Expanding a node issues a namespace fetch for
//! that node only; results are merged back by expression, so a result for a
//! node that is no longer shown is simply dropped. The expansion of each tree is
//! remembered per frame and restored when the frame is shown again.

mod filter;
mod inspector;
mod node;
mod tree;

pub use filter::NameFilter;
pub use inspector::{NamespaceInspector, TreeKind};
pub use node::{ChildState, FetchFailure, IconClass, VariableTreeNode, LOADING_TEXT, TIMEOUT_TEXT};
pub use tree::{MergeOutcome, Selection, TreeRow, VariableTree};
