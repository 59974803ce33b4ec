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

//! Background namespace fetches.
//!
//! The view task must never wait on the debuggee. [`NamespaceFetcher`] runs every
//! namespace query on its own task and hands the result back through a channel
//! that the view task drains in its event loop.

use std::sync::Arc;

use dashmap::DashSet;
use rdb_common::{ExpressionRequest, FilterLevel, NamespaceNode};
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use crate::{DebugCoordinator, DebugError, ProtocolSession, TreeKind};

/// Coordinator shared between the view task and background fetches.
pub type SharedCoordinator<S> = Arc<Mutex<DebugCoordinator<S>>>;

/// Where the result of a fetch goes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchTarget {
    /// Tree the fetch belongs to
    pub tree: TreeKind,
    /// Generation of the tree when the fetch was issued
    pub generation: u64,
    /// Expanded node, or `None` to reload the whole tree
    pub node: Option<String>,
}

/// A namespace query to run in the background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Where the result goes
    pub target: FetchTarget,
    /// Expressions to evaluate
    pub requests: Vec<ExpressionRequest>,
    /// Verbosity of the answer
    pub level: FilterLevel,
}

/// A finished namespace query.
#[derive(Debug)]
pub struct FetchCompletion {
    /// Where the result goes
    pub target: FetchTarget,
    /// Namespace entries, or why the query failed
    pub result: Result<Vec<NamespaceNode>, DebugError>,
}

/// Runs namespace queries off the view task.
#[derive(Debug)]
pub struct NamespaceFetcher<S> {
    coordinator: SharedCoordinator<S>,
    completions: mpsc::UnboundedSender<FetchCompletion>,
    in_flight: Arc<DashSet<FetchTarget>>,
}

impl<S: ProtocolSession> NamespaceFetcher<S> {
    /// Create a fetcher and the receiver its results arrive on.
    pub fn new(
        coordinator: SharedCoordinator<S>,
    ) -> (Self, mpsc::UnboundedReceiver<FetchCompletion>) {
        let (completions, receiver) = mpsc::unbounded_channel();
        (Self { coordinator, completions, in_flight: Arc::new(DashSet::new()) }, receiver)
    }

    /// Whether a fetch for `target` is outstanding.
    pub fn is_in_flight(&self, target: &FetchTarget) -> bool {
        self.in_flight.contains(target)
    }

    /// Number of outstanding fetches.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Start `request` in the background.
    ///
    /// Returns false, without starting anything, if the same target is already
    /// being fetched.
    pub fn spawn(&self, request: FetchRequest) -> bool {
        if !self.in_flight.insert(request.target.clone()) {
            debug!(target = ?request.target, "Fetch already in flight");
            return false;
        }

        let coordinator = Arc::clone(&self.coordinator);
        let in_flight = Arc::clone(&self.in_flight);
        let completions = self.completions.clone();

        tokio::spawn(async move {
            let FetchRequest { target, requests, level } = request;
            debug!(?target, count = requests.len(), "Fetching namespace");

            let result = coordinator.lock().await.namespace(&requests, level).await;

            in_flight.remove(&target);
            if completions.send(FetchCompletion { target, result }).is_err() {
                debug!("Fetch result dropped, receiver is gone");
            }
        });
        true
    }
}
