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

use std::collections::HashSet;

use tracing::debug;

use crate::{DebugCoordinator, DebugError, ProtocolSession};

/// An expression evaluated every time the debuggee stops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedExpression {
    /// Expression as typed by the user
    pub expr: String,
    /// Disabled expressions are not evaluated
    pub enabled: bool,
    /// Value, or the error raised by the expression
    pub value: Option<String>,
    /// Type name of the value
    pub type_name: Option<String>,
}

/// Watcher for monitoring user-defined expressions
#[derive(Debug, Clone, Default)]
pub struct Watcher {
    /// Expressions being monitored
    expressions: Vec<WatchedExpression>,
    /// Keys of the expressions, to reject duplicates
    expression_keys: HashSet<String>,
}

fn normalize_expression(expr: &str) -> String {
    expr.chars().filter(|&c| !c.is_whitespace()).collect()
}

impl Watcher {
    /// Add a new expression to the watcher
    pub fn add_expression(&mut self, expr: String) -> Option<usize> {
        let expr_key = normalize_expression(&expr);
        if expr_key.is_empty() || !self.expression_keys.insert(expr_key) {
            return None;
        }
        self.expressions.push(WatchedExpression {
            expr,
            enabled: true,
            value: None,
            type_name: None,
        });
        Some(self.expressions.len()) // 1-based id
    }

    /// Remove an expression from the watcher
    pub fn remove_expression(&mut self, expr_id: usize) -> Option<String> {
        if expr_id == 0 || expr_id > self.expressions.len() {
            return None;
        }
        let watched = self.expressions.remove(expr_id - 1);
        self.expression_keys.remove(&normalize_expression(&watched.expr));
        Some(watched.expr)
    }

    /// Enable or disable an expression. Disabling drops its value.
    pub fn set_enabled(&mut self, expr_id: usize, enabled: bool) -> bool {
        let Some(watched) = expr_id.checked_sub(1).and_then(|i| self.expressions.get_mut(i)) else {
            return false;
        };
        watched.enabled = enabled;
        if !enabled {
            watched.value = None;
            watched.type_name = None;
        }
        true
    }

    /// Return a list of all watched expressions with their IDs
    pub fn list_expressions(&self) -> impl Iterator<Item = (usize, &WatchedExpression)> {
        self.expressions.iter().enumerate().map(|(i, watched)| (i + 1, watched))
    }

    /// Get the count of watched expressions
    pub fn count(&self) -> usize {
        self.expressions.len()
    }

    /// Clear all expressions from the watcher
    pub fn clear(&mut self) {
        self.expressions.clear();
        self.expression_keys.clear();
    }

    /// Forget every value, keeping the expressions.
    pub fn clear_values(&mut self) {
        for watched in &mut self.expressions {
            watched.value = None;
            watched.type_name = None;
        }
    }

    /// Evaluate every enabled expression in the selected frame.
    ///
    /// Nothing is evaluated unless the debuggee is stopped. Returns the number of
    /// expressions updated.
    pub async fn refresh<S: ProtocolSession>(
        &mut self,
        coordinator: &mut DebugCoordinator<S>,
    ) -> Result<usize, DebugError> {
        if !coordinator.is_broken() {
            return Ok(0);
        }

        let mut updated = 0;
        for watched in self.expressions.iter_mut().filter(|w| w.enabled) {
            match coordinator.evaluate_with_type(&watched.expr).await {
                Ok((value, type_name)) => {
                    watched.value = Some(value.display_text().to_string());
                    watched.type_name = Some(type_name.display_text().to_string());
                    updated += 1;
                }
                Err(DebugError::NotAttached) => return Err(DebugError::NotAttached),
                Err(err) => {
                    debug!(expr = %watched.expr, %err, "Watch expression not evaluated");
                    watched.value = None;
                    watched.type_name = None;
                }
            }
        }
        Ok(updated)
    }
}
