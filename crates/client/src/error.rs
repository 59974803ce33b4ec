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

//! Errors surfaced by the debugger client and their user-facing text.

use rdb_common::ProtocolError;
use thiserror::Error;

/// Classification of client failures by how they are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No debuggee attached; recovered silently by detaching
    NotAttached,
    /// Any other session failure; logged and shown to the user
    TransportOrProtocol,
    /// Attach retries exhausted
    AttachFailure,
    /// Result for an expression that is no longer shown; dropped
    StaleResponse,
    /// One expression of a batched fetch failed; only its subtree is abandoned
    PartialSubtreeFailure,
}

/// Error returned by debugger client operations.
#[derive(Debug, Error)]
pub enum DebugError {
    /// The operation needs an attached debuggee
    #[error("not attached to a debuggee")]
    NotAttached,
    /// The inspected thread finished or the debuggee has no threads
    #[error("the inspected thread is gone")]
    ThreadGone,
    /// The session rejected or failed the call
    #[error("{op} failed: {message}")]
    Protocol {
        /// Operation that failed
        op: &'static str,
        /// Translated message shown to the user
        message: String,
        /// Underlying session failure
        #[source]
        source: ProtocolError,
    },
    /// Every attach attempt failed
    #[error("{message}")]
    AttachFailed {
        /// Number of attempts made
        attempts: u32,
        /// Message shown to the user
        message: String,
    },
    /// The attach loop noticed an abort request
    #[error("attach aborted")]
    AttachAborted,
    /// The response belongs to an expression that is no longer in the tree
    #[error("stale response for `{expr}`")]
    StaleResponse {
        /// Expression the response was for
        expr: String,
    },
    /// The debuggee could not evaluate one expression of a batch
    #[error("cannot expand `{expr}`: {reason}")]
    SubtreeFailed {
        /// Expression whose subtree was abandoned
        expr: String,
        /// Reason reported by the debuggee
        reason: String,
    },
    /// The variable cannot be assigned to
    #[error("`{expr}` cannot be assigned")]
    ReadOnly {
        /// Expression of the variable
        expr: String,
    },
    /// A name filter is not a valid regular expression
    #[error("invalid name filter: {0}")]
    InvalidFilter(#[from] regex::Error),
}

impl DebugError {
    /// How this failure is handled.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotAttached => ErrorKind::NotAttached,
            Self::ThreadGone
            | Self::Protocol { .. }
            | Self::ReadOnly { .. }
            | Self::InvalidFilter(_) => ErrorKind::TransportOrProtocol,
            Self::AttachFailed { .. } | Self::AttachAborted => ErrorKind::AttachFailure,
            Self::StaleResponse { .. } => ErrorKind::StaleResponse,
            Self::SubtreeFailed { .. } => ErrorKind::PartialSubtreeFailure,
        }
    }

    /// Whether the failure is expected and never shown to the user.
    pub fn is_absorbed(&self) -> bool {
        matches!(self, Self::NotAttached | Self::ThreadGone | Self::StaleResponse { .. })
    }
}

/// User-facing text for a session failure.
///
/// Known failures map to a fixed sentence; anything else falls back to the
/// failure's own description.
pub fn translate(err: &ProtocolError) -> String {
    let text = match err {
        ProtocolError::NotAttached => "Debugger is not attached to a debuggee.",
        ProtocolError::AlreadyAttached => "Debugger is already attached to a debuggee.",
        ProtocolError::ThreadDone => "The selected thread has finished running.",
        ProtocolError::NoThreads => "The debuggee has no threads to inspect.",
        ProtocolError::NotPaused => "The debuggee must be paused to perform this operation.",
        ProtocolError::BadArgument => "The debuggee rejected the request arguments.",
        ProtocolError::NoExceptionFound => "No exception was found to analyze.",
        ProtocolError::AuthenticationFailed => {
            "Authentication failed. Check that both sides use the same password."
        }
        ProtocolError::EncryptionNotSupported => {
            "The debuggee does not support encrypted communication."
        }
        ProtocolError::EncryptionExpected => "The debuggee only accepts encrypted communication.",
        ProtocolError::BadVersion => "The debuggee speaks a different protocol version.",
        ProtocolError::FirewallBlock => {
            "A firewall is blocking the connection to the debuggee."
        }
        ProtocolError::UnknownServer => "No debuggee is listening on the requested server.",
        ProtocolError::Timeout => "The debuggee did not answer in time.",
        ProtocolError::ConnectionFailed(_)
        | ProtocolError::Transport(_)
        | ProtocolError::Other { .. } => return err.to_string(),
    };
    text.to_string()
}
