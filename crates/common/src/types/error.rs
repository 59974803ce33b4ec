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

//! Failures raised by a debugging session.
//!
//! Every failure carries a stable numeric code so that transports can move it across
//! the wire; see [`error_codes`].

use thiserror::Error;

/// Error codes for session failures.
///
/// They live next to the JSON-RPC 2.0 reserved range, starting from -34000.
pub mod error_codes {
    /// The session is not attached to any debuggee
    pub const NOT_ATTACHED: i32 = -34001;
    /// The session is already attached
    pub const ALREADY_ATTACHED: i32 = -34002;
    /// The selected thread has finished
    pub const THREAD_DONE: i32 = -34003;
    /// The debuggee has no threads left
    pub const NO_THREADS: i32 = -34004;
    /// The request needs a paused debuggee
    pub const NOT_PAUSED: i32 = -34005;
    /// A request argument was rejected
    pub const BAD_ARGUMENT: i32 = -34006;
    /// No exception is available for analysis
    pub const NO_EXCEPTION_FOUND: i32 = -34007;
    /// Password or authentication check failed
    pub const AUTHENTICATION_FAILED: i32 = -34008;
    /// The debuggee cannot encrypt the channel
    pub const ENCRYPTION_NOT_SUPPORTED: i32 = -34009;
    /// The debuggee requires an encrypted channel
    pub const ENCRYPTION_EXPECTED: i32 = -34010;
    /// Client and debuggee speak different protocol versions
    pub const BAD_VERSION: i32 = -34011;
    /// A firewall blocked the connection
    pub const FIREWALL_BLOCK: i32 = -34012;
    /// No debuggee matched the requested server
    pub const UNKNOWN_SERVER: i32 = -34013;
    /// The debuggee did not answer in time
    pub const TIMEOUT: i32 = -34014;
    /// The connection to the debuggee could not be made
    pub const CONNECTION_FAILED: i32 = -34015;
}

/// A failure reported by the debugging session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// No debuggee is attached to the session
    #[error("not attached to a debuggee")]
    NotAttached,
    /// The session is already attached to a debuggee
    #[error("already attached to a debuggee")]
    AlreadyAttached,
    /// The thread being inspected has finished
    #[error("the selected thread is done")]
    ThreadDone,
    /// The debuggee has no threads to inspect
    #[error("the debuggee has no threads")]
    NoThreads,
    /// The request needs a paused debuggee
    #[error("the debuggee is not paused")]
    NotPaused,
    /// The debuggee rejected an argument
    #[error("bad argument")]
    BadArgument,
    /// There is no exception to analyze
    #[error("no exception found")]
    NoExceptionFound,
    /// The password was rejected
    #[error("authentication failed")]
    AuthenticationFailed,
    /// The debuggee cannot encrypt the channel
    #[error("encryption is not supported by the debuggee")]
    EncryptionNotSupported,
    /// The debuggee only accepts encrypted channels
    #[error("the debuggee expects an encrypted channel")]
    EncryptionExpected,
    /// Protocol version mismatch
    #[error("protocol version mismatch")]
    BadVersion,
    /// The connection was blocked by a firewall
    #[error("connection blocked by a firewall")]
    FirewallBlock,
    /// No debuggee answered for the requested server
    #[error("unknown server")]
    UnknownServer,
    /// The debuggee did not answer in time
    #[error("request timed out")]
    Timeout,
    /// The connection could not be established
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    /// The transport failed underneath the session
    #[error("transport error: {0}")]
    Transport(String),
    /// Any other failure, identified by its code
    #[error("{message} (code {code})")]
    Other {
        /// Numeric error code
        code: i32,
        /// Message reported by the debuggee
        message: String,
    },
}

impl ProtocolError {
    /// Numeric code used on the wire for this failure.
    pub fn code(&self) -> i32 {
        use error_codes::*;
        match self {
            Self::NotAttached => NOT_ATTACHED,
            Self::AlreadyAttached => ALREADY_ATTACHED,
            Self::ThreadDone => THREAD_DONE,
            Self::NoThreads => NO_THREADS,
            Self::NotPaused => NOT_PAUSED,
            Self::BadArgument => BAD_ARGUMENT,
            Self::NoExceptionFound => NO_EXCEPTION_FOUND,
            Self::AuthenticationFailed => AUTHENTICATION_FAILED,
            Self::EncryptionNotSupported => ENCRYPTION_NOT_SUPPORTED,
            Self::EncryptionExpected => ENCRYPTION_EXPECTED,
            Self::BadVersion => BAD_VERSION,
            Self::FirewallBlock => FIREWALL_BLOCK,
            Self::UnknownServer => UNKNOWN_SERVER,
            Self::Timeout => TIMEOUT,
            Self::ConnectionFailed(_) => CONNECTION_FAILED,
            Self::Transport(_) | Self::Other { .. } => -32603,
        }
    }

    /// Rebuild a failure from its wire code and message.
    pub fn from_code(code: i32, message: &str) -> Self {
        use error_codes::*;
        match code {
            NOT_ATTACHED => Self::NotAttached,
            ALREADY_ATTACHED => Self::AlreadyAttached,
            THREAD_DONE => Self::ThreadDone,
            NO_THREADS => Self::NoThreads,
            NOT_PAUSED => Self::NotPaused,
            BAD_ARGUMENT => Self::BadArgument,
            NO_EXCEPTION_FOUND => Self::NoExceptionFound,
            AUTHENTICATION_FAILED => Self::AuthenticationFailed,
            ENCRYPTION_NOT_SUPPORTED => Self::EncryptionNotSupported,
            ENCRYPTION_EXPECTED => Self::EncryptionExpected,
            BAD_VERSION => Self::BadVersion,
            FIREWALL_BLOCK => Self::FirewallBlock,
            UNKNOWN_SERVER => Self::UnknownServer,
            TIMEOUT => Self::Timeout,
            CONNECTION_FAILED => Self::ConnectionFailed(message.to_string()),
            _ => Self::Other { code, message: message.to_string() },
        }
    }

    /// Whether the thread being inspected is gone (finished or never existed).
    pub fn is_thread_gone(&self) -> bool {
        matches!(self, Self::ThreadDone | Self::NoThreads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_round_trip_for_known_failures() {
        for err in [
            ProtocolError::NotAttached,
            ProtocolError::ThreadDone,
            ProtocolError::NoThreads,
            ProtocolError::AuthenticationFailed,
            ProtocolError::Timeout,
        ] {
            assert_eq!(ProtocolError::from_code(err.code(), ""), err);
        }
    }

    #[test]
    fn test_unknown_code_keeps_message() {
        let err = ProtocolError::from_code(-1, "boom");
        assert_eq!(err, ProtocolError::Other { code: -1, message: "boom".to_string() });
        assert_eq!(err.to_string(), "boom (code -1)");
    }

    #[test]
    fn test_thread_gone() {
        assert!(ProtocolError::ThreadDone.is_thread_gone());
        assert!(ProtocolError::NoThreads.is_thread_gone());
        assert!(!ProtocolError::NotAttached.is_thread_gone());
    }
}
