//! Contract between the pool and the transport/protocol layer
//!
//! The pool never speaks the wire protocol itself. A [`Connector`] opens
//! physical links and hands back [`Connection`]s; the pool only needs to know
//! whether a link is alive, how to initialize it, how to return it to a clean
//! state, and how to close it.

use std::fmt;
use std::future::Future;

use thiserror::Error;

use crate::config::{AuthToken, ConnectionSettings};

/// A single physical link to the server.
///
/// Implementations own the socket and the protocol state machine. All methods
/// take `&mut self`; the pool guarantees exclusive access.
pub trait Connection: Send + 'static {
   /// Current liveness of the underlying transport
   fn is_open(&self) -> bool;

   /// Performs the protocol handshake.
   ///
   /// On failure the pool closes the connection before the error propagates.
   fn init(
      &mut self,
      user_agent: &str,
      auth: &AuthToken,
   ) -> impl Future<Output = Result<(), TransportError>> + Send;

   /// Discards pending results and transaction state so the connection is
   /// indistinguishable from a freshly initialized one.
   fn reset(&mut self) -> impl Future<Output = Result<(), TransportError>> + Send;

   /// Releases the transport resources.
   ///
   /// Called at most once per connection by the pool. Failures are logged and
   /// absorbed by the caller.
   fn close(&mut self) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// Opens new [`Connection`]s for a pool.
pub trait Connector: Send + Sync + 'static {
   type Connection: Connection;

   /// Opens a transport-level link to `settings.address`.
   ///
   /// The returned connection is not yet initialized.
   fn connect(
      &self,
      settings: &ConnectionSettings,
   ) -> impl Future<Output = Result<Self::Connection, TransportError>> + Send;
}

/// Errors reported by the transport or protocol layer
#[derive(Error, Debug)]
pub enum TransportError {
   /// Socket level failure
   #[error("IO error: {0}")]
   Io(#[from] std::io::Error),

   /// The server answered with a failure message
   #[error("Server failure: {0}")]
   Server(ServerFailure),

   /// The peer sent something the protocol state machine cannot handle
   #[error("Protocol violation: {0}")]
   Protocol(String),
}

impl TransportError {
   /// Whether a connection that observed this error can never be reused.
   ///
   /// Socket failures and protocol violations leave the stream in an unknown
   /// state. Server failures depend on their classification.
   pub fn is_unrecoverable(&self) -> bool {
      match self {
         TransportError::Io(_) | TransportError::Protocol(_) => true,
         TransportError::Server(failure) => failure.classification().is_unrecoverable(),
      }
   }
}

impl From<ServerFailure> for TransportError {
   fn from(failure: ServerFailure) -> Self {
      TransportError::Server(failure)
   }
}

/// Failure message sent by the server.
///
/// Status codes follow `<namespace>.<classification>.<category>.<title>`,
/// e.g. `Neo.ClientError.Statement.SyntaxError`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerFailure {
   pub code: String,
   pub message: String,
}

impl ServerFailure {
   pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
      Self {
         code: code.into(),
         message: message.into(),
      }
   }

   pub fn classification(&self) -> FailureClassification {
      match self.code.split('.').nth(1) {
         Some("ClientError") => FailureClassification::ClientError,
         Some("TransientError") => FailureClassification::TransientError,
         Some("DatabaseError") => FailureClassification::DatabaseError,
         _ => FailureClassification::Unknown,
      }
   }
}

impl fmt::Display for ServerFailure {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      write!(f, "{} ({})", self.message, self.code)
   }
}

/// Classification segment of a server status code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClassification {
   /// The request was wrong; the connection is fine
   ClientError,
   /// Temporary condition; the connection is fine
   TransientError,
   /// The server failed internally
   DatabaseError,
   /// Code without a recognized classification
   Unknown,
}

impl FailureClassification {
   pub fn is_unrecoverable(&self) -> bool {
      matches!(
         self,
         FailureClassification::DatabaseError | FailureClassification::Unknown
      )
   }
}
