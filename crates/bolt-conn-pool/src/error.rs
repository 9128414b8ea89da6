//! Error types for bolt-conn-pool

use thiserror::Error;

use crate::config::ServerAddress;
use crate::connection::TransportError;

/// Errors that may escape the connection pool.
///
/// Only failures the caller can act on are surfaced here. Failures that only
/// condemn a single connection (stale idle entries, failed resets, failed
/// closes) are absorbed by the pool and reported through
/// [`ReleaseOutcome`](crate::ReleaseOutcome) and log events instead.
#[derive(Error, Debug)]
pub enum Error {
   /// The pool has been closed and cannot hand out connections
   #[error("Connection pool has been closed")]
   PoolClosed,

   /// A new connection could not be opened or initialized. The partially
   /// created connection has already been closed.
   #[error("Failed to establish connection to {address}: {source}")]
   ConnectionCreation {
      address: ServerAddress,
      #[source]
      source: TransportError,
   },
}

impl Error {
   /// Returns true if this error was caused by the pool being closed
   pub fn is_pool_closed(&self) -> bool {
      matches!(self, Error::PoolClosed)
   }
}

/// A type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
