//! Pool-side wrapper around a transport connection

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::BoxFuture;
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::config::AuthToken;
use crate::connection::{Connection, TransportError};
use crate::pool::ReleaseOutcome;

/// Identity of a pooled connection, stable for its whole lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
   pub(crate) fn new() -> Self {
      Self(Uuid::new_v4())
   }
}

impl fmt::Display for ConnectionId {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      self.0.fmt(f)
   }
}

/// Hands a connection back to the pool that created it
pub(crate) type ReleaseCallback =
   Arc<dyn Fn(ConnectionId) -> BoxFuture<'static, ReleaseOutcome> + Send + Sync>;

/// A [`Connection`] owned by a pool.
///
/// Shared between the pool's in-use map and the caller that acquired it. The
/// transport itself sits behind an async mutex so protocol I/O always has
/// exclusive access, including while the pool closes it during shutdown.
///
/// Holding an `Arc` to it past [`release`](Self::release) keeps the value
/// alive but not the lease: the pool may already have lent it to someone else.
///
/// ## State
///
/// - **`unrecoverable`**: set once a fatal protocol error was observed; never cleared
/// - **`closed`**: set once a [`close`](Self::close) has completed; later calls are no-ops
pub struct PooledConnection<C> {
   id: ConnectionId,
   conn: Mutex<C>,
   unrecoverable: AtomicBool,
   closed: AtomicBool,
   release: ReleaseCallback,
}

impl<C: Connection> PooledConnection<C> {
   pub(crate) fn new(conn: C, release: ReleaseCallback) -> Self {
      Self {
         id: ConnectionId::new(),
         conn: Mutex::new(conn),
         unrecoverable: AtomicBool::new(false),
         closed: AtomicBool::new(false),
         release,
      }
   }

   pub fn id(&self) -> ConnectionId {
      self.id
   }

   /// Exclusive access to the transport for protocol I/O.
   ///
   /// Errors observed while using the guard should be passed to
   /// [`record_error`](Self::record_error) (or [`check`](Self::check)) so the
   /// pool can tell whether the connection may be reused.
   pub async fn lock(&self) -> MutexGuard<'_, C> {
      self.conn.lock().await
   }

   /// Whether the connection can still be used.
   ///
   /// A connection that observed an unrecoverable error reports closed even
   /// when its transport is still up.
   pub async fn is_open(&self) -> bool {
      if self.closed.load(Ordering::SeqCst) || self.has_unrecoverable_error() {
         return false;
      }
      self.conn.lock().await.is_open()
   }

   pub fn has_unrecoverable_error(&self) -> bool {
      self.unrecoverable.load(Ordering::SeqCst)
   }

   pub fn mark_unrecoverable(&self) {
      self.unrecoverable.store(true, Ordering::SeqCst);
   }

   /// Records an error observed on this connection.
   pub fn record_error(&self, err: &TransportError) {
      if err.is_unrecoverable() {
         self.mark_unrecoverable();
      }
   }

   /// Records the error of `result`, if any, and passes it through unchanged.
   pub fn check<T>(&self, result: Result<T, TransportError>) -> Result<T, TransportError> {
      if let Err(ref e) = result {
         self.record_error(e);
      }
      result
   }

   pub(crate) async fn init(
      &self,
      user_agent: &str,
      auth: &AuthToken,
   ) -> Result<(), TransportError> {
      let result = self.conn.lock().await.init(user_agent, auth).await;
      self.check(result)
   }

   /// Resets protocol session state so the next user sees a fresh connection.
   pub async fn clear(&self) -> Result<(), TransportError> {
      let result = self.conn.lock().await.reset().await;
      self.check(result)
   }

   /// Closes the transport. Once a call has completed, later calls do nothing.
   ///
   /// The `closed` flag is only written while the transport lock is held, so
   /// a call abandoned while waiting for the lock leaves the transport open
   /// for the next one.
   pub async fn close(&self) -> Result<(), TransportError> {
      let mut conn = self.conn.lock().await;
      if self.closed.load(Ordering::SeqCst) {
         return Ok(());
      }
      let result = conn.close().await;
      self.closed.store(true, Ordering::SeqCst);
      result
   }

   /// Returns this connection to its pool.
   ///
   /// Yields [`ReleaseOutcome::Ignored`] if the connection was already
   /// released or its pool is gone.
   pub async fn release(&self) -> ReleaseOutcome {
      (self.release)(self.id).await
   }
}

impl<C> fmt::Debug for PooledConnection<C> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("PooledConnection")
         .field("id", &self.id)
         .field("unrecoverable", &self.unrecoverable.load(Ordering::SeqCst))
         .field("closed", &self.closed.load(Ordering::SeqCst))
         .finish_non_exhaustive()
   }
}
