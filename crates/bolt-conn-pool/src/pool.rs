//! Connection pool for a single server

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::FutureExt;
use parking_lot::Mutex;
use tracing::{Span, debug, trace, warn};

use crate::config::PoolSettings;
use crate::connection::{Connection, Connector, TransportError};
use crate::error::{Error, Result};
use crate::pooled::{ConnectionId, PooledConnection, ReleaseCallback};

/// What happened to a connection handed back with [`ConnectionPool::release`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
   /// Reset and queued for reuse
   Reused,

   /// Closed for the given reason
   Evicted(EvictReason),

   /// Not in use (already released, or the pool is closed); nothing was done
   Ignored,
}

/// Why a released connection was closed instead of reused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictReason {
   /// Not open, unrecoverable, or the reset failed
   NotReusable,

   /// The idle queue was already at capacity
   PoolFull,

   /// The pool was closed while the connection was being released
   PoolClosed,
}

/// Snapshot of pool occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStatus {
   /// Connections waiting in the idle queue
   pub idle: usize,

   /// Connections currently lent out
   pub in_use: usize,
}

type Shared<C> = Arc<PooledConnection<C>>;

/// Pool of connections to one server.
///
/// ## Collections
///
/// - **`available`**: idle connections, reused oldest first
/// - **`in_use`**: connections lent out, keyed by [`ConnectionId`]
///
/// A connection is in at most one of them at any time. Each has its own lock;
/// when both are needed, `available` is taken before `in_use`. No lock is ever
/// held across network I/O.
///
/// ## Closing
///
/// `disposed` only ever goes from false to true. Every insertion re-reads it
/// under the lock of the target collection, so nothing can be added once
/// [`close`](Self::close) has started draining.
///
/// Cloning is cheap and yields a handle to the same pool.
pub struct ConnectionPool<K: Connector> {
   inner: Arc<PoolInner<K>>,
}

struct PoolInner<K: Connector> {
   connector: K,
   settings: PoolSettings,
   available: Mutex<VecDeque<Shared<K::Connection>>>,
   in_use: Mutex<HashMap<ConnectionId, Shared<K::Connection>>>,
   disposed: AtomicBool,
   span: Span,
}

impl<K: Connector> ConnectionPool<K> {
   /// Creates an empty pool. No connection is opened until the first acquire.
   pub fn new(connector: K, settings: PoolSettings) -> Self {
      let span = tracing::info_span!("connection_pool", address = %settings.connection.address);
      Self::with_span(connector, settings, span)
   }

   /// Creates an empty pool that logs under `span`.
   pub fn with_span(connector: K, settings: PoolSettings, span: Span) -> Self {
      Self {
         inner: Arc::new(PoolInner {
            connector,
            settings,
            available: Mutex::new(VecDeque::new()),
            in_use: Mutex::new(HashMap::new()),
            disposed: AtomicBool::new(false),
            span,
         }),
      }
   }

   /// Hands out a connection, reusing an idle one when possible.
   ///
   /// Idle connections that turned stale are closed and skipped. When none is
   /// left a new connection is opened and initialized.
   ///
   /// # Errors
   ///
   /// - [`Error::PoolClosed`] if the pool is closed, including when it was
   ///   closed while this call was opening a connection
   /// - [`Error::ConnectionCreation`] if a new connection could not be opened
   ///
   /// The returned handle is shared with the pool. Once it has been released
   /// the pool may lend the same connection to another caller, so the handle
   /// must not be used for protocol I/O after that.
   pub async fn acquire(&self) -> Result<Arc<PooledConnection<K::Connection>>> {
      self.inner.acquire().await
   }

   /// Takes back a connection previously returned by [`acquire`](Self::acquire).
   ///
   /// Never fails. Unknown ids and calls after [`close`](Self::close) are
   /// ignored; connections that cannot be reused are closed.
   pub async fn release(&self, id: ConnectionId) -> ReleaseOutcome {
      self.inner.release(id).await
   }

   /// Closes the pool and every connection it holds, idle or in use.
   ///
   /// Idempotent. Connections currently used by a caller are closed once the
   /// caller's ongoing protocol operation gives up the transport lock.
   pub async fn close(&self) {
      self.inner.close().await
   }

   pub fn is_closed(&self) -> bool {
      self.inner.is_disposed()
   }

   pub fn status(&self) -> PoolStatus {
      PoolStatus {
         idle: self.inner.available.lock().len(),
         in_use: self.inner.in_use.lock().len(),
      }
   }

   pub fn settings(&self) -> &PoolSettings {
      &self.inner.settings
   }
}

impl<K: Connector> Clone for ConnectionPool<K> {
   fn clone(&self) -> Self {
      Self {
         inner: Arc::clone(&self.inner),
      }
   }
}

impl<K: Connector> fmt::Debug for ConnectionPool<K> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("ConnectionPool")
         .field("address", &self.inner.settings.connection.address)
         .field("status", &self.status())
         .field("closed", &self.is_closed())
         .finish()
   }
}

impl<K: Connector> PoolInner<K> {
   fn is_disposed(&self) -> bool {
      self.disposed.load(Ordering::SeqCst)
   }

   fn is_pool_full(&self, idle: usize) -> bool {
      self.settings.max_idle_connections.is_reached(idle)
   }

   async fn acquire(self: &Arc<Self>) -> Result<Shared<K::Connection>> {
      if self.is_disposed() {
         return Err(Error::PoolClosed);
      }

      let conn = loop {
         let next = self.available.lock().pop_front();
         let Some(conn) = next else {
            break self.create().await?;
         };
         let conn = CloseOnCancel::new(conn, &self.span);

         if conn.get().is_open().await {
            trace!(parent: &self.span, connection_id = %conn.get().id(), "Reusing idle connection");
            break conn;
         }

         debug!(parent: &self.span, connection_id = %conn.get().id(), "Discarding stale idle connection");
         self.close_quietly(conn.get()).await;
         conn.disarm();
      };

      {
         let mut in_use = self.in_use.lock();
         if !self.is_disposed() {
            let conn = conn.disarm();
            in_use.insert(conn.id(), Arc::clone(&conn));
            return Ok(conn);
         }
      }

      debug!(parent: &self.span, connection_id = %conn.get().id(), "Pool closed during acquire, closing connection");
      self.close_quietly(conn.get()).await;
      conn.disarm();
      Err(Error::PoolClosed)
   }

   async fn create(self: &Arc<Self>) -> Result<CloseOnCancel<K::Connection>> {
      let settings = &self.settings.connection;

      let raw = self
         .connector
         .connect(settings)
         .await
         .map_err(|source| self.creation_error(source))?;

      let conn = Arc::new(PooledConnection::new(raw, self.release_callback()));
      let conn = CloseOnCancel::new(conn, &self.span);

      if let Err(source) = conn.get().init(&settings.user_agent, &settings.auth).await {
         self.close_quietly(conn.get()).await;
         conn.disarm();
         return Err(self.creation_error(source));
      }

      debug!(parent: &self.span, connection_id = %conn.get().id(), "Opened new connection");
      Ok(conn)
   }

   fn creation_error(&self, source: TransportError) -> Error {
      debug!(parent: &self.span, error = %source, "Failed to open connection");
      Error::ConnectionCreation {
         address: self.settings.connection.address.clone(),
         source,
      }
   }

   /// Builds the callback a [`PooledConnection`] uses to come back here.
   ///
   /// Holds the pool weakly; a connection outliving its pool releases into
   /// nothing.
   fn release_callback(self: &Arc<Self>) -> ReleaseCallback {
      let pool = Arc::downgrade(self);
      Arc::new(move |id: ConnectionId| {
         let pool = pool.clone();
         async move {
            match pool.upgrade() {
               Some(pool) => pool.release(id).await,
               None => ReleaseOutcome::Ignored,
            }
         }
         .boxed()
      })
   }

   async fn release(&self, id: ConnectionId) -> ReleaseOutcome {
      if self.is_disposed() {
         return ReleaseOutcome::Ignored;
      }

      let removed = self.in_use.lock().remove(&id);
      let Some(conn) = removed else {
         trace!(parent: &self.span, connection_id = %id, "Ignoring release of connection not in use");
         return ReleaseOutcome::Ignored;
      };
      let conn = CloseOnCancel::new(conn, &self.span);

      let reusable = self.is_reusable(conn.get()).await;

      let reason = {
         let mut available = self.available.lock();
         if !reusable {
            EvictReason::NotReusable
         } else if self.is_disposed() {
            EvictReason::PoolClosed
         } else if self.is_pool_full(available.len()) {
            EvictReason::PoolFull
         } else {
            available.push_back(conn.disarm());
            trace!(parent: &self.span, connection_id = %id, idle = available.len(), "Connection returned to idle queue");
            return ReleaseOutcome::Reused;
         }
      };

      debug!(parent: &self.span, connection_id = %id, reason = ?reason, "Closing released connection");
      self.close_quietly(conn.get()).await;
      conn.disarm();
      ReleaseOutcome::Evicted(reason)
   }

   /// Open, resettable, and still open after the reset.
   async fn is_reusable(&self, conn: &PooledConnection<K::Connection>) -> bool {
      if !conn.is_open().await {
         return false;
      }

      match conn.clear().await {
         Ok(()) => conn.is_open().await,
         Err(e) => {
            debug!(parent: &self.span, connection_id = %conn.id(), error = %e, "Connection reset failed");
            false
         }
      }
   }

   async fn close(&self) {
      if self.disposed.swap(true, Ordering::SeqCst) {
         return;
      }

      // Take both collections before the first await so an abandoned close
      // leaves nothing behind in them
      let in_use: Vec<_> = self
         .in_use
         .lock()
         .drain()
         .map(|(_, conn)| CloseOnCancel::new(conn, &self.span))
         .collect();
      let idle: Vec<_> = self
         .available
         .lock()
         .drain(..)
         .map(|conn| CloseOnCancel::new(conn, &self.span))
         .collect();
      debug!(parent: &self.span, in_use = in_use.len(), idle = idle.len(), "Closing connection pool");

      for conn in in_use.into_iter().chain(idle) {
         self.close_quietly(conn.get()).await;
         conn.disarm();
      }
   }

   async fn close_quietly(&self, conn: &PooledConnection<K::Connection>) {
      if let Err(e) = conn.close().await {
         warn!(parent: &self.span, connection_id = %conn.id(), error = %e, "Failed to close connection");
      }
   }
}

/// A connection that is in neither collection while an operation works on it.
///
/// If the operation is dropped before calling [`disarm`](Self::disarm), the
/// connection is closed on the current tokio runtime instead of being lost.
struct CloseOnCancel<C: Connection> {
   conn: Shared<C>,
   span: Span,
   armed: bool,
}

impl<C: Connection> CloseOnCancel<C> {
   fn new(conn: Shared<C>, span: &Span) -> Self {
      Self {
         conn,
         span: span.clone(),
         armed: true,
      }
   }

   fn get(&self) -> &Shared<C> {
      &self.conn
   }

   /// The operation has placed or closed the connection itself.
   fn disarm(mut self) -> Shared<C> {
      self.armed = false;
      Arc::clone(&self.conn)
   }
}

impl<C: Connection> Drop for CloseOnCancel<C> {
   fn drop(&mut self) {
      if !self.armed {
         return;
      }

      let conn = Arc::clone(&self.conn);
      let span = self.span.clone();

      if let Ok(handle) = tokio::runtime::Handle::try_current() {
         debug!(parent: &span, connection_id = %conn.id(), "Operation abandoned, closing its connection");
         handle.spawn(async move {
            if let Err(e) = conn.close().await {
               warn!(parent: &span, connection_id = %conn.id(), error = %e, "Failed to close connection");
            }
         });
      } else {
         warn!(
            parent: &span,
            connection_id = %conn.id(),
            "Operation abandoned outside a tokio runtime; connection dropped without closing"
         );
      }
   }
}
