//! Sessions: a caller's hold on one pooled connection

use std::fmt;
use std::sync::Arc;

use bolt_conn_pool::{Connection, ConnectionId, PooledConnection};
use tracing::{debug, warn};

use crate::{Error, Result};

/// A unit of work bound to one pooled connection.
///
/// The connection is acquired when the session is created and released when
/// the session is closed. Dropping an open session releases the connection on
/// the current tokio runtime.
#[must_use = "if unused, the connection is immediately returned to the pool"]
pub struct Session<C: Connection> {
   connection: Option<Arc<PooledConnection<C>>>,
}

impl<C: Connection> Session<C> {
   pub(crate) fn new(connection: Arc<PooledConnection<C>>) -> Self {
      debug!(connection_id = %connection.id(), "Session started");
      Self {
         connection: Some(connection),
      }
   }

   /// The connection this session runs on.
   ///
   /// The borrow ties every use of the connection to the session, so it cannot
   /// outlive [`close`](Self::close) and reach a connection that has since
   /// been handed to another session.
   ///
   /// # Errors
   ///
   /// [`Error::SessionClosed`] once the session has been closed.
   pub fn connection(&self) -> Result<&PooledConnection<C>> {
      self.connection.as_deref().ok_or(Error::SessionClosed)
   }

   pub fn connection_id(&self) -> Option<ConnectionId> {
      self.connection.as_ref().map(|conn| conn.id())
   }

   pub fn is_open(&self) -> bool {
      self.connection.is_some()
   }

   /// Returns the connection to the pool. Later calls do nothing.
   pub async fn close(&mut self) {
      if let Some(conn) = self.connection.take() {
         let outcome = conn.release().await;
         debug!(connection_id = %conn.id(), outcome = ?outcome, "Session closed");
      }
   }
}

impl<C: Connection> Drop for Session<C> {
   fn drop(&mut self) {
      let Some(conn) = self.connection.take() else {
         return;
      };

      // Release needs to reset the connection, which is async
      if let Ok(handle) = tokio::runtime::Handle::try_current() {
         handle.spawn(async move {
            let outcome = conn.release().await;
            debug!(connection_id = %conn.id(), outcome = ?outcome, "Dropped session released");
         });
      } else {
         warn!(
            connection_id = %conn.id(),
            "Session dropped outside a tokio runtime; connection stays in use until the driver is closed"
         );
      }
   }
}

impl<C: Connection> fmt::Debug for Session<C> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("Session")
         .field("connection_id", &self.connection_id())
         .finish()
   }
}
