use bolt_conn_pool::{
   AuthToken, ConnectionPool, ConnectionSettings, Connector, PoolSettings, PoolStatus,
};
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::session::Session;
use crate::uri::{normalize_uri, server_address};
use crate::Result;

/// Entry point of the driver: one server, one connection pool.
///
/// Sessions borrow a connection from the pool when they start and give it
/// back when they end.
pub struct Driver<K: Connector> {
   uri: Url,
   pool: ConnectionPool<K>,
}

impl<K: Connector> Driver<K> {
   /// Creates a driver for `uri`.
   ///
   /// The URI must use the `bolt` scheme; the default port is filled in when
   /// missing. No connection is opened until the first session starts.
   pub fn new(uri: &str, auth: AuthToken, config: Config, connector: K) -> Result<Self> {
      let uri = normalize_uri(uri)?;
      let address = server_address(&uri)?;

      let span = tracing::info_span!("bolt_driver", address = %address);
      debug!(parent: &span, max_idle_connections = ?config.max_idle_connections, "Creating driver");

      let settings = PoolSettings {
         connection: ConnectionSettings {
            address,
            auth,
            user_agent: config.user_agent,
         },
         max_idle_connections: config.max_idle_connections,
      };

      Ok(Self {
         uri,
         pool: ConnectionPool::with_span(connector, settings, span),
      })
   }

   /// The normalized connection URI
   pub fn uri(&self) -> &Url {
      &self.uri
   }

   /// Starts a session on a pooled connection.
   pub async fn session(&self) -> Result<Session<K::Connection>> {
      let conn = self.pool.acquire().await?;
      Ok(Session::new(conn))
   }

   /// Closes every connection and refuses new sessions.
   pub async fn close(&self) {
      self.pool.close().await;
   }

   pub fn is_closed(&self) -> bool {
      self.pool.is_closed()
   }

   pub fn pool_status(&self) -> PoolStatus {
      self.pool.status()
   }
}
