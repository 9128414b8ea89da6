//! Configuration for bolt connection pools

use std::fmt;

use serde::Deserialize;

/// Default port of the bolt protocol
pub const DEFAULT_PORT: u16 = 7687;

/// Default number of idle connections kept warm for reuse
pub const DEFAULT_MAX_IDLE_CONNECTIONS: usize = 10;

/// Host and port of the server a pool connects to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct ServerAddress {
   pub host: String,
   pub port: u16,
}

impl ServerAddress {
   pub fn new(host: impl Into<String>, port: u16) -> Self {
      Self {
         host: host.into(),
         port,
      }
   }
}

impl Default for ServerAddress {
   fn default() -> Self {
      Self::new("localhost", DEFAULT_PORT)
   }
}

impl fmt::Display for ServerAddress {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      write!(f, "{}:{}", self.host, self.port)
   }
}

/// Credentials presented during the protocol handshake
#[derive(Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum AuthToken {
   /// No authentication
   #[default]
   None,

   /// Username and password authentication
   Basic {
      principal: String,
      credentials: String,
      #[serde(default)]
      realm: Option<String>,
   },
}

impl AuthToken {
   pub fn basic(principal: impl Into<String>, credentials: impl Into<String>) -> Self {
      AuthToken::Basic {
         principal: principal.into(),
         credentials: credentials.into(),
         realm: None,
      }
   }

   /// Name of the authentication scheme as sent on the wire
   pub fn scheme(&self) -> &'static str {
      match self {
         AuthToken::None => "none",
         AuthToken::Basic { .. } => "basic",
      }
   }
}

// Credentials never end up in logs
impl fmt::Debug for AuthToken {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      match self {
         AuthToken::None => f.write_str("None"),
         AuthToken::Basic {
            principal, realm, ..
         } => f
            .debug_struct("Basic")
            .field("principal", principal)
            .field("credentials", &"<redacted>")
            .field("realm", realm)
            .finish(),
      }
   }
}

/// Upper bound on the number of idle connections a pool keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdleCapacity {
   /// Every reusable connection is kept
   Unlimited,

   /// At most this many idle connections are kept; extra ones are closed
   Bounded(usize),
}

impl IdleCapacity {
   /// Whether `idle` connections already fill this capacity
   pub fn is_reached(&self, idle: usize) -> bool {
      match self {
         IdleCapacity::Unlimited => false,
         IdleCapacity::Bounded(max) => idle >= *max,
      }
   }
}

impl Default for IdleCapacity {
   fn default() -> Self {
      IdleCapacity::Bounded(DEFAULT_MAX_IDLE_CONNECTIONS)
   }
}

/// Everything needed to open and initialize a new connection
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
   /// Server to connect to
   pub address: ServerAddress,

   /// Credentials sent during initialization
   pub auth: AuthToken,

   /// Client identification sent during initialization
   ///
   /// Default: `bolt-driver/<crate version>`
   pub user_agent: String,
}

impl Default for ConnectionSettings {
   fn default() -> Self {
      Self {
         address: ServerAddress::default(),
         auth: AuthToken::None,
         user_agent: concat!("bolt-driver/", env!("CARGO_PKG_VERSION")).to_string(),
      }
   }
}

/// Configuration for a [`ConnectionPool`](crate::ConnectionPool)
///
/// Captured at construction and never changed afterwards.
///
/// # Examples
///
/// ```
/// use bolt_conn_pool::{IdleCapacity, PoolSettings};
///
/// // Use defaults
/// let settings = PoolSettings::default();
///
/// // Keep every reusable connection
/// let settings = PoolSettings {
///     max_idle_connections: IdleCapacity::Unlimited,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
   /// How new connections are created
   pub connection: ConnectionSettings,

   /// Maximum number of idle connections kept for reuse
   ///
   /// Default: 10
   pub max_idle_connections: IdleCapacity,
}
