//! # bolt-driver
//!
//! Driver core for servers speaking the bolt protocol.
//!
//! A [`Driver`] owns one connection pool for one server and hands out
//! [`Session`]s. Each session holds one pooled connection from start to close.
//! The wire protocol itself is supplied by the caller through the
//! [`Connector`] and [`Connection`] traits.
//!
//! # Example
//!
//! ```ignore
//! use bolt_driver::{AuthToken, Config, Driver};
//!
//! let driver = Driver::new("bolt://localhost", AuthToken::basic("neo4j", "secret"), Config::default(), connector)?;
//!
//! let mut session = driver.session().await?;
//! let mut conn = session.connection()?.lock().await;
//! // Speak the protocol on `conn`...
//! drop(conn);
//! session.close().await;
//!
//! driver.close().await;
//! ```

mod config;
mod driver;
mod error;
mod session;
mod uri;

pub use bolt_conn_pool::{
   AuthToken, Connection, ConnectionId, ConnectionSettings, Connector, DEFAULT_PORT, IdleCapacity,
   PoolStatus, PooledConnection, ReleaseOutcome, ServerAddress, ServerFailure, TransportError,
};
pub use config::Config;
pub use driver::Driver;
pub use error::{Error, Result};
pub use session::Session;
pub use uri::{SCHEME, normalize_uri};
