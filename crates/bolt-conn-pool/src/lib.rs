//! # bolt-conn-pool
//!
//! Connection pool for stateful bolt protocol connections to a single server.
//!
//! ## Core Types
//!
//! - **[`ConnectionPool`]**: Hands out connections, takes them back, and closes them all on shutdown
//! - **[`PooledConnection`]**: A transport connection with a pool identity and unrecoverable-error tracking
//! - **[`Connection`]** / **[`Connector`]**: What the pool needs from the transport layer
//! - **[`PoolSettings`]**: Connection settings and idle capacity
//! - **[`Error`]**: Errors that escape the pool
//!
//! ## Architecture
//!
//! - **Idle queue**: Released connections are reset and reused oldest first, up to the idle capacity
//! - **In-use map**: Lent out connections keyed by identity, so release and shutdown can find them
//! - **No creation cap**: Acquire never waits; it reuses, creates, or fails fast on a closed pool
//! - **Safe shutdown**: Once closing starts, nothing is added to either collection again

mod config;
mod connection;
mod error;
mod pool;
mod pooled;

// Re-export public types
pub use config::{
   AuthToken, ConnectionSettings, DEFAULT_MAX_IDLE_CONNECTIONS, DEFAULT_PORT, IdleCapacity,
   PoolSettings, ServerAddress,
};
pub use connection::{Connection, Connector, FailureClassification, ServerFailure, TransportError};
pub use error::{Error, Result};
pub use pool::{ConnectionPool, EvictReason, PoolStatus, ReleaseOutcome};
pub use pooled::{ConnectionId, PooledConnection};
