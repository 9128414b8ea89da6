//! Driver configuration

use bolt_conn_pool::IdleCapacity;
use serde::Deserialize;

/// Configuration for a [`Driver`](crate::Driver)
///
/// # Examples
///
/// ```
/// use bolt_driver::{Config, IdleCapacity};
///
/// // Use defaults
/// let config = Config::default();
///
/// // Keep at most two idle connections
/// let config = Config {
///     max_idle_connections: IdleCapacity::Bounded(2),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
   /// Maximum number of idle connections kept for reuse
   ///
   /// Connections released while this many are already idle are closed.
   ///
   /// Default: 10
   pub max_idle_connections: IdleCapacity,

   /// Client identification sent to the server when a connection is initialized
   ///
   /// Default: `bolt-driver/<version>`
   pub user_agent: String,
}

impl Default for Config {
   fn default() -> Self {
      Self {
         max_idle_connections: IdleCapacity::default(),
         user_agent: concat!("bolt-driver/", env!("CARGO_PKG_VERSION")).to_string(),
      }
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_defaults() {
      let config = Config::default();
      assert_eq!(config.max_idle_connections, IdleCapacity::Bounded(10));
      assert_eq!(config.user_agent, format!("bolt-driver/{}", env!("CARGO_PKG_VERSION")));
   }

   #[test]
   fn test_deserialize_overrides_single_field() {
      let config: Config =
         serde_json::from_str(r#"{ "max_idle_connections": "unlimited" }"#).unwrap();
      assert_eq!(config.max_idle_connections, IdleCapacity::Unlimited);
      assert!(config.user_agent.starts_with("bolt-driver/"));
   }
}
