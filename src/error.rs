/// Result type alias for driver operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for driver and session operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// Error from the connection pool.
   #[error(transparent)]
   Pool(#[from] bolt_conn_pool::Error),

   /// The connection URI could not be parsed.
   #[error("invalid connection uri '{uri}': {reason}")]
   InvalidUri { uri: String, reason: String },

   /// The connection URI uses a scheme this driver does not speak.
   #[error("unsupported uri scheme '{0}', expected 'bolt'")]
   UnsupportedScheme(String),

   /// The session has already been closed.
   #[error("session has already been closed")]
   SessionClosed,
}

impl Error {
   /// Extract a structured error code from the error type.
   ///
   /// This provides machine-readable error codes for error handling.
   pub fn error_code(&self) -> String {
      match self {
         Error::Pool(bolt_conn_pool::Error::PoolClosed) => "POOL_CLOSED".to_string(),
         Error::Pool(bolt_conn_pool::Error::ConnectionCreation { .. }) => {
            "CONNECTION_FAILED".to_string()
         }
         Error::InvalidUri { .. } => "INVALID_URI".to_string(),
         Error::UnsupportedScheme(_) => "UNSUPPORTED_SCHEME".to_string(),
         Error::SessionClosed => "SESSION_CLOSED".to_string(),
      }
   }
}
