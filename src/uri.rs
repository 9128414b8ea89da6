//! Connection URI handling

use bolt_conn_pool::{DEFAULT_PORT, ServerAddress};
use url::Url;

use crate::{Error, Result};

/// The only scheme this driver accepts
pub const SCHEME: &str = "bolt";

/// Parses a connection URI and fills in the default port when none is given.
///
/// `bolt://db.example.com` becomes `bolt://db.example.com:7687`; an explicit
/// port is kept as is.
pub fn normalize_uri(uri: &str) -> Result<Url> {
   let invalid = |reason: String| Error::InvalidUri {
      uri: uri.to_string(),
      reason,
   };

   let mut url = Url::parse(uri).map_err(|e| invalid(e.to_string()))?;

   if url.scheme() != SCHEME {
      return Err(Error::UnsupportedScheme(url.scheme().to_string()));
   }

   if url.host_str().is_none_or(str::is_empty) {
      return Err(invalid("missing host".to_string()));
   }

   if url.port().is_none() {
      url
         .set_port(Some(DEFAULT_PORT))
         .map_err(|()| invalid("cannot set default port".to_string()))?;
   }

   Ok(url)
}

/// Server address of a normalized URI
pub fn server_address(url: &Url) -> Result<ServerAddress> {
   let host = url.host_str().ok_or_else(|| Error::InvalidUri {
      uri: url.to_string(),
      reason: "missing host".to_string(),
   })?;

   Ok(ServerAddress::new(host, url.port().unwrap_or(DEFAULT_PORT)))
}
