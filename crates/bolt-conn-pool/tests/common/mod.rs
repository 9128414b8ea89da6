//! In-memory transport shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use bolt_conn_pool::{
   AuthToken, Connection, ConnectionPool, ConnectionSettings, Connector, IdleCapacity,
   PoolSettings, PooledConnection, ServerFailure, TransportError,
};
use parking_lot::Mutex;

pub fn init_tracing() {
   let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Observable state of one mock link
#[derive(Default)]
pub struct Link {
   pub open: AtomicBool,
   pub closes: AtomicUsize,
   pub resets: AtomicUsize,
}

/// Knobs and counters shared by a connector and every connection it opened
#[derive(Default)]
pub struct MockState {
   pub fail_connect: AtomicBool,
   pub fail_init: AtomicBool,
   pub fail_reset: AtomicBool,
   pub fail_close: AtomicBool,
   links: Mutex<Vec<Arc<Link>>>,
}

impl MockState {
   /// Number of connections opened so far
   pub fn created(&self) -> usize {
      self.links.lock().len()
   }

   pub fn link(&self, serial: usize) -> Arc<Link> {
      Arc::clone(&self.links.lock()[serial])
   }

   pub fn close_count(&self, serial: usize) -> usize {
      self.link(serial).closes.load(Ordering::SeqCst)
   }

   pub fn close_counts(&self) -> Vec<usize> {
      self
         .links
         .lock()
         .iter()
         .map(|link| link.closes.load(Ordering::SeqCst))
         .collect()
   }

   /// Simulates the server hanging up on one connection
   pub fn sever(&self, serial: usize) {
      self.link(serial).open.store(false, Ordering::SeqCst);
   }

   pub fn sever_all(&self) {
      for link in self.links.lock().iter() {
         link.open.store(false, Ordering::SeqCst);
      }
   }
}

#[derive(Clone, Default)]
pub struct MockConnector {
   pub state: Arc<MockState>,
}

impl Connector for MockConnector {
   type Connection = MockConnection;

   async fn connect(&self, _settings: &ConnectionSettings) -> Result<MockConnection, TransportError> {
      tokio::task::yield_now().await;

      if self.state.fail_connect.load(Ordering::SeqCst) {
         return Err(std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused").into());
      }

      let link = Arc::new(Link::default());
      link.open.store(true, Ordering::SeqCst);

      let serial = {
         let mut links = self.state.links.lock();
         links.push(Arc::clone(&link));
         links.len() - 1
      };

      Ok(MockConnection {
         serial,
         link,
         state: Arc::clone(&self.state),
      })
   }
}

pub struct MockConnection {
   pub serial: usize,
   link: Arc<Link>,
   state: Arc<MockState>,
}

impl Connection for MockConnection {
   fn is_open(&self) -> bool {
      self.link.open.load(Ordering::SeqCst)
   }

   async fn init(&mut self, _user_agent: &str, _auth: &AuthToken) -> Result<(), TransportError> {
      if self.state.fail_init.load(Ordering::SeqCst) {
         return Err(ServerFailure::new("Neo.ClientError.Security.Unauthorized", "bad credentials").into());
      }
      Ok(())
   }

   async fn reset(&mut self) -> Result<(), TransportError> {
      tokio::task::yield_now().await;
      self.link.resets.fetch_add(1, Ordering::SeqCst);

      if self.state.fail_reset.load(Ordering::SeqCst) {
         return Err(ServerFailure::new("Neo.DatabaseError.General.UnknownError", "reset failed").into());
      }
      Ok(())
   }

   async fn close(&mut self) -> Result<(), TransportError> {
      self.link.closes.fetch_add(1, Ordering::SeqCst);
      self.link.open.store(false, Ordering::SeqCst);

      if self.state.fail_close.load(Ordering::SeqCst) {
         return Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "broken pipe").into());
      }
      Ok(())
   }
}

pub fn new_pool(capacity: IdleCapacity) -> (ConnectionPool<MockConnector>, Arc<MockState>) {
   init_tracing();

   let connector = MockConnector::default();
   let state = Arc::clone(&connector.state);
   let settings = PoolSettings {
      max_idle_connections: capacity,
      ..Default::default()
   };

   (ConnectionPool::new(connector, settings), state)
}

pub async fn serial_of(conn: &PooledConnection<MockConnection>) -> usize {
   conn.lock().await.serial
}

/// Polls `done` until it holds, giving up after a second.
pub async fn eventually(mut done: impl FnMut() -> bool) -> bool {
   tokio::time::timeout(Duration::from_secs(1), async {
      while !done() {
         tokio::time::sleep(Duration::from_millis(5)).await;
      }
   })
   .await
   .is_ok()
}
