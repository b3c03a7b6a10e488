use std::fmt;
use std::net::{SocketAddr, TcpListener};
#[cfg(unix)]
use std::os::unix::net::UnixListener;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

pub mod factory;

pub use self::factory::{
    ClientTransHandlerFactory, ServerTransHandlerFactory, TransHandler, TransServer,
    TransServerFactory,
};

/// Transport trait for sending and receiving raw bytes
///
/// Each transport instance represents a single connection.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Send bytes over the transport
    async fn send(&mut self, bytes: &[u8]) -> Result<()>;

    /// Receive bytes from the transport
    async fn receive(&mut self) -> Result<Vec<u8>>;

    /// Close the transport connection
    async fn close(&mut self) -> Result<()>;
}

/// Where a server listens or a client dials
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    Tcp(SocketAddr),
    Unix(PathBuf),
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp(addr) => write!(f, "tcp://{addr}"),
            Self::Unix(path) => write!(f, "unix://{}", path.display()),
        }
    }
}

impl From<SocketAddr> for Address {
    fn from(addr: SocketAddr) -> Self {
        Self::Tcp(addr)
    }
}

impl From<PathBuf> for Address {
    fn from(path: PathBuf) -> Self {
        Self::Unix(path)
    }
}

/// A listener bound before the server starts
#[derive(Debug)]
pub enum Listener {
    Tcp(TcpListener),
    #[cfg(unix)]
    Unix(UnixListener),
}

impl Listener {
    /// The address this listener accepts on
    pub fn local_address(&self) -> Result<Address> {
        match self {
            Self::Tcp(listener) => Ok(Address::Tcp(listener.local_addr()?)),
            #[cfg(unix)]
            Self::Unix(listener) => {
                let addr = listener.local_addr()?;
                let path = addr
                    .as_pathname()
                    .ok_or_else(|| Error::config("unix listener is not bound to a path"))?;
                Ok(Address::Unix(path.to_path_buf()))
            }
        }
    }
}

impl From<TcpListener> for Listener {
    fn from(listener: TcpListener) -> Self {
        Self::Tcp(listener)
    }
}

#[cfg(unix)]
impl From<UnixListener> for Listener {
    fn from(listener: UnixListener) -> Self {
        Self::Unix(listener)
    }
}

/// Opens new connections
#[async_trait::async_trait]
pub trait Dialer: Send + Sync {
    async fn dial(&self, address: &Address, timeout: Duration) -> Result<Box<dyn Transport>>;
}

/// Connection pool used by clients
///
/// The pool owns reuse policy; callers hand connections back with `put`
/// or drop them from the pool with `discard`.
#[async_trait::async_trait]
pub trait ConnPool: Send + Sync {
    fn name(&self) -> &str;

    async fn get(
        &self,
        address: &Address,
        dialer: &dyn Dialer,
        connect_timeout: Duration,
    ) -> Result<Box<dyn Transport>>;

    async fn put(&self, conn: Box<dyn Transport>) -> Result<()>;

    async fn discard(&self, conn: Box<dyn Transport>) -> Result<()>;

    async fn close(&self) -> Result<()>;
}
