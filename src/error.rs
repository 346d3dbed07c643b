//! Service error type.

use std::fmt;
use std::net::SocketAddr;

/// The error type returned by [`Service`](crate::Service).
///
/// Application-level failures (404, 401, etc.) are HTTP
/// [`Response`](crate::Response) values, not `Error`s. This type surfaces
/// listener failures: binding the port or reading the bound address.
/// Nothing here is retried; the caller decides whether it is fatal.
#[derive(Debug)]
pub enum Error {
    Bind { addr: SocketAddr, source: std::io::Error },
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bind { addr, source } => write!(f, "bind {addr}: {source}"),
            Self::Io(e) => write!(f, "io: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Bind { source, .. } => Some(source),
            Self::Io(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
