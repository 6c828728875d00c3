//! Connection establishment.
//!
//! - `socks5`: the SOCKS5 dialer (tunnel to the target through the proxy)
//! - [`tls`]: TLS upgrade of an established tunnel
//! - `dns`: proxy and target resolution helpers
//! - `stream`: stream types handed to the request engine

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;

pub(crate) mod dns;
pub(crate) mod socks5;
pub(crate) mod stream;
pub mod tls;

pub use tls::TlsOptions;

/// Try each address in turn under one overall deadline; the last connect
/// error wins, a blown deadline maps to `ErrorKind::TimedOut`.
pub(crate) async fn connect_any(addrs: &[SocketAddr], deadline: Duration) -> io::Result<TcpStream> {
    let attempt = async {
        let mut last: Option<io::Error> = None;
        for addr in addrs {
            match TcpStream::connect(addr).await {
                Ok(stream) => return Ok(stream),
                Err(e) => last = Some(e),
            }
        }
        Err(last.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::AddrNotAvailable, "no usable address")
        }))
    };
    match timeout(deadline, attempt).await {
        Ok(result) => result,
        Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "connect timed out")),
    }
}
