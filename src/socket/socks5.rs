//! SOCKS5 dialer (RFC 1928, RFC 1929).
//!
//! The handshake runs `MethodSelect → (Auth)? → Connect → Ready`, strictly
//! sequential; any unexpected byte fails the dial and drops the socket.
//! Cancellation and timeouts are layered on from outside: the request engine
//! races the whole dial against its [`crate::cancel::CancelToken`], while the
//! 30-second dead-peer deadline below covers TCP connect up to the proxy's
//! first reply bytes.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::base::error::FetchError;
use crate::proxy::endpoint::ProxyEndpoint;
use crate::socket::dns;
use crate::socket::stream::MaybeTlsStream;
use crate::socket::tls::{wrap_tls, TlsOptions};

const SOCKS_VERSION: u8 = 0x05;
/// RFC 1929 username/password sub-negotiation version.
const AUTH_VERSION: u8 = 0x01;
const METHOD_NO_AUTH: u8 = 0x00;
const METHOD_USERPASS: u8 = 0x02;
const CMD_CONNECT: u8 = 0x01;
const ATYP_IPV4: u8 = 0x01;
const ATYP_DOMAIN: u8 = 0x03;
const ATYP_IPV6: u8 = 0x04;
const AUTH_SUCCEEDED: u8 = 0x00;
const REP_SUCCEEDED: u8 = 0x00;

/// Dead-peer deadline from TCP connect until the proxy's first reply.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);

/// One SOCKS5 tunnel dial: TCP to the proxy, method selection, optional
/// authentication, CONNECT, then an optional TLS upgrade toward the target.
pub(crate) struct Socks5Dialer<'a> {
    pub proxy: &'a ProxyEndpoint,
    pub target_host: &'a str,
    pub target_port: u16,
    /// `Some` promotes the tunnel to TLS with SNI = `target_host`.
    pub tls: Option<&'a TlsOptions>,
    /// Resolve the target locally and send `ATYP 0x01` instead of the
    /// hostname form.
    pub resolve_locally: bool,
}

impl Socks5Dialer<'_> {
    pub(crate) async fn dial(self) -> Result<MaybeTlsStream, FetchError> {
        let mut stream = self.connect_tcp().await?;

        let method = self.select_method(&mut stream).await?;
        if method == METHOD_USERPASS {
            self.authenticate(&mut stream).await?;
        }
        self.connect_target(&mut stream).await?;
        tracing::debug!(
            proxy = %self.proxy,
            target = %self.target_host,
            port = self.target_port,
            "SOCKS5 tunnel established"
        );

        // From here the socket is a transparent byte pipe to the target.
        match self.tls {
            Some(options) => Ok(MaybeTlsStream::Tls(
                wrap_tls(stream, self.target_host, options).await?,
            )),
            None => Ok(MaybeTlsStream::Plain(stream)),
        }
    }

    async fn connect_tcp(&self) -> Result<TcpStream, FetchError> {
        let addrs = dns::resolve_proxy(&self.proxy.host, self.proxy.port).await?;
        crate::socket::connect_any(&addrs, HANDSHAKE_TIMEOUT)
            .await
            .map_err(|source| {
                if source.kind() == io::ErrorKind::TimedOut {
                    FetchError::ProxyTimeout
                } else {
                    FetchError::ProxyUnreachable {
                        host: self.proxy.host.clone(),
                        port: self.proxy.port,
                        source,
                    }
                }
            })
    }

    /// `05 NMETHODS METHODS…`; user/pass is offered only when configured.
    async fn select_method(&self, stream: &mut TcpStream) -> Result<u8, FetchError> {
        let greeting: &[u8] = if self.proxy.has_credentials() {
            &[SOCKS_VERSION, 2, METHOD_NO_AUTH, METHOD_USERPASS]
        } else {
            &[SOCKS_VERSION, 1, METHOD_NO_AUTH]
        };

        // The deadline clears once the proxy's first bytes arrive.
        let exchange = async {
            stream.write_all(greeting).await?;
            let mut reply = [0u8; 2];
            stream.read_exact(&mut reply).await?;
            Ok::<_, io::Error>(reply)
        };
        let reply = match timeout(HANDSHAKE_TIMEOUT, exchange).await {
            Ok(result) => result?,
            Err(_) => return Err(FetchError::ProxyTimeout),
        };

        if reply[0] != SOCKS_VERSION {
            return Err(FetchError::ProxyProtocolViolation(format!(
                "unexpected version {:#04x} in method selection reply",
                reply[0]
            )));
        }
        match reply[1] {
            METHOD_NO_AUTH => Ok(METHOD_NO_AUTH),
            METHOD_USERPASS if self.proxy.has_credentials() => Ok(METHOD_USERPASS),
            _ => Err(FetchError::ProxyAuthRequired),
        }
    }

    /// RFC 1929 sub-negotiation: `01 ULEN USER PLEN PASS`.
    async fn authenticate(&self, stream: &mut TcpStream) -> Result<(), FetchError> {
        let user = self.proxy.user.as_bytes();
        let pass = self.proxy.password.as_bytes();
        if user.len() > 255 || pass.len() > 255 {
            return Err(FetchError::ProxyProtocolViolation(
                "credentials exceed 255 bytes".to_owned(),
            ));
        }

        let mut msg = Vec::with_capacity(3 + user.len() + pass.len());
        msg.push(AUTH_VERSION);
        msg.push(user.len() as u8);
        msg.extend_from_slice(user);
        msg.push(pass.len() as u8);
        msg.extend_from_slice(pass);
        stream.write_all(&msg).await?;

        let mut reply = [0u8; 2];
        stream.read_exact(&mut reply).await?;
        if reply[1] != AUTH_SUCCEEDED {
            return Err(FetchError::ProxyAuthFailed { status: reply[1] });
        }
        Ok(())
    }

    /// `05 01 00 ATYP …`, then drain the bound address from the reply.
    async fn connect_target(&self, stream: &mut TcpStream) -> Result<(), FetchError> {
        if self.target_host.len() > 255 {
            return Err(FetchError::InvalidUrl(format!(
                "target host exceeds 255 bytes: {}",
                self.target_host
            )));
        }

        let mut request = Vec::with_capacity(7 + self.target_host.len());
        request.extend_from_slice(&[SOCKS_VERSION, CMD_CONNECT, 0x00]);
        if self.resolve_locally {
            let ip = dns::resolve_target_ipv4(self.target_host).await?;
            request.push(ATYP_IPV4);
            request.extend_from_slice(&ip.octets());
        } else {
            request.push(ATYP_DOMAIN);
            request.push(self.target_host.len() as u8);
            request.extend_from_slice(self.target_host.as_bytes());
        }
        request.extend_from_slice(&self.target_port.to_be_bytes());
        stream.write_all(&request).await?;

        let mut head = [0u8; 4];
        stream.read_exact(&mut head).await?;
        if head[0] != SOCKS_VERSION {
            return Err(FetchError::ProxyProtocolViolation(format!(
                "unexpected version {:#04x} in connect reply",
                head[0]
            )));
        }
        if head[1] != REP_SUCCEEDED {
            return Err(FetchError::ProxyConnectRejected { code: head[1] });
        }

        // Bound address/port: read for state-machine completeness, never
        // exposed to callers.
        let remaining = match head[3] {
            ATYP_IPV4 => 4 + 2,
            ATYP_IPV6 => 16 + 2,
            ATYP_DOMAIN => {
                let mut len = [0u8; 1];
                stream.read_exact(&mut len).await?;
                len[0] as usize + 2
            }
            other => {
                return Err(FetchError::ProxyProtocolViolation(format!(
                    "unknown address type {other:#04x} in connect reply"
                )))
            }
        };
        let mut bound = vec![0u8; remaining];
        stream.read_exact(&mut bound).await?;
        Ok(())
    }
}
