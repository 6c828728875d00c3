//! TLS upgrade for tunnel streams.

use boring::ssl::{SslConnector, SslMethod, SslVerifyMode};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_boring::SslStream;

use crate::base::error::FetchError;

/// TLS options forwarded to the handshake.
#[derive(Debug, Clone)]
pub struct TlsOptions {
    /// Verify the peer certificate chain and hostname. Disabling this skips
    /// both checks.
    pub verify_peer: bool,
}

impl Default for TlsOptions {
    fn default() -> Self {
        Self { verify_peer: true }
    }
}

impl TlsOptions {
    /// Per RFC 6066, SNI MUST NOT be set for raw IP addresses.
    fn should_set_sni(host: &str) -> bool {
        host.parse::<std::net::IpAddr>().is_err()
    }
}

/// Consume a tunnel stream and yield it TLS-wrapped, with
/// `servername = host` (unbracketed) for SNI and certificate matching.
pub(crate) async fn wrap_tls<S>(
    stream: S,
    host: &str,
    options: &TlsOptions,
) -> Result<SslStream<S>, FetchError>
where
    S: AsyncRead + AsyncWrite + Unpin + std::fmt::Debug,
{
    let mut builder = SslConnector::builder(SslMethod::tls())
        .map_err(|e| FetchError::tls_handshake(host, e))?;
    builder
        .set_alpn_protos(b"\x08http/1.1")
        .map_err(|e| FetchError::tls_handshake(host, e))?;
    if !options.verify_peer {
        builder.set_verify(SslVerifyMode::NONE);
    }

    let connector = builder.build();
    let mut config = connector
        .configure()
        .map_err(|e| FetchError::tls_handshake(host, e))?;
    if !options.verify_peer {
        config.set_verify_hostname(false);
    }
    if !TlsOptions::should_set_sni(host) {
        config.set_use_server_name_indication(false);
    }

    tokio_boring::connect(config, host, stream).await.map_err(|e| {
        tracing::debug!(host = %host, "TLS handshake failed: {e:?}");
        FetchError::tls_handshake(host, format!("{e:?}"))
    })
}
