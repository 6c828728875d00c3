//! DNS helpers.
//!
//! Two lookups exist in the pipeline: resolving the proxy's own address
//! before the TCP connect, and (only when local resolution is requested)
//! resolving the target to an IPv4 address for the SOCKS5 `ATYP 0x01` form.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::base::error::FetchError;

/// Resolve the proxy endpoint to socket addresses.
///
/// A resolution failure here gets its own error so callers can tell "the
/// proxy hostname is wrong" apart from generic connection failures.
pub(crate) async fn resolve_proxy(host: &str, port: u16) -> Result<Vec<SocketAddr>, FetchError> {
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| {
            tracing::debug!(host = %host, error = %e, "proxy DNS resolution failed");
            FetchError::ProxyHostNotFound {
                host: host.to_owned(),
            }
        })?
        .collect();
    if addrs.is_empty() {
        return Err(FetchError::ProxyHostNotFound {
            host: host.to_owned(),
        });
    }
    Ok(addrs)
}

/// Resolve the target host to one IPv4 address.
pub(crate) async fn resolve_target_ipv4(host: &str) -> Result<Ipv4Addr, FetchError> {
    // An IPv4 literal needs no lookup.
    if let Ok(ip) = host.parse::<Ipv4Addr>() {
        return Ok(ip);
    }
    let not_found = || FetchError::DnsFailed {
        host: host.to_owned(),
    };
    let addrs = tokio::net::lookup_host((host, 0))
        .await
        .map_err(|_| not_found())?;
    for addr in addrs {
        if let IpAddr::V4(ip) = addr.ip() {
            return Ok(ip);
        }
    }
    Err(not_found())
}
