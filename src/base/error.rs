use std::io;
use thiserror::Error;

/// Configuration errors produced by the proxy-URL normalizer and parser.
///
/// These never cross the front door: an invalid proxy configuration is
/// logged and downgraded to the native path instead of failing the request.
/// They do surface from the library entry points [`crate::convert`] and
/// [`crate::parse_proxy_url`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProxyUrlError {
    #[error("empty proxy string")]
    Empty,
    #[error("unsupported proxy scheme {0:?}")]
    UnsupportedScheme(String),
    #[error("missing port")]
    MissingPort,
    #[error("invalid port {0:?}")]
    InvalidPort(String),
    #[error("unrecognized proxy format {0:?}")]
    Malformed(String),
    #[error("username must be set when a password is set")]
    MissingUsername,
    #[error("unterminated IPv6 bracket")]
    UnterminatedBracket,
}

/// Error type for everything surfaced by [`crate::fetch`] and
/// [`crate::RequestBuilder::send`].
///
/// Variants follow the failure domains of the request pipeline: proxy
/// configuration, the SOCKS5 tunnel, TLS, HTTP framing, content decoding,
/// the redirect driver, and cancellation.
#[derive(Debug, Error)]
pub enum FetchError {
    // Configuration
    #[error("invalid proxy URL: {0}")]
    InvalidProxy(#[from] ProxyUrlError),
    #[error("invalid URL {0:?}")]
    InvalidUrl(String),

    // Proxy transport
    #[error("proxy host not found: {host}")]
    ProxyHostNotFound { host: String },
    #[error("failed to connect to proxy {host}:{port}")]
    ProxyUnreachable {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },
    #[error("proxy handshake timed out")]
    ProxyTimeout,
    #[error("proxy protocol violation: {0}")]
    ProxyProtocolViolation(String),
    #[error("proxy offered no acceptable authentication method")]
    ProxyAuthRequired,
    #[error("proxy authentication failed (status {status:#04x})")]
    ProxyAuthFailed { status: u8 },
    #[error("proxy refused connection to target (reply code {code:#04x})")]
    ProxyConnectRejected { code: u8 },

    // TLS
    #[error("TLS handshake with {host} failed: {reason}")]
    TlsHandshake { host: String, reason: String },

    // Target DNS
    #[error("could not resolve target host {host}")]
    DnsFailed { host: String },

    // HTTP
    #[error("invalid header {0:?}")]
    InvalidHeader(String),
    #[error("malformed HTTP response: {0}")]
    MalformedResponse(String),
    #[error("invalid UTF-8 in body")]
    InvalidUtf8,
    #[error("JSON error")]
    Json(#[source] serde_json::Error),

    // Content decoding
    #[error("content decoding failed ({encoding}): {reason}")]
    ContentDecoding { encoding: String, reason: String },

    // Redirects
    #[error("maximum redirects exceeded")]
    TooManyRedirects,
    #[error("redirect to {location:?} refused (status {status}, redirect mode is \"error\")")]
    RedirectRefused { status: u16, location: String },
    #[error("invalid redirect target {0:?}")]
    InvalidRedirect(String),

    // Cancellation
    #[error("{reason}")]
    Cancelled { reason: String },
    #[error("{reason} (after {hops} redirect hops)")]
    CancelledDuringRedirect { reason: String, hops: u32 },

    #[error("I/O error")]
    Io(#[from] io::Error),
}

impl FetchError {
    /// True for both cancellation variants.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            FetchError::Cancelled { .. } | FetchError::CancelledDuringRedirect { .. }
        )
    }

    /// Create a TLS handshake error with context.
    pub(crate) fn tls_handshake(host: impl Into<String>, reason: impl ToString) -> Self {
        Self::TlsHandshake {
            host: host.into(),
            reason: reason.to_string(),
        }
    }

    /// Attach the completed hop count to a cancellation raised mid-redirect.
    pub(crate) fn with_hops(self, hops: u32) -> Self {
        match self {
            FetchError::Cancelled { reason } if hops > 0 => {
                FetchError::CancelledDuringRedirect { reason, hops }
            }
            other => other,
        }
    }
}
