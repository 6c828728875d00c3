//! Request cancellation.
//!
//! A [`CancelToken`] is a cloneable handle honored at every suspension point
//! of a request: TCP connect, each SOCKS5 exchange, the TLS handshake, and
//! every HTTP read and write. Triggering it drops the underlying stream
//! (which deterministically fails any pending I/O) and rejects the request
//! with the token's reason.

use std::future::Future;
use std::sync::{Arc, OnceLock};

use tokio_util::sync::CancellationToken;

use crate::base::error::FetchError;

/// Cloneable cancellation handle for an in-flight request.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    token: CancellationToken,
    reason: Arc<OnceLock<String>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel with the generic "request aborted" reason.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Cancel and record a reason, surfaced verbatim in the resulting error.
    ///
    /// The first recorded reason wins; later calls only trigger cancellation.
    pub fn cancel_with_reason(&self, reason: impl Into<String>) {
        let _ = self.reason.set(reason.into());
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The recorded reason, if one was given.
    pub fn reason(&self) -> Option<&str> {
        self.reason.get().map(String::as_str)
    }

    pub(crate) fn to_error(&self) -> FetchError {
        FetchError::Cancelled {
            reason: self
                .reason()
                .map(str::to_owned)
                .unwrap_or_else(|| "request aborted".to_owned()),
        }
    }
}

/// Race `fut` against cancellation.
///
/// An already-cancelled token fails before `fut` is polled, so no bytes are
/// written on its behalf. On trigger the future (and whatever stream it
/// borrows or owns) is dropped on the spot.
pub(crate) async fn checked<T, F>(cancel: Option<&CancelToken>, fut: F) -> Result<T, FetchError>
where
    F: Future<Output = Result<T, FetchError>>,
{
    let Some(cancel) = cancel else {
        return fut.await;
    };
    if cancel.is_cancelled() {
        return Err(cancel.to_error());
    }
    tokio::select! {
        biased;
        _ = cancel.token.cancelled() => Err(cancel.to_error()),
        result = fut => result,
    }
}
