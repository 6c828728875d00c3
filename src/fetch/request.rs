//! Request construction.

use http::Method;
use url::Url;

use crate::base::error::FetchError;
use crate::cancel::CancelToken;
use crate::http::body::RequestBody;
use crate::http::headers::HeaderMap;
use crate::http::response::Response;
use crate::socket::tls::TlsOptions;

/// How 3xx responses are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RedirectMode {
    /// Follow redirects up to the hop limit (default).
    #[default]
    Follow,
    /// Return the 3xx response as-is.
    Manual,
    /// Fail when a redirect is requested.
    Error,
}

/// A single prepared request.
///
/// Built by [`RequestBuilder`]; the redirect driver derives fresh requests
/// from it on every hop and never mutates the one the caller built.
#[derive(Debug, Clone)]
pub struct Request {
    pub(crate) method: Method,
    pub(crate) url: Url,
    pub(crate) headers: HeaderMap,
    pub(crate) body: RequestBody,
    pub(crate) proxy: Option<String>,
    pub(crate) redirect: RedirectMode,
    pub(crate) tls: TlsOptions,
    pub(crate) cancel: Option<CancelToken>,
    pub(crate) resolve_dns_locally: bool,
}

impl Request {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

/// Builder for a single request.
///
/// Entry points: [`crate::get`], [`crate::post`], [`crate::request`] and
/// friends.
pub struct RequestBuilder {
    method: Method,
    url: String,
    headers: HeaderMap,
    body: RequestBody,
    proxy: Option<String>,
    redirect: RedirectMode,
    tls: TlsOptions,
    cancel: Option<CancelToken>,
    resolve_dns_locally: bool,
}

impl RequestBuilder {
    pub(crate) fn new(method: Method, url: &str) -> Self {
        Self {
            method,
            url: url.to_owned(),
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
            proxy: None,
            redirect: RedirectMode::Follow,
            tls: TlsOptions::default(),
            cancel: None,
            resolve_dns_locally: false,
        }
    }

    /// Set a header. Invalid names or values are dropped.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if self.headers.set(name, value).is_err() {
            tracing::debug!(name = %name, "dropping invalid header");
        }
        self
    }

    /// Append a header without replacing earlier values of the same name.
    pub fn append_header(mut self, name: &str, value: &str) -> Self {
        if self.headers.append(name, value).is_err() {
            tracing::debug!(name = %name, "dropping invalid header");
        }
        self
    }

    /// Set the request body. Bodies are buffered in full before sending.
    pub fn body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = body.into();
        self
    }

    /// Set a JSON body and `Content-Type: application/json`.
    #[cfg(feature = "json")]
    pub fn json<T: serde::Serialize>(mut self, value: &T) -> Self {
        if let Ok(bytes) = serde_json::to_vec(value) {
            self.body = RequestBody::from(bytes);
            let _ = self.headers.set("Content-Type", "application/json");
        }
        self
    }

    /// Route this request through a proxy. Accepts any string shape
    /// [`crate::convert`] accepts; the proxy is preserved across redirects.
    pub fn proxy(mut self, proxy: &str) -> Self {
        self.proxy = Some(proxy.to_owned());
        self
    }

    /// Route this request through an already-parsed proxy endpoint.
    pub fn proxy_endpoint(mut self, proxy: &crate::proxy::endpoint::ProxyEndpoint) -> Self {
        self.proxy = Some(proxy.to_url());
        self
    }

    pub fn redirect(mut self, mode: RedirectMode) -> Self {
        self.redirect = mode;
        self
    }

    pub fn tls(mut self, options: TlsOptions) -> Self {
        self.tls = options;
        self
    }

    /// Honor this token at every suspension point of the request.
    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Resolve the target hostname locally and send its IPv4 address to the
    /// proxy instead of the hostname. Off by default to avoid DNS leaks.
    pub fn resolve_dns_locally(mut self, enabled: bool) -> Self {
        self.resolve_dns_locally = enabled;
        self
    }

    /// Dispatch through the front door.
    pub async fn send(self) -> Result<Response, FetchError> {
        let url =
            Url::parse(&self.url).map_err(|_| FetchError::InvalidUrl(self.url.clone()))?;
        let request = Request {
            method: self.method,
            url,
            headers: self.headers,
            body: self.body,
            proxy: self.proxy,
            redirect: self.redirect,
            tls: self.tls,
            cancel: self.cancel,
            resolve_dns_locally: self.resolve_dns_locally,
        };
        crate::fetch::dispatch(request).await
    }
}
