//! The front door.
//!
//! [`fetch`] (and the request builders) decide per request whether to take
//! the SOCKS tunnel path or the native client:
//!
//! 1. no proxy configured and none in the environment → native client;
//! 2. proxy string fails to normalize/parse → warn, strip, native client;
//! 3. `http`/`https` proxy → native client (it handles those itself);
//! 4. SOCKS family → the redirect driver over the tunnel engine.

use http::Method;

use crate::base::error::FetchError;
use crate::http::response::Response;
use crate::proxy::endpoint::parse_proxy_url;
use crate::proxy::normalize::convert;

pub(crate) mod engine;
pub(crate) mod fallback;
pub(crate) mod redirect;
pub mod request;

pub use request::{RedirectMode, Request, RequestBuilder};

use redirect::Transport;

/// Environment variables consulted when no proxy is configured, in order;
/// the first defined one wins.
const PROXY_ENV_VARS: [&str; 4] = ["SOCKS5_PROXY", "SOCKS_PROXY", "HTTP_PROXY", "HTTPS_PROXY"];

/// Fetch a URL with default options (GET, redirects followed, proxy taken
/// from the environment when present).
///
/// ```no_run
/// # async fn demo() -> Result<(), socksfetch::FetchError> {
/// let response = socksfetch::fetch("https://example.com/").await?;
/// println!("{}", response.status());
/// # Ok(())
/// # }
/// ```
pub async fn fetch(url: &str) -> Result<Response, FetchError> {
    get(url).send().await
}

/// Start building a GET request.
pub fn get(url: &str) -> RequestBuilder {
    request(Method::GET, url)
}

/// Start building a POST request.
pub fn post(url: &str) -> RequestBuilder {
    request(Method::POST, url)
}

/// Start building a PUT request.
pub fn put(url: &str) -> RequestBuilder {
    request(Method::PUT, url)
}

/// Start building a DELETE request.
pub fn delete(url: &str) -> RequestBuilder {
    request(Method::DELETE, url)
}

/// Start building a HEAD request.
pub fn head(url: &str) -> RequestBuilder {
    request(Method::HEAD, url)
}

/// Start building a PATCH request.
pub fn patch(url: &str) -> RequestBuilder {
    request(Method::PATCH, url)
}

/// Start building a request with an arbitrary method.
pub fn request(method: Method, url: &str) -> RequestBuilder {
    RequestBuilder::new(method, url)
}

fn proxy_from_env() -> Option<String> {
    PROXY_ENV_VARS
        .iter()
        .find_map(|name| std::env::var(name).ok())
}

/// Route one request to the SOCKS engine or the native client.
pub(crate) async fn dispatch(request: Request) -> Result<Response, FetchError> {
    let configured = request.proxy.clone().or_else(proxy_from_env);
    let Some(proxy_str) = configured else {
        return redirect::run(request, Transport::Native(None)).await;
    };

    let endpoint = match convert(&proxy_str).and_then(|canonical| parse_proxy_url(&canonical)) {
        Ok(endpoint) => endpoint,
        Err(err) => {
            // Configuration problems downgrade instead of failing the fetch.
            tracing::warn!(error = %err, "invalid proxy configuration, using the native client");
            let mut request = request;
            request.proxy = None;
            return redirect::run(request, Transport::Native(None)).await;
        }
    };

    if endpoint.scheme.is_socks() {
        redirect::run(request, Transport::Socks(endpoint)).await
    } else {
        redirect::run(request, Transport::Native(Some(endpoint))).await
    }
}
