//! The redirect driver.
//!
//! Wraps a transport (SOCKS engine or native fallback) and applies the
//! RFC method/body/header transformations. All hops of one logical request
//! traverse the same transport, proxy included.

use http::Method;
use url::Url;

use crate::base::error::FetchError;
use crate::fetch::request::{RedirectMode, Request};
use crate::fetch::{engine, fallback};
use crate::http::body::RequestBody;
use crate::http::response::Response;
use crate::proxy::endpoint::ProxyEndpoint;

pub(crate) const MAX_REDIRECTS: u32 = 20;

/// Statuses whose redirects are followed in `follow` mode.
const FOLLOWED_STATUSES: [u16; 5] = [301, 302, 303, 307, 308];

/// Which path executes individual hops.
pub(crate) enum Transport {
    /// Tunneled through a SOCKS proxy.
    Socks(ProxyEndpoint),
    /// The native client: direct, or via an HTTP(S) proxy.
    Native(Option<ProxyEndpoint>),
}

impl Transport {
    async fn execute(&self, request: &Request) -> Result<Response, FetchError> {
        match self {
            Transport::Socks(proxy) => engine::execute(request, proxy).await,
            Transport::Native(proxy) => fallback::execute(request, proxy.as_ref()).await,
        }
    }
}

/// Drive a request to a final response per its redirect mode.
pub(crate) async fn run(request: Request, transport: Transport) -> Result<Response, FetchError> {
    match request.redirect {
        RedirectMode::Manual => return transport.execute(&request).await,
        RedirectMode::Error => {
            let response = transport.execute(&request).await?;
            // Any 3xx carrying a Location is a refusal in this mode.
            if (300..400).contains(&response.status()) {
                if let Some(location) = response.header("Location") {
                    return Err(FetchError::RedirectRefused {
                        status: response.status(),
                        location: location.to_owned(),
                    });
                }
            }
            return Ok(response);
        }
        RedirectMode::Follow => {}
    }

    let original_origin = request.url.origin();
    let caller_set_referer = request.headers.contains("Referer");
    let mut current = request;
    let mut hops: u32 = 0;

    loop {
        let response = transport
            .execute(&current)
            .await
            .map_err(|e| e.with_hops(hops))?;

        let Some(location) = followed_location(&response) else {
            return Ok(response);
        };
        if hops == MAX_REDIRECTS {
            return Err(FetchError::TooManyRedirects);
        }

        let next_url = resolve_location(&current.url, &location)?;
        let status = response.status();
        tracing::debug!(status, from = %current.url, to = %next_url, "following redirect");

        // Each hop gets a fresh request derived from the previous one.
        let previous_url = current.url.clone();
        let mut next = current.clone();
        next.url = next_url;

        // 303 rewrites to GET unconditionally; 301/302 only rewrite
        // non-GET/HEAD methods. 307/308 preserve method and body.
        let rewrite_to_get = status == 303
            || ((status == 301 || status == 302)
                && next.method != Method::GET
                && next.method != Method::HEAD);
        if rewrite_to_get {
            next.method = Method::GET;
            next.body = RequestBody::Empty;
            next.headers.remove("Content-Length");
        }

        // Never carry credentials to an origin the caller did not name.
        if next.url.origin() != original_origin {
            next.headers.remove("Authorization");
            next.headers.remove("Cookie");
            next.headers.remove("Proxy-Authorization");
        }
        if !caller_set_referer {
            let _ = next.headers.set("Referer", previous_url.as_str());
        }

        hops += 1;
        current = next;
    }
}

fn followed_location(response: &Response) -> Option<String> {
    if !FOLLOWED_STATUSES.contains(&response.status()) {
        return None;
    }
    response
        .header("Location")
        .filter(|l| !l.is_empty())
        .map(str::to_owned)
}

/// Absolute `http(s)` targets are taken as-is; everything else resolves
/// against the current URL with standard reference semantics.
fn resolve_location(current: &Url, location: &str) -> Result<Url, FetchError> {
    let url = if location.starts_with("http://") || location.starts_with("https://") {
        Url::parse(location)
    } else {
        current.join(location)
    }
    .map_err(|_| FetchError::InvalidRedirect(location.to_owned()))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(FetchError::InvalidRedirect(location.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_location() {
        let current = Url::parse("https://example.test/a/b?q=1").unwrap();
        assert_eq!(
            resolve_location(&current, "/c").unwrap().as_str(),
            "https://example.test/c"
        );
        assert_eq!(
            resolve_location(&current, "d").unwrap().as_str(),
            "https://example.test/a/d"
        );
    }

    #[test]
    fn test_resolve_absolute_location() {
        let current = Url::parse("https://example.test/a").unwrap();
        assert_eq!(
            resolve_location(&current, "http://other.test/x").unwrap().as_str(),
            "http://other.test/x"
        );
    }

    #[test]
    fn test_resolve_rejects_non_http_schemes() {
        let current = Url::parse("https://example.test/a").unwrap();
        assert!(resolve_location(&current, "ftp://other.test/x").is_err());
    }
}
