//! HTTP/1.1 request framing and response-head parsing.
//!
//! Every request is written on a fresh tunnel with `Connection: close`;
//! EOF-terminated bodies keep the inbound framing rules to three cases
//! (chunked, content-length, read-to-close).

use http::Method;
use url::Url;

use crate::base::error::FetchError;
use crate::http::headers::HeaderMap;

pub(crate) const DEFAULT_ACCEPT: &str = "*/*";
pub(crate) const DEFAULT_ACCEPT_ENCODING: &str = "gzip, deflate, br, zstd";

/// The connection target derived from a request URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TargetEndpoint {
    /// Unbracketed host.
    pub host: String,
    pub port: u16,
    pub tls: bool,
    pub path_and_query: String,
}

impl TargetEndpoint {
    pub(crate) fn from_url(url: &Url) -> Result<Self, FetchError> {
        let tls = match url.scheme() {
            "http" => false,
            "https" => true,
            _ => return Err(FetchError::InvalidUrl(url.to_string())),
        };
        let host = url
            .host_str()
            .ok_or_else(|| FetchError::InvalidUrl(url.to_string()))?;
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host)
            .to_owned();
        let port = url.port().unwrap_or(if tls { 443 } else { 80 });

        let mut path_and_query = url.path().to_owned();
        if path_and_query.is_empty() {
            path_and_query.push('/');
        }
        if let Some(query) = url.query() {
            path_and_query.push('?');
            path_and_query.push_str(query);
        }

        Ok(Self {
            host,
            port,
            tls,
            path_and_query,
        })
    }

    pub(crate) fn default_port(&self) -> u16 {
        if self.tls {
            443
        } else {
            80
        }
    }

    /// `Host` header value: IPv6 hosts re-bracketed, default port elided.
    pub(crate) fn host_header(&self) -> String {
        let host = if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        if self.port == self.default_port() {
            host
        } else {
            format!("{host}:{}", self.port)
        }
    }
}

/// Fill in the headers the framer owns defaults for. `Host` and
/// `Connection` are not handled here; they are always emitted fixed.
pub(crate) fn apply_default_headers(headers: &mut HeaderMap, body: Option<&[u8]>) {
    if !headers.contains("Accept") {
        let _ = headers.set("Accept", DEFAULT_ACCEPT);
    }
    if !headers.contains("Accept-Encoding") {
        let _ = headers.set("Accept-Encoding", DEFAULT_ACCEPT_ENCODING);
    }
    if let Some(body) = body {
        if !headers.contains("Content-Length") {
            let _ = headers.set("Content-Length", &body.len().to_string());
        }
    }
}

/// Serialize a full request. Caller headers are emitted in insertion order
/// with their original casing; `Host` and `Connection` are fixed by the
/// framer and skipped if the caller supplied them.
pub(crate) fn format_request(
    method: &Method,
    target: &TargetEndpoint,
    headers: &HeaderMap,
    body: Option<&[u8]>,
) -> Vec<u8> {
    let mut head = format!(
        "{method} {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n",
        target.path_and_query,
        target.host_header(),
    );
    for (name, value) in headers.iter() {
        if name.eq_ignore_ascii_case("host") || name.eq_ignore_ascii_case("connection") {
            continue;
        }
        head.push_str(name);
        head.push_str(": ");
        head.push_str(value);
        head.push_str("\r\n");
    }
    head.push_str("\r\n");

    let mut out = head.into_bytes();
    if let Some(body) = body {
        out.extend_from_slice(body);
    }
    out
}

/// A parsed status line and header block.
#[derive(Debug)]
pub(crate) struct ResponseHead {
    pub status: u16,
    pub status_text: String,
    pub headers: HeaderMap,
}

/// Offset of the first byte after `CRLFCRLF`, if the head is complete.
pub(crate) fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|i| i + 4)
}

/// Parse the head block (status line + header lines).
///
/// An unparseable status code falls back to 200: some servers emit garbage
/// status lines and the clients this crate replaces treated them as success.
pub(crate) fn parse_head(head: &[u8]) -> ResponseHead {
    let text = String::from_utf8_lossy(head);
    let mut lines = text.split("\r\n");

    let status_line = lines.next().unwrap_or("");
    let mut parts = status_line.splitn(3, ' ');
    let _version = parts.next();
    let status = parts
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .unwrap_or(200);
    let status_text = parts.next().unwrap_or("").to_owned();

    let mut headers = HeaderMap::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        // Duplicate names accumulate; lookup returns the first.
        let _ = headers.append(name.trim(), value.trim());
    }

    ResponseHead {
        status,
        status_text,
        headers,
    }
}

/// How the response body ends, in priority order: chunked transfer-coding,
/// explicit length, connection close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BodyFraming {
    Chunked,
    ContentLength(usize),
    UntilClose,
}

pub(crate) fn body_framing(head: &ResponseHead) -> BodyFraming {
    let chunked = head.headers.get_all("Transfer-Encoding").any(|value| {
        value
            .split(',')
            .any(|token| token.trim().eq_ignore_ascii_case("chunked"))
    });
    if chunked {
        return BodyFraming::Chunked;
    }
    if let Some(len) = head
        .headers
        .get("Content-Length")
        .and_then(|v| v.trim().parse::<usize>().ok())
    {
        return BodyFraming::ContentLength(len);
    }
    BodyFraming::UntilClose
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(url: &str) -> TargetEndpoint {
        TargetEndpoint::from_url(&Url::parse(url).unwrap()).unwrap()
    }

    #[test]
    fn test_target_defaults() {
        let t = target("https://example.test/a?b=c");
        assert_eq!(t.host, "example.test");
        assert_eq!(t.port, 443);
        assert!(t.tls);
        assert_eq!(t.path_and_query, "/a?b=c");
        assert_eq!(t.host_header(), "example.test");
    }

    #[test]
    fn test_target_explicit_port_and_ipv6() {
        let t = target("http://[2001:db8::1]:8080/");
        assert_eq!(t.host, "2001:db8::1");
        assert_eq!(t.host_header(), "[2001:db8::1]:8080");
    }

    #[test]
    fn test_target_rejects_other_schemes() {
        let url = Url::parse("ftp://example.test/").unwrap();
        assert!(TargetEndpoint::from_url(&url).is_err());
    }

    #[test]
    fn test_request_framing() {
        let mut headers = HeaderMap::new();
        headers.set("X-Trace", "abc").unwrap();
        headers.set("Host", "attacker.example").unwrap();
        let body: &[u8] = b"hi";
        apply_default_headers(&mut headers, Some(body));

        let bytes = format_request(
            &Method::POST,
            &target("http://example.test/p"),
            &headers,
            Some(body),
        );
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.starts_with("POST /p HTTP/1.1\r\nHost: example.test\r\nConnection: close\r\n"));
        assert!(text.contains("X-Trace: abc\r\n"));
        assert!(text.contains("Accept: */*\r\n"));
        assert!(text.contains("Accept-Encoding: gzip, deflate, br, zstd\r\n"));
        assert!(text.contains("Content-Length: 2\r\n"));
        // The caller-supplied Host never reaches the wire.
        assert!(!text.contains("attacker.example"));
        assert!(text.ends_with("\r\n\r\nhi"));
    }

    #[test]
    fn test_caller_accept_wins() {
        let mut headers = HeaderMap::new();
        headers.set("accept", "application/json").unwrap();
        apply_default_headers(&mut headers, None);
        assert_eq!(headers.get("Accept"), Some("application/json"));
        assert_eq!(headers.get_all("accept").count(), 1);
    }

    #[test]
    fn test_parse_head_basic() {
        let head = parse_head(b"HTTP/1.1 404 Not Found\r\nContent-Type: text/plain\r\nX-Dup: a\r\nX-Dup: b\r\n");
        assert_eq!(head.status, 404);
        assert_eq!(head.status_text, "Not Found");
        assert_eq!(head.headers.get("content-type"), Some("text/plain"));
        assert_eq!(head.headers.get_all("x-dup").count(), 2);
    }

    #[test]
    fn test_parse_head_garbage_status_defaults_to_200() {
        let head = parse_head(b"ICY OK\r\n");
        assert_eq!(head.status, 200);
    }

    #[test]
    fn test_find_header_end() {
        assert_eq!(find_header_end(b"HTTP/1.1 200 OK\r\n\r\nbody"), Some(19));
        assert_eq!(find_header_end(b"HTTP/1.1 200 OK\r\n"), None);
    }

    #[test]
    fn test_body_framing_priority() {
        // chunked wins over content-length
        let head = parse_head(
            b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\nTransfer-Encoding: gzip, chunked\r\n",
        );
        assert_eq!(body_framing(&head), BodyFraming::Chunked);

        let head = parse_head(b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n");
        assert_eq!(body_framing(&head), BodyFraming::ContentLength(10));

        let head = parse_head(b"HTTP/1.1 200 OK\r\n");
        assert_eq!(body_framing(&head), BodyFraming::UntilClose);
    }
}
