//! The user-facing response type.

use bytes::Bytes;

use crate::base::error::FetchError;
use crate::http::headers::HeaderMap;

/// A fully-decoded HTTP response.
///
/// The body is buffered in full before the response is returned; chunked
/// transfer-coding and `Content-Encoding` have already been undone.
#[derive(Debug, Clone)]
pub struct Response {
    pub(crate) status: u16,
    pub(crate) status_text: String,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
}

impl Response {
    /// The status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// The reason phrase from the status line (may be empty).
    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Response headers as received (ordered, original casing).
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of a header, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// The decoded body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Consume the response, returning the decoded body.
    pub fn bytes(self) -> Bytes {
        self.body
    }

    /// Consume the response as UTF-8 text.
    pub fn text(self) -> Result<String, FetchError> {
        String::from_utf8(self.body.to_vec()).map_err(|_| FetchError::InvalidUtf8)
    }

    /// Consume the response, deserializing the body as JSON.
    #[cfg(feature = "json")]
    pub fn json<T: serde::de::DeserializeOwned>(self) -> Result<T, FetchError> {
        serde_json::from_slice(&self.body).map_err(FetchError::Json)
    }
}
