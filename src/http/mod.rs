//! HTTP/1.1 plumbing.
//!
//! - [`headers`]: ordered, case-preserving header multimap
//! - `wire`: outbound framing and response-head parsing
//! - [`chunked`]: chunked transfer-coding decoder
//! - `decoding`: the `Content-Encoding` chain
//! - [`body`] / [`response`]: request and response payload types

pub mod body;
pub mod chunked;
pub(crate) mod decoding;
pub mod headers;
pub mod response;
pub(crate) mod wire;

pub use body::RequestBody;
pub use chunked::decode_chunked;
pub use headers::HeaderMap;
pub use response::Response;
