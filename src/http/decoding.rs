//! `Content-Encoding` handling.
//!
//! The header is a comma-separated codec list applied to the
//! already-chunk-decoded body, left to right. Real deployments layer
//! codecs (`gzip, br`), so ordering is strict. On success the
//! `Content-Encoding` header is removed and `Content-Length` rewritten to
//! the decoded length; a chain containing any unrecognized token leaves the
//! body and headers untouched.

use std::io::Read;

use crate::base::error::FetchError;
use crate::http::headers::HeaderMap;

#[derive(Debug, Clone, Copy)]
enum Codec {
    Gzip,
    Deflate,
    Brotli,
    Zstd,
}

impl Codec {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "gzip" => Some(Codec::Gzip),
            "deflate" => Some(Codec::Deflate),
            "br" => Some(Codec::Brotli),
            "zstd" => Some(Codec::Zstd),
            _ => None,
        }
    }
}

/// Apply the response's `Content-Encoding` chain to `body`.
pub(crate) fn decode_body(headers: &mut HeaderMap, body: Vec<u8>) -> Result<Vec<u8>, FetchError> {
    let Some(encoding) = headers.get("Content-Encoding").map(str::to_owned) else {
        return Ok(body);
    };
    let tokens: Vec<String> = encoding
        .split(',')
        .map(|t| t.trim().to_ascii_lowercase())
        .filter(|t| !t.is_empty())
        .collect();

    let mut chain = Vec::with_capacity(tokens.len());
    for token in &tokens {
        match Codec::from_token(token) {
            Some(codec) => chain.push(codec),
            None => {
                tracing::debug!(token = %token, "unrecognized content-encoding, passing body through");
                return Ok(body);
            }
        }
    }
    if chain.is_empty() {
        return Ok(body);
    }

    let mut data = body;
    for codec in chain {
        data = match codec {
            Codec::Gzip => gunzip(&data)?,
            Codec::Deflate => inflate(&data)?,
            Codec::Brotli => brotli_decode(&data)?,
            Codec::Zstd => zstd_decode(&data)?,
        };
    }

    headers.remove("Content-Encoding");
    let _ = headers.set("Content-Length", &data.len().to_string());
    Ok(data)
}

fn gunzip(data: &[u8]) -> Result<Vec<u8>, FetchError> {
    let mut out = Vec::new();
    flate2::read::GzDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| decode_error("gzip", e))?;
    Ok(out)
}

/// Servers mislabel deflate often enough that three dialects are tried:
/// raw deflate, zlib-wrapped deflate, then gzip. The last failure wins.
fn inflate(data: &[u8]) -> Result<Vec<u8>, FetchError> {
    let mut out = Vec::new();
    if flate2::read::DeflateDecoder::new(data)
        .read_to_end(&mut out)
        .is_ok()
    {
        return Ok(out);
    }

    out.clear();
    if flate2::read::ZlibDecoder::new(data)
        .read_to_end(&mut out)
        .is_ok()
    {
        return Ok(out);
    }

    out.clear();
    flate2::read::GzDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| decode_error("deflate", e))?;
    Ok(out)
}

fn brotli_decode(data: &[u8]) -> Result<Vec<u8>, FetchError> {
    let mut out = Vec::new();
    brotli::Decompressor::new(data, 4096)
        .read_to_end(&mut out)
        .map_err(|e| decode_error("br", e))?;
    Ok(out)
}

fn zstd_decode(data: &[u8]) -> Result<Vec<u8>, FetchError> {
    zstd::stream::decode_all(data).map_err(|e| decode_error("zstd", e))
}

fn decode_error(encoding: &str, err: std::io::Error) -> FetchError {
    FetchError::ContentDecoding {
        encoding: encoding.to_owned(),
        reason: err.to_string(),
    }
}
