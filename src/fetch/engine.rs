//! The request engine: one request over one fresh SOCKS5 tunnel.

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::base::error::FetchError;
use crate::cancel::checked;
use crate::http::response::Response;
use crate::http::wire::{self, BodyFraming, ResponseHead, TargetEndpoint};
use crate::http::{chunked, decoding};
use crate::proxy::endpoint::ProxyEndpoint;
use crate::socket::socks5::Socks5Dialer;

const READ_CHUNK: usize = 8192;

/// Execute one hop: dial the tunnel, write the framed request, accumulate
/// the response, decode it. The tunnel stream is owned here exclusively and
/// dropped on every exit path.
pub(crate) async fn execute(
    request: &crate::fetch::request::Request,
    proxy: &ProxyEndpoint,
) -> Result<Response, FetchError> {
    let target = TargetEndpoint::from_url(&request.url)?;
    let cancel = request.cancel.as_ref();
    let body = request.body.as_bytes();

    let mut headers = request.headers.clone();
    wire::apply_default_headers(&mut headers, body);

    let dialer = Socks5Dialer {
        proxy,
        target_host: &target.host,
        target_port: target.port,
        tls: target.tls.then_some(&request.tls),
        resolve_locally: request.resolve_dns_locally,
    };
    let mut stream = checked(cancel, dialer.dial()).await?;

    let outbound = wire::format_request(&request.method, &target, &headers, body);
    checked(cancel, async {
        stream.write_all(&outbound).await?;
        stream.flush().await?;
        Ok(())
    })
    .await?;

    // Accumulate until the header/body boundary shows up.
    let mut buf: Vec<u8> = Vec::with_capacity(READ_CHUNK);
    let head_end = loop {
        if let Some(end) = wire::find_header_end(&buf) {
            break end;
        }
        let mut chunk = [0u8; READ_CHUNK];
        let n = checked(cancel, async { Ok(stream.read(&mut chunk).await?) }).await?;
        if n == 0 {
            return Err(FetchError::MalformedResponse(
                "connection closed before the end of headers".to_owned(),
            ));
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = wire::parse_head(&buf[..head_end - 4]);
    let framing = wire::body_framing(&head);

    // Read until the framing rule says the body is complete. A peer close
    // terminates any framing; short bodies are tolerated.
    loop {
        let body_so_far = &buf[head_end..];
        let complete = match framing {
            BodyFraming::ContentLength(n) => body_so_far.len() >= n,
            BodyFraming::Chunked => chunked::decode(body_so_far).1,
            BodyFraming::UntilClose => false,
        };
        if complete {
            break;
        }
        let mut chunk = [0u8; READ_CHUNK];
        let n = checked(cancel, async { Ok(stream.read(&mut chunk).await?) }).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    drop(stream);

    let raw_body = &buf[head_end..];
    let body = match framing {
        BodyFraming::Chunked => chunked::decode(raw_body).0,
        BodyFraming::ContentLength(n) => raw_body[..raw_body.len().min(n)].to_vec(),
        BodyFraming::UntilClose => raw_body.to_vec(),
    };

    let ResponseHead {
        status,
        status_text,
        mut headers,
    } = head;
    let body = decoding::decode_body(&mut headers, body)?;

    Ok(Response {
        status,
        status_text,
        headers,
        body: Bytes::from(body),
    })
}
