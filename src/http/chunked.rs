//! Chunked transfer-coding decoder.
//!
//! Deliberately lenient for drop-in compatibility with the clients this crate
//! replaces: malformed size lines are skipped rather than failing the
//! response, and a stream truncated mid-chunk yields the prefix decoded so
//! far. Chunk extensions are discarded; trailers are not exposed.

/// Decode a complete chunked byte stream, best effort.
///
/// ```
/// # use socksfetch::decode_chunked;
/// assert_eq!(
///     decode_chunked(b"5\r\nhello\r\n5\r\nworld\r\n0\r\n\r\n"),
///     b"helloworld"
/// );
/// ```
pub fn decode_chunked(input: &[u8]) -> Vec<u8> {
    decode(input).0
}

/// Decode chunks; the flag reports whether the terminating zero-size chunk
/// was seen (the engine uses it to decide when the body is complete).
pub(crate) fn decode(input: &[u8]) -> (Vec<u8>, bool) {
    let mut out = Vec::new();
    let mut pos = 0;
    while pos < input.len() {
        let Some(line_len) = find_crlf(&input[pos..]) else {
            return (out, false);
        };
        let line = &input[pos..pos + line_len];
        pos += line_len + 2;

        // Chunk extensions after `;` are tolerated and dropped.
        let size_text = match line.iter().position(|&b| b == b';') {
            Some(i) => &line[..i],
            None => line,
        };
        let Some(size) = parse_hex_size(size_text) else {
            // Unparseable size line: advance past it and keep going.
            continue;
        };
        if size == 0 {
            return (out, true);
        }

        let available = input.len() - pos;
        if available < size {
            out.extend_from_slice(&input[pos..]);
            return (out, false);
        }
        out.extend_from_slice(&input[pos..pos + size]);
        pos += size;
        if input[pos..].starts_with(b"\r\n") {
            pos += 2;
        }
    }
    (out, false)
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

fn parse_hex_size(text: &[u8]) -> Option<usize> {
    let text = std::str::from_utf8(text).ok()?.trim();
    if text.is_empty() {
        return None;
    }
    usize::from_str_radix(text, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_chunks() {
        assert_eq!(
            decode_chunked(b"5\r\nhello\r\n5\r\nworld\r\n0\r\n\r\n"),
            b"helloworld"
        );
    }

    #[test]
    fn test_terminal_chunk_detection() {
        let (body, done) = decode(b"3\r\nabc\r\n0\r\n\r\n");
        assert_eq!(body, b"abc");
        assert!(done);

        let (body, done) = decode(b"3\r\nabc\r\n");
        assert_eq!(body, b"abc");
        assert!(!done);
    }

    #[test]
    fn test_hex_sizes_and_extensions() {
        assert_eq!(
            decode_chunked(b"A;name=value\r\n0123456789\r\n0\r\n\r\n"),
            b"0123456789"
        );
    }

    #[test]
    fn test_malformed_size_line_is_skipped() {
        // "xyz" is not hex; the decoder steps over it and resynchronizes on
        // the next line.
        assert_eq!(decode_chunked(b"xyz\r\n5\r\nhello\r\n0\r\n\r\n"), b"hello");
    }

    #[test]
    fn test_truncated_tail_yields_prefix() {
        assert_eq!(decode_chunked(b"5\r\nhello\r\n5\r\nwor"), b"hellowor");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(decode_chunked(b""), b"");
    }

    #[test]
    fn test_roundtrip_with_encoder() {
        // Assemble a chunked stream by hand and make sure it decodes back.
        let payload: Vec<u8> = (0u8..=255).cycle().take(10_000).collect();
        let mut encoded = Vec::new();
        for chunk in payload.chunks(997) {
            encoded.extend_from_slice(format!("{:x}\r\n", chunk.len()).as_bytes());
            encoded.extend_from_slice(chunk);
            encoded.extend_from_slice(b"\r\n");
        }
        encoded.extend_from_slice(b"0\r\n\r\n");
        assert_eq!(decode_chunked(&encoded), payload);
    }
}
