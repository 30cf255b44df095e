//! Minimal `multipart/related` framing (RFC 2387) for bulk data responses
//! and STOW-RS requests.

use bytes::Bytes;

use crate::error::{TransportError, TransportResult};

const CRLF: &[u8] = b"\r\n";
const HEADER_END: &[u8] = b"\r\n\r\n";

/// `boundary` parameter of a multipart content type, unquoted.
pub fn boundary(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("boundary")
            .then(|| value.trim().trim_matches('"').to_string())
    })
}

/// Whether `content_type` names a `multipart/related` body.
pub fn is_multipart(content_type: &str) -> bool {
    content_type.trim_start().to_ascii_lowercase().starts_with("multipart/")
}

/// First element of a response envelope.
///
/// A multipart body yields its first part's payload; anything else is
/// returned whole.
pub fn first_part(content_type: Option<&str>, body: Bytes) -> TransportResult<Bytes> {
    let Some(content_type) = content_type.filter(|ct| is_multipart(ct)) else {
        return Ok(body);
    };
    let boundary = boundary(content_type)
        .ok_or_else(|| TransportError::Decode(format!("multipart without boundary: {content_type}")))?;
    let delimiter = [b"--".as_slice(), boundary.as_bytes()].concat();

    let opening = find(&body, &delimiter, 0)
        .ok_or_else(|| TransportError::Decode("multipart opening delimiter missing".into()))?;
    let headers_start = find(&body, CRLF, opening + delimiter.len())
        .ok_or_else(|| TransportError::Decode("multipart delimiter line unterminated".into()))?;
    let payload_start = find(&body, HEADER_END, headers_start)
        .map(|i| i + HEADER_END.len())
        .ok_or_else(|| TransportError::Decode("multipart part headers unterminated".into()))?;

    let closing = [CRLF, delimiter.as_slice()].concat();
    let payload_end = find(&body, &closing, payload_start)
        .ok_or_else(|| TransportError::Decode("multipart closing delimiter missing".into()))?;
    Ok(body.slice(payload_start..payload_end))
}

/// Frame `parts` as a `multipart/related` body.
pub fn encode_related(parts: &[(&str, &[u8])], boundary: &str) -> Vec<u8> {
    let mut body = Vec::new();
    for (content_type, payload) in parts {
        body.extend_from_slice(format!("--{boundary}\r\nContent-Type: {content_type}\r\n\r\n").as_bytes());
        body.extend_from_slice(payload);
        body.extend_from_slice(CRLF);
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() || needle.is_empty() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CT: &str = "multipart/related; type=\"application/octet-stream\"; boundary=\"b0und\"";

    #[test]
    fn boundary_parsing() {
        assert_eq!(boundary(CT).as_deref(), Some("b0und"));
        assert_eq!(boundary("multipart/related; BOUNDARY=xyz").as_deref(), Some("xyz"));
        assert_eq!(boundary("application/octet-stream"), None);
    }

    #[test]
    fn non_multipart_body_is_returned_whole() {
        let body = Bytes::from_static(b"\x00\x01raw");
        assert_eq!(first_part(Some("application/octet-stream"), body.clone()).unwrap(), body);
        assert_eq!(first_part(None, body.clone()).unwrap(), body);
    }

    #[test]
    fn extracts_first_part_only() {
        let body = encode_related(
            &[
                ("application/octet-stream", &b"\x01\x02\r\n\x03"[..]),
                ("application/octet-stream", &b"second"[..]),
            ],
            "b0und",
        );
        let part = first_part(Some(CT), Bytes::from(body)).unwrap();
        assert_eq!(part.as_ref(), b"\x01\x02\r\n\x03");
    }

    #[test]
    fn tolerates_preamble() {
        let mut body = b"preamble text\r\n".to_vec();
        body.extend(encode_related(&[("application/octet-stream", &b"value"[..])], "b0und"));
        let part = first_part(Some(CT), Bytes::from(body)).unwrap();
        assert_eq!(part.as_ref(), b"value");
    }

    #[test]
    fn missing_closing_delimiter_is_an_error() {
        let body = Bytes::from_static(b"--b0und\r\nContent-Type: x\r\n\r\nvalue");
        assert!(matches!(first_part(Some(CT), body), Err(TransportError::Decode(_))));
    }

    #[test]
    fn missing_boundary_is_an_error() {
        let body = Bytes::from_static(b"whatever");
        assert!(first_part(Some("multipart/related"), body).is_err());
    }
}
