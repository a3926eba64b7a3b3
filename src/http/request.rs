//! Inbound request heads and submission decoding.
//!
//! The request target is kept as raw bytes: it is forwarded upstream
//! unchanged and only percent-decoded when it carries a submission.

use bytes::Bytes;
use percent_encoding::percent_decode;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("malformed request line: {0:?}")]
    BadRequestLine(String),

    #[error("invalid Content-Length: {0:?}")]
    BadContentLength(String),
}

/// What an inbound request asks the proxy to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Fetch a resource from the upstream provider.
    Fetch,
    /// Hand the next chamber's prompt back to the walker.
    Submission,
}

/// Request line plus the one header the proxy cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    pub method: String,
    pub target: Vec<u8>,
    pub version: String,
    pub content_length: usize,
}

impl RequestHead {
    /// Parse a head as returned by `StreamReader::read_head`.
    pub fn parse(head: &[u8]) -> Result<Self, RequestError> {
        let mut lines = head
            .split(|&b| b == b'\n')
            .map(|line| line.strip_suffix(b"\r").unwrap_or(line));

        let request_line = lines.next().unwrap_or_default();
        let mut parts = request_line
            .split(u8::is_ascii_whitespace)
            .filter(|part| !part.is_empty());
        let (Some(method), Some(target)) = (parts.next(), parts.next()) else {
            return Err(RequestError::BadRequestLine(
                String::from_utf8_lossy(request_line).into_owned(),
            ));
        };
        let version = parts.next().unwrap_or(&b"HTTP/1.0"[..]);

        let mut content_length = 0;
        for line in lines {
            let Some(colon) = line.iter().position(|&b| b == b':') else {
                continue;
            };
            let (name, value) = (&line[..colon], line[colon + 1..].trim_ascii());
            if name.trim_ascii().eq_ignore_ascii_case(b"content-length") {
                let bad = || RequestError::BadContentLength(String::from_utf8_lossy(value).into_owned());
                content_length = std::str::from_utf8(value)
                    .map_err(|_| bad())?
                    .parse()
                    .map_err(|_| bad())?;
            }
        }

        Ok(Self {
            method: String::from_utf8_lossy(method).into_owned(),
            target: target.to_vec(),
            version: String::from_utf8_lossy(version).into_owned(),
            content_length,
        })
    }

    /// Target for logging; invalid UTF-8 is replaced.
    pub fn target_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.target)
    }

    /// Path component of the target, without the query.
    pub fn path(&self) -> &[u8] {
        self.split_target().0
    }

    /// Raw (still percent-encoded) query, if any.
    pub fn query(&self) -> Option<&[u8]> {
        self.split_target().1
    }

    fn split_target(&self) -> (&[u8], Option<&[u8]>) {
        match self.target.iter().position(|&b| b == b'?') {
            Some(at) => (&self.target[..at], Some(&self.target[at + 1..])),
            None => (&self.target, None),
        }
    }

    /// GETs are fetches unless they target `submit_path`; anything else is a
    /// submission.
    pub fn kind(&self, submit_path: &str) -> RequestKind {
        if self.method.eq_ignore_ascii_case("GET") && !self.path().starts_with(submit_path.as_bytes()) {
            RequestKind::Fetch
        } else {
            RequestKind::Submission
        }
    }
}

/// Prompt carried by a submission: the body when present, otherwise the
/// percent-decoded query string. `+`, `&` and `=` are left as they are.
pub fn submission_prompt(head: &RequestHead, body: &[u8]) -> Bytes {
    if !body.is_empty() {
        return Bytes::copy_from_slice(body);
    }

    match head.query() {
        Some(query) => Bytes::from(percent_decode(query).collect::<Vec<u8>>()),
        None => Bytes::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_get() {
        let head = RequestHead::parse(b"GET /791 HTTP/1.1\r\nHost: localhost\r").unwrap();
        assert_eq!(head.method, "GET");
        assert_eq!(head.target, b"/791");
        assert_eq!(head.version, "HTTP/1.1");
        assert_eq!(head.content_length, 0);
        assert_eq!(head.kind("/submit"), RequestKind::Fetch);
    }

    #[test]
    fn parses_content_length() {
        let head = RequestHead::parse(b"POST / HTTP/1.1\r\ncontent-length: 12\r").unwrap();
        assert_eq!(head.content_length, 12);
        assert_eq!(head.kind("/submit"), RequestKind::Submission);
    }

    #[test]
    fn rejects_bad_content_length() {
        assert_eq!(
            RequestHead::parse(b"POST / HTTP/1.1\r\nContent-Length: lots\r"),
            Err(RequestError::BadContentLength("lots".into()))
        );
    }

    #[test]
    fn rejects_bare_method() {
        assert!(matches!(
            RequestHead::parse(b"GET"),
            Err(RequestError::BadRequestLine(_))
        ));
    }

    #[test]
    fn get_on_submit_path_is_submission() {
        let head = RequestHead::parse(b"GET /submit?identifier%3Aabc HTTP/1.1").unwrap();
        assert_eq!(head.path(), b"/submit");
        assert_eq!(head.kind("/submit"), RequestKind::Submission);
    }

    #[test]
    fn submission_prefers_body() {
        let head = RequestHead::parse(b"POST /submit?ignored HTTP/1.1\r\nContent-Length: 3").unwrap();
        assert_eq!(&submission_prompt(&head, b"abc")[..], b"abc");
    }

    #[test]
    fn submission_decodes_query() {
        let head =
            RequestHead::parse(b"GET /submit?identifier%3Aabc123%0Anext%20step HTTP/1.1").unwrap();
        assert_eq!(&submission_prompt(&head, b"")[..], b"identifier:abc123\nnext step");
    }

    #[test]
    fn submission_without_query_is_empty() {
        let head = RequestHead::parse(b"DELETE /thing HTTP/1.1").unwrap();
        assert!(submission_prompt(&head, b"").is_empty());
    }

    #[test]
    fn query_is_percent_decoded_only() {
        let head =
            RequestHead::parse(b"GET /submit?identifier%3Aabc%0Asum:+1+2=3&&x= HTTP/1.1").unwrap();
        assert_eq!(&submission_prompt(&head, b"")[..], b"identifier:abc\nsum:+1+2=3&&x=");
    }

    #[test]
    fn plus_in_identifier_survives() {
        let head = RequestHead::parse(b"PUT /x?identifier:a+b%2Bc HTTP/1.1").unwrap();
        assert_eq!(&submission_prompt(&head, b"")[..], b"identifier:a+b+c");
    }

    #[test]
    fn non_utf8_target_is_kept() {
        let head = RequestHead::parse(b"GET /caf\xe9?q HTTP/1.1\r\nHost: x\r").unwrap();
        assert_eq!(head.target, b"/caf\xe9?q");
        assert_eq!(head.path(), b"/caf\xe9");
        assert_eq!(head.kind("/submit"), RequestKind::Fetch);
        assert_eq!(head.target_lossy(), "/caf\u{fffd}?q");
    }
}
