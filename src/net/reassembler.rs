//! Incremental token scanner over a byte stream.
//!
//! # Responsibilities
//! - Accumulate partial socket reads into one buffer
//! - Expose "read until predicate" operations (word lengths, word after sum,
//!   words before key, identifier prompt, length prefix, exact-length body)
//! - Keep bytes past the satisfied boundary for the next operation
//!
//! # Design Decisions
//! - A scan offset marks what has been inspected; earlier bytes are never
//!   looked at again. An incomplete trailing token is re-scanned from its own
//!   start once more data arrives.
//! - Bytes are only discarded when an operation completes (`commit`), so token
//!   ranges stay valid for the whole operation.
//! - A zero-length read before the predicate holds is `StreamError::NoData`.

use std::ops::Range;

use bytes::{Buf, Bytes, BytesMut};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::prompt::MARKER;

/// Default number of bytes requested per socket read.
pub const DEFAULT_READ_CHUNK: usize = 1024;

/// Errors raised while reassembling a stream.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("no data received: peer closed the connection early")]
    NoData,

    #[error("malformed stream: {0}")]
    Malformed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StreamError>;

/// Words preceding a decimal key, as found by [`StreamReader::words_before_key`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedWords {
    /// The raw bytes from the first of the `key` words through the last one.
    pub words: Bytes,
    /// The decimal key that ended the scan.
    pub key: u64,
}

/// Per-connection reassembly cursor.
#[derive(Debug)]
pub struct StreamReader<S> {
    inner: S,
    /// Bytes read but not yet consumed by a completed operation.
    buffer: BytesMut,
    /// Offset into `buffer` below which bytes have been inspected.
    scan: usize,
    chunk_size: usize,
    reads: u64,
}

impl<S> StreamReader<S> {
    pub fn new(inner: S) -> Self {
        Self::with_chunk_size(inner, DEFAULT_READ_CHUNK)
    }

    pub fn with_chunk_size(inner: S, chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            inner,
            buffer: BytesMut::with_capacity(chunk_size),
            scan: 0,
            chunk_size,
            reads: 0,
        }
    }

    /// Bytes currently held back for the next operation.
    pub fn buffered(&self) -> &[u8] {
        &self.buffer
    }

    /// Number of reads issued against the underlying stream.
    pub fn reads(&self) -> u64 {
        self.reads
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Drop whatever is still buffered, such as the unread rest of a puzzle
    /// stream. Returns the number of bytes dropped.
    pub fn discard_buffered(&mut self) -> usize {
        let dropped = self.buffer.len();
        if dropped > 0 {
            tracing::debug!(
                bytes = dropped,
                discarded = %String::from_utf8_lossy(&self.buffer),
                "Discarding buffered bytes"
            );
        }
        self.buffer.clear();
        self.scan = 0;
        dropped
    }

    /// Drop everything up to the scan offset.
    fn commit(&mut self) {
        self.buffer.advance(self.scan);
        self.scan = 0;
    }

    /// Split off everything buffered from the scan offset onwards, discarding
    /// the inspected prefix.
    fn take_from_scan(&mut self) -> Bytes {
        let skipped = self.buffer.split_to(self.scan);
        if !skipped.is_empty() {
            tracing::debug!(
                skipped = %String::from_utf8_lossy(&skipped),
                "Discarding text before prompt"
            );
        }
        self.scan = 0;
        self.buffer.split().freeze()
    }
}

impl<S: AsyncRead + Unpin> StreamReader<S> {
    /// Issue one read. Returns the number of new bytes, 0 on peer close.
    async fn fill(&mut self) -> Result<usize> {
        self.buffer.reserve(self.chunk_size);
        let n = self.inner.read_buf(&mut self.buffer).await?;
        self.reads += 1;
        tracing::trace!(bytes = n, buffered = self.buffer.len(), "Read from stream");
        Ok(n)
    }

    async fn fill_or_close(&mut self) -> Result<()> {
        match self.fill().await? {
            0 => Err(StreamError::NoData),
            _ => Ok(()),
        }
    }

    /// Next whitespace-terminated, non-empty token. The returned range is
    /// relative to the buffer and stays valid until `commit`.
    async fn next_token(&mut self) -> Result<Range<usize>> {
        loop {
            while self.scan < self.buffer.len() && is_delimiter(self.buffer[self.scan]) {
                self.scan += 1;
            }

            let start = self.scan;
            if let Some(len) = self.buffer[start..].iter().position(|&b| is_delimiter(b)) {
                self.scan = start + len + 1;
                return Ok(start..start + len);
            }

            self.fill_or_close().await?;
        }
    }

    /// Read words until the sum of their lengths reaches `max_total` and
    /// return the lengths as space-separated decimal text.
    pub async fn word_lengths(&mut self, max_total: usize) -> Result<String> {
        let mut total = 0usize;
        let mut lengths = Vec::new();

        while total < max_total {
            let token = self.next_token().await?;
            total += token.len();
            lengths.push(token.len().to_string());
        }

        self.commit();
        tracing::debug!(words = lengths.len(), total, "Word lengths collected");
        Ok(lengths.join(" "))
    }

    /// Sum numeric tokens by value and other tokens as 1; return the first
    /// non-numeric token seen once the sum exceeds `max_total`.
    pub async fn word_after_sum(&mut self, max_total: u64) -> Result<Bytes> {
        let mut total: u64 = 0;

        loop {
            let token = self.next_token().await?;
            match parse_decimal(&self.buffer[token.clone()]) {
                Some(value) => total = total.saturating_add(value),
                None if total > max_total => {
                    let word = Bytes::copy_from_slice(&self.buffer[token]);
                    self.commit();
                    tracing::debug!(total, word = %String::from_utf8_lossy(&word), "Word after sum found");
                    return Ok(word);
                }
                None => total += 1,
            }
        }
    }

    /// Scan until a decimal token `N` appears and return the `N` words right
    /// before it, exactly as they appeared on the wire.
    pub async fn words_before_key(&mut self) -> Result<KeyedWords> {
        let mut words: Vec<Range<usize>> = Vec::new();

        loop {
            let token = self.next_token().await?;
            let Some(key) = parse_decimal(&self.buffer[token.clone()]) else {
                words.push(token);
                continue;
            };

            let count = usize::try_from(key).unwrap_or(usize::MAX);
            if count > words.len() {
                return Err(StreamError::Malformed(format!(
                    "key {} but only {} words precede it",
                    key,
                    words.len()
                )));
            }

            let tail = match count {
                0 => Bytes::new(),
                _ => {
                    let first = words[words.len() - count].start;
                    let last = words[words.len() - 1].end;
                    Bytes::copy_from_slice(&self.buffer[first..last])
                }
            };

            self.commit();
            tracing::debug!(key, bytes = tail.len(), "Words before key extracted");
            return Ok(KeyedWords { words: tail, key });
        }
    }

    /// Read until a complete line starting with the identifier marker is
    /// buffered. Returns that line and everything buffered after it.
    pub async fn read_prompt(&mut self) -> Result<Bytes> {
        loop {
            while let Some(len) = self.buffer[self.scan..].iter().position(|&b| b == b'\n') {
                if self.buffer[self.scan..].starts_with(MARKER) {
                    return Ok(self.take_from_scan());
                }
                self.scan += len + 1;
            }

            if self.fill().await? == 0 {
                if self.buffer[self.scan..].starts_with(MARKER) {
                    return Ok(self.take_from_scan());
                }
                return Err(StreamError::NoData);
            }
        }
    }

    /// Read an HTTP-style head terminated by an empty line (`\n\n` or
    /// `\n\r\n`). The terminator is consumed; anything after it stays buffered.
    pub async fn read_head(&mut self, max_len: usize) -> Result<Bytes> {
        loop {
            let mut line_start = self.scan;
            while let Some(pos) = self.buffer[line_start..].iter().position(|&b| b == b'\n') {
                let newline = line_start + pos;
                let rest = &self.buffer[newline + 1..];
                let terminator = if rest.starts_with(b"\n") {
                    1
                } else if rest.starts_with(b"\r\n") {
                    2
                } else if rest.is_empty() || rest == b"\r" {
                    break;
                } else {
                    line_start = newline + 1;
                    continue;
                };

                let head = self.buffer.split_to(newline).freeze();
                self.buffer.advance(1 + terminator);
                self.scan = 0;
                return Ok(head);
            }

            self.scan = line_start;
            if self.buffer.len() > max_len {
                return Err(StreamError::Malformed(format!(
                    "head exceeds {} bytes",
                    max_len
                )));
            }
            self.fill_or_close().await?;
        }
    }

    /// Return whatever is buffered, or the result of a single read.
    pub async fn read_available(&mut self) -> Result<Bytes> {
        if self.buffer.is_empty() {
            self.fill_or_close().await?;
        }
        self.scan = 0;
        Ok(self.buffer.split().freeze())
    }

    /// Read a `<decimal>:` length header.
    pub async fn read_length_prefix(&mut self) -> Result<u64> {
        loop {
            if let Some(pos) = self.buffer[self.scan..].iter().position(|&b| b == b':') {
                let end = self.scan + pos;
                let text = std::str::from_utf8(&self.buffer[..end])
                    .map(str::trim)
                    .map_err(|_| StreamError::Malformed("length prefix is not ASCII".into()))?;
                let len = text.parse::<u64>().map_err(|_| {
                    StreamError::Malformed(format!("invalid length prefix {:?}", text))
                })?;

                self.buffer.advance(end + 1);
                self.scan = 0;
                return Ok(len);
            }

            self.scan = self.buffer.len();
            self.fill_or_close().await?;
        }
    }

    /// Feed exactly `len` bytes to `sink` in arrival order, reading as often
    /// as needed. Bytes past `len` stay buffered.
    pub async fn read_exact_with<F>(&mut self, len: u64, mut sink: F) -> Result<()>
    where
        F: FnMut(&[u8]),
    {
        let mut remaining = len;
        self.scan = 0;

        while remaining > 0 {
            if self.buffer.is_empty() {
                self.fill_or_close().await?;
            }

            let take = remaining.min(self.buffer.len() as u64) as usize;
            sink(&self.buffer[..take]);
            self.buffer.advance(take);
            remaining -= take as u64;
        }

        Ok(())
    }
}

impl<S: AsyncWrite + Unpin> StreamReader<S> {
    /// Write all of `bytes` to the underlying stream.
    pub async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes).await?;
        self.inner.flush().await?;
        tracing::debug!(bytes = bytes.len(), "Sent");
        Ok(())
    }
}

fn is_delimiter(b: u8) -> bool {
    b.is_ascii_whitespace()
}

/// Parse an all-digit token, saturating on overflow.
fn parse_decimal(token: &[u8]) -> Option<u64> {
    if token.is_empty() || !token.iter().all(u8::is_ascii_digit) {
        return None;
    }
    Some(token.iter().fold(0u64, |acc, d| {
        acc.saturating_mul(10).saturating_add((d - b'0') as u64)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::testing::ChunkedReader;

    const TEXT: &[u8] = b"lorem ipsum dolor sit amet consectetur adipiscing elit sed do eiusmod tempor ";

    async fn lengths_with_chunk(chunk: usize, max: usize) -> String {
        let mut reader = StreamReader::new(ChunkedReader::new(TEXT, chunk));
        reader.word_lengths(max).await.unwrap()
    }

    #[tokio::test]
    async fn word_lengths_is_chunk_independent() {
        let whole = lengths_with_chunk(TEXT.len(), 40).await;
        assert_eq!(whole, "5 5 5 3 4 11 10");
        for chunk in [1, 2, 3, 7, 13] {
            assert_eq!(lengths_with_chunk(chunk, 40).await, whole, "chunk {}", chunk);
        }
    }

    #[tokio::test]
    async fn word_lengths_keeps_tail() {
        let mut reader = StreamReader::new(ChunkedReader::new(b"ab cd ef gh", 4));
        assert_eq!(reader.word_lengths(4).await.unwrap(), "2 2");
        // "ab c" then "d ef": the second read leaves "ef" behind.
        assert_eq!(&reader.read_available().await.unwrap()[..], b"ef");
        assert_eq!(&reader.read_available().await.unwrap()[..], b" gh");
    }

    #[tokio::test]
    async fn discard_drops_leftover_puzzle_text() {
        let mut reader = StreamReader::new(ChunkedReader::from_chunks([
            &b"ab cd more words"[..],
            b"identifier:next\n",
        ]));
        reader.word_lengths(4).await.unwrap();
        assert_eq!(reader.discard_buffered(), b"more words".len());
        assert_eq!(&reader.read_prompt().await.unwrap()[..], b"identifier:next\n");
    }

    #[tokio::test]
    async fn word_lengths_zero_max_reads_nothing() {
        let mut reader = StreamReader::new(ChunkedReader::new(b"abc ", 1));
        assert_eq!(reader.word_lengths(0).await.unwrap(), "");
        assert_eq!(reader.reads(), 0);
    }

    #[tokio::test]
    async fn word_lengths_fails_on_early_close() {
        let mut reader = StreamReader::new(ChunkedReader::new(b"abc def", 2));
        assert!(matches!(
            reader.word_lengths(100).await.unwrap_err(),
            StreamError::NoData
        ));
    }

    #[tokio::test]
    async fn word_after_sum_vector() {
        let stream = b"1 1 1 1 1 1 1 1 apple ";
        for chunk in [1, 3, stream.len()] {
            let mut reader = StreamReader::new(ChunkedReader::new(stream, chunk));
            assert_eq!(&reader.word_after_sum(7).await.unwrap()[..], b"apple");
        }
    }

    #[tokio::test]
    async fn word_after_sum_counts_words_as_one() {
        // 5 + 3 = 8, "hello" is seen with sum 8 > 7.
        let mut reader = StreamReader::new(ChunkedReader::new(b"5 3 hello 10 world ", 2));
        assert_eq!(&reader.word_after_sum(7).await.unwrap()[..], b"hello");

        // 2 + 1 ("hi") = 3, then 10 → 13, "world" wins.
        let mut reader = StreamReader::new(ChunkedReader::new(b"2 hi 10 world ", 2));
        assert_eq!(&reader.word_after_sum(7).await.unwrap()[..], b"world");
    }

    #[tokio::test]
    async fn words_before_key_boundary() {
        let mut reader = StreamReader::new(ChunkedReader::new(b"one two three 3 tail", 4));
        let found = reader.words_before_key().await.unwrap();
        assert_eq!(found.key, 3);
        assert_eq!(&found.words[..], b"one two three");
    }

    #[tokio::test]
    async fn words_before_key_takes_only_the_tail() {
        let stream = b"Alpha bravo Charlie delta 2 --";
        for chunk in [1, 5, stream.len()] {
            let mut reader = StreamReader::new(ChunkedReader::new(stream, chunk));
            let found = reader.words_before_key().await.unwrap();
            assert_eq!(found.key, 2);
            assert_eq!(&found.words[..], b"Charlie delta");
        }
    }

    #[tokio::test]
    async fn words_before_key_preserves_separators() {
        let mut reader = StreamReader::new(ChunkedReader::new(b"a b\nc  d 3 ", 3));
        let found = reader.words_before_key().await.unwrap();
        assert_eq!(&found.words[..], b"b\nc  d");
    }

    #[tokio::test]
    async fn words_before_key_rejects_oversized_key() {
        let mut reader = StreamReader::new(ChunkedReader::new(b"one two 5 ", 64));
        assert!(matches!(
            reader.words_before_key().await.unwrap_err(),
            StreamError::Malformed(_)
        ));
    }

    #[tokio::test]
    async fn prompt_skips_preceding_lines() {
        let stream = b"welcome\nidentifier:abc123\ninstructions follow";
        for chunk in [1, 4, stream.len()] {
            let mut reader = StreamReader::new(ChunkedReader::new(stream, chunk));
            let prompt = reader.read_prompt().await.unwrap();
            assert!(prompt.starts_with(b"identifier:abc123\n"), "chunk {}", chunk);
        }
    }

    #[tokio::test]
    async fn prompt_accepts_unterminated_marker_at_close() {
        let mut reader = StreamReader::new(ChunkedReader::new(b"identifier:xyz", 3));
        assert_eq!(&reader.read_prompt().await.unwrap()[..], b"identifier:xyz");
    }

    #[tokio::test]
    async fn prompt_without_marker_is_no_data() {
        let mut reader = StreamReader::new(ChunkedReader::new(b"nothing\nhere\n", 3));
        assert!(matches!(
            reader.read_prompt().await.unwrap_err(),
            StreamError::NoData
        ));
    }

    #[tokio::test]
    async fn head_is_split_from_body() {
        let stream = b"POST /submit HTTP/1.1\r\nContent-Length: 4\r\n\r\nbody";
        for chunk in [1, 2, 5, stream.len()] {
            let mut reader = StreamReader::new(ChunkedReader::new(stream, chunk));
            let head = reader.read_head(1024).await.unwrap();
            assert_eq!(&head[..], b"POST /submit HTTP/1.1\r\nContent-Length: 4\r", "chunk {}", chunk);

            let mut body = Vec::new();
            reader.read_exact_with(4, |b| body.extend_from_slice(b)).await.unwrap();
            assert_eq!(body, b"body");
        }
    }

    #[tokio::test]
    async fn head_accepts_bare_newlines() {
        let mut reader = StreamReader::new(ChunkedReader::new(b"GET /a HTTP/1.0\n\n", 3));
        assert_eq!(&reader.read_head(1024).await.unwrap()[..], b"GET /a HTTP/1.0");
    }

    #[tokio::test]
    async fn oversized_head_is_rejected() {
        let mut reader = StreamReader::new(ChunkedReader::new(&[b'x'; 64], 8));
        assert!(matches!(
            reader.read_head(16).await.unwrap_err(),
            StreamError::Malformed(_)
        ));
    }

    #[tokio::test]
    async fn length_prefixed_body() {
        let mut reader = StreamReader::new(ChunkedReader::new(b"5:hello world", 3));
        let len = reader.read_length_prefix().await.unwrap();
        assert_eq!(len, 5);

        let mut body = Vec::new();
        reader.read_exact_with(len, |b| body.extend_from_slice(b)).await.unwrap();
        assert_eq!(body, b"hello");

        let mut rest = Vec::new();
        reader.read_exact_with(6, |b| rest.extend_from_slice(b)).await.unwrap();
        assert_eq!(rest, b" world");
    }

    #[tokio::test]
    async fn zero_length_body_reads_nothing() {
        let mut reader = StreamReader::new(ChunkedReader::new(b"", 1));
        let mut calls = 0;
        reader.read_exact_with(0, |_| calls += 1).await.unwrap();
        assert_eq!(calls, 0);
        assert_eq!(reader.reads(), 0);
    }

    #[tokio::test]
    async fn short_body_is_no_data() {
        let mut reader = StreamReader::new(ChunkedReader::new(b"10:short", 4));
        let len = reader.read_length_prefix().await.unwrap();
        assert!(matches!(
            reader.read_exact_with(len, |_| {}).await.unwrap_err(),
            StreamError::NoData
        ));
    }

    #[tokio::test]
    async fn invalid_length_prefix() {
        let mut reader = StreamReader::new(ChunkedReader::new(b"abc:xyz", 4));
        assert!(matches!(
            reader.read_length_prefix().await.unwrap_err(),
            StreamError::Malformed(_)
        ));
    }

    #[test]
    fn decimal_parsing() {
        assert_eq!(parse_decimal(b"0"), Some(0));
        assert_eq!(parse_decimal(b"1200"), Some(1200));
        assert_eq!(parse_decimal(b"12a"), None);
        assert_eq!(parse_decimal(b"-1"), None);
        assert_eq!(parse_decimal(b"99999999999999999999999"), Some(u64::MAX));
    }
}
