//! The incremental HTTP/1.1 request parser.
//!
//! [`Parser`] drives a `RequestLine -> Headers -> Body -> Done` state
//! machine as bytes arrive. It does not itself own a growable buffer or
//! read from a transport — see [`read_request`] for the boundary adapter
//! that does, matching the split between "protocol engine" and "thin
//! surrounding driver" this crate is built around.

use std::io::Read;

use crate::error::ParseError;
use crate::headers::Headers;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configurable resource limits for the request parser, guarding against
/// unbounded memory growth from a slow or hostile peer.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Maximum length of the method token (default: 16).
    pub max_method_len: usize,
    /// Maximum length of the request-target (default: 8192).
    pub max_uri_len: usize,
    /// Maximum length of a single header field name (default: 256).
    pub max_header_name_len: usize,
    /// Maximum length of a single header field value (default: 8192).
    pub max_header_value_len: usize,
    /// Maximum number of header fields, request headers and trailers each (default: 128).
    pub max_headers_count: usize,
    /// Maximum body size, fixed-length or chunked (default: 10 MiB).
    pub max_body_size: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_method_len: 16,
            max_uri_len: 8_192,
            max_header_name_len: 256,
            max_header_value_len: 8_192,
            max_headers_count: 128,
            max_body_size: 10 * 1024 * 1024,
        }
    }
}

// ---------------------------------------------------------------------------
// Public data model
// ---------------------------------------------------------------------------

/// The parsed first line of an HTTP/1.1 request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    /// Uppercase ASCII method token (not restricted to a fixed method set —
    /// the only invariant is that every byte is `A..=Z`, so extension
    /// methods beyond the standard registry are accepted).
    pub method: String,
    /// Opaque origin-form request target; not further parsed.
    pub target: String,
    /// The numeric portion after `/` in the version token. Always `"1.1"`;
    /// any other version is rejected during parsing.
    pub http_version: String,
}

/// A fully parsed HTTP/1.1 request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// The parsed request line.
    pub request_line: RequestLine,
    /// Request headers, case-insensitive, comma-folded.
    pub headers: Headers,
    /// The request body. Empty unless a positive `content-length` was
    /// declared, or a chunked body transferred non-empty chunks.
    pub body: Vec<u8>,
    /// Trailers delivered after the final chunk of a chunked body. Empty
    /// for fixed-length or absent bodies.
    pub trailers: Headers,
}

impl Request {
    /// Case-insensitive header lookup.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Split a folded header value back into its comma-separated parts.
    ///
    /// Comma-folding is lossy by construction: a value that legitimately
    /// contains `", "` cannot be told apart from two folded values. This is
    /// a convenience reconstruction, not a guarantee.
    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers
            .get(name)
            .map(|v| v.split(", ").collect())
            .unwrap_or_default()
    }

    /// Parse the `content-length` header, if present.
    pub fn content_length(&self) -> Option<usize> {
        self.headers.content_length().ok().flatten()
    }

    /// True if the body was received via chunked transfer encoding.
    pub fn is_chunked(&self) -> bool {
        self.headers.is_chunked()
    }

    /// The body as a UTF-8 `&str`, if it is valid UTF-8.
    pub fn body_as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }
}

// ---------------------------------------------------------------------------
// Parse status
// ---------------------------------------------------------------------------

/// Outcome of a [`Parser::feed`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStatus {
    /// The parser has consumed a complete HTTP request. The contained
    /// value is the total number of bytes consumed so far.
    Complete(usize),
    /// The parser needs more data before the request is complete.
    Incomplete,
}

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    RequestLine,
    Headers,
    Body,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyMode {
    Fixed,
    Chunked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkPhase {
    Size,
    Data,
    DataCrlf,
    Trailers,
}

/// An incremental, state-machine-based HTTP/1.1 request parser.
///
/// `Parser` does not read from a transport itself: feed it whatever bytes
/// you have, in whatever sizes arrive, and it tells you how many it
/// consumed. See [`read_request`] for a ready-made driver over
/// [`std::io::Read`].
pub struct Parser {
    state: State,
    config: ParserConfig,
    bytes_consumed: usize,

    method: Option<String>,
    target: Option<String>,
    http_version: Option<String>,
    headers: Headers,
    header_count: usize,

    body: Vec<u8>,
    body_mode: Option<BodyMode>,
    fixed_length: usize,
    chunk_phase: ChunkPhase,
    chunk_remaining: usize,
    trailers: Headers,
}

impl Parser {
    /// Create a new parser with default configuration.
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }

    /// Create a new parser with custom limits.
    pub fn with_config(config: ParserConfig) -> Self {
        Self {
            state: State::RequestLine,
            config,
            bytes_consumed: 0,
            method: None,
            target: None,
            http_version: None,
            headers: Headers::new(),
            header_count: 0,
            body: Vec::new(),
            body_mode: None,
            fixed_length: 0,
            chunk_phase: ChunkPhase::Size,
            chunk_remaining: 0,
            trailers: Headers::new(),
        }
    }

    /// Reset the parser so it can be reused for another request.
    pub fn reset(&mut self) {
        *self = Self::with_config(std::mem::take(&mut self.config));
    }

    /// Feed bytes into the parser.
    ///
    /// `data` should be the *entire* currently unconsumed buffer, not just
    /// the newly arrived bytes — the caller (see [`read_request`]) is
    /// expected to own a growable buffer and shift off consumed bytes
    /// between calls.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] on any protocol violation or configured
    /// limit breach.
    pub fn feed(&mut self, data: &[u8]) -> Result<ParseStatus, ParseError> {
        let mut total = 0;
        while total < data.len() && self.state != State::Done {
            let n = self.parse_single(&data[total..])?;
            if n == 0 {
                break;
            }
            total += n;
            self.bytes_consumed += n;
        }
        if self.state == State::Done {
            Ok(ParseStatus::Complete(self.bytes_consumed))
        } else {
            Ok(ParseStatus::Incomplete)
        }
    }

    fn parse_single(&mut self, data: &[u8]) -> Result<usize, ParseError> {
        match self.state {
            State::RequestLine => self.parse_request_line(data),
            State::Headers => self.parse_headers(data),
            State::Body => self.parse_body(data),
            State::Done => Err(ParseError::ParseAfterDone),
        }
    }

    // ----- request line ----------------------------------------------------

    fn parse_request_line(&mut self, data: &[u8]) -> Result<usize, ParseError> {
        let Some(idx) = find_crlf(data) else {
            let guard = self.config.max_method_len + self.config.max_uri_len + 32;
            if data.len() > guard {
                return Err(ParseError::UriTooLong);
            }
            return Ok(0);
        };

        let line = &data[..idx];
        let parts: Vec<&[u8]> = line.split(|&b| b == b' ').collect();
        if parts.len() != 3 {
            return Err(ParseError::MalformedRequestLine);
        }

        let method = parts[0];
        let target = parts[1];
        let version = parts[2];

        if method.is_empty() || method.len() > self.config.max_method_len {
            return Err(ParseError::InvalidMethod);
        }
        if !method.iter().all(|&b| b.is_ascii_uppercase()) {
            return Err(ParseError::InvalidMethod);
        }

        if target.len() > self.config.max_uri_len {
            return Err(ParseError::UriTooLong);
        }

        if version != b"HTTP/1.1" {
            return Err(ParseError::UnsupportedVersion);
        }

        self.method = Some(String::from_utf8_lossy(method).into_owned());
        self.target = Some(String::from_utf8_lossy(target).into_owned());
        self.http_version = Some("1.1".to_string());
        self.state = State::Headers;

        Ok(idx + 2)
    }

    // ----- headers -----------------------------------------------------------

    fn parse_headers(&mut self, data: &[u8]) -> Result<usize, ParseError> {
        let guard = self.config.max_header_name_len + self.config.max_header_value_len + 32;
        if find_crlf(data).is_none() {
            if data.len() > guard {
                return Err(ParseError::HeaderTooLarge);
            }
            return Ok(0);
        }

        let (consumed, done) = self.headers.parse(data)?;
        if consumed == 0 {
            return Ok(0);
        }

        if done {
            self.enter_body()?;
            return Ok(consumed);
        }

        self.header_count += 1;
        if self.header_count > self.config.max_headers_count {
            return Err(ParseError::TooManyHeaders);
        }
        check_header_line_limits(&data[..consumed - 2], &self.config)?;

        Ok(consumed)
    }

    /// Inspect parsed headers to decide how to read the body.
    ///
    /// Transfer-Encoding takes precedence over Content-Length (RFC 9112 §6.1).
    fn enter_body(&mut self) -> Result<(), ParseError> {
        if self.headers.is_chunked() {
            self.body_mode = Some(BodyMode::Chunked);
            self.chunk_phase = ChunkPhase::Size;
            self.state = State::Body;
            return Ok(());
        }

        match self.headers.content_length()? {
            None | Some(0) => {
                self.state = State::Done;
            }
            Some(length) => {
                if length > self.config.max_body_size {
                    return Err(ParseError::BodyTooLarge);
                }
                self.fixed_length = length;
                self.body.reserve(length.min(65_536));
                self.body_mode = Some(BodyMode::Fixed);
                self.state = State::Body;
            }
        }
        Ok(())
    }

    // ----- body --------------------------------------------------------------

    fn parse_body(&mut self, data: &[u8]) -> Result<usize, ParseError> {
        match self.body_mode {
            Some(BodyMode::Fixed) => self.parse_fixed_body(data),
            Some(BodyMode::Chunked) => self.parse_chunked_body(data),
            None => unreachable!("Body state entered without a body mode"),
        }
    }

    fn parse_fixed_body(&mut self, data: &[u8]) -> Result<usize, ParseError> {
        if data.is_empty() {
            return Ok(0);
        }
        if self.body.len() + data.len() > self.config.max_body_size {
            return Err(ParseError::BodyTooLarge);
        }
        self.body.extend_from_slice(data);
        if self.body.len() > self.fixed_length {
            return Err(ParseError::BodyLongerThanContentLength);
        }
        if self.body.len() == self.fixed_length {
            self.state = State::Done;
        }
        Ok(data.len())
    }

    fn parse_chunked_body(&mut self, data: &[u8]) -> Result<usize, ParseError> {
        match self.chunk_phase {
            ChunkPhase::Size => self.parse_chunk_size_line(data),
            ChunkPhase::Data => self.parse_chunk_data(data),
            ChunkPhase::DataCrlf => self.parse_chunk_data_crlf(data),
            ChunkPhase::Trailers => self.parse_trailers(data),
        }
    }

    fn parse_chunk_size_line(&mut self, data: &[u8]) -> Result<usize, ParseError> {
        let Some(idx) = find_crlf(data) else {
            if data.len() > 4096 {
                return Err(ParseError::InvalidChunkSize);
            }
            return Ok(0);
        };

        let mut line = &data[..idx];
        if let Some(semi) = line.iter().position(|&b| b == b';') {
            line = &line[..semi]; // RFC 9112 §7.1.1: ignore chunk extensions.
        }
        if line.is_empty() {
            return Err(ParseError::InvalidChunkSize);
        }
        let size_str =
            std::str::from_utf8(line).map_err(|_| ParseError::InvalidChunkSize)?;
        let size = usize::from_str_radix(size_str.trim(), 16)
            .map_err(|_| ParseError::InvalidChunkSize)?;

        if self.body.len() + size > self.config.max_body_size {
            return Err(ParseError::BodyTooLarge);
        }

        self.chunk_remaining = size;
        self.chunk_phase = if size == 0 {
            ChunkPhase::Trailers
        } else {
            ChunkPhase::Data
        };

        Ok(idx + 2)
    }

    fn parse_chunk_data(&mut self, data: &[u8]) -> Result<usize, ParseError> {
        if data.is_empty() {
            return Ok(0);
        }
        let to_copy = data.len().min(self.chunk_remaining);
        if self.body.len() + to_copy > self.config.max_body_size {
            return Err(ParseError::BodyTooLarge);
        }
        self.body.extend_from_slice(&data[..to_copy]);
        self.chunk_remaining -= to_copy;
        if self.chunk_remaining == 0 {
            self.chunk_phase = ChunkPhase::DataCrlf;
        }
        Ok(to_copy)
    }

    fn parse_chunk_data_crlf(&mut self, data: &[u8]) -> Result<usize, ParseError> {
        if data.len() < 2 {
            return Ok(0);
        }
        if &data[..2] != b"\r\n" {
            return Err(ParseError::InvalidChunkSize);
        }
        self.chunk_phase = ChunkPhase::Size;
        Ok(2)
    }

    fn parse_trailers(&mut self, data: &[u8]) -> Result<usize, ParseError> {
        let guard = self.config.max_header_name_len + self.config.max_header_value_len + 32;
        if find_crlf(data).is_none() {
            if data.len() > guard {
                return Err(ParseError::HeaderTooLarge);
            }
            return Ok(0);
        }

        let (consumed, done) = self.trailers.parse(data)?;
        if consumed == 0 {
            return Ok(0);
        }
        if done {
            self.state = State::Done;
            return Ok(consumed);
        }
        if self.trailers.len() > self.config.max_headers_count {
            return Err(ParseError::TooManyHeaders);
        }
        check_header_line_limits(&data[..consumed - 2], &self.config)?;
        Ok(consumed)
    }

    // ----- finalization --------------------------------------------------------

    /// Consume the parser and return the fully parsed [`Request`].
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::IncompleteRequest`] if the parser has not yet
    /// reached the `Done` state.
    pub fn finish(self) -> Result<Request, ParseError> {
        if self.state != State::Done {
            return Err(ParseError::IncompleteRequest);
        }
        Ok(Request {
            request_line: RequestLine {
                method: self.method.ok_or(ParseError::IncompleteRequest)?,
                target: self.target.ok_or(ParseError::IncompleteRequest)?,
                http_version: self.http_version.ok_or(ParseError::IncompleteRequest)?,
            },
            headers: self.headers,
            body: self.body,
            trailers: self.trailers,
        })
    }

    /// True once a complete request has been parsed.
    pub fn is_complete(&self) -> bool {
        self.state == State::Done
    }

    /// Total bytes consumed across all `feed` calls.
    pub fn bytes_consumed(&self) -> usize {
        self.bytes_consumed
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

fn check_header_line_limits(line: &[u8], config: &ParserConfig) -> Result<(), ParseError> {
    if let Some(colon) = line.iter().position(|&b| b == b':') {
        if line[..colon].len() > config.max_header_name_len {
            return Err(ParseError::HeaderTooLarge);
        }
        if line[colon + 1..].len() > config.max_header_value_len {
            return Err(ParseError::HeaderTooLarge);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Boundary adapter: read a complete request from a byte source
// ---------------------------------------------------------------------------

/// Errors surfaced by [`read_request`]: either a protocol violation from
/// the parser, or a transport failure reading from the source.
#[derive(Debug)]
pub enum RequestError {
    /// The parser rejected the request.
    Parse(ParseError),
    /// Reading from the underlying transport failed.
    Transport(std::io::Error),
}

impl std::fmt::Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "{e}"),
            Self::Transport(e) => write!(f, "transport error: {e}"),
        }
    }
}

impl std::error::Error for RequestError {}

impl From<ParseError> for RequestError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

const INITIAL_BUFFER_SIZE: usize = 8;

/// Read one complete HTTP/1.1 request from `source`, growing an internal
/// buffer (doubling from 8 bytes) as needed and tolerating arbitrarily
/// slow, arbitrarily small reads.
///
/// This is the "boundary adapter" between a transport and [`Parser`]:
/// it owns the growable buffer the parser itself does not.
///
/// # Errors
///
/// Returns [`RequestError::Transport`] on I/O failure, or
/// [`RequestError::Parse`] (wrapping [`ParseError::IncompleteRequest`]) if
/// EOF is reached before the request is complete.
pub fn read_request<R: Read>(source: &mut R) -> Result<Request, RequestError> {
    read_request_with_config(source, ParserConfig::default())
}

/// Like [`read_request`] but with caller-supplied parser limits.
pub fn read_request_with_config<R: Read>(
    source: &mut R,
    config: ParserConfig,
) -> Result<Request, RequestError> {
    let mut parser = Parser::with_config(config);
    let mut buf = vec![0u8; INITIAL_BUFFER_SIZE];
    let mut read_to = 0usize;
    let mut consumed_before = 0usize;

    loop {
        if parser.is_complete() {
            break;
        }

        if read_to >= buf.len() {
            buf.resize(buf.len() * 2, 0);
        }

        let n = source
            .read(&mut buf[read_to..])
            .map_err(RequestError::Transport)?;

        if n == 0 {
            if !parser.is_complete() {
                return Err(RequestError::Parse(ParseError::IncompleteRequest));
            }
            break;
        }
        read_to += n;

        let status = parser.feed(&buf[..read_to])?;

        // `bytes_consumed` is cumulative across the parser's lifetime; the
        // amount relevant to this buffer is the delta since the last round.
        let consumed_this_round = parser.bytes_consumed() - consumed_before;
        consumed_before = parser.bytes_consumed();

        buf.copy_within(consumed_this_round..read_to, 0);
        read_to -= consumed_this_round;

        if let ParseStatus::Complete(_) = status {
            break;
        }
    }

    parser.finish().map_err(RequestError::from)
}
