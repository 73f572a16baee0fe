//! # WireFrame
//!
//! A **strict, streaming HTTP/1.1 server core** implemented directly over
//! TCP, with no external HTTP library underneath: an incremental request
//! parser, a case-insensitive header set, an output-side response writer,
//! and a small threaded accept loop tying them together.
//!
//! Parsing is incremental — requests can arrive byte-by-byte or in
//! arbitrarily-sized chunks — and follows RFC 9112, including chunked
//! transfer encoding and trailers.
//!
//! ## Quick start — one-shot parsing
//!
//! ```rust
//! use wireframe::parse_request;
//!
//! let raw = b"GET /hello HTTP/1.1\r\nHost: example.com\r\n\r\n";
//! let request = parse_request(raw).expect("valid request");
//! assert_eq!(request.request_line.method, "GET");
//! assert_eq!(request.request_line.target, "/hello");
//! ```
//!
//! ## Quick start — incremental parsing
//!
//! ```rust
//! use wireframe::{Parser, ParseStatus};
//!
//! let mut parser = Parser::new();
//!
//! let status = parser.feed(b"GET / HTTP/1.1\r\n").unwrap();
//! assert_eq!(status, ParseStatus::Incomplete);
//!
//! let status = parser.feed(b"Host: example.com\r\n\r\n").unwrap();
//! assert!(matches!(status, ParseStatus::Complete(_)));
//!
//! let request = parser.finish().unwrap();
//! assert_eq!(request.request_line.target, "/");
//! ```
//!
//! ## Quick start — writing a response
//!
//! ```rust
//! use wireframe::response::{ResponseHeaders, Writer};
//!
//! let mut out = Vec::new();
//! let mut writer = Writer::new(&mut out);
//! writer.write_status_line(200).unwrap();
//! let mut headers = ResponseHeaders::new();
//! headers.push("Content-Length", "2");
//! writer.write_headers(&headers).unwrap();
//! writer.write_body(b"ok").unwrap();
//! ```

mod error;
mod headers;
mod output;
pub mod request;
pub mod response;
pub mod server;

// Re-export the most commonly used items at the crate root; the richer
// module surfaces (`request`, `response`, `server`) stay reachable for
// callers who need the rest.
pub use error::{ParseError, ResponseError, ServerError};
pub use headers::Headers;
pub use output::{format_debug, format_headers_only, format_json};
pub use request::{ParseStatus, Parser, ParserConfig, Request, RequestLine};

/// Parse a **complete** HTTP request from a byte slice in one call.
///
/// This is a convenience wrapper around [`Parser`]. For incremental /
/// streaming use-cases, create a `Parser` directly; for reading directly
/// off a transport, see [`request::read_request`].
///
/// # Errors
///
/// Returns [`ParseError`] if the data is malformed or incomplete.
pub fn parse_request(data: &[u8]) -> Result<Request, ParseError> {
    let mut parser = Parser::new();
    match parser.feed(data)? {
        ParseStatus::Complete(_) => parser.finish(),
        ParseStatus::Incomplete => Err(ParseError::IncompleteRequest),
    }
}

/// Parse a **complete** HTTP request using custom [`ParserConfig`] limits.
///
/// # Errors
///
/// Returns [`ParseError`] if the data is malformed, incomplete, or
/// exceeds the configured limits.
pub fn parse_request_with_config(data: &[u8], config: ParserConfig) -> Result<Request, ParseError> {
    let mut parser = Parser::with_config(config);
    match parser.feed(data)? {
        ParseStatus::Complete(_) => parser.finish(),
        ParseStatus::Incomplete => Err(ParseError::IncompleteRequest),
    }
}
