use std::fmt;

/// Errors that can occur during HTTP request parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// EOF was observed from the transport before the parser reached `Done`.
    IncompleteRequest,
    /// The request line did not split into exactly three space-separated tokens.
    MalformedRequestLine,
    /// The method token contained a byte outside `A`..=`Z`.
    InvalidMethod,
    /// The version token was not the literal `HTTP/1.1`.
    UnsupportedVersion,
    /// A header line had no colon, or whitespace between the field name and colon.
    MalformedHeader,
    /// A header field name contained a byte outside the `tchar` token set.
    IllegalFieldNameChar,
    /// `content-length` was present but not a valid non-negative integer.
    BadContentLength,
    /// More body bytes arrived than `content-length` declared.
    BodyLongerThanContentLength,
    /// A chunk-size line was not valid hexadecimal.
    InvalidChunkSize,
    /// A header field name or value exceeded the configured maximum size.
    HeaderTooLarge,
    /// The number of header fields exceeded the configured maximum.
    TooManyHeaders,
    /// The request-target exceeded the configured maximum length.
    UriTooLong,
    /// The request or chunked body exceeded the configured maximum size.
    BodyTooLarge,
    /// `parse` was invoked again after the parser had already reached `Done`.
    ParseAfterDone,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IncompleteRequest => write!(f, "incomplete HTTP request"),
            Self::MalformedRequestLine => write!(f, "malformed request line"),
            Self::InvalidMethod => write!(f, "invalid HTTP method"),
            Self::UnsupportedVersion => write!(f, "unsupported HTTP version"),
            Self::MalformedHeader => write!(f, "malformed header line"),
            Self::IllegalFieldNameChar => write!(f, "illegal character in header field name"),
            Self::BadContentLength => write!(f, "invalid Content-Length"),
            Self::BodyLongerThanContentLength => write!(f, "body longer than Content-Length"),
            Self::InvalidChunkSize => write!(f, "invalid chunk size"),
            Self::HeaderTooLarge => write!(f, "header exceeds maximum allowed size"),
            Self::TooManyHeaders => write!(f, "number of headers exceeds maximum"),
            Self::UriTooLong => write!(f, "request target exceeds maximum allowed length"),
            Self::BodyTooLarge => write!(f, "body exceeds maximum allowed size"),
            Self::ParseAfterDone => write!(f, "parse called after request was already complete"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Errors raised by the [`crate::response::Writer`] state machine.
///
/// Out-of-order writes are a programming error rather than a recoverable
/// wire-level condition, so `thiserror` is used here rather than
/// hand-writing `Display` a second time in this module.
#[derive(Debug, thiserror::Error)]
pub enum ResponseError {
    /// A writer operation was invoked while the writer was in a state that
    /// does not permit it (e.g. writing a body before the status line).
    #[error("response writer operation invoked out of order")]
    OutOfOrderWrite,
    /// The underlying transport failed while writing.
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the TCP accept loop and per-connection transport.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Binding the listener, or a read/write on an accepted connection, failed.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
}
