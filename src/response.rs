//! The outbound half of the protocol: an `HTTP/1.1` response writer built
//! as a state machine over any [`std::io::Write`], mirroring the shape of
//! the request [`crate::request::Parser`] on the other side of the wire.

use std::io::Write;

use crate::error::ResponseError;

/// An ordered, case-preserving list of header (or trailer) fields.
///
/// Unlike [`crate::headers::Headers`] on the request side, this does not
/// lowercase keys or fold duplicates — the caller controls exactly what
/// bytes go on the wire, in the order given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeaders {
    entries: Vec<(String, String)>,
}

impl ResponseHeaders {
    /// An empty header list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header field, preserving insertion order. Does not fold
    /// duplicate names — callers wanting that must fold before inserting.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.entries.push((name.into(), value.into()));
        self
    }

    /// True when no fields have been added.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for ResponseHeaders {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// The minimal header set a response needs when the caller supplies none:
/// `Content-Length`, `Connection: close`, `Content-Type: text/plain`.
pub fn get_default_headers(content_length: usize) -> ResponseHeaders {
    let mut h = ResponseHeaders::new();
    h.push("Content-Length", content_length.to_string())
        .push("Connection", "close")
        .push("Content-Type", "text/plain");
    h
}

/// Reason phrase for a known status code. Unknown codes get no dedicated
/// phrase — [`Writer::write_status_line`] falls back to the literal
/// placeholder line the status line format uses for them.
fn reason_phrase(code: u16) -> Option<&'static str> {
    match code {
        200 => Some("OK"),
        400 => Some("Bad Request"),
        500 => Some("Internal Server Error"),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    StatusPending,
    StatusWritten,
    HeadersWritten,
    BodyStreaming,
    BodyComplete,
    Complete,
}

/// An output-side HTTP/1.1 state machine: status line, then headers, then
/// either one fixed-length body or a stream of chunks, then (for the
/// chunked path) trailers.
///
/// Operations invoked out of turn return [`ResponseError::OutOfOrderWrite`]
/// rather than silently producing malformed output.
pub struct Writer<W: Write> {
    out: W,
    state: WriterState,
}

impl<W: Write> Writer<W> {
    /// Wrap a byte sink in a fresh writer, ready to emit a status line.
    pub fn new(out: W) -> Self {
        Self {
            out,
            state: WriterState::StatusPending,
        }
    }

    /// Write `HTTP/1.1 <code> <reason>\r\n`. Known codes (200, 400, 500)
    /// get their standard reason phrase; any other code gets the literal
    /// `HTTP/1.1 XXX \r\n` placeholder line.
    pub fn write_status_line(&mut self, code: u16) -> Result<(), ResponseError> {
        if self.state != WriterState::StatusPending {
            return Err(ResponseError::OutOfOrderWrite);
        }
        match reason_phrase(code) {
            Some(reason) => write!(self.out, "HTTP/1.1 {code} {reason}\r\n")?,
            None => write!(self.out, "HTTP/1.1 XXX \r\n")?,
        }
        self.state = WriterState::StatusWritten;
        Ok(())
    }

    /// Write the header block and the blank line that terminates it.
    ///
    /// An empty `headers` is replaced with `get_default_headers(0)`-shaped
    /// defaults rather than emitting a bare blank line.
    pub fn write_headers(&mut self, headers: &ResponseHeaders) -> Result<(), ResponseError> {
        if self.state != WriterState::StatusWritten {
            return Err(ResponseError::OutOfOrderWrite);
        }
        if headers.is_empty() {
            let defaults = get_default_headers(0);
            for (name, value) in defaults.iter() {
                write!(self.out, "{name}: {value}\r\n")?;
            }
        } else {
            for (name, value) in headers.iter() {
                write!(self.out, "{name}: {value}\r\n")?;
            }
        }
        write!(self.out, "\r\n")?;
        self.state = WriterState::HeadersWritten;
        Ok(())
    }

    /// Write a complete fixed-length body in one call.
    pub fn write_body(&mut self, body: &[u8]) -> Result<(), ResponseError> {
        if self.state != WriterState::HeadersWritten {
            return Err(ResponseError::OutOfOrderWrite);
        }
        self.out.write_all(body)?;
        self.state = WriterState::BodyComplete;
        Ok(())
    }

    /// Write one chunk of a chunked body: `<hex-len>\r\n<bytes>\r\n`.
    /// A zero-length chunk is a no-op — use [`Writer::write_chunked_body_done`]
    /// or [`Writer::finish`] to terminate the body.
    pub fn write_chunked_body(&mut self, chunk: &[u8]) -> Result<(), ResponseError> {
        match self.state {
            WriterState::HeadersWritten | WriterState::BodyStreaming => {}
            _ => return Err(ResponseError::OutOfOrderWrite),
        }
        if !chunk.is_empty() {
            write!(self.out, "{:x}\r\n", chunk.len())?;
            self.out.write_all(chunk)?;
            write!(self.out, "\r\n")?;
        }
        self.state = WriterState::BodyStreaming;
        Ok(())
    }

    /// Write the terminating `0\r\n` chunk, without trailers.
    ///
    /// Does not touch any `Content-Length` header written earlier — the
    /// writer's own state machine already guarantees a response reaches
    /// either the fixed-length or the chunked path, never both, so there
    /// is nothing to reconcile here.
    pub fn write_chunked_body_done(&mut self) -> Result<(), ResponseError> {
        match self.state {
            WriterState::BodyStreaming => {}
            _ => return Err(ResponseError::OutOfOrderWrite),
        }
        write!(self.out, "0\r\n")?;
        self.state = WriterState::BodyComplete;
        Ok(())
    }

    /// Write a trailer block plus its terminating blank line. Only valid
    /// after the chunked body has been terminated.
    pub fn write_trailers(&mut self, trailers: &ResponseHeaders) -> Result<(), ResponseError> {
        if self.state != WriterState::BodyComplete {
            return Err(ResponseError::OutOfOrderWrite);
        }
        for (name, value) in trailers.iter() {
            write!(self.out, "{name}: {value}\r\n")?;
        }
        write!(self.out, "\r\n")?;
        self.state = WriterState::Complete;
        Ok(())
    }

    /// Terminate a chunked body and its trailers in one call: `0\r\n`
    /// followed by the trailer block (or a bare `\r\n` for empty
    /// trailers). Built from [`Writer::write_chunked_body_done`] and
    /// [`Writer::write_trailers`], kept available separately since both
    /// are independently useful primitives.
    pub fn finish(&mut self, trailers: &ResponseHeaders) -> Result<(), ResponseError> {
        self.write_chunked_body_done()?;
        self.write_trailers(trailers)
    }

    /// True once the response is fully written (fixed body or
    /// chunked body + trailers).
    pub fn is_complete(&self) -> bool {
        matches!(self.state, WriterState::BodyComplete | WriterState::Complete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_body_round_trip() {
        let mut buf = Vec::new();
        let mut w = Writer::new(&mut buf);
        w.write_status_line(200).unwrap();
        let mut headers = ResponseHeaders::new();
        headers.push("Content-Length", "5").push("Content-Type", "text/plain");
        w.write_headers(&headers).unwrap();
        w.write_body(b"hello").unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "HTTP/1.1 200 OK\r\nContent-Length: 5\r\nContent-Type: text/plain\r\n\r\nhello"
        );
    }

    #[test]
    fn unknown_status_code_uses_placeholder_line() {
        let mut buf = Vec::new();
        let mut w = Writer::new(&mut buf);
        w.write_status_line(404).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "HTTP/1.1 XXX \r\n");
    }

    #[test]
    fn empty_headers_substitute_defaults() {
        let mut buf = Vec::new();
        let mut w = Writer::new(&mut buf);
        w.write_status_line(400).unwrap();
        w.write_headers(&ResponseHeaders::new()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Content-Length: 0\r\n"));
        assert!(text.contains("Connection: close\r\n"));
        assert!(text.contains("Content-Type: text/plain\r\n"));
    }

    #[test]
    fn chunked_body_with_trailers() {
        let mut buf = Vec::new();
        let mut w = Writer::new(&mut buf);
        w.write_status_line(200).unwrap();
        w.write_headers(&ResponseHeaders::new()).unwrap();
        w.write_chunked_body(b"Hello").unwrap();
        w.write_chunked_body(b" World").unwrap();
        let mut trailers = ResponseHeaders::new();
        trailers.push("X-Checksum", "deadbeef");
        w.finish(&trailers).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert!(text.ends_with("5\r\nHello\r\n6\r\n World\r\n0\r\nX-Checksum: deadbeef\r\n\r\n"));
        assert!(w.is_complete());
    }

    #[test]
    fn empty_chunk_is_a_no_op() {
        let mut buf = Vec::new();
        let mut w = Writer::new(&mut buf);
        w.write_status_line(200).unwrap();
        w.write_headers(&ResponseHeaders::new()).unwrap();
        w.write_chunked_body(b"").unwrap();
        w.finish(&ResponseHeaders::new()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.ends_with("0\r\n\r\n"));
        assert!(!text.contains("0\r\n\r\n0\r\n"));
    }

    #[test]
    fn out_of_order_body_before_headers_is_rejected() {
        let mut buf = Vec::new();
        let mut w = Writer::new(&mut buf);
        w.write_status_line(200).unwrap();
        assert!(matches!(
            w.write_body(b"oops"),
            Err(ResponseError::OutOfOrderWrite)
        ));
    }

    #[test]
    fn out_of_order_headers_before_status_is_rejected() {
        let mut buf = Vec::new();
        let mut w = Writer::new(&mut buf);
        assert!(matches!(
            w.write_headers(&ResponseHeaders::new()),
            Err(ResponseError::OutOfOrderWrite)
        ));
    }

    #[test]
    fn write_trailers_requires_chunked_body_complete() {
        let mut buf = Vec::new();
        let mut w = Writer::new(&mut buf);
        w.write_status_line(200).unwrap();
        w.write_headers(&ResponseHeaders::new()).unwrap();
        assert!(matches!(
            w.write_trailers(&ResponseHeaders::new()),
            Err(ResponseError::OutOfOrderWrite)
        ));
    }
}
