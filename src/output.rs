//! Formatting a parsed [`Request`] for the CLI: JSON, human debug text, or
//! a headers-only rendering.

use serde::{Serialize, Serializer};

use crate::headers::Headers;
use crate::request::{Request, RequestLine};

/// A JSON-serializable view of a parsed request. Kept separate from
/// [`Request`] itself so the wire-facing parser types don't need to carry
/// `serde` derives for a concern only the CLI cares about.
#[derive(Serialize)]
struct HttpRequestView<'a> {
    method: &'a str,
    uri: &'a str,
    version: String,
    headers: Vec<(&'a str, &'a str)>,
    #[serde(serialize_with = "serialize_body")]
    body: &'a [u8],
    #[serde(skip_serializing_if = "Headers::is_empty")]
    trailers: &'a Headers,
}

fn serialize_body<S: Serializer>(body: &&[u8], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&String::from_utf8_lossy(body))
}

impl<'a> From<&'a Request> for HttpRequestView<'a> {
    fn from(request: &'a Request) -> Self {
        let RequestLine {
            method,
            target,
            http_version,
        } = &request.request_line;
        Self {
            method,
            uri: target,
            version: format!("HTTP/{http_version}"),
            headers: request.headers.iter().collect(),
            body: &request.body,
            trailers: &request.trailers,
        }
    }
}

/// Serialize a [`Request`] to a JSON string.
///
/// When `pretty` is `true` the output is indented for readability.
pub fn format_json(request: &Request, pretty: bool) -> String {
    let view = HttpRequestView::from(request);
    if pretty {
        serde_json::to_string_pretty(&view).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    } else {
        serde_json::to_string(&view).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }
}

/// Render a [`Request`] in a human-readable debug format.
pub fn format_debug(request: &Request) -> String {
    let mut out = String::with_capacity(256);

    out.push_str("=== HTTP Request ===\n");
    out.push_str(&format!("Method:  {}\n", request.request_line.method));
    out.push_str(&format!("URI:     {}\n", request.request_line.target));
    out.push_str(&format!("Version: HTTP/{}\n", request.request_line.http_version));

    out.push_str(&format!("\n--- Headers ({}) ---\n", request.headers.len()));
    for (name, value) in request.headers.iter() {
        out.push_str(&format!("  {name}: {value}\n"));
    }

    if request.body.is_empty() {
        out.push_str("\n--- No Body ---\n");
    } else {
        out.push_str(&format!("\n--- Body ({} bytes) ---\n", request.body.len()));
        match std::str::from_utf8(&request.body) {
            Ok(s) => out.push_str(s),
            Err(_) => out.push_str(&format!("<binary data: {} bytes>", request.body.len())),
        }
        out.push('\n');
    }

    if !request.trailers.is_empty() {
        out.push_str(&format!("\n--- Trailers ({}) ---\n", request.trailers.len()));
        for (name, value) in request.trailers.iter() {
            out.push_str(&format!("  {name}: {value}\n"));
        }
    }

    out.push_str("====================\n");
    out
}

/// Render only the request line and headers (no body).
pub fn format_headers_only(request: &Request) -> String {
    let mut out = String::with_capacity(64 + request.headers.len() * 40);

    out.push_str(&format!(
        "{} {} HTTP/{}\n",
        request.request_line.method, request.request_line.target, request.request_line.http_version
    ));

    for (name, value) in request.headers.iter() {
        out.push_str(&format!("{name}: {value}\n"));
    }

    out
}
