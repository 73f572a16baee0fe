//! The TCP accept loop: one thread per connection, parse-then-handle-then-
//! write, built over [`crate::request`] and [`crate::response`] with no
//! external HTTP library underneath it.
//!
//! Grounded in the original Go `internal/server` package's shape (a
//! listener plus a running flag, `Accept` loop spawning a goroutine per
//! connection) — the one deliberate fix relative to that source is the
//! running flag, which is an [`AtomicBool`] here rather than a plain
//! `bool` shared across threads.

use std::io::Write;
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crate::error::ServerError;
use crate::request::{read_request_with_config, ParserConfig, Request};
use crate::response::Writer;

/// Configuration for [`serve`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP port to listen on.
    pub port: u16,
    /// Parser limits applied to every accepted connection. `None` uses
    /// [`ParserConfig::default`].
    pub parser_config: Option<ParserConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 42069,
            parser_config: None,
        }
    }
}

/// A running server, owning its listener and the flag that stops it.
pub struct Server {
    running: Arc<AtomicBool>,
    listener: TcpListener,
}

impl Server {
    /// Bind a listener and spawn the accept loop on a background thread,
    /// dispatching each connection through `handler`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] if binding the listener fails.
    pub fn serve<H>(config: ServerConfig, handler: H) -> Result<Self, ServerError>
    where
        H: Fn(&Request, &mut Writer<&TcpStream>) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind(("0.0.0.0", config.port))?;
        let running = Arc::new(AtomicBool::new(true));
        let handler = Arc::new(handler);
        let parser_config = Arc::new(config.parser_config.unwrap_or_default());

        let accept_listener = listener.try_clone()?;
        let accept_running = Arc::clone(&running);
        thread::spawn(move || listen(accept_listener, accept_running, handler, parser_config));

        Ok(Self { running, listener })
    }

    /// Stop the accept loop and unblock any in-progress `accept()` call.
    pub fn close(&self) {
        self.running.store(false, Ordering::Release);
        // `accept()` on the listener thread is blocked until either a
        // connection arrives or the listener closes; since we hold a
        // clone of the listener rather than the original, connecting to
        // ourselves nudges it to wake up and observe the flag.
        if let Ok(addr) = self.listener.local_addr() {
            let _ = TcpStream::connect(addr);
        }
    }

    /// The address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }
}

fn listen<H>(
    listener: TcpListener,
    running: Arc<AtomicBool>,
    handler: Arc<H>,
    parser_config: Arc<ParserConfig>,
) where
    H: Fn(&Request, &mut Writer<&TcpStream>) + Send + Sync + 'static,
{
    while running.load(Ordering::Acquire) {
        match listener.accept() {
            Ok((stream, addr)) => {
                log::debug!("accepted connection from {addr}");
                let handler = Arc::clone(&handler);
                let parser_config = Arc::clone(&parser_config);
                thread::spawn(move || handle_connection(stream, &handler, &parser_config));
            }
            Err(e) => {
                if running.load(Ordering::Acquire) {
                    log::error!("accept failed: {e}");
                }
            }
        }
    }
}

const BAD_REQUEST_RESPONSE: &[u8] =
    b"HTTP/1.1 400 Bad Request\r\n\r\nMalformed request";

fn handle_connection<H>(stream: TcpStream, handler: &H, parser_config: &ParserConfig)
where
    H: Fn(&Request, &mut Writer<&TcpStream>) + Send + Sync,
{
    let mut reader = &stream;
    match read_request_with_config(&mut reader, parser_config.clone()) {
        Ok(request) => {
            let mut writer = Writer::new(&stream);
            handler(&request, &mut writer);
        }
        Err(e) => {
            log::warn!("rejecting malformed request: {e}");
            let mut out = &stream;
            if let Err(write_err) = out.write_all(BAD_REQUEST_RESPONSE) {
                log::error!("failed to write 400 response: {write_err}");
            }
        }
    }
    // `stream` drops here, closing the socket on every exit path.
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpStream;
    use std::time::Duration;

    fn connect(addr: std::net::SocketAddr) -> TcpStream {
        let stream = TcpStream::connect(addr).unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        stream
    }

    #[test]
    fn serves_a_simple_response() {
        let config = ServerConfig {
            port: 0,
            parser_config: None,
        };
        let server = Server::serve(config, |req, writer| {
            assert_eq!(req.request_line.target, "/");
            writer.write_status_line(200).unwrap();
            let mut headers = crate::response::ResponseHeaders::new();
            headers.push("Content-Length", "2");
            writer.write_headers(&headers).unwrap();
            writer.write_body(b"ok").unwrap();
        })
        .unwrap();

        let addr = server.local_addr().unwrap();
        let mut stream = connect(addr);
        stream
            .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .unwrap();

        let mut response = Vec::new();
        stream.read_to_end(&mut response).unwrap();
        assert_eq!(
            String::from_utf8(response).unwrap(),
            "HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok"
        );

        server.close();
    }

    #[test]
    fn malformed_request_gets_400() {
        let config = ServerConfig {
            port: 0,
            parser_config: None,
        };
        let server = Server::serve(config, |_req, _writer| {
            panic!("handler should not run for a malformed request");
        })
        .unwrap();

        let addr = server.local_addr().unwrap();
        let mut stream = connect(addr);
        stream.write_all(b"not a real request\r\n\r\n").unwrap();

        let mut response = Vec::new();
        stream.read_to_end(&mut response).unwrap();
        assert_eq!(
            String::from_utf8(response).unwrap(),
            "HTTP/1.1 400 Bad Request\r\n\r\nMalformed request"
        );

        server.close();
    }
}
