//! A minimal demo server built on [`wireframe::server`].
//!
//! Mirrors the original Go `cmd/httpserver` entry point: bind a port, log
//! startup, run until interrupted, log shutdown.

use std::net::TcpStream;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser as ClapParser;

use wireframe::response::{get_default_headers, ResponseHeaders, Writer};
use wireframe::server::{Server, ServerConfig};
use wireframe::Request;

/// wireframe-httpd — demo HTTP/1.1 server built on the wireframe crate.
#[derive(ClapParser)]
#[command(name = "wireframe-httpd", version, about, long_about = None)]
struct Cli {
    /// TCP port to listen on.
    #[arg(short, long, default_value = "42069")]
    port: u16,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let config = ServerConfig {
        port: cli.port,
        parser_config: None,
    };

    let server = match Server::serve(config, handle) {
        Ok(server) => server,
        Err(e) => {
            log::error!("failed to start server: {e}");
            process::exit(1);
        }
    };

    let addr = server.local_addr().expect("bound listener has a local address");
    log::info!("wireframe-httpd listening on {addr}");

    let shutdown = Arc::new(AtomicBool::new(false));
    let handler_shutdown = Arc::clone(&shutdown);
    ctrlc::set_handler(move || handler_shutdown.store(true, Ordering::Release))
        .expect("failed to install signal handler");

    while !shutdown.load(Ordering::Acquire) {
        std::thread::sleep(std::time::Duration::from_millis(100));
    }

    log::info!("shutting down");
    server.close();
}

/// The demo handler: echoes the request method and target as a plain-text
/// 200 response.
fn handle(request: &Request, writer: &mut Writer<&TcpStream>) {
    let body = format!(
        "{} {}\n",
        request.request_line.method, request.request_line.target
    );

    if writer.write_status_line(200).is_err() {
        return;
    }
    let headers: ResponseHeaders = get_default_headers(body.len());
    if writer.write_headers(&headers).is_err() {
        return;
    }
    let _ = writer.write_body(body.as_bytes());
}
