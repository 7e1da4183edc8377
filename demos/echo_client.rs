//! Echo client over the native host.
//!
//! Demonstrates:
//! - Opening a socket through a `SocketHost`
//! - Listening with typed callbacks and an event channel
//! - Sending text and closing cleanly
//!
//! Usage:
//!   cargo run --example echo_client -- ws://127.0.0.1:9000
//!   cargo run --example echo_client -- ws://127.0.0.1:9000 --debug

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use host_websocket::{NativeHost, Result, SocketEvent, SocketHost};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Constants
// ============================================================================

const DEFAULT_URL: &str = "ws://127.0.0.1:9000";

// ============================================================================
// Main
// ============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let debug = args.iter().any(|a| a == "--debug");
    let url = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .cloned()
        .unwrap_or_else(|| DEFAULT_URL.to_string());

    init_logging(debug);

    if let Err(e) = run(&url).await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run(url: &str) -> Result<()> {
    println!("=== Echo Client: {url} ===\n");

    let host = SocketHost::new(Arc::new(NativeHost::new()));
    let socket = host.open(url, None)?;

    socket.on_error(|event| println!("[error] {}", event.message));
    let mut events = socket.subscribe();

    while let Some(event) = events.recv().await {
        match event {
            SocketEvent::Open => {
                println!("[open] state={}", socket.ready_state());
                socket.send("hello from host-websocket")?;
            }
            SocketEvent::Message(message) => {
                println!("[message] {:?}", message.data);
                socket.close();
            }
            SocketEvent::Error(_) => break,
            SocketEvent::Close(close) => {
                println!(
                    "[close] code={:?} reason={:?} clean={}",
                    close.code, close.reason, close.was_clean
                );
                break;
            }
        }
    }

    Ok(())
}

/// Initialize tracing/logging.
fn init_logging(debug: bool) {
    let filter = if debug {
        "host_websocket=debug"
    } else {
        "host_websocket=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}
