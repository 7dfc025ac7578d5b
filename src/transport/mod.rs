//! WebSocket transport layer.
//!
//! Firefox started with `--remote-debugging-port` exposes a WebDriver BiDi
//! server; this module is the client side of that socket.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Window (Rust)  │         WebSocket            │  Firefox        │
//! │                 │─────────────────────────────►│  Remote Agent   │
//! │  Connection     │◄─────────────────────────────│  (BiDi server)  │
//! │                 │    ws://127.0.0.1:PORT       │                 │
//! └─────────────────┘         /session             └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. Launch Firefox and read the announced endpoint from stderr
//! 2. `Connection::connect` - WebSocket handshake, spawn event loop
//! 3. `Connection::send` - Send commands, await correlated responses
//! 4. `Connection::shutdown` - Close the socket

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket connection and event loop.
pub mod connection;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::Connection;
