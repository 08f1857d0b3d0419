//! WebSocket infrastructure: the live progress bridge.

mod progress;

pub use progress::progress_handler;
