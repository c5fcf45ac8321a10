//! Webhook message relay.
//!
//! Accepts notification payloads over HTTP, appends them to a durable
//! per-day log, optionally renders them in a live console viewer, and fans
//! them out to configured downstream channels (OneBot chat-bot relay,
//! SMTP email).
//!
//! Data flow: HTTP request → validate + authenticate → durable log →
//! viewer notify + fan-out dispatch → aggregated status → HTTP response.

pub mod channels;
pub mod config;
pub mod error;
pub mod ingest;
pub mod message;
pub mod server;
pub mod sink;
pub mod viewer;

pub use error::Error;
