//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, forwarding handler)
//!     → negotiate.rs (narrow Accept-Encoding to what the codec can decode)
//!     → [upstream]
//!     → capture.rs (buffer the response in front of a sink)
//!     → sink.rs (assemble the outbound response)
//!     → Send to client
//! ```

pub mod capture;
pub mod negotiate;
pub mod server;
pub mod sink;

pub use capture::CapturedResponse;
pub use negotiate::NegotiatedEncoding;
pub use server::{HttpServer, ServerError};
pub use sink::{HttpSink, ResponseSink, SinkError};
