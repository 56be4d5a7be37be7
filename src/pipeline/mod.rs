//! Response rewrite pipeline.
//!
//! # Data Flow
//! ```text
//! Request
//!     → settings.rs (method / upgrade check) ──not monitored──▶ upstream, untouched
//!     → negotiate (restrict Accept-Encoding, tag NegotiatedEncoding)
//!     → upstream service
//!     → capture (buffer frames, header side effects, size guard)
//!     → eligible? ──no──▶ raw bytes
//!     → decode ──corrupt──▶ raw bytes
//!     → rewrite engine
//!     → re-encode with the upstream's encoding → single write
//! ```
//!
//! # Design Decisions
//! - Settings are built once and shared behind `Arc`; requests never mutate them
//! - Everything after `call` runs under one panic boundary (recovery.rs)
//! - Errors from the upstream `call` itself are propagated, not masked
//! - Bodies above `max_body_size` are streamed through unmodified

pub mod layer;
pub mod recovery;
pub mod service;
pub mod settings;

pub use layer::RewriteBodyLayer;
pub use recovery::AbortHandler;
pub use service::RewriteBody;
pub use settings::RewriteSettings;
