//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! pipeline / server produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (outcome counters, duration histogram)
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields, never interpolated payloads
//! - Metrics are cheap and optional (no recorder, no cost)

pub mod logging;
pub mod metrics;
