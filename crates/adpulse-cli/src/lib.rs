//! Library half of `adpulse-cli`: the HTTP client for a running server and
//! the text renderers used by `summarize`.

pub mod client;
pub mod report;

pub use client::{ClientError, MetricsClient};
