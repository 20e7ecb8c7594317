//! Resilient market-data acquisition for the mandi price agent
//!
//! Drives a fresh headless browser session per query against the external
//! price-listing site, with multi-layered retry and graceful degradation to
//! a deterministic synthetic dataset, and reduces the scraped rows into one
//! summary per market.

pub mod aggregate;
pub mod engine;
pub mod error;
pub mod fallback;
pub mod interact;
pub mod parse;
pub mod retry;
pub mod session;

pub use aggregate::summarize;
pub use engine::AcquisitionEngine;
pub use error::ScrapeError;
pub use fallback::synthetic_rows;
pub use retry::{with_backoff, RetryPolicy};
pub use session::BrowserSession;
