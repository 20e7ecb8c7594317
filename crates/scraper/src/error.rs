//! Automation fault taxonomy

use thiserror::Error;

/// Faults raised while driving the external listing site.
///
/// The retry layer classifies these: stale handles and timeouts are
/// transient and retried with backoff; session faults are retried the same
/// way because the page frequently recovers after a reload; cancellation is
/// always terminal.
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// The element went away while the page re-rendered part of the DOM.
    #[error("stale element: {0}")]
    Stale(String),

    /// A readiness or presence wait exceeded its deadline.
    #[error("timed out waiting for {0}")]
    Timeout(String),

    /// Browser/CDP level failure (launch, navigation, evaluation).
    #[error("browser session error: {0}")]
    Session(String),

    /// The caller's cancellation signal fired.
    #[error("acquisition cancelled")]
    Cancelled,
}

impl ScrapeError {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ScrapeError::Cancelled)
    }
}

/// Map a CDP error into the fault taxonomy by inspecting its message.
pub(crate) fn classify_cdp(err: chromiumoxide::error::CdpError) -> ScrapeError {
    let message = err.to_string();
    if message.contains("Could not find node")
        || message.contains("not belong to the document")
        || message.contains("Node with given id")
    {
        ScrapeError::Stale(message)
    } else {
        ScrapeError::Session(message)
    }
}
