use thiserror::Error;

/// Failure fetching or decoding the day's prayer record. Any variant aborts
/// the current cycle; the next attempt is the midnight rearm.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (DNS, connect, TLS, non-2xx status).
    #[error("timings provider request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The response decoded but no record matches today's real date.
    #[error("no timings entry for today ({day}/{month})")]
    NoDataForToday { day: u32, month: u32 },

    /// The response body is missing required fields or has unparseable times.
    #[error("malformed timings response: {0}")]
    MalformedResponse(String),
}

/// Failure delivering one webhook call. Logged at fire time, never retried;
/// the trigger's lifecycle is unaffected.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("webhook token is not configured")]
    MissingToken,

    #[error("webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook returned HTTP {0}")]
    Status(u16),
}
