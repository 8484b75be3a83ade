//! Error types for the upstream adapters.
//!
//! Every variant here is transient from the tracker's point of view: the
//! item is skipped for this pass and retried on the next one. An item that
//! upstream reports as gone is not an error at all; it is
//! [`Lookup::NotFound`](crate::Lookup::NotFound).

/// A failure to observe upstream state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamError {
    /// The request could not be sent or the connection failed.
    #[error("{endpoint} request failed: {message}")]
    Request {
        /// Which endpoint was being called.
        endpoint: &'static str,
        /// Transport error description.
        message: String,
    },

    /// The request did not complete within its deadline.
    #[error("{endpoint} timed out")]
    Timeout {
        /// Which endpoint was being called.
        endpoint: &'static str,
    },

    /// Upstream answered with a non-success HTTP status.
    #[error("{endpoint} returned HTTP {status}")]
    Status {
        /// Which endpoint was being called.
        endpoint: &'static str,
        /// The HTTP status code.
        status: u16,
    },

    /// Upstream answered 2xx but the body did not have the expected shape.
    #[error("{endpoint} returned a malformed payload: {message}")]
    Malformed {
        /// Which endpoint was being called.
        endpoint: &'static str,
        /// What was missing or wrong.
        message: String,
    },

    /// The HTTP client could not be constructed.
    #[error("HTTP client setup failed: {0}")]
    Setup(String),
}

impl UpstreamError {
    /// Classify a transport-level `reqwest` failure.
    pub fn from_reqwest(endpoint: &'static str, error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout { endpoint }
        } else {
            Self::Request {
                endpoint,
                message: error.to_string(),
            }
        }
    }

    /// Shorthand for a [`Malformed`](Self::Malformed) error.
    pub fn malformed(endpoint: &'static str, message: impl Into<String>) -> Self {
        Self::Malformed {
            endpoint,
            message: message.into(),
        }
    }
}
