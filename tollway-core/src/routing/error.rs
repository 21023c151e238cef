use thiserror::Error;

/// Errors from [`crate::routing::RoutingProvider`] calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// Fewer than two waypoints were provided.
    ///
    /// A route needs at least an origin and a destination. Callers should
    /// validate requests before reaching the provider.
    #[error("at least two waypoints are required, got {count}")]
    InsufficientWaypoints {
        /// Number of waypoints supplied.
        count: usize,
    },

    /// The routing engine found no route between the waypoints under the
    /// requested restrictions.
    #[error("no route found")]
    NoRoute,

    /// The request timed out before a response was received.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// The URL that was being requested.
        url: String,
        /// The configured timeout in seconds.
        timeout_secs: u64,
    },

    /// The routing service returned an HTTP error status.
    #[error("HTTP {status} from {url}: {message}")]
    HttpError {
        /// The URL that was being requested.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Error message or response body excerpt.
        message: String,
    },

    /// A network-level error occurred (DNS, connection refused, TLS).
    #[error("network error requesting {url}: {message}")]
    NetworkError {
        /// The URL that was being requested.
        url: String,
        /// Description of the network error.
        message: String,
    },

    /// The routing service reported an error in its response body.
    #[error("routing service error {code:?}: {message}")]
    ServiceError {
        /// Service-specific error code, when one was supplied.
        code: Option<i64>,
        /// Error message from the service.
        message: String,
    },

    /// The response could not be parsed into a route.
    #[error("failed to parse routing response: {message}")]
    ParseError {
        /// Description of the parse failure.
        message: String,
    },
}
