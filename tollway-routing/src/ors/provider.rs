//! HTTP `RoutingProvider` over the OpenRouteService directions API.
//!
//! # Architecture
//!
//! [`RoutingProvider`] is synchronous so the optimiser can call it from plain
//! worker threads. This provider bridges the async HTTP calls to that
//! interface by blocking on a Tokio runtime internally.

use std::time::Duration;

use geo::{Coord, MultiPolygon};
use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};
use tollway_core::{Route, RoutingError, RoutingProvider};

use super::payload::{DirectionsRequest, DirectionsResponse, ServiceErrorBody};

/// Error type for [`OrsRoutingProvider`] construction failures.
#[derive(Debug)]
pub enum ProviderBuildError {
    /// Failed to build the HTTP client.
    HttpClient(reqwest::Error),
    /// Failed to build the Tokio runtime.
    Runtime(std::io::Error),
}

impl std::fmt::Display for ProviderBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HttpClient(err) => write!(f, "failed to build HTTP client: {err}"),
            Self::Runtime(err) => write!(f, "failed to build Tokio runtime: {err}"),
        }
    }
}

impl std::error::Error for ProviderBuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::HttpClient(err) => Some(err),
            Self::Runtime(err) => Some(err),
        }
    }
}

/// Default user agent for ORS requests.
pub const DEFAULT_USER_AGENT: &str = "tollway-routing/0.1";

/// Default ORS routing profile.
pub const DEFAULT_PROFILE: &str = "driving-car";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Environment variable holding the service base URL.
const BASE_URL_VAR: &str = "ORS_BASE_URL";

/// Environment variable holding the API key.
const API_KEY_VAR: &str = "ORS_API_KEY";

/// Longest error body echoed into an [`RoutingError::HttpError`] message.
const MAX_ERROR_BODY: usize = 512;

/// Configuration for [`OrsRoutingProvider`].
#[derive(Clone)]
pub struct OrsRoutingProviderConfig {
    /// Base URL for the ORS service (e.g., `"http://localhost:8080/ors"`).
    pub base_url: String,
    /// Routing profile, such as `driving-car` or `driving-hgv`.
    pub profile: String,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
    /// API key sent in the `Authorization` header, if any.
    pub api_key: Option<String>,
}

impl std::fmt::Debug for OrsRoutingProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrsRoutingProviderConfig")
            .field("base_url", &self.base_url)
            .field("profile", &self.profile)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Default for OrsRoutingProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/ors".to_owned(),
            profile: DEFAULT_PROFILE.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            api_key: None,
        }
    }
}

impl OrsRoutingProviderConfig {
    /// Create a new configuration with the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Read `ORS_BASE_URL` and `ORS_API_KEY` from the environment.
    ///
    /// Unset or empty variables keep their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let present = |name| lookup(name).filter(|value| !value.trim().is_empty());
        let config = present(BASE_URL_VAR).map_or_else(Self::default, Self::new);
        match present(API_KEY_VAR) {
            Some(key) => config.with_api_key(key),
            None => config,
        }
    }

    /// Set the routing profile.
    #[must_use]
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

/// Routing provider backed by the ORS directions API.
///
/// It owns a Tokio runtime that is reused across calls.
///
/// # Runtime behaviour
///
/// Outside any Tokio runtime, the provider blocks on its own runtime. Inside
/// a multi-threaded runtime (detected via [`Handle::try_current()`] and
/// [`RuntimeFlavor::MultiThread`]), it uses that runtime's handle with
/// [`tokio::task::block_in_place`]. Inside a `current_thread` runtime it falls
/// back to its own runtime, which may deadlock if the caller's runtime drives
/// IO this request depends on.
///
/// # Example
///
/// ```no_run
/// use geo::Coord;
/// use tollway_core::RoutingProvider;
/// use tollway_routing::{OrsRoutingProvider, OrsRoutingProviderConfig};
///
/// let config = OrsRoutingProviderConfig::from_env().with_profile("driving-hgv");
/// let provider = OrsRoutingProvider::with_config(config)?;
/// let route = provider.base_route(&[
///     Coord { x: 2.35, y: 48.85 },
///     Coord { x: 4.83, y: 45.76 },
/// ])?;
/// println!("{} m", route.distance_m());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct OrsRoutingProvider {
    client: Client,
    config: OrsRoutingProviderConfig,
    runtime: Runtime,
}

impl std::fmt::Debug for OrsRoutingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrsRoutingProvider")
            .field("client", &self.client)
            .field("config", &self.config)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .finish()
    }
}

impl OrsRoutingProvider {
    /// Create a new provider with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::with_config(OrsRoutingProviderConfig::new(base_url))
    }

    /// Create a new provider with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn with_config(config: OrsRoutingProviderConfig) -> Result<Self, ProviderBuildError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(ProviderBuildError::HttpClient)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ProviderBuildError::Runtime)?;
        Ok(Self {
            client,
            config,
            runtime,
        })
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &OrsRoutingProviderConfig {
        &self.config
    }

    /// Build the directions URL: `{base_url}/v2/directions/{profile}/geojson`.
    fn directions_url(&self) -> String {
        format!(
            "{}/v2/directions/{}/geojson",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile
        )
    }

    async fn fetch_route_async(&self, body: &DirectionsRequest) -> Result<Route, RoutingError> {
        let url = self.directions_url();
        let mut request = self.client.post(&url).json(body);
        if let Some(key) = &self.config.api_key {
            request = request.header(AUTHORIZATION, key);
        }

        let response = request
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, &url))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, &url))?;

        // ORS reports service errors with 4xx statuses and a JSON body.
        match serde_json::from_str::<DirectionsResponse>(&text) {
            Ok(parsed) if parsed.error.is_some() || status.is_success() => {
                convert_response(parsed)
            }
            Err(err) if status.is_success() => Err(RoutingError::ParseError {
                message: err.to_string(),
            }),
            _ => Err(RoutingError::HttpError {
                url,
                status: status.as_u16(),
                message: truncate(&text),
            }),
        }
    }

    /// Convert a reqwest error to a `RoutingError`.
    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &str) -> RoutingError {
        if error.is_timeout() {
            return RoutingError::Timeout {
                url: url.to_owned(),
                timeout_secs: self.config.timeout.as_secs(),
            };
        }

        if let Some(status) = error.status() {
            return RoutingError::HttpError {
                url: url.to_owned(),
                status: status.as_u16(),
                message: error.to_string(),
            };
        }

        RoutingError::NetworkError {
            url: url.to_owned(),
            message: error.to_string(),
        }
    }

    fn fetch(
        &self,
        waypoints: &[Coord<f64>],
        body: &DirectionsRequest,
    ) -> Result<Route, RoutingError> {
        if waypoints.len() < 2 {
            return Err(RoutingError::InsufficientWaypoints {
                count: waypoints.len(),
            });
        }

        // block_in_place requires a multi-threaded runtime; for current_thread
        // runtimes we fall back to our own stored runtime.
        let future = self.fetch_route_async(body);
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(future))
            }
            _ => self.runtime.block_on(future),
        }
    }
}

/// Convert an ORS response into a [`Route`].
fn convert_response(response: DirectionsResponse) -> Result<Route, RoutingError> {
    if let Some(error) = response.error {
        let (code, message) = match error {
            ServiceErrorBody::Detailed { code, message } => (code, message),
            ServiceErrorBody::Message(message) => (None, message),
        };
        return Err(RoutingError::ServiceError { code, message });
    }

    let feature = response
        .features
        .into_iter()
        .next()
        .ok_or(RoutingError::NoRoute)?;
    let geometry = feature
        .geometry
        .to_line_string()
        .ok_or_else(|| RoutingError::ParseError {
            message: "route position without latitude".to_owned(),
        })?;
    let summary = feature.properties.summary;
    let duration = Some(summary.duration)
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(Duration::from_secs_f64)
        .ok_or_else(|| RoutingError::ParseError {
            message: format!("invalid route duration: {}", summary.duration),
        })?;

    Route::new(geometry, summary.distance, duration).map_err(|err| RoutingError::ParseError {
        message: err.to_string(),
    })
}

fn truncate(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((cut, _)) => body.get(..cut).unwrap_or(body).to_owned(),
        None => body.to_owned(),
    }
}

impl RoutingProvider for OrsRoutingProvider {
    fn base_route(&self, waypoints: &[Coord<f64>]) -> Result<Route, RoutingError> {
        self.fetch(waypoints, &DirectionsRequest::base(waypoints))
    }

    fn route_avoiding_polygons(
        &self,
        waypoints: &[Coord<f64>],
        avoid: &MultiPolygon<f64>,
    ) -> Result<Route, RoutingError> {
        log::debug!(
            "requesting route avoiding {} polygon(s)",
            avoid.0.len()
        );
        self.fetch(
            waypoints,
            &DirectionsRequest::avoiding_polygons(waypoints, avoid),
        )
    }

    fn route_avoiding_tollways(&self, waypoints: &[Coord<f64>]) -> Result<Route, RoutingError> {
        self.fetch(waypoints, &DirectionsRequest::avoiding_tollways(waypoints))
    }
}
