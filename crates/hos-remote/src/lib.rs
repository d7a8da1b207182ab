//! HTTP clients for the services around the log engine.
//!
//! Provides:
//! - The log service: today's mileage, saving and listing daily logs
//! - Route planning for the current trip
//! - Address geocoding against a Nominatim-compatible endpoint

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use hos_core::{DailyLogRecord, TripMetadata};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default request timeout for API calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const GEOCODE_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = concat!("hos/", env!("CARGO_PKG_VERSION"));

const TODAY_MILEAGE_PATH: &str = "/api/today-mileage/";
const SAVE_LOG_PATH: &str = "/api/save-log/";
const DRIVER_LOGS_PATH: &str = "/api/driver-logs/";
const CALCULATE_ROUTE_PATH: &str = "/api/calculate-route/";

/// Remote service errors.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The configured base URL is unusable.
    #[error("invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: &'static str },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The service returned an error response.
    #[error("API error: {message}")]
    Api { message: String },
    /// The response body did not have the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Client for the log service and route planner.
///
/// # Thread Safety
///
/// The client is safe to share across threads. Clones share the underlying
/// HTTP connection pool.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a client for the service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is empty or not http(s), or if the HTTP
    /// client fails to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, RemoteError> {
        let base_url = validate_base_url(base_url.into())?;
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(RemoteError::ClientBuild)?;
        Ok(Self {
            http,
            base_url,
            api_token: None,
        })
    }

    /// Sends `token` as a bearer credential on every request.
    #[must_use]
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.api_token = (!token.trim().is_empty()).then_some(token);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Miles driven today according to the service.
    pub async fn today_mileage(&self) -> Result<f64, RemoteError> {
        let body = self.send(self.http.get(self.endpoint(TODAY_MILEAGE_PATH))).await?;
        parse_mileage(&body)
    }

    /// Saves a finalized log and returns the stored copy.
    pub async fn save_log(&self, record: &DailyLogRecord) -> Result<DailyLogRecord, RemoteError> {
        let request = self.http.post(self.endpoint(SAVE_LOG_PATH)).json(record);
        let body = self.send(request).await?;
        parse_json(&body)
    }

    /// All logs held by the service.
    pub async fn list_logs(&self) -> Result<Vec<DailyLogRecord>, RemoteError> {
        let body = self.send(self.http.get(self.endpoint(DRIVER_LOGS_PATH))).await?;
        parse_json(&body)
    }

    /// Plans the trip's route. A response without the expected fields is an error.
    pub async fn calculate_route(&self, trip: &TripMetadata) -> Result<RoutePlan, RemoteError> {
        let request = self
            .http
            .post(self.endpoint(CALCULATE_ROUTE_PATH))
            .json(&RouteRequest::from(trip));
        let body = self.send(request).await?;
        parse_json(&body)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, RemoteError> {
        let request = match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(parse_api_error(&body).unwrap_or_else(|| RemoteError::Api {
                message: format!("status {status}: {body}"),
            }));
        }
        Ok(body)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RouteRequest<'a> {
    current_location: &'a str,
    pickup_location: &'a str,
    dropoff_location: &'a str,
    current_cycle_hours: f64,
}

impl<'a> From<&'a TripMetadata> for RouteRequest<'a> {
    fn from(trip: &'a TripMetadata) -> Self {
        Self {
            current_location: &trip.current_location,
            pickup_location: &trip.pickup_location,
            dropoff_location: &trip.dropoff_location,
            current_cycle_hours: trip.current_cycle_hours,
        }
    }
}

/// Route summary returned by the planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePlan {
    pub total_distance: f64,
    pub total_duration: String,
    pub driving_time: String,
    pub rest_time: String,
    #[serde(default)]
    pub stops: Vec<RouteStop>,
}

/// A planned stop along the route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStop {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub duration_hours: f64,
}

/// A resolved position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Geocoder for a Nominatim-compatible search endpoint.
///
/// Successful lookups are cached by normalized address for the life of the
/// geocoder. Misses are not cached.
pub struct Geocoder {
    http: reqwest::Client,
    search_url: String,
    cache: Mutex<HashMap<String, Coordinates>>,
}

impl fmt::Debug for Geocoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Geocoder")
            .field("search_url", &self.search_url)
            .finish_non_exhaustive()
    }
}

impl Geocoder {
    pub fn new(base_url: impl Into<String>) -> Result<Self, RemoteError> {
        let base_url = validate_base_url(base_url.into())?;
        let http = reqwest::Client::builder()
            .timeout(GEOCODE_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(RemoteError::ClientBuild)?;
        Ok(Self {
            http,
            search_url: format!("{base_url}/search"),
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// Resolves `address`. A blank address or an empty result is `Ok(None)`.
    pub async fn geocode(&self, address: &str) -> Result<Option<Coordinates>, RemoteError> {
        let address = address.trim();
        if address.is_empty() {
            return Ok(None);
        }
        let key = address.to_lowercase();
        if let Some(hit) = self.cached(&key) {
            tracing::debug!(address, "geocode cache hit");
            return Ok(Some(hit));
        }

        let response = self
            .http
            .get(&self.search_url)
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(RemoteError::Api {
                message: format!("status {status}: {body}"),
            });
        }

        let found = parse_geocode(&body)?;
        match found {
            Some(coordinates) => {
                if let Ok(mut cache) = self.cache.lock() {
                    cache.insert(key, coordinates);
                }
            }
            None => tracing::warn!(address, "address not found"),
        }
        Ok(found)
    }

    fn cached(&self, key: &str) -> Option<Coordinates> {
        self.cache.lock().ok()?.get(key).copied()
    }
}

fn validate_base_url(url: String) -> Result<String, RemoteError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(RemoteError::InvalidBaseUrl {
            url,
            reason: "URL cannot be empty",
        });
    }
    let Ok(parsed) = reqwest::Url::parse(trimmed) else {
        return Err(RemoteError::InvalidBaseUrl {
            url,
            reason: "URL cannot be parsed",
        });
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(RemoteError::InvalidBaseUrl {
            url,
            reason: "URL must use http or https",
        });
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

fn parse_json<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, RemoteError> {
    serde_json::from_str(body).map_err(|err| RemoteError::MalformedResponse(err.to_string()))
}

fn parse_mileage(body: &str) -> Result<f64, RemoteError> {
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Payload {
        total_miles: f64,
    }

    let payload: Payload = parse_json(body)?;
    Ok(payload.total_miles)
}

fn parse_geocode(body: &str) -> Result<Option<Coordinates>, RemoteError> {
    // Nominatim encodes coordinates as strings
    #[derive(Deserialize)]
    struct Place {
        lat: String,
        lon: String,
    }

    let places: Vec<Place> = parse_json(body)?;
    let Some(place) = places.into_iter().next() else {
        return Ok(None);
    };
    let lat = place
        .lat
        .parse()
        .map_err(|_| RemoteError::MalformedResponse(format!("invalid latitude {}", place.lat)))?;
    let lng = place
        .lon
        .parse()
        .map_err(|_| RemoteError::MalformedResponse(format!("invalid longitude {}", place.lon)))?;
    Ok(Some(Coordinates { lat, lng }))
}

fn parse_api_error(body: &str) -> Option<RemoteError> {
    #[derive(Deserialize)]
    struct ErrorPayload {
        error: String,
    }

    serde_json::from_str::<ErrorPayload>(body)
        .ok()
        .map(|payload| RemoteError::Api {
            message: payload.error,
        })
}
