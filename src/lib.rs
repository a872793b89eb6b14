//! # Park Predict Library
//!
//! A Rust library for AI-assisted parking search. It turns a free-text
//! location or a device geolocation fix into a list of predicted parking
//! lot candidates via the Gemini API, and provides the session state
//! machine, map synchronization, and booking flow around that list.

pub mod booking;
pub mod client;
pub mod geolocate;
pub mod map_sync;
pub mod search;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export main types for convenience
pub use booking::{
    confirm_booking, quote_total, BookingError, BookingRequest, ChargeCard, PaymentReceipt,
    SimulatedGateway, MAX_BOOKING_HOURS, MIN_BOOKING_HOURS,
};
pub use client::{PredictionClient, PredictionParser};
pub use geolocate::{resolve_device_location, GeolocateError, LocatePosition, PositionOptions};
pub use map_sync::{LatLng, LatLngBounds, MapStatus, MapSurface, MapSync, MarkerSpec};
pub use search::{SearchSession, SearchState, SearchTicket};

/// Error types for the parking library
#[derive(Error, Debug)]
pub enum ParkError {
    #[error("invalid search query: {0}")]
    InvalidQuery(String),

    #[error("geolocation failed: {0}")]
    GeolocateError(#[from] GeolocateError),

    #[error("prediction service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("prediction backend returned an empty response")]
    EmptyResponse,

    #[error("malformed prediction response: {0}")]
    MalformedResponse(String),

    #[error("booking failed: {0}")]
    BookingError(#[from] BookingError),

    #[error("map failed to initialize: {0}")]
    MapInitError(String),
}

impl From<reqwest::Error> for ParkError {
    fn from(err: reqwest::Error) -> Self {
        ParkError::ServiceUnavailable(err.to_string())
    }
}

/// A location to search around: either free text or device coordinates.
///
/// Immutable once built; construction is the only place validation happens.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    Address(String),
    Coordinates { latitude: f64, longitude: f64 },
}

impl LocationQuery {
    /// Build a query from user-entered text. The text must be non-empty
    /// after trimming.
    pub fn from_text(raw: &str) -> Result<Self, ParkError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ParkError::InvalidQuery(
                "location text must not be empty".to_string(),
            ));
        }
        Ok(LocationQuery::Address(trimmed.to_string()))
    }

    /// Build a query from a device coordinate pair.
    pub fn from_coordinates(latitude: f64, longitude: f64) -> Self {
        LocationQuery::Coordinates {
            latitude,
            longitude,
        }
    }

    /// Human-readable location descriptor embedded into the backend prompt.
    pub fn describe(&self) -> String {
        match self {
            LocationQuery::Address(text) => text.clone(),
            LocationQuery::Coordinates {
                latitude,
                longitude,
            } => format!("latitude {} and longitude {}", latitude, longitude),
        }
    }
}

/// A predicted parking lot candidate returned by the prediction backend.
///
/// Produced only by the prediction fetcher and treated as read-only by all
/// downstream components within one search cycle. Ids are unique within a
/// single result list but not stable across searches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkingLot {
    pub id: String,
    pub name: String,
    pub address: String,
    /// Human-readable distance from the searched location (e.g., "5 min walk").
    pub distance: String,
    /// Predicted percentage of available spots, 0-100.
    pub availability: i32,
    pub price_per_hour: f64,
    pub lat: f64,
    pub lng: f64,
}

impl ParkingLot {
    /// Classify the predicted availability for display.
    pub fn availability_level(&self) -> AvailabilityLevel {
        if self.availability > 60 {
            AvailabilityLevel::High
        } else if self.availability > 20 {
            AvailabilityLevel::Medium
        } else {
            AvailabilityLevel::Low
        }
    }
}

/// Coarse availability bucket shown next to the raw percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvailabilityLevel {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for AvailabilityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            AvailabilityLevel::High => "High",
            AvailabilityLevel::Medium => "Medium",
            AvailabilityLevel::Low => "Low",
        };
        write!(f, "{}", label)
    }
}

/// A completed booking record. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    /// Epoch milliseconds at creation time.
    pub id: i64,
    pub lot_name: String,
    /// ISO calendar date of the booking.
    pub date: chrono::NaiveDate,
    /// Formatted duration (e.g., "3 hours").
    pub duration: String,
    pub cost: f64,
}

/// Append-only booking history, ordered most-recent-first.
#[derive(Debug, Clone, Default)]
pub struct BookingHistory {
    bookings: Vec<Booking>,
}

impl BookingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend a new booking. Existing records are never touched.
    pub fn record(&mut self, booking: Booking) {
        self.bookings.insert(0, booking);
    }

    /// Bookings, most recent first.
    pub fn bookings(&self) -> &[Booking] {
        &self.bookings
    }

    pub fn len(&self) -> usize {
        self.bookings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookings.is_empty()
    }
}

/// Main public API function: one-shot parking search around a location.
///
/// Builds a client from the `GEMINI_API_KEY` environment variable and makes
/// a single prediction request. For repeated searches, construct a
/// [`PredictionClient`] once and drive a [`SearchSession`] with it.
///
/// # Example
/// ```rust,no_run
/// use park_predict::{find_parking, LocationQuery};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let query = LocationQuery::from_text("Downtown Brooklyn")?;
/// let lots = find_parking(&query).await?;
/// println!("Found {} lots", lots.len());
/// # Ok(())
/// # }
/// ```
pub async fn find_parking(query: &LocationQuery) -> Result<Vec<ParkingLot>, ParkError> {
    let client = PredictionClient::from_env()?;
    client.fetch_predictions(query).await
}
