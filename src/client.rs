//! HTTP client and response parser for the Gemini prediction backend

use chrono::{DateTime, Local};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, error, info, instrument, warn};

use crate::{LocationQuery, ParkError, ParkingLot};

const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

// The backend is a general-purpose model; without this it tends to wrap the
// array in conversational text or markdown fences.
const SYSTEM_INSTRUCTION: &str = "You are a helpful assistant. Your only job is to return a valid, \
parsable JSON array of parking lots based on the user's query. Do not include any other text, \
conversation, or markdown formatting like ```json. The entire response must be only the JSON \
data, starting with `[` and ending with `]`. Each element must be an object with exactly these \
fields: id (unique string), name, address, distance (human-readable string), availability \
(integer percentage of free spots, 0-100), pricePerHour (non-negative number, dollars), lat, lng.";

/// Request/response wire types for the generateContent endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<ContentPayload>,
    system_instruction: ContentPayload,
    tools: Vec<ToolPayload>,
}

#[derive(Debug, Serialize)]
struct ContentPayload {
    parts: Vec<PartPayload>,
}

#[derive(Debug, Serialize)]
struct PartPayload {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolPayload {
    google_maps: GoogleMapsTool,
}

#[derive(Debug, Serialize)]
struct GoogleMapsTool {}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Build the prediction prompt for a location at a given wall-clock time.
///
/// The timestamp matters: the backend is instructed to weigh time-of-day and
/// day-of-week effects on availability.
fn build_prompt(query: &LocationQuery, now: DateTime<Local>) -> String {
    let location_prompt = match query {
        LocationQuery::Address(text) => format!("Find parking lots near {}.", text),
        LocationQuery::Coordinates {
            latitude,
            longitude,
        } => format!(
            "Find parking lots near latitude {} and longitude {}.",
            latitude, longitude
        ),
    };

    format!(
        "{} It is currently {}. Base the predicted spot availability on the time of day and day \
of the week; for example, downtown lots are fuller on weekday afternoons. Use real places near \
the location. For each lot, provide its ID, name, full address, distance, predicted spot \
availability percentage, price per hour, and precise latitude/longitude coordinates.",
        location_prompt,
        now.format("%A, %B %-d, %Y at %-I:%M %p")
    )
}

/// Main client for requesting parking predictions from the Gemini backend
pub struct PredictionClient {
    http_client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl PredictionClient {
    /// Create a new prediction client with an explicit API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ParkError> {
        debug!("Creating new prediction client");
        let http_client = Client::builder()
            .user_agent(concat!("park-predict/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http_client,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: api_key.into(),
        })
    }

    /// Create a client from the `GEMINI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self, ParkError> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| {
            ParkError::ServiceUnavailable("GEMINI_API_KEY is not set".to_string())
        })?;
        Self::new(api_key)
    }

    /// Override the model name (defaults to `gemini-2.5-flash`).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the API endpoint base. Intended for tests.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Request parking predictions for a location.
    ///
    /// Exactly one attempt is made per call; retrying is the caller's
    /// decision via a fresh search.
    #[instrument(level = "info", skip(self, query))]
    pub async fn fetch_predictions(
        &self,
        query: &LocationQuery,
    ) -> Result<Vec<ParkingLot>, ParkError> {
        let prompt = build_prompt(query, Local::now());
        debug!(prompt_length = prompt.len(), "Built prediction prompt");

        let request = GenerateContentRequest {
            contents: vec![ContentPayload {
                parts: vec![PartPayload { text: prompt }],
            }],
            system_instruction: ContentPayload {
                parts: vec![PartPayload {
                    text: SYSTEM_INSTRUCTION.to_string(),
                }],
            },
            tools: vec![ToolPayload {
                google_maps: GoogleMapsTool {},
            }],
        };

        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        info!(model = %self.model, "Making prediction request");

        let start_time = std::time::Instant::now();
        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        let request_duration = start_time.elapsed();

        info!(
            status = %status,
            duration_ms = request_duration.as_millis() as u64,
            "Prediction request completed"
        );

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, "Prediction request failed");
            return Err(ParkError::ServiceUnavailable(format!(
                "prediction backend returned status {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let payload: GenerateContentResponse = response.json().await?;
        let text: String = payload
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|part| part.text)
            .collect();

        let parser = PredictionParser::new();
        let start_parse = std::time::Instant::now();
        let result = parser.parse_response(&text);
        let parse_duration = start_parse.elapsed();

        match &result {
            Ok(lots) => {
                info!(
                    parse_duration_ms = parse_duration.as_millis() as u64,
                    lots_found = lots.len(),
                    "Prediction response parsed successfully"
                );
            }
            Err(e) => {
                error!(
                    parse_duration_ms = parse_duration.as_millis() as u64,
                    error = %e,
                    "Prediction response parsing failed"
                );
            }
        }

        result
    }
}

/// Parser for raw prediction responses
///
/// The backend is instructed to reply with a bare JSON array, but replies can
/// still arrive wrapped in incidental text. The parser locates the array
/// boundaries defensively before handing the slice to serde.
#[derive(Debug, Default)]
pub struct PredictionParser;

impl PredictionParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_response(&self, raw: &str) -> Result<Vec<ParkingLot>, ParkError> {
        let text = raw.trim();
        if text.is_empty() {
            warn!("Prediction backend returned no text");
            return Err(ParkError::EmptyResponse);
        }

        let json_start = text.find('[');
        let json_end = text.rfind(']');
        let array = match (json_start, json_end) {
            (Some(start), Some(end)) if start < end => &text[start..=end],
            _ => {
                return Err(ParkError::MalformedResponse(
                    "no JSON array found in the backend response".to_string(),
                ))
            }
        };

        let lots: Vec<ParkingLot> = serde_json::from_str(array)
            .map_err(|e| ParkError::MalformedResponse(format!("JSON parsing failed: {}", e)))?;

        validate_lots(&lots)?;
        Ok(lots)
    }
}

/// Reject records the schema contract forbids rather than clamping them.
fn validate_lots(lots: &[ParkingLot]) -> Result<(), ParkError> {
    let mut seen_ids = HashSet::new();

    for lot in lots {
        if !(0..=100).contains(&lot.availability) {
            return Err(ParkError::MalformedResponse(format!(
                "availability {} out of range 0-100 for lot {}",
                lot.availability, lot.id
            )));
        }
        if lot.price_per_hour < 0.0 {
            return Err(ParkError::MalformedResponse(format!(
                "negative price per hour {} for lot {}",
                lot.price_per_hour, lot.id
            )));
        }
        if !seen_ids.insert(lot.id.as_str()) {
            return Err(ParkError::MalformedResponse(format!(
                "duplicate lot id {}",
                lot.id
            )));
        }
    }

    Ok(())
}
