//! Simulated booking flow
//!
//! Payment goes through the [`ChargeCard`] abstraction with a single
//! completion signal, so a real gateway can replace the simulated one
//! without reshaping the flow. The simulated gateway stands in for payment
//! processing with a fixed latency.

use std::time::Duration;

use chrono::Local;
use thiserror::Error;
use tracing::{info, warn};

use crate::{Booking, BookingHistory, ParkingLot};

pub const MIN_BOOKING_HOURS: u32 = 1;
pub const MAX_BOOKING_HOURS: u32 = 8;

const SIMULATED_PAYMENT_LATENCY: Duration = Duration::from_secs(2);

/// Booking-specific error types
#[derive(Error, Debug)]
pub enum BookingError {
    #[error("booking duration must be between 1 and 8 whole hours, got {0}")]
    InvalidDuration(u32),

    #[error("payment was declined: {0}")]
    PaymentDeclined(String),
}

/// Total price for a stay: hourly rate times whole hours, rounded to cents.
pub fn quote_total(price_per_hour: f64, hours: u32) -> Result<f64, BookingError> {
    if !(MIN_BOOKING_HOURS..=MAX_BOOKING_HOURS).contains(&hours) {
        return Err(BookingError::InvalidDuration(hours));
    }
    let total = price_per_hour * hours as f64;
    Ok((total * 100.0).round() / 100.0)
}

/// Proof that a charge settled.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentReceipt {
    pub amount: f64,
}

/// A payment processor with a single completion signal.
pub trait ChargeCard {
    fn charge(
        &self,
        amount: f64,
    ) -> impl std::future::Future<Output = Result<PaymentReceipt, BookingError>> + Send;
}

/// Stand-in payment gateway: waits a fixed latency, then settles.
///
/// Can be built declining to exercise the failure path.
#[derive(Debug, Clone)]
pub struct SimulatedGateway {
    latency: Duration,
    decline_reason: Option<String>,
}

impl SimulatedGateway {
    pub fn new() -> Self {
        Self {
            latency: SIMULATED_PAYMENT_LATENCY,
            decline_reason: None,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// A gateway that declines every charge with the given reason.
    pub fn declining(reason: impl Into<String>) -> Self {
        Self {
            latency: SIMULATED_PAYMENT_LATENCY,
            decline_reason: Some(reason.into()),
        }
    }
}

impl Default for SimulatedGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl ChargeCard for SimulatedGateway {
    async fn charge(&self, amount: f64) -> Result<PaymentReceipt, BookingError> {
        tokio::time::sleep(self.latency).await;
        match &self.decline_reason {
            Some(reason) => Err(BookingError::PaymentDeclined(reason.clone())),
            None => Ok(PaymentReceipt { amount }),
        }
    }
}

/// One booking attempt: a chosen lot and a whole-hour duration.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub lot: ParkingLot,
    pub hours: u32,
}

/// Charge for the stay and, on success, append a [`Booking`] to the history.
///
/// A declined payment returns the error without touching the history, so the
/// caller's session state stays consistent and the attempt can be retried.
pub async fn confirm_booking<G: ChargeCard>(
    request: &BookingRequest,
    gateway: &G,
    history: &mut BookingHistory,
) -> Result<Booking, BookingError> {
    let total = quote_total(request.lot.price_per_hour, request.hours)?;
    info!(
        lot_id = %request.lot.id,
        hours = request.hours,
        total,
        "Confirming booking"
    );

    let receipt = gateway.charge(total).await.map_err(|e| {
        warn!(lot_id = %request.lot.id, error = %e, "Payment did not settle");
        e
    })?;

    let now = Local::now();
    let booking = Booking {
        id: now.timestamp_millis(),
        lot_name: request.lot.name.clone(),
        date: now.date_naive(),
        duration: format_duration(request.hours),
        cost: receipt.amount,
    };
    history.record(booking.clone());

    info!(booking_id = booking.id, cost = booking.cost, "Booking confirmed");
    Ok(booking)
}

fn format_duration(hours: u32) -> String {
    if hours == 1 {
        "1 hour".to_string()
    } else {
        format!("{} hours", hours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_lot() -> ParkingLot {
        ParkingLot {
            id: "lot-1".to_string(),
            name: "Hudson Garage".to_string(),
            address: "77 Hudson St".to_string(),
            distance: "5 min walk".to_string(),
            availability: 70,
            price_per_hour: 12.5,
            lat: 40.71,
            lng: -74.0,
        }
    }

    fn fast_gateway() -> SimulatedGateway {
        SimulatedGateway::new().with_latency(Duration::from_millis(5))
    }

    #[test]
    fn test_quote_total_rounds_to_cents() {
        assert_eq!(quote_total(12.5, 3).unwrap(), 37.5);
        assert_eq!(quote_total(3.333, 3).unwrap(), 10.0);
        assert_eq!(quote_total(0.0, 1).unwrap(), 0.0);
    }

    #[test]
    fn test_quote_total_enforces_duration_bounds() {
        assert!(matches!(
            quote_total(5.0, 0),
            Err(BookingError::InvalidDuration(0))
        ));
        assert!(matches!(
            quote_total(5.0, 9),
            Err(BookingError::InvalidDuration(9))
        ));
        assert!(quote_total(5.0, 1).is_ok());
        assert!(quote_total(5.0, 8).is_ok());
    }

    #[test]
    fn test_format_duration_pluralizes() {
        assert_eq!(format_duration(1), "1 hour");
        assert_eq!(format_duration(3), "3 hours");
    }

    #[tokio::test]
    async fn test_confirm_booking_appends_to_history() {
        let mut history = BookingHistory::new();
        let request = BookingRequest {
            lot: sample_lot(),
            hours: 3,
        };

        let booking = confirm_booking(&request, &fast_gateway(), &mut history)
            .await
            .unwrap();

        assert_eq!(booking.lot_name, "Hudson Garage");
        assert_eq!(booking.duration, "3 hours");
        assert_eq!(booking.cost, 37.5);
        assert!(booking.id > 0);

        assert_eq!(history.len(), 1);
        assert_eq!(history.bookings()[0], booking);
    }

    #[tokio::test]
    async fn test_declined_payment_leaves_history_untouched() {
        let mut history = BookingHistory::new();
        let request = BookingRequest {
            lot: sample_lot(),
            hours: 2,
        };
        let gateway =
            SimulatedGateway::declining("card expired").with_latency(Duration::from_millis(5));

        let result = confirm_booking(&request, &gateway, &mut history).await;
        assert!(matches!(result, Err(BookingError::PaymentDeclined(_))));
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_duration_never_charges() {
        let mut history = BookingHistory::new();
        let request = BookingRequest {
            lot: sample_lot(),
            hours: 12,
        };

        let result = confirm_booking(&request, &fast_gateway(), &mut history).await;
        assert!(matches!(result, Err(BookingError::InvalidDuration(12))));
        assert!(history.is_empty());
    }
}
