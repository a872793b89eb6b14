//! Offline walk-through of a full search-to-booking cycle
//!
//! Uses a canned backend response instead of the live service, so it runs
//! without credentials: parse predictions, drive the session state machine,
//! sync a (console) map surface, and confirm a simulated booking.

use std::time::Duration;

use park_predict::{
    confirm_booking, BookingHistory, BookingRequest, LatLng, LatLngBounds, MapSurface, MapSync,
    MarkerSpec, PredictionParser, SearchSession, SimulatedGateway,
};

const CANNED_RESPONSE: &str = r#"[
  {"id": "lot-1", "name": "Hudson Garage", "address": "77 Hudson St", "distance": "5 min walk",
   "availability": 72, "pricePerHour": 6.5, "lat": 40.7158, "lng": -74.0089},
  {"id": "lot-2", "name": "Canal Street Lot", "address": "12 Canal St", "distance": "8 min walk",
   "availability": 35, "pricePerHour": 4.0, "lat": 40.7191, "lng": -74.0021},
  {"id": "lot-3", "name": "Pier 40 Parking", "address": "353 West St", "distance": "12 min walk",
   "availability": 15, "pricePerHour": 3.25, "lat": 40.7296, "lng": -74.0112}
]"#;

/// A map surface that narrates what a real renderer would draw.
struct ConsoleSurface {
    zoom: u8,
}

impl MapSurface for ConsoleSurface {
    fn upsert_marker(&mut self, marker: &MarkerSpec) {
        println!(
            "  [map] marker {} ({}) at ({:.4}, {:.4}) tagged {}",
            marker.id, marker.title, marker.position.lat, marker.position.lng, marker.price_label
        );
    }

    fn remove_marker(&mut self, id: &str) {
        println!("  [map] remove marker {}", id);
    }

    fn set_marker_emphasis(&mut self, id: &str, emphasized: bool) {
        if emphasized {
            println!("  [map] highlight marker {}", id);
        }
    }

    fn fit_bounds(&mut self, bounds: LatLngBounds, padding_px: u32) {
        println!(
            "  [map] fit bounds ({:.4}, {:.4})..({:.4}, {:.4}) with {}px padding",
            bounds.south, bounds.west, bounds.north, bounds.east, padding_px
        );
    }

    fn set_center(&mut self, center: LatLng) {
        println!("  [map] center on ({:.4}, {:.4})", center.lat, center.lng);
    }

    fn set_zoom(&mut self, zoom: u8) {
        self.zoom = zoom;
        println!("  [map] zoom to {}", zoom);
    }

    fn pan_to(&mut self, center: LatLng) {
        println!("  [map] pan to ({:.4}, {:.4})", center.lat, center.lng);
    }

    fn zoom(&self) -> u8 {
        self.zoom
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = SearchSession::new();
    let mut map = MapSync::new();
    let mut surface = ConsoleSurface { zoom: 13 };
    let mut history = BookingHistory::new();

    println!("Submitting search...");
    let ticket = session.submit();

    let lots = PredictionParser::new().parse_response(CANNED_RESPONSE)?;
    session.complete(ticket, Ok(lots));
    println!("Search settled with {} lots\n", session.lots().len());

    println!("Syncing map:");
    map.apply_results(&mut surface, session.lots(), session.pan_target());

    println!("\nHovering over lot-2:");
    session.hover(Some("lot-2"));
    map.apply_hover(&mut surface, session.hovered_lot_id(), session.pan_target());

    println!("\nBooking lot-2 for 3 hours...");
    let lot = session
        .select("lot-2")
        .expect("lot-2 is in the result list")
        .clone();
    let request = BookingRequest { lot, hours: 3 };
    let gateway = SimulatedGateway::new().with_latency(Duration::from_millis(300));

    let booking = confirm_booking(&request, &gateway, &mut history).await?;
    session.mark_booking_confirmed();

    println!(
        "✅ Booked {} for {} on {} — ${:.2}",
        booking.lot_name, booking.duration, booking.date, booking.cost
    );
    println!("History now holds {} booking(s)", history.len());

    Ok(())
}
