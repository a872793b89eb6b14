//! Map and list synchronization
//!
//! The embedding application injects a rendering surface ([`MapSurface`]);
//! this module owns the one-to-one correspondence between parking lots and
//! markers. No other component creates or destroys markers. Hover emphasis
//! is derived purely from the shared hovered id, so the list and the map can
//! never disagree about which lot is highlighted.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::{ParkError, ParkingLot};

/// Padding applied when fitting the viewport around all markers.
pub const FIT_BOUNDS_PADDING_PX: u32 = 100;
/// Zoom used when the result list contains exactly one lot.
pub const SINGLE_LOT_ZOOM: u8 = 15;
/// Minimum legible zoom when panning toward a hovered lot.
pub const HOVER_MIN_ZOOM: u8 = 14;
/// Viewport before any search has produced markers.
pub const DEFAULT_CENTER: LatLng = LatLng {
    lat: 40.7128,
    lng: -74.006,
};
pub const DEFAULT_ZOOM: u8 = 13;

/// A geographic point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// An axis-aligned geographic bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLngBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl LatLngBounds {
    pub fn from_point(point: LatLng) -> Self {
        Self {
            south: point.lat,
            west: point.lng,
            north: point.lat,
            east: point.lng,
        }
    }

    pub fn extend(&mut self, point: LatLng) {
        self.south = self.south.min(point.lat);
        self.west = self.west.min(point.lng);
        self.north = self.north.max(point.lat);
        self.east = self.east.max(point.lng);
    }

    pub fn center(&self) -> LatLng {
        LatLng {
            lat: (self.south + self.north) / 2.0,
            lng: (self.west + self.east) / 2.0,
        }
    }

    fn around_lots(lots: &[ParkingLot]) -> Option<Self> {
        let mut iter = lots.iter();
        let first = iter.next()?;
        let mut bounds = Self::from_point(LatLng {
            lat: first.lat,
            lng: first.lng,
        });
        for lot in iter {
            bounds.extend(LatLng {
                lat: lot.lat,
                lng: lot.lng,
            });
        }
        Some(bounds)
    }
}

/// Everything the surface needs to draw one marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub id: String,
    pub position: LatLng,
    pub title: String,
    /// Price-tag text rendered on the marker itself.
    pub price_label: String,
}

impl MarkerSpec {
    pub fn for_lot(lot: &ParkingLot) -> Self {
        Self {
            id: lot.id.clone(),
            position: LatLng {
                lat: lot.lat,
                lng: lot.lng,
            },
            title: lot.name.clone(),
            price_label: format!("${}", lot.price_per_hour),
        }
    }
}

/// The injected map rendering surface.
///
/// Implementations create/update a marker on `upsert_marker` (keyed by the
/// spec's id) and may assume `remove_marker` and `set_marker_emphasis` are
/// only called with ids previously upserted.
pub trait MapSurface {
    fn upsert_marker(&mut self, marker: &MarkerSpec);
    fn remove_marker(&mut self, id: &str);
    fn set_marker_emphasis(&mut self, id: &str, emphasized: bool);
    fn fit_bounds(&mut self, bounds: LatLngBounds, padding_px: u32);
    fn set_center(&mut self, center: LatLng);
    fn set_zoom(&mut self, zoom: u8);
    fn pan_to(&mut self, center: LatLng);
    fn zoom(&self) -> u8;
}

/// Map provider readiness, surfaced independently of the search state.
///
/// A failed map never blocks searching; the list keeps working and the map
/// area shows the error on its own.
#[derive(Debug, Clone, PartialEq)]
pub enum MapStatus {
    Loading,
    Ready,
    Failed(String),
}

impl MapStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, MapStatus::Ready)
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            MapStatus::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// The initialization failure as a library error, if any.
    pub fn init_error(&self) -> Option<ParkError> {
        self.error_message()
            .map(|message| ParkError::MapInitError(message.to_string()))
    }
}

/// Reconciles the marker set with the current result list and applies the
/// viewport policy. Owns which markers exist; the surface only draws.
#[derive(Debug, Default)]
pub struct MapSync {
    markers: HashMap<String, LatLng>,
}

impl MapSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn has_marker(&self, id: &str) -> bool {
        self.markers.contains_key(id)
    }

    /// Sync markers to a new result list.
    ///
    /// Markers whose ids are gone are removed, new ids get markers, existing
    /// ids are updated in place. Viewport policy: with more than one lot and
    /// no active pan target the view fits all markers; with exactly one lot
    /// the view centers on it at close zoom. An active pan target suppresses
    /// fitting so a hover is not fought by the reconciler.
    pub fn apply_results<S: MapSurface>(
        &mut self,
        surface: &mut S,
        lots: &[ParkingLot],
        pan_target: Option<&ParkingLot>,
    ) {
        let keep: HashSet<&str> = lots.iter().map(|lot| lot.id.as_str()).collect();
        let stale: Vec<String> = self
            .markers
            .keys()
            .filter(|id| !keep.contains(id.as_str()))
            .cloned()
            .collect();
        for id in stale {
            surface.remove_marker(&id);
            self.markers.remove(&id);
        }

        for lot in lots {
            let spec = MarkerSpec::for_lot(lot);
            surface.upsert_marker(&spec);
            self.markers.insert(spec.id, spec.position);
        }

        debug!(markers = self.markers.len(), "Marker set reconciled");

        if lots.len() > 1 && pan_target.is_none() {
            if let Some(bounds) = LatLngBounds::around_lots(lots) {
                surface.fit_bounds(bounds, FIT_BOUNDS_PADDING_PX);
            }
        } else if lots.len() == 1 {
            surface.set_center(LatLng {
                lat: lots[0].lat,
                lng: lots[0].lng,
            });
            surface.set_zoom(SINGLE_LOT_ZOOM);
        }
    }

    /// Sync hover emphasis and the pan target.
    ///
    /// Every live marker's emphasis is recomputed from id equality with the
    /// shared hovered id. When a pan target is active the view pans to it,
    /// raising the zoom to the legibility threshold if it is below.
    pub fn apply_hover<S: MapSurface>(
        &mut self,
        surface: &mut S,
        hovered_lot_id: Option<&str>,
        pan_target: Option<&ParkingLot>,
    ) {
        for id in self.markers.keys() {
            surface.set_marker_emphasis(id, Some(id.as_str()) == hovered_lot_id);
        }

        if let Some(target) = pan_target {
            surface.pan_to(LatLng {
                lat: target.lat,
                lng: target.lng,
            });
            if surface.zoom() < HOVER_MIN_ZOOM {
                surface.set_zoom(HOVER_MIN_ZOOM);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lot(id: &str, lat: f64, lng: f64) -> ParkingLot {
        ParkingLot {
            id: id.to_string(),
            name: format!("Garage {}", id),
            address: "1 Main St".to_string(),
            distance: "3 min walk".to_string(),
            availability: 50,
            price_per_hour: 4.5,
            lat,
            lng,
        }
    }

    /// Records surface calls so tests can assert on the exact sequence of
    /// operations the synchronizer performs.
    #[derive(Debug)]
    struct RecordingSurface {
        markers: HashMap<String, MarkerSpec>,
        emphasized: HashSet<String>,
        zoom: u8,
        center: Option<LatLng>,
        fitted: Vec<(LatLngBounds, u32)>,
        panned: Vec<LatLng>,
    }

    impl RecordingSurface {
        fn new() -> Self {
            Self {
                markers: HashMap::new(),
                emphasized: HashSet::new(),
                zoom: DEFAULT_ZOOM,
                center: Some(DEFAULT_CENTER),
                fitted: Vec::new(),
                panned: Vec::new(),
            }
        }
    }

    impl MapSurface for RecordingSurface {
        fn upsert_marker(&mut self, marker: &MarkerSpec) {
            self.markers.insert(marker.id.clone(), marker.clone());
        }

        fn remove_marker(&mut self, id: &str) {
            self.markers.remove(id);
            self.emphasized.remove(id);
        }

        fn set_marker_emphasis(&mut self, id: &str, emphasized: bool) {
            if emphasized {
                self.emphasized.insert(id.to_string());
            } else {
                self.emphasized.remove(id);
            }
        }

        fn fit_bounds(&mut self, bounds: LatLngBounds, padding_px: u32) {
            self.fitted.push((bounds, padding_px));
        }

        fn set_center(&mut self, center: LatLng) {
            self.center = Some(center);
        }

        fn set_zoom(&mut self, zoom: u8) {
            self.zoom = zoom;
        }

        fn pan_to(&mut self, center: LatLng) {
            self.panned.push(center);
        }

        fn zoom(&self) -> u8 {
            self.zoom
        }
    }

    #[test]
    fn test_markers_follow_result_list() {
        let mut sync = MapSync::new();
        let mut surface = RecordingSurface::new();

        sync.apply_results(
            &mut surface,
            &[lot("lot-1", 40.70, -74.00), lot("lot-2", 40.72, -74.02)],
            None,
        );
        assert_eq!(sync.marker_count(), 2);
        assert!(surface.markers.contains_key("lot-1"));
        assert!(surface.markers.contains_key("lot-2"));

        // lot-1 disappears, lot-3 appears, lot-2 moves
        sync.apply_results(
            &mut surface,
            &[lot("lot-2", 41.00, -74.02), lot("lot-3", 40.75, -74.05)],
            None,
        );
        assert_eq!(sync.marker_count(), 2);
        assert!(!surface.markers.contains_key("lot-1"));
        assert!(surface.markers.contains_key("lot-3"));
        assert_eq!(surface.markers["lot-2"].position.lat, 41.00);
    }

    #[test]
    fn test_marker_spec_carries_price_tag_and_title() {
        let spec = MarkerSpec::for_lot(&lot("lot-1", 40.70, -74.00));
        assert_eq!(spec.title, "Garage lot-1");
        assert_eq!(spec.price_label, "$4.5");
    }

    #[test]
    fn test_multiple_lots_fit_bounds_with_padding() {
        let mut sync = MapSync::new();
        let mut surface = RecordingSurface::new();

        sync.apply_results(
            &mut surface,
            &[lot("lot-1", 40.70, -74.00), lot("lot-2", 40.72, -74.02)],
            None,
        );

        assert_eq!(surface.fitted.len(), 1);
        let (bounds, padding) = surface.fitted[0];
        assert_eq!(padding, FIT_BOUNDS_PADDING_PX);
        assert_eq!(bounds.south, 40.70);
        assert_eq!(bounds.north, 40.72);
        assert_eq!(bounds.west, -74.02);
        assert_eq!(bounds.east, -74.00);
    }

    #[test]
    fn test_single_lot_centers_at_close_zoom() {
        let mut sync = MapSync::new();
        let mut surface = RecordingSurface::new();

        sync.apply_results(&mut surface, &[lot("lot-1", 40.70, -74.00)], None);

        assert!(surface.fitted.is_empty());
        assert_eq!(surface.zoom, SINGLE_LOT_ZOOM);
        assert_eq!(surface.center, Some(LatLng { lat: 40.70, lng: -74.00 }));
    }

    #[test]
    fn test_active_pan_target_suppresses_fitting() {
        let mut sync = MapSync::new();
        let mut surface = RecordingSurface::new();
        let lots = [lot("lot-1", 40.70, -74.00), lot("lot-2", 40.72, -74.02)];

        sync.apply_results(&mut surface, &lots, Some(&lots[0]));
        assert!(surface.fitted.is_empty());
    }

    #[test]
    fn test_hover_emphasis_tracks_shared_id() {
        let mut sync = MapSync::new();
        let mut surface = RecordingSurface::new();
        let lots = [lot("lot-1", 40.70, -74.00), lot("lot-2", 40.72, -74.02)];
        sync.apply_results(&mut surface, &lots, None);

        sync.apply_hover(&mut surface, Some("lot-2"), Some(&lots[1]));
        assert!(surface.emphasized.contains("lot-2"));
        assert!(!surface.emphasized.contains("lot-1"));

        // Moving the hover swaps emphasis; clearing it drops all emphasis
        sync.apply_hover(&mut surface, Some("lot-1"), Some(&lots[0]));
        assert!(surface.emphasized.contains("lot-1"));
        assert!(!surface.emphasized.contains("lot-2"));

        sync.apply_hover(&mut surface, None, None);
        assert!(surface.emphasized.is_empty());
    }

    #[test]
    fn test_pan_target_raises_zoom_to_threshold() {
        let mut sync = MapSync::new();
        let mut surface = RecordingSurface::new();
        let lots = [lot("lot-1", 40.70, -74.00), lot("lot-2", 40.72, -74.02)];
        sync.apply_results(&mut surface, &lots, None);

        surface.zoom = 12;
        sync.apply_hover(&mut surface, Some("lot-1"), Some(&lots[0]));
        assert_eq!(surface.panned.last(), Some(&LatLng { lat: 40.70, lng: -74.00 }));
        assert_eq!(surface.zoom, HOVER_MIN_ZOOM);

        // Already past the threshold: zoom is left alone
        surface.zoom = 16;
        sync.apply_hover(&mut surface, Some("lot-2"), Some(&lots[1]));
        assert_eq!(surface.zoom, 16);
    }

    #[test]
    fn test_map_status_is_independent_of_search() {
        let status = MapStatus::Failed("API key is invalid".to_string());
        assert!(!status.is_ready());
        assert_eq!(status.error_message(), Some("API key is invalid"));
        assert!(matches!(
            status.init_error(),
            Some(ParkError::MapInitError(_))
        ));

        assert!(MapStatus::Ready.is_ready());
        assert!(MapStatus::Ready.init_error().is_none());
        assert!(MapStatus::Loading.error_message().is_none());
    }
}
