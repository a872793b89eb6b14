//! Search session lifecycle
//!
//! One [`SearchSession`] tracks a single user's search cycle: the tagged
//! result state, the shared hover/selection cursors both visual surfaces
//! read, and the generation counter that makes the most recently submitted
//! search authoritative. The fetch transport gives no ordering guarantee, so
//! completions carry a [`SearchTicket`] and stale ones are discarded rather
//! than applied.

use tracing::{debug, info, warn};

use crate::{LocationQuery, ParkError, ParkingLot, PredictionClient};

/// Lifecycle of one search. Exactly one state holds at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchState {
    Idle,
    Loading,
    Success(Vec<ParkingLot>),
    Empty,
    Error(String),
}

/// Proof of a specific submission. `complete` only applies an outcome whose
/// ticket matches the session's current generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTicket {
    generation: u64,
}

/// State for a single search session.
#[derive(Debug)]
pub struct SearchSession {
    state: SearchState,
    generation: u64,
    hovered_lot_id: Option<String>,
    selected_lot_id: Option<String>,
    booking_confirmed: bool,
}

impl Default for SearchSession {
    fn default() -> Self {
        Self {
            state: SearchState::Idle,
            generation: 0,
            hovered_lot_id: None,
            selected_lot_id: None,
            booking_confirmed: false,
        }
    }
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, SearchState::Loading)
    }

    /// Begin a new search. Always allowed; a submission while a previous
    /// search is still loading supersedes it.
    ///
    /// Entering the loading state clears previous results, the hover and
    /// selection cursors, and any booking-confirmed flag.
    pub fn submit(&mut self) -> SearchTicket {
        self.generation += 1;
        self.state = SearchState::Loading;
        self.hovered_lot_id = None;
        self.selected_lot_id = None;
        self.booking_confirmed = false;

        info!(generation = self.generation, "Search submitted");
        SearchTicket {
            generation: self.generation,
        }
    }

    /// Apply the outcome of the search identified by `ticket`.
    ///
    /// Returns `true` if the outcome was applied. A stale ticket (a newer
    /// search has been submitted since) or a ticket that already completed
    /// leaves the session untouched and returns `false`.
    pub fn complete(
        &mut self,
        ticket: SearchTicket,
        outcome: Result<Vec<ParkingLot>, ParkError>,
    ) -> bool {
        if ticket.generation != self.generation {
            warn!(
                ticket_generation = ticket.generation,
                current_generation = self.generation,
                "Discarding stale search completion"
            );
            return false;
        }
        if !self.is_loading() {
            debug!(
                generation = self.generation,
                "Ignoring duplicate completion for an already settled search"
            );
            return false;
        }

        self.state = match outcome {
            Ok(lots) if lots.is_empty() => {
                info!(generation = self.generation, "Search returned no lots");
                SearchState::Empty
            }
            Ok(lots) => {
                info!(
                    generation = self.generation,
                    lots_found = lots.len(),
                    "Search completed"
                );
                SearchState::Success(lots)
            }
            Err(e) => {
                warn!(generation = self.generation, error = %e, "Search failed");
                SearchState::Error(e.to_string())
            }
        };
        true
    }

    /// Run one full search cycle against the prediction backend.
    pub async fn run(
        &mut self,
        client: &PredictionClient,
        query: &LocationQuery,
    ) -> &SearchState {
        let ticket = self.submit();
        let outcome = client.fetch_predictions(query).await;
        self.complete(ticket, outcome);
        &self.state
    }

    /// The current result list; empty outside the success state.
    pub fn lots(&self) -> &[ParkingLot] {
        match &self.state {
            SearchState::Success(lots) => lots,
            _ => &[],
        }
    }

    /// Set or clear the shared hovered lot id. Both the list and the map
    /// write through this single cursor; neither keeps its own copy.
    pub fn hover(&mut self, lot_id: Option<&str>) {
        self.hovered_lot_id = lot_id.map(str::to_string);
    }

    pub fn hovered_lot_id(&self) -> Option<&str> {
        self.hovered_lot_id.as_deref()
    }

    /// Whether a given lot should render with hover emphasis.
    pub fn is_hovered(&self, lot_id: &str) -> bool {
        self.hovered_lot_id.as_deref() == Some(lot_id)
    }

    /// The lot the map should pan toward: the hovered id looked up in the
    /// current result list, if present.
    pub fn pan_target(&self) -> Option<&ParkingLot> {
        let hovered = self.hovered_lot_id.as_deref()?;
        self.lots().iter().find(|lot| lot.id == hovered)
    }

    /// Select a lot for booking. Only lots in the current result list can be
    /// selected; the returned reference is the selected record.
    pub fn select(&mut self, lot_id: &str) -> Option<&ParkingLot> {
        let exists = self.lots().iter().any(|lot| lot.id == lot_id);
        if exists {
            self.selected_lot_id = Some(lot_id.to_string());
        } else {
            self.selected_lot_id = None;
        }
        self.selected_lot()
    }

    pub fn clear_selection(&mut self) {
        self.selected_lot_id = None;
    }

    pub fn selected_lot(&self) -> Option<&ParkingLot> {
        let selected = self.selected_lot_id.as_deref()?;
        self.lots().iter().find(|lot| lot.id == selected)
    }

    /// Record a confirmed booking: closes the selection and raises the
    /// confirmed flag until the next submission.
    pub fn mark_booking_confirmed(&mut self) {
        self.selected_lot_id = None;
        self.booking_confirmed = true;
    }

    pub fn booking_confirmed(&self) -> bool {
        self.booking_confirmed
    }
}
