use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use tessera_core::model::{Event, RowAddress, Section};
use tessera_core::repository::{EventRepository, RowLookup, RowSnapshot, StoreError};
use tessera_core::Clock;

use crate::locks::{self, LockError};

/// Ticket count at which a purchase qualifies for the group discount.
pub const GROUP_DISCOUNT_MIN_TICKETS: u32 = 4;

/// Upper bound on conditional-store retries before giving up. Each failed
/// attempt means another commit on the same row succeeded, so hitting this
/// bound takes sustained contention on one row.
const COMMIT_RETRY_LIMIT: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundKind {
    Event,
    Section,
    Row,
}

impl std::fmt::Display for NotFoundKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotFoundKind::Event => write!(f, "Event"),
            NotFoundKind::Section => write!(f, "Section"),
            NotFoundKind::Row => write!(f, "Row"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReserveError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(NotFoundKind),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error("Not enough seats available: requested {requested}, available {available}")]
    InsufficientSeats { requested: u32, available: u32 },

    #[error("Commit on row {0} kept losing to concurrent writers")]
    Contended(RowAddress),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Serialize)]
pub struct PurchaseOutcome {
    pub event: Event,
    pub group_discount: bool,
}

/// Orchestrates seat locking and ticket purchase over the repository's
/// per-row conditional updates.
///
/// Every mutating operation runs the same shape of loop: load a row snapshot
/// with its revision, sweep and evaluate on the copy, then conditionally
/// store. A failed store means a concurrent commit won the row; the loop
/// re-reads and re-evaluates, so stale reads can never oversell capacity or
/// steal a live hold.
pub struct ReservationService {
    repo: Arc<dyn EventRepository>,
    clock: Arc<dyn Clock>,
    hold_ttl: Duration,
}

impl ReservationService {
    pub fn new(repo: Arc<dyn EventRepository>, clock: Arc<dyn Clock>, hold_ttl: Duration) -> Self {
        Self {
            repo,
            clock,
            hold_ttl,
        }
    }

    pub fn hold_ttl(&self) -> Duration {
        self.hold_ttl
    }

    pub async fn list_events(&self) -> Result<Vec<Event>, ReserveError> {
        Ok(self.repo.list_events().await?)
    }

    pub async fn get_event(&self, id: Uuid) -> Result<Event, ReserveError> {
        self.repo
            .get_event(id)
            .await?
            .ok_or(ReserveError::NotFound(NotFoundKind::Event))
    }

    /// Create an event with its full section/row layout. The layout is fixed
    /// at creation; there are no add/remove row operations later.
    pub async fn create_event(
        &self,
        name: &str,
        date: Option<DateTime<Utc>>,
        mut sections: Vec<Section>,
    ) -> Result<Event, ReserveError> {
        if name.trim().is_empty() {
            return Err(ReserveError::Validation("event name is required".into()));
        }
        if sections.is_empty() {
            return Err(ReserveError::Validation(
                "at least one section is required".into(),
            ));
        }

        let mut section_names = HashSet::new();
        for section in &mut sections {
            if section.name.trim().is_empty() {
                return Err(ReserveError::Validation("section name is required".into()));
            }
            if !section_names.insert(section.name.clone()) {
                return Err(ReserveError::Validation(format!(
                    "duplicate section name: {}",
                    section.name
                )));
            }
            let mut row_names = HashSet::new();
            for row in &mut section.rows {
                if row.name.trim().is_empty() {
                    return Err(ReserveError::Validation("row name is required".into()));
                }
                if !row_names.insert(row.name.clone()) {
                    return Err(ReserveError::Validation(format!(
                        "duplicate row name in section {}: {}",
                        section.name, row.name
                    )));
                }
                // Holds only come from the lock workflow, never the payload.
                row.holds.clear();
            }
        }

        let event = Event::new(
            name.to_string(),
            date.unwrap_or_else(|| self.clock.now()),
            sections,
        );
        self.repo.insert_event(event.clone()).await?;

        info!(event_id = %event.id, name = %event.name, "event created");
        Ok(event)
    }

    /// Provisionally hold a seat for a session. Returns the hold's deadline.
    pub async fn lock_seat(
        &self,
        event_id: Uuid,
        section_name: &str,
        row_name: &str,
        session_id: &str,
        seat_id: &str,
    ) -> Result<DateTime<Utc>, ReserveError> {
        Self::require(section_name, "sectionName")?;
        Self::require(row_name, "rowName")?;
        Self::require(session_id, "sessionId")?;
        Self::require(seat_id, "seatId")?;

        let addr = RowAddress::new(event_id, section_name, row_name);
        for _ in 0..COMMIT_RETRY_LIMIT {
            let snapshot = self.resolve(&addr).await?;
            let mut row = snapshot.row;

            let expires_at = locks::acquire(&mut row, seat_id, session_id, self.clock.now(), self.hold_ttl)?;

            if self.repo.store_row(&addr, snapshot.revision, row).await? {
                debug!(row = %addr, seat_id, session_id, %expires_at, "seat locked");
                return Ok(expires_at);
            }
        }

        warn!(row = %addr, "lock commit exhausted its retry budget");
        Err(ReserveError::Contended(addr))
    }

    /// Purchase tickets against a row's remaining capacity.
    ///
    /// Holds gate only the seat they name: another session's hold never
    /// blocks a purchase, and the purchaser's own holds on the row are
    /// consumed by the commit. (Reserving aggregate capacity per hold is the
    /// stricter alternative; this service deliberately does not do that.)
    pub async fn purchase(
        &self,
        event_id: Uuid,
        section_name: &str,
        row_name: &str,
        session_id: &str,
        tickets: u32,
    ) -> Result<PurchaseOutcome, ReserveError> {
        Self::require(section_name, "sectionName")?;
        Self::require(row_name, "rowName")?;
        Self::require(session_id, "sessionId")?;
        if tickets < 1 {
            return Err(ReserveError::Validation(
                "numberOfTickets must be at least 1".into(),
            ));
        }

        let addr = RowAddress::new(event_id, section_name, row_name);
        for _ in 0..COMMIT_RETRY_LIMIT {
            let snapshot = self.resolve(&addr).await?;
            let mut row = snapshot.row;

            locks::sweep_expired(&mut row, self.clock.now());

            if row.total_seats < tickets {
                return Err(ReserveError::InsufficientSeats {
                    requested: tickets,
                    available: row.total_seats,
                });
            }

            row.total_seats -= tickets;
            locks::release_session(&mut row, session_id);

            if self.repo.store_row(&addr, snapshot.revision, row).await? {
                let group_discount = tickets >= GROUP_DISCOUNT_MIN_TICKETS;
                info!(row = %addr, session_id, tickets, group_discount, "purchase committed");
                let event = self.get_event(event_id).await?;
                return Ok(PurchaseOutcome {
                    event,
                    group_discount,
                });
            }
        }

        warn!(row = %addr, "purchase commit exhausted its retry budget");
        Err(ReserveError::Contended(addr))
    }

    fn require(value: &str, field: &str) -> Result<(), ReserveError> {
        if value.trim().is_empty() {
            return Err(ReserveError::Validation(format!("{field} is required")));
        }
        Ok(())
    }

    async fn resolve(&self, addr: &RowAddress) -> Result<RowSnapshot, ReserveError> {
        match self.repo.load_row(addr).await? {
            RowLookup::Found(snapshot) => Ok(snapshot),
            RowLookup::MissingEvent => Err(ReserveError::NotFound(NotFoundKind::Event)),
            RowLookup::MissingSection => Err(ReserveError::NotFound(NotFoundKind::Section)),
            RowLookup::MissingRow => Err(ReserveError::NotFound(NotFoundKind::Row)),
        }
    }
}
