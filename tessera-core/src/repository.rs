use async_trait::async_trait;
use uuid::Uuid;

use crate::model::{Event, Row, RowAddress};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// A row read together with the revision it was read at. The revision is the
/// token for the conditional update in [`EventRepository::store_row`].
#[derive(Debug, Clone)]
pub struct RowSnapshot {
    pub row: Row,
    pub revision: u64,
}

/// Outcome of resolving a [`RowAddress`]. Each missing path segment is its
/// own case so callers can report which part of the address failed.
#[derive(Debug, Clone)]
pub enum RowLookup {
    Found(RowSnapshot),
    MissingEvent,
    MissingSection,
    MissingRow,
}

/// Storage seam for the event/section/row aggregate.
///
/// The concurrency contract lives here: `store_row` is a compare-and-swap on
/// the row's revision, so any backend that implements it correctly gives the
/// reservation workflow its no-oversell guarantee. Rows are independent;
/// nothing coordinates across rows.
#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn list_events(&self) -> Result<Vec<Event>, StoreError>;

    async fn get_event(&self, id: Uuid) -> Result<Option<Event>, StoreError>;

    async fn insert_event(&self, event: Event) -> Result<(), StoreError>;

    /// Resolve an address to a row snapshot plus its current revision.
    async fn load_row(&self, addr: &RowAddress) -> Result<RowLookup, StoreError>;

    /// Replace a row only if its stored revision still equals `expected`.
    /// Returns `false` (and mutates nothing) when a concurrent commit won.
    async fn store_row(&self, addr: &RowAddress, expected: u64, row: Row)
        -> Result<bool, StoreError>;

    /// Every row address currently stored. Used by the periodic sweep worker.
    async fn row_addresses(&self) -> Result<Vec<RowAddress>, StoreError>;
}
