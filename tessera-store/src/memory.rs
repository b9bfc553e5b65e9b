use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use tessera_core::model::{Event, Row, RowAddress};
use tessera_core::repository::{EventRepository, RowLookup, RowSnapshot, StoreError};

type RowKey = (Uuid, String, String);

fn key_of(addr: &RowAddress) -> RowKey {
    (
        addr.event_id,
        addr.section_name.clone(),
        addr.row_name.clone(),
    )
}

#[derive(Default)]
struct Inner {
    events: HashMap<Uuid, Event>,
    /// Revision per row, bumped on every successful conditional store.
    revisions: HashMap<RowKey, u64>,
}

/// In-memory event store.
///
/// All state sits behind one `RwLock`, which makes `store_row` trivially
/// atomic: the revision check and the row replacement happen under the same
/// write guard. The revision map is what gives callers per-row optimistic
/// concurrency; readers never block each other.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn locked<T>(
        &self,
        f: impl FnOnce(&mut Inner) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| StoreError::Backend("store lock poisoned".into()))?;
        f(&mut inner)
    }

    fn read<T>(&self, f: impl FnOnce(&Inner) -> T) -> Result<T, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StoreError::Backend("store lock poisoned".into()))?;
        Ok(f(&inner))
    }
}

fn lookup_row(inner: &Inner, addr: &RowAddress) -> RowLookup {
    let Some(event) = inner.events.get(&addr.event_id) else {
        return RowLookup::MissingEvent;
    };
    let Some(section) = event.find_section(&addr.section_name) else {
        return RowLookup::MissingSection;
    };
    let Some(row) = section.find_row(&addr.row_name) else {
        return RowLookup::MissingRow;
    };
    let revision = inner.revisions.get(&key_of(addr)).copied().unwrap_or(0);
    RowLookup::Found(RowSnapshot {
        row: row.clone(),
        revision,
    })
}

fn row_mut<'a>(event: &'a mut Event, addr: &RowAddress) -> Option<&'a mut Row> {
    event
        .sections
        .iter_mut()
        .find(|s| s.name == addr.section_name)?
        .rows
        .iter_mut()
        .find(|r| r.name == addr.row_name)
}

#[async_trait]
impl EventRepository for InMemoryStore {
    async fn list_events(&self) -> Result<Vec<Event>, StoreError> {
        self.read(|inner| inner.events.values().cloned().collect())
    }

    async fn get_event(&self, id: Uuid) -> Result<Option<Event>, StoreError> {
        self.read(|inner| inner.events.get(&id).cloned())
    }

    async fn insert_event(&self, event: Event) -> Result<(), StoreError> {
        self.locked(|inner| {
            tracing::debug!(event_id = %event.id, "event stored");
            inner.events.insert(event.id, event);
            Ok(())
        })
    }

    async fn load_row(&self, addr: &RowAddress) -> Result<RowLookup, StoreError> {
        self.read(|inner| lookup_row(inner, addr))
    }

    async fn store_row(
        &self,
        addr: &RowAddress,
        expected: u64,
        row: Row,
    ) -> Result<bool, StoreError> {
        self.locked(|inner| {
            let key = key_of(addr);
            let current = inner.revisions.get(&key).copied().unwrap_or(0);
            if current != expected {
                return Ok(false);
            }

            let Some(event) = inner.events.get_mut(&addr.event_id) else {
                return Ok(false);
            };
            let Some(slot) = row_mut(event, addr) else {
                return Ok(false);
            };

            *slot = row;
            inner.revisions.insert(key, current + 1);
            Ok(true)
        })
    }

    async fn row_addresses(&self) -> Result<Vec<RowAddress>, StoreError> {
        self.read(|inner| {
            let mut addrs = Vec::new();
            for event in inner.events.values() {
                for section in &event.sections {
                    for row in &section.rows {
                        addrs.push(RowAddress::new(event.id, &*section.name, &*row.name));
                    }
                }
            }
            addrs
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tessera_core::model::Section;

    fn sample_event() -> Event {
        Event::new(
            "Concert".to_string(),
            Utc::now(),
            vec![Section {
                name: "Orchestra".to_string(),
                rows: vec![Row {
                    name: "A".to_string(),
                    total_seats: 10,
                    holds: vec![],
                }],
            }],
        )
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let store = InMemoryStore::new();
        let event = sample_event();
        let addr = RowAddress::new(event.id, "Orchestra", "A");

        store.insert_event(event.clone()).await.unwrap();

        assert_eq!(store.list_events().await.unwrap().len(), 1);
        assert!(store.get_event(event.id).await.unwrap().is_some());
        assert!(store.get_event(Uuid::new_v4()).await.unwrap().is_none());

        match store.load_row(&addr).await.unwrap() {
            RowLookup::Found(snapshot) => {
                assert_eq!(snapshot.row.total_seats, 10);
                assert_eq!(snapshot.revision, 0);
            }
            other => panic!("expected row, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_lookup_reports_missing_segment() {
        let store = InMemoryStore::new();
        let event = sample_event();
        store.insert_event(event.clone()).await.unwrap();

        let missing_event = RowAddress::new(Uuid::new_v4(), "Orchestra", "A");
        assert!(matches!(
            store.load_row(&missing_event).await.unwrap(),
            RowLookup::MissingEvent
        ));

        let missing_section = RowAddress::new(event.id, "Balcony", "A");
        assert!(matches!(
            store.load_row(&missing_section).await.unwrap(),
            RowLookup::MissingSection
        ));

        let missing_row = RowAddress::new(event.id, "Orchestra", "Z");
        assert!(matches!(
            store.load_row(&missing_row).await.unwrap(),
            RowLookup::MissingRow
        ));
    }

    #[tokio::test]
    async fn test_store_row_is_conditional_on_revision() {
        let store = InMemoryStore::new();
        let event = sample_event();
        let addr = RowAddress::new(event.id, "Orchestra", "A");
        store.insert_event(event).await.unwrap();

        let RowLookup::Found(snapshot) = store.load_row(&addr).await.unwrap() else {
            panic!("row must exist");
        };

        let mut winner = snapshot.row.clone();
        winner.total_seats = 4;
        assert!(store
            .store_row(&addr, snapshot.revision, winner)
            .await
            .unwrap());

        // A second writer holding the same stale revision loses.
        let mut loser = snapshot.row.clone();
        loser.total_seats = 0;
        assert!(!store
            .store_row(&addr, snapshot.revision, loser)
            .await
            .unwrap());

        let RowLookup::Found(current) = store.load_row(&addr).await.unwrap() else {
            panic!("row must exist");
        };
        assert_eq!(current.row.total_seats, 4);
        assert_eq!(current.revision, 1);
    }

    #[tokio::test]
    async fn test_row_addresses_enumerates_all_rows() {
        let store = InMemoryStore::new();
        let event = sample_event();
        store.insert_event(event.clone()).await.unwrap();
        store.insert_event(sample_event()).await.unwrap();

        let addrs = store.row_addresses().await.unwrap();
        assert_eq!(addrs.len(), 2);
        assert!(addrs.iter().any(|a| a.event_id == event.id));
    }
}
