use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A time-bounded claim on one seat position by one session.
///
/// Serialized field names match the original event-document schema, so a
/// persisted document round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hold {
    pub seat_id: String,
    pub session_id: String,
    pub expires_at: DateTime<Utc>,
}

impl Hold {
    /// A hold is active while its deadline is strictly in the future.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// The unit at which capacity and holds are tracked. `total_seats` is
/// remaining unsold capacity, not a fixed seat count: it only ever decreases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    pub name: String,
    pub total_seats: u32,
    #[serde(rename = "lockedSeats", default)]
    pub holds: Vec<Hold>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub name: String,
    pub rows: Vec<Row>,
}

impl Section {
    pub fn find_row(&self, name: &str) -> Option<&Row> {
        self.rows.iter().find(|r| r.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub date: DateTime<Utc>,
    pub sections: Vec<Section>,
}

impl Event {
    pub fn new(name: String, date: DateTime<Utc>, sections: Vec<Section>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            date,
            sections,
        }
    }

    pub fn find_section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }
}

/// Fully-qualified address of one row, the granularity at which the
/// repository offers conditional updates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowAddress {
    pub event_id: Uuid,
    pub section_name: String,
    pub row_name: String,
}

impl RowAddress {
    pub fn new(event_id: Uuid, section_name: impl Into<String>, row_name: impl Into<String>) -> Self {
        Self {
            event_id,
            section_name: section_name.into(),
            row_name: row_name.into(),
        }
    }
}

impl std::fmt::Display for RowAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.event_id, self.section_name, self.row_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn row_with_hold(expires_at: DateTime<Utc>) -> Row {
        Row {
            name: "A".to_string(),
            total_seats: 10,
            holds: vec![Hold {
                seat_id: "A1".to_string(),
                session_id: "sess-1".to_string(),
                expires_at,
            }],
        }
    }

    #[test]
    fn test_hold_active_window() {
        let now = Utc::now();
        let row = row_with_hold(now + Duration::minutes(5));
        assert!(row.holds[0].is_active(now));
        assert!(!row.holds[0].is_active(now + Duration::minutes(5)));
        assert!(!row.holds[0].is_active(now + Duration::minutes(6)));
    }

    #[test]
    fn test_section_row_lookup() {
        let event = Event::new(
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
        );

        let section = event.find_section("Orchestra").unwrap();
        assert!(section.find_row("A").is_some());
        assert!(section.find_row("Z").is_none());
        assert!(event.find_section("Balcony").is_none());
    }

    #[test]
    fn test_row_document_shape() {
        let now = Utc::now();
        let row = row_with_hold(now + Duration::minutes(5));
        let json = serde_json::to_value(&row).unwrap();

        assert!(json.get("totalSeats").is_some());
        let locked = json.get("lockedSeats").unwrap().as_array().unwrap();
        assert_eq!(locked.len(), 1);
        assert!(locked[0].get("seatId").is_some());
        assert!(locked[0].get("sessionId").is_some());
        assert!(locked[0].get("expiresAt").is_some());
    }
}
