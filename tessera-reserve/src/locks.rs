use chrono::{DateTime, Duration, Utc};
use tessera_core::model::{Hold, Row};

/// Lock-level errors
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("Seat {0} is locked by another session")]
    SeatLocked(String),
}

/// Drop every hold whose deadline has passed. Runs before any conflict
/// evaluation so an expired hold never blocks anyone. Idempotent.
pub fn sweep_expired(row: &mut Row, now: DateTime<Utc>) -> usize {
    let before = row.holds.len();
    row.holds.retain(|h| h.is_active(now));
    before - row.holds.len()
}

/// The active hold on a seat, if any. Expired holds are treated as absent
/// whether or not a sweep already removed them.
pub fn active_hold<'a>(row: &'a Row, seat_id: &str, now: DateTime<Utc>) -> Option<&'a Hold> {
    row.holds
        .iter()
        .find(|h| h.seat_id == seat_id && h.is_active(now))
}

/// Try to hold a seat for a session.
///
/// Sweeps first, then applies the conflict policy: a live hold by another
/// session is `SeatLocked`; a live hold by the same session is refreshed to a
/// fresh deadline (re-acquiring your own lock is idempotent); otherwise a new
/// hold is inserted at `now + ttl`. Returns the hold's deadline.
pub fn acquire(
    row: &mut Row,
    seat_id: &str,
    session_id: &str,
    now: DateTime<Utc>,
    ttl: Duration,
) -> Result<DateTime<Utc>, LockError> {
    sweep_expired(row, now);

    let expires_at = now + ttl;
    match row.holds.iter_mut().find(|h| h.seat_id == seat_id) {
        Some(hold) if hold.session_id != session_id => {
            Err(LockError::SeatLocked(seat_id.to_string()))
        }
        Some(hold) => {
            hold.expires_at = expires_at;
            Ok(expires_at)
        }
        None => {
            row.holds.push(Hold {
                seat_id: seat_id.to_string(),
                session_id: session_id.to_string(),
                expires_at,
            });
            Ok(expires_at)
        }
    }
}

/// Remove every hold owned by a session. This is the consumption step of a
/// purchase commit. Returns how many holds were released.
pub fn release_session(row: &mut Row, session_id: &str) -> usize {
    let before = row.holds.len();
    row.holds.retain(|h| h.session_id != session_id);
    before - row.holds.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_row() -> Row {
        Row {
            name: "A".to_string(),
            total_seats: 10,
            holds: vec![],
        }
    }

    #[test]
    fn test_acquire_then_conflict() {
        let mut row = empty_row();
        let now = Utc::now();
        let ttl = Duration::minutes(5);

        let expiry = acquire(&mut row, "A1", "sess-1", now, ttl).unwrap();
        assert_eq!(expiry, now + ttl);

        let err = acquire(&mut row, "A1", "sess-2", now, ttl).unwrap_err();
        assert!(matches!(err, LockError::SeatLocked(_)));
        assert_eq!(row.holds.len(), 1);
    }

    #[test]
    fn test_reacquire_refreshes_deadline() {
        let mut row = empty_row();
        let now = Utc::now();
        let ttl = Duration::minutes(5);

        acquire(&mut row, "A1", "sess-1", now, ttl).unwrap();
        let later = now + Duration::minutes(2);
        let expiry = acquire(&mut row, "A1", "sess-1", later, ttl).unwrap();

        assert_eq!(expiry, later + ttl);
        assert_eq!(row.holds.len(), 1);
        assert_eq!(row.holds[0].expires_at, later + ttl);
    }

    #[test]
    fn test_expired_hold_can_be_taken_over() {
        let mut row = empty_row();
        let now = Utc::now();
        let ttl = Duration::minutes(5);

        acquire(&mut row, "A1", "sess-1", now, ttl).unwrap();

        // Exactly at the deadline the hold is no longer active.
        let at_deadline = now + ttl;
        acquire(&mut row, "A1", "sess-2", at_deadline, ttl).unwrap();

        assert_eq!(row.holds.len(), 1);
        assert_eq!(row.holds[0].session_id, "sess-2");
    }

    #[test]
    fn test_sweep_is_idempotent() {
        let mut row = empty_row();
        let now = Utc::now();

        acquire(&mut row, "A1", "sess-1", now, Duration::minutes(5)).unwrap();
        acquire(&mut row, "A2", "sess-2", now, Duration::minutes(1)).unwrap();

        let later = now + Duration::minutes(2);
        assert_eq!(sweep_expired(&mut row, later), 1);
        assert_eq!(sweep_expired(&mut row, later), 0);
        assert_eq!(row.holds.len(), 1);
        assert_eq!(row.holds[0].seat_id, "A1");
    }

    #[test]
    fn test_active_hold_ignores_expired_entries() {
        let mut row = empty_row();
        let now = Utc::now();

        acquire(&mut row, "A1", "sess-1", now, Duration::minutes(5)).unwrap();

        assert!(active_hold(&row, "A1", now).is_some());
        assert!(active_hold(&row, "A1", now + Duration::minutes(5)).is_none());
        assert!(active_hold(&row, "A2", now).is_none());
    }

    #[test]
    fn test_release_session_only_removes_own_holds() {
        let mut row = empty_row();
        let now = Utc::now();
        let ttl = Duration::minutes(5);

        acquire(&mut row, "A1", "sess-1", now, ttl).unwrap();
        acquire(&mut row, "A2", "sess-1", now, ttl).unwrap();
        acquire(&mut row, "A3", "sess-2", now, ttl).unwrap();

        assert_eq!(release_session(&mut row, "sess-1"), 2);
        assert_eq!(row.holds.len(), 1);
        assert_eq!(row.holds[0].session_id, "sess-2");
    }
}
