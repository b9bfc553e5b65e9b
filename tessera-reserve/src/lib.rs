pub mod booking;
pub mod locks;

pub use booking::{NotFoundKind, PurchaseOutcome, ReservationService, ReserveError};
pub use locks::LockError;
