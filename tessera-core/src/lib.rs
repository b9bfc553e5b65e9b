pub mod clock;
pub mod model;
pub mod repository;

pub use clock::{Clock, ManualClock, SystemClock};
pub use model::{Event, Hold, Row, RowAddress, Section};
pub use repository::{EventRepository, RowLookup, RowSnapshot, StoreError};
