use std::sync::Arc;
use tessera_reserve::ReservationService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ReservationService>,
}
