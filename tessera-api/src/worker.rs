use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, info};

use tessera_core::repository::{EventRepository, RowLookup, StoreError};
use tessera_core::Clock;
use tessera_reserve::locks;

/// Periodic reaper for expired holds.
///
/// Sweeping on the request path is what correctness relies on; this loop only
/// bounds the growth of stale holds on rows nobody is touching.
pub async fn start_sweep_worker(
    repo: Arc<dyn EventRepository>,
    clock: Arc<dyn Clock>,
    interval: Duration,
) {
    info!("Hold sweep worker started, interval {:?}", interval);

    loop {
        sleep(interval).await;
        if let Err(e) = sweep_pass(repo.as_ref(), clock.as_ref()).await {
            error!("Hold sweep pass failed: {}", e);
        }
    }
}

async fn sweep_pass(repo: &dyn EventRepository, clock: &dyn Clock) -> Result<(), StoreError> {
    let now = clock.now();

    for addr in repo.row_addresses().await? {
        let RowLookup::Found(snapshot) = repo.load_row(&addr).await? else {
            continue;
        };

        let mut row = snapshot.row;
        if locks::sweep_expired(&mut row, now) == 0 {
            continue;
        }

        // Best effort: a lost revision race means the request path got there
        // first, which sweeps anyway.
        if repo.store_row(&addr, snapshot.revision, row).await? {
            debug!(row = %addr, "swept expired holds");
        }
    }

    Ok(())
}
