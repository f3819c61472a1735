use std::ops::Deref;
use std::sync::Arc;

use finquery_core::{FinQueryError, FinQueryResult};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use crate::store::ContentStore;

/// Shared, bounded pool of store connections.
///
/// Each externally-visible operation (ingest run, retrieval, answer
/// composition) performs exactly one [`checkout`](StorePool::checkout)
/// and holds the returned [`StoreConn`] for its duration. The permit is
/// released when the guard drops, on every exit path.
pub struct StorePool {
    store: Arc<dyn ContentStore>,
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl StorePool {
    /// Create a pool over `store` allowing at most `max_connections`
    /// concurrent checkouts.
    pub fn new(store: Arc<dyn ContentStore>, max_connections: usize) -> Self {
        let capacity = max_connections.max(1);
        Self {
            store,
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Check out a store connection, waiting if the pool is exhausted.
    pub async fn checkout(&self) -> FinQueryResult<StoreConn> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|e| FinQueryError::Store(format!("Store pool closed: {e}")))?;
        debug!(
            available = self.permits.available_permits(),
            capacity = self.capacity,
            "Store connection checked out"
        );
        Ok(StoreConn {
            store: Arc::clone(&self.store),
            _permit: permit,
        })
    }

    /// Number of connections currently available for checkout.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

/// A checked-out store connection. Dereferences to the underlying
/// [`ContentStore`]; dropping it returns the connection to the pool.
pub struct StoreConn {
    store: Arc<dyn ContentStore>,
    _permit: OwnedSemaphorePermit,
}

impl Deref for StoreConn {
    type Target = dyn ContentStore;

    fn deref(&self) -> &Self::Target {
        self.store.as_ref()
    }
}
