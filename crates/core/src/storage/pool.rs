//! Bounded session pool for connection-oriented protocols (SFTP, FTP).
//!
//! Sessions are blocking protocol clients. Work runs on tokio's blocking
//! pool with a session checked out for the duration of one closure; the
//! session goes back to the idle list when the closure returns. At most
//! `max_size` sessions exist at once, further callers wait for a permit.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Semaphore;
use tracing::{debug, warn};

use super::error::StorageError;

/// Opens sessions and checks their health. Both methods block.
pub trait SessionManager: Send + Sync + 'static {
    /// Session type handed to pooled operations.
    type Session: Send + 'static;

    /// Connect and authenticate a new session.
    fn connect(&self) -> Result<Self::Session, StorageError>;

    /// Round-trip liveness check for an idle or just-failed session.
    fn is_alive(&self, session: &mut Self::Session) -> bool;
}

/// Pool of reusable sessions with a hard cap on concurrent use.
pub struct SessionPool<M: SessionManager> {
    manager: Arc<M>,
    idle: Arc<Mutex<Vec<M::Session>>>,
    permits: Arc<Semaphore>,
    max_size: usize,
}

impl<M: SessionManager> SessionPool<M> {
    /// Create an empty pool. `max_size` is clamped to at least 1.
    pub fn new(manager: M, max_size: usize) -> Self {
        let max_size = max_size.max(1);
        Self {
            manager: Arc::new(manager),
            idle: Arc::new(Mutex::new(Vec::with_capacity(max_size))),
            permits: Arc::new(Semaphore::new(max_size)),
            max_size,
        }
    }

    /// Largest number of sessions the pool will open.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Sessions currently parked and ready for reuse.
    pub fn idle_count(&self) -> usize {
        self.idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Park `session` as if a previous operation had returned it.
    #[cfg(test)]
    pub(crate) fn park(&self, session: M::Session) {
        self.idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(session);
    }

    /// Run `op` with a checked-out session on the blocking pool.
    ///
    /// An idle session is checked before reuse and replaced if dead. After
    /// `op`, the session returns to the pool when `op` succeeded or when
    /// it still passes the liveness check; otherwise it is dropped.
    pub async fn run<T, F>(&self, op: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&mut M::Session) -> Result<T, StorageError> + Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| StorageError::operation("session pool closed"))?;

        let manager = Arc::clone(&self.manager);
        let idle = Arc::clone(&self.idle);

        tokio::task::spawn_blocking(move || -> Result<T, StorageError> {
            let _permit = permit;

            let parked = idle.lock().unwrap_or_else(PoisonError::into_inner).pop();
            let mut session = match parked {
                Some(mut session) => {
                    if manager.is_alive(&mut session) {
                        session
                    } else {
                        debug!("dropping dead idle session");
                        manager.connect()?
                    }
                }
                None => manager.connect()?,
            };

            let result = op(&mut session);

            if result.is_ok() || manager.is_alive(&mut session) {
                idle.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(session);
            } else {
                warn!("discarding session after failed operation");
            }

            result
        })
        .await
        .map_err(|e| StorageError::operation(format!("session task failed: {e}")))?
    }
}
