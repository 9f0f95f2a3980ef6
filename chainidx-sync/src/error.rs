//! Error kinds the sync manager can raise. Connect and handshake failures
//! are recoverable (the caller reconnects with backoff); storage failures
//! are fatal to the current ingest round.

use chainidx_network::ConnectError;
use chainidx_state::StorageError;

#[derive(thiserror::Error, Debug)]
pub enum SyncError {
    #[error("peer connection failed: {0}")]
    Connect(#[from] ConnectError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("received a block extending an orphan chain whose ancestor isn't in storage")]
    OrphanAncestorMissing,
}

pub type Result<T> = std::result::Result<T, SyncError>;

/// Exponential backoff for peer reconnection: doubles the wait on every
/// failed session instead of retrying immediately forever.
#[derive(Clone, Copy, Debug)]
pub struct Backoff {
    current: std::time::Duration,
    ceiling: std::time::Duration,
}

impl Backoff {
    pub fn new() -> Backoff {
        Backoff {
            current: std::time::Duration::from_secs(1),
            ceiling: std::time::Duration::from_secs(60),
        }
    }

    /// The duration to wait before the next attempt, doubling on each call
    /// after the first, capped at the ceiling.
    pub fn next(&mut self) -> std::time::Duration {
        let wait = self.current;
        self.current = (self.current * 2).min(self.ceiling);
        wait
    }

    pub fn reset(&mut self) {
        self.current = std::time::Duration::from_secs(1);
    }
}

impl Default for Backoff {
    fn default() -> Backoff {
        Backoff::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn doubles_up_to_a_ceiling() {
        let mut b = Backoff::new();
        assert_eq!(b.next(), Duration::from_secs(1));
        assert_eq!(b.next(), Duration::from_secs(2));
        assert_eq!(b.next(), Duration::from_secs(4));
        for _ in 0..10 {
            b.next();
        }
        assert_eq!(b.next(), Duration::from_secs(60));
    }

    #[test]
    fn reset_returns_to_the_initial_wait() {
        let mut b = Backoff::new();
        b.next();
        b.next();
        b.reset();
        assert_eq!(b.next(), Duration::from_secs(1));
    }
}
