use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::error::MetaError;

/// A cancellation/deadline signal, checked before any KV call. Plain
/// `Arc<AtomicBool>` plus an optional deadline rather than a full async
/// runtime primitive, since the table itself is synchronous.
#[derive(Clone)]
pub struct Cancellation {
    canceled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Cancellation {
    /// A signal that never cancels and never expires.
    pub fn none() -> Self {
        Cancellation { canceled: Arc::new(AtomicBool::new(false)), deadline: None }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Cancellation { canceled: Arc::new(AtomicBool::new(false)), deadline: Some(deadline) }
    }

    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Returns an error if the signal has fired, without mutating state.
    pub fn check(&self) -> Result<(), MetaError> {
        if self.is_canceled() {
            return Err(MetaError::Canceled);
        }
        if self.is_expired() {
            return Err(MetaError::DeadlineExceeded);
        }
        Ok(())
    }
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_is_observed() {
        let c = Cancellation::none();
        assert!(c.check().is_ok());
        c.cancel();
        assert!(matches!(c.check(), Err(MetaError::Canceled)));
    }

    #[test]
    fn deadline_in_the_past_is_expired() {
        let c = Cancellation::with_deadline(Instant::now() - std::time::Duration::from_secs(1));
        assert!(matches!(c.check(), Err(MetaError::DeadlineExceeded)));
    }
}
