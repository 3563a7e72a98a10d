//! At-most-once shutdown guard

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

use crate::ShutdownTrigger;

/// Forwards only the first shutdown request to the wrapped trigger.
///
/// Later requests are logged and dropped, so the shutdown action runs at
/// most once per process lifetime no matter how many paths ask for it.
pub struct OnceShutdown {
    inner: Arc<dyn ShutdownTrigger>,
    fired: AtomicBool,
}

impl OnceShutdown {
    pub fn new(inner: Arc<dyn ShutdownTrigger>) -> Self {
        Self {
            inner,
            fired: AtomicBool::new(false),
        }
    }

    /// Whether the shutdown has already been requested
    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }
}

impl ShutdownTrigger for OnceShutdown {
    fn request_shutdown(&self) {
        if self.fired.swap(true, Ordering::SeqCst) {
            warn!("Shutdown already requested, ignoring");
            return;
        }
        info!("Requesting shutdown");
        self.inner.request_shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockShutdown;

    #[test]
    fn forwards_only_first_request() {
        let mock = Arc::new(MockShutdown::new());
        let once = OnceShutdown::new(mock.clone());

        assert!(!once.has_fired());
        once.request_shutdown();
        once.request_shutdown();
        once.request_shutdown();

        assert!(once.has_fired());
        assert_eq!(mock.requests(), 1);
    }

    #[test]
    fn concurrent_requests_fire_once() {
        let mock = Arc::new(MockShutdown::new());
        let once = Arc::new(OnceShutdown::new(mock.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let once = once.clone();
                std::thread::spawn(move || once.request_shutdown())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(mock.requests(), 1);
    }
}
