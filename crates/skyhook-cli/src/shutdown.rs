use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// Stop request shared between the tick loop, the keyboard thread and the
/// Ctrl+C handler. Waits on it return early the moment a stop arrives, so
/// the slow searching interval never delays shutdown.
pub struct StopSignal {
    requested: AtomicBool,
    condvar: Condvar,
    gate: Mutex<()>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self {
            requested: AtomicBool::new(false),
            condvar: Condvar::new(),
            gate: Mutex::new(()),
        }
    }

    /// Request a stop and wake every waiting thread.
    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
        self.condvar.notify_all();
    }

    pub fn requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Sleep for `duration` unless a stop arrives first. Returns `true`
    /// when a stop was requested.
    pub fn wait_for(&self, duration: Duration) -> bool {
        if self.requested() {
            return true;
        }
        let guard = self.gate.lock().unwrap();
        match self
            .condvar
            .wait_timeout_while(guard, duration, |_| !self.requested())
        {
            Ok((_, timeout)) => !timeout.timed_out(),
            // Poisoned gate: some thread panicked, stop everything.
            Err(_) => true,
        }
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_starts_unrequested() {
        let signal = StopSignal::new();
        assert!(!signal.requested());
    }

    #[test]
    fn test_wait_completes_without_stop() {
        let signal = StopSignal::new();
        let start = Instant::now();
        assert!(!signal.wait_for(Duration::from_millis(30)));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_wait_returns_immediately_when_already_stopped() {
        let signal = StopSignal::new();
        signal.request();
        let start = Instant::now();
        assert!(signal.wait_for(Duration::from_secs(10)));
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn test_request_interrupts_waiting_thread() {
        let signal = Arc::new(StopSignal::new());
        let waiter = Arc::clone(&signal);
        let handle = thread::spawn(move || waiter.wait_for(Duration::from_secs(10)));

        thread::sleep(Duration::from_millis(50));
        signal.request();

        assert!(handle.join().unwrap());
    }
}
