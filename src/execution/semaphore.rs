use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// A small, blocking counting semaphore bounding how many files are processed at once.
pub struct Semaphore {
    permits: Mutex<usize>,
    cv: Condvar,
}

/// Held while a file is in flight; returns its permit on drop.
pub struct Permit<'a> {
    sem: &'a Semaphore,
}

impl Semaphore {
    pub fn new(permits: usize) -> Self {
        assert!(permits > 0, "permits must be > 0");
        Self {
            permits: Mutex::new(permits),
            cv: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, usize> {
        self.permits.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until a permit is available.
    ///
    /// Returns the permit and the time spent waiting (zero if none was available immediately).
    pub fn acquire(&self) -> (Permit<'_>, Duration) {
        let start = Instant::now();
        let mut g = self.lock();
        let waited = *g == 0;
        while *g == 0 {
            g = self.cv.wait(g).unwrap_or_else(PoisonError::into_inner);
        }
        *g -= 1;
        let wait = if waited { start.elapsed() } else { Duration::ZERO };
        (Permit { sem: self }, wait)
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        *self.sem.lock() += 1;
        self.sem.cv.notify_one();
    }
}
