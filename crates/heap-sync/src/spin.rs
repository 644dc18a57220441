use core::hint::spin_loop;
use core::sync::atomic::{AtomicBool, Ordering};

use crate::LockPort;

/// The bundled lock port: a spin lock with capped exponential backoff.
///
/// An allocator's critical section is a list walk plus a handful of header
/// writes, so waiters are expected to get their turn within microseconds.
/// Rather than hammering the flag's cache line, a loser of the race pauses
/// for a doubling number of spin hints before retrying, capped low enough
/// that a release is never missed for long.
///
/// The port is neither fair nor reentrant.
///
/// # Examples
///
/// ```
/// use heap_sync::{LockPort, SpinPort};
///
/// let port = SpinPort::new();
/// port.acquire();
/// assert!(!port.try_acquire());
/// unsafe { port.release() };
/// ```
pub struct SpinPort {
    /// `true` while some context holds the port.
    taken: AtomicBool,
}

impl SpinPort {
    /// Creates a released port.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            taken: AtomicBool::new(false),
        }
    }
}

impl Default for SpinPort {
    fn default() -> Self {
        Self::new()
    }
}

impl LockPort for SpinPort {
    fn acquire(&self) {
        // Retry with doubling pauses between attempts, capped at 64 hints.
        let mut pause = 1_u32;
        while !self.try_acquire() {
            for _ in 0..pause {
                spin_loop();
            }
            if pause < 64 {
                pause <<= 1;
            }
        }
    }

    #[inline]
    fn try_acquire(&self) -> bool {
        self.taken
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    #[inline]
    unsafe fn release(&self) {
        self.taken.store(false, Ordering::Release);
    }
}
