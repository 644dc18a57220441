use core::cell::UnsafeCell;

use crate::LockPort;

/// State reachable only from inside a locked scope.
///
/// `Guarded<T, P>` owns the protected value and a [`LockPort`]; the value
/// is accessed exclusively through [`enter`](Self::enter) and
/// [`try_enter`](Self::try_enter), which run a closure under the port and
/// release it on the way out — on ordinary returns and on unwinds alike.
/// Compared to a guard-object mutex this removes a failure mode rather
/// than a convenience: a heap operation that could smuggle its guard into
/// caller code could also deadlock the instance, and scoped access makes
/// that unrepresentable.
///
/// # Examples
///
/// ```
/// use heap_sync::{Guarded, SpinPort};
///
/// // a trivial stand-in for allocator state: bytes left in a pool
/// let pool = Guarded::new(SpinPort::new(), 128_usize);
///
/// let taken = pool.enter(|avail| {
///     let take = (*avail).min(32);
///     *avail -= take;
///     take
/// });
/// assert_eq!(taken, 32);
/// assert_eq!(pool.enter(|avail| *avail), 96);
/// ```
///
/// # Concurrency
///
/// The cell is `Send` whenever the state and port are, and `Sync` when the
/// state is `Send` and the port is `Sync`: the port serialises every scope,
/// so sharing the cell never creates two live references to the state.
pub struct Guarded<T, P> {
    /// The lock primitive serialising access.
    port: P,
    /// The protected state.
    state: UnsafeCell<T>,
}

// Safety: scopes are serialised by the port, so a shared cell hands the
// state to one context at a time; the state only needs to be movable.
unsafe impl<T: Send, P: Sync> Sync for Guarded<T, P> {}

/// Releases the port when a scope ends, however it ends.
struct Held<'p, P: LockPort>(&'p P);

impl<P: LockPort> Drop for Held<'_, P> {
    fn drop(&mut self) {
        // Safety: a `Held` is only constructed right after an acquire.
        unsafe { self.0.release() }
    }
}

impl<T, P> Guarded<T, P> {
    /// Pairs `state` with `port`. The port is not acquired.
    pub const fn new(port: P, state: T) -> Self {
        Self {
            port,
            state: UnsafeCell::new(state),
        }
    }

    /// Direct access for an exclusive owner.
    ///
    /// `&mut self` proves no scope can be live, so the port is bypassed.
    #[inline]
    pub const fn get_mut(&mut self) -> &mut T {
        self.state.get_mut()
    }
}

impl<T, P: LockPort> Guarded<T, P> {
    /// Runs `f` with exclusive access to the state, blocking until the
    /// port is acquired.
    ///
    /// The port is released when `f` returns and also when it unwinds.
    #[inline]
    pub fn enter<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        self.port.acquire();
        let held = Held(&self.port);
        // Safety: the port is held; no other scope can be live.
        let out = f(unsafe { &mut *self.state.get() });
        drop(held);
        out
    }

    /// Runs `f` only if the port can be taken without waiting; returns the
    /// closure's result, or `None` when the port is busy.
    #[inline]
    pub fn try_enter<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        if !self.port.try_acquire() {
            return None;
        }
        let held = Held(&self.port);
        // Safety: the port is held; no other scope can be live.
        let out = f(unsafe { &mut *self.state.get() });
        drop(held);
        Some(out)
    }
}
