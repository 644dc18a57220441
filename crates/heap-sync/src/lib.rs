//! # Lock port for guarded allocator instances
//!
//! An allocator instance shared between execution contexts needs mutual
//! exclusion, but which primitive provides it depends on the deployment: a
//! spin loop on bare metal, an RTOS mutex behind a port layer, nothing at
//! all in single-threaded firmware. This crate fixes the *shape* of the
//! guarding and leaves the primitive pluggable:
//!
//! - [`LockPort`] is the capability an instance demands from its lock:
//!   blocking acquire, non-blocking attempt, release. Creation is the
//!   port's constructor and destruction its [`Drop`], so a constructed port
//!   is valid by definition.
//! - [`Guarded`] pairs a port with the protected state and only ever hands
//!   the state out for the duration of a closure. Allocator operations are
//!   short bounded walks; nothing legitimate needs to carry a lock out of
//!   the call that took it, so there is no guard object to leak, park, or
//!   hold across calls — the lock provably drops before control returns.
//! - [`SpinPort`] is the bundled primitive: a spin lock with capped
//!   exponential backoff, sized for critical sections of a few dozen
//!   header reads and writes.
//!
//! Acquisition is unbounded; there are no timeouts and no cancellation
//! points. Ports are neither fair nor reentrant — an operation that
//! re-enters its own instance deadlocks, which is why guarded instances
//! must never be driven from a context that interrupted one of their own
//! operations.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod guarded;
mod spin;

pub use guarded::Guarded;
pub use spin::SpinPort;

/// The lock capability an allocator instance requires.
///
/// Implement this over an OS or RTOS primitive to guard instances with it;
/// the allocator itself only ever calls these three operations.
pub trait LockPort {
    /// Blocks until the port is held by the caller.
    fn acquire(&self);

    /// Takes the port only if that needs no waiting; `true` on success.
    fn try_acquire(&self) -> bool;

    /// Releases the port.
    ///
    /// # Safety
    /// The caller must currently hold the port.
    unsafe fn release(&self);
}
