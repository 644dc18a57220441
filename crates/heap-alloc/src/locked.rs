//! A lock-port-guarded allocator instance.

use core::alloc::{GlobalAlloc, Layout};
use core::ptr::null_mut;

use heap_sync::{Guarded, LockPort, SpinPort};

use crate::error::AssignError;
use crate::heap::{DEFAULT_ALIGNMENT, Heap};
use crate::region::Region;
#[cfg(feature = "stats")]
use crate::stats::Stats;

/// A [`Heap`] shared between execution contexts.
///
/// Every public operation runs as one scoped [`Guarded::enter`] call:
/// the port is acquired on entry and released on every exit path, failures
/// included, and no lock handle ever escapes an operation. Operations on
/// the same instance serialise; different instances are fully independent.
///
/// `P` is any primitive implementing the [`LockPort`] capability; the
/// bundled [`SpinPort`] is the default. Ports are not reentrant, so nothing
/// here may be called from a context that interrupted an operation on the
/// same instance.
///
/// The type also implements [`GlobalAlloc`], so a static instance can be
/// registered as the Rust global allocator:
///
/// ```ignore
/// #[global_allocator]
/// static HEAP: LockedHeap<16> = LockedHeap::new();
/// // ... assign_regions before the first allocation ...
/// ```
///
/// Layouts requesting alignment beyond `ALIGN` are refused (null).
pub struct LockedHeap<const ALIGN: usize = DEFAULT_ALIGNMENT, P = SpinPort> {
    inner: Guarded<Heap<ALIGN>, P>,
}

impl<const ALIGN: usize> LockedHeap<ALIGN, SpinPort> {
    /// Creates an unassembled spin-guarded instance.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_port(SpinPort::new())
    }
}

impl<const ALIGN: usize> Default for LockedHeap<ALIGN, SpinPort> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const ALIGN: usize, P> LockedHeap<ALIGN, P> {
    /// Creates an unassembled instance guarded by the given port.
    pub const fn with_port(port: P) -> Self {
        Self {
            inner: Guarded::new(port, Heap::new()),
        }
    }
}

impl<const ALIGN: usize, P> LockedHeap<ALIGN, P>
where
    P: LockPort,
{
    /// See [`Heap::assign_regions`].
    ///
    /// # Errors
    /// As for [`Heap::assign_regions`].
    ///
    /// # Safety
    /// As for [`Heap::assign_regions`]. Assignment should complete before
    /// the instance is handed to other contexts.
    pub unsafe fn assign_regions(&self, regions: &[Region]) -> Result<usize, AssignError> {
        // Safety: forwarded contract.
        self.inner.enter(|heap| unsafe { heap.assign_regions(regions) })
    }

    /// See [`Heap::alloc`].
    pub fn alloc(&self, size: usize) -> *mut u8 {
        self.inner.enter(|heap| heap.alloc(size))
    }

    /// See [`Heap::alloc_in`].
    pub fn alloc_in(&self, region: Option<&Region>, size: usize) -> *mut u8 {
        self.inner.enter(|heap| heap.alloc_in(region, size))
    }

    /// See [`Heap::calloc`].
    pub fn calloc(&self, nitems: usize, item_size: usize) -> *mut u8 {
        self.inner.enter(|heap| heap.calloc(nitems, item_size))
    }

    /// See [`Heap::calloc_in`].
    pub fn calloc_in(&self, region: Option<&Region>, nitems: usize, item_size: usize) -> *mut u8 {
        self.inner
            .enter(|heap| heap.calloc_in(region, nitems, item_size))
    }

    /// See [`Heap::realloc`].
    ///
    /// # Safety
    /// As for [`Heap::realloc`].
    pub unsafe fn realloc(&self, ptr: *mut u8, new_size: usize) -> *mut u8 {
        // Safety: forwarded contract.
        self.inner.enter(|heap| unsafe { heap.realloc(ptr, new_size) })
    }

    /// See [`Heap::realloc_in`].
    ///
    /// # Safety
    /// As for [`Heap::realloc`].
    pub unsafe fn realloc_in(
        &self,
        region: Option<&Region>,
        ptr: *mut u8,
        new_size: usize,
    ) -> *mut u8 {
        // Safety: forwarded contract.
        self.inner
            .enter(|heap| unsafe { heap.realloc_in(region, ptr, new_size) })
    }

    /// See [`Heap::realloc_safe`].
    ///
    /// # Safety
    /// As for [`Heap::realloc`].
    pub unsafe fn realloc_safe(&self, ptr: &mut *mut u8, new_size: usize) -> bool {
        // Safety: forwarded contract.
        self.inner
            .enter(|heap| unsafe { heap.realloc_safe(ptr, new_size) })
    }

    /// See [`Heap::realloc_safe_in`].
    ///
    /// # Safety
    /// As for [`Heap::realloc`].
    pub unsafe fn realloc_safe_in(
        &self,
        region: Option<&Region>,
        ptr: &mut *mut u8,
        new_size: usize,
    ) -> bool {
        // Safety: forwarded contract.
        self.inner
            .enter(|heap| unsafe { heap.realloc_safe_in(region, ptr, new_size) })
    }

    /// See [`Heap::free`].
    ///
    /// # Safety
    /// As for [`Heap::free`].
    pub unsafe fn free(&self, ptr: *mut u8) {
        // Safety: forwarded contract.
        self.inner.enter(|heap| unsafe { heap.free(ptr) });
    }

    /// See [`Heap::free_safe`].
    ///
    /// # Safety
    /// As for [`Heap::free`].
    pub unsafe fn free_safe(&self, ptr: &mut *mut u8) {
        // Safety: forwarded contract.
        self.inner.enter(|heap| unsafe { heap.free_safe(ptr) });
    }

    /// See [`Heap::payload_size`].
    ///
    /// # Safety
    /// As for [`Heap::free`].
    pub unsafe fn payload_size(&self, ptr: *mut u8) -> usize {
        // Safety: forwarded contract.
        self.inner.enter(|heap| unsafe { heap.payload_size(ptr) })
    }

    /// See [`Heap::is_assigned`].
    pub fn is_assigned(&self) -> bool {
        self.inner.enter(|heap| heap.is_assigned())
    }

    /// See [`Heap::region_count`].
    pub fn region_count(&self) -> usize {
        self.inner.enter(|heap| heap.region_count())
    }

    /// See [`Heap::available_bytes`].
    pub fn available_bytes(&self) -> usize {
        self.inner.enter(|heap| heap.available_bytes())
    }

    /// See [`Heap::stats`].
    #[cfg(feature = "stats")]
    pub fn stats(&self) -> Stats {
        self.inner.enter(|heap| heap.stats())
    }
}

// Safety: all list and counter mutation happens under the instance lock; the
// allocator hands out exclusive extents, so cross-context use of *different*
// payloads is sound by the usual allocator contract.
unsafe impl<const ALIGN: usize, P> GlobalAlloc for LockedHeap<ALIGN, P>
where
    P: LockPort,
{
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if layout.align() > ALIGN {
            return null_mut();
        }
        LockedHeap::alloc(self, layout.size())
    }

    unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
        // Safety: GlobalAlloc hands back pointers this instance produced.
        unsafe { self.free(ptr) }
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        if layout.align() > ALIGN {
            return null_mut();
        }
        self.calloc(1, layout.size())
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        if layout.align() > ALIGN {
            return null_mut();
        }
        // Safety: GlobalAlloc hands back pointers this instance produced.
        unsafe { LockedHeap::realloc(self, ptr, new_size) }
    }
}
