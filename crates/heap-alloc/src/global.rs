//! The process-wide default instance and its short-form API.
//!
//! A single spin-guarded instance at the crate's default alignment, living
//! for the whole program. Every function here forwards to it; callers that
//! need several independent heaps, another alignment, or another lock
//! primitive construct their own [`Heap`](crate::Heap) or
//! [`LockedHeap`](crate::LockedHeap) instead.

use crate::error::AssignError;
use crate::locked::LockedHeap;
use crate::region::Region;
#[cfg(feature = "stats")]
use crate::stats::Stats;

/// The process-wide default instance.
static DEFAULT: LockedHeap = LockedHeap::new();

/// Direct access to the default instance, for callers that want to pass it
/// around like any other [`LockedHeap`].
#[must_use]
pub fn default_instance() -> &'static LockedHeap {
    &DEFAULT
}

/// [`LockedHeap::assign_regions`] on the default instance.
///
/// # Errors
/// As for [`Heap::assign_regions`](crate::Heap::assign_regions).
///
/// # Safety
/// As for [`Heap::assign_regions`](crate::Heap::assign_regions); with a
/// `'static` instance the backing regions must live for the rest of the
/// program.
pub unsafe fn assign_regions(regions: &[Region]) -> Result<usize, AssignError> {
    // Safety: forwarded contract.
    unsafe { DEFAULT.assign_regions(regions) }
}

/// [`LockedHeap::alloc`] on the default instance.
#[must_use]
pub fn alloc(size: usize) -> *mut u8 {
    DEFAULT.alloc(size)
}

/// [`LockedHeap::alloc_in`] on the default instance.
#[must_use]
pub fn alloc_in(region: Option<&Region>, size: usize) -> *mut u8 {
    DEFAULT.alloc_in(region, size)
}

/// [`LockedHeap::calloc`] on the default instance.
#[must_use]
pub fn calloc(nitems: usize, item_size: usize) -> *mut u8 {
    DEFAULT.calloc(nitems, item_size)
}

/// [`LockedHeap::calloc_in`] on the default instance.
#[must_use]
pub fn calloc_in(region: Option<&Region>, nitems: usize, item_size: usize) -> *mut u8 {
    DEFAULT.calloc_in(region, nitems, item_size)
}

/// [`LockedHeap::realloc`] on the default instance.
///
/// # Safety
/// As for [`Heap::realloc`](crate::Heap::realloc).
pub unsafe fn realloc(ptr: *mut u8, new_size: usize) -> *mut u8 {
    // Safety: forwarded contract.
    unsafe { DEFAULT.realloc(ptr, new_size) }
}

/// [`LockedHeap::realloc_in`] on the default instance.
///
/// # Safety
/// As for [`Heap::realloc`](crate::Heap::realloc).
pub unsafe fn realloc_in(region: Option<&Region>, ptr: *mut u8, new_size: usize) -> *mut u8 {
    // Safety: forwarded contract.
    unsafe { DEFAULT.realloc_in(region, ptr, new_size) }
}

/// [`LockedHeap::realloc_safe`] on the default instance.
///
/// # Safety
/// As for [`Heap::realloc`](crate::Heap::realloc).
pub unsafe fn realloc_safe(ptr: &mut *mut u8, new_size: usize) -> bool {
    // Safety: forwarded contract.
    unsafe { DEFAULT.realloc_safe(ptr, new_size) }
}

/// [`LockedHeap::realloc_safe_in`] on the default instance.
///
/// # Safety
/// As for [`Heap::realloc`](crate::Heap::realloc).
pub unsafe fn realloc_safe_in(
    region: Option<&Region>,
    ptr: &mut *mut u8,
    new_size: usize,
) -> bool {
    // Safety: forwarded contract.
    unsafe { DEFAULT.realloc_safe_in(region, ptr, new_size) }
}

/// [`LockedHeap::free`] on the default instance.
///
/// # Safety
/// As for [`Heap::free`](crate::Heap::free).
pub unsafe fn free(ptr: *mut u8) {
    // Safety: forwarded contract.
    unsafe { DEFAULT.free(ptr) }
}

/// [`LockedHeap::free_safe`] on the default instance.
///
/// # Safety
/// As for [`Heap::free`](crate::Heap::free).
pub unsafe fn free_safe(ptr: &mut *mut u8) {
    // Safety: forwarded contract.
    unsafe { DEFAULT.free_safe(ptr) }
}

/// [`LockedHeap::payload_size`] on the default instance.
///
/// # Safety
/// As for [`Heap::free`](crate::Heap::free).
#[must_use]
pub unsafe fn payload_size(ptr: *mut u8) -> usize {
    // Safety: forwarded contract.
    unsafe { DEFAULT.payload_size(ptr) }
}

/// [`LockedHeap::available_bytes`] on the default instance.
#[must_use]
pub fn available_bytes() -> usize {
    DEFAULT.available_bytes()
}

/// [`LockedHeap::region_count`] on the default instance.
#[must_use]
pub fn region_count() -> usize {
    DEFAULT.region_count()
}

/// [`LockedHeap::is_assigned`] on the default instance.
#[must_use]
pub fn is_assigned() -> bool {
    DEFAULT.is_assigned()
}

/// [`LockedHeap::stats`] on the default instance.
#[cfg(feature = "stats")]
#[must_use]
pub fn stats() -> Stats {
    DEFAULT.stats()
}
