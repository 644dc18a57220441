//! Grow-only allocation for extremely constrained deployments.

use core::ptr::null_mut;

use log::trace;

use crate::align::checked_align_up;
use crate::error::AssignError;
use crate::region::{self, Region};

/// A bump allocator over a single caller-supplied region.
///
/// Where even free-list metadata is too much, this mode serves requests by
/// advancing a cursor through one region: no per-allocation header, no
/// release, no resize — those surfaces simply do not exist on the type.
/// Memory comes back only when the whole instance is abandoned.
///
/// `ALIGN` must be a power of two; unlike [`Heap`](crate::Heap) there is no
/// header to align, so word alignment is not required.
pub struct BumpHeap<const ALIGN: usize = { crate::DEFAULT_ALIGNMENT }> {
    /// Next payload address handed out.
    next: *mut u8,
    /// Bytes remaining in the region.
    available: usize,
    /// 1 once a region is assigned.
    region_count: usize,
}

// Safety: the instance exclusively owns its region memory; the cursor is
// only moved through &mut methods.
unsafe impl<const ALIGN: usize> Send for BumpHeap<ALIGN> {}

impl<const ALIGN: usize> Default for BumpHeap<ALIGN> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const ALIGN: usize> BumpHeap<ALIGN> {
    const ALIGN_OK: () = assert!(ALIGN.is_power_of_two(), "ALIGN must be a power of two");

    /// Creates an unassembled instance.
    #[must_use]
    pub const fn new() -> Self {
        let () = Self::ALIGN_OK;
        Self {
            next: null_mut(),
            available: 0,
            region_count: 0,
        }
    }

    /// Adopts the caller's region. Exactly one region is accepted; a longer
    /// list fails the assignment as a whole.
    ///
    /// Returns the number of regions linked (always 1 on success).
    ///
    /// # Errors
    /// See [`AssignError`]. As for the full mode, nothing is mutated on
    /// error and assignment is one-shot.
    ///
    /// # Safety
    /// As for [`Heap::assign_regions`](crate::Heap::assign_regions): the
    /// extent must be valid, exclusive, and outlive the instance.
    pub unsafe fn assign_regions(&mut self, regions: &[Region]) -> Result<usize, AssignError> {
        if self.region_count > 0 {
            return Err(AssignError::AlreadyAssigned);
        }
        region::validate_list(regions)?;
        if regions.len() > 1 {
            return Err(AssignError::TooManyRegions);
        }

        let (base, size) = regions[0].normalized(ALIGN);
        if size == 0 {
            return Err(AssignError::NoUsableRegion);
        }
        self.next = base as *mut u8;
        self.available = size;
        self.region_count = 1;
        trace!("bump region at {base:#x}: {size} bytes after normalisation");
        Ok(1)
    }

    /// Whether a region has been assigned.
    #[must_use]
    pub const fn is_assigned(&self) -> bool {
        self.region_count > 0
    }

    /// Bytes still available to the cursor.
    #[must_use]
    pub const fn available_bytes(&self) -> usize {
        self.available
    }

    /// Allocates `size` bytes by bumping the cursor, or returns null when
    /// the request is empty, the instance is unassembled, or the region is
    /// exhausted. Nothing is written to the region.
    pub fn alloc(&mut self, size: usize) -> *mut u8 {
        if !self.is_assigned() || size == 0 {
            return null_mut();
        }
        let Some(alloc_size) = checked_align_up(size, ALIGN) else {
            return null_mut();
        };
        if alloc_size > self.available {
            return null_mut();
        }
        let payload = self.next;
        // Safety: the cursor stays within (or one past) the adopted extent.
        self.next = unsafe { self.next.add(alloc_size) };
        self.available -= alloc_size;
        payload
    }

    /// Zero-filled variant of [`alloc`](Self::alloc); rejects
    /// `nitems * item_size` overflow.
    pub fn calloc(&mut self, nitems: usize, item_size: usize) -> *mut u8 {
        let Some(total) = nitems.checked_mul(item_size) else {
            return null_mut();
        };
        let payload = self.alloc(total);
        if !payload.is_null() {
            // Safety: a successful allocation spans at least `total` bytes.
            unsafe { payload.write_bytes(0, total) };
        }
        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestArena;

    type TestBump = BumpHeap<4>;

    fn with_bump(size: usize, f: impl FnOnce(&mut TestBump)) {
        let arena = TestArena::new(size);
        let mut bump = TestBump::new();
        let linked =
            unsafe { bump.assign_regions(&[Region::new(arena.ptr(), size)]) }.unwrap();
        assert_eq!(linked, 1);
        f(&mut bump);
    }

    #[test]
    fn region_cap_is_enforced() {
        with_bump(64, |bump| {
            assert_eq!(bump.available_bytes(), 64);
            let a = bump.alloc(32);
            let b = bump.alloc(32);
            assert!(!a.is_null() && !b.is_null());
            assert!(bump.alloc(4).is_null(), "region exhausted");
            assert_eq!(bump.available_bytes(), 0);
        });
    }

    #[test]
    fn allocations_are_contiguous_and_aligned() {
        with_bump(64, |bump| {
            let a = bump.alloc(3);
            let b = bump.alloc(1);
            assert_eq!(unsafe { a.add(4) }, b, "sizes round up to the alignment");
            assert_eq!(a as usize % 4, 0);
            assert_eq!(b as usize % 4, 0);
        });
    }

    #[test]
    fn a_second_region_fails_the_whole_assignment() {
        let arena = TestArena::new(256);
        let mut bump = TestBump::new();
        let regions = [
            Region::new(arena.ptr(), 64),
            Region::new(unsafe { arena.ptr().add(128) }, 64),
        ];
        let res = unsafe { bump.assign_regions(&regions) };
        assert_eq!(res, Err(AssignError::TooManyRegions));
        assert!(!bump.is_assigned(), "failed assignment leaves no state");
    }

    #[test]
    fn unassembled_and_zero_size_requests_fail() {
        let mut bump = TestBump::new();
        assert!(bump.alloc(8).is_null());
        with_bump(64, |bump| {
            assert!(bump.alloc(0).is_null());
            assert!(bump.calloc(usize::MAX, 2).is_null());
        });
    }

    #[test]
    fn calloc_zeroes_the_payload() {
        with_bump(64, |bump| {
            let p = bump.calloc(4, 4);
            assert!(!p.is_null());
            for i in 0..16 {
                assert_eq!(unsafe { *p.add(i) }, 0);
            }
        });
    }
}
