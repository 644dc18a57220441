//! Resizing: in place where a neighbour allows it, relocating otherwise.
//!
//! Growth prefers, in order: absorbing the adjacent free successor (the
//! payload address survives), absorbing the adjacent free predecessor, then
//! both neighbours (payload moves down via an overlapping copy), and only
//! then a fresh allocate-copy-free. Absorbed neighbours are unlinked
//! directly and never travel through the insert path, so freed-payload
//! zeroing cannot touch payload that is being moved.

use core::ptr::{self, null_mut};

use crate::block::{ALLOC_BIT, BlockHeader, USED_MARK, is_live_allocated};
use crate::heap::Heap;
use crate::region::Region;

impl<const ALIGN: usize> Heap<ALIGN> {
    /// Resizes the allocation at `ptr` to `new_size` payload bytes.
    ///
    /// The combinations of null/zero arguments follow the conventional
    /// contract: `(null, n)` allocates, `(p, 0)` frees and returns null,
    /// `(null, 0)` is a no-op returning null. A pointer that fails the
    /// in-use check yields null with no state change, as does a size that
    /// cannot be represented.
    ///
    /// On success the returned pointer addresses at least `new_size` bytes
    /// with the previous payload's prefix preserved. On allocation failure
    /// null is returned and **the old allocation stays valid**.
    ///
    /// A resize to the block's current (aligned) size returns `ptr`
    /// untouched; in particular the `clean-memory` hook does not run for it.
    ///
    /// # Safety
    /// `ptr` must be null or a payload pointer obtained from this instance.
    pub unsafe fn realloc(&mut self, ptr: *mut u8, new_size: usize) -> *mut u8 {
        // Safety: forwarded contract.
        unsafe { self.realloc_in(None, ptr, new_size) }
    }

    /// Like [`realloc`](Self::realloc); a relocating resize allocates the
    /// replacement block under the given region pin.
    ///
    /// # Safety
    /// As for [`realloc`](Self::realloc).
    pub unsafe fn realloc_in(
        &mut self,
        region: Option<&Region>,
        ptr: *mut u8,
        new_size: usize,
    ) -> *mut u8 {
        if new_size == 0 {
            // Safety: forwarded contract.
            if !ptr.is_null() {
                unsafe { self.free(ptr) };
            }
            return null_mut();
        }
        if ptr.is_null() {
            return self.alloc_in(region, new_size);
        }

        let Some(final_size) = Self::request_size(new_size) else {
            return null_mut();
        };

        // Safety: per contract the header sits one footprint below `ptr`.
        unsafe {
            let block = ptr.sub(Self::BLOCK_META_SIZE).cast::<BlockHeader>();
            if !is_live_allocated(block) {
                return null_mut();
            }
            let block_size = (*block).size & !ALLOC_BIT;

            if final_size == block_size {
                return ptr;
            }

            let (prev_prev, prev) = self.neighbours(block);
            let succ = (*prev).next;

            if final_size < block_size {
                self.shrink_block(block, block_size, final_size, prev, succ);
                return ptr;
            }
            self.grow_block(
                region, block, block_size, final_size, new_size, prev_prev, prev, succ,
            )
        }
    }

    /// Like [`realloc`](Self::realloc), but reports success as a flag and
    /// updates the caller's pointer in place: on success `*ptr` holds the
    /// (possibly relocated) payload, or null after a zero-size release; on
    /// failure `*ptr` is untouched and still valid.
    ///
    /// # Safety
    /// As for [`realloc`](Self::realloc).
    pub unsafe fn realloc_safe(&mut self, ptr: &mut *mut u8, new_size: usize) -> bool {
        // Safety: forwarded contract.
        unsafe { self.realloc_safe_in(None, ptr, new_size) }
    }

    /// Region-pinned variant of [`realloc_safe`](Self::realloc_safe).
    ///
    /// # Safety
    /// As for [`realloc`](Self::realloc).
    pub unsafe fn realloc_safe_in(
        &mut self,
        region: Option<&Region>,
        ptr: &mut *mut u8,
        new_size: usize,
    ) -> bool {
        // Safety: forwarded contract.
        unsafe {
            if new_size == 0 {
                if !(*ptr).is_null() {
                    self.free(*ptr);
                }
                *ptr = null_mut();
                return true;
            }
            let fresh = self.realloc_in(region, *ptr, new_size);
            if fresh.is_null() {
                return false;
            }
            *ptr = fresh;
        }
        true
    }

    /// Last list node strictly below `block` and the node before it.
    ///
    /// The returned `prev` may be the sentinel (no free block below); in
    /// that case `prev_prev` is null. Otherwise `prev_prev` is a valid node.
    fn neighbours(&mut self, block: *mut BlockHeader) -> (*mut BlockHeader, *mut BlockHeader) {
        let mut prev_prev: *mut BlockHeader = null_mut();
        let mut prev: *mut BlockHeader = &raw mut self.start;
        // Safety: the chain holds valid headers until its null terminator.
        unsafe {
            while !(*prev).next.is_null() && ((*prev).next as usize) < block as usize {
                prev_prev = prev;
                prev = (*prev).next;
            }
        }
        (prev_prev, prev)
    }

    /// Shrink in place: split off a tail block when the spare room can hold
    /// one; otherwise donate the spare bytes to an immediately adjacent free
    /// successor by sliding its header downwards; otherwise leave the block
    /// at its current size.
    ///
    /// # Safety
    /// `block` is a live allocated block of `block_size` total bytes;
    /// `prev`/`succ` are its free-list neighbours as found by `neighbours`.
    unsafe fn shrink_block(
        &mut self,
        block: *mut BlockHeader,
        block_size: usize,
        final_size: usize,
        prev: *mut BlockHeader,
        succ: *mut BlockHeader,
    ) {
        let spare = block_size - final_size;
        // Safety: per contract; all derived pointers stay inside the block's
        // region.
        unsafe {
            if spare >= Self::BLOCK_META_SIZE {
                self.split_if_oversized(block, final_size);
            } else if !succ.is_null()
                && (*succ).size > 0
                && (block as usize) + block_size == succ as usize
            {
                // Slide the successor's header down over the spare bytes.
                // End markers are pinned in place and excluded above.
                let moved = (succ as usize - spare) as *mut BlockHeader;
                ptr::write(
                    moved,
                    BlockHeader {
                        next: (*succ).next,
                        size: (*succ).size + spare,
                    },
                );
                (*prev).next = moved;
                (*block).size = final_size | ALLOC_BIT;
                self.available += spare;
            }
            // Too little spare and nowhere to put it: keep the size as is.
        }
    }

    /// Growth cases, evaluated in order: successor, predecessor, both,
    /// relocate.
    #[allow(clippy::too_many_arguments)]
    unsafe fn grow_block(
        &mut self,
        region: Option<&Region>,
        block: *mut BlockHeader,
        block_size: usize,
        final_size: usize,
        new_size: usize,
        prev_prev: *mut BlockHeader,
        prev: *mut BlockHeader,
        succ: *mut BlockHeader,
    ) -> *mut u8 {
        let sentinel: *const BlockHeader = &raw const self.start;
        // Safety: per contract; neighbour adjacency is established by
        // address arithmetic before any of the pointers is written through.
        unsafe {
            let succ_usable = !succ.is_null() && (*succ).size > 0;
            let succ_adjacent = succ_usable && (block as usize) + block_size == succ as usize;
            let succ_size = if succ_usable { (*succ).size } else { 0 };

            let prev_is_block = !ptr::eq(prev, sentinel);
            let prev_adjacent =
                prev_is_block && (prev as usize) + (*prev).size == block as usize;
            let prev_size = if prev_is_block { (*prev).size } else { 0 };

            // Absorb the free successor: the payload stays put.
            if succ_adjacent && block_size + succ_size >= final_size {
                (*prev).next = (*succ).next;
                self.available -= succ_size;
                (*block).size = (block_size + succ_size) | ALLOC_BIT;
                self.split_if_oversized(block, final_size);
                #[cfg(feature = "stats")]
                self.note_grow();
                return block.cast::<u8>().add(Self::BLOCK_META_SIZE);
            }

            // Absorb the free predecessor: payload slides down, overlapping.
            if prev_adjacent && prev_size + block_size >= final_size {
                let payload_len = block_size - Self::BLOCK_META_SIZE;
                ptr::copy(
                    block.cast::<u8>().add(Self::BLOCK_META_SIZE),
                    prev.cast::<u8>().add(Self::BLOCK_META_SIZE),
                    payload_len,
                );
                (*prev_prev).next = (*prev).next;
                self.available -= prev_size;
                (*prev).size = (prev_size + block_size) | ALLOC_BIT;
                (*prev).next = USED_MARK;
                self.split_if_oversized(prev, final_size);
                #[cfg(feature = "stats")]
                self.note_grow();
                return prev.cast::<u8>().add(Self::BLOCK_META_SIZE);
            }

            // Absorb both neighbours at once.
            if prev_adjacent && succ_adjacent && prev_size + block_size + succ_size >= final_size
            {
                let payload_len = block_size - Self::BLOCK_META_SIZE;
                ptr::copy(
                    block.cast::<u8>().add(Self::BLOCK_META_SIZE),
                    prev.cast::<u8>().add(Self::BLOCK_META_SIZE),
                    payload_len,
                );
                (*prev_prev).next = (*succ).next;
                self.available -= prev_size + succ_size;
                (*prev).size = (prev_size + block_size + succ_size) | ALLOC_BIT;
                (*prev).next = USED_MARK;
                self.split_if_oversized(prev, final_size);
                #[cfg(feature = "stats")]
                self.note_grow();
                return prev.cast::<u8>().add(Self::BLOCK_META_SIZE);
            }

            // Relocate: only free the old block once the new one exists.
            let fresh = self.alloc_in(region, new_size);
            if fresh.is_null() {
                return null_mut();
            }
            let old_payload = block_size - Self::BLOCK_META_SIZE;
            ptr::copy_nonoverlapping(
                block.cast::<u8>().add(Self::BLOCK_META_SIZE).cast_const(),
                fresh,
                old_payload.min(new_size),
            );
            self.free(block.cast::<u8>().add(Self::BLOCK_META_SIZE));
            fresh
        }
    }
}


#[cfg(all(test, target_pointer_width = "64"))]
mod narrow_alignment_tests {
    //! At alignment 8 the metadata footprint is 16 bytes, so a shrink can
    //! leave spare room too small for a tail block. These paths depend on
    //! `ALIGN < M` and are exercised on 64-bit hosts only.

    use crate::Heap;
    use crate::test_support::TestArena;

    type NarrowHeap = Heap<8>;
    const M: usize = NarrowHeap::BLOCK_META_SIZE;

    fn with_narrow_heap(size: usize, f: impl FnOnce(&mut NarrowHeap)) {
        let arena = TestArena::new(size);
        let mut heap = NarrowHeap::new();
        let linked =
            unsafe { heap.assign_regions(&[crate::Region::new(arena.ptr(), size)]) }.unwrap();
        assert_eq!(linked, 1);
        f(&mut heap);
    }

    #[test]
    fn small_shrink_donates_spare_to_adjacent_successor() {
        with_narrow_heap(256, |heap| {
            let total = 256 - M;
            let a = heap.alloc(16); // block of 32: 16 payload + 16 header
            assert!(!a.is_null());
            assert_eq!(heap.available_bytes(), total - 32);

            // 8 spare bytes cannot host a block; the free successor slides
            // down and grows by them instead
            let q = unsafe { heap.realloc(a, 8) };
            assert_eq!(q, a);
            assert_eq!(unsafe { heap.payload_size(a) }, 8);
            assert_eq!(heap.available_bytes(), total - 24);
        });
    }

    #[test]
    fn small_shrink_with_no_adjacent_free_block_keeps_the_size() {
        with_narrow_heap(256, |heap| {
            let a = heap.alloc(16);
            let b = heap.alloc(16); // pins the space right above `a`
            assert!(!a.is_null() && !b.is_null());
            let available = heap.available_bytes();

            let q = unsafe { heap.realloc(a, 8) };
            assert_eq!(q, a);
            assert_eq!(unsafe { heap.payload_size(a) }, 16, "size unchanged");
            assert_eq!(heap.available_bytes(), available);
        });
    }

    #[test]
    fn small_shrink_never_moves_an_end_marker() {
        // One block fills the region exactly; its successor is the region's
        // end marker, which must not be slid downwards.
        with_narrow_heap(64, |heap| {
            let a = heap.alloc(32); // block of 48 = the whole usable area
            assert!(!a.is_null());
            assert_eq!(heap.available_bytes(), 0);

            let q = unsafe { heap.realloc(a, 24) };
            assert_eq!(q, a);
            assert_eq!(unsafe { heap.payload_size(a) }, 32, "size unchanged");
            assert_eq!(heap.available_bytes(), 0);
        });
    }
}
