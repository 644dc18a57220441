//! Free-list surgery: address-ordered insertion with neighbour coalescing,
//! and block splitting.
//!
//! Both operations live on [`Heap`] because they mutate the instance's
//! available-bytes counter alongside the list itself. The list spans all
//! regions: it starts at the instance-resident sentinel, runs strictly
//! ascending by address, and passes through each region's zero-size end
//! marker. End markers are linked, never merged — they are what keeps
//! coalescing from fusing blocks across region boundaries.

use core::ptr;

use crate::block::{ALLOC_BIT, BlockHeader};
use crate::heap::Heap;

impl<const ALIGN: usize> Heap<ALIGN> {
    /// Inserts `block` into the free list at its address position and merges
    /// it with physically adjacent free neighbours.
    ///
    /// `block` must already carry its final size with the alloc bit clear;
    /// the caller has accounted for it in `available`.
    ///
    /// # Safety
    /// `block` must be a valid, unlinked block header inside an adopted
    /// region, and the list invariants must hold.
    pub(crate) unsafe fn insert_free(&mut self, block: *mut BlockHeader) {
        let sentinel: *mut BlockHeader = &raw mut self.start;
        // Safety: the chain holds the sentinel, in-region headers and a
        // terminating null; `block` is in-region per contract.
        unsafe {
            // Last node strictly below the block. The walk cannot run off the
            // list: the block's own region end marker sits above it.
            let mut prev = sentinel;
            while !(*prev).next.is_null() && ((*prev).next as usize) < block as usize {
                prev = (*prev).next;
            }
            let succ = (*prev).next;

            #[cfg(feature = "clean-memory")]
            {
                // Zero the payload now that the insertion point is known and
                // before any merge changes the block's identity.
                let size = (*block).size;
                block
                    .cast::<u8>()
                    .add(Self::BLOCK_META_SIZE)
                    .write_bytes(0, size - Self::BLOCK_META_SIZE);
            }

            // Merge downwards into `prev` when physically adjacent. The
            // sentinel is excluded: it has size 0 and lives outside every
            // region. End markers below can never be adjacent either — their
            // zero size would place them at the block's own address.
            let mut work = block;
            if !ptr::eq(prev, sentinel) && (prev as usize) + (*prev).size == block as usize {
                (*prev).size += (*block).size;
                work = prev;
            } else {
                (*prev).next = work;
            }

            // Merge upwards when the successor is adjacent and a real free
            // block; the current end marker and the zero-size markers of
            // inner regions are linked through, never absorbed.
            if !succ.is_null()
                && !ptr::eq(succ, self.end_block)
                && (*succ).size > 0
                && (work as usize) + (*work).size == succ as usize
            {
                (*work).size += (*succ).size;
                (*work).next = (*succ).next;
            } else {
                (*work).next = succ;
            }
        }
    }

    /// Carves the tail off `block` when shrinking it to `target` leaves room
    /// for a whole free block, and returns the tail to the list.
    ///
    /// The block's alloc bit is preserved; the tail's size is added to
    /// `available`. Too-small leftovers stay attached to the block.
    ///
    /// # Safety
    /// `block` must be a valid block header of at least `target` total
    /// bytes, currently unlinked from the free list, and `target` a multiple
    /// of `ALIGN`.
    pub(crate) unsafe fn split_if_oversized(&mut self, block: *mut BlockHeader, target: usize) {
        // Safety: per contract.
        unsafe {
            let bit = (*block).size & ALLOC_BIT;
            let size = (*block).size & !ALLOC_BIT;
            debug_assert!(size >= target);

            let leftover = size - target;
            if leftover >= Self::BLOCK_META_SIZE {
                let tail = (block as usize + target) as *mut BlockHeader;
                ptr::write(tail, BlockHeader::new(leftover));
                (*block).size = target | bit;
                self.available += leftover;
                self.insert_free(tail);
            }
        }
    }
}
