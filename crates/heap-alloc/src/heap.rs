//! The full allocator instance: region assembly, first-fit allocation,
//! validated release.

use core::ptr::{self, null_mut};

use log::trace;

use crate::align::{checked_align_up, is_aligned};
use crate::block::{ALLOC_BIT, BlockHeader, USED_MARK, is_live_allocated, meta_size};
use crate::error::AssignError;
use crate::region::{self, Region};
#[cfg(feature = "stats")]
use crate::stats::{Stats, StatsCounters};

/// Default instance alignment: one machine word.
pub const DEFAULT_ALIGNMENT: usize = align_of::<usize>();

/// A full allocator instance.
///
/// The instance owns a set of caller-supplied [`Region`]s (adopted once, via
/// [`assign_regions`](Self::assign_regions)) and serves requests from a
/// single free list spanning all of them. The list is rooted at a sentinel
/// block inside the instance, kept strictly ascending by address, and
/// threaded through a zero-size end marker at the top of each region; free
/// neighbours are coalesced eagerly so no two adjacent free blocks ever
/// coexist within a region.
///
/// `ALIGN` governs payload alignment and all block arithmetic. It must be a
/// power of two no smaller than the block-header alignment; violations fail
/// at compile time.
///
/// # Invariants
/// - The free list is address-sorted from the sentinel through every region,
///   terminated by the last end marker's null link.
/// - `available` equals the summed `size` of all free blocks (end markers
///   count zero).
/// - An allocated block has its alloc bit set and the allocated mark in its
///   link; a free block has neither.
///
/// The type is `Send` but not `Sync`: wrap it in
/// [`LockedHeap`](crate::LockedHeap) to share an instance.
pub struct Heap<const ALIGN: usize = DEFAULT_ALIGNMENT> {
    /// Sentinel head of the free list (not located in any region).
    pub(crate) start: BlockHeader,
    /// End marker of the last linked region.
    pub(crate) end_block: *mut BlockHeader,
    /// Summed `size` of all free blocks.
    pub(crate) available: usize,
    /// Number of regions linked at assembly.
    pub(crate) region_count: usize,
    #[cfg(feature = "stats")]
    pub(crate) stats: StatsCounters,
}

// Safety: the instance exclusively owns its region memory; the raw pointers
// are only dereferenced through &mut methods (or under a lock in LockedHeap).
unsafe impl<const ALIGN: usize> Send for Heap<ALIGN> {}

impl<const ALIGN: usize> Default for Heap<ALIGN> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const ALIGN: usize> Heap<ALIGN> {
    /// The metadata footprint `M`: bytes between a block's start and its
    /// payload. Every block size is a multiple of `ALIGN` and at least this.
    pub const BLOCK_META_SIZE: usize = meta_size(ALIGN);

    const ALIGN_OK: () = assert!(
        ALIGN.is_power_of_two() && ALIGN >= align_of::<BlockHeader>(),
        "ALIGN must be a power of two, at least the block header alignment",
    );

    /// Creates an unassembled instance. All operations fail until
    /// [`assign_regions`](Self::assign_regions) succeeds.
    #[must_use]
    pub const fn new() -> Self {
        let () = Self::ALIGN_OK;
        Self {
            start: BlockHeader::new(0),
            end_block: null_mut(),
            available: 0,
            region_count: 0,
            #[cfg(feature = "stats")]
            stats: StatsCounters::new(),
        }
    }

    /// Adopts the caller's regions and builds the initial free list.
    ///
    /// Regions must be listed in ascending address order and must not
    /// overlap; the list is validated, never reordered. Each region is
    /// normalised to `ALIGN` and laid out as one free block plus an end
    /// marker; regions left with no room for both are silently skipped.
    /// Returns the number of regions actually linked.
    ///
    /// On any error the instance and the region memory are untouched, and
    /// the instance stays unassembled.
    ///
    /// # Errors
    /// See [`AssignError`]; notably, assignment is a one-shot operation and
    /// fails on an already-assembled instance.
    ///
    /// # Safety
    /// - Every region extent must be valid, writable memory, exclusive to
    ///   this instance and used through it alone.
    /// - The backing memory must outlive the instance.
    /// - The instance must not be shared with other contexts yet; assembly
    ///   precedes concurrent use.
    pub unsafe fn assign_regions(&mut self, regions: &[Region]) -> Result<usize, AssignError> {
        if self.is_assigned() {
            return Err(AssignError::AlreadyAssigned);
        }
        region::validate_list(regions)?;

        let mut linked = 0_usize;
        let mut available = 0_usize;
        let mut prev_end: *mut BlockHeader = null_mut();

        for region in regions {
            let (base, size) = region.normalized(ALIGN);
            if size < 2 * Self::BLOCK_META_SIZE {
                // not enough room for a first block and an end marker
                continue;
            }
            let first = base as *mut BlockHeader;
            let end = (base + size - Self::BLOCK_META_SIZE) as *mut BlockHeader;
            // Safety: `first` and `end` lie in the caller-guaranteed extent,
            // aligned by normalisation.
            unsafe {
                ptr::write(
                    first,
                    BlockHeader {
                        next: end,
                        size: size - Self::BLOCK_META_SIZE,
                    },
                );
                ptr::write(end, BlockHeader::new(0));
                if prev_end.is_null() {
                    self.start.next = first;
                } else {
                    (*prev_end).next = first;
                }
            }
            prev_end = end;
            available += size - Self::BLOCK_META_SIZE;
            linked += 1;
            trace!("linked region at {base:#x}: {size} bytes after normalisation");
        }

        if linked == 0 {
            return Err(AssignError::NoUsableRegion);
        }

        self.end_block = prev_end;
        self.available = available;
        self.region_count = linked;
        #[cfg(feature = "stats")]
        {
            self.stats = StatsCounters::at_assembly(available);
        }
        Ok(linked)
    }

    /// Whether regions have been assigned to this instance.
    #[must_use]
    pub const fn is_assigned(&self) -> bool {
        self.region_count > 0
    }

    /// Number of regions linked at assembly (zero before assembly).
    #[must_use]
    pub const fn region_count(&self) -> usize {
        self.region_count
    }

    /// Bytes currently on the free list, block metadata included.
    #[must_use]
    pub const fn available_bytes(&self) -> usize {
        self.available
    }

    /// The total block size needed to serve a `size`-byte request, or `None`
    /// if the request is empty or the size arithmetic would overflow into
    /// the alloc bit.
    pub(crate) fn request_size(size: usize) -> Option<usize> {
        if size == 0 {
            return None;
        }
        let total = checked_align_up(size, ALIGN)?.checked_add(Self::BLOCK_META_SIZE)?;
        if total & ALLOC_BIT != 0 {
            return None;
        }
        Some(total)
    }

    /// Allocates `size` bytes and returns the payload pointer, or null if
    /// the request is empty, the instance is unassembled, or no free block
    /// fits.
    ///
    /// The search is first-fit over the address-ordered free list; an
    /// oversized match is split and the tail returned to the list.
    pub fn alloc(&mut self, size: usize) -> *mut u8 {
        self.alloc_in(None, size)
    }

    /// Like [`alloc`](Self::alloc), but when `region` is given only free
    /// blocks inside that region's normalised extent are eligible.
    pub fn alloc_in(&mut self, region: Option<&Region>, size: usize) -> *mut u8 {
        if !self.is_assigned() {
            return null_mut();
        }
        let Some(final_size) = Self::request_size(size) else {
            return null_mut();
        };
        let pin = region.map(|r| r.extent(ALIGN));
        self.find_fit(pin, final_size)
    }

    /// First-fit search and block carve-out. `pin` restricts candidates to a
    /// half-open address range.
    fn find_fit(&mut self, pin: Option<(usize, usize)>, final_size: usize) -> *mut u8 {
        let mut prev: *mut BlockHeader = &raw mut self.start;
        // Safety: the chain only holds the sentinel, valid block headers in
        // adopted regions, and a terminating null.
        unsafe {
            let mut curr = (*prev).next;
            while !curr.is_null() {
                let addr = curr as usize;
                if let Some((lo, hi)) = pin {
                    if addr >= hi {
                        // walked past the pinned region
                        return null_mut();
                    }
                    if addr < lo {
                        prev = curr;
                        curr = (*curr).next;
                        continue;
                    }
                }
                if (*curr).size >= final_size {
                    (*prev).next = (*curr).next;
                    self.available -= (*curr).size;
                    self.split_if_oversized(curr, final_size);
                    (*curr).size |= ALLOC_BIT;
                    (*curr).next = USED_MARK;
                    #[cfg(feature = "stats")]
                    self.note_alloc();
                    let payload = curr.cast::<u8>().add(Self::BLOCK_META_SIZE);
                    debug_assert!(is_aligned(payload as usize, ALIGN));
                    return payload;
                }
                prev = curr;
                curr = (*curr).next;
            }
        }
        null_mut()
    }

    /// Allocates a zero-filled array of `nitems` elements of `item_size`
    /// bytes. Returns null on multiplication overflow or any
    /// [`alloc`](Self::alloc) failure.
    pub fn calloc(&mut self, nitems: usize, item_size: usize) -> *mut u8 {
        self.calloc_in(None, nitems, item_size)
    }

    /// Region-pinned variant of [`calloc`](Self::calloc).
    pub fn calloc_in(
        &mut self,
        region: Option<&Region>,
        nitems: usize,
        item_size: usize,
    ) -> *mut u8 {
        let Some(total) = nitems.checked_mul(item_size) else {
            return null_mut();
        };
        let payload = self.alloc_in(region, total);
        if !payload.is_null() {
            // Safety: a successful allocation spans at least `total` payload bytes.
            unsafe { payload.write_bytes(0, total) };
        }
        payload
    }

    /// Releases an allocation. Null is a no-op; a pointer that does not
    /// identify a live allocated block (wrong address, double free, stale
    /// pointer) is rejected without touching memory.
    ///
    /// # Safety
    /// `ptr` must be null or a payload pointer obtained from this instance;
    /// the rejection of stale pointers is best-effort, not a guarantee.
    pub unsafe fn free(&mut self, ptr: *mut u8) {
        // Safety: forwarded contract.
        unsafe {
            self.release(ptr);
        }
    }

    /// Like [`free`](Self::free), but nulls the caller's pointer once the
    /// block has actually been released.
    ///
    /// # Safety
    /// As for [`free`](Self::free).
    pub unsafe fn free_safe(&mut self, ptr: &mut *mut u8) {
        // Safety: forwarded contract.
        if unsafe { self.release(*ptr) } {
            *ptr = null_mut();
        }
    }

    /// Validated release; `true` when a block was returned to the list.
    ///
    /// # Safety
    /// As for [`free`](Self::free).
    pub(crate) unsafe fn release(&mut self, ptr: *mut u8) -> bool {
        if ptr.is_null() {
            return false;
        }
        // Safety: per contract `ptr` came from this instance, so the header
        // sits one footprint below and is readable.
        unsafe {
            let block = ptr.sub(Self::BLOCK_META_SIZE).cast::<BlockHeader>();
            if !is_live_allocated(block) {
                trace!("rejecting free of {ptr:p}: not a live allocation");
                return false;
            }
            (*block).size &= !ALLOC_BIT;
            self.available += (*block).size;
            self.insert_free(block);
        }
        #[cfg(feature = "stats")]
        self.note_free();
        true
    }

    /// Payload size in bytes of a live allocation, or 0 for null and for
    /// pointers that fail the in-use check.
    ///
    /// # Safety
    /// As for [`free`](Self::free).
    #[must_use]
    pub unsafe fn payload_size(&self, ptr: *mut u8) -> usize {
        if ptr.is_null() {
            return 0;
        }
        // Safety: per contract `ptr` came from this instance.
        unsafe {
            let block = ptr.sub(Self::BLOCK_META_SIZE).cast::<BlockHeader>();
            if !is_live_allocated(block) {
                return 0;
            }
            ((*block).size & !ALLOC_BIT) - Self::BLOCK_META_SIZE
        }
    }

    /// A snapshot of the instance counters.
    #[cfg(feature = "stats")]
    #[must_use]
    pub const fn stats(&self) -> Stats {
        Stats {
            total_bytes: self.stats.total,
            available_bytes: self.available,
            min_available_bytes: self.stats.min_available,
            alloc_count: self.stats.alloc_count,
            free_count: self.stats.free_count,
        }
    }

    #[cfg(feature = "stats")]
    pub(crate) const fn note_alloc(&mut self) {
        self.stats.alloc_count += 1;
        self.stats.observe_available(self.available);
    }

    #[cfg(feature = "stats")]
    pub(crate) const fn note_free(&mut self) {
        self.stats.free_count += 1;
    }

    /// Watermark sampling for in-place realloc growth.
    #[cfg(feature = "stats")]
    pub(crate) const fn note_grow(&mut self) {
        self.stats.observe_available(self.available);
    }
}
