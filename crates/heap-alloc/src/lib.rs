//! # Region-backed dynamic memory manager
//!
//! A dynamic allocator for constrained or supervised environments: the
//! application hands one or more contiguous byte regions to an allocator
//! instance, which then serves variable-sized requests out of them with an
//! in-band-metadata, address-ordered free list.
//!
//! ## Overview
//!
//! | Type | Role |
//! |------|------|
//! | [`Heap`] | The full allocator: first-fit allocation, validated free with neighbour coalescing, in-place and relocating resize, zeroed allocation, per-region pinning. |
//! | [`BumpHeap`] | Grow-only mode for extremely constrained deployments: one region, bump-pointer allocation, no release surface at all. |
//! | [`LockedHeap`] | A [`Heap`] inside a [`heap_sync::Guarded`] cell, for instances shared between execution contexts; also implements [`core::alloc::GlobalAlloc`]. |
//! | [`Region`] | A caller-supplied base/size pair; normalised to the instance alignment at assignment. |
//!
//! Multiple instances coexist independently; the [`global`] module holds a
//! process-wide default instance behind short-form functions.
//!
//! ## Block layout
//!
//! Metadata lives in-band, immediately before the payload:
//!
//! ```text
//! +----------------------+-------------------------+
//! | header (next, size)  |        payload          |
//! +----------------------+-------------------------+
//! ^ block start          ^ block start + M
//! ```
//!
//! `size` counts the whole block including the header and keeps the
//! allocated flag in its most significant bit; `next` links free blocks in
//! ascending address order and carries a sentinel mark while the block is in
//! use. `M` is the header size rounded up to the instance alignment, exposed
//! as [`Heap::BLOCK_META_SIZE`]. Every region ends in a zero-size end marker
//! that chains to the next region, so one list spans all regions without a
//! null special case anywhere in the middle.
//!
//! ## Usage
//!
//! ```
//! use heap_alloc::{Heap, Region};
//!
//! let mut backing = vec![0u8; 1024];
//! let mut heap: Heap<16> = Heap::new();
//!
//! // Safety: the buffer outlives the heap and is used by nothing else.
//! let linked = unsafe {
//!     heap.assign_regions(&[Region::new(backing.as_mut_ptr(), backing.len())])
//! }
//! .unwrap();
//! assert_eq!(linked, 1);
//!
//! let p = heap.alloc(100);
//! assert!(!p.is_null());
//! unsafe { heap.free(p) };
//! ```
//!
//! ## Configuration
//!
//! - Alignment is a const generic (power of two; for [`Heap`] at least the
//!   block-header alignment), defaulting to [`DEFAULT_ALIGNMENT`].
//! - The `clean-memory` feature zeroes freed payloads as blocks return to
//!   the free list.
//! - The `stats` feature maintains per-instance counters ([`Stats`]),
//!   including a minimum-ever-available watermark.
//!
//! ## Concurrency
//!
//! [`Heap`] itself is `Send` but deliberately not `Sync`: it is a
//! single-context structure, and sharing is the job of [`LockedHeap`], whose
//! every operation serialises under the instance lock. Nothing here is safe
//! to call from an interrupt handler that may pre-empt a running operation
//! on the same instance.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod align;
mod block;
mod bump;
mod error;
mod free_list;
pub mod global;
mod heap;
mod locked;
mod realloc;
mod region;
#[cfg(feature = "stats")]
mod stats;
#[cfg(test)]
mod test_support;

pub use bump::BumpHeap;
pub use error::AssignError;
pub use heap::{DEFAULT_ALIGNMENT, Heap};
pub use locked::LockedHeap;
pub use region::Region;
#[cfg(feature = "stats")]
pub use stats::Stats;
