//! Allocation and release through the public surface: placement, accounting,
//! pinning, zeroed allocation.

mod common;

use common::{M, THeap, assert_filled, fill, in_region, with_heap};

/// Payload capacities 112 / 240 / 1008: each request lands in the first
/// region whose free block can hold it.
#[test]
fn first_fit_places_requests_by_region_capacity() {
    with_heap(&[128, 256, 1024], |heap, regions| {
        let initial = heap.available_bytes();

        let p1 = heap.alloc(64); // fits the 128-byte region
        assert!(in_region(p1, &regions[0]));

        let p2 = heap.alloc(256); // only the 1024-byte region can hold this
        assert!(in_region(p2, &regions[2]));

        let p3 = heap.alloc(128); // too big for what is left of region 0
        assert!(in_region(p3, &regions[1]));

        unsafe {
            heap.free(p1);
            heap.free(p2);
            heap.free(p3);
        }
        assert_eq!(heap.available_bytes(), initial, "fully coalesced again");

        // the restored heap serves the same sequence identically
        let q1 = heap.alloc(64);
        assert_eq!(q1, p1);
    });
}

#[test]
fn region_pin_overrides_first_fit() {
    with_heap(&[128, 256, 1024], |heap, regions| {
        // region 0 could serve this, but the caller pins region 1
        let p = heap.alloc_in(Some(&regions[1]), 16);
        assert!(!p.is_null());
        assert!(in_region(p, &regions[1]));
        assert!(!in_region(p, &regions[0]));
        unsafe { heap.free(p) };
    });
}

#[test]
fn available_bytes_accounting_round_trips() {
    with_heap(&[256], |heap, _| {
        let per_request = 16 + M; // align_up(10) + metadata
        assert_eq!(heap.available_bytes(), 256 - M);

        let a = heap.alloc(10);
        assert_eq!(heap.available_bytes(), 256 - M - per_request);
        let b = heap.alloc(10);
        let c = heap.alloc(10);
        assert_eq!(heap.available_bytes(), 256 - M - 3 * per_request);

        unsafe { heap.free(b) };
        assert_eq!(heap.available_bytes(), 256 - M - 2 * per_request);
        unsafe { heap.free(a) };
        unsafe { heap.free(c) };
        assert_eq!(heap.available_bytes(), 256 - M);
    });
}

#[test]
fn payloads_do_not_bleed_into_each_other() {
    with_heap(&[512], |heap, _| {
        let a = heap.alloc(48);
        let b = heap.alloc(48);
        let c = heap.alloc(48);
        fill(a, 48, 0x10);
        fill(b, 48, 0x60);
        fill(c, 48, 0xB0);
        assert_filled(a, 48, 0x10);
        assert_filled(b, 48, 0x60);
        assert_filled(c, 48, 0xB0);
        unsafe {
            heap.free(b);
        }
        assert_filled(a, 48, 0x10);
        assert_filled(c, 48, 0xB0);
    });
}

#[test]
fn zero_size_requests_fail_without_effect() {
    with_heap(&[256], |heap, _| {
        let initial = heap.available_bytes();
        assert!(heap.alloc(0).is_null());
        assert!(heap.calloc(0, 16).is_null());
        assert!(heap.calloc(16, 0).is_null());
        assert_eq!(heap.available_bytes(), initial);
    });
}

#[test]
fn oversized_requests_fail_without_effect() {
    with_heap(&[256], |heap, _| {
        let initial = heap.available_bytes();
        assert!(heap.alloc(initial).is_null(), "metadata does not fit");
        assert!(heap.alloc(usize::MAX).is_null(), "size arithmetic overflow");
        assert!(heap.alloc(usize::MAX / 2 + 1).is_null(), "alloc-bit alias");
        assert_eq!(heap.available_bytes(), initial);
    });
}

#[test]
fn calloc_returns_zeroed_memory_even_after_reuse() {
    with_heap(&[512], |heap, _| {
        let p = heap.alloc(64);
        fill(p, 64, 0xEE);
        unsafe { heap.free(p) };

        let q = heap.calloc(16, 4);
        assert_eq!(q, p, "first fit reuses the same block");
        for i in 0..64 {
            assert_eq!(unsafe { q.add(i).read() }, 0);
        }
        unsafe { heap.free(q) };
    });
}

#[test]
fn free_null_and_foreign_pointers_are_no_ops() {
    with_heap(&[256], |heap, _| {
        let initial = heap.available_bytes();
        unsafe { heap.free(std::ptr::null_mut()) };

        // a pointer into the middle of a payload is not a block
        let p = heap.alloc(64);
        fill(p, 64, 0x5A);
        unsafe {
            heap.free(p.add(16));
        }
        assert_eq!(unsafe { heap.payload_size(p) }, 64);

        unsafe { heap.free(p) };
        assert_eq!(heap.available_bytes(), initial);
    });
}

#[test]
fn balanced_sequences_restore_available_bytes() {
    with_heap(&[1024, 512], |heap, _| {
        let initial = heap.available_bytes();
        let mut live: Vec<*mut u8> = Vec::new();
        for i in 0..64_usize {
            if i % 3 == 2 {
                if let Some(p) = live.pop() {
                    unsafe { heap.free(p) };
                }
            } else {
                let p = heap.alloc(16 + (i % 7) * 24);
                if !p.is_null() {
                    live.push(p);
                }
            }
        }
        for p in live.drain(..) {
            unsafe { heap.free(p) };
        }
        assert_eq!(heap.available_bytes(), initial);
    });
}

#[test]
fn unassembled_heap_fails_every_operation() {
    let mut heap = THeap::new();
    assert!(heap.alloc(8).is_null());
    assert!(heap.calloc(1, 8).is_null());
    assert!(unsafe { heap.realloc(std::ptr::null_mut(), 8) }.is_null());
    assert_eq!(unsafe { heap.payload_size(std::ptr::null_mut()) }, 0);
    assert_eq!(heap.available_bytes(), 0);
    assert_eq!(heap.region_count(), 0);
}
