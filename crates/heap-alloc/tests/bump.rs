//! Grow-only mode through the public surface.

mod common;

use common::Arena;
use heap_alloc::{AssignError, BumpHeap, Region};

#[test]
fn two_fit_then_the_region_is_exhausted() {
    let arena = Arena::new(64);
    let mut bump: BumpHeap<4> = BumpHeap::new();
    unsafe { bump.assign_regions(&[Region::new(arena.ptr(), 64)]) }.unwrap();

    let a = bump.alloc(32);
    let b = bump.alloc(32);
    assert!(!a.is_null() && !b.is_null());
    assert_ne!(a, b);
    assert!(bump.alloc(4).is_null(), "64-byte region holds no third block");
}

#[test]
fn cursor_advances_by_aligned_sizes() {
    let arena = Arena::new(128);
    let mut bump: BumpHeap<8> = BumpHeap::new();
    unsafe { bump.assign_regions(&[Region::new(arena.ptr(), 128)]) }.unwrap();
    assert_eq!(bump.available_bytes(), 128);

    let a = bump.alloc(5);
    assert_eq!(bump.available_bytes(), 120);
    let b = bump.alloc(9);
    assert_eq!(bump.available_bytes(), 104);
    assert_eq!(unsafe { a.add(8) }, b);

    // payloads are usable memory
    unsafe {
        a.write_bytes(0xAA, 5);
        b.write_bytes(0xBB, 9);
        assert_eq!(a.read(), 0xAA);
        assert_eq!(b.read(), 0xBB);
    }
}

#[test]
fn second_region_is_refused() {
    let arena = Arena::new(256);
    let mut bump: BumpHeap<8> = BumpHeap::new();
    let regions = [
        Region::new(arena.ptr(), 64),
        Region::new(unsafe { arena.ptr().add(128) }, 64),
    ];
    assert_eq!(
        unsafe { bump.assign_regions(&regions) },
        Err(AssignError::TooManyRegions)
    );
    assert!(!bump.is_assigned());

    // a single region still assembles afterwards
    assert_eq!(
        unsafe { bump.assign_regions(&regions[..1]) },
        Ok(1)
    );
    assert!(bump.is_assigned());
}

#[test]
fn calloc_zeroes_previously_scribbled_memory() {
    let arena = Arena::new(64);
    unsafe { arena.ptr().write_bytes(0xFF, 64) };

    let mut bump: BumpHeap<8> = BumpHeap::new();
    unsafe { bump.assign_regions(&[Region::new(arena.ptr(), 64)]) }.unwrap();

    let p = bump.calloc(8, 4);
    assert!(!p.is_null());
    for i in 0..32 {
        assert_eq!(unsafe { p.add(i).read() }, 0);
    }
    assert!(bump.calloc(usize::MAX, 4).is_null(), "overflow is rejected");
}
