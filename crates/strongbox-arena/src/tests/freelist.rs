// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use core::ptr;

use crate::error::ArenaError;
use crate::freelist::{FreeLists, FreeNode, LINK_SIZE};

#[repr(C, align(16))]
struct Slot([u8; 16]);

fn nodes<const N: usize>(slots: &mut [Slot; N]) -> [*mut FreeNode; N] {
    core::array::from_fn(|i| ptr::addr_of_mut!(slots[i]) as *mut FreeNode)
}

#[test]
fn test_link_size_is_two_pointers() {
    assert_eq!(LINK_SIZE, 2 * core::mem::size_of::<usize>());
}

#[test]
fn test_new_lists_are_empty() {
    let lists = FreeLists::new(5).expect("Failed to new(..)");

    assert_eq!(lists.len(), 5);
    assert!((0..5).all(|l| lists.head(l).is_null()));
}

#[test]
fn test_push_is_lifo() {
    let mut slots = [const { Slot([0; 16]) }; 3];
    let [a, b, c] = nodes(&mut slots);
    let mut lists = FreeLists::new(2).expect("Failed to new(..)");

    unsafe {
        lists.push(1, a);
        lists.push(1, b);
        lists.push(1, c);
    }

    assert_eq!(lists.head(1), c);
    assert!(lists.head(0).is_null());

    let (next, p_next) = unsafe { FreeLists::links(c) };
    assert_eq!(next, b);
    assert_eq!(p_next, lists.slot(1));
}

#[test]
fn test_unlink_middle_head_and_tail() {
    let mut slots = [const { Slot([0; 16]) }; 3];
    let [a, b, c] = nodes(&mut slots);
    let mut lists = FreeLists::new(1).expect("Failed to new(..)");

    unsafe {
        lists.push(0, a);
        lists.push(0, b);
        lists.push(0, c);

        FreeLists::unlink(b);
        assert_eq!(lists.head(0), c);
        assert_eq!(FreeLists::links(c).0, a);

        FreeLists::unlink(c);
        assert_eq!(lists.head(0), a);
        assert_eq!(FreeLists::links(a).1, lists.slot(0));

        FreeLists::unlink(a);
    }

    assert!(lists.head(0).is_null());
}

#[test]
fn test_unlink_clears_link_words() {
    let mut slots = [const { Slot([0; 16]) }; 2];
    let [a, b] = nodes(&mut slots);
    let mut lists = FreeLists::new(1).expect("Failed to new(..)");

    unsafe {
        lists.push(0, a);
        lists.push(0, b);
        FreeLists::unlink(b);
        FreeLists::unlink(a);
    }

    assert!(slots.iter().all(|slot| slot.0.iter().all(|byte| *byte == 0)));
}

#[test]
fn test_is_slot() {
    let lists = FreeLists::new(4).expect("Failed to new(..)");

    assert!(lists.is_slot(lists.slot(0)));
    assert!(lists.is_slot(lists.slot(3)));
    assert!(!lists.is_slot(lists.slot(3).wrapping_add(1)));
    assert!(!lists.is_slot(ptr::null_mut()));
}

#[test]
fn test_new_reports_heap_exhaustion() {
    assert!(matches!(
        FreeLists::new(usize::MAX >> 3),
        Err(ArenaError::Bookkeeping { bytes: usize::MAX })
    ));
}
