// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Random alloc/free sequences against a fresh arena per case.

use core::ptr::NonNull;

use proptest::prelude::*;

use strongbox::{ArenaConfig, Error, LINK_SIZE, SecureAllocator};
use strongbox_test_utils::is_zeroized;

const ARENA_SIZE: usize = 1 << 16;
const MIN_SIZE: usize = 16;

#[derive(Debug, Clone)]
enum Op {
    Alloc(usize),
    Free(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (1..=4096usize).prop_map(Op::Alloc),
        2 => any::<usize>().prop_map(Op::Free),
    ]
}

struct Live {
    ptr: NonNull<u8>,
    len: usize,
    actual: usize,
    fill: u8,
}

proptest! {
    #[test]
    fn alloc_free_sequences_keep_invariants(ops in prop::collection::vec(op(), 1..200)) {
        let allocator = SecureAllocator::default();
        allocator
            .init(ArenaConfig::new(ARENA_SIZE, MIN_SIZE))
            .expect("Failed to init(..)");

        let mut live: Vec<Live> = Vec::new();

        for (step, op) in ops.into_iter().enumerate() {
            match op {
                Op::Alloc(len) => match allocator.alloc(len) {
                    Ok(ptr) => {
                        let actual = allocator.actual_size(ptr.as_ptr());
                        let fill = (step % 255) as u8 + 1;

                        // Containment and class size.
                        prop_assert!(allocator.allocated(ptr.as_ptr()));
                        prop_assert!(actual >= len.max(MIN_SIZE));
                        prop_assert!(actual.is_power_of_two());
                        // The arena base is only page aligned.
                        prop_assert_eq!(ptr.as_ptr() as usize % actual.min(4096), 0);

                        unsafe { ptr.as_ptr().write_bytes(fill, actual) };
                        live.push(Live { ptr, len, actual, fill });
                    }
                    Err(Error::Alloc(_)) => {}
                    Err(e) => prop_assert!(false, "unexpected error {e}"),
                },
                Op::Free(pick) if !live.is_empty() => {
                    let block = live.swap_remove(pick % live.len());
                    let raw = block.ptr.as_ptr();

                    unsafe { allocator.clear_free(raw, block.len) };

                    // Cleansing: only the free-list link words may be set.
                    let tail = block.actual - LINK_SIZE;
                    let tail_zeroized = unsafe { is_zeroized(raw.add(LINK_SIZE), tail) };
                    prop_assert!(tail_zeroized);
                }
                Op::Free(_) => {}
            }

            // Conservation.
            let expected: usize = live.iter().map(|b| b.actual).sum();
            prop_assert_eq!(allocator.used(), expected);
            prop_assert!(expected <= ARENA_SIZE);
        }

        // Non-overlap: every live block still holds its own pattern.
        for block in &live {
            let bytes = unsafe { core::slice::from_raw_parts(block.ptr.as_ptr(), block.actual) };
            prop_assert!(bytes.iter().all(|b| *b == block.fill));
        }

        for block in live.drain(..) {
            unsafe { allocator.free(block.ptr.as_ptr()) };
        }

        prop_assert_eq!(allocator.used(), 0);
        prop_assert_eq!(allocator.done(), Ok(()));
    }

    #[test]
    fn freed_space_is_fully_reusable(lens in prop::collection::vec(1..=2048usize, 1..64)) {
        let allocator = SecureAllocator::default();
        allocator
            .init(ArenaConfig::new(ARENA_SIZE, MIN_SIZE))
            .expect("Failed to init(..)");

        let ptrs: Vec<_> = lens
            .iter()
            .filter_map(|len| allocator.alloc(*len).ok())
            .collect();

        for ptr in ptrs {
            unsafe { allocator.free(ptr.as_ptr()) };
        }

        // Everything coalesced back into one block.
        let whole = allocator.alloc(ARENA_SIZE).expect("Failed to alloc(..)");
        prop_assert_eq!(allocator.actual_size(whole.as_ptr()), ARENA_SIZE);

        unsafe { allocator.free(whole.as_ptr()) };
        prop_assert_eq!(allocator.done(), Ok(()));
    }
}
