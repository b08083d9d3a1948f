// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Misuse that must end the process, observed from a child process.

use strongbox_arena::ArenaConfig;
use strongbox_test_utils::run_test_as_subprocess_signal;

use crate::allocator::SecureAllocator;

#[test]
#[ignore]
fn subprocess_test_double_free_aborts() {
    let allocator = SecureAllocator::default();
    allocator
        .init(ArenaConfig::new(4096, 16))
        .expect("Failed to init(..)");

    let keep = allocator.alloc(16).expect("Failed to alloc(..)");
    let ptr = allocator.alloc(16).expect("Failed to alloc(..)");

    unsafe {
        allocator.free(ptr.as_ptr());
        allocator.free(ptr.as_ptr());
        allocator.free(keep.as_ptr());
    }
}

#[test]
fn test_double_free_aborts() {
    let signal = run_test_as_subprocess_signal("tests::corruption::subprocess_test_double_free_aborts");

    assert_eq!(signal, Some(libc::SIGABRT));
}

#[test]
#[ignore]
fn subprocess_test_interior_free_aborts() {
    let allocator = SecureAllocator::default();
    allocator
        .init(ArenaConfig::new(4096, 16))
        .expect("Failed to init(..)");

    let ptr = allocator.alloc(256).expect("Failed to alloc(..)");

    unsafe { allocator.free(ptr.as_ptr().add(48)) };
}

#[test]
fn test_interior_free_aborts() {
    let signal =
        run_test_as_subprocess_signal("tests::corruption::subprocess_test_interior_free_aborts");

    assert_eq!(signal, Some(libc::SIGABRT));
}
