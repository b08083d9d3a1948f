// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Test utilities for Strongbox crates.
//!
//! ## License
//!
//! GPL-3.0-only

use std::os::unix::process::ExitStatusExt;
use std::process::{Command, ExitStatus};

fn rerun(test_name: &str) -> ExitStatus {
    let exe = std::env::current_exe().expect("Failed to current_exe()");

    Command::new(exe)
        .args([
            "--exact",
            test_name,
            "--ignored",
            "--test-threads=1",
            "--nocapture",
        ])
        .status()
        .expect("Failed to run subprocess")
}

/// Re-runs an `#[ignore]`d test of the current test binary in a child process
/// and returns its exit code, or `None` if it was killed by a signal.
pub fn run_test_as_subprocess(test_name: &str) -> Option<i32> {
    rerun(test_name).code()
}

/// Like [`run_test_as_subprocess`] but returns the signal that killed the
/// child, if any. Guard page faults show up as `SIGSEGV` (or `SIGBUS`),
/// aborts as `SIGABRT`.
pub fn run_test_as_subprocess_signal(test_name: &str) -> Option<i32> {
    rerun(test_name).signal()
}

/// System page size.
pub fn page_size() -> usize {
    unsafe { libc::sysconf(libc::_SC_PAGESIZE) as usize }
}

/// Returns true if every byte in `[ptr, ptr + len)` is zero.
///
/// # Safety
/// The range must be readable.
pub unsafe fn is_zeroized(ptr: *const u8, len: usize) -> bool {
    unsafe { core::slice::from_raw_parts(ptr, len) }
        .iter()
        .all(|b| *b == 0)
}
