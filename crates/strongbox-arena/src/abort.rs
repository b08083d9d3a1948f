// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Fail-fast handling of bookkeeping corruption.

use crate::error::Corruption;

/// Reports `corruption` and terminates the process.
///
/// Secret storage with inconsistent bookkeeping is never handed back to the
/// caller. Under this crate's unit tests the process exits with
/// [`Corruption::exit_code`] instead, so a parent test can tell which check
/// fired.
#[cold]
#[inline(never)]
pub fn fatal(corruption: Corruption) -> ! {
    tracing::error!(%corruption, "secure arena corruption");

    #[cfg(test)]
    std::process::exit(corruption.exit_code());

    #[cfg(not(test))]
    unsafe {
        libc::abort()
    }
}

/// Aborts with `corruption` unless `cond` holds.
#[inline(always)]
pub(crate) fn ensure(cond: bool, corruption: Corruption) {
    if !cond {
        fatal(corruption);
    }
}
