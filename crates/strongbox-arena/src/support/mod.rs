// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Test support shared with downstream crates (feature `test-utils`).

mod test_utils;

pub use test_utils::FaultyPages;
