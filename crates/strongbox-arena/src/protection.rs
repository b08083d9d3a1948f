// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Outcome of the best-effort hardening applied to a fresh arena.

/// Which hardening steps took effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hardening {
    /// Both guard pages were made inaccessible (`mprotect(PROT_NONE)`).
    pub guard_pages: bool,

    /// The arena is pinned in RAM (`mlock2`/`mlock`).
    pub locked: bool,

    /// The arena is excluded from core dumps (`madvise(MADV_DONTDUMP)`).
    pub dump_excluded: bool,
}

impl Hardening {
    /// Every step succeeded.
    pub const FULL: Self = Self {
        guard_pages: true,
        locked: true,
        dump_excluded: true,
    };

    /// Returns true if every step succeeded.
    pub fn is_complete(&self) -> bool {
        self.guard_pages && self.locked && self.dump_excluded
    }
}

/// Protection level of an initialized arena.
///
/// Degraded protection never makes allocation fail; whether it is acceptable
/// is the caller's policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protection {
    /// Guard pages, pinning and dump exclusion are all in place.
    Full,
    /// At least one hardening step failed.
    Degraded(Hardening),
}

impl Protection {
    /// Returns true for [`Protection::Full`].
    pub fn is_full(&self) -> bool {
        matches!(self, Protection::Full)
    }

    /// Per-step detail.
    pub fn hardening(&self) -> Hardening {
        match self {
            Protection::Full => Hardening::FULL,
            Protection::Degraded(hardening) => *hardening,
        }
    }
}

impl From<Hardening> for Protection {
    fn from(hardening: Hardening) -> Self {
        if hardening.is_complete() {
            Protection::Full
        } else {
            Protection::Degraded(hardening)
        }
    }
}
