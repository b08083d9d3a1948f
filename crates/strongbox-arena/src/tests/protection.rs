// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use crate::protection::{Hardening, Protection};

#[test]
fn test_complete_hardening_is_full_protection() {
    assert!(Hardening::FULL.is_complete());
    assert_eq!(Protection::from(Hardening::FULL), Protection::Full);
    assert!(Protection::Full.is_full());
    assert_eq!(Protection::Full.hardening(), Hardening::FULL);
}

#[test]
fn test_any_missing_step_degrades() {
    let unlocked = Hardening {
        locked: false,
        ..Hardening::FULL
    };
    let protection = Protection::from(unlocked);

    assert!(!unlocked.is_complete());
    assert_eq!(protection, Protection::Degraded(unlocked));
    assert!(!protection.is_full());
    assert!(!protection.hardening().locked);
    assert!(protection.hardening().guard_pages);
    assert!(protection.hardening().dump_excluded);
}
