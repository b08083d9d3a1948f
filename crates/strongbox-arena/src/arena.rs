// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Arena - binary buddy allocator over a guarded region.
//!
//! Blocks are powers of two between `min_size` and the whole arena. Size
//! class `list` holds blocks of `size >> list` bytes. Two bitmaps index the
//! implicit block tree:
//!
//! - `bittable`: the block exists as a distinct unit at that class.
//! - `bitmalloc`: that existing block is allocated.
//!
//! No per-allocation header exists. The class of an allocated block is
//! recovered from its address by walking the tree from the finest class
//! upward until an existing block is found.

use core::ptr::NonNull;

use tracing::debug;

use crate::abort::{ensure, fatal};
use crate::bitmap::Bitmap;
use crate::config::ArenaConfig;
use crate::error::{AllocError, ArenaError, Corruption};
use crate::freelist::{FreeLists, FreeNode};
use crate::protection::Protection;
use crate::region::{PageOps, Region, SystemPages};

/// A fixed-size buddy arena. Not synchronized; see `strongbox` for the
/// locking policy layer.
pub struct Arena {
    lists: FreeLists,
    bittable: Bitmap,
    bitmalloc: Bitmap,
    base: NonNull<u8>,
    size: usize,
    min_size: usize,
    protection: Protection,
    // Dropped last: the free lists and bitmaps describe its memory.
    region: Region,
}

// Safety: the arena exclusively owns its region; list nodes only point into
// the region and into `lists`, both of which move with it.
unsafe impl Send for Arena {}

impl Arena {
    /// Creates an arena using the system page primitives.
    pub fn new(config: ArenaConfig) -> Result<Self, ArenaError> {
        Self::with_pages(config, &SystemPages)
    }

    /// Creates an arena using `pages` for every OS memory operation.
    ///
    /// Parameter, bookkeeping and mapping failures are errors. Failed
    /// hardening steps only downgrade [`Arena::protection`].
    pub fn with_pages(config: ArenaConfig, pages: &'static dyn PageOps) -> Result<Self, ArenaError> {
        let geometry = config.geometry()?;

        // Bookkeeping first: nothing to unmap if the heap runs out.
        let lists = FreeLists::new(geometry.list_count)?;
        let bittable = Bitmap::new(geometry.bit_count)?;
        let bitmalloc = Bitmap::new(geometry.bit_count)?;

        let region = Region::map(geometry.size, pages)?;

        let mut arena = Self {
            lists,
            bittable,
            bitmalloc,
            base: region.arena(),
            size: geometry.size,
            min_size: geometry.min_size,
            protection: Protection::Full,
            region,
        };

        // One free block spanning the whole arena.
        arena.mark_present(0, 0);
        arena.push(0, 0);

        arena.protection = Protection::from(arena.region.harden());

        debug!(
            size = arena.size,
            min_size = arena.min_size,
            classes = arena.lists.len(),
            protection = ?arena.protection,
            "secure arena created"
        );

        Ok(arena)
    }

    /// Protection level established at creation.
    pub fn protection(&self) -> Protection {
        self.protection
    }

    /// Arena size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Smallest block size in bytes, after rounding.
    pub fn min_size(&self) -> usize {
        self.min_size
    }

    /// Number of size classes.
    pub fn classes(&self) -> usize {
        self.lists.len()
    }

    /// Address range covered by the arena.
    pub fn as_ptr_range(&self) -> core::ops::Range<*const u8> {
        let start = self.base.as_ptr() as *const u8;

        start..start.wrapping_add(self.size)
    }

    /// O(1) address-range membership test.
    #[inline]
    pub fn contains(&self, ptr: *const u8) -> bool {
        let start = self.base.as_ptr() as usize;
        let addr = ptr as usize;

        addr >= start && addr - start < self.size
    }

    /// Allocates a block of at least `size` bytes.
    ///
    /// The block comes back with its link words cleared. Exhaustion is
    /// reported immediately and never retried.
    pub fn malloc(&mut self, size: usize) -> Result<NonNull<u8>, AllocError> {
        let too_large = AllocError::TooLarge {
            requested: size,
            capacity: self.size,
        };

        if size > self.size {
            return Err(too_large);
        }

        let list = self.class_for(size).ok_or(too_large)?;

        let mut slist = (0..=list)
            .rev()
            .find(|&l| !self.lists.head(l).is_null())
            .ok_or(AllocError::Exhausted { requested: size })?;

        while slist != list {
            let offset = self.offset_of(self.lists.head(slist));

            ensure(
                !self.bitmalloc.test(self.bit(offset, slist)),
                Corruption::AllocatedInFreeList,
            );
            self.mark_absent(offset, slist);
            self.unlink(offset);

            slist += 1;

            // Push the upper half first so the lower half is handed out next.
            let buddy = offset + (self.size >> slist);
            self.mark_present(buddy, slist);
            self.push(slist, buddy);
            self.mark_present(offset, slist);
            self.push(slist, offset);

            ensure(
                self.buddy_of(offset, slist) == Some(buddy),
                Corruption::FreeListLink,
            );
        }

        let offset = self.offset_of(self.lists.head(list));

        ensure(
            self.bittable.test(self.bit(offset, list)),
            Corruption::BlockMissing,
        );
        self.mark_allocated(offset, list);
        self.unlink(offset);

        Ok(self.ptr_at(offset))
    }

    /// Returns a block to the arena and coalesces it with free buddies.
    ///
    /// Contents are not cleansed here.
    ///
    /// # Safety
    /// `ptr` must have been returned by [`Arena::malloc`] on this arena and
    /// must not be used afterwards. Inconsistent pointers abort the process.
    pub unsafe fn free(&mut self, ptr: NonNull<u8>) {
        ensure(self.contains(ptr.as_ptr()), Corruption::OutOfBounds);

        let mut offset = self.offset_of(ptr.as_ptr() as *mut FreeNode);
        let mut list = self.class_of(offset);

        self.mark_free(offset, list);
        self.push(list, offset);

        while let Some(buddy) = self.buddy_of(offset, list) {
            self.mark_absent(offset, list);
            self.unlink(offset);
            self.mark_absent(buddy, list);
            self.unlink(buddy);

            list -= 1;
            offset = offset.min(buddy);

            self.mark_present(offset, list);
            self.push(list, offset);
        }
    }

    /// Size of the block backing `ptr`, or `0` if `ptr` is not in the arena.
    ///
    /// Aborts if `ptr` is in the arena but is not the head of a block.
    pub fn actual_size(&self, ptr: *const u8) -> usize {
        if !self.contains(ptr) {
            return 0;
        }

        let offset = ptr as usize - self.base.as_ptr() as usize;
        let list = self.class_of(offset);

        self.size >> list
    }

    /// Releases the bookkeeping and the mapping.
    ///
    /// Outstanding allocations are not checked here; that is the caller's
    /// responsibility.
    pub fn done(self) {
        debug!(size = self.size, "secure arena released");
    }

    /// Finest class whose blocks hold `size` bytes.
    fn class_for(&self, size: usize) -> Option<usize> {
        let mut list = self.lists.len() - 1;
        let mut block = self.min_size;

        while block < size {
            list = list.checked_sub(1)?;
            block <<= 1;
        }

        Some(list)
    }

    /// Class of the existing block whose head is at `offset`.
    fn class_of(&self, offset: usize) -> usize {
        ensure(offset % self.min_size == 0, Corruption::Misaligned);

        let mut bit = (self.size + offset) / self.min_size;

        for list in (0..self.lists.len()).rev() {
            if self.bittable.test(bit) {
                return list;
            }

            // Only a left child shares its parent's head address.
            ensure(bit & 1 == 0, Corruption::NotBlockHead);
            bit >>= 1;
        }

        fatal(Corruption::NotBlockHead)
    }

    /// Tree index of the block at `offset` in class `list`.
    #[inline]
    fn bit(&self, offset: usize, list: usize) -> usize {
        ensure(list < self.lists.len(), Corruption::OutOfBounds);

        let block = self.size >> list;

        ensure(offset & (block - 1) == 0, Corruption::Misaligned);

        let bit = (1 << list) + offset / block;

        ensure(bit > 0 && bit < self.bittable.len(), Corruption::OutOfBounds);

        bit
    }

    /// Offset of the free buddy of the block at `offset`, if it exists.
    fn buddy_of(&self, offset: usize, list: usize) -> Option<usize> {
        if list == 0 {
            return None;
        }

        let bit = self.bit(offset, list) ^ 1;

        if !self.bittable.test(bit) || self.bitmalloc.test(bit) {
            return None;
        }

        let buddy = (bit & ((1 << list) - 1)) * (self.size >> list);

        ensure(buddy < self.size, Corruption::OutOfBounds);

        Some(buddy)
    }

    fn mark_present(&mut self, offset: usize, list: usize) {
        let bit = self.bit(offset, list);

        ensure(!self.bittable.test(bit), Corruption::BlockExists);
        self.bittable.set(bit);
    }

    fn mark_absent(&mut self, offset: usize, list: usize) {
        let bit = self.bit(offset, list);

        ensure(self.bittable.test(bit), Corruption::BlockMissing);
        ensure(!self.bitmalloc.test(bit), Corruption::AllocatedInFreeList);
        self.bittable.clear(bit);
    }

    fn mark_allocated(&mut self, offset: usize, list: usize) {
        let bit = self.bit(offset, list);

        ensure(!self.bitmalloc.test(bit), Corruption::AllocatedInFreeList);
        self.bitmalloc.set(bit);
    }

    fn mark_free(&mut self, offset: usize, list: usize) {
        let bit = self.bit(offset, list);

        ensure(self.bitmalloc.test(bit), Corruption::NotAllocated);
        self.bitmalloc.clear(bit);
    }

    fn push(&mut self, list: usize, offset: usize) {
        let node = self.node_at(offset);
        let head = self.lists.head(list);

        ensure(head.is_null() || self.contains(head as *const u8), Corruption::FreeListLink);

        if !head.is_null() {
            let (_, p_next) = unsafe { FreeLists::links(head) };
            ensure(p_next == self.lists.slot(list), Corruption::FreeListLink);
        }

        // Safety: `node` is the head of a block of at least LINK_SIZE bytes
        // that the bitmaps mark as present and free.
        unsafe { self.lists.push(list, node) };
    }

    fn unlink(&mut self, offset: usize) {
        let node = self.node_at(offset);
        let (next, p_next) = unsafe { FreeLists::links(node) };

        ensure(
            self.lists.is_slot(p_next) || self.contains(p_next as *const u8),
            Corruption::FreeListLink,
        );
        ensure(next.is_null() || self.contains(next as *const u8), Corruption::FreeListLink);

        // Safety: links were checked to stay inside the arena or the heads.
        unsafe { FreeLists::unlink(node) };
    }

    #[inline(always)]
    fn offset_of(&self, node: *mut FreeNode) -> usize {
        ensure(self.contains(node as *const u8), Corruption::OutOfBounds);

        node as usize - self.base.as_ptr() as usize
    }

    #[inline(always)]
    fn ptr_at(&self, offset: usize) -> NonNull<u8> {
        unsafe { self.base.add(offset) }
    }

    #[inline(always)]
    fn node_at(&self, offset: usize) -> *mut FreeNode {
        self.ptr_at(offset).as_ptr() as *mut FreeNode
    }
}

#[cfg(test)]
impl Arena {
    pub(crate) fn present_blocks(&self) -> usize {
        self.bittable.count_ones()
    }

    pub(crate) fn allocated_blocks(&self) -> usize {
        self.bitmalloc.count_ones()
    }

    pub(crate) fn free_blocks(&self, list: usize) -> usize {
        let mut count = 0;
        let mut node = self.lists.head(list);

        while !node.is_null() {
            count += 1;
            node = unsafe { FreeLists::links(node) }.0;
        }

        count
    }
}

impl core::fmt::Debug for Arena {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Arena")
            .field("size", &self.size)
            .field("min_size", &self.min_size)
            .field("protection", &self.protection)
            .finish_non_exhaustive()
    }
}
