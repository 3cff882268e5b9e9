//! Link-list DMA descriptor.
//!
//! Each descriptor points to one block of a data buffer and carries the
//! owner bit used to hand the block between CPU and DMA engine.
//!
//! # Ownership Hand-off
//!
//! The owner bit is the only synchronization between software and the DMA
//! engine. Giving a descriptor to hardware issues a release fence before the
//! owner write, so every earlier buffer and descriptor write is visible
//! first. Observing a cleared owner bit is followed by an acquire fence
//! before software touches the block.

pub mod bits;

use core::sync::atomic::{Ordering, fence};

use bits::dw0;

/// Volatile cell wrapper for descriptor fields
///
/// Ensures all accesses are volatile to prevent compiler optimization
/// from reordering or caching descriptor field accesses.
#[repr(transparent)]
pub(crate) struct VolatileCell<T: Copy> {
    value: core::cell::UnsafeCell<T>,
}

// Safety: VolatileCell is safe to share between threads because all access
// is through volatile operations which are atomic for u32 on ESP32.
unsafe impl<T: Copy> Sync for VolatileCell<T> {}

impl<T: Copy> VolatileCell<T> {
    /// Create a new volatile cell with the given initial value
    #[inline(always)]
    pub const fn new(value: T) -> Self {
        Self {
            value: core::cell::UnsafeCell::new(value),
        }
    }

    /// Read the value (volatile read)
    #[inline(always)]
    pub fn get(&self) -> T {
        unsafe { core::ptr::read_volatile(self.value.get()) }
    }

    /// Write a value (volatile write)
    #[inline(always)]
    pub fn set(&self, value: T) {
        unsafe { core::ptr::write_volatile(self.value.get(), value) }
    }

    /// Update the value using a function (read-modify-write)
    #[inline(always)]
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(T) -> T,
    {
        let old = self.get();
        self.set(f(old));
    }
}

/// Saved copy of the mutable descriptor words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DescriptorSnapshot {
    word0: u32,
    next: u32,
}

/// Link-list DMA descriptor (12 bytes, word aligned).
///
/// | Word | Contents |
/// |------|----------|
/// | 0 | size\[11:0\], length\[23:12\], offset\[28:24\], sub_sof, eof, owner |
/// | 1 | buffer address |
/// | 2 | next descriptor address, 0 terminates the chain |
#[repr(C, align(4))]
pub struct DmaDescriptor {
    /// Word 0: size, length and flags
    word0: VolatileCell<u32>,
    /// Word 1: buffer address
    buf_ptr: VolatileCell<u32>,
    /// Word 2: next descriptor address
    next_link_ptr: VolatileCell<u32>,
}

impl DmaDescriptor {
    /// Size of the descriptor in bytes
    pub const SIZE: usize = 12;

    /// Create a new zeroed descriptor.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            word0: VolatileCell::new(0),
            buf_ptr: VolatileCell::new(0),
            next_link_ptr: VolatileCell::new(0),
        }
    }

    /// Point the descriptor at a block of `len` bytes.
    ///
    /// The size field is rounded up to a word and the length field holds
    /// the full block. Flags are cleared and the chain is left terminated.
    pub fn setup(&self, buffer: *const u8, len: usize) {
        let size = (len.min(dw0::FIELD_MAX as usize) as u32 + 3) & !3;
        let size = size.min(dw0::FIELD_MAX & !3);
        self.buf_ptr.set(buffer as u32);
        self.next_link_ptr.set(0);
        self.word0.set(
            ((size << dw0::SIZE_SHIFT) & dw0::SIZE_MASK)
                | (((len as u32) << dw0::LENGTH_SHIFT) & dw0::LENGTH_MASK),
        );
    }

    /// Address of this descriptor as the DMA engine sees it.
    #[inline(always)]
    #[must_use]
    pub fn addr(&self) -> u32 {
        self as *const Self as u32
    }

    /// Block capacity in bytes.
    #[inline(always)]
    #[must_use]
    pub fn block_size(&self) -> usize {
        ((self.word0.get() & dw0::SIZE_MASK) >> dw0::SIZE_SHIFT) as usize
    }

    /// Valid bytes in the block.
    #[inline(always)]
    #[must_use]
    pub fn length(&self) -> usize {
        ((self.word0.get() & dw0::LENGTH_MASK) >> dw0::LENGTH_SHIFT) as usize
    }

    /// Set the number of valid bytes in the block.
    pub fn set_length(&self, len: usize) {
        self.word0.update(|v| {
            (v & !dw0::LENGTH_MASK) | (((len as u32) << dw0::LENGTH_SHIFT) & dw0::LENGTH_MASK)
        });
    }

    /// Check whether the descriptor ends a transfer.
    #[inline(always)]
    #[must_use]
    pub fn is_eof(&self) -> bool {
        (self.word0.get() & dw0::EOF) != 0
    }

    /// Mark or unmark the descriptor as the last block of a transfer.
    pub fn set_eof(&self, eof: bool) {
        self.word0
            .update(|v| if eof { v | dw0::EOF } else { v & !dw0::EOF });
    }

    /// Check the sub-start-of-frame marker.
    #[inline(always)]
    #[must_use]
    pub fn is_sub_sof(&self) -> bool {
        (self.word0.get() & dw0::SUB_SOF) != 0
    }

    /// Check if descriptor is owned by DMA.
    ///
    /// A `false` result is followed by an acquire fence so the block's
    /// contents written by hardware are visible to the caller.
    #[inline(always)]
    #[must_use]
    pub fn is_owned(&self) -> bool {
        let owned = (self.word0.get() & dw0::OWNER) != 0;
        if !owned {
            fence(Ordering::Acquire);
        }
        owned
    }

    /// Give ownership to DMA.
    #[inline(always)]
    pub fn set_owned(&self) {
        fence(Ordering::Release);
        self.word0.update(|v| v | dw0::OWNER);
    }

    /// Take ownership back from DMA.
    ///
    /// Only valid when the engine is stopped or has already released the
    /// descriptor.
    #[inline(always)]
    pub fn clear_owned(&self) {
        self.word0.update(|v| v & !dw0::OWNER);
    }

    /// Get buffer address.
    #[inline(always)]
    #[must_use]
    pub fn buffer_addr(&self) -> u32 {
        self.buf_ptr.get()
    }

    /// Get next descriptor address (0 at end of chain).
    #[inline(always)]
    #[must_use]
    pub fn next_addr(&self) -> u32 {
        self.next_link_ptr.get()
    }

    /// Link to the next descriptor.
    #[inline(always)]
    pub fn set_next(&self, next: *const DmaDescriptor) {
        self.next_link_ptr.set(next as u32);
    }

    /// Terminate the chain at this descriptor.
    #[inline(always)]
    pub fn set_end_of_chain(&self) {
        self.next_link_ptr.set(0);
    }

    /// Capture the mutable words for a later [`restore`](Self::restore).
    #[must_use]
    pub fn snapshot(&self) -> DescriptorSnapshot {
        DescriptorSnapshot {
            word0: self.word0.get(),
            next: self.next_link_ptr.get(),
        }
    }

    /// Restore the words captured by [`snapshot`](Self::snapshot).
    pub fn restore(&self, snapshot: DescriptorSnapshot) {
        self.next_link_ptr.set(snapshot.next);
        self.word0.set(snapshot.word0);
    }

    /// Zero the descriptor.
    pub fn clear(&self) {
        self.word0.set(0);
        self.buf_ptr.set(0);
        self.next_link_ptr.set(0);
    }
}

impl Default for DmaDescriptor {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_layout_matches_hardware() {
        assert_eq!(core::mem::size_of::<DmaDescriptor>(), DmaDescriptor::SIZE);
        assert_eq!(core::mem::align_of::<DmaDescriptor>(), 4);
    }

    #[test]
    fn new_descriptor_is_software_owned_and_terminated() {
        let desc = DmaDescriptor::new();
        assert!(!desc.is_owned());
        assert!(!desc.is_eof());
        assert_eq!(desc.next_addr(), 0);
        assert_eq!(desc.length(), 0);
    }

    #[test]
    fn setup_sets_size_and_length() {
        let buf = [0u8; 64];
        let desc = DmaDescriptor::new();
        desc.setup(buf.as_ptr(), 61);

        assert_eq!(desc.length(), 61);
        assert_eq!(desc.block_size(), 64);
        assert_eq!(desc.buffer_addr(), buf.as_ptr() as u32);
        assert!(!desc.is_sub_sof());
    }

    #[test]
    fn setup_caps_size_at_field_width() {
        let buf = [0u8; 4];
        let desc = DmaDescriptor::new();
        desc.setup(buf.as_ptr(), 4092);
        assert_eq!(desc.block_size(), 4092);
        assert_eq!(desc.length(), 4092);
    }

    #[test]
    fn owner_bit_round_trip() {
        let desc = DmaDescriptor::new();
        desc.set_owned();
        assert!(desc.is_owned());
        desc.clear_owned();
        assert!(!desc.is_owned());
    }

    #[test]
    fn length_update_preserves_flags() {
        let desc = DmaDescriptor::new();
        desc.set_eof(true);
        desc.set_owned();
        desc.set_length(100);

        assert_eq!(desc.length(), 100);
        assert!(desc.is_eof());
        assert!(desc.is_owned());
    }

    #[test]
    fn snapshot_restore_round_trip() {
        let a = DmaDescriptor::new();
        let b = DmaDescriptor::new();
        a.set_length(12);
        a.set_next(&b);
        let saved = a.snapshot();

        a.set_length(3);
        a.set_eof(true);
        a.set_end_of_chain();
        a.restore(saved);

        assert_eq!(a.length(), 12);
        assert!(!a.is_eof());
        assert_eq!(a.next_addr(), b.addr());
    }
}
