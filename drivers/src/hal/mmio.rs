//! Memory-mapped register window access.

use alloc::boxed::Box;
use alloc::sync::Arc;
use core::ptr::{read_volatile, write_volatile};
use core::sync::atomic::{AtomicU32, Ordering};

/// A window of device registers or device-shared memory, addressed by
/// byte offset from its base. Multi-byte values are little-endian.
pub trait RegisterBlock: Send + Sync {
    fn read8(&self, offset: usize) -> u8;
    fn write8(&self, offset: usize, value: u8);
    fn read32(&self, offset: usize) -> u32;
    fn write32(&self, offset: usize, value: u32);

    fn read16(&self, offset: usize) -> u16 {
        u16::from_le_bytes([self.read8(offset), self.read8(offset + 1)])
    }

    fn write16(&self, offset: usize, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.write8(offset, lo);
        self.write8(offset + 1, hi);
    }

    fn read_bytes(&self, offset: usize, buf: &mut [u8]) {
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = self.read8(offset + i);
        }
    }

    fn write_bytes(&self, offset: usize, data: &[u8]) {
        for (i, &byte) in data.iter().enumerate() {
            self.write8(offset + i, byte);
        }
    }
}

impl<T: RegisterBlock + ?Sized> RegisterBlock for Arc<T> {
    fn read8(&self, offset: usize) -> u8 {
        (**self).read8(offset)
    }

    fn write8(&self, offset: usize, value: u8) {
        (**self).write8(offset, value)
    }

    fn read32(&self, offset: usize) -> u32 {
        (**self).read32(offset)
    }

    fn write32(&self, offset: usize, value: u32) {
        (**self).write32(offset, value)
    }
}

/// Volatile access to a physical MMIO window.
#[derive(Debug)]
pub struct Mmio {
    base: usize,
    len: usize,
}

impl Mmio {
    /// Wrap the window `[base, base + len)`.
    ///
    /// # Safety
    ///
    /// The window must be mapped device memory for the lifetime of the
    /// returned value, and 32-bit accesses must be naturally aligned.
    pub const unsafe fn new(base: usize, len: usize) -> Self {
        Self { base, len }
    }

    #[inline]
    fn addr(&self, offset: usize, width: usize) -> usize {
        debug_assert!(offset + width <= self.len, "mmio access past window end");
        self.base + offset
    }
}

impl RegisterBlock for Mmio {
    #[inline]
    fn read8(&self, offset: usize) -> u8 {
        unsafe { read_volatile(self.addr(offset, 1) as *const u8) }
    }

    #[inline]
    fn write8(&self, offset: usize, value: u8) {
        unsafe { write_volatile(self.addr(offset, 1) as *mut u8, value) }
    }

    #[inline]
    fn read32(&self, offset: usize) -> u32 {
        unsafe { read_volatile(self.addr(offset, 4) as *const u32) }
    }

    #[inline]
    fn write32(&self, offset: usize, value: u32) {
        unsafe { write_volatile(self.addr(offset, 4) as *mut u32, value) }
    }
}

// SAFETY: Mmio wraps device memory; ordering between users is the
// caller's protocol, not the window's.
unsafe impl Send for Mmio {}
unsafe impl Sync for Mmio {}

/// RAM-backed window for host simulation.
///
/// Storage is a slice of atomic words, so every byte or word access is
/// atomic and two parties (driver and simulated device) can share it
/// across threads. Accesses outside the window read as zero and are
/// otherwise ignored.
#[derive(Debug)]
pub struct RamRegion {
    words: Box<[AtomicU32]>,
}

impl RamRegion {
    /// Create a zeroed window of at least `len` bytes.
    pub fn new(len: usize) -> Self {
        let words = (0..len.div_ceil(4)).map(|_| AtomicU32::new(0)).collect();
        Self { words }
    }

    pub fn len(&self) -> usize {
        self.words.len() * 4
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Atomically OR `mask` into the aligned word at `offset`.
    pub fn set_bits32(&self, offset: usize, mask: u32) {
        if let Some(word) = self.word(offset) {
            word.fetch_or(mask, Ordering::AcqRel);
        }
    }

    /// Atomically clear `mask` in the aligned word at `offset`.
    pub fn clear_bits32(&self, offset: usize, mask: u32) {
        if let Some(word) = self.word(offset) {
            word.fetch_and(!mask, Ordering::AcqRel);
        }
    }

    fn word(&self, offset: usize) -> Option<&AtomicU32> {
        debug_assert_eq!(offset % 4, 0, "unaligned word access");
        self.words.get(offset / 4)
    }
}

impl RegisterBlock for RamRegion {
    fn read8(&self, offset: usize) -> u8 {
        let shift = (offset % 4) * 8;
        self.words
            .get(offset / 4)
            .map_or(0, |w| (w.load(Ordering::Acquire) >> shift) as u8)
    }

    fn write8(&self, offset: usize, value: u8) {
        let shift = (offset % 4) * 8;
        if let Some(word) = self.words.get(offset / 4) {
            let mask = 0xFFu32 << shift;
            let _ = word.fetch_update(Ordering::AcqRel, Ordering::Acquire, |w| {
                Some((w & !mask) | (u32::from(value) << shift))
            });
        }
    }

    fn read32(&self, offset: usize) -> u32 {
        self.word(offset).map_or(0, |w| w.load(Ordering::Acquire))
    }

    fn write32(&self, offset: usize, value: u32) {
        if let Some(word) = self.word(offset) {
            word.store(value, Ordering::Release);
        }
    }
}
