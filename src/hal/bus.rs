//! Register Bus HAL
//!
//! All peripheral register traffic goes through [`RegisterBus`]. On target
//! the bus is [`Mmio`], which performs volatile accesses at the absolute
//! ESP32 addresses; host tests substitute a simulated register file.
//!
//! # Write Semantics
//!
//! `read`/`write` are single 32-bit accesses. The provided `modify`,
//! `set_bits` and `clear_bits` helpers are read-modify-write and must not be
//! used on write-1-to-clear or self-clearing trigger registers
//! (`SPI_DMA_INT_CLR`, `SPI_CMD.USR`); those are written directly.

use crate::internal::register::{read_reg, write_reg};

/// 32-bit register access primitive.
pub trait RegisterBus {
    /// Read the register at `addr`.
    fn read(&self, addr: usize) -> u32;

    /// Write `value` to the register at `addr`.
    fn write(&self, addr: usize, value: u32);

    /// Read-modify-write the register at `addr`.
    #[inline]
    fn modify<F>(&self, addr: usize, f: F)
    where
        F: FnOnce(u32) -> u32,
    {
        let value = self.read(addr);
        self.write(addr, f(value));
    }

    /// Set `bits` in the register at `addr` (read-modify-write).
    #[inline]
    fn set_bits(&self, addr: usize, bits: u32) {
        self.modify(addr, |v| v | bits);
    }

    /// Clear `bits` in the register at `addr` (read-modify-write).
    #[inline]
    fn clear_bits(&self, addr: usize, bits: u32) {
        self.modify(addr, |v| v & !bits);
    }
}

impl<T: RegisterBus + ?Sized> RegisterBus for &T {
    #[inline]
    fn read(&self, addr: usize) -> u32 {
        T::read(self, addr)
    }

    #[inline]
    fn write(&self, addr: usize, value: u32) {
        T::write(self, addr, value);
    }
}

/// Volatile memory-mapped register bus.
#[derive(Debug)]
pub struct Mmio {
    _private: (),
}

impl Mmio {
    /// Create the MMIO bus handle.
    ///
    /// # Safety
    ///
    /// Only one owner may drive a given SPI instance and its DPORT routing
    /// at a time, and the code must run on an ESP32 where the register
    /// addresses used by this crate are mapped.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl RegisterBus for Mmio {
    #[inline(always)]
    fn read(&self, addr: usize) -> u32 {
        // SAFETY: Mmio::new requires the register map to be present.
        unsafe { read_reg(addr) }
    }

    #[inline(always)]
    fn write(&self, addr: usize, value: u32) {
        // SAFETY: Mmio::new requires the register map to be present.
        unsafe { write_reg(addr, value) }
    }
}
