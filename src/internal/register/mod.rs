//! Memory-mapped register definitions for the ESP32 SPI DMA engine
//!
//! Register blocks are reached through a [`RegisterBus`](crate::hal::RegisterBus)
//! so that the same accessors drive silicon (volatile MMIO) and host tests
//! (a simulated register file).

pub mod dport;
pub mod spi;

/// Read a 32-bit register at the given address
///
/// # Safety
/// The caller must ensure the address is valid and properly aligned.
#[inline(always)]
pub unsafe fn read_reg(addr: usize) -> u32 {
    unsafe { core::ptr::read_volatile(addr as *const u32) }
}

/// Write a 32-bit value to a register at the given address
///
/// # Safety
/// The caller must ensure the address is valid and properly aligned.
#[inline(always)]
pub unsafe fn write_reg(addr: usize, value: u32) {
    unsafe { core::ptr::write_volatile(addr as *mut u32, value) }
}

// =============================================================================
// Register Access Macros
// =============================================================================
//
// The generated methods expect `self.bus: &impl RegisterBus` and
// `self.base: usize` on the register block.

/// Generate read/write accessor methods for a register.
///
/// # Example
/// ```ignore
/// impl<B: RegisterBus> SpiRegs<'_, B> {
///     reg_rw!(dma_conf, set_dma_conf, SPI_DMA_CONF_OFFSET,
///             "DMA configuration register");
/// }
/// ```
macro_rules! reg_rw {
    ($read_fn:ident, $write_fn:ident, $offset:expr, $doc:expr) => {
        #[doc = concat!("Read ", $doc)]
        #[inline(always)]
        pub fn $read_fn(&self) -> u32 {
            self.bus.read(self.base + $offset)
        }

        #[doc = concat!("Write ", $doc)]
        #[inline(always)]
        pub fn $write_fn(&self, value: u32) {
            self.bus.write(self.base + $offset, value);
        }
    };
}

/// Generate a read-only accessor method for a register.
macro_rules! reg_ro {
    ($read_fn:ident, $offset:expr, $doc:expr) => {
        #[doc = concat!("Read ", $doc)]
        #[inline(always)]
        pub fn $read_fn(&self) -> u32 {
            self.bus.read(self.base + $offset)
        }
    };
}

/// Generate a write-only accessor method for a register.
///
/// Used for write-1-to-clear and trigger registers, which must never be
/// touched with a read-modify-write.
macro_rules! reg_wo {
    ($write_fn:ident, $offset:expr, $doc:expr) => {
        #[doc = concat!("Write ", $doc)]
        #[inline(always)]
        pub fn $write_fn(&self, value: u32) {
            self.bus.write(self.base + $offset, value);
        }
    };
}

/// Generate set/clear bit operation methods for a register.
///
/// # Example
/// ```ignore
/// impl<B: RegisterBus> SpiRegs<'_, B> {
///     reg_bit_ops!(set_continuous, clear_continuous, SPI_DMA_CONF_OFFSET,
///                  SPI_DMA_CONTINUE, "continuous DMA", "Enable", "Disable");
/// }
/// ```
macro_rules! reg_bit_ops {
    ($set_fn:ident, $clear_fn:ident, $offset:expr, $bit:expr, $what:expr, $set_verb:expr, $clear_verb:expr) => {
        #[doc = concat!($set_verb, " ", $what)]
        #[inline(always)]
        pub fn $set_fn(&self) {
            self.bus.set_bits(self.base + $offset, $bit);
        }

        #[doc = concat!($clear_verb, " ", $what)]
        #[inline(always)]
        pub fn $clear_fn(&self) {
            self.bus.clear_bits(self.base + $offset, $bit);
        }
    };
}

/// Generate a bit check method (true when bit is set).
macro_rules! reg_bit_check {
    ($fn:ident, $offset:expr, $bit:expr, $doc:expr) => {
        #[doc = $doc]
        #[inline(always)]
        pub fn $fn(&self) -> bool {
            (self.bus.read(self.base + $offset) & $bit) != 0
        }
    };
}

// Export macros for use in submodules
pub(crate) use reg_bit_check;
pub(crate) use reg_bit_ops;
pub(crate) use reg_ro;
pub(crate) use reg_rw;
pub(crate) use reg_wo;
