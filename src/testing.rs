//! Testing utilities and mock implementations
//!
//! This module provides mock implementations for testing the SPI DMA driver
//! on the host without hardware access.
//!
//! Only available when running `cargo test`.

// Note: The #[cfg(test)] attribute is applied in lib.rs where this module is declared
#![allow(missing_docs)]
#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]

extern crate std;

use core::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::vec::Vec;

use crate::driver::error::{ConfigError, ConfigResult};
use crate::hal::{InterruptController, RegisterBus, SpiInterrupt};
use crate::internal::register::spi::{
    SPI_CMD_OFFSET, SPI_DMA_INT_CLR_OFFSET, SPI_DMA_INT_RAW_OFFSET, SPI_DMA_INT_ST_OFFSET, SPI_USR,
    spi_base,
};

// =============================================================================
// Mock Register Bus
// =============================================================================

/// Simulated register file for driver tests
///
/// Unwritten registers read as zero. Two hardware write semantics are
/// modelled:
/// - `SPI_CMD_REG.USR` is self-clearing: the write is logged, the bit is
///   not stored.
/// - `SPI_DMA_INT_CLR_REG` is write-1-to-clear: written bits are removed
///   from `SPI_DMA_INT_RAW_REG` and `SPI_DMA_INT_ST_REG`.
///
/// # Example
///
/// ```ignore
/// let bus = MockRegisterBus::new();
/// bus.set(spi_base(2) + SPI_OUT_EOF_DES_ADDR_OFFSET, tail_addr);
/// assert_eq!(channel.status_get(), Some(BufferId::Ping));
/// ```
#[derive(Debug, Default)]
pub struct MockRegisterBus {
    /// Register values by absolute address
    registers: RefCell<HashMap<usize, u32>>,
    /// Record of writes: (address, value)
    write_log: RefCell<Vec<(usize, u32)>>,
}

impl MockRegisterBus {
    /// Create an empty register file
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a register value without logging (simulates hardware)
    pub fn set(&self, addr: usize, value: u32) {
        self.registers.borrow_mut().insert(addr, value);
    }

    /// Current value of a register
    pub fn get(&self, addr: usize) -> u32 {
        self.registers.borrow().get(&addr).copied().unwrap_or(0)
    }

    /// All writes made through the bus
    pub fn writes(&self) -> Vec<(usize, u32)> {
        self.write_log.borrow().clone()
    }

    /// Values written to one address, in order
    pub fn writes_to(&self, addr: usize) -> Vec<u32> {
        self.write_log
            .borrow()
            .iter()
            .filter(|(a, _)| *a == addr)
            .map(|(_, v)| *v)
            .collect()
    }

    /// Clear the write log
    pub fn clear_writes(&self) {
        self.write_log.borrow_mut().clear();
    }

    /// Snapshot of every register that has a value
    pub fn snapshot(&self) -> HashMap<usize, u32> {
        self.registers.borrow().clone()
    }

    fn spi_instance_offset(addr: usize) -> Option<(usize, usize)> {
        (0..=3u8).map(spi_base).find_map(|base| {
            addr.checked_sub(base)
                .filter(|off| *off < 0x1000)
                .map(|off| (base, off))
        })
    }
}

impl RegisterBus for MockRegisterBus {
    fn read(&self, addr: usize) -> u32 {
        self.get(addr)
    }

    fn write(&self, addr: usize, value: u32) {
        self.write_log.borrow_mut().push((addr, value));

        match Self::spi_instance_offset(addr) {
            Some((_, SPI_CMD_OFFSET)) => self.set(addr, value & !SPI_USR),
            Some((base, SPI_DMA_INT_CLR_OFFSET)) => {
                for off in [SPI_DMA_INT_RAW_OFFSET, SPI_DMA_INT_ST_OFFSET] {
                    let current = self.get(base + off);
                    self.set(base + off, current & !value);
                }
            }
            _ => self.set(addr, value),
        }
    }
}

// =============================================================================
// Mock Interrupt Controller
// =============================================================================

/// Test interrupt handler type
pub type MockHandler = fn();

/// Handler used by tests that never fire interrupts
pub fn noop_handler() {}

/// Recording interrupt controller
#[derive(Debug, Default)]
pub struct MockInterruptController {
    attached: RefCell<Vec<SpiInterrupt>>,
    enabled: RefCell<Vec<SpiInterrupt>>,
    disabled: RefCell<Vec<SpiInterrupt>>,
    fail_enable: Cell<bool>,
}

impl MockInterruptController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `enable` calls fail
    pub fn set_fail_enable(&self, fail: bool) {
        self.fail_enable.set(fail);
    }

    pub fn attached(&self) -> Vec<SpiInterrupt> {
        self.attached.borrow().clone()
    }

    pub fn enabled(&self) -> Vec<SpiInterrupt> {
        self.enabled.borrow().clone()
    }

    pub fn disabled(&self) -> Vec<SpiInterrupt> {
        self.disabled.borrow().clone()
    }
}

impl InterruptController for MockInterruptController {
    type Handler = MockHandler;

    fn attach(&self, line: SpiInterrupt, _handler: MockHandler) {
        self.attached.borrow_mut().push(line);
    }

    fn enable(&self, line: SpiInterrupt) -> ConfigResult<()> {
        if self.fail_enable.get() {
            return Err(ConfigError::InterruptError);
        }
        self.enabled.borrow_mut().push(line);
        Ok(())
    }

    fn disable(&self, line: SpiInterrupt) {
        self.disabled.borrow_mut().push(line);
    }
}

// =============================================================================
// Mock Delay
// =============================================================================

/// Mock delay for testing without actual timing
///
/// Records delays for verification without actually waiting.
#[derive(Debug, Default)]
pub struct MockDelay {
    /// Total nanoseconds delayed
    total_ns: RefCell<u64>,
}

impl MockDelay {
    /// Create a new mock delay
    pub fn new() -> Self {
        Self::default()
    }

    /// Get total nanoseconds that were "delayed"
    pub fn total_ns(&self) -> u64 {
        *self.total_ns.borrow()
    }

    /// Get total microseconds that were "delayed"
    pub fn total_us(&self) -> u64 {
        self.total_ns() / 1_000
    }
}

impl embedded_hal::delay::DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        *self.total_ns.borrow_mut() += ns as u64;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::register::spi::{SPI_DMA_CONF_OFFSET, SPI_OUT_EOF_INT};

    #[test]
    fn unwritten_registers_read_zero() {
        let bus = MockRegisterBus::new();
        assert_eq!(bus.read(0x3FF6_4000), 0);
    }

    #[test]
    fn usr_bit_self_clears() {
        let bus = MockRegisterBus::new();
        let cmd = spi_base(2) + SPI_CMD_OFFSET;
        bus.write(cmd, SPI_USR);

        assert_eq!(bus.get(cmd), 0);
        assert_eq!(bus.writes_to(cmd), [SPI_USR]);
    }

    #[test]
    fn int_clr_is_write_one_to_clear() {
        let bus = MockRegisterBus::new();
        let base = spi_base(1);
        bus.set(base + SPI_DMA_INT_RAW_OFFSET, SPI_OUT_EOF_INT | 1);
        bus.set(base + SPI_DMA_INT_ST_OFFSET, SPI_OUT_EOF_INT);

        bus.write(base + SPI_DMA_INT_CLR_OFFSET, SPI_OUT_EOF_INT);

        assert_eq!(bus.get(base + SPI_DMA_INT_RAW_OFFSET), 1);
        assert_eq!(bus.get(base + SPI_DMA_INT_ST_OFFSET), 0);
        assert_eq!(bus.get(base + SPI_DMA_INT_CLR_OFFSET), 0);
    }

    #[test]
    fn modify_goes_through_log() {
        let bus = MockRegisterBus::new();
        let conf = spi_base(3) + SPI_DMA_CONF_OFFSET;
        bus.set_bits(conf, 0b100);
        bus.clear_bits(conf, 0b100);
        assert_eq!(bus.writes_to(conf), [0b100, 0]);
    }

    #[test]
    fn mock_interrupt_controller_records() {
        let intc = MockInterruptController::new();
        intc.attach(SpiInterrupt::Spi2Dma, noop_handler);
        intc.enable(SpiInterrupt::Spi2Dma).unwrap();
        intc.set_fail_enable(true);
        assert_eq!(intc.enable(SpiInterrupt::Spi2Dma), Err(ConfigError::InterruptError));

        assert_eq!(intc.attached(), [SpiInterrupt::Spi2Dma]);
        assert_eq!(intc.enabled(), [SpiInterrupt::Spi2Dma]);
    }

    #[test]
    fn mock_delay_accumulates() {
        let mut delay = MockDelay::new();
        embedded_hal::delay::DelayNs::delay_us(&mut delay, 3);
        embedded_hal::delay::DelayNs::delay_ns(&mut delay, 500);
        assert_eq!(delay.total_ns(), 3_500);
        assert_eq!(delay.total_us(), 3);
    }
}
