//! Interrupt Controller HAL
//!
//! The driver never talks to the CPU interrupt matrix directly. It asks an
//! [`InterruptController`] to attach, enable and disable the DMA interrupt
//! line of its SPI instance. The esp-hal implementation lives in
//! `integration::esp_hal`; tests use a recording mock.

use crate::driver::error::{ConfigError, ConfigResult};

/// DMA interrupt line of one SPI instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiInterrupt {
    /// SPI1 DMA interrupt (source 52)
    Spi1Dma,
    /// SPI2 DMA interrupt (source 53)
    Spi2Dma,
    /// SPI3 DMA interrupt (source 54)
    Spi3Dma,
}

impl SpiInterrupt {
    /// Line for SPI instance `spi_num`.
    ///
    /// # Errors
    /// - `InvalidSpiNum` - `spi_num` outside 1..=3
    pub const fn from_spi_num(spi_num: u8) -> ConfigResult<Self> {
        match spi_num {
            1 => Ok(SpiInterrupt::Spi1Dma),
            2 => Ok(SpiInterrupt::Spi2Dma),
            3 => Ok(SpiInterrupt::Spi3Dma),
            _ => Err(ConfigError::InvalidSpiNum),
        }
    }

    /// Peripheral interrupt source number in the ESP32 interrupt matrix
    pub const fn source(self) -> u8 {
        match self {
            SpiInterrupt::Spi1Dma => 52,
            SpiInterrupt::Spi2Dma => 53,
            SpiInterrupt::Spi3Dma => 54,
        }
    }

    /// SPI instance served by this line
    pub const fn spi_num(self) -> u8 {
        match self {
            SpiInterrupt::Spi1Dma => 1,
            SpiInterrupt::Spi2Dma => 2,
            SpiInterrupt::Spi3Dma => 3,
        }
    }
}

/// Binding of SPI DMA interrupt lines to handlers.
pub trait InterruptController {
    /// Handler type accepted by [`attach`](Self::attach)
    type Handler: Copy;

    /// Route `line` to `handler`, replacing any previous binding.
    fn attach(&self, line: SpiInterrupt, handler: Self::Handler);

    /// Unmask `line` at the CPU.
    ///
    /// # Errors
    /// - `InterruptError` - the controller refused the line
    fn enable(&self, line: SpiInterrupt) -> ConfigResult<()>;

    /// Mask `line` at the CPU.
    fn disable(&self, line: SpiInterrupt);
}

impl<T: InterruptController + ?Sized> InterruptController for &T {
    type Handler = T::Handler;

    #[inline]
    fn attach(&self, line: SpiInterrupt, handler: Self::Handler) {
        T::attach(self, line, handler);
    }

    #[inline]
    fn enable(&self, line: SpiInterrupt) -> ConfigResult<()> {
        T::enable(self, line)
    }

    #[inline]
    fn disable(&self, line: SpiInterrupt) {
        T::disable(self, line);
    }
}
