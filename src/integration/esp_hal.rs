//! esp-hal Integration Module
//!
//! This module provides ergonomic integration with `esp-hal` when the `esp-hal` feature
//! is enabled. It offers:
//!
//! - [`EspHalInterrupts`]: [`InterruptController`] backed by the esp-hal interrupt API
//! - [`spi_dma_isr!`]: Macro for defining SPI DMA interrupt handlers with esp-hal semantics
//! - Re-exports for common esp-hal types
//!
//! # Usage
//!
//! ```ignore
//! use ph_esp32_spi_dma::{SpiDmaConfig, sync::SharedSpiDma, hal::Mmio};
//! use ph_esp32_spi_dma::esp_hal::{spi_dma_isr, EspHalInterrupts, Priority};
//! use esp_hal::delay::Delay;
//!
//! static SPI2: SharedSpiDma<Mmio, EspHalInterrupts, 1024, 1> =
//!     SharedSpiDma::new(unsafe { Mmio::new() }, EspHalInterrupts::new(Priority::Priority1));
//!
//! spi_dma_isr!(SPI2_DMA_HANDLER, Priority::Priority1, {
//!     if let Some(status) = SPI2.handle_interrupt() {
//!         if status.buffer_done() {
//!             // Signal the consumer task...
//!         }
//!     }
//! });
//!
//! fn main() {
//!     let mut delay = Delay::new();
//!     SPI2.with(|ch| {
//!         ch.init(SpiDmaConfig::new().with_buf_size(1024), SPI2_DMA_HANDLER)?;
//!         ch.start(1024, &mut delay)
//!     })
//!     .unwrap();
//! }
//! ```

use crate::driver::error::{ConfigError, ConfigResult};
use crate::hal::{InterruptController, SpiInterrupt};

// Re-export esp-hal types for convenience
pub use esp_hal::interrupt::{self, InterruptHandler, Priority};
pub use esp_hal::peripherals::Interrupt;

/// esp-hal peripheral interrupt for an SPI DMA line.
pub const fn interrupt_for(line: SpiInterrupt) -> Interrupt {
    match line {
        SpiInterrupt::Spi1Dma => Interrupt::SPI1_DMA,
        SpiInterrupt::Spi2Dma => Interrupt::SPI2_DMA,
        SpiInterrupt::Spi3Dma => Interrupt::SPI3_DMA,
    }
}

/// Interrupt controller routing SPI DMA lines through esp-hal.
///
/// `priority` is the level passed to `esp_hal::interrupt::enable`. Keep it
/// equal to the priority the handler was declared with.
#[derive(Debug, Clone, Copy)]
pub struct EspHalInterrupts {
    priority: Priority,
}

impl EspHalInterrupts {
    /// Controller enabling lines at `priority`.
    pub const fn new(priority: Priority) -> Self {
        Self { priority }
    }

    /// Priority used by [`enable`](InterruptController::enable)
    pub const fn priority(&self) -> Priority {
        self.priority
    }
}

impl InterruptController for EspHalInterrupts {
    type Handler = InterruptHandler;

    fn attach(&self, line: SpiInterrupt, handler: InterruptHandler) {
        // SAFETY: each SPI instance has one channel, which owns its DMA line
        unsafe {
            esp_hal::interrupt::bind_interrupt(interrupt_for(line), handler.handler());
        }
    }

    fn enable(&self, line: SpiInterrupt) -> ConfigResult<()> {
        esp_hal::interrupt::enable(interrupt_for(line), self.priority)
            .map_err(|_| ConfigError::InterruptError)
    }

    fn disable(&self, line: SpiInterrupt) {
        esp_hal::interrupt::disable(esp_hal::system::Cpu::current(), interrupt_for(line));
    }
}

/// Macro for defining an SPI DMA interrupt handler with esp-hal semantics.
///
/// # Parameters
///
/// - `$name`: The name for the handler constant (e.g., `SPI2_DMA_HANDLER`)
/// - `$priority`: The interrupt priority (e.g., `Priority::Priority1`)
/// - `$body`: The handler body
///
/// # Example
///
/// ```ignore
/// use ph_esp32_spi_dma::esp_hal::{spi_dma_isr, Priority};
///
/// spi_dma_isr!(SPI3_DMA_HANDLER, Priority::Priority2, {
///     let _ = SPI3.handle_interrupt();
/// });
///
/// SPI3.with(|ch| ch.init(config, SPI3_DMA_HANDLER)).unwrap();
/// ```
///
/// # Equivalent Code
///
/// The macro expands to something like:
///
/// ```ignore
/// #[esp_hal::handler(priority = $priority)]
/// fn __spi_dma_isr_internal() {
///     $body
/// }
/// const $name: InterruptHandler = __spi_dma_isr_internal;
/// ```
#[macro_export]
macro_rules! spi_dma_isr {
    ($name:ident, $priority:expr, $body:block) => {
        #[allow(non_upper_case_globals)]
        const $name: $crate::esp_hal::InterruptHandler = {
            #[esp_hal::handler(priority = $priority)]
            fn __spi_dma_isr_internal() {
                $body
            }
            __spi_dma_isr_internal
        };
    };
}
