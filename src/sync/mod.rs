//! Synchronization and Concurrency Support
//!
//! This module provides synchronization primitives and concurrency-safe wrappers
//! for the SPI DMA driver. It includes:
//!
//! - **Primitives** (`primitives`): Low-level synchronization types
//!   - [`CriticalSectionCell`] - ISR-safe interior mutability
//!
//! - **Shared Wrappers** (`shared`): ISR-safe channel wrappers
//!   - [`SharedSpiDma`] - Critical-section protected SPI DMA channel
//!
//! # Feature Flags
//!
//! - `critical-section`: Enables this module
//!
//! # Example
//!
//! ```ignore
//! use ph_esp32_spi_dma::sync::SharedSpiDma;
//!
//! static SPI3: SharedSpiDma<Mmio, EspHalInterrupts, 512, 1> =
//!     SharedSpiDma::new(unsafe { Mmio::new() }, EspHalInterrupts::new(Priority::Priority2));
//!
//! fn main() {
//!     SPI3.with(|ch| {
//!         ch.init(config, SPI3_DMA_HANDLER).unwrap();
//!         ch.start(0, &mut delay).unwrap();
//!     });
//! }
//!
//! spi_dma_isr!(SPI3_DMA_HANDLER, Priority::Priority2, {
//!     if let Some(status) = SPI3.handle_interrupt() {
//!         // Hand the finished buffer to a task...
//!     }
//! });
//! ```

// Primitives module (requires critical-section)
mod primitives;

pub use primitives::CriticalSectionCell;

// Shared wrappers (requires critical-section)
mod shared;

pub use shared::SharedSpiDma;
