//! Hardware Abstraction Layer
//!
//! This module provides higher-level abstractions over the raw registers,
//! making it easier to drive the SPI DMA engine without dealing with
//! register-level details.
//!
//! # Modules
//!
//! - [`bus`]: Register access primitive and the volatile MMIO bus
//! - [`dma`]: DMA reset, channel routing, link control, FIFO-fill wait
//! - [`intr`]: Interrupt controller seam and SPI DMA interrupt lines
//! - [`spi`]: SPI bus attribute and clock divider programming
//!
//! # Delay Integration
//!
//! All types that require delays use `embedded_hal::delay::DelayNs` directly.
//! Pass any delay implementation from your HAL (e.g., `esp_hal::delay::Delay`).

pub mod bus;
pub mod dma;
pub mod intr;
pub mod spi;

// Re-export commonly used types
pub use bus::{Mmio, RegisterBus};
pub use dma::DmaController;
pub use intr::{InterruptController, SpiInterrupt};
pub use spi::{SpiBusController, clock_register};
