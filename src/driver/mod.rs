//! Core driver components for the ESP32 SPI DMA engine.
//!
//! This module contains the essential building blocks for configuring and
//! operating an SPI instance in DMA mode:
//!
//! - [`config`] - Configuration types and builder patterns
//! - [`error`] - Error types and result aliases
//! - [`interrupt`] - Interrupt source bridge (slave and DMA interrupt bits)
//! - [`channel`] - The SPI DMA channel and its lifecycle
//!
//! # Example
//!
//! ```ignore
//! use ph_esp32_spi_dma::driver::{DmaChannel, DmaDirection, SpiDmaConfig, SpiMode};
//!
//! let config = SpiDmaConfig::new()
//!     .with_spi_num(3)
//!     .with_mode(SpiMode::Slave)
//!     .with_dir(DmaDirection::In)
//!     .with_channel(DmaChannel::Channel1)
//!     .with_buf_size(512);
//! ```

// Submodules
pub mod channel;
pub mod config;
pub mod error;
pub mod interrupt;

// Re-exports for convenience
pub use channel::SpiDmaChannel;
pub use config::{
    BitOrder, BufferId, ChannelState, DmaChannel, DmaDirection, HalfMode, SpiAttr, SpiDmaConfig,
    SpiMode, SpiSpeed, SpiSubMode,
};
pub use error::{ConfigError, ConfigResult, DmaError, DmaResult, Error, IoError, IoResult, Result};
pub use interrupt::{
    InterruptStatus, SpiIntSource, int_clear, int_disable, int_enable, int_status_get,
};
