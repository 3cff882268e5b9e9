//! ESP32 SPI DMA Driver
//!
//! A `no_std`, `no_alloc` Rust driver for the DMA engine of the ESP32 SPI
//! controllers (SPI1, SPI2/HSPI, SPI3/VSPI).
//!
//! The driver moves data between memory and an SPI instance without CPU
//! involvement. Each channel owns a ping-pong (double) buffer: two equally
//! sized buffers, each described by a chain of hardware link-list
//! descriptors, so software can fill or drain one buffer while the DMA
//! engine works on the other.
//!
//! # Architecture
//!
//! The driver is organized into three layers:
//!
//! 1. **Driver Layer** ([`driver`]): [`SpiDmaChannel`] lifecycle, transfer
//!    control and the interrupt source bridge
//! 2. **HAL Layer** ([`hal`]): Register bus, DMA sequences, SPI bus
//!    attributes and the interrupt controller seam
//! 3. **DMA Buffers**: [`DmaDescriptor`], [`DmaElement`] and [`PingPongBuffer`]
//!
//! ## Hardware Notes
//!
//! - Descriptors follow the ESP32 `lldesc_t` layout (size, length, EOF and
//!   owner bits in word 0; buffer and next pointers in words 1 and 2)
//! - One descriptor covers at most 4092 bytes; longer buffers are chained
//! - The in-link start erratum is worked around with a DPORT SPI DMA reset
//!   pulse before `INLINK_START`
//!
//! This release targets ESP32 only.
//!
//! # Features
//!
//! - `esp32` (default): Target the original ESP32
//! - `defmt`: Enable defmt formatting and log output
//! - `log`: Emit diagnostics through the `log` facade
//! - `critical-section`: Enable ISR-safe `SharedSpiDma` wrapper
//! - `esp-hal`: Enable the esp-hal interrupt controller integration
//!
//! # Example
//!
//! ```ignore
//! use ph_esp32_spi_dma::{BufferId, DmaDirection, SpiDmaChannel, SpiDmaConfig, SpiMode};
//! use ph_esp32_spi_dma::hal::Mmio;
//! use ph_esp32_spi_dma::esp_hal::{EspHalInterrupts, Priority};
//!
//! static mut SLAVE_RX: SpiDmaChannel<Mmio, EspHalInterrupts, 512, 1> =
//!     SpiDmaChannel::new(unsafe { Mmio::new() }, EspHalInterrupts::new(Priority::Priority1));
//!
//! let ch = unsafe { &mut *core::ptr::addr_of_mut!(SLAVE_RX) };
//!
//! ch.init(
//!     SpiDmaConfig::new()
//!         .with_spi_num(3)
//!         .with_mode(SpiMode::Slave)
//!         .with_dir(DmaDirection::In)
//!         .with_buf_size(512),
//!     SLAVE_RX_HANDLER,
//! )?;
//!
//! // Free-running: ping and pong are linked into a ring
//! ch.start(0, &mut delay)?;
//!
//! // In the handler, after a receive-done interrupt:
//! if let Some(id) = ch.status_get() {
//!     let data = ch.buf_get(id).unwrap();
//!     // ... consume data ...
//!     ch.release(id)?;
//! }
//! ```
//!
//! # Memory Requirements
//!
//! Two `BUF_CAP`-byte buffers plus `2 * DESC_CAP` 12-byte descriptors per
//! channel, all in DMA-capable SRAM.

#![no_std]
#![deny(missing_docs)]
#![allow(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]
// Clippy lint levels live here; thresholds and config are in clippy.toml.
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::mod_module_files,
    clippy::self_named_module_files,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::struct_excessive_bools,
    clippy::fn_params_excessive_bools,
    clippy::type_complexity,
    clippy::must_use_candidate,
    clippy::assertions_on_constants,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::items_after_statements,
    clippy::let_underscore_future
)]

#[cfg(not(feature = "esp32"))]
compile_error!("Feature 'esp32' must be enabled. It is enabled by default.");

// =============================================================================
// Modules
// =============================================================================

pub mod driver;
pub mod hal;

// Internal implementation details (pub(crate) only)
mod internal;

#[cfg(feature = "esp-hal")]
#[cfg_attr(docsrs, doc(cfg(feature = "esp-hal")))]
pub mod integration;

#[cfg(feature = "critical-section")]
#[cfg_attr(docsrs, doc(cfg(feature = "critical-section")))]
pub mod sync;

// Test utilities (only available during testing)
#[cfg(test)]
pub mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use driver::channel::SpiDmaChannel;
pub use driver::config::{
    BitOrder, BufferId, ChannelState, DmaChannel, DmaDirection, HalfMode, SpiAttr, SpiDmaConfig,
    SpiMode, SpiSpeed, SpiSubMode,
};
pub use driver::error::{
    ConfigError, ConfigResult, DmaError, DmaResult, Error, IoError, IoResult, Result,
};
pub use driver::interrupt::{InterruptStatus, SpiIntSource};
pub use hal::{InterruptController, SpiInterrupt};

// DMA buffer types
pub use internal::dma::{DmaDescriptor, DmaElement, PingPongBuffer};

/// Low-level register accessors for advanced use.
///
/// These are intentionally separated from the primary facade. Most users should
/// prefer the safe driver APIs instead of touching registers directly.
///
/// # Safety
///
/// Direct register access bypasses driver invariants. Use only if you fully
/// understand the ESP32 SPI DMA hardware and accept responsibility for correct
/// sequencing and synchronization.
pub mod unsafe_registers {
    pub use crate::internal::register::dport::DportRegs;
    pub use crate::internal::register::spi::SpiRegs;
}

// Re-export sync types when critical-section is enabled
#[cfg(feature = "critical-section")]
pub use sync::SharedSpiDma;

// esp-hal facade re-export (for ergonomic access)
#[cfg(feature = "esp-hal")]
pub mod esp_hal {
    //! esp-hal integration facade.
    //!
    //! This module re-exports esp-hal integration helpers for ergonomic access.

    #![cfg_attr(docsrs, doc(cfg(feature = "esp-hal")))]

    pub use crate::integration::esp_hal::{
        EspHalInterrupts, Interrupt, InterruptHandler, Priority, interrupt_for,
    };
    pub use crate::spi_dma_isr;
}

/// Shared driver constants.
///
/// These are grouped into a dedicated module to keep the top-level facade
/// focused on driver types and integration points.
pub mod constants {
    pub use crate::internal::constants::{
        // Clocks
        APB_CLK_HZ,
        // Buffer sizes
        DEFAULT_DMA_BUF_SIZE,
        // Timing
        DEFAULT_FIFO_TIMEOUT_US,
        DMA_MAX_BLOCK_SIZE,
        DMA_MAX_TRANSFER_LEN,
        FIFO_POLL_INTERVAL_US,
        // SPI instances
        SPI_NUM_MAX,
        SPI_NUM_MIN,
    };
}

// =============================================================================
// Macro Helpers
// =============================================================================

/// Declare a static, ISR-safe SPI DMA channel.
///
/// This macro expands to a `SharedSpiDma` static on the memory-mapped bus,
/// placed in DMA-capable memory on ESP32.
///
/// # Examples
///
/// ```ignore
/// ph_esp32_spi_dma::spi_dma_static!(
///     SPI2,
///     EspHalInterrupts,
///     EspHalInterrupts::new(Priority::Priority1)
/// );
///
/// SPI2.with(|ch| {
///     ch.init(SpiDmaConfig::new(), SPI2_DMA_HANDLER).unwrap();
///     ch.start(64, &mut delay).unwrap();
/// });
/// ```
#[cfg(feature = "critical-section")]
#[macro_export]
macro_rules! spi_dma_static {
    ($name:ident, $intc_ty:ty, $intc:expr) => {
        $crate::spi_dma_static!($name, $intc_ty, $intc, 64, 1);
    };
    ($name:ident, $intc_ty:ty, $intc:expr, $buf:expr, $desc:expr) => {
        #[cfg_attr(target_arch = "xtensa", unsafe(link_section = ".dram1"))]
        static $name: $crate::sync::SharedSpiDma<$crate::hal::Mmio, $intc_ty, $buf, $desc> =
            $crate::sync::SharedSpiDma::new(
                // SAFETY: the static is the only owner of this channel
                unsafe { $crate::hal::Mmio::new() },
                $intc,
            );
    };
}
