//! External Stack Integrations
//!
//! This module provides integrations with external libraries and frameworks:
//!
//! - **esp-hal** (`esp_hal`): Integration with the esp-hal hardware abstraction layer
//!   - [`InterruptController`](crate::hal::InterruptController) backed by the
//!     esp-hal interrupt matrix
//!   - Handler definition macro
//!   - Requires `esp-hal` feature
//!
//! # Feature Flags
//!
//! - `esp-hal`: Enables esp-hal integration (`esp_hal` submodule)
//!
//! # Example
//!
//! ```ignore
//! use ph_esp32_spi_dma::integration::esp_hal::{EspHalInterrupts, Priority};
//!
//! let intc = EspHalInterrupts::new(Priority::Priority1);
//! ```

#[cfg(feature = "esp-hal")]
pub mod esp_hal;

// Re-export key types for convenience
#[cfg(feature = "esp-hal")]
pub use esp_hal::{EspHalInterrupts, interrupt_for};
