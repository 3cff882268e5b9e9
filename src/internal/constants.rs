//! Centralized Constants
//!
//! This module provides a single source of truth for the sizing and timing
//! constants used throughout the SPI DMA driver.
//!
//! # Note
//!
//! Hardware register bit definitions remain in their respective modules
//! (`register/spi.rs`, `register/dport.rs`) as they are specific to those
//! hardware blocks.

use super::register::spi::SPI_BITLEN_MASK;

// =============================================================================
// Peripheral Instances
// =============================================================================

/// Highest SPI instance number served by the DMA engine (SPI1..=SPI3)
pub const SPI_NUM_MAX: u8 = 3;

/// Lowest SPI instance number served by the DMA engine
pub const SPI_NUM_MIN: u8 = 1;

// =============================================================================
// Descriptor and Buffer Sizes
// =============================================================================

/// Largest block a single link-list descriptor can describe (12-bit field,
/// word aligned)
pub const DMA_MAX_BLOCK_SIZE: usize = 4092;

/// Longest transfer the SPI bit-length registers can express, in bytes
pub const DMA_MAX_TRANSFER_LEN: usize = (SPI_BITLEN_MASK as usize + 1) / 8;

/// Default ping/pong buffer size in bytes
pub const DEFAULT_DMA_BUF_SIZE: usize = 64;

// =============================================================================
// Timing Constants
// =============================================================================

/// Default bound on the TX FIFO-fill wait in `start`, in microseconds
pub const DEFAULT_FIFO_TIMEOUT_US: u32 = 1_000;

/// Poll interval of the TX FIFO-fill wait, in microseconds
pub const FIFO_POLL_INTERVAL_US: u32 = 1;

// =============================================================================
// Clocks
// =============================================================================

/// APB clock feeding the SPI clock divider (80 MHz)
pub const APB_CLK_HZ: u32 = 80_000_000;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_size_fits_descriptor_field_and_is_word_aligned() {
        assert!(DMA_MAX_BLOCK_SIZE <= 0xFFF);
        assert_eq!(DMA_MAX_BLOCK_SIZE % 4, 0);
    }

    #[test]
    fn max_transfer_matches_24_bit_length_register() {
        assert_eq!(DMA_MAX_TRANSFER_LEN, 2 * 1024 * 1024);
    }

    #[test]
    fn spi_range_is_sane() {
        assert!(SPI_NUM_MIN <= SPI_NUM_MAX);
        assert!(DEFAULT_DMA_BUF_SIZE <= DMA_MAX_BLOCK_SIZE);
    }
}
