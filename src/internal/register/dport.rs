//! DPORT Register Definitions
//!
//! The DPORT block holds the system-level SPI DMA routing: which of the two
//! shared DMA channels serves each SPI instance, and the SPI DMA clock and
//! reset gates.

use super::reg_bit_ops;
use crate::hal::bus::RegisterBus;

/// DPORT register block base address
pub const DPORT_BASE: usize = 0x3FF0_0000;

// =============================================================================
// Register Offsets
// =============================================================================

/// Peripheral clock enable register offset
pub const DPORT_PERIP_CLK_EN_OFFSET: usize = 0x0C0;
/// Peripheral reset register offset
pub const DPORT_PERIP_RST_EN_OFFSET: usize = 0x0C4;
/// SPI DMA channel select register offset
pub const DPORT_SPI_DMA_CHAN_SEL_OFFSET: usize = 0x5A8;

// =============================================================================
// Bits
// =============================================================================

/// SPI DMA clock gate (PERIP_CLK_EN) and reset (PERIP_RST_EN) bit
pub const DPORT_SPI_DMA: u32 = 1 << 22;

/// Width of one channel-select field
pub const DPORT_SPI_DMA_CHAN_SEL_WIDTH: u32 = 2;

/// Channel-select field mask (unshifted)
pub const DPORT_SPI_DMA_CHAN_SEL_MASK: u32 = 0x3;

/// Shift of the channel-select field for SPI1..SPI3.
#[inline(always)]
pub const fn chan_sel_shift(spi_num: u8) -> u32 {
    (spi_num.saturating_sub(1) as u32) * DPORT_SPI_DMA_CHAN_SEL_WIDTH
}

// =============================================================================
// Register Block
// =============================================================================

/// DPORT registers used by the SPI DMA engine.
pub struct DportRegs<'a, B: RegisterBus> {
    bus: &'a B,
    base: usize,
}

impl<'a, B: RegisterBus> DportRegs<'a, B> {
    /// Bind the DPORT block on `bus`.
    #[inline(always)]
    pub fn new(bus: &'a B) -> Self {
        Self {
            bus,
            base: DPORT_BASE,
        }
    }

    reg_bit_ops!(enable_spi_dma_clock, disable_spi_dma_clock, DPORT_PERIP_CLK_EN_OFFSET,
                 DPORT_SPI_DMA, "SPI DMA clock", "Enable", "Disable");
    reg_bit_ops!(assert_spi_dma_reset, release_spi_dma_reset, DPORT_PERIP_RST_EN_OFFSET,
                 DPORT_SPI_DMA, "SPI DMA reset", "Assert", "Release");

    /// Route DMA channel `select` (1 or 2, 0 = none) to SPI instance `spi_num`.
    pub fn select_spi_dma_channel(&self, spi_num: u8, select: u32) {
        let shift = chan_sel_shift(spi_num);
        self.bus.modify(self.base + DPORT_SPI_DMA_CHAN_SEL_OFFSET, |v| {
            (v & !(DPORT_SPI_DMA_CHAN_SEL_MASK << shift))
                | ((select & DPORT_SPI_DMA_CHAN_SEL_MASK) << shift)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_select_address_matches_trm() {
        assert_eq!(DPORT_BASE + DPORT_SPI_DMA_CHAN_SEL_OFFSET, 0x3FF0_05A8);
        assert_eq!(DPORT_BASE + DPORT_PERIP_RST_EN_OFFSET, 0x3FF0_00C4);
    }

    #[test]
    fn channel_select_fields_are_two_bits_per_instance() {
        assert_eq!(chan_sel_shift(1), 0);
        assert_eq!(chan_sel_shift(2), 2);
        assert_eq!(chan_sel_shift(3), 4);
    }
}
