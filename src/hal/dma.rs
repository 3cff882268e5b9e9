//! DMA Controller HAL
//!
//! Register sequences of the SPI DMA sub-block: reset, channel routing,
//! link start/stop and the bounded TX FIFO-fill wait.

use embedded_hal::delay::DelayNs;

use crate::driver::config::DmaDirection;
use crate::driver::error::{IoError, IoResult};
use crate::hal::RegisterBus;
use crate::internal::register::dport::DportRegs;
use crate::internal::register::spi::{
    SPI_DMA_CONF_OFFSET, SPI_DMA_RESET_MASK, SPI_LINK_ADDR_MASK, SPI_LINK_START, SPI_LINK_STOP,
    SpiRegs,
};

#[cfg(feature = "log")]
use log::warn;

/// DMA register sequences for one SPI instance.
pub struct DmaController<'a, B: RegisterBus> {
    bus: &'a B,
    spi_num: u8,
}

impl<'a, B: RegisterBus> DmaController<'a, B> {
    /// Bind to SPI instance `spi_num`. The caller has validated `spi_num`.
    #[inline]
    pub fn new(bus: &'a B, spi_num: u8) -> Self {
        Self { bus, spi_num }
    }

    #[inline(always)]
    fn spi(&self) -> SpiRegs<'a, B> {
        SpiRegs::new(self.bus, self.spi_num)
    }

    /// Pulse OUT_RST, AHBM_RST and AHBM_FIFO_RST.
    pub fn reset(&self) {
        let spi = self.spi();
        spi.modify(SPI_DMA_CONF_OFFSET, |v| v | SPI_DMA_RESET_MASK);
        spi.modify(SPI_DMA_CONF_OFFSET, |v| v & !SPI_DMA_RESET_MASK);
    }

    /// Release both stop requests left by a previous `stop`.
    pub fn clear_stop(&self) {
        let spi = self.spi();
        spi.clear_tx_stop();
        spi.clear_rx_stop();
    }

    /// Route DMA channel `select` (1 or 2) to this instance.
    pub fn select_channel(&self, select: u32) {
        let dport = DportRegs::new(self.bus);
        dport.enable_spi_dma_clock();
        dport.select_spi_dma_channel(self.spi_num, select);
    }

    /// Work around the ESP32 in-link start erratum.
    ///
    /// The in-link does not fetch its first descriptor reliably unless the
    /// shared SPI DMA block is pulsed through DPORT reset immediately
    /// before `INLINK_START`.
    pub fn apply_dma_in_start_erratum(&self) {
        let dport = DportRegs::new(self.bus);
        dport.assert_spi_dma_reset();
        dport.release_spi_dma_reset();
    }

    /// Point the link of `dir` at descriptor `addr` without starting it.
    pub fn set_link_addr(&self, dir: DmaDirection, addr: u32) {
        self.write_link(dir, |v| (v & !SPI_LINK_ADDR_MASK) | (addr & SPI_LINK_ADDR_MASK));
    }

    /// Start the link of `dir` at descriptor `addr`.
    pub fn start_link(&self, dir: DmaDirection, addr: u32) {
        self.write_link(dir, |v| {
            (v & !(SPI_LINK_ADDR_MASK | SPI_LINK_STOP))
                | (addr & SPI_LINK_ADDR_MASK)
                | SPI_LINK_START
        });
    }

    /// Stop the link of `dir`.
    pub fn stop_link(&self, dir: DmaDirection) {
        self.write_link(dir, |v| (v & !SPI_LINK_START) | SPI_LINK_STOP);
    }

    fn write_link<F: FnOnce(u32) -> u32>(&self, dir: DmaDirection, f: F) {
        let spi = self.spi();
        match dir {
            DmaDirection::Out => spi.set_out_link(f(spi.out_link())),
            DmaDirection::In => spi.set_in_link(f(spi.in_link())),
        }
    }

    /// Wait until TX DMA has pushed the first data into the SPI FIFO.
    ///
    /// Polls every `poll_us` for at most `timeout_us`.
    ///
    /// # Errors
    /// - `Timeout` - the TX DMA still reports busy after `timeout_us`
    pub fn wait_tx_fifo_filled<D: DelayNs>(
        &self,
        delay: &mut D,
        timeout_us: u32,
        poll_us: u32,
    ) -> IoResult<()> {
        let spi = self.spi();
        let poll_us = poll_us.max(1);
        let max_iterations = timeout_us / poll_us;
        for _ in 0..max_iterations {
            if !spi.is_tx_dma_busy() {
                return Ok(());
            }
            delay.delay_us(poll_us);
        }
        if !spi.is_tx_dma_busy() {
            return Ok(());
        }

        #[cfg(feature = "defmt")]
        defmt::warn!("SPI{} TX FIFO fill timed out", self.spi_num);
        #[cfg(feature = "log")]
        warn!("SPI{} TX FIFO fill timed out after {} us", self.spi_num, timeout_us);

        Err(IoError::Timeout)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
