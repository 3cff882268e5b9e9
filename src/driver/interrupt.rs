//! Interrupt sources and status for the SPI DMA engine.
//!
//! Interrupts of one SPI instance come from two registers: the slave
//! status bits in `SPI_SLAVE_REG` and the DMA interrupt block
//! (`SPI_DMA_INT_*`). [`SpiIntSource`] packs both into one mask: slave
//! bits keep their register positions (0..4), DMA bits are shifted up by 16.
//!
//! The free functions in this module are the raw bridge, keyed by SPI
//! instance number. [`SpiDmaChannel`](super::channel::SpiDmaChannel) wraps
//! them for its own instance.

use super::config::{DmaDirection, SpiMode, check_spi_num};
use super::error::ConfigResult;
use crate::hal::RegisterBus;
use crate::internal::register::spi::{
    SPI_DMA_INT_ALL, SPI_IN_SUC_EOF_INT, SPI_INT_EN_MASK, SPI_INT_EN_SHIFT, SPI_OUT_EOF_INT,
    SPI_SLAVE_OFFSET, SPI_SLAVE_STATUS_MASK, SPI_SLV_RD_BUF_DONE, SPI_SLV_RD_STA_DONE,
    SPI_SLV_WR_BUF_DONE, SPI_SLV_WR_STA_DONE, SPI_TRANS_DONE, SpiRegs,
};

/// Shift applied to DMA interrupt bits inside [`SpiIntSource`]
const DMA_SRC_SHIFT: u32 = 16;

// =============================================================================
// Interrupt Sources
// =============================================================================

/// Bitmask of SPI DMA interrupt sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpiIntSource(u32);

impl SpiIntSource {
    /// No source
    pub const NONE: Self = Self(0);
    /// Transfer finished
    pub const TRANS_DONE: Self = Self(SPI_TRANS_DONE);
    /// Slave write-status command finished
    pub const WR_STA_DONE: Self = Self(SPI_SLV_WR_STA_DONE);
    /// Slave read-status command finished
    pub const RD_STA_DONE: Self = Self(SPI_SLV_RD_STA_DONE);
    /// Slave write-buffer command finished (master wrote to us)
    pub const WR_BUF_DONE: Self = Self(SPI_SLV_WR_BUF_DONE);
    /// Slave read-buffer command finished (master read from us)
    pub const RD_BUF_DONE: Self = Self(SPI_SLV_RD_BUF_DONE);
    /// One buffer sent (out-link reached an EOF descriptor)
    pub const ONE_BUF_SEND_DONE: Self = Self(SPI_OUT_EOF_INT << DMA_SRC_SHIFT);
    /// One buffer received (in-link closed a descriptor with EOF)
    pub const ONE_BUF_RECV_DONE: Self = Self(SPI_IN_SUC_EOF_INT << DMA_SRC_SHIFT);
    /// Every source this driver knows about
    pub const ALL: Self = Self(SPI_SLAVE_STATUS_MASK | (SPI_DMA_INT_ALL << DMA_SRC_SHIFT));

    /// Build from a raw mask, dropping unknown bits
    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits & Self::ALL.0)
    }

    /// Raw mask
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Check whether every bit of `other` is set
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Check whether any bit of `other` is set
    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Check for an empty mask
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Union of two masks
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Part of the mask living in `SPI_SLAVE_REG` (status bit positions)
    #[inline]
    pub const fn slave_bits(self) -> u32 {
        self.0 & SPI_SLAVE_STATUS_MASK
    }

    /// Part of the mask living in the DMA interrupt block
    #[inline]
    pub const fn dma_bits(self) -> u32 {
        (self.0 >> DMA_SRC_SHIFT) & SPI_DMA_INT_ALL
    }

    /// Sources that signal a finished buffer for a mode/direction pair.
    ///
    /// These are the sources `init` enables.
    pub const fn completion_sources(mode: SpiMode, dir: DmaDirection) -> Self {
        match (mode, dir) {
            (SpiMode::Master, DmaDirection::Out) => {
                Self::TRANS_DONE.union(Self::ONE_BUF_SEND_DONE)
            }
            (SpiMode::Master, DmaDirection::In) => {
                Self::TRANS_DONE.union(Self::ONE_BUF_RECV_DONE)
            }
            (SpiMode::Slave, DmaDirection::Out) => {
                Self::RD_BUF_DONE.union(Self::ONE_BUF_SEND_DONE)
            }
            (SpiMode::Slave, DmaDirection::In) => {
                Self::WR_BUF_DONE.union(Self::ONE_BUF_RECV_DONE)
            }
        }
    }
}

impl core::ops::BitOr for SpiIntSource {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl core::ops::BitOrAssign for SpiIntSource {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

// =============================================================================
// Interrupt Status
// =============================================================================

/// Interrupt status flags decoded from [`int_status_get`].
///
/// # Example
///
/// ```ignore
/// let status = channel.handle_interrupt();
/// if status.buffer_done() {
///     if let Some(id) = channel.status_get() {
///         // `id` is back in software hands
///     }
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InterruptStatus {
    /// Transfer finished
    pub trans_done: bool,
    /// Slave write-status finished
    pub wr_sta_done: bool,
    /// Slave read-status finished
    pub rd_sta_done: bool,
    /// Slave write-buffer finished
    pub wr_buf_done: bool,
    /// Slave read-buffer finished
    pub rd_buf_done: bool,
    /// One buffer sent by the out-link
    pub buf_send_done: bool,
    /// One buffer received by the in-link
    pub buf_recv_done: bool,
}

impl InterruptStatus {
    /// Decode a combined source mask
    #[inline]
    pub fn from_raw(raw: u32) -> Self {
        let src = SpiIntSource::from_bits(raw);
        Self {
            trans_done: src.contains(SpiIntSource::TRANS_DONE),
            wr_sta_done: src.contains(SpiIntSource::WR_STA_DONE),
            rd_sta_done: src.contains(SpiIntSource::RD_STA_DONE),
            wr_buf_done: src.contains(SpiIntSource::WR_BUF_DONE),
            rd_buf_done: src.contains(SpiIntSource::RD_BUF_DONE),
            buf_send_done: src.contains(SpiIntSource::ONE_BUF_SEND_DONE),
            buf_recv_done: src.contains(SpiIntSource::ONE_BUF_RECV_DONE),
        }
    }

    /// Encode back into a source mask (for clearing)
    #[inline]
    pub fn to_raw(&self) -> u32 {
        let mut src = SpiIntSource::NONE;
        if self.trans_done {
            src |= SpiIntSource::TRANS_DONE;
        }
        if self.wr_sta_done {
            src |= SpiIntSource::WR_STA_DONE;
        }
        if self.rd_sta_done {
            src |= SpiIntSource::RD_STA_DONE;
        }
        if self.wr_buf_done {
            src |= SpiIntSource::WR_BUF_DONE;
        }
        if self.rd_buf_done {
            src |= SpiIntSource::RD_BUF_DONE;
        }
        if self.buf_send_done {
            src |= SpiIntSource::ONE_BUF_SEND_DONE;
        }
        if self.buf_recv_done {
            src |= SpiIntSource::ONE_BUF_RECV_DONE;
        }
        src.bits()
    }

    /// Check if any source fired
    #[inline]
    pub fn any(&self) -> bool {
        self.to_raw() != 0
    }

    /// Check if a ping/pong buffer changed hands
    #[inline]
    pub fn buffer_done(&self) -> bool {
        self.buf_send_done || self.buf_recv_done
    }
}

// =============================================================================
// Interrupt Bridge
// =============================================================================

/// Enable interrupt sources of SPI instance `spi_num`.
///
/// # Errors
/// - `InvalidSpiNum` - `spi_num` outside 1..=3 (nothing is written)
pub fn int_enable<B: RegisterBus>(bus: &B, spi_num: u8, src: SpiIntSource) -> ConfigResult<()> {
    let regs = SpiRegs::new(bus, check_spi_num(spi_num)?);
    let slave = src.slave_bits() & SPI_INT_EN_MASK;
    if slave != 0 {
        regs.modify(SPI_SLAVE_OFFSET, |v| v | (slave << SPI_INT_EN_SHIFT));
    }
    let dma = src.dma_bits();
    if dma != 0 {
        regs.set_dma_int_ena(regs.dma_int_ena() | dma);
    }
    Ok(())
}

/// Disable interrupt sources of SPI instance `spi_num`.
///
/// # Errors
/// - `InvalidSpiNum` - `spi_num` outside 1..=3 (nothing is written)
pub fn int_disable<B: RegisterBus>(bus: &B, spi_num: u8, src: SpiIntSource) -> ConfigResult<()> {
    let regs = SpiRegs::new(bus, check_spi_num(spi_num)?);
    let slave = src.slave_bits() & SPI_INT_EN_MASK;
    if slave != 0 {
        regs.modify(SPI_SLAVE_OFFSET, |v| v & !(slave << SPI_INT_EN_SHIFT));
    }
    let dma = src.dma_bits();
    if dma != 0 {
        regs.set_dma_int_ena(regs.dma_int_ena() & !dma);
    }
    Ok(())
}

/// Clear pending interrupt sources of SPI instance `spi_num`.
///
/// Slave status bits are plain read/write and are cleared in place; DMA
/// bits go through the write-1-to-clear register.
///
/// # Errors
/// - `InvalidSpiNum` - `spi_num` outside 1..=3 (nothing is written)
pub fn int_clear<B: RegisterBus>(bus: &B, spi_num: u8, src: SpiIntSource) -> ConfigResult<()> {
    let regs = SpiRegs::new(bus, check_spi_num(spi_num)?);
    let slave = src.slave_bits();
    if slave != 0 {
        regs.modify(SPI_SLAVE_OFFSET, |v| v & !slave);
    }
    let dma = src.dma_bits();
    if dma != 0 {
        regs.clear_dma_int(dma);
    }
    Ok(())
}

/// Pending interrupt sources of SPI instance `spi_num`.
///
/// Slave bits are reported raw, DMA bits as masked by the enable register.
///
/// # Errors
/// - `InvalidSpiNum` - `spi_num` outside 1..=3
pub fn int_status_get<B: RegisterBus>(bus: &B, spi_num: u8) -> ConfigResult<SpiIntSource> {
    let regs = SpiRegs::new(bus, check_spi_num(spi_num)?);
    let slave = regs.slave() & SPI_SLAVE_STATUS_MASK;
    let dma = regs.dma_int_st() & SPI_DMA_INT_ALL;
    Ok(SpiIntSource::from_bits(slave | (dma << DMA_SRC_SHIFT)))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::error::ConfigError;
    use crate::internal::register::spi::{
        SPI_DMA_INT_CLR_OFFSET, SPI_DMA_INT_ENA_OFFSET, SPI_DMA_INT_ST_OFFSET, spi_base,
    };
    use crate::testing::MockRegisterBus;

    #[test]
    fn dma_sources_live_above_slave_bits() {
        assert_eq!(SpiIntSource::ONE_BUF_SEND_DONE.bits(), 1 << 23);
        assert_eq!(SpiIntSource::ONE_BUF_RECV_DONE.bits(), 1 << 21);
        assert_eq!(SpiIntSource::ONE_BUF_SEND_DONE.slave_bits(), 0);
        assert_eq!(SpiIntSource::TRANS_DONE.dma_bits(), 0);
    }

    #[test]
    fn bitor_and_contains() {
        let src = SpiIntSource::TRANS_DONE | SpiIntSource::ONE_BUF_RECV_DONE;
        assert!(src.contains(SpiIntSource::TRANS_DONE));
        assert!(src.intersects(SpiIntSource::ONE_BUF_RECV_DONE));
        assert!(!src.contains(SpiIntSource::ONE_BUF_SEND_DONE));
        assert!(SpiIntSource::NONE.is_empty());
    }

    #[test]
    fn completion_sources_per_mode_and_direction() {
        let mo = SpiIntSource::completion_sources(SpiMode::Master, DmaDirection::Out);
        assert!(mo.contains(SpiIntSource::TRANS_DONE | SpiIntSource::ONE_BUF_SEND_DONE));

        let si = SpiIntSource::completion_sources(SpiMode::Slave, DmaDirection::In);
        assert!(si.contains(SpiIntSource::WR_BUF_DONE | SpiIntSource::ONE_BUF_RECV_DONE));
        assert!(!si.intersects(SpiIntSource::TRANS_DONE));
    }

    #[test]
    fn status_from_raw_and_back() {
        let raw = (SpiIntSource::RD_BUF_DONE | SpiIntSource::ONE_BUF_SEND_DONE).bits();
        let status = InterruptStatus::from_raw(raw);
        assert!(status.rd_buf_done);
        assert!(status.buf_send_done);
        assert!(!status.trans_done);
        assert!(status.buffer_done());
        assert_eq!(status.to_raw(), raw);

        assert!(!InterruptStatus::from_raw(0).any());
    }

    #[test]
    fn enable_splits_between_slave_and_dma_registers() {
        let bus = MockRegisterBus::new();
        let base = spi_base(2);
        int_enable(&bus, 2, SpiIntSource::TRANS_DONE | SpiIntSource::ONE_BUF_RECV_DONE).unwrap();

        assert_eq!(bus.get(base + SPI_SLAVE_OFFSET), SPI_TRANS_DONE << SPI_INT_EN_SHIFT);
        assert_eq!(bus.get(base + SPI_DMA_INT_ENA_OFFSET), SPI_IN_SUC_EOF_INT);

        int_disable(&bus, 2, SpiIntSource::TRANS_DONE).unwrap();
        assert_eq!(bus.get(base + SPI_SLAVE_OFFSET), 0);
        assert_eq!(bus.get(base + SPI_DMA_INT_ENA_OFFSET), SPI_IN_SUC_EOF_INT);
    }

    #[test]
    fn clear_writes_w1c_register_directly() {
        let bus = MockRegisterBus::new();
        let base = spi_base(3);
        bus.set(base + SPI_DMA_INT_ST_OFFSET, SPI_OUT_EOF_INT);
        bus.set(base + SPI_SLAVE_OFFSET, SPI_TRANS_DONE);

        let pending = int_status_get(&bus, 3).unwrap();
        assert!(pending.contains(SpiIntSource::TRANS_DONE | SpiIntSource::ONE_BUF_SEND_DONE));

        bus.clear_writes();
        int_clear(&bus, 3, pending).unwrap();
        assert!(bus.writes().contains(&(base + SPI_DMA_INT_CLR_OFFSET, SPI_OUT_EOF_INT)));
        assert!(int_status_get(&bus, 3).unwrap().is_empty());
    }

    #[test]
    fn invalid_instance_touches_nothing() {
        let bus = MockRegisterBus::new();
        for spi_num in [0u8, 4] {
            assert_eq!(
                int_enable(&bus, spi_num, SpiIntSource::ALL),
                Err(ConfigError::InvalidSpiNum)
            );
            assert_eq!(
                int_disable(&bus, spi_num, SpiIntSource::ALL),
                Err(ConfigError::InvalidSpiNum)
            );
            assert_eq!(
                int_clear(&bus, spi_num, SpiIntSource::ALL),
                Err(ConfigError::InvalidSpiNum)
            );
            assert_eq!(int_status_get(&bus, spi_num), Err(ConfigError::InvalidSpiNum));
        }
        assert!(bus.writes().is_empty());
    }
}
