//! SPI Controller Register Definitions
//!
//! Per-instance SPI registers on ESP32, including the embedded DMA engine
//! (`SPI_DMA_*`) that walks the link-list descriptors.
//!
//! # Instance Base Addresses
//!
//! | Instance | Base |
//! |----------|------|
//! | SPI0 | 0x3FF4_3000 |
//! | SPI1 | 0x3FF4_2000 |
//! | SPI2 (HSPI) | 0x3FF6_4000 |
//! | SPI3 (VSPI) | 0x3FF6_5000 |

use super::{reg_bit_check, reg_bit_ops, reg_ro, reg_rw, reg_wo};
use crate::hal::bus::RegisterBus;

// =============================================================================
// Base Addresses
// =============================================================================

/// SPI1 register block base address
pub const SPI1_BASE: usize = 0x3FF4_2000;

/// SPI0 register block base address
pub const SPI0_BASE: usize = 0x3FF4_3000;

/// SPI2 register block base address
pub const SPI2_BASE: usize = 0x3FF6_4000;

/// SPI3 register block base address
pub const SPI3_BASE: usize = 0x3FF6_5000;

/// Register block base address for an SPI instance.
///
/// Out-of-range instance numbers map to SPI3's neighbour layout and must be
/// rejected by the caller before any access.
#[inline(always)]
pub const fn spi_base(spi_num: u8) -> usize {
    match spi_num {
        0 => SPI0_BASE,
        1 => SPI1_BASE,
        2 => SPI2_BASE,
        _ => SPI3_BASE,
    }
}

// =============================================================================
// Register Offsets
// =============================================================================

/// Command register offset
pub const SPI_CMD_OFFSET: usize = 0x00;
/// Control register offset
pub const SPI_CTRL_OFFSET: usize = 0x08;
/// Clock divider register offset
pub const SPI_CLOCK_OFFSET: usize = 0x18;
/// User-defined transfer control register offset
pub const SPI_USER_OFFSET: usize = 0x1C;
/// MOSI bit length register offset
pub const SPI_MOSI_DLEN_OFFSET: usize = 0x28;
/// MISO bit length register offset
pub const SPI_MISO_DLEN_OFFSET: usize = 0x2C;
/// Pin / polarity register offset
pub const SPI_PIN_OFFSET: usize = 0x34;
/// Slave mode and slave interrupt register offset
pub const SPI_SLAVE_OFFSET: usize = 0x38;
/// Slave write-buffer bit length register offset
pub const SPI_SLV_WRBUF_DLEN_OFFSET: usize = 0x48;
/// Slave read-buffer bit length register offset
pub const SPI_SLV_RDBUF_DLEN_OFFSET: usize = 0x4C;
/// DMA configuration register offset
pub const SPI_DMA_CONF_OFFSET: usize = 0x100;
/// DMA out-link (TX) register offset
pub const SPI_DMA_OUT_LINK_OFFSET: usize = 0x104;
/// DMA in-link (RX) register offset
pub const SPI_DMA_IN_LINK_OFFSET: usize = 0x108;
/// DMA status register offset
pub const SPI_DMA_STATUS_OFFSET: usize = 0x10C;
/// DMA interrupt enable register offset
pub const SPI_DMA_INT_ENA_OFFSET: usize = 0x110;
/// DMA raw interrupt register offset
pub const SPI_DMA_INT_RAW_OFFSET: usize = 0x114;
/// DMA masked interrupt status register offset
pub const SPI_DMA_INT_ST_OFFSET: usize = 0x118;
/// DMA interrupt clear register offset (write 1 to clear)
pub const SPI_DMA_INT_CLR_OFFSET: usize = 0x11C;
/// Address of the last RX descriptor that ended with a successful EOF
pub const SPI_IN_SUC_EOF_DES_ADDR_OFFSET: usize = 0x124;
/// Address of the last TX descriptor that carried EOF
pub const SPI_OUT_EOF_DES_ADDR_OFFSET: usize = 0x138;

// =============================================================================
// Command Register (SPI_CMD) Bits
// =============================================================================

/// Start a user-defined transfer (write-to-set, cleared by hardware)
pub const SPI_USR: u32 = 1 << 18;

// =============================================================================
// Control Register (SPI_CTRL) Bits
// =============================================================================

/// Transmit LSB first
pub const SPI_WR_BIT_ORDER: u32 = 1 << 26;
/// Receive LSB first
pub const SPI_RD_BIT_ORDER: u32 = 1 << 25;

// =============================================================================
// Clock Register (SPI_CLOCK) Fields
// =============================================================================

/// SPI clock equals APB clock (divider bypass)
pub const SPI_CLK_EQU_SYSCLK: u32 = 1 << 31;
/// Pre-divider field shift (13 bits)
pub const SPI_CLKDIV_PRE_SHIFT: u32 = 18;
/// Pre-divider field mask
pub const SPI_CLKDIV_PRE_MASK: u32 = 0x1FFF;
/// Divider N field shift (6 bits)
pub const SPI_CLKCNT_N_SHIFT: u32 = 12;
/// Clock high time field shift (6 bits)
pub const SPI_CLKCNT_H_SHIFT: u32 = 6;
/// Clock low time field shift (6 bits)
pub const SPI_CLKCNT_L_SHIFT: u32 = 0;
/// Mask of each 6-bit clock count field
pub const SPI_CLKCNT_MASK: u32 = 0x3F;

// =============================================================================
// User Register (SPI_USER) Bits
// =============================================================================

/// Enable the MISO (read-data) phase
pub const SPI_USR_MISO: u32 = 1 << 28;
/// Enable the MOSI (write-data) phase
pub const SPI_USR_MOSI: u32 = 1 << 27;
/// Shift data out on the opposite clock edge
pub const SPI_CK_OUT_EDGE: u32 = 1 << 7;
/// Full-duplex: receive while transmitting
pub const SPI_DOUTDIN: u32 = 1 << 0;

// =============================================================================
// Pin Register (SPI_PIN) Bits
// =============================================================================

/// Clock idles high (CPOL = 1)
pub const SPI_CK_IDLE_EDGE: u32 = 1 << 29;

// =============================================================================
// Slave Register (SPI_SLAVE) Bits
// =============================================================================

/// Operate as SPI slave
pub const SPI_SLAVE_MODE: u32 = 1 << 30;
/// Interrupt enable field shift (5 bits, one per status bit below)
pub const SPI_INT_EN_SHIFT: u32 = 5;
/// Interrupt enable field mask (unshifted)
pub const SPI_INT_EN_MASK: u32 = 0x1F;
/// Transfer done (raw status)
pub const SPI_TRANS_DONE: u32 = 1 << 4;
/// Slave write-status done (raw status)
pub const SPI_SLV_WR_STA_DONE: u32 = 1 << 3;
/// Slave read-status done (raw status)
pub const SPI_SLV_RD_STA_DONE: u32 = 1 << 2;
/// Slave write-buffer done (raw status)
pub const SPI_SLV_WR_BUF_DONE: u32 = 1 << 1;
/// Slave read-buffer done (raw status)
pub const SPI_SLV_RD_BUF_DONE: u32 = 1 << 0;
/// All raw slave status bits
pub const SPI_SLAVE_STATUS_MASK: u32 = 0x1F;

// =============================================================================
// Bit Length Registers (MOSI/MISO/SLV_*BUF_DLEN)
// =============================================================================

/// Bit length field mask (value is length in bits minus one)
pub const SPI_BITLEN_MASK: u32 = 0x00FF_FFFF;

// =============================================================================
// DMA Configuration Register (SPI_DMA_CONF) Bits
// =============================================================================

/// Continuous DMA: keep walking descriptors without a new USR command
pub const SPI_DMA_CONTINUE: u32 = 1 << 16;
/// Stop TX DMA
pub const SPI_DMA_TX_STOP: u32 = 1 << 15;
/// Stop RX DMA
pub const SPI_DMA_RX_STOP: u32 = 1 << 14;
/// Reset AHB master
pub const SPI_AHBM_RST: u32 = 1 << 5;
/// Reset AHB master FIFO
pub const SPI_AHBM_FIFO_RST: u32 = 1 << 4;
/// Reset out-link state machine
pub const SPI_OUT_RST: u32 = 1 << 3;

/// Bits pulsed to reset the DMA sub-block before every transfer
pub const SPI_DMA_RESET_MASK: u32 = SPI_OUT_RST | SPI_AHBM_RST | SPI_AHBM_FIFO_RST;

// =============================================================================
// DMA Link Registers (SPI_DMA_OUT_LINK / SPI_DMA_IN_LINK) Bits
// =============================================================================

/// Start walking the link list
pub const SPI_LINK_START: u32 = 1 << 29;
/// Stop walking the link list
pub const SPI_LINK_STOP: u32 = 1 << 28;
/// Low 20 bits of the first descriptor address
pub const SPI_LINK_ADDR_MASK: u32 = 0x000F_FFFF;

// =============================================================================
// DMA Status Register (SPI_DMA_STATUS) Bits
// =============================================================================

/// TX DMA is still moving data into the FIFO
pub const SPI_DMA_TX_EN: u32 = 1 << 1;

// =============================================================================
// DMA Interrupt Bits (SPI_DMA_INT_ENA/RAW/ST/CLR)
// =============================================================================

/// TX descriptor carrying EOF consumed
pub const SPI_OUT_EOF_INT: u32 = 1 << 7;
/// RX completed with a successful EOF
pub const SPI_IN_SUC_EOF_INT: u32 = 1 << 5;
/// All DMA interrupt bits
pub const SPI_DMA_INT_ALL: u32 = 0x1FF;

// =============================================================================
// Register Block
// =============================================================================

/// SPI register block for one peripheral instance.
pub struct SpiRegs<'a, B: RegisterBus> {
    bus: &'a B,
    base: usize,
}

impl<'a, B: RegisterBus> SpiRegs<'a, B> {
    /// Bind the register block of `spi_num` on `bus`.
    #[inline(always)]
    pub fn new(bus: &'a B, spi_num: u8) -> Self {
        Self {
            bus,
            base: spi_base(spi_num),
        }
    }

    // Command
    reg_wo!(write_cmd, SPI_CMD_OFFSET, "command register");

    /// Kick a user-defined transfer.
    ///
    /// `SPI_USR` is write-to-set and self-clearing, so it is written on its
    /// own rather than merged into the current register value.
    #[inline(always)]
    pub fn start_user(&self) {
        self.write_cmd(SPI_USR);
    }

    // Control / clock / user / pin
    reg_bit_ops!(set_lsb_first_tx, set_msb_first_tx, SPI_CTRL_OFFSET, SPI_WR_BIT_ORDER,
                 "LSB-first transmit", "Select", "Deselect");
    reg_bit_ops!(set_lsb_first_rx, set_msb_first_rx, SPI_CTRL_OFFSET, SPI_RD_BIT_ORDER,
                 "LSB-first receive", "Select", "Deselect");
    reg_wo!(set_clock, SPI_CLOCK_OFFSET, "clock divider register");
    reg_rw!(user, set_user, SPI_USER_OFFSET, "user transfer control register");
    reg_bit_ops!(enable_full_duplex, disable_full_duplex, SPI_USER_OFFSET, SPI_DOUTDIN,
                 "full-duplex transfers", "Enable", "Disable");
    reg_bit_ops!(set_out_edge, clear_out_edge, SPI_USER_OFFSET, SPI_CK_OUT_EDGE,
                 "opposite-edge data output", "Select", "Deselect");
    reg_bit_ops!(set_idle_high, set_idle_low, SPI_PIN_OFFSET, SPI_CK_IDLE_EDGE,
                 "clock idle-high polarity", "Select", "Deselect");

    // Bit lengths
    reg_wo!(set_mosi_dlen, SPI_MOSI_DLEN_OFFSET, "MOSI bit length register");
    reg_wo!(set_miso_dlen, SPI_MISO_DLEN_OFFSET, "MISO bit length register");
    reg_wo!(set_slv_wrbuf_dlen, SPI_SLV_WRBUF_DLEN_OFFSET,
            "slave write-buffer bit length register");
    reg_wo!(set_slv_rdbuf_dlen, SPI_SLV_RDBUF_DLEN_OFFSET,
            "slave read-buffer bit length register");

    // Slave register
    reg_ro!(slave, SPI_SLAVE_OFFSET, "slave control and status register");
    reg_bit_ops!(enable_slave_mode, disable_slave_mode, SPI_SLAVE_OFFSET, SPI_SLAVE_MODE,
                 "slave mode", "Enable", "Disable");

    // DMA configuration
    reg_bit_ops!(set_continuous, clear_continuous, SPI_DMA_CONF_OFFSET, SPI_DMA_CONTINUE,
                 "continuous DMA", "Enable", "Disable");
    reg_bit_ops!(set_tx_stop, clear_tx_stop, SPI_DMA_CONF_OFFSET, SPI_DMA_TX_STOP,
                 "TX DMA stop request", "Assert", "Release");
    reg_bit_ops!(set_rx_stop, clear_rx_stop, SPI_DMA_CONF_OFFSET, SPI_DMA_RX_STOP,
                 "RX DMA stop request", "Assert", "Release");

    // DMA links
    reg_rw!(out_link, set_out_link, SPI_DMA_OUT_LINK_OFFSET, "DMA out-link register");
    reg_rw!(in_link, set_in_link, SPI_DMA_IN_LINK_OFFSET, "DMA in-link register");
    reg_bit_check!(is_tx_dma_busy, SPI_DMA_STATUS_OFFSET, SPI_DMA_TX_EN,
                   "Check whether TX DMA is still filling the FIFO");

    // DMA interrupts
    reg_rw!(dma_int_ena, set_dma_int_ena, SPI_DMA_INT_ENA_OFFSET,
            "DMA interrupt enable register");
    reg_ro!(dma_int_st, SPI_DMA_INT_ST_OFFSET, "DMA masked interrupt status register");
    reg_wo!(clear_dma_int, SPI_DMA_INT_CLR_OFFSET, "DMA interrupt clear register (W1C)");

    // Completed-descriptor addresses
    reg_ro!(in_suc_eof_des_addr, SPI_IN_SUC_EOF_DES_ADDR_OFFSET,
            "last RX descriptor address with successful EOF");
    reg_ro!(out_eof_des_addr, SPI_OUT_EOF_DES_ADDR_OFFSET,
            "last TX descriptor address with EOF");

    /// Read-modify-write helper on an arbitrary offset of this block.
    #[inline(always)]
    pub fn modify<F>(&self, offset: usize, f: F)
    where
        F: FnOnce(u32) -> u32,
    {
        self.bus.modify(self.base + offset, f);
    }
}

/// Encode a byte count as a bit-length register value (`bits - 1`).
///
/// A zero-length transfer is encoded as zero.
#[inline(always)]
pub const fn bitlen(len: usize) -> u32 {
    if len == 0 {
        0
    } else {
        ((len as u32).wrapping_mul(8).wrapping_sub(1)) & SPI_BITLEN_MASK
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
