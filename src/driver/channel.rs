//! SPI DMA channel: one SPI instance driving a ping-pong buffer.
//!
//! This module contains the main [`SpiDmaChannel`] structure and its
//! lifecycle:
//!
//! - Initialization and teardown (`init` / `uninit`)
//! - Transfer control (`start` / `stop` / `reset`)
//! - Buffer hand-off (`status_get`, `release`, `dest_add_set`)
//! - Interrupt source control and servicing
//!
//! State machine: `Uninit -> Ready -> Armed -> (interrupt) -> Ready -> ... -> Uninit`.

use embedded_hal::delay::DelayNs;

use super::config::{BufferId, ChannelState, DmaDirection, SpiAttr, SpiDmaConfig, SpiMode};
use super::error::{ConfigError, DmaError, IoError, Result};
use super::interrupt::{self, InterruptStatus, SpiIntSource};
use crate::hal::dma::DmaController;
use crate::hal::intr::{InterruptController, SpiInterrupt};
use crate::hal::spi::SpiBusController;
use crate::hal::RegisterBus;
use crate::internal::dma::PingPongBuffer;
use crate::internal::register::spi::{SPI_USR_MISO, SPI_USR_MOSI, SpiRegs, bitlen};

#[cfg(feature = "log")]
use log::debug;

// =============================================================================
// SPI DMA Channel
// =============================================================================

/// ESP32 SPI DMA channel
///
/// Binds one SPI instance, one DMA channel, a transfer direction and a
/// role to a statically allocated [`PingPongBuffer`].
///
/// # Type Parameters
/// * `B` - Register bus ([`Mmio`](crate::hal::Mmio) on target)
/// * `I` - Interrupt controller used to attach the DMA interrupt
/// * `BUF_CAP` - Capacity of each of the two buffers in bytes
/// * `DESC_CAP` - Descriptors per buffer (`BUF_CAP / 4092`, rounded up)
///
/// # Placement
///
/// `init` embeds descriptor addresses in the buffer chains. Initialize the
/// channel in its final location and do not move it until `uninit`.
///
/// # Example
/// ```ignore
/// static mut CHANNEL: SpiDmaChannel<Mmio, EspHalInterrupts, 1024, 1> =
///     SpiDmaChannel::new(unsafe { Mmio::new() }, EspHalInterrupts::new(Priority::Priority1));
///
/// let ch = unsafe { &mut *core::ptr::addr_of_mut!(CHANNEL) };
/// ch.init(
///     SpiDmaConfig::new().with_spi_num(2).with_buf_size(1024),
///     InterruptHandler::new(spi_dma_isr, Priority::Priority1),
/// )?;
/// ch.ping_buf_get().unwrap().copy_from_slice(&frame);
/// ch.start(1024, &mut delay)?;
/// ```
pub struct SpiDmaChannel<B, I, const BUF_CAP: usize, const DESC_CAP: usize>
where
    B: RegisterBus,
    I: InterruptController,
{
    /// Register access
    bus: B,
    /// CPU interrupt binding
    intc: I,
    /// Ping/pong storage
    buffers: PingPongBuffer<BUF_CAP, DESC_CAP>,
    /// Configuration captured by `init`
    config: SpiDmaConfig,
    /// Lifecycle state
    state: ChannelState,
    /// Element the next `start` hands to hardware
    active: BufferId,
    /// Ping and pong are linked into a ring (slave free-running mode)
    continuous: bool,
}

impl<B, I, const BUF_CAP: usize, const DESC_CAP: usize> SpiDmaChannel<B, I, BUF_CAP, DESC_CAP>
where
    B: RegisterBus,
    I: InterruptController,
{
    /// Create a channel in the `Uninit` state.
    ///
    /// This is a const function suitable for static initialization.
    pub const fn new(bus: B, intc: I) -> Self {
        Self {
            bus,
            intc,
            buffers: PingPongBuffer::new(),
            config: SpiDmaConfig::new(),
            state: ChannelState::Uninit,
            active: BufferId::Ping,
            continuous: false,
        }
    }

    // =========================================================================
    // State Accessors
    // =========================================================================

    /// Get the current state
    #[inline(always)]
    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// Configuration captured by `init`
    #[inline(always)]
    pub fn config(&self) -> &SpiDmaConfig {
        &self.config
    }

    /// Element the next `start` arms
    #[inline(always)]
    pub fn active(&self) -> BufferId {
        self.active
    }

    /// Whether the ping/pong ring is free-running
    #[inline(always)]
    pub fn is_continuous(&self) -> bool {
        self.continuous
    }

    /// Underlying ping-pong buffer
    #[inline(always)]
    pub fn buffers(&self) -> &PingPongBuffer<BUF_CAP, DESC_CAP> {
        &self.buffers
    }

    /// Register bus
    #[inline(always)]
    pub fn bus(&self) -> &B {
        &self.bus
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.state == ChannelState::Uninit {
            return Err(IoError::InvalidState.into());
        }
        Ok(())
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Initialize the channel.
    ///
    /// Parameters are checked and the buffers built before any register is
    /// written. The sequence then is:
    /// 1. Reset the DMA sub-block
    /// 2. Route the DMA channel to the SPI instance
    /// 3. Program the slave buffer lengths (slave only)
    /// 4. Enable the completion sources, clear pending status
    /// 5. Attach `handler` to the instance's DMA interrupt and enable it
    ///
    /// # Errors
    /// - `AlreadyInitialized` - channel is not `Uninit`
    /// - `InvalidSpiNum` / `InvalidConfig` - bad configuration
    /// - `AllocationFailed` - `buf_size` exceeds `BUF_CAP` / `DESC_CAP`
    /// - `InterruptError` - the interrupt controller refused the line
    pub fn init(&mut self, config: SpiDmaConfig, handler: I::Handler) -> Result<()> {
        if self.state != ChannelState::Uninit {
            return Err(ConfigError::AlreadyInitialized.into());
        }
        config.validate()?;
        let line = SpiInterrupt::from_spi_num(config.spi_num)?;

        self.buffers.create(config.buf_size)?;
        self.config = config;
        self.active = BufferId::Ping;
        self.continuous = false;

        // === STEP 1: Reset the DMA sub-block ===
        let dma = DmaController::new(&self.bus, config.spi_num);
        dma.reset();
        dma.clear_stop();

        // === STEP 2: Route the DMA channel ===
        dma.select_channel(config.channel.select());

        // === STEP 3: Slave buffer lengths ===
        if config.mode == SpiMode::Slave {
            let regs = SpiRegs::new(&self.bus, config.spi_num);
            regs.set_slv_wrbuf_dlen(bitlen(config.buf_size));
            regs.set_slv_rdbuf_dlen(bitlen(config.buf_size));
        }

        // === STEP 4: Interrupt sources ===
        let sources = SpiIntSource::completion_sources(config.mode, config.dir);
        interrupt::int_enable(&self.bus, config.spi_num, sources)?;
        interrupt::int_clear(&self.bus, config.spi_num, SpiIntSource::ALL)?;

        // === STEP 5: Attach the handler ===
        self.intc.attach(line, handler);
        if let Err(e) = self.intc.enable(line) {
            self.buffers.destroy();
            interrupt::int_disable(&self.bus, config.spi_num, sources)?;
            return Err(e.into());
        }

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "SPI{} DMA init: {} {} buf_size={}",
            config.spi_num,
            config.mode,
            config.dir,
            config.buf_size
        );
        #[cfg(feature = "log")]
        debug!(
            "SPI{} DMA init: {:?} {:?} buf_size={}",
            config.spi_num, config.mode, config.dir, config.buf_size
        );

        self.state = ChannelState::Ready;
        Ok(())
    }

    /// Release the buffers and mask the interrupt line.
    ///
    /// Peripheral registers are left alone; stop transfers first.
    ///
    /// # Errors
    /// - `InvalidState` - channel is not initialized
    pub fn uninit(&mut self) -> Result<()> {
        self.ensure_initialized()?;

        if let Ok(line) = SpiInterrupt::from_spi_num(self.config.spi_num) {
            self.intc.disable(line);
        }
        self.buffers.destroy();
        self.continuous = false;
        self.active = BufferId::Ping;
        self.state = ChannelState::Uninit;

        #[cfg(feature = "defmt")]
        defmt::debug!("SPI{} DMA uninit", self.config.spi_num);
        #[cfg(feature = "log")]
        debug!("SPI{} DMA uninit", self.config.spi_num);

        Ok(())
    }

    // =========================================================================
    // Transfer Control
    // =========================================================================

    /// Arm the active buffer and start a transfer of `len` bytes.
    ///
    /// Every start re-runs the DMA reset so a previous cycle leaves nothing
    /// behind. In slave mode `len == 0` selects free-running mode: ping and
    /// pong are linked into a ring and both are armed.
    ///
    /// Only the configured direction's link walks the armed chain. Master
    /// OUT also runs the in-link with no descriptor.
    ///
    /// Master OUT transfers wait (bounded by `fifo_timeout_us`) for the TX
    /// DMA to fill the SPI FIFO before returning. On timeout the channel
    /// stays `Armed`; call [`stop`](Self::stop) to recover.
    ///
    /// # Errors
    /// - `InvalidState` - channel is not initialized
    /// - `InvalidLength` - `len` exceeds the buffer, or is zero in master mode
    /// - `Timeout` - TX FIFO was not filled in time
    pub fn start<D: DelayNs>(&mut self, len: usize, delay: &mut D) -> Result<()> {
        self.ensure_initialized()?;
        let SpiDmaConfig { spi_num, mode, dir, .. } = self.config;
        let dma = DmaController::new(&self.bus, spi_num);
        let regs = SpiRegs::new(&self.bus, spi_num);

        if len > self.buffers.len() || (mode == SpiMode::Master && len == 0) {
            return Err(DmaError::InvalidLength.into());
        }

        // === STEP 1: Reset the DMA sub-block, release stop requests ===
        dma.reset();
        dma.clear_stop();

        // === STEP 2: Mode-specific setup ===
        let continuous = mode == SpiMode::Slave && len == 0;
        match mode {
            SpiMode::Master => {
                regs.clear_continuous();
                regs.set_mosi_dlen(bitlen(len));
                regs.set_miso_dlen(bitlen(len));
                // Only the configured direction's data phase runs
                let user = regs.user() & !(SPI_USR_MOSI | SPI_USR_MISO);
                regs.set_user(match dir {
                    DmaDirection::Out => user | SPI_USR_MOSI,
                    DmaDirection::In => user | SPI_USR_MISO,
                });
            }
            SpiMode::Slave if continuous => regs.set_continuous(),
            SpiMode::Slave => regs.clear_continuous(),
        }

        // === STEP 3: Hand descriptors to hardware ===
        self.buffers.disarm_all();
        if continuous {
            self.buffers.link_ring();
            self.buffers.element(BufferId::Ping).arm();
            self.buffers.element(BufferId::Pong).arm();
        } else {
            self.buffers.unlink_ring();
            self.buffers.element(self.active).arm();
        }
        self.continuous = continuous;
        let head = self.buffers.element(self.active).head().addr();

        // === STEP 4: Enable the links ===
        if dir == DmaDirection::In {
            dma.apply_dma_in_start_erratum();
        }
        if mode == SpiMode::Master && dir == DmaDirection::Out {
            // ESP32 TX needs a running in-link; give it no descriptor
            dma.start_link(DmaDirection::In, 0);
        }
        dma.start_link(dir, head);

        // === STEP 5: Kick the transfer ===
        regs.start_user();
        self.state = ChannelState::Armed;

        #[cfg(feature = "defmt")]
        defmt::debug!("SPI{} DMA start len={} buf={}", spi_num, len, self.active);
        #[cfg(feature = "log")]
        debug!("SPI{} DMA start len={} buf={:?}", spi_num, len, self.active);

        // === STEP 6: Master TX waits for the FIFO ===
        if mode == SpiMode::Master && dir == DmaDirection::Out {
            dma.wait_tx_fifo_filled(
                delay,
                self.config.fifo_timeout_us,
                self.config.poll_interval_us,
            )?;
        }
        Ok(())
    }

    /// Stop the transfer.
    ///
    /// Sets TX_STOP (master) or RX_STOP (slave) and stops the link of the
    /// configured direction. Descriptor ownership is left as is; the next
    /// `start` re-arms from scratch.
    ///
    /// # Errors
    /// - `InvalidState` - channel is not initialized
    pub fn stop(&mut self) -> Result<()> {
        self.ensure_initialized()?;

        let regs = SpiRegs::new(&self.bus, self.config.spi_num);
        match self.config.mode {
            SpiMode::Master => regs.set_tx_stop(),
            SpiMode::Slave => regs.set_rx_stop(),
        }
        DmaController::new(&self.bus, self.config.spi_num).stop_link(self.config.dir);

        if self.continuous {
            self.buffers.unlink_ring();
            self.continuous = false;
        }
        self.state = ChannelState::Ready;

        #[cfg(feature = "defmt")]
        defmt::debug!("SPI{} DMA stop", self.config.spi_num);
        #[cfg(feature = "log")]
        debug!("SPI{} DMA stop", self.config.spi_num);

        Ok(())
    }

    /// Reset the DMA sub-block and restore both buffers to full length.
    ///
    /// Leaves the channel `Ready` with null-terminated, software-owned chains.
    ///
    /// # Errors
    /// - `InvalidState` - channel is not initialized
    pub fn reset(&mut self) -> Result<()> {
        self.ensure_initialized()?;

        DmaController::new(&self.bus, self.config.spi_num).reset();
        self.buffers.disarm_all();
        self.buffers.unlink_ring();
        self.buffers.len_reset()?;
        self.continuous = false;
        self.state = ChannelState::Ready;

        #[cfg(feature = "defmt")]
        defmt::debug!("SPI{} DMA reset", self.config.spi_num);
        #[cfg(feature = "log")]
        debug!("SPI{} DMA reset", self.config.spi_num);

        Ok(())
    }

    /// Select the element the next `start` arms and point the link at it.
    ///
    /// # Errors
    /// - `InvalidState` - channel is not initialized
    /// - `DescriptorBusy` - a transfer is armed
    pub fn dest_add_set(&mut self, id: BufferId) -> Result<()> {
        self.ensure_initialized()?;
        if self.state == ChannelState::Armed {
            return Err(DmaError::DescriptorBusy.into());
        }

        self.active = id;
        let head = self.buffers.element(id).head().addr();
        DmaController::new(&self.bus, self.config.spi_num).set_link_addr(self.config.dir, head);
        Ok(())
    }

    // =========================================================================
    // Buffer Hand-off
    // =========================================================================

    /// Buffer the hardware finished last, if any.
    ///
    /// Compares the direction's "last EOF descriptor" register with the
    /// tails of ping and pong. `None` while the transfer is in flight.
    pub fn status_get(&self) -> Option<BufferId> {
        if self.state == ChannelState::Uninit {
            return None;
        }
        let regs = SpiRegs::new(&self.bus, self.config.spi_num);
        let addr = match self.config.dir {
            DmaDirection::Out => regs.out_eof_des_addr(),
            DmaDirection::In => regs.in_suc_eof_des_addr(),
        };
        self.buffers.find_by_tail(addr)
    }

    /// Ping buffer, `None` before `init`
    pub fn ping_buf_get(&mut self) -> Option<&mut [u8]> {
        self.buf_get(BufferId::Ping)
    }

    /// Pong buffer, `None` before `init`
    pub fn pong_buf_get(&mut self) -> Option<&mut [u8]> {
        self.buf_get(BufferId::Pong)
    }

    /// Buffer by id, `None` before `init`
    pub fn buf_get(&mut self, id: BufferId) -> Option<&mut [u8]> {
        if self.state == ChannelState::Uninit {
            return None;
        }
        Some(self.buffers.element_mut(id).buf_mut())
    }

    /// Give a consumed buffer back to hardware.
    ///
    /// # Errors
    /// - `InvalidState` - channel is not initialized
    pub fn release(&mut self, id: BufferId) -> Result<()> {
        self.ensure_initialized()?;
        self.buffers.element(id).arm();
        Ok(())
    }

    /// Describe exactly `len` bytes with buffer `id`.
    ///
    /// # Errors
    /// - `InvalidState` - channel is not initialized
    /// - `DescriptorBusy` - a descriptor of `id` is owned by hardware
    /// - `InvalidLength` - `len` is zero or exceeds the buffer
    pub fn buf_len_set(&mut self, id: BufferId, len: usize) -> Result<()> {
        self.ensure_initialized()?;
        let ring_running = self.state == ChannelState::Armed && self.continuous;
        if ring_running || self.buffers.element(id).is_busy() {
            return Err(DmaError::DescriptorBusy.into());
        }
        self.buffers.len_set(id, len)?;
        Ok(())
    }

    /// Restore both buffers to their full length.
    ///
    /// # Errors
    /// - `InvalidState` - channel is not initialized
    /// - `DescriptorBusy` - a transfer is armed or a buffer is owned by hardware
    pub fn buf_len_reset(&mut self) -> Result<()> {
        self.ensure_initialized()?;
        let owned = [BufferId::Ping, BufferId::Pong]
            .iter()
            .any(|&id| self.buffers.element(id).is_busy());
        if self.state == ChannelState::Armed || owned {
            return Err(DmaError::DescriptorBusy.into());
        }
        self.buffers.len_reset()?;
        Ok(())
    }

    // =========================================================================
    // Bus Configuration
    // =========================================================================

    /// Apply SPI bus attributes to the instance.
    ///
    /// # Errors
    /// - `InvalidState` - channel is not initialized
    /// - `InvalidConfig` - `attr.mode` differs from the channel's mode
    /// - `ClockError` - divider not representable
    pub fn configure_bus(&mut self, attr: &SpiAttr) -> Result<()> {
        self.ensure_initialized()?;
        if attr.mode != self.config.mode {
            return Err(ConfigError::InvalidConfig.into());
        }
        SpiBusController::new(&self.bus, self.config.spi_num).apply(attr)?;
        Ok(())
    }

    // =========================================================================
    // Interrupts
    // =========================================================================

    /// Enable interrupt sources of this channel's SPI instance.
    ///
    /// # Errors
    /// - `InvalidState` - channel is not initialized
    pub fn int_enable(&self, src: SpiIntSource) -> Result<()> {
        self.ensure_initialized()?;
        interrupt::int_enable(&self.bus, self.config.spi_num, src)?;
        Ok(())
    }

    /// Disable interrupt sources of this channel's SPI instance.
    ///
    /// # Errors
    /// - `InvalidState` - channel is not initialized
    pub fn int_disable(&self, src: SpiIntSource) -> Result<()> {
        self.ensure_initialized()?;
        interrupt::int_disable(&self.bus, self.config.spi_num, src)?;
        Ok(())
    }

    /// Clear pending interrupt sources.
    ///
    /// # Errors
    /// - `InvalidState` - channel is not initialized
    pub fn int_clear(&self, src: SpiIntSource) -> Result<()> {
        self.ensure_initialized()?;
        interrupt::int_clear(&self.bus, self.config.spi_num, src)?;
        Ok(())
    }

    /// Pending interrupt sources.
    ///
    /// # Errors
    /// - `InvalidState` - channel is not initialized
    pub fn int_status_get(&self) -> Result<SpiIntSource> {
        self.ensure_initialized()?;
        Ok(interrupt::int_status_get(&self.bus, self.config.spi_num)?)
    }

    /// Service the DMA interrupt.
    ///
    /// Reads and clears every pending source. A completion source moves an
    /// armed single-shot transfer back to `Ready` and returns its buffer to
    /// software; a free-running ring stays `Armed`. Call from the interrupt
    /// handler.
    pub fn handle_interrupt(&mut self) -> InterruptStatus {
        if self.state == ChannelState::Uninit {
            return InterruptStatus::default();
        }
        let spi_num = self.config.spi_num;
        let Ok(pending) = interrupt::int_status_get(&self.bus, spi_num) else {
            return InterruptStatus::default();
        };
        if pending.is_empty() {
            return InterruptStatus::default();
        }
        if interrupt::int_clear(&self.bus, spi_num, pending).is_err() {
            return InterruptStatus::default();
        }

        let completion = SpiIntSource::completion_sources(self.config.mode, self.config.dir);
        if self.state == ChannelState::Armed && !self.continuous && pending.intersects(completion)
        {
            // The finished chain is software's again
            self.buffers.element(self.active).disarm();
            self.state = ChannelState::Ready;
        }
        InterruptStatus::from_raw(pending.bits())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
