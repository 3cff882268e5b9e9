//! Configuration types for the ESP32 SPI DMA driver

use super::error::{ConfigError, ConfigResult};
use crate::internal::constants::{
    APB_CLK_HZ, DEFAULT_DMA_BUF_SIZE, DEFAULT_FIFO_TIMEOUT_US, DMA_MAX_TRANSFER_LEN,
    FIFO_POLL_INTERVAL_US, SPI_NUM_MAX, SPI_NUM_MIN,
};

/// SPI role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiMode {
    /// Drive the clock and chip select
    #[default]
    Master,
    /// Follow an external master
    Slave,
}

/// DMA transfer direction, seen from memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaDirection {
    /// Receive: the in-link writes incoming data into the buffers
    In,
    /// Transmit: the out-link reads outgoing data from the buffers
    #[default]
    Out,
}

/// Shared SPI DMA channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaChannel {
    /// DMA channel 0 (selector value 1)
    #[default]
    Channel0,
    /// DMA channel 1 (selector value 2)
    Channel1,
}

impl DmaChannel {
    /// Value written to the DPORT channel-select field (0 means unrouted).
    #[must_use]
    pub const fn select(self) -> u32 {
        match self {
            DmaChannel::Channel0 => 1,
            DmaChannel::Channel1 => 2,
        }
    }
}

/// One half of the ping-pong buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BufferId {
    /// First buffer
    #[default]
    Ping,
    /// Second buffer
    Pong,
}

impl BufferId {
    /// The other buffer of the pair.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            BufferId::Ping => BufferId::Pong,
            BufferId::Pong => BufferId::Ping,
        }
    }
}

/// Channel lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelState {
    /// No buffers, peripheral not configured
    #[default]
    Uninit,
    /// Configured and idle
    Ready,
    /// Descriptors handed to hardware, transfer in flight
    Armed,
}

// =============================================================================
// SPI Bus Attributes
// =============================================================================

/// Clock polarity / phase combination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiSubMode {
    /// CPOL = 0, CPHA = 0
    #[default]
    Mode0,
    /// CPOL = 0, CPHA = 1
    Mode1,
    /// CPOL = 1, CPHA = 0
    Mode2,
    /// CPOL = 1, CPHA = 1
    Mode3,
}

impl SpiSubMode {
    /// Clock idles high
    #[must_use]
    pub const fn cpol(self) -> bool {
        matches!(self, SpiSubMode::Mode2 | SpiSubMode::Mode3)
    }

    /// Data sampled on the second edge
    #[must_use]
    pub const fn cpha(self) -> bool {
        matches!(self, SpiSubMode::Mode1 | SpiSubMode::Mode3)
    }
}

/// SPI clock, expressed as a divisor of the 80 MHz APB clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiSpeed {
    /// 2 MHz (divide by 40)
    Mhz2,
    /// 5 MHz (divide by 16)
    Mhz5,
    /// 8 MHz (divide by 10)
    Mhz8,
    /// 10 MHz (divide by 8)
    #[default]
    Mhz10,
    /// 16 MHz (divide by 5)
    Mhz16,
    /// 20 MHz (divide by 4)
    Mhz20,
    /// 40 MHz (divide by 2)
    Mhz40,
    /// 80 MHz (APB clock, no divider)
    Mhz80,
}

impl SpiSpeed {
    /// APB clock divisor
    #[must_use]
    pub const fn divisor(self) -> u32 {
        match self {
            SpiSpeed::Mhz2 => 40,
            SpiSpeed::Mhz5 => 16,
            SpiSpeed::Mhz8 => 10,
            SpiSpeed::Mhz10 => 8,
            SpiSpeed::Mhz16 => 5,
            SpiSpeed::Mhz20 => 4,
            SpiSpeed::Mhz40 => 2,
            SpiSpeed::Mhz80 => 1,
        }
    }

    /// Resulting SPI clock in Hz
    #[must_use]
    pub const fn frequency_hz(self) -> u32 {
        APB_CLK_HZ / self.divisor()
    }
}

/// Bit order on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BitOrder {
    /// Most significant bit first
    #[default]
    MsbFirst,
    /// Least significant bit first
    LsbFirst,
}

/// Duplex mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HalfMode {
    /// One direction at a time
    Half,
    /// Receive while transmitting
    #[default]
    Full,
}

/// SPI bus attributes applied before DMA transfers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpiAttr {
    /// Master or slave
    pub mode: SpiMode,
    /// Clock polarity and phase
    pub sub_mode: SpiSubMode,
    /// Clock divisor (master only)
    pub speed: SpiSpeed,
    /// Bit order for both directions
    pub bit_order: BitOrder,
    /// Half or full duplex
    pub half_mode: HalfMode,
}

impl SpiAttr {
    /// Create attributes with defaults (master, mode 0, 10 MHz, MSB first, full duplex)
    #[must_use]
    pub const fn new() -> Self {
        Self {
            mode: SpiMode::Master,
            sub_mode: SpiSubMode::Mode0,
            speed: SpiSpeed::Mhz10,
            bit_order: BitOrder::MsbFirst,
            half_mode: HalfMode::Full,
        }
    }

    /// Set the SPI role
    #[must_use]
    pub const fn with_mode(mut self, mode: SpiMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set clock polarity and phase
    #[must_use]
    pub const fn with_sub_mode(mut self, sub_mode: SpiSubMode) -> Self {
        self.sub_mode = sub_mode;
        self
    }

    /// Set the clock speed
    #[must_use]
    pub const fn with_speed(mut self, speed: SpiSpeed) -> Self {
        self.speed = speed;
        self
    }

    /// Set the bit order
    #[must_use]
    pub const fn with_bit_order(mut self, bit_order: BitOrder) -> Self {
        self.bit_order = bit_order;
        self
    }

    /// Set the duplex mode
    #[must_use]
    pub const fn with_half_mode(mut self, half_mode: HalfMode) -> Self {
        self.half_mode = half_mode;
        self
    }
}

// =============================================================================
// DMA Channel Configuration
// =============================================================================

/// SPI DMA channel configuration
///
/// Fixed for the lifetime of an initialized channel; changing direction or
/// mode requires `uninit` followed by `init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpiDmaConfig {
    /// SPI instance (1..=3)
    pub spi_num: u8,
    /// Master or slave
    pub mode: SpiMode,
    /// Transfer direction
    pub dir: DmaDirection,
    /// Shared DMA channel routed to the instance
    pub channel: DmaChannel,
    /// Length of each ping/pong buffer in bytes
    pub buf_size: usize,
    /// Bound on the master TX FIFO-fill wait in `start`, in microseconds
    pub fifo_timeout_us: u32,
    /// Poll interval of the FIFO-fill wait, in microseconds
    pub poll_interval_us: u32,
}

impl Default for SpiDmaConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SpiDmaConfig {
    /// Create a new configuration with defaults
    #[must_use]
    pub const fn new() -> Self {
        Self {
            spi_num: 2,
            mode: SpiMode::Master,
            dir: DmaDirection::Out,
            channel: DmaChannel::Channel0,
            buf_size: DEFAULT_DMA_BUF_SIZE,
            fifo_timeout_us: DEFAULT_FIFO_TIMEOUT_US,
            poll_interval_us: FIFO_POLL_INTERVAL_US,
        }
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================

    /// Set the SPI instance
    #[must_use]
    pub const fn with_spi_num(mut self, spi_num: u8) -> Self {
        self.spi_num = spi_num;
        self
    }

    /// Set the SPI role
    #[must_use]
    pub const fn with_mode(mut self, mode: SpiMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the transfer direction
    #[must_use]
    pub const fn with_dir(mut self, dir: DmaDirection) -> Self {
        self.dir = dir;
        self
    }

    /// Set the DMA channel
    #[must_use]
    pub const fn with_channel(mut self, channel: DmaChannel) -> Self {
        self.channel = channel;
        self
    }

    /// Set the ping/pong buffer length
    #[must_use]
    pub const fn with_buf_size(mut self, buf_size: usize) -> Self {
        self.buf_size = buf_size;
        self
    }

    /// Set the FIFO-fill wait bound
    #[must_use]
    pub const fn with_fifo_timeout_us(mut self, timeout_us: u32) -> Self {
        self.fifo_timeout_us = timeout_us;
        self
    }

    /// Set the FIFO-fill poll interval
    #[must_use]
    pub const fn with_poll_interval_us(mut self, interval_us: u32) -> Self {
        self.poll_interval_us = interval_us;
        self
    }

    /// Check the configuration without touching hardware.
    ///
    /// # Errors
    /// - `InvalidSpiNum` - `spi_num` outside 1..=3
    /// - `InvalidConfig` - zero or oversized buffer, zero poll interval
    pub const fn validate(&self) -> ConfigResult<()> {
        if self.spi_num < SPI_NUM_MIN || self.spi_num > SPI_NUM_MAX {
            return Err(ConfigError::InvalidSpiNum);
        }
        if self.buf_size == 0 || self.buf_size > DMA_MAX_TRANSFER_LEN {
            return Err(ConfigError::InvalidConfig);
        }
        if self.poll_interval_us == 0 {
            return Err(ConfigError::InvalidConfig);
        }
        Ok(())
    }
}

/// Check an SPI instance number.
///
/// # Errors
/// - `InvalidSpiNum` - `spi_num` outside 1..=3
pub const fn check_spi_num(spi_num: u8) -> ConfigResult<u8> {
    if spi_num < SPI_NUM_MIN || spi_num > SPI_NUM_MAX {
        Err(ConfigError::InvalidSpiNum)
    } else {
        Ok(spi_num)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SpiDmaConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.buf_size, DEFAULT_DMA_BUF_SIZE);
        assert_eq!(config.mode, SpiMode::Master);
        assert_eq!(config.dir, DmaDirection::Out);
    }

    #[test]
    fn builder_sets_fields() {
        let config = SpiDmaConfig::new()
            .with_spi_num(3)
            .with_mode(SpiMode::Slave)
            .with_dir(DmaDirection::In)
            .with_channel(DmaChannel::Channel1)
            .with_buf_size(32)
            .with_fifo_timeout_us(50)
            .with_poll_interval_us(5);

        assert_eq!(config.spi_num, 3);
        assert_eq!(config.mode, SpiMode::Slave);
        assert_eq!(config.dir, DmaDirection::In);
        assert_eq!(config.channel, DmaChannel::Channel1);
        assert_eq!(config.buf_size, 32);
        assert_eq!(config.fifo_timeout_us, 50);
        assert_eq!(config.poll_interval_us, 5);
    }

    #[test]
    fn spi_num_bounds() {
        for n in [0u8, 4, 255] {
            let config = SpiDmaConfig::new().with_spi_num(n);
            assert_eq!(config.validate(), Err(ConfigError::InvalidSpiNum));
            assert_eq!(check_spi_num(n), Err(ConfigError::InvalidSpiNum));
        }
        for n in 1..=3u8 {
            assert_eq!(SpiDmaConfig::new().with_spi_num(n).validate(), Ok(()));
        }
    }

    #[test]
    fn invalid_buffer_sizes_rejected() {
        assert_eq!(
            SpiDmaConfig::new().with_buf_size(0).validate(),
            Err(ConfigError::InvalidConfig)
        );
        assert_eq!(
            SpiDmaConfig::new()
                .with_buf_size(DMA_MAX_TRANSFER_LEN + 1)
                .validate(),
            Err(ConfigError::InvalidConfig)
        );
        assert_eq!(
            SpiDmaConfig::new().with_poll_interval_us(0).validate(),
            Err(ConfigError::InvalidConfig)
        );
    }

    #[test]
    fn channel_select_values() {
        assert_eq!(DmaChannel::Channel0.select(), 1);
        assert_eq!(DmaChannel::Channel1.select(), 2);
    }

    #[test]
    fn buffer_id_other() {
        assert_eq!(BufferId::Ping.other(), BufferId::Pong);
        assert_eq!(BufferId::Pong.other(), BufferId::Ping);
    }

    #[test]
    fn sub_mode_polarity_phase() {
        assert!(!SpiSubMode::Mode0.cpol() && !SpiSubMode::Mode0.cpha());
        assert!(!SpiSubMode::Mode1.cpol() && SpiSubMode::Mode1.cpha());
        assert!(SpiSubMode::Mode2.cpol() && !SpiSubMode::Mode2.cpha());
        assert!(SpiSubMode::Mode3.cpol() && SpiSubMode::Mode3.cpha());
    }

    #[test]
    fn speed_frequencies() {
        assert_eq!(SpiSpeed::Mhz2.frequency_hz(), 2_000_000);
        assert_eq!(SpiSpeed::Mhz16.frequency_hz(), 16_000_000);
        assert_eq!(SpiSpeed::Mhz80.divisor(), 1);
    }

    #[test]
    fn spi_attr_builder() {
        let attr = SpiAttr::new()
            .with_mode(SpiMode::Slave)
            .with_sub_mode(SpiSubMode::Mode3)
            .with_speed(SpiSpeed::Mhz20)
            .with_bit_order(BitOrder::LsbFirst)
            .with_half_mode(HalfMode::Half);

        assert_eq!(attr.mode, SpiMode::Slave);
        assert_eq!(attr.sub_mode, SpiSubMode::Mode3);
        assert_eq!(attr.speed, SpiSpeed::Mhz20);
        assert_eq!(attr.bit_order, BitOrder::LsbFirst);
        assert_eq!(attr.half_mode, HalfMode::Half);
        assert_eq!(SpiAttr::default(), SpiAttr::new());
    }

    #[test]
    fn channel_state_default_is_uninit() {
        assert_eq!(ChannelState::default(), ChannelState::Uninit);
    }
}
