//! Error types for the ESP32 SPI DMA driver
//!
//! Errors are organized by domain for better diagnostics:
//! - [`ConfigError`]: Invalid parameters and initialization failures
//! - [`DmaError`]: Ping-pong buffer and descriptor chain issues
//! - [`IoError`]: Transfer-time failures (lifecycle misuse, stalled FIFO)
//!
//! The unified [`Error`] enum wraps all domain errors and is returned
//! by most driver methods.

// =============================================================================
// Configuration Errors
// =============================================================================

/// Configuration and initialization errors
///
/// These errors are returned before any register is touched, except
/// `InterruptError`, which the interrupt controller reports while binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Channel already initialized
    AlreadyInitialized,
    /// Invalid configuration parameter
    InvalidConfig,
    /// SPI instance outside SPI1..=SPI3
    InvalidSpiNum,
    /// Clock divider cannot be represented
    ClockError,
    /// Interrupt line could not be enabled
    InterruptError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConfigError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigError::AlreadyInitialized => "already initialized",
            ConfigError::InvalidConfig => "invalid configuration",
            ConfigError::InvalidSpiNum => "invalid SPI instance",
            ConfigError::ClockError => "clock configuration error",
            ConfigError::InterruptError => "interrupt enable failed",
        }
    }
}

// =============================================================================
// DMA Errors
// =============================================================================

/// DMA buffer and descriptor errors
///
/// These errors relate to ping-pong buffer creation and descriptor chain
/// reconfiguration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaError {
    /// Requested buffer does not fit the static storage
    AllocationFailed,
    /// Descriptor is busy (owned by DMA hardware)
    DescriptorBusy,
    /// Invalid length (zero or exceeds the buffer)
    InvalidLength,
}

impl core::fmt::Display for DmaError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DmaError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            DmaError::AllocationFailed => "buffer allocation failed",
            DmaError::DescriptorBusy => "descriptor busy",
            DmaError::InvalidLength => "invalid buffer length",
        }
    }
}

// =============================================================================
// I/O Errors
// =============================================================================

/// Runtime transfer errors
///
/// These errors occur while starting, stopping or servicing a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IoError {
    /// Operation timed out
    Timeout,
    /// Invalid state for operation (e.g., channel not initialized)
    InvalidState,
}

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl IoError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            IoError::Timeout => "operation timed out",
            IoError::InvalidState => "invalid state for operation",
        }
    }
}

// =============================================================================
// Unified Error Type
// =============================================================================

/// This enum wraps all domain-specific errors for unified error handling.
///
/// Match on the inner domain error for specific handling:
/// ```ignore
/// match result {
///     Err(Error::Config(ConfigError::InvalidSpiNum)) => { /* ... */ }
///     Err(Error::Dma(DmaError::AllocationFailed)) => { /* ... */ }
///     Err(Error::Io(IoError::Timeout)) => { /* ... */ }
///     _ => {}
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Configuration error
    Config(ConfigError),
    /// DMA error
    Dma(DmaError),
    /// I/O error
    Io(IoError),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Config(e) => write!(f, "config: {}", e.as_str()),
            Error::Dma(e) => write!(f, "dma: {}", e.as_str()),
            Error::Io(e) => write!(f, "io: {}", e.as_str()),
        }
    }
}

// From impls for automatic conversion
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<DmaError> for Error {
    fn from(e: DmaError) -> Self {
        Error::Dma(e)
    }
}

impl From<IoError> for Error {
    fn from(e: IoError) -> Self {
        Error::Io(e)
    }
}

/// Result type alias for SPI DMA operations
pub type Result<T> = core::result::Result<T, Error>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = core::result::Result<T, ConfigError>;

/// Result type alias for DMA operations
pub type DmaResult<T> = core::result::Result<T, DmaError>;

/// Result type alias for I/O operations
pub type IoResult<T> = core::result::Result<T, IoError>;

// =============================================================================
// Unit Tests
// =============================================================================
