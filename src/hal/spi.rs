//! SPI Bus HAL
//!
//! Programs the bus attributes of an SPI instance (role, clock mode, clock
//! divider, bit order, duplex) ahead of DMA transfers.

use crate::driver::config::{BitOrder, HalfMode, SpiAttr, SpiMode, SpiSpeed};
use crate::driver::error::{ConfigError, ConfigResult};
use crate::hal::RegisterBus;
use crate::internal::register::spi::{
    SPI_CLK_EQU_SYSCLK, SPI_CLKCNT_H_SHIFT, SPI_CLKCNT_L_SHIFT, SPI_CLKCNT_MASK,
    SPI_CLKCNT_N_SHIFT, SPI_CLKDIV_PRE_MASK, SPI_CLKDIV_PRE_SHIFT, SpiRegs,
};

/// Largest divider the N counter can express on its own
const CLKCNT_MAX: u32 = SPI_CLKCNT_MASK + 1;

/// Compute the `SPI_CLOCK_REG` value dividing the APB clock by `divisor`.
///
/// A divisor of 0 or 1 bypasses the divider. Otherwise the divider is
/// split into a pre-divider and an N counter of at most 64 with a 50 %
/// duty cycle (H = N/2 - 1, L = N - 1).
///
/// # Errors
/// - `ClockError` - the pre-divider does not fit its 13-bit field
pub const fn clock_register(divisor: u32) -> ConfigResult<u32> {
    if divisor <= 1 {
        return Ok(SPI_CLK_EQU_SYSCLK);
    }
    let pre = (divisor - 1) / CLKCNT_MAX;
    if pre > SPI_CLKDIV_PRE_MASK {
        return Err(ConfigError::ClockError);
    }
    let n = divisor / (pre + 1);
    if n < 2 {
        return Err(ConfigError::ClockError);
    }
    let h = n / 2 - 1;
    let l = n - 1;
    Ok((pre << SPI_CLKDIV_PRE_SHIFT)
        | (((n - 1) & SPI_CLKCNT_MASK) << SPI_CLKCNT_N_SHIFT)
        | ((h & SPI_CLKCNT_MASK) << SPI_CLKCNT_H_SHIFT)
        | ((l & SPI_CLKCNT_MASK) << SPI_CLKCNT_L_SHIFT))
}

/// `SPI_CLOCK_REG` value for one of the predefined speeds.
///
/// # Errors
/// - `ClockError` - never for the predefined speeds; kept for symmetry
///   with [`clock_register`]
pub const fn speed_register(speed: SpiSpeed) -> ConfigResult<u32> {
    clock_register(speed.divisor())
}

/// Bus attribute programming for one SPI instance.
pub struct SpiBusController<'a, B: RegisterBus> {
    bus: &'a B,
    spi_num: u8,
}

impl<'a, B: RegisterBus> SpiBusController<'a, B> {
    /// Bind to SPI instance `spi_num`. The caller has validated `spi_num`.
    #[inline]
    pub fn new(bus: &'a B, spi_num: u8) -> Self {
        Self { bus, spi_num }
    }

    /// Apply `attr` to the instance.
    ///
    /// The clock value is computed first so a failure leaves the registers
    /// untouched.
    ///
    /// # Errors
    /// - `ClockError` - divider not representable
    pub fn apply(&self, attr: &SpiAttr) -> ConfigResult<()> {
        let clock = match attr.mode {
            SpiMode::Master => Some(speed_register(attr.speed)?),
            SpiMode::Slave => None,
        };
        let spi = SpiRegs::new(self.bus, self.spi_num);

        // Role
        match attr.mode {
            SpiMode::Master => spi.disable_slave_mode(),
            SpiMode::Slave => spi.enable_slave_mode(),
        }

        // Clock polarity and phase
        let cpol = attr.sub_mode.cpol();
        if cpol {
            spi.set_idle_high();
        } else {
            spi.set_idle_low();
        }
        if cpol ^ attr.sub_mode.cpha() {
            spi.set_out_edge();
        } else {
            spi.clear_out_edge();
        }

        // Bit order
        match attr.bit_order {
            BitOrder::MsbFirst => {
                spi.set_msb_first_tx();
                spi.set_msb_first_rx();
            }
            BitOrder::LsbFirst => {
                spi.set_lsb_first_tx();
                spi.set_lsb_first_rx();
            }
        }

        // Duplex
        match attr.half_mode {
            HalfMode::Full => spi.enable_full_duplex(),
            HalfMode::Half => spi.disable_full_duplex(),
        }

        if let Some(clock) = clock {
            spi.set_clock(clock);
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::config::SpiSubMode;
    use crate::internal::register::spi::{
        SPI_CK_IDLE_EDGE, SPI_CK_OUT_EDGE, SPI_CLOCK_OFFSET, SPI_CTRL_OFFSET, SPI_DOUTDIN,
        SPI_PIN_OFFSET, SPI_RD_BIT_ORDER, SPI_SLAVE_MODE, SPI_SLAVE_OFFSET, SPI_USER_OFFSET,
        SPI_WR_BIT_ORDER, spi_base,
    };
    use crate::testing::MockRegisterBus;

    fn fields(reg: u32) -> (u32, u32, u32, u32) {
        (
            (reg >> SPI_CLKDIV_PRE_SHIFT) & SPI_CLKDIV_PRE_MASK,
            (reg >> SPI_CLKCNT_N_SHIFT) & SPI_CLKCNT_MASK,
            (reg >> SPI_CLKCNT_H_SHIFT) & SPI_CLKCNT_MASK,
            (reg >> SPI_CLKCNT_L_SHIFT) & SPI_CLKCNT_MASK,
        )
    }

    #[test]
    fn sysclk_bypass() {
        assert_eq!(clock_register(1), Ok(SPI_CLK_EQU_SYSCLK));
        assert_eq!(speed_register(SpiSpeed::Mhz80), Ok(SPI_CLK_EQU_SYSCLK));
    }

    #[test]
    fn small_divisors_use_counter_only() {
        // 10 MHz: divide by 8
        assert_eq!(fields(speed_register(SpiSpeed::Mhz10).unwrap()), (0, 7, 3, 7));
        // 16 MHz: divide by 5
        assert_eq!(fields(speed_register(SpiSpeed::Mhz16).unwrap()), (0, 4, 1, 4));
        // 2 MHz: divide by 40
        assert_eq!(fields(speed_register(SpiSpeed::Mhz2).unwrap()), (0, 39, 19, 39));
    }

    #[test]
    fn large_divisors_use_prescaler() {
        // 80 MHz / 800 = 100 kHz: pre = 12, n = 61
        let (pre, n_minus_one, _, _) = fields(clock_register(800).unwrap());
        assert_eq!(pre, 12);
        assert_eq!(n_minus_one, 60);
    }

    #[test]
    fn divisor_out_of_range() {
        assert_eq!(clock_register(u32::MAX), Err(ConfigError::ClockError));
    }

    #[test]
    fn apply_master_mode3_lsb_half() {
        let bus = MockRegisterBus::new();
        let base = spi_base(2);
        let attr = SpiAttr::new()
            .with_sub_mode(SpiSubMode::Mode3)
            .with_bit_order(BitOrder::LsbFirst)
            .with_half_mode(HalfMode::Half)
            .with_speed(SpiSpeed::Mhz20);

        SpiBusController::new(&bus, 2).apply(&attr).unwrap();

        assert_eq!(bus.get(base + SPI_SLAVE_OFFSET) & SPI_SLAVE_MODE, 0);
        assert_ne!(bus.get(base + SPI_PIN_OFFSET) & SPI_CK_IDLE_EDGE, 0);
        // CPOL ^ CPHA == 0
        assert_eq!(bus.get(base + SPI_USER_OFFSET) & SPI_CK_OUT_EDGE, 0);
        assert_eq!(bus.get(base + SPI_USER_OFFSET) & SPI_DOUTDIN, 0);
        assert_eq!(
            bus.get(base + SPI_CTRL_OFFSET),
            SPI_WR_BIT_ORDER | SPI_RD_BIT_ORDER
        );
        assert_eq!(bus.get(base + SPI_CLOCK_OFFSET), speed_register(SpiSpeed::Mhz20).unwrap());
    }

    #[test]
    fn apply_slave_mode1_leaves_clock() {
        let bus = MockRegisterBus::new();
        let base = spi_base(3);
        bus.set(base + SPI_CLOCK_OFFSET, 0x1234);
        let attr = SpiAttr::new()
            .with_mode(SpiMode::Slave)
            .with_sub_mode(SpiSubMode::Mode1);

        SpiBusController::new(&bus, 3).apply(&attr).unwrap();

        assert_ne!(bus.get(base + SPI_SLAVE_OFFSET) & SPI_SLAVE_MODE, 0);
        assert_eq!(bus.get(base + SPI_PIN_OFFSET) & SPI_CK_IDLE_EDGE, 0);
        assert_ne!(bus.get(base + SPI_USER_OFFSET) & SPI_CK_OUT_EDGE, 0);
        assert_ne!(bus.get(base + SPI_USER_OFFSET) & SPI_DOUTDIN, 0);
        assert_eq!(bus.get(base + SPI_CLOCK_OFFSET), 0x1234);
    }
}
