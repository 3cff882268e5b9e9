//! ISR-safe channel wrapper using critical sections.
//!
//! Provides [`SharedSpiDma`] so the main context and the DMA interrupt
//! handler can both reach one [`SpiDmaChannel`].

use super::primitives::CriticalSectionCell;
use crate::driver::channel::SpiDmaChannel;
use crate::driver::interrupt::InterruptStatus;
use crate::hal::{InterruptController, RegisterBus};

/// ISR-safe SPI DMA channel wrapper using critical sections.
///
/// All access goes through `critical_section::with()`, disabling interrupts
/// for the duration of the closure.
///
/// # Example
///
/// ```ignore
/// static SPI2: SharedSpiDma<Mmio, EspHalInterrupts, 1024, 1> =
///     SharedSpiDma::new(unsafe { Mmio::new() }, EspHalInterrupts::new(Priority::Priority1));
///
/// SPI2.with(|ch| {
///     ch.init(config, SPI2_DMA_HANDLER)?;
///     ch.start(1024, &mut delay)
/// })?;
/// ```
pub struct SharedSpiDma<B, I, const BUF_CAP: usize, const DESC_CAP: usize>
where
    B: RegisterBus,
    I: InterruptController,
{
    inner: CriticalSectionCell<SpiDmaChannel<B, I, BUF_CAP, DESC_CAP>>,
}

impl<B, I, const BUF_CAP: usize, const DESC_CAP: usize> SharedSpiDma<B, I, BUF_CAP, DESC_CAP>
where
    B: RegisterBus,
    I: InterruptController,
{
    /// Create a new shared channel (const, suitable for static initialization).
    pub const fn new(bus: B, intc: I) -> Self {
        Self {
            inner: CriticalSectionCell::new(SpiDmaChannel::new(bus, intc)),
        }
    }

    /// Execute a closure with exclusive access to the channel.
    ///
    /// Interrupts are disabled for the duration of the closure.
    #[inline]
    pub fn with<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut SpiDmaChannel<B, I, BUF_CAP, DESC_CAP>) -> R,
    {
        self.inner.with(f)
    }

    /// Try to execute a closure, returning `None` if already borrowed.
    #[inline]
    pub fn try_with<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut SpiDmaChannel<B, I, BUF_CAP, DESC_CAP>) -> R,
    {
        self.inner.try_with(f)
    }

    /// Service the DMA interrupt from a handler.
    ///
    /// Returns `None` if the channel is borrowed by the interrupted context.
    #[inline]
    pub fn handle_interrupt(&self) -> Option<InterruptStatus> {
        self.inner.try_with(SpiDmaChannel::handle_interrupt)
    }
}

#[cfg(test)]
#[allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]
mod tests {
    extern crate std;

    use super::*;
    use crate::driver::config::{BufferId, ChannelState, SpiDmaConfig};
    use crate::internal::register::spi::{
        SPI_DMA_INT_RAW_OFFSET, SPI_DMA_INT_ST_OFFSET, SPI_OUT_EOF_DES_ADDR_OFFSET,
        SPI_OUT_EOF_INT, spi_base,
    };
    use crate::testing::{MockDelay, MockInterruptController, MockRegisterBus, noop_handler};
    use std::boxed::Box;

    type TestShared<'a> =
        SharedSpiDma<&'a MockRegisterBus, &'a MockInterruptController, 64, 1>;

    #[test]
    fn with_drives_the_channel() {
        let bus = MockRegisterBus::new();
        let intc = MockInterruptController::new();
        let shared: Box<TestShared<'_>> = Box::new(SharedSpiDma::new(&bus, &intc));

        shared
            .with(|ch| ch.init(SpiDmaConfig::new().with_buf_size(32), noop_handler))
            .unwrap();
        assert_eq!(shared.with(|ch| ch.state()), ChannelState::Ready);
    }

    #[test]
    fn handler_backs_off_while_borrowed() {
        let bus = MockRegisterBus::new();
        let intc = MockInterruptController::new();
        let shared: Box<TestShared<'_>> = Box::new(SharedSpiDma::new(&bus, &intc));

        let nested = shared.with(|_| shared.handle_interrupt());
        assert_eq!(nested, None);
    }

    #[test]
    fn handle_interrupt_completes_transfer() {
        let bus = MockRegisterBus::new();
        let intc = MockInterruptController::new();
        let shared: Box<TestShared<'_>> = Box::new(SharedSpiDma::new(&bus, &intc));
        let mut delay = MockDelay::new();

        let tail = shared.with(|ch| {
            ch.init(SpiDmaConfig::new().with_buf_size(32), noop_handler)
                .unwrap();
            ch.start(32, &mut delay).unwrap();
            ch.buffers().element(BufferId::Ping).tail().addr()
        });

        let base = spi_base(2);
        bus.set(base + SPI_OUT_EOF_DES_ADDR_OFFSET, tail);
        bus.set(base + SPI_DMA_INT_RAW_OFFSET, SPI_OUT_EOF_INT);
        bus.set(base + SPI_DMA_INT_ST_OFFSET, SPI_OUT_EOF_INT);

        let status = shared.handle_interrupt().unwrap();
        assert!(status.buf_send_done);
        assert_eq!(shared.with(|ch| ch.state()), ChannelState::Ready);
        assert_eq!(shared.with(|ch| ch.status_get()), Some(BufferId::Ping));
    }
}
