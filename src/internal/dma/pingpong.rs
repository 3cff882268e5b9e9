//! Ping-pong (double) buffer built from two descriptor chains.

use super::element::DmaElement;
use crate::driver::config::BufferId;
use crate::driver::error::{DmaError, DmaResult};
use crate::internal::constants::{DMA_MAX_BLOCK_SIZE, DMA_MAX_TRANSFER_LEN};

#[cfg(feature = "log")]
use log::debug;

/// Two equally sized DMA elements with statically allocated storage.
///
/// # Type Parameters
/// * `BUF_CAP` - Capacity of each buffer in bytes
/// * `DESC_CAP` - Descriptor slots per buffer; a buffer of `n` bytes needs
///   `n.div_ceil(4092)` of them
///
/// # Placement
///
/// [`create`](Self::create) writes descriptor addresses into the chains.
/// Create the buffer in its final location (typically a `static`) and do
/// not move it until [`destroy`](Self::destroy).
pub struct PingPongBuffer<const BUF_CAP: usize, const DESC_CAP: usize> {
    ping: DmaElement<BUF_CAP, DESC_CAP>,
    pong: DmaElement<BUF_CAP, DESC_CAP>,
    /// Nominal length of each element
    len: usize,
    /// Descriptors per element
    queue_cnt: usize,
    created: bool,
}

impl<const BUF_CAP: usize, const DESC_CAP: usize> PingPongBuffer<BUF_CAP, DESC_CAP> {
    /// Create an empty buffer pair. Const-compatible.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ping: DmaElement::new(),
            pong: DmaElement::new(),
            len: 0,
            queue_cnt: 0,
            created: false,
        }
    }

    /// Total memory usage in bytes.
    #[must_use]
    pub const fn memory_usage() -> usize {
        core::mem::size_of::<Self>()
    }

    /// Build both descriptor chains for `buf_len` bytes each.
    ///
    /// Nothing is modified when the request fails.
    ///
    /// # Errors
    /// - `InvalidLength` - `buf_len` is zero or longer than one transfer can be
    /// - `AllocationFailed` - `buf_len` does not fit `BUF_CAP`/`DESC_CAP`
    pub fn create(&mut self, buf_len: usize) -> DmaResult<()> {
        if buf_len == 0 || buf_len > DMA_MAX_TRANSFER_LEN {
            return Err(DmaError::InvalidLength);
        }
        let queue_cnt = buf_len.div_ceil(DMA_MAX_BLOCK_SIZE);
        if buf_len > BUF_CAP || queue_cnt > DESC_CAP {
            return Err(DmaError::AllocationFailed);
        }

        self.ping.build(buf_len, queue_cnt);
        self.pong.build(buf_len, queue_cnt);
        self.len = buf_len;
        self.queue_cnt = queue_cnt;
        self.created = true;

        #[cfg(feature = "log")]
        debug!("ping-pong buffer created: len={} descriptors={}", buf_len, queue_cnt);

        Ok(())
    }

    /// Release both chains. The storage can be reused by a later `create`.
    pub fn destroy(&mut self) {
        self.ping.teardown();
        self.pong.teardown();
        self.len = 0;
        self.queue_cnt = 0;
        self.created = false;
    }

    /// Reconfigure one element to describe exactly `len` bytes.
    ///
    /// # Errors
    /// - `InvalidLength` - `len` is zero, exceeds the buffer length, or the
    ///   buffer was never created
    pub fn len_set(&mut self, id: BufferId, len: usize) -> DmaResult<()> {
        if !self.created {
            return Err(DmaError::InvalidLength);
        }
        self.element_mut(id).set_len(len)
    }

    /// Restore both elements to the chains built by `create`.
    ///
    /// # Errors
    /// - `InvalidLength` - the buffer was never created
    pub fn len_reset(&mut self) -> DmaResult<()> {
        if !self.created {
            return Err(DmaError::InvalidLength);
        }
        self.ping.reset_len();
        self.pong.reset_len();
        Ok(())
    }

    /// Link ping and pong into a ring (ping -> pong -> ping).
    pub fn link_ring(&self) {
        self.ping.link_to(self.pong.head());
        self.pong.link_to(self.ping.head());
    }

    /// Break the ring, terminating each element at its tail.
    pub fn unlink_ring(&self) {
        self.ping.unlink();
        self.pong.unlink();
    }

    /// Take every descriptor of both elements back from hardware.
    pub fn disarm_all(&self) {
        self.ping.disarm();
        self.pong.disarm();
    }

    /// Element by id.
    #[inline(always)]
    pub fn element(&self, id: BufferId) -> &DmaElement<BUF_CAP, DESC_CAP> {
        match id {
            BufferId::Ping => &self.ping,
            BufferId::Pong => &self.pong,
        }
    }

    /// Mutable element by id.
    #[inline(always)]
    pub fn element_mut(&mut self, id: BufferId) -> &mut DmaElement<BUF_CAP, DESC_CAP> {
        match id {
            BufferId::Ping => &mut self.ping,
            BufferId::Pong => &mut self.pong,
        }
    }

    /// Element whose tail descriptor sits at bus address `addr`.
    pub fn find_by_tail(&self, addr: u32) -> Option<BufferId> {
        if !self.created || addr == 0 {
            return None;
        }
        if self.ping.tail().addr() == addr {
            Some(BufferId::Ping)
        } else if self.pong.tail().addr() == addr {
            Some(BufferId::Pong)
        } else {
            None
        }
    }

    /// Whether `create` succeeded and `destroy` has not been called since.
    #[inline(always)]
    pub fn is_created(&self) -> bool {
        self.created
    }

    /// Nominal length of each element.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no buffer is currently created.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Descriptors per element.
    #[inline(always)]
    pub fn queue_cnt(&self) -> usize {
        self.queue_cnt
    }
}

impl<const BUF_CAP: usize, const DESC_CAP: usize> Default for PingPongBuffer<BUF_CAP, DESC_CAP> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::boxed::Box;
    use std::vec::Vec;

    type Small = PingPongBuffer<64, 1>;
    type Large = PingPongBuffer<10_000, 3>;

    fn all_lengths(buf: &Large) -> Vec<usize> {
        [BufferId::Ping, BufferId::Pong]
            .iter()
            .flat_map(|&id| {
                let el = buf.element(id);
                (0..el.queue_cnt()).map(move |i| el.descriptor(i).unwrap().length())
            })
            .collect()
    }

    #[test]
    fn create_builds_two_disjoint_chains() {
        let mut buf = Small::new();
        buf.create(64).unwrap();

        assert!(buf.is_created());
        assert_eq!(buf.len(), 64);
        assert_eq!(buf.queue_cnt(), 1);

        let ping = buf.element(BufferId::Ping);
        let pong = buf.element(BufferId::Pong);
        let ping_start = ping.head().buffer_addr();
        let pong_start = pong.head().buffer_addr();
        assert!(ping_start + 64 <= pong_start || pong_start + 64 <= ping_start);
        assert_ne!(ping.tail().addr(), pong.tail().addr());
    }

    #[test]
    fn create_zero_fails_without_state() {
        let mut buf = Small::new();
        assert_eq!(buf.create(0), Err(DmaError::InvalidLength));
        assert!(!buf.is_created());
        assert_eq!(buf.queue_cnt(), 0);
    }

    #[test]
    fn create_beyond_capacity_fails_cleanly() {
        let mut buf = Small::new();
        assert_eq!(buf.create(65), Err(DmaError::AllocationFailed));
        assert_eq!(buf.create(usize::MAX), Err(DmaError::InvalidLength));
        assert!(!buf.is_created());

        let mut large = Box::new(PingPongBuffer::<10_000, 2>::new());
        assert_eq!(large.create(9_000), Err(DmaError::AllocationFailed));
        assert!(large.element(BufferId::Ping).descriptor(0).is_none());
    }

    #[test]
    fn len_set_then_reset_round_trip() {
        let mut buf = Box::new(Large::new());
        buf.create(10_000).unwrap();
        let before = all_lengths(&buf);

        for len in [1, 100, 4092, 4093, 8184, 9_999, 10_000] {
            buf.len_set(BufferId::Ping, len).unwrap();
            buf.len_set(BufferId::Pong, len).unwrap();
            assert_eq!(buf.element(BufferId::Ping).active_len(), len);
            buf.len_reset().unwrap();
            assert_eq!(all_lengths(&buf), before, "len {len}");
        }
    }

    #[test]
    fn len_set_rejects_oversize() {
        let mut buf = Small::new();
        buf.create(32).unwrap();
        assert_eq!(buf.len_set(BufferId::Ping, 33), Err(DmaError::InvalidLength));
        assert_eq!(buf.len_set(BufferId::Ping, 0), Err(DmaError::InvalidLength));
    }

    #[test]
    fn operations_before_create_fail() {
        let mut buf = Small::new();
        assert_eq!(buf.len_set(BufferId::Ping, 1), Err(DmaError::InvalidLength));
        assert_eq!(buf.len_reset(), Err(DmaError::InvalidLength));
        assert_eq!(buf.find_by_tail(0x1234), None);
    }

    #[test]
    fn find_by_tail_tracks_len_set() {
        let mut buf = Box::new(Large::new());
        buf.create(10_000).unwrap();
        let full_tail = buf.element(BufferId::Pong).tail().addr();
        assert_eq!(buf.find_by_tail(full_tail), Some(BufferId::Pong));

        buf.len_set(BufferId::Pong, 10).unwrap();
        assert_eq!(buf.find_by_tail(full_tail), None);
        let short_tail = buf.element(BufferId::Pong).tail().addr();
        assert_eq!(buf.find_by_tail(short_tail), Some(BufferId::Pong));
    }

    #[test]
    fn ring_link_and_unlink() {
        let mut buf = Small::new();
        buf.create(16).unwrap();
        buf.link_ring();

        let ping = buf.element(BufferId::Ping);
        let pong = buf.element(BufferId::Pong);
        assert_eq!(ping.tail().next_addr(), pong.head().addr());
        assert_eq!(pong.tail().next_addr(), ping.head().addr());

        buf.unlink_ring();
        assert_eq!(buf.element(BufferId::Ping).tail().next_addr(), 0);
        assert_eq!(buf.element(BufferId::Pong).tail().next_addr(), 0);
    }

    #[test]
    fn destroy_allows_recreate() {
        let mut buf = Small::new();
        buf.create(64).unwrap();
        buf.destroy();
        assert!(!buf.is_created());
        assert!(buf.is_empty());

        buf.create(8).unwrap();
        assert_eq!(buf.element(BufferId::Ping).buf().len(), 8);
    }

    #[test]
    fn memory_usage_covers_both_buffers() {
        assert!(Small::memory_usage() >= 2 * 64);
    }
}
