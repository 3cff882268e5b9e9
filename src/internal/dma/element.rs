//! One half of a ping-pong buffer: a data buffer and its descriptor chain.

use super::descriptor::{DescriptorSnapshot, DmaDescriptor};
use crate::driver::error::{DmaError, DmaResult};
use crate::internal::constants::DMA_MAX_BLOCK_SIZE;

/// Word-aligned backing storage for DMA data.
#[repr(C, align(4))]
pub struct DmaBuffer<const N: usize>(pub [u8; N]);

/// Buffer plus the descriptor chain that describes it.
///
/// Chain links hold 32-bit bus addresses for the DMA engine; software never
/// follows them and addresses descriptors by index instead.
///
/// # Type Parameters
/// * `BUF_CAP` - Capacity of the data buffer in bytes
/// * `DESC_CAP` - Number of descriptor slots (`BUF_CAP / 4092`, rounded up)
pub struct DmaElement<const BUF_CAP: usize, const DESC_CAP: usize> {
    descriptors: [DmaDescriptor; DESC_CAP],
    buffer: DmaBuffer<BUF_CAP>,
    /// Number of descriptors built by the last `build`
    queue_cnt: usize,
    /// Nominal buffer length set by `build`
    len: usize,
    /// Head of the chain
    first_queue: usize,
    /// Tail of the chain (the EOF descriptor)
    last_queue: usize,
    /// Original tail descriptor, saved by the first `set_len`
    backup_queue: Option<(usize, DescriptorSnapshot)>,
}

impl<const BUF_CAP: usize, const DESC_CAP: usize> DmaElement<BUF_CAP, DESC_CAP> {
    /// Create an empty element. Const-compatible.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            descriptors: [const { DmaDescriptor::new() }; DESC_CAP],
            buffer: DmaBuffer([0u8; BUF_CAP]),
            queue_cnt: 0,
            len: 0,
            first_queue: 0,
            last_queue: 0,
            backup_queue: None,
        }
    }

    /// Build a chain of `queue_cnt` descriptors covering `len` bytes.
    ///
    /// Descriptor addresses are embedded in the chain, so the element must
    /// not move afterwards. Callers validate `len` and `queue_cnt`.
    pub fn build(&mut self, len: usize, queue_cnt: usize) {
        let base = self.buffer.0.as_ptr();
        for i in 0..queue_cnt {
            let offset = i * DMA_MAX_BLOCK_SIZE;
            let block = core::cmp::min(DMA_MAX_BLOCK_SIZE, len - offset);
            // SAFETY: offset < len <= BUF_CAP
            let block_ptr = unsafe { base.add(offset) };
            self.descriptors[i].setup(block_ptr, block);
            if i + 1 < queue_cnt {
                let next = &self.descriptors[i + 1] as *const DmaDescriptor;
                self.descriptors[i].set_next(next);
            }
        }
        self.descriptors[queue_cnt - 1].set_eof(true);

        self.queue_cnt = queue_cnt;
        self.len = len;
        self.first_queue = 0;
        self.last_queue = queue_cnt - 1;
        self.backup_queue = None;
    }

    /// Clear every descriptor and forget the chain.
    pub fn teardown(&mut self) {
        for desc in &self.descriptors {
            desc.clear();
        }
        self.queue_cnt = 0;
        self.len = 0;
        self.first_queue = 0;
        self.last_queue = 0;
        self.backup_queue = None;
    }

    /// Describe exactly `len` bytes with the head of the chain.
    ///
    /// The descriptor holding the last byte becomes the tail: its length is
    /// trimmed, EOF is set and the chain ends there. The original tail is
    /// saved once so [`reset_len`](Self::reset_len) can restore it.
    pub fn set_len(&mut self, len: usize) -> DmaResult<()> {
        if len == 0 || len > self.len {
            return Err(DmaError::InvalidLength);
        }
        self.reset_len();

        let tail = (len - 1) / DMA_MAX_BLOCK_SIZE;
        let desc = &self.descriptors[tail];
        self.backup_queue = Some((tail, desc.snapshot()));

        desc.set_length(len - tail * DMA_MAX_BLOCK_SIZE);
        desc.set_eof(true);
        desc.set_end_of_chain();
        self.last_queue = tail;
        Ok(())
    }

    /// Undo [`set_len`](Self::set_len), restoring the built chain.
    pub fn reset_len(&mut self) {
        if let Some((idx, snapshot)) = self.backup_queue.take() {
            self.descriptors[idx].restore(snapshot);
        }
        self.last_queue = self.queue_cnt.saturating_sub(1);
    }

    /// Give every descriptor of the active chain to the DMA engine.
    pub fn arm(&self) {
        for desc in &self.descriptors[self.first_queue..=self.last_queue] {
            desc.set_owned();
        }
    }

    /// Take every descriptor back from the DMA engine.
    pub fn disarm(&self) {
        for desc in &self.descriptors[..self.queue_cnt] {
            desc.clear_owned();
        }
    }

    /// Check whether any descriptor of the active chain is held by hardware.
    pub fn is_busy(&self) -> bool {
        self.descriptors[self.first_queue..=self.last_queue]
            .iter()
            .any(DmaDescriptor::is_owned)
    }

    /// Continue from this element's tail into `next`.
    pub fn link_to(&self, next: &DmaDescriptor) {
        self.tail().set_next(next);
    }

    /// Terminate the chain at the tail again.
    pub fn unlink(&self) {
        self.tail().set_end_of_chain();
    }

    /// Head descriptor.
    #[inline(always)]
    pub fn head(&self) -> &DmaDescriptor {
        &self.descriptors[self.first_queue]
    }

    /// Tail descriptor.
    #[inline(always)]
    pub fn tail(&self) -> &DmaDescriptor {
        &self.descriptors[self.last_queue]
    }

    /// Descriptor at `index` of the chain.
    #[inline(always)]
    pub fn descriptor(&self, index: usize) -> Option<&DmaDescriptor> {
        self.descriptors[..self.queue_cnt].get(index)
    }

    /// Number of descriptors in the built chain.
    #[inline(always)]
    pub fn queue_cnt(&self) -> usize {
        self.queue_cnt
    }

    /// Bytes currently described by the chain.
    pub fn active_len(&self) -> usize {
        self.descriptors[self.first_queue..=self.last_queue]
            .iter()
            .map(DmaDescriptor::length)
            .sum()
    }

    /// Data buffer limited to the nominal length.
    #[inline(always)]
    pub fn buf(&self) -> &[u8] {
        &self.buffer.0[..self.len]
    }

    /// Mutable data buffer limited to the nominal length.
    #[inline(always)]
    pub fn buf_mut(&mut self) -> &mut [u8] {
        &mut self.buffer.0[..self.len]
    }
}

impl<const BUF_CAP: usize, const DESC_CAP: usize> Default for DmaElement<BUF_CAP, DESC_CAP> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
