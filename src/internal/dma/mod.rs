//! DMA Buffers
//!
//! Statically allocated descriptor chains for the SPI DMA engine.
//!
//! # Architecture
//!
//! - [`DmaDescriptor`]: one hardware link-list entry
//! - [`DmaElement`]: a data buffer plus the chain that describes it
//! - [`PingPongBuffer`]: two elements used alternately by hardware and software
//!
//! # Example
//!
//! ```ignore
//! static mut BUF: PingPongBuffer<1024, 1> = PingPongBuffer::new();
//!
//! let buf = unsafe { &mut *core::ptr::addr_of_mut!(BUF) };
//! buf.create(1024)?;
//! buf.len_set(BufferId::Ping, 256)?;
//! ```

pub mod descriptor;
pub mod element;
pub mod pingpong;

pub use descriptor::DmaDescriptor;
pub use element::DmaElement;
pub use pingpong::PingPongBuffer;
