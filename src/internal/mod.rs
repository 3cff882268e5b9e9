//! Internal Implementation Details
//!
//! This module contains implementation details that are not part of the public API.
//! Types in this module may change without notice between minor versions.
//!
//! # Contents
//!
//! - [`register`]: SPI and DPORT register maps
//! - [`constants`]: Sizing and timing constants
//! - [`dma`]: Descriptors, DMA elements and the ping-pong buffer
//!
//! # Stability
//!
//! **WARNING:** This module is `pub(crate)` only. Do not depend on any types
//! or functions in this module from external code. They are subject to change
//! without notice.

pub(crate) mod constants;
pub(crate) mod dma;
pub(crate) mod register;
