//! Link-list descriptor bit field constants.
//!
//! Based on ESP32 TRM, DMA chapter (`lldesc_t` layout shared by SPI, I2S
//! and UHCI).

// =============================================================================
// Word 0 - Control and Status
// =============================================================================

/// Descriptor word 0 bit field constants
pub mod dw0 {
    /// Block size field shift - capacity of the buffer in bytes
    pub const SIZE_SHIFT: u32 = 0;
    /// Block size field mask (12 bits)
    pub const SIZE_MASK: u32 = 0xFFF << SIZE_SHIFT;
    /// Length field shift - valid bytes in the buffer
    pub const LENGTH_SHIFT: u32 = 12;
    /// Length field mask (12 bits)
    pub const LENGTH_MASK: u32 = 0xFFF << LENGTH_SHIFT;
    // Bits 28:24 (offset) are reserved on ESP32
    /// Sub-start-of-frame marker
    pub const SUB_SOF: u32 = 1 << 29;
    /// End of frame - last block of a transfer
    pub const EOF: u32 = 1 << 30;
    /// OWN - when set, descriptor owned by DMA; when clear, owned by CPU
    pub const OWNER: u32 = 1 << 31;

    /// Largest value of the size and length fields
    pub const FIELD_MAX: u32 = 0xFFF;
}
