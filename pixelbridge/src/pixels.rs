use crate::capability::{DecodeCapability, PixelBlock};
use std::fmt;
use std::mem::ManuallyDrop;
use std::sync::Arc;

/// Sole owner of a decoded pixel block.
///
/// Dropping it hands the block back to the capability that allocated it, exactly once.
/// Share it through `Arc<OwnedPixels>`; the block is released with the last reference.
pub struct OwnedPixels {
    block: ManuallyDrop<PixelBlock>,
    capability: Arc<dyn DecodeCapability>,
}

// SAFETY: the block is uniquely owned and only read through `&self`; capabilities are
// Send + Sync by trait bound.
unsafe impl Send for OwnedPixels {}
unsafe impl Sync for OwnedPixels {}

impl OwnedPixels {
    pub fn new(block: PixelBlock, capability: Arc<dyn DecodeCapability>) -> Self {
        Self {
            block: ManuallyDrop::new(block),
            capability,
        }
    }

    fn block(&self) -> &PixelBlock {
        &self.block
    }

    pub fn width(&self) -> u32 {
        self.block().width()
    }

    pub fn height(&self) -> u32 {
        self.block().height()
    }

    /// Byte length, `width * height * 4`.
    pub fn len(&self) -> usize {
        self.block().byte_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_ptr(&self) -> *mut u8 {
        self.block().as_ptr()
    }

    pub fn as_slice(&self) -> &[u8] {
        let block = self.block();
        // SAFETY: the block holds byte_len initialised bytes for as long as self lives.
        unsafe { std::slice::from_raw_parts(block.as_ptr(), block.byte_len()) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        let block = self.block();
        // SAFETY: &mut self guarantees exclusive access to the block.
        unsafe { std::slice::from_raw_parts_mut(block.as_ptr(), block.byte_len()) }
    }
}

impl fmt::Debug for OwnedPixels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedPixels")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("capability", &self.capability.name())
            .finish()
    }
}

impl Drop for OwnedPixels {
    fn drop(&mut self) {
        // SAFETY: drop runs once and the block is never touched afterwards.
        let block = unsafe { ManuallyDrop::take(&mut self.block) };
        // SAFETY: the block came from this capability.
        unsafe { self.capability.free(block) }
    }
}
