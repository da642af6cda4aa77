use std::ptr::NonNull;

/// Channels in every pixel block handed to the runtime (RGBA8888).
pub const RGBA_CHANNELS: u8 = 4;

/// Dimensions announced by an image header, read without decoding pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub channels_in_file: u8,
}

impl ImageInfo {
    pub fn pixel_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Why a capability produced no pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeFailure {
    /// The bytes were rejected, with the decoder's reason when it gave one.
    Rejected(Option<String>),
    /// The decoder could not allocate its output.
    OutOfMemory,
}

impl DecodeFailure {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected(Some(reason.into()))
    }
}

/// RGBA pixels allocated by a [`DecodeCapability`].
///
/// A block is not `Clone`; it must be handed back to the capability that produced it
/// through [`DecodeCapability::free`], normally by wrapping it in
/// [`OwnedPixels`](crate::OwnedPixels).
#[derive(Debug)]
pub struct PixelBlock {
    ptr: NonNull<u8>,
    width: u32,
    height: u32,
}

impl PixelBlock {
    /// # Safety
    ///
    /// `ptr` must point to `width * height * 4` initialised bytes allocated by the
    /// capability that will later receive this block in `free`.
    pub unsafe fn from_raw(ptr: NonNull<u8>, width: u32, height: u32) -> Self {
        Self { ptr, width, height }
    }

    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// `width * height * 4`.
    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * RGBA_CHANNELS as usize
    }
}

/// A decoder that allocates pixel memory outside the runtime heap.
///
/// Implementations must be re-entrant: the bridge may call them from several threads,
/// each call with its own input and its own output block.
pub trait DecodeCapability: Send + Sync {
    /// Short name used in log records.
    fn name(&self) -> &'static str;

    /// Read the header only.
    fn info(&self, bytes: &[u8]) -> Result<ImageInfo, DecodeFailure>;

    /// Decode `bytes` into interleaved pixels with `desired_channels` channels.
    fn decode(&self, bytes: &[u8], desired_channels: u8) -> Result<PixelBlock, DecodeFailure>;

    /// Release a block returned by [`decode`](Self::decode).
    ///
    /// # Safety
    ///
    /// `block` must have been produced by `decode` on this capability.
    unsafe fn free(&self, block: PixelBlock);
}
