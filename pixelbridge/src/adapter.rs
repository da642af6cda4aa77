use crate::config::BufferMode;
use crate::error::{Error, Result};
use crate::pixels::OwnedPixels;
use crate::runtime::{ArrayBuffer, MutableBuffer};
use std::sync::Arc;

/// Lends decoded pixels to the runtime. Holding the `Arc` is what keeps the native
/// block alive; the runtime dropping this buffer releases that hold.
struct PixelBuffer {
    pixels: Arc<OwnedPixels>,
    size: usize,
}

impl MutableBuffer for PixelBuffer {
    fn size(&self) -> usize {
        self.size
    }

    fn data(&self) -> *mut u8 {
        self.pixels.as_ptr()
    }
}

/// Expose `size` bytes of `pixels` as an `ArrayBuffer` without copying.
pub fn zero_copy_array_buffer(pixels: Arc<OwnedPixels>, size: usize) -> Result<ArrayBuffer> {
    if size > pixels.len() {
        return Err(Error::invalid_argument("buffer size exceeds decoded pixels"));
    }
    Ok(ArrayBuffer::from_external(PixelBuffer { pixels, size }))
}

/// Copy `size` bytes of `pixels` into a runtime-owned `ArrayBuffer`, dropping this
/// hold on the native block.
pub fn copied_array_buffer(pixels: Arc<OwnedPixels>, size: usize) -> Result<ArrayBuffer> {
    let src = pixels
        .as_slice()
        .get(..size)
        .ok_or_else(|| Error::invalid_argument("buffer size exceeds decoded pixels"))?;
    let mut bytes = Vec::new();
    bytes.try_reserve_exact(size).map_err(|_| Error::alloc())?;
    bytes.extend_from_slice(src);
    drop(pixels);
    Ok(ArrayBuffer::from_vec(bytes))
}

/// Wrap pixels according to `mode`.
pub fn wrap_pixels(pixels: Arc<OwnedPixels>, size: usize, mode: BufferMode) -> Result<ArrayBuffer> {
    match mode {
        BufferMode::Alias => zero_copy_array_buffer(pixels, size),
        BufferMode::Copy => copied_array_buffer(pixels, size),
    }
}
