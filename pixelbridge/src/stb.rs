use crate::capability::{DecodeCapability, DecodeFailure, ImageInfo, PixelBlock, RGBA_CHANNELS};
use crate::sys;
use std::ffi::{CStr, c_int};
use std::ptr::NonNull;

/// Decode capability backed by `stb_image` (JPEG and PNG).
///
/// The `stb` feature builds `stbi-sys` with `thread-local-reason`, so the reason read
/// after a failed call belongs to that call even when other threads decode concurrently.
#[derive(Debug, Default, Clone, Copy)]
pub struct StbImage;

impl StbImage {
    pub fn new() -> Self {
        Self
    }
}

fn input_len(bytes: &[u8]) -> Result<c_int, DecodeFailure> {
    c_int::try_from(bytes.len()).map_err(|_| DecodeFailure::rejected("input larger than 2 GiB"))
}

fn failure() -> DecodeFailure {
    // SAFETY: stb returns either null or a pointer to a static, null-terminated string.
    let ptr = unsafe { sys::stbi_failure_reason() };
    if ptr.is_null() {
        return DecodeFailure::Rejected(None);
    }
    let reason = unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned();
    if reason == "outofmem" {
        DecodeFailure::OutOfMemory
    } else {
        DecodeFailure::Rejected(Some(reason))
    }
}

impl DecodeCapability for StbImage {
    fn name(&self) -> &'static str {
        "stb_image"
    }

    fn info(&self, bytes: &[u8]) -> Result<ImageInfo, DecodeFailure> {
        let len = input_len(bytes)?;
        let (mut x, mut y, mut comp) = (0, 0, 0);
        // SAFETY: bytes is valid for len bytes; out-params point to live locals.
        let ok = unsafe { sys::stbi_info_from_memory(bytes.as_ptr(), len, &mut x, &mut y, &mut comp) };
        if ok == 0 {
            return Err(failure());
        }
        Ok(ImageInfo {
            width: x as u32,
            height: y as u32,
            channels_in_file: comp as u8,
        })
    }

    fn decode(&self, bytes: &[u8], desired_channels: u8) -> Result<PixelBlock, DecodeFailure> {
        if desired_channels != RGBA_CHANNELS {
            return Err(DecodeFailure::rejected("only RGBA output is supported"));
        }
        let len = input_len(bytes)?;
        let (mut w, mut h, mut channels_in_file) = (0, 0, 0);
        // SAFETY: bytes is valid for len bytes and is only read for the duration of the call.
        let decoded = unsafe {
            sys::stbi_load_from_memory(
                bytes.as_ptr(),
                len,
                &mut w,
                &mut h,
                &mut channels_in_file,
                c_int::from(desired_channels),
            )
        };
        let ptr = NonNull::new(decoded).ok_or_else(failure)?;
        // SAFETY: stb allocated w*h*desired_channels bytes; freed via stbi_image_free.
        Ok(unsafe { PixelBlock::from_raw(ptr, w as u32, h as u32) })
    }

    unsafe fn free(&self, block: PixelBlock) {
        // SAFETY: the pointer came from stbi_load_from_memory.
        unsafe { sys::stbi_image_free(block.as_ptr().cast()) }
    }
}
