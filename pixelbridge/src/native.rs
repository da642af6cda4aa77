//! Pure-Rust decode capability built on `jpeg-decoder` and `png`.
//!
//! Output is always normalised to RGBA8888 and leaked into a boxed slice, so the block
//! lives outside any runtime heap until [`NativeDecoder::free`] reclaims it.

use crate::capability::{DecodeCapability, DecodeFailure, ImageInfo, PixelBlock, RGBA_CHANNELS};
use jpeg_decoder::PixelFormat;
use std::ptr::{self, NonNull};

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Jpeg,
    Png,
}

fn sniff(bytes: &[u8]) -> Result<Format, DecodeFailure> {
    if bytes.starts_with(&PNG_SIGNATURE) {
        Ok(Format::Png)
    } else if bytes.starts_with(&JPEG_SOI) {
        Ok(Format::Jpeg)
    } else {
        Err(DecodeFailure::rejected("unknown image type"))
    }
}

/// Interleaved sample layout produced by the underlying decoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Gray,
    Gray16Be,
    GrayAlpha,
    Rgb,
    Rgba,
    Cmyk,
}

impl Layout {
    fn bytes_per_pixel(self) -> usize {
        match self {
            Layout::Gray => 1,
            Layout::Gray16Be | Layout::GrayAlpha => 2,
            Layout::Rgb => 3,
            Layout::Rgba | Layout::Cmyk => 4,
        }
    }
}

/// JPEG and PNG decoder with no native dependencies.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeDecoder;

impl NativeDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl DecodeCapability for NativeDecoder {
    fn name(&self) -> &'static str {
        "native"
    }

    fn info(&self, bytes: &[u8]) -> Result<ImageInfo, DecodeFailure> {
        match sniff(bytes)? {
            Format::Jpeg => jpeg_info(bytes),
            Format::Png => png_info(bytes),
        }
    }

    fn decode(&self, bytes: &[u8], desired_channels: u8) -> Result<PixelBlock, DecodeFailure> {
        if desired_channels != RGBA_CHANNELS {
            return Err(DecodeFailure::rejected("only RGBA output is supported"));
        }
        let (rgba, width, height) = match sniff(bytes)? {
            Format::Jpeg => decode_jpeg(bytes)?,
            Format::Png => decode_png(bytes)?,
        };
        if width == 0 || height == 0 {
            return Err(DecodeFailure::rejected("image has zero width or height"));
        }
        let expected = width as usize * height as usize * RGBA_CHANNELS as usize;
        if rgba.len() != expected {
            return Err(DecodeFailure::rejected("decoded size mismatch"));
        }
        let ptr = NonNull::from(Box::leak(rgba.into_boxed_slice())).cast::<u8>();
        // SAFETY: ptr owns exactly width*height*4 bytes, reclaimed in `free` below.
        Ok(unsafe { PixelBlock::from_raw(ptr, width, height) })
    }

    unsafe fn free(&self, block: PixelBlock) {
        let slice = ptr::slice_from_raw_parts_mut(block.as_ptr(), block.byte_len());
        // SAFETY: the block came from `decode`, which leaked a boxed slice of this length.
        drop(unsafe { Box::from_raw(slice) });
    }
}

fn jpeg_info(bytes: &[u8]) -> Result<ImageInfo, DecodeFailure> {
    let mut decoder = jpeg_decoder::Decoder::new(bytes);
    decoder
        .read_info()
        .map_err(|e| DecodeFailure::rejected(e.to_string()))?;
    let info = decoder
        .info()
        .ok_or_else(|| DecodeFailure::rejected("missing JPEG frame header"))?;
    Ok(ImageInfo {
        width: u32::from(info.width),
        height: u32::from(info.height),
        channels_in_file: match info.pixel_format {
            PixelFormat::L8 | PixelFormat::L16 => 1,
            PixelFormat::RGB24 => 3,
            PixelFormat::CMYK32 => 4,
        },
    })
}

fn decode_jpeg(bytes: &[u8]) -> Result<(Vec<u8>, u32, u32), DecodeFailure> {
    let mut decoder = jpeg_decoder::Decoder::new(bytes);
    let pixels = decoder
        .decode()
        .map_err(|e| DecodeFailure::rejected(e.to_string()))?;
    let info = decoder
        .info()
        .ok_or_else(|| DecodeFailure::rejected("missing JPEG frame header"))?;
    let layout = match info.pixel_format {
        PixelFormat::L8 => Layout::Gray,
        PixelFormat::L16 => Layout::Gray16Be,
        PixelFormat::RGB24 => Layout::Rgb,
        PixelFormat::CMYK32 => Layout::Cmyk,
    };
    let (width, height) = (u32::from(info.width), u32::from(info.height));
    let rgba = expand_to_rgba(pixels, layout, width as usize * height as usize)?;
    Ok((rgba, width, height))
}

fn png_decoder(bytes: &[u8]) -> png::Decoder<&[u8]> {
    // stb_image enforces no size cap; leave that to `Limits`.
    let mut limits = png::Limits::default();
    limits.bytes = usize::MAX;
    let mut decoder = png::Decoder::new_with_limits(bytes, limits);
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    decoder
}

fn png_info(bytes: &[u8]) -> Result<ImageInfo, DecodeFailure> {
    let reader = png_decoder(bytes)
        .read_info()
        .map_err(|e| DecodeFailure::rejected(e.to_string()))?;
    let info = reader.info();
    Ok(ImageInfo {
        width: info.width,
        height: info.height,
        channels_in_file: info.color_type.samples() as u8,
    })
}

fn decode_png(bytes: &[u8]) -> Result<(Vec<u8>, u32, u32), DecodeFailure> {
    let mut reader = png_decoder(bytes)
        .read_info()
        .map_err(|e| DecodeFailure::rejected(e.to_string()))?;
    let mut buf = Vec::new();
    buf.try_reserve_exact(reader.output_buffer_size())
        .map_err(|_| DecodeFailure::OutOfMemory)?;
    buf.resize(reader.output_buffer_size(), 0);
    let frame = reader
        .next_frame(&mut buf)
        .map_err(|e| DecodeFailure::rejected(e.to_string()))?;
    if frame.bit_depth != png::BitDepth::Eight {
        return Err(DecodeFailure::rejected("unsupported PNG bit depth"));
    }
    let layout = match frame.color_type {
        png::ColorType::Grayscale => Layout::Gray,
        png::ColorType::GrayscaleAlpha => Layout::GrayAlpha,
        png::ColorType::Rgb => Layout::Rgb,
        png::ColorType::Rgba => Layout::Rgba,
        png::ColorType::Indexed => return Err(DecodeFailure::rejected("unexpanded PNG palette")),
    };
    // Rows are tightly packed once expanded to 8-bit samples.
    buf.truncate(frame.buffer_size());
    let rgba = expand_to_rgba(buf, layout, frame.width as usize * frame.height as usize)?;
    Ok((rgba, frame.width, frame.height))
}

fn expand_to_rgba(mut src: Vec<u8>, layout: Layout, pixels: usize) -> Result<Vec<u8>, DecodeFailure> {
    let needed = pixels
        .checked_mul(layout.bytes_per_pixel())
        .ok_or(DecodeFailure::OutOfMemory)?;
    if src.len() < needed {
        return Err(DecodeFailure::rejected("truncated pixel data"));
    }
    if layout == Layout::Rgba {
        src.truncate(needed);
        return Ok(src);
    }

    let out_len = pixels
        .checked_mul(RGBA_CHANNELS as usize)
        .ok_or(DecodeFailure::OutOfMemory)?;
    let mut out = Vec::new();
    out.try_reserve_exact(out_len)
        .map_err(|_| DecodeFailure::OutOfMemory)?;
    for px in src[..needed].chunks_exact(layout.bytes_per_pixel()) {
        let rgba = match layout {
            Layout::Gray => [px[0], px[0], px[0], 255],
            Layout::Gray16Be => [px[0], px[0], px[0], 255],
            Layout::GrayAlpha => [px[0], px[0], px[0], px[1]],
            Layout::Rgb => [px[0], px[1], px[2], 255],
            Layout::Cmyk => {
                // jpeg-decoder already undoes the Adobe inversion: 0 is no ink.
                let white = 255 - u16::from(px[3]);
                let ink = |c: u8| (((255 - u16::from(c)) * white + 127) / 255) as u8;
                [ink(px[0]), ink(px[1]), ink(px[2]), 255]
            }
            Layout::Rgba => [px[0], px[1], px[2], px[3]],
        };
        out.extend_from_slice(&rgba);
    }
    Ok(out)
}
