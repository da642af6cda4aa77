#![allow(dead_code)]

use anyhow::Context;
use pixelbridge::{DecodeCapability, DecodeFailure, ImageInfo, NativeDecoder, PixelBlock};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Deterministic RGBA test pattern.
pub fn pattern(width: u32, height: u32, seed: u8) -> Vec<u8> {
    (0..width * height * 4)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
        .collect()
}

pub fn png_rgba(width: u32, height: u32, rgba: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().expect("png header");
        writer.write_image_data(rgba).expect("png data");
    }
    out
}

pub fn png_rgb(width: u32, height: u32) -> Vec<u8> {
    let rgb: Vec<u8> = (0..width * height * 3).map(|i| (i % 256) as u8).collect();
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().expect("png header");
        writer.write_image_data(&rgb).expect("png data");
    }
    out
}

pub fn jpeg_rgb(width: u16, height: u16) -> Vec<u8> {
    let rgb: Vec<u8> = (0..width as usize * height as usize)
        .flat_map(|i| [(i * 7) as u8, (i * 3) as u8, 128])
        .collect();
    let mut out = Vec::new();
    jpeg_encoder::Encoder::new(&mut out, 90)
        .encode(&rgb, width, height, jpeg_encoder::ColorType::Rgb)
        .expect("jpeg encode");
    out
}

pub fn jpeg_gray(width: u16, height: u16) -> Vec<u8> {
    let luma = vec![200u8; width as usize * height as usize];
    let mut out = Vec::new();
    jpeg_encoder::Encoder::new(&mut out, 90)
        .encode(&luma, width, height, jpeg_encoder::ColorType::Luma)
        .expect("jpeg encode");
    out
}

/// A flat CMYK JPEG; `color` picks plain CMYK or YCCK encoding.
pub fn jpeg_cmyk(
    width: u16,
    height: u16,
    ink: [u8; 4],
    color: jpeg_encoder::ColorType,
) -> anyhow::Result<Vec<u8>> {
    let cmyk = ink.repeat(width as usize * height as usize);
    let mut out = Vec::new();
    jpeg_encoder::Encoder::new(&mut out, 95)
        .encode(&cmyk, width, height, color)
        .with_context(|| format!("encode {width}x{height} {color:?} jpeg"))?;
    Ok(out)
}

/// Wraps a capability ([`NativeDecoder`] unless stated) and counts every allocation
/// and release.
#[derive(Debug, Default)]
pub struct CountingDecoder<D = NativeDecoder> {
    inner: D,
    pub infos: AtomicUsize,
    pub allocs: AtomicUsize,
    pub frees: AtomicUsize,
}

impl CountingDecoder {
    pub fn new() -> Arc<Self> {
        Self::wrapping(NativeDecoder::new())
    }
}

impl<D: DecodeCapability> CountingDecoder<D> {
    pub fn wrapping(inner: D) -> Arc<Self> {
        Arc::new(Self {
            inner,
            infos: AtomicUsize::new(0),
            allocs: AtomicUsize::new(0),
            frees: AtomicUsize::new(0),
        })
    }

    pub fn allocs(&self) -> usize {
        self.allocs.load(Ordering::SeqCst)
    }

    pub fn frees(&self) -> usize {
        self.frees.load(Ordering::SeqCst)
    }

    pub fn live(&self) -> usize {
        self.allocs() - self.frees()
    }
}

impl<D: DecodeCapability> DecodeCapability for CountingDecoder<D> {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn info(&self, bytes: &[u8]) -> Result<ImageInfo, DecodeFailure> {
        self.infos.fetch_add(1, Ordering::SeqCst);
        self.inner.info(bytes)
    }

    fn decode(&self, bytes: &[u8], desired_channels: u8) -> Result<PixelBlock, DecodeFailure> {
        let block = self.inner.decode(bytes, desired_channels)?;
        self.allocs.fetch_add(1, Ordering::SeqCst);
        Ok(block)
    }

    unsafe fn free(&self, block: PixelBlock) {
        self.frees.fetch_add(1, Ordering::SeqCst);
        unsafe { self.inner.free(block) }
    }
}

pub fn as_capability<D: DecodeCapability + 'static>(
    counter: &Arc<CountingDecoder<D>>,
) -> Arc<dyn DecodeCapability> {
    counter.clone()
}
