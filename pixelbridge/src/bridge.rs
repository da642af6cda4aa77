use crate::adapter::wrap_pixels;
use crate::capability::{DecodeCapability, RGBA_CHANNELS};
use crate::config::DecodeOptions;
use crate::error::{
    Error, MISSING_ARRAY_BUFFER, REQUIRES_UINT8ARRAY, Result, VIEW_OUT_OF_BOUNDS, check,
};
use crate::pixels::OwnedPixels;
use crate::runtime::{ArrayBuffer, Object, Runtime, Value};
use log::debug;
use std::sync::Arc;

/// Compressed bytes borrowed from a script buffer for the length of one call.
struct CompressedView {
    buffer: ArrayBuffer,
    offset: usize,
    len: usize,
}

impl CompressedView {
    fn resolve(input: &Object) -> Result<Self> {
        let buffer_val = input.get_property("buffer");
        let buffer = buffer_val
            .as_object()
            .and_then(Object::array_buffer)
            .ok_or_else(|| Error::invalid_argument(MISSING_ARRAY_BUFFER))?
            .clone();
        let offset = view_index(&input.get_property("byteOffset"))?;
        let len = view_index(&input.get_property("byteLength"))?;
        // Emptiness wins over a stale offset.
        if len == 0 {
            return Err(Error::EmptyInput);
        }
        let end = offset
            .checked_add(len)
            .ok_or_else(|| Error::invalid_argument(VIEW_OUT_OF_BOUNDS))?;
        if end > buffer.size() {
            return Err(Error::invalid_argument(VIEW_OUT_OF_BOUNDS));
        }
        Ok(Self {
            buffer,
            offset,
            len,
        })
    }

    fn as_slice(&self) -> &[u8] {
        &self.buffer.as_slice()[self.offset..self.offset + self.len]
    }
}

fn view_index(value: &Value) -> Result<usize> {
    match value.as_number() {
        Some(n) if n.is_finite() && n >= 0.0 && n.fract() == 0.0 && n <= usize::MAX as f64 => {
            Ok(n as usize)
        }
        _ => Err(Error::invalid_argument(REQUIRES_UINT8ARRAY)),
    }
}

/// Decode `bytes` into a native RGBA block owned by `capability`.
///
/// Limits are enforced before the pixel allocation. Any block allocated on a failing
/// path is released before the error is returned.
pub fn decode_pixels(
    capability: &Arc<dyn DecodeCapability>,
    bytes: &[u8],
    options: &DecodeOptions,
) -> Result<OwnedPixels> {
    if bytes.is_empty() {
        return Err(Error::EmptyInput);
    }
    options.limits.check_input(bytes.len())?;
    if options.limits.max_pixels.is_some() {
        let info = check(capability.info(bytes))?;
        options.limits.check_info(&info)?;
    }

    let block = check(capability.decode(bytes, RGBA_CHANNELS))?;
    let pixels = OwnedPixels::new(block, Arc::clone(capability));
    if pixels.is_empty() {
        return Err(Error::decode("image has zero width or height"));
    }
    Ok(pixels)
}

/// Body of `decodeImage(input)`.
///
/// Reads the compressed bytes in place, decodes them, and returns
/// `{ data: Uint8Array, width, height }` whose `data` is backed per `options.buffer_mode`.
pub fn decode_image(
    rt: &Runtime,
    args: &[Value],
    capability: &Arc<dyn DecodeCapability>,
    options: &DecodeOptions,
) -> Result<Value> {
    let input = args
        .first()
        .and_then(Value::as_object)
        .ok_or_else(|| Error::invalid_argument(REQUIRES_UINT8ARRAY))?;
    let view = CompressedView::resolve(input)?;

    let pixels = decode_pixels(capability, view.as_slice(), options)?;
    let (width, height, size) = (pixels.width(), pixels.height(), pixels.len());
    debug!(
        "decoded {}x{} ({} bytes in, {} bytes out) via {}, {}",
        width,
        height,
        view.len,
        size,
        capability.name(),
        options.buffer_mode.as_str()
    );

    let buffer = wrap_pixels(Arc::new(pixels), size, options.buffer_mode)?;
    let buffer = rt.array_buffer_object(buffer);
    let data = rt.new_uint8_array(&buffer, 0, None)?;

    let result = Object::new();
    result.set_property("data", data);
    result.set_property("width", width);
    result.set_property("height", height);
    Ok(Value::Object(result))
}
