use crate::error::{Error, Result};
use crate::install::{FUNCTION_NAME, GLOBAL_NAME};
use crate::runtime::{Runtime, Uint8Array, Value};
use std::slice;

/// A validated `{data, width, height}` result.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub data: Uint8Array,
    pub width: u32,
    pub height: u32,
}

impl DecodedImage {
    /// Check that `value` has the shape `decodeImage` promises.
    pub fn from_value(value: &Value) -> Result<Self> {
        let obj = value.as_object().ok_or(Error::InvalidResult)?;
        let data = obj.get_property("data");
        let data = data
            .as_object()
            .and_then(|d| d.uint8_array())
            .ok_or(Error::InvalidResult)?
            .clone();
        let width = dimension(&obj.get_property("width"))?;
        let height = dimension(&obj.get_property("height"))?;
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// RGBA8888 pixels, row-major.
    pub fn pixels(&self) -> &[u8] {
        self.data.as_slice()
    }
}

fn dimension(value: &Value) -> Result<u32> {
    match value.as_number() {
        Some(n) if n.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&n) => Ok(n as u32),
        _ => Err(Error::InvalidResult),
    }
}

/// Call `RNImageDecoder.decodeImage(input)` the way script code does.
///
/// Fails with [`Error::NotInstalled`] when the bridge is missing and with
/// [`Error::InvalidResult`] when it returns something unexpected; exceptions raised by
/// the bridge come back as their typed [`Error`].
pub fn decode_via_global(rt: &Runtime, input: &Value) -> Result<DecodedImage> {
    let bridge = rt.global().get_property(GLOBAL_NAME);
    let func = bridge
        .as_object()
        .map(|b| b.get_property(FUNCTION_NAME))
        .and_then(|f| f.as_object().cloned())
        .filter(|f| f.is_function())
        .ok_or(Error::NotInstalled)?;
    let result = rt.call(&func, &bridge, slice::from_ref(input))?;
    DecodedImage::from_value(&result)
}
