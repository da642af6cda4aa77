//! Zero-copy JPEG/PNG decoding for script runtimes.
//!
//! A script hands `RNImageDecoder.decodeImage` a `Uint8Array`; the bridge reads the
//! compressed bytes in place, decodes them with a [`DecodeCapability`] that allocates
//! outside the runtime heap, and returns `{ data, width, height }` where `data` aliases
//! the decoder's allocation. That allocation is released exactly once, when the runtime
//! collects the last reference to `data`.
//!
//! - [`install`] registers the bridge on a [`Runtime`]'s global object.
//! - [`decode_image`] is the bridge function body; [`decode_pixels`] is the runtime-free
//!   core, safe to call from many threads at once.
//! - [`OwnedPixels`] is the single owner of a decoded block; [`wrap_pixels`] lends it to
//!   the runtime.
//! - [`NativeDecoder`] decodes in pure Rust; `StbImage` (feature `stb`) goes through
//!   `stb_image` via `sys`.
//!
//! See `pixelbridge-probe` for a command-line driver.

/// Low-level bindings to `stb_image`, available with the `stb` feature.
#[cfg(feature = "stb")]
pub use stbi_sys as sys;

mod adapter;
mod bridge;
mod capability;
mod client;
mod config;
mod error;
mod install;
mod native;
mod pixels;
pub mod runtime;
#[cfg(feature = "stb")]
mod stb;

pub use adapter::{copied_array_buffer, wrap_pixels, zero_copy_array_buffer};
pub use bridge::{decode_image, decode_pixels};
pub use capability::{DecodeCapability, DecodeFailure, ImageInfo, PixelBlock, RGBA_CHANNELS};
pub use client::{DecodedImage, decode_via_global};
pub use config::{BufferMode, DecodeOptions, Limits};
pub use error::{Error, Result};
pub use install::{FUNCTION_NAME, GLOBAL_NAME, default_capability, install, install_default};
pub use native::NativeDecoder;
pub use pixels::OwnedPixels;
pub use runtime::{Runtime, Value};
#[cfg(feature = "stb")]
pub use stb::StbImage;
