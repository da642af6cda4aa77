//! Raw bindings to `stb_image`, restricted to the in-memory JPEG/PNG entry points.
//!
//! Generated by `bindgen` at build time. Use the safe `pixelbridge` crate instead of
//! calling these directly.
//!
//! When the stb sources cannot be found the build script emits a warning and no
//! bindings are generated.

#![allow(non_upper_case_globals, non_camel_case_types, non_snake_case)]

#[cfg(not(stbi_unavailable))]
include!(concat!(env!("OUT_DIR"), "/bindings.rs"));

/// Number of interleaved channels requested for RGBA output.
pub const STBI_RGB_ALPHA: i32 = 4;
