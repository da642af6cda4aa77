use crate::capability::ImageInfo;
use crate::error::{Error, Result};
use log::warn;

/// How decoded pixels are presented to the runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BufferMode {
    /// The runtime buffer aliases the decoder's allocation; it is released when the
    /// buffer is collected. Peak memory is one pixel block.
    #[default]
    Alias,
    /// Pixels are copied once into runtime-owned storage and the decoder's block is
    /// released before the call returns. Peak memory is two pixel blocks.
    Copy,
}

impl BufferMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BufferMode::Alias => "zero-copy",
            BufferMode::Copy => "copy",
        }
    }
}

/// Optional safety caps checked before any pixel memory is allocated.
///
/// Both are unset by default: the decoder itself imposes no bound on input size or
/// announced dimensions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Limits {
    pub max_input_bytes: Option<usize>,
    pub max_pixels: Option<u64>,
}

impl Limits {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub(crate) fn check_input(&self, len: usize) -> Result<()> {
        match self.max_input_bytes {
            Some(limit) if len > limit => {
                warn!("rejecting {len}-byte input (limit {limit})");
                Err(Error::LimitExceeded {
                    what: "input size",
                    actual: len as u64,
                    limit: limit as u64,
                })
            }
            _ => Ok(()),
        }
    }

    pub(crate) fn check_info(&self, info: &ImageInfo) -> Result<()> {
        match self.max_pixels {
            Some(limit) if info.pixel_count() > limit => {
                warn!(
                    "rejecting {}x{} image (limit {limit} pixels)",
                    info.width, info.height
                );
                Err(Error::LimitExceeded {
                    what: "pixel count",
                    actual: info.pixel_count(),
                    limit,
                })
            }
            _ => Ok(()),
        }
    }
}

/// Per-installation decode settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    pub limits: Limits,
    pub buffer_mode: BufferMode,
}

impl DecodeOptions {
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_buffer_mode(mut self, mode: BufferMode) -> Self {
        self.buffer_mode = mode;
        self
    }
}
