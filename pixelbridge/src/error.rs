use crate::capability::DecodeFailure;
use crate::runtime::JsError;
use thiserror::Error;

pub(crate) const REQUIRES_UINT8ARRAY: &str = "decodeImage requires a Uint8Array as first argument";
pub(crate) const MISSING_ARRAY_BUFFER: &str = "Failed to get ArrayBuffer from Uint8Array";
pub(crate) const VIEW_OUT_OF_BOUNDS: &str = "Uint8Array view exceeds its ArrayBuffer";

/// Error produced by the decode bridge. `Display` yields the message scripts see.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The argument is not a byte view with a resolvable buffer.
    #[error("{0}")]
    InvalidArgument(&'static str),
    /// The byte view resolved to zero bytes.
    #[error("Empty input ArrayBuffer")]
    EmptyInput,
    /// The decode capability rejected the bytes.
    #[error("stb_image failed to decode image ({reason})")]
    Decode { reason: String },
    /// Native allocation failed while decoding or wrapping.
    #[error("out of memory while decoding image")]
    Alloc,
    /// A configured safety limit rejected the input before decoding.
    #[error("decodeImage {what} limit exceeded ({actual} > {limit})")]
    LimitExceeded {
        what: &'static str,
        actual: u64,
        limit: u64,
    },
    /// `RNImageDecoder.decodeImage` is missing from the global object.
    #[error("RNImageDecoder JSI function not installed. Make sure install() ran on this runtime.")]
    NotInstalled,
    /// The bridge returned something other than `{data, width, height}`.
    #[error("Invalid result from native decodeImage")]
    InvalidResult,
    /// Any other exception raised by the runtime.
    #[error("{0}")]
    Script(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn alloc() -> Self {
        Self::Alloc
    }

    pub(crate) fn invalid_argument(msg: &'static str) -> Self {
        Self::InvalidArgument(msg)
    }

    pub(crate) fn decode(reason: impl Into<String>) -> Self {
        Self::Decode {
            reason: reason.into(),
        }
    }
}

impl From<JsError> for Error {
    fn from(err: JsError) -> Self {
        match err.cause() {
            Some(cause) => cause.clone(),
            None => Error::Script(err.message().to_string()),
        }
    }
}

/// Translate a capability outcome into a crate result.
pub(crate) fn check<T>(outcome: std::result::Result<T, DecodeFailure>) -> Result<T> {
    match outcome {
        Ok(value) => Ok(value),
        Err(DecodeFailure::OutOfMemory) => Err(Error::alloc()),
        Err(DecodeFailure::Rejected(reason)) => {
            let reason = reason.filter(|r| !r.is_empty());
            Err(Error::decode(reason.unwrap_or_else(|| "unknown error".to_string())))
        }
    }
}
