use crate::bridge::decode_image;
use crate::capability::DecodeCapability;
use crate::config::DecodeOptions;
use crate::runtime::{JsError, Object, Runtime};
use log::{debug, warn};
use std::sync::Arc;

/// Global object scripts look the bridge up on.
pub const GLOBAL_NAME: &str = "RNImageDecoder";
/// Method installed on [`GLOBAL_NAME`].
pub const FUNCTION_NAME: &str = "decodeImage";

/// The capability used when none is given: `stb_image` when the `stb` feature is on,
/// the pure-Rust decoder otherwise.
pub fn default_capability() -> Arc<dyn DecodeCapability> {
    #[cfg(feature = "stb")]
    {
        Arc::new(crate::stb::StbImage::new())
    }
    #[cfg(not(feature = "stb"))]
    {
        Arc::new(crate::native::NativeDecoder::new())
    }
}

/// Register `RNImageDecoder.decodeImage` on the runtime's global object.
///
/// Installing again replaces the previous binding. Without a runtime this logs and
/// returns `false`; nothing is raised into script.
pub fn install(
    rt: Option<&Runtime>,
    capability: Arc<dyn DecodeCapability>,
    options: DecodeOptions,
) -> bool {
    let Some(rt) = rt else {
        warn!("no runtime available; {GLOBAL_NAME}.{FUNCTION_NAME} not installed");
        return false;
    };

    let backend = capability.name();
    let decode = rt.create_function(FUNCTION_NAME, 1, move |rt, _this, args| {
        decode_image(rt, args, &capability, &options).map_err(JsError::from)
    });

    let namespace = Object::new();
    namespace.set_property(FUNCTION_NAME, decode);
    rt.global().set_property(GLOBAL_NAME, namespace);
    debug!(
        "installed {GLOBAL_NAME}.{FUNCTION_NAME} ({backend}, {})",
        options.buffer_mode.as_str()
    );
    true
}

/// [`install`] with [`default_capability`] and default options.
pub fn install_default(rt: Option<&Runtime>) -> bool {
    install(rt, default_capability(), DecodeOptions::default())
}
