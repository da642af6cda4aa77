mod common;

use common::{
    CountingDecoder, as_capability, jpeg_cmyk, jpeg_gray, jpeg_rgb, pattern, png_rgb, png_rgba,
};
use jpeg_encoder::ColorType;
use pixelbridge::runtime::Object;
use pixelbridge::{
    BufferMode, DecodeOptions, Error, FUNCTION_NAME, GLOBAL_NAME, Limits, Runtime, Value,
    decode_via_global, install,
};

fn runtime_with(counter: &std::sync::Arc<CountingDecoder>, options: DecodeOptions) -> Runtime {
    let rt = Runtime::new();
    assert!(install(Some(&rt), as_capability(counter), options));
    rt
}

fn input(rt: &Runtime, bytes: &[u8]) -> Value {
    Value::from(rt.uint8_array_from(bytes))
}

#[test]
fn png_decodes_to_exact_rgba() {
    let counter = CountingDecoder::new();
    let rt = runtime_with(&counter, DecodeOptions::default());
    let rgba = pattern(7, 5, 3);

    let image = decode_via_global(&rt, &input(&rt, &png_rgba(7, 5, &rgba))).unwrap();
    assert_eq!((image.width, image.height), (7, 5));
    assert_eq!(image.data.len(), 7 * 5 * 4);
    assert_eq!(image.pixels(), rgba.as_slice());
}

#[test]
fn rgb_png_gains_opaque_alpha() {
    let counter = CountingDecoder::new();
    let rt = runtime_with(&counter, DecodeOptions::default());

    let image = decode_via_global(&rt, &input(&rt, &png_rgb(4, 4))).unwrap();
    assert_eq!(image.pixels().len(), 64);
    assert!(image.pixels().chunks_exact(4).all(|px| px[3] == 255));
    assert_eq!(&image.pixels()[..8], &[0, 1, 2, 255, 3, 4, 5, 255]);
}

#[test]
fn jpeg_decodes_to_declared_dimensions() {
    let counter = CountingDecoder::new();
    let rt = runtime_with(&counter, DecodeOptions::default());

    for bytes in [jpeg_rgb(33, 17), jpeg_gray(16, 9)] {
        let image = decode_via_global(&rt, &input(&rt, &bytes)).unwrap();
        assert!(image.width > 0 && image.height > 0);
        assert_eq!(image.pixels().len(), image.width as usize * image.height as usize * 4);
        assert!(image.pixels().chunks_exact(4).all(|px| px[3] == 255));
    }
    let gray = decode_via_global(&rt, &input(&rt, &jpeg_gray(16, 9))).unwrap();
    assert_eq!((gray.width, gray.height), (16, 9));
    assert!(gray.pixels().chunks_exact(4).all(|px| px[0] == px[1] && px[1] == px[2]));
}

fn near(px: &[u8], want: [u8; 4]) -> bool {
    px.iter().zip(want).all(|(&got, want)| got.abs_diff(want) <= 8)
}

#[test]
fn cmyk_jpeg_converts_ink_to_rgb() -> anyhow::Result<()> {
    let counter = CountingDecoder::new();
    let rt = runtime_with(&counter, DecodeOptions::default());

    let cases = [
        ([0, 0, 0, 0], [255, 255, 255, 255]),
        ([0, 0, 0, 255], [0, 0, 0, 255]),
        ([255, 0, 0, 0], [0, 255, 255, 255]),
        ([0, 255, 255, 0], [255, 0, 0, 255]),
    ];
    for color in [ColorType::Cmyk, ColorType::CmykAsYcck] {
        for (ink, rgba) in cases {
            let jpeg = jpeg_cmyk(8, 8, ink, color)?;
            let image = decode_via_global(&rt, &input(&rt, &jpeg))?;
            assert_eq!((image.width, image.height), (8, 8));
            assert!(
                image.pixels().chunks_exact(4).all(|px| near(px, rgba)),
                "{color:?} {ink:?}: got {:?}, want {rgba:?}",
                &image.pixels()[..4]
            );
        }
    }
    assert_eq!(counter.live(), 0);
    Ok(())
}

#[test]
fn result_object_has_data_width_height() {
    let counter = CountingDecoder::new();
    let rt = runtime_with(&counter, DecodeOptions::default());
    let bridge = rt.global().get_property(GLOBAL_NAME);
    let func = bridge.as_object().unwrap().get_property(FUNCTION_NAME);

    let arg = input(&rt, &png_rgba(2, 3, &pattern(2, 3, 0)));
    let result = rt.call(func.as_object().unwrap(), &bridge, &[arg]).unwrap();
    let result = result.as_object().unwrap();
    assert_eq!(result.get_property("width").as_number(), Some(2.0));
    assert_eq!(result.get_property("height").as_number(), Some(3.0));
    let data = result.get_property("data");
    let data = data.as_object().unwrap();
    assert_eq!(data.get_property("byteOffset").as_number(), Some(0.0));
    assert_eq!(data.get_property("byteLength").as_number(), Some(24.0));
    let buffer = data.get_property("buffer");
    assert!(buffer.as_object().unwrap().is_array_buffer());
}

#[test]
fn reads_only_the_view_window() {
    let counter = CountingDecoder::new();
    let rt = runtime_with(&counter, DecodeOptions::default());
    let png = png_rgba(3, 3, &pattern(3, 3, 9));

    let mut padded = vec![0xAA; 11];
    padded.extend_from_slice(&png);
    padded.extend_from_slice(&[0x55; 6]);
    let buffer = rt.new_array_buffer(padded.clone());
    let view = rt.new_uint8_array(&buffer, 11, Some(png.len())).unwrap();

    let image = decode_via_global(&rt, &Value::from(view)).unwrap();
    assert_eq!(image.pixels(), pattern(3, 3, 9).as_slice());
    // The input buffer is untouched.
    assert_eq!(buffer.array_buffer().unwrap().as_slice(), padded.as_slice());
}

#[test]
fn argument_errors_surface_as_script_exceptions() {
    let counter = CountingDecoder::new();
    let rt = runtime_with(&counter, DecodeOptions::default());

    for bad in [Value::Null, Value::from(42.0), Value::Undefined, Value::from(true)] {
        let err = decode_via_global(&rt, &bad).unwrap_err();
        assert_eq!(err.to_string(), "decodeImage requires a Uint8Array as first argument");
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    let no_buffer = Value::from(Object::new());
    let err = decode_via_global(&rt, &no_buffer).unwrap_err();
    assert_eq!(err.to_string(), "Failed to get ArrayBuffer from Uint8Array");

    let err = decode_via_global(&rt, &input(&rt, &[])).unwrap_err();
    assert_eq!(err, Error::EmptyInput);
    assert_eq!(err.to_string(), "Empty input ArrayBuffer");

    assert_eq!(counter.allocs(), 0);
}

#[test]
fn garbage_raises_decode_error_with_reason() {
    let counter = CountingDecoder::new();
    let rt = runtime_with(&counter, DecodeOptions::default());

    let err = decode_via_global(&rt, &input(&rt, b"this is not an image")).unwrap_err();
    assert_eq!(
        err.to_string(),
        "stb_image failed to decode image (unknown image type)"
    );
    assert!(matches!(err, Error::Decode { .. }));
}

#[test]
fn truncated_images_fail_without_leaking() {
    let counter = CountingDecoder::new();
    let rt = runtime_with(&counter, DecodeOptions::default());
    let png = png_rgba(32, 32, &pattern(32, 32, 1));
    let jpeg = jpeg_rgb(32, 32);

    for bytes in [&png[..png.len() / 2], &jpeg[..20]] {
        let err = decode_via_global(&rt, &input(&rt, bytes)).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }), "{err:?}");
    }
    assert_eq!(counter.live(), 0);
}

#[test]
fn repeated_calls_are_independent_and_identical() {
    let counter = CountingDecoder::new();
    let rt = runtime_with(&counter, DecodeOptions::default());
    let arg = input(&rt, &jpeg_rgb(20, 12));

    let first = decode_via_global(&rt, &arg).unwrap();
    let second = decode_via_global(&rt, &arg).unwrap();
    assert_eq!((first.width, first.height), (second.width, second.height));
    assert_eq!(first.pixels(), second.pixels());
    assert!(!first.data.buffer().ptr_eq(second.data.buffer()));
    assert_ne!(first.pixels().as_ptr(), second.pixels().as_ptr());
    assert_eq!(counter.allocs(), 2);
}

#[test]
fn input_limit_rejects_before_decoding() {
    let counter = CountingDecoder::new();
    let png = png_rgba(4, 4, &pattern(4, 4, 0));
    let options = DecodeOptions::default().with_limits(Limits {
        max_input_bytes: Some(png.len() - 1),
        ..Limits::default()
    });
    let rt = runtime_with(&counter, options);

    let err = decode_via_global(&rt, &input(&rt, &png)).unwrap_err();
    assert!(matches!(err, Error::LimitExceeded { what: "input size", .. }));
    assert_eq!(counter.allocs(), 0);
}

#[test]
fn pixel_limit_uses_header_probe() {
    let counter = CountingDecoder::new();
    let options = DecodeOptions::default().with_limits(Limits {
        max_pixels: Some(64),
        ..Limits::default()
    });
    let rt = runtime_with(&counter, options);

    let ok = decode_via_global(&rt, &input(&rt, &png_rgba(8, 8, &pattern(8, 8, 0)))).unwrap();
    assert_eq!(ok.width * ok.height, 64);

    let err = decode_via_global(&rt, &input(&rt, &png_rgba(9, 8, &pattern(9, 8, 0)))).unwrap_err();
    assert_eq!(
        err,
        Error::LimitExceeded {
            what: "pixel count",
            actual: 72,
            limit: 64
        }
    );
    assert_eq!(counter.allocs(), 1);
    assert_eq!(counter.infos.load(std::sync::atomic::Ordering::SeqCst), 2);
}

#[test]
fn copy_mode_returns_equal_pixels() {
    let counter = CountingDecoder::new();
    let rgba = pattern(6, 2, 77);
    let png = png_rgba(6, 2, &rgba);

    let alias_rt = runtime_with(&counter, DecodeOptions::default());
    let copy_rt = runtime_with(
        &counter,
        DecodeOptions::default().with_buffer_mode(BufferMode::Copy),
    );
    let aliased = decode_via_global(&alias_rt, &input(&alias_rt, &png)).unwrap();
    let copied = decode_via_global(&copy_rt, &input(&copy_rt, &png)).unwrap();
    assert_eq!(aliased.pixels(), copied.pixels());
    assert_eq!(copied.pixels(), rgba.as_slice());
}
