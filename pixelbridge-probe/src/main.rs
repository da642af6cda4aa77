use std::fs;

use anyhow::{Context, Result, ensure};
use clap::Parser;
use log::debug;
use pixelbridge::{DecodedImage, Runtime, Value, decode_via_global, default_capability, install};

mod cli;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    init_logging(args.verbose);
    run(&args)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run(args: &cli::Cli) -> Result<()> {
    let bytes = fs::read(&args.input)
        .with_context(|| format!("Failed to read input {}", args.input.display()))?;
    let input_len = bytes.len();

    let rt = Runtime::new();
    let options = args.options();
    ensure!(
        install(Some(&rt), default_capability(), options),
        "Failed to install the decode bridge"
    );

    // Hand the file to the runtime without copying it again.
    let buffer = rt.new_array_buffer(bytes);
    let input = Value::from(rt.new_uint8_array(&buffer, 0, None)?);

    let first = decode(&rt, &input, args)?;
    for round in 1..args.repeat {
        let again = decode(&rt, &input, args)?;
        ensure!(
            (again.width, again.height) == (first.width, first.height)
                && again.pixels() == first.pixels(),
            "Decode #{} of {} disagreed with the first result",
            round + 1,
            args.input.display()
        );
        debug!("decode #{} matched", round + 1);
    }

    println!(
        "{}: {}x{} RGBA, {} bytes in, {} bytes out ({})",
        args.input.display(),
        first.width,
        first.height,
        input_len,
        first.pixels().len(),
        options.buffer_mode.as_str()
    );

    if let Some(out) = &args.out_raw {
        fs::write(out, first.pixels())
            .with_context(|| format!("Failed to write output {}", out.display()))?;
        println!("Wrote {}", out.display());
    }
    Ok(())
}

fn decode(rt: &Runtime, input: &Value, args: &cli::Cli) -> Result<DecodedImage> {
    decode_via_global(rt, input).with_context(|| format!("Failed to decode {}", args.input.display()))
}
