//! JMOV CLI - Inspect, dump and synthesize JMOV containers.

use std::error::Error;
use std::path::Path;
use std::time::Instant;

use jmov::{ContainerConfig, VideoReader, VideoWriter};
use ndarray::Array3;

type CliResult = Result<(), Box<dyn Error>>;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map_or("jmov", String::as_str);

    let result = match (args.get(1).map(String::as_str), args.len()) {
        (Some("info"), 3) => info(&args[2]),
        (Some("frame"), 4) => frame(&args[2], &args[3]),
        (Some("synth"), 6 | 7) => synth(&args[2..]),
        _ => {
            print_usage(program);
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} <command> [arguments]", program);
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  info <file>                                  Print container header");
    eprintln!("  frame <file> <index>                         Print one frame as JSON");
    eprintln!("  synth <file> <width> <height> <frames> [fps] Write a test pattern");
    eprintln!();
    eprintln!("Set RUST_LOG=debug for diagnostic output.");
}

fn info(path: &str) -> CliResult {
    let reader = VideoReader::open(path)?;
    let header = reader.header();
    let data_bytes = header.frame_count * reader.frame_byte_length() as u64;

    println!("File: {}", reader.path().display());
    println!("Dimensions: {}", header.dimension_count());
    println!("Shape: {:?}", header.shape);
    println!("Frame rate: {} fps", header.frame_rate);
    println!("Frames: {}", header.frame_count);
    println!(
        "Duration: {:.3}s",
        header.frame_count as f64 / f64::from(header.frame_rate)
    );
    println!("Header: {} bytes", reader.header_byte_length());
    println!("Frame size: {} bytes", reader.frame_byte_length());
    println!("Frame data: {} bytes", data_bytes);
    Ok(())
}

fn frame(path: &str, index: &str) -> CliResult {
    let index: u64 = index
        .parse()
        .map_err(|e| format!("invalid frame index {:?}: {}", index, e))?;

    let mut reader = VideoReader::open(path)?;
    let frame = reader.read_frame(index)?;
    println!("{}", serde_json::to_string(&frame)?);
    Ok(())
}

/// Write a moving RGB gradient. `args` is `<file> <width> <height> <frames> [fps]`.
fn synth(args: &[String]) -> CliResult {
    let width: u32 = parse_arg(&args[1], "width")?;
    let height: u32 = parse_arg(&args[2], "height")?;
    let frames: u32 = parse_arg(&args[3], "frames")?;
    let fps: u32 = match args.get(4) {
        Some(s) => parse_arg(s, "fps")?,
        None => 30,
    };

    let mut writer = VideoWriter::create(&args[0], ContainerConfig::new([height, width, 3], fps))?;

    let start = Instant::now();
    for t in 0..frames as usize {
        let raster = Array3::from_shape_fn(
            (height as usize, width as usize, 3),
            |(y, x, c)| match c {
                0 => (x + t) as u8,
                1 => (y + t) as u8,
                _ => (x + y) as u8,
            },
        );
        writer.append(&raster)?;
    }
    writer.close()?;

    let elapsed = start.elapsed();
    println!(
        "Wrote {} frames of {}x{} to {} in {:.2}s",
        writer.frame_count(),
        width,
        height,
        writer.path().unwrap_or(Path::new(&args[0])).display(),
        elapsed.as_secs_f32()
    );
    Ok(())
}

fn parse_arg(value: &str, name: &str) -> Result<u32, String> {
    value
        .parse()
        .map_err(|e| format!("invalid {} {:?}: {}", name, value, e))
}
