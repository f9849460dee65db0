use std::{fs, path::PathBuf};

use anyhow::Context;
use clap::{ArgAction, Parser, ValueEnum};
use indexed_png::{inspect, IndexedPng};

/// Paint a test pattern into an 8-bit indexed PNG
#[derive(Parser)]
#[command(name = "paint", version, about)]
struct Args {
    /// Image width in pixels
    width: u32,

    /// Image height in pixels
    height: u32,

    /// Palette slots to reserve (1-256)
    #[arg(long, default_value_t = 16)]
    capacity: u16,

    /// Pattern to paint
    #[arg(long, value_enum, default_value_t = Pattern::Checker)]
    pattern: Pattern,

    /// Write the PNG to this file instead of printing a data URI
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log more (-v for info, -vv for debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum Pattern {
    Checker,
    Stripes,
    Gradient,
}

impl Pattern {
    fn paint(self, png: &mut IndexedPng) {
        match self {
            Pattern::Checker => {
                let dark = png.register_opaque(0x20, 0x20, 0x20);
                let light = png.register_opaque(0xe0, 0xe0, 0xe0);
                png.fill(|x, y| if (x / 8 + y / 8) % 2 == 0 { dark } else { light });
            }
            Pattern::Stripes => {
                let colors: Vec<u8> = [
                    (0xd7, 0x26, 0x1e),
                    (0xf4, 0xa2, 0x59),
                    (0x2a, 0x9d, 0x8f),
                    (0x26, 0x46, 0x53),
                ]
                .iter()
                .map(|&(red, green, blue)| png.register_opaque(red, green, blue))
                .collect();
                png.fill(|x, _| colors[(x / 4) as usize % colors.len()]);
            }
            Pattern::Gradient => {
                // Shades past the palette capacity fall back to slot 0.
                let shades: Vec<u8> = (0..=u8::MAX)
                    .map(|v| png.register_opaque(v, v, v))
                    .collect();
                let last = u64::from(png.width().max(2) - 1);
                png.fill(|x, _| shades[(u64::from(x) * 255 / last) as usize]);
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let verbosity = match args.verbose {
        0 => log::LevelFilter::Error,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    pretty_env_logger::formatted_builder()
        .filter_level(verbosity)
        .parse_default_env()
        .init();

    let mut png = IndexedPng::new(args.width, args.height, args.capacity)?;
    args.pattern.paint(&mut png);
    log::info!(
        "painted {}x{} image using {} of {} palette slots",
        png.width(),
        png.height(),
        png.palette_len(),
        png.palette_capacity()
    );

    match args.output {
        Some(path) => {
            let bytes = png.finalize();
            let summary = inspect::verify(&bytes).context("Encoded image failed verification")?;
            log::info!(
                "{} bytes, {} stored block(s), adler32 {:#010x}",
                bytes.len(),
                summary.stored_blocks,
                summary.adler32
            );
            fs::write(&path, bytes)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        None => println!("{}", png.to_data_uri()),
    }
    Ok(())
}
