use anyhow::Context;
use clap::{ArgAction, Parser};
use indexed_png::{inspect, IndexedPng};
use std::{fs, path::PathBuf};

/// Render a fixed set of images, verify each one and record the results
#[derive(Parser)]
#[command(name = "visual-bench", about)]
struct Args {
    /// Directory receiving the images and test_results.json
    #[arg(long, default_value = "benchmark")]
    output_dir: PathBuf,

    /// Log more (-v for info, -vv for debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Name, width, height and palette capacity of every rendered image.
const CASES: &[(&str, u32, u32, u16)] = &[
    ("single-pixel", 1, 1, 1),
    ("checkerboard", 2, 2, 4),
    // 65534 pixels plus the filter byte fill exactly one stored block.
    ("one-full-block", 65534, 1, 2),
    ("block-boundary", 65535, 1, 2),
    ("multi-block", 300, 300, 64),
    ("palette-overflow", 64, 64, 8),
];

/// Diagonal bands over 16 colors, so small palettes overflow.
fn paint(png: &mut IndexedPng) {
    let bands: Vec<u8> = (0..16u8)
        .map(|i| png.register_opaque(i * 16, 255 - i * 16, i.wrapping_mul(37)))
        .collect();
    png.fill(|x, y| bands[((x / 4 + y / 4) % 16) as usize]);
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let verbosity = match args.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    pretty_env_logger::formatted_builder()
        .filter_level(verbosity)
        .parse_default_env()
        .init();

    let output_dir = args.output_dir;
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let mut processed_images = Vec::with_capacity(CASES.len());
    for &(name, width, height, capacity) in CASES {
        let mut png = IndexedPng::new(width, height, capacity)
            .with_context(|| format!("Failed to lay out {name}"))?;
        paint(&mut png);
        let bytes = png.finalize();
        let summary = inspect::verify(&bytes)
            .with_context(|| format!("{name} failed verification"))?;
        let file_name = output_dir.join(format!("{name}.png"));
        fs::write(&file_name, &bytes)
            .with_context(|| format!("Failed to write {}", file_name.display()))?;
        log::info!(
            "{name}: {} bytes in {} stored block(s)",
            bytes.len(),
            summary.stored_blocks
        );
        processed_images.push(serde_json::json!({
            "name": name,
            "width": width,
            "height": height,
            "palette_capacity": capacity,
            "palette_len": png.palette_len(),
            "bytes": bytes.len(),
            "stored_blocks": summary.stored_blocks,
            "adler32": format!("{:#010x}", summary.adler32),
        }));
    }

    let now = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Iso8601::DEFAULT)?;
    let results = serde_json::json!({
        "date": now,
        "processed_images": processed_images,
    });
    fs::write(output_dir.join("test_results.json"), results.to_string())?;
    Ok(())
}
