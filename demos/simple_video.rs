//! Example: Convert a video to a character-art video using charvid as a library
//!
//! Run with: cargo run --example simple_video

use charvid::{ColorMode, ConvertOptions, Converter};
use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let converter = Converter::new();

    let options = ConvertOptions::default()
        .with_columns(120)
        .with_fps(10)
        .with_mode(ColorMode::Color);

    let input = Path::new("tests/video/input/test.mkv");

    if input.exists() {
        println!("Converting video to character art...");
        let report = converter.convert(input, None, &options)?;
        println!(
            "✓ Wrote {} frames to {}",
            report.frame_count,
            report.output.display()
        );
        println!(
            "Grid {}x{} characters, canvas {}x{} pixels",
            report.grid.columns, report.grid.rows, report.canvas_size.0, report.canvas_size.1
        );
    } else {
        println!("Note: {} not found.", input.display());
        println!("To use this example, provide a video file at that path.");
    }

    Ok(())
}
