// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Extract walls from a floor plan image and print them as JSON
//!
//! Usage: floorplan-walls <image> [options]

mod config;

use anyhow::{Context, Result};
use config::Options;
use floorplan_lite_vision::{
    extract_walls_with_fallback, trace_pipeline, walls_to_json, PixelSegment, WallPrimitive,
};
use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;
use std::path::Path;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(options) = Options::parse(&args)? else {
        print_usage();
        return Ok(());
    };

    let bytes = std::fs::read(&options.input)
        .with_context(|| format!("Failed to read image '{}'", options.input.display()))?;
    tracing::info!(
        path = %options.input.display(),
        bytes = bytes.len(),
        attempts = options.configs.len(),
        "Loaded floor plan"
    );

    let walls = extract_walls_with_fallback(&bytes, &options.configs)
        .context("Wall extraction failed")?;

    if let Some(dir) = &options.debug_dir {
        save_debug_images(&bytes, &options, dir)?;
    }

    let document = walls_to_json(&walls).context("Failed to serialize walls")?;
    let text = if options.pretty {
        serde_json::to_string_pretty(&document)?
    } else {
        serde_json::to_string(&document)?
    };

    match &options.output {
        Some(path) => {
            std::fs::write(path, text)
                .with_context(|| format!("Failed to write '{}'", path.display()))?;
            tracing::info!(path = %path.display(), walls = walls.len(), "Wrote walls");
        }
        None => println!("{}", text),
    }

    log_summary(&walls);
    Ok(())
}

fn log_summary(walls: &[WallPrimitive]) {
    let total: f64 = walls.iter().map(WallPrimitive::length).sum();
    tracing::info!(walls = walls.len(), total_length = total, "Done");
}

/// Save the skeleton and a segment overlay for the primary configuration
fn save_debug_images(bytes: &[u8], options: &Options, dir: &Path) -> Result<()> {
    let Some(config) = options.configs.first() else {
        return Ok(());
    };

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create '{}'", dir.display()))?;

    let trace = trace_pipeline(bytes, config)?;

    let binary_path = dir.join("binary.png");
    trace.binary.save(&binary_path)?;

    let skeleton_path = dir.join("skeleton.png");
    trace.skeleton.save(&skeleton_path)?;

    let overlay_path = dir.join("segments.png");
    draw_segments(&trace.gray, &trace.segments).save(&overlay_path)?;

    tracing::info!(
        dir = %dir.display(),
        iterations = trace.skeleton_iterations,
        segments = trace.segments.len(),
        "Saved debug images"
    );
    Ok(())
}

fn draw_segments(gray: &GrayImage, segments: &[PixelSegment]) -> RgbImage {
    let mut canvas = RgbImage::from_fn(gray.width(), gray.height(), |x, y| {
        let v = gray.get_pixel(x, y).0[0];
        Rgb([v, v, v])
    });

    let color = Rgb([255, 0, 0]);
    for segment in segments {
        let start = (segment.start.0 as f32, segment.start.1 as f32);
        let end = (segment.end.0 as f32, segment.end.1 as f32);
        draw_line_segment_mut(&mut canvas, start, end, color);
    }

    canvas
}

fn print_usage() {
    println!(
        r#"floorplan-walls - Extract 3D wall boxes from a floor plan image

USAGE:
    floorplan-walls <image> [options]

ARGUMENTS:
    <image>             Floor plan image (PNG, JPEG, BMP)

OPTIONS:
    --config <file>     JSON pipeline configuration
    --scale <value>     World units per pixel (default: 0.02)
    --threshold <0-255> Pixels darker than this are walls (default: 128)
    --output <file>     Write JSON here instead of stdout
    --pretty            Pretty-print the JSON document
    --fallback          Retry with looser detector settings when nothing is found
    --debug <dir>       Save binary, skeleton and segment overlay images
    -h, --help          Show this help message

ENVIRONMENT:
    FLOORPLAN_THRESHOLD, FLOORPLAN_SCALE, FLOORPLAN_WALL_HEIGHT,
    FLOORPLAN_WALL_THICKNESS, FLOORPLAN_HOUGH_THRESHOLD,
    FLOORPLAN_MIN_LINE_LENGTH, FLOORPLAN_MAX_LINE_GAP, FLOORPLAN_SEED
    RUST_LOG            Log filter (default: info)

OUTPUT:
    {{"walls": [{{"id", "position", "size", "rotation"}}, ...]}}

EXAMPLES:
    floorplan-walls plan.png --pretty
    floorplan-walls scan.jpg --threshold 100 --fallback --output walls.json
"#
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_segments_marks_pixels() {
        let gray = GrayImage::from_pixel(20, 20, image::Luma([200]));
        let canvas = draw_segments(&gray, &[PixelSegment::new(2, 5, 17, 5)]);

        assert_eq!(canvas.get_pixel(10, 5), &Rgb([255, 0, 0]));
        assert_eq!(canvas.get_pixel(10, 10), &Rgb([200, 200, 200]));
    }
}
