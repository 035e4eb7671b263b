// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wall extraction from raster floor plans
//!
//! This crate turns an image of a hand-drawn or scanned floor plan into
//! straight wall boxes ready to place in a 3D scene:
//! 1. Decode the image buffer to a grayscale grid
//! 2. Binarize it so dark strokes become foreground
//! 3. Thin the foreground to its morphological skeleton
//! 4. Detect straight segments with a probabilistic Hough transform and
//!    project each one into a scaled wall primitive
//!
//! Data flows strictly forward and no state survives a call, so independent
//! calls may run on separate threads.
//!
//! # Usage
//!
//! ```rust,ignore
//! use floorplan_lite_vision::{extract_walls, PipelineConfig};
//!
//! let bytes = std::fs::read("plan.png")?;
//! let walls = extract_walls(&bytes, &PipelineConfig::default())?;
//! for wall in &walls {
//!     println!("{} at {:?}", wall.id, wall.position);
//! }
//! ```

pub mod decoder;
pub mod error;
pub mod image_ops;
pub mod line_ops;
pub mod projection;
pub mod skeleton;
pub mod types;

// Re-export commonly used types and functions
pub use decoder::{decode, rgba_to_grayscale};
pub use error::{Error, Result};
pub use image_ops::binarize_inverted;
pub use line_ops::detect_segments;
pub use projection::{project_segment, project_segments};
pub use skeleton::{skeletonize, skeletonize_with_stats};
pub use types::{
    ElementShape, HoughConfig, PipelineConfig, PixelSegment, ProjectionConfig,
    StructuringElement, WallPrimitive,
};

use image::GrayImage;
use serde::Serialize;

/// Every intermediate product of one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineTrace {
    pub gray: GrayImage,
    pub binary: GrayImage,
    pub skeleton: GrayImage,
    pub skeleton_iterations: usize,
    pub segments: Vec<PixelSegment>,
    pub walls: Vec<WallPrimitive>,
}

/// Extract wall primitives from an encoded image
///
/// Returns [`Error::Decode`] when the buffer is not a readable image. A
/// readable image with nothing wall-like in it yields an empty list.
pub fn extract_walls(bytes: &[u8], config: &PipelineConfig) -> Result<Vec<WallPrimitive>> {
    config.validate()?;
    let gray = decoder::decode(bytes)?;
    check_image_fits(&gray, config)?;
    Ok(run_stages(gray, config).walls)
}

/// Extract wall primitives from an already decoded grayscale image
pub fn extract_walls_from_gray(
    gray: &GrayImage,
    config: &PipelineConfig,
) -> Result<Vec<WallPrimitive>> {
    config.validate()?;
    check_image_fits(gray, config)?;
    Ok(run_stages(gray.clone(), config).walls)
}

/// Extract wall primitives from raw RGBA pixels (4 bytes per pixel)
pub fn extract_walls_from_rgba(
    rgba: &[u8],
    width: u32,
    height: u32,
    config: &PipelineConfig,
) -> Result<Vec<WallPrimitive>> {
    config.validate()?;
    let gray = decoder::rgba_to_grayscale(rgba, width, height)?;
    check_image_fits(&gray, config)?;
    Ok(run_stages(gray, config).walls)
}

/// Try configurations in order and keep the first that finds walls
///
/// The image is decoded once; a decode failure is returned immediately.
/// Configurations that fail validation for this image are skipped. If none
/// finds anything the result is an empty list. An empty slice means the
/// default configuration.
pub fn extract_walls_with_fallback(
    bytes: &[u8],
    configs: &[PipelineConfig],
) -> Result<Vec<WallPrimitive>> {
    let gray = decoder::decode(bytes)?;

    if configs.is_empty() {
        return Ok(run_stages(gray, &PipelineConfig::default()).walls);
    }

    for (attempt, config) in configs.iter().enumerate() {
        if let Err(e) = config.validate().and_then(|_| check_image_fits(&gray, config)) {
            tracing::warn!(attempt, error = %e, "Skipping invalid configuration");
            continue;
        }

        let walls = run_stages(gray.clone(), config).walls;
        if !walls.is_empty() {
            tracing::info!(attempt, walls = walls.len(), "Configuration produced walls");
            return Ok(walls);
        }
        tracing::debug!(attempt, "Configuration produced no walls");
    }

    Ok(Vec::new())
}

/// Run the pipeline and keep every intermediate for inspection
pub fn trace_pipeline(bytes: &[u8], config: &PipelineConfig) -> Result<PipelineTrace> {
    config.validate()?;
    let gray = decoder::decode(bytes)?;
    check_image_fits(&gray, config)?;
    Ok(run_stages(gray, config))
}

fn check_image_fits(gray: &GrayImage, config: &PipelineConfig) -> Result<()> {
    config
        .hough
        .accumulator_cells(gray.width(), gray.height())
        .map(|_| ())
}

fn run_stages(gray: GrayImage, config: &PipelineConfig) -> PipelineTrace {
    let binary = image_ops::binarize_inverted(&gray, config.threshold);
    tracing::debug!(
        width = binary.width(),
        height = binary.height(),
        foreground = image_ops::count_foreground(&binary),
        threshold = config.threshold,
        "Binarized image"
    );

    let skeleton = skeleton::skeletonize_with_stats(&binary, &config.structuring_element);
    let segments = line_ops::detect_segments(&skeleton.mask, &config.hough);
    let walls = projection::project_segments(&segments, &config.projection);

    tracing::info!(
        segments = segments.len(),
        walls = walls.len(),
        "Wall extraction complete"
    );

    PipelineTrace {
        gray,
        binary,
        skeleton: skeleton.mask,
        skeleton_iterations: skeleton.iterations,
        segments,
        walls,
    }
}

#[derive(Serialize)]
struct WallsDocument<'a> {
    walls: &'a [WallPrimitive],
}

/// Wrap walls in the `{"walls": [...]}` document handed to scene clients
///
/// Serializer errors are returned to the caller rather than replaced by an
/// empty document.
pub fn walls_to_json(walls: &[WallPrimitive]) -> serde_json::Result<serde_json::Value> {
    serde_json::to_value(WallsDocument { walls })
}
