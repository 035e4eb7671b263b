// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core types for wall extraction: configuration, segments and wall primitives

use crate::error::{Error, Result};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Finest distance resolution accepted for the line detector (pixels)
pub const MIN_RHO: f64 = 0.1;
/// Finest angular resolution accepted for the line detector (radians)
pub const MIN_THETA: f64 = PI / 18_000.0;
/// Upper bound on accumulator cells for a single image
pub const MAX_ACCUMULATOR_CELLS: usize = 1 << 26;

/// Shape of the structuring element used for erosion and dilation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ElementShape {
    /// Diamond (L1 ball). Radius 1 is the 3x3 cross.
    Cross,
    /// Square (L-infinity ball). Radius 1 is the full 3x3 block.
    Square,
}

/// Structuring element for morphological thinning
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StructuringElement {
    pub shape: ElementShape,
    /// Distance from the centre to the edge, in pixels
    pub radius: u8,
}

impl StructuringElement {
    pub fn cross(radius: u8) -> Self {
        Self {
            shape: ElementShape::Cross,
            radius,
        }
    }

    pub fn square(radius: u8) -> Self {
        Self {
            shape: ElementShape::Square,
            radius,
        }
    }

}

impl Default for StructuringElement {
    fn default() -> Self {
        Self::cross(1)
    }
}

/// Parameters for the probabilistic Hough line detector
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HoughConfig {
    /// Distance resolution of the accumulator (pixels)
    pub rho: f64,
    /// Angular resolution of the accumulator (radians)
    pub theta: f64,
    /// Minimum accumulator votes before a line is traced
    pub threshold: u32,
    /// Minimum segment length to report (pixels)
    pub min_line_length: f64,
    /// Maximum run of missing pixels bridged along a segment
    pub max_line_gap: f64,
    /// Seed for the pixel visiting order
    pub seed: u64,
}

impl Default for HoughConfig {
    fn default() -> Self {
        Self {
            rho: 1.0,
            theta: PI / 180.0,
            threshold: 20,
            min_line_length: 20.0,
            max_line_gap: 10.0,
            seed: 0,
        }
    }
}

impl HoughConfig {
    /// Number of angle bins covering [0, pi)
    pub fn angle_bins(&self) -> usize {
        ((PI / self.theta).round() as usize).max(1)
    }

    /// Number of distance bins for an image of the given size
    pub fn distance_bins(&self, width: u32, height: u32) -> usize {
        let span = ((width as u64 + height as u64) * 2 + 1) as f64;
        ((span / self.rho).round() as usize).max(1)
    }

    /// Accumulator size for an image, rejected when above [`MAX_ACCUMULATOR_CELLS`]
    pub fn accumulator_cells(&self, width: u32, height: u32) -> Result<usize> {
        self.angle_bins()
            .checked_mul(self.distance_bins(width, height))
            .filter(|&cells| cells <= MAX_ACCUMULATOR_CELLS)
            .ok_or_else(|| {
                Error::InvalidConfig(format!(
                    "hough accumulator for a {}x{} image with rho {} and theta {} exceeds {} cells",
                    width, height, self.rho, self.theta, MAX_ACCUMULATOR_CELLS
                ))
            })
    }
}

/// Mapping from pixel space to world units
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProjectionConfig {
    /// World units per pixel
    pub scale: f64,
    /// Height given to every wall (world units)
    pub wall_height: f64,
    /// Thickness given to every wall (world units)
    pub wall_thickness: f64,
}

impl ProjectionConfig {
    /// Vertical centre of a wall standing on the ground plane
    pub fn elevation(&self) -> f64 {
        self.wall_height / 2.0
    }
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            scale: 0.02,
            wall_height: 2.0,
            wall_thickness: 0.2,
        }
    }
}

/// Configuration for the complete extraction pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Pixels with intensity strictly below this value are foreground
    pub threshold: u8,
    pub structuring_element: StructuringElement,
    pub hough: HoughConfig,
    pub projection: ProjectionConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            threshold: 128,
            structuring_element: StructuringElement::default(),
            hough: HoughConfig::default(),
            projection: ProjectionConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Check that every tunable is usable
    pub fn validate(&self) -> Result<()> {
        fn positive(name: &str, value: f64) -> Result<()> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(Error::InvalidConfig(format!(
                    "{} must be a positive finite number, got {}",
                    name, value
                )))
            }
        }

        fn non_negative(name: &str, value: f64) -> Result<()> {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(Error::InvalidConfig(format!(
                    "{} must be a non-negative finite number, got {}",
                    name, value
                )))
            }
        }

        if self.structuring_element.radius == 0 {
            return Err(Error::InvalidConfig(
                "structuring element radius must be at least 1".into(),
            ));
        }
        if self.hough.threshold == 0 {
            return Err(Error::InvalidConfig(
                "hough vote threshold must be at least 1".into(),
            ));
        }

        positive("hough.rho", self.hough.rho)?;
        positive("hough.theta", self.hough.theta)?;
        if self.hough.rho < MIN_RHO || self.hough.theta < MIN_THETA {
            return Err(Error::InvalidConfig(format!(
                "hough resolution too fine: rho {} (min {}), theta {} (min {})",
                self.hough.rho, MIN_RHO, self.hough.theta, MIN_THETA
            )));
        }
        if self.hough.theta > PI {
            return Err(Error::InvalidConfig(format!(
                "hough.theta must not exceed pi, got {}",
                self.hough.theta
            )));
        }
        non_negative("hough.min_line_length", self.hough.min_line_length)?;
        non_negative("hough.max_line_gap", self.hough.max_line_gap)?;
        positive("projection.scale", self.projection.scale)?;
        positive("projection.wall_height", self.projection.wall_height)?;
        positive("projection.wall_thickness", self.projection.wall_thickness)?;

        Ok(())
    }
}

/// Line segment reported by the detector, in integer pixel coordinates
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PixelSegment {
    pub start: (i32, i32),
    pub end: (i32, i32),
}

impl PixelSegment {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self {
            start: (x1, y1),
            end: (x2, y2),
        }
    }

    pub fn start_point(&self) -> Point2<f64> {
        Point2::new(self.start.0 as f64, self.start.1 as f64)
    }

    pub fn end_point(&self) -> Point2<f64> {
        Point2::new(self.end.0 as f64, self.end.1 as f64)
    }

    /// Euclidean length in pixels
    pub fn length(&self) -> f64 {
        nalgebra::distance(&self.start_point(), &self.end_point())
    }

    /// Larger of the horizontal and vertical spans, in pixels
    pub fn axis_extent(&self) -> i32 {
        (self.end.0 - self.start.0)
            .abs()
            .max((self.end.1 - self.start.1).abs())
    }

    /// Direction in image space (y down), in radians
    pub fn angle(&self) -> f64 {
        ((self.end.1 - self.start.1) as f64).atan2((self.end.0 - self.start.0) as f64)
    }

    pub fn midpoint(&self) -> Point2<f64> {
        nalgebra::center(&self.start_point(), &self.end_point())
    }
}

/// One detected wall as a box in world space
///
/// `size` is `[length, height, thickness]` and `rotation` is
/// `[0, yaw, 0]`. The caller owns the value once returned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WallPrimitive {
    pub id: String,
    pub position: [f64; 3],
    pub size: [f64; 3],
    pub rotation: [f64; 3],
}

impl WallPrimitive {
    pub fn length(&self) -> f64 {
        self.size[0]
    }

    pub fn yaw(&self) -> f64 {
        self.rotation[1]
    }
}
