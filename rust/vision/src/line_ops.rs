// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Line segment detection on skeleton masks
//!
//! Progressive probabilistic Hough transform. Foreground pixels are visited
//! in a seeded random order and vote one at a time; as soon as a bin reaches
//! the vote threshold, the line is traced through the mask from the voting
//! pixel, bridging short gaps. Pixels on a traced line are consumed so they
//! cannot support another line, and their votes are withdrawn when the line
//! is long enough to report. A line is long enough when its horizontal or
//! vertical span reaches the minimum length.

use crate::image_ops::BACKGROUND;
use crate::types::{HoughConfig, PixelSegment};
use image::GrayImage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Detect straight segments on a skeleton mask
///
/// Segments are returned in detection order. An empty mask, or one without
/// enough collinear support, yields no segments. A configuration whose
/// accumulator would not fit [`crate::types::MAX_ACCUMULATOR_CELLS`] also
/// yields nothing; the pipeline entry points reject it up front.
pub fn detect_segments(skeleton: &GrayImage, config: &HoughConfig) -> Vec<PixelSegment> {
    if let Err(e) = config.accumulator_cells(skeleton.width(), skeleton.height()) {
        tracing::warn!(error = %e, "Skipping line detection");
        return Vec::new();
    }

    let mut points: Vec<(i32, i32)> = skeleton
        .enumerate_pixels()
        .filter(|(_, _, p)| p.0[0] != BACKGROUND)
        .map(|(x, y, _)| (x as i32, y as i32))
        .collect();

    if points.is_empty() {
        return Vec::new();
    }

    let mut space = HoughSpace::new(skeleton, config);
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut segments = Vec::new();

    for remaining in (1..=points.len()).rev() {
        let pick = rng.gen_range(0..remaining);
        let (x, y) = points[pick];
        points.swap(pick, remaining - 1);

        if !space.is_pending(x, y) {
            continue;
        }

        let Some(angle_idx) = space.vote(x, y) else {
            continue;
        };

        let step = space.step_along(angle_idx);
        let forward = space.trace(x, y, step, config.max_line_gap);
        let backward = space.trace(x, y, (-step.0, -step.1), config.max_line_gap);

        let segment = PixelSegment::new(forward.0, forward.1, backward.0, backward.1);
        let accepted = segment.axis_extent() as f64 >= config.min_line_length;

        space.consume(x, y, step, forward, accepted);
        space.consume(x, y, (-step.0, -step.1), backward, accepted);

        if accepted {
            segments.push(segment);
        }
    }

    tracing::debug!(
        voted_pixels = space.voted_count,
        segments = segments.len(),
        "Detected line segments"
    );

    segments
}

/// Accumulator and per-pixel bookkeeping for one detection run
struct HoughSpace {
    width: i32,
    height: i32,
    threshold: i32,
    num_angles: usize,
    num_rhos: usize,
    /// cos(theta) / rho per angle bin
    cos_table: Vec<f64>,
    /// sin(theta) / rho per angle bin
    sin_table: Vec<f64>,
    theta: f64,
    accumulator: Vec<i32>,
    /// Foreground pixels not yet claimed by a traced line
    pending: Vec<bool>,
    voted: Vec<bool>,
    voted_count: usize,
}

impl HoughSpace {
    fn new(mask: &GrayImage, config: &HoughConfig) -> Self {
        let width = mask.width() as i32;
        let height = mask.height() as i32;

        let num_angles = config.angle_bins();
        let num_rhos = config.distance_bins(mask.width(), mask.height());

        let mut cos_table = Vec::with_capacity(num_angles);
        let mut sin_table = Vec::with_capacity(num_angles);
        for n in 0..num_angles {
            let angle = n as f64 * config.theta;
            cos_table.push(angle.cos() / config.rho);
            sin_table.push(angle.sin() / config.rho);
        }

        let pending = mask.pixels().map(|p| p.0[0] != BACKGROUND).collect();

        Self {
            width,
            height,
            threshold: config.threshold.min(i32::MAX as u32) as i32,
            num_angles,
            num_rhos,
            cos_table,
            sin_table,
            theta: config.theta,
            accumulator: vec![0; num_angles * num_rhos],
            pending,
            voted: vec![false; (width * height) as usize],
            voted_count: 0,
        }
    }

    fn index(&self, x: i32, y: i32) -> usize {
        (y * self.width + x) as usize
    }

    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    fn is_pending(&self, x: i32, y: i32) -> bool {
        self.pending[self.index(x, y)]
    }

    fn rho_bin(&self, x: i32, y: i32, angle_idx: usize) -> usize {
        let offset = (self.num_rhos as i64 - 1) / 2;
        let r = (x as f64 * self.cos_table[angle_idx] + y as f64 * self.sin_table[angle_idx])
            .round() as i64
            + offset;
        r.clamp(0, self.num_rhos as i64 - 1) as usize
    }

    /// Add the pixel's votes; returns the strongest bin if it reached the threshold
    fn vote(&mut self, x: i32, y: i32) -> Option<usize> {
        let mut best_votes = self.threshold - 1;
        let mut best_angle = None;

        for n in 0..self.num_angles {
            let cell = n * self.num_rhos + self.rho_bin(x, y, n);
            self.accumulator[cell] += 1;
            if self.accumulator[cell] > best_votes {
                best_votes = self.accumulator[cell];
                best_angle = Some(n);
            }
        }

        let idx = self.index(x, y);
        self.voted[idx] = true;
        self.voted_count += 1;

        best_angle
    }

    fn unvote(&mut self, x: i32, y: i32) {
        for n in 0..self.num_angles {
            let cell = n * self.num_rhos + self.rho_bin(x, y, n);
            self.accumulator[cell] -= 1;
        }
        let idx = self.index(x, y);
        self.voted[idx] = false;
    }

    /// Unit step along the dominant axis of the line for an angle bin
    fn step_along(&self, angle_idx: usize) -> (f64, f64) {
        let angle = angle_idx as f64 * self.theta;
        // Direction of the line is perpendicular to its normal
        let dx = -angle.sin();
        let dy = angle.cos();

        if dx.abs() > dy.abs() {
            (dx.signum(), dy / dx.abs())
        } else {
            (dx / dy.abs(), dy.signum())
        }
    }

    fn pixel_at(x0: i32, y0: i32, step: (f64, f64), t: i32) -> (i32, i32) {
        (
            (x0 as f64 + t as f64 * step.0).round() as i32,
            (y0 as f64 + t as f64 * step.1).round() as i32,
        )
    }

    /// Last pending pixel reached from (x0, y0) before the gap limit or the border
    fn trace(&self, x0: i32, y0: i32, step: (f64, f64), max_gap: f64) -> (i32, i32) {
        let mut end = (x0, y0);
        let mut gap = 0u32;
        let mut t = 1;

        loop {
            let (x, y) = Self::pixel_at(x0, y0, step, t);
            if !self.in_bounds(x, y) {
                break;
            }

            if self.is_pending(x, y) {
                gap = 0;
                end = (x, y);
            } else {
                gap += 1;
                if gap as f64 > max_gap {
                    break;
                }
            }
            t += 1;
        }

        end
    }

    /// Claim the pixels from (x0, y0) up to `end`, withdrawing votes if `unvote`
    fn consume(&mut self, x0: i32, y0: i32, step: (f64, f64), end: (i32, i32), unvote: bool) {
        let mut t = 0;

        loop {
            let (x, y) = Self::pixel_at(x0, y0, step, t);
            if !self.in_bounds(x, y) {
                break;
            }

            let idx = self.index(x, y);
            if self.pending[idx] {
                if unvote && self.voted[idx] {
                    self.unvote(x, y);
                }
                self.pending[idx] = false;
            }

            if (x, y) == end {
                break;
            }
            t += 1;
        }
    }
}
