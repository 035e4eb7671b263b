// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Projection of pixel-space segments into world-space wall boxes
//!
//! Image x maps to world x and image y maps to world z; every wall stands
//! on the ground plane with a fixed height and thickness.

use crate::types::{PixelSegment, ProjectionConfig, WallPrimitive};
use uuid::Uuid;

/// Build the wall box for one detected segment
pub fn project_segment(segment: &PixelSegment, config: &ProjectionConfig) -> WallPrimitive {
    let scale = config.scale;
    let length = segment.length() * scale;
    let mid = segment.midpoint();

    // Image y grows downward, so the yaw is mirrored
    let yaw = -segment.angle();

    WallPrimitive {
        id: Uuid::new_v4().to_string(),
        position: [mid.x * scale, config.elevation(), mid.y * scale],
        size: [length, config.wall_height, config.wall_thickness],
        rotation: [0.0, yaw, 0.0],
    }
}

/// Project every segment, preserving detector order
pub fn project_segments(
    segments: &[PixelSegment],
    config: &ProjectionConfig,
) -> Vec<WallPrimitive> {
    segments
        .iter()
        .map(|segment| project_segment(segment, config))
        .collect()
}
