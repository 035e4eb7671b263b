// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Morphological skeleton by accumulated opening residues
//!
//! Each pass erodes the working mask once. Pixels that an opening of the
//! working mask fails to restore form the skeletal layer at that depth; the
//! union of all layers is the skeleton. The loop ends once erosion has
//! stripped every foreground pixel.
//!
//! The working mask carries a background border one element radius wide, so
//! foreground touching the image edge erodes like any other pixel and the
//! loop always terminates.

use crate::image_ops::{count_foreground, crop, dilate, erode, is_empty, pad, subtract, union_into};
use crate::types::StructuringElement;
use image::GrayImage;

/// Skeleton mask plus the number of thinning passes it took
#[derive(Debug, Clone)]
pub struct Skeleton {
    pub mask: GrayImage,
    pub iterations: usize,
}

/// Reduce foreground regions to their morphological skeleton
pub fn skeletonize(mask: &GrayImage, element: &StructuringElement) -> GrayImage {
    skeletonize_with_stats(mask, element).mask
}

/// Same as [`skeletonize`], also reporting the pass count
pub fn skeletonize_with_stats(mask: &GrayImage, element: &StructuringElement) -> Skeleton {
    let border = element.radius as u32;
    let mut working = pad(mask, border);
    let mut skeleton = GrayImage::new(working.width(), working.height());
    let mut iterations = 0;

    while !is_empty(&working) {
        let eroded = erode(&working, element);
        let opened = dilate(&eroded, element);
        let residue = subtract(&working, &opened);
        union_into(&mut skeleton, &residue);
        working = eroded;
        iterations += 1;
    }

    let skeleton = crop(&skeleton, border);

    tracing::debug!(
        iterations,
        input_pixels = count_foreground(mask),
        skeleton_pixels = count_foreground(&skeleton),
        "Skeletonized mask"
    );

    Skeleton {
        mask: skeleton,
        iterations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_ops::{BACKGROUND, FOREGROUND};
    use image::Luma;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn filled_rect(width: u32, height: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> GrayImage {
        let mut mask = GrayImage::new(width, height);
        for y in y0..=y1 {
            for x in x0..=x1 {
                mask.put_pixel(x, y, Luma([FOREGROUND]));
            }
        }
        mask
    }

    fn is_subset(inner: &GrayImage, outer: &GrayImage) -> bool {
        inner
            .pixels()
            .zip(outer.pixels())
            .all(|(a, b)| a.0[0] == BACKGROUND || b.0[0] != BACKGROUND)
    }

    #[test]
    fn test_empty_mask_gives_empty_skeleton() {
        let mask = GrayImage::new(30, 20);
        let result = skeletonize_with_stats(&mask, &StructuringElement::default());

        assert_eq!(result.iterations, 0);
        assert_eq!(result.mask.dimensions(), (30, 20));
        assert!(is_empty(&result.mask));
    }

    #[test]
    fn test_thin_line_is_a_fixed_point() {
        let line = filled_rect(40, 20, 5, 10, 34, 10);
        let element = StructuringElement::default();

        let once = skeletonize(&line, &element);
        assert_eq!(once, line);
        assert_eq!(skeletonize(&once, &element), once);
    }

    #[test]
    fn test_rectangle_reduces_to_centre_row() {
        // 41 x 7 bar: three erosions leave the row at y = 23
        let mask = filled_rect(100, 100, 10, 20, 50, 26);
        let result = skeletonize_with_stats(&mask, &StructuringElement::default());

        assert_eq!(result.iterations, 4);
        for x in 13..=47 {
            assert_eq!(result.mask.get_pixel(x, 23).0[0], FOREGROUND, "x = {}", x);
        }
        for x in 13..=47 {
            assert_eq!(result.mask.get_pixel(x, 21).0[0], BACKGROUND);
            assert_eq!(result.mask.get_pixel(x, 25).0[0], BACKGROUND);
        }
        // Corner diagonals survive as residues of the cross opening
        assert_eq!(result.mask.get_pixel(10, 20).0[0], FOREGROUND);
        assert_eq!(result.mask.get_pixel(11, 21).0[0], FOREGROUND);
        assert!(is_subset(&result.mask, &mask));
    }

    #[test]
    fn test_foreground_touching_border_terminates() {
        let full = GrayImage::from_pixel(9, 6, Luma([FOREGROUND]));
        let result = skeletonize_with_stats(&full, &StructuringElement::default());

        assert!(result.iterations <= 3);
        assert!(!is_empty(&result.mask));
        assert!(is_subset(&result.mask, &full));
    }

    #[test]
    fn test_iteration_bound() {
        for (w, h) in [(12, 12), (15, 8), (1, 9), (20, 3)] {
            let full = GrayImage::from_pixel(w, h, Luma([FOREGROUND]));
            let result = skeletonize_with_stats(&full, &StructuringElement::default());
            assert!(result.iterations as u32 <= w.min(h).div_ceil(2));
        }
    }

    #[test]
    fn test_skeleton_is_subset_of_random_masks() {
        let mut rng = StdRng::seed_from_u64(7);

        for element in [StructuringElement::cross(1), StructuringElement::square(1)] {
            for _ in 0..10 {
                let mut mask = GrayImage::new(32, 24);
                for _ in 0..6 {
                    let x0 = rng.gen_range(0..28);
                    let y0 = rng.gen_range(0..20);
                    let x1 = (x0 + rng.gen_range(0..12)).min(31);
                    let y1 = (y0 + rng.gen_range(0..8)).min(23);
                    for y in y0..=y1 {
                        for x in x0..=x1 {
                            mask.put_pixel(x, y, Luma([FOREGROUND]));
                        }
                    }
                }

                let skeleton = skeletonize(&mask, &element);
                assert_eq!(skeleton.dimensions(), mask.dimensions());
                assert!(is_subset(&skeleton, &mask));
                if !is_empty(&mask) {
                    assert!(!is_empty(&skeleton));
                }
            }
        }
    }
}
