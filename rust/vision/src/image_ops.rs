// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Binarization and morphology on foreground/background masks
//!
//! Masks are `GrayImage`s holding only [`FOREGROUND`] and [`BACKGROUND`].

use crate::types::{ElementShape, StructuringElement};
use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;

/// Mask value for line-art pixels
pub const FOREGROUND: u8 = 255;
/// Mask value for empty canvas
pub const BACKGROUND: u8 = 0;

/// Inverted binary threshold: dark strokes become foreground
///
/// A pixel is foreground when its intensity is strictly below `threshold`.
pub fn binarize_inverted(image: &GrayImage, threshold: u8) -> GrayImage {
    let mut result = GrayImage::new(image.width(), image.height());

    for (x, y, pixel) in image.enumerate_pixels() {
        let value = if pixel.0[0] < threshold {
            FOREGROUND
        } else {
            BACKGROUND
        };
        result.put_pixel(x, y, Luma([value]));
    }

    result
}

fn norm(element: &StructuringElement) -> Norm {
    match element.shape {
        ElementShape::Cross => Norm::L1,
        ElementShape::Square => Norm::LInf,
    }
}

/// Morphological erosion - shrinks foreground regions
///
/// Pixels outside the image do not count as background; see [`pad`].
pub fn erode(mask: &GrayImage, element: &StructuringElement) -> GrayImage {
    imageproc::morphology::erode(mask, norm(element), element.radius)
}

/// Morphological dilation - expands foreground regions
pub fn dilate(mask: &GrayImage, element: &StructuringElement) -> GrayImage {
    imageproc::morphology::dilate(mask, norm(element), element.radius)
}

/// Surround a mask with a background border `border` pixels wide
pub fn pad(mask: &GrayImage, border: u32) -> GrayImage {
    let mut padded = GrayImage::from_pixel(
        mask.width() + 2 * border,
        mask.height() + 2 * border,
        Luma([BACKGROUND]),
    );
    image::imageops::replace(&mut padded, mask, border as i64, border as i64);
    padded
}

/// Inverse of [`pad`]
pub fn crop(padded: &GrayImage, border: u32) -> GrayImage {
    let width = padded.width().saturating_sub(2 * border);
    let height = padded.height().saturating_sub(2 * border);
    image::imageops::crop_imm(padded, border, border, width, height).to_image()
}

/// `a AND NOT b`
pub fn subtract(a: &GrayImage, b: &GrayImage) -> GrayImage {
    let mut result = a.clone();
    for (out, other) in result.pixels_mut().zip(b.pixels()) {
        if other.0[0] != BACKGROUND {
            out.0[0] = BACKGROUND;
        }
    }
    result
}

/// Merge `other` into `target` (logical OR)
pub fn union_into(target: &mut GrayImage, other: &GrayImage) {
    for (out, pixel) in target.pixels_mut().zip(other.pixels()) {
        if pixel.0[0] != BACKGROUND {
            out.0[0] = FOREGROUND;
        }
    }
}

pub fn count_foreground(mask: &GrayImage) -> usize {
    mask.pixels().filter(|p| p.0[0] != BACKGROUND).count()
}

pub fn is_empty(mask: &GrayImage) -> bool {
    mask.pixels().all(|p| p.0[0] == BACKGROUND)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binarize_inverted() {
        let mut img = GrayImage::new(10, 10);
        for x in 0..10 {
            for y in 0..10 {
                let value = if x < 5 { 100 } else { 200 };
                img.put_pixel(x, y, Luma([value]));
            }
        }

        let mask = binarize_inverted(&img, 128);

        assert_eq!(mask.dimensions(), img.dimensions());
        assert_eq!(mask.get_pixel(0, 0).0[0], FOREGROUND);
        assert_eq!(mask.get_pixel(9, 0).0[0], BACKGROUND);
        assert_eq!(count_foreground(&mask), 50);
    }

    #[test]
    fn test_binarize_threshold_is_strict() {
        let img = GrayImage::from_pixel(3, 3, Luma([128]));
        assert!(is_empty(&binarize_inverted(&img, 128)));
        assert_eq!(count_foreground(&binarize_inverted(&img, 129)), 9);
    }

    #[test]
    fn test_uniform_images() {
        let light = GrayImage::from_pixel(8, 8, Luma([250]));
        let dark = GrayImage::from_pixel(8, 8, Luma([5]));

        assert!(is_empty(&binarize_inverted(&light, 128)));
        assert_eq!(count_foreground(&binarize_inverted(&dark, 128)), 64);
    }

    #[test]
    fn test_cross_erosion_and_dilation() {
        let mut mask = GrayImage::new(7, 7);
        for x in 1..6 {
            for y in 1..6 {
                mask.put_pixel(x, y, Luma([FOREGROUND]));
            }
        }
        let element = StructuringElement::cross(1);

        let eroded = erode(&mask, &element);
        assert_eq!(count_foreground(&eroded), 9);
        assert_eq!(eroded.get_pixel(3, 3).0[0], FOREGROUND);
        assert_eq!(eroded.get_pixel(1, 1).0[0], BACKGROUND);

        // Re-dilating with a cross cannot restore the four corners
        let opened = dilate(&eroded, &element);
        assert_eq!(count_foreground(&opened), 21);
        assert_eq!(opened.get_pixel(1, 1).0[0], BACKGROUND);
        assert_eq!(opened.get_pixel(1, 2).0[0], FOREGROUND);
    }

    #[test]
    fn test_pad_then_crop() {
        let mut mask = GrayImage::new(4, 3);
        mask.put_pixel(0, 0, Luma([FOREGROUND]));
        mask.put_pixel(3, 2, Luma([FOREGROUND]));

        let padded = pad(&mask, 2);
        assert_eq!(padded.dimensions(), (8, 7));
        assert_eq!(padded.get_pixel(2, 2).0[0], FOREGROUND);
        assert_eq!(padded.get_pixel(0, 0).0[0], BACKGROUND);

        assert_eq!(crop(&padded, 2), mask);
    }

    #[test]
    fn test_padding_lets_border_pixels_erode() {
        let full = GrayImage::from_pixel(5, 5, Luma([FOREGROUND]));
        let element = StructuringElement::cross(1);

        let eroded = erode(&pad(&full, 1), &element);
        assert_eq!(count_foreground(&crop(&eroded, 1)), 9);
    }

    #[test]
    fn test_subtract_and_union() {
        let mut a = GrayImage::new(3, 1);
        let mut b = GrayImage::new(3, 1);
        a.put_pixel(0, 0, Luma([FOREGROUND]));
        a.put_pixel(1, 0, Luma([FOREGROUND]));
        b.put_pixel(1, 0, Luma([FOREGROUND]));
        b.put_pixel(2, 0, Luma([FOREGROUND]));

        let diff = subtract(&a, &b);
        assert_eq!(diff.get_pixel(0, 0).0[0], FOREGROUND);
        assert_eq!(count_foreground(&diff), 1);

        let mut acc = GrayImage::new(3, 1);
        union_into(&mut acc, &diff);
        union_into(&mut acc, &b);
        assert_eq!(count_foreground(&acc), 3);
    }
}
