// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoding of encoded image buffers into single-channel intensity grids

use crate::error::{Error, Result};
use image::{GrayImage, Luma};

/// Decode an encoded image (PNG, JPEG, BMP) into a grayscale grid
///
/// The format is guessed from the buffer contents. Colour images are reduced
/// to luma; alpha is dropped.
pub fn decode(bytes: &[u8]) -> Result<GrayImage> {
    let img = image::load_from_memory(bytes)?;
    let gray = img.to_luma8();

    tracing::debug!(
        width = gray.width(),
        height = gray.height(),
        encoded_size = bytes.len(),
        "Decoded image"
    );

    Ok(gray)
}

/// Convert raw RGBA bytes to a grayscale grid
pub fn rgba_to_grayscale(rgba: &[u8], width: u32, height: u32) -> Result<GrayImage> {
    let expected = width as usize * height as usize * 4;
    if rgba.len() < expected {
        return Err(Error::InvalidInput(format!(
            "RGBA buffer holds {} bytes, {}x{} needs {}",
            rgba.len(),
            width,
            height,
            expected
        )));
    }

    let mut gray = GrayImage::new(width, height);
    for (i, pixel) in gray.pixels_mut().enumerate() {
        let r = rgba[i * 4] as f32;
        let g = rgba[i * 4 + 1] as f32;
        let b = rgba[i * 4 + 2] as f32;
        // ITU-R BT.601
        let luma = (0.299 * r + 0.587 * g + 0.114 * b).round() as u8;
        *pixel = Luma([luma]);
    }

    Ok(gray)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
        bytes
    }

    #[test]
    fn test_decode_png_keeps_dimensions() {
        let img = RgbImage::from_pixel(37, 21, Rgb([255, 255, 255]));
        let bytes = encode(DynamicImage::ImageRgb8(img), ImageFormat::Png);

        let gray = decode(&bytes).unwrap();
        assert_eq!(gray.dimensions(), (37, 21));
        assert_eq!(gray.get_pixel(0, 0).0[0], 255);
    }

    #[test]
    fn test_decode_bmp_converts_colour() {
        let mut img = RgbImage::from_pixel(4, 4, Rgb([255, 255, 255]));
        img.put_pixel(1, 1, Rgb([0, 0, 0]));
        let bytes = encode(DynamicImage::ImageRgb8(img), ImageFormat::Bmp);

        let gray = decode(&bytes).unwrap();
        assert_eq!(gray.get_pixel(1, 1).0[0], 0);
        assert_eq!(gray.get_pixel(2, 2).0[0], 255);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode(b"definitely not an image").unwrap_err();
        assert!(err.is_decode());
    }

    #[test]
    fn test_decode_rejects_truncated_png() {
        let img = RgbImage::from_pixel(64, 64, Rgb([10, 20, 30]));
        let bytes = encode(DynamicImage::ImageRgb8(img), ImageFormat::Png);

        let err = decode(&bytes[..bytes.len() / 2]).unwrap_err();
        assert!(err.is_decode());
    }

    #[test]
    fn test_rgba_to_grayscale() {
        let rgba = vec![
            255, 255, 255, 255, // White
            0, 0, 0, 255, // Black
        ];
        let gray = rgba_to_grayscale(&rgba, 2, 1).unwrap();

        assert_eq!(gray.get_pixel(0, 0).0[0], 255);
        assert_eq!(gray.get_pixel(1, 0).0[0], 0);
    }

    #[test]
    fn test_rgba_short_buffer() {
        let err = rgba_to_grayscale(&[0, 0, 0, 255], 2, 2).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
