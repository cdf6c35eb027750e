// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! The expected contents of the color attachment.

use crate::{
    format::Format,
    image::{ClearColorValue, ColorImage},
};

/// Describes the color every pixel of the framebuffer should have after a test.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ReferenceColor {
    /// The whole image has one color.
    SingleColor(ClearColorValue),

    /// The upper half of the image has one color and the lower half another.
    HorizontalSplit { top: [f32; 4], bottom: [f32; 4] },

    /// The image has the geometry color, except for the last quarter of the bottom row, which
    /// keeps the clear color. Primitive restart cuts the last line segment this way.
    LastSegmentMissing {
        geometry: [f32; 4],
        clear: [f32; 4],
    },
}

impl ReferenceColor {
    /// Returns the expected color of pixel `(x, y)` in an image of `extent`.
    pub fn color_at(&self, x: u32, y: u32, extent: [u32; 2]) -> ClearColorValue {
        let [width, height] = extent;

        match *self {
            ReferenceColor::SingleColor(color) => color,
            ReferenceColor::HorizontalSplit { top, bottom } => {
                ClearColorValue::Float(if y < height / 2 { top } else { bottom })
            }
            ReferenceColor::LastSegmentMissing { geometry, clear } => {
                let last_segment_start = width * 3 / 4;

                ClearColorValue::Float(if y == height - 1 && x >= last_segment_start {
                    clear
                } else {
                    geometry
                })
            }
        }
    }

    /// Generates the whole expected image.
    pub fn generate(&self, format: Format, extent: [u32; 2]) -> ColorImage {
        let mut image = ColorImage::new(format, extent);

        for y in 0..extent[1] {
            for x in 0..extent[0] {
                image.set_pixel(x, y, self.color_at(x, y, extent));
            }
        }

        image
    }
}

#[cfg(test)]
mod tests {
    use super::ReferenceColor;
    use crate::{format::Format, image::ClearColorValue};

    const BLUE: [f32; 4] = [0.0, 0.0, 1.0, 1.0];
    const BLACK: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

    #[test]
    fn horizontal_split() {
        let reference = ReferenceColor::HorizontalSplit {
            top: BLUE,
            bottom: BLACK,
        };
        let image = reference.generate(Format::R8G8B8A8_UNORM, [64, 64]);

        assert_eq!(image.texel(10, 31), [0, 0, 255, 255]);
        assert_eq!(image.texel(10, 32), [0, 0, 0, 255]);
    }

    #[test]
    fn last_segment_missing() {
        let reference = ReferenceColor::LastSegmentMissing {
            geometry: BLUE,
            clear: BLACK,
        };

        assert_eq!(
            reference.color_at(47, 63, [64, 64]),
            ClearColorValue::Float(BLUE),
        );
        assert_eq!(
            reference.color_at(48, 63, [64, 64]),
            ClearColorValue::Float(BLACK),
        );
        assert_eq!(
            reference.color_at(63, 62, [64, 64]),
            ClearColorValue::Float(BLUE),
        );
    }

    #[test]
    fn uint_single_color() {
        let reference = ReferenceColor::SingleColor(ClearColorValue::Uint([0, 255, 255, 255]));
        let image = reference.generate(Format::R8G8B8A8_UINT, [4, 4]);

        assert_eq!(image.pixel_uint(3, 3), [0, 255, 255, 255]);
    }
}
