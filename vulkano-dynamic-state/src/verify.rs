// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Comparison of the attachments against their expected contents.
//!
//! The color, depth and stencil aspects are checked independently, and each one that does not
//! match yields an [`ErrorMask`] marking the texels at fault.

use crate::{
    format::NumericFormat,
    image::{ColorImage, DepthStencilImage, ErrorMask},
};
use log::error;

/// The largest difference allowed between a normalized color component and its expected value.
pub const UNORM_COLOR_THRESHOLD: f32 = 0.005;

/// The outcome of comparing all three aspects. `None` means the aspect matched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Verification {
    pub color: Option<ErrorMask>,
    pub depth: Option<ErrorMask>,
    pub stencil: Option<ErrorMask>,
}

impl Verification {
    /// Returns whether every aspect matched.
    #[inline]
    pub fn is_match(&self) -> bool {
        self.color.is_none() && self.depth.is_none() && self.stencil.is_none()
    }
}

/// Compares every aspect of the attachments, without stopping at the first mismatch.
pub fn verify_attachments(
    color: &ColorImage,
    expected_color: &ColorImage,
    depth_stencil: &DepthStencilImage,
    expected_depth: f32,
    depth_threshold: f32,
    expected_stencil: u32,
) -> Verification {
    Verification {
        color: verify_color(color, expected_color),
        depth: verify_depth(depth_stencil, expected_depth, depth_threshold),
        stencil: verify_stencil(depth_stencil, expected_stencil),
    }
}

/// Compares a color attachment against the reference image.
///
/// Normalized texels match when every component is within [`UNORM_COLOR_THRESHOLD`]. Integer
/// texels must be equal.
pub fn verify_color(actual: &ColorImage, expected: &ColorImage) -> Option<ErrorMask> {
    let unorm = actual.format().numeric_format_color() == Some(NumericFormat::UNORM);

    check("color", actual.extent(), |x, y| {
        if unorm {
            let a = actual.pixel_float(x, y);
            let e = expected.pixel_float(x, y);

            a.iter()
                .zip(e)
                .all(|(a, e)| (a - e).abs() < UNORM_COLOR_THRESHOLD)
        } else {
            actual.pixel_uint(x, y) == expected.pixel_uint(x, y)
        }
    })
}

/// Checks that every depth value is within `threshold` of `expected`.
pub fn verify_depth(
    actual: &DepthStencilImage,
    expected: f32,
    threshold: f32,
) -> Option<ErrorMask> {
    let range = expected - threshold..=expected + threshold;

    check("depth", actual.extent(), |x, y| {
        range.contains(&actual.depth(x, y))
    })
}

/// Checks that every stencil value equals `expected`.
pub fn verify_stencil(actual: &DepthStencilImage, expected: u32) -> Option<ErrorMask> {
    check("stencil", actual.extent(), |x, y| {
        u32::from(actual.stencil(x, y)) == expected
    })
}

fn check(
    aspect: &str,
    extent: [u32; 2],
    mut matches: impl FnMut(u32, u32) -> bool,
) -> Option<ErrorMask> {
    let mut mask = ErrorMask::new(extent);

    for y in 0..extent[1] {
        for x in 0..extent[0] {
            if !matches(x, y) {
                mask.mark_error(x, y);
            }
        }
    }

    if mask.error_count() == 0 {
        return None;
    }

    error!(
        "{} attachment: {} of {} texels do not have their expected value",
        aspect,
        mask.error_count(),
        extent[0] * extent[1],
    );

    Some(mask)
}

#[cfg(test)]
mod tests {
    use super::{verify_attachments, verify_color, verify_depth, verify_stencil};
    use crate::{
        format::Format,
        image::{ClearColorValue, ColorImage, DepthStencilImage},
    };

    const EXTENT: [u32; 2] = [4, 4];

    #[test]
    fn unorm_threshold() {
        let expected = ColorImage::filled(
            Format::R8G8B8A8_UNORM,
            EXTENT,
            ClearColorValue::Float([0.0, 0.0, 1.0, 1.0]),
        );
        let mut actual = expected.clone();
        assert!(verify_color(&actual, &expected).is_none());

        actual.set_texel(1, 2, [0, 0, 250, 255]);
        let mask = verify_color(&actual, &expected).unwrap();
        assert_eq!(mask.error_count(), 1);
        assert!(mask.is_error(1, 2));
        assert!(!mask.is_error(2, 1));
    }

    #[test]
    fn uint_is_exact() {
        let expected = ColorImage::filled(
            Format::R8G8B8A8_UINT,
            EXTENT,
            ClearColorValue::Uint([0, 255, 255, 255]),
        );
        let mut actual = expected.clone();
        actual.set_texel(0, 0, [0, 255, 254, 255]);

        assert_eq!(verify_color(&actual, &expected).unwrap().error_count(), 1);
    }

    #[test]
    fn depth_threshold() {
        let image = DepthStencilImage::new(Format::D32_SFLOAT_S8_UINT, EXTENT, 0.5, 0);

        assert!(verify_depth(&image, 0.5, 0.0).is_none());
        assert!(verify_depth(&image, 0.5001, 0.0).is_some());
        assert!(verify_depth(&image, 0.5001, 0.001).is_none());
    }

    #[test]
    fn every_aspect_is_reported() {
        let color = ColorImage::filled(
            Format::R8G8B8A8_UNORM,
            EXTENT,
            ClearColorValue::Float([0.0, 0.0, 0.0, 1.0]),
        );
        let expected_color = ColorImage::filled(
            Format::R8G8B8A8_UNORM,
            EXTENT,
            ClearColorValue::Float([0.0, 0.0, 1.0, 1.0]),
        );
        let depth_stencil = DepthStencilImage::new(Format::D32_SFLOAT_S8_UINT, EXTENT, 1.0, 7);

        let verification = verify_attachments(&color, &expected_color, &depth_stencil, 0.0, 0.0, 8);
        assert!(!verification.is_match());
        assert_eq!(verification.color.unwrap().error_count(), 16);
        assert_eq!(verification.depth.unwrap().error_count(), 16);
        assert_eq!(verification.stencil.unwrap().error_count(), 16);

        assert!(verify_stencil(&depth_stencil, 7).is_none());
    }
}
