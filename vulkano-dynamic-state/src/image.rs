// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Host-side images: attachment contents read back from a device, reference images and error
//! masks.
//!
//! All color images use one of the two RGBA8 formats, so a texel is always four bytes. Depth is
//! kept as `f32` after quantization to the attachment's depth format, which makes comparing it
//! against an expected value independent of how a device packs depth and stencil together.

use crate::{
    format::{Format, NumericFormat},
    Id, ValidationError,
};
use std::io::Write;

/// The ID of a framebuffer created by a device.
pub type FramebufferId = Id<Framebuffer>;

/// A value to fill a color attachment or a reference image with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ClearColorValue {
    /// Used for normalized formats.
    Float([f32; 4]),

    /// Used for unsigned integer formats.
    Uint([u32; 4]),
}

impl ClearColorValue {
    /// Converts the value to a texel of `format`, the way a shader output or a clear value would
    /// be stored.
    pub fn to_texel(self, format: Format) -> [u8; 4] {
        let unorm = format.numeric_format_color() == Some(NumericFormat::UNORM);

        match self {
            ClearColorValue::Float(value) if unorm => value.map(unorm8_from_f32),
            // Float to integer conversions truncate and saturate, like `uvec4(v)` in a shader
            // followed by the store to an 8-bit attachment.
            ClearColorValue::Float(value) => value.map(|c| (c as u32).min(255) as u8),
            ClearColorValue::Uint(value) => value.map(|c| c.min(255) as u8),
        }
    }
}

fn unorm8_from_f32(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Parameters to create a framebuffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FramebufferCreateInfo {
    /// The width and height of the attachments.
    ///
    /// The default value is `[0; 2]`, which must be overridden.
    pub extent: [u32; 2],

    /// The format of the color attachment.
    ///
    /// The default value is [`Format::R8G8B8A8_UNORM`].
    pub color_format: Format,

    /// The format of the depth/stencil attachment.
    ///
    /// The default value is [`Format::D24_UNORM_S8_UINT`].
    pub depth_stencil_format: Format,
}

impl Default for FramebufferCreateInfo {
    #[inline]
    fn default() -> Self {
        FramebufferCreateInfo {
            extent: [0; 2],
            color_format: Format::R8G8B8A8_UNORM,
            depth_stencil_format: Format::D24_UNORM_S8_UINT,
        }
    }
}

impl FramebufferCreateInfo {
    pub(crate) fn validate(&self) -> Result<(), Box<ValidationError>> {
        let &Self {
            extent,
            color_format,
            depth_stencil_format,
        } = self;

        if extent.contains(&0) {
            return Err(ValidationError::new("extent", "contains zero"));
        }

        if !matches!(
            color_format,
            Format::R8G8B8A8_UNORM | Format::R8G8B8A8_UINT
        ) {
            return Err(ValidationError::new(
                "color_format",
                "is not an RGBA8 color format",
            ));
        }

        if !depth_stencil_format.is_depth_stencil() {
            return Err(ValidationError::new(
                "depth_stencil_format",
                "is not a depth/stencil format",
            ));
        }

        Ok(())
    }
}

/// The attachments of a framebuffer, as held by a device that renders on the host.
#[derive(Clone, Debug)]
pub struct Framebuffer {
    pub color: ColorImage,
    pub depth_stencil: DepthStencilImage,
}

impl Framebuffer {
    /// Creates a framebuffer with zeroed attachments.
    pub fn new(create_info: &FramebufferCreateInfo) -> Self {
        Framebuffer {
            color: ColorImage::new(create_info.color_format, create_info.extent),
            depth_stencil: DepthStencilImage::new(
                create_info.depth_stencil_format,
                create_info.extent,
                0.0,
                0,
            ),
        }
    }
}

/// An RGBA8 color image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorImage {
    format: Format,
    extent: [u32; 2],
    data: Vec<u8>,
}

impl ColorImage {
    /// Creates an image with every texel set to zero.
    ///
    /// # Panics
    ///
    /// - Panics if `format` is not an RGBA8 color format.
    pub fn new(format: Format, extent: [u32; 2]) -> Self {
        assert_eq!(format.block_size(), 4);
        assert_eq!(format.components(), 4);

        ColorImage {
            format,
            extent,
            data: vec![0; extent[0] as usize * extent[1] as usize * 4],
        }
    }

    /// Creates an image with every texel set to `value`.
    pub fn filled(format: Format, extent: [u32; 2], value: ClearColorValue) -> Self {
        let mut image = ColorImage::new(format, extent);
        image.clear(value);

        image
    }

    #[inline]
    pub fn format(&self) -> Format {
        self.format
    }

    #[inline]
    pub fn extent(&self) -> [u32; 2] {
        self.extent
    }

    /// Returns the raw texels, row by row.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Sets every texel to `value`.
    pub fn clear(&mut self, value: ClearColorValue) {
        let texel = value.to_texel(self.format);

        for chunk in self.data.chunks_exact_mut(4) {
            chunk.copy_from_slice(&texel);
        }
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.extent[0] && y < self.extent[1]);

        (y as usize * self.extent[0] as usize + x as usize) * 4
    }

    /// Returns the raw texel at the given coordinates.
    #[inline]
    pub fn texel(&self, x: u32, y: u32) -> [u8; 4] {
        let offset = self.offset(x, y);
        let mut texel = [0; 4];
        texel.copy_from_slice(&self.data[offset..offset + 4]);

        texel
    }

    /// Sets the raw texel at the given coordinates.
    #[inline]
    pub fn set_texel(&mut self, x: u32, y: u32, texel: [u8; 4]) {
        let offset = self.offset(x, y);
        self.data[offset..offset + 4].copy_from_slice(&texel);
    }

    /// Stores `value` at the given coordinates, converted to the image's format.
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, value: ClearColorValue) {
        self.set_texel(x, y, value.to_texel(self.format));
    }

    /// Returns the texel at the given coordinates as floats. Normalized components are divided
    /// by 255; integer components are converted as they are.
    pub fn pixel_float(&self, x: u32, y: u32) -> [f32; 4] {
        let texel = self.texel(x, y);

        match self.format.numeric_format_color() {
            Some(NumericFormat::UNORM) => texel.map(|c| f32::from(c) / 255.0),
            _ => texel.map(f32::from),
        }
    }

    /// Returns the texel at the given coordinates as unsigned integers.
    #[inline]
    pub fn pixel_uint(&self, x: u32, y: u32) -> [u32; 4] {
        self.texel(x, y).map(u32::from)
    }

    /// Encodes the image as an RGBA8 PNG.
    pub fn write_png(&self, w: impl Write) -> Result<(), png::EncodingError> {
        encode_rgba8(w, self.extent, &self.data)
    }
}

/// A depth/stencil image.
#[derive(Clone, Debug, PartialEq)]
pub struct DepthStencilImage {
    format: Format,
    extent: [u32; 2],
    depth: Vec<f32>,
    stencil: Vec<u8>,
}

impl DepthStencilImage {
    /// Creates an image with every texel set to the given depth and stencil values.
    ///
    /// # Panics
    ///
    /// - Panics if `format` is not a depth/stencil format.
    pub fn new(format: Format, extent: [u32; 2], depth: f32, stencil: u8) -> Self {
        assert!(format.is_depth_stencil());

        let len = extent[0] as usize * extent[1] as usize;

        DepthStencilImage {
            format,
            extent,
            depth: vec![quantize_depth(format, depth); len],
            stencil: vec![stencil; len],
        }
    }

    #[inline]
    pub fn format(&self) -> Format {
        self.format
    }

    #[inline]
    pub fn extent(&self) -> [u32; 2] {
        self.extent
    }

    /// Sets every texel to the given depth and stencil values.
    pub fn clear(&mut self, depth: f32, stencil: u8) {
        let depth = quantize_depth(self.format, depth);
        self.depth.fill(depth);
        self.stencil.fill(stencil);
    }

    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.extent[0] && y < self.extent[1]);

        y as usize * self.extent[0] as usize + x as usize
    }

    #[inline]
    pub fn depth(&self, x: u32, y: u32) -> f32 {
        self.depth[self.index(x, y)]
    }

    /// Stores `depth` at the given coordinates, quantized to the image's format.
    #[inline]
    pub fn set_depth(&mut self, x: u32, y: u32, depth: f32) {
        let index = self.index(x, y);
        self.depth[index] = quantize_depth(self.format, depth);
    }

    #[inline]
    pub fn stencil(&self, x: u32, y: u32) -> u8 {
        self.stencil[self.index(x, y)]
    }

    #[inline]
    pub fn set_stencil(&mut self, x: u32, y: u32, stencil: u8) {
        let index = self.index(x, y);
        self.stencil[index] = stencil;
    }

    /// Encodes the depth aspect as a grayscale RGBA8 PNG, with 0.0 black and 1.0 white.
    pub fn write_depth_png(&self, w: impl Write) -> Result<(), png::EncodingError> {
        let data: Vec<u8> = self
            .depth
            .iter()
            .flat_map(|&d| {
                let c = unorm8_from_f32(d);
                [c, c, c, 0xFF]
            })
            .collect();

        encode_rgba8(w, self.extent, &data)
    }

    /// Encodes the stencil aspect as a grayscale RGBA8 PNG.
    pub fn write_stencil_png(&self, w: impl Write) -> Result<(), png::EncodingError> {
        let data: Vec<u8> = self
            .stencil
            .iter()
            .flat_map(|&s| [s, s, s, 0xFF])
            .collect();

        encode_rgba8(w, self.extent, &data)
    }
}

/// Rounds `depth` to the closest value representable by the depth component of `format`.
pub fn quantize_depth(format: Format, depth: f32) -> f32 {
    match format {
        Format::D24_UNORM_S8_UINT => {
            const MAX: f64 = ((1u32 << 24) - 1) as f64;

            ((f64::from(depth.clamp(0.0, 1.0)) * MAX).round() / MAX) as f32
        }
        _ => depth,
    }
}

/// A per-pixel record of which texels of an attachment matched their expected value.
///
/// Matching texels are green and mismatching ones red, so the mask can be written out as an
/// image for inspection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorMask {
    extent: [u32; 2],
    data: Vec<u8>,
    error_count: u32,
}

const GOOD_COLOR: [u8; 4] = [0, 0xFF, 0, 0xFF];
const BAD_COLOR: [u8; 4] = [0xFF, 0, 0, 0xFF];

impl ErrorMask {
    /// Creates a mask where every texel is marked as matching.
    pub fn new(extent: [u32; 2]) -> Self {
        let len = extent[0] as usize * extent[1] as usize;

        ErrorMask {
            extent,
            data: GOOD_COLOR.repeat(len),
            error_count: 0,
        }
    }

    #[inline]
    pub fn extent(&self) -> [u32; 2] {
        self.extent
    }

    /// Marks the texel at the given coordinates as mismatching.
    pub fn mark_error(&mut self, x: u32, y: u32) {
        let offset = (y as usize * self.extent[0] as usize + x as usize) * 4;

        if self.data[offset..offset + 4] != BAD_COLOR {
            self.data[offset..offset + 4].copy_from_slice(&BAD_COLOR);
            self.error_count += 1;
        }
    }

    /// Returns whether the texel at the given coordinates is marked as mismatching.
    #[inline]
    pub fn is_error(&self, x: u32, y: u32) -> bool {
        let offset = (y as usize * self.extent[0] as usize + x as usize) * 4;

        self.data[offset..offset + 4] == BAD_COLOR
    }

    /// Returns the number of mismatching texels.
    #[inline]
    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    /// Encodes the mask as an RGBA8 PNG.
    pub fn write_png(&self, w: impl Write) -> Result<(), png::EncodingError> {
        encode_rgba8(w, self.extent, &self.data)
    }
}

fn encode_rgba8(w: impl Write, extent: [u32; 2], data: &[u8]) -> Result<(), png::EncodingError> {
    let mut encoder = png::Encoder::new(w, extent[0], extent[1]);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(data)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{
        quantize_depth, ClearColorValue, ColorImage, DepthStencilImage, ErrorMask,
        FramebufferCreateInfo,
    };
    use crate::format::Format;

    #[test]
    fn texel_conversion() {
        let value = ClearColorValue::Float([0.0, 0.5, 1.0, 2.0]);
        assert_eq!(value.to_texel(Format::R8G8B8A8_UNORM), [0, 128, 255, 255]);

        let value = ClearColorValue::Float([0.0, 0.0, 255.0, 255.0]);
        assert_eq!(value.to_texel(Format::R8G8B8A8_UINT), [0, 0, 255, 255]);

        let value = ClearColorValue::Uint([1, 300, 0, 255]);
        assert_eq!(value.to_texel(Format::R8G8B8A8_UINT), [1, 255, 0, 255]);
    }

    #[test]
    fn color_image_access() {
        let mut image = ColorImage::filled(
            Format::R8G8B8A8_UNORM,
            [4, 2],
            ClearColorValue::Float([0.0, 0.0, 0.0, 1.0]),
        );
        image.set_pixel(3, 1, ClearColorValue::Float([0.0, 0.0, 1.0, 1.0]));

        assert_eq!(image.pixel_float(3, 1), [0.0, 0.0, 1.0, 1.0]);
        assert_eq!(image.pixel_float(0, 0), [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(image.texel(3, 1), [0, 0, 255, 255]);
    }

    #[test]
    fn d24_quantization() {
        let depth = quantize_depth(Format::D24_UNORM_S8_UINT, 0.75);
        assert!((depth - 0.75).abs() < 1e-7);
        assert_eq!(quantize_depth(Format::D24_UNORM_S8_UINT, 1.5), 1.0);
        assert_eq!(quantize_depth(Format::D32_SFLOAT_S8_UINT, 0.3), 0.3);

        let image = DepthStencilImage::new(Format::D24_UNORM_S8_UINT, [2, 2], 0.5, 7);
        assert!((image.depth(1, 1) - 0.5).abs() < 1e-7);
        assert_eq!(image.stencil(0, 1), 7);
    }

    #[test]
    fn error_mask_counts_once() {
        let mut mask = ErrorMask::new([8, 8]);
        assert_eq!(mask.error_count(), 0);

        mask.mark_error(2, 3);
        mask.mark_error(2, 3);
        mask.mark_error(7, 7);
        assert_eq!(mask.error_count(), 2);
        assert!(mask.is_error(2, 3));
        assert!(!mask.is_error(3, 2));
    }

    #[test]
    fn png_output() {
        let image = ColorImage::new(Format::R8G8B8A8_UINT, [3, 5]);
        let mut out = Vec::new();
        image.write_png(&mut out).unwrap();
        assert_eq!(&out[1..4], b"PNG");

        let mut out = Vec::new();
        ErrorMask::new([2, 2]).write_png(&mut out).unwrap();
        assert!(!out.is_empty());
    }

    #[test]
    fn framebuffer_validation() {
        let mut create_info = FramebufferCreateInfo {
            extent: [64, 64],
            ..Default::default()
        };
        assert!(create_info.validate().is_ok());

        create_info.color_format = Format::R32G32_SFLOAT;
        assert!(create_info.validate().is_err());

        create_info.color_format = Format::R8G8B8A8_UINT;
        create_info.depth_stencil_format = Format::R8G8B8A8_UNORM;
        assert!(create_info.validate().is_err());
    }
}
