// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! The formats of the attachments and vertex attributes used by the test suite.
//!
//! Only the handful of formats that the tests render to, read back from or fetch vertices with
//! are described here. Each one converts losslessly to and from its `ash::vk::Format`
//! counterpart.

use crate::{macros::vulkan_bitflags, DeviceSize};

/// An image or vertex attribute format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
#[repr(i32)]
pub enum Format {
    R8G8B8A8_UNORM = ash::vk::Format::R8G8B8A8_UNORM.as_raw(),
    R8G8B8A8_UINT = ash::vk::Format::R8G8B8A8_UINT.as_raw(),
    R32G32_SFLOAT = ash::vk::Format::R32G32_SFLOAT.as_raw(),
    R32G32B32A32_SFLOAT = ash::vk::Format::R32G32B32A32_SFLOAT.as_raw(),
    D24_UNORM_S8_UINT = ash::vk::Format::D24_UNORM_S8_UINT.as_raw(),
    D32_SFLOAT_S8_UINT = ash::vk::Format::D32_SFLOAT_S8_UINT.as_raw(),
}

impl Format {
    /// Returns the size in bytes of one texel or one vertex attribute element.
    ///
    /// For combined depth/stencil formats this is the size of the packed representation used
    /// by the software device, not an implementation's internal layout.
    #[inline]
    pub const fn block_size(self) -> DeviceSize {
        match self {
            Format::R8G8B8A8_UNORM | Format::R8G8B8A8_UINT => 4,
            Format::R32G32_SFLOAT => 8,
            Format::R32G32B32A32_SFLOAT => 16,
            Format::D24_UNORM_S8_UINT => 4,
            Format::D32_SFLOAT_S8_UINT => 8,
        }
    }

    /// Returns the number of color components, or 0 for depth/stencil formats.
    #[inline]
    pub const fn components(self) -> u32 {
        match self {
            Format::R8G8B8A8_UNORM | Format::R8G8B8A8_UINT | Format::R32G32B32A32_SFLOAT => 4,
            Format::R32G32_SFLOAT => 2,
            Format::D24_UNORM_S8_UINT | Format::D32_SFLOAT_S8_UINT => 0,
        }
    }

    /// Returns the numeric format of the color components.
    #[inline]
    pub const fn numeric_format_color(self) -> Option<NumericFormat> {
        match self {
            Format::R8G8B8A8_UNORM => Some(NumericFormat::UNORM),
            Format::R8G8B8A8_UINT => Some(NumericFormat::UINT),
            Format::R32G32_SFLOAT | Format::R32G32B32A32_SFLOAT => Some(NumericFormat::SFLOAT),
            Format::D24_UNORM_S8_UINT | Format::D32_SFLOAT_S8_UINT => None,
        }
    }

    /// Returns the numeric format of the depth component, if any.
    #[inline]
    pub const fn numeric_format_depth(self) -> Option<NumericFormat> {
        match self {
            Format::D24_UNORM_S8_UINT => Some(NumericFormat::UNORM),
            Format::D32_SFLOAT_S8_UINT => Some(NumericFormat::SFLOAT),
            _ => None,
        }
    }

    /// Returns whether the format has both a depth and a stencil component.
    #[inline]
    pub const fn is_depth_stencil(self) -> bool {
        self.numeric_format_depth().is_some()
    }
}

impl From<Format> for ash::vk::Format {
    #[inline]
    fn from(val: Format) -> Self {
        ash::vk::Format::from_raw(val as i32)
    }
}

impl TryFrom<ash::vk::Format> for Format {
    type Error = ();

    #[inline]
    fn try_from(val: ash::vk::Format) -> Result<Self, Self::Error> {
        Ok(match val {
            ash::vk::Format::R8G8B8A8_UNORM => Format::R8G8B8A8_UNORM,
            ash::vk::Format::R8G8B8A8_UINT => Format::R8G8B8A8_UINT,
            ash::vk::Format::R32G32_SFLOAT => Format::R32G32_SFLOAT,
            ash::vk::Format::R32G32B32A32_SFLOAT => Format::R32G32B32A32_SFLOAT,
            ash::vk::Format::D24_UNORM_S8_UINT => Format::D24_UNORM_S8_UINT,
            ash::vk::Format::D32_SFLOAT_S8_UINT => Format::D32_SFLOAT_S8_UINT,
            _ => return Err(()),
        })
    }
}

/// The numeric representation of the components of a format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(clippy::upper_case_acronyms)]
pub enum NumericFormat {
    /// Unsigned normalized integer, read as a float between 0.0 and 1.0.
    UNORM,
    /// Unsigned integer.
    UINT,
    /// Signed floating-point.
    SFLOAT,
}

vulkan_bitflags! {
    /// The features supported by a device for a given format.
    FormatFeatures = FormatFeatureFlags(u32);

    /// Can be used as a vertex attribute format.
    VERTEX_BUFFER = VERTEX_BUFFER,

    /// Can be used as a color attachment.
    COLOR_ATTACHMENT = COLOR_ATTACHMENT,

    /// Can be used as a depth/stencil attachment.
    DEPTH_STENCIL_ATTACHMENT = DEPTH_STENCIL_ATTACHMENT,

    /// Can be used as the source of a transfer command.
    TRANSFER_SRC = TRANSFER_SRC,
}

#[cfg(test)]
mod tests {
    use super::{Format, FormatFeatures, NumericFormat};

    #[test]
    fn ash_round_trip() {
        for format in [
            Format::R8G8B8A8_UNORM,
            Format::R8G8B8A8_UINT,
            Format::D24_UNORM_S8_UINT,
            Format::D32_SFLOAT_S8_UINT,
        ] {
            let vk: ash::vk::Format = format.into();
            assert_eq!(Format::try_from(vk), Ok(format));
        }

        assert!(Format::try_from(ash::vk::Format::B8G8R8A8_SRGB).is_err());
    }

    #[test]
    fn depth_stencil_queries() {
        assert!(Format::D32_SFLOAT_S8_UINT.is_depth_stencil());
        assert!(!Format::R8G8B8A8_UINT.is_depth_stencil());
        assert_eq!(
            Format::D24_UNORM_S8_UINT.numeric_format_depth(),
            Some(NumericFormat::UNORM),
        );
        assert_eq!(
            Format::R8G8B8A8_UINT.numeric_format_color(),
            Some(NumericFormat::UINT),
        );
    }

    #[test]
    fn feature_flags() {
        let features = FormatFeatures::COLOR_ATTACHMENT | FormatFeatures::TRANSFER_SRC;
        assert!(features.contains(FormatFeatures::COLOR_ATTACHMENT));
        let depth_stencil = FormatFeatures::DEPTH_STENCIL_ATTACHMENT;
        assert!(!features.intersects(depth_stencil));
        assert_eq!(
            format!("{:?}", features),
            "COLOR_ATTACHMENT | TRANSFER_SRC",
        );
    }
}
