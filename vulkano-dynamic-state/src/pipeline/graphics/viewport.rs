// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Viewports and scissor boxes.
//!
//! The viewport is the area of the framebuffer that normalized device coordinates are mapped
//! to. The scissor box is an additional rectangle outside of which fragments are discarded. A
//! primitive is routed to one viewport and the scissor box of the same index, by default the
//! first.
//!
//! When [`DynamicState::ViewportWithCount`] or [`DynamicState::ScissorWithCount`] is dynamic, the
//! pipeline's list must be empty, and the number of viewports or scissors comes from the command
//! buffer along with their values.
//!
//! [`DynamicState::ViewportWithCount`]: crate::pipeline::DynamicState::ViewportWithCount
//! [`DynamicState::ScissorWithCount`]: crate::pipeline::DynamicState::ScissorWithCount

use smallvec::SmallVec;
use std::ops::Range;

/// List of viewports and scissors that are used when creating a graphics pipeline object.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewportState {
    /// Specifies the viewport transforms.
    ///
    /// The default value is empty.
    pub viewports: SmallVec<[Viewport; 2]>,

    /// Specifies the scissor rectangles.
    ///
    /// The default value is empty.
    pub scissors: SmallVec<[Scissor; 2]>,
}

impl ViewportState {
    /// Returns a default `ViewportState`.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }
}

/// State of a single viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    /// Coordinates in pixels of the top-left hand corner of the viewport.
    pub origin: [f32; 2],

    /// Dimensions in pixels of the viewport.
    pub dimensions: [f32; 2],

    /// Minimum and maximum values of the depth.
    ///
    /// The values `0.0` to `1.0` of each vertex's Z coordinate will be mapped to this
    /// `depth_range` before being compared to the existing depth value.
    pub depth_range: Range<f32>,
}

impl Viewport {
    /// Returns a viewport covering an area of the given size at the given origin, with the
    /// `0.0..1.0` depth range.
    #[inline]
    pub fn new(origin: [f32; 2], dimensions: [f32; 2]) -> Self {
        Viewport {
            origin,
            dimensions,
            depth_range: 0.0..1.0,
        }
    }

    /// Maps normalized device coordinates to framebuffer coordinates.
    #[inline]
    pub fn transform(&self, ndc: [f32; 3]) -> [f64; 3] {
        let [x, y, z] = ndc.map(f64::from);
        let [ox, oy] = self.origin.map(f64::from);
        let [w, h] = self.dimensions.map(f64::from);
        let min_depth = f64::from(self.depth_range.start);
        let max_depth = f64::from(self.depth_range.end);

        [
            ox + (x + 1.0) * w / 2.0,
            oy + (y + 1.0) * h / 2.0,
            min_depth + z * (max_depth - min_depth),
        ]
    }

    /// Returns whether the pixel center `(x + 0.5, y + 0.5)` is inside the viewport's rectangle.
    #[inline]
    pub fn contains_pixel(&self, x: u32, y: u32) -> bool {
        let cx = f64::from(x) + 0.5;
        let cy = f64::from(y) + 0.5;
        let [ox, oy] = self.origin.map(f64::from);
        let [w, h] = self.dimensions.map(f64::from);

        cx >= ox && cx < ox + w && cy >= oy && cy < oy + h
    }
}

impl From<&Viewport> for ash::vk::Viewport {
    #[inline]
    fn from(val: &Viewport) -> Self {
        ash::vk::Viewport {
            x: val.origin[0],
            y: val.origin[1],
            width: val.dimensions[0],
            height: val.dimensions[1],
            min_depth: val.depth_range.start,
            max_depth: val.depth_range.end,
        }
    }
}

/// State of a single scissor box.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Scissor {
    /// Coordinates in pixels of the top-left hand corner of the box.
    pub origin: [u32; 2],

    /// Dimensions in pixels of the box.
    pub dimensions: [u32; 2],
}

impl Scissor {
    #[inline]
    pub const fn new(origin: [u32; 2], dimensions: [u32; 2]) -> Self {
        Scissor { origin, dimensions }
    }

    /// Returns whether the pixel at the given coordinates is inside the box.
    #[inline]
    pub const fn contains_pixel(&self, x: u32, y: u32) -> bool {
        x >= self.origin[0]
            && (x - self.origin[0]) < self.dimensions[0]
            && y >= self.origin[1]
            && (y - self.origin[1]) < self.dimensions[1]
    }
}

impl From<Scissor> for ash::vk::Rect2D {
    #[inline]
    fn from(val: Scissor) -> Self {
        ash::vk::Rect2D {
            offset: ash::vk::Offset2D {
                x: val.origin[0] as i32,
                y: val.origin[1] as i32,
            },
            extent: ash::vk::Extent2D {
                width: val.dimensions[0],
                height: val.dimensions[1],
            },
        }
    }
}
