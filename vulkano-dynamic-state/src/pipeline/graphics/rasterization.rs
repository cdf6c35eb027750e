// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Configures how primitives are turned into fragments: culling, orientation, depth bias and
//! rasterizer discard.

use crate::{device::DeviceFeatures, macros::vulkan_enum, ValidationError};

/// The state in a graphics pipeline describing how the rasterization stage should behave.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RasterizationState {
    /// If true, all the fragments will be discarded, and the fragment shader will not be run.
    ///
    /// The default value is `false`.
    pub rasterizer_discard_enable: bool,

    /// Specifies whether front faces or back faces should be discarded, or none, or both.
    ///
    /// The default value is [`CullMode::None`].
    pub cull_mode: CullMode,

    /// Specifies which triangle orientation is considered to be the front of the triangle.
    ///
    /// The default value is [`FrontFace::CounterClockwise`].
    pub front_face: FrontFace,

    /// Whether the depth of polygon fragments is offset by `depth_bias`.
    ///
    /// The default value is `false`.
    pub depth_bias_enable: bool,

    /// The depth bias parameters, used when `depth_bias_enable` is true.
    ///
    /// The default value is [`DepthBiasState::new()`].
    pub depth_bias: DepthBiasState,
}

impl RasterizationState {
    /// Creates a `RasterizationState` with no culling, counter-clockwise front faces and depth
    /// bias disabled.
    #[inline]
    pub const fn new() -> Self {
        Self {
            rasterizer_discard_enable: false,
            cull_mode: CullMode::None,
            front_face: FrontFace::CounterClockwise,
            depth_bias_enable: false,
            depth_bias: DepthBiasState::new(),
        }
    }

    /// Sets whether rasterizer discard is enabled.
    #[inline]
    pub const fn rasterizer_discard_enable(mut self, enable: bool) -> Self {
        self.rasterizer_discard_enable = enable;
        self
    }

    /// Sets the cull mode.
    #[inline]
    pub const fn cull_mode(mut self, cull_mode: CullMode) -> Self {
        self.cull_mode = cull_mode;
        self
    }

    /// Sets the front face.
    #[inline]
    pub const fn front_face(mut self, front_face: FrontFace) -> Self {
        self.front_face = front_face;
        self
    }

    /// Sets whether depth bias is enabled, and the parameters it uses.
    #[inline]
    pub const fn depth_bias(mut self, enable: bool, depth_bias: DepthBiasState) -> Self {
        self.depth_bias_enable = enable;
        self.depth_bias = depth_bias;
        self
    }

    pub(crate) fn validate(&self, features: &DeviceFeatures) -> Result<(), Box<ValidationError>> {
        if self.depth_bias.clamp != 0.0 && !features.depth_bias_clamp {
            return Err(ValidationError::new(
                "depth_bias.clamp",
                "is not 0.0, but the `depth_bias_clamp` feature is not enabled",
            ));
        }

        Ok(())
    }
}

impl Default for RasterizationState {
    /// Returns [`RasterizationState::new()`].
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

/// The values of the depth bias parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DepthBiasState {
    /// Specifies a constant factor to be multiplied to every depth value.
    ///
    /// The default value is `0.0`.
    pub constant_factor: f32,

    /// The maximum (or minimum) depth bias of a fragment.
    ///
    /// Setting this to a value other than 0.0 requires the
    /// [`depth_bias_clamp`](crate::device::DeviceFeatures::depth_bias_clamp) feature to be enabled
    /// on the device.
    ///
    /// The default value is `0.0`.
    pub clamp: f32,

    /// A scalar factor to multiply with a fragment's slope in depth bias calculations.
    ///
    /// The default value is `0.0`.
    pub slope_factor: f32,
}

impl DepthBiasState {
    /// Returns a `DepthBiasState` that does not change depth.
    #[inline]
    pub const fn new() -> Self {
        Self {
            constant_factor: 0.0,
            clamp: 0.0,
            slope_factor: 0.0,
        }
    }

    /// Clamps a computed bias `offset` according to `clamp`.
    ///
    /// A positive clamp is an upper bound and a negative clamp a lower bound. Zero disables
    /// clamping.
    #[inline]
    pub fn clamp_offset(&self, offset: f64) -> f64 {
        let clamp = f64::from(self.clamp);

        if clamp > 0.0 {
            offset.min(clamp)
        } else if clamp < 0.0 {
            offset.max(clamp)
        } else {
            offset
        }
    }
}

impl Default for DepthBiasState {
    /// Returns [`DepthBiasState::new()`].
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

vulkan_enum! {
    /// Specifies the culling mode.
    ///
    /// This setting works in pair with `front_face`. The `front_face` setting tells the device
    /// whether clockwise or counter-clockwise correspond to the front and the back of each
    /// triangle. Then `cull_mode` lets you specify whether front faces should be discarded, back
    /// faces should be discarded, or none, or both.
    CullMode impl {
        /// Returns whether a primitive facing the given way is discarded.
        #[inline]
        pub const fn discards(self, front_facing: bool) -> bool {
            match self {
                CullMode::None => false,
                CullMode::Front => front_facing,
                CullMode::Back => !front_facing,
                CullMode::FrontAndBack => true,
            }
        }
    }
    = CullModeFlags(u32);

    /// No culling.
    None = NONE,

    /// The faces facing the front of the screen (ie. facing the user) will be removed.
    Front = FRONT,

    /// The faces facing the back of the screen will be removed.
    Back = BACK,

    /// All faces will be removed.
    FrontAndBack = FRONT_AND_BACK,
}

impl Default for CullMode {
    #[inline]
    fn default() -> CullMode {
        CullMode::None
    }
}

vulkan_enum! {
    /// Specifies which triangle orientation corresponds to the front or the triangle.
    FrontFace impl {
        /// Returns whether a triangle with the given signed framebuffer-space area is front
        /// facing.
        ///
        /// `signed_area` is `-0.5 * sum(x[i] * y[i + 1] - x[i + 1] * y[i])` over the vertices in
        /// framebuffer coordinates, which is positive for triangles that appear
        /// counter-clockwise on screen.
        #[inline]
        pub fn is_front_facing(self, signed_area: f64) -> bool {
            (signed_area > 0.0) == (self == FrontFace::CounterClockwise)
        }
    }
    = FrontFace(i32);

    /// Triangles whose vertices are oriented counter-clockwise on the screen will be considered
    /// as facing their front. Otherwise they will be considered as facing their back.
    CounterClockwise = COUNTER_CLOCKWISE,

    /// Triangles whose vertices are oriented clockwise on the screen will be considered
    /// as facing their front. Otherwise they will be considered as facing their back.
    Clockwise = CLOCKWISE,
}

impl Default for FrontFace {
    #[inline]
    fn default() -> FrontFace {
        FrontFace::CounterClockwise
    }
}
