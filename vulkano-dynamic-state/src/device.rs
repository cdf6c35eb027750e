// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! The interface between the tests and the implementation under test.
//!
//! A test only needs a narrow slice of a Vulkan device: querying what is supported, creating
//! buffers, pipelines and framebuffers, submitting a command buffer and reading the attachments
//! back once it has completed. The [`Device`] trait captures exactly that, so that the same test
//! tree can drive a real driver or the [`SoftwareDevice`](crate::software::SoftwareDevice).

use crate::{
    buffer::{Buffer, BufferId},
    command_buffer::CommandBuffer,
    format::{Format, FormatFeatures},
    image::{ColorImage, DepthStencilImage, FramebufferCreateInfo, FramebufferId},
    pipeline::{GraphicsPipelineCreateInfo, PipelineId},
    ExecutionError, ValidationError,
};

/// The device features that the tests may depend on.
///
/// The names are those of the corresponding members of the Vulkan feature structures, in
/// snake case.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DeviceFeatures {
    pub extended_dynamic_state: bool,
    pub extended_dynamic_state2: bool,
    pub extended_dynamic_state2_logic_op: bool,
    pub extended_dynamic_state2_patch_control_points: bool,
    pub vertex_input_dynamic_state: bool,
    pub mesh_shader: bool,
    pub depth_bounds: bool,
    pub geometry_shader: bool,
    pub tessellation_shader: bool,
    pub depth_bias_clamp: bool,
    pub graphics_pipeline_library: bool,
}

impl DeviceFeatures {
    /// Returns a `DeviceFeatures` with none of the features enabled.
    #[inline]
    pub const fn empty() -> Self {
        DeviceFeatures {
            extended_dynamic_state: false,
            extended_dynamic_state2: false,
            extended_dynamic_state2_logic_op: false,
            extended_dynamic_state2_patch_control_points: false,
            vertex_input_dynamic_state: false,
            mesh_shader: false,
            depth_bounds: false,
            geometry_shader: false,
            tessellation_shader: false,
            depth_bias_clamp: false,
            graphics_pipeline_library: false,
        }
    }

    /// Returns a `DeviceFeatures` with all of the features enabled.
    #[inline]
    pub const fn all() -> Self {
        DeviceFeatures {
            extended_dynamic_state: true,
            extended_dynamic_state2: true,
            extended_dynamic_state2_logic_op: true,
            extended_dynamic_state2_patch_control_points: true,
            vertex_input_dynamic_state: true,
            mesh_shader: true,
            depth_bounds: true,
            geometry_shader: true,
            tessellation_shader: true,
            depth_bias_clamp: true,
            graphics_pipeline_library: true,
        }
    }

    /// Returns whether the feature with the given name is enabled. Unknown names return
    /// `false`.
    pub fn is_enabled(&self, name: &str) -> bool {
        match name {
            "extended_dynamic_state" => self.extended_dynamic_state,
            "extended_dynamic_state2" => self.extended_dynamic_state2,
            "extended_dynamic_state2_logic_op" => self.extended_dynamic_state2_logic_op,
            "extended_dynamic_state2_patch_control_points" => {
                self.extended_dynamic_state2_patch_control_points
            }
            "vertex_input_dynamic_state" => self.vertex_input_dynamic_state,
            "mesh_shader" => self.mesh_shader,
            "depth_bounds" => self.depth_bounds,
            "geometry_shader" => self.geometry_shader,
            "tessellation_shader" => self.tessellation_shader,
            "depth_bias_clamp" => self.depth_bias_clamp,
            "graphics_pipeline_library" => self.graphics_pipeline_library,
            _ => false,
        }
    }
}

/// The device limits that the tests may depend on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DeviceProperties {
    /// The maximum number of viewports and scissors a pipeline can use.
    pub max_viewports: u32,
}

impl Default for DeviceProperties {
    #[inline]
    fn default() -> Self {
        DeviceProperties { max_viewports: 16 }
    }
}

/// A device that can execute the tests.
///
/// Submission is synchronous: when [`submit`](Device::submit) returns, the commands have
/// completed and the attachments of every framebuffer they rendered to can be read back.
pub trait Device {
    /// Returns the features that are enabled on the device.
    fn enabled_features(&self) -> &DeviceFeatures;

    /// Returns the limits of the device.
    fn properties(&self) -> &DeviceProperties;

    /// Returns the features that `format` supports with optimal tiling, or with buffers for
    /// vertex formats.
    fn format_features(&self, format: Format) -> FormatFeatures;

    /// Creates a buffer holding `buffer`'s contents.
    fn create_buffer(&mut self, buffer: Buffer) -> Result<BufferId, Box<ValidationError>>;

    /// Creates a graphics pipeline.
    fn create_graphics_pipeline(
        &mut self,
        create_info: GraphicsPipelineCreateInfo,
    ) -> Result<PipelineId, Box<ValidationError>>;

    /// Creates a framebuffer with one color and one depth/stencil attachment.
    fn create_framebuffer(
        &mut self,
        create_info: FramebufferCreateInfo,
    ) -> Result<FramebufferId, Box<ValidationError>>;

    /// Executes `command_buffer` and waits for it to complete.
    fn submit(&mut self, command_buffer: &CommandBuffer) -> Result<(), ExecutionError>;

    /// Reads back the color attachment of `framebuffer`.
    fn read_color_attachment(&self, framebuffer: FramebufferId)
        -> Result<ColorImage, ExecutionError>;

    /// Reads back the depth/stencil attachment of `framebuffer`.
    fn read_depth_stencil_attachment(
        &self,
        framebuffer: FramebufferId,
    ) -> Result<DepthStencilImage, ExecutionError>;
}

#[cfg(test)]
mod tests {
    use super::DeviceFeatures;

    #[test]
    fn feature_lookup_by_name() {
        let mut features = DeviceFeatures::empty();
        assert!(!features.is_enabled("mesh_shader"));

        features.mesh_shader = true;
        assert!(features.is_enabled("mesh_shader"));
        assert!(!features.is_enabled("geometry_shader"));
        assert!(!features.is_enabled("no_such_feature"));

        let all = DeviceFeatures::all();
        assert!(all.is_enabled("extended_dynamic_state2_logic_op"));
        assert_eq!(DeviceFeatures::default(), DeviceFeatures::empty());
    }
}
