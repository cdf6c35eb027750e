// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

use crate::{
    command_buffer::{Command, RecordingCommandBuffer, Result},
    pipeline::{
        graphics::{
            color_blend::LogicOp,
            depth_stencil::{CompareOp, StencilFaces, StencilOps},
            input_assembly::PrimitiveTopology,
            rasterization::{CullMode, DepthBiasState, FrontFace},
            vertex_input::VertexInputState,
            viewport::{Scissor, Viewport},
        },
        DynamicState,
    },
    ValidationError,
};
use smallvec::SmallVec;

/// # Commands to set dynamic state for pipelines
///
/// A value set here is used by later draws whose bound pipeline has the state dynamic. Binding a
/// pipeline that has the state fixed invalidates the value.
impl RecordingCommandBuffer {
    // Helper function for dynamic state setting.
    fn validate_dynamic_state(&self, command: &'static str, state: DynamicState) -> Result {
        match state.required_feature() {
            Some(feature) => self.validate_feature(command, feature),
            None => Ok(()),
        }
    }

    /// Sets the dynamic cull mode for future draw calls.
    pub fn set_cull_mode(&mut self, cull_mode: CullMode) -> Result<&mut Self> {
        self.validate_dynamic_state("set_cull_mode", DynamicState::CullMode)?;

        Ok(self.set_cull_mode_unchecked(cull_mode))
    }

    pub fn set_cull_mode_unchecked(&mut self, cull_mode: CullMode) -> &mut Self {
        self.record(Command::SetCullMode(cull_mode))
    }

    /// Sets the dynamic depth bias values for future draw calls.
    pub fn set_depth_bias(&mut self, depth_bias: DepthBiasState) -> Result<&mut Self> {
        self.validate_set_depth_bias(&depth_bias)?;

        Ok(self.set_depth_bias_unchecked(depth_bias))
    }

    fn validate_set_depth_bias(&self, depth_bias: &DepthBiasState) -> Result {
        if depth_bias.clamp != 0.0 && !self.enabled_features().depth_bias_clamp {
            return Err(ValidationError::new(
                "depth_bias.clamp",
                "is not 0.0, but the `depth_bias_clamp` feature is not enabled on the device",
            ));
        }

        Ok(())
    }

    pub fn set_depth_bias_unchecked(&mut self, depth_bias: DepthBiasState) -> &mut Self {
        self.record(Command::SetDepthBias(depth_bias))
    }

    /// Sets whether dynamic depth bias is enabled for future draw calls.
    pub fn set_depth_bias_enable(&mut self, enable: bool) -> Result<&mut Self> {
        self.validate_dynamic_state("set_depth_bias_enable", DynamicState::DepthBiasEnable)?;

        Ok(self.set_depth_bias_enable_unchecked(enable))
    }

    pub fn set_depth_bias_enable_unchecked(&mut self, enable: bool) -> &mut Self {
        self.record(Command::SetDepthBiasEnable(enable))
    }

    /// Sets whether dynamic depth bounds testing is enabled for future draw calls.
    pub fn set_depth_bounds_test_enable(&mut self, enable: bool) -> Result<&mut Self> {
        self.validate_dynamic_state(
            "set_depth_bounds_test_enable",
            DynamicState::DepthBoundsTestEnable,
        )?;

        if enable && !self.enabled_features().depth_bounds {
            return Err(ValidationError::new(
                "enable",
                "is `true`, but the `depth_bounds` feature is not enabled on the device",
            ));
        }

        Ok(self.set_depth_bounds_test_enable_unchecked(enable))
    }

    pub fn set_depth_bounds_test_enable_unchecked(&mut self, enable: bool) -> &mut Self {
        self.record(Command::SetDepthBoundsTestEnable(enable))
    }

    /// Sets the dynamic depth compare op for future draw calls.
    pub fn set_depth_compare_op(&mut self, compare_op: CompareOp) -> Result<&mut Self> {
        self.validate_dynamic_state("set_depth_compare_op", DynamicState::DepthCompareOp)?;

        Ok(self.set_depth_compare_op_unchecked(compare_op))
    }

    pub fn set_depth_compare_op_unchecked(&mut self, compare_op: CompareOp) -> &mut Self {
        self.record(Command::SetDepthCompareOp(compare_op))
    }

    /// Sets whether dynamic depth testing is enabled for future draw calls.
    pub fn set_depth_test_enable(&mut self, enable: bool) -> Result<&mut Self> {
        self.validate_dynamic_state("set_depth_test_enable", DynamicState::DepthTestEnable)?;

        Ok(self.set_depth_test_enable_unchecked(enable))
    }

    pub fn set_depth_test_enable_unchecked(&mut self, enable: bool) -> &mut Self {
        self.record(Command::SetDepthTestEnable(enable))
    }

    /// Sets whether dynamic depth write is enabled for future draw calls.
    pub fn set_depth_write_enable(&mut self, enable: bool) -> Result<&mut Self> {
        self.validate_dynamic_state("set_depth_write_enable", DynamicState::DepthWriteEnable)?;

        Ok(self.set_depth_write_enable_unchecked(enable))
    }

    pub fn set_depth_write_enable_unchecked(&mut self, enable: bool) -> &mut Self {
        self.record(Command::SetDepthWriteEnable(enable))
    }

    /// Sets the dynamic front face for future draw calls.
    pub fn set_front_face(&mut self, face: FrontFace) -> Result<&mut Self> {
        self.validate_dynamic_state("set_front_face", DynamicState::FrontFace)?;

        Ok(self.set_front_face_unchecked(face))
    }

    pub fn set_front_face_unchecked(&mut self, face: FrontFace) -> &mut Self {
        self.record(Command::SetFrontFace(face))
    }

    /// Sets the dynamic logic op for future draw calls.
    pub fn set_logic_op(&mut self, logic_op: LogicOp) -> Result<&mut Self> {
        self.validate_dynamic_state("set_logic_op", DynamicState::LogicOp)?;

        Ok(self.set_logic_op_unchecked(logic_op))
    }

    pub fn set_logic_op_unchecked(&mut self, logic_op: LogicOp) -> &mut Self {
        self.record(Command::SetLogicOp(logic_op))
    }

    /// Sets the dynamic number of patch control points for future draw calls.
    pub fn set_patch_control_points(&mut self, num: u32) -> Result<&mut Self> {
        self.validate_dynamic_state(
            "set_patch_control_points",
            DynamicState::PatchControlPoints,
        )?;

        if num == 0 {
            return Err(ValidationError::new("num", "is zero"));
        }

        Ok(self.set_patch_control_points_unchecked(num))
    }

    pub fn set_patch_control_points_unchecked(&mut self, num: u32) -> &mut Self {
        self.record(Command::SetPatchControlPoints(num))
    }

    /// Sets whether dynamic primitive restart is enabled for future draw calls.
    pub fn set_primitive_restart_enable(&mut self, enable: bool) -> Result<&mut Self> {
        self.validate_dynamic_state(
            "set_primitive_restart_enable",
            DynamicState::PrimitiveRestartEnable,
        )?;

        Ok(self.set_primitive_restart_enable_unchecked(enable))
    }

    pub fn set_primitive_restart_enable_unchecked(&mut self, enable: bool) -> &mut Self {
        self.record(Command::SetPrimitiveRestartEnable(enable))
    }

    /// Sets the dynamic primitive topology for future draw calls.
    pub fn set_primitive_topology(&mut self, topology: PrimitiveTopology) -> Result<&mut Self> {
        self.validate_dynamic_state("set_primitive_topology", DynamicState::PrimitiveTopology)?;

        Ok(self.set_primitive_topology_unchecked(topology))
    }

    pub fn set_primitive_topology_unchecked(&mut self, topology: PrimitiveTopology) -> &mut Self {
        self.record(Command::SetPrimitiveTopology(topology))
    }

    /// Sets whether dynamic rasterizer discard is enabled for future draw calls.
    pub fn set_rasterizer_discard_enable(&mut self, enable: bool) -> Result<&mut Self> {
        self.validate_dynamic_state(
            "set_rasterizer_discard_enable",
            DynamicState::RasterizerDiscardEnable,
        )?;

        Ok(self.set_rasterizer_discard_enable_unchecked(enable))
    }

    pub fn set_rasterizer_discard_enable_unchecked(&mut self, enable: bool) -> &mut Self {
        self.record(Command::SetRasterizerDiscardEnable(enable))
    }

    /// Sets the dynamic scissors for future draw calls. Their number replaces the number of
    /// scissors of the pipeline.
    pub fn set_scissor_with_count(&mut self, scissors: &[Scissor]) -> Result<&mut Self> {
        self.validate_dynamic_state("set_scissor_with_count", DynamicState::ScissorWithCount)?;
        self.validate_count("scissors", scissors.len())?;

        Ok(self.set_scissor_with_count_unchecked(scissors))
    }

    pub fn set_scissor_with_count_unchecked(&mut self, scissors: &[Scissor]) -> &mut Self {
        self.record(Command::SetScissorWithCount(scissors.iter().copied().collect()))
    }

    /// Sets the dynamic stencil ops for future draw calls.
    pub fn set_stencil_op(&mut self, faces: StencilFaces, ops: StencilOps) -> Result<&mut Self> {
        self.validate_dynamic_state("set_stencil_op", DynamicState::StencilOp)?;

        Ok(self.set_stencil_op_unchecked(faces, ops))
    }

    pub fn set_stencil_op_unchecked(&mut self, faces: StencilFaces, ops: StencilOps) -> &mut Self {
        self.record(Command::SetStencilOp { faces, ops })
    }

    /// Sets whether dynamic stencil testing is enabled for future draw calls.
    pub fn set_stencil_test_enable(&mut self, enable: bool) -> Result<&mut Self> {
        self.validate_dynamic_state("set_stencil_test_enable", DynamicState::StencilTestEnable)?;

        Ok(self.set_stencil_test_enable_unchecked(enable))
    }

    pub fn set_stencil_test_enable_unchecked(&mut self, enable: bool) -> &mut Self {
        self.record(Command::SetStencilTestEnable(enable))
    }

    /// Sets the whole dynamic vertex input state for future draw calls.
    ///
    /// The strides of the bindings also count as setting
    /// [`DynamicState::VertexInputBindingStride`].
    pub fn set_vertex_input(&mut self, vertex_input_state: &VertexInputState) -> Result<&mut Self> {
        self.validate_dynamic_state("set_vertex_input", DynamicState::VertexInput)?;
        vertex_input_state
            .validate()
            .map_err(|err| err.add_context("vertex_input_state"))?;

        Ok(self.set_vertex_input_unchecked(vertex_input_state))
    }

    pub fn set_vertex_input_unchecked(
        &mut self,
        vertex_input_state: &VertexInputState,
    ) -> &mut Self {
        self.record(Command::SetVertexInput(vertex_input_state.clone()))
    }

    /// Sets the dynamic viewports for future draw calls. Their number replaces the number of
    /// viewports of the pipeline.
    pub fn set_viewport_with_count(&mut self, viewports: &[Viewport]) -> Result<&mut Self> {
        self.validate_dynamic_state("set_viewport_with_count", DynamicState::ViewportWithCount)?;
        self.validate_count("viewports", viewports.len())?;

        Ok(self.set_viewport_with_count_unchecked(viewports))
    }

    pub fn set_viewport_with_count_unchecked(&mut self, viewports: &[Viewport]) -> &mut Self {
        self.record(Command::SetViewportWithCount(
            viewports.iter().cloned().collect::<SmallVec<_>>(),
        ))
    }

    fn validate_count(&self, context: &'static str, count: usize) -> Result {
        if count == 0 {
            return Err(ValidationError::new(context, "is empty"));
        }

        if count > self.properties().max_viewports as usize {
            return Err(ValidationError::new(
                context,
                format!(
                    "has {} elements, which exceeds the `max_viewports` limit of {}",
                    count,
                    self.properties().max_viewports,
                ),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        command_buffer::{Command, RecordingCommandBuffer},
        device::DeviceFeatures,
        pipeline::{
            graphics::{
                color_blend::LogicOp,
                depth_stencil::{CompareOp, StencilFaces, StencilOp, StencilOps},
                rasterization::{CullMode, DepthBiasState},
                viewport::Viewport,
            },
            DynamicState,
        },
        software::SoftwareDevice,
    };

    #[test]
    fn records_in_order() {
        let device = SoftwareDevice::new();
        let mut builder = RecordingCommandBuffer::new(&device);
        builder
            .set_cull_mode(CullMode::Back)
            .unwrap()
            .set_stencil_op(
                StencilFaces::Front,
                StencilOps {
                    pass_op: StencilOp::Replace,
                    compare_op: CompareOp::Equal,
                    ..StencilOps::new()
                },
            )
            .unwrap();

        let states: Vec<_> = builder
            .commands()
            .iter()
            .filter_map(Command::dynamic_state)
            .collect();
        assert_eq!(states, [DynamicState::CullMode, DynamicState::StencilOp]);
    }

    #[test]
    fn missing_features() {
        let mut features = DeviceFeatures::all();
        features.extended_dynamic_state2_logic_op = false;
        features.depth_bias_clamp = false;
        let device = SoftwareDevice::with_features(features);

        let mut builder = RecordingCommandBuffer::new(&device);
        assert!(builder.set_logic_op(LogicOp::Or).is_err());
        assert!(builder
            .set_depth_bias(DepthBiasState {
                clamp: 0.5,
                ..DepthBiasState::new()
            })
            .is_err());
        assert!(builder.set_depth_bias(DepthBiasState::new()).is_ok());
    }

    #[test]
    fn viewport_counts() {
        let device = SoftwareDevice::new();
        let mut builder = RecordingCommandBuffer::new(&device);
        assert!(builder.set_viewport_with_count(&[]).is_err());

        let viewports = vec![Viewport::new([0.0, 0.0], [1.0, 1.0]); 17];
        assert!(builder.set_viewport_with_count(&viewports).is_err());
        assert!(builder.set_viewport_with_count(&viewports[..2]).is_ok());
    }
}
