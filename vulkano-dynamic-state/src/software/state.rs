// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

use crate::{
    command_buffer::Command,
    pipeline::{
        graphics::{
            color_blend::LogicOp,
            depth_stencil::{CompareOp, StencilOpState, StencilOps},
            input_assembly::PrimitiveTopology,
            rasterization::{CullMode, DepthBiasState, FrontFace},
            vertex_input::VertexInputState,
            viewport::{Scissor, Viewport},
        },
        DynamicState, DynamicStateMode, GraphicsPipeline,
    },
    DeviceSize, ExecutionError,
};
use smallvec::SmallVec;
use std::ops::RangeInclusive;

/// The values of dynamic state set in a command buffer so far.
///
/// `None` means the state was never set, or was invalidated by binding a pipeline that has it
/// fixed.
#[derive(Clone, Debug, Default)]
pub(super) struct DynamicValues {
    cull_mode: Option<CullMode>,
    front_face: Option<FrontFace>,
    primitive_topology: Option<PrimitiveTopology>,
    viewports: Option<SmallVec<[Viewport; 2]>>,
    scissors: Option<SmallVec<[Scissor; 2]>>,
    binding_strides: SmallVec<[(u32, DeviceSize); 6]>,
    depth_test_enable: Option<bool>,
    depth_write_enable: Option<bool>,
    depth_compare_op: Option<CompareOp>,
    depth_bounds_test_enable: Option<bool>,
    stencil_test_enable: Option<bool>,
    stencil_ops_front: Option<StencilOps>,
    stencil_ops_back: Option<StencilOps>,
    depth_bias_enable: Option<bool>,
    depth_bias: Option<DepthBiasState>,
    rasterizer_discard_enable: Option<bool>,
    primitive_restart_enable: Option<bool>,
    logic_op: Option<LogicOp>,
    patch_control_points: Option<u32>,
    vertex_input: Option<VertexInputState>,
}

impl DynamicValues {
    /// Records the value set by `command`, if it sets dynamic state.
    pub(super) fn apply(&mut self, command: &Command) {
        match command {
            Command::SetCullMode(cull_mode) => self.cull_mode = Some(*cull_mode),
            Command::SetFrontFace(front_face) => self.front_face = Some(*front_face),
            Command::SetPrimitiveTopology(topology) => self.primitive_topology = Some(*topology),
            Command::SetViewportWithCount(viewports) => self.viewports = Some(viewports.clone()),
            Command::SetScissorWithCount(scissors) => self.scissors = Some(scissors.clone()),
            Command::SetDepthTestEnable(enable) => self.depth_test_enable = Some(*enable),
            Command::SetDepthWriteEnable(enable) => self.depth_write_enable = Some(*enable),
            Command::SetDepthCompareOp(compare_op) => self.depth_compare_op = Some(*compare_op),
            Command::SetDepthBoundsTestEnable(enable) => {
                self.depth_bounds_test_enable = Some(*enable)
            }
            Command::SetStencilTestEnable(enable) => self.stencil_test_enable = Some(*enable),
            Command::SetStencilOp { faces, ops } => {
                if faces.includes_front() {
                    self.stencil_ops_front = Some(*ops);
                }

                if faces.includes_back() {
                    self.stencil_ops_back = Some(*ops);
                }
            }
            Command::SetDepthBiasEnable(enable) => self.depth_bias_enable = Some(*enable),
            Command::SetDepthBias(depth_bias) => self.depth_bias = Some(*depth_bias),
            Command::SetRasterizerDiscardEnable(enable) => {
                self.rasterizer_discard_enable = Some(*enable)
            }
            Command::SetPrimitiveRestartEnable(enable) => {
                self.primitive_restart_enable = Some(*enable)
            }
            Command::SetLogicOp(logic_op) => self.logic_op = Some(*logic_op),
            Command::SetPatchControlPoints(num) => self.patch_control_points = Some(*num),
            Command::SetVertexInput(vertex_input_state) => {
                // The new state carries its own strides, which replace any set before.
                self.binding_strides.clear();
                self.vertex_input = Some(vertex_input_state.clone());
            }
            Command::BindVertexBuffers {
                first_binding,
                buffers: _,
                strides: Some(strides),
            } => {
                for (binding, &stride) in (*first_binding..).zip(strides.iter()) {
                    match self.binding_strides.iter_mut().find(|(b, _)| *b == binding) {
                        Some((_, existing)) => *existing = stride,
                        None => self.binding_strides.push((binding, stride)),
                    }
                }
            }
            _ => (),
        }
    }

    /// Forgets the values of every state that `pipeline` has fixed.
    pub(super) fn invalidate(&mut self, pipeline: &GraphicsPipeline) {
        for &state in DynamicState::ALL {
            if pipeline.dynamic_state_mode(state) == Some(DynamicStateMode::Fixed) {
                self.clear(state);
            }
        }
    }

    fn clear(&mut self, state: DynamicState) {
        match state {
            DynamicState::DepthBias => self.depth_bias = None,
            DynamicState::CullMode => self.cull_mode = None,
            DynamicState::FrontFace => self.front_face = None,
            DynamicState::PrimitiveTopology => self.primitive_topology = None,
            DynamicState::ViewportWithCount => self.viewports = None,
            DynamicState::ScissorWithCount => self.scissors = None,
            DynamicState::VertexInputBindingStride => self.binding_strides.clear(),
            DynamicState::DepthTestEnable => self.depth_test_enable = None,
            DynamicState::DepthWriteEnable => self.depth_write_enable = None,
            DynamicState::DepthCompareOp => self.depth_compare_op = None,
            DynamicState::DepthBoundsTestEnable => self.depth_bounds_test_enable = None,
            DynamicState::StencilTestEnable => self.stencil_test_enable = None,
            DynamicState::StencilOp => {
                self.stencil_ops_front = None;
                self.stencil_ops_back = None;
            }
            DynamicState::VertexInput => self.vertex_input = None,
            DynamicState::PatchControlPoints => self.patch_control_points = None,
            DynamicState::RasterizerDiscardEnable => self.rasterizer_discard_enable = None,
            DynamicState::DepthBiasEnable => self.depth_bias_enable = None,
            DynamicState::LogicOp => self.logic_op = None,
            DynamicState::PrimitiveRestartEnable => self.primitive_restart_enable = None,
        }
    }

    /// Combines the values set so far with the fixed state of `pipeline`, giving the state a
    /// draw executes with.
    ///
    /// Fails if the pipeline has a state dynamic that has no value.
    pub(super) fn resolve(&self, pipeline: &GraphicsPipeline) -> Result<DrawState, ExecutionError> {
        let vertex_input_state = self.resolve_vertex_input(pipeline)?;

        let (primitive_topology, primitive_restart_enable) = match pipeline.input_assembly_state()
        {
            Some(input_assembly_state) => (
                Some(pick(
                    pipeline,
                    DynamicState::PrimitiveTopology,
                    self.primitive_topology,
                    input_assembly_state.topology,
                )?),
                pick(
                    pipeline,
                    DynamicState::PrimitiveRestartEnable,
                    self.primitive_restart_enable,
                    input_assembly_state.primitive_restart_enable,
                )?,
            ),
            None => (None, false),
        };

        let patch_control_points = match pipeline.tessellation_state() {
            Some(tessellation_state) => pick(
                pipeline,
                DynamicState::PatchControlPoints,
                self.patch_control_points,
                tessellation_state.patch_control_points,
            )?,
            None => 0,
        };

        let viewport_state = pipeline.viewport_state();
        let viewports = pick(
            pipeline,
            DynamicState::ViewportWithCount,
            self.viewports.clone(),
            viewport_state.viewports.clone(),
        )?;
        let scissors = pick(
            pipeline,
            DynamicState::ScissorWithCount,
            self.scissors.clone(),
            viewport_state.scissors.clone(),
        )?;

        let rasterization_state = pipeline.rasterization_state();
        let depth_stencil_state = pipeline.depth_stencil_state();
        let color_blend_state = pipeline.color_blend_state();

        let (front_ops, back_ops) = if pipeline.dynamic_state(DynamicState::StencilOp) == Some(true)
        {
            // Setting either face satisfies the state. A face never set keeps the pipeline's ops.
            if self.stencil_ops_front.is_none() && self.stencil_ops_back.is_none() {
                return Err(ExecutionError::DynamicStateNotSet {
                    state: DynamicState::StencilOp,
                });
            }

            (
                self.stencil_ops_front.unwrap_or(depth_stencil_state.front.ops),
                self.stencil_ops_back.unwrap_or(depth_stencil_state.back.ops),
            )
        } else {
            (depth_stencil_state.front.ops, depth_stencil_state.back.ops)
        };

        Ok(DrawState {
            vertex_input_state,
            primitive_topology,
            primitive_restart_enable,
            patch_control_points,
            viewports,
            scissors,
            rasterizer_discard_enable: pick(
                pipeline,
                DynamicState::RasterizerDiscardEnable,
                self.rasterizer_discard_enable,
                rasterization_state.rasterizer_discard_enable,
            )?,
            cull_mode: pick(
                pipeline,
                DynamicState::CullMode,
                self.cull_mode,
                rasterization_state.cull_mode,
            )?,
            front_face: pick(
                pipeline,
                DynamicState::FrontFace,
                self.front_face,
                rasterization_state.front_face,
            )?,
            depth_bias_enable: pick(
                pipeline,
                DynamicState::DepthBiasEnable,
                self.depth_bias_enable,
                rasterization_state.depth_bias_enable,
            )?,
            depth_bias: pick(
                pipeline,
                DynamicState::DepthBias,
                self.depth_bias,
                rasterization_state.depth_bias,
            )?,
            depth_test_enable: pick(
                pipeline,
                DynamicState::DepthTestEnable,
                self.depth_test_enable,
                depth_stencil_state.depth_test_enable,
            )?,
            depth_write_enable: pick(
                pipeline,
                DynamicState::DepthWriteEnable,
                self.depth_write_enable,
                depth_stencil_state.depth_write_enable,
            )?,
            depth_compare_op: pick(
                pipeline,
                DynamicState::DepthCompareOp,
                self.depth_compare_op,
                depth_stencil_state.depth_compare_op,
            )?,
            depth_bounds_test_enable: pick(
                pipeline,
                DynamicState::DepthBoundsTestEnable,
                self.depth_bounds_test_enable,
                depth_stencil_state.depth_bounds_test_enable,
            )?,
            depth_bounds: depth_stencil_state.depth_bounds.clone(),
            stencil_test_enable: pick(
                pipeline,
                DynamicState::StencilTestEnable,
                self.stencil_test_enable,
                depth_stencil_state.stencil_test_enable,
            )?,
            front: StencilOpState {
                ops: front_ops,
                ..depth_stencil_state.front
            },
            back: StencilOpState {
                ops: back_ops,
                ..depth_stencil_state.back
            },
            logic_op_enable: color_blend_state.logic_op_enable,
            logic_op: pick(
                pipeline,
                DynamicState::LogicOp,
                self.logic_op,
                color_blend_state.logic_op,
            )?,
        })
    }

    fn resolve_vertex_input(
        &self,
        pipeline: &GraphicsPipeline,
    ) -> Result<Option<VertexInputState>, ExecutionError> {
        let mut vertex_input_state = match pipeline.dynamic_state(DynamicState::VertexInput) {
            None => return Ok(None),
            Some(true) => self
                .vertex_input
                .clone()
                .ok_or(ExecutionError::DynamicStateNotSet {
                    state: DynamicState::VertexInput,
                })?,
            Some(false) => match pipeline.vertex_input_state() {
                Some(vertex_input_state) => vertex_input_state.clone(),
                None => return Ok(None),
            },
        };

        let dynamic_input = pipeline.dynamic_state(DynamicState::VertexInput) == Some(true);
        let dynamic_strides =
            pipeline.dynamic_state(DynamicState::VertexInputBindingStride) == Some(true);

        if dynamic_input || dynamic_strides {
            for (binding, description) in &mut vertex_input_state.bindings {
                match self.binding_strides.iter().find(|(b, _)| b == binding) {
                    Some(&(_, stride)) => description.stride = stride as u32,
                    // With dynamic vertex input, the strides it was set with apply.
                    None if dynamic_input => (),
                    None => {
                        return Err(ExecutionError::DynamicStateNotSet {
                            state: DynamicState::VertexInputBindingStride,
                        });
                    }
                }
            }
        }

        Ok(Some(vertex_input_state))
    }
}

/// Returns the dynamic `value` if `pipeline` has `state` dynamic, and `fixed` otherwise.
fn pick<T>(
    pipeline: &GraphicsPipeline,
    state: DynamicState,
    value: Option<T>,
    fixed: T,
) -> Result<T, ExecutionError> {
    if pipeline.dynamic_state(state) == Some(true) {
        value.ok_or(ExecutionError::DynamicStateNotSet { state })
    } else {
        Ok(fixed)
    }
}

/// The complete state a draw executes with.
#[derive(Clone, Debug, PartialEq)]
pub(super) struct DrawState {
    /// `None` for pipelines without vertex input.
    pub(super) vertex_input_state: Option<VertexInputState>,
    /// `None` for pipelines without input assembly.
    pub(super) primitive_topology: Option<PrimitiveTopology>,
    pub(super) primitive_restart_enable: bool,
    /// Zero for pipelines without tessellation.
    pub(super) patch_control_points: u32,
    pub(super) viewports: SmallVec<[Viewport; 2]>,
    pub(super) scissors: SmallVec<[Scissor; 2]>,
    pub(super) rasterizer_discard_enable: bool,
    pub(super) cull_mode: CullMode,
    pub(super) front_face: FrontFace,
    pub(super) depth_bias_enable: bool,
    pub(super) depth_bias: DepthBiasState,
    pub(super) depth_test_enable: bool,
    pub(super) depth_write_enable: bool,
    pub(super) depth_compare_op: CompareOp,
    pub(super) depth_bounds_test_enable: bool,
    pub(super) depth_bounds: RangeInclusive<f32>,
    pub(super) stencil_test_enable: bool,
    pub(super) front: StencilOpState,
    pub(super) back: StencilOpState,
    pub(super) logic_op_enable: bool,
    pub(super) logic_op: LogicOp,
}

#[cfg(test)]
mod tests {
    use super::DynamicValues;
    use crate::{
        command_buffer::Command,
        device::{DeviceFeatures, DeviceProperties},
        format::NumericFormat,
        pipeline::{
            graphics::{
                depth_stencil::{
                    CompareOp, DepthStencilState, StencilFaces, StencilOpState, StencilOps,
                },
                input_assembly::{InputAssemblyState, PrimitiveTopologyClass},
                rasterization::CullMode,
                vertex_input::VertexLayout,
                viewport::{Scissor, Viewport, ViewportState},
            },
            shader::PipelineShaders,
            DynamicState, GraphicsPipeline, GraphicsPipelineCreateInfo,
        },
        ExecutionError,
    };
    use smallvec::smallvec;

    fn pipeline(dynamic_state: &[DynamicState]) -> GraphicsPipeline {
        pipeline_with_depth_stencil(dynamic_state, DepthStencilState::new())
    }

    fn pipeline_with_depth_stencil(
        dynamic_state: &[DynamicState],
        depth_stencil_state: DepthStencilState,
    ) -> GraphicsPipeline {
        let shaders = PipelineShaders::vertex(
            VertexLayout::Padded,
            NumericFormat::UNORM,
            PrimitiveTopologyClass::Triangle,
            false,
            false,
            false,
        )
        .unwrap();
        let create_info = GraphicsPipelineCreateInfo {
            vertex_input_state: Some(VertexLayout::Padded.pipeline_input_state(&[16]).unwrap()),
            input_assembly_state: Some(InputAssemblyState::new()),
            viewport_state: ViewportState {
                viewports: smallvec![Viewport::new([0.0, 0.0], [64.0, 64.0])],
                scissors: smallvec![Scissor::new([0, 0], [64, 64])],
            },
            depth_stencil_state,
            dynamic_state: dynamic_state.iter().copied().collect(),
            ..GraphicsPipelineCreateInfo::shaders(shaders)
        };

        GraphicsPipeline::new(
            create_info,
            &DeviceFeatures::all(),
            &DeviceProperties::default(),
        )
        .unwrap()
    }

    #[test]
    fn unset_dynamic_state_is_an_error() {
        let values = DynamicValues::default();

        assert_eq!(
            values.resolve(&pipeline(&[DynamicState::CullMode])),
            Err(ExecutionError::DynamicStateNotSet {
                state: DynamicState::CullMode
            }),
        );
        assert!(values.resolve(&pipeline(&[])).is_ok());
    }

    #[test]
    fn fixed_pipelines_invalidate_values() {
        let dynamic = pipeline(&[DynamicState::CullMode]);
        let fixed = pipeline(&[]);

        let mut values = DynamicValues::default();
        values.apply(&Command::SetCullMode(CullMode::Back));
        values.invalidate(&dynamic);
        assert_eq!(values.resolve(&dynamic).unwrap().cull_mode, CullMode::Back);

        values.invalidate(&fixed);
        assert!(values.resolve(&dynamic).is_err());
    }

    #[test]
    fn stencil_ops_from_one_face() {
        let fixed_ops = StencilOps {
            compare_op: CompareOp::Always,
            ..StencilOps::new()
        };
        let fixed_face = StencilOpState {
            ops: fixed_ops,
            compare_mask: 0xFF,
            write_mask: 0xFF,
            reference: 0,
        };
        let depth_stencil_state = DepthStencilState {
            front: fixed_face,
            back: fixed_face,
            ..DepthStencilState::new()
        };
        let dynamic = pipeline_with_depth_stencil(&[DynamicState::StencilOp], depth_stencil_state);
        let ops = StencilOps {
            compare_op: CompareOp::Never,
            ..StencilOps::new()
        };

        let mut values = DynamicValues::default();
        assert_eq!(
            values.resolve(&dynamic),
            Err(ExecutionError::DynamicStateNotSet {
                state: DynamicState::StencilOp
            }),
        );

        values.apply(&Command::SetStencilOp {
            faces: StencilFaces::Front,
            ops,
        });
        let state = values.resolve(&dynamic).unwrap();
        assert_eq!(state.front.ops, ops);
        assert_eq!(state.back.ops, fixed_ops);
        assert_eq!(state.front.compare_mask, 0xFF);
        assert_eq!(state.front.write_mask, 0xFF);

        let mut values = DynamicValues::default();
        values.apply(&Command::SetStencilOp {
            faces: StencilFaces::Back,
            ops,
        });
        let state = values.resolve(&dynamic).unwrap();
        assert_eq!(state.front.ops, fixed_ops);
        assert_eq!(state.back.ops, ops);

        values.apply(&Command::SetStencilOp {
            faces: StencilFaces::FrontAndBack,
            ops,
        });
        let state = values.resolve(&dynamic).unwrap();
        assert_eq!(state.front.ops, ops);
        assert_eq!(state.back.ops, ops);
    }

    #[test]
    fn last_stride_wins() {
        let dynamic = pipeline(&[
            DynamicState::VertexInput,
            DynamicState::VertexInputBindingStride,
        ]);

        let mut values = DynamicValues::default();
        values.apply(&Command::SetVertexInput(
            VertexLayout::Padded.dynamic_input_state(&[8]).unwrap(),
        ));
        let state = values.resolve(&dynamic).unwrap();
        assert_eq!(
            state.vertex_input_state.unwrap().bindings[0].1.stride,
            8,
        );

        values.apply(&Command::BindVertexBuffers {
            first_binding: 0,
            buffers: smallvec![],
            strides: Some(smallvec![16]),
        });
        let state = values.resolve(&dynamic).unwrap();
        assert_eq!(
            state.vertex_input_state.unwrap().bindings[0].1.stride,
            16,
        );
    }
}
