// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Describes a graphical operation to perform.
//!
//! A graphics pipeline is created from a [`GraphicsPipelineCreateInfo`], which holds the shaders
//! and the fixed-function state of every stage. Any state listed in
//! [`dynamic_state`](GraphicsPipelineCreateInfo::dynamic_state) is not baked into the pipeline;
//! its value must instead be set in the command buffer before drawing.
//!
//! # Dynamic state and pipeline binds
//!
//! Binding a pipeline affects dynamic state values that were set before:
//!
//! - If the pipeline has a state dynamic, the value set in the command buffer is kept.
//! - If the pipeline has a fixed value for the state, the value set in the command buffer is
//!   lost, and must be set again before a later draw with a pipeline that has it dynamic.
//! - If the pipeline does not contain the state at all, such as the vertex input state of a mesh
//!   shading pipeline, the value set in the command buffer is left untouched.
//!
//! [`GraphicsPipeline::dynamic_state_mode`] tells which of these applies.

use self::{
    graphics::{
        color_blend::ColorBlendState, depth_stencil::DepthStencilState,
        input_assembly::{InputAssemblyState, PrimitiveTopologyClass},
        rasterization::RasterizationState, tessellation::TessellationState,
        vertex_input::VertexInputState, viewport::ViewportState,
    },
    shader::{PipelineShaders, ShaderStages},
};
use crate::{
    device::{DeviceFeatures, DeviceProperties},
    macros::vulkan_enum,
    Id, ValidationError,
};
use foldhash::HashSet;

pub mod graphics;
pub mod shader;

/// The ID of a [`GraphicsPipeline`] created by a device.
pub type PipelineId = Id<GraphicsPipeline>;

vulkan_enum! {
    /// A particular state value within a graphics pipeline that can be dynamically set by a
    /// command buffer.
    DynamicState impl {
        /// Returns whether the state cannot be dynamic in a mesh shading pipeline.
        ///
        /// These are the states of the vertex input and input assembly stages, and of
        /// tessellation, none of which mesh shading pipelines have.
        #[inline]
        pub const fn is_mesh_shading_incompatible(self) -> bool {
            matches!(
                self,
                DynamicState::PrimitiveTopology
                    | DynamicState::VertexInputBindingStride
                    | DynamicState::PrimitiveRestartEnable
                    | DynamicState::PatchControlPoints
                    | DynamicState::VertexInput
            )
        }

        /// Returns the device feature that must be enabled for the state to be dynamic, if any.
        #[inline]
        pub const fn required_feature(self) -> Option<&'static str> {
            match self {
                DynamicState::DepthBias => None,
                DynamicState::CullMode
                | DynamicState::FrontFace
                | DynamicState::PrimitiveTopology
                | DynamicState::ViewportWithCount
                | DynamicState::ScissorWithCount
                | DynamicState::VertexInputBindingStride
                | DynamicState::DepthTestEnable
                | DynamicState::DepthWriteEnable
                | DynamicState::DepthCompareOp
                | DynamicState::DepthBoundsTestEnable
                | DynamicState::StencilTestEnable
                | DynamicState::StencilOp => Some("extended_dynamic_state"),
                DynamicState::VertexInput => Some("vertex_input_dynamic_state"),
                DynamicState::PatchControlPoints => {
                    Some("extended_dynamic_state2_patch_control_points")
                }
                DynamicState::RasterizerDiscardEnable
                | DynamicState::DepthBiasEnable
                | DynamicState::PrimitiveRestartEnable => Some("extended_dynamic_state2"),
                DynamicState::LogicOp => Some("extended_dynamic_state2_logic_op"),
            }
        }
    }
    = DynamicState(i32);

    /// The depth bias factors and clamp, set with `set_depth_bias`.
    DepthBias = DEPTH_BIAS,

    /// The cull mode, set with `set_cull_mode`.
    CullMode = CULL_MODE,

    /// The front face, set with `set_front_face`.
    FrontFace = FRONT_FACE,

    /// The primitive topology, set with `set_primitive_topology`. Only topologies of the same
    /// class as the pipeline's can be set.
    PrimitiveTopology = PRIMITIVE_TOPOLOGY,

    /// The number of viewports and their values, set with `set_viewport_with_count`.
    ViewportWithCount = VIEWPORT_WITH_COUNT,

    /// The number of scissors and their values, set with `set_scissor_with_count`.
    ScissorWithCount = SCISSOR_WITH_COUNT,

    /// The strides of the vertex bindings, set along with the vertex buffers with
    /// `bind_vertex_buffers_with_strides`.
    VertexInputBindingStride = VERTEX_INPUT_BINDING_STRIDE,

    /// Whether the depth test is enabled, set with `set_depth_test_enable`.
    DepthTestEnable = DEPTH_TEST_ENABLE,

    /// Whether depth writes are enabled, set with `set_depth_write_enable`.
    DepthWriteEnable = DEPTH_WRITE_ENABLE,

    /// The depth compare operation, set with `set_depth_compare_op`.
    DepthCompareOp = DEPTH_COMPARE_OP,

    /// Whether the depth bounds test is enabled, set with `set_depth_bounds_test_enable`.
    DepthBoundsTestEnable = DEPTH_BOUNDS_TEST_ENABLE,

    /// Whether the stencil test is enabled, set with `set_stencil_test_enable`.
    StencilTestEnable = STENCIL_TEST_ENABLE,

    /// The stencil operations and compare operation of each face, set with `set_stencil_op`.
    StencilOp = STENCIL_OP,

    /// The whole vertex input state, set with `set_vertex_input`.
    VertexInput = VERTEX_INPUT_EXT,

    /// The number of patch control points, set with `set_patch_control_points`.
    PatchControlPoints = PATCH_CONTROL_POINTS_EXT,

    /// Whether rasterizer discard is enabled, set with `set_rasterizer_discard_enable`.
    RasterizerDiscardEnable = RASTERIZER_DISCARD_ENABLE,

    /// Whether depth bias is enabled, set with `set_depth_bias_enable`.
    DepthBiasEnable = DEPTH_BIAS_ENABLE,

    /// The logical operation, set with `set_logic_op`.
    LogicOp = LOGIC_OP_EXT,

    /// Whether primitive restart is enabled, set with `set_primitive_restart_enable`.
    PrimitiveRestartEnable = PRIMITIVE_RESTART_ENABLE,
}

/// Specifies how a dynamic state is handled by a graphics pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DynamicStateMode {
    /// The pipeline has a fixed value for this state. Previously set dynamic state will be lost
    /// when binding it, and will have to be re-set after binding a pipeline that uses it.
    Fixed,

    /// The pipeline expects a dynamic value to be set by a command buffer. Previously set dynamic
    /// state is not disturbed when binding it.
    Dynamic,
}

/// How a graphics pipeline is put together.
///
/// With the library modes, the pipeline is first built as separate vertex input,
/// pre-rasterization, fragment shader and fragment output parts, which are then linked. The
/// resulting pipeline behaves the same.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PipelineConstructionType {
    /// A single pipeline created in one go.
    #[default]
    Monolithic,

    /// Pipeline libraries linked without link-time optimization.
    FastLinkedLibrary,

    /// Pipeline libraries linked with link-time optimization.
    OptimizedLibrary,
}

impl PipelineConstructionType {
    /// Every construction type, in declaration order.
    pub const ALL: [PipelineConstructionType; 3] = [
        PipelineConstructionType::Monolithic,
        PipelineConstructionType::FastLinkedLibrary,
        PipelineConstructionType::OptimizedLibrary,
    ];

    /// Returns whether the pipeline is built from libraries.
    #[inline]
    pub const fn uses_libraries(self) -> bool {
        !matches!(self, PipelineConstructionType::Monolithic)
    }
}

/// Parameters to create a new `GraphicsPipeline`.
#[derive(Clone, Debug)]
pub struct GraphicsPipelineCreateInfo {
    /// How the pipeline is put together.
    ///
    /// The default value is [`PipelineConstructionType::Monolithic`].
    pub construction_type: PipelineConstructionType,

    /// The shader stages to use.
    pub shaders: PipelineShaders,

    /// The vertex input state.
    ///
    /// This must be `Some` if `shaders` is not a mesh shading pipeline, and `None` otherwise. It
    /// is ignored if [`DynamicState::VertexInput`] is dynamic.
    ///
    /// The default value is `None`.
    pub vertex_input_state: Option<VertexInputState>,

    /// The input assembly state.
    ///
    /// This must be `Some` if `shaders` is not a mesh shading pipeline, and `None` otherwise.
    ///
    /// The default value is `None`.
    pub input_assembly_state: Option<InputAssemblyState>,

    /// The tessellation state.
    ///
    /// This must be `Some` if `shaders` has tessellation stages, and `None` otherwise.
    ///
    /// The default value is `None`.
    pub tessellation_state: Option<TessellationState>,

    /// The viewport state.
    ///
    /// The default value is an empty `ViewportState`, which is only valid when both
    /// [`DynamicState::ViewportWithCount`] and [`DynamicState::ScissorWithCount`] are dynamic.
    pub viewport_state: ViewportState,

    /// The rasterization state.
    ///
    /// The default value is [`RasterizationState::new()`].
    pub rasterization_state: RasterizationState,

    /// The depth/stencil state.
    ///
    /// The default value is [`DepthStencilState::new()`].
    pub depth_stencil_state: DepthStencilState,

    /// The color blend state.
    ///
    /// The default value is [`ColorBlendState::new()`].
    pub color_blend_state: ColorBlendState,

    /// The state(s) that will be set dynamically when recording a command buffer.
    ///
    /// The default value is empty.
    pub dynamic_state: HashSet<DynamicState>,
}

impl GraphicsPipelineCreateInfo {
    /// Returns a `GraphicsPipelineCreateInfo` with the specified `shaders`.
    #[inline]
    pub fn shaders(shaders: PipelineShaders) -> Self {
        Self {
            construction_type: PipelineConstructionType::Monolithic,
            shaders,
            vertex_input_state: None,
            input_assembly_state: None,
            tessellation_state: None,
            viewport_state: ViewportState::new(),
            rasterization_state: RasterizationState::new(),
            depth_stencil_state: DepthStencilState::new(),
            color_blend_state: ColorBlendState::new(),
            dynamic_state: HashSet::default(),
        }
    }

    pub(crate) fn validate(
        &self,
        features: &DeviceFeatures,
        properties: &DeviceProperties,
    ) -> Result<(), Box<ValidationError>> {
        let Self {
            construction_type,
            shaders,
            vertex_input_state,
            input_assembly_state,
            tessellation_state,
            viewport_state,
            rasterization_state,
            depth_stencil_state,
            color_blend_state: _,
            dynamic_state,
        } = self;

        if construction_type.uses_libraries() && !features.graphics_pipeline_library {
            return Err(ValidationError::new(
                "construction_type",
                "uses pipeline libraries, but the `graphics_pipeline_library` feature is not \
                enabled",
            ));
        }

        for &state in dynamic_state {
            if let Some(feature) = state.required_feature() {
                if !features.is_enabled(feature) {
                    return Err(ValidationError::new(
                        "dynamic_state",
                        format!(
                            "contains `DynamicState::{:?}`, but the `{}` feature is not enabled",
                            state, feature,
                        ),
                    ));
                }
            }
        }

        let stages = shaders.stages();

        if stages.intersects(ShaderStages::GEOMETRY) && !features.geometry_shader {
            return Err(ValidationError::new(
                "shaders",
                "contains a geometry shader, but the `geometry_shader` feature is not enabled",
            ));
        }

        let has_tessellation = stages.intersects(
            ShaderStages::TESSELLATION_CONTROL | ShaderStages::TESSELLATION_EVALUATION,
        );

        if has_tessellation && !features.tessellation_shader {
            return Err(ValidationError::new(
                "shaders",
                "contains tessellation shaders, but the `tessellation_shader` feature is not \
                enabled",
            ));
        }

        if shaders.is_mesh_shading() {
            if !features.mesh_shader {
                return Err(ValidationError::new(
                    "shaders",
                    "is a mesh shading pipeline, but the `mesh_shader` feature is not enabled",
                ));
            }

            if vertex_input_state.is_some() {
                return Err(ValidationError::new(
                    "vertex_input_state",
                    "is `Some`, but `shaders` is a mesh shading pipeline",
                ));
            }

            if input_assembly_state.is_some() {
                return Err(ValidationError::new(
                    "input_assembly_state",
                    "is `Some`, but `shaders` is a mesh shading pipeline",
                ));
            }

            if let Some(&state) = dynamic_state
                .iter()
                .find(|state| state.is_mesh_shading_incompatible())
            {
                return Err(ValidationError::new(
                    "dynamic_state",
                    format!(
                        "contains `DynamicState::{:?}`, but `shaders` is a mesh shading pipeline",
                        state,
                    ),
                ));
            }
        } else {
            match vertex_input_state {
                Some(vertex_input_state) => {
                    if !dynamic_state.contains(&DynamicState::VertexInput) {
                        vertex_input_state
                            .validate()
                            .map_err(|err| err.add_context("vertex_input_state"))?;
                    }
                }
                None => {
                    if !dynamic_state.contains(&DynamicState::VertexInput) {
                        return Err(ValidationError::new(
                            "vertex_input_state",
                            "is `None`, but `shaders` is not a mesh shading pipeline and \
                            `DynamicState::VertexInput` is not dynamic",
                        ));
                    }
                }
            }

            let input_assembly_state = input_assembly_state.as_ref().ok_or_else(|| {
                ValidationError::new(
                    "input_assembly_state",
                    "is `None`, but `shaders` is not a mesh shading pipeline",
                )
            })?;
            input_assembly_state
                .validate(features)
                .map_err(|err| err.add_context("input_assembly_state"))?;

            let is_patch_list =
                input_assembly_state.topology.class() == PrimitiveTopologyClass::Patch;

            if has_tessellation != is_patch_list {
                return Err(ValidationError::new(
                    "input_assembly_state.topology",
                    "must be a patch list exactly when `shaders` has tessellation stages",
                ));
            }
        }

        match tessellation_state {
            Some(tessellation_state) => {
                if !has_tessellation {
                    return Err(ValidationError::new(
                        "tessellation_state",
                        "is `Some`, but `shaders` has no tessellation stages",
                    ));
                }

                tessellation_state
                    .validate()
                    .map_err(|err| err.add_context("tessellation_state"))?;
            }
            None => {
                if has_tessellation {
                    return Err(ValidationError::new(
                        "tessellation_state",
                        "is `None`, but `shaders` has tessellation stages",
                    ));
                }
            }
        }

        let viewports_dynamic = dynamic_state.contains(&DynamicState::ViewportWithCount);
        let scissors_dynamic = dynamic_state.contains(&DynamicState::ScissorWithCount);
        let viewport_count = viewport_state.viewports.len();
        let scissor_count = viewport_state.scissors.len();

        if viewports_dynamic && viewport_count != 0 {
            return Err(ValidationError::new(
                "viewport_state.viewports",
                "is not empty, but `DynamicState::ViewportWithCount` is dynamic",
            ));
        }

        if !viewports_dynamic && viewport_count == 0 {
            return Err(ValidationError::new(
                "viewport_state.viewports",
                "is empty, but `DynamicState::ViewportWithCount` is not dynamic",
            ));
        }

        if scissors_dynamic && scissor_count != 0 {
            return Err(ValidationError::new(
                "viewport_state.scissors",
                "is not empty, but `DynamicState::ScissorWithCount` is dynamic",
            ));
        }

        if !scissors_dynamic && scissor_count == 0 {
            return Err(ValidationError::new(
                "viewport_state.scissors",
                "is empty, but `DynamicState::ScissorWithCount` is not dynamic",
            ));
        }

        if !viewports_dynamic && !scissors_dynamic && viewport_count != scissor_count {
            return Err(ValidationError::new(
                "viewport_state",
                "the number of viewports and the number of scissors are not equal",
            ));
        }

        if viewport_count.max(scissor_count) > properties.max_viewports as usize {
            return Err(ValidationError::new(
                "viewport_state",
                "the number of viewports or scissors exceeds the `max_viewports` limit",
            ));
        }

        rasterization_state
            .validate(features)
            .map_err(|err| err.add_context("rasterization_state"))?;
        depth_stencil_state
            .validate(features)
            .map_err(|err| err.add_context("depth_stencil_state"))?;

        Ok(())
    }
}

/// A validated graphics pipeline, as held by a device that renders on the host.
#[derive(Clone, Debug)]
pub struct GraphicsPipeline {
    create_info: GraphicsPipelineCreateInfo,
}

impl GraphicsPipeline {
    /// Validates `create_info` against the features and limits of a device.
    pub fn new(
        create_info: GraphicsPipelineCreateInfo,
        features: &DeviceFeatures,
        properties: &DeviceProperties,
    ) -> Result<Self, Box<ValidationError>> {
        create_info.validate(features, properties)?;

        Ok(GraphicsPipeline { create_info })
    }

    /// Returns how the pipeline was put together.
    #[inline]
    pub fn construction_type(&self) -> PipelineConstructionType {
        self.create_info.construction_type
    }

    /// Returns the shaders of the pipeline.
    #[inline]
    pub fn shaders(&self) -> &PipelineShaders {
        &self.create_info.shaders
    }

    /// Returns the vertex input state used to create this pipeline.
    #[inline]
    pub fn vertex_input_state(&self) -> Option<&VertexInputState> {
        self.create_info.vertex_input_state.as_ref()
    }

    /// Returns the input assembly state used to create this pipeline.
    #[inline]
    pub fn input_assembly_state(&self) -> Option<&InputAssemblyState> {
        self.create_info.input_assembly_state.as_ref()
    }

    /// Returns the tessellation state used to create this pipeline.
    #[inline]
    pub fn tessellation_state(&self) -> Option<&TessellationState> {
        self.create_info.tessellation_state.as_ref()
    }

    /// Returns the viewport state used to create this pipeline.
    #[inline]
    pub fn viewport_state(&self) -> &ViewportState {
        &self.create_info.viewport_state
    }

    /// Returns the rasterization state used to create this pipeline.
    #[inline]
    pub fn rasterization_state(&self) -> &RasterizationState {
        &self.create_info.rasterization_state
    }

    /// Returns the depth/stencil state used to create this pipeline.
    #[inline]
    pub fn depth_stencil_state(&self) -> &DepthStencilState {
        &self.create_info.depth_stencil_state
    }

    /// Returns the color blend state used to create this pipeline.
    #[inline]
    pub fn color_blend_state(&self) -> &ColorBlendState {
        &self.create_info.color_blend_state
    }

    /// Returns whether a particular state is dynamic.
    ///
    /// `None` is returned if the pipeline does not contain this state. Previously set dynamic
    /// state is not disturbed when binding it.
    pub fn dynamic_state(&self, state: DynamicState) -> Option<bool> {
        if self.create_info.dynamic_state.contains(&state) {
            return Some(true);
        }

        let contained = match state {
            DynamicState::VertexInput | DynamicState::VertexInputBindingStride => {
                self.create_info.vertex_input_state.is_some()
            }
            DynamicState::PrimitiveTopology | DynamicState::PrimitiveRestartEnable => {
                self.create_info.input_assembly_state.is_some()
            }
            DynamicState::PatchControlPoints => self.create_info.tessellation_state.is_some(),
            _ => true,
        };

        contained.then_some(false)
    }

    /// Returns how binding the pipeline affects a previously set value of `state`, or `None` if
    /// the pipeline does not contain this state.
    #[inline]
    pub fn dynamic_state_mode(&self, state: DynamicState) -> Option<DynamicStateMode> {
        self.dynamic_state(state).map(|dynamic| {
            if dynamic {
                DynamicStateMode::Dynamic
            } else {
                DynamicStateMode::Fixed
            }
        })
    }

    /// Returns all states that are dynamic in this pipeline.
    #[inline]
    pub fn dynamic_states(&self) -> impl ExactSizeIterator<Item = DynamicState> + '_ {
        self.create_info.dynamic_state.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        graphics::{
            input_assembly::{InputAssemblyState, PrimitiveTopology, PrimitiveTopologyClass},
            tessellation::TessellationState,
            vertex_input::VertexLayout,
            viewport::{Scissor, Viewport, ViewportState},
        },
        shader::PipelineShaders,
        DynamicState, DynamicStateMode, GraphicsPipeline, GraphicsPipelineCreateInfo,
        PipelineConstructionType,
    };
    use crate::{
        device::{DeviceFeatures, DeviceProperties},
        format::NumericFormat,
    };

    fn full_viewport_state() -> ViewportState {
        ViewportState {
            viewports: [Viewport::new([0.0, 0.0], [64.0, 64.0])].into_iter().collect(),
            scissors: [Scissor::new([0, 0], [64, 64])].into_iter().collect(),
        }
    }

    fn classic_create_info() -> GraphicsPipelineCreateInfo {
        let shaders = PipelineShaders::vertex(
            VertexLayout::Padded,
            NumericFormat::UNORM,
            PrimitiveTopologyClass::Triangle,
            false,
            false,
            false,
        )
        .unwrap();

        GraphicsPipelineCreateInfo {
            vertex_input_state: Some(
                VertexLayout::Padded
                    .pipeline_input_state(&VertexLayout::Padded.vertex_data_strides())
                    .unwrap(),
            ),
            input_assembly_state: Some(
                InputAssemblyState::new().topology(PrimitiveTopology::TriangleStrip),
            ),
            viewport_state: full_viewport_state(),
            ..GraphicsPipelineCreateInfo::shaders(shaders)
        }
    }

    #[test]
    fn mesh_incompatible_states() {
        let incompatible: Vec<_> = DynamicState::ALL
            .iter()
            .copied()
            .filter(|state| state.is_mesh_shading_incompatible())
            .collect();

        assert_eq!(
            incompatible,
            [
                DynamicState::PrimitiveTopology,
                DynamicState::VertexInputBindingStride,
                DynamicState::VertexInput,
                DynamicState::PatchControlPoints,
                DynamicState::PrimitiveRestartEnable,
            ],
        );
    }

    #[test]
    fn classic_pipeline() {
        let features = DeviceFeatures::all();
        let properties = DeviceProperties::default();
        let pipeline =
            GraphicsPipeline::new(classic_create_info(), &features, &properties).unwrap();

        assert_eq!(
            pipeline.dynamic_state_mode(DynamicState::CullMode),
            Some(DynamicStateMode::Fixed),
        );
        assert_eq!(
            pipeline.dynamic_state(DynamicState::PatchControlPoints),
            None
        );
        assert_eq!(pipeline.dynamic_states().len(), 0);
    }

    #[test]
    fn dynamic_viewports_need_empty_lists() {
        let features = DeviceFeatures::all();
        let properties = DeviceProperties::default();

        let mut create_info = classic_create_info();
        create_info
            .dynamic_state
            .insert(DynamicState::ViewportWithCount);
        assert!(create_info.validate(&features, &properties).is_err());

        create_info.viewport_state.viewports.clear();
        assert!(create_info.validate(&features, &properties).is_ok());

        let pipeline = GraphicsPipeline::new(create_info, &features, &properties).unwrap();
        assert_eq!(
            pipeline.dynamic_state_mode(DynamicState::ViewportWithCount),
            Some(DynamicStateMode::Dynamic),
        );
    }

    #[test]
    fn viewport_and_scissor_counts_must_match() {
        let mut create_info = classic_create_info();
        create_info
            .viewport_state
            .scissors
            .push(Scissor::new([0, 0], [32, 64]));

        assert!(create_info
            .validate(&DeviceFeatures::all(), &DeviceProperties::default())
            .is_err());
    }

    #[test]
    fn missing_features() {
        let mut features = DeviceFeatures::all();
        features.extended_dynamic_state = false;
        let properties = DeviceProperties::default();

        let mut create_info = classic_create_info();
        create_info.dynamic_state.insert(DynamicState::CullMode);
        assert!(create_info.validate(&features, &properties).is_err());

        create_info.dynamic_state.clear();
        create_info.construction_type = PipelineConstructionType::FastLinkedLibrary;
        assert!(create_info.validate(&features, &properties).is_ok());

        features.graphics_pipeline_library = false;
        assert!(create_info.validate(&features, &properties).is_err());
    }

    #[test]
    fn mesh_pipelines_have_no_vertex_input() {
        let features = DeviceFeatures::all();
        let properties = DeviceProperties::default();

        let shaders =
            PipelineShaders::mesh(VertexLayout::Padded, NumericFormat::UNORM, false).unwrap();
        let mut create_info = GraphicsPipelineCreateInfo {
            viewport_state: full_viewport_state(),
            ..GraphicsPipelineCreateInfo::shaders(shaders)
        };
        create_info.dynamic_state.insert(DynamicState::FrontFace);

        let pipeline =
            GraphicsPipeline::new(create_info.clone(), &features, &properties).unwrap();
        assert_eq!(pipeline.dynamic_state(DynamicState::VertexInput), None);
        assert_eq!(
            pipeline.dynamic_state(DynamicState::PrimitiveTopology),
            None
        );
        assert_eq!(pipeline.dynamic_state(DynamicState::FrontFace), Some(true));

        create_info
            .dynamic_state
            .insert(DynamicState::PrimitiveTopology);
        assert!(create_info.validate(&features, &properties).is_err());
    }

    #[test]
    fn tessellation_needs_patches() {
        let features = DeviceFeatures::all();
        let properties = DeviceProperties::default();

        let shaders = PipelineShaders::vertex(
            VertexLayout::Padded,
            NumericFormat::UNORM,
            PrimitiveTopologyClass::Patch,
            true,
            false,
            false,
        )
        .unwrap();
        let mut create_info = GraphicsPipelineCreateInfo {
            shaders,
            tessellation_state: Some(TessellationState::new()),
            ..classic_create_info()
        };
        assert!(create_info.validate(&features, &properties).is_err());

        let topology = PrimitiveTopology::PatchList;
        create_info.input_assembly_state = Some(InputAssemblyState::new().topology(topology));
        assert!(create_info.validate(&features, &properties).is_ok());

        create_info.tessellation_state = None;
        assert!(create_info.validate(&features, &properties).is_err());
    }
}
