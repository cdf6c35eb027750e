// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! The configuration of a single test case.
//!
//! A [`TestConfig`] describes what the test draws, what it expects to find in the attachments
//! afterwards and, for each piece of pipeline state, a [`StaticAndDynamicPair`]: the value baked
//! into the static pipeline and, when the state is under test, the value set from the command
//! buffer. Before execution, [`apply_ordering`] resolves the configuration for its
//! [`SequenceOrdering`].

pub use self::{
    pair::StaticAndDynamicPair,
    resolved::{apply_ordering, ResolvedConfig},
};
use crate::{
    format::{Format, NumericFormat},
    image::ClearColorValue,
    pipeline::{
        graphics::{
            color_blend::LogicOp,
            depth_stencil::{CompareOp, StencilFaces, StencilOps},
            input_assembly::{PrimitiveTopology, PrimitiveTopologyClass},
            rasterization::{CullMode, DepthBiasState, FrontFace},
            vertex_input::VertexLayout,
            viewport::{Scissor, Viewport},
        },
        shader::PushConstants,
        DynamicState, PipelineConstructionType,
    },
    reference::ReferenceColor,
    DeviceSize, ValidationError,
};
use smallvec::{smallvec, SmallVec};
use std::ops::RangeInclusive;

pub mod pair;
mod resolved;

/// The width and height of every attachment.
pub const FRAMEBUFFER_EXTENT: [u32; 2] = [64, 64];

/// The number of points of each horizontal line when drawing lines.
pub const LINE_POINTS_PER_ROW: u32 = 4;

/// The number of vertices when drawing lines: one line per row of pixels.
pub const LINE_VERTEX_COUNT: u32 = FRAMEBUFFER_EXTENT[1] * LINE_POINTS_PER_ROW;

/// Opaque blue.
pub const DEFAULT_TRIANGLE_COLOR: [f32; 4] = [0.0, 0.0, 1.0, 1.0];

/// Opaque black.
pub const DEFAULT_CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Opaque blue, written to an integer attachment.
pub const LOGIC_OP_TRIANGLE_COLOR: [f32; 4] = [0.0, 0.0, 255.0, 255.0];

/// Opaque green, for integer attachments.
pub const GREEN_CLEAR_COLOR: [u32; 4] = [0, 255, 0, 255];

/// Opaque cyan, for integer attachments: green combined with blue by [`LogicOp::Or`].
pub const LOGIC_OP_FINAL_COLOR: [u32; 4] = [0, 255, 255, 255];

/// The point in the command buffer at which dynamic state is set, relative to pipeline binds and
/// draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SequenceOrdering {
    /// Set state at the start of the command buffer, before the render pass.
    CmdBufferStart,

    /// Set state after binding the dynamic pipeline, just before each draw.
    BeforeDraw,

    /// Set state after binding a static pipeline, before binding the dynamic pipeline.
    BetweenPipelines,

    /// Set state after binding a static pipeline and then the dynamic pipeline.
    AfterPipelines,

    /// Set state after binding the dynamic pipeline, before binding a static pipeline with the
    /// right values.
    BeforeGoodStatic,

    /// Bind the wrong static pipeline and draw, then bind the dynamic pipeline, set state and
    /// draw again.
    TwoDrawsDynamic,

    /// Bind the dynamic pipeline, set the wrong state and draw, then bind the right static
    /// pipeline and draw again.
    TwoDrawsStatic,
}

impl SequenceOrdering {
    /// Every ordering, in the order test groups are created.
    pub const ALL: [SequenceOrdering; 7] = [
        SequenceOrdering::CmdBufferStart,
        SequenceOrdering::BeforeDraw,
        SequenceOrdering::BetweenPipelines,
        SequenceOrdering::AfterPipelines,
        SequenceOrdering::BeforeGoodStatic,
        SequenceOrdering::TwoDrawsDynamic,
        SequenceOrdering::TwoDrawsStatic,
    ];

    /// Returns the name of the test group for the ordering.
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            SequenceOrdering::CmdBufferStart => "cmd_buffer_start",
            SequenceOrdering::BeforeDraw => "before_draw",
            SequenceOrdering::BetweenPipelines => "between_pipelines",
            SequenceOrdering::AfterPipelines => "after_pipelines",
            SequenceOrdering::BeforeGoodStatic => "before_good_static",
            SequenceOrdering::TwoDrawsDynamic => "two_draws_dynamic",
            SequenceOrdering::TwoDrawsStatic => "two_draws_static",
        }
    }

    /// Returns a description of the ordering.
    pub const fn description(self) -> &'static str {
        match self {
            SequenceOrdering::CmdBufferStart => "Dynamic state set after command buffer start",
            SequenceOrdering::BeforeDraw => "Dynamic state set just before drawing",
            SequenceOrdering::BetweenPipelines => {
                "Dynamic state set after a pipeline with static states has been bound and \
                before a pipeline with dynamic states has been bound"
            }
            SequenceOrdering::AfterPipelines => {
                "Dynamic state set after both a static-state pipeline and a second \
                dynamic-state pipeline have been bound"
            }
            SequenceOrdering::BeforeGoodStatic => {
                "Dynamic state set after a dynamic pipeline has been bound and before a second \
                static-state pipeline with the right values has been bound"
            }
            SequenceOrdering::TwoDrawsDynamic => {
                "Bind bad static pipeline and draw, followed by binding correct dynamic pipeline \
                and drawing again"
            }
            SequenceOrdering::TwoDrawsStatic => {
                "Bind bad dynamic pipeline and draw, followed by binding correct static pipeline \
                and drawing again"
            }
        }
    }

    /// Returns whether the static pipeline is the one holding the expected values, which means
    /// the static and dynamic values are exchanged before execution.
    #[inline]
    pub const fn is_reversed(self) -> bool {
        matches!(
            self,
            SequenceOrdering::BeforeGoodStatic | SequenceOrdering::TwoDrawsStatic
        )
    }

    /// Returns the number of times the render pass is recorded, each time into its own
    /// framebuffer.
    #[inline]
    pub const fn num_iterations(self) -> u32 {
        match self {
            SequenceOrdering::TwoDrawsDynamic | SequenceOrdering::TwoDrawsStatic => 2,
            _ => 1,
        }
    }

    /// Returns whether a static pipeline is bound in the first iteration, before the dynamic
    /// pipeline.
    #[inline]
    pub const fn binds_static_first(self) -> bool {
        matches!(
            self,
            SequenceOrdering::BetweenPipelines
                | SequenceOrdering::AfterPipelines
                | SequenceOrdering::TwoDrawsDynamic
        )
    }

    /// Returns whether the ordering needs a static pipeline at all.
    #[inline]
    pub const fn uses_static_pipeline(self) -> bool {
        self.binds_static_first() || self.is_reversed()
    }
}

/// One full-screen mesh drawn by a test.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshParams {
    /// The color the fragment shader writes.
    pub color: [f32; 4],

    /// The Z coordinate of every vertex.
    pub depth: f32,

    /// Whether to draw the mesh with its winding order reversed, which makes triangles face
    /// back.
    pub reversed: bool,

    pub scale_x: f32,
    pub scale_y: f32,
    pub offset_x: f32,
    pub offset_y: f32,

    /// How far apart the vertices synthesized from a single vertex are placed.
    pub strip_scale: f32,
}

impl MeshParams {
    /// Returns a mesh of the given color and depth, covering the whole framebuffer.
    #[inline]
    pub const fn new(color: [f32; 4], depth: f32) -> Self {
        MeshParams {
            color,
            depth,
            reversed: false,
            scale_x: 1.0,
            scale_y: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
            strip_scale: 0.0,
        }
    }

    /// Returns the push constants to draw the mesh to viewport `viewport_index`.
    pub fn push_constants(&self, viewport_index: u32) -> PushConstants {
        PushConstants {
            triangle_color: self.color,
            mesh_depth: self.depth,
            viewport_index: viewport_index as i32,
            scale_x: self.scale_x,
            scale_y: self.scale_y,
            offset_x: self.offset_x,
            offset_y: self.offset_y,
            strip_scale: self.strip_scale,
        }
    }
}

impl Default for MeshParams {
    /// Returns a blue mesh at depth 0.
    #[inline]
    fn default() -> Self {
        Self::new(DEFAULT_TRIANGLE_COLOR, 0.0)
    }
}

/// The depth bias parameters a test can set. The slope factor is always zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DepthBiasParams {
    pub constant_factor: f32,
    pub clamp: f32,
}

impl DepthBiasParams {
    /// Parameters that do not change depth.
    pub const NONE: DepthBiasParams = DepthBiasParams {
        constant_factor: 0.0,
        clamp: 0.0,
    };

    /// Converts the parameters to pipeline state.
    #[inline]
    pub const fn to_state(self) -> DepthBiasState {
        DepthBiasState {
            constant_factor: self.constant_factor,
            clamp: self.clamp,
            slope_factor: 0.0,
        }
    }
}

/// The stencil operations of one or both faces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StencilOpParams {
    pub faces: StencilFaces,
    pub ops: StencilOps,
}

impl Default for StencilOpParams {
    /// Returns operations that keep the stored value and always pass, for both faces.
    #[inline]
    fn default() -> Self {
        StencilOpParams {
            faces: StencilFaces::FrontAndBack,
            ops: StencilOps::new(),
        }
    }
}

/// Everything a test case needs to know to record, execute and verify its commands.
#[derive(Clone, Debug, PartialEq)]
pub struct TestConfig {
    /// How pipelines are put together.
    pub construction_type: PipelineConstructionType,

    /// When dynamic state is set.
    pub ordering: SequenceOrdering,

    /// Whether to draw with mesh shading pipelines instead of classic ones.
    pub use_mesh_shaders: bool,

    /// The meshes drawn, in order, for each viewport.
    pub mesh_params: SmallVec<[MeshParams; 3]>,

    /// The stencil reference value of both faces.
    pub reference_stencil: u32,

    pub clear_color: ClearColorValue,
    pub clear_depth: f32,
    pub clear_stencil: u32,

    /// The expected color attachment.
    pub reference_color: ReferenceColor,

    /// The depth every pixel is expected to have.
    pub expected_depth: f32,

    /// The stencil value every pixel is expected to have.
    pub expected_stencil: u32,

    /// The range of the depth bounds test.
    pub depth_bounds: RangeInclusive<f32>,

    /// Whether to add a pass-through geometry shader even with a single viewport.
    pub force_geometry_shader: bool,

    /// Whether to bind a mesh shading pipeline that draws nothing before the dynamic pipeline.
    pub bind_unused_mesh_shading_pipeline: bool,

    /// Whether the vertex buffers hold only the first vertex.
    pub single_vertex: bool,

    /// The number of vertices drawn when `single_vertex` is true.
    pub single_vertex_draw_count: u32,

    /// The number of filler bytes before the vertex data in each vertex buffer.
    pub vertex_data_offset: DeviceSize,

    /// The number of filler bytes after the vertex data in each vertex buffer.
    pub vertex_data_extra_bytes: DeviceSize,

    /// Whether to draw first with a pipeline that has the patch control points dynamic but no
    /// tessellation shaders.
    pub use_extra_dynamic_pcp_pipeline: bool,

    pub vertex_layout: StaticAndDynamicPair<VertexLayout>,
    pub cull_mode: StaticAndDynamicPair<CullMode>,
    pub front_face: StaticAndDynamicPair<FrontFace>,
    pub topology: StaticAndDynamicPair<PrimitiveTopology>,
    pub viewports: StaticAndDynamicPair<SmallVec<[Viewport; 2]>>,
    pub scissors: StaticAndDynamicPair<SmallVec<[Scissor; 2]>>,
    pub strides: StaticAndDynamicPair<SmallVec<[DeviceSize; 6]>>,
    pub depth_test_enable: StaticAndDynamicPair<bool>,
    pub depth_write_enable: StaticAndDynamicPair<bool>,
    pub depth_compare_op: StaticAndDynamicPair<CompareOp>,
    pub depth_bounds_test_enable: StaticAndDynamicPair<bool>,
    pub stencil_test_enable: StaticAndDynamicPair<bool>,
    pub stencil_ops: StaticAndDynamicPair<SmallVec<[StencilOpParams; 2]>>,
    pub depth_bias_enable: StaticAndDynamicPair<bool>,
    pub rasterizer_discard_enable: StaticAndDynamicPair<bool>,
    pub primitive_restart_enable: StaticAndDynamicPair<bool>,
    pub logic_op: StaticAndDynamicPair<LogicOp>,
    pub patch_control_points: StaticAndDynamicPair<u32>,
    pub depth_bias: StaticAndDynamicPair<DepthBiasParams>,
}

impl TestConfig {
    /// Returns a configuration that draws one blue triangle strip over the whole framebuffer,
    /// with every state static and the [`VertexLayout::Padded`] layout.
    #[inline]
    pub fn new(
        construction_type: PipelineConstructionType,
        ordering: SequenceOrdering,
        use_mesh_shaders: bool,
    ) -> Self {
        Self::with_vertex_layouts(
            construction_type,
            ordering,
            use_mesh_shaders,
            VertexLayout::Padded,
            None,
        )
    }

    /// Returns the same configuration as [`new`](Self::new), with the given vertex layouts.
    /// When `dynamic_layout` is `Some`, the vertex input state is under test.
    ///
    /// The strides default to the record sizes of the layout the buffers are filled with.
    pub fn with_vertex_layouts(
        construction_type: PipelineConstructionType,
        ordering: SequenceOrdering,
        use_mesh_shaders: bool,
        static_layout: VertexLayout,
        dynamic_layout: Option<VertexLayout>,
    ) -> Self {
        let [width, height] = FRAMEBUFFER_EXTENT;
        let strides = dynamic_layout
            .unwrap_or(static_layout)
            .vertex_data_strides();

        TestConfig {
            construction_type,
            ordering,
            use_mesh_shaders,
            mesh_params: smallvec![MeshParams::default()],
            reference_stencil: 0,
            clear_color: ClearColorValue::Float(DEFAULT_CLEAR_COLOR),
            clear_depth: 1.0,
            clear_stencil: 0,
            reference_color: ReferenceColor::SingleColor(ClearColorValue::Float(
                DEFAULT_TRIANGLE_COLOR,
            )),
            expected_depth: 1.0,
            expected_stencil: 0,
            depth_bounds: 0.0..=1.0,
            force_geometry_shader: false,
            bind_unused_mesh_shading_pipeline: false,
            single_vertex: false,
            single_vertex_draw_count: 0,
            vertex_data_offset: 0,
            vertex_data_extra_bytes: 0,
            use_extra_dynamic_pcp_pipeline: false,
            vertex_layout: StaticAndDynamicPair {
                static_value: static_layout,
                dynamic_value: dynamic_layout,
            },
            cull_mode: CullMode::None.into(),
            front_face: FrontFace::CounterClockwise.into(),
            topology: PrimitiveTopology::TriangleStrip.into(),
            viewports: StaticAndDynamicPair::new(smallvec![Viewport::new(
                [0.0, 0.0],
                [width as f32, height as f32],
            )]),
            scissors: StaticAndDynamicPair::new(smallvec![Scissor::new([0, 0], [width, height])]),
            strides: strides.into(),
            depth_test_enable: false.into(),
            depth_write_enable: false.into(),
            depth_compare_op: CompareOp::Never.into(),
            depth_bounds_test_enable: false.into(),
            stencil_test_enable: false.into(),
            stencil_ops: StaticAndDynamicPair::new(smallvec![StencilOpParams::default()]),
            depth_bias_enable: false.into(),
            rasterizer_discard_enable: false.into(),
            primitive_restart_enable: false.into(),
            logic_op: LogicOp::Clear.into(),
            patch_control_points: 1.into(),
            depth_bias: DepthBiasParams::NONE.into(),
        }
    }

    /// Returns whether the logic op is under test.
    #[inline]
    pub fn test_logic_op(&self) -> bool {
        self.logic_op.is_dynamic()
    }

    /// Returns whether the number of patch control points is under test.
    #[inline]
    pub fn test_patch_control_points(&self) -> bool {
        self.patch_control_points.is_dynamic()
    }

    /// Returns whether the vertex input state is under test.
    #[inline]
    pub fn test_vertex_dynamic(&self) -> bool {
        self.vertex_layout.is_dynamic()
    }

    /// Returns whether a state of the first extended dynamic state tier is under test.
    pub fn test_extended_dynamic_state(&self) -> bool {
        self.cull_mode.is_dynamic()
            || self.front_face.is_dynamic()
            || self.topology.is_dynamic()
            || self.viewports.is_dynamic()
            || self.scissors.is_dynamic()
            || self.strides.is_dynamic()
            || self.depth_test_enable.is_dynamic()
            || self.depth_write_enable.is_dynamic()
            || self.depth_compare_op.is_dynamic()
            || self.depth_bounds_test_enable.is_dynamic()
            || self.stencil_test_enable.is_dynamic()
            || self.stencil_ops.is_dynamic()
    }

    /// Returns whether a state of the second extended dynamic state tier is under test.
    pub fn test_extended_dynamic_state2(&self) -> bool {
        self.rasterizer_discard_enable.is_dynamic()
            || self.depth_bias_enable.is_dynamic()
            || self.primitive_restart_enable.is_dynamic()
            || self.use_extra_dynamic_pcp_pipeline
    }

    /// Returns whether the static topology is a patch list.
    #[inline]
    pub fn patches_topology(&self) -> bool {
        self.topology.static_value.class() == PrimitiveTopologyClass::Patch
    }

    /// Returns whether the pipelines need tessellation shaders.
    #[inline]
    pub fn needs_tessellation(&self) -> bool {
        self.test_patch_control_points() || self.patches_topology()
    }

    /// Returns whether draws are indexed. Primitive restart is tested by drawing lines with
    /// 8-bit indices, so that the last vertex has the restart index.
    #[inline]
    pub fn needs_index_buffer(&self) -> bool {
        self.primitive_restart_enable.is_dynamic()
    }

    /// Returns whether more than one viewport is drawn to.
    #[inline]
    pub fn is_multi_viewport(&self) -> bool {
        self.viewports.active(false).len() > 1
    }

    /// Returns whether the classic pipelines need a geometry shader. It is used to write the
    /// viewport index.
    #[inline]
    pub fn needs_geometry_shader(&self) -> bool {
        (self.is_multi_viewport() && !self.use_mesh_shaders) || self.force_geometry_shader
    }

    /// Returns whether the depth bias that takes effect has a clamp.
    #[inline]
    pub fn needs_depth_bias_clamp(&self) -> bool {
        self.depth_bias.active(false).clamp != 0.0
    }

    /// Returns whether the depth bounds test is enabled by either value.
    #[inline]
    pub fn uses_depth_bounds(&self) -> bool {
        self.depth_bounds_test_enable.static_value
            || self.depth_bounds_test_enable.dynamic_value == Some(true)
    }

    /// Returns the larger of the static and dynamic viewport counts.
    #[inline]
    pub fn max_viewport_count(&self) -> usize {
        let dynamic_count = self.viewports.dynamic_value.as_ref().map_or(0, SmallVec::len);

        self.viewports.static_value.len().max(dynamic_count)
    }

    /// Returns the numeric format of the color attachment. Logic ops only apply to integer
    /// formats.
    #[inline]
    pub fn color_numeric_format(&self) -> NumericFormat {
        if self.test_logic_op() {
            NumericFormat::UINT
        } else {
            NumericFormat::UNORM
        }
    }

    /// Returns the format of the color attachment.
    #[inline]
    pub fn color_format(&self) -> Format {
        if self.test_logic_op() {
            Format::R8G8B8A8_UINT
        } else {
            Format::R8G8B8A8_UNORM
        }
    }

    /// Returns the states that are under test, in the order they are declared to the dynamic
    /// pipeline.
    pub fn dynamic_states(&self) -> SmallVec<[DynamicState; 4]> {
        [
            (self.depth_bias.is_dynamic(), DynamicState::DepthBias),
            (self.cull_mode.is_dynamic(), DynamicState::CullMode),
            (self.front_face.is_dynamic(), DynamicState::FrontFace),
            (self.topology.is_dynamic(), DynamicState::PrimitiveTopology),
            (self.viewports.is_dynamic(), DynamicState::ViewportWithCount),
            (self.scissors.is_dynamic(), DynamicState::ScissorWithCount),
            (
                self.strides.is_dynamic(),
                DynamicState::VertexInputBindingStride,
            ),
            (
                self.depth_test_enable.is_dynamic(),
                DynamicState::DepthTestEnable,
            ),
            (
                self.depth_write_enable.is_dynamic(),
                DynamicState::DepthWriteEnable,
            ),
            (
                self.depth_compare_op.is_dynamic(),
                DynamicState::DepthCompareOp,
            ),
            (
                self.depth_bounds_test_enable.is_dynamic(),
                DynamicState::DepthBoundsTestEnable,
            ),
            (
                self.stencil_test_enable.is_dynamic(),
                DynamicState::StencilTestEnable,
            ),
            (self.stencil_ops.is_dynamic(), DynamicState::StencilOp),
            (self.vertex_layout.is_dynamic(), DynamicState::VertexInput),
            (
                self.patch_control_points.is_dynamic(),
                DynamicState::PatchControlPoints,
            ),
            (
                self.rasterizer_discard_enable.is_dynamic(),
                DynamicState::RasterizerDiscardEnable,
            ),
            (
                self.depth_bias_enable.is_dynamic(),
                DynamicState::DepthBiasEnable,
            ),
            (self.logic_op.is_dynamic(), DynamicState::LogicOp),
            (
                self.primitive_restart_enable.is_dynamic(),
                DynamicState::PrimitiveRestartEnable,
            ),
        ]
        .into_iter()
        .filter_map(|(dynamic, state)| dynamic.then_some(state))
        .collect()
    }

    /// Returns whether a state under test cannot be dynamic in a mesh shading pipeline.
    #[inline]
    pub fn bad_mesh_shading_pipeline_dyn_state(&self) -> bool {
        self.dynamic_states()
            .iter()
            .any(|state| state.is_mesh_shading_incompatible())
    }

    /// Checks that the configuration describes a test that can be built.
    ///
    /// A failure means the case was generated incorrectly, not that the device lacks
    /// something.
    pub fn validate(&self) -> Result<(), Box<ValidationError>> {
        let static_class = self.topology.static_value.class();

        if let Some(dynamic_topology) = self.topology.dynamic_value {
            if dynamic_topology.class() != static_class {
                return Err(ValidationError::new(
                    "topology",
                    "the static and dynamic topologies are not of the same class",
                ));
            }
        }

        if static_class == PrimitiveTopologyClass::Point {
            return Err(ValidationError::new(
                "topology.static_value",
                "is a point topology, which no test draws",
            ));
        }

        if self.test_patch_control_points() && !self.patches_topology() {
            return Err(ValidationError::new(
                "patch_control_points",
                "is dynamic, but the topology is not a patch list",
            ));
        }

        if self.patches_topology() && *self.patch_control_points.active(false) <= 1 {
            return Err(ValidationError::new(
                "patch_control_points",
                "the topology is a patch list, but the patches that take effect do not have \
                more than one control point",
            ));
        }

        if self.use_extra_dynamic_pcp_pipeline && !self.test_patch_control_points() {
            return Err(ValidationError::new(
                "use_extra_dynamic_pcp_pipeline",
                "is true, but the patch control points are not dynamic",
            ));
        }

        if self.needs_index_buffer() && static_class != PrimitiveTopologyClass::Line {
            return Err(ValidationError::new(
                "primitive_restart_enable",
                "is dynamic, but the topology is not a line topology",
            ));
        }

        if self.mesh_params.is_empty() {
            return Err(ValidationError::new("mesh_params", "is empty"));
        }

        if static_class != PrimitiveTopologyClass::Triangle
            && self.mesh_params.iter().any(|mesh| mesh.reversed)
        {
            return Err(ValidationError::new(
                "mesh_params",
                "contains a reversed mesh, but only triangle meshes can be reversed",
            ));
        }

        if self.viewports.active(false).is_empty() || self.scissors.active(false).is_empty() {
            return Err(ValidationError::new(
                "viewports",
                "the viewports or scissors that take effect are empty",
            ));
        }

        if self.single_vertex && self.single_vertex_draw_count == 0 {
            return Err(ValidationError::new(
                "single_vertex_draw_count",
                "is zero, but `single_vertex` is true",
            ));
        }

        let binding_count = self.vertex_layout.static_value.binding_count().max(
            self.vertex_layout
                .dynamic_value
                .map_or(0, VertexLayout::binding_count),
        );

        for (name, strides) in [
            ("strides.static_value", Some(&self.strides.static_value)),
            ("strides.dynamic_value", self.strides.dynamic_value.as_ref()),
        ] {
            if strides.is_some_and(|strides| strides.is_empty()) {
                return Err(ValidationError::new(name, "is empty"));
            }
        }

        if self.strides.static_value.len() < binding_count {
            return Err(ValidationError::new(
                "strides.static_value",
                "has fewer elements than the vertex layouts have bindings",
            ));
        }

        if self.use_mesh_shaders {
            if self.bad_mesh_shading_pipeline_dyn_state() {
                return Err(ValidationError::new(
                    "use_mesh_shaders",
                    "is true, but a state under test cannot be dynamic in a mesh shading \
                    pipeline",
                ));
            }

            if self.topology.static_value != PrimitiveTopology::TriangleStrip {
                return Err(ValidationError::new(
                    "topology.static_value",
                    "mesh shaders only emit triangle strips",
                ));
            }

            if self.single_vertex {
                return Err(ValidationError::new(
                    "single_vertex",
                    "is true, but mesh shaders need at least three vertices",
                ));
            }
        }

        if self.bind_unused_mesh_shading_pipeline
            && self.ordering != SequenceOrdering::CmdBufferStart
        {
            return Err(ValidationError::new(
                "bind_unused_mesh_shading_pipeline",
                "is only supported with `SequenceOrdering::CmdBufferStart`",
            ));
        }

        if !(0.0..=1.0).contains(&self.clear_depth) {
            return Err(ValidationError::new(
                "clear_depth",
                "is not between 0.0 and 1.0 inclusive",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        DepthBiasParams, SequenceOrdering, StaticAndDynamicPair, TestConfig, LINE_VERTEX_COUNT,
    };
    use crate::{
        format::Format,
        pipeline::{
            graphics::{
                color_blend::LogicOp, input_assembly::PrimitiveTopology,
                rasterization::CullMode, vertex_input::VertexLayout,
            },
            DynamicState, PipelineConstructionType,
        },
    };

    fn config(ordering: SequenceOrdering) -> TestConfig {
        TestConfig::new(PipelineConstructionType::Monolithic, ordering, false)
    }

    #[test]
    fn orderings() {
        let reversed: Vec<_> = SequenceOrdering::ALL
            .into_iter()
            .filter(|ordering| ordering.is_reversed())
            .collect();
        assert_eq!(
            reversed,
            [
                SequenceOrdering::BeforeGoodStatic,
                SequenceOrdering::TwoDrawsStatic,
            ],
        );

        assert_eq!(SequenceOrdering::TwoDrawsDynamic.num_iterations(), 2);
        assert_eq!(SequenceOrdering::TwoDrawsStatic.num_iterations(), 2);
        assert_eq!(SequenceOrdering::AfterPipelines.num_iterations(), 1);

        assert!(!SequenceOrdering::CmdBufferStart.uses_static_pipeline());
        assert!(!SequenceOrdering::BeforeDraw.uses_static_pipeline());
        assert!(SequenceOrdering::TwoDrawsStatic.uses_static_pipeline());
        assert!(!SequenceOrdering::TwoDrawsStatic.binds_static_first());
        assert_eq!(LINE_VERTEX_COUNT, 256);
    }

    #[test]
    fn defaults() {
        let config = config(SequenceOrdering::CmdBufferStart);

        assert!(config.dynamic_states().is_empty());
        assert_eq!(config.strides.static_value.as_slice(), &[16]);
        assert_eq!(config.color_format(), Format::R8G8B8A8_UNORM);
        assert!(!config.needs_tessellation());
        assert!(!config.needs_geometry_shader());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn strides_follow_the_dynamic_layout() {
        let config = TestConfig::with_vertex_layouts(
            PipelineConstructionType::Monolithic,
            SequenceOrdering::BeforeDraw,
            false,
            VertexLayout::ExtraAttributes,
            Some(VertexLayout::MultipleBindings),
        );

        assert_eq!(config.strides.static_value.len(), 6);
        assert!(config.test_vertex_dynamic());
        assert_eq!(
            config.dynamic_states().as_slice(),
            &[DynamicState::VertexInput],
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn dynamic_state_order() {
        let mut config = config(SequenceOrdering::BeforeDraw);
        config.primitive_restart_enable = StaticAndDynamicPair::with_dynamic(false, true);
        config.topology = PrimitiveTopology::LineStrip.into();
        config.cull_mode = StaticAndDynamicPair::with_dynamic(CullMode::Front, CullMode::None);
        config.logic_op = StaticAndDynamicPair::with_dynamic(LogicOp::Clear, LogicOp::Or);
        config.depth_bias =
            StaticAndDynamicPair::with_dynamic(DepthBiasParams::NONE, DepthBiasParams::NONE);

        assert_eq!(
            config.dynamic_states().as_slice(),
            &[
                DynamicState::DepthBias,
                DynamicState::CullMode,
                DynamicState::LogicOp,
                DynamicState::PrimitiveRestartEnable,
            ],
        );
        assert!(config.needs_index_buffer());
        assert!(config.bad_mesh_shading_pipeline_dyn_state());
        assert_eq!(config.color_format(), Format::R8G8B8A8_UINT);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn preconditions() {
        let mut config = config(SequenceOrdering::CmdBufferStart);
        config.topology = StaticAndDynamicPair::with_dynamic(
            PrimitiveTopology::LineList,
            PrimitiveTopology::TriangleStrip,
        );
        assert!(config.validate().is_err());

        let mut config = self::config(SequenceOrdering::CmdBufferStart);
        config.patch_control_points = StaticAndDynamicPair::with_dynamic(1, 3);
        assert!(config.validate().is_err());

        config.topology = PrimitiveTopology::PatchList.into();
        assert!(config.validate().is_ok());
        assert!(config.needs_tessellation());

        config.patch_control_points = StaticAndDynamicPair::with_dynamic(3, 1);
        assert!(config.validate().is_err());

        let mut config = self::config(SequenceOrdering::CmdBufferStart);
        config.use_extra_dynamic_pcp_pipeline = true;
        assert!(config.validate().is_err());

        let mut config = self::config(SequenceOrdering::BeforeDraw);
        config.bind_unused_mesh_shading_pipeline = true;
        assert!(config.validate().is_err());

        let mut config = self::config(SequenceOrdering::BeforeDraw);
        config.primitive_restart_enable = StaticAndDynamicPair::with_dynamic(false, true);
        assert!(config.validate().is_err());
    }

    #[test]
    fn depth_bias_clamp_follows_the_active_value() {
        let mut config = config(SequenceOrdering::CmdBufferStart);
        let bias = DepthBiasParams {
            constant_factor: 2e7,
            clamp: 0.25,
        };

        config.depth_bias = StaticAndDynamicPair::new(bias);
        assert!(config.needs_depth_bias_clamp());

        config.depth_bias = StaticAndDynamicPair::with_dynamic(bias, DepthBiasParams::NONE);
        assert!(!config.needs_depth_bias_clamp());
    }
}
