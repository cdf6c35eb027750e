// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Execution of a single test configuration on a device.
//!
//! A [`TestInstance`] first checks that the device has everything the configuration needs. It
//! then creates the buffers, pipelines and framebuffers, records the commands according to the
//! sequence ordering, submits them and compares the attachments of the last framebuffer against
//! the expected values.

use crate::{
    buffer::{Buffer, BufferUsage, VertexBufferInfo},
    command_buffer::RecordingCommandBuffer,
    config::{apply_ordering, ResolvedConfig, TestConfig, FRAMEBUFFER_EXTENT, LINE_VERTEX_COUNT},
    device::Device,
    format::{Format, FormatFeatures},
    image::{ColorImage, DepthStencilImage, FramebufferCreateInfo},
    pipeline::{
        graphics::{
            color_blend::ColorBlendState,
            depth_stencil::{DepthStencilState, StencilFaces, StencilOpState, StencilOps},
            input_assembly::{InputAssemblyState, PrimitiveTopology, PrimitiveTopologyClass},
            rasterization::RasterizationState,
            tessellation::TessellationState,
            vertex_input::{VertexInputState, VertexLayout},
            viewport::ViewportState,
        },
        shader::PipelineShaders,
        DynamicState, GraphicsPipelineCreateInfo,
    },
    sequence::{record_sequence, SequenceResources},
    verify::{verify_attachments, Verification},
    ExecutionError, NotSupportedError, Requires, TestStatus, ValidationError,
};
use foldhash::HashSet;
use log::{debug, error};
use smallvec::SmallVec;
use std::fmt::{Display, Error as FmtError, Formatter};

/// A depth/stencil format that a test can render to, with the tolerance of its depth values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DepthStencilFormat {
    pub format: Format,

    /// The largest difference allowed between a stored depth value and its expected value.
    pub depth_threshold: f32,
}

/// The depth/stencil formats a test can use, in order of preference.
pub const DEPTH_STENCIL_FORMATS: [DepthStencilFormat; 2] = [
    DepthStencilFormat {
        format: Format::D32_SFLOAT_S8_UINT,
        depth_threshold: 0.0,
    },
    // 1/(2^24-1) < 1e-7 < 2/(2^24-1)
    DepthStencilFormat {
        format: Format::D24_UNORM_S8_UINT,
        depth_threshold: 1.0e-7,
    },
];

/// Returns the first of [`DEPTH_STENCIL_FORMATS`] that `device` can use as a depth/stencil
/// attachment and read back.
pub fn choose_depth_stencil_format(
    device: &(impl Device + ?Sized),
) -> Result<DepthStencilFormat, NotSupportedError> {
    let required = FormatFeatures::DEPTH_STENCIL_ATTACHMENT | FormatFeatures::TRANSFER_SRC;

    DEPTH_STENCIL_FORMATS
        .into_iter()
        .find(|candidate| device.format_features(candidate.format).contains(required))
        .ok_or(NotSupportedError::new(Requires::DepthStencilFormat))
}

/// The result of running a [`TestInstance`].
#[derive(Clone, Debug)]
pub struct TestOutcome {
    /// The verdict.
    pub status: TestStatus,

    /// The attachments and the error masks, when the attachments were read back but did not
    /// match.
    pub diagnostics: Option<Box<Diagnostics>>,
}

impl TestOutcome {
    #[inline]
    fn new(status: TestStatus) -> Self {
        TestOutcome {
            status,
            diagnostics: None,
        }
    }
}

/// What a failed comparison found, for inspection.
#[derive(Clone, Debug)]
pub struct Diagnostics {
    /// The color attachment of the last framebuffer.
    pub color: ColorImage,

    /// The image the color attachment was compared against.
    pub reference_color: ColorImage,

    /// The depth/stencil attachment of the last framebuffer.
    pub depth_stencil: DepthStencilImage,

    /// Which texels of each attachment did not match.
    pub verification: Verification,
}

/// One test configuration, ready to run.
#[derive(Clone, Debug, PartialEq)]
pub struct TestInstance {
    config: TestConfig,
}

impl TestInstance {
    /// Creates a test instance for `config`, after checking that the configuration is valid.
    #[inline]
    pub fn new(config: TestConfig) -> Result<Self, Box<ValidationError>> {
        config.validate()?;

        Ok(TestInstance { config })
    }

    /// Returns the configuration, before it is resolved for its ordering.
    #[inline]
    pub fn config(&self) -> &TestConfig {
        &self.config
    }

    /// Checks that `device` has every feature, limit and format that the configuration needs.
    ///
    /// The depth/stencil format is only chosen when the test runs.
    pub fn check_support(&self, device: &(impl Device + ?Sized)) -> Result<(), NotSupportedError> {
        let config = &self.config;
        let features = device.enabled_features();
        let require = |enabled: bool, feature: &'static str| {
            if enabled {
                Ok(())
            } else {
                Err(NotSupportedError::new(Requires::DeviceFeature(feature)))
            }
        };

        if config.test_extended_dynamic_state() {
            require(features.extended_dynamic_state, "extended_dynamic_state")?;
        }

        if config.test_extended_dynamic_state2() {
            require(features.extended_dynamic_state2, "extended_dynamic_state2")?;
        }

        if config.test_logic_op() {
            require(
                features.extended_dynamic_state2_logic_op,
                "extended_dynamic_state2_logic_op",
            )?;
        }

        if config.test_patch_control_points() || config.use_extra_dynamic_pcp_pipeline {
            require(
                features.extended_dynamic_state2_patch_control_points,
                "extended_dynamic_state2_patch_control_points",
            )?;
        }

        if config.test_vertex_dynamic() {
            require(
                features.vertex_input_dynamic_state,
                "vertex_input_dynamic_state",
            )?;
        }

        if config.use_mesh_shaders || config.bind_unused_mesh_shading_pipeline {
            require(features.mesh_shader, "mesh_shader")?;
        }

        let viewport_count = config.max_viewport_count();
        let max_viewports = device.properties().max_viewports;

        if viewport_count > 1 && viewport_count > max_viewports as usize {
            return Err(NotSupportedError::new(Requires::Limit {
                name: "max_viewports",
                required: viewport_count as u32,
                supported: max_viewports,
            }));
        }

        if config.uses_depth_bounds() {
            require(features.depth_bounds, "depth_bounds")?;
        }

        if config.needs_geometry_shader() {
            require(features.geometry_shader, "geometry_shader")?;
        }

        if config.needs_tessellation() {
            require(features.tessellation_shader, "tessellation_shader")?;
        }

        if config.needs_depth_bias_clamp() {
            require(features.depth_bias_clamp, "depth_bias_clamp")?;
        }

        let color_format = config.color_format();
        let color_features = FormatFeatures::COLOR_ATTACHMENT | FormatFeatures::TRANSFER_SRC;

        if !device.format_features(color_format).contains(color_features) {
            return Err(NotSupportedError::new(Requires::FormatFeatures {
                format: color_format,
                features: color_features,
            }));
        }

        if config.construction_type.uses_libraries() {
            require(
                features.graphics_pipeline_library,
                "graphics_pipeline_library",
            )?;
        }

        Ok(())
    }

    /// Checks support, then runs the test on `device`.
    pub fn run(&self, device: &mut (impl Device + ?Sized)) -> TestOutcome {
        match self.check_support(&*device) {
            Ok(()) => self.iterate(device),
            Err(err) => TestOutcome::new(TestStatus::NotSupported(err)),
        }
    }

    /// Runs the test on `device`, which must have passed [`check_support`](Self::check_support).
    ///
    /// Failing to create an object, to record or to execute the commands fails the test.
    pub fn iterate(&self, device: &mut (impl Device + ?Sized)) -> TestOutcome {
        match self.execute(device) {
            Ok(outcome) => outcome,
            Err(RunError::NotSupported(err)) => TestOutcome::new(TestStatus::NotSupported(err)),
            Err(err) => {
                error!("test could not run to completion: {}", err);

                TestOutcome::new(TestStatus::Fail(err.to_string()))
            }
        }
    }

    fn execute(&self, device: &mut (impl Device + ?Sized)) -> Result<TestOutcome, RunError> {
        let depth_stencil_format = choose_depth_stencil_format(&*device)?;
        debug!(
            "chosen depth/stencil format: {:?}",
            depth_stencil_format.format,
        );

        let config = apply_ordering(self.config.clone())?;
        let color_format = config.color_format();

        let mut framebuffers = SmallVec::new();

        for _ in 0..config.ordering.num_iterations() {
            framebuffers.push(device.create_framebuffer(FramebufferCreateInfo {
                extent: FRAMEBUFFER_EXTENT,
                color_format,
                depth_stencil_format: depth_stencil_format.format,
            })?);
        }

        let topology_class = config.topology.static_value.class();
        let mut vertices = mesh_vertices(topology_class);

        if config.single_vertex {
            vertices.truncate(1);
        }

        let vertex_buffers = create_vertex_buffers(device, &config, &vertices)?;
        let reversed_vertex_buffers = if topology_class == PrimitiveTopologyClass::Triangle {
            create_vertex_buffers(device, &config, &reversed_strip(&vertices))?
        } else {
            vertex_buffers.clone()
        };

        let indices = (0..LINE_VERTEX_COUNT).map(|index| index as u8).collect();
        let index_buffer =
            device.create_buffer(Buffer::from_data(BufferUsage::INDEX_BUFFER, indices))?;

        let static_pipeline = if config.ordering.uses_static_pipeline() {
            Some(device.create_graphics_pipeline(static_pipeline_create_info(&config)?)?)
        } else {
            None
        };
        let dynamic_pipeline =
            device.create_graphics_pipeline(dynamic_pipeline_create_info(&config)?)?;
        let extra_patch_control_points_pipeline = if config.use_extra_dynamic_pcp_pipeline {
            Some(device.create_graphics_pipeline(extra_pcp_pipeline_create_info(&config))?)
        } else {
            None
        };
        let unused_mesh_shading_pipeline = if config.bind_unused_mesh_shading_pipeline {
            Some(device.create_graphics_pipeline(unused_mesh_pipeline_create_info(&config))?)
        } else {
            None
        };

        let resources = SequenceResources {
            static_pipeline,
            dynamic_pipeline,
            extra_patch_control_points_pipeline,
            unused_mesh_shading_pipeline,
            vertex_buffers,
            reversed_vertex_buffers,
            index_buffer,
            framebuffers,
            vertex_count: vertices.len() as u32,
        };

        let mut builder = RecordingCommandBuffer::new(&*device);
        record_sequence(&mut builder, &config, &resources)?;
        let command_buffer = builder.end()?;

        debug!(
            "submitting {} commands, {} of which are draws",
            command_buffer.commands().len(),
            command_buffer.draw_count(),
        );
        device.submit(&command_buffer)?;

        let framebuffer = resources.framebuffers[resources.framebuffers.len() - 1];
        let color = device.read_color_attachment(framebuffer)?;
        let depth_stencil = device.read_depth_stencil_attachment(framebuffer)?;
        let reference_color = config
            .reference_color
            .generate(color_format, FRAMEBUFFER_EXTENT);

        let verification = verify_attachments(
            &color,
            &reference_color,
            &depth_stencil,
            config.expected_depth,
            depth_stencil_format.depth_threshold,
            config.expected_stencil,
        );

        if verification.is_match() {
            return Ok(TestOutcome::new(TestStatus::Pass));
        }

        Ok(TestOutcome {
            status: TestStatus::Fail("Incorrect value found in attachments".into()),
            diagnostics: Some(Box::new(Diagnostics {
                color,
                reference_color,
                depth_stencil,
                verification,
            })),
        })
    }
}

#[derive(Debug)]
enum RunError {
    Validation(Box<ValidationError>),
    NotSupported(NotSupportedError),
    Execution(ExecutionError),
}

impl Display for RunError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        match self {
            Self::Validation(err) => write!(f, "validation error: {}", err),
            Self::NotSupported(err) => write!(f, "not supported: {}", err),
            Self::Execution(err) => write!(f, "execution error: {}", err),
        }
    }
}

impl From<Box<ValidationError>> for RunError {
    fn from(err: Box<ValidationError>) -> Self {
        Self::Validation(err)
    }
}

impl From<NotSupportedError> for RunError {
    fn from(err: NotSupportedError) -> Self {
        Self::NotSupported(err)
    }
}

impl From<ExecutionError> for RunError {
    fn from(err: ExecutionError) -> Self {
        Self::Execution(err)
    }
}

/// Returns the vertices of one mesh covering the whole framebuffer.
///
/// Triangles form a strip of four triangles. Patches form two triangles of three control points
/// each. Lines are one strip of four points through the center of each row of pixels, which
/// would leave gaps if drawn as a list.
fn mesh_vertices(class: PrimitiveTopologyClass) -> Vec<[f32; 2]> {
    match class {
        PrimitiveTopologyClass::Patch => vec![
            [-1.0, 1.0],
            [1.0, 1.0],
            [1.0, -1.0],
            [1.0, -1.0],
            [-1.0, -1.0],
            [-1.0, 1.0],
        ],
        PrimitiveTopologyClass::Line => {
            let rows = FRAMEBUFFER_EXTENT[1];
            let line_height = 2.0 / rows as f32;

            (0..rows)
                .flat_map(|row| {
                    let y = line_height / 2.0 + line_height * row as f32 - 1.0;

                    [[-1.0, y], [-0.5, y], [0.5, y], [1.0, y]]
                })
                .collect()
        }
        // Point topologies are rejected by `TestConfig::validate`.
        PrimitiveTopologyClass::Triangle | PrimitiveTopologyClass::Point => vec![
            [-1.0, -1.0],
            [-1.0, 1.0],
            [0.0, -1.0],
            [0.0, 1.0],
            [1.0, -1.0],
            [1.0, 1.0],
        ],
    }
}

/// Swaps each pair of vertices of a strip, which reverses the winding of every triangle.
fn reversed_strip(vertices: &[[f32; 2]]) -> Vec<[f32; 2]> {
    vertices
        .chunks(2)
        .flat_map(|pair| pair.iter().rev().copied())
        .collect()
}

fn create_vertex_buffers(
    device: &mut (impl Device + ?Sized),
    config: &ResolvedConfig,
    vertices: &[[f32; 2]],
) -> Result<SmallVec<[VertexBufferInfo; 6]>, Box<ValidationError>> {
    let usage = if config.use_mesh_shaders {
        BufferUsage::STORAGE_BUFFER
    } else {
        BufferUsage::VERTEX_BUFFER
    };
    let offset = config.vertex_data_offset;
    let trailing_size = config.vertex_data_extra_bytes;

    config
        .active_vertex_layout()
        .create_vertex_data(vertices, offset, trailing_size)
        .into_iter()
        .map(|data| {
            let data_size = data.len() as u64 - offset - trailing_size;
            let buffer = device.create_buffer(Buffer::from_data(usage, data))?;

            Ok(VertexBufferInfo {
                buffer,
                offset,
                data_size,
            })
        })
        .collect()
}

/// Returns the first `count` values of `values`.
fn truncated<T: Clone>(values: &[T], count: usize) -> SmallVec<[T; 2]> {
    values.iter().take(count).cloned().collect()
}

/// Returns the viewports and scissors of the static part, whose counts must be equal.
fn static_viewport_state(config: &TestConfig) -> ViewportState {
    let count = config
        .viewports
        .static_value
        .len()
        .min(config.scissors.static_value.len());

    ViewportState {
        viewports: truncated(&config.viewports.static_value, count),
        scissors: truncated(&config.scissors.static_value, count),
    }
}

fn stencil_op_state(config: &TestConfig, ops: Option<StencilOps>) -> StencilOpState {
    StencilOpState {
        ops: ops.unwrap_or_default(),
        compare_mask: 0xFF,
        write_mask: 0xFF,
        reference: config.reference_stencil,
    }
}

/// Returns the create info with every state taken from the static values of `config`, without
/// shaders, viewports or dynamic states.
fn base_create_info(config: &TestConfig, shaders: PipelineShaders) -> GraphicsPipelineCreateInfo {
    let mut front = None;
    let mut back = None;

    for params in &config.stencil_ops.static_value {
        if params.faces.includes_front() {
            front = Some(params.ops);
        }

        if params.faces.includes_back() {
            back = Some(params.ops);
        }
    }

    let depth_bias = config.depth_bias.static_value.to_state();
    let mut color_blend_state = ColorBlendState::new();

    if config.test_logic_op() {
        color_blend_state = color_blend_state.logic_op(config.logic_op.static_value);
    }

    let classic = !shaders.is_mesh_shading();

    GraphicsPipelineCreateInfo {
        construction_type: config.construction_type,
        vertex_input_state: None,
        input_assembly_state: classic.then(|| {
            InputAssemblyState::new()
                .topology(config.topology.static_value)
                .primitive_restart_enable(config.primitive_restart_enable.static_value)
        }),
        tessellation_state: (classic && config.needs_tessellation()).then(|| {
            TessellationState::new().patch_control_points(config.patch_control_points.static_value)
        }),
        rasterization_state: RasterizationState::new()
            .rasterizer_discard_enable(config.rasterizer_discard_enable.static_value)
            .cull_mode(config.cull_mode.static_value)
            .front_face(config.front_face.static_value)
            .depth_bias(config.depth_bias_enable.static_value, depth_bias),
        depth_stencil_state: DepthStencilState::new()
            .depth(
                config.depth_test_enable.static_value,
                config.depth_write_enable.static_value,
                config.depth_compare_op.static_value,
            )
            .depth_bounds(
                config.depth_bounds_test_enable.static_value,
                config.depth_bounds.clone(),
            )
            .stencil_test_enable(config.stencil_test_enable.static_value)
            .stencil_op_state(StencilFaces::Front, stencil_op_state(config, front))
            .stencil_op_state(StencilFaces::Back, stencil_op_state(config, back)),
        color_blend_state,
        ..GraphicsPipelineCreateInfo::shaders(shaders)
    }
}

/// Returns the shaders of the pipelines that draw the meshes, reading vertices with `layout`.
fn mesh_shaders(
    config: &ResolvedConfig,
    layout: VertexLayout,
) -> Result<PipelineShaders, Box<ValidationError>> {
    if config.use_mesh_shaders {
        PipelineShaders::mesh(
            config.active_vertex_layout(),
            config.color_numeric_format(),
            config.is_multi_viewport(),
        )
    } else {
        PipelineShaders::vertex(
            layout,
            config.color_numeric_format(),
            config.topology.static_value.class(),
            config.needs_tessellation(),
            config.needs_geometry_shader(),
            config.is_multi_viewport(),
        )
    }
}

fn vertex_input_state(
    config: &ResolvedConfig,
) -> Result<Option<VertexInputState>, Box<ValidationError>> {
    if config.use_mesh_shaders {
        return Ok(None);
    }

    config
        .vertex_layout
        .static_value
        .pipeline_input_state(&config.strides.static_value)
        .map(Some)
}

/// The pipeline with every state baked in.
fn static_pipeline_create_info(
    config: &ResolvedConfig,
) -> Result<GraphicsPipelineCreateInfo, Box<ValidationError>> {
    let shaders = mesh_shaders(config, config.vertex_layout.static_value)?;

    Ok(GraphicsPipelineCreateInfo {
        vertex_input_state: vertex_input_state(config)?,
        viewport_state: static_viewport_state(config),
        ..base_create_info(config, shaders)
    })
}

/// The pipeline with the states under test dynamic.
fn dynamic_pipeline_create_info(
    config: &ResolvedConfig,
) -> Result<GraphicsPipelineCreateInfo, Box<ValidationError>> {
    let layout = config
        .vertex_layout
        .dynamic_value
        .unwrap_or(config.vertex_layout.static_value);
    let shaders = mesh_shaders(config, layout)?;

    // Viewports and scissors are left out when they are set dynamically, with their count.
    let count = config
        .final_viewport_count()
        .min(config.final_scissor_count());
    let viewports = if config.viewports.is_dynamic() {
        SmallVec::new()
    } else {
        truncated(&config.viewports.static_value, count)
    };
    let scissors = if config.scissors.is_dynamic() {
        SmallVec::new()
    } else {
        truncated(&config.scissors.static_value, count)
    };

    Ok(GraphicsPipelineCreateInfo {
        vertex_input_state: vertex_input_state(config)?,
        viewport_state: ViewportState {
            viewports,
            scissors,
        },
        dynamic_state: config.dynamic_states().into_iter().collect(),
        ..base_create_info(config, shaders)
    })
}

/// A pipeline without tessellation that has the patch control points dynamic anyway, and draws
/// one triangle outside of the framebuffer.
fn extra_pcp_pipeline_create_info(config: &ResolvedConfig) -> GraphicsPipelineCreateInfo {
    GraphicsPipelineCreateInfo {
        vertex_input_state: Some(VertexInputState::new()),
        input_assembly_state: Some(
            InputAssemblyState::new().topology(PrimitiveTopology::TriangleList),
        ),
        viewport_state: static_viewport_state(config),
        dynamic_state: [DynamicState::PatchControlPoints].into_iter().collect(),
        ..GraphicsPipelineCreateInfo::shaders(PipelineShaders::offscreen_triangle())
    }
}

/// A mesh shading pipeline that outputs nothing, with the dynamic states that mesh shading
/// pipelines can have.
fn unused_mesh_pipeline_create_info(config: &ResolvedConfig) -> GraphicsPipelineCreateInfo {
    let dynamic_state: HashSet<DynamicState> = config
        .dynamic_states()
        .into_iter()
        .filter(|state| !state.is_mesh_shading_incompatible())
        .collect();
    let mut viewport_state = static_viewport_state(config);

    if dynamic_state.contains(&DynamicState::ViewportWithCount) {
        viewport_state.viewports.clear();
    }

    if dynamic_state.contains(&DynamicState::ScissorWithCount) {
        viewport_state.scissors.clear();
    }

    GraphicsPipelineCreateInfo {
        viewport_state,
        dynamic_state,
        ..base_create_info(config, PipelineShaders::mesh_no_output())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        choose_depth_stencil_format, mesh_vertices, reversed_strip, TestInstance,
        DEPTH_STENCIL_FORMATS,
    };
    use crate::{
        config::{SequenceOrdering, StaticAndDynamicPair, TestConfig, LINE_VERTEX_COUNT},
        device::{DeviceFeatures, DeviceProperties},
        format::{Format, FormatFeatures},
        pipeline::{
            graphics::{
                input_assembly::PrimitiveTopologyClass, rasterization::CullMode,
                viewport::{Scissor, Viewport},
            },
            PipelineConstructionType,
        },
        software::SoftwareDevice,
        NotSupportedError, Requires, TestStatus,
    };
    use smallvec::smallvec;

    fn cull_config(
        ordering: SequenceOrdering,
        static_value: CullMode,
        dynamic_value: CullMode,
    ) -> TestConfig {
        let mut config = TestConfig::new(PipelineConstructionType::Monolithic, ordering, false);
        config.cull_mode = StaticAndDynamicPair::with_dynamic(static_value, dynamic_value);
        config
    }

    #[test]
    fn vertices() {
        assert_eq!(mesh_vertices(PrimitiveTopologyClass::Triangle).len(), 6);
        assert_eq!(mesh_vertices(PrimitiveTopologyClass::Patch).len(), 6);

        let lines = mesh_vertices(PrimitiveTopologyClass::Line);
        assert_eq!(lines.len(), LINE_VERTEX_COUNT as usize);
        assert_eq!(lines[0], [-1.0, 1.0 / 64.0 - 1.0]);
        assert_eq!(lines[3][0], 1.0);

        let strip = mesh_vertices(PrimitiveTopologyClass::Triangle);
        let reversed = reversed_strip(&strip);
        assert_eq!(reversed[0], strip[1]);
        assert_eq!(reversed[1], strip[0]);
        assert_eq!(reversed[5], strip[4]);
        assert_eq!(reversed_strip(&strip[..1]), &strip[..1]);
    }

    #[test]
    fn depth_stencil_format_preference() {
        let device = SoftwareDevice::new();
        assert_eq!(
            choose_depth_stencil_format(&device),
            Ok(DEPTH_STENCIL_FORMATS[0]),
        );

        let device = SoftwareDevice::new()
            .with_format_features(Format::D32_SFLOAT_S8_UINT, FormatFeatures::TRANSFER_SRC);
        let chosen = choose_depth_stencil_format(&device).unwrap();
        assert_eq!(chosen.format, Format::D24_UNORM_S8_UINT);
        assert_eq!(chosen.depth_threshold, 1.0e-7);

        let device =
            device.with_format_features(Format::D24_UNORM_S8_UINT, FormatFeatures::empty());
        assert_eq!(
            choose_depth_stencil_format(&device),
            Err(NotSupportedError::new(Requires::DepthStencilFormat)),
        );
    }

    #[test]
    fn support_is_checked_in_order() {
        let instance = TestInstance::new(cull_config(
            SequenceOrdering::CmdBufferStart,
            CullMode::Front,
            CullMode::None,
        ))
        .unwrap();

        let mut features = DeviceFeatures::all();
        features.extended_dynamic_state = false;
        let mut device = SoftwareDevice::with_features(features);
        assert_eq!(
            instance.check_support(&device),
            Err(NotSupportedError::new(Requires::DeviceFeature(
                "extended_dynamic_state"
            ))),
        );

        let outcome = instance.run(&mut device);
        assert!(matches!(outcome.status, TestStatus::NotSupported(_)));
        assert!(outcome.diagnostics.is_none());

        let mut config = instance.config().clone();
        config.viewports = StaticAndDynamicPair::with_dynamic(
            smallvec![Viewport::new([0.0, 0.0], [64.0, 64.0])],
            smallvec![
                Viewport::new([0.0, 0.0], [64.0, 32.0]),
                Viewport::new([0.0, 32.0], [64.0, 32.0]),
            ],
        );
        config.scissors = StaticAndDynamicPair::with_dynamic(
            smallvec![Scissor::new([0, 0], [64, 64])],
            smallvec![
                Scissor::new([0, 0], [64, 32]),
                Scissor::new([0, 32], [64, 32]),
            ],
        );
        let instance = TestInstance::new(config).unwrap();

        let device = SoftwareDevice::new().with_properties(DeviceProperties { max_viewports: 1 });
        assert_eq!(
            instance.check_support(&device),
            Err(NotSupportedError::new(Requires::Limit {
                name: "max_viewports",
                required: 2,
                supported: 1,
            })),
        );

        let mut features = DeviceFeatures::all();
        features.geometry_shader = false;
        let device = SoftwareDevice::with_features(features);
        assert_eq!(
            instance.check_support(&device),
            Err(NotSupportedError::new(Requires::DeviceFeature("geometry_shader"))),
        );
    }

    #[test]
    fn color_format_support() {
        let config = TestConfig::new(
            PipelineConstructionType::Monolithic,
            SequenceOrdering::CmdBufferStart,
            false,
        );
        let instance = TestInstance::new(config).unwrap();

        let device = SoftwareDevice::new()
            .with_format_features(Format::R8G8B8A8_UNORM, FormatFeatures::COLOR_ATTACHMENT);
        assert!(matches!(
            instance.check_support(&device),
            Err(NotSupportedError {
                requires: Requires::FormatFeatures {
                    format: Format::R8G8B8A8_UNORM,
                    ..
                },
            }),
        ));
    }

    #[test]
    fn dynamic_cull_mode_takes_effect() {
        let instance = TestInstance::new(cull_config(
            SequenceOrdering::CmdBufferStart,
            CullMode::Front,
            CullMode::None,
        ))
        .unwrap();
        let mut device = SoftwareDevice::new();

        let outcome = instance.run(&mut device);
        assert_eq!(outcome.status, TestStatus::Pass);
        assert!(outcome.diagnostics.is_none());
    }

    #[test]
    fn wrong_dynamic_value_fails() {
        // Culling front faces removes the whole strip, so the framebuffer keeps its clear color.
        let instance = TestInstance::new(cull_config(
            SequenceOrdering::BeforeDraw,
            CullMode::None,
            CullMode::Front,
        ))
        .unwrap();
        let mut device = SoftwareDevice::new();

        let outcome = instance.run(&mut device);
        assert_eq!(
            outcome.status,
            TestStatus::Fail("Incorrect value found in attachments".into()),
        );

        let diagnostics = outcome.diagnostics.unwrap();
        assert_eq!(
            diagnostics.verification.color.unwrap().error_count(),
            64 * 64
        );
        assert!(diagnostics.verification.depth.is_none());
        assert!(diagnostics.verification.stencil.is_none());
        assert_eq!(diagnostics.color.pixel_float(10, 10), [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn every_ordering_passes() {
        for ordering in SequenceOrdering::ALL {
            let instance =
                TestInstance::new(cull_config(ordering, CullMode::Front, CullMode::None)).unwrap();
            let mut device = SoftwareDevice::new();

            assert_eq!(
                instance.run(&mut device).status,
                TestStatus::Pass,
                "{:?}",
                ordering
            );
        }
    }
}
