// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Recording of the commands of a test, following its sequence ordering.
//!
//! Every ordering records the same draws. What changes is where the dynamic state is set
//! relative to the render pass, the pipeline binds and the draws:
//!
//! | Ordering             | Dynamic state is set                       | Pipelines bound                |
//! |----------------------|--------------------------------------------|--------------------------------|
//! | `CmdBufferStart`     | before the render pass begins              | dynamic                        |
//! | `BeforeDraw`         | before each draw                           | dynamic                        |
//! | `BetweenPipelines`   | between the two binds                      | static, dynamic                |
//! | `AfterPipelines`     | after both binds, before each draw         | static, dynamic                |
//! | `BeforeGoodStatic`   | between the two binds                      | dynamic, static                |
//! | `TwoDrawsDynamic`    | before the second draw                     | static + draw, dynamic + draw  |
//! | `TwoDrawsStatic`     | before the first draw                      | dynamic + draw, static + draw  |
//!
//! The two-draw orderings record one render pass per draw, each into its own framebuffer.
//!
//! Vertex buffers whose strides are dynamic are bound at the point the dynamic state is set.
//! Otherwise, they are bound before each draw.

use crate::{
    buffer::{BufferId, VertexBufferInfo},
    command_buffer::{RecordingCommandBuffer, RenderPassBeginInfo, VertexBufferBinding},
    config::{ResolvedConfig, SequenceOrdering, TestConfig, LINE_VERTEX_COUNT},
    image::FramebufferId,
    pipeline::{graphics::input_assembly::IndexType, PipelineId},
    ValidationError,
};
use log::debug;
use smallvec::SmallVec;

/// Everything the recorded commands refer to.
#[derive(Clone, Debug)]
pub struct SequenceResources {
    /// The pipeline with every state of the test static. Needed by the orderings for which
    /// [`SequenceOrdering::uses_static_pipeline`] is true.
    pub static_pipeline: Option<PipelineId>,

    /// The pipeline with the states under test dynamic.
    pub dynamic_pipeline: PipelineId,

    /// A pipeline with only the patch control points dynamic, which draws outside of the
    /// framebuffer before the dynamic pipeline is bound.
    pub extra_patch_control_points_pipeline: Option<PipelineId>,

    /// A mesh shading pipeline bound, but never used, before the dynamic pipeline.
    pub unused_mesh_shading_pipeline: Option<PipelineId>,

    /// One buffer per binding of the vertex layout. Mesh shaders read them as storage buffers.
    pub vertex_buffers: SmallVec<[VertexBufferInfo; 6]>,

    /// The same as `vertex_buffers`, with the winding of the triangles reversed.
    pub reversed_vertex_buffers: SmallVec<[VertexBufferInfo; 6]>,

    /// Holds [`LINE_VERTEX_COUNT`] 8-bit indices counting from zero.
    pub index_buffer: BufferId,

    /// One framebuffer per iteration of the ordering.
    pub framebuffers: SmallVec<[FramebufferId; 2]>,

    /// The number of vertices in each vertex buffer.
    pub vertex_count: u32,
}

impl SequenceResources {
    fn vertex_buffers(&self, reversed: bool) -> &[VertexBufferInfo] {
        if reversed {
            &self.reversed_vertex_buffers
        } else {
            &self.vertex_buffers
        }
    }

    fn static_pipeline(&self) -> Result<PipelineId, Box<ValidationError>> {
        self.static_pipeline.ok_or_else(|| {
            ValidationError::new(
                "static_pipeline",
                "is `None`, but the sequence ordering binds a static pipeline",
            )
        })
    }
}

/// Records every command of a test into `builder`.
///
/// `config` must already be resolved for its ordering: it is the dynamic values of its pairs
/// that are set.
pub fn record_sequence(
    builder: &mut RecordingCommandBuffer,
    config: &ResolvedConfig,
    resources: &SequenceResources,
) -> Result<(), Box<ValidationError>> {
    let ordering = config.ordering;
    let iterations = ordering.num_iterations();

    if resources.framebuffers.len() < iterations as usize {
        return Err(ValidationError::new(
            "resources.framebuffers",
            format!(
                "has {} elements, but the sequence ordering has {} iterations",
                resources.framebuffers.len(),
                iterations,
            ),
        ));
    }

    for iteration in 0..iterations {
        debug!(
            "recording iteration {} of sequence ordering `{}`",
            iteration,
            ordering.name(),
        );

        let mut bound_in_advance = false;

        if ordering == SequenceOrdering::CmdBufferStart {
            set_dynamic_states(builder, config)?;
            bound_in_advance = bind_with_dynamic_strides(builder, config, resources, 0)?;
        }

        builder.begin_render_pass(RenderPassBeginInfo {
            clear_color: config.clear_color,
            clear_depth: config.clear_depth,
            clear_stencil: config.clear_stencil,
            ..RenderPassBeginInfo::framebuffer(resources.framebuffers[iteration as usize])
        })?;

        if ordering.binds_static_first() && iteration == 0 {
            builder.bind_pipeline_graphics(resources.static_pipeline()?)?;
        }

        if ordering == SequenceOrdering::BetweenPipelines {
            set_dynamic_states(builder, config)?;
            bound_in_advance = bind_with_dynamic_strides(builder, config, resources, 0)?;
        }

        if binds_dynamic_pipeline(ordering, iteration) {
            if let Some(pipeline) = resources.unused_mesh_shading_pipeline {
                builder.bind_pipeline_graphics(pipeline)?;
            }

            if let Some(pipeline) = resources.extra_patch_control_points_pipeline {
                builder.bind_pipeline_graphics(pipeline)?;

                // The right value was set before these two binds already.
                if !matches!(
                    ordering,
                    SequenceOrdering::CmdBufferStart | SequenceOrdering::BetweenPipelines
                ) {
                    builder.set_patch_control_points(config.patch_control_points.static_value)?;
                }

                builder.draw(3, 1, 0, 0)?;
            }

            builder.bind_pipeline_graphics(resources.dynamic_pipeline)?;
        }

        if sets_state_after_dynamic_bind(ordering, iteration) {
            set_dynamic_states(builder, config)?;
            bound_in_advance = bind_with_dynamic_strides(builder, config, resources, 0)?;
        }

        if ordering == SequenceOrdering::BeforeGoodStatic
            || (ordering == SequenceOrdering::TwoDrawsStatic && iteration > 0)
        {
            builder.bind_pipeline_graphics(resources.static_pipeline()?)?;
        }

        for viewport_index in 0..config.active_viewports().len() {
            for (mesh_index, mesh) in config.mesh_params.iter().enumerate() {
                builder.push_constants(mesh.push_constants(viewport_index as u32))?;

                let mut bound_before_draw = false;

                if matches!(
                    ordering,
                    SequenceOrdering::BeforeDraw | SequenceOrdering::AfterPipelines
                ) {
                    set_dynamic_states(builder, config)?;
                    bound_before_draw =
                        bind_with_dynamic_strides(builder, config, resources, mesh_index)?;
                }

                if !(bound_in_advance || bound_before_draw) && !config.use_mesh_shaders {
                    let bindings: SmallVec<[_; 6]> = resources
                        .vertex_buffers(mesh.reversed)
                        .iter()
                        .map(|info| VertexBufferBinding {
                            buffer: info.buffer,
                            offset: info.offset,
                            size: None,
                        })
                        .collect();
                    builder.bind_vertex_buffers(0, &bindings)?;

                    if config.needs_index_buffer() {
                        builder.bind_index_buffer(resources.index_buffer, 0, IndexType::U8)?;
                    }
                }

                if config.use_mesh_shaders {
                    builder.bind_storage_buffers(resources.vertex_buffers(mesh.reversed))?;
                }

                record_draw(builder, config, resources)?;
            }
        }

        builder.end_render_pass()?;
    }

    Ok(())
}

fn binds_dynamic_pipeline(ordering: SequenceOrdering, iteration: u32) -> bool {
    match ordering {
        SequenceOrdering::TwoDrawsDynamic => iteration > 0,
        SequenceOrdering::TwoDrawsStatic => iteration == 0,
        _ => true,
    }
}

fn sets_state_after_dynamic_bind(ordering: SequenceOrdering, iteration: u32) -> bool {
    match ordering {
        SequenceOrdering::BeforeGoodStatic => true,
        SequenceOrdering::TwoDrawsDynamic => iteration > 0,
        SequenceOrdering::TwoDrawsStatic => iteration == 0,
        _ => false,
    }
}

fn record_draw(
    builder: &mut RecordingCommandBuffer,
    config: &TestConfig,
    resources: &SequenceResources,
) -> Result<(), Box<ValidationError>> {
    if config.needs_index_buffer() {
        builder.draw_indexed(LINE_VERTEX_COUNT, 1, 0, 0, 0)?;
    } else if config.use_mesh_shaders {
        if resources.vertex_count <= 2 {
            return Err(ValidationError::new(
                "resources.vertex_count",
                "mesh shaders need more than two vertices",
            ));
        }

        builder.draw_mesh_tasks([resources.vertex_count - 2, 1, 1])?;
    } else {
        let vertex_count = if config.single_vertex {
            config.single_vertex_draw_count
        } else {
            resources.vertex_count
        };

        builder.draw(vertex_count, 1, 0, 0)?;
    }

    Ok(())
}

/// Records a command for every dynamic value of `config`.
pub fn set_dynamic_states(
    builder: &mut RecordingCommandBuffer,
    config: &TestConfig,
) -> Result<(), Box<ValidationError>> {
    if let Some(cull_mode) = config.cull_mode.dynamic_value {
        builder.set_cull_mode(cull_mode)?;
    }

    if let Some(front_face) = config.front_face.dynamic_value {
        builder.set_front_face(front_face)?;
    }

    if let Some(topology) = config.topology.dynamic_value {
        builder.set_primitive_topology(topology)?;
    }

    if let Some(viewports) = &config.viewports.dynamic_value {
        builder.set_viewport_with_count(viewports)?;
    }

    if let Some(scissors) = &config.scissors.dynamic_value {
        builder.set_scissor_with_count(scissors)?;
    }

    if let Some(enable) = config.depth_test_enable.dynamic_value {
        builder.set_depth_test_enable(enable)?;
    }

    if let Some(enable) = config.depth_write_enable.dynamic_value {
        builder.set_depth_write_enable(enable)?;
    }

    if let Some(compare_op) = config.depth_compare_op.dynamic_value {
        builder.set_depth_compare_op(compare_op)?;
    }

    if let Some(enable) = config.depth_bounds_test_enable.dynamic_value {
        builder.set_depth_bounds_test_enable(enable)?;
    }

    if let Some(enable) = config.stencil_test_enable.dynamic_value {
        builder.set_stencil_test_enable(enable)?;
    }

    if let Some(enable) = config.depth_bias_enable.dynamic_value {
        builder.set_depth_bias_enable(enable)?;
    }

    if let Some(depth_bias) = config.depth_bias.dynamic_value {
        builder.set_depth_bias(depth_bias.to_state())?;
    }

    if let Some(enable) = config.rasterizer_discard_enable.dynamic_value {
        builder.set_rasterizer_discard_enable(enable)?;
    }

    if let Some(enable) = config.primitive_restart_enable.dynamic_value {
        builder.set_primitive_restart_enable(enable)?;
    }

    if let Some(logic_op) = config.logic_op.dynamic_value {
        builder.set_logic_op(logic_op)?;
    }

    if let Some(num) = config.patch_control_points.dynamic_value {
        builder.set_patch_control_points(num)?;
    }

    if let Some(stencil_ops) = &config.stencil_ops.dynamic_value {
        for params in stencil_ops {
            builder.set_stencil_op(params.faces, params.ops)?;
        }
    }

    if let Some(layout) = config.vertex_layout.dynamic_value {
        let vertex_input_state = layout.dynamic_input_state(&config.strides.static_value)?;
        builder.set_vertex_input(&vertex_input_state)?;
    }

    Ok(())
}

/// Binds the vertex buffers of mesh `mesh_index` along with their dynamic strides, if the
/// strides are under test. Returns whether anything was bound.
fn bind_with_dynamic_strides(
    builder: &mut RecordingCommandBuffer,
    config: &ResolvedConfig,
    resources: &SequenceResources,
    mesh_index: usize,
) -> Result<bool, Box<ValidationError>> {
    let strides = match &config.strides.dynamic_value {
        Some(strides) => strides,
        None => return Ok(false),
    };

    // Buffers bound once cannot serve several meshes or viewports with their own draws.
    if (config.active_viewports().len() != 1 || config.mesh_params.len() != 1)
        && !matches!(
            config.ordering,
            SequenceOrdering::BeforeDraw | SequenceOrdering::AfterPipelines
        )
    {
        return Err(ValidationError::new(
            "strides.dynamic_value",
            "dynamic strides with several viewports or meshes need an ordering that sets state \
            before each draw",
        ));
    }

    let reversed = config
        .mesh_params
        .get(mesh_index)
        .is_some_and(|mesh| mesh.reversed);
    let bindings: SmallVec<[VertexBufferBinding; 6]> = resources
        .vertex_buffers(reversed)
        .iter()
        .copied()
        .map(VertexBufferBinding::from)
        .collect();

    builder.bind_vertex_buffers_with_strides(0, &bindings, strides)?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::{record_sequence, SequenceResources};
    use crate::{
        buffer::VertexBufferInfo,
        command_buffer::{Command, RecordingCommandBuffer},
        config::{apply_ordering, SequenceOrdering, StaticAndDynamicPair, TestConfig},
        pipeline::{graphics::rasterization::CullMode, PipelineConstructionType},
        software::SoftwareDevice,
        Id,
    };
    use smallvec::smallvec;

    const STATIC: u32 = 10;
    const DYNAMIC: u32 = 11;

    fn resources() -> SequenceResources {
        SequenceResources {
            static_pipeline: Some(Id::new(STATIC)),
            dynamic_pipeline: Id::new(DYNAMIC),
            extra_patch_control_points_pipeline: None,
            unused_mesh_shading_pipeline: None,
            vertex_buffers: smallvec![VertexBufferInfo {
                buffer: Id::new(0),
                offset: 0,
                data_size: 96,
            }],
            reversed_vertex_buffers: smallvec![VertexBufferInfo {
                buffer: Id::new(1),
                offset: 0,
                data_size: 96,
            }],
            index_buffer: Id::new(2),
            framebuffers: smallvec![Id::new(0), Id::new(1)],
            vertex_count: 6,
        }
    }

    fn labels(commands: &[Command]) -> Vec<&'static str> {
        commands
            .iter()
            .map(|command| match command {
                Command::BeginRenderPass { .. } => "begin",
                Command::EndRenderPass => "end",
                Command::BindPipeline(id) if id.index() == STATIC => "static",
                Command::BindPipeline(id) if id.index() == DYNAMIC => "dynamic",
                Command::BindPipeline(_) => "other",
                Command::BindVertexBuffers { strides: None, .. } => "vertex",
                Command::BindVertexBuffers { strides: Some(_), .. } => "vertex+strides",
                Command::BindIndexBuffer { .. } => "index",
                Command::BindStorageBuffers(_) => "storage",
                Command::PushConstants(_) => "push",
                Command::Draw { .. } | Command::DrawIndexed { .. } => "draw",
                Command::DrawMeshTasks { .. } => "mesh",
                _ => "set",
            })
            .collect()
    }

    fn record(config: TestConfig, resources: &SequenceResources) -> Vec<&'static str> {
        let device = SoftwareDevice::new();
        let resolved = apply_ordering(config).unwrap();
        let mut builder = RecordingCommandBuffer::new(&device);
        record_sequence(&mut builder, &resolved, resources).unwrap();

        labels(builder.end().unwrap().commands())
    }

    fn cull_config(ordering: SequenceOrdering) -> TestConfig {
        let mut config = TestConfig::new(PipelineConstructionType::Monolithic, ordering, false);
        config.cull_mode = StaticAndDynamicPair::with_dynamic(CullMode::Front, CullMode::None);
        config
    }

    #[test]
    fn orderings() {
        let expected: [(SequenceOrdering, &[&str]); 7] = [
            (
                SequenceOrdering::CmdBufferStart,
                &["set", "begin", "dynamic", "push", "vertex", "draw", "end"],
            ),
            (
                SequenceOrdering::BeforeDraw,
                &["begin", "dynamic", "push", "set", "vertex", "draw", "end"],
            ),
            (
                SequenceOrdering::BetweenPipelines,
                &[
                    "begin", "static", "set", "dynamic", "push", "vertex", "draw", "end",
                ],
            ),
            (
                SequenceOrdering::AfterPipelines,
                &[
                    "begin", "static", "dynamic", "push", "set", "vertex", "draw", "end",
                ],
            ),
            (
                SequenceOrdering::BeforeGoodStatic,
                &[
                    "begin", "dynamic", "set", "static", "push", "vertex", "draw", "end",
                ],
            ),
            (
                SequenceOrdering::TwoDrawsDynamic,
                &[
                    "begin", "static", "push", "vertex", "draw", "end", "begin", "dynamic",
                    "set", "push", "vertex", "draw", "end",
                ],
            ),
            (
                SequenceOrdering::TwoDrawsStatic,
                &[
                    "begin", "dynamic", "set", "push", "vertex", "draw", "end", "begin",
                    "static", "push", "vertex", "draw", "end",
                ],
            ),
        ];

        for (ordering, commands) in expected {
            assert_eq!(
                record(cull_config(ordering), &resources()),
                commands,
                "{:?}",
                ordering,
            );
        }
    }

    #[test]
    fn dynamic_strides_bind_with_the_state() {
        let mut config = cull_config(SequenceOrdering::CmdBufferStart);
        config.strides = StaticAndDynamicPair::with_dynamic(smallvec![32], smallvec![16]);

        assert_eq!(
            record(config, &resources()),
            [
                "set",
                "vertex+strides",
                "begin",
                "dynamic",
                "push",
                "draw",
                "end",
            ],
        );
    }

    #[test]
    fn extra_pipelines_draw_first() {
        let mut resources = resources();
        resources.unused_mesh_shading_pipeline = Some(Id::new(20));
        resources.extra_patch_control_points_pipeline = Some(Id::new(21));

        let mut config = cull_config(SequenceOrdering::CmdBufferStart);
        config.bind_unused_mesh_shading_pipeline = true;

        assert_eq!(
            record(config, &resources),
            [
                "set", "begin", "other", "other", "draw", "dynamic", "push", "vertex", "draw",
                "end",
            ],
        );
    }

    #[test]
    fn meshes_and_viewports_multiply_draws() {
        let mut config = cull_config(SequenceOrdering::BeforeDraw);
        let mesh = config.mesh_params[0];
        config.mesh_params.push(mesh);

        let commands = record(config, &resources());
        assert_eq!(commands.iter().filter(|&&c| c == "draw").count(), 2);
        assert_eq!(commands.iter().filter(|&&c| c == "set").count(), 2);
    }

    #[test]
    fn missing_static_pipeline() {
        let mut resources = resources();
        resources.static_pipeline = None;

        let device = SoftwareDevice::new();
        let resolved = apply_ordering(cull_config(SequenceOrdering::BeforeGoodStatic)).unwrap();
        let mut builder = RecordingCommandBuffer::new(&device);

        let result = record_sequence(&mut builder, &resolved, &resources);
        assert!(result.is_err());
    }
}
