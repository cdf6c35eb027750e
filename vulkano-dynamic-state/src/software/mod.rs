// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! A device that executes command buffers on the host.
//!
//! [`SoftwareDevice`] interprets recorded commands with the semantics of the Vulkan pipeline
//! stages that the tests exercise: vertex fetch, the shaders of [`PipelineShaders`], primitive
//! assembly with restart, the viewport transform, scissoring, culling, depth bias, the depth
//! bounds, stencil and depth tests and logic ops. It tracks dynamic state the way a driver must,
//! including the invalidation of values when a pipeline with the state fixed is bound, and
//! reports a draw that needs a dynamic value nobody set as an error instead of rendering
//! garbage.
//!
//! Rasterization follows the usual pixel-center sampling rules, which is enough to give exact
//! results for the axis-aligned and half-pixel-free geometry the tests draw.

use self::{
    rasterizer::{FragmentColor, Position, Primitive},
    state::{DrawState, DynamicValues},
};
use crate::{
    buffer::{Buffer, BufferId, VertexBufferInfo},
    command_buffer::{Command, CommandBuffer, VertexBufferBinding},
    device::{Device, DeviceFeatures, DeviceProperties},
    format::{Format, FormatFeatures},
    image::{
        ClearColorValue, ColorImage, DepthStencilImage, Framebuffer, FramebufferCreateInfo,
        FramebufferId,
    },
    pipeline::{
        graphics::{
            input_assembly::{IndexType, PrimitiveTopology},
            vertex_input::{VertexInputRate, VertexInputState, VertexLayout},
        },
        shader::{FragmentOutput, PreRasterization, PushConstants},
        GraphicsPipeline, GraphicsPipelineCreateInfo, PipelineId,
    },
    DeviceSize, ExecutionError, Id, ValidationError,
};
use foldhash::HashMap;
use log::{debug, trace, warn};
use smallvec::{smallvec, SmallVec};

mod rasterizer;
mod state;

/// A [`Device`] that renders on the host.
#[derive(Debug)]
pub struct SoftwareDevice {
    features: DeviceFeatures,
    properties: DeviceProperties,
    format_features: HashMap<Format, FormatFeatures>,
    buffers: Vec<Buffer>,
    pipelines: Vec<GraphicsPipeline>,
    framebuffers: Vec<Framebuffer>,
}

impl SoftwareDevice {
    /// Creates a device with every feature enabled and the default limits.
    #[inline]
    pub fn new() -> Self {
        Self::with_features(DeviceFeatures::all())
    }

    /// Creates a device with only `features` enabled.
    pub fn with_features(features: DeviceFeatures) -> Self {
        SoftwareDevice {
            features,
            properties: DeviceProperties::default(),
            format_features: HashMap::default(),
            buffers: Vec::new(),
            pipelines: Vec::new(),
            framebuffers: Vec::new(),
        }
    }

    /// Replaces the limits of the device.
    #[inline]
    pub fn with_properties(mut self, properties: DeviceProperties) -> Self {
        self.properties = properties;
        self
    }

    /// Overrides the features that `format` supports.
    #[inline]
    pub fn with_format_features(mut self, format: Format, features: FormatFeatures) -> Self {
        self.format_features.insert(format, features);
        self
    }

    fn buffer(&self, id: BufferId) -> Result<&Buffer, ExecutionError> {
        self.buffers
            .get(id.index() as usize)
            .ok_or(ExecutionError::UnknownBuffer(id))
    }

    fn pipeline(&self, id: PipelineId) -> Result<&GraphicsPipeline, ExecutionError> {
        self.pipelines
            .get(id.index() as usize)
            .ok_or(ExecutionError::UnknownPipeline(id))
    }

    fn framebuffer(&self, id: FramebufferId) -> Result<&Framebuffer, ExecutionError> {
        self.framebuffers
            .get(id.index() as usize)
            .ok_or(ExecutionError::UnknownFramebuffer(id))
    }
}

impl Default for SoftwareDevice {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

/// Returns the format features of `format` on a device that was not told otherwise.
fn default_format_features(format: Format) -> FormatFeatures {
    match format {
        Format::R8G8B8A8_UNORM | Format::R8G8B8A8_UINT => {
            FormatFeatures::COLOR_ATTACHMENT | FormatFeatures::TRANSFER_SRC
        }
        Format::R32G32_SFLOAT | Format::R32G32B32A32_SFLOAT => FormatFeatures::VERTEX_BUFFER,
        Format::D24_UNORM_S8_UINT | Format::D32_SFLOAT_S8_UINT => {
            FormatFeatures::DEPTH_STENCIL_ATTACHMENT | FormatFeatures::TRANSFER_SRC
        }
    }
}

fn next_id<T, U>(items: &[U]) -> Result<Id<T>, Box<ValidationError>> {
    u32::try_from(items.len())
        .map(Id::new)
        .map_err(|_| ValidationError::new("device", "too many objects were created"))
}

impl Device for SoftwareDevice {
    #[inline]
    fn enabled_features(&self) -> &DeviceFeatures {
        &self.features
    }

    #[inline]
    fn properties(&self) -> &DeviceProperties {
        &self.properties
    }

    fn format_features(&self, format: Format) -> FormatFeatures {
        self.format_features
            .get(&format)
            .copied()
            .unwrap_or_else(|| default_format_features(format))
    }

    fn create_buffer(&mut self, buffer: Buffer) -> Result<BufferId, Box<ValidationError>> {
        buffer.validate()?;
        let id = next_id(&self.buffers)?;
        self.buffers.push(buffer);

        Ok(id)
    }

    fn create_graphics_pipeline(
        &mut self,
        create_info: GraphicsPipelineCreateInfo,
    ) -> Result<PipelineId, Box<ValidationError>> {
        let pipeline = GraphicsPipeline::new(create_info, &self.features, &self.properties)?;
        let id = next_id(&self.pipelines)?;
        debug!(
            "created pipeline {:?} with dynamic states {:?}",
            id,
            pipeline.dynamic_states().collect::<Vec<_>>(),
        );
        self.pipelines.push(pipeline);

        Ok(id)
    }

    fn create_framebuffer(
        &mut self,
        create_info: FramebufferCreateInfo,
    ) -> Result<FramebufferId, Box<ValidationError>> {
        create_info.validate()?;

        for (format, context) in [
            (create_info.color_format, "color_format"),
            (create_info.depth_stencil_format, "depth_stencil_format"),
        ] {
            let required = if format.is_depth_stencil() {
                FormatFeatures::DEPTH_STENCIL_ATTACHMENT
            } else {
                FormatFeatures::COLOR_ATTACHMENT
            };

            if !self.format_features(format).contains(required) {
                return Err(ValidationError::new(
                    context,
                    "the format cannot be used as an attachment on this device",
                ));
            }
        }

        let id = next_id(&self.framebuffers)?;
        self.framebuffers.push(Framebuffer::new(&create_info));

        Ok(id)
    }

    fn submit(&mut self, command_buffer: &CommandBuffer) -> Result<(), ExecutionError> {
        let mut executor = Executor::default();

        for command in command_buffer.commands() {
            trace!("executing {:?}", command);
            executor.execute(self, command)?;
        }

        Ok(())
    }

    fn read_color_attachment(
        &self,
        framebuffer: FramebufferId,
    ) -> Result<ColorImage, ExecutionError> {
        Ok(self.framebuffer(framebuffer)?.color.clone())
    }

    fn read_depth_stencil_attachment(
        &self,
        framebuffer: FramebufferId,
    ) -> Result<DepthStencilImage, ExecutionError> {
        Ok(self.framebuffer(framebuffer)?.depth_stencil.clone())
    }
}

/// The state of a command buffer during its execution.
#[derive(Debug, Default)]
struct Executor {
    dynamic: DynamicValues,
    pipeline: Option<PipelineId>,
    framebuffer: Option<FramebufferId>,
    vertex_buffers: SmallVec<[(u32, VertexBufferBinding); 6]>,
    index_buffer: Option<(BufferId, DeviceSize, IndexType)>,
    storage_buffers: SmallVec<[VertexBufferInfo; 6]>,
    push_constants: PushConstants,
}

/// Where the vertices of a draw come from.
#[derive(Clone, Copy, Debug)]
enum DrawSource {
    Vertices {
        vertex_count: u32,
        first_vertex: u32,
        first_instance: u32,
    },
    Indices {
        index_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    },
    MeshTasks {
        group_count: u32,
    },
}

impl Executor {
    fn execute(
        &mut self,
        device: &mut SoftwareDevice,
        command: &Command,
    ) -> Result<(), ExecutionError> {
        match command {
            &Command::BeginRenderPass {
                framebuffer,
                clear_color,
                clear_depth,
                clear_stencil,
            } => {
                let target = device
                    .framebuffers
                    .get_mut(framebuffer.index() as usize)
                    .ok_or(ExecutionError::UnknownFramebuffer(framebuffer))?;
                target.color.clear(clear_color);
                target
                    .depth_stencil
                    .clear(clear_depth, (clear_stencil & 0xFF) as u8);
                self.framebuffer = Some(framebuffer);
            }
            Command::EndRenderPass => self.framebuffer = None,
            &Command::BindPipeline(id) => {
                self.dynamic.invalidate(device.pipeline(id)?);
                self.pipeline = Some(id);
            }
            Command::BindVertexBuffers {
                first_binding,
                buffers,
                strides: _,
            } => {
                for (binding, buffer) in (*first_binding..).zip(buffers.iter()) {
                    device.buffer(buffer.buffer)?;

                    match self.vertex_buffers.iter_mut().find(|(b, _)| *b == binding) {
                        Some((_, existing)) => *existing = *buffer,
                        None => self.vertex_buffers.push((binding, *buffer)),
                    }
                }

                self.dynamic.apply(command);
            }
            &Command::BindIndexBuffer {
                buffer,
                offset,
                index_type,
            } => {
                device.buffer(buffer)?;
                self.index_buffer = Some((buffer, offset, index_type));
            }
            Command::BindStorageBuffers(buffers) => {
                for info in buffers {
                    device.buffer(info.buffer)?;
                }

                self.storage_buffers = buffers.clone();
            }
            &Command::PushConstants(push_constants) => self.push_constants = push_constants,
            &Command::Draw {
                vertex_count,
                instance_count: _,
                first_vertex,
                first_instance,
            } => self.draw(
                device,
                DrawSource::Vertices {
                    vertex_count,
                    first_vertex,
                    first_instance,
                },
            )?,
            &Command::DrawIndexed {
                index_count,
                instance_count: _,
                first_index,
                vertex_offset,
                first_instance,
            } => self.draw(
                device,
                DrawSource::Indices {
                    index_count,
                    first_index,
                    vertex_offset,
                    first_instance,
                },
            )?,
            &Command::DrawMeshTasks { group_counts } => self.draw(
                device,
                DrawSource::MeshTasks {
                    group_count: group_counts.iter().product(),
                },
            )?,
            _ => self.dynamic.apply(command),
        }

        Ok(())
    }

    fn draw(
        &mut self,
        device: &mut SoftwareDevice,
        source: DrawSource,
    ) -> Result<(), ExecutionError> {
        let framebuffer_id = self.framebuffer.ok_or(ExecutionError::NotInRenderPass)?;
        let pipeline_id = self.pipeline.ok_or(ExecutionError::NoPipelineBound)?;
        let pipeline = device.pipeline(pipeline_id)?;
        let state = self.dynamic.resolve(pipeline)?;
        let shaders = pipeline.shaders();

        let primitives = match (*shaders.pre_rasterization(), source) {
            (
                PreRasterization::Vertex {
                    layout,
                    tessellation,
                    ..
                },
                source,
            ) => {
                let vertices = self.shade_vertices(device, &state, layout, source)?;
                let topology = state
                    .primitive_topology
                    .unwrap_or(PrimitiveTopology::TriangleList);

                rasterizer::assemble(
                    topology,
                    &vertices,
                    tessellation,
                    state.patch_control_points,
                )
            }
            (
                PreRasterization::OffscreenTriangle,
                DrawSource::Vertices {
                    vertex_count,
                    first_vertex,
                    ..
                },
            ) => {
                let vertices: Vec<_> = (first_vertex..first_vertex + vertex_count)
                    .map(|index| Some(offscreen_position(index)))
                    .collect();

                rasterizer::assemble(PrimitiveTopology::TriangleList, &vertices, false, 0)
            }
            (PreRasterization::Mesh { layout }, DrawSource::MeshTasks { group_count }) => {
                self.shade_mesh(device, layout, group_count)?
            }
            (PreRasterization::MeshNoOutput, DrawSource::MeshTasks { .. }) => Vec::new(),
            (pre_rasterization, source) => {
                warn!(
                    "{:?} cannot be drawn with {:?}, nothing is rendered",
                    pre_rasterization, source,
                );
                Vec::new()
            }
        };

        trace!("draw produced {} primitives", primitives.len());

        if state.rasterizer_discard_enable || primitives.is_empty() {
            return Ok(());
        }

        let viewport_index = if shaders.writes_viewport_index() {
            self.push_constants.viewport_index
        } else {
            0
        };
        let (viewport, scissor) = match usize::try_from(viewport_index)
            .ok()
            .and_then(|index| Some((state.viewports.get(index)?, state.scissors.get(index)?)))
        {
            Some((viewport, scissor)) => (viewport.clone(), *scissor),
            None => {
                warn!(
                    "primitives sent to viewport {}, but only {} viewports and {} scissors are \
                    set, they are discarded",
                    viewport_index,
                    state.viewports.len(),
                    state.scissors.len(),
                );
                return Ok(());
            }
        };

        let color = fragment_color(
            shaders.fragment(),
            &self.push_constants,
            device,
            framebuffer_id,
        )?;
        let target = device
            .framebuffers
            .get_mut(framebuffer_id.index() as usize)
            .ok_or(ExecutionError::UnknownFramebuffer(framebuffer_id))?;
        let extent = target.color.extent();
        let depth_format = target.depth_stencil.format();

        for primitive in &primitives {
            rasterizer::rasterize(
                primitive,
                &viewport,
                &scissor,
                extent,
                &state,
                depth_format,
                |fragment| rasterizer::process_fragment(target, &state, fragment, color),
            );
        }

        Ok(())
    }

    /// Runs the vertex shader of `layout` on every vertex of the draw. Restart indices give
    /// `None`.
    fn shade_vertices(
        &self,
        device: &SoftwareDevice,
        state: &DrawState,
        layout: VertexLayout,
        source: DrawSource,
    ) -> Result<Vec<Option<Position>>, ExecutionError> {
        let vertex_input_state = match &state.vertex_input_state {
            Some(vertex_input_state) => vertex_input_state,
            None => return Ok(Vec::new()),
        };

        let shade = |vertex_index: u32, instance_index: u32| {
            let attributes =
                self.fetch_attributes(device, vertex_input_state, vertex_index, instance_index)?;
            let coords = layout.coords_from_attributes(&attributes);

            Ok::<_, ExecutionError>(Some(
                self.push_constants.transform(coords, Some(vertex_index)),
            ))
        };

        match source {
            DrawSource::Vertices {
                vertex_count,
                first_vertex,
                first_instance,
            } => (first_vertex..first_vertex + vertex_count)
                .map(|vertex_index| shade(vertex_index, first_instance))
                .collect(),
            DrawSource::Indices {
                index_count,
                first_index,
                vertex_offset,
                first_instance,
            } => {
                let (buffer, offset, index_type) =
                    self.index_buffer.ok_or(ExecutionError::IndexBufferNotBound)?;
                let data = device.buffer(buffer)?.data();
                let size = index_type.size() as usize;

                (first_index..first_index + index_count)
                    .map(|i| {
                        let start = offset as usize + i as usize * size;
                        let index = data.get(start..start + size).map_or(0, |bytes| {
                            bytes
                                .iter()
                                .rev()
                                .fold(0u32, |acc, &byte| (acc << 8) | u32::from(byte))
                        });

                        if state.primitive_restart_enable && index == index_type.restart_index() {
                            Ok(None)
                        } else {
                            let vertex_index = (i64::from(index) + i64::from(vertex_offset)) as u32;
                            shade(vertex_index, first_instance)
                        }
                    })
                    .collect()
            }
            DrawSource::MeshTasks { .. } => Ok(Vec::new()),
        }
    }

    /// Reads the vertex attributes of one vertex, indexed by location. Locations without an
    /// attribute read as `(0, 0, 0, 1)`, and reads past the end of a binding return zeroes.
    fn fetch_attributes(
        &self,
        device: &SoftwareDevice,
        vertex_input_state: &VertexInputState,
        vertex_index: u32,
        instance_index: u32,
    ) -> Result<SmallVec<[[f32; 4]; 4]>, ExecutionError> {
        let location_count = vertex_input_state
            .attributes
            .iter()
            .map(|&(location, _)| location as usize + 1)
            .max()
            .unwrap_or(0);
        let mut attributes: SmallVec<[[f32; 4]; 4]> =
            smallvec![[0.0, 0.0, 0.0, 1.0]; location_count];

        for &(location, attribute) in &vertex_input_state.attributes {
            let binding = attribute.binding;
            let description = vertex_input_state
                .binding_description(binding)
                .ok_or(ExecutionError::VertexBufferNotBound { binding })?;
            let bound = self
                .vertex_buffers
                .iter()
                .find_map(|(b, bound)| (*b == binding).then_some(bound))
                .ok_or(ExecutionError::VertexBufferNotBound { binding })?;
            let data = device.buffer(bound.buffer)?.data();

            let element = match description.input_rate {
                VertexInputRate::Vertex => vertex_index,
                VertexInputRate::Instance { divisor: 0 } => 0,
                VertexInputRate::Instance { divisor } => instance_index / divisor,
            };
            let range_end = match bound.size {
                Some(size) => (bound.offset + size) as usize,
                None => data.len(),
            }
            .min(data.len());
            let start = bound.offset as usize
                + element as usize * description.stride as usize
                + attribute.offset as usize;
            let component_count = attribute.format.components() as usize;
            let len = component_count * 4;

            let value = &mut attributes[location as usize];
            *value = [0.0, 0.0, 0.0, 1.0];

            if start + len <= range_end {
                for (component, bytes) in value.iter_mut().zip(data[start..start + len].chunks(4)) {
                    *component = bytemuck::pod_read_unaligned::<f32>(bytes);
                }
            } else {
                value[..component_count].fill(0.0);
            }
        }

        Ok(attributes)
    }

    /// Runs the mesh shader of `layout` for `group_count` work groups. Work group `i` emits
    /// triangle `i` of a triangle strip over the vertices in the storage buffers.
    fn shade_mesh(
        &self,
        device: &SoftwareDevice,
        layout: VertexLayout,
        group_count: u32,
    ) -> Result<Vec<Primitive>, ExecutionError> {
        let mut storage: SmallVec<[&[u8]; 6]> = SmallVec::new();

        for info in &self.storage_buffers {
            let data = device.buffer(info.buffer)?.data();
            let start = (info.offset as usize).min(data.len());
            let end = (info.offset + info.data_size).min(data.len() as DeviceSize) as usize;
            storage.push(&data[start..end.max(start)]);
        }

        (0..group_count)
            .map(|prim| {
                let indices = [prim, prim + 1 + prim % 2, prim + 2 - prim % 2];
                let mut positions = [[0.0; 4]; 3];

                for (position, index) in positions.iter_mut().zip(indices) {
                    let coords = layout
                        .descriptor_coords(index, |slot| storage.get(slot as usize).copied())
                        .map_err(|slot| ExecutionError::StorageBufferNotBound { slot })?;
                    *position = self.push_constants.transform(coords, None);
                }

                Ok(Primitive::Triangle(positions))
            })
            .collect()
    }
}

/// Returns the position the offscreen triangle's vertex shader computes for `vertex_index`.
fn offscreen_position(vertex_index: u32) -> Position {
    const POSITIONS: [[f32; 2]; 3] = [[-1.0, -1.0], [3.0, -1.0], [-1.0, 3.0]];

    let [x, y] = POSITIONS[vertex_index as usize % 3];
    let shift = 10.0 + vertex_index as f32;

    [x + shift, y + shift, 0.0, 1.0]
}

fn fragment_color(
    output: FragmentOutput,
    push_constants: &PushConstants,
    device: &SoftwareDevice,
    framebuffer: FramebufferId,
) -> Result<FragmentColor, ExecutionError> {
    let format = device.framebuffer(framebuffer)?.color.format();

    Ok(match output {
        FragmentOutput::TriangleColor => {
            Some(ClearColorValue::Float(push_constants.triangle_color).to_texel(format))
        }
        FragmentOutput::White => Some(ClearColorValue::Float([1.0; 4]).to_texel(format)),
        FragmentOutput::None => None,
    })
}

#[cfg(test)]
mod tests {
    use super::SoftwareDevice;
    use crate::{
        buffer::{Buffer, BufferUsage, VertexBufferInfo},
        command_buffer::{RecordingCommandBuffer, RenderPassBeginInfo, VertexBufferBinding},
        device::Device,
        format::{Format, FormatFeatures, NumericFormat},
        image::{ClearColorValue, FramebufferCreateInfo},
        pipeline::{
            graphics::{
                depth_stencil::{CompareOp, DepthStencilState},
                input_assembly::{InputAssemblyState, PrimitiveTopology, PrimitiveTopologyClass},
                rasterization::{CullMode, RasterizationState},
                vertex_input::VertexLayout,
                viewport::{Scissor, Viewport, ViewportState},
            },
            shader::{PipelineShaders, PushConstants},
            DynamicState, GraphicsPipelineCreateInfo,
        },
        ExecutionError,
    };
    use smallvec::smallvec;

    const BLUE: [u8; 4] = [0, 0, 255, 255];
    const BLACK: [u8; 4] = [0, 0, 0, 255];

    fn strip_vertices() -> Vec<[f32; 2]> {
        vec![
            [-1.0, -1.0],
            [-1.0, 1.0],
            [0.0, -1.0],
            [0.0, 1.0],
            [1.0, -1.0],
            [1.0, 1.0],
        ]
    }

    fn push_constants(depth: f32) -> PushConstants {
        PushConstants {
            triangle_color: [0.0, 0.0, 1.0, 1.0],
            mesh_depth: depth,
            scale_x: 1.0,
            scale_y: 1.0,
            ..PushConstants::default()
        }
    }

    fn full_viewport_state() -> ViewportState {
        ViewportState {
            viewports: smallvec![Viewport::new([0.0, 0.0], [64.0, 64.0])],
            scissors: smallvec![Scissor::new([0, 0], [64, 64])],
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
            vertex_input_state: Some(VertexLayout::Padded
                    .pipeline_input_state(&VertexLayout::Padded.vertex_data_strides())
                    .unwrap()),
            input_assembly_state: Some(
                InputAssemblyState::new().topology(PrimitiveTopology::TriangleStrip),
            ),
            viewport_state: full_viewport_state(),
            ..GraphicsPipelineCreateInfo::shaders(shaders)
        }
    }

    struct Setup {
        device: SoftwareDevice,
        vertex_buffer: VertexBufferInfo,
        framebuffer: crate::image::FramebufferId,
    }

    fn setup() -> Setup {
        let mut device = SoftwareDevice::new();
        let data = VertexLayout::Padded
            .create_vertex_data(&strip_vertices(), 0, 0)
            .remove(0);
        let data_size = data.len() as u64;
        let buffer = device
            .create_buffer(Buffer::from_data(BufferUsage::VERTEX_BUFFER, data))
            .unwrap();
        let framebuffer = device
            .create_framebuffer(FramebufferCreateInfo {
                extent: [64, 64],
                ..Default::default()
            })
            .unwrap();

        Setup {
            device,
            vertex_buffer: VertexBufferInfo {
                buffer,
                offset: 0,
                data_size,
            },
            framebuffer,
        }
    }

    #[test]
    fn full_screen_strip() {
        let Setup {
            mut device,
            vertex_buffer,
            framebuffer,
        } = setup();
        let pipeline = device
            .create_graphics_pipeline(classic_create_info())
            .unwrap();

        let mut builder = RecordingCommandBuffer::new(&device);
        builder
            .begin_render_pass(RenderPassBeginInfo::framebuffer(framebuffer))
            .unwrap()
            .bind_pipeline_graphics(pipeline)
            .unwrap()
            .bind_vertex_buffers(0, &[VertexBufferBinding::from(vertex_buffer)])
            .unwrap()
            .push_constants(push_constants(0.0))
            .unwrap()
            .draw(6, 1, 0, 0)
            .unwrap()
            .end_render_pass()
            .unwrap();
        device.submit(&builder.end().unwrap()).unwrap();

        let color = device.read_color_attachment(framebuffer).unwrap();
        for (x, y) in [(0, 0), (63, 63), (31, 17), (32, 40)] {
            assert_eq!(color.texel(x, y), BLUE);
        }
    }

    #[test]
    fn fixed_cull_mode_discards() {
        let Setup {
            mut device,
            vertex_buffer,
            framebuffer,
        } = setup();
        let pipeline = device
            .create_graphics_pipeline(GraphicsPipelineCreateInfo {
                rasterization_state: RasterizationState::new().cull_mode(CullMode::Front),
                ..classic_create_info()
            })
            .unwrap();

        let mut builder = RecordingCommandBuffer::new(&device);
        builder
            .begin_render_pass(RenderPassBeginInfo::framebuffer(framebuffer))
            .unwrap()
            .set_cull_mode(CullMode::None)
            .unwrap()
            .bind_pipeline_graphics(pipeline)
            .unwrap()
            .bind_vertex_buffers(0, &[VertexBufferBinding::from(vertex_buffer)])
            .unwrap()
            .push_constants(push_constants(0.0))
            .unwrap()
            .draw(6, 1, 0, 0)
            .unwrap()
            .end_render_pass()
            .unwrap();
        device.submit(&builder.end().unwrap()).unwrap();

        let color = device.read_color_attachment(framebuffer).unwrap();
        assert_eq!(color.texel(10, 10), BLACK);
    }

    #[test]
    fn dynamic_state_must_be_set_after_fixed_bind() {
        let Setup {
            mut device,
            vertex_buffer,
            framebuffer,
        } = setup();
        let fixed = device
            .create_graphics_pipeline(classic_create_info())
            .unwrap();
        let mut create_info = classic_create_info();
        create_info.dynamic_state.insert(DynamicState::CullMode);
        let dynamic = device.create_graphics_pipeline(create_info).unwrap();

        let mut builder = RecordingCommandBuffer::new(&device);
        builder
            .set_cull_mode(CullMode::None)
            .unwrap()
            .begin_render_pass(RenderPassBeginInfo::framebuffer(framebuffer))
            .unwrap()
            .bind_pipeline_graphics(fixed)
            .unwrap()
            .bind_pipeline_graphics(dynamic)
            .unwrap()
            .bind_vertex_buffers(0, &[VertexBufferBinding::from(vertex_buffer)])
            .unwrap()
            .draw(6, 1, 0, 0)
            .unwrap()
            .end_render_pass()
            .unwrap();

        assert_eq!(
            device.submit(&builder.end().unwrap()),
            Err(ExecutionError::DynamicStateNotSet {
                state: DynamicState::CullMode
            }),
        );
    }

    #[test]
    fn depth_test_and_write() {
        let Setup {
            mut device,
            vertex_buffer,
            framebuffer,
        } = setup();
        let pipeline = device
            .create_graphics_pipeline(GraphicsPipelineCreateInfo {
                depth_stencil_state: DepthStencilState::new().depth(true, true, CompareOp::Less),
                ..classic_create_info()
            })
            .unwrap();

        let mut builder = RecordingCommandBuffer::new(&device);
        builder
            .begin_render_pass(RenderPassBeginInfo {
                clear_depth: 0.5,
                ..RenderPassBeginInfo::framebuffer(framebuffer)
            })
            .unwrap()
            .bind_pipeline_graphics(pipeline)
            .unwrap()
            .bind_vertex_buffers(0, &[VertexBufferBinding::from(vertex_buffer)])
            .unwrap()
            .push_constants(push_constants(0.75))
            .unwrap()
            .draw(6, 1, 0, 0)
            .unwrap()
            .push_constants(push_constants(0.25))
            .unwrap()
            .draw(6, 1, 0, 0)
            .unwrap()
            .end_render_pass()
            .unwrap();
        device.submit(&builder.end().unwrap()).unwrap();

        let depth_stencil = device.read_depth_stencil_attachment(framebuffer).unwrap();
        assert!((depth_stencil.depth(5, 5) - 0.25).abs() < 1e-6);
        assert_eq!(
            device.read_color_attachment(framebuffer).unwrap().texel(5, 5),
            BLUE,
        );
    }

    #[test]
    fn draws_need_a_render_pass_and_pipeline() {
        let Setup { mut device, .. } = setup();

        let mut builder = RecordingCommandBuffer::new(&device);
        builder.draw(3, 1, 0, 0).unwrap();
        assert_eq!(
            device.submit(&builder.end().unwrap()),
            Err(ExecutionError::NotInRenderPass),
        );
    }

    #[test]
    fn format_feature_overrides() {
        let device = SoftwareDevice::new()
            .with_format_features(Format::D32_SFLOAT_S8_UINT, FormatFeatures::empty());

        assert!(device
            .format_features(Format::D32_SFLOAT_S8_UINT)
            .is_empty());
        assert!(device
            .format_features(Format::D24_UNORM_S8_UINT)
            .contains(FormatFeatures::DEPTH_STENCIL_ATTACHMENT));
        assert_eq!(
            ClearColorValue::Float([0.0, 0.0, 1.0, 1.0]).to_texel(Format::R8G8B8A8_UNORM),
            BLUE,
        );
    }
}
