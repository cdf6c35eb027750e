// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Recording commands to execute on a device.
//!
//! Commands are recorded into a [`RecordingCommandBuffer`], which checks each one against the
//! features and limits of the device it was created for. Once recording is done,
//! [`end`](RecordingCommandBuffer::end) turns it into a [`CommandBuffer`]: a plain list of
//! [`Command`]s that a [`Device`] executes in order.
//!
//! Recording only checks what is knowable from the command itself. Whether a dynamic state was
//! set before a draw that needs it depends on which pipeline is bound at that point, and is
//! checked by the device when executing.

pub use self::commands::render_pass::RenderPassBeginInfo;
use crate::{
    buffer::{BufferId, VertexBufferInfo},
    device::{Device, DeviceFeatures, DeviceProperties},
    image::{ClearColorValue, FramebufferId},
    pipeline::{
        graphics::{
            color_blend::LogicOp,
            depth_stencil::{CompareOp, StencilFaces, StencilOps},
            input_assembly::{IndexType, PrimitiveTopology},
            rasterization::{CullMode, DepthBiasState, FrontFace},
            vertex_input::VertexInputState,
            viewport::{Scissor, Viewport},
        },
        shader::PushConstants,
        DynamicState, PipelineId,
    },
    DeviceSize, ValidationError,
};
use smallvec::SmallVec;

mod commands;

/// A command recorded into a command buffer.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Begins a render pass on a framebuffer, clearing its attachments.
    BeginRenderPass {
        framebuffer: FramebufferId,
        clear_color: ClearColorValue,
        clear_depth: f32,
        clear_stencil: u32,
    },

    /// Ends the current render pass.
    EndRenderPass,

    /// Binds a graphics pipeline.
    BindPipeline(PipelineId),

    SetCullMode(CullMode),
    SetFrontFace(FrontFace),
    SetPrimitiveTopology(PrimitiveTopology),
    SetViewportWithCount(SmallVec<[Viewport; 2]>),
    SetScissorWithCount(SmallVec<[Scissor; 2]>),
    SetDepthTestEnable(bool),
    SetDepthWriteEnable(bool),
    SetDepthCompareOp(CompareOp),
    SetDepthBoundsTestEnable(bool),
    SetStencilTestEnable(bool),
    SetStencilOp {
        faces: StencilFaces,
        ops: StencilOps,
    },
    SetDepthBiasEnable(bool),
    SetDepthBias(DepthBiasState),
    SetRasterizerDiscardEnable(bool),
    SetPrimitiveRestartEnable(bool),
    SetLogicOp(LogicOp),
    SetPatchControlPoints(u32),
    SetVertexInput(VertexInputState),

    /// Binds vertex buffers to consecutive bindings, starting at `first_binding`.
    ///
    /// If `strides` is `Some`, it holds one stride per buffer, which replaces the stride of the
    /// corresponding binding.
    BindVertexBuffers {
        first_binding: u32,
        buffers: SmallVec<[VertexBufferBinding; 6]>,
        strides: Option<SmallVec<[DeviceSize; 6]>>,
    },

    /// Binds an index buffer.
    BindIndexBuffer {
        buffer: BufferId,
        offset: DeviceSize,
        index_type: IndexType,
    },

    /// Binds storage buffers for mesh shaders. Element `i` is bound to slot `i`.
    BindStorageBuffers(SmallVec<[VertexBufferInfo; 6]>),

    /// Updates the push constants.
    PushConstants(PushConstants),

    Draw {
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    },

    DrawIndexed {
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    },

    DrawMeshTasks {
        group_counts: [u32; 3],
    },
}

impl Command {
    /// Returns the dynamic state that the command sets, if any.
    pub fn dynamic_state(&self) -> Option<DynamicState> {
        Some(match self {
            Command::SetCullMode(_) => DynamicState::CullMode,
            Command::SetFrontFace(_) => DynamicState::FrontFace,
            Command::SetPrimitiveTopology(_) => DynamicState::PrimitiveTopology,
            Command::SetViewportWithCount(_) => DynamicState::ViewportWithCount,
            Command::SetScissorWithCount(_) => DynamicState::ScissorWithCount,
            Command::SetDepthTestEnable(_) => DynamicState::DepthTestEnable,
            Command::SetDepthWriteEnable(_) => DynamicState::DepthWriteEnable,
            Command::SetDepthCompareOp(_) => DynamicState::DepthCompareOp,
            Command::SetDepthBoundsTestEnable(_) => DynamicState::DepthBoundsTestEnable,
            Command::SetStencilTestEnable(_) => DynamicState::StencilTestEnable,
            Command::SetStencilOp { .. } => DynamicState::StencilOp,
            Command::SetDepthBiasEnable(_) => DynamicState::DepthBiasEnable,
            Command::SetDepthBias(_) => DynamicState::DepthBias,
            Command::SetRasterizerDiscardEnable(_) => DynamicState::RasterizerDiscardEnable,
            Command::SetPrimitiveRestartEnable(_) => DynamicState::PrimitiveRestartEnable,
            Command::SetLogicOp(_) => DynamicState::LogicOp,
            Command::SetPatchControlPoints(_) => DynamicState::PatchControlPoints,
            Command::SetVertexInput(_) => DynamicState::VertexInput,
            Command::BindVertexBuffers {
                strides: Some(_), ..
            } => DynamicState::VertexInputBindingStride,
            _ => return None,
        })
    }

    /// Returns whether the command is a draw.
    #[inline]
    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            Command::Draw { .. } | Command::DrawIndexed { .. } | Command::DrawMeshTasks { .. }
        )
    }
}

/// A vertex buffer bound to one binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexBufferBinding {
    pub buffer: BufferId,

    /// The offset in bytes where the binding starts reading.
    pub offset: DeviceSize,

    /// The number of bytes the binding can read, starting at `offset`. `None` means up to the
    /// end of the buffer.
    pub size: Option<DeviceSize>,
}

impl From<VertexBufferInfo> for VertexBufferBinding {
    #[inline]
    fn from(info: VertexBufferInfo) -> Self {
        VertexBufferBinding {
            buffer: info.buffer,
            offset: info.offset,
            size: Some(info.data_size),
        }
    }
}

/// A command buffer in the recording state.
///
/// Every recording method validates its parameters, records the command on success and returns
/// `self` for chaining. The `_unchecked` variants skip validation.
#[derive(Debug)]
pub struct RecordingCommandBuffer {
    features: DeviceFeatures,
    properties: DeviceProperties,
    commands: Vec<Command>,
    render_pass_active: bool,
}

impl RecordingCommandBuffer {
    /// Starts recording a command buffer for `device`.
    pub fn new(device: &(impl Device + ?Sized)) -> Self {
        RecordingCommandBuffer {
            features: *device.enabled_features(),
            properties: *device.properties(),
            commands: Vec::new(),
            render_pass_active: false,
        }
    }

    /// Returns the features of the device the command buffer is recorded for.
    #[inline]
    pub fn enabled_features(&self) -> &DeviceFeatures {
        &self.features
    }

    /// Returns the limits of the device the command buffer is recorded for.
    #[inline]
    pub fn properties(&self) -> &DeviceProperties {
        &self.properties
    }

    /// Returns the commands recorded so far.
    #[inline]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Ends recording.
    ///
    /// Fails if a render pass is still active.
    pub fn end(self) -> Result<CommandBuffer> {
        if self.render_pass_active {
            return Err(ValidationError::new("end", "a render pass is still active"));
        }

        Ok(CommandBuffer {
            commands: self.commands,
        })
    }

    fn record(&mut self, command: Command) -> &mut Self {
        self.commands.push(command);

        self
    }

    fn validate_feature(&self, command: &'static str, feature: &'static str) -> Result {
        if !self.features.is_enabled(feature) {
            return Err(ValidationError::new(
                command,
                format!("the `{}` feature is not enabled on the device", feature),
            ));
        }

        Ok(())
    }
}

/// A command buffer whose recording has ended, ready to be submitted.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommandBuffer {
    commands: Vec<Command>,
}

impl CommandBuffer {
    /// Returns the commands in recording order.
    #[inline]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Returns the number of draws in the command buffer.
    pub fn draw_count(&self) -> usize {
        self.commands.iter().filter(|command| command.is_draw()).count()
    }
}

type Result<T = (), E = Box<ValidationError>> = ::std::result::Result<T, E>;
