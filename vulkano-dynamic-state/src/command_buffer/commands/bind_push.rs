// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

use crate::{
    buffer::{BufferId, VertexBufferInfo},
    command_buffer::{Command, RecordingCommandBuffer, Result, VertexBufferBinding},
    pipeline::{graphics::input_assembly::IndexType, shader::PushConstants},
    DeviceSize, ValidationError,
};

/// # Commands to bind or push state for pipeline execution commands
///
/// These commands require a queue with a pipeline type that uses the given state.
impl RecordingCommandBuffer {
    /// Binds an index buffer for future indexed draw calls.
    pub fn bind_index_buffer(
        &mut self,
        buffer: BufferId,
        offset: DeviceSize,
        index_type: IndexType,
    ) -> Result<&mut Self> {
        if offset % index_type.size() != 0 {
            return Err(ValidationError::new(
                "offset",
                "is not a multiple of the size of `index_type`",
            ));
        }

        Ok(self.bind_index_buffer_unchecked(buffer, offset, index_type))
    }

    pub fn bind_index_buffer_unchecked(
        &mut self,
        buffer: BufferId,
        offset: DeviceSize,
        index_type: IndexType,
    ) -> &mut Self {
        self.record(Command::BindIndexBuffer {
            buffer,
            offset,
            index_type,
        })
    }

    /// Binds storage buffers for future mesh shading draw calls. `buffers[i]` is bound to slot
    /// `i`, and only its `data_size` bytes starting at `offset` are visible to the shader.
    pub fn bind_storage_buffers(&mut self, buffers: &[VertexBufferInfo]) -> Result<&mut Self> {
        self.validate_feature("bind_storage_buffers", "mesh_shader")?;

        if buffers.is_empty() {
            return Err(ValidationError::new("buffers", "is empty"));
        }

        Ok(self.bind_storage_buffers_unchecked(buffers))
    }

    pub fn bind_storage_buffers_unchecked(&mut self, buffers: &[VertexBufferInfo]) -> &mut Self {
        self.record(Command::BindStorageBuffers(buffers.iter().copied().collect()))
    }

    /// Binds vertex buffers for future draw calls, starting at binding `first_binding`.
    pub fn bind_vertex_buffers(
        &mut self,
        first_binding: u32,
        buffers: &[VertexBufferBinding],
    ) -> Result<&mut Self> {
        if buffers.is_empty() {
            return Err(ValidationError::new("buffers", "is empty"));
        }

        Ok(self.bind_vertex_buffers_unchecked(first_binding, buffers))
    }

    pub fn bind_vertex_buffers_unchecked(
        &mut self,
        first_binding: u32,
        buffers: &[VertexBufferBinding],
    ) -> &mut Self {
        self.record(Command::BindVertexBuffers {
            first_binding,
            buffers: buffers.iter().copied().collect(),
            strides: None,
        })
    }

    /// Binds vertex buffers for future draw calls, and sets the stride of each binding
    /// dynamically.
    ///
    /// `strides` must have one element per buffer.
    pub fn bind_vertex_buffers_with_strides(
        &mut self,
        first_binding: u32,
        buffers: &[VertexBufferBinding],
        strides: &[DeviceSize],
    ) -> Result<&mut Self> {
        self.validate_feature("bind_vertex_buffers_with_strides", "extended_dynamic_state")?;

        if buffers.is_empty() {
            return Err(ValidationError::new("buffers", "is empty"));
        }

        if strides.len() != buffers.len() {
            return Err(ValidationError::new(
                "strides",
                format!(
                    "has {} elements, but `buffers` has {}",
                    strides.len(),
                    buffers.len(),
                ),
            ));
        }

        Ok(self.bind_vertex_buffers_with_strides_unchecked(first_binding, buffers, strides))
    }

    pub fn bind_vertex_buffers_with_strides_unchecked(
        &mut self,
        first_binding: u32,
        buffers: &[VertexBufferBinding],
        strides: &[DeviceSize],
    ) -> &mut Self {
        self.record(Command::BindVertexBuffers {
            first_binding,
            buffers: buffers.iter().copied().collect(),
            strides: Some(strides.iter().copied().collect()),
        })
    }

    /// Sets push constants for future dispatch or draw calls.
    pub fn push_constants(&mut self, push_constants: PushConstants) -> Result<&mut Self> {
        Ok(self.push_constants_unchecked(push_constants))
    }

    pub fn push_constants_unchecked(&mut self, push_constants: PushConstants) -> &mut Self {
        self.record(Command::PushConstants(push_constants))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        buffer::BufferId,
        command_buffer::{Command, RecordingCommandBuffer, VertexBufferBinding},
        pipeline::{graphics::input_assembly::IndexType, DynamicState},
        software::SoftwareDevice,
    };

    #[test]
    fn strides_must_match_buffers() {
        let device = SoftwareDevice::new();
        let mut builder = RecordingCommandBuffer::new(&device);
        let binding = VertexBufferBinding {
            buffer: BufferId::new(0),
            offset: 0,
            size: None,
        };

        assert!(builder
            .bind_vertex_buffers_with_strides(0, &[binding, binding], &[16])
            .is_err());
        assert!(builder
            .bind_vertex_buffers_with_strides(0, &[binding], &[16])
            .is_ok());
        assert!(builder.bind_vertex_buffers(0, &[binding]).is_ok());

        let states: Vec<_> = builder
            .commands()
            .iter()
            .map(Command::dynamic_state)
            .collect();
        assert_eq!(states, [Some(DynamicState::VertexInputBindingStride), None]);
    }

    #[test]
    fn index_buffer_alignment() {
        let device = SoftwareDevice::new();
        let mut builder = RecordingCommandBuffer::new(&device);

        assert!(builder
            .bind_index_buffer(BufferId::new(0), 3, IndexType::U8)
            .is_ok());
        assert!(builder
            .bind_index_buffer(BufferId::new(0), 3, IndexType::U32)
            .is_err());
    }
}
