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
    pipeline::PipelineId,
    ValidationError,
};

/// # Commands to bind pipelines and execute them
///
/// Draws are only valid inside a render pass. The device checks this, along with the dynamic
/// state the bound pipeline needs, when it executes the command buffer.
impl RecordingCommandBuffer {
    /// Binds a graphics pipeline for future draw calls.
    pub fn bind_pipeline_graphics(&mut self, pipeline: PipelineId) -> Result<&mut Self> {
        Ok(self.bind_pipeline_graphics_unchecked(pipeline))
    }

    pub fn bind_pipeline_graphics_unchecked(&mut self, pipeline: PipelineId) -> &mut Self {
        self.record(Command::BindPipeline(pipeline))
    }

    /// Performs a single draw operation using a non-indexed vertex buffer.
    pub fn draw(
        &mut self,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    ) -> Result<&mut Self> {
        if instance_count == 0 {
            return Err(ValidationError::new("instance_count", "is zero"));
        }

        Ok(self.draw_unchecked(vertex_count, instance_count, first_vertex, first_instance))
    }

    pub fn draw_unchecked(
        &mut self,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    ) -> &mut Self {
        self.record(Command::Draw {
            vertex_count,
            instance_count,
            first_vertex,
            first_instance,
        })
    }

    /// Performs a single draw operation using an indexed vertex buffer.
    pub fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) -> Result<&mut Self> {
        if instance_count == 0 {
            return Err(ValidationError::new("instance_count", "is zero"));
        }

        Ok(self.draw_indexed_unchecked(
            index_count,
            instance_count,
            first_index,
            vertex_offset,
            first_instance,
        ))
    }

    pub fn draw_indexed_unchecked(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) -> &mut Self {
        self.record(Command::DrawIndexed {
            index_count,
            instance_count,
            first_index,
            vertex_offset,
            first_instance,
        })
    }

    /// Performs a single draw operation using a mesh shader.
    pub fn draw_mesh_tasks(&mut self, group_counts: [u32; 3]) -> Result<&mut Self> {
        self.validate_feature("draw_mesh_tasks", "mesh_shader")?;

        Ok(self.draw_mesh_tasks_unchecked(group_counts))
    }

    pub fn draw_mesh_tasks_unchecked(&mut self, group_counts: [u32; 3]) -> &mut Self {
        self.record(Command::DrawMeshTasks { group_counts })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        command_buffer::RecordingCommandBuffer, device::DeviceFeatures, software::SoftwareDevice,
    };

    #[test]
    fn mesh_tasks_need_mesh_shader() {
        let features = DeviceFeatures {
            mesh_shader: false,
            ..DeviceFeatures::all()
        };
        let device = SoftwareDevice::with_features(features);
        let mut builder = RecordingCommandBuffer::new(&device);

        assert!(builder.draw_mesh_tasks([4, 1, 1]).is_err());
        assert!(builder.draw(3, 0, 0, 0).is_err());
        assert!(builder.draw(3, 1, 0, 0).is_ok());
        assert_eq!(builder.commands().len(), 1);
    }
}
