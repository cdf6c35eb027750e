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
    image::{ClearColorValue, FramebufferId},
    ValidationError,
};

/// Parameters to begin a new render pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderPassBeginInfo {
    /// The framebuffer to render to.
    pub framebuffer: FramebufferId,

    /// The value the color attachment is cleared to.
    pub clear_color: ClearColorValue,

    /// The value the depth aspect is cleared to.
    pub clear_depth: f32,

    /// The value the stencil aspect is cleared to. Only the low 8 bits are stored.
    pub clear_stencil: u32,
}

impl RenderPassBeginInfo {
    /// Returns a `RenderPassBeginInfo` with the specified `framebuffer`, clearing the color to
    /// opaque black, the depth to 1.0 and the stencil to 0.
    #[inline]
    pub fn framebuffer(framebuffer: FramebufferId) -> Self {
        RenderPassBeginInfo {
            framebuffer,
            clear_color: ClearColorValue::Float([0.0, 0.0, 0.0, 1.0]),
            clear_depth: 1.0,
            clear_stencil: 0,
        }
    }
}

/// # Commands for render passes
///
/// These commands require a graphics queue.
impl RecordingCommandBuffer {
    /// Begins a render pass, clearing the attachments of the framebuffer.
    pub fn begin_render_pass(&mut self, begin_info: RenderPassBeginInfo) -> Result<&mut Self> {
        if self.render_pass_active {
            return Err(ValidationError::new(
                "begin_render_pass",
                "a render pass is already active",
            ));
        }

        if !(0.0..=1.0).contains(&begin_info.clear_depth) {
            return Err(ValidationError::new(
                "begin_info.clear_depth",
                "is not between 0.0 and 1.0 inclusive",
            ));
        }

        Ok(self.begin_render_pass_unchecked(begin_info))
    }

    pub fn begin_render_pass_unchecked(&mut self, begin_info: RenderPassBeginInfo) -> &mut Self {
        let RenderPassBeginInfo {
            framebuffer,
            clear_color,
            clear_depth,
            clear_stencil,
        } = begin_info;

        self.render_pass_active = true;
        self.record(Command::BeginRenderPass {
            framebuffer,
            clear_color,
            clear_depth,
            clear_stencil,
        })
    }

    /// Ends the render pass previously begun with `begin_render_pass`.
    pub fn end_render_pass(&mut self) -> Result<&mut Self> {
        if !self.render_pass_active {
            return Err(ValidationError::new(
                "end_render_pass",
                "no render pass is active",
            ));
        }

        Ok(self.end_render_pass_unchecked())
    }

    pub fn end_render_pass_unchecked(&mut self) -> &mut Self {
        self.render_pass_active = false;
        self.record(Command::EndRenderPass)
    }
}

#[cfg(test)]
mod tests {
    use super::RenderPassBeginInfo;
    use crate::{
        command_buffer::RecordingCommandBuffer, image::FramebufferId, software::SoftwareDevice,
    };

    #[test]
    fn render_pass_nesting() {
        let device = SoftwareDevice::new();
        let mut builder = RecordingCommandBuffer::new(&device);
        let begin_info = RenderPassBeginInfo::framebuffer(FramebufferId::new(0));

        assert!(builder.end_render_pass().is_err());
        builder.begin_render_pass(begin_info).unwrap();
        assert!(builder.begin_render_pass(begin_info).is_err());

        let mut unfinished = RecordingCommandBuffer::new(&device);
        unfinished.begin_render_pass(begin_info).unwrap();
        assert!(unfinished.end().is_err());

        builder.end_render_pass().unwrap();
        let command_buffer = builder.end().unwrap();
        assert_eq!(command_buffer.commands().len(), 2);
    }

    #[test]
    fn clear_depth_range() {
        let device = SoftwareDevice::new();
        let mut builder = RecordingCommandBuffer::new(&device);

        assert!(builder
            .begin_render_pass(RenderPassBeginInfo {
                clear_depth: 1.5,
                ..RenderPassBeginInfo::framebuffer(FramebufferId::new(0))
            })
            .is_err());
    }
}
