// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Configures how data from vertex buffers is read into vertex shader input locations.
//!
//! The vertex input stage is the stage where data is read from a buffer and fed into the vertex
//! shader. An input binding is a vertex buffer slot, with a stride and an input rate. An input
//! attribute maps a shader input location to a format and an offset within the elements of one
//! binding. Formats with fewer than four components get default values for the missing ones:
//! the first three components default to 0, while the fourth defaults to 1.
//!
//! The same state can either be baked into a pipeline or, when [`DynamicState::VertexInput`] is
//! dynamic, set from the command buffer with [`set_vertex_input`]. The order of the bindings and
//! attributes is kept as given, which is the order the commands pass them to the device in.
//!
//! [`DynamicState::VertexInput`]: crate::pipeline::DynamicState::VertexInput
//! [`set_vertex_input`]: crate::command_buffer::RecordingCommandBuffer::set_vertex_input

pub use self::layout::VertexLayout;
use crate::{format::Format, ValidationError};
use smallvec::SmallVec;

mod layout;

/// The state in a graphics pipeline describing how the vertex input stage should behave.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VertexInputState {
    /// A description of the vertex buffers that the vertex input stage will read from, keyed by
    /// binding number.
    pub bindings: SmallVec<[(u32, VertexInputBindingDescription); 6]>,

    /// Describes, for each shader input location, the mapping between elements in a vertex buffer
    /// and the components of that location in the shader.
    pub attributes: SmallVec<[(u32, VertexInputAttributeDescription); 4]>,
}

impl VertexInputState {
    /// Constructs a new `VertexInputState` with no bindings or attributes.
    #[inline]
    pub fn new() -> VertexInputState {
        VertexInputState::default()
    }

    /// Adds a single binding, replacing any previous description of the same binding.
    pub fn binding(mut self, binding: u32, description: VertexInputBindingDescription) -> Self {
        match self.bindings.iter_mut().find(|(b, _)| *b == binding) {
            Some((_, existing)) => *existing = description,
            None => self.bindings.push((binding, description)),
        }

        self
    }

    /// Adds a single attribute, replacing any previous description of the same location.
    pub fn attribute(
        mut self,
        location: u32,
        description: VertexInputAttributeDescription,
    ) -> Self {
        match self.attributes.iter_mut().find(|(l, _)| *l == location) {
            Some((_, existing)) => *existing = description,
            None => self.attributes.push((location, description)),
        }

        self
    }

    /// Returns the description of `binding`, if there is one.
    #[inline]
    pub fn binding_description(&self, binding: u32) -> Option<&VertexInputBindingDescription> {
        self.bindings
            .iter()
            .find_map(|(b, description)| (*b == binding).then_some(description))
    }

    /// Returns the description of the attribute at `location`, if there is one.
    #[inline]
    pub fn attribute_description(&self, location: u32) -> Option<&VertexInputAttributeDescription> {
        self.attributes
            .iter()
            .find_map(|(l, description)| (*l == location).then_some(description))
    }

    pub(crate) fn validate(&self) -> Result<(), Box<ValidationError>> {
        let Self {
            bindings,
            attributes,
        } = self;

        for (index, (location, description)) in attributes.iter().enumerate() {
            if attributes[..index].iter().any(|(l, _)| l == location) {
                return Err(ValidationError::new(
                    format!("attributes[{}]", index),
                    "the location is described more than once",
                ));
            }

            if !bindings.iter().any(|(b, _)| *b == description.binding) {
                return Err(ValidationError::new(
                    format!("attributes[{}].binding", index),
                    "does not refer to a binding in `bindings`",
                ));
            }

            if !matches!(
                description.format,
                Format::R32G32_SFLOAT | Format::R32G32B32A32_SFLOAT
            ) {
                return Err(ValidationError::new(
                    format!("attributes[{}].format", index),
                    "is not a vertex attribute format",
                ));
            }
        }

        Ok(())
    }
}

/// Describes a single vertex buffer binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexInputBindingDescription {
    /// The number of bytes from the start of one element in the vertex buffer to the start of the
    /// next element. This can be simply the size of the data in each element, but larger strides
    /// are possible.
    pub stride: u32,

    /// How often the vertex input should advance to the next element.
    pub input_rate: VertexInputRate,
}

/// Describes a single vertex buffer attribute mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexInputAttributeDescription {
    /// The vertex buffer binding number that this attribute should take its data from.
    pub binding: u32,

    /// The size and type of the vertex data.
    pub format: Format,

    /// Number of bytes between the start of a vertex buffer element and the location of attribute.
    pub offset: u32,
}

/// How the vertex source should be unrolled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VertexInputRate {
    /// Each element of the source corresponds to a vertex.
    Vertex,

    /// Each element of the source corresponds to an instance.
    ///
    /// `divisor` indicates how many consecutive instances will use the same instance buffer data.
    Instance { divisor: u32 },
}

impl From<VertexInputRate> for ash::vk::VertexInputRate {
    #[inline]
    fn from(val: VertexInputRate) -> Self {
        match val {
            VertexInputRate::Vertex => ash::vk::VertexInputRate::VERTEX,
            VertexInputRate::Instance { .. } => ash::vk::VertexInputRate::INSTANCE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        VertexInputAttributeDescription, VertexInputBindingDescription, VertexInputRate,
        VertexInputState,
    };
    use crate::format::Format;

    fn binding(stride: u32) -> VertexInputBindingDescription {
        VertexInputBindingDescription {
            stride,
            input_rate: VertexInputRate::Vertex,
        }
    }

    #[test]
    fn builder_replaces_and_keeps_order() {
        let state = VertexInputState::new()
            .binding(3, binding(8))
            .binding(1, binding(16))
            .binding(3, binding(24));

        assert_eq!(state.bindings.len(), 2);
        assert_eq!(state.bindings[0], (3, binding(24)));
        assert_eq!(state.binding_description(1), Some(&binding(16)));
        assert_eq!(state.binding_description(0), None);
    }

    #[test]
    fn attributes_must_refer_to_bindings() {
        let attribute = VertexInputAttributeDescription {
            binding: 2,
            format: Format::R32G32_SFLOAT,
            offset: 0,
        };

        let state = VertexInputState::new()
            .binding(0, binding(16))
            .attribute(0, attribute);
        assert!(state.validate().is_err());

        let state = state.binding(2, binding(8));
        assert!(state.validate().is_ok());
        assert_eq!(state.attribute_description(0), Some(&attribute));

        let state = state.attribute(
            1,
            VertexInputAttributeDescription {
                format: Format::R8G8B8A8_UNORM,
                ..attribute
            },
        );
        assert!(state.validate().is_err());
    }
}
