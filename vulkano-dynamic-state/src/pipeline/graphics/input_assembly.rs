// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Configures how input vertices are assembled into primitives.

use crate::{device::DeviceFeatures, macros::vulkan_enum, DeviceSize, ValidationError};

/// The state in a graphics pipeline describing how the input assembly stage should behave.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputAssemblyState {
    /// The type of primitives.
    ///
    /// If [`DynamicState::PrimitiveTopology`] is set, only the class of this topology matters,
    /// and the dynamic topology must belong to the same class.
    ///
    /// [`DynamicState::PrimitiveTopology`]: crate::pipeline::DynamicState::PrimitiveTopology
    pub topology: PrimitiveTopology,

    /// If true, then when drawing with an index buffer, the special index value consisting of the
    /// maximum unsigned value (`0xff`, `0xffff` or `0xffffffff`) will tell the device that it is
    /// the end of the current primitive. A new primitive will restart at the next index.
    pub primitive_restart_enable: bool,
}

impl InputAssemblyState {
    /// Creates an `InputAssemblyState` with the `TriangleList` topology and primitive restart
    /// disabled.
    #[inline]
    pub const fn new() -> Self {
        Self {
            topology: PrimitiveTopology::TriangleList,
            primitive_restart_enable: false,
        }
    }

    /// Sets the primitive topology.
    #[inline]
    pub const fn topology(mut self, topology: PrimitiveTopology) -> Self {
        self.topology = topology;
        self
    }

    /// Sets whether primitive restart is enabled.
    #[inline]
    pub const fn primitive_restart_enable(mut self, enable: bool) -> Self {
        self.primitive_restart_enable = enable;
        self
    }

    pub(crate) fn validate(&self, features: &DeviceFeatures) -> Result<(), Box<ValidationError>> {
        let &Self {
            topology,
            primitive_restart_enable: _,
        } = self;

        match topology {
            PrimitiveTopology::LineListWithAdjacency
            | PrimitiveTopology::LineStripWithAdjacency
            | PrimitiveTopology::TriangleListWithAdjacency
            | PrimitiveTopology::TriangleStripWithAdjacency => {
                if !features.geometry_shader {
                    return Err(ValidationError::new(
                        "topology",
                        "is `PrimitiveTopology::*WithAdjacency`, but the `geometry_shader` \
                        feature is not enabled",
                    ));
                }
            }
            PrimitiveTopology::PatchList => {
                if !features.tessellation_shader {
                    return Err(ValidationError::new(
                        "topology",
                        "is `PrimitiveTopology::PatchList`, but the `tessellation_shader` \
                        feature is not enabled",
                    ));
                }
            }
            _ => (),
        }

        Ok(())
    }
}

impl Default for InputAssemblyState {
    /// Returns [`InputAssemblyState::new()`].
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

vulkan_enum! {
    /// Describes how vertices must be grouped together to form primitives.
    PrimitiveTopology impl {
        /// Returns the topology class of this topology.
        #[inline]
        pub fn class(self) -> PrimitiveTopologyClass {
            match self {
                Self::PointList => PrimitiveTopologyClass::Point,
                Self::LineList
                | Self::LineStrip
                | Self::LineListWithAdjacency
                | Self::LineStripWithAdjacency => PrimitiveTopologyClass::Line,
                Self::TriangleList
                | Self::TriangleStrip
                | Self::TriangleFan
                | Self::TriangleListWithAdjacency
                | Self::TriangleStripWithAdjacency => PrimitiveTopologyClass::Triangle,
                Self::PatchList => PrimitiveTopologyClass::Patch,
            }
        }
    }
    = PrimitiveTopology(i32);

    /// A series of separate point primitives.
    PointList = POINT_LIST,

    /// A series of separate line primitives.
    LineList = LINE_LIST,

    /// A series of consecutive line primitives, with consecutive lines sharing a vertex.
    LineStrip = LINE_STRIP,

    /// A series of separate triangle primitives.
    TriangleList = TRIANGLE_LIST,

    /// A series of consecutive triangle primitives, with consecutive triangles sharing an edge
    /// (two vertices).
    TriangleStrip = TRIANGLE_STRIP,

    /// A series of consecutive triangle primitives, with all triangles sharing a common vertex
    /// (the first).
    TriangleFan = TRIANGLE_FAN,

    /// As `LineList`, but with adjacency, used in combination with geometry shaders.
    LineListWithAdjacency = LINE_LIST_WITH_ADJACENCY,

    /// As `LineStrip`, but with adjacency, used in combination with geometry shaders.
    LineStripWithAdjacency = LINE_STRIP_WITH_ADJACENCY,

    /// As `TriangleList`, but with adjacency, used in combination with geometry shaders.
    TriangleListWithAdjacency = TRIANGLE_LIST_WITH_ADJACENCY,

    /// As `TriangleStrip`, but with adjacency, used in combination with geometry shaders.
    TriangleStripWithAdjacency = TRIANGLE_STRIP_WITH_ADJACENCY,

    /// Separate patch primitives, used in combination with tessellation shaders.
    PatchList = PATCH_LIST,
}

impl Default for PrimitiveTopology {
    #[inline]
    fn default() -> Self {
        PrimitiveTopology::TriangleList
    }
}

/// Describes the shape of a primitive topology.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveTopologyClass {
    Point,
    Line,
    Triangle,
    Patch,
}

impl PrimitiveTopologyClass {
    /// Returns the name of the class as used in test case names.
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Point => "point",
            Self::Line => "line",
            Self::Triangle => "triangle",
            Self::Patch => "patch",
        }
    }

    /// Returns a representative example of this topology class.
    #[inline]
    pub const fn example(self) -> PrimitiveTopology {
        match self {
            Self::Point => PrimitiveTopology::PointList,
            Self::Line => PrimitiveTopology::LineList,
            Self::Triangle => PrimitiveTopology::TriangleList,
            Self::Patch => PrimitiveTopology::PatchList,
        }
    }
}

vulkan_enum! {
    /// The type of index values in an index buffer.
    IndexType impl {
        /// Returns the size in bytes of indices of this type.
        #[inline]
        pub const fn size(self) -> DeviceSize {
            match self {
                IndexType::U8 => 1,
                IndexType::U16 => 2,
                IndexType::U32 => 4,
            }
        }

        /// Returns the index value that restarts a primitive when primitive restart is enabled.
        #[inline]
        pub const fn restart_index(self) -> u32 {
            match self {
                IndexType::U8 => 0xff,
                IndexType::U16 => 0xffff,
                IndexType::U32 => 0xffff_ffff,
            }
        }
    }
    = IndexType(i32);

    /// Indices are 8-bit unsigned integers.
    U8 = UINT8_EXT,

    /// Indices are 16-bit unsigned integers.
    U16 = UINT16,

    /// Indices are 32-bit unsigned integers.
    U32 = UINT32,
}

#[cfg(test)]
mod tests {
    use super::{IndexType, InputAssemblyState, PrimitiveTopology, PrimitiveTopologyClass};
    use crate::device::DeviceFeatures;

    #[test]
    fn topology_classes() {
        assert_eq!(
            PrimitiveTopology::LineStrip.class(),
            PrimitiveTopologyClass::Line,
        );
        assert_eq!(
            PrimitiveTopology::TriangleFan.class(),
            PrimitiveTopologyClass::Triangle,
        );
        assert_eq!(
            PrimitiveTopology::PatchList.class(),
            PrimitiveTopologyClass::Patch,
        );

        for class in [
            PrimitiveTopologyClass::Point,
            PrimitiveTopologyClass::Line,
            PrimitiveTopologyClass::Triangle,
            PrimitiveTopologyClass::Patch,
        ] {
            assert_eq!(class.example().class(), class);
        }
    }

    #[test]
    fn patch_list_requires_tessellation() {
        let state = InputAssemblyState::new().topology(PrimitiveTopology::PatchList);
        assert!(state.validate(&DeviceFeatures::empty()).is_err());

        let features = DeviceFeatures {
            tessellation_shader: true,
            ..DeviceFeatures::empty()
        };
        assert!(state.validate(&features).is_ok());
        assert!(InputAssemblyState::default()
            .validate(&DeviceFeatures::empty())
            .is_ok());
    }

    #[test]
    fn index_types() {
        assert_eq!(IndexType::U8.size(), 1);
        assert_eq!(IndexType::U8.restart_index(), 0xff);
        assert_eq!(
            ash::vk::IndexType::from(IndexType::U32),
            ash::vk::IndexType::UINT32,
        );
    }
}
