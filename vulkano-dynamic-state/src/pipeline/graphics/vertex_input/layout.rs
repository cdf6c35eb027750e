// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! The memory layouts that vertex data can be stored with.
//!
//! Every layout stores the same thing, a list of 2D coordinates, but spreads it differently over
//! vertex buffers: with padding after each coordinate, with an extra constant attribute far from
//! the coordinate, or over six bindings of which only three carry meaningful data. A layout
//! knows how to produce the buffer contents, the vertex input state that reads them back, and
//! the shader statements that rebuild the coordinate from the inputs.

use super::{
    VertexInputAttributeDescription, VertexInputBindingDescription, VertexInputRate,
    VertexInputState,
};
use crate::{buffer::padded_vertex_data, format::Format, DeviceSize, ValidationError};
use bytemuck::{Pod, Zeroable};
use smallvec::SmallVec;
use std::mem::{offset_of, size_of};

/// A vertex memory layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VertexLayout {
    /// One binding. Each vertex is its coordinate followed by 8 bytes of padding.
    Padded,

    /// One binding. Each vertex is its coordinate, 80 bytes of padding and a constant `(1, 1)`
    /// attribute that the coordinate is multiplied by.
    ExtraAttributes,

    /// Six bindings, some read per instance, of which 1, 3 and 5 hold the data that the
    /// coordinate is rebuilt from.
    MultipleBindings,
}

#[derive(Clone, Copy, Zeroable, Pod)]
#[repr(C)]
struct PaddedVertex {
    coords: [f32; 2],
    padding: [f32; 2],
}

#[derive(Clone, Copy, Zeroable, Pod)]
#[repr(C)]
struct ExtraAttributesVertex {
    coords: [f32; 2],
    padding: [[f32; 2]; 10],
    ones: [f32; 2],
}

#[derive(Clone, Copy, Zeroable, Pod)]
#[repr(C)]
struct Zeros {
    zeros: [f32; 2],
}

#[derive(Clone, Copy, Zeroable, Pod)]
#[repr(C)]
struct PaddingOnes {
    padding: [[f32; 2]; 4],
    ones: [f32; 2],
}

#[derive(Clone, Copy, Zeroable, Pod)]
#[repr(C)]
struct CoordsData {
    padding0: [f32; 2],
    coords: [f32; 2],
    padding1: [f32; 2],
}

#[derive(Clone, Copy, Zeroable, Pod)]
#[repr(C)]
struct OneZeroPadding {
    one_zero: [f32; 4],
    padding: [[f32; 2]; 3],
}

const MESH_INDEX_CALC: [&str; 3] = [
    "uint prim = uint(gl_WorkGroupID.x);",
    "uint indices[3] = uint[](prim, (prim + (1 + prim % 2)), (prim + (2 - prim % 2)));",
    "uint invIndex = indices[gl_LocalInvocationIndex];",
];

impl VertexLayout {
    /// All the layouts.
    pub const ALL: [VertexLayout; 3] = [
        VertexLayout::Padded,
        VertexLayout::ExtraAttributes,
        VertexLayout::MultipleBindings,
    ];

    /// Returns a short name for the layout, used in logs.
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            VertexLayout::Padded => "padded",
            VertexLayout::ExtraAttributes => "extra_attributes",
            VertexLayout::MultipleBindings => "multiple_bindings",
        }
    }

    /// Returns the GLSL declarations of the vertex shader inputs, one per line.
    pub fn attribute_declarations(self) -> &'static [&'static str] {
        match self {
            VertexLayout::Padded => &["layout(location=0) in vec2 position;"],
            VertexLayout::ExtraAttributes => &[
                "layout(location=0) in vec2 position;",
                "layout(location=1) in vec2 ones;",
            ],
            VertexLayout::MultipleBindings => &[
                "layout(location=0) in vec2 ones;",
                "layout(location=1) in vec2 position;",
                "layout(location=2) in vec4 oneZero;",
            ],
        }
    }

    /// Returns the GLSL statements that compute a `vec2 vertexCoords` from the vertex shader
    /// inputs.
    pub fn vertex_coord_calc(self) -> &'static [&'static str] {
        match self {
            VertexLayout::Padded => &["vec2 vertexCoords = position;"],
            VertexLayout::ExtraAttributes => &[
                "vec2 vertexCoords = position;",
                "vertexCoords = vertexCoords * ones;",
            ],
            VertexLayout::MultipleBindings => &[
                "vec2 vertexCoords = position;",
                "vertexCoords = ((vertexCoords * ones) + oneZero.zw) * oneZero.xy;",
            ],
        }
    }

    /// Returns the GLSL declarations of the storage buffers that a mesh shader reads the vertex
    /// data from. The buffer of vertex binding `i` is at descriptor binding `i` of set 0.
    pub fn descriptor_declarations(self) -> &'static [&'static str] {
        match self {
            VertexLayout::Padded => &[
                "struct VertexData {",
                "    vec2 position;",
                "    vec2 padding;",
                "};",
                "layout(set=0, binding=0, std430) readonly buffer S0B0Block {",
                "    VertexData data[];",
                "} s0b0buffer;",
            ],
            VertexLayout::ExtraAttributes => &[
                "struct VertexData {",
                "    vec2 coords;",
                "    vec2 padding[10];",
                "    vec2 ones;",
                "};",
                "layout(set=0, binding=0, std430) readonly buffer S0B0Block {",
                "    VertexData data[];",
                "} s0b0buffer;",
            ],
            VertexLayout::MultipleBindings => &[
                "struct PaddingOnes {",
                "    vec2 padding[4];",
                "    vec2 ones;",
                "};",
                "struct CoordsData {",
                "    vec2 padding0;",
                "    vec2 coords;",
                "    vec2 padding1;",
                "};",
                // The vec4 is split in two so that the std430 layout matches the vertex records.
                "struct OneZeroPadding {",
                "    vec2 ones;",
                "    vec2 zeros;",
                "    vec2 padding[3];",
                "};",
                "layout(set=0, binding=1, std430) readonly buffer S0B1Block {",
                "    PaddingOnes data[];",
                "} s0b1buffer;",
                "layout(set=0, binding=3, std430) readonly buffer S0B3Block {",
                "    CoordsData data[];",
                "} s0b3buffer;",
                "layout(set=0, binding=5, std430) readonly buffer S0B5Block {",
                "    OneZeroPadding data[];",
                "} s0b5buffer;",
            ],
        }
    }

    /// Returns the GLSL statements that compute a `vec2 vertexCoords` from the storage buffers,
    /// for the vertex of the current mesh shader invocation.
    pub fn descriptor_coord_calc(self) -> SmallVec<[&'static str; 8]> {
        let mut statements: SmallVec<[&'static str; 8]> = MESH_INDEX_CALC.into_iter().collect();

        match self {
            VertexLayout::Padded => {
                statements.push("vec2 vertexCoords = s0b0buffer.data[invIndex].position;");
            }
            VertexLayout::ExtraAttributes => statements.extend([
                "vec2 auxPos = s0b0buffer.data[invIndex].coords;",
                "vec2 auxOnes = s0b0buffer.data[invIndex].ones;",
                "vec2 vertexCoords = auxPos * auxOnes;",
            ]),
            VertexLayout::MultipleBindings => statements.extend([
                "vec2 auxOnes1 = s0b1buffer.data[invIndex].ones;",
                "vec2 auxCoords = s0b3buffer.data[invIndex].coords;",
                "vec2 auxOnes5 = s0b5buffer.data[invIndex].ones;",
                "vec2 auxZeros = s0b5buffer.data[invIndex].zeros;",
                "vec2 vertexCoords = ((auxCoords * auxOnes1) + auxZeros) * auxOnes5;",
            ]),
        }

        statements
    }

    /// Returns the size of one vertex record in each binding, indexed by binding number.
    pub fn vertex_data_strides(self) -> SmallVec<[DeviceSize; 6]> {
        let strides: &[usize] = match self {
            VertexLayout::Padded => &[size_of::<PaddedVertex>()],
            VertexLayout::ExtraAttributes => &[size_of::<ExtraAttributesVertex>()],
            VertexLayout::MultipleBindings => &[
                size_of::<Zeros>(),
                size_of::<PaddingOnes>(),
                size_of::<Zeros>(),
                size_of::<CoordsData>(),
                size_of::<Zeros>(),
                size_of::<OneZeroPadding>(),
            ],
        };

        strides.iter().map(|&stride| stride as DeviceSize).collect()
    }

    /// Returns the number of vertex bindings the layout uses.
    #[inline]
    pub fn binding_count(self) -> usize {
        match self {
            VertexLayout::Padded | VertexLayout::ExtraAttributes => 1,
            VertexLayout::MultipleBindings => 6,
        }
    }

    /// Returns the vertex input state to bake into a pipeline, using `strides` indexed by
    /// binding number. Strides past the bindings of the layout are ignored.
    pub fn pipeline_input_state(
        self,
        strides: &[DeviceSize],
    ) -> Result<VertexInputState, Box<ValidationError>> {
        // Bindings and attributes are deliberately listed out of order.
        self.input_state(
            strides,
            &[2, 0, 1, 4, 3, 5],
            &[
                (1, 3, Format::R32G32_SFLOAT, offset_of!(CoordsData, coords)),
                (
                    2,
                    5,
                    Format::R32G32B32A32_SFLOAT,
                    offset_of!(OneZeroPadding, one_zero),
                ),
                (0, 1, Format::R32G32_SFLOAT, offset_of!(PaddingOnes, ones)),
            ],
        )
    }

    /// Returns the vertex input state to set from a command buffer, using `strides` indexed by
    /// binding number.
    ///
    /// It describes the same data as [`pipeline_input_state`](Self::pipeline_input_state), but
    /// lists bindings and attributes in another order.
    pub fn dynamic_input_state(
        self,
        strides: &[DeviceSize],
    ) -> Result<VertexInputState, Box<ValidationError>> {
        self.input_state(
            strides,
            &[2, 0, 1, 5, 4, 3],
            &[
                (
                    2,
                    5,
                    Format::R32G32B32A32_SFLOAT,
                    offset_of!(OneZeroPadding, one_zero),
                ),
                (1, 3, Format::R32G32_SFLOAT, offset_of!(CoordsData, coords)),
                (0, 1, Format::R32G32_SFLOAT, offset_of!(PaddingOnes, ones)),
            ],
        )
    }

    fn input_state(
        self,
        strides: &[DeviceSize],
        multiple_binding_order: &[u32],
        multiple_binding_attributes: &[(u32, u32, Format, usize)],
    ) -> Result<VertexInputState, Box<ValidationError>> {
        if strides.len() < self.binding_count() {
            return Err(ValidationError::new(
                "strides",
                format!(
                    "has {} elements, but the {} layout uses {} bindings",
                    strides.len(),
                    self.name(),
                    self.binding_count(),
                ),
            ));
        }

        let binding = |index: u32, input_rate: VertexInputRate| {
            let stride = u32::try_from(strides[index as usize]).map_err(|_| {
                ValidationError::new(format!("strides[{}]", index), "does not fit in 32 bits")
            })?;

            Ok::<_, Box<ValidationError>>(VertexInputBindingDescription { stride, input_rate })
        };
        let attribute = |binding: u32, format: Format, offset: usize| {
            VertexInputAttributeDescription {
                binding,
                format,
                offset: offset as u32,
            }
        };

        let state = match self {
            VertexLayout::Padded => VertexInputState::new()
                .binding(0, binding(0, VertexInputRate::Vertex)?)
                .attribute(
                    0,
                    attribute(0, Format::R32G32_SFLOAT, offset_of!(PaddedVertex, coords)),
                ),
            VertexLayout::ExtraAttributes => VertexInputState::new()
                .binding(0, binding(0, VertexInputRate::Vertex)?)
                .attribute(
                    0,
                    attribute(
                        0,
                        Format::R32G32_SFLOAT,
                        offset_of!(ExtraAttributesVertex, coords),
                    ),
                )
                .attribute(
                    1,
                    attribute(
                        0,
                        Format::R32G32_SFLOAT,
                        offset_of!(ExtraAttributesVertex, ones),
                    ),
                ),
            VertexLayout::MultipleBindings => {
                let mut state = VertexInputState::new();

                for &index in multiple_binding_order {
                    // Bindings without meaningful data are read per instance.
                    let input_rate = if index % 2 == 0 {
                        VertexInputRate::Instance { divisor: 1 }
                    } else {
                        VertexInputRate::Vertex
                    };
                    state = state.binding(index, binding(index, input_rate)?);
                }

                for &(location, binding, format, offset) in multiple_binding_attributes {
                    state = state.attribute(location, attribute(binding, format, offset));
                }

                state
            }
        };

        Ok(state)
    }

    /// Creates the contents of one vertex buffer per binding, holding `coords`. Each buffer
    /// starts with `data_offset` bytes and ends with `trailing_size` bytes of filler.
    pub fn create_vertex_data(
        self,
        coords: &[[f32; 2]],
        data_offset: DeviceSize,
        trailing_size: DeviceSize,
    ) -> SmallVec<[Vec<u8>; 6]> {
        fn buffer<T: Pod>(
            coords: &[[f32; 2]],
            data_offset: DeviceSize,
            trailing_size: DeviceSize,
            record: impl Fn([f32; 2]) -> T,
        ) -> Vec<u8> {
            let records: Vec<T> = coords.iter().copied().map(record).collect();
            padded_vertex_data(bytemuck::cast_slice(&records), data_offset, trailing_size)
        }

        let zeros = |_: [f32; 2]| Zeros { zeros: [0.0; 2] };

        match self {
            VertexLayout::Padded => [buffer(coords, data_offset, trailing_size, |coords| {
                PaddedVertex {
                    coords,
                    padding: [0.0; 2],
                }
            })]
            .into_iter()
            .collect(),
            VertexLayout::ExtraAttributes => {
                [buffer(coords, data_offset, trailing_size, |coords| {
                    ExtraAttributesVertex {
                        coords,
                        padding: [[0.0; 2]; 10],
                        ones: [1.0; 2],
                    }
                })]
                .into_iter()
                .collect()
            }
            VertexLayout::MultipleBindings => [
                buffer(coords, data_offset, trailing_size, zeros),
                buffer(coords, data_offset, trailing_size, |_| PaddingOnes {
                    padding: [[0.0; 2]; 4],
                    ones: [1.0; 2],
                }),
                buffer(coords, data_offset, trailing_size, zeros),
                buffer(coords, data_offset, trailing_size, |coords| CoordsData {
                    padding0: [0.0, 3.0],
                    coords,
                    padding1: [3.0, 0.0],
                }),
                buffer(coords, data_offset, trailing_size, zeros),
                buffer(coords, data_offset, trailing_size, |_| OneZeroPadding {
                    one_zero: [1.0, 1.0, 0.0, 0.0],
                    padding: [[0.0; 2]; 3],
                }),
            ]
            .into_iter()
            .collect(),
        }
    }

    /// Evaluates the statements of [`vertex_coord_calc`](Self::vertex_coord_calc), given the
    /// values fetched for each input location. Missing locations read as `(0, 0, 0, 1)`.
    pub fn coords_from_attributes(self, attributes: &[[f32; 4]]) -> [f32; 2] {
        let input = |location: usize| {
            attributes
                .get(location)
                .copied()
                .unwrap_or([0.0, 0.0, 0.0, 1.0])
        };

        match self {
            VertexLayout::Padded => {
                let [x, y, ..] = input(0);
                [x, y]
            }
            VertexLayout::ExtraAttributes => {
                let [x, y, ..] = input(0);
                let [ox, oy, ..] = input(1);
                [x * ox, y * oy]
            }
            VertexLayout::MultipleBindings => {
                let [ox, oy, ..] = input(0);
                let [x, y, ..] = input(1);
                let [a, b, c, d] = input(2);
                [(x * ox + c) * a, (y * oy + d) * b]
            }
        }
    }

    /// Returns the storage buffer slots that a mesh shader reads.
    pub fn storage_slots(self) -> &'static [u32] {
        match self {
            VertexLayout::Padded | VertexLayout::ExtraAttributes => &[0],
            VertexLayout::MultipleBindings => &[1, 3, 5],
        }
    }

    /// Evaluates the statements of [`descriptor_coord_calc`](Self::descriptor_coord_calc) for
    /// vertex `index`. `storage` is called with a slot number and returns the contents of the
    /// storage buffer bound there, or `None` if nothing is bound. Reads past the end of a buffer
    /// return zeroes.
    pub fn descriptor_coords<'a>(
        self,
        index: u32,
        mut storage: impl FnMut(u32) -> Option<&'a [u8]>,
    ) -> Result<[f32; 2], u32> {
        let mut read = |slot: u32, stride: usize, offset: usize| -> Result<[f32; 2], u32> {
            let data = storage(slot).ok_or(slot)?;
            let start = index as usize * stride + offset;

            Ok(data
                .get(start..start + size_of::<[f32; 2]>())
                .map_or([0.0; 2], bytemuck::pod_read_unaligned::<[f32; 2]>))
        };

        match self {
            VertexLayout::Padded => read(
                0,
                size_of::<PaddedVertex>(),
                offset_of!(PaddedVertex, coords),
            ),
            VertexLayout::ExtraAttributes => {
                let stride = size_of::<ExtraAttributesVertex>();
                let [x, y] = read(0, stride, offset_of!(ExtraAttributesVertex, coords))?;
                let [ox, oy] = read(0, stride, offset_of!(ExtraAttributesVertex, ones))?;

                Ok([x * ox, y * oy])
            }
            VertexLayout::MultipleBindings => {
                let [ox, oy] = read(
                    1,
                    size_of::<PaddingOnes>(),
                    offset_of!(PaddingOnes, ones),
                )?;
                let [x, y] = read(3, size_of::<CoordsData>(), offset_of!(CoordsData, coords))?;
                let one_zero = offset_of!(OneZeroPadding, one_zero);
                let [a, b] = read(5, size_of::<OneZeroPadding>(), one_zero)?;
                let [c, d] = read(5, size_of::<OneZeroPadding>(), one_zero + 8)?;

                Ok([(x * ox + c) * a, (y * oy + d) * b])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::VertexLayout;
    use crate::{
        buffer::FILL_PATTERN,
        pipeline::graphics::vertex_input::VertexInputRate,
    };

    #[test]
    fn record_sizes() {
        assert_eq!(VertexLayout::Padded.vertex_data_strides().as_slice(), &[16]);
        assert_eq!(
            VertexLayout::ExtraAttributes.vertex_data_strides().as_slice(),
            &[96],
        );
        assert_eq!(
            VertexLayout::MultipleBindings.vertex_data_strides().as_slice(),
            &[8, 40, 8, 24, 8, 40],
        );
    }

    #[test]
    fn extra_attribute_offset() {
        let state = VertexLayout::ExtraAttributes
            .pipeline_input_state(&[96])
            .unwrap();
        assert_eq!(state.attribute_description(1).unwrap().offset, 88);
        assert_eq!(state.binding_description(0).unwrap().stride, 96);
    }

    #[test]
    fn multiple_bindings_order() {
        let strides = VertexLayout::MultipleBindings.vertex_data_strides();
        let pipeline = VertexLayout::MultipleBindings
            .pipeline_input_state(&strides)
            .unwrap();
        let dynamic = VertexLayout::MultipleBindings
            .dynamic_input_state(&strides)
            .unwrap();

        let order = |state: &crate::pipeline::graphics::vertex_input::VertexInputState| {
            state.bindings.iter().map(|&(b, _)| b).collect::<Vec<_>>()
        };
        assert_eq!(order(&pipeline), [2, 0, 1, 4, 3, 5]);
        assert_eq!(order(&dynamic), [2, 0, 1, 5, 4, 3]);

        let locations: Vec<_> = dynamic.attributes.iter().map(|&(l, _)| l).collect();
        assert_eq!(locations, [2, 1, 0]);

        assert_eq!(
            pipeline.binding_description(4).unwrap().input_rate,
            VertexInputRate::Instance { divisor: 1 },
        );
        assert_eq!(
            pipeline.binding_description(3).unwrap().input_rate,
            VertexInputRate::Vertex,
        );
        assert_eq!(pipeline.attribute_description(1).unwrap().offset, 8);
        assert_eq!(pipeline.attribute_description(0).unwrap().offset, 32);
        assert!(pipeline.validate().is_ok());
    }

    #[test]
    fn wrong_stride_count() {
        assert!(VertexLayout::MultipleBindings
            .pipeline_input_state(&[16])
            .is_err());
        assert!(VertexLayout::Padded.dynamic_input_state(&[]).is_err());

        let state = VertexLayout::ExtraAttributes
            .pipeline_input_state(&VertexLayout::MultipleBindings.vertex_data_strides())
            .unwrap();
        assert_eq!(state.binding_description(0).unwrap().stride, 8);
    }

    #[test]
    fn vertex_data_padding() {
        let buffers = VertexLayout::Padded.create_vertex_data(&[[1.0, -1.0]], 4, 8);
        assert_eq!(buffers.len(), 1);

        let data = &buffers[0];
        assert_eq!(data.len(), 4 + 16 + 8);
        assert_eq!(&data[..4], &FILL_PATTERN.to_ne_bytes());
        assert_eq!(&data[4..8], &1.0f32.to_ne_bytes());
        assert_eq!(&data[8..12], &(-1.0f32).to_ne_bytes());
        assert_eq!(&data[20..24], &FILL_PATTERN.to_ne_bytes());
    }

    #[test]
    fn coordinates_survive_every_layout() {
        let coords = [[-1.0, 0.5], [0.25, 1.0]];

        for layout in VertexLayout::ALL {
            let buffers = layout.create_vertex_data(&coords, 0, 0);
            assert_eq!(buffers.len(), layout.binding_count());

            for (index, expected) in coords.iter().enumerate() {
                let result = layout.descriptor_coords(index as u32, |slot| {
                    Some(buffers[slot as usize].as_slice())
                });
                assert_eq!(result, Ok(*expected), "{}", layout.name());
            }
        }
    }

    #[test]
    fn coords_from_fetched_attributes() {
        assert_eq!(
            VertexLayout::MultipleBindings.coords_from_attributes(&[
                [1.0, 1.0, 0.0, 1.0],
                [0.5, -0.5, 0.0, 1.0],
                [1.0, 1.0, 0.0, 0.0],
            ]),
            [0.5, -0.5],
        );
        assert_eq!(
            VertexLayout::ExtraAttributes
                .coords_from_attributes(&[[0.5, 0.5, 0.0, 1.0], [0.0, 1.0, 0.0, 1.0]]),
            [0.0, 0.5],
        );
    }

    #[test]
    fn missing_storage_slot() {
        let buffers = VertexLayout::MultipleBindings.create_vertex_data(&[[0.0, 0.0]], 0, 0);
        let storage = |slot: u32| (slot != 5).then(|| buffers[slot as usize].as_slice());
        let result = VertexLayout::MultipleBindings.descriptor_coords(0, storage);
        assert_eq!(result, Err(5));
    }

    #[test]
    fn shader_text() {
        assert_eq!(VertexLayout::Padded.descriptor_coord_calc().len(), 4);
        assert_eq!(
            VertexLayout::MultipleBindings.descriptor_coord_calc().len(),
            8
        );

        let third_block = "layout(set=0, binding=5, std430) readonly buffer S0B5Block {";
        assert!(VertexLayout::MultipleBindings
            .descriptor_declarations()
            .contains(&third_block));
    }
}
