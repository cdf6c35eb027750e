// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! The shaders of the test pipelines.
//!
//! Each pipeline carries its shaders twice over: as GLSL source, for devices that compile them,
//! and as a small semantic description of what the stages compute, which is what the
//! [`SoftwareDevice`](crate::software::SoftwareDevice) executes. Both are produced by the same
//! constructors of [`PipelineShaders`], so they cannot drift apart.
//!
//! # Templates
//!
//! Shader text is produced from templates in which `${NAME}` is replaced by a value, see
//! [`specialize`]. A template naming a placeholder that has no value is an error rather than an
//! empty substitution.

use super::graphics::{input_assembly::PrimitiveTopologyClass, vertex_input::VertexLayout};
use crate::{format::NumericFormat, macros::vulkan_bitflags, ValidationError};
use bytemuck::{Pod, Zeroable};
use smallvec::SmallVec;
use std::fmt::Write as _;

vulkan_bitflags! {
    /// A set of shader stages.
    ShaderStages = ShaderStageFlags(u32);

    VERTEX = VERTEX,
    TESSELLATION_CONTROL = TESSELLATION_CONTROL,
    TESSELLATION_EVALUATION = TESSELLATION_EVALUATION,
    GEOMETRY = GEOMETRY,
    FRAGMENT = FRAGMENT,
    MESH = MESH_EXT,
}

/// The values pushed to the shaders before each draw.
///
/// The layout matches the `std430` push constant block declared by the shaders.
#[derive(Clone, Copy, Debug, Default, PartialEq, Zeroable, Pod)]
#[repr(C)]
pub struct PushConstants {
    pub triangle_color: [f32; 4],
    pub mesh_depth: f32,
    pub viewport_index: i32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub strip_scale: f32,
}

impl PushConstants {
    /// Applies the position transform shared by the vertex and mesh shaders to `coords`.
    ///
    /// `vertex_index` selects the strip offset, which is scaled by `strip_scale`. Pass `None` for
    /// mesh shaders, which do not apply it.
    pub fn transform(&self, coords: [f32; 2], vertex_index: Option<u32>) -> [f32; 4] {
        let mut position = [
            coords[0] * self.scale_x + self.offset_x,
            coords[1] * self.scale_y + self.offset_y,
            self.mesh_depth,
            1.0,
        ];

        if let Some(vertex_index) = vertex_index {
            let strip_offset = strip_offset(vertex_index);
            position[0] += self.strip_scale * strip_offset[0];
            position[1] += self.strip_scale * strip_offset[1];
        }

        position
    }
}

/// Returns the offset added to vertex `vertex_index` to turn a single repeated vertex into a
/// six-vertex triangle strip.
#[inline]
pub const fn strip_offset(vertex_index: u32) -> [f32; 2] {
    match vertex_index {
        0 => [0.0, 0.0],
        1 => [0.0, 1.0],
        2 => [1.0, 0.0],
        3 => [1.0, 1.0],
        4 => [2.0, 0.0],
        5 => [2.0, 1.0],
        _ => [-1000.0, -1000.0],
    }
}

/// Replaces every `${NAME}` in `template` with the value of `NAME` in `values`.
pub fn specialize(template: &str, values: &[(&str, &str)]) -> Result<String, Box<ValidationError>> {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);

        let after = &rest[start + 2..];
        let end = after.find('}').ok_or_else(|| {
            ValidationError::new("template", "contains an unterminated placeholder")
        })?;
        let name = &after[..end];
        let (_, value) = values.iter().find(|(n, _)| *n == name).ok_or_else(|| {
            ValidationError::new(
                "template",
                format!("has no value for the placeholder `{}`", name),
            )
        })?;

        result.push_str(value);
        rest = &after[end + 1..];
    }

    result.push_str(rest);

    Ok(result)
}

const PUSH_CONSTANTS: &str = "\
layout(push_constant, std430) uniform PushConstantsBlock {
    vec4  triangleColor;
    float depthValue;
    int   viewPortIndex;
    float scaleX;
    float scaleY;
    float offsetX;
    float offsetY;
    float stripScale;
} pushConstants;
";

const VERTEX_TEMPLATE: &str = "\
#version 450
${PUSH_CONSTANTS}${ATTRIBUTES}out gl_PerVertex
{
    vec4 gl_Position;
};
void main() {
${CALCULATIONS}    gl_Position = vec4(vertexCoords.x * pushConstants.scaleX + pushConstants.offsetX, \
vertexCoords.y * pushConstants.scaleY + pushConstants.offsetY, pushConstants.depthValue, 1.0);
    vec2 stripOffset;
    switch (gl_VertexIndex) {
    case 0: stripOffset = vec2(0.0, 0.0); break;
    case 1: stripOffset = vec2(0.0, 1.0); break;
    case 2: stripOffset = vec2(1.0, 0.0); break;
    case 3: stripOffset = vec2(1.0, 1.0); break;
    case 4: stripOffset = vec2(2.0, 0.0); break;
    case 5: stripOffset = vec2(2.0, 1.0); break;
    default: stripOffset = vec2(-1000.0); break;
    }
    gl_Position.xy += pushConstants.stripScale * stripOffset;
}
";

const FRAGMENT_TEMPLATE: &str = "\
#version 450
${PUSH_CONSTANTS}layout(location=0) out ${VEC_TYPE} color;
void main() {
    color = ${VEC_TYPE}(pushConstants.triangleColor);
}
";

const TESSELLATION_CONTROL_SOURCE: &str = "\
#version 450
#extension GL_EXT_tessellation_shader : require
layout(vertices=3) out;
in gl_PerVertex
{
    vec4 gl_Position;
} gl_in[gl_MaxPatchVertices];
out gl_PerVertex
{
  vec4 gl_Position;
} gl_out[];
void main() {
  gl_out[gl_InvocationID].gl_Position = gl_in[gl_InvocationID].gl_Position;
  gl_TessLevelOuter[0] = 3.0;
  gl_TessLevelOuter[1] = 3.0;
  gl_TessLevelOuter[2] = 3.0;
  gl_TessLevelInner[0] = 3.0;
}
";

const TESSELLATION_EVALUATION_SOURCE: &str = "\
#version 450
#extension GL_EXT_tessellation_shader : require
layout(triangles) in;
in gl_PerVertex
{
  vec4 gl_Position;
} gl_in[gl_MaxPatchVertices];
out gl_PerVertex
{
  vec4 gl_Position;
};
void main() {
  gl_Position = (gl_in[0].gl_Position * gl_TessCoord.x +
                 gl_in[1].gl_Position * gl_TessCoord.y +
                 gl_in[2].gl_Position * gl_TessCoord.z);
}
";

const MESH_TEMPLATE: &str = "\
#version 450
#extension GL_EXT_mesh_shader : enable
layout(local_size_x=3, local_size_y=1, local_size_z=1) in;
layout(triangles) out;
layout(max_vertices=3, max_primitives=1) out;
${PUSH_CONSTANTS}${VIEWPORT_INDEX_DECLARATION}${DESCRIPTORS}void main() {
${CALCULATIONS}    SetMeshOutputsEXT(3u, 1u);
    gl_MeshVerticesEXT[gl_LocalInvocationIndex].gl_Position = vec4(vertexCoords.x * \
pushConstants.scaleX + pushConstants.offsetX, vertexCoords.y * pushConstants.scaleY + \
pushConstants.offsetY, pushConstants.depthValue, 1.0);
    if (gl_LocalInvocationIndex == 0u) {
        gl_PrimitiveTriangleIndicesEXT[0] = uvec3(0, 1, 2);
${VIEWPORT_INDEX_WRITE}    }
}
";

const MESH_NO_OUTPUT_SOURCE: &str = "\
#version 450
#extension GL_EXT_mesh_shader : enable
layout(local_size_x=1, local_size_y=1, local_size_z=1) in;
layout(triangles) out;
layout(max_vertices=3, max_primitives=1) out;
void main() {
    SetMeshOutputsEXT(0u, 0u);
}
";

const OFFSCREEN_VERTEX_SOURCE: &str = "\
#version 450
vec2 positions[3] = vec2[](
    vec2(-1.0, -1.0),
    vec2( 3.0, -1.0),
    vec2(-1.0,  3.0)
);
void main() {
    gl_Position = vec4(positions[gl_VertexIndex] + 10.0 + 1.0 * float(gl_VertexIndex), 0.0, 1.0);
}
";

const WHITE_FRAGMENT_SOURCE: &str = "\
#version 450
layout(location=0) out vec4 color;
void main() {
    color = vec4(1.0, 1.0, 1.0, 1.0);
}
";

/// One stage of a pipeline, as GLSL source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShaderModule {
    /// The stage the source is written for. Exactly one flag is set.
    pub stage: ShaderStages,

    /// The GLSL source text.
    pub source: String,
}

/// What the stages up to rasterization compute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreRasterization {
    /// A vertex shader reading a vertex layout, optionally followed by tessellation and geometry
    /// stages.
    ///
    /// Tessellation turns each patch into the triangle formed by its first three control points.
    /// The geometry stage passes primitives through.
    Vertex {
        layout: VertexLayout,
        tessellation: bool,
        geometry: bool,
    },

    /// A mesh shader reading a vertex layout from storage buffers. Work group `i` emits the
    /// triangle `i` of a triangle strip over the vertices.
    Mesh { layout: VertexLayout },

    /// A mesh shader that emits nothing.
    MeshNoOutput,

    /// A vertex shader that ignores any vertex input and emits a triangle entirely outside of
    /// the framebuffer.
    OffscreenTriangle,
}

/// What the fragment shader writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FragmentOutput {
    /// The triangle color from the push constants, converted to the attachment's numeric
    /// format.
    TriangleColor,

    /// Opaque white.
    White,

    /// There is no fragment shader.
    None,
}

/// The shaders of a graphics pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineShaders {
    pre_rasterization: PreRasterization,
    fragment: FragmentOutput,
    writes_viewport_index: bool,
    modules: SmallVec<[ShaderModule; 5]>,
}

impl PipelineShaders {
    /// Creates the shaders of a classic pipeline reading vertices with `layout`.
    ///
    /// The geometry stage is generated for the primitives of `topology_class`, which must not be
    /// [`PrimitiveTopologyClass::Point`]. It routes primitives to the viewport given in the push
    /// constants when `multi_viewport` is true.
    pub fn vertex(
        layout: VertexLayout,
        color: NumericFormat,
        topology_class: PrimitiveTopologyClass,
        tessellation: bool,
        geometry: bool,
        multi_viewport: bool,
    ) -> Result<Self, Box<ValidationError>> {
        let mut modules = SmallVec::new();

        let attributes = join_lines(layout.attribute_declarations(), "");
        let calculations = join_lines(layout.vertex_coord_calc(), "    ");
        modules.push(ShaderModule {
            stage: ShaderStages::VERTEX,
            source: specialize(
                VERTEX_TEMPLATE,
                &[
                    ("PUSH_CONSTANTS", PUSH_CONSTANTS),
                    ("ATTRIBUTES", &attributes),
                    ("CALCULATIONS", &calculations),
                ],
            )?,
        });

        if tessellation {
            modules.push(ShaderModule {
                stage: ShaderStages::TESSELLATION_CONTROL,
                source: TESSELLATION_CONTROL_SOURCE.to_owned(),
            });
            modules.push(ShaderModule {
                stage: ShaderStages::TESSELLATION_EVALUATION,
                source: TESSELLATION_EVALUATION_SOURCE.to_owned(),
            });
        }

        if geometry {
            modules.push(ShaderModule {
                stage: ShaderStages::GEOMETRY,
                source: geometry_source(topology_class, multi_viewport)?,
            });
        }

        modules.push(fragment_module(color)?);

        Ok(PipelineShaders {
            pre_rasterization: PreRasterization::Vertex {
                layout,
                tessellation,
                geometry,
            },
            fragment: FragmentOutput::TriangleColor,
            writes_viewport_index: geometry && multi_viewport,
            modules,
        })
    }

    /// Creates the shaders of a mesh shading pipeline reading vertices with `layout`.
    pub fn mesh(
        layout: VertexLayout,
        color: NumericFormat,
        multi_viewport: bool,
    ) -> Result<Self, Box<ValidationError>> {
        let descriptors = join_lines(layout.descriptor_declarations(), "");
        let calculations = join_lines(&layout.descriptor_coord_calc(), "    ");
        let (declaration, write) = if multi_viewport {
            (
                "perprimitiveEXT out gl_MeshPerPrimitiveEXT { int gl_ViewportIndex; } \
                gl_MeshPrimitivesEXT[];\n",
                "        gl_MeshPrimitivesEXT[0].gl_ViewportIndex = pushConstants.viewPortIndex;\n",
            )
        } else {
            ("", "")
        };

        let mesh = ShaderModule {
            stage: ShaderStages::MESH,
            source: specialize(
                MESH_TEMPLATE,
                &[
                    ("PUSH_CONSTANTS", PUSH_CONSTANTS),
                    ("VIEWPORT_INDEX_DECLARATION", declaration),
                    ("DESCRIPTORS", &descriptors),
                    ("CALCULATIONS", &calculations),
                    ("VIEWPORT_INDEX_WRITE", write),
                ],
            )?,
        };

        Ok(PipelineShaders {
            pre_rasterization: PreRasterization::Mesh { layout },
            fragment: FragmentOutput::TriangleColor,
            writes_viewport_index: multi_viewport,
            modules: [mesh, fragment_module(color)?].into_iter().collect(),
        })
    }

    /// Creates the shaders of a mesh shading pipeline that produces no primitives and has no
    /// fragment shader.
    pub fn mesh_no_output() -> Self {
        PipelineShaders {
            pre_rasterization: PreRasterization::MeshNoOutput,
            fragment: FragmentOutput::None,
            writes_viewport_index: false,
            modules: [ShaderModule {
                stage: ShaderStages::MESH,
                source: MESH_NO_OUTPUT_SOURCE.to_owned(),
            }]
            .into_iter()
            .collect(),
        }
    }

    /// Creates the shaders of a pipeline that draws one white triangle outside of the
    /// framebuffer, without reading any vertex input.
    pub fn offscreen_triangle() -> Self {
        PipelineShaders {
            pre_rasterization: PreRasterization::OffscreenTriangle,
            fragment: FragmentOutput::White,
            writes_viewport_index: false,
            modules: [
                ShaderModule {
                    stage: ShaderStages::VERTEX,
                    source: OFFSCREEN_VERTEX_SOURCE.to_owned(),
                },
                ShaderModule {
                    stage: ShaderStages::FRAGMENT,
                    source: WHITE_FRAGMENT_SOURCE.to_owned(),
                },
            ]
            .into_iter()
            .collect(),
        }
    }

    /// Returns what the stages up to rasterization compute.
    #[inline]
    pub fn pre_rasterization(&self) -> &PreRasterization {
        &self.pre_rasterization
    }

    /// Returns what the fragment shader writes.
    #[inline]
    pub fn fragment(&self) -> FragmentOutput {
        self.fragment
    }

    /// Returns whether the last pre-rasterization stage writes the viewport index from the push
    /// constants. Otherwise, every primitive goes to viewport 0.
    #[inline]
    pub fn writes_viewport_index(&self) -> bool {
        self.writes_viewport_index
    }

    /// Returns the GLSL source of each stage.
    #[inline]
    pub fn modules(&self) -> &[ShaderModule] {
        &self.modules
    }

    /// Returns the stages that the pipeline has.
    pub fn stages(&self) -> ShaderStages {
        self.modules
            .iter()
            .fold(ShaderStages::empty(), |all, module| all | module.stage)
    }

    /// Returns whether the pipeline is a mesh shading pipeline.
    #[inline]
    pub fn is_mesh_shading(&self) -> bool {
        self.stages().intersects(ShaderStages::MESH)
    }
}

fn join_lines(lines: &[&str], indent: &str) -> String {
    lines.iter().fold(String::new(), |mut joined, line| {
        let _ = writeln!(joined, "{}{}", indent, line);
        joined
    })
}

fn fragment_module(color: NumericFormat) -> Result<ShaderModule, Box<ValidationError>> {
    let vec_type = match color {
        NumericFormat::UNORM => "vec4",
        NumericFormat::UINT => "uvec4",
        NumericFormat::SFLOAT => {
            return Err(ValidationError::new(
                "color",
                "is not the numeric format of a color attachment used by the tests",
            ));
        }
    };

    Ok(ShaderModule {
        stage: ShaderStages::FRAGMENT,
        source: specialize(
            FRAGMENT_TEMPLATE,
            &[("PUSH_CONSTANTS", PUSH_CONSTANTS), ("VEC_TYPE", vec_type)],
        )?,
    })
}

fn geometry_source(
    topology_class: PrimitiveTopologyClass,
    multi_viewport: bool,
) -> Result<String, Box<ValidationError>> {
    let (input, output, vertex_count) = match topology_class {
        PrimitiveTopologyClass::Line => ("lines", "line_strip", 2),
        PrimitiveTopologyClass::Triangle | PrimitiveTopologyClass::Patch => {
            ("triangles", "triangle_strip", 3)
        }
        PrimitiveTopologyClass::Point => {
            return Err(ValidationError::new(
                "topology_class",
                "points are not drawn with a geometry shader",
            ));
        }
    };

    let mut source = String::new();
    let _ = write!(
        source,
        "#version 450\n\
        layout ({input}) in;\n\
        layout ({output}, max_vertices={vertex_count}) out;\n\
        {push}\
        in gl_PerVertex\n\
        {{\n    vec4 gl_Position;\n}} gl_in[{vertex_count}];\n\
        out gl_PerVertex\n\
        {{\n    vec4 gl_Position;\n}};\n\
        void main() {{\n\
        {route}",
        push = if multi_viewport { PUSH_CONSTANTS } else { "" },
        route = if multi_viewport {
            "    gl_ViewportIndex = pushConstants.viewPortIndex;\n"
        } else {
            ""
        },
    );

    for i in 0..vertex_count {
        let _ = write!(
            source,
            "    gl_Position = gl_in[{}].gl_Position;\n    EmitVertex();\n",
            i,
        );
    }

    source.push_str("}\n");

    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::{
        specialize, strip_offset, FragmentOutput, PipelineShaders, PreRasterization,
        PushConstants, ShaderStages,
    };
    use crate::{
        format::NumericFormat,
        pipeline::graphics::{
            input_assembly::PrimitiveTopologyClass, vertex_input::VertexLayout,
        },
    };

    #[test]
    fn placeholders() {
        assert_eq!(
            specialize("a${X}b${Y}c", &[("X", "1"), ("Y", "22")]).unwrap(),
            "a1b22c",
        );
        assert_eq!(
            specialize("no placeholders", &[]).unwrap(),
            "no placeholders"
        );
        assert!(specialize("${MISSING}", &[("X", "1")]).is_err());
        assert!(specialize("${UNTERMINATED", &[]).is_err());
    }

    #[test]
    fn push_constant_block_size() {
        assert_eq!(std::mem::size_of::<PushConstants>(), 44);
    }

    #[test]
    fn vertex_transform() {
        let push_constants = PushConstants {
            triangle_color: [0.0, 0.0, 1.0, 1.0],
            mesh_depth: 0.25,
            viewport_index: 0,
            scale_x: 1.0,
            scale_y: 0.5,
            offset_x: 0.0,
            offset_y: -0.5,
            strip_scale: 1.0,
        };

        assert_eq!(
            push_constants.transform([-1.0, -1.0], Some(3)),
            [0.0, 0.0, 0.25, 1.0],
        );
        assert_eq!(
            push_constants.transform([-1.0, -1.0], None),
            [-1.0, -1.0, 0.25, 1.0],
        );
        assert_eq!(strip_offset(6), [-1000.0, -1000.0]);
    }

    #[test]
    fn classic_pipeline_stages() {
        let shaders = PipelineShaders::vertex(
            VertexLayout::ExtraAttributes,
            NumericFormat::UNORM,
            PrimitiveTopologyClass::Patch,
            true,
            true,
            true,
        )
        .unwrap();

        assert_eq!(
            shaders.stages(),
            ShaderStages::VERTEX
                | ShaderStages::TESSELLATION_CONTROL
                | ShaderStages::TESSELLATION_EVALUATION
                | ShaderStages::GEOMETRY
                | ShaderStages::FRAGMENT,
        );
        assert!(shaders.writes_viewport_index());
        assert!(!shaders.is_mesh_shading());

        let vertex = &shaders.modules()[0].source;
        assert!(vertex.contains("layout(location=1) in vec2 ones;\n"));
        assert!(vertex.contains("    vertexCoords = vertexCoords * ones;\n"));
        assert!(!vertex.contains("${"));

        let geometry = &shaders.modules()[3].source;
        for line in [
            "layout (triangle_strip, max_vertices=3) out;",
            "gl_ViewportIndex = pushConstants.viewPortIndex;",
        ] {
            assert!(geometry.contains(line), "{}", line);
        }
    }

    #[test]
    fn uint_fragment_output() {
        let shaders = PipelineShaders::vertex(
            VertexLayout::Padded,
            NumericFormat::UINT,
            PrimitiveTopologyClass::Line,
            false,
            true,
            false,
        )
        .unwrap();

        assert!(!shaders.writes_viewport_index());
        let fragment = &shaders.modules().last().unwrap().source;
        assert!(fragment.contains("out uvec4 color;"));

        let geometry = &shaders.modules()[1].source;
        assert!(geometry.contains("layout (lines) in;"));
        assert!(!geometry.contains("pushConstants"));
    }

    #[test]
    fn mesh_pipelines() {
        let shaders =
            PipelineShaders::mesh(VertexLayout::Padded, NumericFormat::UNORM, true).unwrap();
        assert!(shaders.is_mesh_shading());
        assert_eq!(
            shaders.pre_rasterization(),
            &PreRasterization::Mesh {
                layout: VertexLayout::Padded
            },
        );

        let mesh = &shaders.modules()[0].source;
        assert!(mesh.contains("s0b0buffer.data[invIndex].position"));
        assert!(mesh.contains("gl_MeshPrimitivesEXT[0].gl_ViewportIndex"));

        let unused = PipelineShaders::mesh_no_output();
        assert_eq!(unused.fragment(), FragmentOutput::None);
        assert_eq!(unused.stages(), ShaderStages::MESH);
    }
}
