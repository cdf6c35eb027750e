// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! The fixed-function state of a graphics pipeline.
//!
//! A graphics operation takes vertices or vertex parameters as input, and produces pixels as
//! output. The stages it goes through are, in order:
//!
//! - Vertex input: vertex data is read from vertex buffers, according to the
//!   [vertex input state](vertex_input), and fed to the vertex shader. Mesh shading pipelines
//!   skip this stage and read their data from storage buffers instead.
//! - [Input assembly](input_assembly): vertices are grouped into primitives.
//! - [Tessellation](tessellation), optionally.
//! - A geometry shader, optionally.
//! - [Viewport and scissor](viewport): primitives are mapped to the framebuffer.
//! - [Rasterization](rasterization): primitives are culled, biased and turned into fragments.
//! - [Depth and stencil tests](depth_stencil).
//! - [Color blending](color_blend), which only applies the logical operation here.
//!
//! Each state struct holds the values baked into a pipeline. Where the corresponding
//! [`DynamicState`](crate::pipeline::DynamicState) is enabled, the value is taken from the
//! command buffer instead, and the field is ignored.

pub mod color_blend;
pub mod depth_stencil;
pub mod input_assembly;
pub mod rasterization;
pub mod tessellation;
pub mod vertex_input;
pub mod viewport;
