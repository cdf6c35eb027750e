// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Primitive assembly, rasterization and the per-fragment operations.

use super::state::DrawState;
use crate::{
    format::{Format, NumericFormat},
    image::{quantize_depth, DepthStencilImage, Framebuffer},
    oracle,
    pipeline::graphics::{
        input_assembly::PrimitiveTopology,
        viewport::{Scissor, Viewport},
    },
};
use std::{array, ops::Range};

/// A clip-space vertex position.
pub(super) type Position = [f32; 4];

/// A primitive ready for rasterization.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) enum Primitive {
    Triangle([Position; 3]),
    Line([Position; 2]),
}

/// Splits `vertices` into primitives of `topology`. `None` entries restart the primitive: runs
/// between them are assembled independently.
///
/// With `tessellation`, the topology must be a patch list of `patch_control_points` vertices.
/// Each complete patch becomes the triangle of its first three control points, which is what
/// the tessellation stages compute.
pub(super) fn assemble(
    topology: PrimitiveTopology,
    vertices: &[Option<Position>],
    tessellation: bool,
    patch_control_points: u32,
) -> Vec<Primitive> {
    let mut primitives = Vec::new();

    for run in vertices.split(Option::is_none) {
        let run: Vec<Position> = run.iter().flatten().copied().collect();
        assemble_run(
            topology,
            &run,
            tessellation,
            patch_control_points as usize,
            &mut primitives,
        );
    }

    primitives
}

fn assemble_run(
    topology: PrimitiveTopology,
    v: &[Position],
    tessellation: bool,
    patch_control_points: usize,
    primitives: &mut Vec<Primitive>,
) {
    let n = v.len();
    let triangle = |a: usize, b: usize, c: usize| Primitive::Triangle([v[a], v[b], v[c]]);
    let line = |a: usize, b: usize| Primitive::Line([v[a], v[b]]);

    match topology {
        PrimitiveTopology::PointList => (),
        PrimitiveTopology::LineList => {
            primitives.extend((0..n / 2).map(|i| line(2 * i, 2 * i + 1)));
        }
        PrimitiveTopology::LineStrip => {
            primitives.extend((0..n.saturating_sub(1)).map(|i| line(i, i + 1)));
        }
        PrimitiveTopology::TriangleList => {
            primitives.extend((0..n / 3).map(|i| triangle(3 * i, 3 * i + 1, 3 * i + 2)));
        }
        PrimitiveTopology::TriangleStrip => {
            primitives.extend(
                (0..n.saturating_sub(2)).map(|i| triangle(i, i + 1 + i % 2, i + 2 - i % 2)),
            );
        }
        PrimitiveTopology::TriangleFan => {
            primitives.extend((0..n.saturating_sub(2)).map(|i| triangle(i + 1, i + 2, 0)));
        }
        PrimitiveTopology::LineListWithAdjacency => {
            primitives.extend((0..n / 4).map(|i| line(4 * i + 1, 4 * i + 2)));
        }
        PrimitiveTopology::LineStripWithAdjacency => {
            primitives.extend((0..n.saturating_sub(3)).map(|i| line(i + 1, i + 2)));
        }
        PrimitiveTopology::TriangleListWithAdjacency => {
            primitives.extend((0..n / 6).map(|i| triangle(6 * i, 6 * i + 2, 6 * i + 4)));
        }
        PrimitiveTopology::TriangleStripWithAdjacency => {
            let count = if n >= 6 { (n - 4) / 2 } else { 0 };
            primitives.extend((0..count).map(|i| {
                if i % 2 == 0 {
                    triangle(2 * i, 2 * i + 2, 2 * i + 4)
                } else {
                    triangle(2 * i + 2, 2 * i, 2 * i + 4)
                }
            }));
        }
        PrimitiveTopology::PatchList => {
            if tessellation && patch_control_points >= 3 {
                primitives.extend(
                    (0..n / patch_control_points).map(|i| {
                        let first = i * patch_control_points;
                        triangle(first, first + 1, first + 2)
                    }),
                );
            }
        }
    }
}

/// A fragment produced by rasterization.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct Fragment {
    pub(super) x: u32,
    pub(super) y: u32,
    pub(super) depth: f32,
    pub(super) front_facing: bool,
}

/// Rasterizes `primitive` into the pixels of `extent`, through `viewport` and `scissor`.
///
/// Triangles are culled according to `state`, and get the depth bias of `state` applied.
/// Fragments outside of the `0.0..=1.0` depth range are clipped.
pub(super) fn rasterize(
    primitive: &Primitive,
    viewport: &Viewport,
    scissor: &Scissor,
    extent: [u32; 2],
    state: &DrawState,
    depth_format: Format,
    mut emit: impl FnMut(Fragment),
) {
    let visible = |x: u32, y: u32| {
        x < extent[0]
            && y < extent[1]
            && scissor.contains_pixel(x, y)
            && viewport.contains_pixel(x, y)
    };

    match *primitive {
        Primitive::Triangle(positions) => {
            let v = positions.map(|p| window_coords(viewport, p));

            let mut twice_area = 0.0;
            for i in 0..3 {
                let j = (i + 1) % 3;
                twice_area += v[i][0] * v[j][1] - v[j][0] * v[i][1];
            }

            let signed_area = -0.5 * twice_area;

            if signed_area == 0.0 {
                return;
            }

            let front_facing = state.front_face.is_front_facing(signed_area);

            if state.cull_mode.discards(front_facing) {
                return;
            }

            let bias = if state.depth_bias_enable {
                let max_depth = v.iter().map(|p| p[2].abs()).fold(0.0, f64::max);
                let offset = f64::from(state.depth_bias.constant_factor)
                    * minimum_resolvable_difference(depth_format, max_depth);

                state.depth_bias.clamp_offset(offset)
            } else {
                0.0
            };

            // Orient the edge functions so that the inside is positive.
            let orientation = edge(v[0], v[1], v[2]).signum();
            let area = edge(v[0], v[1], v[2]) * orientation;
            let edges = [(1, 2), (2, 0), (0, 1)];

            let min_x = v.iter().map(|p| p[0]).fold(f64::INFINITY, f64::min);
            let max_x = v.iter().map(|p| p[0]).fold(f64::NEG_INFINITY, f64::max);
            let min_y = v.iter().map(|p| p[1]).fold(f64::INFINITY, f64::min);
            let max_y = v.iter().map(|p| p[1]).fold(f64::NEG_INFINITY, f64::max);

            for y in pixel_range(min_y, max_y, extent[1]) {
                for x in pixel_range(min_x, max_x, extent[0]) {
                    if !visible(x, y) {
                        continue;
                    }

                    let p = [f64::from(x) + 0.5, f64::from(y) + 0.5, 0.0];
                    let mut weights = [0.0; 3];
                    let mut inside = true;

                    for (weight, &(a, b)) in weights.iter_mut().zip(&edges) {
                        *weight = edge(v[a], v[b], p) * orientation;

                        let owns_edge = *weight == 0.0 && {
                            let dx = (v[b][0] - v[a][0]) * orientation;
                            let dy = (v[b][1] - v[a][1]) * orientation;
                            dy > 0.0 || (dy == 0.0 && dx < 0.0)
                        };

                        if *weight < 0.0 || (*weight == 0.0 && !owns_edge) {
                            inside = false;
                            break;
                        }
                    }

                    if !inside {
                        continue;
                    }

                    let depth = (weights[0] * v[0][2] + weights[1] * v[1][2] + weights[2] * v[2][2])
                        / area;

                    if !(0.0..=1.0).contains(&depth) {
                        continue;
                    }

                    emit(Fragment {
                        x,
                        y,
                        depth: (depth + bias).clamp(0.0, 1.0) as f32,
                        front_facing,
                    });
                }
            }
        }
        Primitive::Line(positions) => {
            let [a, b] = positions.map(|p| window_coords(viewport, p));
            let dx = b[0] - a[0];
            let dy = b[1] - a[1];

            if dx == 0.0 && dy == 0.0 {
                return;
            }

            // Step along the major axis, one fragment per pixel center in `[start, end)`.
            let x_major = dx.abs() >= dy.abs();
            let (major, length) = if x_major { (0, dx) } else { (1, dy) };
            let (start, end) = if length > 0.0 {
                (a[major], b[major])
            } else {
                (b[major], a[major])
            };
            let major_extent = extent[major];

            for m in pixel_range(start, end, major_extent) {
                let center = f64::from(m) + 0.5;

                if center < start || center >= end {
                    continue;
                }

                let t = (center - a[major]) / length;
                let minor = if x_major {
                    a[1] + t * dy
                } else {
                    a[0] + t * dx
                };

                if minor < 0.0 {
                    continue;
                }

                let n = minor.floor() as u32;
                let (x, y) = if x_major { (m, n) } else { (n, m) };

                if !visible(x, y) {
                    continue;
                }

                let depth = a[2] + t * (b[2] - a[2]);

                if !(0.0..=1.0).contains(&depth) {
                    continue;
                }

                emit(Fragment {
                    x,
                    y,
                    depth: depth as f32,
                    front_facing: true,
                });
            }
        }
    }
}

/// Divides a clip-space position by its w and maps it into the viewport.
fn window_coords(viewport: &Viewport, position: Position) -> [f64; 3] {
    let w = position[3];
    viewport.transform([position[0] / w, position[1] / w, position[2] / w])
}

fn edge(a: [f64; 3], b: [f64; 3], p: [f64; 3]) -> f64 {
    (b[0] - a[0]) * (p[1] - a[1]) - (b[1] - a[1]) * (p[0] - a[0])
}

/// Returns the pixels whose centers may lie in `min..=max`, limited to `0..size`.
fn pixel_range(min: f64, max: f64, size: u32) -> Range<u32> {
    let start = (min - 0.5).ceil().max(0.0);
    let end = (max + 0.5).floor().max(0.0).min(f64::from(size));

    if start >= end {
        0..0
    } else {
        start as u32..end as u32
    }
}

/// Returns the smallest difference in depth that the depth format can represent around
/// `max_depth`, which is the unit of the constant depth bias factor.
fn minimum_resolvable_difference(format: Format, max_depth: f64) -> f64 {
    match format.numeric_format_depth() {
        Some(NumericFormat::SFLOAT) => {
            let exponent = if max_depth > 0.0 {
                max_depth.log2().floor()
            } else {
                -126.0
            };

            (exponent - 23.0).exp2()
        }
        _ => (-24.0f64).exp2(),
    }
}

/// The color a fragment shader writes, as a texel of the color attachment's format.
pub(super) type FragmentColor = Option<[u8; 4]>;

/// Runs the per-fragment operations for `fragment`: the depth bounds, stencil and depth tests,
/// followed by the stencil, depth and color writes.
pub(super) fn process_fragment(
    framebuffer: &mut Framebuffer,
    state: &DrawState,
    fragment: Fragment,
    color: FragmentColor,
) {
    let Fragment {
        x,
        y,
        depth,
        front_facing,
    } = fragment;
    let attachment = &mut framebuffer.depth_stencil;
    let stored_depth = attachment.depth(x, y);

    if state.depth_bounds_test_enable && !state.depth_bounds.contains(&stored_depth) {
        return;
    }

    let face = if front_facing {
        &state.front
    } else {
        &state.back
    };
    let stored_stencil = attachment.stencil(x, y);
    let write_stencil = |attachment: &mut DepthStencilImage, op| {
        let value =
            oracle::stencil_result(op, stored_stencil, face.reference as u8, u8::MIN, u8::MAX);
        let write_mask = face.write_mask as u8;
        attachment.set_stencil(x, y, (stored_stencil & !write_mask) | (value & write_mask));
    };

    if state.stencil_test_enable {
        let compare_mask = face.compare_mask as u8;
        let passes = oracle::stencil_passes(
            face.ops.compare_op,
            stored_stencil & compare_mask,
            face.reference as u8 & compare_mask,
        );

        if !passes {
            write_stencil(attachment, face.ops.fail_op);
            return;
        }
    }

    let depth = quantize_depth(attachment.format(), depth);

    if state.depth_test_enable
        && !oracle::depth_passes(state.depth_compare_op, depth, stored_depth)
    {
        if state.stencil_test_enable {
            write_stencil(attachment, face.ops.depth_fail_op);
        }

        return;
    }

    if state.stencil_test_enable {
        write_stencil(attachment, face.ops.pass_op);
    }

    if state.depth_test_enable && state.depth_write_enable {
        attachment.set_depth(x, y, depth);
    }

    if let Some(texel) = color {
        let image = &mut framebuffer.color;
        let integer = image.format().numeric_format_color() == Some(NumericFormat::UINT);

        let texel = if state.logic_op_enable && integer {
            let stored = image.texel(x, y);

            let logic_op = state.logic_op;
            array::from_fn(|i| {
                (logic_op.apply(u32::from(texel[i]), u32::from(stored[i])) & 0xFF) as u8
            })
        } else {
            texel
        };

        image.set_texel(x, y, texel);
    }
}

#[cfg(test)]
mod tests {
    use super::{assemble, pixel_range, Primitive};
    use crate::pipeline::graphics::input_assembly::PrimitiveTopology;

    fn vertex(x: f32) -> Option<[f32; 4]> {
        Some([x, 0.0, 0.0, 1.0])
    }

    #[test]
    fn strips_alternate_winding() {
        let vertices: Vec<_> = (0..4).map(|i| vertex(i as f32)).collect();
        let primitives = assemble(PrimitiveTopology::TriangleStrip, &vertices, false, 0);

        assert_eq!(primitives.len(), 2);
        assert_eq!(
            primitives[1],
            Primitive::Triangle([
                [1.0, 0.0, 0.0, 1.0],
                [3.0, 0.0, 0.0, 1.0],
                [2.0, 0.0, 0.0, 1.0],
            ]),
        );
    }

    #[test]
    fn restart_splits_strips() {
        let vertices = [vertex(0.0), vertex(1.0), vertex(2.0), None, vertex(3.0)];

        assert_eq!(
            assemble(PrimitiveTopology::LineStrip, &vertices, false, 0).len(),
            2,
        );
        assert_eq!(
            assemble(PrimitiveTopology::LineList, &vertices, false, 0).len(),
            1,
        );
    }

    #[test]
    fn patches() {
        let vertices: Vec<_> = (0..6).map(|i| vertex(i as f32)).collect();

        assert_eq!(
            assemble(PrimitiveTopology::PatchList, &vertices, true, 3).len(),
            2,
        );
        let patches = assemble(PrimitiveTopology::PatchList, &vertices, true, 1);
        assert!(patches.is_empty());
    }

    #[test]
    fn pixel_ranges() {
        assert_eq!(pixel_range(0.0, 64.0, 64), 0..64);
        assert_eq!(pixel_range(-10.0, 200.0, 64), 0..64);
        assert_eq!(pixel_range(32.0, 64.0, 64), 32..64);
        assert_eq!(pixel_range(70.0, 80.0, 64), 0..0);
    }
}
