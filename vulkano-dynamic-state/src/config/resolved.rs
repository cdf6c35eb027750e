// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

use super::{DepthBiasParams, TestConfig};
use crate::{
    pipeline::graphics::{
        vertex_input::VertexLayout,
        viewport::{Scissor, Viewport},
    },
    ValidationError,
};
use std::ops::Deref;

/// A [`TestConfig`] whose pairs have been arranged for its ordering.
///
/// Orderings that bind the static pipeline last hold the expected values in the static pipeline.
/// For those, every pair has its values exchanged, and the accessors below return the values that
/// take effect.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedConfig {
    config: TestConfig,
    swapped: bool,
}

/// Validates `config` and arranges its pairs for its ordering.
///
/// If the ordering is reversed, the static and dynamic values of every pair that has both are
/// exchanged. Pairs with only a static value are left as they are.
pub fn apply_ordering(mut config: TestConfig) -> Result<ResolvedConfig, Box<ValidationError>> {
    config.validate()?;

    let swapped = config.ordering.is_reversed();

    if swapped {
        let TestConfig {
            vertex_layout,
            cull_mode,
            front_face,
            topology,
            viewports,
            scissors,
            strides,
            depth_test_enable,
            depth_write_enable,
            depth_compare_op,
            depth_bounds_test_enable,
            stencil_test_enable,
            stencil_ops,
            depth_bias_enable,
            rasterizer_discard_enable,
            primitive_restart_enable,
            logic_op,
            patch_control_points,
            depth_bias,
            ..
        } = &mut config;

        vertex_layout.swap();
        cull_mode.swap();
        front_face.swap();
        topology.swap();
        viewports.swap();
        scissors.swap();
        strides.swap();
        depth_test_enable.swap();
        depth_write_enable.swap();
        depth_compare_op.swap();
        depth_bounds_test_enable.swap();
        stencil_test_enable.swap();
        stencil_ops.swap();
        depth_bias_enable.swap();
        rasterizer_discard_enable.swap();
        primitive_restart_enable.swap();
        logic_op.swap();
        patch_control_points.swap();
        depth_bias.swap();
    }

    Ok(ResolvedConfig { config, swapped })
}

impl ResolvedConfig {
    /// Returns whether the static and dynamic values were exchanged.
    #[inline]
    pub fn swapped(&self) -> bool {
        self.swapped
    }

    /// Returns the arranged configuration.
    #[inline]
    pub fn config(&self) -> &TestConfig {
        &self.config
    }

    /// Returns the layout the vertex buffers are filled with. This is also the layout of the
    /// pipeline that gives the expected results.
    #[inline]
    pub fn active_vertex_layout(&self) -> VertexLayout {
        *self.config.vertex_layout.active(self.swapped)
    }

    /// Returns the layout of the pipeline that is expected to be overridden.
    #[inline]
    pub fn inactive_vertex_layout(&self) -> VertexLayout {
        *self.config.vertex_layout.inactive(self.swapped)
    }

    /// Returns the viewports that take effect.
    #[inline]
    pub fn active_viewports(&self) -> &[Viewport] {
        self.config.viewports.active(self.swapped)
    }

    /// Returns the scissors that take effect.
    #[inline]
    pub fn active_scissors(&self) -> &[Scissor] {
        self.config.scissors.active(self.swapped)
    }

    /// Returns the number of patch control points that takes effect.
    #[inline]
    pub fn active_patch_control_points(&self) -> u32 {
        *self.config.patch_control_points.active(self.swapped)
    }

    /// Returns the depth bias parameters that take effect.
    #[inline]
    pub fn active_depth_bias(&self) -> DepthBiasParams {
        *self.config.depth_bias.active(self.swapped)
    }

    /// Returns whether primitive restart is enabled in the draws that count.
    #[inline]
    pub fn active_primitive_restart(&self) -> bool {
        *self.config.primitive_restart_enable.active(self.swapped)
    }

    /// Returns whether more than one viewport is drawn to.
    #[inline]
    pub fn is_multi_viewport(&self) -> bool {
        self.active_viewports().len() > 1
    }

    /// Returns whether the classic pipelines need a geometry shader.
    #[inline]
    pub fn needs_geometry_shader(&self) -> bool {
        (self.is_multi_viewport() && !self.config.use_mesh_shaders)
            || self.config.force_geometry_shader
    }

    /// Returns whether the depth bias that takes effect has a clamp.
    #[inline]
    pub fn needs_depth_bias_clamp(&self) -> bool {
        self.active_depth_bias().clamp != 0.0
    }

    /// Returns the number of viewports that the pipeline drawing last ends up with.
    ///
    /// This is the dynamic count if the viewports are dynamic, and the static count otherwise.
    #[inline]
    pub fn final_viewport_count(&self) -> usize {
        self.config
            .viewports
            .dynamic_value
            .as_ref()
            .map_or(self.config.viewports.static_value.len(), |v| v.len())
    }

    /// Returns the number of scissors that the pipeline drawing last ends up with.
    #[inline]
    pub fn final_scissor_count(&self) -> usize {
        self.config
            .scissors
            .dynamic_value
            .as_ref()
            .map_or(self.config.scissors.static_value.len(), |s| s.len())
    }
}

impl Deref for ResolvedConfig {
    type Target = TestConfig;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::apply_ordering;
    use crate::{
        config::{
            DepthBiasParams, SequenceOrdering, StaticAndDynamicPair, StencilOpParams, TestConfig,
        },
        pipeline::{
            graphics::{
                color_blend::LogicOp,
                depth_stencil::{CompareOp, StencilFaces, StencilOp, StencilOps},
                input_assembly::PrimitiveTopology,
                rasterization::{CullMode, FrontFace},
                vertex_input::VertexLayout,
                viewport::{Scissor, Viewport},
            },
            PipelineConstructionType,
        },
    };
    use smallvec::smallvec;

    /// Returns a configuration with a dynamic value for every pair that can have one alongside
    /// a line topology. Only the patch control points stay static.
    fn all_dynamic_config(ordering: SequenceOrdering) -> TestConfig {
        let mut config = TestConfig::with_vertex_layouts(
            PipelineConstructionType::Monolithic,
            ordering,
            false,
            VertexLayout::Padded,
            Some(VertexLayout::ExtraAttributes),
        );
        let strides = config.strides.static_value.clone();
        let doubled = strides.iter().map(|stride| stride * 2).collect();

        config.cull_mode = StaticAndDynamicPair::with_dynamic(CullMode::Front, CullMode::Back);
        config.front_face =
            StaticAndDynamicPair::with_dynamic(FrontFace::Clockwise, FrontFace::CounterClockwise);
        config.topology = StaticAndDynamicPair::with_dynamic(
            PrimitiveTopology::LineStrip,
            PrimitiveTopology::LineList,
        );
        config.viewports = StaticAndDynamicPair::with_dynamic(
            smallvec![Viewport::new([0.0, 0.0], [32.0, 64.0])],
            smallvec![Viewport::new([32.0, 0.0], [32.0, 64.0])],
        );
        config.scissors = StaticAndDynamicPair::with_dynamic(
            smallvec![Scissor::new([0, 0], [32, 64])],
            smallvec![Scissor::new([32, 0], [32, 64])],
        );
        config.strides = StaticAndDynamicPair::with_dynamic(doubled, strides);
        config.depth_test_enable = StaticAndDynamicPair::with_dynamic(false, true);
        config.depth_write_enable = StaticAndDynamicPair::with_dynamic(true, false);
        config.depth_compare_op =
            StaticAndDynamicPair::with_dynamic(CompareOp::Never, CompareOp::Always);
        config.depth_bounds_test_enable = StaticAndDynamicPair::with_dynamic(true, false);
        config.stencil_test_enable = StaticAndDynamicPair::with_dynamic(false, true);
        config.stencil_ops = StaticAndDynamicPair::with_dynamic(
            smallvec![StencilOpParams::default()],
            smallvec![StencilOpParams {
                faces: StencilFaces::Front,
                ops: StencilOps {
                    pass_op: StencilOp::Zero,
                    ..StencilOps::new()
                },
            }],
        );
        config.depth_bias_enable = StaticAndDynamicPair::with_dynamic(false, true);
        config.rasterizer_discard_enable = StaticAndDynamicPair::with_dynamic(true, false);
        config.primitive_restart_enable = StaticAndDynamicPair::with_dynamic(false, true);
        config.logic_op = StaticAndDynamicPair::with_dynamic(LogicOp::Clear, LogicOp::Or);
        config.depth_bias = StaticAndDynamicPair::with_dynamic(
            DepthBiasParams::NONE,
            DepthBiasParams {
                constant_factor: 2.0,
                clamp: 0.25,
            },
        );

        config
    }

    /// Returns a configuration with only the patch control points dynamic.
    fn patch_config(ordering: SequenceOrdering) -> TestConfig {
        let mut config = TestConfig::new(PipelineConstructionType::Monolithic, ordering, false);
        config.topology = PrimitiveTopology::PatchList.into();
        config.patch_control_points = StaticAndDynamicPair::with_dynamic(4, 3);

        config
    }

    /// Checks that every listed pair of `resolved` holds the values of the same pair of
    /// `original`, exchanged when `swapped` is true.
    macro_rules! assert_pairs {
        ($resolved:expr, $original:expr, $swapped:expr, [$($field:ident),+ $(,)?] $(,)?) => {
            $(
                let pair = &$resolved.$field;
                let before = &$original.$field;

                if $swapped {
                    assert_eq!(
                        Some(&pair.static_value),
                        before.dynamic_value.as_ref(),
                        stringify!($field),
                    );
                    assert_eq!(
                        pair.dynamic_value.as_ref(),
                        Some(&before.static_value),
                        stringify!($field),
                    );
                } else {
                    assert_eq!(pair, before, stringify!($field));
                }
            )+
        };
    }

    #[test]
    fn every_pair_follows_the_ordering() {
        for ordering in SequenceOrdering::ALL {
            let original = all_dynamic_config(ordering);
            let resolved = apply_ordering(original.clone()).unwrap();
            assert_eq!(resolved.swapped(), ordering.is_reversed());

            assert_pairs!(
                resolved,
                original,
                resolved.swapped(),
                [
                    vertex_layout,
                    cull_mode,
                    front_face,
                    topology,
                    viewports,
                    scissors,
                    strides,
                    depth_test_enable,
                    depth_write_enable,
                    depth_compare_op,
                    depth_bounds_test_enable,
                    stencil_test_enable,
                    stencil_ops,
                    depth_bias_enable,
                    rasterizer_discard_enable,
                    primitive_restart_enable,
                    logic_op,
                    depth_bias,
                ],
            );
            // Static only here, so never exchanged.
            assert_eq!(resolved.patch_control_points, original.patch_control_points);

            if !resolved.swapped() {
                assert_eq!(*resolved.config(), original);
            }

            let original = patch_config(ordering);
            let resolved = apply_ordering(original.clone()).unwrap();
            assert_pairs!(
                resolved,
                original,
                resolved.swapped(),
                [patch_control_points]
            );
            assert_eq!(*resolved.patch_control_points.active(resolved.swapped()), 3);
        }
    }

    fn cull_config(ordering: SequenceOrdering) -> TestConfig {
        let mut config = TestConfig::new(PipelineConstructionType::Monolithic, ordering, false);
        config.cull_mode = StaticAndDynamicPair::with_dynamic(CullMode::Front, CullMode::None);
        config
    }

    #[test]
    fn forward_ordering_keeps_pairs() {
        let resolved = apply_ordering(cull_config(SequenceOrdering::BeforeDraw)).unwrap();

        assert!(!resolved.swapped());
        assert_eq!(resolved.cull_mode.static_value, CullMode::Front);
        assert_eq!(
            *resolved.cull_mode.active(resolved.swapped()),
            CullMode::None
        );
    }

    #[test]
    fn reversed_ordering_swaps_pairs() {
        let resolved = apply_ordering(cull_config(SequenceOrdering::TwoDrawsStatic)).unwrap();

        assert!(resolved.swapped());
        assert_eq!(resolved.cull_mode.static_value, CullMode::None);
        assert_eq!(resolved.cull_mode.dynamic_value, Some(CullMode::Front));
        assert_eq!(
            *resolved.cull_mode.active(resolved.swapped()),
            CullMode::None
        );
        assert_eq!(resolved.front_face.dynamic_value, None);
    }

    #[test]
    fn vertex_layouts_follow_the_swap() {
        let config = TestConfig::with_vertex_layouts(
            PipelineConstructionType::Monolithic,
            SequenceOrdering::BeforeGoodStatic,
            false,
            VertexLayout::Padded,
            Some(VertexLayout::ExtraAttributes),
        );
        let resolved = apply_ordering(config).unwrap();

        assert_eq!(
            resolved.active_vertex_layout(),
            VertexLayout::ExtraAttributes
        );
        assert_eq!(resolved.inactive_vertex_layout(), VertexLayout::Padded);
        assert_eq!(
            resolved.vertex_layout.static_value,
            VertexLayout::ExtraAttributes
        );
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let mut config = cull_config(SequenceOrdering::CmdBufferStart);
        config.mesh_params.clear();

        assert!(apply_ordering(config).is_err());
    }
}
