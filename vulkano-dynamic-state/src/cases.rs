// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! The named tree of test cases.
//!
//! [`create_extended_dynamic_state_tests`] builds one group per [`SequenceOrdering`], each
//! holding the same feature areas, and repeats the orderings inside a `mesh_shader` group for
//! mesh shading pipelines. Cases that need a vertex input stage are left out of that group.
//!
//! Names within a group are unique, so the dot-separated path of a case identifies it:
//!
//! ```
//! use vulkano_dynamic_state::{
//!     cases::create_extended_dynamic_state_tests, pipeline::PipelineConstructionType,
//!     software::SoftwareDevice,
//! };
//!
//! let tests = create_extended_dynamic_state_tests(PipelineConstructionType::Monolithic).unwrap();
//! let case = tests.find("cmd_buffer_start.cull_none").unwrap();
//!
//! let mut device = SoftwareDevice::new();
//! assert!(case.run(&mut device).status.is_pass());
//! ```

use crate::{
    config::{
        DepthBiasParams, MeshParams, SequenceOrdering, StaticAndDynamicPair, StencilOpParams,
        TestConfig, DEFAULT_CLEAR_COLOR, DEFAULT_TRIANGLE_COLOR, FRAMEBUFFER_EXTENT,
        GREEN_CLEAR_COLOR, LOGIC_OP_FINAL_COLOR, LOGIC_OP_TRIANGLE_COLOR,
    },
    device::Device,
    image::ClearColorValue,
    instance::{TestInstance, TestOutcome},
    oracle::{stencil_passes, stencil_result},
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
    reference::ReferenceColor,
    DeviceSize, ValidationError,
};
use foldhash::HashSet;
use log::info;
use smallvec::{smallvec, SmallVec};

/// A named test configuration.
#[derive(Clone, Debug)]
pub struct TestCase {
    name: String,
    description: String,
    instance: TestInstance,
}

impl TestCase {
    /// Creates a test case, after checking that `config` is valid.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        config: TestConfig,
    ) -> Result<Self, Box<ValidationError>> {
        let name = name.into();
        let instance = TestInstance::new(config).map_err(|err| err.add_context(name.clone()))?;

        Ok(TestCase {
            name,
            description: description.into(),
            instance,
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the configuration of the case.
    #[inline]
    pub fn config(&self) -> &TestConfig {
        self.instance.config()
    }

    /// Checks support and runs the case on `device`.
    pub fn run(&self, device: &mut (impl Device + ?Sized)) -> TestOutcome {
        let outcome = self.instance.run(device);
        info!("{}: {}", self.name, outcome.status);

        outcome
    }
}

/// A child of a [`TestCaseGroup`].
#[derive(Clone, Debug)]
pub enum TestNode {
    Case(TestCase),
    Group(TestCaseGroup),
}

impl TestNode {
    /// Returns the name of the case or group.
    #[inline]
    pub fn name(&self) -> &str {
        match self {
            TestNode::Case(case) => case.name(),
            TestNode::Group(group) => group.name(),
        }
    }
}

/// A named group of test cases and nested groups.
#[derive(Clone, Debug)]
pub struct TestCaseGroup {
    name: String,
    description: String,
    children: Vec<TestNode>,
    names: HashSet<String>,
}

impl TestCaseGroup {
    /// Creates an empty group.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        TestCaseGroup {
            name: name.into(),
            description: description.into(),
            children: Vec::new(),
            names: HashSet::default(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the children in the order they were added.
    #[inline]
    pub fn children(&self) -> &[TestNode] {
        &self.children
    }

    /// Adds a case to the group.
    ///
    /// Returns an error if the group already has a child with the same name.
    #[inline]
    pub fn add_case(&mut self, case: TestCase) -> Result<(), Box<ValidationError>> {
        self.add_child(TestNode::Case(case))
    }

    /// Adds a nested group.
    ///
    /// Returns an error if the group already has a child with the same name.
    #[inline]
    pub fn add_group(&mut self, group: TestCaseGroup) -> Result<(), Box<ValidationError>> {
        self.add_child(TestNode::Group(group))
    }

    fn add_child(&mut self, child: TestNode) -> Result<(), Box<ValidationError>> {
        if !self.names.insert(child.name().to_owned()) {
            return Err(ValidationError::new(
                self.name.clone(),
                format!("a child named `{}` already exists", child.name()),
            ));
        }

        self.children.push(child);

        Ok(())
    }

    /// Returns the number of cases in the group and all nested groups.
    pub fn case_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| match child {
                TestNode::Case(_) => 1,
                TestNode::Group(group) => group.case_count(),
            })
            .sum()
    }

    /// Returns every case of the group and of nested groups, depth first, with its path relative
    /// to this group.
    pub fn cases(&self) -> Vec<(String, &TestCase)> {
        let mut cases = Vec::with_capacity(self.case_count());
        self.collect_cases("", &mut cases);

        cases
    }

    fn collect_cases<'a>(&'a self, prefix: &str, cases: &mut Vec<(String, &'a TestCase)>) {
        for child in &self.children {
            let path = if prefix.is_empty() {
                child.name().to_owned()
            } else {
                format!("{}.{}", prefix, child.name())
            };

            match child {
                TestNode::Case(case) => cases.push((path, case)),
                TestNode::Group(group) => group.collect_cases(&path, cases),
            }
        }
    }

    /// Looks up a case by its dot-separated path relative to this group.
    pub fn find(&self, path: &str) -> Option<&TestCase> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };

        self.children
            .iter()
            .find(|child| child.name() == head)
            .and_then(|child| match (child, rest) {
                (TestNode::Case(case), None) => Some(case),
                (TestNode::Group(group), Some(rest)) => group.find(rest),
                _ => None,
            })
    }
}

const HALF_WIDTH: u32 = FRAMEBUFFER_EXTENT[0] / 2;
const HEIGHT: u32 = FRAMEBUFFER_EXTENT[1];

const ALTERNATIVE_COLOR: [f32; 4] = [0.0, 0.0, 0.5, 1.0];

const ALTERNATIVE_DEPTH_BIAS: DepthBiasParams = DepthBiasParams {
    constant_factor: 2e7,
    clamp: 0.25,
};

const STENCIL_MIN: u8 = u8::MIN;
const STENCIL_MAX: u8 = u8::MAX;
const STENCIL_MID: u8 = (STENCIL_MAX as u32 * 2 / 5) as u8;

/// Creates the whole tree of extended dynamic state tests for pipelines built with
/// `construction_type`.
///
/// Returns an error if a generated configuration is invalid or if two cases of a group share a
/// name. Either one is a bug in the enumeration.
pub fn create_extended_dynamic_state_tests(
    construction_type: PipelineConstructionType,
) -> Result<TestCaseGroup, Box<ValidationError>> {
    let mut root = TestCaseGroup::new(
        "extended_dynamic_state",
        "Tests for VK_EXT_extended_dynamic_state",
    );
    let mut mesh_shader = TestCaseGroup::new(
        "mesh_shader",
        "Extended dynamic state with mesh shading pipelines",
    );

    for use_mesh_shaders in [false, true] {
        for ordering in SequenceOrdering::ALL {
            let mut builder = OrderingGroupBuilder {
                construction_type,
                ordering,
                use_mesh_shaders,
                group: TestCaseGroup::new(ordering.name(), ordering.description()),
            };
            builder.add_all()?;

            if use_mesh_shaders {
                mesh_shader.add_group(builder.group)?;
            } else {
                root.add_group(builder.group)?;
            }
        }
    }

    root.add_group(mesh_shader)?;

    Ok(root)
}

struct BindUnusedCase {
    bind_unused_mesh_shading_pipeline: bool,
    name_suffix: &'static str,
    description_suffix: &'static str,
}

static BIND_UNUSED_CASES: [BindUnusedCase; 2] = [
    BindUnusedCase {
        bind_unused_mesh_shading_pipeline: false,
        name_suffix: "",
        description_suffix: "",
    },
    BindUnusedCase {
        bind_unused_mesh_shading_pipeline: true,
        name_suffix: "_bind_unused_ms",
        description_suffix: " and bind unused mesh shading pipeline before the dynamic one",
    },
];

/// Returns the bind-unused variants that apply to `ordering`.
fn bind_unused_cases(ordering: SequenceOrdering) -> impl Iterator<Item = &'static BindUnusedCase> {
    BIND_UNUSED_CASES.iter().filter(move |case| {
        !case.bind_unused_mesh_shading_pipeline || ordering == SequenceOrdering::CmdBufferStart
    })
}

#[derive(Clone, Copy)]
enum StencilFaceCase {
    Single(StencilFaces),

    /// Both faces, set by two separate commands.
    Dual,
}

struct StencilOpCase {
    op: StencilOp,
    clear_values: &'static [u8],

    /// An operation that gives a different result for the clear values.
    incompatible_op: StencilOp,
}

const STENCIL_OP_CASES: [StencilOpCase; 8] = [
    StencilOpCase {
        op: StencilOp::Keep,
        clear_values: &[STENCIL_MID],
        incompatible_op: StencilOp::Zero,
    },
    StencilOpCase {
        op: StencilOp::Zero,
        clear_values: &[STENCIL_MID],
        incompatible_op: StencilOp::Keep,
    },
    StencilOpCase {
        op: StencilOp::Replace,
        clear_values: &[STENCIL_MID],
        incompatible_op: StencilOp::Zero,
    },
    StencilOpCase {
        op: StencilOp::IncrementAndClamp,
        clear_values: &[STENCIL_MAX - 1, STENCIL_MAX],
        incompatible_op: StencilOp::Zero,
    },
    StencilOpCase {
        op: StencilOp::DecrementAndClamp,
        clear_values: &[STENCIL_MIN + 1, STENCIL_MIN],
        incompatible_op: StencilOp::IncrementAndClamp,
    },
    StencilOpCase {
        op: StencilOp::Invert,
        clear_values: &[STENCIL_MID],
        incompatible_op: StencilOp::Zero,
    },
    StencilOpCase {
        op: StencilOp::IncrementAndWrap,
        clear_values: &[STENCIL_MAX - 1, STENCIL_MAX],
        incompatible_op: StencilOp::Keep,
    },
    StencilOpCase {
        op: StencilOp::DecrementAndWrap,
        clear_values: &[STENCIL_MIN + 1, STENCIL_MIN],
        incompatible_op: StencilOp::Keep,
    },
];

/// Short names of the stencil compare operations.
fn stencil_compare_name(compare_op: CompareOp) -> &'static str {
    match compare_op {
        CompareOp::Never => "xf",
        CompareOp::Less => "lt",
        CompareOp::Equal => "eq",
        CompareOp::LessOrEqual => "le",
        CompareOp::Greater => "gt",
        CompareOp::GreaterOrEqual => "ge",
        CompareOp::Always => "xt",
        CompareOp::NotEqual => "ne",
    }
}

fn half_viewports() -> SmallVec<[Viewport; 2]> {
    let half_width = HALF_WIDTH as f32;
    let height = HEIGHT as f32;

    smallvec![
        Viewport::new([0.0, 0.0], [half_width, height]),
        Viewport::new([half_width, 0.0], [half_width, height]),
    ]
}

fn half_scissors() -> SmallVec<[Scissor; 2]> {
    smallvec![
        Scissor::new([0, 0], [HALF_WIDTH, HEIGHT]),
        Scissor::new([HALF_WIDTH, 0], [HALF_WIDTH, HEIGHT]),
    ]
}

fn reversed<T: Clone>(values: &[T]) -> SmallVec<[T; 2]> {
    values.iter().rev().cloned().collect()
}

fn clear_color_reference() -> ReferenceColor {
    ReferenceColor::SingleColor(ClearColorValue::Float(DEFAULT_CLEAR_COLOR))
}

fn single_color_reference(color: [f32; 4]) -> ReferenceColor {
    ReferenceColor::SingleColor(ClearColorValue::Float(color))
}

/// Confines the first mesh to the top half, leaving the bottom half with the clear color.
fn cover_top_half(config: &mut TestConfig) {
    config.reference_color = ReferenceColor::HorizontalSplit {
        top: DEFAULT_TRIANGLE_COLOR,
        bottom: DEFAULT_CLEAR_COLOR,
    };
    config.mesh_params[0].scale_y = 0.5;
    config.mesh_params[0].offset_y = -0.5;
}

struct OrderingGroupBuilder {
    construction_type: PipelineConstructionType,
    ordering: SequenceOrdering,
    use_mesh_shaders: bool,
    group: TestCaseGroup,
}

impl OrderingGroupBuilder {
    fn config(&self) -> TestConfig {
        TestConfig::new(self.construction_type, self.ordering, self.use_mesh_shaders)
    }

    fn config_with_layouts(
        &self,
        static_layout: VertexLayout,
        dynamic_layout: Option<VertexLayout>,
    ) -> TestConfig {
        TestConfig::with_vertex_layouts(
            self.construction_type,
            self.ordering,
            self.use_mesh_shaders,
            static_layout,
            dynamic_layout,
        )
    }

    fn add(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        config: TestConfig,
    ) -> Result<(), Box<ValidationError>> {
        self.group.add_case(TestCase::new(name, description, config)?)
    }

    fn add_all(&mut self) -> Result<(), Box<ValidationError>> {
        self.add_cull_mode_cases()?;
        self.add_front_face_cases()?;
        self.add_rasterizer_discard_cases()?;
        self.add_logic_op_cases()?;

        if !self.use_mesh_shaders {
            self.add_primitive_restart_cases()?;
            self.add_patch_control_points_cases()?;
            self.add_topology_cases()?;
        }

        self.add_viewport_cases()?;
        self.add_scissor_cases()?;

        if !self.use_mesh_shaders {
            self.add_stride_cases()?;
        }

        self.add_depth_test_cases()?;
        self.add_depth_write_cases()?;
        self.add_depth_bias_cases()?;
        self.add_depth_compare_cases()?;
        self.add_depth_bounds_cases()?;
        self.add_stencil_test_cases()?;
        self.add_stencil_op_cases()?;

        if !self.use_mesh_shaders {
            self.add_vertex_input_cases()?;
        }

        Ok(())
    }

    fn add_cull_mode_cases(&mut self) -> Result<(), Box<ValidationError>> {
        let mut config = self.config();
        config.cull_mode = StaticAndDynamicPair::with_dynamic(CullMode::Front, CullMode::None);
        self.add("cull_none", "Dynamically set cull mode to none", config)?;

        let mut config = self.config();
        config.cull_mode =
            StaticAndDynamicPair::with_dynamic(CullMode::FrontAndBack, CullMode::Back);
        self.add("cull_back", "Dynamically set cull mode to back", config)?;

        let mut config = self.config();
        config.mesh_params[0].reversed = true;
        config.cull_mode = StaticAndDynamicPair::with_dynamic(CullMode::Back, CullMode::Front);
        self.add("cull_front", "Dynamically set cull mode to front", config)?;

        let mut config = self.config();
        config.cull_mode =
            StaticAndDynamicPair::with_dynamic(CullMode::None, CullMode::FrontAndBack);
        config.reference_color = clear_color_reference();
        self.add(
            "cull_front_and_back",
            "Dynamically set cull mode to front and back",
            config,
        )
    }

    fn add_front_face_cases(&mut self) -> Result<(), Box<ValidationError>> {
        let cases = [
            (
                "front_face_cw",
                "Dynamically set front face to clockwise",
                false,
                FrontFace::Clockwise,
                FrontFace::CounterClockwise,
                false,
            ),
            (
                "front_face_ccw",
                "Dynamically set front face to counter-clockwise",
                true,
                FrontFace::CounterClockwise,
                FrontFace::Clockwise,
                false,
            ),
            (
                "front_face_cw_reversed",
                "Dynamically set front face to clockwise with a counter-clockwise mesh",
                false,
                FrontFace::CounterClockwise,
                FrontFace::Clockwise,
                true,
            ),
            (
                "front_face_ccw_reversed",
                "Dynamically set front face to counter-clockwise with a clockwise mesh",
                true,
                FrontFace::Clockwise,
                FrontFace::CounterClockwise,
                true,
            ),
        ];

        for (name, description, reversed_mesh, static_value, dynamic_value, culled) in cases {
            let mut config = self.config();
            config.mesh_params[0].reversed = reversed_mesh;
            config.cull_mode = CullMode::Back.into();
            config.front_face = StaticAndDynamicPair::with_dynamic(static_value, dynamic_value);

            if culled {
                config.reference_color = clear_color_reference();
            }

            self.add(name, description, config)?;
        }

        Ok(())
    }

    fn add_rasterizer_discard_cases(&mut self) -> Result<(), Box<ValidationError>> {
        let mut config = self.config();
        config.rasterizer_discard_enable = StaticAndDynamicPair::with_dynamic(false, true);
        config.reference_color = clear_color_reference();
        self.add("disable_raster", "Dynamically disable rasterizer", config)?;

        let mut config = self.config();
        config.rasterizer_discard_enable = StaticAndDynamicPair::with_dynamic(true, false);
        self.add("enable_raster", "Dynamically enable rasterizer", config)
    }

    fn add_logic_op_cases(&mut self) -> Result<(), Box<ValidationError>> {
        // Green cleared, blue drawn, cyan expected.
        let mut config = self.config();
        config.logic_op = StaticAndDynamicPair::with_dynamic(LogicOp::Clear, LogicOp::Or);
        config.mesh_params[0].color = LOGIC_OP_TRIANGLE_COLOR;
        config.clear_color = ClearColorValue::Uint(GREEN_CLEAR_COLOR);
        config.reference_color =
            ReferenceColor::SingleColor(ClearColorValue::Uint(LOGIC_OP_FINAL_COLOR));
        self.add(
            "logic_op_or",
            "Dynamically change logic op to VK_LOGIC_OP_OR",
            config,
        )
    }

    fn add_primitive_restart_cases(&mut self) -> Result<(), Box<ValidationError>> {
        for bind_unused in bind_unused_cases(self.ordering) {
            for static_value in [false, true] {
                for dynamic_value in [false, true] {
                    let action = if dynamic_value { "enable" } else { "disable" };
                    let (name_action, description_action) = if static_value == dynamic_value {
                        (
                            format!("{}_on_both", action),
                            format!("{} (statically and dynamically)", action),
                        )
                    } else {
                        (action.to_owned(), action.to_owned())
                    };

                    let mut config = self.config();
                    config.primitive_restart_enable =
                        StaticAndDynamicPair::with_dynamic(static_value, dynamic_value);
                    config.topology = PrimitiveTopology::LineStrip.into();
                    config.bind_unused_mesh_shading_pipeline =
                        bind_unused.bind_unused_mesh_shading_pipeline;
                    config.reference_color = if dynamic_value {
                        ReferenceColor::LastSegmentMissing {
                            geometry: DEFAULT_TRIANGLE_COLOR,
                            clear: DEFAULT_CLEAR_COLOR,
                        }
                    } else {
                        single_color_reference(DEFAULT_TRIANGLE_COLOR)
                    };

                    self.add(
                        format!("prim_restart_{}{}", name_action, bind_unused.name_suffix),
                        format!(
                            "Dynamically {} primitiveRestart{}",
                            description_action, bind_unused.description_suffix,
                        ),
                        config,
                    )?;
                }
            }
        }

        Ok(())
    }

    fn patch_config(&self) -> TestConfig {
        let mut config = self.config();
        config.topology = PrimitiveTopology::PatchList.into();
        config.patch_control_points = StaticAndDynamicPair::with_dynamic(1, 3);

        config
    }

    fn add_patch_control_points_cases(&mut self) -> Result<(), Box<ValidationError>> {
        for bind_unused in bind_unused_cases(self.ordering) {
            let mut config = self.patch_config();
            config.bind_unused_mesh_shading_pipeline =
                bind_unused.bind_unused_mesh_shading_pipeline;
            self.add(
                format!("patch_control_points{}", bind_unused.name_suffix),
                format!(
                    "Dynamically change patch control points{}",
                    bind_unused.description_suffix,
                ),
                config,
            )?;
        }

        let mut config = self.patch_config();
        config.use_extra_dynamic_pcp_pipeline = true;
        self.add(
            "patch_control_points_extra_pipeline",
            "Dynamically change patch control points and draw first with a pipeline using the \
            state and no tessellation shaders",
            config,
        )
    }

    fn add_topology_cases(&mut self) -> Result<(), Box<ValidationError>> {
        let topologies = [
            (
                PrimitiveTopology::TriangleList,
                PrimitiveTopology::TriangleStrip,
            ),
            (PrimitiveTopology::LineList, PrimitiveTopology::LineStrip),
            (PrimitiveTopology::PatchList, PrimitiveTopology::PatchList),
        ];

        for force_geometry_shader in [false, true] {
            for (static_value, dynamic_value) in topologies {
                for bind_unused in bind_unused_cases(self.ordering) {
                    let mut config = self.config();
                    config.force_geometry_shader = force_geometry_shader;
                    config.topology =
                        StaticAndDynamicPair::with_dynamic(static_value, dynamic_value);
                    let patch_control_points: u32 = if config.needs_tessellation() { 3 } else { 1 };
                    config.patch_control_points = patch_control_points.into();
                    config.bind_unused_mesh_shading_pipeline =
                        bind_unused.bind_unused_mesh_shading_pipeline;

                    let class_name = static_value.class().name();
                    let (geom_name, geom_description) = if force_geometry_shader {
                        ("_geom", " and use a geometry shader")
                    } else {
                        ("", "")
                    };

                    self.add(
                        format!(
                            "topology_{}{}{}",
                            class_name, geom_name, bind_unused.name_suffix,
                        ),
                        format!(
                            "Dynamically switch primitive topologies from the {} class{}{}",
                            class_name, geom_description, bind_unused.description_suffix,
                        ),
                        config,
                    )?;
                }
            }
        }

        Ok(())
    }

    fn add_viewport_cases(&mut self) -> Result<(), Box<ValidationError>> {
        let full_width = FRAMEBUFFER_EXTENT[0] as f32;
        let half_width = HALF_WIDTH as f32;
        let height = HEIGHT as f32;

        // Two scissors and a single static viewport that only covers the left half.
        let mut config = self.config();
        config.scissors = StaticAndDynamicPair::new(half_scissors());
        config.viewports = StaticAndDynamicPair::with_dynamic(
            smallvec![Viewport::new([0.0, 0.0], [half_width, height])],
            half_viewports(),
        );
        self.add("2_viewports", "Dynamically set 2 viewports", config)?;

        let mut config = self.config();
        config.viewports = StaticAndDynamicPair::with_dynamic(
            smallvec![Viewport::new([0.0, 0.0], [half_width, height])],
            smallvec![Viewport::new([0.0, 0.0], [full_width, height])],
        );
        self.add(
            "1_full_viewport",
            "Dynamically set viewport to cover full framebuffer",
            config,
        )?;

        // The static viewports are swapped with respect to the scissors.
        let static_viewports = reversed(&half_viewports());
        let mut config = self.config();
        config.scissors = StaticAndDynamicPair::new(half_scissors());
        config.viewports = StaticAndDynamicPair::with_dynamic(
            static_viewports.clone(),
            reversed(&static_viewports),
        );
        self.add(
            "2_viewports_switch",
            "Dynamically switch the order with 2 viewports",
            config,
        )?;

        // Swapping the viewports makes every mesh fall outside of its scissor.
        let mut config = self.config();
        config.scissors = StaticAndDynamicPair::new(half_scissors());
        config.viewports =
            StaticAndDynamicPair::with_dynamic(half_viewports(), reversed(&half_viewports()));
        config.reference_color = clear_color_reference();
        self.add(
            "2_viewports_switch_clean",
            "Dynamically switch the order with 2 viewports resulting in clean image",
            config,
        )
    }

    fn add_scissor_cases(&mut self) -> Result<(), Box<ValidationError>> {
        let right_half = Scissor::new([HALF_WIDTH, 0], [HALF_WIDTH, HEIGHT]);

        let mut config = self.config();
        config.viewports = StaticAndDynamicPair::new(half_viewports());
        config.scissors =
            StaticAndDynamicPair::with_dynamic(smallvec![right_half], half_scissors());
        self.add("2_scissors", "Dynamically set 2 scissors", config)?;

        let mut config = self.config();
        config.scissors = StaticAndDynamicPair::with_dynamic(
            smallvec![right_half],
            smallvec![Scissor::new([0, 0], FRAMEBUFFER_EXTENT)],
        );
        self.add(
            "1_full_scissor",
            "Dynamically set scissor to cover full framebuffer",
            config,
        )?;

        let static_scissors = reversed(&half_scissors());
        let mut config = self.config();
        config.viewports = StaticAndDynamicPair::new(half_viewports());
        config.scissors = StaticAndDynamicPair::with_dynamic(
            static_scissors.clone(),
            reversed(&static_scissors),
        );
        self.add(
            "2_scissors_switch",
            "Dynamically switch the order with 2 scissors",
            config,
        )?;

        let mut config = self.config();
        config.viewports = StaticAndDynamicPair::new(half_viewports());
        config.scissors =
            StaticAndDynamicPair::with_dynamic(half_scissors(), reversed(&half_scissors()));
        config.reference_color = clear_color_reference();
        self.add(
            "2_scissors_switch_clean",
            "Dynamically switch the order with 2 scissors to avoid drawing",
            config,
        )
    }

    fn add_stride_cases(&mut self) -> Result<(), Box<ValidationError>> {
        for (layout, prefix) in [
            (VertexLayout::Padded, "stride"),
            (VertexLayout::ExtraAttributes, "large_stride"),
        ] {
            // Half of the large stride is shorter than the binding's attributes, which is not
            // allowed for the dynamic pipeline that draws first.
            if layout == VertexLayout::ExtraAttributes
                && self.ordering == SequenceOrdering::TwoDrawsStatic
            {
                continue;
            }

            let strides = layout.vertex_data_strides();
            let half_strides: SmallVec<[DeviceSize; 6]> =
                strides.iter().map(|stride| stride / 2).collect();

            let base = self.config_with_layouts(layout, None);

            for bind_unused in bind_unused_cases(self.ordering) {
                let stride_config = || {
                    let mut config = base.clone();
                    config.strides =
                        StaticAndDynamicPair::with_dynamic(half_strides.clone(), strides.clone());
                    config.bind_unused_mesh_shading_pipeline =
                        bind_unused.bind_unused_mesh_shading_pipeline;
                    config
                };

                let config = stride_config();
                self.add(
                    format!("{}{}", prefix, bind_unused.name_suffix),
                    format!("Dynamically set stride{}", bind_unused.description_suffix),
                    config,
                )?;

                let mut config = stride_config();
                config.vertex_data_offset = strides[0];
                self.add(
                    format!("{}_with_offset{}", prefix, bind_unused.name_suffix),
                    format!(
                        "Dynamically set stride using a nonzero vertex data offset{}",
                        bind_unused.description_suffix,
                    ),
                    config,
                )?;

                // Reading past the vertex data would draw to the bottom half.
                let mut config = stride_config();
                config.vertex_data_offset = strides[0];
                config.vertex_data_extra_bytes = strides[0];
                cover_top_half(&mut config);
                self.add(
                    format!(
                        "{}_with_offset_and_padding{}",
                        prefix, bind_unused.name_suffix
                    ),
                    format!(
                        "Dynamically set stride using a nonzero vertex data offset and extra \
                        bytes{}",
                        bind_unused.description_suffix,
                    ),
                    config,
                )?;
            }
        }

        // A nonzero stride would read out of bounds when drawing more than one vertex.
        if !matches!(
            self.ordering,
            SequenceOrdering::TwoDrawsStatic | SequenceOrdering::TwoDrawsDynamic
        ) {
            let mut config = self.config_with_layouts(VertexLayout::ExtraAttributes, None);
            config.strides = StaticAndDynamicPair::with_dynamic(
                VertexLayout::ExtraAttributes.vertex_data_strides(),
                smallvec![0],
            );
            config.vertex_data_offset = 4;
            config.single_vertex = true;
            config.single_vertex_draw_count = 6;
            cover_top_half(&mut config);
            // The strip is synthesized from the vertex index.
            config.mesh_params[0].strip_scale = 1.0;
            self.add(
                "zero_stride_with_offset",
                "Dynamically set zero stride using a nonzero vertex data offset",
                config,
            )?;
        }

        Ok(())
    }

    fn add_depth_test_cases(&mut self) -> Result<(), Box<ValidationError>> {
        // The default compare op never passes.
        let mut config = self.config();
        config.depth_test_enable = StaticAndDynamicPair::with_dynamic(false, true);
        config.reference_color = clear_color_reference();
        self.add("depth_test_enable", "Dynamically enable depth test", config)?;

        let mut config = self.config();
        config.depth_test_enable = StaticAndDynamicPair::with_dynamic(true, false);
        self.add(
            "depth_test_disable",
            "Dynamically disable depth test",
            config,
        )
    }

    fn add_depth_write_cases(&mut self) -> Result<(), Box<ValidationError>> {
        let base = self.config();
        let passing_depth_config = || {
            let mut config = base.clone();
            config.depth_test_enable = true.into();
            config.depth_compare_op = CompareOp::Less.into();
            config.clear_depth = 0.5;
            config.mesh_params[0].depth = 0.25;
            config
        };

        let mut config = passing_depth_config();
        config.depth_write_enable = StaticAndDynamicPair::with_dynamic(false, true);
        config.expected_depth = 0.25;
        self.add(
            "depth_write_enable",
            "Dynamically enable writes to the depth buffer",
            config,
        )?;

        let mut config = passing_depth_config();
        config.depth_write_enable = StaticAndDynamicPair::with_dynamic(true, false);
        config.expected_depth = 0.5;
        self.add(
            "depth_write_disable",
            "Dynamically disable writes to the depth buffer",
            config,
        )
    }

    fn add_depth_bias_cases(&mut self) -> Result<(), Box<ValidationError>> {
        for dynamic_bias in [false, true] {
            let (name_suffix, description_suffix) = if dynamic_bias {
                (
                    "_dynamic_bias_params",
                    " and set the bias params dynamically",
                )
            } else {
                ("", "")
            };

            // The bias pushes 0.5 up to the clamp at 0.75.
            let base = self.config();
            let bias_config = || {
                let mut config = base.clone();
                config.depth_test_enable = true.into();
                config.depth_write_enable = true.into();
                config.depth_compare_op = CompareOp::Always.into();
                config.clear_depth = 0.25;
                config.mesh_params[0].depth = 0.5;
                config.depth_bias = if dynamic_bias {
                    StaticAndDynamicPair::with_dynamic(
                        DepthBiasParams::NONE,
                        ALTERNATIVE_DEPTH_BIAS,
                    )
                } else {
                    ALTERNATIVE_DEPTH_BIAS.into()
                };
                config
            };

            let mut config = bias_config();
            config.depth_bias_enable = StaticAndDynamicPair::with_dynamic(false, true);
            config.expected_depth = 0.75;
            self.add(
                format!("depth_bias_enable{}", name_suffix),
                format!("Dynamically enable the depth bias{}", description_suffix),
                config,
            )?;

            let mut config = bias_config();
            config.depth_bias_enable = StaticAndDynamicPair::with_dynamic(true, false);
            config.expected_depth = 0.5;
            self.add(
                format!("depth_bias_disable{}", name_suffix),
                format!("Dynamically disable the depth bias{}", description_suffix),
                config,
            )?;
        }

        Ok(())
    }

    fn add_depth_compare_cases(&mut self) -> Result<(), Box<ValidationError>> {
        let mut base = self.config();
        base.depth_test_enable = true.into();
        base.depth_write_enable = true.into();
        base.depth_compare_op = CompareOp::Never.into();
        base.clear_depth = 0.5;

        let compare_config = |dynamic_op: CompareOp, depth: f32, expected_depth: f32| {
            let mut config = base.clone();
            config.depth_compare_op =
                StaticAndDynamicPair::with_dynamic(CompareOp::Never, dynamic_op);
            config.mesh_params[0].depth = depth;
            config.expected_depth = expected_depth;
            config
        };

        let mut config = compare_config(CompareOp::Never, 0.25, 0.5);
        config.depth_compare_op.static_value = CompareOp::Always;
        config.reference_color = clear_color_reference();
        self.add(
            "depth_compare_never",
            "Dynamically set the depth compare operator to NEVER",
            config,
        )?;

        let config = compare_config(CompareOp::Less, 0.25, 0.25);
        self.add(
            "depth_compare_less",
            "Dynamically set the depth compare operator to LESS",
            config,
        )?;

        let config = compare_config(CompareOp::Greater, 0.75, 0.75);
        self.add(
            "depth_compare_greater",
            "Dynamically set the depth compare operator to GREATER",
            config,
        )?;

        // A second mesh in front must not pass the equality test.
        let mut config = compare_config(CompareOp::Equal, 0.5, 0.5);
        config.mesh_params[0].color = ALTERNATIVE_COLOR;
        config
            .mesh_params
            .push(MeshParams::new(DEFAULT_TRIANGLE_COLOR, 0.25));
        config.reference_color = single_color_reference(ALTERNATIVE_COLOR);
        self.add(
            "depth_compare_equal",
            "Dynamically set the depth compare operator to EQUAL",
            config,
        )?;

        let config = compare_config(CompareOp::LessOrEqual, 0.25, 0.25);
        self.add(
            "depth_compare_less_equal_less",
            "Dynamically set the depth compare operator to LESS_OR_EQUAL and draw with smaller \
            depth",
            config,
        )?;

        let config = compare_config(CompareOp::LessOrEqual, 0.5, 0.5);
        self.add(
            "depth_compare_less_equal_equal",
            "Dynamically set the depth compare operator to LESS_OR_EQUAL and draw with equal \
            depth",
            config,
        )?;

        let mut config = compare_config(CompareOp::LessOrEqual, 0.25, 0.25);
        config
            .mesh_params
            .push(MeshParams::new(ALTERNATIVE_COLOR, 0.25));
        config.reference_color = single_color_reference(ALTERNATIVE_COLOR);
        self.add(
            "depth_compare_less_equal_less_then_equal",
            "Dynamically set the depth compare operator to LESS_OR_EQUAL and draw two meshes \
            with less and equal depth",
            config,
        )?;

        let config = compare_config(CompareOp::GreaterOrEqual, 0.75, 0.75);
        self.add(
            "depth_compare_greater_equal_greater",
            "Dynamically set the depth compare operator to GREATER_OR_EQUAL and draw with \
            greater depth",
            config,
        )?;

        let config = compare_config(CompareOp::GreaterOrEqual, 0.5, 0.5);
        self.add(
            "depth_compare_greater_equal_equal",
            "Dynamically set the depth compare operator to GREATER_OR_EQUAL and draw with equal \
            depth",
            config,
        )?;

        let mut config = compare_config(CompareOp::GreaterOrEqual, 0.75, 0.75);
        config
            .mesh_params
            .push(MeshParams::new(ALTERNATIVE_COLOR, 0.75));
        config.reference_color = single_color_reference(ALTERNATIVE_COLOR);
        self.add(
            "depth_compare_greater_equal_greater_then_equal",
            "Dynamically set the depth compare operator to GREATER_OR_EQUAL and draw two meshes \
            with greater and equal depth",
            config,
        )?;

        // The first mesh passes in front, the second one behind it passes too, and the last one
        // at the same depth does not.
        let mut config = compare_config(CompareOp::NotEqual, 0.25, 0.5);
        config
            .mesh_params
            .push(MeshParams::new(ALTERNATIVE_COLOR, 0.5));
        config
            .mesh_params
            .push(MeshParams::new(DEFAULT_TRIANGLE_COLOR, 0.5));
        config.reference_color = single_color_reference(ALTERNATIVE_COLOR);
        self.add(
            "depth_compare_not_equal",
            "Dynamically set the depth compare operator to NOT_EQUAL",
            config,
        )?;

        for (name, relation, depth) in [
            ("depth_compare_always_equal", "equal", 0.5),
            ("depth_compare_always_less", "less", 0.25),
            ("depth_compare_always_greater", "greater", 0.75),
        ] {
            let config = compare_config(CompareOp::Always, depth, depth);
            self.add(
                name,
                format!(
                    "Dynamically set the depth compare operator to ALWAYS and draw with {} depth",
                    relation,
                ),
                config,
            )?;
        }

        Ok(())
    }

    fn add_depth_bounds_cases(&mut self) -> Result<(), Box<ValidationError>> {
        let base = self.config();
        let bounds_config = || {
            let mut config = base.clone();
            config.depth_bounds = 0.25..=0.75;
            config.mesh_params[0].depth = 0.0;
            config
        };

        let mut config = bounds_config();
        config.depth_bounds_test_enable = StaticAndDynamicPair::with_dynamic(false, true);
        config.reference_color = clear_color_reference();
        self.add(
            "depth_bounds_test_enable",
            "Dynamically enable the depth bounds test",
            config,
        )?;

        let mut config = bounds_config();
        config.depth_bounds_test_enable = StaticAndDynamicPair::with_dynamic(true, false);
        self.add(
            "depth_bounds_test_disable",
            "Dynamically disable the depth bounds test",
            config,
        )
    }

    fn add_stencil_test_cases(&mut self) -> Result<(), Box<ValidationError>> {
        let base = self.config();
        let never_passing_config = |static_value: bool, dynamic_value: bool| {
            let mut config = base.clone();
            config.stencil_test_enable =
                StaticAndDynamicPair::with_dynamic(static_value, dynamic_value);
            config.stencil_ops.static_value[0].ops.compare_op = CompareOp::Never;
            config
        };

        let mut config = never_passing_config(false, true);
        config.reference_color = clear_color_reference();
        self.add(
            "stencil_test_enable",
            "Dynamically enable the stencil test",
            config,
        )?;

        let config = never_passing_config(true, false);
        self.add(
            "stencil_test_disable",
            "Dynamically disable the stencil test",
            config,
        )
    }

    fn add_stencil_op_cases(&mut self) -> Result<(), Box<ValidationError>> {
        let faces = [
            (StencilFaceCase::Single(StencilFaces::Front), "face_front"),
            (StencilFaceCase::Single(StencilFaces::Back), "face_back"),
            (
                StencilFaceCase::Single(StencilFaces::FrontAndBack),
                "face_both_single",
            ),
            (StencilFaceCase::Dual, "face_both_dual"),
        ];
        let compare_ops = [
            CompareOp::Never,
            CompareOp::Less,
            CompareOp::Equal,
            CompareOp::LessOrEqual,
            CompareOp::Greater,
            CompareOp::GreaterOrEqual,
            CompareOp::Always,
        ];

        for (face, face_name) in faces {
            for compare_op in compare_ops {
                for op_case in &STENCIL_OP_CASES {
                    for &clear_value in op_case.clear_values {
                        for delta in -1..=1 {
                            let Ok(reference) = u8::try_from(i32::from(clear_value) + delta)
                            else {
                                continue;
                            };

                            let would_pass = stencil_passes(compare_op, clear_value, reference);
                            let depth_fail_variants: &[bool] =
                                if would_pass { &[false, true] } else { &[false] };

                            for &depth_fail in depth_fail_variants {
                                let config = self.stencil_op_config(
                                    face,
                                    compare_op,
                                    op_case,
                                    clear_value,
                                    reference,
                                    would_pass,
                                    depth_fail,
                                );

                                let outcome = match (would_pass, depth_fail) {
                                    (false, _) => "fail",
                                    (true, false) => "pass",
                                    (true, true) => "depthfail",
                                };
                                let name = format!(
                                    "stencil_state_{}_{}_{}_clear_{}_ref_{}_{}",
                                    face_name,
                                    stencil_compare_name(compare_op),
                                    op_case.op.name(),
                                    clear_value,
                                    reference,
                                    outcome,
                                );
                                let description =
                                    format!("Dynamically configure stencil test, variant {}", name);

                                self.add(name, description, config)?;
                            }
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Returns a configuration where only the dynamic operation for the path taken by the
    /// fragments gives the expected stencil value. Every other operation, static or dynamic, is
    /// incompatible with it.
    fn stencil_op_config(
        &self,
        face: StencilFaceCase,
        compare_op: CompareOp,
        op_case: &StencilOpCase,
        clear_value: u8,
        reference: u8,
        would_pass: bool,
        depth_fail: bool,
    ) -> TestConfig {
        let global_pass = would_pass && !depth_fail;
        let mut config = self.config();

        // Without culling, the winding of the mesh selects the face whose operations apply.
        match face {
            StencilFaceCase::Single(StencilFaces::Front) => {}
            StencilFaceCase::Single(StencilFaces::Back) => {
                config.mesh_params[0].reversed = true;
            }
            _ => {
                // A front-facing mesh in the top half and a back-facing one in the bottom half.
                let mut top = config.mesh_params[0];
                top.scale_y = 0.5;
                top.offset_y = -0.5;

                let mut bottom = top;
                bottom.reversed = true;
                bottom.offset_y = 0.5;

                config.mesh_params = smallvec![top, bottom];
            }
        }

        config.stencil_test_enable = true.into();

        let incompatible = op_case.incompatible_op;
        let mut dynamic_ops = StencilOps {
            fail_op: incompatible,
            pass_op: incompatible,
            depth_fail_op: incompatible,
            compare_op,
        };

        match (would_pass, depth_fail) {
            (false, _) => dynamic_ops.fail_op = op_case.op,
            (true, false) => dynamic_ops.pass_op = op_case.op,
            (true, true) => dynamic_ops.depth_fail_op = op_case.op,
        }

        let static_ops = StencilOps {
            fail_op: incompatible,
            pass_op: incompatible,
            depth_fail_op: incompatible,
            compare_op: if global_pass {
                CompareOp::Never
            } else {
                CompareOp::Always
            },
        };

        let (static_faces, dynamic_entries): (_, SmallVec<[StencilOpParams; 2]>) = match face {
            StencilFaceCase::Single(faces) => (
                faces,
                smallvec![StencilOpParams {
                    faces,
                    ops: dynamic_ops,
                }],
            ),
            StencilFaceCase::Dual => (
                StencilFaces::FrontAndBack,
                smallvec![
                    StencilOpParams {
                        faces: StencilFaces::Front,
                        ops: dynamic_ops,
                    },
                    StencilOpParams {
                        faces: StencilFaces::Back,
                        ops: dynamic_ops,
                    },
                ],
            ),
        };

        config.stencil_ops = StaticAndDynamicPair::with_dynamic(
            smallvec![StencilOpParams {
                faces: static_faces,
                ops: static_ops,
            }],
            dynamic_entries,
        );
        config.clear_stencil = u32::from(clear_value);
        config.reference_stencil = u32::from(reference);

        if depth_fail {
            config.depth_test_enable = true.into();
            config.clear_depth = 0.5;
            config.depth_compare_op = CompareOp::Less.into();

            for mesh in &mut config.mesh_params {
                mesh.depth = 0.75;
            }
        }

        config.reference_color = single_color_reference(if global_pass {
            DEFAULT_TRIANGLE_COLOR
        } else {
            DEFAULT_CLEAR_COLOR
        });
        // Depth writes are disabled.
        config.expected_depth = config.clear_depth;
        config.expected_stencil = u32::from(stencil_result(
            op_case.op,
            clear_value,
            reference,
            STENCIL_MIN,
            STENCIL_MAX,
        ));

        config
    }

    fn add_vertex_input_cases(&mut self) -> Result<(), Box<ValidationError>> {
        for bind_unused in bind_unused_cases(self.ordering) {
            // The bad strides are shorter than the attributes of the binding, which is not
            // allowed for the dynamic pipeline that draws first.
            if self.ordering != SequenceOrdering::TwoDrawsStatic {
                let good_strides = VertexLayout::ExtraAttributes.vertex_data_strides();
                let bad_strides = good_strides.iter().map(|stride| stride / 2).collect();

                let mut config = self.config_with_layouts(
                    VertexLayout::Padded,
                    Some(VertexLayout::ExtraAttributes),
                );
                config.strides = StaticAndDynamicPair::with_dynamic(bad_strides, good_strides);
                config.bind_unused_mesh_shading_pipeline =
                    bind_unused.bind_unused_mesh_shading_pipeline;
                self.add(
                    format!("vertex_input{}", bind_unused.name_suffix),
                    format!(
                        "Dynamically set vertex input{}",
                        bind_unused.description_suffix
                    ),
                    config,
                )?;
            }

            let mut config =
                self.config_with_layouts(VertexLayout::Padded, Some(VertexLayout::ExtraAttributes));
            config.bind_unused_mesh_shading_pipeline =
                bind_unused.bind_unused_mesh_shading_pipeline;
            self.add(
                format!("vertex_input_no_dyn_stride{}", bind_unused.name_suffix),
                format!(
                    "Dynamically set vertex input without using dynamic strides{}",
                    bind_unused.description_suffix,
                ),
                config,
            )?;

            let mut config = self.config_with_layouts(
                VertexLayout::ExtraAttributes,
                Some(VertexLayout::MultipleBindings),
            );
            config.bind_unused_mesh_shading_pipeline =
                bind_unused.bind_unused_mesh_shading_pipeline;
            self.add(
                format!("vertex_input_multiple_bindings{}", bind_unused.name_suffix),
                format!(
                    "Dynamically set vertex input with multiple bindings{}",
                    bind_unused.description_suffix,
                ),
                config,
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{create_extended_dynamic_state_tests, TestCase, TestCaseGroup, TestNode};
    use crate::{
        config::{SequenceOrdering, StaticAndDynamicPair, TestConfig},
        device::DeviceFeatures,
        pipeline::{
            graphics::{depth_stencil::StencilOp, rasterization::CullMode},
            PipelineConstructionType,
        },
        software::SoftwareDevice,
        TestStatus,
    };
    use foldhash::HashSet;

    fn tests() -> TestCaseGroup {
        create_extended_dynamic_state_tests(PipelineConstructionType::Monolithic).unwrap()
    }

    #[test]
    fn tree_structure() {
        let tests = tests();
        assert_eq!(tests.name(), "extended_dynamic_state");

        let names: Vec<_> = tests.children().iter().map(TestNode::name).collect();
        assert_eq!(
            names,
            [
                "cmd_buffer_start",
                "before_draw",
                "between_pipelines",
                "after_pipelines",
                "before_good_static",
                "two_draws_dynamic",
                "two_draws_static",
                "mesh_shader",
            ],
        );

        let Some(TestNode::Group(mesh_shader)) = tests.children().last() else {
            panic!("the last child is not the mesh shader group");
        };
        assert_eq!(mesh_shader.children().len(), 7);

        assert!(tests
            .find("cmd_buffer_start.prim_restart_enable_bind_unused_ms")
            .is_some());
        assert!(tests
            .find("before_draw.prim_restart_enable_bind_unused_ms")
            .is_none());
        assert!(tests
            .find("before_draw.prim_restart_disable_on_both")
            .is_some());
        assert!(tests.find("cmd_buffer_start.topology_patch_geom").is_some());
        assert!(tests.find("two_draws_static.large_stride").is_none());
        assert!(tests
            .find("two_draws_dynamic.zero_stride_with_offset")
            .is_none());
        assert!(tests.find("before_draw.zero_stride_with_offset").is_some());
        assert!(tests.find("mesh_shader.before_draw.cull_front").is_some());
        assert!(tests.find("mesh_shader.before_draw.vertex_input").is_none());
        assert!(tests
            .find("mesh_shader.before_draw.topology_line")
            .is_none());
        assert!(tests.find("mesh_shader.before_draw.2_viewports").is_some());
        assert!(tests.find("cmd_buffer_start").is_none());

        let mesh_case = tests.find("mesh_shader.cmd_buffer_start.logic_op_or").unwrap();
        assert!(mesh_case.config().use_mesh_shaders);
    }

    #[test]
    fn paths_are_unique() {
        let tests = tests();
        let cases = tests.cases();
        assert_eq!(cases.len(), tests.case_count());

        let paths: HashSet<&str> = cases.iter().map(|(path, _)| path.as_str()).collect();
        assert_eq!(paths.len(), cases.len());
        assert!(paths.contains("cmd_buffer_start.cull_none"));
    }

    #[test]
    fn stencil_case_expectations() {
        let tests = tests();

        let case = tests
            .find("cmd_buffer_start.stencil_state_face_front_xt_dec_clamp_clear_0_ref_0_pass")
            .unwrap();
        let config = case.config();
        assert_eq!(config.expected_stencil, 0);
        assert_eq!(
            config.stencil_ops.dynamic_value.as_ref().unwrap()[0].ops.pass_op,
            StencilOp::DecrementAndClamp,
        );

        // 102 is two fifths of 255.
        let case = tests
            .find("before_draw.stencil_state_face_both_dual_lt_inc_wrap_clear_254_ref_255_fail")
            .unwrap();
        let config = case.config();
        assert_eq!(config.expected_stencil, 255);
        assert_eq!(config.mesh_params.len(), 2);
        assert_eq!(config.stencil_ops.dynamic_value.as_ref().unwrap().len(), 2);
        assert!(tests
            .find("before_draw.stencil_state_face_back_eq_replace_clear_102_ref_102_depthfail")
            .is_some());
        assert!(tests
            .find("before_draw.stencil_state_face_back_eq_replace_clear_102_ref_103_depthfail")
            .is_none());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let config = TestConfig::new(
            PipelineConstructionType::Monolithic,
            SequenceOrdering::BeforeDraw,
            false,
        );
        let mut group = TestCaseGroup::new("group", "");
        group
            .add_case(TestCase::new("case", "", config.clone()).unwrap())
            .unwrap();
        assert!(group
            .add_case(TestCase::new("case", "", config).unwrap())
            .is_err());
        assert!(group.add_group(TestCaseGroup::new("case", "")).is_err());
        assert_eq!(group.case_count(), 1);
    }

    #[test]
    fn invalid_configurations_are_rejected() {
        let mut config = TestConfig::new(
            PipelineConstructionType::Monolithic,
            SequenceOrdering::BeforeDraw,
            false,
        );
        config.bind_unused_mesh_shading_pipeline = true;

        let err = TestCase::new("bad", "", config).unwrap_err();
        assert_eq!(err.context, "bad.bind_unused_mesh_shading_pipeline");
    }

    #[test]
    fn selected_cases_pass() {
        let tests = tests();
        let mut device = SoftwareDevice::new();

        for path in [
            "cmd_buffer_start.cull_none",
            "before_draw.cull_front_and_back",
            "after_pipelines.depth_compare_greater",
            "two_draws_dynamic.depth_write_enable",
            "before_good_static.disable_raster",
            "cmd_buffer_start.stencil_state_face_front_xt_dec_clamp_clear_0_ref_0_pass",
            "before_draw.stencil_state_face_back_eq_replace_clear_102_ref_102_pass",
        ] {
            let case = tests.find(path).unwrap();
            assert_eq!(case.run(&mut device).status, TestStatus::Pass, "{}", path);
        }
    }

    /// Returns the family of a stencil combinatorial case: its group, face, operation and
    /// outcome. Every other case is its own family.
    fn case_family(path: &str) -> String {
        let (group, name) = path.rsplit_once('.').unwrap_or(("", path));
        let Some((variant, rest)) = name
            .strip_prefix("stencil_state_")
            .and_then(|rest| rest.split_once("_clear_"))
        else {
            return path.to_owned();
        };
        let (face, compare_and_op) = [
            "face_front",
            "face_back",
            "face_both_single",
            "face_both_dual",
        ]
        .into_iter()
        .find_map(|face| {
            let compare_and_op = variant.strip_prefix(face)?.strip_prefix('_')?;
            Some((face, compare_and_op))
        })
        .unwrap();
        let (_compare, op) = compare_and_op.split_once('_').unwrap();
        let (_, outcome) = rest.rsplit_once('_').unwrap();

        format!("{}.{}.{}.{}", group, face, op, outcome)
    }

    #[test]
    fn stencil_families() {
        assert_eq!(
            case_family(
                "before_draw.stencil_state_face_back_eq_replace_clear_102_ref_102_depthfail"
            ),
            "before_draw.face_back.replace.depthfail",
        );
        assert_eq!(
            case_family(
                "mesh_shader.after_pipelines.\
                 stencil_state_face_both_dual_xt_dec_clamp_clear_1_ref_0_pass"
            ),
            "mesh_shader.after_pipelines.face_both_dual.dec_clamp.pass",
        );
        assert_eq!(
            case_family("before_draw.cull_none"),
            "before_draw.cull_none"
        );
    }

    #[test]
    fn every_case_family_passes() {
        let tests = tests();
        let mut device = SoftwareDevice::new();
        let mut families = HashSet::default();
        let mut failures = Vec::new();

        for (path, case) in tests.cases() {
            if !families.insert(case_family(&path)) {
                continue;
            }

            let status = case.run(&mut device).status;

            if status != TestStatus::Pass {
                failures.push(format!("{}: {:?}", path, status));
            }
        }

        assert!(families.len() > 1000);
        assert!(failures.is_empty(), "{:#?}", failures);
    }

    #[test]
    fn depth_compare_greater_writes_mesh_depth() {
        let tests = tests();
        let case = tests.find("cmd_buffer_start.depth_compare_greater").unwrap();
        let config = case.config();

        assert_eq!(config.clear_depth, 0.5);
        assert_eq!(config.mesh_params[0].depth, 0.75);
        assert_eq!(config.expected_depth, 0.75);
    }

    #[test]
    fn unsupported_cases_are_reported() {
        let tests = tests();
        let mut features = DeviceFeatures::all();
        features.mesh_shader = false;
        let mut device = SoftwareDevice::with_features(features);

        let case = tests.find("mesh_shader.before_draw.cull_none").unwrap();
        assert!(matches!(
            case.run(&mut device).status,
            TestStatus::NotSupported(_),
        ));

        let mut config = case.config().clone();
        config.use_mesh_shaders = false;
        config.cull_mode = StaticAndDynamicPair::with_dynamic(CullMode::Front, CullMode::None);
        let case = TestCase::new("classic", "", config).unwrap();
        assert_eq!(case.run(&mut device).status, TestStatus::Pass);
    }
}
