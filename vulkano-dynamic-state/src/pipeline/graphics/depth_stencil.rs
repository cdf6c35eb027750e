// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Configures the operation of the depth, depth bounds and stencil tests.
//!
//! The order of the tests for a fragment is:
//!
//! - The depth bounds test, against the depth already stored in the attachment.
//! - The stencil test. On failure, `fail_op` is applied and the fragment is discarded.
//! - The depth test. On failure, `depth_fail_op` is applied and the fragment is discarded.
//! - `pass_op` is applied, and the depth is written if depth writes are enabled.

use crate::{device::DeviceFeatures, macros::vulkan_enum, ValidationError};
use std::ops::RangeInclusive;

/// The state in a graphics pipeline describing how the depth, depth bounds and stencil tests
/// should behave.
#[derive(Clone, Debug, PartialEq)]
pub struct DepthStencilState {
    /// Whether the depth test is enabled.
    ///
    /// The default value is `false`.
    pub depth_test_enable: bool,

    /// Whether passing fragments write their depth. Ignored when the depth test is disabled.
    ///
    /// The default value is `false`.
    pub depth_write_enable: bool,

    /// The comparison between the fragment depth and the stored depth.
    ///
    /// The default value is [`CompareOp::Never`].
    pub depth_compare_op: CompareOp,

    /// Whether the depth bounds test is enabled.
    ///
    /// If `true`, the [`depth_bounds`](crate::device::DeviceFeatures::depth_bounds) feature must
    /// be enabled on the device.
    ///
    /// The default value is `false`.
    pub depth_bounds_test_enable: bool,

    /// The range that the stored depth must be in for the depth bounds test to pass.
    ///
    /// The default value is `0.0..=1.0`.
    pub depth_bounds: RangeInclusive<f32>,

    /// Whether the stencil test is enabled.
    ///
    /// The default value is `false`.
    pub stencil_test_enable: bool,

    /// The stencil operation state to use for points and lines, and for triangles whose front is
    /// facing the user.
    pub front: StencilOpState,

    /// The stencil operation state to use for triangles whose back is facing the user.
    pub back: StencilOpState,
}

impl DepthStencilState {
    /// Creates a `DepthStencilState` with all tests disabled.
    #[inline]
    pub fn new() -> Self {
        Self {
            depth_test_enable: false,
            depth_write_enable: false,
            depth_compare_op: CompareOp::Never,
            depth_bounds_test_enable: false,
            depth_bounds: 0.0..=1.0,
            stencil_test_enable: false,
            front: StencilOpState::new(),
            back: StencilOpState::new(),
        }
    }

    /// Sets the depth test parameters.
    #[inline]
    pub fn depth(mut self, test_enable: bool, write_enable: bool, compare_op: CompareOp) -> Self {
        self.depth_test_enable = test_enable;
        self.depth_write_enable = write_enable;
        self.depth_compare_op = compare_op;
        self
    }

    /// Sets the depth bounds test parameters.
    #[inline]
    pub fn depth_bounds(mut self, test_enable: bool, bounds: RangeInclusive<f32>) -> Self {
        self.depth_bounds_test_enable = test_enable;
        self.depth_bounds = bounds;
        self
    }

    /// Sets whether the stencil test is enabled.
    #[inline]
    pub fn stencil_test_enable(mut self, enable: bool) -> Self {
        self.stencil_test_enable = enable;
        self
    }

    /// Sets the stencil state of the given faces.
    #[inline]
    pub fn stencil_op_state(mut self, faces: StencilFaces, state: StencilOpState) -> Self {
        if faces.includes_front() {
            self.front = state;
        }

        if faces.includes_back() {
            self.back = state;
        }

        self
    }

    pub(crate) fn validate(&self, features: &DeviceFeatures) -> Result<(), Box<ValidationError>> {
        if self.depth_bounds_test_enable && !features.depth_bounds {
            return Err(ValidationError::new(
                "depth_bounds_test_enable",
                "is `true`, but the `depth_bounds` feature is not enabled",
            ));
        }

        if self.depth_bounds.start() > self.depth_bounds.end() {
            return Err(ValidationError::new(
                "depth_bounds",
                "the start is greater than the end",
            ));
        }

        Ok(())
    }
}

impl Default for DepthStencilState {
    /// Returns [`DepthStencilState::new()`].
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

/// Stencil test operations for a single face.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StencilOpState {
    /// The stencil operations to perform.
    pub ops: StencilOps,

    /// A bitmask that selects the bits of the unsigned integer stencil values participating in the
    /// stencil test.
    pub compare_mask: u32,

    /// A bitmask that selects the bits of the unsigned integer stencil values updated by the
    /// stencil test in the stencil framebuffer attachment.
    pub write_mask: u32,

    /// Reference value that is used in the unsigned stencil comparison.
    pub reference: u32,
}

impl StencilOpState {
    /// Creates a `StencilOpState` with the default operations, and the masks and reference value
    /// set to `u32::MAX`.
    #[inline]
    pub const fn new() -> Self {
        Self {
            ops: StencilOps::new(),
            compare_mask: u32::MAX,
            write_mask: u32::MAX,
            reference: u32::MAX,
        }
    }
}

impl Default for StencilOpState {
    /// Returns [`StencilOpState::new()`].
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StencilOps {
    /// The operation to perform when the stencil test failed.
    pub fail_op: StencilOp,

    /// The operation to perform when both the depth test and the stencil test passed.
    pub pass_op: StencilOp,

    /// The operation to perform when the stencil test passed but the depth test failed.
    pub depth_fail_op: StencilOp,

    /// The comparison to perform between the reference value and the existing stencil value in
    /// the stencil buffer.
    pub compare_op: CompareOp,
}

impl StencilOps {
    /// Creates a `StencilOps` with the stencil operations set to `Keep` and `compare_op` set to
    /// `Always`.
    #[inline]
    pub const fn new() -> Self {
        Self {
            fail_op: StencilOp::Keep,
            pass_op: StencilOp::Keep,
            depth_fail_op: StencilOp::Keep,
            compare_op: CompareOp::Always,
        }
    }
}

impl Default for StencilOps {
    /// Returns [`StencilOps::new()`].
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

vulkan_enum! {
    /// Operation to perform on the stored stencil value after the stencil and depth tests.
    StencilOp = StencilOp(i32);

    /// Keeps the current value.
    Keep = KEEP,

    /// Sets the value to 0.
    Zero = ZERO,

    /// Sets the value to the reference value.
    Replace = REPLACE,

    /// Increments the value, saturating at the maximum representable value.
    IncrementAndClamp = INCREMENT_AND_CLAMP,

    /// Decrements the value, saturating at 0.
    DecrementAndClamp = DECREMENT_AND_CLAMP,

    /// Inverts the bits of the value.
    Invert = INVERT,

    /// Increments the value, wrapping around to 0.
    IncrementAndWrap = INCREMENT_AND_WRAP,

    /// Decrements the value, wrapping around to the maximum representable value.
    DecrementAndWrap = DECREMENT_AND_WRAP,
}

impl StencilOp {
    /// Returns the name of the operation as used in test case names.
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            StencilOp::Keep => "keep",
            StencilOp::Zero => "zero",
            StencilOp::Replace => "replace",
            StencilOp::IncrementAndClamp => "inc_clamp",
            StencilOp::DecrementAndClamp => "dec_clamp",
            StencilOp::Invert => "invert",
            StencilOp::IncrementAndWrap => "inc_wrap",
            StencilOp::DecrementAndWrap => "dec_wrap",
        }
    }
}

vulkan_enum! {
    /// Specifies a face for stencil operations.
    StencilFaces impl {
        /// Returns whether the front face is included.
        #[inline]
        pub const fn includes_front(self) -> bool {
            matches!(self, StencilFaces::Front | StencilFaces::FrontAndBack)
        }

        /// Returns whether the back face is included.
        #[inline]
        pub const fn includes_back(self) -> bool {
            matches!(self, StencilFaces::Back | StencilFaces::FrontAndBack)
        }
    }
    = StencilFaceFlags(u32);

    Front = FRONT,
    Back = BACK,
    FrontAndBack = FRONT_AND_BACK,
}

vulkan_enum! {
    /// Specifies how two values should be compared to decide whether a test passes or fails.
    ///
    /// Used for both depth testing and stencil testing.
    CompareOp impl {
        /// Returns whether `lhs` compared to `rhs` with this operation passes.
        ///
        /// For the depth test, `lhs` is the fragment depth and `rhs` the stored depth. For the
        /// stencil test, `lhs` is the reference value and `rhs` the stored value.
        #[inline]
        pub fn evaluate<T: PartialOrd>(self, lhs: T, rhs: T) -> bool {
            match self {
                CompareOp::Never => false,
                CompareOp::Less => lhs < rhs,
                CompareOp::Equal => lhs == rhs,
                CompareOp::LessOrEqual => lhs <= rhs,
                CompareOp::Greater => lhs > rhs,
                CompareOp::NotEqual => lhs != rhs,
                CompareOp::GreaterOrEqual => lhs >= rhs,
                CompareOp::Always => true,
            }
        }

        /// Returns the name of the operation as used in test case names.
        #[inline]
        pub const fn name(self) -> &'static str {
            match self {
                CompareOp::Never => "never",
                CompareOp::Less => "less",
                CompareOp::Equal => "equal",
                CompareOp::LessOrEqual => "less_equal",
                CompareOp::Greater => "greater",
                CompareOp::NotEqual => "not_equal",
                CompareOp::GreaterOrEqual => "greater_equal",
                CompareOp::Always => "always",
            }
        }
    }
    = CompareOp(i32);

    /// The test never passes.
    Never = NEVER,

    /// The test passes if `lhs < rhs`.
    Less = LESS,

    /// The test passes if `lhs == rhs`.
    Equal = EQUAL,

    /// The test passes if `lhs <= rhs`.
    LessOrEqual = LESS_OR_EQUAL,

    /// The test passes if `lhs > rhs`.
    Greater = GREATER,

    /// The test passes if `lhs != rhs`.
    NotEqual = NOT_EQUAL,

    /// The test passes if `lhs >= rhs`.
    GreaterOrEqual = GREATER_OR_EQUAL,

    /// The test always passes.
    Always = ALWAYS,
}

#[cfg(test)]
mod tests {
    use super::{CompareOp, DepthStencilState, StencilFaces, StencilOp, StencilOpState, StencilOps};
    use crate::device::DeviceFeatures;

    #[test]
    fn compare_ops() {
        assert!(CompareOp::Less.evaluate(1, 2));
        assert!(!CompareOp::Less.evaluate(2, 2));
        assert!(CompareOp::LessOrEqual.evaluate(2, 2));
        assert!(CompareOp::NotEqual.evaluate(0.25, 0.5));
        assert!(!CompareOp::Never.evaluate(0, 0));
        assert!(CompareOp::Always.evaluate(9, 0));
        assert_eq!(CompareOp::GreaterOrEqual.name(), "greater_equal");
    }

    #[test]
    fn face_selection() {
        let state = StencilOpState {
            ops: StencilOps {
                pass_op: StencilOp::Replace,
                ..StencilOps::new()
            },
            ..StencilOpState::new()
        };

        let depth_stencil = DepthStencilState::new().stencil_op_state(StencilFaces::Back, state);
        assert_eq!(depth_stencil.back, state);
        assert_eq!(depth_stencil.front, StencilOpState::new());

        let depth_stencil =
            DepthStencilState::new().stencil_op_state(StencilFaces::FrontAndBack, state);
        assert_eq!(depth_stencil.front, state);
        assert_eq!(depth_stencil.back, state);
    }

    #[test]
    fn depth_bounds_requires_feature() {
        let state = DepthStencilState::new().depth_bounds(true, 0.25..=0.75);
        assert!(state.validate(&DeviceFeatures::empty()).is_err());
        assert!(state.validate(&DeviceFeatures::all()).is_ok());
    }
}
