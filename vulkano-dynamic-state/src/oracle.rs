// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Host-side evaluation of the depth and stencil tests.
//!
//! These functions give the expected outcome of the fixed-function tests. Test cases use them to
//! compute their expected attachment values, and the software device uses the same functions to
//! execute draws.

use crate::pipeline::graphics::depth_stencil::{CompareOp, StencilOp};

/// Returns whether the stencil test passes for a fragment with `reference` against the `stored`
/// value, with all masks set to `0xFF`.
///
/// The reference value is the left operand: [`CompareOp::Less`] passes when
/// `reference < stored`.
#[inline]
pub fn stencil_passes(compare_op: CompareOp, stored: u8, reference: u8) -> bool {
    compare_op.evaluate(reference, stored)
}

/// Returns the value written to the stencil attachment by `op`, given the `stored` value and the
/// `reference` value. Clamping and wrapping happen at `min` and `max`.
pub fn stencil_result(op: StencilOp, stored: u8, reference: u8, min: u8, max: u8) -> u8 {
    match op {
        StencilOp::Keep => stored,
        StencilOp::Zero => 0,
        StencilOp::Replace => reference,
        StencilOp::IncrementAndClamp => {
            if stored >= max {
                max
            } else {
                stored + 1
            }
        }
        StencilOp::DecrementAndClamp => {
            if stored <= min {
                min
            } else {
                stored - 1
            }
        }
        StencilOp::Invert => !stored,
        StencilOp::IncrementAndWrap => {
            if stored >= max {
                min
            } else {
                stored + 1
            }
        }
        StencilOp::DecrementAndWrap => {
            if stored <= min {
                max
            } else {
                stored - 1
            }
        }
    }
}

/// Returns whether the depth test passes for a fragment at depth `fragment` against the `stored`
/// depth.
#[inline]
pub fn depth_passes(compare_op: CompareOp, fragment: f32, stored: f32) -> bool {
    compare_op.evaluate(fragment, stored)
}

#[cfg(test)]
mod tests {
    use super::{depth_passes, stencil_passes, stencil_result};
    use crate::pipeline::graphics::depth_stencil::{CompareOp, StencilOp};

    #[test]
    fn stencil_compare_uses_reference_as_left_operand() {
        for &(stored, reference) in &[(100, 101), (102, 102), (255, 254), (0, 1)] {
            assert!(!stencil_passes(CompareOp::Never, stored, reference));
            assert!(stencil_passes(CompareOp::Always, stored, reference));
            assert_eq!(
                stencil_passes(CompareOp::Less, stored, reference),
                reference < stored,
            );
            assert_eq!(
                stencil_passes(CompareOp::GreaterOrEqual, stored, reference),
                reference >= stored,
            );
            assert_eq!(
                stencil_passes(CompareOp::NotEqual, stored, reference),
                reference != stored,
            );
        }

        assert!(stencil_passes(CompareOp::Greater, 101, 102));
        assert!(!stencil_passes(CompareOp::Greater, 102, 101));
    }

    #[test]
    fn increments_and_decrements() {
        for (op, stored, expected) in [
            (StencilOp::IncrementAndClamp, 254, 255),
            (StencilOp::IncrementAndClamp, 255, 255),
            (StencilOp::IncrementAndWrap, 255, 0),
            (StencilOp::DecrementAndClamp, 0, 0),
            (StencilOp::DecrementAndClamp, 1, 0),
            (StencilOp::DecrementAndWrap, 0, 255),
            (StencilOp::DecrementAndWrap, 1, 0),
        ] {
            let result = stencil_result(op, stored, 0, 0, 255);
            assert_eq!(result, expected, "{:?} on {}", op, stored);
        }
    }

    #[test]
    fn other_operations() {
        assert_eq!(stencil_result(StencilOp::Keep, 102, 7, 0, 255), 102);
        assert_eq!(stencil_result(StencilOp::Zero, 102, 7, 0, 255), 0);
        assert_eq!(stencil_result(StencilOp::Replace, 102, 7, 0, 255), 7);
        assert_eq!(stencil_result(StencilOp::Invert, 102, 7, 0, 255), 153);
        assert_eq!(stencil_result(StencilOp::Invert, 0, 7, 0, 255), 255);
    }

    #[test]
    fn depth_compare() {
        assert!(depth_passes(CompareOp::Less, 0.25, 0.5));
        assert!(!depth_passes(CompareOp::Less, 0.5, 0.5));
        assert!(depth_passes(CompareOp::LessOrEqual, 0.5, 0.5));
        assert!(depth_passes(CompareOp::Greater, 0.75, 0.5));
        assert!(!depth_passes(CompareOp::NotEqual, 0.5, 0.5));
    }
}
