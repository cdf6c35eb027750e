// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Defines how the color output of the fragment shader is written to the attachment.
//!
//! Blending proper is never enabled by the tests. The only operation applied between the
//! fragment shader output and the stored color is the logical operation, which only takes
//! effect on integer and normalized attachments.

use crate::macros::vulkan_enum;

/// Describes how the color output of the fragment shader is written to the attachment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorBlendState {
    /// Whether the logical operation is applied.
    ///
    /// The default value is `false`.
    pub logic_op_enable: bool,

    /// The logical operation to apply between the fragment shader output and the stored color.
    ///
    /// The default value is [`LogicOp::Copy`].
    pub logic_op: LogicOp,
}

impl ColorBlendState {
    /// Creates a `ColorBlendState` with the logical operation disabled.
    #[inline]
    pub const fn new() -> Self {
        Self {
            logic_op_enable: false,
            logic_op: LogicOp::Copy,
        }
    }

    /// Enables the logical operation and sets it.
    #[inline]
    pub const fn logic_op(mut self, logic_op: LogicOp) -> Self {
        self.logic_op_enable = true;
        self.logic_op = logic_op;
        self
    }
}

impl Default for ColorBlendState {
    /// Returns [`ColorBlendState::new()`].
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

vulkan_enum! {
    /// Which logical operation to apply to the output color.
    ///
    /// The operation is applied individually for each channel (red, green, blue and alpha). In
    /// the descriptions below, `source` is the fragment shader output and `destination` is the
    /// stored color.
    LogicOp impl {
        /// Applies the operation to one channel.
        #[inline]
        pub const fn apply(self, source: u32, destination: u32) -> u32 {
            match self {
                LogicOp::Clear => 0,
                LogicOp::And => source & destination,
                LogicOp::AndReverse => source & !destination,
                LogicOp::Copy => source,
                LogicOp::AndInverted => !source & destination,
                LogicOp::Noop => destination,
                LogicOp::Xor => source ^ destination,
                LogicOp::Or => source | destination,
                LogicOp::Nor => !(source | destination),
                LogicOp::Equivalent => !(source ^ destination),
                LogicOp::Invert => !destination,
                LogicOp::OrReverse => source | !destination,
                LogicOp::CopyInverted => !source,
                LogicOp::OrInverted => !source | destination,
                LogicOp::Nand => !(source & destination),
                LogicOp::Set => !0,
            }
        }
    }
    = LogicOp(i32);

    /// Returns `0`.
    Clear = CLEAR,

    /// Returns `source & destination`.
    And = AND,

    /// Returns `source & !destination`.
    AndReverse = AND_REVERSE,

    /// Returns `source`.
    Copy = COPY,

    /// Returns `!source & destination`.
    AndInverted = AND_INVERTED,

    /// Returns `destination`.
    Noop = NO_OP,

    /// Returns `source ^ destination`.
    Xor = XOR,

    /// Returns `source | destination`.
    Or = OR,

    /// Returns `!(source | destination)`.
    Nor = NOR,

    /// Returns `!(source ^ destination)`.
    Equivalent = EQUIVALENT,

    /// Returns `!destination`.
    Invert = INVERT,

    /// Returns `source | !destination`.
    OrReverse = OR_REVERSE,

    /// Returns `!source`.
    CopyInverted = COPY_INVERTED,

    /// Returns `!source | destination`.
    OrInverted = OR_INVERTED,

    /// Returns `!(source & destination)`.
    Nand = NAND,

    /// Returns `!0` (all bits set to 1).
    Set = SET,
}

impl Default for LogicOp {
    #[inline]
    fn default() -> LogicOp {
        LogicOp::Noop
    }
}

#[cfg(test)]
mod tests {
    use super::LogicOp;

    #[test]
    fn logic_ops() {
        assert_eq!(LogicOp::Or.apply(0b0011, 0b0101), 0b0111);
        assert_eq!(LogicOp::And.apply(0b0011, 0b0101), 0b0001);
        assert_eq!(LogicOp::Clear.apply(0xff, 0xff), 0);
        assert_eq!(LogicOp::Copy.apply(7, 9), 7);
        assert_eq!(LogicOp::Invert.apply(7, 0) & 0xff, 0xff);
        assert_eq!(LogicOp::ALL.len(), 16);
    }
}
