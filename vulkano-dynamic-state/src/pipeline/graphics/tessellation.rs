// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Subdivides primitives into smaller primitives.

use crate::ValidationError;

/// The state in a graphics pipeline describing the tessellation shader execution of a graphics
/// pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TessellationState {
    /// The number of patch control points to use.
    ///
    /// The default value is 3.
    pub patch_control_points: u32,
}

impl TessellationState {
    /// Creates a new `TessellationState` with 3 patch control points.
    #[inline]
    pub const fn new() -> Self {
        TessellationState {
            patch_control_points: 3,
        }
    }

    /// Sets the number of patch control points.
    #[inline]
    pub const fn patch_control_points(mut self, num: u32) -> Self {
        self.patch_control_points = num;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), Box<ValidationError>> {
        if self.patch_control_points == 0 {
            return Err(ValidationError::new("patch_control_points", "is zero"));
        }

        Ok(())
    }
}

impl Default for TessellationState {
    /// Returns [`TessellationState::new()`].
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
