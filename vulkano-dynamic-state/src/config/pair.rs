// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

use std::mem;

/// A state value baked into the static pipeline, with an optional value to set dynamically.
///
/// When both are present, the static value is the wrong one and the dynamic value gives the
/// expected results. Orderings that bind the static pipeline last [`swap`](Self::swap) them.
#[derive(Clone, Debug, PartialEq)]
pub struct StaticAndDynamicPair<T> {
    /// The value baked into pipelines.
    pub static_value: T,

    /// The value set from the command buffer, if the state is tested dynamically.
    pub dynamic_value: Option<T>,
}

impl<T> StaticAndDynamicPair<T> {
    /// Returns a pair with only a static value.
    #[inline]
    pub const fn new(static_value: T) -> Self {
        StaticAndDynamicPair {
            static_value,
            dynamic_value: None,
        }
    }

    /// Returns a pair with both a static and a dynamic value.
    #[inline]
    pub const fn with_dynamic(static_value: T, dynamic_value: T) -> Self {
        StaticAndDynamicPair {
            static_value,
            dynamic_value: Some(dynamic_value),
        }
    }

    /// Returns whether a dynamic value is present.
    #[inline]
    pub const fn is_dynamic(&self) -> bool {
        self.dynamic_value.is_some()
    }

    /// Exchanges the static and the dynamic values. Does nothing without a dynamic value.
    #[inline]
    pub fn swap(&mut self) {
        if let Some(dynamic_value) = &mut self.dynamic_value {
            mem::swap(&mut self.static_value, dynamic_value);
        }
    }

    /// Returns the value that gives the expected results: the dynamic one if it is present and
    /// the values have not been swapped, otherwise the static one.
    #[inline]
    pub fn active(&self, swapped: bool) -> &T {
        match &self.dynamic_value {
            Some(dynamic_value) if !swapped => dynamic_value,
            _ => &self.static_value,
        }
    }

    /// Returns the value that is not active. Without a dynamic value, this is the static one.
    #[inline]
    pub fn inactive(&self, swapped: bool) -> &T {
        match &self.dynamic_value {
            Some(dynamic_value) if swapped => dynamic_value,
            _ => &self.static_value,
        }
    }
}

impl<T> From<T> for StaticAndDynamicPair<T> {
    #[inline]
    fn from(static_value: T) -> Self {
        Self::new(static_value)
    }
}

#[cfg(test)]
mod tests {
    use super::StaticAndDynamicPair;

    #[test]
    fn static_only() {
        let mut pair = StaticAndDynamicPair::new(3);
        assert!(!pair.is_dynamic());

        pair.swap();
        assert_eq!(pair, StaticAndDynamicPair::new(3));
        assert_eq!(*pair.active(false), 3);
        assert_eq!(*pair.active(true), 3);
        assert_eq!(*pair.inactive(true), 3);
    }

    #[test]
    fn swap_is_an_involution() {
        let original = StaticAndDynamicPair::with_dynamic("bad", "good");
        assert_eq!(*original.active(false), "good");
        assert_eq!(*original.active(true), "bad");
        assert_eq!(*original.inactive(false), "bad");

        let mut pair = original.clone();
        pair.swap();
        assert_eq!(pair.static_value, "good");
        assert_eq!(pair.dynamic_value, Some("bad"));
        assert_eq!(*pair.active(true), "good");

        pair.swap();
        assert_eq!(pair, original);
    }
}
