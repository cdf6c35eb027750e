// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

#![doc(html_logo_url = "https://raw.githubusercontent.com/vulkano-rs/vulkano/master/logo.png")]
//! Generation and execution of conformance tests for Vulkan's extended dynamic state.
//!
//! Vulkan lets a graphics pipeline leave part of its fixed-function state *dynamic*, meaning that
//! the value is taken from a command recorded in the command buffer instead of from the pipeline
//! itself. The tests in this crate check that an implementation honors this contract: that a
//! dynamic value set at any legal point of the command stream is the one used by the draw, and
//! that binding a pipeline which bakes the same state in overrides it.
//!
//! # Brief summary
//!
//! Every test renders a small scene into a 64x64 framebuffer twice over the same state: once
//! through a pipeline where the state under test is baked in with a deliberately *wrong* value,
//! and once through a pipeline where that state is dynamic and set to the *right* value. Which
//! of the two the draw ends up using, and therefore what the attachments contain, depends on the
//! [`SequenceOrdering`] of the test:
//!
//! - The [`TestConfig`] describes the scene and the static/dynamic value pairs.
//! - [`apply_ordering`] resolves a configuration for its ordering.
//! - A [`TestCase`] checks that the [`Device`] supports everything the configuration needs,
//!   builds the pipelines and buffers, records and submits the command buffer, then compares the
//!   attachments against the expected values.
//! - [`create_extended_dynamic_state_tests`] enumerates the whole tree of test cases.
//!
//! The [`software::SoftwareDevice`] is a complete in-process implementation of [`Device`]. It
//! follows the dynamic state rules of the Vulkan specification closely enough that every test
//! generated by this crate passes on it, which makes it a reference for the expected behavior.
//!
//! # Errors
//!
//! Three kinds of failures are kept apart:
//!
//! - [`ValidationError`]: a configuration or a command that breaks a precondition. These are
//!   programming errors in the test definitions, and they never depend on the device.
//! - [`NotSupportedError`]: the device lacks a feature, limit or format needed by a test. The
//!   test is then reported as [`TestStatus::NotSupported`] instead of failing.
//! - [`ExecutionError`]: the device could not execute a command buffer.
//!
//! [`SequenceOrdering`]: config::SequenceOrdering
//! [`TestConfig`]: config::TestConfig
//! [`apply_ordering`]: config::apply_ordering
//! [`TestCase`]: cases::TestCase
//! [`Device`]: device::Device
//! [`create_extended_dynamic_state_tests`]: cases::create_extended_dynamic_state_tests

pub use ash::vk::DeviceSize;
use std::{
    borrow::Cow,
    error::Error,
    fmt::{Display, Error as FmtError, Formatter},
    hash::{Hash, Hasher},
    marker::PhantomData,
};

pub mod buffer;
pub mod cases;
pub mod command_buffer;
pub mod config;
pub mod device;
pub mod format;
pub mod image;
pub mod instance;
mod macros;
pub mod oracle;
pub mod pipeline;
pub mod reference;
pub mod sequence;
pub mod software;
pub mod verify;

/// An opaque handle to an object created by a [`Device`].
///
/// The type parameter denotes the type of object being referred to. IDs are only meaningful to
/// the device that handed them out.
///
/// [`Device`]: device::Device
#[repr(transparent)]
pub struct Id<T> {
    index: u32,
    marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    /// Creates an ID from an index. Devices use this to hand out IDs for their objects.
    #[inline]
    pub const fn new(index: u32) -> Self {
        Id {
            index,
            marker: PhantomData,
        }
    }

    /// Returns the index that this ID was created from.
    #[inline]
    pub const fn index(self) -> u32 {
        self.index
    }
}

impl<T> Clone for Id<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Id<T> {}

impl<T> Hash for Id<T> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> std::fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.debug_tuple("Id").field(&self.index).finish()
    }
}

/// A precondition of a configuration or of a command was not met.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationError {
    /// The context in which the problem exists, such as the name of a field or a parameter.
    pub context: Cow<'static, str>,

    /// A description of the problem.
    pub problem: Cow<'static, str>,
}

impl ValidationError {
    /// Creates a new boxed `ValidationError`.
    #[inline]
    pub fn new(
        context: impl Into<Cow<'static, str>>,
        problem: impl Into<Cow<'static, str>>,
    ) -> Box<Self> {
        Box::new(ValidationError {
            context: context.into(),
            problem: problem.into(),
        })
    }

    /// Prepends `context` to the existing context, separated by a dot.
    pub(crate) fn add_context(
        mut self: Box<Self>,
        context: impl Into<Cow<'static, str>>,
    ) -> Box<Self> {
        let context = context.into();

        self.context = if self.context.is_empty() {
            context
        } else {
            format!("{}.{}", context, self.context).into()
        };

        self
    }
}

impl Error for ValidationError {}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        if self.context.is_empty() {
            write!(f, "{}", self.problem)
        } else {
            write!(f, "{}: {}", self.context, self.problem)
        }
    }
}

/// A device lacks something a test needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotSupportedError {
    /// What the device would need to provide.
    pub requires: Requires,
}

impl NotSupportedError {
    #[inline]
    pub(crate) const fn new(requires: Requires) -> Self {
        NotSupportedError { requires }
    }
}

impl Error for NotSupportedError {}

impl Display for NotSupportedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        match &self.requires {
            Requires::DeviceFeature(name) => {
                write!(f, "the `{}` feature is not enabled on the device", name)
            }
            Requires::FormatFeatures { format, features } => write!(
                f,
                "the format {:?} does not support the format features {:?}",
                format, features,
            ),
            Requires::Limit {
                name,
                required,
                supported,
            } => write!(
                f,
                "the `{}` limit of the device is {}, but {} is required",
                name, supported, required,
            ),
            Requires::DepthStencilFormat => write!(
                f,
                "none of the candidate depth/stencil formats can be used as a depth/stencil \
                attachment",
            ),
        }
    }
}

/// The requirement that a [`NotSupportedError`] reports as missing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Requires {
    /// A device feature, named as in [`DeviceFeatures`](device::DeviceFeatures).
    DeviceFeature(&'static str),

    /// Format features that a format must support.
    FormatFeatures {
        format: format::Format,
        features: format::FormatFeatures,
    },

    /// A device limit that is too low.
    Limit {
        name: &'static str,
        required: u32,
        supported: u32,
    },

    /// A usable depth/stencil attachment format.
    DepthStencilFormat,
}

/// An error that occurred while a device executed a command buffer or read back an attachment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecutionError {
    /// A draw was recorded while the bound pipeline has a state dynamic, but that state was not
    /// set since the last time it was invalidated.
    DynamicStateNotSet {
        state: pipeline::DynamicState,
    },

    /// A draw was executed outside of a render pass.
    NotInRenderPass,

    /// A draw was executed without a pipeline bound.
    NoPipelineBound,

    /// A vertex attribute reads from a binding that has no vertex buffer bound.
    VertexBufferNotBound {
        binding: u32,
    },

    /// An indexed draw was executed without an index buffer bound.
    IndexBufferNotBound,

    /// A mesh shading draw reads from a storage buffer slot that has nothing bound.
    StorageBufferNotBound {
        slot: u32,
    },

    /// A command refers to a buffer that the device does not know.
    UnknownBuffer(buffer::BufferId),

    /// A command refers to a pipeline that the device does not know.
    UnknownPipeline(pipeline::PipelineId),

    /// A command refers to a framebuffer that the device does not know.
    UnknownFramebuffer(image::FramebufferId),
}

impl Error for ExecutionError {}

impl Display for ExecutionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        match self {
            Self::DynamicStateNotSet { state } => write!(
                f,
                "the bound pipeline has {:?} as dynamic state, but it was not set",
                state,
            ),
            Self::NotInRenderPass => write!(f, "a draw was executed outside of a render pass"),
            Self::NoPipelineBound => write!(f, "a draw was executed without a pipeline bound"),
            Self::VertexBufferNotBound { binding } => write!(
                f,
                "a vertex attribute reads from binding {}, but no vertex buffer is bound there",
                binding,
            ),
            Self::IndexBufferNotBound => write!(
                f,
                "an indexed draw was executed without an index buffer bound"
            ),
            Self::StorageBufferNotBound { slot } => write!(
                f,
                "the mesh shader reads from storage buffer slot {}, but nothing is bound there",
                slot,
            ),
            Self::UnknownBuffer(id) => write!(f, "the buffer {:?} does not exist", id),
            Self::UnknownPipeline(id) => write!(f, "the pipeline {:?} does not exist", id),
            Self::UnknownFramebuffer(id) => write!(f, "the framebuffer {:?} does not exist", id),
        }
    }
}

/// The verdict of a test case.
#[derive(Clone, Debug, PartialEq)]
pub enum TestStatus {
    /// Every attachment matched its expected contents.
    Pass,

    /// At least one attachment did not match. The message names the attachments.
    Fail(String),

    /// The device lacks something the test needs.
    NotSupported(NotSupportedError),
}

impl TestStatus {
    /// Returns whether the status is [`TestStatus::Pass`].
    #[inline]
    pub fn is_pass(&self) -> bool {
        matches!(self, TestStatus::Pass)
    }
}

impl Display for TestStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        match self {
            Self::Pass => write!(f, "pass"),
            Self::Fail(message) => write!(f, "fail: {}", message),
            Self::NotSupported(err) => write!(f, "not supported: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Id, NotSupportedError, Requires, ValidationError};

    #[test]
    fn validation_error_context() {
        let err = ValidationError::new("patch_control_points", "must not be zero")
            .add_context("config");
        assert_eq!(err.context, "config.patch_control_points");
        assert_eq!(
            err.to_string(),
            "config.patch_control_points: must not be zero",
        );

        let err = ValidationError::new("", "empty command buffer");
        assert_eq!(err.to_string(), "empty command buffer");
    }

    #[test]
    fn not_supported_display() {
        let err = NotSupportedError::new(Requires::DeviceFeature("mesh_shader"));
        assert_eq!(
            err.to_string(),
            "the `mesh_shader` feature is not enabled on the device",
        );
    }

    #[test]
    fn ids_compare_by_index() {
        struct Marker;

        let a = Id::<Marker>::new(3);
        let b = Id::<Marker>::new(3);
        assert_eq!(a, b);
        assert_ne!(a, Id::new(4));
        assert_eq!(a.index(), 3);
    }
}
