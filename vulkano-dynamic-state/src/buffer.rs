// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Buffers holding vertex, index and storage data.
//!
//! The buffers are filled on the host before they are handed to a device, and never change
//! afterwards. Vertex data is surrounded by a recognizable garbage pattern so that a draw reading
//! outside of the meaningful span produces visibly wrong results instead of silently reading
//! zeroes.

use crate::{macros::vulkan_bitflags, DeviceSize, Id, ValidationError};

/// The ID of a [`Buffer`] created by a device.
pub type BufferId = Id<Buffer>;

/// The 32-bit pattern written around meaningful vertex data.
pub const FILL_PATTERN: u32 = 0xDEAD_BEEF;

vulkan_bitflags! {
    /// Describes how a buffer is going to be used.
    BufferUsage = BufferUsageFlags(u32);

    /// The buffer can be bound as a vertex buffer.
    VERTEX_BUFFER = VERTEX_BUFFER,

    /// The buffer can be bound as an index buffer.
    INDEX_BUFFER = INDEX_BUFFER,

    /// The buffer can be bound as a storage buffer, which is how mesh shaders read vertex data.
    STORAGE_BUFFER = STORAGE_BUFFER,
}

/// The contents and usage of a buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Buffer {
    usage: BufferUsage,
    data: Vec<u8>,
}

impl Buffer {
    /// Creates a buffer with the given contents.
    ///
    /// # Panics
    ///
    /// - Panics if `usage` is empty.
    #[inline]
    pub fn from_data(usage: BufferUsage, data: Vec<u8>) -> Self {
        assert!(!usage.is_empty());

        Buffer { usage, data }
    }

    /// Returns the usage the buffer was created with.
    #[inline]
    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    /// Returns the contents of the buffer.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the size of the buffer in bytes.
    #[inline]
    pub fn size(&self) -> DeviceSize {
        self.data.len() as DeviceSize
    }

    pub(crate) fn validate(&self) -> Result<(), Box<ValidationError>> {
        if self.data.is_empty() {
            return Err(ValidationError::new("data", "is empty"));
        }

        Ok(())
    }
}

/// A buffer along with the span of it that holds meaningful data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexBufferInfo {
    pub buffer: BufferId,

    /// The offset in bytes of the first meaningful byte.
    pub offset: DeviceSize,

    /// The size in bytes of the meaningful data, starting at `offset`.
    pub data_size: DeviceSize,
}

/// Fills `dst` by repeating `pattern`, restarting it from its first byte.
///
/// # Panics
///
/// - Panics if `pattern` is empty.
pub fn fill_with_pattern(dst: &mut [u8], pattern: &[u8]) {
    assert!(!pattern.is_empty());

    for chunk in dst.chunks_mut(pattern.len()) {
        chunk.copy_from_slice(&pattern[..chunk.len()]);
    }
}

/// Builds the contents of a vertex buffer: `data_offset` bytes of [`FILL_PATTERN`], then
/// `records`, then `trailing_size` more bytes of the pattern.
pub fn padded_vertex_data(
    records: &[u8],
    data_offset: DeviceSize,
    trailing_size: DeviceSize,
) -> Vec<u8> {
    let pattern = FILL_PATTERN.to_ne_bytes();
    let data_offset = data_offset as usize;
    let mut data = vec![0; data_offset + records.len() + trailing_size as usize];

    fill_with_pattern(&mut data[..data_offset], &pattern);
    data[data_offset..data_offset + records.len()].copy_from_slice(records);
    fill_with_pattern(&mut data[data_offset + records.len()..], &pattern);

    data
}

#[cfg(test)]
mod tests {
    use super::{fill_with_pattern, padded_vertex_data, Buffer, BufferUsage, FILL_PATTERN};

    #[test]
    fn pattern_restarts_per_region() {
        let mut dst = [0u8; 6];
        fill_with_pattern(&mut dst, &[1, 2, 3, 4]);
        assert_eq!(dst, [1, 2, 3, 4, 1, 2]);
    }

    #[test]
    fn vertex_data_layout() {
        let data = padded_vertex_data(&[9, 9], 5, 3);
        let pattern = FILL_PATTERN.to_ne_bytes();

        assert_eq!(data.len(), 10);
        assert_eq!(&data[..4], &pattern);
        assert_eq!(data[4], pattern[0]);
        assert_eq!(&data[5..7], &[9, 9]);
        assert_eq!(&data[7..], &pattern[..3]);
    }

    #[test]
    fn empty_buffers_are_invalid() {
        let buffer = Buffer::from_data(BufferUsage::VERTEX_BUFFER, Vec::new());
        assert!(buffer.validate().is_err());

        let buffer = Buffer::from_data(BufferUsage::INDEX_BUFFER, vec![0, 1, 2]);
        assert!(buffer.validate().is_ok());
        assert_eq!(buffer.size(), 3);
    }
}
