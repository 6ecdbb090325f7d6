//! The GPU primitives a region backend needs from its render context.
//!
//! [`RenderContext`] is implemented for [`glow::Context`] when the `glow`
//! feature is enabled.

use std::fmt;

/// Binding point a buffer is sized and written through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferTarget {
    /// Vertex attribute data.
    Array,
    /// Triangle indices.
    ElementArray,
}

/// Buffer and draw primitives issued by region backends.
///
/// # Safety
///
/// Every method issues GPU calls: the context must be current on the
/// calling thread, and buffers passed in must have been created by this same
/// context and not yet released.
pub trait RenderContext {
    /// Handle to a buffer object.
    type Buffer: Copy + fmt::Debug;

    /// Create an unsized buffer object.
    ///
    /// # Safety
    ///
    /// See the trait documentation.
    ///
    /// # Errors
    ///
    /// Returns the context's error message if no buffer could be created.
    unsafe fn create_gpu_buffer(&self) -> Result<Self::Buffer, String>;

    /// (Re)allocate `buffer` to hold `size` bytes, discarding its contents.
    ///
    /// # Safety
    ///
    /// See the trait documentation.
    ///
    /// # Errors
    ///
    /// Returns an error if `size` is beyond what the context can address.
    unsafe fn allocate_buffer(
        &self,
        buffer: Self::Buffer,
        target: BufferTarget,
        size: usize,
    ) -> Result<(), String>;

    /// Overwrite the start of `buffer` with `bytes`. The buffer must have
    /// been allocated with at least `bytes.len()` bytes.
    ///
    /// # Safety
    ///
    /// See the trait documentation.
    unsafe fn write_buffer(&self, buffer: Self::Buffer, target: BufferTarget, bytes: &[u8]);

    /// Feed the float attribute at `location` from `buffer`, `components`
    /// floats per vertex, tightly packed.
    ///
    /// # Safety
    ///
    /// See the trait documentation.
    unsafe fn bind_attribute(&self, location: u32, buffer: Self::Buffer, components: usize);

    /// Stop feeding the attribute at `location`.
    ///
    /// # Safety
    ///
    /// See the trait documentation.
    unsafe fn unbind_attribute(&self, location: u32);

    /// Bind (or with `None` unbind) the element buffer used by
    /// [`draw_indexed_triangles`](Self::draw_indexed_triangles).
    ///
    /// # Safety
    ///
    /// See the trait documentation.
    unsafe fn bind_element_buffer(&self, buffer: Option<Self::Buffer>);

    /// Draw a triangle list from the first `count` unsigned-short indices of
    /// the bound element buffer.
    ///
    /// # Safety
    ///
    /// See the trait documentation.
    ///
    /// # Errors
    ///
    /// Returns an error if `count` is beyond what the context can draw.
    unsafe fn draw_indexed_triangles(&self, count: usize) -> Result<(), String>;

    /// Release `buffer`. The handle must not be used afterwards.
    ///
    /// # Safety
    ///
    /// See the trait documentation.
    unsafe fn release_buffer(&self, buffer: Self::Buffer);
}

#[cfg(feature = "glow")]
mod gl {
    use glow::HasContext;

    use super::{BufferTarget, RenderContext};

    const fn gl_target(target: BufferTarget) -> u32 {
        match target {
            BufferTarget::Array => glow::ARRAY_BUFFER,
            BufferTarget::ElementArray => glow::ELEMENT_ARRAY_BUFFER,
        }
    }

    fn gl_int(value: usize, what: &str) -> Result<i32, String> {
        i32::try_from(value).map_err(|_| format!("{what} {value} exceeds i32::MAX"))
    }

    impl RenderContext for glow::Context {
        type Buffer = glow::Buffer;

        unsafe fn create_gpu_buffer(&self) -> Result<glow::Buffer, String> {
            unsafe { self.create_buffer() }
        }

        unsafe fn allocate_buffer(
            &self,
            buffer: glow::Buffer,
            target: BufferTarget,
            size: usize,
        ) -> Result<(), String> {
            let size = gl_int(size, "buffer size")?;
            let target = gl_target(target);
            unsafe {
                self.bind_buffer(target, Some(buffer));
                self.buffer_data_size(target, size, glow::STATIC_DRAW);
                self.bind_buffer(target, None);
            }
            Ok(())
        }

        unsafe fn write_buffer(&self, buffer: glow::Buffer, target: BufferTarget, bytes: &[u8]) {
            let target = gl_target(target);
            unsafe {
                self.bind_buffer(target, Some(buffer));
                self.buffer_sub_data_u8_slice(target, 0, bytes);
                self.bind_buffer(target, None);
            }
        }

        unsafe fn bind_attribute(&self, location: u32, buffer: glow::Buffer, components: usize) {
            // Attribute sizes are 1..=4.
            #[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            let size = components as i32;
            unsafe {
                self.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
                self.enable_vertex_attrib_array(location);
                self.vertex_attrib_pointer_f32(location, size, glow::FLOAT, false, 0, 0);
                self.bind_buffer(glow::ARRAY_BUFFER, None);
            }
        }

        unsafe fn unbind_attribute(&self, location: u32) {
            unsafe { self.disable_vertex_attrib_array(location) };
        }

        unsafe fn bind_element_buffer(&self, buffer: Option<glow::Buffer>) {
            unsafe { self.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, buffer) };
        }

        unsafe fn draw_indexed_triangles(&self, count: usize) -> Result<(), String> {
            let count = gl_int(count, "index count")?;
            unsafe { self.draw_elements(glow::TRIANGLES, count, glow::UNSIGNED_SHORT, 0) };
            Ok(())
        }

        unsafe fn release_buffer(&self, buffer: glow::Buffer) {
            unsafe { self.delete_buffer(buffer) };
        }
    }
}
