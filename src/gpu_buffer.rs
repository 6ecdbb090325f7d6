//! Growable, typed GPU buffers.

use std::marker::PhantomData;
use std::mem::size_of;

use bytemuck::Pod;

use crate::context::{BufferTarget, RenderContext};
use crate::error::RegionError;

/// A buffer object holding a run of `T` elements, each made of
/// `components` scalars.
///
/// Capacity is tracked in elements. Writing more elements than fit
/// reallocates the buffer at twice its capacity, or at the exact size needed
/// if that is larger.
#[derive(Debug)]
pub(crate) struct GpuArray<B, T> {
    buffer: B,
    target: BufferTarget,
    components: usize,
    capacity: usize,
    element_count: usize,
    _element: PhantomData<T>,
}

impl<B: Copy, T: Pod> GpuArray<B, T> {
    /// Create the buffer and allocate room for `initial_capacity` elements.
    pub(crate) unsafe fn create<C: RenderContext<Buffer = B>>(
        gl: &C,
        target: BufferTarget,
        components: usize,
        initial_capacity: usize,
    ) -> Result<Self, RegionError> {
        let buffer = unsafe { gl.create_gpu_buffer() }.map_err(RegionError::Gpu)?;
        if let Err(e) = unsafe { gl.allocate_buffer(buffer, target, initial_capacity * size_of::<T>()) } {
            unsafe { gl.release_buffer(buffer) };
            return Err(RegionError::Gpu(e));
        }
        Ok(Self {
            buffer,
            target,
            components,
            capacity: initial_capacity,
            element_count: 0,
            _element: PhantomData,
        })
    }

    /// Replace the buffer contents with `elements`, growing it first if
    /// needed.
    pub(crate) unsafe fn write<C: RenderContext<Buffer = B>>(
        &mut self,
        gl: &C,
        elements: &[T],
    ) -> Result<(), RegionError> {
        if elements.len() > self.capacity {
            let grown = elements.len().max(self.capacity * 2);
            unsafe { gl.allocate_buffer(self.buffer, self.target, grown * size_of::<T>()) }
                .map_err(RegionError::Gpu)?;
            log::trace!(
                "grew {:?} buffer from {} to {grown} elements",
                self.target,
                self.capacity
            );
            self.capacity = grown;
        }
        unsafe { gl.write_buffer(self.buffer, self.target, bytemuck::cast_slice(elements)) };
        self.element_count = elements.len();
        Ok(())
    }

    pub(crate) fn buffer(&self) -> B {
        self.buffer
    }

    pub(crate) fn components(&self) -> usize {
        self.components
    }

    pub(crate) fn element_count(&self) -> usize {
        self.element_count
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Scalars written, i.e. `element_count * components`.
    pub(crate) fn scalar_count(&self) -> usize {
        self.element_count * self.components
    }

    /// Release the buffer object.
    pub(crate) unsafe fn release<C: RenderContext<Buffer = B>>(self, gl: &C) {
        unsafe { gl.release_buffer(self.buffer) };
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::context::mock::{u16s, Call, MockContext};

    #[test]
    fn create_allocates_initial_capacity() {
        let gl = MockContext::default();
        let array: GpuArray<u32, [u16; 3]> =
            unsafe { GpuArray::create(&gl, BufferTarget::ElementArray, 3, 256) }.unwrap();
        assert_eq!(array.capacity(), 256);
        assert_eq!(array.element_count(), 0);
        assert_eq!(
            gl.calls(),
            [
                Call::Create(1),
                Call::Allocate {
                    buffer: 1,
                    target: BufferTarget::ElementArray,
                    size: 256 * 6,
                },
            ]
        );
    }

    #[test]
    fn write_within_capacity_does_not_reallocate() {
        let gl = MockContext::default();
        let mut array: GpuArray<u32, [u16; 3]> =
            unsafe { GpuArray::create(&gl, BufferTarget::ElementArray, 3, 4) }.unwrap();
        gl.clear();

        unsafe { array.write(&gl, &[[0, 1, 2], [2, 3, 0]]) }.unwrap();
        assert_eq!(gl.count(|c| matches!(c, Call::Allocate { .. })), 0);
        assert_eq!(array.element_count(), 2);
        assert_eq!(array.scalar_count(), 6);
        assert_eq!(
            u16s(&gl.last_write(BufferTarget::ElementArray).unwrap()),
            [0, 1, 2, 2, 3, 0]
        );
    }

    #[test]
    fn write_past_capacity_doubles() {
        let gl = MockContext::default();
        let mut array: GpuArray<u32, [f32; 2]> =
            unsafe { GpuArray::create(&gl, BufferTarget::Array, 2, 4) }.unwrap();
        gl.clear();

        unsafe { array.write(&gl, &[[0.0; 2]; 5]) }.unwrap();
        assert_eq!(array.capacity(), 8);
        assert_eq!(
            gl.calls()[0],
            Call::Allocate {
                buffer: 1,
                target: BufferTarget::Array,
                size: 8 * 8,
            }
        );

        unsafe { array.write(&gl, &[[0.0; 2]; 40]) }.unwrap();
        assert_eq!(array.capacity(), 40);
    }

    #[test]
    fn release_frees_the_buffer() {
        let gl = MockContext::default();
        let array: GpuArray<u32, [f32; 3]> =
            unsafe { GpuArray::create(&gl, BufferTarget::Array, 3, 1) }.unwrap();
        assert_eq!(array.buffer(), 1);
        assert_eq!(array.components(), 3);
        unsafe { array.release(&gl) };
        assert!(gl.live_buffers().is_empty());
    }
}
