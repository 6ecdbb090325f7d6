//! GPU lifecycle of a region: lazy sync on dirty, draw, and destroy.

use crate::config::RegionConfig;
use crate::context::RenderContext;
use crate::error::RegionError;
use crate::modes::{RegionVariant, RenderModes};
use crate::region::Region;
use crate::vbo_region::VboRegionSinglePass;

/// GPU-side half of a [`GlRegion`]: keeps buffers in step with a
/// [`Region`] and draws them.
///
/// # Safety
///
/// All methods issue GPU calls through `gl` and require its context to be
/// current on the calling thread.
pub trait RegionBackend<C: RenderContext> {
    /// Bring GPU buffers in line with `region`. Allocates them on first use.
    ///
    /// # Safety
    ///
    /// See the trait documentation.
    ///
    /// # Errors
    ///
    /// Fails if the mesh is inconsistent or the context cannot provide
    /// buffers. GPU contents must be left as they were before the call on a
    /// mesh error. After [`destroy`](Self::destroy) this fails with
    /// [`RegionError::Destroyed`] rather than allocating again.
    ///
    /// A successful update stores the mesh's bounds with
    /// [`Region::set_bounds`] or [`Region::recompute_bounds`].
    unsafe fn update(&mut self, gl: &C, region: &mut Region) -> Result<(), RegionError>;

    /// Draw the buffers as of the last successful [`update`](Self::update).
    ///
    /// # Safety
    ///
    /// See the trait documentation.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::NotSynced`] before the first update and
    /// [`RegionError::Destroyed`] after [`destroy`](Self::destroy).
    unsafe fn draw(&mut self, gl: &C, region: &Region) -> Result<(), RegionError>;

    /// Release every GPU resource. Must be a no-op when nothing is held.
    /// Terminal: later updates and draws fail.
    ///
    /// # Safety
    ///
    /// See the trait documentation.
    unsafe fn destroy(&mut self, gl: &C);

    /// Whether GPU resources are currently allocated.
    fn holds_gpu_resources(&self) -> bool;
}

/// A [`Region`] bound to GPU buffers through a [`RegionBackend`].
///
/// The mesh is only uploaded from [`draw`](Self::draw), and only when it
/// changed since the last upload. [`destroy`](Self::destroy) is terminal:
/// GPU resources are never released implicitly, so a region that is dropped
/// without being destroyed leaks them.
///
/// # Example
///
/// ```no_run
/// # use curve_region::{GlRegion, PathShape, RegionConfig, RenderModes};
/// # fn example(gl: &glow::Context) -> Result<(), curve_region::RegionError> {
/// let mut region: GlRegion<glow::Context> =
///     GlRegion::create(RenderModes::empty(), RegionConfig::default())?;
///
/// let mut shape = PathShape::builder();
/// shape.move_to(0.0, 0.0).quad_to(50.0, 100.0, 100.0, 0.0).close();
/// region.region_mut().add_outline_shape(&shape.build(), None)?;
///
/// // Each frame, with the region shader program bound:
/// unsafe { region.draw(gl) }?;
///
/// // On teardown:
/// unsafe { region.destroy(gl) };
/// # Ok(())
/// # }
/// ```
pub struct GlRegion<C: RenderContext> {
    region: Region,
    backend: Box<dyn RegionBackend<C>>,
    destroyed: bool,
}

impl<C: RenderContext + 'static> GlRegion<C> {
    /// Create a region with the backend `render_modes` call for.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::TwoPassUnsupported`] when
    /// [`RenderModes::VBAA_RENDERING`] is set: the two-pass backend is not
    /// part of this crate. Use [`with_backend`](Self::with_backend) to supply
    /// one.
    pub fn create(render_modes: RenderModes, config: RegionConfig) -> Result<Self, RegionError> {
        match render_modes.variant() {
            RegionVariant::SinglePass => {
                let backend = VboRegionSinglePass::new(&config);
                Ok(Self::with_backend(
                    Region::new(render_modes, config),
                    Box::new(backend),
                ))
            }
            RegionVariant::TwoPass { texture_unit } => {
                Err(RegionError::TwoPassUnsupported { texture_unit })
            }
        }
    }
}

impl<C: RenderContext> GlRegion<C> {
    /// Bind `region` to a caller-provided backend.
    pub fn with_backend(region: Region, backend: Box<dyn RegionBackend<C>>) -> Self {
        Self {
            region,
            backend,
            destroyed: false,
        }
    }

    /// The mesh.
    pub fn region(&self) -> &Region {
        &self.region
    }

    /// The mesh, for adding shapes, triangles, or vertices.
    pub fn region_mut(&mut self) -> &mut Region {
        &mut self.region
    }

    /// Whether [`destroy`](Self::destroy) has been called.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Upload the mesh if it changed, then draw it.
    ///
    /// # Safety
    ///
    /// `gl` must be current on this thread and must be the context this
    /// region has drawn with before, if any. The shader program whose
    /// attribute locations match [`RegionConfig::attributes`] must be bound.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::Destroyed`] after [`destroy`](Self::destroy),
    /// and otherwise any error of the backend's update or draw. A failed
    /// update leaves the region dirty.
    pub unsafe fn draw(&mut self, gl: &C) -> Result<(), RegionError> {
        if self.destroyed {
            return Err(RegionError::Destroyed);
        }
        if self.region.is_dirty() {
            unsafe { self.backend.update(gl, &mut self.region) }?;
            self.region.set_dirty(false);
        }
        unsafe { self.backend.draw(gl, &self.region) }
    }

    /// Release the region's GPU resources. Calling it again does nothing.
    ///
    /// # Safety
    ///
    /// `gl` must be current on this thread and be the context the region drew
    /// with.
    pub unsafe fn destroy(&mut self, gl: &C) {
        if self.destroyed {
            return;
        }
        unsafe { self.backend.destroy(gl) };
        self.destroyed = true;
    }
}

impl<C: RenderContext> Drop for GlRegion<C> {
    fn drop(&mut self) {
        if !self.destroyed && self.backend.holds_gpu_resources() {
            log::warn!(
                "{} dropped without destroy(); its GPU buffers are leaked",
                self.region.config().label
            );
        }
    }
}
