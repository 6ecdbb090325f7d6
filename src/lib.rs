//! Curved-outline regions for OpenGL via [glow].
//!
//! A [`Region`] collects the triangle mesh of one or more outline shapes:
//! lines and quadratic/cubic Bézier segments are tessellated by [lyon] into
//! indexed triangles, optionally transformed, and spliced into one shared
//! vertex list. A [`GlRegion`] binds that mesh to GPU buffers and draws it
//! with a single indexed draw call.
//!
//! # Sync model
//!
//! - Every mutation of the mesh marks the region dirty.
//! - [`GlRegion::draw`] uploads the mesh only when dirty, then draws. Drawing
//!   an unchanged region again issues no uploads.
//! - Uploads rewrite the index, position, and texture-coordinate buffers in
//!   full and recompute the region's bounding box.
//! - [`GlRegion::destroy`] releases the buffers. Nothing is released
//!   implicitly.
//!
//! Indices are unsigned shorts, so a region holds at most
//! [`MAX_VERTICES`] vertices; operations that would exceed it fail with
//! [`RegionError::CapacityExceeded`].
//!
//! # Safety
//!
//! Methods that touch the GPU are `unsafe`: the GL context passed in must be
//! current on the calling thread.
//!
//! [glow]: https://docs.rs/glow
//! [lyon]: https://docs.rs/lyon

mod config;
mod context;
mod error;
mod geom;
mod gl_region;
mod gpu_buffer;
mod modes;
mod region;
#[cfg(feature = "glow")]
pub mod shaders;
mod shape;
mod vbo_region;

pub use config::{AttributeLocations, RegionConfig, TessellationOptions};
pub use context::{BufferTarget, RenderContext};
pub use error::RegionError;
pub use geom::{Aabb, Triangle, Vertex};
pub use gl_region::{GlRegion, RegionBackend};
pub use lyon::math::Transform;
pub use lyon::tessellation::FillRule;
pub use modes::{RegionVariant, RenderModes, TWO_PASS_DEFAULT_TEXTURE_UNIT};
pub use region::{Region, MAX_VERTICES};
pub use shape::{OutlineShape, PathShape, PathShapeBuilder, Tessellation};
pub use vbo_region::VboRegionSinglePass;
