//! The error type shared by every fallible region operation.

use thiserror::Error;

/// Errors raised while assembling, syncing, or drawing a region.
///
/// All variants describe caller mistakes or GL failures. None of them are
/// transient, so nothing in this crate retries.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegionError {
    /// A triangle reached buffer sync while one of its vertices had no index.
    #[error("triangle #{index} has unindexed vertices")]
    UnindexedTriangle {
        /// Position of the triangle in the region's triangle list.
        index: usize,
    },

    /// A triangle references a vertex index past the end of the vertex list.
    #[error("triangle #{triangle} references vertex {id}, but only {vertex_count} vertices exist")]
    IndexOutOfRange {
        /// Position of the offending triangle.
        triangle: usize,
        /// The out-of-range vertex index.
        id: usize,
        /// Number of vertices available at the time of the check.
        vertex_count: usize,
    },

    /// The mesh would need more vertices than a 16-bit index can address.
    #[error("{requested} vertices requested, but 16-bit indices address at most {limit}")]
    CapacityExceeded {
        /// Vertex count the operation would have produced.
        requested: usize,
        /// Maximum number of addressable vertices.
        limit: usize,
    },

    /// A render-mode bit-field carried bits with no defined meaning.
    #[error("unknown render mode bits {0:#x}")]
    UnknownRenderModes(u32),

    /// The two-pass (VBAA) backend was requested but is not provided.
    #[error("two-pass rendering (texture unit {texture_unit}) has no backend")]
    TwoPassUnsupported {
        /// Texture unit the two-pass variant would have rendered through.
        texture_unit: u32,
    },

    /// The region's GPU resources were already released.
    #[error("region has been destroyed")]
    Destroyed,

    /// A draw was requested before the mesh was ever uploaded.
    #[error("region has not been synced to the GPU")]
    NotSynced,

    /// The render context failed to create or size a GPU object.
    #[error("GPU error: {0}")]
    Gpu(String),

    /// Shader compilation, linking, or uniform lookup failed.
    #[error("shader error: {0}")]
    Shader(String),

    /// The fill tessellator rejected a path.
    #[error("tessellation failed: {0}")]
    Tessellation(String),
}
