//! Geometric primitives the region mesh is built from.

use lyon::math::{point, Transform};

use crate::error::RegionError;
use crate::region::MAX_VERTICES;

/// A mesh vertex: position, texture coordinate, and its index in the
/// region's vertex list once one has been assigned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Position in shape space. `z` is carried through unchanged by 2D
    /// transforms.
    pub position: [f32; 3],
    /// Texture coordinate uploaded alongside the position.
    pub tex_coord: [f32; 2],
    id: Option<u16>,
}

impl Vertex {
    /// Create an unindexed vertex at `(x, y, z)` with a zero texture
    /// coordinate.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: [x, y, z],
            tex_coord: [0.0, 0.0],
            id: None,
        }
    }

    /// Replace the texture coordinate.
    #[must_use]
    pub const fn with_tex_coord(mut self, u: f32, v: f32) -> Self {
        self.tex_coord = [u, v];
        self
    }

    /// Give the vertex an index, e.g. a local index within a sub-mesh that
    /// is later spliced in with [`Region::add_triangles`].
    ///
    /// [`Region::add_triangles`]: crate::Region::add_triangles
    #[must_use]
    pub const fn with_id(mut self, id: u16) -> Self {
        self.id = Some(id);
        self
    }

    /// The vertex's index into the region's vertex list, or `None` while
    /// unassigned.
    #[must_use]
    pub const fn id(&self) -> Option<u16> {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: u16) {
        self.id = Some(id);
    }

    /// Apply a 2D affine transform to `x`/`y`. The id and texture
    /// coordinate are kept.
    #[must_use]
    pub fn transformed(&self, transform: &Transform) -> Self {
        let [x, y, z] = self.position;
        let p = transform.transform_point(point(x, y));
        Self {
            position: [p.x, p.y, z],
            ..*self
        }
    }
}

/// Convert a vertex-list position into a 16-bit index.
pub(crate) fn index_for(position: usize) -> Result<u16, RegionError> {
    u16::try_from(position).map_err(|_| RegionError::CapacityExceeded {
        requested: position + 1,
        limit: MAX_VERTICES,
    })
}

/// Three vertices forming one triangle of the mesh.
///
/// The vertices' ids are the triangle's references into the region's vertex
/// list; they become the three entries of its index-buffer element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    vertices: [Vertex; 3],
}

impl Triangle {
    /// Build a triangle from three vertices.
    #[must_use]
    pub const fn new(a: Vertex, b: Vertex, c: Vertex) -> Self {
        Self {
            vertices: [a, b, c],
        }
    }

    /// The three vertices.
    #[must_use]
    pub const fn vertices(&self) -> &[Vertex; 3] {
        &self.vertices
    }

    pub(crate) fn vertices_mut(&mut self) -> &mut [Vertex; 3] {
        &mut self.vertices
    }

    /// The three vertex ids.
    #[must_use]
    pub fn ids(&self) -> [Option<u16>; 3] {
        self.vertices.map(|v| v.id)
    }

    /// `true` when no vertex of the triangle has an index yet.
    #[must_use]
    pub fn is_unindexed(&self) -> bool {
        self.vertices.iter().all(|v| v.id.is_none())
    }

    /// A transformed copy of this triangle.
    #[must_use]
    pub fn transformed(&self, transform: &Transform) -> Self {
        Self {
            vertices: self.vertices.map(|v| v.transformed(transform)),
        }
    }

    /// Shift every assigned vertex id by `offset`, used when splicing a
    /// sub-mesh behind `offset` vertices already in the region.
    ///
    /// Unassigned ids stay unassigned.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::CapacityExceeded`] if a shifted id no longer
    /// fits a 16-bit index.
    pub fn offset_indices(mut self, offset: usize) -> Result<Self, RegionError> {
        for vertex in &mut self.vertices {
            if let Some(id) = vertex.id {
                vertex.id = Some(index_for(usize::from(id) + offset)?);
            }
        }
        Ok(self)
    }
}

/// Axis-aligned bounding box accumulator.
///
/// A freshly created or [`reset`](Self::reset) box is empty: its low corner
/// is `+∞` and its high corner `-∞`, so the first [`resize`](Self::resize)
/// collapses it onto that point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    low: [f32; 3],
    high: [f32; 3],
}

impl Default for Aabb {
    fn default() -> Self {
        Self::new()
    }
}

impl Aabb {
    /// An empty box.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            low: [f32::INFINITY; 3],
            high: [f32::NEG_INFINITY; 3],
        }
    }

    /// Empty the box.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Grow the box to include `point`.
    pub fn resize(&mut self, point: [f32; 3]) {
        for axis in 0..3 {
            self.low[axis] = self.low[axis].min(point[axis]);
            self.high[axis] = self.high[axis].max(point[axis]);
        }
    }

    /// `true` until the first point is added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.low[0] > self.high[0]
    }

    /// Minimum corner.
    #[must_use]
    pub const fn low(&self) -> [f32; 3] {
        self.low
    }

    /// Maximum corner.
    #[must_use]
    pub const fn high(&self) -> [f32; 3] {
        self.high
    }

    /// Whether `point` lies inside the box, boundary included.
    #[must_use]
    pub fn contains(&self, point: [f32; 3]) -> bool {
        (0..3).all(|axis| self.low[axis] <= point[axis] && point[axis] <= self.high[axis])
    }

    /// Extent along X, zero when empty.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.extent(0)
    }

    /// Extent along Y, zero when empty.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.extent(1)
    }

    /// Extent along Z, zero when empty.
    #[must_use]
    pub fn depth(&self) -> f32 {
        self.extent(2)
    }

    fn extent(&self, axis: usize) -> f32 {
        if self.is_empty() {
            0.0
        } else {
            self.high[axis] - self.low[axis]
        }
    }
}
