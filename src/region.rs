//! Mesh assembly: the triangles and vertices of one renderable shape set.

use lyon::math::Transform;

use crate::config::RegionConfig;
use crate::error::RegionError;
use crate::geom::{index_for, Aabb, Triangle, Vertex};
use crate::modes::RenderModes;
use crate::shape::OutlineShape;

/// Most vertices a region can hold: every index must fit an unsigned short.
pub const MAX_VERTICES: usize = u16::MAX as usize + 1;

const LOG_TARGET: &str = "curve_region::region";

/// Triangles and vertices accumulated from outline shapes, ready to be
/// uploaded as an indexed triangle list.
///
/// Every vertex in [`vertices`](Self::vertices) carries its own list
/// position as id. Triangles reference vertices by those ids.
///
/// Any mutation marks the region dirty; a GPU sync clears the flag.
#[derive(Debug, Clone)]
pub struct Region {
    render_modes: RenderModes,
    dirty: bool,
    num_vertices: usize,
    bounds: Aabb,
    triangles: Vec<Triangle>,
    vertices: Vec<Vertex>,
    config: RegionConfig,
}

impl Region {
    /// Create an empty region.
    #[must_use]
    pub fn new(render_modes: RenderModes, config: RegionConfig) -> Self {
        Self {
            render_modes,
            dirty: true,
            num_vertices: 0,
            bounds: Aabb::new(),
            triangles: Vec::new(),
            vertices: Vec::new(),
            config,
        }
    }

    /// The render modes fixed at construction.
    #[must_use]
    pub fn render_modes(&self) -> RenderModes {
        self.render_modes
    }

    /// Whether the region renders in two passes.
    #[must_use]
    pub fn is_vbaa(&self) -> bool {
        self.render_modes.is_vbaa()
    }

    /// Whether the region uses non-uniform curve weights.
    #[must_use]
    pub fn is_non_uniform_weight(&self) -> bool {
        self.render_modes.is_non_uniform_weight()
    }

    /// This instance's configuration.
    #[must_use]
    pub fn config(&self) -> &RegionConfig {
        &self.config
    }

    /// Number of vertices in the region. Not necessarily the number
    /// currently uploaded to the GPU.
    #[must_use]
    pub fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    /// Triangles in index-buffer order.
    #[must_use]
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Vertices in vertex-buffer order.
    #[must_use]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Bounds of all vertices as of the last GPU sync.
    #[must_use]
    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    /// Whether the mesh changed since the last GPU sync.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    /// Store the bounds computed during a GPU sync.
    ///
    /// Backends call this (or [`recompute_bounds`](Self::recompute_bounds))
    /// on every successful sync.
    pub fn set_bounds(&mut self, bounds: Aabb) {
        self.bounds = bounds;
    }

    /// Recompute the bounds from scratch over the current vertices and store
    /// them.
    pub fn recompute_bounds(&mut self) -> &Aabb {
        let mut bounds = Aabb::new();
        for v in &self.vertices {
            bounds.resize(v.position);
        }
        self.bounds = bounds;
        &self.bounds
    }

    /// Append triangles whose vertex ids are local to a sub-mesh that starts
    /// `index_offset` vertices into this region.
    ///
    /// Each triangle is transformed first when `transform` is given. The
    /// offset is applied either way.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::CapacityExceeded`] if an offset id no longer
    /// fits a 16-bit index. Nothing is appended in that case.
    pub fn add_triangles(
        &mut self,
        triangles: &[Triangle],
        transform: Option<&Transform>,
        index_offset: usize,
    ) -> Result<(), RegionError> {
        let added = triangles
            .iter()
            .map(|tri| {
                let tri = transform.map_or(*tri, |t| tri.transformed(t));
                tri.offset_indices(index_offset)
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.triangles.extend(added);
        self.trace("add_triangles");
        self.dirty = true;
        Ok(())
    }

    /// Append one vertex, transformed when `transform` is given. It is
    /// assigned the next index.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::CapacityExceeded`] once the region already
    /// holds [`MAX_VERTICES`] vertices.
    pub fn add_vertex(
        &mut self,
        vertex: Vertex,
        transform: Option<&Transform>,
    ) -> Result<(), RegionError> {
        let mut vertex = transform.map_or(vertex, |t| vertex.transformed(t));
        vertex.set_id(index_for(self.num_vertices)?);
        self.vertices.push(vertex);
        self.num_vertices += 1;
        debug_assert_eq!(self.vertices.len(), self.num_vertices);
        self.trace("add_vertex");
        self.dirty = true;
        Ok(())
    }

    /// Append a run of vertices, each assigned the next index in order.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::CapacityExceeded`] if the run does not fit.
    /// Nothing is appended in that case.
    pub fn add_vertices(&mut self, vertices: &[Vertex]) -> Result<(), RegionError> {
        self.reserve_vertices(vertices.len())?;
        let base = self.vertices.len();
        self.vertices
            .extend(vertices.iter().enumerate().map(|(k, v)| {
                let mut v = *v;
                v.set_id(to_index(base + k));
                v
            }));
        self.num_vertices = self.vertices.len();
        self.trace("add_vertices");
        self.dirty = true;
        Ok(())
    }

    /// Tessellate `shape` and merge it into the mesh, transformed when
    /// `transform` is given.
    ///
    /// The shape's vertices are appended in outline order and numbered from
    /// the current vertex count; its triangles are rebuilt from those
    /// numbered vertices, so both always agree on indices.
    ///
    /// # Errors
    ///
    /// Fails if tessellation fails, if a triangle of the tessellation
    /// indexes past its vertex list ([`RegionError::IndexOutOfRange`]), or if
    /// the vertices do not fit ([`RegionError::CapacityExceeded`]). The
    /// region is unchanged on error.
    pub fn add_outline_shape<S: OutlineShape + ?Sized>(
        &mut self,
        shape: &S,
        transform: Option<&Transform>,
    ) -> Result<(), RegionError> {
        let tessellation = shape.tessellate()?;
        let local_count = tessellation.vertices.len();
        for (triangle, indices) in tessellation.triangles.iter().enumerate() {
            if let Some(&id) = indices.iter().find(|&&i| usize::from(i) >= local_count) {
                return Err(RegionError::IndexOutOfRange {
                    triangle,
                    id: usize::from(id),
                    vertex_count: local_count,
                });
            }
        }
        self.reserve_vertices(local_count)?;

        let base = self.vertices.len();
        for (k, vertex) in tessellation.vertices.iter().enumerate() {
            let mut vertex = transform.map_or(*vertex, |t| vertex.transformed(t));
            vertex.set_id(to_index(base + k));
            self.vertices.push(vertex);
        }
        self.num_vertices = self.vertices.len();

        let merged = &self.vertices[base..];
        self.triangles.extend(tessellation.triangles.iter().map(|&[a, b, c]| {
            Triangle::new(
                merged[usize::from(a)],
                merged[usize::from(b)],
                merged[usize::from(c)],
            )
        }));

        self.trace("add_outline_shape");
        self.dirty = true;
        Ok(())
    }

    /// Merge several shapes without transforms, stopping at the first error.
    ///
    /// # Errors
    ///
    /// See [`add_outline_shape`](Self::add_outline_shape). Shapes before the
    /// failing one stay merged.
    pub fn add_outline_shapes<S: OutlineShape>(&mut self, shapes: &[S]) -> Result<(), RegionError> {
        for shape in shapes {
            self.add_outline_shape(shape, None)?;
        }
        self.trace("add_outline_shapes");
        self.dirty = true;
        Ok(())
    }

    /// Give every fully unindexed triangle three fresh indices and append its
    /// vertices to the vertex list.
    ///
    /// Triangles whose vertices already carry ids are left alone. A
    /// triangle with only some ids assigned is left as well; the GPU sync
    /// reports it.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::CapacityExceeded`] if the new vertices do not
    /// fit. The region is unchanged in that case.
    pub fn validate_indices(&mut self) -> Result<(), RegionError> {
        let pending = self.triangles.iter().filter(|t| t.is_unindexed()).count();
        if pending == 0 {
            return Ok(());
        }
        self.reserve_vertices(pending * 3)?;

        for triangle in self.triangles.iter_mut().filter(|t| t.is_unindexed()) {
            for vertex in triangle.vertices_mut() {
                vertex.set_id(to_index(self.vertices.len()));
                self.vertices.push(*vertex);
            }
        }
        self.num_vertices = self.vertices.len();
        self.trace("validate_indices");
        self.dirty = true;
        Ok(())
    }

    fn reserve_vertices(&self, additional: usize) -> Result<(), RegionError> {
        let requested = self.vertices.len() + additional;
        if requested > MAX_VERTICES {
            return Err(RegionError::CapacityExceeded {
                requested,
                limit: MAX_VERTICES,
            });
        }
        Ok(())
    }

    fn trace(&self, op: &str) {
        if let Some(level) = self.config.instance_log_level {
            log::log!(
                target: LOG_TARGET,
                level,
                "{} {op}: tris {}, verts {}",
                self.config.label,
                self.triangles.len(),
                self.vertices.len()
            );
        }
    }
}

// Only called after `reserve_vertices` has checked the range.
#[expect(clippy::cast_possible_truncation)]
fn to_index(position: usize) -> u16 {
    debug_assert!(position < MAX_VERTICES);
    position as u16
}
