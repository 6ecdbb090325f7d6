//! Outline shapes and their tessellation into indexed triangles.
//!
//! A shape hands the region a [`Tessellation`]: its vertices in outline
//! order together with triangles indexing into that same list. The region
//! assigns final indices in a single pass over it.

use lyon::math::point;
use lyon::path::Path as LyonPath;
use lyon::tessellation::{BuffersBuilder, FillOptions, FillTessellator, FillVertex, VertexBuffers};

use crate::config::TessellationOptions;
use crate::error::RegionError;
use crate::geom::Vertex;

/// Vertices plus triangles with indices local to `vertices`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tessellation {
    /// Vertices in outline order.
    pub vertices: Vec<Vertex>,
    /// Each entry indexes three elements of [`vertices`](Self::vertices).
    pub triangles: Vec<[u16; 3]>,
}

impl Tessellation {
    /// `true` when there is nothing to draw.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}

/// Something that can be turned into a triangle mesh.
pub trait OutlineShape {
    /// Tessellate the shape.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::Tessellation`] if the shape cannot be filled.
    fn tessellate(&self) -> Result<Tessellation, RegionError>;
}

impl OutlineShape for Tessellation {
    fn tessellate(&self) -> Result<Tessellation, RegionError> {
        Ok(self.clone())
    }
}

impl<T: OutlineShape + ?Sized> OutlineShape for &T {
    fn tessellate(&self) -> Result<Tessellation, RegionError> {
        (**self).tessellate()
    }
}

impl<T: OutlineShape + ?Sized> OutlineShape for Box<T> {
    fn tessellate(&self) -> Result<Tessellation, RegionError> {
        (**self).tessellate()
    }
}

/// A filled outline made of line and Bézier segments, tessellated by lyon.
#[derive(Debug, Clone)]
pub struct PathShape {
    path: LyonPath,
    options: TessellationOptions,
}

impl PathShape {
    /// Start building a shape.
    #[must_use]
    pub fn builder() -> PathShapeBuilder {
        PathShapeBuilder {
            builder: LyonPath::builder(),
            open: false,
        }
    }

    /// Replace the tessellation options.
    #[must_use]
    pub fn with_options(mut self, options: TessellationOptions) -> Self {
        self.options = options;
        self
    }

    /// The underlying lyon path.
    #[must_use]
    pub fn path(&self) -> &LyonPath {
        &self.path
    }
}

impl OutlineShape for PathShape {
    /// Fill-tessellate the path.
    ///
    /// Texture coordinates are the vertex position normalized to the
    /// tessellated bounds, so `(0, 0)` is the top-left and `(1, 1)` the
    /// bottom-right corner of the shape.
    fn tessellate(&self) -> Result<Tessellation, RegionError> {
        let mut geometry: VertexBuffers<[f32; 2], u16> = VertexBuffers::new();
        let mut tessellator = FillTessellator::new();

        tessellator
            .tessellate_path(
                &self.path,
                &FillOptions::tolerance(self.options.tolerance)
                    .with_fill_rule(self.options.fill_rule),
                &mut BuffersBuilder::new(&mut geometry, |vertex: FillVertex| {
                    vertex.position().to_array()
                }),
            )
            .map_err(|e| RegionError::Tessellation(format!("{e:?}")))?;

        let [min, max] = planar_bounds(&geometry.vertices);
        let span = [max[0] - min[0], max[1] - min[1]];
        let normalize = |value: f32, axis: usize| {
            if span[axis] > 0.0 {
                (value - min[axis]) / span[axis]
            } else {
                0.0
            }
        };

        let vertices = geometry
            .vertices
            .iter()
            .map(|&[x, y]| Vertex::new(x, y, 0.0).with_tex_coord(normalize(x, 0), normalize(y, 1)))
            .collect();
        let triangles = geometry
            .indices
            .chunks_exact(3)
            .map(|tri| [tri[0], tri[1], tri[2]])
            .collect();

        Ok(Tessellation {
            vertices,
            triangles,
        })
    }
}

/// Builds a [`PathShape`] from drawing commands.
pub struct PathShapeBuilder {
    builder: lyon::path::path::Builder,
    open: bool,
}

impl PathShapeBuilder {
    /// Begin a new sub-outline at `(x, y)`, ending any open one.
    pub fn move_to(&mut self, x: f32, y: f32) -> &mut Self {
        if self.open {
            self.builder.end(false);
        }
        self.builder.begin(point(x, y));
        self.open = true;
        self
    }

    /// Straight segment to `(x, y)`.
    pub fn line_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.ensure_open();
        self.builder.line_to(point(x, y));
        self
    }

    /// Quadratic Bézier with control point `(x1, y1)` ending at `(x, y)`.
    pub fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) -> &mut Self {
        self.ensure_open();
        self.builder.quadratic_bezier_to(point(x1, y1), point(x, y));
        self
    }

    /// Cubic Bézier with control points `(x1, y1)`, `(x2, y2)` ending at
    /// `(x, y)`.
    pub fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) -> &mut Self {
        self.ensure_open();
        self.builder
            .cubic_bezier_to(point(x1, y1), point(x2, y2), point(x, y));
        self
    }

    /// Close the current sub-outline back to its start.
    pub fn close(&mut self) -> &mut Self {
        if self.open {
            self.builder.close();
            self.open = false;
        }
        self
    }

    /// Finish the shape with default tessellation options.
    #[must_use]
    pub fn build(mut self) -> PathShape {
        if self.open {
            self.builder.end(false);
        }
        PathShape {
            path: self.builder.build(),
            options: TessellationOptions::default(),
        }
    }

    // Segments without a preceding move_to start at the origin.
    fn ensure_open(&mut self) {
        if !self.open {
            self.builder.begin(point(0.0, 0.0));
            self.open = true;
        }
    }
}

/// Per-axis `[min, max]` of a set of 2D points; zeros when empty.
fn planar_bounds(points: &[[f32; 2]]) -> [[f32; 2]; 2] {
    let mut min = [f32::INFINITY; 2];
    let mut max = [f32::NEG_INFINITY; 2];
    for p in points {
        for axis in 0..2 {
            min[axis] = min[axis].min(p[axis]);
            max[axis] = max[axis].max(p[axis]);
        }
    }
    if max[0] < min[0] {
        [[0.0; 2]; 2]
    } else {
        [min, max]
    }
}
