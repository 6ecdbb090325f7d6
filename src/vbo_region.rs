//! Single-pass backend: the mesh lives in three retained buffer objects and
//! is drawn with one indexed draw call.

use crate::config::{AttributeLocations, RegionConfig};
use crate::context::{BufferTarget, RenderContext};
use crate::error::RegionError;
use crate::geom::Aabb;
use crate::gl_region::RegionBackend;
use crate::gpu_buffer::GpuArray;
use crate::region::Region;

const LOG_TARGET: &str = "curve_region::vbo";

/// The three buffers of a synced region.
struct Buffers<B> {
    /// One `[u16; 3]` element per triangle.
    indices: GpuArray<B, [u16; 3]>,
    /// One `[f32; 3]` element per vertex.
    positions: GpuArray<B, [f32; 3]>,
    /// One `[f32; 2]` element per vertex.
    tex_coords: GpuArray<B, [f32; 2]>,
}

impl<B: Copy> Buffers<B> {
    unsafe fn create<C: RenderContext<Buffer = B>>(
        gl: &C,
        initial_elements: usize,
    ) -> Result<Self, RegionError> {
        let indices =
            unsafe { GpuArray::create(gl, BufferTarget::ElementArray, 3, initial_elements) }?;
        let positions = match unsafe { GpuArray::create(gl, BufferTarget::Array, 3, initial_elements) } {
            Ok(p) => p,
            Err(e) => {
                unsafe { indices.release(gl) };
                return Err(e);
            }
        };
        let tex_coords = match unsafe { GpuArray::create(gl, BufferTarget::Array, 2, initial_elements) } {
            Ok(t) => t,
            Err(e) => {
                unsafe {
                    indices.release(gl);
                    positions.release(gl);
                }
                return Err(e);
            }
        };
        Ok(Self {
            indices,
            positions,
            tex_coords,
        })
    }

    unsafe fn upload<C: RenderContext<Buffer = B>>(
        &mut self,
        gl: &C,
        mesh: &MeshArrays,
    ) -> Result<(), RegionError> {
        unsafe {
            self.indices.write(gl, &mesh.indices)?;
            self.positions.write(gl, &mesh.positions)?;
            self.tex_coords.write(gl, &mesh.tex_coords)?;
        }
        Ok(())
    }
}

/// CPU-side copy of everything a sync uploads.
#[derive(Debug)]
struct MeshArrays {
    indices: Vec<[u16; 3]>,
    positions: Vec<[f32; 3]>,
    tex_coords: Vec<[f32; 2]>,
    bounds: Aabb,
}

impl MeshArrays {
    /// Flatten `region` into upload order, checking every triangle index.
    fn build(region: &Region) -> Result<Self, RegionError> {
        let vertex_count = region.vertices().len();

        let mut indices = Vec::with_capacity(region.triangles().len());
        for (index, triangle) in region.triangles().iter().enumerate() {
            let [Some(a), Some(b), Some(c)] = triangle.ids() else {
                return Err(RegionError::UnindexedTriangle { index });
            };
            if let Some(&id) = [a, b, c].iter().find(|&&id| usize::from(id) >= vertex_count) {
                return Err(RegionError::IndexOutOfRange {
                    triangle: index,
                    id: usize::from(id),
                    vertex_count,
                });
            }
            indices.push([a, b, c]);
        }

        let mut bounds = Aabb::new();
        let mut positions = Vec::with_capacity(vertex_count);
        let mut tex_coords = Vec::with_capacity(vertex_count);
        for v in region.vertices() {
            positions.push(v.position);
            tex_coords.push(v.tex_coord);
            bounds.resize(v.position);
        }

        Ok(Self {
            indices,
            positions,
            tex_coords,
            bounds,
        })
    }
}

/// Buffer lifecycle of a backend. `Destroyed` is terminal.
enum BufferState<B> {
    Unallocated,
    Live(Buffers<B>),
    Destroyed,
}

/// Region backend drawing in a single pass from retained buffers.
///
/// Buffers are created on the first [`update`](RegionBackend::update) and
/// rewritten in full on every later one. After
/// [`destroy`](RegionBackend::destroy), `update` and `draw` fail with
/// [`RegionError::Destroyed`] instead of allocating again.
pub struct VboRegionSinglePass<B> {
    state: BufferState<B>,
    attributes: AttributeLocations,
    initial_element_count: usize,
    label: String,
    log_level: Option<log::Level>,
}

impl<B> VboRegionSinglePass<B> {
    /// A backend with no buffers yet, configured from `config`.
    #[must_use]
    pub fn new(config: &RegionConfig) -> Self {
        Self {
            state: BufferState::Unallocated,
            attributes: config.attributes,
            initial_element_count: config.initial_element_count,
            label: config.label.clone(),
            log_level: config.instance_log_level,
        }
    }

    fn trace(&self, message: std::fmt::Arguments<'_>) {
        if let Some(level) = self.log_level {
            log::log!(target: LOG_TARGET, level, "{} {message}", self.label);
        }
    }
}

impl<C: RenderContext> RegionBackend<C> for VboRegionSinglePass<C::Buffer> {
    unsafe fn update(&mut self, gl: &C, region: &mut Region) -> Result<(), RegionError> {
        if matches!(self.state, BufferState::Destroyed) {
            return Err(RegionError::Destroyed);
        }
        region.validate_indices()?;
        let mesh = MeshArrays::build(region)?;

        let mut buffers = match std::mem::replace(&mut self.state, BufferState::Unallocated) {
            BufferState::Live(buffers) => buffers,
            BufferState::Unallocated | BufferState::Destroyed => {
                let created = unsafe { Buffers::create(gl, self.initial_element_count) }?;
                self.trace(format_args!(
                    "created buffers for {} elements",
                    self.initial_element_count
                ));
                created
            }
        };
        let uploaded = unsafe { buffers.upload(gl, &mesh) };
        self.state = BufferState::Live(buffers);
        uploaded?;

        self.trace(format_args!(
            "synced {} triangles, {} vertices",
            mesh.indices.len(),
            mesh.positions.len()
        ));
        region.set_bounds(mesh.bounds);
        Ok(())
    }

    unsafe fn draw(&mut self, gl: &C, _region: &Region) -> Result<(), RegionError> {
        let buffers = match &self.state {
            BufferState::Live(buffers) => buffers,
            BufferState::Unallocated => return Err(RegionError::NotSynced),
            BufferState::Destroyed => return Err(RegionError::Destroyed),
        };
        let count = buffers.indices.scalar_count();
        if count == 0 {
            return Ok(());
        }

        let position = self.attributes.position;
        let tex_coord = self.attributes.tex_coord;
        unsafe {
            gl.bind_attribute(position, buffers.positions.buffer(), buffers.positions.components());
            gl.bind_attribute(tex_coord, buffers.tex_coords.buffer(), buffers.tex_coords.components());
            gl.bind_element_buffer(Some(buffers.indices.buffer()));
        }

        let drawn = unsafe { gl.draw_indexed_triangles(count) };

        unsafe {
            gl.bind_element_buffer(None);
            gl.unbind_attribute(tex_coord);
            gl.unbind_attribute(position);
        }
        drawn.map_err(RegionError::Gpu)
    }

    unsafe fn destroy(&mut self, gl: &C) {
        let BufferState::Live(buffers) = std::mem::replace(&mut self.state, BufferState::Destroyed)
        else {
            return;
        };
        self.trace(format_args!(
            "destroying buffers (index capacity {})",
            buffers.indices.capacity()
        ));
        unsafe {
            gl.unbind_attribute(self.attributes.position);
            buffers.positions.release(gl);
            gl.unbind_attribute(self.attributes.tex_coord);
            buffers.tex_coords.release(gl);
            buffers.indices.release(gl);
        }
    }

    fn holds_gpu_resources(&self) -> bool {
        matches!(self.state, BufferState::Live(_))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::context::mock::{f32s, u16s, Call, MockContext};
    use crate::geom::{Triangle, Vertex};
    use crate::modes::RenderModes;
    use crate::shape::Tessellation;

    type Backend = VboRegionSinglePass<u32>;

    fn backend() -> Backend {
        VboRegionSinglePass::new(&RegionConfig::default())
    }

    fn region() -> Region {
        Region::new(RenderModes::empty(), RegionConfig::default())
    }

    fn quad() -> Tessellation {
        Tessellation {
            vertices: vec![
                Vertex::new(-1.0, -2.0, 0.0).with_tex_coord(0.0, 0.0),
                Vertex::new(3.0, -2.0, 0.0).with_tex_coord(1.0, 0.0),
                Vertex::new(3.0, 4.0, 0.5).with_tex_coord(1.0, 1.0),
                Vertex::new(-1.0, 4.0, 0.0).with_tex_coord(0.0, 1.0),
            ],
            triangles: vec![[0, 1, 2], [0, 2, 3]],
        }
    }

    #[test]
    fn empty_region_uploads_nothing_and_draws_nothing() {
        let gl = MockContext::default();
        let mut b = backend();
        let mut r = region();

        unsafe { RegionBackend::<MockContext>::update(&mut b, &gl, &mut r) }.unwrap();
        unsafe { RegionBackend::<MockContext>::draw(&mut b, &gl, &r) }.unwrap();

        assert_eq!(gl.live_buffers().len(), 3);
        assert_eq!(
            gl.count(|c| matches!(c, Call::Write { bytes, .. } if bytes.is_empty())),
            3
        );
        assert_eq!(gl.count(|c| matches!(c, Call::Draw(_))), 0);
        assert!(r.bounds().is_empty());
        unsafe { RegionBackend::<MockContext>::destroy(&mut b, &gl) };
    }

    #[test]
    fn update_uploads_indices_positions_and_tex_coords() {
        let gl = MockContext::default();
        let mut b = backend();
        let mut r = region();
        r.add_outline_shape(&quad(), None).unwrap();

        unsafe { RegionBackend::<MockContext>::update(&mut b, &gl, &mut r) }.unwrap();

        assert_eq!(
            u16s(&gl.last_write(BufferTarget::ElementArray).unwrap()),
            [0, 1, 2, 0, 2, 3]
        );
        let writes: Vec<_> = gl
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Write {
                    target: BufferTarget::Array,
                    bytes,
                    ..
                } => Some(f32s(&bytes)),
                _ => None,
            })
            .collect();
        assert_eq!(
            writes[0],
            [-1.0, -2.0, 0.0, 3.0, -2.0, 0.0, 3.0, 4.0, 0.5, -1.0, 4.0, 0.0]
        );
        assert_eq!(writes[1], [0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0]);
        unsafe { RegionBackend::<MockContext>::destroy(&mut b, &gl) };
    }

    #[test]
    fn bounds_cover_exactly_the_current_vertices() {
        let gl = MockContext::default();
        let mut b = backend();
        let mut r = region();
        r.add_outline_shape(&quad(), None).unwrap();
        unsafe { RegionBackend::<MockContext>::update(&mut b, &gl, &mut r) }.unwrap();

        assert_eq!(r.bounds().low(), [-1.0, -2.0, 0.0]);
        assert_eq!(r.bounds().high(), [3.0, 4.0, 0.5]);
        for v in r.vertices() {
            assert!(r.bounds().contains(v.position));
        }

        let far = lyon::math::Transform::translation(100.0, 100.0);
        r.add_outline_shape(&quad(), Some(&far)).unwrap();
        unsafe { RegionBackend::<MockContext>::update(&mut b, &gl, &mut r) }.unwrap();
        assert_eq!(r.bounds().high(), [103.0, 104.0, 0.5]);
        assert_eq!(r.bounds().low(), [-1.0, -2.0, 0.0]);
        unsafe { RegionBackend::<MockContext>::destroy(&mut b, &gl) };
    }

    #[test]
    fn loose_triangles_are_indexed_during_update() {
        let gl = MockContext::default();
        let mut b = backend();
        let mut r = region();
        r.add_outline_shape(&quad(), None).unwrap();
        r.add_triangles(
            &[Triangle::new(
                Vertex::new(9.0, 9.0, 0.0),
                Vertex::new(10.0, 9.0, 0.0),
                Vertex::new(9.0, 10.0, 0.0),
            )],
            None,
            0,
        )
        .unwrap();

        unsafe { RegionBackend::<MockContext>::update(&mut b, &gl, &mut r) }.unwrap();
        assert_eq!(r.num_vertices(), 7);
        assert_eq!(
            u16s(&gl.last_write(BufferTarget::ElementArray).unwrap()),
            [0, 1, 2, 0, 2, 3, 4, 5, 6]
        );
        unsafe { RegionBackend::<MockContext>::destroy(&mut b, &gl) };
    }

    #[test]
    fn partially_indexed_triangle_aborts_before_gpu_writes() {
        let gl = MockContext::default();
        let mut b = backend();
        let mut r = region();
        r.add_outline_shape(&quad(), None).unwrap();
        r.add_triangles(
            &[Triangle::new(
                Vertex::new(0.0, 0.0, 0.0).with_id(1),
                Vertex::new(1.0, 0.0, 0.0),
                Vertex::new(0.0, 1.0, 0.0).with_id(2),
            )],
            None,
            0,
        )
        .unwrap();

        let result = unsafe { RegionBackend::<MockContext>::update(&mut b, &gl, &mut r) };
        assert_eq!(result, Err(RegionError::UnindexedTriangle { index: 2 }));
        assert!(gl.calls().is_empty());
        assert!(!RegionBackend::<MockContext>::holds_gpu_resources(&b));
    }

    #[test]
    fn dangling_index_is_reported() {
        let gl = MockContext::default();
        let mut b = backend();
        let mut r = region();
        r.add_outline_shape(&quad(), None).unwrap();
        r.add_triangles(
            &[Triangle::new(
                Vertex::new(0.0, 0.0, 0.0).with_id(0),
                Vertex::new(1.0, 0.0, 0.0).with_id(1),
                Vertex::new(0.0, 1.0, 0.0).with_id(40),
            )],
            None,
            0,
        )
        .unwrap();

        let result = unsafe { RegionBackend::<MockContext>::update(&mut b, &gl, &mut r) };
        assert_eq!(
            result,
            Err(RegionError::IndexOutOfRange {
                triangle: 2,
                id: 40,
                vertex_count: 4,
            })
        );
    }

    #[test]
    fn draw_binds_draws_and_unbinds() {
        let gl = MockContext::default();
        let mut b = backend();
        let mut r = region();
        r.add_outline_shape(&quad(), None).unwrap();
        unsafe { RegionBackend::<MockContext>::update(&mut b, &gl, &mut r) }.unwrap();
        gl.clear();

        unsafe { RegionBackend::<MockContext>::draw(&mut b, &gl, &r) }.unwrap();
        assert_eq!(
            gl.calls(),
            [
                Call::BindAttribute {
                    location: 0,
                    buffer: 2,
                    components: 3,
                },
                Call::BindAttribute {
                    location: 1,
                    buffer: 3,
                    components: 2,
                },
                Call::BindElements(Some(1)),
                Call::Draw(6),
                Call::BindElements(None),
                Call::UnbindAttribute(1),
                Call::UnbindAttribute(0),
            ]
        );
        unsafe { RegionBackend::<MockContext>::destroy(&mut b, &gl) };
    }

    #[test]
    fn buffers_are_created_once_and_grow() {
        let gl = MockContext::default();
        let mut b: Backend = VboRegionSinglePass::new(&RegionConfig {
            initial_element_count: 2,
            ..RegionConfig::default()
        });
        let mut r = region();
        r.add_outline_shape(&quad(), None).unwrap();
        unsafe { RegionBackend::<MockContext>::update(&mut b, &gl, &mut r) }.unwrap();
        r.add_outline_shape(&quad(), None).unwrap();
        unsafe { RegionBackend::<MockContext>::update(&mut b, &gl, &mut r) }.unwrap();

        assert_eq!(gl.count(|c| matches!(c, Call::Create(_))), 3);
        // Vertex buffers outgrew 2 elements on the first sync (4 vertices)
        // and again on the second (8 vertices).
        let vertex_allocations = gl.count(|c| {
            matches!(
                c,
                Call::Allocate {
                    target: BufferTarget::Array,
                    ..
                }
            )
        });
        assert_eq!(vertex_allocations, 2 + 2 + 2);
        unsafe { RegionBackend::<MockContext>::destroy(&mut b, &gl) };
    }

    #[test]
    fn destroy_releases_everything_once() {
        let gl = MockContext::default();
        let mut b = backend();
        let mut r = region();
        r.add_outline_shape(&quad(), None).unwrap();
        unsafe { RegionBackend::<MockContext>::update(&mut b, &gl, &mut r) }.unwrap();
        unsafe { RegionBackend::<MockContext>::draw(&mut b, &gl, &r) }.unwrap();

        unsafe { RegionBackend::<MockContext>::destroy(&mut b, &gl) };
        assert!(gl.live_buffers().is_empty());
        assert!(!RegionBackend::<MockContext>::holds_gpu_resources(&b));

        gl.clear();
        unsafe { RegionBackend::<MockContext>::destroy(&mut b, &gl) };
        assert!(gl.calls().is_empty());
        assert_eq!(
            unsafe { RegionBackend::<MockContext>::draw(&mut b, &gl, &r) },
            Err(RegionError::Destroyed)
        );
    }

    #[test]
    fn update_after_destroy_fails_without_allocating() {
        let gl = MockContext::default();
        let mut b = backend();
        let mut r = region();
        r.add_outline_shape(&quad(), None).unwrap();
        unsafe { RegionBackend::<MockContext>::update(&mut b, &gl, &mut r) }.unwrap();
        unsafe { RegionBackend::<MockContext>::destroy(&mut b, &gl) };
        gl.clear();

        assert_eq!(
            unsafe { RegionBackend::<MockContext>::update(&mut b, &gl, &mut r) },
            Err(RegionError::Destroyed)
        );
        assert!(gl.calls().is_empty());
        assert!(!RegionBackend::<MockContext>::holds_gpu_resources(&b));
    }

    #[test]
    fn draw_before_update_is_not_synced() {
        let gl = MockContext::default();
        let mut b = backend();
        let r = region();
        assert_eq!(
            unsafe { RegionBackend::<MockContext>::draw(&mut b, &gl, &r) },
            Err(RegionError::NotSynced)
        );
        assert!(gl.calls().is_empty());
    }

    #[test]
    fn destroy_without_update_is_a_no_op() {
        let gl = MockContext::default();
        let mut b = backend();
        unsafe { RegionBackend::<MockContext>::destroy(&mut b, &gl) };
        assert!(gl.calls().is_empty());
    }
}
