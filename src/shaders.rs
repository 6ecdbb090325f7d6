//! GLSL sources for drawing regions, and compilation helpers.
//!
//! Shaders target GLSL 1.40 (OpenGL 3.1). Attribute locations are bound
//! before linking so they match [`AttributeLocations::default`].
//!
//! [`AttributeLocations::default`]: crate::AttributeLocations

use glow::HasContext;

use crate::error::RegionError;

/// Attribute names and the locations they are bound to.
pub const REGION_ATTRIBUTES: [(u32, &str); 2] = [(0, "a_position"), (1, "a_tex_coord")];

/// Vertex shader for region meshes.
///
/// # Uniforms
///
/// | Name    | Type   | Description                         |
/// |---------|--------|-------------------------------------|
/// | `u_pmv` | `mat4` | Projection × model-view, column-major |
pub const REGION_VERTEX_SRC: &str = r"#version 140

in vec3 a_position;
in vec2 a_tex_coord;

uniform mat4 u_pmv;

out vec2 v_tex_coord;

void main() {
    v_tex_coord = a_tex_coord;
    gl_Position = u_pmv * vec4(a_position, 1.0);
}
";

/// Fragment shader for region meshes.
///
/// Blends from `u_color_a` to `u_color_b` along the texture V coordinate;
/// pass the same color twice for a solid fill. Output is premultiplied.
pub const REGION_FRAGMENT_SRC: &str = r"#version 140

in vec2 v_tex_coord;

uniform vec4 u_color_a;
uniform vec4 u_color_b;

out vec4 frag_color;

void main() {
    frag_color = mix(u_color_a, u_color_b, clamp(v_tex_coord.y, 0.0, 1.0));
    frag_color.rgb *= frag_color.a;
}
";

/// A linked region program and its uniform locations.
pub struct RegionProgram {
    program: glow::Program,
    pmv: glow::UniformLocation,
    color_a: glow::UniformLocation,
    color_b: glow::UniformLocation,
}

impl RegionProgram {
    /// Compile and link the region shaders.
    ///
    /// # Safety
    ///
    /// Requires a valid, current OpenGL context.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::Shader`] if compilation or linking fails, or if
    /// a uniform is missing from the linked program.
    pub unsafe fn new(gl: &glow::Context) -> Result<Self, RegionError> {
        let program = unsafe {
            compile_program(gl, REGION_VERTEX_SRC, REGION_FRAGMENT_SRC, &REGION_ATTRIBUTES)?
        };
        let uniform = |name: &str| {
            unsafe { gl.get_uniform_location(program, name) }
                .ok_or_else(|| RegionError::Shader(format!("{name} missing from region shader")))
        };
        let located = uniform("u_pmv")
            .and_then(|pmv| Ok((pmv, uniform("u_color_a")?, uniform("u_color_b")?)));
        match located {
            Ok((pmv, color_a, color_b)) => Ok(Self {
                program,
                pmv,
                color_a,
                color_b,
            }),
            Err(e) => {
                unsafe { gl.delete_program(program) };
                Err(e)
            }
        }
    }

    /// Make the program current and set its uniforms.
    ///
    /// # Safety
    ///
    /// Requires the context this program was created with to be current.
    pub unsafe fn bind(
        &self,
        gl: &glow::Context,
        pmv: &[f32; 16],
        color_a: [f32; 4],
        color_b: [f32; 4],
    ) {
        unsafe {
            gl.use_program(Some(self.program));
            gl.uniform_matrix_4_f32_slice(Some(&self.pmv), false, pmv);
            gl.uniform_4_f32(Some(&self.color_a), color_a[0], color_a[1], color_a[2], color_a[3]);
            gl.uniform_4_f32(Some(&self.color_b), color_b[0], color_b[1], color_b[2], color_b[3]);
        }
    }

    /// Unbind any program.
    ///
    /// # Safety
    ///
    /// Requires a valid, current OpenGL context.
    pub unsafe fn unbind(gl: &glow::Context) {
        unsafe { gl.use_program(None) };
    }

    /// Delete the program.
    ///
    /// # Safety
    ///
    /// Must be called with the context the program was created with, once.
    pub unsafe fn destroy(self, gl: &glow::Context) {
        unsafe { gl.delete_program(self.program) };
    }
}

/// Compile a program from vertex and fragment sources, binding each
/// `(location, name)` attribute before linking.
///
/// The shader objects are detached and deleted after a successful link, so
/// only the program handle needs cleaning up by the caller.
///
/// # Safety
///
/// Requires a valid, current OpenGL context.
///
/// # Errors
///
/// Returns [`RegionError::Shader`] with the driver's log if compilation or
/// linking fails.
pub unsafe fn compile_program(
    gl: &glow::Context,
    vertex_src: &str,
    fragment_src: &str,
    attributes: &[(u32, &str)],
) -> Result<glow::Program, RegionError> {
    let program = unsafe { gl.create_program() }.map_err(RegionError::Shader)?;

    let vs = match unsafe { compile_shader(gl, glow::VERTEX_SHADER, vertex_src) } {
        Ok(vs) => vs,
        Err(e) => {
            unsafe { gl.delete_program(program) };
            return Err(e);
        }
    };
    let fs = match unsafe { compile_shader(gl, glow::FRAGMENT_SHADER, fragment_src) } {
        Ok(fs) => fs,
        Err(e) => {
            unsafe {
                gl.delete_shader(vs);
                gl.delete_program(program);
            }
            return Err(e);
        }
    };

    unsafe {
        gl.attach_shader(program, vs);
        gl.attach_shader(program, fs);
        for &(location, name) in attributes {
            gl.bind_attrib_location(program, location, name);
        }
        gl.link_program(program);

        if !gl.get_program_link_status(program) {
            let log = gl.get_program_info_log(program);
            gl.delete_program(program);
            gl.delete_shader(vs);
            gl.delete_shader(fs);
            return Err(RegionError::Shader(format!("program link error: {log}")));
        }

        gl.detach_shader(program, vs);
        gl.detach_shader(program, fs);
        gl.delete_shader(vs);
        gl.delete_shader(fs);
    }

    Ok(program)
}

/// Compile a single shader stage from source.
///
/// # Safety
///
/// Requires a valid, current OpenGL context.
unsafe fn compile_shader(
    gl: &glow::Context,
    shader_type: u32,
    source: &str,
) -> Result<glow::Shader, RegionError> {
    unsafe {
        let shader = gl.create_shader(shader_type).map_err(RegionError::Shader)?;
        gl.shader_source(shader, source);
        gl.compile_shader(shader);

        if !gl.get_shader_compile_status(shader) {
            let log = gl.get_shader_info_log(shader);
            gl.delete_shader(shader);
            return Err(RegionError::Shader(format!("shader compile error: {log}")));
        }

        Ok(shader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AttributeLocations;

    #[test]
    fn bound_locations_match_backend_defaults() {
        let defaults = AttributeLocations::default();
        assert_eq!(REGION_ATTRIBUTES[0].0, defaults.position);
        assert_eq!(REGION_ATTRIBUTES[1].0, defaults.tex_coord);
    }

    #[test]
    fn vertex_shader_declares_every_bound_attribute() {
        for (_, name) in REGION_ATTRIBUTES {
            assert!(REGION_VERTEX_SRC.contains(name), "{name} missing");
        }
    }

    #[test]
    fn position_is_three_components_and_tex_coord_two() {
        assert!(REGION_VERTEX_SRC.contains("in vec3 a_position;"));
        assert!(REGION_VERTEX_SRC.contains("in vec2 a_tex_coord;"));
    }
}
