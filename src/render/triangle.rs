use std::sync::Arc;

use anyhow::{anyhow, Result};
use glam::Mat4;
use glow::HasContext;
use log::debug;

use super::driver::ShaderDriver;
use super::shaders::ShaderProgram;

/// Three vertices, `xyz` each, in normalized device coordinates.
pub const TRIANGLE_VERTICES: [f32; 9] = [
    -1.0, -1.0, 0.0, //
    1.0, -1.0, 0.0, //
    0.0, 1.0, 0.0,
];

const POSITION_ATTRIBUTE: u32 = 0;

/// Owns the vertex array and buffer holding [`TRIANGLE_VERTICES`].
pub struct TriangleRenderer {
    gl: Arc<glow::Context>,
    vao: glow::VertexArray,
    vbo: glow::Buffer,
}

impl TriangleRenderer {
    /// Uploads the triangle. The context must be current.
    pub fn new(gl: Arc<glow::Context>) -> Result<Self> {
        unsafe {
            let vao = gl
                .create_vertex_array()
                .map_err(|e| anyhow!("Failed to create vertex array: {}", e))?;
            gl.bind_vertex_array(Some(vao));

            let vbo = match gl.create_buffer() {
                Ok(vbo) => vbo,
                Err(e) => {
                    gl.delete_vertex_array(vao);
                    return Err(anyhow!("Failed to create vertex buffer: {}", e));
                }
            };
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&TRIANGLE_VERTICES),
                glow::STATIC_DRAW,
            );
            debug!("Uploaded {} triangle vertices", TRIANGLE_VERTICES.len() / 3);

            Ok(Self { gl, vao, vbo })
        }
    }

    /// Draws the triangle with `program`, uploading `mvp` to its `MVP`
    /// uniform first when given.
    pub fn draw<D: ShaderDriver>(&self, program: &mut ShaderProgram<D>, mvp: Option<&Mat4>) {
        program.bind();
        if let Some(mvp) = mvp {
            program.set_uniform_mat4("MVP", mvp);
        }

        unsafe {
            self.gl.bind_vertex_array(Some(self.vao));
            self.gl.enable_vertex_attrib_array(POSITION_ATTRIBUTE);
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.vbo));
            self.gl
                .vertex_attrib_pointer_f32(POSITION_ATTRIBUTE, 3, glow::FLOAT, false, 0, 0);
            self.gl.draw_arrays(glow::TRIANGLES, 0, 3);
            self.gl.disable_vertex_attrib_array(POSITION_ATTRIBUTE);
        }
    }
}

impl Drop for TriangleRenderer {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_buffer(self.vbo);
            self.gl.delete_vertex_array(self.vao);
        }
    }
}
