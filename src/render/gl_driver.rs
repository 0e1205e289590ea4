use std::ffi::{c_void, CString};
use std::ptr;

use gl::types::*;
use glam::Mat4;

use super::driver::ShaderDriver;
use super::shaders::ShaderStage;

/// Backend over the `gl` crate's global function pointers.
#[derive(Debug, Clone, Copy)]
pub struct GlDriver {
    _loaded: (),
}

impl GlDriver {
    /// Loads every GL entry point through `loader`.
    ///
    /// # Safety
    /// The context the loader belongs to must be current on this thread for
    /// as long as the driver (or any program it produced) is used.
    pub unsafe fn load_with<F>(loader: F) -> Self
    where
        F: FnMut(&'static str) -> *const c_void,
    {
        gl::load_with(loader);
        Self { _loaded: () }
    }

    fn stage_enum(stage: ShaderStage) -> GLenum {
        match stage {
            ShaderStage::Vertex => gl::VERTEX_SHADER,
            ShaderStage::Fragment => gl::FRAGMENT_SHADER,
        }
    }

    /// Converts a driver log of `len` bytes (terminator included) into a string.
    fn read_log(len: GLint, fill: impl FnOnce(GLsizei, *mut GLchar)) -> String {
        if len <= 0 {
            return String::new();
        }
        let mut buffer: Vec<u8> = vec![0; len as usize];
        fill(len, buffer.as_mut_ptr() as *mut GLchar);
        if let Some(end) = buffer.iter().position(|&b| b == 0) {
            buffer.truncate(end);
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

impl ShaderDriver for GlDriver {
    type Shader = GLuint;
    type Program = GLuint;
    type UniformLocation = GLint;

    fn create_shader(&self, stage: ShaderStage) -> Result<GLuint, String> {
        let shader = unsafe { gl::CreateShader(Self::stage_enum(stage)) };
        if shader == 0 {
            return Err(format!("glCreateShader returned 0 for the {} stage", stage));
        }
        Ok(shader)
    }

    fn shader_source(&self, shader: GLuint, source: &str) -> Result<(), String> {
        let source = CString::new(source.as_bytes()).map_err(|e| e.to_string())?;
        unsafe {
            gl::ShaderSource(shader, 1, &source.as_ptr(), ptr::null());
        }
        Ok(())
    }

    fn compile_shader(&self, shader: GLuint) {
        unsafe { gl::CompileShader(shader) };
    }

    fn shader_compiled(&self, shader: GLuint) -> bool {
        let mut success = 0;
        unsafe {
            gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut success);
        }
        success != 0
    }

    fn shader_info_log(&self, shader: GLuint) -> String {
        let mut len = 0;
        unsafe {
            gl::GetShaderiv(shader, gl::INFO_LOG_LENGTH, &mut len);
        }
        Self::read_log(len, |len, buffer| unsafe {
            gl::GetShaderInfoLog(shader, len, ptr::null_mut(), buffer);
        })
    }

    fn delete_shader(&self, shader: GLuint) {
        unsafe { gl::DeleteShader(shader) };
    }

    fn create_program(&self) -> Result<GLuint, String> {
        let program = unsafe { gl::CreateProgram() };
        if program == 0 {
            return Err("glCreateProgram returned 0".to_string());
        }
        Ok(program)
    }

    fn attach_shader(&self, program: GLuint, shader: GLuint) {
        unsafe { gl::AttachShader(program, shader) };
    }

    fn detach_shader(&self, program: GLuint, shader: GLuint) {
        unsafe { gl::DetachShader(program, shader) };
    }

    fn link_program(&self, program: GLuint) {
        unsafe { gl::LinkProgram(program) };
    }

    fn program_linked(&self, program: GLuint) -> bool {
        let mut success = 0;
        unsafe {
            gl::GetProgramiv(program, gl::LINK_STATUS, &mut success);
        }
        success != 0
    }

    fn program_info_log(&self, program: GLuint) -> String {
        let mut len = 0;
        unsafe {
            gl::GetProgramiv(program, gl::INFO_LOG_LENGTH, &mut len);
        }
        Self::read_log(len, |len, buffer| unsafe {
            gl::GetProgramInfoLog(program, len, ptr::null_mut(), buffer);
        })
    }

    fn delete_program(&self, program: GLuint) {
        unsafe { gl::DeleteProgram(program) };
    }

    fn use_program(&self, program: Option<GLuint>) {
        unsafe { gl::UseProgram(program.unwrap_or(0)) };
    }

    fn uniform_location(&self, program: GLuint, name: &str) -> Option<GLint> {
        let name = CString::new(name).ok()?;
        let location = unsafe { gl::GetUniformLocation(program, name.as_ptr()) };
        (location != -1).then_some(location)
    }

    fn uniform_mat4(&self, location: &GLint, value: &Mat4) {
        unsafe {
            gl::UniformMatrix4fv(*location, 1, gl::FALSE, value.to_cols_array().as_ptr());
        }
    }
}
