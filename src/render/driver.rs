use std::fmt::Debug;

use glam::Mat4;

use super::shaders::ShaderStage;

/// The graphics-driver primitives the shader loader is built on.
///
/// An implementation stands for one GL context. Every method assumes that
/// context is current on the calling thread; backends enforce this through
/// their (unsafe) constructors rather than on each call.
///
/// Handles are plain copyable ids. Releasing a handle twice is a driver-level
/// bug, so callers go through [`ShaderProgram`](super::shaders::ShaderProgram)
/// and the loader's guards instead of pairing create/delete by hand.
pub trait ShaderDriver: Clone {
    type Shader: Copy + Debug;
    type Program: Copy + Debug;
    type UniformLocation: Clone + Debug;

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String>;
    fn shader_source(&self, shader: Self::Shader, source: &str) -> Result<(), String>;
    fn compile_shader(&self, shader: Self::Shader);
    fn shader_compiled(&self, shader: Self::Shader) -> bool;
    fn shader_info_log(&self, shader: Self::Shader) -> String;
    fn delete_shader(&self, shader: Self::Shader);

    fn create_program(&self) -> Result<Self::Program, String>;
    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn detach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn link_program(&self, program: Self::Program);
    fn program_linked(&self, program: Self::Program) -> bool;
    fn program_info_log(&self, program: Self::Program) -> String;
    fn delete_program(&self, program: Self::Program);

    /// Makes `program` current, or clears the current program with `None`.
    fn use_program(&self, program: Option<Self::Program>);
    fn uniform_location(&self, program: Self::Program, name: &str)
        -> Option<Self::UniformLocation>;
    fn uniform_mat4(&self, location: &Self::UniformLocation, value: &Mat4);
}
