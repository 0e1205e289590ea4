//! Shader program loading over OpenGL, and the triangle playground built on it.
//!
//! [`load_shaders`] is the entry point: it reads a vertex and a fragment
//! shader, compiles both, links them, and hands back a [`ShaderProgram`] or a
//! [`ShaderError`] describing every diagnostic the driver produced.

pub mod config;
pub mod render;

pub use config::PlaygroundConfig;
pub use render::{load_shaders, ShaderDriver, ShaderError, ShaderProgram, ShaderStage};
