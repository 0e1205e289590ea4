pub mod camera;
pub mod driver;
pub mod gl_driver;
pub mod glow_driver;
#[cfg(test)]
pub(crate) mod mock;
pub mod shaders;
pub mod triangle;

pub use camera::Camera;
pub use driver::ShaderDriver;
pub use gl_driver::GlDriver;
pub use glow_driver::GlowDriver;
pub use shaders::{
    link_sources, load_shaders, ShaderError, ShaderProgram, ShaderSource, ShaderStage,
    StageDiagnostic,
};
pub use triangle::TriangleRenderer;
