pub mod core;
pub mod rendering;
pub mod window;

pub use self::core::{default_config_path, PlaygroundConfig};
pub use rendering::{Backend, CameraConfig, RenderConfig, ShaderConfig};
pub use window::WindowConfig;
