use serde::{Deserialize, Serialize};

/// Which binding the shader loader talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Glow,
    Gl,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub backend: Backend,
    pub clear_color: [f32; 4],
    /// Upload the camera's MVP matrix to the `MVP` uniform each frame.
    pub transform: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Glow,
            clear_color: [0.0, 0.0, 0.4, 0.0],
            transform: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderConfig {
    pub vertex: String,
    pub fragment: String,
    /// Vertex stage used instead of `vertex` when the transform is enabled.
    pub transform_vertex: String,
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self {
            vertex: "shaders/SimpleVertexShader.vertexshader".to_string(),
            fragment: "shaders/SimpleFragmentShader.fragmentshader".to_string(),
            transform_vertex: "shaders/SimpleTransform.vertexshader".to_string(),
        }
    }
}

impl ShaderConfig {
    pub fn vertex_for(&self, transform: bool) -> &str {
        if transform {
            &self.transform_vertex
        } else {
            &self.vertex
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub eye: [f32; 3],
    pub target: [f32; 3],
    pub up: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            near: 0.1,
            far: 100.0,
            eye: [4.0, 3.0, 3.0],
            target: [0.0, 0.0, 0.0],
            up: [0.0, 1.0, 0.0],
        }
    }
}
