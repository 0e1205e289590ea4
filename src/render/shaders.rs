// shaders.rs - Shader program loading

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use glam::Mat4;
use log::{debug, info, warn};
use thiserror::Error;

use super::driver::ShaderDriver;

const EMPTY_LOG: &str = "(driver returned no diagnostic)";

/// One programmable stage of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn name(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Compiler output for a stage that failed to compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageDiagnostic {
    pub stage: ShaderStage,
    pub log: String,
}

impl fmt::Display for StageDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} shader: {}", self.stage, self.log.trim_end())
    }
}

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("failed to read {stage} shader {}: {source}", .path.display())]
    Io {
        stage: ShaderStage,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("shader compilation failed:\n{}", join_diagnostics(.0))]
    Compilation(Vec<StageDiagnostic>),
    #[error("program linking failed: {}", .log.trim_end())]
    Link { log: String },
    #[error("driver could not {operation}: {message}")]
    Driver {
        operation: &'static str,
        message: String,
    },
}

impl ShaderError {
    /// Every stage diagnostic carried by a compilation failure, in stage order.
    pub fn diagnostics(&self) -> &[StageDiagnostic] {
        match self {
            Self::Compilation(diagnostics) => diagnostics,
            _ => &[],
        }
    }

    pub fn diagnostic_for(&self, stage: ShaderStage) -> Option<&StageDiagnostic> {
        self.diagnostics().iter().find(|d| d.stage == stage)
    }
}

fn join_diagnostics(diagnostics: &[StageDiagnostic]) -> String {
    diagnostics
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

fn non_empty_log(log: String) -> String {
    if log.trim().is_empty() {
        EMPTY_LOG.to_string()
    } else {
        log
    }
}

/// Shader text for one stage, either read from disk or given inline.
#[derive(Debug, Clone)]
pub struct ShaderSource {
    stage: ShaderStage,
    path: Option<PathBuf>,
    text: String,
}

impl ShaderSource {
    pub fn read<P: AsRef<Path>>(stage: ShaderStage, path: P) -> Result<Self, ShaderError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ShaderError::Io {
            stage,
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            stage,
            path: Some(path.to_path_buf()),
            text,
        })
    }

    pub fn inline(stage: ShaderStage, text: impl Into<String>) -> Self {
        Self {
            stage,
            path: None,
            text: text.into(),
        }
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    fn origin(&self) -> String {
        match &self.path {
            Some(path) => path.display().to_string(),
            None => "<inline>".to_string(),
        }
    }
}

/// Releases a shader object when it goes out of scope.
struct StageGuard<'d, D: ShaderDriver> {
    driver: &'d D,
    shader: D::Shader,
}

impl<D: ShaderDriver> Drop for StageGuard<'_, D> {
    fn drop(&mut self) {
        self.driver.delete_shader(self.shader);
    }
}

/// Releases a program object unless ownership is handed out with `into_program`.
struct ProgramGuard<'d, D: ShaderDriver> {
    driver: &'d D,
    program: D::Program,
}

impl<'d, D: ShaderDriver> ProgramGuard<'d, D> {
    fn create(driver: &'d D) -> Result<Self, ShaderError> {
        let program = driver
            .create_program()
            .map_err(|message| ShaderError::Driver {
                operation: "create a program object",
                message,
            })?;
        Ok(Self { driver, program })
    }

    fn into_program(self) -> D::Program {
        let program = self.program;
        std::mem::forget(self);
        program
    }
}

impl<D: ShaderDriver> Drop for ProgramGuard<'_, D> {
    fn drop(&mut self) {
        self.driver.delete_program(self.program);
    }
}

enum StageOutcome<'d, D: ShaderDriver> {
    Compiled(StageGuard<'d, D>),
    Failed(StageDiagnostic),
}

impl<D: ShaderDriver> StageOutcome<'_, D> {
    fn into_diagnostic(self) -> Option<StageDiagnostic> {
        match self {
            Self::Compiled(_) => None,
            Self::Failed(diagnostic) => Some(diagnostic),
        }
    }
}

fn compile_stage<'d, D: ShaderDriver>(
    driver: &'d D,
    source: &ShaderSource,
) -> Result<StageOutcome<'d, D>, ShaderError> {
    let stage = source.stage();
    info!("Compiling {} shader: {}", stage, source.origin());

    let shader = driver
        .create_shader(stage)
        .map_err(|message| ShaderError::Driver {
            operation: "create a shader object",
            message,
        })?;
    let guard = StageGuard { driver, shader };

    driver
        .shader_source(shader, source.text())
        .map_err(|message| ShaderError::Driver {
            operation: "accept shader source",
            message,
        })?;
    driver.compile_shader(shader);

    let compiled = driver.shader_compiled(shader);
    let log = driver.shader_info_log(shader);

    if !compiled {
        debug!("{} shader failed to compile", stage);
        return Ok(StageOutcome::Failed(StageDiagnostic {
            stage,
            log: non_empty_log(log),
        }));
    }

    if !log.trim().is_empty() {
        warn!("{} shader compiled with warnings: {}", stage, log.trim_end());
    }
    Ok(StageOutcome::Compiled(guard))
}

/// Compiles and links two already loaded sources into a program.
///
/// Both stages are compiled before any decision is made, so a failure in the
/// vertex stage still reports what the fragment compiler had to say. Every
/// driver object created here other than the returned program is released
/// before returning, whichever way the call ends.
pub fn link_sources<D: ShaderDriver>(
    driver: &D,
    vertex: &ShaderSource,
    fragment: &ShaderSource,
) -> Result<ShaderProgram<D>, ShaderError> {
    let vertex = compile_stage(driver, vertex)?;
    let fragment = compile_stage(driver, fragment)?;

    let (vertex, fragment) = match (vertex, fragment) {
        (StageOutcome::Compiled(vertex), StageOutcome::Compiled(fragment)) => (vertex, fragment),
        (vertex, fragment) => {
            let diagnostics = [vertex, fragment]
                .into_iter()
                .filter_map(StageOutcome::into_diagnostic)
                .collect();
            return Err(ShaderError::Compilation(diagnostics));
        }
    };

    let program = ProgramGuard::create(driver)?;
    driver.attach_shader(program.program, vertex.shader);
    driver.attach_shader(program.program, fragment.shader);

    info!("Linking program");
    driver.link_program(program.program);
    let linked = driver.program_linked(program.program);
    let log = driver.program_info_log(program.program);

    driver.detach_shader(program.program, vertex.shader);
    driver.detach_shader(program.program, fragment.shader);

    if !linked {
        return Err(ShaderError::Link {
            log: non_empty_log(log),
        });
    }
    if !log.trim().is_empty() {
        warn!("Program linked with warnings: {}", log.trim_end());
    }

    Ok(ShaderProgram::new(driver.clone(), program.into_program()))
}

/// Reads a vertex and a fragment shader from disk and links them.
///
/// Both files are read before the driver is touched, so an unreadable path
/// never leaves driver objects behind.
pub fn load_shaders<D, V, F>(
    driver: &D,
    vertex_path: V,
    fragment_path: F,
) -> Result<ShaderProgram<D>, ShaderError>
where
    D: ShaderDriver,
    V: AsRef<Path>,
    F: AsRef<Path>,
{
    let vertex = ShaderSource::read(ShaderStage::Vertex, vertex_path)?;
    let fragment = ShaderSource::read(ShaderStage::Fragment, fragment_path)?;
    link_sources(driver, &vertex, &fragment)
}

/// A linked program. The driver object is released on drop.
pub struct ShaderProgram<D: ShaderDriver> {
    driver: D,
    id: D::Program,
    uniforms: HashMap<String, Option<D::UniformLocation>>,
}

impl<D: ShaderDriver> ShaderProgram<D> {
    fn new(driver: D, id: D::Program) -> Self {
        Self {
            driver,
            id,
            uniforms: HashMap::new(),
        }
    }

    pub fn from_files<V: AsRef<Path>, F: AsRef<Path>>(
        driver: &D,
        vertex_path: V,
        fragment_path: F,
    ) -> Result<Self, ShaderError> {
        load_shaders(driver, vertex_path, fragment_path)
    }

    pub fn from_sources(driver: &D, vertex_source: &str, fragment_source: &str) -> Result<Self, ShaderError> {
        link_sources(
            driver,
            &ShaderSource::inline(ShaderStage::Vertex, vertex_source),
            &ShaderSource::inline(ShaderStage::Fragment, fragment_source),
        )
    }

    pub fn id(&self) -> D::Program {
        self.id
    }

    pub fn bind(&self) {
        self.driver.use_program(Some(self.id));
    }

    pub fn unbind(&self) {
        self.driver.use_program(None);
    }

    pub fn uniform_location(&mut self, name: &str) -> Option<D::UniformLocation> {
        if let Some(location) = self.uniforms.get(name) {
            return location.clone();
        }

        let location = self.driver.uniform_location(self.id, name);
        if location.is_none() {
            warn!("Uniform '{}' not found in shader", name);
        }

        self.uniforms.insert(name.to_string(), location.clone());
        location
    }

    /// Binds the program and uploads `value`. Returns false if the uniform
    /// does not exist (or was optimised away by the driver).
    pub fn set_uniform_mat4(&mut self, name: &str, value: &Mat4) -> bool {
        self.bind();
        match self.uniform_location(name) {
            Some(location) => {
                self.driver.uniform_mat4(&location, value);
                true
            }
            None => false,
        }
    }
}

impl<D: ShaderDriver> Drop for ShaderProgram<D> {
    fn drop(&mut self) {
        self.driver.delete_program(self.id);
    }
}
