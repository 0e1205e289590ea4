//! In-memory stand-in for a GL driver, used by the unit tests.
//!
//! Compilation fails when a stage has no `main` or contains an `#error`
//! line. Linking fails when the fragment stage reads an input the vertex
//! stage does not write. Every object is tracked so tests can assert that
//! nothing leaks and nothing is released twice.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use glam::Mat4;

use super::driver::ShaderDriver;
use super::shaders::ShaderStage;

struct MockShader {
    stage: ShaderStage,
    source: String,
    compiled: bool,
    log: String,
}

#[derive(Default)]
struct MockProgram {
    attached: Vec<u32>,
    linked: bool,
    log: String,
    uniforms: HashSet<String>,
}

#[derive(Default)]
struct MockState {
    next_id: u32,
    shaders: HashMap<u32, MockShader>,
    programs: HashMap<u32, MockProgram>,
    shaders_created: usize,
    programs_created: usize,
    refuse_programs: bool,
    current_program: Option<u32>,
    uniform_lookups: usize,
    uploads: Vec<(String, Mat4)>,
}

impl MockState {
    fn allocate(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Clone, Default)]
pub struct MockDriver {
    state: Rc<RefCell<MockState>>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refuse_programs(&self, refuse: bool) {
        self.state.borrow_mut().refuse_programs = refuse;
    }

    pub fn shaders_created(&self) -> usize {
        self.state.borrow().shaders_created
    }

    pub fn programs_created(&self) -> usize {
        self.state.borrow().programs_created
    }

    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub fn is_live_program(&self, program: u32) -> bool {
        self.state.borrow().programs.contains_key(&program)
    }

    pub fn current_program(&self) -> Option<u32> {
        self.state.borrow().current_program
    }

    pub fn uniform_lookups(&self) -> usize {
        self.state.borrow().uniform_lookups
    }

    pub fn uploaded_matrices(&self) -> Vec<(String, Mat4)> {
        self.state.borrow().uploads.clone()
    }
}

/// `(qualifier, type, name)` for every `in`/`out`/`uniform` declaration.
fn declarations(source: &str) -> Vec<(&str, &str, &str)> {
    source
        .lines()
        .filter_map(|line| {
            // Drop any `layout(...)` prefix.
            let line = match line.rfind(')') {
                Some(end) if line.trim_start().starts_with("layout") => &line[end + 1..],
                _ => line,
            };
            let mut tokens = line.trim().trim_end_matches(';').split_whitespace();
            let qualifier = tokens.find(|t| matches!(*t, "in" | "out" | "uniform"))?;
            let ty = tokens.next()?;
            let name = tokens.next()?;
            Some((qualifier, ty, name))
        })
        .collect()
}

fn compile(source: &str) -> Result<(), String> {
    for (number, line) in source.lines().enumerate() {
        if let Some(message) = line.trim().strip_prefix("#error") {
            return Err(format!("0:{}(1): error: {}", number + 1, message.trim()));
        }
    }
    if !source.contains("void main") {
        return Err("0:1(1): error: entry point `main` is not defined".to_string());
    }
    Ok(())
}

fn link(vertex: &str, fragment: &str) -> Result<(), String> {
    let outputs: HashSet<(&str, &str)> = declarations(vertex)
        .into_iter()
        .filter(|(qualifier, _, _)| *qualifier == "out")
        .map(|(_, ty, name)| (ty, name))
        .collect();

    let missing: Vec<String> = declarations(fragment)
        .into_iter()
        .filter(|(qualifier, ty, name)| *qualifier == "in" && !outputs.contains(&(*ty, *name)))
        .map(|(_, ty, name)| format!("error: fragment shader input `{ty} {name}` has no matching vertex shader output"))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(missing.join("\n"))
    }
}

impl ShaderDriver for MockDriver {
    type Shader = u32;
    type Program = u32;
    type UniformLocation = (u32, String);

    fn create_shader(&self, stage: ShaderStage) -> Result<u32, String> {
        let mut state = self.state.borrow_mut();
        let id = state.allocate();
        state.shaders_created += 1;
        state.shaders.insert(
            id,
            MockShader {
                stage,
                source: String::new(),
                compiled: false,
                log: String::new(),
            },
        );
        Ok(id)
    }

    fn shader_source(&self, shader: u32, source: &str) -> Result<(), String> {
        let mut state = self.state.borrow_mut();
        let entry = state.shaders.get_mut(&shader).ok_or("unknown shader")?;
        entry.source = source.to_string();
        Ok(())
    }

    fn compile_shader(&self, shader: u32) {
        let mut state = self.state.borrow_mut();
        let entry = state.shaders.get_mut(&shader).expect("compiling unknown shader");
        match compile(&entry.source) {
            Ok(()) => {
                entry.compiled = true;
                entry.log.clear();
            }
            Err(log) => {
                entry.compiled = false;
                entry.log = log;
            }
        }
    }

    fn shader_compiled(&self, shader: u32) -> bool {
        self.state.borrow().shaders[&shader].compiled
    }

    fn shader_info_log(&self, shader: u32) -> String {
        self.state.borrow().shaders[&shader].log.clone()
    }

    fn delete_shader(&self, shader: u32) {
        let mut state = self.state.borrow_mut();
        if state.programs.values().any(|p| p.attached.contains(&shader)) {
            panic!("shader {shader} released while still attached");
        }
        if state.shaders.remove(&shader).is_none() {
            panic!("shader {shader} released twice or never created");
        }
    }

    fn create_program(&self) -> Result<u32, String> {
        let mut state = self.state.borrow_mut();
        if state.refuse_programs {
            return Err("out of program objects".to_string());
        }
        let id = state.allocate();
        state.programs_created += 1;
        state.programs.insert(id, MockProgram::default());
        Ok(id)
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        let mut state = self.state.borrow_mut();
        assert!(state.shaders.contains_key(&shader), "attaching unknown shader");
        let entry = state.programs.get_mut(&program).expect("attaching to unknown program");
        entry.attached.push(shader);
    }

    fn detach_shader(&self, program: u32, shader: u32) {
        let mut state = self.state.borrow_mut();
        let entry = state.programs.get_mut(&program).expect("detaching from unknown program");
        entry.attached.retain(|s| *s != shader);
    }

    fn link_program(&self, program: u32) {
        let mut state = self.state.borrow_mut();
        let attached = state.programs[&program].attached.clone();

        let source_of = |stage: ShaderStage| {
            attached
                .iter()
                .map(|id| &state.shaders[id])
                .find(|s| s.stage == stage && s.compiled)
                .map(|s| s.source.clone())
        };
        let result = match (source_of(ShaderStage::Vertex), source_of(ShaderStage::Fragment)) {
            (Some(vertex), Some(fragment)) => link(&vertex, &fragment).map(|()| {
                declarations(&vertex)
                    .into_iter()
                    .chain(declarations(&fragment))
                    .filter(|(qualifier, _, _)| *qualifier == "uniform")
                    .map(|(_, _, name)| name.to_string())
                    .collect::<HashSet<_>>()
            }),
            _ => Err("error: program needs one compiled vertex and fragment stage".to_string()),
        };

        let entry = state.programs.get_mut(&program).expect("linking unknown program");
        match result {
            Ok(uniforms) => {
                entry.linked = true;
                entry.log.clear();
                entry.uniforms = uniforms;
            }
            Err(log) => {
                entry.linked = false;
                entry.log = log;
            }
        }
    }

    fn program_linked(&self, program: u32) -> bool {
        self.state.borrow().programs[&program].linked
    }

    fn program_info_log(&self, program: u32) -> String {
        self.state.borrow().programs[&program].log.clone()
    }

    fn delete_program(&self, program: u32) {
        let mut state = self.state.borrow_mut();
        if state.programs.remove(&program).is_none() {
            panic!("program {program} released twice or never created");
        }
        if state.current_program == Some(program) {
            state.current_program = None;
        }
    }

    fn use_program(&self, program: Option<u32>) {
        self.state.borrow_mut().current_program = program;
    }

    fn uniform_location(&self, program: u32, name: &str) -> Option<(u32, String)> {
        let mut state = self.state.borrow_mut();
        state.uniform_lookups += 1;
        let entry = state.programs.get(&program)?;
        entry
            .uniforms
            .contains(name)
            .then(|| (program, name.to_string()))
    }

    fn uniform_mat4(&self, location: &(u32, String), value: &Mat4) {
        self.state.borrow_mut().uploads.push((location.1.clone(), *value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declarations_skip_layout_prefix() {
        let decls = declarations("layout(location = 0) in vec3 position;\nflat out uint id;");
        assert_eq!(decls, vec![("in", "vec3", "position"), ("out", "uint", "id")]);
    }

    #[test]
    fn test_error_directive_fails_compilation() {
        let err = compile("#version 330 core\n#error nope\nvoid main() {}").unwrap_err();
        assert!(err.starts_with("0:2(1)"));
    }
}
