#![allow(dead_code)]

//! A recording stand-in for a GL context.
//!
//! "Compilation" accepts any source with a `main` and balanced brackets,
//! linking needs both stages compiled, and every `uniform` declaration of the
//! attached sources becomes active, numbered in declaration order.

use glpaint_engine::rendering::{Driver, ShaderStage};
use std::cell::RefCell;
use std::collections::HashMap;

pub const VERTEX: &str = "\
attribute vec4 inVertex;
uniform mat4 MVP;
uniform float pointSize;
uniform lowp vec4 vertexColor;
varying lowp vec4 color;
void main()
{
    gl_Position = MVP * inVertex;
    gl_PointSize = pointSize;
    color = vertexColor;
}
";

pub const FRAGMENT: &str = "\
uniform sampler2D texture;
varying lowp vec4 color;
void main()
{
    gl_FragColor = color * texture2D(texture, gl_PointCoord);
}
";

pub const BROKEN_VERTEX: &str = "\
attribute vec4 inVertex;
uniform mat4 MVP;
void main()
{
    gl_Position = MVP * inVertex;
";

pub const UNIFORMS: [&str; 4] = ["MVP", "pointSize", "vertexColor", "texture"];

#[derive(Debug, Clone, PartialEq)]
pub enum Uniform {
    Int(i32),
    Float(f32),
    Vec4([f32; 4]),
    Mat4([f32; 16]),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateProgram(u32),
    CreateShader(u32, ShaderStage),
    CompileShader(u32),
    AttachShader(u32, u32),
    BindAttribLocation(u32, u32, String),
    LinkProgram(u32),
    ValidateProgram(u32),
    DeleteShader(u32),
    DeleteProgram(u32),
    UseProgram(Option<u32>),
    SetUniform(i32, Uniform),
}

struct ShaderState {
    stage: ShaderStage,
    source: String,
    compiled: bool,
    log: String,
}

#[derive(Default)]
struct ProgramState {
    attached: Vec<u32>,
    linked: bool,
    validated: bool,
    log: String,
    uniforms: Vec<String>,
}

#[derive(Default)]
struct State {
    next_id: u32,
    shaders: HashMap<u32, ShaderState>,
    programs: HashMap<u32, ProgramState>,
    calls: Vec<Call>,
    errors: Vec<u32>,
}

impl State {
    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct FakeDriver {
    state: RefCell<State>,
    fail_validation: bool,
    fail_create_shader: Option<ShaderStage>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn failing_validation() -> Self {
        FakeDriver {
            fail_validation: true,
            ..Default::default()
        }
    }

    pub fn failing_shader_creation(stage: ShaderStage) -> Self {
        FakeDriver {
            fail_create_shader: Some(stage),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn position(&self, call: &Call) -> Option<usize> {
        self.state.borrow().calls.iter().position(|c| c == call)
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.state.borrow().calls.iter().filter(|c| pred(*c)).count()
    }

    pub fn created_shaders(&self) -> Vec<u32> {
        self.filter_ids(|call| match call {
            Call::CreateShader(id, _) => Some(*id),
            _ => None,
        })
    }

    pub fn deleted_shaders(&self) -> Vec<u32> {
        self.filter_ids(|call| match call {
            Call::DeleteShader(id) => Some(*id),
            _ => None,
        })
    }

    pub fn deleted_programs(&self) -> Vec<u32> {
        self.filter_ids(|call| match call {
            Call::DeleteProgram(id) => Some(*id),
            _ => None,
        })
    }

    pub fn bound_attributes(&self) -> Vec<(u32, String)> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter_map(|call| match call {
                Call::BindAttribLocation(_, location, name) => Some((*location, name.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn uniform_uploads(&self) -> Vec<(i32, Uniform)> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter_map(|call| match call {
                Call::SetUniform(location, value) => Some((*location, value.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn inject_error(&self, code: u32) {
        self.state.borrow_mut().errors.push(code);
    }

    fn filter_ids(&self, pick: impl Fn(&Call) -> Option<u32>) -> Vec<u32> {
        self.state.borrow().calls.iter().filter_map(pick).collect()
    }

    fn record(&self, call: Call) {
        self.state.borrow_mut().calls.push(call);
    }
}

fn check_source(source: &str) -> Result<(), String> {
    if !source.contains("void main") {
        return Err("ERROR: 0:1: 'main' : function not defined".into());
    }
    if source.matches('{').count() != source.matches('}').count() {
        return Err("ERROR: 0:1: '}' : syntax error: unbalanced braces".into());
    }
    if source.matches('(').count() != source.matches(')').count() {
        return Err("ERROR: 0:1: ')' : syntax error: unbalanced parentheses".into());
    }
    Ok(())
}

fn declared_uniforms(source: &str) -> Vec<String> {
    source
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("uniform "))
        .filter_map(|line| line.split(';').next())
        .filter_map(|decl| decl.split_whitespace().last())
        .map(|name| name.split('[').next().unwrap_or(name).to_owned())
        .collect()
}

impl Driver for FakeDriver {
    type Program = u32;
    type Shader = u32;
    type UniformLocation = i32;

    fn create_program(&self) -> Result<u32, String> {
        let mut state = self.state.borrow_mut();
        let id = state.next_id();
        state.programs.insert(id, ProgramState::default());
        state.calls.push(Call::CreateProgram(id));
        Ok(id)
    }

    fn create_shader(&self, stage: ShaderStage) -> Result<u32, String> {
        if self.fail_create_shader == Some(stage) {
            return Err(format!("out of {} shader objects", stage));
        }

        let mut state = self.state.borrow_mut();
        let id = state.next_id();
        state.shaders.insert(
            id,
            ShaderState {
                stage,
                source: String::new(),
                compiled: false,
                log: String::new(),
            },
        );
        state.calls.push(Call::CreateShader(id, stage));
        Ok(id)
    }

    fn shader_source(&self, shader: u32, source: &str) {
        if let Some(state) = self.state.borrow_mut().shaders.get_mut(&shader) {
            state.source = source.to_owned();
        }
    }

    fn compile_shader(&self, shader: u32) {
        self.record(Call::CompileShader(shader));

        if let Some(state) = self.state.borrow_mut().shaders.get_mut(&shader) {
            match check_source(&state.source) {
                Ok(()) => {
                    state.compiled = true;
                    state.log = if state.source.contains("// WARN") {
                        "WARNING: 0:1: extension directive ignored".into()
                    } else {
                        String::new()
                    };
                }
                Err(log) => {
                    state.compiled = false;
                    state.log = log;
                }
            }
        }
    }

    fn shader_compile_status(&self, shader: u32) -> bool {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .map_or(false, |s| s.compiled)
    }

    fn shader_info_log(&self, shader: u32) -> String {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .map(|s| s.log.clone())
            .unwrap_or_default()
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        self.record(Call::AttachShader(program, shader));

        if let Some(state) = self.state.borrow_mut().programs.get_mut(&program) {
            state.attached.push(shader);
        }
    }

    fn bind_attrib_location(&self, program: u32, location: u32, name: &str) {
        self.record(Call::BindAttribLocation(program, location, name.to_owned()));
    }

    fn link_program(&self, program: u32) {
        self.record(Call::LinkProgram(program));

        let mut state = self.state.borrow_mut();
        let State {
            shaders, programs, ..
        } = &mut *state;
        let prog = match programs.get_mut(&program) {
            Some(prog) => prog,
            None => return,
        };

        let attached: Vec<&ShaderState> = prog
            .attached
            .iter()
            .filter_map(|id| shaders.get(id))
            .collect();
        let has_stage = |stage: ShaderStage| attached.iter().any(|s| s.stage == stage);

        if !has_stage(ShaderStage::Vertex) || !has_stage(ShaderStage::Fragment) {
            prog.linked = false;
            prog.log = "ERROR: Missing vertex or fragment shader".into();
        } else if attached.iter().any(|s| !s.compiled) {
            prog.linked = false;
            prog.log = "ERROR: One or more attached shaders not successfully compiled".into();
        } else {
            prog.linked = true;
            prog.log = String::new();
            prog.uniforms = attached
                .iter()
                .flat_map(|s| declared_uniforms(&s.source))
                .collect();
        }
    }

    fn program_link_status(&self, program: u32) -> bool {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map_or(false, |p| p.linked)
    }

    fn validate_program(&self, program: u32) {
        self.record(Call::ValidateProgram(program));

        let fail_validation = self.fail_validation;
        if let Some(prog) = self.state.borrow_mut().programs.get_mut(&program) {
            if !prog.linked {
                prog.validated = false;
                prog.log = "Validation Failed: Program is not successfully linked".into();
            } else if fail_validation {
                prog.validated = false;
                prog.log = "Validation Failed: Sampler error".into();
            } else {
                prog.validated = true;
            }
        }
    }

    fn program_validate_status(&self, program: u32) -> bool {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map_or(false, |p| p.validated)
    }

    fn program_info_log(&self, program: u32) -> String {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map(|p| p.log.clone())
            .unwrap_or_default()
    }

    fn uniform_location(&self, program: u32, name: &str) -> Option<i32> {
        let state = self.state.borrow();
        let prog = state.programs.get(&program).filter(|p| p.linked)?;
        prog.uniforms
            .iter()
            .position(|uniform| uniform == name)
            .map(|index| index as i32)
    }

    fn delete_shader(&self, shader: u32) {
        self.record(Call::DeleteShader(shader));
    }

    fn delete_program(&self, program: u32) {
        self.record(Call::DeleteProgram(program));
    }

    fn use_program(&self, program: Option<u32>) {
        self.record(Call::UseProgram(program));
    }

    fn uniform_1_i32(&self, location: &i32, value: i32) {
        self.record(Call::SetUniform(*location, Uniform::Int(value)));
    }

    fn uniform_1_f32(&self, location: &i32, value: f32) {
        self.record(Call::SetUniform(*location, Uniform::Float(value)));
    }

    fn uniform_4_f32(&self, location: &i32, value: &[f32; 4]) {
        self.record(Call::SetUniform(*location, Uniform::Vec4(*value)));
    }

    fn uniform_matrix_4_f32(&self, location: &i32, value: &[f32; 16]) {
        self.record(Call::SetUniform(*location, Uniform::Mat4(*value)));
    }

    fn error(&self) -> u32 {
        let mut state = self.state.borrow_mut();
        if state.errors.is_empty() {
            0
        } else {
            state.errors.remove(0)
        }
    }
}
