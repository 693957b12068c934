pub mod point;
pub mod shaders;

use glow::HasContext;
use log::error;
use std::fmt::Debug;

/// Shader pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn gl_enum(self) -> u32 {
        match self {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        }
    }
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

/// The slice of the GL object API the shader pipeline talks to.
///
/// Every call is a synchronous round-trip on the thread owning the current
/// context. Implementors own that context for as long as they live.
pub trait Driver {
    type Program: Copy + Debug + PartialEq;
    type Shader: Copy + Debug + PartialEq;
    type UniformLocation: Clone + Debug;

    fn create_program(&self) -> Result<Self::Program, String>;
    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String>;
    fn shader_source(&self, shader: Self::Shader, source: &str);
    fn compile_shader(&self, shader: Self::Shader);
    fn shader_compile_status(&self, shader: Self::Shader) -> bool;
    fn shader_info_log(&self, shader: Self::Shader) -> String;
    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn bind_attrib_location(&self, program: Self::Program, location: u32, name: &str);
    fn link_program(&self, program: Self::Program);
    fn program_link_status(&self, program: Self::Program) -> bool;
    fn validate_program(&self, program: Self::Program);
    fn program_validate_status(&self, program: Self::Program) -> bool;
    fn program_info_log(&self, program: Self::Program) -> String;
    fn uniform_location(&self, program: Self::Program, name: &str) -> Option<Self::UniformLocation>;
    fn delete_shader(&self, shader: Self::Shader);
    fn delete_program(&self, program: Self::Program);

    fn use_program(&self, program: Option<Self::Program>);
    fn uniform_1_i32(&self, location: &Self::UniformLocation, value: i32);
    fn uniform_1_f32(&self, location: &Self::UniformLocation, value: f32);
    fn uniform_4_f32(&self, location: &Self::UniformLocation, value: &[f32; 4]);
    fn uniform_matrix_4_f32(&self, location: &Self::UniformLocation, value: &[f32; 16]);

    /// Pops the oldest pending error flag, `glow::NO_ERROR` when there is none.
    fn error(&self) -> u32;
}

/// [`Driver`] over a `glow` context.
pub struct GlowDriver {
    gl: glow::Context,
}

impl GlowDriver {
    /// # Safety
    ///
    /// `gl` must be current on the calling thread, and every later call on the
    /// driver must happen on that same thread while it stays current.
    pub unsafe fn new(gl: glow::Context) -> Self {
        GlowDriver { gl }
    }

    pub fn context(&self) -> &glow::Context {
        &self.gl
    }

    pub fn into_context(self) -> glow::Context {
        self.gl
    }
}

// The context-is-current invariant is established by `GlowDriver::new`.
impl Driver for GlowDriver {
    type Program = <glow::Context as HasContext>::Program;
    type Shader = <glow::Context as HasContext>::Shader;
    type UniformLocation = <glow::Context as HasContext>::UniformLocation;

    fn create_program(&self) -> Result<Self::Program, String> {
        unsafe { self.gl.create_program() }
    }

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String> {
        unsafe { self.gl.create_shader(stage.gl_enum()) }
    }

    fn shader_source(&self, shader: Self::Shader, source: &str) {
        unsafe { self.gl.shader_source(shader, source) }
    }

    fn compile_shader(&self, shader: Self::Shader) {
        unsafe { self.gl.compile_shader(shader) }
    }

    fn shader_compile_status(&self, shader: Self::Shader) -> bool {
        unsafe { self.gl.get_shader_compile_status(shader) }
    }

    fn shader_info_log(&self, shader: Self::Shader) -> String {
        unsafe { self.gl.get_shader_info_log(shader) }
    }

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { self.gl.attach_shader(program, shader) }
    }

    fn bind_attrib_location(&self, program: Self::Program, location: u32, name: &str) {
        unsafe { self.gl.bind_attrib_location(program, location, name) }
    }

    fn link_program(&self, program: Self::Program) {
        unsafe { self.gl.link_program(program) }
    }

    fn program_link_status(&self, program: Self::Program) -> bool {
        unsafe { self.gl.get_program_link_status(program) }
    }

    fn validate_program(&self, program: Self::Program) {
        unsafe { self.gl.validate_program(program) }
    }

    fn program_validate_status(&self, program: Self::Program) -> bool {
        unsafe { self.gl.get_program_validate_status(program) }
    }

    fn program_info_log(&self, program: Self::Program) -> String {
        unsafe { self.gl.get_program_info_log(program) }
    }

    fn uniform_location(&self, program: Self::Program, name: &str) -> Option<Self::UniformLocation> {
        unsafe { self.gl.get_uniform_location(program, name) }
    }

    fn delete_shader(&self, shader: Self::Shader) {
        unsafe { self.gl.delete_shader(shader) }
    }

    fn delete_program(&self, program: Self::Program) {
        unsafe { self.gl.delete_program(program) }
    }

    fn use_program(&self, program: Option<Self::Program>) {
        unsafe { self.gl.use_program(program) }
    }

    fn uniform_1_i32(&self, location: &Self::UniformLocation, value: i32) {
        unsafe { self.gl.uniform_1_i32(Some(location), value) }
    }

    fn uniform_1_f32(&self, location: &Self::UniformLocation, value: f32) {
        unsafe { self.gl.uniform_1_f32(Some(location), value) }
    }

    fn uniform_4_f32(&self, location: &Self::UniformLocation, value: &[f32; 4]) {
        unsafe { self.gl.uniform_4_f32_slice(Some(location), value) }
    }

    fn uniform_matrix_4_f32(&self, location: &Self::UniformLocation, value: &[f32; 16]) {
        unsafe { self.gl.uniform_matrix_4_f32_slice(Some(location), false, value) }
    }

    fn error(&self) -> u32 {
        unsafe { self.gl.get_error() }
    }
}

pub fn error_name(code: u32) -> &'static str {
    match code {
        glow::NO_ERROR => "GL_NO_ERROR",
        glow::INVALID_ENUM => "GL_INVALID_ENUM",
        glow::INVALID_VALUE => "GL_INVALID_VALUE",
        glow::INVALID_OPERATION => "GL_INVALID_OPERATION",
        glow::INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION",
        glow::OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
        _ => "unknown GL error",
    }
}

// A lost context keeps reporting errors.
const MAX_DRAINED_ERRORS: usize = 16;

/// Drains and logs pending errors, returning how many were found.
pub fn check_error<D: Driver>(driver: &D, stage: &str) -> usize {
    let mut count = 0;

    while count < MAX_DRAINED_ERRORS {
        let code = driver.error();
        if code == glow::NO_ERROR {
            break;
        }

        error!("GL error after {}: 0x{:04x} ({})", stage, code, error_name(code));
        count += 1;
    }

    count
}
