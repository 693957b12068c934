//! Compiling, linking and validating shader programs.
//!
//! A build never aborts halfway: both stages get a compile attempt, the program
//! is always linked and validated, and every driver log is surfaced. Uniforms
//! are only resolved when all of that succeeded.

use super::{check_error, Driver, ShaderStage};
use err_derive::Error;
use log::{debug, error, info};
use std::fmt;
use std::mem;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeBinding {
    pub name: String,
    pub location: u32,
}

impl AttributeBinding {
    pub fn new(name: impl Into<String>, location: u32) -> Self {
        AttributeBinding {
            name: name.into(),
            location,
        }
    }
}

/// Picks the candidates that occur in `source`, bound to their index in
/// `candidates`.
///
/// This is a plain substring search. A name that only shows up in a comment or
/// as part of a longer identifier still gets bound; binding an attribute the
/// shader doesn't declare is harmless to the driver.
pub fn detect_attributes(source: &str, candidates: &[&str]) -> Vec<AttributeBinding> {
    candidates
        .iter()
        .enumerate()
        .filter(|(_, name)| !name.is_empty() && source.contains(*name))
        .map(|(location, name)| AttributeBinding::new(*name, location as u32))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildFailure {
    #[error(display = "Failed to compile {} shader:\n{}", stage, log)]
    ShaderCompile { stage: ShaderStage, log: String },
    #[error(display = "Failed to link program:\n{}", log)]
    ProgramLink { log: String },
    #[error(display = "Failed to validate program:\n{}", log)]
    ProgramValidation { log: String },
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(display = "Failed to create program object: {}", err)]
    CreateProgram { err: String },
    #[error(display = "Shader program build failed:\n{}", report)]
    Failed { report: BuildReport },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    Compile(ShaderStage),
    Link,
    Validate,
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BuildStage::Compile(stage) => write!(f, "{} shader compile", stage),
            BuildStage::Link => write!(f, "program link"),
            BuildStage::Validate => write!(f, "program validate"),
        }
    }
}

/// Status and driver output of one build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    pub vertex_compiled: bool,
    pub fragment_compiled: bool,
    pub linked: bool,
    pub validated: bool,
    /// Every non-empty info log the driver produced, in stage order.
    pub logs: Vec<(BuildStage, String)>,
    pub failures: Vec<BuildFailure>,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.vertex_compiled && self.fragment_compiled && self.linked && self.validated
    }

    pub fn log(&self, stage: BuildStage) -> Option<&str> {
        self.logs
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, log)| log.as_str())
    }

    fn set_compiled(&mut self, stage: ShaderStage, compiled: bool) {
        match stage {
            ShaderStage::Vertex => self.vertex_compiled = compiled,
            ShaderStage::Fragment => self.fragment_compiled = compiled,
        }
    }
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.failures.is_empty() {
            return write!(f, "no failures");
        }

        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", failure)?;
        }

        Ok(())
    }
}

/// A compiled shader object, deleted when dropped.
///
/// The program keeps its own copy of the code once linked, so these only need
/// to live for the duration of a build.
pub struct ShaderObject<'d, D: Driver> {
    driver: &'d D,
    handle: D::Shader,
    stage: ShaderStage,
}

impl<'d, D: Driver> ShaderObject<'d, D> {
    pub fn handle(&self) -> D::Shader {
        self.handle
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }
}

impl<'d, D: Driver> Drop for ShaderObject<'d, D> {
    fn drop(&mut self) {
        self.driver.delete_shader(self.handle);
    }
}

/// A program object. Deleted exactly once, either on drop or via
/// [`Program::release`]; [`Program::into_raw`] hands ownership to the caller.
pub struct Program<'d, D: Driver> {
    driver: &'d D,
    handle: D::Program,
}

impl<'d, D: Driver> Program<'d, D> {
    pub fn handle(&self) -> D::Program {
        self.handle
    }

    pub fn bind(&self) {
        self.driver.use_program(Some(self.handle));
    }

    pub fn driver(&self) -> &'d D {
        self.driver
    }

    pub fn release(self) {}

    /// The caller becomes responsible for `delete_program`.
    pub fn into_raw(self) -> D::Program {
        let handle = self.handle;
        mem::forget(self);
        handle
    }
}

impl<'d, D: Driver> fmt::Debug for Program<'d, D> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Program").field(&self.handle).finish()
    }
}

impl<'d, D: Driver> Drop for Program<'d, D> {
    fn drop(&mut self) {
        self.driver.delete_program(self.handle);
    }
}

/// Uniform locations in declaration order. `None` means "not found", which is
/// also what every entry holds until a build fully succeeds.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformTable<L> {
    entries: Vec<(String, Option<L>)>,
}

impl<L> UniformTable<L> {
    pub fn unresolved<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        UniformTable {
            entries: names.into_iter().map(|name| (name.into(), None)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&L> {
        self.entries.get(index).and_then(|(_, loc)| loc.as_ref())
    }

    pub fn location(&self, name: &str) -> Option<&L> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, loc)| loc.as_ref())
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|(name, _)| name.as_str())
    }

    pub fn is_resolved(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    pub fn all_resolved(&self) -> bool {
        self.entries.iter().all(|(_, loc)| loc.is_some())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&L>)> {
        self.entries
            .iter()
            .map(|(name, loc)| (name.as_str(), loc.as_ref()))
    }

    fn resolve<D>(&mut self, driver: &D, program: D::Program)
    where
        D: Driver<UniformLocation = L>,
    {
        for (name, loc) in self.entries.iter_mut() {
            if name.is_empty() {
                continue;
            }

            *loc = driver.uniform_location(program, name);
            if loc.is_none() {
                debug!("Uniform \"{}\" not found in program {:?}", name, program);
            }
        }
    }
}

/// Outcome of [`ProgramBuilder::build`]. On failure the program is still
/// handed back, with an unresolved uniform table.
pub struct ProgramBuild<'d, D: Driver> {
    pub program: Program<'d, D>,
    pub uniforms: UniformTable<D::UniformLocation>,
    pub report: BuildReport,
}

impl<'d, D: Driver> ProgramBuild<'d, D> {
    pub fn is_success(&self) -> bool {
        self.report.is_success()
    }

    /// Releases the program if the build failed.
    pub fn into_result(
        self,
    ) -> Result<(Program<'d, D>, UniformTable<D::UniformLocation>), BuildError> {
        if self.report.is_success() {
            Ok((self.program, self.uniforms))
        } else {
            self.program.release();
            Err(BuildError::Failed {
                report: self.report,
            })
        }
    }
}

pub struct ProgramBuilder<'s> {
    vertex: &'s str,
    fragment: &'s str,
    attributes: Vec<AttributeBinding>,
    uniforms: Vec<String>,
}

impl<'s> ProgramBuilder<'s> {
    pub fn new(vertex: &'s str, fragment: &'s str) -> Self {
        ProgramBuilder {
            vertex,
            fragment,
            attributes: Vec::new(),
            uniforms: Vec::new(),
        }
    }

    pub fn attribute(mut self, name: impl Into<String>, location: u32) -> Self {
        self.attributes.push(AttributeBinding::new(name, location));
        self
    }

    pub fn attributes(mut self, bindings: impl IntoIterator<Item = AttributeBinding>) -> Self {
        self.attributes.extend(bindings);
        self
    }

    /// Binds the candidates the vertex source mentions, see [`detect_attributes`].
    pub fn detect_attributes(self, candidates: &[&str]) -> Self {
        let detected = detect_attributes(self.vertex, candidates);
        self.attributes(detected)
    }

    pub fn uniforms<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.uniforms.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn attribute_bindings(&self) -> &[AttributeBinding] {
        &self.attributes
    }

    pub fn build<'d, D: Driver>(&self, driver: &'d D) -> Result<ProgramBuild<'d, D>, BuildError> {
        let handle = driver
            .create_program()
            .map_err(|err| BuildError::CreateProgram { err })?;
        let program = Program { driver, handle };
        let mut report = BuildReport::default();

        info!("Building program {:?}", handle);

        // Dropped at the end of this function, after linking.
        let vertex = compile_stage(driver, ShaderStage::Vertex, self.vertex, &mut report);
        let fragment = compile_stage(driver, ShaderStage::Fragment, self.fragment, &mut report);

        for shader in vertex.iter().chain(fragment.iter()) {
            driver.attach_shader(handle, shader.handle());
        }

        for binding in self.attributes.iter().filter(|b| !b.name.is_empty()) {
            debug!(
                "Binding attribute \"{}\" to location {}",
                binding.name, binding.location
            );
            driver.bind_attrib_location(handle, binding.location, &binding.name);
        }

        report.linked = link_program(driver, handle, &mut report);
        report.validated = validate_program(driver, handle, &mut report);

        let mut uniforms = UniformTable::unresolved(self.uniforms.iter().cloned());
        if report.is_success() {
            uniforms.resolve(driver, handle);
            info!("Program {:?} built", handle);
        } else {
            error!(
                "Program {:?} failed to build with {} error(s)",
                handle,
                report.failures.len()
            );
        }

        drop(vertex);
        drop(fragment);
        check_error(driver, "shader cleanup");

        Ok(ProgramBuild {
            program,
            uniforms,
            report,
        })
    }
}

fn compile_stage<'d, D: Driver>(
    driver: &'d D,
    stage: ShaderStage,
    source: &str,
    report: &mut BuildReport,
) -> Option<ShaderObject<'d, D>> {
    let handle = match driver.create_shader(stage) {
        Ok(handle) => handle,
        Err(err) => {
            error!("Failed to create {} shader: {}", stage, err);
            report.set_compiled(stage, false);
            report
                .failures
                .push(BuildFailure::ShaderCompile { stage, log: err });
            return None;
        }
    };
    let shader = ShaderObject {
        driver,
        handle,
        stage,
    };

    driver.shader_source(handle, source);
    driver.compile_shader(handle);

    let log = driver.shader_info_log(handle);
    if !log.trim().is_empty() {
        info!("Shader compile log:\n{}", log);
        report.logs.push((BuildStage::Compile(stage), log.clone()));
    }

    let compiled = driver.shader_compile_status(handle);
    if !compiled {
        error!("Failed to compile {} shader:\n{}", stage, source);
        report.failures.push(BuildFailure::ShaderCompile { stage, log });
    }
    report.set_compiled(stage, compiled);

    check_error(driver, "shader compile");

    Some(shader)
}

fn link_program<D: Driver>(driver: &D, program: D::Program, report: &mut BuildReport) -> bool {
    driver.link_program(program);

    let log = driver.program_info_log(program);
    if !log.trim().is_empty() {
        info!("Program link log:\n{}", log);
        report.logs.push((BuildStage::Link, log.clone()));
    }

    let linked = driver.program_link_status(program);
    if !linked {
        error!("Failed to link program {:?}", program);
        report.failures.push(BuildFailure::ProgramLink { log });
    }

    check_error(driver, "program link");

    linked
}

fn validate_program<D: Driver>(driver: &D, program: D::Program, report: &mut BuildReport) -> bool {
    driver.validate_program(program);

    let log = driver.program_info_log(program);
    if !log.trim().is_empty() {
        info!("Program validate log:\n{}", log);
        report.logs.push((BuildStage::Validate, log.clone()));
    }

    let validated = driver.program_validate_status(program);
    if !validated {
        error!("Failed to validate program {:?}", program);
        report.failures.push(BuildFailure::ProgramValidation { log });
    }

    check_error(driver, "program validate");

    validated
}
