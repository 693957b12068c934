use super::{
    check_error,
    shaders::{BuildError, Program, ProgramBuilder, UniformTable},
    Driver,
};
use crate::{config::Brush, math::Matrix4, resources::ShaderSources};
use log::{info, warn};

/// Attributes the point shaders may use; the index is the bound location.
pub const POINT_ATTRIBUTES: [&str; 1] = ["inVertex"];

pub const POINT_UNIFORMS: [&str; 4] = ["MVP", "pointSize", "vertexColor", "texture"];

/// The brush texture is sampled from this unit.
pub const BRUSH_TEXTURE_UNIT: i32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointUniform {
    Mvp = 0,
    PointSize = 1,
    VertexColor = 2,
    Texture = 3,
}

impl PointUniform {
    pub fn name(self) -> &'static str {
        POINT_UNIFORMS[self as usize]
    }
}

/// The program the painting view renders brush points with.
pub struct PointProgram<'d, D: Driver> {
    program: Program<'d, D>,
    uniforms: UniformTable<D::UniformLocation>,
}

impl<'d, D: Driver> PointProgram<'d, D> {
    pub fn build(driver: &'d D, sources: &ShaderSources) -> Result<Self, BuildError> {
        let (program, uniforms) = ProgramBuilder::new(&sources.vertex, &sources.fragment)
            .detect_attributes(&POINT_ATTRIBUTES)
            .uniforms(POINT_UNIFORMS.iter().copied())
            .build(driver)?
            .into_result()?;

        Ok(PointProgram { program, uniforms })
    }

    pub fn program(&self) -> &Program<'d, D> {
        &self.program
    }

    pub fn uniforms(&self) -> &UniformTable<D::UniformLocation> {
        &self.uniforms
    }

    pub fn location(&self, uniform: PointUniform) -> Option<&D::UniformLocation> {
        self.uniforms.get(uniform as usize)
    }

    /// Sets every uniform for a `width` x `height` backing store.
    pub fn initialize(&self, brush: &Brush, width: f32, height: f32) {
        self.program.bind();

        self.with_location(PointUniform::Texture, |driver, loc| {
            driver.uniform_1_i32(loc, BRUSH_TEXTURE_UNIT)
        });
        self.upload_mvp(width, height);
        self.with_location(PointUniform::PointSize, |driver, loc| {
            driver.uniform_1_f32(loc, brush.point_size())
        });
        self.upload_color(&brush.color);

        check_error(self.program.driver(), "point program initialization");
        info!(
            "Point program initialized for {}x{}, point size {}",
            width,
            height,
            brush.point_size()
        );
    }

    /// Recomputes the projection after the backing store changed size.
    pub fn resize(&self, width: f32, height: f32) {
        self.program.bind();
        self.upload_mvp(width, height);
    }

    pub fn set_color(&self, color: &[f32; 4]) {
        self.program.bind();
        self.upload_color(color);
    }

    fn upload_mvp(&self, width: f32, height: f32) {
        let mvp = Matrix4::viewport_mvp(width, height);
        self.with_location(PointUniform::Mvp, |driver, loc| {
            driver.uniform_matrix_4_f32(loc, &mvp.m)
        });
    }

    fn upload_color(&self, color: &[f32; 4]) {
        self.with_location(PointUniform::VertexColor, |driver, loc| {
            driver.uniform_4_f32(loc, color)
        });
    }

    fn with_location<F>(&self, uniform: PointUniform, upload: F)
    where
        F: FnOnce(&D, &D::UniformLocation),
    {
        match self.location(uniform) {
            Some(loc) => upload(self.program.driver(), loc),
            None => warn!("Uniform \"{}\" is not active, skipping upload", uniform.name()),
        }
    }
}
