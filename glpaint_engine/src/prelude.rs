pub use crate::{
    config::{Brush, Config, Viewport},
    include_resource,
    logger::UnwrapOrLog,
    math::Matrix4,
    rendering::{
        point::{PointProgram, PointUniform},
        shaders::{ProgramBuilder, UniformTable},
        Driver, GlowDriver, ShaderStage,
    },
    resources::ShaderSources,
    Painter,
};
