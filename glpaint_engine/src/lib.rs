pub mod config;
pub mod logger;
pub mod math;
pub mod prelude;
pub mod rendering;
pub mod resources;

use crate::{
    config::{Brush, Config, ConfigError, Viewport},
    logger::{Logger, LoggerInitError},
    math::Matrix4,
    rendering::{
        point::{PointProgram, POINT_ATTRIBUTES, POINT_UNIFORMS},
        shaders::{detect_attributes, AttributeBinding, BuildError},
        Driver,
    },
    resources::{resource_path, ResourceError, ShaderSources},
};
use clap::{App, Arg, ArgMatches};
use err_derive::Error;
use log::info;

#[macro_export]
macro_rules! include_resource {
    (open: $file:expr) => {
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/resources/open/", $file))
    };
    (closed: $file:expr) => {
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/resources/closed/", $file))
    };
}

#[derive(Debug, Error)]
pub enum PainterInitError {
    #[error(display = "Failed to init logger: {}", err)]
    LoggerInit { err: LoggerInitError },
    #[error(display = "Config error: {}", err)]
    Config { err: ConfigError },
    #[error(display = "Failed to load shaders: {}", err)]
    Resource { err: ResourceError },
}

impl From<ConfigError> for PainterInitError {
    fn from(err: ConfigError) -> Self {
        PainterInitError::Config { err }
    }
}

impl From<ResourceError> for PainterInitError {
    fn from(err: ResourceError) -> Self {
        PainterInitError::Resource { err }
    }
}

pub fn cli<'a, 'b>(version: &'b str) -> App<'a, 'b> {
    App::new("glpaint")
        .version(version)
        .about("Finger painting with point sprites")
        .arg(Arg::with_name("dev").long("dev").help("Development mode"))
        .arg(
            Arg::with_name("no-color")
                .long("no-color")
                .short("c")
                .help("Don't color the console log"),
        )
        .arg(
            Arg::with_name("builtin-shaders")
                .long("builtin-shaders")
                .help("Use the compiled-in point shaders instead of the configured files"),
        )
}

/// What a point program build will be fed, computed without touching a context.
#[derive(Debug, Clone, PartialEq)]
pub struct Preflight {
    pub attributes: Vec<AttributeBinding>,
    pub uniforms: Vec<&'static str>,
    pub mvp: Matrix4,
    pub point_size: f32,
}

pub struct Painter {
    config: Config,
    viewport: Viewport,
    brush: Brush,
    shaders: ShaderSources,
}

impl Painter {
    /// Parses the command line, starts the logger and loads the config and
    /// shader sources.
    #[allow(clippy::new_ret_no_self)]
    pub fn new(version: &str, config_name: &str, template: &[u8]) -> Result<Self, PainterInitError> {
        let args = cli(version).get_matches();

        Logger::init(!args.is_present("no-color"))
            .map_err(|err| PainterInitError::LoggerInit { err })?;

        let painter = Painter::from_args(&args, config_name, template)?;

        info!("Painter initialized");

        Ok(painter)
    }

    pub fn from_args(
        args: &ArgMatches,
        config_name: &str,
        template: &[u8],
    ) -> Result<Self, PainterInitError> {
        let dev = args.is_present("dev");

        let config = Config::new(
            resource_path(config_name, dev, true),
            &String::from_utf8_lossy(template),
        )?;

        let shaders = if args.is_present("builtin-shaders") {
            ShaderSources::point()
        } else {
            let paths = config.shader_paths()?;
            ShaderSources::load(paths.vertex, paths.fragment, dev)?
        };

        Ok(Painter::from_parts(config, shaders)?)
    }

    pub fn from_parts(config: Config, shaders: ShaderSources) -> Result<Self, ConfigError> {
        Ok(Painter {
            viewport: config.viewport()?,
            brush: config.brush()?,
            config,
            shaders,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn brush(&self) -> &Brush {
        &self.brush
    }

    pub fn shaders(&self) -> &ShaderSources {
        &self.shaders
    }

    pub fn preflight(&self) -> Preflight {
        let preflight = Preflight {
            attributes: detect_attributes(&self.shaders.vertex, &POINT_ATTRIBUTES),
            uniforms: POINT_UNIFORMS.to_vec(),
            mvp: Matrix4::viewport_mvp(self.viewport.width, self.viewport.height),
            point_size: self.brush.point_size(),
        };

        for binding in &preflight.attributes {
            info!("Attribute \"{}\" -> location {}", binding.name, binding.location);
        }
        info!("Uniforms: {}", preflight.uniforms.join(", "));
        info!(
            "MVP for {}x{}: {:?}",
            self.viewport.width, self.viewport.height, preflight.mvp.m
        );
        info!("Point size: {}", preflight.point_size);

        preflight
    }

    /// Builds the point program on the current context and sets its uniforms.
    pub fn build_point_program<'d, D: Driver>(
        &self,
        driver: &'d D,
    ) -> Result<PointProgram<'d, D>, BuildError> {
        let program = PointProgram::build(driver, &self.shaders)?;
        program.initialize(&self.brush, self.viewport.width, self.viewport.height);

        Ok(program)
    }
}
