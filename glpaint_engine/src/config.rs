use err_derive::Error;
use serde_yaml::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(display = "Failed to read config file: {}", err)]
    ReadConfigFile { err: io::Error },
    #[error(display = "Failed to parse config: {}", err)]
    ParseConfig { err: serde_yaml::Error },
    #[error(display = "Config template is invalid: {}", err)]
    InvalidTemplate { err: serde_yaml::Error },
    #[error(
        display = "The structure of \"{}\" is not valid, please refer to:\n{}",
        path_str,
        template
    )]
    StructureValidation { path_str: String, template: String },
    #[error(display = "Invalid value for \"{}\"", key)]
    InvalidValue { key: String },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Brush {
    /// Brush texture width divided by this is the rendered point size.
    pub scale: f32,
    pub texture_width: f32,
    /// Premultiplied by the brush opacity.
    pub color: [f32; 4],
}

impl Brush {
    pub fn new(scale: f32, texture_width: f32, rgb: [f32; 3], opacity: f32) -> Self {
        Brush {
            scale,
            texture_width,
            color: premultiply(rgb, opacity),
        }
    }

    pub fn point_size(&self) -> f32 {
        self.texture_width / self.scale
    }

    pub fn set_rgb(&mut self, rgb: [f32; 3]) {
        self.color = premultiply(rgb, self.color[3]);
    }
}

fn premultiply(rgb: [f32; 3], opacity: f32) -> [f32; 4] {
    [rgb[0] * opacity, rgb[1] * opacity, rgb[2] * opacity, opacity]
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShaderPaths {
    pub vertex: PathBuf,
    pub fragment: PathBuf,
}

#[derive(Debug)]
pub struct Config {
    conf: Value,
}

impl Config {
    #[allow(clippy::new_ret_no_self)]
    pub fn new(path: impl AsRef<Path>, template_src: &str) -> Result<Config, ConfigError> {
        let conf_src = match fs::read_to_string(&path) {
            Ok(conf_src) => conf_src,
            Err(err) => {
                return Err(ConfigError::ReadConfigFile { err });
            }
        };

        Config::from_source(&conf_src, template_src, &path.as_ref().display().to_string())
    }

    /// `path_str` only shows up in validation errors.
    pub fn from_source(
        conf_src: &str,
        template_src: &str,
        path_str: &str,
    ) -> Result<Config, ConfigError> {
        let conf = match serde_yaml::from_str(conf_src) {
            Ok(conf) => conf,
            Err(err) => return Err(ConfigError::ParseConfig { err }),
        };

        let template: Value = serde_yaml::from_str(template_src)
            .map_err(|err| ConfigError::InvalidTemplate { err })?;

        if normalize_value(&conf) != normalize_value(&template) {
            Err(ConfigError::StructureValidation {
                path_str: path_str.to_owned(),
                template: template_src.to_owned(),
            })
        } else {
            Ok(Config { conf })
        }
    }

    pub fn get(&self) -> &Value {
        &self.conf
    }

    pub fn viewport(&self) -> Result<Viewport, ConfigError> {
        Ok(Viewport {
            width: self.positive(&["viewport", "width"])?,
            height: self.positive(&["viewport", "height"])?,
        })
    }

    pub fn brush(&self) -> Result<Brush, ConfigError> {
        let mut rgb = [0.0; 3];
        for (i, channel) in rgb.iter_mut().enumerate() {
            *channel = self.float_at(&["brush", "color"], i)?;
        }

        let opacity = self.float(&["brush", "opacity"])?;
        if !(0.0..=1.0).contains(&opacity) {
            return Err(ConfigError::InvalidValue {
                key: "brush.opacity".into(),
            });
        }

        Ok(Brush::new(
            self.positive(&["brush", "scale"])?,
            self.positive(&["brush", "texture_width"])?,
            rgb,
            opacity,
        ))
    }

    pub fn shader_paths(&self) -> Result<ShaderPaths, ConfigError> {
        Ok(ShaderPaths {
            vertex: self.string(&["shaders", "vertex"])?.into(),
            fragment: self.string(&["shaders", "fragment"])?.into(),
        })
    }

    fn lookup(&self, keys: &[&str]) -> &Value {
        keys.iter().fold(&self.conf, |value, key| &value[*key])
    }

    fn float(&self, keys: &[&str]) -> Result<f32, ConfigError> {
        self.lookup(keys)
            .as_f64()
            .map(|value| value as f32)
            .ok_or_else(|| invalid(keys))
    }

    /// Sizes and divisors: anything but a finite value above zero is invalid.
    fn positive(&self, keys: &[&str]) -> Result<f32, ConfigError> {
        let value = self.float(keys)?;
        if value > 0.0 && value.is_finite() {
            Ok(value)
        } else {
            Err(invalid(keys))
        }
    }

    fn float_at(&self, keys: &[&str], index: usize) -> Result<f32, ConfigError> {
        self.lookup(keys)
            .as_sequence()
            .and_then(|seq| seq.get(index))
            .and_then(Value::as_f64)
            .map(|value| value as f32)
            .ok_or_else(|| invalid(keys))
    }

    fn string(&self, keys: &[&str]) -> Result<&str, ConfigError> {
        self.lookup(keys).as_str().ok_or_else(|| invalid(keys))
    }
}

fn invalid(keys: &[&str]) -> ConfigError {
    ConfigError::InvalidValue { key: keys.join(".") }
}

fn normalize_value(value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::Bool(_) => Value::Bool(false),
        Value::Number(_) => Value::Number(serde_yaml::Number::from(0)),
        Value::String(_) => Value::String(String::new()),
        Value::Sequence(seq) => {
            Value::Sequence(seq.iter().map(|val| normalize_value(val)).collect())
        }
        // In this case we only normalize the value on the right
        Value::Mapping(map) => Value::Mapping(
            map.iter()
                .map(|(val1, val2)| (val1.clone(), normalize_value(val2)))
                .collect(),
        ),
    }
}
