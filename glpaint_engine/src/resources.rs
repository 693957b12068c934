use err_derive::Error;
use std::{
    fs, io,
    path::{Path, PathBuf},
};

const POINT_VERTEX: &str = include_str!("../../resources/closed/shaders/point.vsh");
const POINT_FRAGMENT: &str = include_str!("../../resources/closed/shaders/point.fsh");

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error(display = "Failed to read \"{}\": {}", path_str, err)]
    Read { path_str: String, err: io::Error },
}

/// Vertex and fragment source text of one program.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSources {
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        ShaderSources {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    /// The point shaders compiled into the binary.
    pub fn point() -> Self {
        ShaderSources::new(POINT_VERTEX, POINT_FRAGMENT)
    }

    pub fn load(
        vert_path: impl AsRef<Path>,
        frag_path: impl AsRef<Path>,
        dev: bool,
    ) -> Result<Self, ResourceError> {
        Ok(ShaderSources {
            vertex: read(resource_path(vert_path, dev, false))?,
            fragment: read(resource_path(frag_path, dev, false))?,
        })
    }
}

fn read(path: PathBuf) -> Result<String, ResourceError> {
    fs::read_to_string(&path).map_err(|err| ResourceError::Read {
        path_str: path.display().to_string(),
        err,
    })
}

/// Open resources (the config) sit next to the binary, closed ones (shaders)
/// under `res/`. `--dev` reads both straight from the source tree.
pub fn resource_path(path: impl AsRef<Path>, dev: bool, open: bool) -> PathBuf {
    let mut res_path = PathBuf::from(match (dev, open) {
        (true, true) => "./resources/open/",
        (true, false) => "./resources/closed/",
        (false, true) => "./",
        (false, false) => "./res/",
    });

    res_path.push(path);

    res_path
}
