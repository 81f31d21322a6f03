use std::io;
use std::path::PathBuf;

use glam::{UVec2, UVec3};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("couldn't allocate `{label}` (size={size})")]
    Allocation { label: &'static str, size: UVec3 },

    #[error("couldn't read settings from `{}`", path.display())]
    ReadSettings {
        path: PathBuf,

        #[source]
        source: io::Error,
    },

    #[error("couldn't write settings into `{}`", path.display())]
    WriteSettings {
        path: PathBuf,

        #[source]
        source: io::Error,
    },

    #[error("couldn't parse settings from `{}`", path.display())]
    ParseSettings {
        path: PathBuf,

        #[source]
        source: ron::error::SpannedError,
    },

    #[error("shadow map must have at least one texel (size={size})")]
    EmptyShadowMap { size: UVec2 },

    #[error("couldn't serialize settings")]
    SerializeSettings(#[source] ron::Error),

    /// Execution context produced a different number of texels than it was
    /// asked for; that's a bug in the context.
    #[error(
        "dispatch `{label}` produced {actual} texels, but {expected} were \
         expected"
    )]
    DispatchSize {
        label: &'static str,
        expected: usize,
        actual: usize,
    },
}
