//! Crate-level error types.

use std::fmt;

use crate::gpu::render_context::RenderContextError;
use crate::renderer::schedule::PassKind;

/// Errors produced by the illustrate crate.
#[derive(Debug)]
pub enum IllustrateError {
    /// GPU context initialization failure, including missing capabilities.
    Gpu(RenderContextError),
    /// A shader program failed to compose or validate. Nothing from the
    /// failed build is installed.
    ProgramBuild {
        /// Which program was being built.
        label: String,
        /// Compiler diagnostic text.
        diagnostic: String,
    },
    /// A scheduled pass has no program.
    MissingProgram(PassKind),
    /// A scheduled pass has no render target.
    MissingTarget(PassKind),
    /// The pass list itself is unusable (empty, duplicated, or not matching
    /// the G-buffer layout).
    InvalidSchedule(String),
    /// The surface could not provide a frame.
    Surface(wgpu::SurfaceError),
    /// Generic I/O failure.
    Io(std::io::Error),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
    /// Viewer event-loop failure.
    Viewer(String),
}

impl fmt::Display for IllustrateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpu(e) => write!(f, "GPU error: {e}"),
            Self::ProgramBuild { label, diagnostic } => {
                write!(f, "failed to build program '{label}': {diagnostic}")
            }
            Self::MissingProgram(pass) => {
                write!(f, "no program installed for the {pass} pass")
            }
            Self::MissingTarget(pass) => {
                write!(f, "no render target allocated for the {pass} pass")
            }
            Self::InvalidSchedule(msg) => {
                write!(f, "invalid pass schedule: {msg}")
            }
            Self::Surface(e) => write!(f, "surface error: {e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
            Self::Viewer(msg) => write!(f, "viewer error: {msg}"),
        }
    }
}

impl std::error::Error for IllustrateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Gpu(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::Surface(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RenderContextError> for IllustrateError {
    fn from(e: RenderContextError) -> Self {
        Self::Gpu(e)
    }
}

impl From<std::io::Error> for IllustrateError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<wgpu::SurfaceError> for IllustrateError {
    fn from(e: wgpu::SurfaceError) -> Self {
        Self::Surface(e)
    }
}
