use std::fmt;

/// Errors raised while creating GPU resources.
#[derive(Debug, Clone, PartialEq)]
pub enum GpuError {
    /// Shader source failed to parse or validate.
    ShaderCompile { label: String, message: String },
    /// Vertex and fragment stages disagree on the uniform block layout.
    UniformLayout { label: String, message: String },
    /// Pixel data does not match the declared dimensions.
    InvalidImage(String),
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::ShaderCompile { label, message } => {
                write!(f, "shader `{label}` failed to compile: {message}")
            }
            GpuError::UniformLayout { label, message } => {
                write!(f, "shader `{label}` has an inconsistent uniform block: {message}")
            }
            GpuError::InvalidImage(msg) => write!(f, "invalid image data: {msg}"),
        }
    }
}

impl std::error::Error for GpuError {}
