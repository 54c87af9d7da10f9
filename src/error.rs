//! Central error handling for the scene compiler
//!
//! Provides a unified CompileError enum with consistent categorization:
//! scene preconditions, conversion failures, and errors propagated from the
//! device or the intersection engine.

/// Centralized error type for all compilation operations
#[derive(thiserror::Error, Debug)]
pub enum CompileError {
    #[error("No camera in the scene")]
    NoCamera,

    #[error("No lights in the scene")]
    NoLights,

    #[error("No shapes in the scene")]
    NoShapes,

    #[error("Scene error: {0}")]
    Scene(String),

    #[error("Material conversion error: {0}")]
    Material(String),

    #[error("Light conversion error: {0}")]
    Light(String),

    #[error("Device error: {0}")]
    Device(String),

    #[error("Intersector error: {0}")]
    Intersector(String),
}

impl CompileError {
    /// Convenience constructors for common error types
    pub fn material<T: ToString>(msg: T) -> Self {
        CompileError::Material(msg.to_string())
    }

    pub fn light<T: ToString>(msg: T) -> Self {
        CompileError::Light(msg.to_string())
    }

    pub fn device<T: ToString>(msg: T) -> Self {
        CompileError::Device(msg.to_string())
    }

    pub fn intersector<T: ToString>(msg: T) -> Self {
        CompileError::Intersector(msg.to_string())
    }
}

/// Result type alias for compiler operations
pub type CompileResult<T> = Result<T, CompileError>;
