//! Error types for dxcrs operations

use crate::ShaderStage;
use std::fmt;
use thiserror::Error;

/// HRESULT status codes returned by the native compiler
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct HResult(pub i32);

impl HResult {
    /// Success
    pub const S_OK: HResult = HResult(dxcompiler::S_OK);
    /// Generic failure
    pub const E_FAIL: HResult = HResult(dxcompiler::E_FAIL);
    /// Invalid argument
    pub const E_INVALIDARG: HResult = HResult(dxcompiler::E_INVALIDARG);

    /// Returns true if the result indicates success
    #[inline]
    pub fn is_success(&self) -> bool {
        self.0 >= 0
    }

    /// Returns true if the result indicates an error
    #[inline]
    pub fn is_error(&self) -> bool {
        self.0 < 0
    }

    /// Returns the raw HRESULT value
    #[inline]
    pub fn code(&self) -> i32 {
        self.0
    }
}

impl fmt::Debug for HResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HResult(0x{:08x})", self.0 as u32)
    }
}

impl fmt::Display for HResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0 as u32)
    }
}

impl From<i32> for HResult {
    fn from(hr: i32) -> Self {
        HResult(hr)
    }
}

/// Error type for dxcrs operations
#[derive(Error, Debug)]
pub enum Error {
    /// The shader stage needs a newer shader model than the profile names
    #[error(
        "{stage} shader is not compatible with shader model {major}.{minor}. \
         Shader model must be a minimum of {}.{}",
        .minimum.0,
        .minimum.1
    )]
    InvalidProfile {
        /// The configured stage
        stage: ShaderStage,
        /// Configured major version
        major: u32,
        /// Configured minor version
        minor: u32,
        /// Lowest (major, minor) the stage accepts
        minimum: (u32, u32),
    },

    /// Shader compilation failed
    #[error("Compilation failed ({hresult}): {message}")]
    Compilation {
        /// The status reported by the compiler
        hresult: HResult,
        /// Diagnostics from the compiler
        message: String,
    },

    /// The native compile call returned no result at all
    #[error("Compiler invocation failed (HRESULT: {hresult})")]
    Gateway {
        /// The HRESULT returned by the call
        hresult: HResult,
    },

    /// A native handle was used after it was released
    #[error("{0} used after release")]
    HandleReleased(&'static str),

    /// Invalid parameter provided
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The shim library could not be loaded or is incomplete
    #[error(transparent)]
    Library(#[from] dxcompiler::DxcCompilerError),

    /// Include file not found
    #[error("Include file not found: {0}")]
    IncludeNotFound(String),

    /// IO error during include resolution
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for dxcrs operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hresult_display() {
        assert_eq!(HResult::E_FAIL.to_string(), "0x80004005");
        assert!(HResult::S_OK.is_success());
        assert!(HResult::E_INVALIDARG.is_error());
    }

    #[test]
    fn test_invalid_profile_message() {
        let err = Error::InvalidProfile {
            stage: ShaderStage::Mesh,
            major: 5,
            minor: 0,
            minimum: (6, 0),
        };
        assert_eq!(
            err.to_string(),
            "Mesh shader is not compatible with shader model 5.0. Shader model must be a minimum of 6.0"
        );
    }
}
