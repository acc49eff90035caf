//! Raw bindings to the `dxcwrapper` shim around the DirectX Shader Compiler
//!
//! The shim flattens `IDxcCompiler3` and `IDxcResult` into a small C API
//! taking UTF-8 arguments and returning `malloc`-owned buffers. This crate
//! only describes that ABI and resolves it from a shared library loaded at
//! runtime; interpreting the data is left to `dxcrs`.

#![allow(non_snake_case)]
#![allow(non_camel_case_types)]
#![allow(clippy::missing_safety_doc)]

mod library;

pub use library::SharedObject;

use dxcompiler_proc::native_api;
use std::ffi::{c_char, c_void};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DxcCompilerError {
    #[error("Failed to load library: {0}")]
    LoadError(String),
    #[error("Function not found: {0}")]
    FunctionNotFound(String),
    #[error("Invalid library path: {0}")]
    InvalidPath(String),
}

pub type Result<T> = std::result::Result<T, DxcCompilerError>;

pub type HRESULT = i32;
pub type UINT = u32;
pub type BOOL = i32;
pub type DXC_OUT_KIND = u32;

pub const S_OK: HRESULT = 0;
pub const E_FAIL: HRESULT = 0x80004005u32 as i32;
pub const E_INVALIDARG: HRESULT = 0x80070057u32 as i32;
pub const E_OUTOFMEMORY: HRESULT = 0x8007000Eu32 as i32;

// Code pages reported in buffer encodings
pub const DXC_CP_ACP: u32 = 0;
pub const DXC_CP_UTF16: u32 = 1200;
pub const DXC_CP_UTF32: u32 = 12000;
pub const DXC_CP_UTF8: u32 = 65001;

pub const DXC_OUT_NONE: DXC_OUT_KIND = 0;
pub const DXC_OUT_OBJECT: DXC_OUT_KIND = 1;
pub const DXC_OUT_ERRORS: DXC_OUT_KIND = 2;
pub const DXC_OUT_PDB: DXC_OUT_KIND = 3;
pub const DXC_OUT_SHADER_HASH: DXC_OUT_KIND = 4;
pub const DXC_OUT_DISASSEMBLY: DXC_OUT_KIND = 5;
pub const DXC_OUT_HLSL: DXC_OUT_KIND = 6;
pub const DXC_OUT_TEXT: DXC_OUT_KIND = 7;
pub const DXC_OUT_REFLECTION: DXC_OUT_KIND = 8;
pub const DXC_OUT_ROOT_SIGNATURE: DXC_OUT_KIND = 9;
pub const DXC_OUT_EXTRA_OUTPUTS: DXC_OUT_KIND = 10;
pub const DXC_OUT_REMARKS: DXC_OUT_KIND = 11;
pub const DXC_OUT_TIME_REPORT: DXC_OUT_KIND = 12;
pub const DXC_OUT_TIME_TRACE: DXC_OUT_KIND = 13;

/// Read-only source buffer passed into `Compile`
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct DxcBuffer {
    pub Ptr: *const c_void,
    pub Size: usize,
    pub Encoding: UINT,
}

/// Buffer allocated with `malloc`, either by the shim (outputs, released
/// with `FreeBuffer`) or by the include callback (released by the shim).
#[repr(C)]
#[derive(Debug)]
pub struct WritableDxcBuffer {
    pub Ptr: *mut c_void,
    pub Size: usize,
    pub Encoding: UINT,
}

impl WritableDxcBuffer {
    /// A buffer with no allocation
    pub const fn empty() -> Self {
        WritableDxcBuffer {
            Ptr: std::ptr::null_mut(),
            Size: 0,
            Encoding: DXC_CP_ACP,
        }
    }
}

impl Default for WritableDxcBuffer {
    fn default() -> Self {
        Self::empty()
    }
}

// Opaque native objects
#[repr(C)]
pub struct IDxcCompiler3 {
    _private: [u8; 0],
}

#[repr(C)]
pub struct IDxcResult {
    _private: [u8; 0],
}

#[repr(C)]
pub struct DelegateIncludeHandler {
    _private: [u8; 0],
}

/// Include callback: receives the context pointer and a NUL-terminated
/// UTF-8 file name, returns file contents in a `malloc` buffer the shim
/// frees after copying.
pub type IncludeFunc =
    unsafe extern "C" fn(ctx: *mut c_void, filename: *mut c_char) -> WritableDxcBuffer;

native_api! {
    /// Function table exported by the `dxcwrapper` shim
    DxcApi {
        /// Creates an `IDxcCompiler3`. Free with `DeleteCompilerInstance`.
        fn CreateCompilerInstance() -> *mut IDxcCompiler3;
        fn DeleteCompilerInstance(compiler: *mut IDxcCompiler3);
        /// Wraps a callback in an `IDxcIncludeHandler`. Free with `DeleteIncludeHandler`.
        fn CreateIncludeHandler(ctx: *mut c_void, func: IncludeFunc) -> *mut DelegateIncludeHandler;
        fn DeleteIncludeHandler(handler: *mut DelegateIncludeHandler);
        /// Compiles `source` with UTF-8 arguments. `results` must be freed with `FreeResult`.
        fn Compile(
            compiler: *mut IDxcCompiler3,
            source: DxcBuffer,
            args: *const *const c_char,
            args_count: UINT,
            include_handler: *mut DelegateIncludeHandler,
            results: *mut *mut IDxcResult
        ) -> HRESULT;
        fn FreeResult(result: *mut IDxcResult);
        /// Copies one output into `output` and its name into `name`. Both must be freed with `FreeBuffer`.
        fn GetResultOutput(
            result: *mut IDxcResult,
            kind: DXC_OUT_KIND,
            output: *mut WritableDxcBuffer,
            name: *mut WritableDxcBuffer
        ) -> HRESULT;
        fn FreeBuffer(buffer: *mut WritableDxcBuffer);
        fn GetStatus(result: *mut IDxcResult) -> HRESULT;
    }
}

/// Base name of the shim library
pub const LIBRARY_NAME: &str = "dxcwrapper";

/// Platform file name of the shim library
pub fn library_file_name() -> String {
    if cfg!(target_os = "windows") {
        format!("{}.dll", LIBRARY_NAME)
    } else if cfg!(target_os = "macos") {
        format!("lib{}.dylib", LIBRARY_NAME)
    } else {
        format!("lib{}.so", LIBRARY_NAME)
    }
}

/// Default location of the shim: next to the executable if present,
/// otherwise the bare file name (left to the system search path).
pub fn default_library_path() -> PathBuf {
    let name = library_file_name();
    if let Ok(exe) = std::env::current_exe() {
        let path = exe.with_file_name(&name);
        if path.exists() {
            return path;
        }
    }
    PathBuf::from(name)
}

/// A loaded shim library and its resolved function table.
///
/// Loading is explicit: the process entry point creates one `DxcLibrary`
/// and hands it (usually behind an `Arc`) to whatever needs it.
pub struct DxcLibrary {
    api: DxcApi,
    object: SharedObject,
}

impl DxcLibrary {
    /// Loads the shim from `path` and resolves every export.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let object = SharedObject::open(path.as_ref())?;

        let api = unsafe { DxcApi::resolve(|name| object.symbol(name)) }
            .map_err(|symbol| DxcCompilerError::FunctionNotFound(symbol.to_string()))?;

        log::debug!(
            "Resolved {} functions from {}",
            DxcApi::SYMBOLS.len(),
            object.path().display()
        );

        Ok(DxcLibrary { api, object })
    }

    /// Loads the shim from [`default_library_path`].
    pub fn load_default() -> Result<Self> {
        Self::load(default_library_path())
    }

    /// Returns the resolved function table.
    pub fn api(&self) -> &DxcApi {
        &self.api
    }

    /// Returns the path the library was loaded from.
    pub fn path(&self) -> &Path {
        self.object.path()
    }
}

impl std::fmt::Debug for DxcLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DxcLibrary")
            .field("path", &self.path())
            .field("api", &self.api)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_layout() {
        assert_eq!(
            std::mem::size_of::<DxcBuffer>(),
            std::mem::size_of::<WritableDxcBuffer>()
        );
        assert_eq!(
            std::mem::align_of::<DxcBuffer>(),
            std::mem::align_of::<usize>()
        );
    }

    #[test]
    fn test_symbol_list() {
        assert_eq!(DxcApi::SYMBOLS.len(), 9);
        assert!(DxcApi::SYMBOLS.contains(&"Compile"));
        assert!(DxcApi::SYMBOLS.contains(&"GetResultOutput"));
    }

    #[test]
    fn test_resolve_reports_missing_symbol() {
        let result = unsafe { DxcApi::resolve(|_| std::ptr::null_mut()) };
        assert_eq!(result.err(), Some("CreateCompilerInstance"));
    }

    #[test]
    fn test_library_file_name() {
        let name = library_file_name();
        assert!(name.contains(LIBRARY_NAME));
    }
}
