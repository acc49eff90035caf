//! Safe, ergonomic Rust API for the DirectX Shader Compiler
//!
//! The crate turns a typed [`CompilerOptions`] value into the compiler's
//! command-line arguments, drives the native compiler through the
//! `dxcwrapper` shim, and copies the results into owned memory. Native
//! handles are released exactly once through [`NativeHandle`].
//!
//! # Example
//!
//! ```no_run
//! use dxcrs::{Compiler, CompilerOptions, DebugInfo, OutputKinds, ShaderProfile};
//!
//! let source = r#"
//!     float4 main(float4 pos : SV_POSITION) : SV_TARGET {
//!         return pos;
//!     }
//! "#;
//!
//! let mut options = CompilerOptions::new(ShaderProfile::PS_6_0).with_entry_point("main");
//! options.debug_info = Some(DebugInfo::Slim);
//!
//! let mut compiler = Compiler::load("./libdxcwrapper.so").unwrap();
//! let output = compiler
//!     .compile_with_options(source, &options, OutputKinds::REFLECTION, None)
//!     .unwrap();
//!
//! match output.into_result() {
//!     Ok(shader) => println!("{} bytes", shader.object.len()),
//!     Err(err) => eprintln!("{}", err),
//! }
//! ```

mod args;
mod backend;
mod compiler;
mod error;
mod handle;
mod include;
pub mod options;
mod output;
mod profile;

pub use args::{ArgumentBuilder, ArgumentList, normalize_value};
pub use backend::{Backend, NativeBackend, NativeCompiler, NativeResult};
pub use compiler::{CompileOutput, CompiledShader, Compiler, DxcResult};
pub use error::{Error, HResult, Result};
pub use handle::{NativeHandle, Release};
pub use include::{FileSystemInclude, IncludeHandler, MemoryInclude};
pub use options::{
    CompilerOptions, DebugInfo, DenormalMode, FlowControlMode, LanguageVersion, Linkage,
    MatrixPackMode, OptimizationLevel, Setting,
};
pub use output::{Encoding, OutKind, Output, OutputKinds};
pub use profile::{ShaderProfile, ShaderStage};

pub use dxcompiler::DxcLibrary;
