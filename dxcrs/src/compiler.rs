//! Shader compilation API

use crate::backend::{Backend, NativeBackend};
use crate::handle::NativeHandle;
use crate::output::{OutKind, Output, OutputKinds};
use crate::{ArgumentBuilder, CompilerOptions, Error, HResult, IncludeHandler, Result};
use indexmap::IndexMap;
use std::path::Path;

/// A compiler instance.
///
/// `compile` takes `&mut self`, so one instance is never driven from two
/// threads at once. Create one compiler per thread for parallel builds.
///
/// # Example
/// ```no_run
/// use dxcrs::{Compiler, CompilerOptions, OutputKinds, ShaderProfile};
///
/// let mut compiler = Compiler::load("./libdxcwrapper.so").unwrap();
/// let options = CompilerOptions::new(ShaderProfile::PS_6_0).with_entry_point("main");
///
/// let source = "float4 main() : SV_TARGET { return float4(1,0,0,1); }";
/// let shader = compiler
///     .compile_with_options(source, &options, OutputKinds::empty(), None)
///     .unwrap()
///     .into_result()
///     .unwrap();
/// assert!(!shader.object.is_empty());
/// ```
pub struct Compiler<B: Backend = NativeBackend> {
    backend: B,
    handle: NativeHandle<B::Compiler>,
}

impl Compiler<NativeBackend> {
    /// Loads the shim from `path` and creates a compiler on it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(NativeBackend::load(path)?)
    }
}

impl<B: Backend> Compiler<B> {
    /// Creates a compiler instance on `backend`.
    pub fn new(backend: B) -> Result<Self> {
        let handle = NativeHandle::new(backend.create_compiler()?);
        Ok(Compiler { backend, handle })
    }

    /// Returns the backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Compiles `source` with a prepared argument list.
    ///
    /// Compile errors are not an `Err`: inspect [`DxcResult::status`].
    pub fn compile(
        &mut self,
        source: &[u8],
        arguments: &[String],
        include: Option<&mut dyn IncludeHandler>,
    ) -> Result<DxcResult<B>> {
        let compiler = self.handle.get()?;

        log::debug!(
            "Compiling {} bytes with arguments {:?}",
            source.len(),
            arguments
        );

        let result = self.backend.compile(compiler, source, arguments, include)?;

        Ok(DxcResult {
            backend: self.backend.clone(),
            handle: NativeHandle::new(result),
        })
    }

    /// Validates `options`, compiles, and collects the outputs in `collect`.
    ///
    /// The object is always read. Errors and warnings are read into the
    /// diagnostics; any other kind is read only when requested and present.
    pub fn compile_with_options(
        &mut self,
        source: &str,
        options: &CompilerOptions,
        collect: OutputKinds,
        include: Option<&mut dyn IncludeHandler>,
    ) -> Result<CompileOutput> {
        let arguments = ArgumentBuilder::new(options).build()?;
        let mut result = self.compile(source.as_bytes(), &arguments, include)?;

        let diagnostics = result.text_output(OutKind::Errors)?.unwrap_or_default();

        let output = match result.status()? {
            Some(status) => {
                log::debug!("Compilation failed with {}", status);
                CompileOutput::Failure {
                    status,
                    diagnostics,
                }
            }
            None => {
                let object = result
                    .output(OutKind::Object)?
                    .map(|output| output.data)
                    .unwrap_or_default();

                let mut outputs = IndexMap::new();
                for kind in collect.kinds().filter(|kind| *kind != OutKind::Object) {
                    if let Some(output) = result.output(kind)? {
                        outputs.insert(kind, output);
                    }
                }

                CompileOutput::Success(CompiledShader {
                    object,
                    outputs,
                    warnings: Some(diagnostics).filter(|text| !text.trim().is_empty()),
                })
            }
        };

        result.release();
        Ok(output)
    }

    /// Releases the compiler instance. Later compiles fail with
    /// [`Error::HandleReleased`].
    pub fn release(&mut self) {
        self.handle.release();
    }
}

impl<B: Backend + std::fmt::Debug> std::fmt::Debug for Compiler<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compiler")
            .field("backend", &self.backend)
            .field("handle", &self.handle)
            .finish()
    }
}

/// Outcome of one compile call, owning the native result.
///
/// Every read copies the data into owned memory; the native result itself
/// is released on [`release`](Self::release) or drop, exactly once.
pub struct DxcResult<B: Backend = NativeBackend> {
    backend: B,
    handle: NativeHandle<B::Result>,
}

impl<B: Backend> DxcResult<B> {
    /// Returns `None` if the compile succeeded, the failing status otherwise.
    pub fn status(&self) -> Result<Option<HResult>> {
        let status = self.backend.status(self.handle.get()?)?;
        Ok(Some(status).filter(HResult::is_error))
    }

    /// Copies an output, or returns `None` if the result has none of `kind`.
    pub fn output(&self, kind: OutKind) -> Result<Option<Output>> {
        self.backend.output(self.handle.get()?, kind)
    }

    /// Copies an output and decodes it as text.
    pub fn text_output(&self, kind: OutKind) -> Result<Option<String>> {
        Ok(self.output(kind)?.map(|output| output.text()))
    }

    /// Releases the native result. Safe to call more than once.
    pub fn release(&mut self) {
        self.handle.release();
    }

    /// Returns true once the native result has been released
    pub fn is_released(&self) -> bool {
        self.handle.is_released()
    }
}

impl<B: Backend> std::fmt::Debug for DxcResult<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DxcResult")
            .field("handle", &self.handle)
            .finish()
    }
}

/// A successfully compiled shader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledShader {
    /// The compiled object; empty if the compile produced none (e.g. `-P`)
    pub object: Vec<u8>,
    /// Requested secondary outputs that were present
    pub outputs: IndexMap<OutKind, Output>,
    /// Warning text, if any
    pub warnings: Option<String>,
}

/// Result of [`Compiler::compile_with_options`]: success or failure, never both
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutput {
    Success(CompiledShader),
    Failure {
        /// The failing compile status
        status: HResult,
        /// Error text reported by the compiler
        diagnostics: String,
    },
}

impl CompileOutput {
    /// Returns true if compilation succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, CompileOutput::Success(_))
    }

    /// Returns the compiled object on success
    pub fn object(&self) -> Option<&[u8]> {
        match self {
            CompileOutput::Success(shader) => Some(&shader.object),
            CompileOutput::Failure { .. } => None,
        }
    }

    /// Returns the error or warning text, if any
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            CompileOutput::Success(shader) => shader.warnings.as_deref(),
            CompileOutput::Failure { diagnostics, .. } => Some(diagnostics),
        }
    }

    /// Converts a failure into [`Error::Compilation`].
    pub fn into_result(self) -> Result<CompiledShader> {
        match self {
            CompileOutput::Success(shader) => Ok(shader),
            CompileOutput::Failure {
                status,
                diagnostics,
            } => {
                let message = if diagnostics.trim().is_empty() {
                    format!("Unknown error (HRESULT: {})", status)
                } else {
                    diagnostics
                };
                Err(Error::Compilation {
                    hresult: status,
                    message,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_result_failure() {
        let output = CompileOutput::Failure {
            status: HResult::E_FAIL,
            diagnostics: "error: undeclared identifier 'x'".to_string(),
        };
        assert!(!output.is_success());
        assert_eq!(output.object(), None);
        assert_eq!(output.diagnostics(), Some("error: undeclared identifier 'x'"));

        match output.into_result() {
            Err(Error::Compilation { hresult, message }) => {
                assert_eq!(hresult, HResult::E_FAIL);
                assert!(message.contains("undeclared"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_into_result_failure_without_text() {
        let output = CompileOutput::Failure {
            status: HResult::E_FAIL,
            diagnostics: String::new(),
        };
        let err = output.into_result().unwrap_err();
        assert!(err.to_string().contains("0x80004005"));
    }

    #[test]
    fn test_into_result_success() {
        let output = CompileOutput::Success(CompiledShader {
            object: b"DXBC".to_vec(),
            outputs: IndexMap::new(),
            warnings: None,
        });
        assert!(output.is_success());
        assert_eq!(output.object(), Some(&b"DXBC"[..]));
        assert_eq!(output.diagnostics(), None);
        assert_eq!(output.into_result().unwrap().object, b"DXBC");
    }
}
