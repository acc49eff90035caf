//! Compiler backends
//!
//! [`Backend`] is the seam between the safe API and whatever actually
//! compiles. [`NativeBackend`] drives the `dxcwrapper` shim; tests plug in
//! their own implementation to exercise the pipeline without it.

use crate::handle::{NativeHandle, Release};
use crate::output::{Encoding, OutKind, Output, decode_text};
use crate::{Error, HResult, IncludeHandler, Result};
use dxcompiler::{
    DXC_CP_UTF8, DelegateIncludeHandler, DxcApi, DxcBuffer, DxcLibrary, IDxcCompiler3,
    IDxcResult, UINT, WritableDxcBuffer,
};
use std::ffi::{CStr, CString, c_char, c_void};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use std::{fmt, ptr, slice};

/// Operations a compiler implementation provides.
///
/// Handles are plain values; ownership and the release-once guarantee are
/// provided by [`NativeHandle`] on the caller's side.
pub trait Backend: Clone {
    /// Compiler instance handle
    type Compiler: Release;
    /// Compile result handle
    type Result: Release;

    /// Creates a compiler instance.
    fn create_compiler(&self) -> Result<Self::Compiler>;

    /// Compiles `source` with `arguments`.
    ///
    /// `include` is called synchronously, possibly many times, while the
    /// call runs. Compile errors are reported through the result's status,
    /// not as `Err`.
    fn compile(
        &self,
        compiler: &Self::Compiler,
        source: &[u8],
        arguments: &[String],
        include: Option<&mut dyn IncludeHandler>,
    ) -> Result<Self::Result>;

    /// Returns the compile status of a result.
    fn status(&self, result: &Self::Result) -> Result<HResult>;

    /// Copies one output out of a result, or `None` if the result has none
    /// of that kind.
    fn output(&self, result: &Self::Result, kind: OutKind) -> Result<Option<Output>>;
}

/// Backend over a loaded `dxcwrapper` shim
#[derive(Clone)]
pub struct NativeBackend {
    library: Arc<DxcLibrary>,
}

impl NativeBackend {
    /// Wraps an already loaded library.
    pub fn new(library: Arc<DxcLibrary>) -> Self {
        NativeBackend { library }
    }

    /// Loads the shim from `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(Arc::new(DxcLibrary::load(path)?)))
    }

    /// Returns the underlying library.
    pub fn library(&self) -> &Arc<DxcLibrary> {
        &self.library
    }
}

impl fmt::Debug for NativeBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeBackend")
            .field("library", &self.library.path())
            .finish()
    }
}

/// `IDxcCompiler3` instance created by the shim
pub struct NativeCompiler {
    ptr: *mut IDxcCompiler3,
    library: Arc<DxcLibrary>,
}

impl Release for NativeCompiler {
    const KIND: &'static str = "compiler";

    fn release(&mut self) {
        if !self.ptr.is_null() {
            unsafe { (self.library.api().delete_compiler_instance)(self.ptr) };
            self.ptr = ptr::null_mut();
        }
    }
}

// The instance is only ever driven through `&mut Compiler`
unsafe impl Send for NativeCompiler {}

/// `IDxcResult` returned by the shim
pub struct NativeResult {
    ptr: *mut IDxcResult,
    library: Arc<DxcLibrary>,
}

impl Release for NativeResult {
    const KIND: &'static str = "compile result";

    fn release(&mut self) {
        if !self.ptr.is_null() {
            unsafe { (self.library.api().free_result)(self.ptr) };
            self.ptr = ptr::null_mut();
        }
    }
}

unsafe impl Send for NativeResult {}

/// Include handler object owned by the shim for the duration of a compile
struct ShimIncludeHandler<'a> {
    api: &'a DxcApi,
    ptr: *mut DelegateIncludeHandler,
}

impl Release for ShimIncludeHandler<'_> {
    const KIND: &'static str = "include handler";

    fn release(&mut self) {
        if !self.ptr.is_null() {
            unsafe { (self.api.delete_include_handler)(self.ptr) };
            self.ptr = ptr::null_mut();
        }
    }
}

/// Output buffer allocated by the shim, freed with `FreeBuffer` on drop
struct ShimBuffer<'a> {
    api: &'a DxcApi,
    buffer: WritableDxcBuffer,
}

impl ShimBuffer<'_> {
    fn bytes(&self) -> &[u8] {
        if self.buffer.Ptr.is_null() || self.buffer.Size == 0 {
            &[]
        } else {
            unsafe { slice::from_raw_parts(self.buffer.Ptr as *const u8, self.buffer.Size) }
        }
    }
}

impl Drop for ShimBuffer<'_> {
    fn drop(&mut self) {
        unsafe { (self.api.free_buffer)(&mut self.buffer) };
        self.buffer = WritableDxcBuffer::empty();
    }
}

/// Context handed to the shim alongside [`include_trampoline`]
struct IncludeBridge<'a> {
    handler: &'a mut dyn IncludeHandler,
}

impl IncludeBridge<'_> {
    fn load(&mut self, filename: &str) -> Vec<u8> {
        log::trace!("Include requested: {}", filename);
        match self.handler.open(filename) {
            Ok(data) => data,
            Err(err) => {
                log::warn!("Include {} could not be opened: {}", filename, err);
                Vec::new()
            }
        }
    }
}

/// Copies `data` into a `malloc` buffer; the shim frees it after copying.
fn malloc_buffer(data: &[u8]) -> WritableDxcBuffer {
    if data.is_empty() {
        return WritableDxcBuffer {
            Encoding: DXC_CP_UTF8,
            ..WritableDxcBuffer::empty()
        };
    }

    let ptr = unsafe { libc::malloc(data.len()) };
    if ptr.is_null() {
        log::warn!("Failed to allocate {} bytes for include content", data.len());
        return WritableDxcBuffer::empty();
    }

    unsafe { ptr::copy_nonoverlapping(data.as_ptr(), ptr as *mut u8, data.len()) };

    WritableDxcBuffer {
        Ptr: ptr,
        Size: data.len(),
        Encoding: DXC_CP_UTF8,
    }
}

unsafe extern "C" fn include_trampoline(
    ctx: *mut c_void,
    filename: *mut c_char,
) -> WritableDxcBuffer {
    if ctx.is_null() || filename.is_null() {
        return WritableDxcBuffer::empty();
    }

    let loaded = panic::catch_unwind(AssertUnwindSafe(|| {
        let bridge = unsafe { &mut *(ctx as *mut IncludeBridge<'_>) };
        let filename = unsafe { CStr::from_ptr(filename) }.to_string_lossy();
        bridge.load(&filename)
    }));

    match loaded {
        Ok(data) => malloc_buffer(&data),
        Err(_) => {
            log::warn!("Include handler panicked; returning empty content");
            WritableDxcBuffer::empty()
        }
    }
}

fn to_cstrings(arguments: &[String]) -> Result<Vec<CString>> {
    arguments
        .iter()
        .map(|arg| {
            CString::new(arg.as_str()).map_err(|_| {
                Error::InvalidParameter(format!("argument contains a NUL byte: {:?}", arg))
            })
        })
        .collect()
}

impl Backend for NativeBackend {
    type Compiler = NativeCompiler;
    type Result = NativeResult;

    fn create_compiler(&self) -> Result<NativeCompiler> {
        let ptr = unsafe { (self.library.api().create_compiler_instance)() };
        if ptr.is_null() {
            return Err(Error::Gateway {
                hresult: HResult::E_FAIL,
            });
        }

        log::debug!("Created compiler instance {:p}", ptr);

        Ok(NativeCompiler {
            ptr,
            library: self.library.clone(),
        })
    }

    fn compile(
        &self,
        compiler: &NativeCompiler,
        source: &[u8],
        arguments: &[String],
        include: Option<&mut dyn IncludeHandler>,
    ) -> Result<NativeResult> {
        let api = self.library.api();

        let arguments = to_cstrings(arguments)?;
        let argument_ptrs: Vec<*const c_char> = arguments.iter().map(|arg| arg.as_ptr()).collect();

        let buffer = DxcBuffer {
            Ptr: source.as_ptr() as *const c_void,
            Size: source.len(),
            Encoding: DXC_CP_UTF8,
        };

        let mut bridge = include.map(|handler| IncludeBridge { handler });
        let include_handler = match bridge.as_mut() {
            Some(bridge) => {
                let ctx = bridge as *mut IncludeBridge<'_> as *mut c_void;
                let ptr = unsafe { (api.create_include_handler)(ctx, include_trampoline) };
                if ptr.is_null() {
                    return Err(Error::Gateway {
                        hresult: HResult::E_FAIL,
                    });
                }
                NativeHandle::new(ShimIncludeHandler { api, ptr })
            }
            None => NativeHandle::new(ShimIncludeHandler {
                api,
                ptr: ptr::null_mut(),
            }),
        };

        let mut result: *mut IDxcResult = ptr::null_mut();
        let hr = unsafe {
            (api.compile)(
                compiler.ptr,
                buffer,
                argument_ptrs.as_ptr(),
                argument_ptrs.len() as UINT,
                include_handler.get()?.ptr,
                &mut result,
            )
        };
        drop(include_handler);

        let mut result = NativeResult {
            ptr: result,
            library: self.library.clone(),
        };

        let hresult = HResult(hr);
        if hresult.is_error() || result.ptr.is_null() {
            result.release();
            log::debug!("Compile call failed: {}", hresult);
            return Err(Error::Gateway { hresult });
        }

        Ok(result)
    }

    fn status(&self, result: &NativeResult) -> Result<HResult> {
        if result.ptr.is_null() {
            return Err(Error::HandleReleased(NativeResult::KIND));
        }

        Ok(HResult(unsafe { (self.library.api().get_status)(result.ptr) }))
    }

    fn output(&self, result: &NativeResult, kind: OutKind) -> Result<Option<Output>> {
        if result.ptr.is_null() {
            return Err(Error::HandleReleased(NativeResult::KIND));
        }

        let api = self.library.api();
        let mut data = ShimBuffer {
            api,
            buffer: WritableDxcBuffer::empty(),
        };
        let mut name = ShimBuffer {
            api,
            buffer: WritableDxcBuffer::empty(),
        };

        let hr = unsafe {
            (api.get_result_output)(result.ptr, kind.to_raw(), &mut data.buffer, &mut name.buffer)
        };

        if HResult(hr).is_error() {
            log::trace!("No {:?} output ({})", kind, HResult(hr));
            return Ok(None);
        }

        let name = Some(decode_text(name.bytes(), Encoding::from(name.buffer.Encoding)))
            .filter(|name| !name.is_empty());

        Ok(Some(Output {
            data: data.bytes().to_vec(),
            name,
            encoding: Encoding::from(data.buffer.Encoding),
        }))
    }
}
