//! Runtime loading of shared libraries

use crate::{DxcCompilerError, Result};
use std::ffi::{CStr, c_void};
use std::path::{Path, PathBuf};

/// An open shared library, closed on drop.
pub struct SharedObject {
    handle: *mut c_void,
    path: PathBuf,
}

impl SharedObject {
    /// Opens the shared library at `path`, resolving all symbols immediately.
    #[cfg(unix)]
    pub fn open(path: &Path) -> Result<Self> {
        use std::ffi::CString;
        use std::os::unix::ffi::OsStrExt;

        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|_| DxcCompilerError::InvalidPath(path.display().to_string()))?;

        let handle = unsafe { libc::dlopen(c_path.as_ptr(), libc::RTLD_NOW | libc::RTLD_LOCAL) };
        if handle.is_null() {
            return Err(DxcCompilerError::LoadError(format!(
                "{}: {}",
                path.display(),
                last_error()
            )));
        }

        log::debug!("Loaded shared library {}", path.display());

        Ok(SharedObject {
            handle,
            path: path.to_path_buf(),
        })
    }

    #[cfg(not(unix))]
    pub fn open(path: &Path) -> Result<Self> {
        Err(DxcCompilerError::LoadError(format!(
            "{}: runtime loading is only supported on unix targets",
            path.display()
        )))
    }

    /// Looks up an exported symbol. Returns null if it is not exported.
    #[cfg(unix)]
    pub fn symbol(&self, name: &CStr) -> *mut c_void {
        unsafe { libc::dlsym(self.handle, name.as_ptr()) }
    }

    #[cfg(not(unix))]
    pub fn symbol(&self, _name: &CStr) -> *mut c_void {
        std::ptr::null_mut()
    }

    /// Returns the path the library was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(unix)]
fn last_error() -> String {
    unsafe {
        let err = libc::dlerror();
        if err.is_null() {
            "unknown dlopen error".to_string()
        } else {
            CStr::from_ptr(err).to_string_lossy().into_owned()
        }
    }
}

#[cfg(unix)]
impl Drop for SharedObject {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            unsafe {
                libc::dlclose(self.handle);
            }
        }
    }
}

impl std::fmt::Debug for SharedObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedObject")
            .field("path", &self.path)
            .field("handle", &self.handle)
            .finish()
    }
}

// dlsym and dlclose are thread-safe; the handle is never mutated after open
unsafe impl Send for SharedObject {}
unsafe impl Sync for SharedObject {}
