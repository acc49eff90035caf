//! Include handler trait for custom #include resolution

use crate::{Error, Result};
use std::collections::HashMap;
use std::path::PathBuf;

/// Trait for custom include file resolution
///
/// The compiler calls [`open`](IncludeHandler::open) synchronously for every
/// `#include` it meets, possibly several times and in nested fashion during
/// one compile. A handler that fails hands empty content to the compiler,
/// which then reports the missing file in its own diagnostics.
///
/// Closures of type `FnMut(&str) -> Result<Vec<u8>>` implement the trait.
///
/// # Example
/// ```no_run
/// use dxcrs::{IncludeHandler, Result};
///
/// struct MyIncludeHandler {
///     base_path: std::path::PathBuf,
/// }
///
/// impl IncludeHandler for MyIncludeHandler {
///     fn open(&mut self, filename: &str) -> Result<Vec<u8>> {
///         let path = self.base_path.join(filename);
///         std::fs::read(&path).map_err(|_| dxcrs::Error::IncludeNotFound(filename.to_string()))
///     }
/// }
/// ```
pub trait IncludeHandler {
    /// Opens an include file and returns its contents.
    ///
    /// `filename` is the name as the compiler resolved it, which may carry
    /// a leading `./` or the directory of the including file.
    fn open(&mut self, filename: &str) -> Result<Vec<u8>>;
}

impl<F> IncludeHandler for F
where
    F: FnMut(&str) -> Result<Vec<u8>>,
{
    fn open(&mut self, filename: &str) -> Result<Vec<u8>> {
        self(filename)
    }
}

/// Strips the `./` or `.\` prefix the compiler puts on relative names
fn relative_name(filename: &str) -> &str {
    filename
        .strip_prefix("./")
        .or_else(|| filename.strip_prefix(".\\"))
        .unwrap_or(filename)
}

/// File system include handler that resolves includes from specified directories.
///
/// # Example
/// ```no_run
/// use dxcrs::FileSystemInclude;
///
/// let include = FileSystemInclude::new()
///     .with_path("shaders/include")
///     .with_path("/usr/local/share/hlsl");
/// ```
#[derive(Debug, Clone, Default)]
pub struct FileSystemInclude {
    search_paths: Vec<PathBuf>,
}

impl FileSystemInclude {
    /// Creates a new file system include handler with no search paths.
    pub fn new() -> Self {
        FileSystemInclude {
            search_paths: Vec::new(),
        }
    }

    /// Creates a new handler with the current directory as the first search path.
    pub fn with_current_dir() -> Self {
        let mut handler = Self::new();
        if let Ok(cwd) = std::env::current_dir() {
            handler.search_paths.push(cwd);
        }
        handler
    }

    /// Adds a search path (builder pattern).
    pub fn with_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.search_paths.push(path.into());
        self
    }

    /// Adds a search path.
    pub fn add_path<P: Into<PathBuf>>(&mut self, path: P) {
        self.search_paths.push(path.into());
    }

    /// Returns the search paths.
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }
}

impl IncludeHandler for FileSystemInclude {
    fn open(&mut self, filename: &str) -> Result<Vec<u8>> {
        // The name as given (absolute, or relative to the working directory)
        let direct = PathBuf::from(filename);
        if direct.is_file() {
            return std::fs::read(&direct).map_err(Into::into);
        }

        let relative = relative_name(filename);
        for search_path in &self.search_paths {
            let path = search_path.join(relative);
            if path.is_file() {
                log::trace!("Resolved include {} to {}", filename, path.display());
                return std::fs::read(&path).map_err(Into::into);
            }
        }

        Err(Error::IncludeNotFound(filename.to_string()))
    }
}

/// In-memory include handler for testing or embedded includes.
///
/// # Example
/// ```
/// use dxcrs::MemoryInclude;
///
/// let mut handler = MemoryInclude::new();
/// handler.add("common.hlsl", b"float4 white = float4(1,1,1,1);");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryInclude {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryInclude {
    /// Creates a new empty memory include handler.
    pub fn new() -> Self {
        MemoryInclude {
            files: HashMap::new(),
        }
    }

    /// Adds a file to the handler.
    pub fn add(&mut self, filename: &str, contents: &[u8]) {
        self.files.insert(filename.to_string(), contents.to_vec());
    }

    /// Adds a file (builder pattern).
    pub fn with_file(mut self, filename: &str, contents: &[u8]) -> Self {
        self.add(filename, contents);
        self
    }
}

impl IncludeHandler for MemoryInclude {
    fn open(&mut self, filename: &str) -> Result<Vec<u8>> {
        self.files
            .get(filename)
            .or_else(|| self.files.get(relative_name(filename)))
            .cloned()
            .ok_or_else(|| Error::IncludeNotFound(filename.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_include() {
        let mut handler = MemoryInclude::new().with_file("test.hlsl", b"float x = 1.0;");

        let result = handler.open("test.hlsl");
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), b"float x = 1.0;");

        assert_eq!(handler.open("./test.hlsl").unwrap(), b"float x = 1.0;");

        let missing = handler.open("missing.hlsl");
        assert!(matches!(missing, Err(Error::IncludeNotFound(name)) if name == "missing.hlsl"));
    }

    #[test]
    fn test_closure_include() {
        let mut calls = Vec::new();
        let mut handler = |name: &str| -> Result<Vec<u8>> {
            calls.push(name.to_string());
            Ok(format!("// {}", name).into_bytes())
        };

        assert_eq!(handler.open("a.hlsl").unwrap(), b"// a.hlsl");
        assert_eq!(handler.open("b.hlsl").unwrap(), b"// b.hlsl");
        assert_eq!(calls, vec!["a.hlsl", "b.hlsl"]);
    }

    #[test]
    fn test_file_system_include() {
        let dir = std::env::temp_dir().join(format!("dxcrs-include-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("lights.hlsli"), b"#define MAX_LIGHTS 4").unwrap();

        let mut handler = FileSystemInclude::new().with_path(&dir);
        assert_eq!(handler.search_paths().len(), 1);
        assert_eq!(
            handler.open("./lights.hlsli").unwrap(),
            b"#define MAX_LIGHTS 4"
        );
        assert!(handler.open("shadows.hlsli").is_err());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_relative_name() {
        assert_eq!(relative_name("./a.hlsl"), "a.hlsl");
        assert_eq!(relative_name(".\\a.hlsl"), "a.hlsl");
        assert_eq!(relative_name("dir/a.hlsl"), "dir/a.hlsl");
    }
}
