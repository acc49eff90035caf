//! Single-owner wrapper for native handles

use crate::{Error, Result};
use std::fmt;

/// A native resource that must be released exactly once
pub trait Release {
    /// Name used in "used after release" errors
    const KIND: &'static str;

    /// Frees the native resource.
    fn release(&mut self);
}

/// Owns one native handle and releases it exactly once.
///
/// `release` is idempotent, and dropping the wrapper releases the handle if
/// that has not happened yet. Any access after release returns
/// [`Error::HandleReleased`].
pub struct NativeHandle<H: Release> {
    handle: Option<H>,
}

impl<H: Release> NativeHandle<H> {
    /// Takes ownership of `handle`.
    pub fn new(handle: H) -> Self {
        NativeHandle {
            handle: Some(handle),
        }
    }

    /// A wrapper that owns nothing, as left behind by a failed acquisition.
    pub fn empty() -> Self {
        NativeHandle { handle: None }
    }

    /// Borrows the handle.
    pub fn get(&self) -> Result<&H> {
        self.handle.as_ref().ok_or(Error::HandleReleased(H::KIND))
    }

    /// Mutably borrows the handle.
    pub fn get_mut(&mut self) -> Result<&mut H> {
        self.handle.as_mut().ok_or(Error::HandleReleased(H::KIND))
    }

    /// Releases the handle. Later calls do nothing.
    pub fn release(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.release();
        }
    }

    /// Returns true once the handle has been released (or was never set).
    pub fn is_released(&self) -> bool {
        self.handle.is_none()
    }

    /// Gives up ownership without releasing.
    pub fn into_inner(mut self) -> Option<H> {
        self.handle.take()
    }
}

impl<H: Release> Drop for NativeHandle<H> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<H: Release> fmt::Debug for NativeHandle<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeHandle")
            .field("kind", &H::KIND)
            .field("released", &self.is_released())
            .finish()
    }
}
