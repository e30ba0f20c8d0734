//! Function libraries: where the first entry point comes from.
//!
//! A [`FunctionLibrary`] resolves a symbol name to a raw function address.
//! [`DynamicLibrary`] wraps `dlopen`/`dlsym`; [`StaticLibrary`] serves a fixed
//! table, which is how statically linked drivers and tests provide entry points.

use std::collections::HashMap;
use std::ffi::{CStr, CString, c_void};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use thiserror::Error;

/// Untyped entry point. Cast to the concrete `Pfn*` type before calling.
pub type RawFn = unsafe extern "system" fn();

/// Resolve named functions.
pub trait FunctionLibrary: Send + Sync {
    /// Address of `name`, or `None` when the library does not export it.
    fn get_function(&self, name: &CStr) -> Option<RawFn>;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LibraryError {
    #[error("library path {0:?} contains an interior NUL byte")]
    InvalidPath(PathBuf),
    #[error("failed to open {path:?}: {reason}")]
    Open { path: PathBuf, reason: String },
}

// dlerror() state is per thread on glibc but process-wide on some libcs;
// serialize open+error retrieval so the message belongs to our call.
static DL_LOCK: Mutex<()> = parking_lot::const_mutex(());

/// Shared object opened with `dlopen(RTLD_NOW | RTLD_LOCAL)`. Closed on drop.
#[derive(Debug)]
pub struct DynamicLibrary {
    handle: *mut c_void,
    path: PathBuf,
}

// SAFETY: the handle is only passed to dlsym/dlclose, which are thread-safe.
unsafe impl Send for DynamicLibrary {}
// SAFETY: see above.
unsafe impl Sync for DynamicLibrary {}

impl DynamicLibrary {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LibraryError> {
        let path = path.as_ref().to_path_buf();
        let c_path = CString::new(path.as_os_str().as_encoded_bytes())
            .map_err(|_| LibraryError::InvalidPath(path.clone()))?;

        let _guard = DL_LOCK.lock();
        // SAFETY: c_path is a valid NUL-terminated string for the duration of the call.
        let handle = unsafe { libc::dlopen(c_path.as_ptr(), libc::RTLD_NOW | libc::RTLD_LOCAL) };
        if handle.is_null() {
            return Err(LibraryError::Open {
                path,
                reason: last_dl_error(),
            });
        }
        Ok(Self { handle, path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FunctionLibrary for DynamicLibrary {
    fn get_function(&self, name: &CStr) -> Option<RawFn> {
        // SAFETY: handle came from a successful dlopen and is still open.
        let ptr = unsafe { libc::dlsym(self.handle, name.as_ptr()) };
        if ptr.is_null() {
            return None;
        }
        // SAFETY: a non-null dlsym result for a function symbol is a code address.
        Some(unsafe { std::mem::transmute::<*mut c_void, RawFn>(ptr) })
    }
}

impl Drop for DynamicLibrary {
    fn drop(&mut self) {
        // SAFETY: handle came from dlopen and is closed exactly once.
        unsafe {
            libc::dlclose(self.handle);
        }
    }
}

fn last_dl_error() -> String {
    // SAFETY: dlerror returns null or a NUL-terminated string valid until the next dl call.
    let msg = unsafe { libc::dlerror() };
    if msg.is_null() {
        return String::from("unknown dlopen failure");
    }
    // SAFETY: non-null dlerror result is NUL-terminated.
    unsafe { CStr::from_ptr(msg) }.to_string_lossy().into_owned()
}

/// Fixed name-to-address table.
#[derive(Debug, Default, Clone)]
pub struct StaticLibrary {
    functions: HashMap<&'static CStr, RawFn>,
}

impl StaticLibrary {
    #[must_use]
    pub fn new(functions: &[(&'static CStr, RawFn)]) -> Self {
        Self {
            functions: functions.iter().copied().collect(),
        }
    }

    pub fn insert(&mut self, name: &'static CStr, function: RawFn) {
        self.functions.insert(name, function);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl FunctionLibrary for StaticLibrary {
    fn get_function(&self, name: &CStr) -> Option<RawFn> {
        self.functions.get(name).copied()
    }
}
