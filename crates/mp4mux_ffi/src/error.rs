//! Status codes and last-error reporting.

use mp4mux_core::MuxError;
use std::cell::RefCell;
use std::ffi::CString;

/// Result code for FFI functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mp4MuxStatus {
    /// Operation succeeded.
    Ok = 0,
    /// Generic error.
    Error = 1,
    /// Invalid argument.
    InvalidArgument = 2,
    /// Operation invoked in the wrong lifecycle phase.
    InvalidState = 3,
    /// No elementary streams configured at start.
    NoStreams = 4,
    /// No output target configured at start.
    NoOutput = 5,
    /// Elementary stream limit exceeded.
    TooManyStreams = 6,
    /// Inconsistent configuration rejected in strict mode.
    InvalidConfiguration = 7,
    /// Failure reported by the muxing engine.
    EngineFailed = 8,
    /// Out of memory.
    OutOfMemory = 9,
    /// Null pointer.
    NullPointer = 10,
    /// String argument was not valid UTF-8.
    InvalidUtf8 = 11,
}

impl Mp4MuxStatus {
    /// Returns true if the status indicates success.
    pub fn is_ok(self) -> bool {
        self == Mp4MuxStatus::Ok
    }

    /// Returns true if the status indicates an error.
    pub fn is_err(self) -> bool {
        self != Mp4MuxStatus::Ok
    }
}

impl From<&MuxError> for Mp4MuxStatus {
    fn from(err: &MuxError) -> Self {
        match err {
            MuxError::InvalidArgument { .. } | MuxError::StreamIndexOutOfBounds { .. } => {
                Mp4MuxStatus::InvalidArgument
            }
            MuxError::InvalidState { .. } => Mp4MuxStatus::InvalidState,
            MuxError::TooManyStreams { .. } => Mp4MuxStatus::TooManyStreams,
            MuxError::NoStreams => Mp4MuxStatus::NoStreams,
            MuxError::NoOutput => Mp4MuxStatus::NoOutput,
            MuxError::InvalidConfiguration { .. } => Mp4MuxStatus::InvalidConfiguration,
            MuxError::Engine(_) => Mp4MuxStatus::EngineFailed,
        }
    }
}

/// Error code type for C compatibility.
pub type ErrorCode = i32;

impl From<Mp4MuxStatus> for ErrorCode {
    fn from(status: Mp4MuxStatus) -> Self {
        status as ErrorCode
    }
}

impl From<ErrorCode> for Mp4MuxStatus {
    fn from(code: ErrorCode) -> Self {
        match code {
            0 => Mp4MuxStatus::Ok,
            1 => Mp4MuxStatus::Error,
            2 => Mp4MuxStatus::InvalidArgument,
            3 => Mp4MuxStatus::InvalidState,
            4 => Mp4MuxStatus::NoStreams,
            5 => Mp4MuxStatus::NoOutput,
            6 => Mp4MuxStatus::TooManyStreams,
            7 => Mp4MuxStatus::InvalidConfiguration,
            8 => Mp4MuxStatus::EngineFailed,
            9 => Mp4MuxStatus::OutOfMemory,
            10 => Mp4MuxStatus::NullPointer,
            11 => Mp4MuxStatus::InvalidUtf8,
            _ => Mp4MuxStatus::Error,
        }
    }
}

// Thread-local storage for last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Sets the last error message.
pub fn set_last_error(message: impl Into<String>) {
    let msg = message.into();
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clears the last error.
pub fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Gets the last error message as a C string.
///
/// Returns null if no error is set.
///
/// # Safety
///
/// The returned pointer is valid until the next FFI call on this thread.
#[no_mangle]
pub extern "C" fn mp4mux_last_error() -> *const std::ffi::c_char {
    LAST_ERROR.with(|e| match e.borrow().as_ref() {
        Some(cstr) => cstr.as_ptr(),
        None => std::ptr::null(),
    })
}

/// Clears the last error message.
#[no_mangle]
pub extern "C" fn mp4mux_clear_error() {
    clear_last_error();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(Mp4MuxStatus::Ok as i32, 0);
        assert_eq!(Mp4MuxStatus::InvalidArgument as i32, 2);
        assert!(Mp4MuxStatus::Ok.is_ok());
        assert!(Mp4MuxStatus::EngineFailed.is_err());
    }

    #[test]
    fn error_code_conversion() {
        let status = Mp4MuxStatus::NoOutput;
        let code: ErrorCode = status.into();
        assert_eq!(code, 5);

        let back: Mp4MuxStatus = code.into();
        assert_eq!(back, Mp4MuxStatus::NoOutput);

        let unknown: Mp4MuxStatus = 99.into();
        assert_eq!(unknown, Mp4MuxStatus::Error);
    }

    #[test]
    fn mux_error_mapping() {
        let err = MuxError::invalid_argument("lang", "must not be empty");
        assert_eq!(Mp4MuxStatus::from(&err), Mp4MuxStatus::InvalidArgument);

        let err = MuxError::StreamIndexOutOfBounds { index: 9, count: 1 };
        assert_eq!(Mp4MuxStatus::from(&err), Mp4MuxStatus::InvalidArgument);

        let err = MuxError::invalid_state("set_input");
        assert_eq!(Mp4MuxStatus::from(&err), Mp4MuxStatus::InvalidState);

        let err = MuxError::NoStreams;
        assert_eq!(Mp4MuxStatus::from(&err), Mp4MuxStatus::NoStreams);
    }

    #[test]
    fn last_error() {
        clear_last_error();
        assert!(mp4mux_last_error().is_null());

        set_last_error("test error");
        let ptr = mp4mux_last_error();
        assert!(!ptr.is_null());

        // Safety: we just set it
        let msg = unsafe { std::ffi::CStr::from_ptr(ptr) };
        assert_eq!(msg.to_str().unwrap(), "test error");

        clear_last_error();
        assert!(mp4mux_last_error().is_null());
    }
}
