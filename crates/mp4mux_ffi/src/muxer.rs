//! Muxer session FFI functions.

use crate::error::{clear_last_error, set_last_error, Mp4MuxStatus};
use mp4mux_core::{InputSpec, Muxer, MuxError, OutputTarget, ValidatingEngine};
use std::ffi::{c_char, c_int, c_uint, CStr};
use std::path::PathBuf;

/// Opaque session handle: one muxer and the engine it starts with.
#[derive(Debug, Default)]
pub struct Mp4MuxHandle {
    muxer: Muxer,
    engine: ValidatingEngine,
}

/// Converts an optional C string argument.
///
/// Null is "absent"; an empty string is passed through so the core
/// normalizer can reject it with a proper error.
unsafe fn opt_str<'a>(
    field: &'static str,
    ptr: *const c_char,
) -> Result<Option<&'a str>, Mp4MuxStatus> {
    if ptr.is_null() {
        return Ok(None);
    }
    match CStr::from_ptr(ptr).to_str() {
        Ok(s) => Ok(Some(s)),
        Err(_) => {
            set_last_error(format!("invalid UTF-8 in {field}"));
            Err(Mp4MuxStatus::InvalidUtf8)
        }
    }
}

/// Converts a required C string argument; null is a caller error.
unsafe fn required_str<'a>(
    field: &'static str,
    ptr: *const c_char,
) -> Result<&'a str, Mp4MuxStatus> {
    match opt_str(field, ptr)? {
        Some(s) => Ok(s),
        None => {
            set_last_error(format!("null pointer argument: {field}"));
            Err(Mp4MuxStatus::NullPointer)
        }
    }
}

/// Runs an operation on the session behind `handle`.
unsafe fn with_handle<F>(handle: *mut Mp4MuxHandle, f: F) -> Mp4MuxStatus
where
    F: FnOnce(&mut Mp4MuxHandle) -> Result<(), MuxError>,
{
    if handle.is_null() {
        set_last_error("null session handle");
        return Mp4MuxStatus::NullPointer;
    }
    match f(&mut *handle) {
        Ok(()) => Mp4MuxStatus::Ok,
        Err(err) => {
            let status = Mp4MuxStatus::from(&err);
            set_last_error(err.to_string());
            status
        }
    }
}

/// Creates a muxer session.
///
/// # Safety
///
/// `out_handle` must be a valid pointer. The returned handle must be
/// released with [`mp4mux_destroy`] exactly once and must not be used
/// afterwards.
#[no_mangle]
pub unsafe extern "C" fn mp4mux_create(out_handle: *mut *mut Mp4MuxHandle) -> Mp4MuxStatus {
    clear_last_error();
    if out_handle.is_null() {
        set_last_error("null pointer argument: out_handle");
        return Mp4MuxStatus::NullPointer;
    }
    *out_handle = Box::into_raw(Box::new(Mp4MuxHandle::default()));
    Mp4MuxStatus::Ok
}

/// Destroys a muxer session, releasing the configuration store and any
/// configured output handle.
///
/// # Safety
///
/// `handle` must be a handle returned by [`mp4mux_create`] that has not
/// been destroyed yet, or null (in which case this is a no-op).
#[no_mangle]
pub unsafe extern "C" fn mp4mux_destroy(handle: *mut Mp4MuxHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

/// Sets the frame rate applied to subsequently added video streams.
///
/// # Safety
///
/// `handle` must be a live session handle or null.
#[no_mangle]
pub unsafe extern "C" fn mp4mux_set_video_framerate(
    handle: *mut Mp4MuxHandle,
    numerator: c_uint,
    denominator: c_uint,
) -> Mp4MuxStatus {
    clear_last_error();
    with_handle(handle, |h| {
        h.muxer.set_video_framerate(numerator, denominator)
    })
}

/// Appends one elementary stream to the session.
///
/// `lang`, `name` and `enc_name` may be null for "absent"; empty
/// strings are rejected as invalid arguments.
///
/// # Safety
///
/// `handle` must be a live session handle or null; every non-null
/// string must be a valid null-terminated string.
#[no_mangle]
pub unsafe extern "C" fn mp4mux_set_input(
    handle: *mut Mp4MuxHandle,
    file: *const c_char,
    lang: *const c_char,
    name: *const c_char,
    enc_name: *const c_char,
    time_scale: c_uint,
    chunk_span_size: c_uint,
    track_id: c_uint,
) -> Mp4MuxStatus {
    clear_last_error();

    let file = match required_str("file", file) {
        Ok(s) => s,
        Err(status) => return status,
    };
    let lang = match opt_str("lang", lang) {
        Ok(s) => s,
        Err(status) => return status,
    };
    let name = match opt_str("name", name) {
        Ok(s) => s,
        Err(status) => return status,
    };
    let enc_name = match opt_str("enc_name", enc_name) {
        Ok(s) => s,
        Err(status) => return status,
    };

    with_handle(handle, |h| {
        h.muxer.set_input(InputSpec {
            path: PathBuf::from(file),
            language: lang.map(str::to_string),
            track_name: name.map(str::to_string),
            encoder_name: enc_name.map(str::to_string),
            time_scale,
            chunk_span_size,
            track_id,
        })
    })
}

/// Sets the output destination: an in-memory buffer when `buffer_out`
/// is nonzero, otherwise the file named by `file`.
///
/// # Safety
///
/// `handle` must be a live session handle or null; `file` must be a
/// valid null-terminated string unless `buffer_out` is nonzero.
#[no_mangle]
pub unsafe extern "C" fn mp4mux_set_output(
    handle: *mut Mp4MuxHandle,
    buffer_out: c_int,
    file: *const c_char,
) -> Mp4MuxStatus {
    clear_last_error();

    let target = if buffer_out != 0 {
        OutputTarget::Buffer
    } else {
        match required_str("file", file) {
            Ok(s) => OutputTarget::File(PathBuf::from(s)),
            Err(status) => return status,
        }
    };

    with_handle(handle, |h| h.muxer.set_output(target))
}

/// Overrides the movie header timescale.
///
/// # Safety
///
/// `handle` must be a live session handle or null.
#[no_mangle]
pub unsafe extern "C" fn mp4mux_set_moov_timescale(
    handle: *mut Mp4MuxHandle,
    timescale: c_uint,
) -> Mp4MuxStatus {
    clear_last_error();
    with_handle(handle, |h| h.muxer.set_moov_timescale(timescale))
}

/// Sets the major brand of the file type box.
///
/// # Safety
///
/// `handle` must be a live session handle or null; `brand` must be a
/// valid null-terminated string.
#[no_mangle]
pub unsafe extern "C" fn mp4mux_set_major_brand(
    handle: *mut Mp4MuxHandle,
    brand: *const c_char,
) -> Mp4MuxStatus {
    clear_last_error();
    let brand = match required_str("brand", brand) {
        Ok(s) => s,
        Err(status) => return status,
    };
    with_handle(handle, |h| h.muxer.set_major_brand(brand))
}

/// Appends one compatible brand to the file type box.
///
/// # Safety
///
/// `handle` must be a live session handle or null; `brand` must be a
/// valid null-terminated string.
#[no_mangle]
pub unsafe extern "C" fn mp4mux_set_compatible_brand(
    handle: *mut Mp4MuxHandle,
    brand: *const c_char,
) -> Mp4MuxStatus {
    clear_last_error();
    let brand = match required_str("brand", brand) {
        Ok(s) => s,
        Err(status) => return status,
    };
    with_handle(handle, |h| h.muxer.add_compatible_brand(brand))
}

/// Selects the output container layout by format tag (`mp4` or
/// `frag-mp4`).
///
/// # Safety
///
/// `handle` must be a live session handle or null; `format` must be a
/// valid null-terminated string.
#[no_mangle]
pub unsafe extern "C" fn mp4mux_set_output_format(
    handle: *mut Mp4MuxHandle,
    format: *const c_char,
) -> Mp4MuxStatus {
    clear_last_error();
    let format = match required_str("output_format", format) {
        Ok(s) => s,
        Err(status) => return status,
    };
    with_handle(handle, |h| h.muxer.set_output_format(format))
}

/// Sets the maximum fragment duration in milliseconds.
///
/// # Safety
///
/// `handle` must be a live session handle or null.
#[no_mangle]
pub unsafe extern "C" fn mp4mux_set_max_duration(
    handle: *mut Mp4MuxHandle,
    duration_ms: c_uint,
) -> Mp4MuxStatus {
    clear_last_error();
    with_handle(handle, |h| h.muxer.set_max_fragment_duration(duration_ms))
}

/// Sets the Dolby Vision profile.
///
/// # Safety
///
/// `handle` must be a live session handle or null.
#[no_mangle]
pub unsafe extern "C" fn mp4mux_set_dv_profile(
    handle: *mut Mp4MuxHandle,
    profile: c_uint,
) -> Mp4MuxStatus {
    clear_last_error();
    with_handle(handle, |h| {
        let profile = u8::try_from(profile).map_err(|_| {
            MuxError::invalid_argument("dv_profile", format!("profile {profile} out of range"))
        })?;
        h.muxer.set_dolby_vision_profile(profile)
    })
}

/// Sets the Dolby Vision base-layer compatible ID.
///
/// # Safety
///
/// `handle` must be a live session handle or null.
#[no_mangle]
pub unsafe extern "C" fn mp4mux_set_dv_bl_compatible_id(
    handle: *mut Mp4MuxHandle,
    compatible_id: c_int,
) -> Mp4MuxStatus {
    clear_last_error();
    with_handle(handle, |h| {
        let id = u8::try_from(compatible_id).map_err(|_| {
            MuxError::invalid_argument(
                "dv_bl_compatible_id",
                format!("compatible ID {compatible_id} out of range"),
            )
        })?;
        h.muxer.set_dolby_vision_bl_compatible_id(id)
    })
}

/// Names the sample entry box of the stream in slot `stream_index`
/// `dvh1`.
///
/// # Safety
///
/// `handle` must be a live session handle or null.
#[no_mangle]
pub unsafe extern "C" fn mp4mux_set_sampleentry_dvh1(
    handle: *mut Mp4MuxHandle,
    stream_index: c_int,
) -> Mp4MuxStatus {
    clear_last_error();
    with_handle(handle, |h| {
        let slot = slot_from(stream_index)?;
        h.muxer.mark_sample_entry_dvh1(slot)
    })
}

/// Names the sample entry box of the stream in slot `stream_index`
/// `hvc1`.
///
/// # Safety
///
/// `handle` must be a live session handle or null.
#[no_mangle]
pub unsafe extern "C" fn mp4mux_set_sampleentry_hvc1(
    handle: *mut Mp4MuxHandle,
    stream_index: c_int,
) -> Mp4MuxStatus {
    clear_last_error();
    with_handle(handle, |h| {
        let slot = slot_from(stream_index)?;
        h.muxer.mark_sample_entry_hvc1(slot)
    })
}

fn slot_from(stream_index: c_int) -> Result<usize, MuxError> {
    usize::try_from(stream_index).map_err(|_| {
        MuxError::invalid_argument(
            "stream_index",
            format!("stream index {stream_index} must not be negative"),
        )
    })
}

/// Normalizes the configuration store to the nearest valid
/// configuration. Idempotent; safe to invoke more than once.
///
/// # Safety
///
/// `handle` must be a live session handle or null.
#[no_mangle]
pub unsafe extern "C" fn mp4mux_consistency_check(handle: *mut Mp4MuxHandle) -> Mp4MuxStatus {
    clear_last_error();
    with_handle(handle, |h| h.muxer.run_consistency_check().map(|_| ()))
}

/// Finalizes the configuration and delegates to the muxing engine.
///
/// # Safety
///
/// `handle` must be a live session handle or null.
#[no_mangle]
pub unsafe extern "C" fn mp4mux_start(handle: *mut Mp4MuxHandle) -> Mp4MuxStatus {
    clear_last_error();
    with_handle(handle, |h| h.muxer.start(&mut h.engine).map(|_| ()))
}
