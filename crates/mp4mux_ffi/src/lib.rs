//! # mp4mux FFI
//!
//! Stable C ABI for the mp4mux control layer.
//!
//! This crate provides:
//! - C-compatible function exports over [`mp4mux_core`]
//! - An opaque session handle created by [`mp4mux_create`] and released
//!   by [`mp4mux_destroy`]
//! - Status-code mapping ([`Mp4MuxStatus`]) and a thread-local last
//!   error message ([`mp4mux_last_error`])
//!
//! Every boundary operation of the control layer is exported: the
//! per-stream and global setters, the idempotent consistency check, and
//! start. Conventions: a null string argument means "absent" where the
//! parameter is optional; an empty string is rejected with
//! `InvalidArgument`; the caller must serialize access to a single
//! handle (there is no internal locking).

#![warn(missing_docs)]

mod error;
mod muxer;

pub use error::{
    clear_last_error, mp4mux_clear_error, mp4mux_last_error, set_last_error, ErrorCode,
    Mp4MuxStatus,
};
pub use muxer::{
    mp4mux_consistency_check, mp4mux_create, mp4mux_destroy, mp4mux_set_compatible_brand,
    mp4mux_set_dv_bl_compatible_id, mp4mux_set_dv_profile, mp4mux_set_input,
    mp4mux_set_major_brand, mp4mux_set_max_duration, mp4mux_set_moov_timescale,
    mp4mux_set_output, mp4mux_set_output_format, mp4mux_set_sampleentry_dvh1,
    mp4mux_set_sampleentry_hvc1, mp4mux_set_video_framerate, mp4mux_start, Mp4MuxHandle,
};
