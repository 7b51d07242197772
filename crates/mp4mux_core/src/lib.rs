//! # mp4mux Core
//!
//! Control and configuration layer for an MP4 multiplexer.
//!
//! This crate provides:
//! - A session object ([`Muxer`]) owning one configuration store
//! - Parameter normalization for every setter
//! - The consistency pass reconciling output mode with chunk-interleave
//!   settings before the writing engine runs
//! - The [`MuxEngine`] seam the container writer plugs into
//!
//! Container bytes are never written here - box serialization, timestamp
//! computation and sample-table generation live behind [`MuxEngine`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use mp4mux_core::{InputSpec, Muxer, OutputTarget, ValidatingEngine};
//!
//! let mut muxer = Muxer::new();
//! muxer.set_input(InputSpec::new("video.h265").language("eng"))?;
//! muxer.set_input(InputSpec::new("audio.ec3"))?;
//! muxer.set_output(OutputTarget::File("out.mp4".into()))?;
//! muxer.set_output_format("frag-mp4")?;
//! let report = muxer.start(&mut ValidatingEngine::new())?;
//! println!("muxed {} tracks", report.track_count);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod consistency;
pub mod engine;
mod error;
pub mod normalize;
mod session;
mod types;

pub use config::{
    MuxConfig, StreamConfig, DEFAULT_CHUNK_SPAN_MS, DEFAULT_MAX_FRAGMENT_DURATION_MS, MAX_STREAMS,
};
pub use consistency::{Adjustment, ConsistencyMode};
pub use engine::{EngineError, EngineResult, MuxEngine, MuxReport, NullEngine, ValidatingEngine};
pub use error::{MuxError, MuxResult};
pub use session::{InputSpec, Muxer, SessionState};
pub use types::{DvProfile, FourCc, Framerate, OutputFormat, OutputTarget, SampleEntryKind};

/// Crate version, for tooling that reports it.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
