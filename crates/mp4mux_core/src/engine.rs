//! Muxing engine boundary.
//!
//! The control layer does not write container bytes. Once a session's
//! configuration is consistent and complete, `start` hands the frozen
//! store to a [`MuxEngine`]; box serialization, timestamp computation
//! and sample-table generation are entirely the engine's contract.
//!
//! # Implementors
//!
//! - [`ValidatingEngine`] - Checks input readability, writes nothing
//! - [`NullEngine`] - Accepts any store, for tests

use crate::config::{MuxConfig, StreamConfig};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Opaque failures surfaced from the muxing engine during start.
#[derive(Debug, Error)]
pub enum EngineError {
    /// An input elementary stream file could not be opened.
    #[error("cannot open input {}: {source}", path.display())]
    InputUnreadable {
        /// The input file that failed to open.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// An I/O error occurred while producing the container.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The engine does not support the requested configuration.
    #[error("unsupported configuration: {0}")]
    Unsupported(String),

    /// Any other engine failure.
    #[error("engine failure: {0}")]
    Failed(String),
}

/// What an engine produced from a finalized configuration store.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MuxReport {
    /// Number of tracks multiplexed.
    pub track_count: usize,
    /// Whether fragmented output was produced.
    pub fragmented: bool,
    /// Description of the destination that was written.
    pub destination: String,
}

/// The component that serializes a finalized configuration store and
/// sample data into the container bitstream.
///
/// The store passed to [`MuxEngine::run`] has already been through the
/// consistency pass and the session's completeness checks; the engine
/// remains the final validation authority and may still reject it.
pub trait MuxEngine {
    /// Produces the output container from the finalized store.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] on any engine-side failure; the
    /// session surfaces it unchanged.
    fn run(&mut self, config: &MuxConfig, streams: &[StreamConfig]) -> EngineResult<MuxReport>;
}

/// Engine that validates the store the way a writer would, without
/// producing container bytes.
///
/// Every input file must be openable. Downstream container writers
/// implement [`MuxEngine`] themselves; this one backs the CLI and the
/// C ABI in this workspace.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatingEngine;

impl ValidatingEngine {
    /// Creates a validating engine.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl MuxEngine for ValidatingEngine {
    fn run(&mut self, config: &MuxConfig, streams: &[StreamConfig]) -> EngineResult<MuxReport> {
        let destination = match &config.output {
            Some(target) => target.to_string(),
            None => return Err(EngineError::Failed("no output target configured".into())),
        };

        for stream in streams {
            if let Err(source) = std::fs::File::open(&stream.path) {
                return Err(EngineError::InputUnreadable {
                    path: stream.path.clone(),
                    source,
                });
            }
        }

        Ok(MuxReport {
            track_count: streams.len(),
            fragmented: config.is_fragmented(),
            destination,
        })
    }
}

/// Engine that accepts any store without touching the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEngine;

impl NullEngine {
    /// Creates a null engine.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl MuxEngine for NullEngine {
    fn run(&mut self, config: &MuxConfig, streams: &[StreamConfig]) -> EngineResult<MuxReport> {
        Ok(MuxReport {
            track_count: streams.len(),
            fragmented: config.is_fragmented(),
            destination: config
                .output
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "unset".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OutputTarget;
    use std::io::Write;

    #[test]
    fn null_engine_reports_track_count() {
        let config = MuxConfig::default();
        let streams = vec![
            StreamConfig::new("a.h265"),
            StreamConfig::new("b.ec3"),
        ];
        let report = NullEngine::new().run(&config, &streams).unwrap();
        assert_eq!(report.track_count, 2);
        assert!(!report.fragmented);
        assert_eq!(report.destination, "unset");
    }

    #[test]
    fn validating_engine_requires_output() {
        let config = MuxConfig::default();
        let err = ValidatingEngine::new().run(&config, &[]).unwrap_err();
        assert!(matches!(err, EngineError::Failed(_)));
    }

    #[test]
    fn validating_engine_rejects_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let config = MuxConfig {
            output: Some(OutputTarget::File(dir.path().join("out.mp4"))),
            ..MuxConfig::default()
        };
        let streams = vec![StreamConfig::new(dir.path().join("missing.h265"))];
        let err = ValidatingEngine::new().run(&config, &streams).unwrap_err();
        assert!(matches!(err, EngineError::InputUnreadable { .. }));
    }

    #[test]
    fn validating_engine_accepts_readable_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("video.h265");
        let mut file = std::fs::File::create(&input).unwrap();
        file.write_all(b"\x00\x00\x00\x01").unwrap();

        let config = MuxConfig {
            output: Some(OutputTarget::Buffer),
            ..MuxConfig::default()
        };
        let streams = vec![StreamConfig::new(input)];
        let report = ValidatingEngine::new().run(&config, &streams).unwrap();
        assert_eq!(report.track_count, 1);
        assert_eq!(report.destination, "buffer");
    }
}
