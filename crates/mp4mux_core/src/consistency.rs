//! Consistency enforcement over the configuration store.
//!
//! Size-based and time-based chunk interleaving are mutually exclusive
//! strategies, and fragmented output uses its own fragment-boundary
//! logic that is incompatible with either. The pass below reconciles the
//! store so the following holds when the engine runs:
//!
//! 1. Fragmented output, or a zero chunk time span, clears every
//!    stream's `chunk_span_size`.
//! 2. Fragmented output clears `chunk_span_time`.

use crate::config::{MuxConfig, StreamConfig};
use std::fmt;

/// How `start` treats a store that violates the interleave invariants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ConsistencyMode {
    /// Normalize the store to the nearest valid configuration.
    ///
    /// Callers may set per-stream chunk sizes speculatively; the pass
    /// trims them without requiring the caller to track global state.
    #[default]
    Repair,
    /// Fail `start` with `InvalidConfiguration` instead of repairing,
    /// leaving the store untouched.
    Strict,
}

/// One repair made (or required) by the consistency pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case", tag = "kind"))]
pub enum Adjustment {
    /// A stream's size-based interleave setting was cleared.
    StreamChunkSpanCleared {
        /// Stream slot the setting belonged to.
        stream: usize,
        /// The discarded sample count.
        previous: u32,
    },
    /// The global time-based interleave setting was cleared.
    ChunkSpanTimeCleared {
        /// The discarded span in milliseconds.
        previous: u32,
    },
}

impl fmt::Display for Adjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StreamChunkSpanCleared { stream, previous } => {
                write!(f, "stream {stream}: chunk_span_size {previous} -> 0")
            }
            Self::ChunkSpanTimeCleared { previous } => {
                write!(f, "chunk_span_time {previous} -> 0")
            }
        }
    }
}

/// Computes the repairs the store needs, without mutating it.
///
/// An empty result means the invariants already hold.
#[must_use]
pub fn plan(config: &MuxConfig, streams: &[StreamConfig]) -> Vec<Adjustment> {
    let mut adjustments = Vec::new();

    if config.is_fragmented() || config.chunk_span_time == 0 {
        // No interleave by size.
        for (slot, stream) in streams.iter().enumerate() {
            if stream.chunk_span_size != 0 {
                adjustments.push(Adjustment::StreamChunkSpanCleared {
                    stream: slot,
                    previous: stream.chunk_span_size,
                });
            }
        }

        // No interleave by time.
        if config.is_fragmented() && config.chunk_span_time != 0 {
            adjustments.push(Adjustment::ChunkSpanTimeCleared {
                previous: config.chunk_span_time,
            });
        }
    }

    adjustments
}

/// Normalizes the store in place and returns the repairs made.
///
/// The pass never fails and is idempotent: running it on an
/// already-consistent store returns no adjustments and changes nothing.
pub fn enforce(config: &mut MuxConfig, streams: &mut [StreamConfig]) -> Vec<Adjustment> {
    let adjustments = plan(config, streams);

    for adjustment in &adjustments {
        tracing::debug!(%adjustment, "repairing interleave configuration");
        match *adjustment {
            Adjustment::StreamChunkSpanCleared { stream, .. } => {
                streams[stream].chunk_span_size = 0;
            }
            Adjustment::ChunkSpanTimeCleared { .. } => {
                config.chunk_span_time = 0;
            }
        }
    }

    adjustments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OutputFormat;

    fn streams_with_spans(spans: &[u32]) -> Vec<StreamConfig> {
        spans
            .iter()
            .enumerate()
            .map(|(i, &span)| {
                let mut stream = StreamConfig::new(format!("input{i}.h265"));
                stream.chunk_span_size = span;
                stream
            })
            .collect()
    }

    #[test]
    fn fragmented_clears_all_spans() {
        let mut config = MuxConfig {
            output_format: OutputFormat::FragMp4,
            chunk_span_time: 500,
            ..MuxConfig::default()
        };
        let mut streams = streams_with_spans(&[4096, 2048]);

        let adjustments = enforce(&mut config, &mut streams);

        assert_eq!(adjustments.len(), 3);
        assert!(streams.iter().all(|s| s.chunk_span_size == 0));
        assert_eq!(config.chunk_span_time, 0);
    }

    #[test]
    fn zero_span_time_clears_stream_spans() {
        let mut config = MuxConfig {
            chunk_span_time: 0,
            ..MuxConfig::default()
        };
        let mut streams = streams_with_spans(&[1000]);

        let adjustments = enforce(&mut config, &mut streams);

        assert_eq!(
            adjustments,
            vec![Adjustment::StreamChunkSpanCleared {
                stream: 0,
                previous: 1000,
            }]
        );
        assert_eq!(streams[0].chunk_span_size, 0);
        assert_eq!(config.chunk_span_time, 0);
    }

    #[test]
    fn flat_time_interleave_is_untouched() {
        let mut config = MuxConfig {
            chunk_span_time: 500,
            ..MuxConfig::default()
        };
        let mut streams = streams_with_spans(&[1000]);

        let adjustments = enforce(&mut config, &mut streams);

        assert!(adjustments.is_empty());
        assert_eq!(config.chunk_span_time, 500);
        assert_eq!(streams[0].chunk_span_size, 1000);
    }

    #[test]
    fn enforcement_is_idempotent() {
        let mut config = MuxConfig {
            output_format: OutputFormat::FragMp4,
            chunk_span_time: 700,
            ..MuxConfig::default()
        };
        let mut streams = streams_with_spans(&[512, 0, 256]);

        let first = enforce(&mut config, &mut streams);
        assert!(!first.is_empty());

        let config_after = config.clone();
        let streams_after = streams.clone();
        let second = enforce(&mut config, &mut streams);

        assert!(second.is_empty());
        assert_eq!(config, config_after);
        assert_eq!(streams, streams_after);
    }

    #[test]
    fn plan_does_not_mutate() {
        let config = MuxConfig {
            output_format: OutputFormat::FragMp4,
            chunk_span_time: 700,
            ..MuxConfig::default()
        };
        let streams = streams_with_spans(&[512]);

        let adjustments = plan(&config, &streams);

        assert_eq!(adjustments.len(), 2);
        assert_eq!(config.chunk_span_time, 700);
        assert_eq!(streams[0].chunk_span_size, 512);
    }

    #[test]
    fn adjustment_display() {
        let adjustment = Adjustment::StreamChunkSpanCleared {
            stream: 1,
            previous: 4096,
        };
        assert_eq!(format!("{adjustment}"), "stream 1: chunk_span_size 4096 -> 0");
        let adjustment = Adjustment::ChunkSpanTimeCleared { previous: 500 };
        assert_eq!(format!("{adjustment}"), "chunk_span_time 500 -> 0");
    }
}
