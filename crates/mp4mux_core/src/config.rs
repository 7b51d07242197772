//! Session configuration store.
//!
//! One [`MuxConfig`] plus an ordered list of [`StreamConfig`] entries make
//! up the configuration a session hands to the muxing engine. Stream
//! identity is purely positional: the list index is the stream slot.

use crate::types::{DvProfile, FourCc, Framerate, OutputFormat, OutputTarget, SampleEntryKind};
use std::path::PathBuf;

/// Maximum number of elementary streams per session.
pub const MAX_STREAMS: usize = 32;

/// Default maximum fragment duration in milliseconds.
pub const DEFAULT_MAX_FRAGMENT_DURATION_MS: u32 = 2000;

/// Default chunk interleave span in milliseconds for flat output.
pub const DEFAULT_CHUNK_SPAN_MS: u32 = 1000;

/// Global multiplexer configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MuxConfig {
    /// Output container layout.
    pub output_format: OutputFormat,

    /// Chunk interleave span in milliseconds; 0 disables time-based
    /// chunk interleaving.
    pub chunk_span_time: u32,

    /// Override for the movie header timescale.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub moov_timescale: Option<u32>,

    /// Maximum fragment duration in milliseconds (fragmented output).
    pub max_fragment_duration: u32,

    /// Major brand for the file type box.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub major_brand: Option<FourCc>,

    /// Compatible brands for the file type box, in call order.
    pub compatible_brands: Vec<FourCc>,

    /// Dolby Vision profile of the video elementary stream.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub dolby_vision_profile: Option<DvProfile>,

    /// Dolby Vision base-layer compatible ID.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub dolby_vision_bl_compatible_id: Option<u8>,

    /// Frame rate applied to subsequently added video streams.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub video_framerate: Option<Framerate>,

    /// Destination for the produced container.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub output: Option<OutputTarget>,
}

impl Default for MuxConfig {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::Mp4,
            chunk_span_time: DEFAULT_CHUNK_SPAN_MS,
            moov_timescale: None,
            max_fragment_duration: DEFAULT_MAX_FRAGMENT_DURATION_MS,
            major_brand: None,
            compatible_brands: Vec::new(),
            dolby_vision_profile: None,
            dolby_vision_bl_compatible_id: None,
            video_framerate: None,
            output: None,
        }
    }
}

impl MuxConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true for fragmented output.
    #[must_use]
    pub fn is_fragmented(&self) -> bool {
        self.output_format.is_fragmented()
    }
}

/// Configuration for one elementary stream.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StreamConfig {
    /// Input file carrying the elementary stream.
    pub path: PathBuf,

    /// Media language tag, e.g. `eng`.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub language: Option<String>,

    /// Human-readable track name.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub track_name: Option<String>,

    /// Encoder name recorded in the track metadata.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub encoder_name: Option<String>,

    /// Media timescale; 0 derives it from the stream.
    pub time_scale: u32,

    /// Samples per chunk; 0 disables size-based chunk interleaving for
    /// this stream.
    pub chunk_span_size: u32,

    /// Track identifier; 0 lets the engine assign one.
    pub track_id: u32,

    /// Sample-entry box naming override.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub sample_entry: Option<SampleEntryKind>,
}

impl StreamConfig {
    /// Creates a stream configuration for an input file with engine
    /// defaults for every other field.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            language: None,
            track_name: None,
            encoder_name: None,
            time_scale: 0,
            chunk_span_size: 0,
            track_id: 0,
            sample_entry: None,
        }
    }

    /// Returns true if size-based chunk interleaving is requested.
    #[must_use]
    pub const fn interleaves_by_size(&self) -> bool {
        self.chunk_span_size != 0
    }
}
