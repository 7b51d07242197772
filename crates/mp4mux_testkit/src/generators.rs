//! Property-based test generators using proptest.
//!
//! Provides strategies for generating configuration stores that cover
//! every combination the consistency pass has to reconcile.

use mp4mux_core::{MuxConfig, OutputFormat, OutputTarget, StreamConfig};
use proptest::prelude::*;

/// Strategy for generating an output container layout.
pub fn output_format_strategy() -> impl Strategy<Value = OutputFormat> {
    prop_oneof![Just(OutputFormat::Mp4), Just(OutputFormat::FragMp4)]
}

/// Strategy for generating a chunk interleave time span, zero included.
pub fn chunk_span_time_strategy() -> impl Strategy<Value = u32> {
    prop_oneof![Just(0u32), 1u32..=5000]
}

/// Strategy for generating one stream configuration.
///
/// Chunk span sizes are drawn with zero included so generated stores
/// cover streams with and without size-based interleaving.
pub fn stream_config_strategy() -> impl Strategy<Value = StreamConfig> {
    (
        0u32..1000,
        prop_oneof![Just(0u32), 1u32..=8192],
        prop::option::of(prop::string::string_regex("[a-z]{3}").expect("Invalid regex")),
    )
        .prop_map(|(slot, chunk_span_size, language)| {
            let mut stream = StreamConfig::new(format!("input{slot}.h265"));
            stream.chunk_span_size = chunk_span_size;
            stream.language = language;
            stream
        })
}

/// Strategy for generating a global configuration.
pub fn mux_config_strategy() -> impl Strategy<Value = MuxConfig> {
    (output_format_strategy(), chunk_span_time_strategy()).prop_map(
        |(output_format, chunk_span_time)| MuxConfig {
            output_format,
            chunk_span_time,
            output: Some(OutputTarget::Buffer),
            ..MuxConfig::default()
        },
    )
}

/// Strategy for generating a whole configuration store.
pub fn store_strategy() -> impl Strategy<Value = (MuxConfig, Vec<StreamConfig>)> {
    (
        mux_config_strategy(),
        prop::collection::vec(stream_config_strategy(), 0..6),
    )
}
