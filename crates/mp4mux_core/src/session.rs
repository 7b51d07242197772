//! Muxer session lifecycle.

use crate::config::{MuxConfig, StreamConfig, MAX_STREAMS};
use crate::consistency::{self, Adjustment, ConsistencyMode};
use crate::engine::{MuxEngine, MuxReport};
use crate::error::{MuxError, MuxResult};
use crate::normalize;
use crate::types::{DvProfile, Framerate, OutputFormat, OutputTarget, SampleEntryKind};
use std::fmt;
use std::path::PathBuf;

/// Lifecycle state of a muxer session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SessionState {
    /// The configuration store accepts setter calls.
    #[default]
    Configuring,
    /// The store is frozen and has been handed to the engine.
    Started,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuring => f.write_str("configuring"),
            Self::Started => f.write_str("started"),
        }
    }
}

/// Parameters for one elementary stream input.
///
/// Everything except the file path is optional; zero means "engine
/// default" for the numeric fields, matching the wire convention of the
/// C ABI.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSpec {
    /// Input file carrying the elementary stream.
    pub path: PathBuf,
    /// Media language tag, e.g. `eng`.
    pub language: Option<String>,
    /// Human-readable track name.
    pub track_name: Option<String>,
    /// Encoder name recorded in the track metadata.
    pub encoder_name: Option<String>,
    /// Media timescale; 0 derives it from the stream.
    pub time_scale: u32,
    /// Samples per chunk; 0 disables size-based interleaving.
    pub chunk_span_size: u32,
    /// Track identifier; 0 lets the engine assign one.
    pub track_id: u32,
}

impl InputSpec {
    /// Creates an input spec for a file with engine defaults elsewhere.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Sets the media language tag.
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Sets the track name.
    #[must_use]
    pub fn track_name(mut self, name: impl Into<String>) -> Self {
        self.track_name = Some(name.into());
        self
    }

    /// Sets the encoder name.
    #[must_use]
    pub fn encoder_name(mut self, name: impl Into<String>) -> Self {
        self.encoder_name = Some(name.into());
        self
    }

    /// Sets the media timescale.
    #[must_use]
    pub const fn time_scale(mut self, time_scale: u32) -> Self {
        self.time_scale = time_scale;
        self
    }

    /// Sets the size-based chunk interleave span.
    #[must_use]
    pub const fn chunk_span_size(mut self, samples: u32) -> Self {
        self.chunk_span_size = samples;
        self
    }

    /// Sets an explicit track identifier.
    #[must_use]
    pub const fn track_id(mut self, track_id: u32) -> Self {
        self.track_id = track_id;
        self
    }
}

/// A muxer session: the exclusive owner of one configuration store.
///
/// A session moves through `Configuring -> Started`; dropping it is the
/// sole release path for the store and whatever output handle was
/// configured. All operations run synchronously on the caller's thread
/// with no internal locking - concurrent use of one session requires
/// external serialization, which the `&mut self` receivers enforce at
/// the type level.
///
/// # Example
///
/// ```rust,ignore
/// use mp4mux_core::{InputSpec, Muxer, OutputTarget, ValidatingEngine};
///
/// let mut muxer = Muxer::new();
/// muxer.set_input(InputSpec::new("video.h265").language("eng"))?;
/// muxer.set_output(OutputTarget::File("out.mp4".into()))?;
/// muxer.set_output_format("frag-mp4")?;
/// let report = muxer.start(&mut ValidatingEngine::new())?;
/// ```
#[derive(Debug, Default)]
pub struct Muxer {
    /// Global multiplex settings.
    config: MuxConfig,
    /// Per-stream settings; index is the stream slot.
    streams: Vec<StreamConfig>,
    /// Lifecycle state.
    state: SessionState,
    /// How `start` treats an inconsistent store.
    consistency_mode: ConsistencyMode,
}

impl Muxer {
    /// Creates a session with an empty configuration store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_configuring(&self, operation: &'static str) -> MuxResult<()> {
        match self.state {
            SessionState::Configuring => Ok(()),
            SessionState::Started => Err(MuxError::invalid_state(operation)),
        }
    }

    /// Sets the frame rate applied to subsequently added video streams.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidState` after start and `InvalidArgument` if
    /// either part is zero.
    pub fn set_video_framerate(&mut self, numerator: u32, denominator: u32) -> MuxResult<()> {
        self.ensure_configuring("set_video_framerate")?;
        self.config.video_framerate = Some(Framerate::new(numerator, denominator)?);
        Ok(())
    }

    /// Appends one elementary stream to the session.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidState` after start, `InvalidArgument` for an
    /// empty file path or empty-but-present text parameter, and
    /// `TooManyStreams` past the per-session limit. On failure the
    /// stream list is unchanged.
    pub fn set_input(&mut self, spec: InputSpec) -> MuxResult<()> {
        self.ensure_configuring("set_input")?;
        if self.streams.len() >= MAX_STREAMS {
            return Err(MuxError::TooManyStreams { limit: MAX_STREAMS });
        }
        if spec.path.as_os_str().is_empty() {
            return Err(MuxError::invalid_argument("file", "must not be empty"));
        }

        let language = normalize::opt_text("lang", spec.language.as_deref())?;
        let track_name = normalize::opt_text("name", spec.track_name.as_deref())?;
        let encoder_name = normalize::opt_text("enc_name", spec.encoder_name.as_deref())?;

        self.streams.push(StreamConfig {
            path: spec.path,
            language,
            track_name,
            encoder_name,
            time_scale: spec.time_scale,
            chunk_span_size: spec.chunk_span_size,
            track_id: spec.track_id,
            sample_entry: None,
        });
        Ok(())
    }

    /// Sets the output destination.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidState` after start and `InvalidArgument` for
    /// an empty file path.
    pub fn set_output(&mut self, target: OutputTarget) -> MuxResult<()> {
        self.ensure_configuring("set_output")?;
        if let OutputTarget::File(path) = &target {
            if path.as_os_str().is_empty() {
                return Err(MuxError::invalid_argument("output", "must not be empty"));
            }
        }
        self.config.output = Some(target);
        Ok(())
    }

    /// Sets the chunk interleave time span in milliseconds; 0 disables
    /// time-based chunk interleaving.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidState` after start.
    pub fn set_chunk_span_time(&mut self, span_ms: u32) -> MuxResult<()> {
        self.ensure_configuring("set_chunk_span_time")?;
        self.config.chunk_span_time = span_ms;
        Ok(())
    }

    /// Overrides the movie header timescale.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidState` after start and `InvalidArgument` for
    /// a zero timescale.
    pub fn set_moov_timescale(&mut self, timescale: u32) -> MuxResult<()> {
        self.ensure_configuring("set_moov_timescale")?;
        self.config.moov_timescale = Some(normalize::nonzero("moov_timescale", timescale)?);
        Ok(())
    }

    /// Sets the major brand of the file type box.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidState` after start and `InvalidArgument` for
    /// anything but a four-character ASCII code.
    pub fn set_major_brand(&mut self, brand: &str) -> MuxResult<()> {
        self.ensure_configuring("set_major_brand")?;
        self.config.major_brand = Some(brand.parse()?);
        Ok(())
    }

    /// Appends one compatible brand to the file type box.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidState` after start and `InvalidArgument` for
    /// anything but a four-character ASCII code.
    pub fn add_compatible_brand(&mut self, brand: &str) -> MuxResult<()> {
        self.ensure_configuring("add_compatible_brand")?;
        let brand = brand.parse()?;
        self.config.compatible_brands.push(brand);
        Ok(())
    }

    /// Selects the output container layout by format tag (`mp4` or
    /// `frag-mp4`).
    ///
    /// # Errors
    ///
    /// Fails with `InvalidState` after start and `InvalidArgument` for
    /// an unknown tag.
    pub fn set_output_format(&mut self, tag: &str) -> MuxResult<()> {
        self.ensure_configuring("set_output_format")?;
        self.config.output_format = tag.parse::<OutputFormat>()?;
        Ok(())
    }

    /// Sets the maximum fragment duration in milliseconds.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidState` after start and `InvalidArgument` for
    /// a zero duration.
    pub fn set_max_fragment_duration(&mut self, duration_ms: u32) -> MuxResult<()> {
        self.ensure_configuring("set_max_fragment_duration")?;
        self.config.max_fragment_duration =
            normalize::nonzero("max_fragment_duration", duration_ms)?;
        Ok(())
    }

    /// Sets the Dolby Vision profile.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidState` after start and `InvalidArgument` for
    /// a profile outside {4, 5, 7, 8, 9}.
    pub fn set_dolby_vision_profile(&mut self, profile: u8) -> MuxResult<()> {
        self.ensure_configuring("set_dolby_vision_profile")?;
        self.config.dolby_vision_profile = Some(DvProfile::new(profile)?);
        Ok(())
    }

    /// Sets the Dolby Vision base-layer compatible ID.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidState` after start and `InvalidArgument` for
    /// an ID outside {1, 2, 4}.
    pub fn set_dolby_vision_bl_compatible_id(&mut self, id: u8) -> MuxResult<()> {
        self.ensure_configuring("set_dolby_vision_bl_compatible_id")?;
        self.config.dolby_vision_bl_compatible_id = Some(normalize::dv_bl_compatible_id(id)?);
        Ok(())
    }

    /// Names the sample entry box of a stream `dvh1`.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidState` after start and
    /// `StreamIndexOutOfBounds` for an unconfigured stream slot.
    pub fn mark_sample_entry_dvh1(&mut self, stream: usize) -> MuxResult<()> {
        self.mark_sample_entry(stream, SampleEntryKind::Dvh1, "mark_sample_entry_dvh1")
    }

    /// Names the sample entry box of a stream `hvc1`.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidState` after start and
    /// `StreamIndexOutOfBounds` for an unconfigured stream slot.
    pub fn mark_sample_entry_hvc1(&mut self, stream: usize) -> MuxResult<()> {
        self.mark_sample_entry(stream, SampleEntryKind::Hvc1, "mark_sample_entry_hvc1")
    }

    fn mark_sample_entry(
        &mut self,
        stream: usize,
        kind: SampleEntryKind,
        operation: &'static str,
    ) -> MuxResult<()> {
        self.ensure_configuring(operation)?;
        let slot = normalize::stream_index(stream, self.streams.len())?;
        self.streams[slot].sample_entry = Some(kind);
        Ok(())
    }

    /// Selects how `start` treats an inconsistent store.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidState` after start.
    pub fn set_consistency_mode(&mut self, mode: ConsistencyMode) -> MuxResult<()> {
        self.ensure_configuring("set_consistency_mode")?;
        self.consistency_mode = mode;
        Ok(())
    }

    /// Normalizes the store to the nearest valid configuration.
    ///
    /// Idempotent; safe to invoke more than once. Returns the repairs
    /// made, empty when the invariants already held.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidState` after start (the store is frozen).
    pub fn run_consistency_check(&mut self) -> MuxResult<Vec<Adjustment>> {
        self.ensure_configuring("run_consistency_check")?;
        Ok(consistency::enforce(&mut self.config, &mut self.streams))
    }

    /// Finalizes the configuration and delegates to the muxing engine.
    ///
    /// Runs the consistency pass per the session's
    /// [`ConsistencyMode`], validates completeness, freezes the store,
    /// and hands it to `engine`. The engine's verdict is surfaced
    /// unchanged.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if the session already started.
    /// - `InvalidConfiguration` in strict mode when repairs would be
    ///   needed; the store is left untouched.
    /// - `NoStreams` / `NoOutput` if the store is incomplete.
    /// - `Engine` for failures reported by the engine.
    pub fn start<E: MuxEngine + ?Sized>(&mut self, engine: &mut E) -> MuxResult<MuxReport> {
        self.ensure_configuring("start")?;

        match self.consistency_mode {
            ConsistencyMode::Repair => {
                let adjustments = consistency::enforce(&mut self.config, &mut self.streams);
                if !adjustments.is_empty() {
                    tracing::debug!(
                        repairs = adjustments.len(),
                        "normalized interleave configuration before start"
                    );
                }
            }
            ConsistencyMode::Strict => {
                let adjustments = consistency::plan(&self.config, &self.streams);
                if !adjustments.is_empty() {
                    let detail = adjustments
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join("; ");
                    return Err(MuxError::invalid_configuration(format!(
                        "interleave settings require repair: {detail}"
                    )));
                }
            }
        }

        if self.streams.is_empty() {
            return Err(MuxError::NoStreams);
        }
        if self.config.output.is_none() {
            return Err(MuxError::NoOutput);
        }

        self.state = SessionState::Started;
        tracing::info!(
            tracks = self.streams.len(),
            format = %self.config.output_format,
            "starting muxer session"
        );

        let report = engine.run(&self.config, &self.streams)?;
        Ok(report)
    }

    /// Returns the global configuration.
    #[must_use]
    pub fn config(&self) -> &MuxConfig {
        &self.config
    }

    /// Returns the per-stream configurations in slot order.
    #[must_use]
    pub fn streams(&self) -> &[StreamConfig] {
        &self.streams
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Returns true once the store has been frozen and handed to the
    /// engine.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.state == SessionState::Started
    }

    /// Returns how `start` treats an inconsistent store.
    #[must_use]
    pub fn consistency_mode(&self) -> ConsistencyMode {
        self.consistency_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineError, EngineResult, NullEngine};

    struct FailingEngine;

    impl MuxEngine for FailingEngine {
        fn run(&mut self, _: &MuxConfig, _: &[StreamConfig]) -> EngineResult<MuxReport> {
            Err(EngineError::Failed("broken writer".into()))
        }
    }

    fn configured() -> Muxer {
        let mut muxer = Muxer::new();
        muxer.set_input(InputSpec::new("video.h265")).unwrap();
        muxer.set_output(OutputTarget::Buffer).unwrap();
        muxer
    }

    #[test]
    fn new_session_is_configuring() {
        let muxer = Muxer::new();
        assert_eq!(muxer.state(), SessionState::Configuring);
        assert!(!muxer.is_started());
        assert!(muxer.streams().is_empty());
    }

    #[test]
    fn set_input_rejects_empty_path() {
        // A failed call must leave the stream list alone.
        let mut muxer = Muxer::new();
        let err = muxer.set_input(InputSpec::new("")).unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(muxer.streams().is_empty());
    }

    #[test]
    fn set_input_rejects_empty_language() {
        let mut muxer = Muxer::new();
        let err = muxer
            .set_input(InputSpec::new("a.ec3").language(""))
            .unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(muxer.streams().is_empty());
    }

    #[test]
    fn set_input_appends_in_slot_order() {
        let mut muxer = Muxer::new();
        muxer
            .set_input(InputSpec::new("v.h265").chunk_span_size(4096))
            .unwrap();
        muxer
            .set_input(InputSpec::new("a.ec3").language("rus").track_id(7))
            .unwrap();

        let streams = muxer.streams();
        assert_eq!(streams.len(), 2);
        assert_eq!(streams[0].chunk_span_size, 4096);
        assert_eq!(streams[1].language.as_deref(), Some("rus"));
        assert_eq!(streams[1].track_id, 7);
    }

    #[test]
    fn stream_limit_is_enforced() {
        let mut muxer = Muxer::new();
        for i in 0..MAX_STREAMS {
            muxer.set_input(InputSpec::new(format!("in{i}.ec3"))).unwrap();
        }
        let err = muxer.set_input(InputSpec::new("extra.ec3")).unwrap_err();
        assert!(matches!(err, MuxError::TooManyStreams { limit: MAX_STREAMS }));
    }

    #[test]
    fn sample_entry_marks_are_bounds_checked() {
        let mut muxer = Muxer::new();
        muxer.set_input(InputSpec::new("v.h265")).unwrap();

        muxer.mark_sample_entry_dvh1(0).unwrap();
        assert_eq!(
            muxer.streams()[0].sample_entry,
            Some(SampleEntryKind::Dvh1)
        );

        let err = muxer.mark_sample_entry_hvc1(1).unwrap_err();
        assert!(matches!(
            err,
            MuxError::StreamIndexOutOfBounds { index: 1, count: 1 }
        ));
    }

    #[test]
    fn start_requires_streams() {
        let mut muxer = Muxer::new();
        muxer.set_output(OutputTarget::Buffer).unwrap();
        let err = muxer.start(&mut NullEngine::new()).unwrap_err();
        assert!(matches!(err, MuxError::NoStreams));
    }

    #[test]
    fn start_requires_output() {
        let mut muxer = Muxer::new();
        muxer.set_input(InputSpec::new("v.h265")).unwrap();
        let err = muxer.start(&mut NullEngine::new()).unwrap_err();
        assert!(matches!(err, MuxError::NoOutput));
    }

    #[test]
    fn start_freezes_the_store() {
        let mut muxer = configured();
        muxer.start(&mut NullEngine::new()).unwrap();
        assert!(muxer.is_started());

        assert!(matches!(
            muxer.set_moov_timescale(600).unwrap_err(),
            MuxError::InvalidState { .. }
        ));
        assert!(matches!(
            muxer.set_input(InputSpec::new("late.ec3")).unwrap_err(),
            MuxError::InvalidState { .. }
        ));
        assert!(matches!(
            muxer.run_consistency_check().unwrap_err(),
            MuxError::InvalidState { .. }
        ));
        assert!(matches!(
            muxer.start(&mut NullEngine::new()).unwrap_err(),
            MuxError::InvalidState { .. }
        ));
    }

    #[test]
    fn start_normalizes_fragmented_interleave() {
        let mut muxer = Muxer::new();
        muxer.set_output_format("frag-mp4").unwrap();
        muxer
            .set_input(InputSpec::new("v.h265").chunk_span_size(4096))
            .unwrap();
        muxer
            .set_input(InputSpec::new("a.ec3").chunk_span_size(2048))
            .unwrap();
        muxer.set_output(OutputTarget::Buffer).unwrap();

        let report = muxer.start(&mut NullEngine::new()).unwrap();
        assert!(report.fragmented);
        assert!(muxer.streams().iter().all(|s| s.chunk_span_size == 0));
        assert_eq!(muxer.config().chunk_span_time, 0);
    }

    #[test]
    fn strict_mode_rejects_inconsistent_store() {
        let mut muxer = Muxer::new();
        muxer.set_consistency_mode(ConsistencyMode::Strict).unwrap();
        muxer.set_output_format("frag-mp4").unwrap();
        muxer
            .set_input(InputSpec::new("v.h265").chunk_span_size(4096))
            .unwrap();
        muxer.set_output(OutputTarget::Buffer).unwrap();

        let err = muxer.start(&mut NullEngine::new()).unwrap_err();
        assert!(matches!(err, MuxError::InvalidConfiguration { .. }));

        // The store is untouched and the session can still be repaired.
        assert_eq!(muxer.streams()[0].chunk_span_size, 4096);
        assert!(!muxer.is_started());
        muxer.run_consistency_check().unwrap();
        muxer.start(&mut NullEngine::new()).unwrap();
    }

    #[test]
    fn strict_mode_passes_consistent_store() {
        let mut muxer = configured();
        muxer.set_consistency_mode(ConsistencyMode::Strict).unwrap();
        let report = muxer.start(&mut NullEngine::new()).unwrap();
        assert_eq!(report.track_count, 1);
    }

    #[test]
    fn consistency_check_is_idempotent() {
        let mut muxer = Muxer::new();
        muxer.set_output_format("frag-mp4").unwrap();
        muxer
            .set_input(InputSpec::new("v.h265").chunk_span_size(512))
            .unwrap();

        let first = muxer.run_consistency_check().unwrap();
        assert!(!first.is_empty());
        let second = muxer.run_consistency_check().unwrap();
        assert!(second.is_empty());
    }

    #[test]
    fn engine_error_is_surfaced_unchanged() {
        let mut muxer = configured();
        let err = muxer.start(&mut FailingEngine).unwrap_err();
        assert!(matches!(err, MuxError::Engine(EngineError::Failed(_))));
        // Delegation happened, so the session is started regardless.
        assert!(muxer.is_started());
    }

    #[test]
    fn chunk_span_time_accepts_zero_and_survives_flat_start() {
        // Flat output with time interleave keeps both interleave settings.
        let mut muxer = Muxer::new();
        muxer.set_chunk_span_time(500).unwrap();
        muxer
            .set_input(InputSpec::new("v.h265").chunk_span_size(1000))
            .unwrap();
        muxer.set_output(OutputTarget::Buffer).unwrap();

        muxer.start(&mut NullEngine::new()).unwrap();
        assert_eq!(muxer.config().chunk_span_time, 500);
        assert_eq!(muxer.streams()[0].chunk_span_size, 1000);

        let mut muxer = Muxer::new();
        muxer.set_chunk_span_time(0).unwrap();
        assert_eq!(muxer.config().chunk_span_time, 0);
    }

    #[test]
    fn setter_failure_leaves_prior_value() {
        let mut muxer = Muxer::new();
        muxer.set_major_brand("mp42").unwrap();
        assert!(muxer.set_major_brand("toolong").is_err());
        assert_eq!(muxer.config().major_brand.unwrap().as_str(), "mp42");
    }

    #[test]
    fn brand_and_dv_setters_validate() {
        let mut muxer = Muxer::new();
        assert!(muxer.set_major_brand("").is_err());
        muxer.add_compatible_brand("iso6").unwrap();
        muxer.add_compatible_brand("dby1").unwrap();
        assert_eq!(muxer.config().compatible_brands.len(), 2);

        assert!(muxer.set_dolby_vision_profile(6).is_err());
        muxer.set_dolby_vision_profile(8).unwrap();
        assert!(muxer.set_dolby_vision_bl_compatible_id(3).is_err());
        muxer.set_dolby_vision_bl_compatible_id(2).unwrap();

        assert!(muxer.set_moov_timescale(0).is_err());
        assert!(muxer.set_max_fragment_duration(0).is_err());
        assert!(muxer.set_video_framerate(24000, 0).is_err());
        muxer.set_video_framerate(24000, 1001).unwrap();
    }
}
