//! Session fixtures and helpers.
//!
//! Provides convenience functions for setting up muxer sessions and
//! temporary elementary stream files.

use mp4mux_core::{InputSpec, Muxer, OutputTarget};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A muxer session fixture with automatic input-file cleanup.
pub struct TestSession {
    /// The session under test.
    pub muxer: Muxer,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: Option<TempDir>,
}

impl TestSession {
    /// Creates a session with one nominal stream and a buffer output.
    ///
    /// No files are touched; pair this with an engine that does not
    /// read inputs, such as `NullEngine`.
    pub fn buffered() -> Self {
        let mut muxer = Muxer::new();
        muxer
            .set_input(InputSpec::new("video.h265"))
            .expect("Failed to add fixture stream");
        muxer
            .set_output(OutputTarget::Buffer)
            .expect("Failed to set fixture output");
        Self {
            muxer,
            _temp_dir: None,
        }
    }

    /// Creates a session backed by `inputs` real files in a temporary
    /// directory, with a file output target in the same directory.
    ///
    /// Suitable for engines that open their inputs, such as
    /// `ValidatingEngine`.
    pub fn with_files(inputs: usize) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut muxer = Muxer::new();

        for i in 0..inputs {
            let path = write_input(temp_dir.path(), &format!("input{i}.h265"));
            muxer
                .set_input(InputSpec::new(path))
                .expect("Failed to add fixture stream");
        }

        muxer
            .set_output(OutputTarget::File(temp_dir.path().join("out.mp4")))
            .expect("Failed to set fixture output");

        Self {
            muxer,
            _temp_dir: Some(temp_dir),
        }
    }

    /// Returns the fixture directory, if this session owns one.
    pub fn dir(&self) -> Option<&Path> {
        self._temp_dir.as_ref().map(TempDir::path)
    }
}

impl std::ops::Deref for TestSession {
    type Target = Muxer;

    fn deref(&self) -> &Self::Target {
        &self.muxer
    }
}

impl std::ops::DerefMut for TestSession {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.muxer
    }
}

/// Writes a small placeholder elementary stream file and returns its
/// path.
pub fn write_input(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    // Annex-B start code, enough for open-and-read checks.
    fs::write(&path, [0u8, 0, 0, 1]).expect("Failed to write fixture input");
    path
}

/// Runs a test with a buffered session fixture.
///
/// # Example
///
/// ```rust,ignore
/// use mp4mux_testkit::with_session;
///
/// #[test]
/// fn my_test() {
///     with_session(|muxer| {
///         muxer.set_output_format("frag-mp4").unwrap();
///     });
/// }
/// ```
pub fn with_session<F, R>(f: F) -> R
where
    F: FnOnce(&mut Muxer) -> R,
{
    let mut session = TestSession::buffered();
    f(&mut session.muxer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mp4mux_core::{NullEngine, ValidatingEngine};

    #[test]
    fn buffered_session_starts_with_null_engine() {
        let mut session = TestSession::buffered();
        let report = session.start(&mut NullEngine::new()).unwrap();
        assert_eq!(report.track_count, 1);
        assert_eq!(report.destination, "buffer");
    }

    #[test]
    fn file_session_starts_with_validating_engine() {
        let mut session = TestSession::with_files(2);
        assert!(session.dir().is_some());
        let report = session.start(&mut ValidatingEngine::new()).unwrap();
        assert_eq!(report.track_count, 2);
    }

    #[test]
    fn with_session_passes_the_muxer() {
        let streams = with_session(|muxer| muxer.streams().len());
        assert_eq!(streams, 1);
    }
}
