//! Parsing of `--input-file` values.
//!
//! One value configures one elementary stream:
//!
//! ```text
//! <file>[,lang=<language>][,name=<name>][,ts=<timescale>][,fr=<framerate>]
//! ```
//!
//! Commas inside single or double quotes do not split, so track names
//! like `name="'Dub, Blu-ray'"` survive shell quoting.

use mp4mux_core::Framerate;
use std::path::PathBuf;

/// One parsed `--input-file` value.
#[derive(Debug, Clone, PartialEq)]
pub struct InputFileSpec {
    /// Input track file name.
    pub path: PathBuf,
    /// Media language, e.g. `rus`.
    pub language: Option<String>,
    /// Media name, e.g. `Dub, Blu-ray`.
    pub track_name: Option<String>,
    /// Media timescale.
    pub time_scale: Option<u32>,
    /// Frame rate, video streams only.
    pub framerate: Option<Framerate>,
}

/// Parses one `--input-file` value.
///
/// # Errors
///
/// Returns a message naming the offending segment for unknown keys,
/// malformed values, or a missing file segment.
pub fn parse_input_spec(value: &str) -> Result<InputFileSpec, String> {
    let mut segments = split_unquoted_commas(value).into_iter();

    let file = segments.next().filter(|s| !s.is_empty()).ok_or_else(|| {
        format!("missing file name in input spec {value:?}")
    })?;

    let mut spec = InputFileSpec {
        path: PathBuf::from(file),
        language: None,
        track_name: None,
        time_scale: None,
        framerate: None,
    };

    for segment in segments {
        let (key, raw) = segment
            .split_once('=')
            .ok_or_else(|| format!("expected key=value, got {segment:?}"))?;
        match key {
            "lang" => {
                if raw.len() != 3 {
                    return Err(format!(
                        "lang must be 3 characters long e.g. 'eng', got {raw:?}"
                    ));
                }
                spec.language = Some(raw.to_string());
            }
            "name" => {
                spec.track_name = Some(strip_quotes(raw).to_string());
            }
            "ts" => {
                let ts = raw
                    .parse::<u32>()
                    .map_err(|e| format!("bad timescale {raw:?}: {e}"))?;
                spec.time_scale = Some(ts);
            }
            "fr" => {
                let rate = raw
                    .parse::<Framerate>()
                    .map_err(|e| format!("bad framerate {raw:?}: {e}"))?;
                spec.framerate = Some(rate);
            }
            other => {
                return Err(format!(
                    "unknown input parameter {other:?}, expected lang, name, ts or fr"
                ));
            }
        }
    }

    Ok(spec)
}

/// Splits on commas that are outside single- or double-quoted runs.
fn split_unquoted_commas(value: &str) -> Vec<&str> {
    let mut in_single = false;
    let mut in_double = false;

    value
        .split(|c: char| {
            match c {
                '\'' if !in_double => in_single = !in_single,
                '"' if !in_single => in_double = !in_double,
                ',' => return !in_single && !in_double,
                _ => {}
            }
            false
        })
        .collect()
}

/// Strips matched outer quote pairs from a track name.
fn strip_quotes(value: &str) -> &str {
    let mut s = value.trim();

    while s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"'))
            || (s.starts_with('\'') && s.ends_with('\'')))
    {
        s = &s[1..s.len() - 1];
    }

    s
}
