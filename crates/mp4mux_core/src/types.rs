//! Core type definitions for the muxer control layer.

use crate::error::{MuxError, MuxResult};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// A four-character ISO base media file format brand code.
///
/// Brand codes are exactly four printable ASCII characters, e.g. `mp42`
/// or `dby1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(into = "String"))]
pub struct FourCc([u8; 4]);

impl FourCc {
    /// Creates a brand code from exactly four printable ASCII bytes.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the input is not exactly four
    /// printable ASCII characters.
    pub fn new(code: &str) -> MuxResult<Self> {
        let bytes = code.as_bytes();
        if bytes.len() != 4 {
            return Err(MuxError::invalid_argument(
                "brand",
                format!("expected 4 characters, got {}: {code:?}", bytes.len()),
            ));
        }
        if !bytes.iter().all(|b| (0x20..=0x7e).contains(b)) {
            return Err(MuxError::invalid_argument(
                "brand",
                format!("brand must be printable ASCII: {code:?}"),
            ));
        }
        Ok(Self([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        // Constructor admits printable ASCII only.
        std::str::from_utf8(&self.0).unwrap_or("????")
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FourCc {
    type Err = MuxError;

    fn from_str(s: &str) -> MuxResult<Self> {
        Self::new(s)
    }
}

impl From<FourCc> for String {
    fn from(code: FourCc) -> Self {
        code.as_str().to_string()
    }
}

/// A video frame rate as a rational number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Framerate {
    /// Frames per `denominator` seconds.
    pub numerator: u32,
    /// Time base divisor.
    pub denominator: u32,
}

impl Framerate {
    /// Creates a frame rate from a nonzero numerator and denominator.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if either part is zero.
    pub fn new(numerator: u32, denominator: u32) -> MuxResult<Self> {
        if numerator == 0 || denominator == 0 {
            return Err(MuxError::invalid_argument(
                "framerate",
                format!("numerator and denominator must be nonzero, got {numerator}/{denominator}"),
            ));
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }
}

impl fmt::Display for Framerate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl FromStr for Framerate {
    type Err = MuxError;

    /// Parses `24000/1001` or a decimal rate such as `23.97`.
    ///
    /// Decimal rates are scaled by 1000, so `23.97` becomes `23970/1000`.
    fn from_str(s: &str) -> MuxResult<Self> {
        if let Some((numerator, denominator)) = s.split_once('/') {
            let numerator = numerator.parse::<u32>().map_err(|e| {
                MuxError::invalid_argument("framerate", format!("bad numerator {numerator:?}: {e}"))
            })?;
            let denominator = denominator.parse::<u32>().map_err(|e| {
                MuxError::invalid_argument(
                    "framerate",
                    format!("bad denominator {denominator:?}: {e}"),
                )
            })?;
            Self::new(numerator, denominator)
        } else {
            let rate = s.parse::<f64>().map_err(|e| {
                MuxError::invalid_argument("framerate", format!("bad rate {s:?}: {e}"))
            })?;
            if !rate.is_finite() || rate <= 0.0 {
                return Err(MuxError::invalid_argument(
                    "framerate",
                    format!("rate must be positive, got {s:?}"),
                ));
            }
            Self::new((rate * 1000.0) as u32, 1000)
        }
    }
}

/// A validated Dolby Vision profile identifier.
///
/// Profiles 4, 5, 7, 8 and 9 can be multiplexed; profile 8 additionally
/// requires a base-layer compatible ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct DvProfile(u8);

impl DvProfile {
    /// Profile identifiers accepted by the muxer.
    pub const VALID: [u8; 5] = [4, 5, 7, 8, 9];

    /// Creates a profile from one of the supported identifiers.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for any identifier outside
    /// [`DvProfile::VALID`].
    pub fn new(id: u8) -> MuxResult<Self> {
        if Self::VALID.contains(&id) {
            Ok(Self(id))
        } else {
            Err(MuxError::invalid_argument(
                "dv_profile",
                format!("unsupported Dolby Vision profile {id}, expected one of {:?}", Self::VALID),
            ))
        }
    }

    /// Returns the raw profile identifier.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self.0
    }

    /// Returns true if this profile needs an explicit base-layer
    /// compatible ID.
    #[must_use]
    pub const fn requires_bl_compatible_id(self) -> bool {
        self.0 == 8
    }
}

impl fmt::Display for DvProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dv-profile:{}", self.0)
    }
}

/// Sample-entry box naming override for an HEVC elementary stream.
///
/// Without an override the engine writes `dvhe` (non-cross-compatible)
/// or `hev1` (cross-compatible) sample entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SampleEntryKind {
    /// Name the sample entry box `dvh1`.
    Dvh1,
    /// Name the sample entry box `hvc1`.
    Hvc1,
}

impl SampleEntryKind {
    /// Returns the box name this override selects.
    #[must_use]
    pub const fn box_name(self) -> &'static str {
        match self {
            Self::Dvh1 => "dvh1",
            Self::Hvc1 => "hvc1",
        }
    }
}

impl fmt::Display for SampleEntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.box_name())
    }
}

/// Output container layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum OutputFormat {
    /// Flat/progressive MP4: one trailing metadata block.
    #[default]
    Mp4,
    /// Fragmented MP4: metadata and media interleaved in fragments.
    FragMp4,
}

impl OutputFormat {
    /// Returns true for fragmented output.
    #[must_use]
    pub const fn is_fragmented(self) -> bool {
        matches!(self, Self::FragMp4)
    }

    /// Returns the format tag this layout is selected by.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::FragMp4 => "frag-mp4",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for OutputFormat {
    type Err = MuxError;

    fn from_str(s: &str) -> MuxResult<Self> {
        match s {
            "mp4" => Ok(Self::Mp4),
            "frag-mp4" => Ok(Self::FragMp4),
            other => Err(MuxError::invalid_argument(
                "output_format",
                format!("unknown format tag {other:?}, expected \"mp4\" or \"frag-mp4\""),
            )),
        }
    }
}

/// Destination for the produced container.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum OutputTarget {
    /// Write the container to a file.
    File(PathBuf),
    /// Hand the container back through an in-memory buffer.
    Buffer,
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "file:{}", path.display()),
            Self::Buffer => f.write_str("buffer"),
        }
    }
}
