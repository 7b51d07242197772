//! Parameter normalization.
//!
//! Every inbound parameter passes through one of these helpers before it
//! is committed to the configuration store. The policy for optional text:
//! an absent value is stored as absent, a present-but-empty string is a
//! caller error and is rejected, leaving the stored value untouched.

use crate::error::{MuxError, MuxResult};

/// Canonicalizes an optional text parameter.
///
/// # Errors
///
/// Returns `InvalidArgument` if the value is present but empty.
pub fn opt_text(field: &'static str, value: Option<&str>) -> MuxResult<Option<String>> {
    match value {
        None => Ok(None),
        Some("") => Err(MuxError::invalid_argument(
            field,
            "must not be empty; omit the parameter to leave it unset",
        )),
        Some(text) => Ok(Some(text.to_string())),
    }
}

/// Validates a required text parameter.
///
/// # Errors
///
/// Returns `InvalidArgument` if the value is empty.
pub fn required_text(field: &'static str, value: &str) -> MuxResult<String> {
    if value.is_empty() {
        return Err(MuxError::invalid_argument(field, "must not be empty"));
    }
    Ok(value.to_string())
}

/// Validates a numeric parameter where zero has no meaning.
///
/// # Errors
///
/// Returns `InvalidArgument` if the value is zero.
pub fn nonzero(field: &'static str, value: u32) -> MuxResult<u32> {
    if value == 0 {
        return Err(MuxError::invalid_argument(field, "must be nonzero"));
    }
    Ok(value)
}

/// Bounds-checks an elementary stream slot.
///
/// # Errors
///
/// Returns `StreamIndexOutOfBounds` if `index` does not address a
/// configured stream.
pub fn stream_index(index: usize, stream_count: usize) -> MuxResult<usize> {
    if index >= stream_count {
        return Err(MuxError::StreamIndexOutOfBounds {
            index,
            count: stream_count,
        });
    }
    Ok(index)
}

/// Validates a Dolby Vision base-layer compatible ID.
///
/// # Errors
///
/// Returns `InvalidArgument` for IDs outside {1, 2, 4}.
pub fn dv_bl_compatible_id(value: u8) -> MuxResult<u8> {
    const VALID: [u8; 3] = [1, 2, 4];
    if VALID.contains(&value) {
        Ok(value)
    } else {
        Err(MuxError::invalid_argument(
            "dv_bl_compatible_id",
            format!("unsupported compatible ID {value}, expected one of {VALID:?}"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_text_stays_absent() {
        assert_eq!(opt_text("lang", None).unwrap(), None);
    }

    #[test]
    fn empty_text_is_rejected() {
        let err = opt_text("lang", Some("")).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn present_text_is_stored_verbatim() {
        assert_eq!(
            opt_text("name", Some("Dub, Blu-ray")).unwrap(),
            Some("Dub, Blu-ray".to_string())
        );
    }

    #[test]
    fn required_text_rejects_empty() {
        assert!(required_text("file", "").is_err());
        assert_eq!(required_text("file", "a.h265").unwrap(), "a.h265");
    }

    #[test]
    fn nonzero_rejects_zero() {
        assert!(nonzero("moov_timescale", 0).is_err());
        assert_eq!(nonzero("moov_timescale", 600).unwrap(), 600);
    }

    #[test]
    fn stream_index_bounds() {
        assert_eq!(stream_index(0, 2).unwrap(), 0);
        assert_eq!(stream_index(1, 2).unwrap(), 1);
        let err = stream_index(2, 2).unwrap_err();
        assert!(matches!(
            err,
            MuxError::StreamIndexOutOfBounds { index: 2, count: 2 }
        ));
    }

    #[test]
    fn bl_compatible_id_membership() {
        for id in [1, 2, 4] {
            assert_eq!(dv_bl_compatible_id(id).unwrap(), id);
        }
        assert!(dv_bl_compatible_id(0).is_err());
        assert!(dv_bl_compatible_id(3).is_err());
    }
}
