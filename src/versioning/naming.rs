//! Version file names: `<stem>_<YYYYMMDD_HHMMSS><ext>`, with a `_NNN`
//! counter when the same second is used twice.

use chrono::NaiveDateTime;

use crate::error::{Error, Result};

/// `strftime` pattern of the timestamp part.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Splits `filename` into stem and extension (the extension keeps its dot).
///
/// A leading dot is part of the stem, so `.env` has no extension.
pub fn split_filename(filename: &str) -> (&str, &str) {
    match filename.rfind('.') {
        Some(pos) if pos > 0 => filename.split_at(pos),
        _ => (filename, ""),
    }
}

/// Checks that `filename` is a plain file name usable as a storage key.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for empty names, path separators and
/// dot-only names.
pub fn validate_filename(filename: &str) -> Result<()> {
    if filename.trim().is_empty()
        || filename.contains('/')
        || filename.contains('\\')
        || filename.chars().all(|c| c == '.')
    {
        return Err(Error::invalid_input(format!(
            "invalid dataset filename '{filename}'"
        )));
    }
    Ok(())
}

/// The version name for `filename` at `at`, with `counter` appended when
/// non-zero.
pub fn version_name(filename: &str, at: NaiveDateTime, counter: u32) -> String {
    let (stem, ext) = split_filename(filename);
    let stamp = at.format(TIMESTAMP_FORMAT);
    if counter == 0 {
        format!("{stem}_{stamp}{ext}")
    } else {
        format!("{stem}_{stamp}_{counter:03}{ext}")
    }
}

/// Largest same-second counter. Three digits keep names in commit order.
pub const MAX_COUNTER: u32 = 999;

/// First version name for `filename` at `at` that `taken` rejects.
///
/// # Errors
///
/// Returns a storage error once all [`MAX_COUNTER`] names of that second
/// are taken.
pub fn unique_version_name(
    filename: &str,
    at: NaiveDateTime,
    mut taken: impl FnMut(&str) -> Result<bool>,
) -> Result<String> {
    for counter in 0..=MAX_COUNTER {
        let name = version_name(filename, at, counter);
        if !taken(&name)? {
            return Ok(name);
        }
    }
    Err(Error::storage(format!(
        "too many versions of '{filename}' within one second"
    )))
}
