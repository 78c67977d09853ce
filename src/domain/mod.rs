pub mod college;
pub mod dates;
pub mod enums;
pub mod lead;
pub mod pipeline;
pub mod records;
pub mod user;

use crate::errors::ServerError;

pub(crate) fn require_text(field: &str, value: &str) -> Result<(), ServerError> {
    if value.trim().is_empty() {
        return Err(ServerError::BadRequest(format!("{field} is required")));
    }
    Ok(())
}

/// True when an update supplies a value different from the stored one.
pub(crate) fn differs<T: PartialEq + ?Sized>(new: Option<&T>, old: Option<&T>) -> bool {
    new.is_some() && new != old
}

/// Like [`differs`] for required text, ignoring surrounding whitespace.
pub(crate) fn text_differs(new: Option<&str>, old: &str) -> bool {
    differs(new.map(str::trim), Some(old))
}

/// True when a partial text update would change the stored optional value.
pub(crate) fn optional_differs(new: Option<&str>, old: Option<&str>) -> bool {
    merge_text(new, old).as_deref() != old
}

/// Resolves a partial text update: absent keeps `old`, blank clears it.
pub(crate) fn merge_text(new: Option<&str>, old: Option<&str>) -> Option<String> {
    match new {
        Some(value) => clean(Some(value)),
        None => old.map(str::to_string),
    }
}

/// Trims optional text input, mapping blank to `None`.
pub(crate) fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
