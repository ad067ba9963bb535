//! Durable association between an NFC tag and an employee.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A tag bound to an employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagBinding {
    /// Normalized tag identifier (lowercase hex, no separators).
    pub tag_uid: String,
    /// The employee the tag clocks.
    pub employee_id: String,
    /// When the binding was made.
    pub registered_at: NaiveDateTime,
}

/// Normalizes a tag identifier as read from a reader.
///
/// Readers report UIDs in different shapes (`04:A2:B9`, `04 a2 b9`, `04A2B9`);
/// bindings are keyed on the lowercase hex digits only.
///
/// # Examples
///
/// ```
/// use timeclock_engine::models::normalize_tag_uid;
///
/// assert_eq!(normalize_tag_uid("04:A2:B9:C1"), "04a2b9c1");
/// assert_eq!(normalize_tag_uid(" 04 a2 b9 c1\n"), "04a2b9c1");
/// ```
pub fn normalize_tag_uid(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != ':' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_separators() {
        assert_eq!(normalize_tag_uid("04-A2-B9"), "04a2b9");
        assert_eq!(normalize_tag_uid("deadbeef"), "deadbeef");
        assert_eq!(normalize_tag_uid("   "), "");
    }
}
