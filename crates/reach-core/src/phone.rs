//! Phone-number identity normalization.
//!
//! Directory phones and event phones are spelled inconsistently
//! (`+375 29 111-22-33`, `375291112233`, `(29)111-22-33`). Matching works on
//! canonical digit strings, tried with and without the national country-code
//! prefix.

use std::collections::HashMap;

use crate::types::UserProfile;

/// National country-code digits tried as an optional prefix during lookup.
const COUNTRY_PREFIX: &str = "375";

/// Canonicalizes a raw phone spelling to its digit string. Whitespace,
/// hyphens, parentheses and the leading `+` all disappear.
pub fn normalize(phone_raw: &str) -> String {
    phone_raw.chars().filter(char::is_ascii_digit).collect()
}

/// Canonical grouping key for client rollups: the normalized digits with the
/// country prefix applied when absent, so local and prefixed spellings of
/// one phone land in the same group.
pub fn canonical(phone_raw: &str) -> String {
    let normalized = normalize(phone_raw);
    if normalized.is_empty() || normalized.starts_with(COUNTRY_PREFIX) {
        normalized
    } else {
        format!("{COUNTRY_PREFIX}{normalized}")
    }
}

/// Returns the opposite-prefix spelling of a normalized phone: prefixed with
/// the country code when absent, stripped of it when present.
fn opposite_prefix(normalized: &str) -> String {
    normalized.strip_prefix(COUNTRY_PREFIX).map_or_else(
        || format!("{COUNTRY_PREFIX}{normalized}"),
        str::to_string,
    )
}

/// Directory lookup keyed by every normalized-phone variant.
///
/// Duplicate phones in the directory overwrite earlier entries (last write
/// wins, no merging).
#[derive(Debug, Default)]
pub struct PhoneIndex {
    profiles: HashMap<String, UserProfile>,
}

impl PhoneIndex {
    /// Indexes the directory under each profile's normalized phone and its
    /// opposite-prefix variant.
    pub fn build(profiles: &[UserProfile]) -> Self {
        let mut index = HashMap::new();
        for profile in profiles {
            let normalized = normalize(&profile.phone_raw);
            if normalized.is_empty() {
                continue;
            }
            index.insert(opposite_prefix(&normalized), profile.clone());
            index.insert(normalized, profile.clone());
        }
        tracing::debug!(keys = index.len(), "built phone index");
        Self { profiles: index }
    }

    /// Resolves a raw phone: exact normalized match first, then the
    /// opposite-prefix variant.
    pub fn resolve(&self, phone_raw: &str) -> Option<&UserProfile> {
        let normalized = normalize(phone_raw);
        if normalized.is_empty() {
            return None;
        }
        self.profiles
            .get(&normalized)
            .or_else(|| self.profiles.get(&opposite_prefix(&normalized)))
    }
}
