//! Environment snapshot
//!
//! The process environment is captured once at startup so that every
//! configuration step reads the same values. Tests build snapshots from
//! literal pairs instead of mutating the real environment.

use std::collections::BTreeMap;

/// Immutable copy of environment-style key/value input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Capture the current process environment.
    ///
    /// Loads a `.env` file first if one is present (development).
    /// Variables that are not valid UTF-8 are skipped.
    pub fn from_process() -> Self {
        dotenvy::dotenv().ok();
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }

    /// Raw value for `key`, trimmed. Blank values count as unset.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// First non-blank value among `keys`, in order.
    pub fn first_of(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|key| self.get(key))
    }

    /// Boolean-like value for `key`.
    ///
    /// Unset or unrecognised values yield `None`.
    pub fn flag(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(parse_flag)
    }

    /// Iterate over all captured variables.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for EnvSnapshot
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_are_unset() {
        let env: EnvSnapshot = [("A", "  "), ("B", " value ")].into_iter().collect();
        assert_eq!(env.get("A"), None);
        assert_eq!(env.get("B"), Some("value"));
        assert_eq!(env.get("C"), None);
    }

    #[test]
    fn first_of_respects_key_order() {
        let env: EnvSnapshot = [("SECOND", "2"), ("THIRD", "3")].into_iter().collect();
        assert_eq!(env.first_of(&["FIRST", "SECOND", "THIRD"]), Some("2"));
        assert_eq!(env.first_of(&["MISSING"]), None);
    }

    #[test]
    fn flags_accept_common_spellings() {
        let env: EnvSnapshot = [
            ("T1", "TRUE"),
            ("T2", "yes"),
            ("F1", "0"),
            ("F2", "Off"),
            ("X", "maybe"),
        ]
        .into_iter()
        .collect();

        assert_eq!(env.flag("T1"), Some(true));
        assert_eq!(env.flag("T2"), Some(true));
        assert_eq!(env.flag("F1"), Some(false));
        assert_eq!(env.flag("F2"), Some(false));
        assert_eq!(env.flag("X"), None);
        assert_eq!(env.flag("UNSET"), None);
    }
}
