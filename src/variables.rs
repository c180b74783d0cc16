use crate::error::InterpolationError;
use indexmap::IndexMap;
use log::trace;
use std::fmt::Display;

/// Ordered `$name$` → value environment.
///
/// Every key is stored in its normalized `$name$` form; lookups normalize
/// the same way, so `foo`, `$foo` and `$foo$` all name the same variable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variables {
    entries: IndexMap<String, String>,
}

/// Wraps a bare name as `$name$`, tolerating names that already carry `$`.
pub fn normalize_key(name: &str) -> String {
    let bare = name.strip_prefix('$').unwrap_or(name);
    let bare = bare.strip_suffix('$').unwrap_or(bare);
    format!("${bare}$")
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an environment from name/value pairs; later duplicates win.
    pub fn of<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let entries = pairs
            .into_iter()
            .map(|(k, v)| (normalize_key(k.as_ref()), v.into()))
            .collect();
        Self { entries }
    }

    /// Normalizes raw keys and stringifies raw values; absent values become
    /// empty text.
    pub fn fix_up_keys<K, V>(raw: impl IntoIterator<Item = (K, Option<V>)>) -> Self
    where
        K: AsRef<str>,
        V: Display,
    {
        let entries = raw
            .into_iter()
            .map(|(k, v)| {
                let value = v.map(|v| v.to_string()).unwrap_or_default();
                (normalize_key(k.as_ref()), value)
            })
            .collect();
        Self { entries }
    }

    /// New environment with `other` laid over `self`. Overwritten entries
    /// keep their position; keys only in `other` are appended.
    pub fn merge_and_overwrite_by(&self, other: &Variables) -> Variables {
        let mut entries = self.entries.clone();
        for (key, value) in &other.entries {
            entries.insert(key.clone(), value.clone());
        }
        Variables { entries }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(&normalize_key(name)).map(String::as_str)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.contains_key(&normalize_key(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One left-to-right pass; at each position the first key (in insertion
    /// order) that matches is replaced.
    fn substitute_once(&self, text: &str) -> Option<String> {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        let mut replaced = false;

        while !rest.is_empty() {
            let hit = self.entries.iter().find(|(key, _)| rest.starts_with(key.as_str()));
            match hit {
                Some((key, value)) => {
                    out.push_str(value);
                    rest = &rest[key.len()..];
                    replaced = true;
                }
                None => {
                    let Some(c) = rest.chars().next() else { break };
                    out.push(c);
                    rest = &rest[c.len_utf8()..];
                }
            }
        }

        replaced.then_some(out)
    }

    /// Replaces every known key in `text` with its value, transitively.
    ///
    /// An acyclic environment settles within `len + 1` passes; anything
    /// still changing after that is reported as non-convergent.
    pub fn interpolate(&self, text: &str) -> Result<String, InterpolationError> {
        if self.entries.is_empty() {
            return Ok(text.to_string());
        }

        let passes = self.entries.len() + 1;
        let mut current = text.to_string();
        for pass in 0..passes {
            match self.substitute_once(&current) {
                Some(next) if next != current => {
                    trace!("interpolation pass {pass}: {current:?} -> {next:?}");
                    current = next;
                }
                _ => return Ok(current),
            }
        }

        if self.substitute_once(&current).is_some_and(|next| next != current) {
            return Err(InterpolationError::DidNotConverge { passes });
        }
        Ok(current)
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Variables {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Variables::of(iter)
    }
}
