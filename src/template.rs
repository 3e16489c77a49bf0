use std::sync::LazyLock;

use regex::{Captures, Regex};

static INTERPOLATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(.*?)\}\}").expect("interpolation pattern is valid"));

/// A static template with `{{ name }}` interpolation markers.
///
/// The text is captured once; every render substitutes the markers anew.
/// Markers do not span lines and whitespace around the name is ignored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    source: String,
}

impl Template {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Names referenced by the template, in order of appearance, repeats
    /// included.
    pub fn bindings(&self) -> Vec<&str> {
        INTERPOLATION
            .captures_iter(&self.source)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
            .collect()
    }

    /// Replaces each marker with what `resolve` returns for its name.
    pub fn render(&self, mut resolve: impl FnMut(&str) -> String) -> String {
        INTERPOLATION
            .replace_all(&self.source, |caps: &Captures<'_>| resolve(caps[1].trim()))
            .into_owned()
    }
}
