use std::collections::BTreeMap;

/// Guards applied while normalizing a value graph.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct NormalizeConfig {
    /// Values nested deeper than this are replaced by a `depth_limit` marker.
    pub max_depth: Option<usize>,
    /// Replace back-references to an object already being expanded with a
    /// `circular` marker.
    pub detect_cycles: bool,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            detect_cycles: true,
        }
    }
}

impl NormalizeConfig {
    /// No depth limit and no cycle guard: self-referential graphs recurse
    /// until the stack is exhausted.
    pub fn unguarded() -> Self {
        Self {
            max_depth: None,
            detect_cycles: false,
        }
    }
}

/// Per-call options recognized by [`crate::DebugClient::send`].
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Context {
    pub(crate) language: Option<String>,
    pub(crate) label: Option<String>,
}

impl Context {
    pub const TYPE_KEY: &'static str = "type";
    pub const LABEL_KEY: &'static str = "label";

    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the payload language tag (the `type` option).
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn language_override(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn label_override(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

impl<K, V> FromIterator<(K, V)> for Context
where
    K: AsRef<str>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut context = Context::new();
        for (key, value) in iter {
            match key.as_ref() {
                Self::TYPE_KEY => context.language = Some(value.into()),
                Self::LABEL_KEY => context.label = Some(value.into()),
                _ => {}
            }
        }
        context
    }
}

impl From<BTreeMap<String, String>> for Context {
    fn from(map: BTreeMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}
