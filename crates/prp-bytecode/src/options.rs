use serde::Deserialize;

/// Decoding options.
///
/// Deserializable from a JSON document with camelCase keys; missing keys keep
/// their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ReaderOptions {
    /// Fail when the instruction stream has no `EndOfStream`.
    pub require_end_of_stream: bool,
    /// Ignore bytes after `EndOfStream` instead of failing.
    pub allow_trailing_bytes: bool,
    /// Upper bound on decoded instructions.
    pub max_instructions: Option<usize>,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            require_end_of_stream: true,
            allow_trailing_bytes: true,
            max_instructions: None,
        }
    }
}

impl ReaderOptions {
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
