//! Parse results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Half-open byte range `[start, end)` into the parsed text.
pub type ArgPosition = (usize, usize);

/// Option values produced by one parse call.
///
/// Every key is a declared option name. Values are always strings; booleans
/// are the literals `"true"` and `"false"`. Converting values into typed data
/// and checking required options is up to the caller.
///
/// # Examples
///
/// ```
/// use command_args_core::ParsedArgs;
///
/// let mut args = ParsedArgs::new("hello world");
/// args.insert("first", "hello".into(), (0, 5));
///
/// assert_eq!(args.get("first"), Some("hello"));
/// assert_eq!(args.position("first"), Some((0, 5)));
/// assert_eq!(args.source_of("first"), Some("hello"));
/// assert!(args.get("second").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedArgs {
    /// The text that was parsed.
    pub content: String,
    /// Option name to value.
    pub values: HashMap<String, String>,
    /// Option name to the span the value was read from.
    pub positions: HashMap<String, ArgPosition>,
}

impl ParsedArgs {
    /// Creates an empty result for `content`.
    pub fn new(content: &str) -> Self {
        Self {
            content: content.to_string(),
            values: HashMap::new(),
            positions: HashMap::new(),
        }
    }

    /// Records a value and its source span.
    pub fn insert(&mut self, name: &str, value: String, position: ArgPosition) {
        self.values.insert(name.to_string(), value);
        self.positions.insert(name.to_string(), position);
    }

    /// Returns the value of an option.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Returns the source span of an option.
    pub fn position(&self, name: &str) -> Option<ArgPosition> {
        self.positions.get(name).copied()
    }

    /// Returns the raw slice of `content` an option was read from.
    pub fn source_of(&self, name: &str) -> Option<&str> {
        let (start, end) = self.position(name)?;
        self.content.get(start..end)
    }

    /// Returns `true` if no option received a value.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of options with a value.
    pub fn len(&self) -> usize {
        self.values.len()
    }
}
