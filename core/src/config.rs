//! Parser configuration.
//!
//! [`ParserOptions`] is the partial, user-facing form: every field may be
//! left out, and the nested feature objects may be explicitly disabled with
//! `null`. [`ParserConfig`] is the fully resolved form the parser works with.
//! The two are connected by [`ParserConfig::resolve`](crate::ParserConfig::resolve)
//! and [`ParserOptions::merge`](crate::ParserOptions::merge) in the merge
//! module.
//!
//! Options can be read from YAML or JSON:
//!
//! ```
//! use command_args_core::{LongTextTag, NamedSyntax, ParserConfig, ParserOptions};
//!
//! let yaml = r#"
//! syntax:
//!   longTextTags: ['"', '`']
//!   namedOptions: ['--']
//! useNamedWithSingleValue: true
//! useRepliedUserAsAnOption:
//!   requirePing: true
//! "#;
//! let options = ParserOptions::from_yaml_str(yaml).unwrap();
//! let config = ParserConfig::default().resolve(&options);
//!
//! assert_eq!(config.syntax.long_text_tags, vec![LongTextTag::DoubleQuote, LongTextTag::Backtick]);
//! assert_eq!(config.syntax.named_options, vec![NamedSyntax::DoubleHyphen]);
//! assert!(config.use_named_with_single_value);
//! assert!(config.use_replied_user_as_an_option.unwrap().require_ping);
//! ```

use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Result;

/// Quote character that opens and closes a long text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LongTextTag {
    /// `"`
    #[serde(rename = "\"")]
    DoubleQuote,
    /// `'`
    #[serde(rename = "'")]
    SingleQuote,
    /// `` ` ``; three of them form a code block.
    #[serde(rename = "`")]
    Backtick,
}

impl LongTextTag {
    /// All tags in their canonical order.
    pub const ALL: [LongTextTag; 3] = [
        LongTextTag::DoubleQuote,
        LongTextTag::SingleQuote,
        LongTextTag::Backtick,
    ];

    /// Returns the quote character.
    pub fn as_char(self) -> char {
        match self {
            LongTextTag::DoubleQuote => '"',
            LongTextTag::SingleQuote => '\'',
            LongTextTag::Backtick => '`',
        }
    }

    /// Maps a character back to its tag.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '"' => Some(LongTextTag::DoubleQuote),
            '\'' => Some(LongTextTag::SingleQuote),
            '`' => Some(LongTextTag::Backtick),
            _ => None,
        }
    }
}

/// Marker syntax that introduces a named option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamedSyntax {
    /// `-name value`
    #[serde(rename = "-")]
    Hyphen,
    /// `--name value`
    #[serde(rename = "--")]
    DoubleHyphen,
    /// `name: value`
    #[serde(rename = ":")]
    Colon,
}

impl NamedSyntax {
    /// All named syntaxes in their canonical order.
    pub const ALL: [NamedSyntax; 3] = [
        NamedSyntax::Hyphen,
        NamedSyntax::DoubleHyphen,
        NamedSyntax::Colon,
    ];

    /// Returns `true` for the hyphen family (`-` and `--`).
    pub fn is_hyphen(self) -> bool {
        matches!(self, NamedSyntax::Hyphen | NamedSyntax::DoubleHyphen)
    }
}

/// Three-state field: absent, explicitly `null`, or a value.
///
/// Absent inherits from the configuration underneath; `null` disables the
/// feature regardless of what is underneath.
///
/// # Examples
///
/// ```
/// use command_args_core::{ChoicesOptions, Nullable, ParserOptions};
///
/// let opts: ParserOptions = serde_json::from_str(r#"{"resolveCommandOptionsChoices": null}"#).unwrap();
/// assert_eq!(opts.resolve_command_options_choices, Nullable::Null);
///
/// let opts: ParserOptions = serde_json::from_str("{}").unwrap();
/// assert_eq!(opts.resolve_command_options_choices, Nullable::Unset);
///
/// let opts: ParserOptions =
///     serde_json::from_str(r#"{"resolveCommandOptionsChoices": {"canUseDirectlyValue": false}}"#).unwrap();
/// assert_eq!(
///     opts.resolve_command_options_choices,
///     Nullable::Value(ChoicesOptions { can_use_directly_value: Some(false) }),
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Nullable<T> {
    /// Field not given.
    #[default]
    Unset,
    /// Field given as `null`.
    Null,
    /// Field given with a value.
    Value(T),
}

impl<T> Nullable<T> {
    /// Returns `true` if the field was not given.
    pub fn is_unset(&self) -> bool {
        matches!(self, Nullable::Unset)
    }

    /// Converts to an `Option`, treating `Unset` and `Null` alike.
    pub fn as_option(&self) -> Option<&T> {
        match self {
            Nullable::Value(value) => Some(value),
            Nullable::Unset | Nullable::Null => None,
        }
    }
}

impl<T> From<Option<T>> for Nullable<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Nullable::Value(value),
            None => Nullable::Null,
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Nullable<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        // A missing field never reaches this point; `#[serde(default)]` yields `Unset`.
        Ok(Option::<T>::deserialize(deserializer)?.into())
    }
}

impl<T: Serialize> Serialize for Nullable<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Nullable::Value(value) => serializer.serialize_some(value),
            Nullable::Unset | Nullable::Null => serializer.serialize_none(),
        }
    }
}

/// Partial syntax selection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyntaxOptions {
    /// Enabled quote characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_text_tags: Option<Vec<LongTextTag>>,
    /// Enabled named-option markers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub named_options: Option<Vec<NamedSyntax>>,
}

/// Partial form of [`LastOptionTags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastOptionTagsOptions {
    /// Keep triple-backtick code blocks working in the last option.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_code_blocks: Option<bool>,
}

/// `disableLongTextTagsInLastOption` accepts a plain boolean or an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LastOptionTagsSetting {
    /// `true` enables with defaults, `false` disables.
    Enabled(bool),
    /// Enabled with details.
    Detailed(LastOptionTagsOptions),
}

/// Partial form of [`ChoicesResolution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoicesOptions {
    /// Also accept a choice's value, not just its name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_use_directly_value: Option<bool>,
}

/// Partial form of [`RepliedUser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepliedUserOptions {
    /// Only use the replied-to author when the reply pings them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_ping: Option<bool>,
}

/// Partial parser configuration, as written by users.
///
/// Used both for the parser-wide global configuration and for per-command
/// overrides attached with
/// [`CommandSpec::with_parser_options`](crate::CommandSpec::with_parser_options).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParserOptions {
    /// Syntax selection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syntax: Option<SyntaxOptions>,
    /// Stop scanning once every option has a value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break_search_on_consume_all_options: Option<bool>,
    /// Lock the named syntax family to the first one used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_unique_named_syntax_at_same_time: Option<bool>,
    /// Treat quotes as plain text in the last positional option.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_long_text_tags_in_last_option: Option<LastOptionTagsSetting>,
    /// Resolve values against choice tables.
    #[serde(default, skip_serializing_if = "Nullable::is_unset")]
    pub resolve_command_options_choices: Nullable<ChoicesOptions>,
    /// Fill a leading user option from the replied-to message author.
    #[serde(default, skip_serializing_if = "Nullable::is_unset")]
    pub use_replied_user_as_an_option: Nullable<RepliedUserOptions>,
    /// Fill the first option with a code block's language tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_code_block_lang_as_an_option: Option<bool>,
    /// Named options take a single token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_named_with_single_value: Option<bool>,
    /// Emit a debug event with the parse result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_result: Option<bool>,
}

impl ParserOptions {
    /// Recommended override for commands that take source code.
    ///
    /// Stops scanning once all options are filled and leaves quotes in the
    /// last option alone, except for code blocks.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_args_core::{ParserConfig, ParserOptions};
    ///
    /// let config = ParserConfig::default().resolve(&ParserOptions::eval());
    /// assert!(config.break_search_on_consume_all_options);
    /// assert!(config.disable_long_text_tags_in_last_option.unwrap().exclude_code_blocks);
    /// ```
    pub fn eval() -> Self {
        Self {
            break_search_on_consume_all_options: Some(true),
            disable_long_text_tags_in_last_option: Some(LastOptionTagsSetting::Detailed(
                LastOptionTagsOptions {
                    exclude_code_blocks: Some(true),
                },
            )),
            ..Self::default()
        }
    }

    /// Loads options from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::ConfigError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::ConfigError::YamlError) if it does
    /// not describe parser options.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let options: Self = serde_yaml::from_reader(reader)?;
        Ok(options.normalized())
    }

    /// Parses options from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`YamlError`](crate::ConfigError::YamlError) on malformed input.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let options: Self = serde_yaml::from_str(yaml)?;
        Ok(options.normalized())
    }

    /// Parses options from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`JsonError`](crate::ConfigError::JsonError) on malformed input.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        Ok(options.normalized())
    }

    /// Drops duplicate entries from the syntax lists, keeping first
    /// occurrences in order.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_args_core::{NamedSyntax, ParserOptions, SyntaxOptions};
    ///
    /// let options = ParserOptions {
    ///     syntax: Some(SyntaxOptions {
    ///         long_text_tags: None,
    ///         named_options: Some(vec![NamedSyntax::Colon, NamedSyntax::Colon, NamedSyntax::Hyphen]),
    ///     }),
    ///     ..ParserOptions::default()
    /// }
    /// .normalized();
    ///
    /// let named = options.syntax.unwrap().named_options.unwrap();
    /// assert_eq!(named, vec![NamedSyntax::Colon, NamedSyntax::Hyphen]);
    /// ```
    pub fn normalized(mut self) -> Self {
        if let Some(syntax) = self.syntax.as_mut() {
            if let Some(tags) = syntax.long_text_tags.take() {
                syntax.long_text_tags = Some(dedup(tags));
            }
            if let Some(named) = syntax.named_options.take() {
                syntax.named_options = Some(dedup(named));
            }
        }
        self
    }
}

pub(crate) fn dedup<T: PartialEq>(items: Vec<T>) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

/// Resolved syntax selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Syntax {
    /// Enabled quote characters, without duplicates.
    pub long_text_tags: Vec<LongTextTag>,
    /// Enabled named-option markers, without duplicates.
    pub named_options: Vec<NamedSyntax>,
}

impl Default for Syntax {
    fn default() -> Self {
        Self {
            long_text_tags: LongTextTag::ALL.to_vec(),
            named_options: NamedSyntax::ALL.to_vec(),
        }
    }
}

impl Syntax {
    /// Returns `true` if the quote character is enabled.
    pub fn has_tag(&self, tag: LongTextTag) -> bool {
        self.long_text_tags.contains(&tag)
    }

    /// Returns `true` if `-` or `--` is enabled.
    pub fn has_hyphen_named(&self) -> bool {
        self.named_options.iter().any(|n| n.is_hyphen())
    }

    /// Returns `true` if `name:` is enabled.
    pub fn has_colon_named(&self) -> bool {
        self.named_options.contains(&NamedSyntax::Colon)
    }
}

/// Quotes are plain text in the last positional option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LastOptionTags {
    /// Triple-backtick code blocks still work.
    pub exclude_code_blocks: bool,
}

/// Values are matched against choice tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChoicesResolution {
    /// Accept a choice's value as well as its name.
    pub can_use_directly_value: bool,
}

impl Default for ChoicesResolution {
    fn default() -> Self {
        Self {
            can_use_directly_value: true,
        }
    }
}

/// A leading user option is filled from the replied-to author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RepliedUser {
    /// Only when the reply pings the author.
    pub require_ping: bool,
}

/// Fully resolved parser configuration.
///
/// A disabled feature is `None`; an enabled one carries its settings.
///
/// # Examples
///
/// ```
/// use command_args_core::{NamedSyntax, ParserConfig};
///
/// let config = ParserConfig::default();
/// assert_eq!(config.syntax.named_options, NamedSyntax::ALL.to_vec());
/// assert!(config.resolve_command_options_choices.unwrap().can_use_directly_value);
/// assert!(config.use_replied_user_as_an_option.is_none());
/// assert!(!config.log_result);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParserConfig {
    /// Syntax selection.
    pub syntax: Syntax,
    /// Stop scanning once every option has a value.
    pub break_search_on_consume_all_options: bool,
    /// Lock the named syntax family to the first one used.
    pub use_unique_named_syntax_at_same_time: bool,
    /// Quotes are plain text in the last positional option.
    pub disable_long_text_tags_in_last_option: Option<LastOptionTags>,
    /// Resolve values against choice tables.
    pub resolve_command_options_choices: Option<ChoicesResolution>,
    /// Fill a leading user option from the replied-to author.
    pub use_replied_user_as_an_option: Option<RepliedUser>,
    /// Fill the first option with a code block's language tag.
    pub use_code_block_lang_as_an_option: bool,
    /// Named options take a single token.
    pub use_named_with_single_value: bool,
    /// Emit a debug event with the parse result.
    pub log_result: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            syntax: Syntax::default(),
            break_search_on_consume_all_options: false,
            use_unique_named_syntax_at_same_time: false,
            disable_long_text_tags_in_last_option: None,
            resolve_command_options_choices: Some(ChoicesResolution::default()),
            use_replied_user_as_an_option: None,
            use_code_block_lang_as_an_option: false,
            use_named_with_single_value: false,
            log_result: false,
        }
    }
}

impl ParserConfig {
    /// Builds a configuration from options, applied over the defaults.
    pub fn from_options(options: &ParserOptions) -> Self {
        Self::default().resolve(options)
    }
}
