//! Command declaration types.
//!
//! This module defines the data model a command exposes to the argument
//! parser: the ordered list of option slots, their value types, choice tables
//! and flag markers. The types are designed for serialization with [`serde`]
//! so command declarations can be kept in JSON or YAML next to the bot code.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::ParserOptions;

static NEXT_COMMAND_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identifier of a command declaration.
///
/// Every [`CommandSpec`] receives a fresh id when it is created, and again
/// whenever its option list or parser override changes through a builder
/// method. Clones share the id of the declaration they were cloned from, so
/// the id can key caches of data derived from the declaration.
///
/// # Examples
///
/// ```
/// use command_args_core::{CommandOption, CommandSpec};
///
/// let a = CommandSpec::new("say");
/// let b = CommandSpec::new("say");
/// assert_ne!(a.id(), b.id());
///
/// let a2 = a.clone();
/// assert_eq!(a.id(), a2.id());
///
/// let a3 = a.with_option(CommandOption::string("text"));
/// assert_ne!(a2.id(), a3.id());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(u64);

impl CommandId {
    fn next() -> Self {
        Self(NEXT_COMMAND_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Declared value type of a command option.
///
/// The parser only produces strings; the type is used to decide whether an
/// option takes part in parsing at all, whether an empty named boolean means
/// `"true"`, and whether the replied-to user can fill the first slot.
///
/// # Examples
///
/// ```
/// use command_args_core::OptionType;
///
/// assert!(OptionType::String.is_parseable());
/// assert!(!OptionType::Attachment.is_parseable());
/// assert!(OptionType::Number.supports_choices());
/// assert!(!OptionType::Boolean.supports_choices());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OptionType {
    /// Free text (the default).
    #[default]
    String,
    /// Whole number.
    Integer,
    /// Floating point number.
    Number,
    /// `true` / `false`.
    Boolean,
    /// A user id or mention.
    User,
    /// A channel id or mention.
    Channel,
    /// A role id or mention.
    Role,
    /// A user or role.
    Mentionable,
    /// File upload; never read from message text.
    Attachment,
    /// Nested subcommand; resolved before argument parsing.
    Subcommand,
    /// Nested subcommand group; resolved before argument parsing.
    SubcommandGroup,
}

impl OptionType {
    /// Returns `true` if values of this type can be read from message text.
    pub fn is_parseable(self) -> bool {
        !matches!(
            self,
            OptionType::Attachment | OptionType::Subcommand | OptionType::SubcommandGroup
        )
    }

    /// Returns `true` if this type can declare a choice table.
    pub fn supports_choices(self) -> bool {
        matches!(
            self,
            OptionType::String | OptionType::Integer | OptionType::Number
        )
    }

    /// Returns `true` for subcommand-shaped types.
    pub fn is_subcommand(self) -> bool {
        matches!(self, OptionType::Subcommand | OptionType::SubcommandGroup)
    }
}

/// Canonical value of a choice.
///
/// Numeric values compare by their shortest decimal rendering, so `2.0`
/// matches the text `"2"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChoiceValue {
    /// Text value.
    Text(String),
    /// Numeric value (integer or number options).
    Number(f64),
}

impl std::fmt::Display for ChoiceValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChoiceValue::Text(text) => f.write_str(text),
            ChoiceValue::Number(number) => write!(f, "{number}"),
        }
    }
}

impl From<&str> for ChoiceValue {
    fn from(value: &str) -> Self {
        ChoiceValue::Text(value.to_string())
    }
}

impl From<String> for ChoiceValue {
    fn from(value: String) -> Self {
        ChoiceValue::Text(value)
    }
}

impl From<f64> for ChoiceValue {
    fn from(value: f64) -> Self {
        ChoiceValue::Number(value)
    }
}

impl From<i64> for ChoiceValue {
    fn from(value: i64) -> Self {
        ChoiceValue::Number(value as f64)
    }
}

/// One entry of a choice table: the name shown to users and its value.
///
/// # Examples
///
/// ```
/// use command_args_core::OptionChoice;
///
/// let choice = OptionChoice::new("Arlecchino", 5.5344342);
/// assert_eq!(choice.value.to_string(), "5.5344342");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionChoice {
    /// Display name; this is what the parser writes back on a match.
    pub name: String,
    /// Canonical value.
    pub value: ChoiceValue,
}

impl OptionChoice {
    /// Creates a choice from a name and anything convertible to a value.
    pub fn new(name: &str, value: impl Into<ChoiceValue>) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
        }
    }
}

/// Declaration of a single command option slot.
///
/// Options without the `flag` marker are positional: they are filled in
/// declaration order by plain words. Flag options can only be reached through
/// named syntax (`--name value`, `-name value`, `name: value`).
///
/// # Examples
///
/// ```
/// use command_args_core::{CommandOption, OptionType};
///
/// let text = CommandOption::string("text").required();
/// assert!(text.required);
/// assert!(!text.flag);
///
/// let verbose = CommandOption::boolean("verbose").as_flag();
/// assert_eq!(verbose.option_type, OptionType::Boolean);
/// assert!(verbose.flag);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandOption {
    /// Unique name within the command.
    pub name: String,
    /// Declared value type.
    #[serde(rename = "type", default)]
    pub option_type: OptionType,
    /// Short description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Is a value required? Checked by the caller, not by the parser.
    #[serde(default)]
    pub required: bool,
    /// Only reachable through named syntax.
    #[serde(default)]
    pub flag: bool,
    /// Restricted set of accepted values.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<OptionChoice>,
    /// Per-option override of the single-value named syntax toggle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single_value: Option<bool>,
}

impl CommandOption {
    /// Creates an optional, positional option of the given type.
    pub fn new(name: &str, option_type: OptionType) -> Self {
        Self {
            name: name.to_string(),
            option_type,
            description: None,
            required: false,
            flag: false,
            choices: Vec::new(),
            single_value: None,
        }
    }

    /// Creates a string option.
    pub fn string(name: &str) -> Self {
        Self::new(name, OptionType::String)
    }

    /// Creates an integer option.
    pub fn integer(name: &str) -> Self {
        Self::new(name, OptionType::Integer)
    }

    /// Creates a number option.
    pub fn number(name: &str) -> Self {
        Self::new(name, OptionType::Number)
    }

    /// Creates a boolean option.
    pub fn boolean(name: &str) -> Self {
        Self::new(name, OptionType::Boolean)
    }

    /// Creates a user option.
    pub fn user(name: &str) -> Self {
        Self::new(name, OptionType::User)
    }

    /// Creates an attachment option.
    pub fn attachment(name: &str) -> Self {
        Self::new(name, OptionType::Attachment)
    }

    /// Marks the option as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks the option as flag-only.
    pub fn as_flag(mut self) -> Self {
        self.flag = true;
        self
    }

    /// Adds a description.
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    /// Adds one choice to the choice table.
    pub fn with_choice(mut self, name: &str, value: impl Into<ChoiceValue>) -> Self {
        self.choices.push(OptionChoice::new(name, value));
        self
    }

    /// Overrides the single-value named syntax toggle for this option.
    pub fn with_single_value(mut self, enabled: bool) -> Self {
        self.single_value = Some(enabled);
        self
    }

    /// Returns `true` if named syntax for this option takes one token only.
    ///
    /// The per-option override wins over the configuration toggle.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_args_core::CommandOption;
    ///
    /// let plain = CommandOption::string("a");
    /// assert!(plain.takes_single_value(true));
    /// assert!(!plain.takes_single_value(false));
    ///
    /// let pinned = CommandOption::string("b").with_single_value(false);
    /// assert!(!pinned.takes_single_value(true));
    /// ```
    pub fn takes_single_value(&self, config_default: bool) -> bool {
        self.single_value.unwrap_or(config_default)
    }
}

/// Declaration of a command as seen by the argument parser.
///
/// # Examples
///
/// ```
/// use command_args_core::{CommandOption, CommandSpec, ParserOptions};
///
/// let eval = CommandSpec::new("eval")
///     .with_option(CommandOption::string("code").required())
///     .with_option(CommandOption::boolean("async").as_flag())
///     .with_parser_options(ParserOptions::eval());
///
/// assert_eq!(eval.name(), "eval");
/// assert_eq!(eval.options().len(), 2);
/// assert!(eval.find_option("async").is_some_and(|o| o.flag));
/// assert!(eval.parser_options().is_some());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandSpec {
    #[serde(skip, default = "CommandId::next")]
    id: CommandId,
    name: String,
    #[serde(default)]
    options: Vec<CommandOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parser: Option<ParserOptions>,
}

impl CommandSpec {
    /// Creates a command without options.
    pub fn new(name: &str) -> Self {
        Self {
            id: CommandId::next(),
            name: name.to_string(),
            options: Vec::new(),
            parser: None,
        }
    }

    /// Appends an option slot.
    pub fn with_option(mut self, option: CommandOption) -> Self {
        self.options.push(option);
        self.id = CommandId::next();
        self
    }

    /// Appends several option slots in order.
    pub fn with_options(mut self, options: impl IntoIterator<Item = CommandOption>) -> Self {
        self.options.extend(options);
        self.id = CommandId::next();
        self
    }

    /// Attaches a per-command parser configuration override.
    ///
    /// The override is normalized on the way in (duplicate syntax entries are
    /// dropped) and merged onto the parser's global configuration at parse
    /// time.
    pub fn with_parser_options(mut self, options: ParserOptions) -> Self {
        self.parser = Some(options.normalized());
        self.id = CommandId::next();
        self
    }

    /// Returns the identifier of this declaration.
    pub fn id(&self) -> CommandId {
        self.id
    }

    /// Returns the command name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared options in order.
    pub fn options(&self) -> &[CommandOption] {
        &self.options
    }

    /// Returns the per-command parser override, if any.
    pub fn parser_options(&self) -> Option<&ParserOptions> {
        self.parser.as_ref()
    }

    /// Finds an option by name.
    pub fn find_option(&self, name: &str) -> Option<&CommandOption> {
        self.options.iter().find(|o| o.name == name)
    }

    /// Returns `true` if the first option is subcommand-shaped.
    ///
    /// Such a declaration is a group that routes to subcommands and has no
    /// arguments of its own.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_args_core::{CommandOption, CommandSpec, OptionType};
    ///
    /// let group = CommandSpec::new("account")
    ///     .with_option(CommandOption::new("create", OptionType::Subcommand));
    /// assert!(group.is_parent());
    /// assert!(!CommandSpec::new("ping").is_parent());
    /// ```
    pub fn is_parent(&self) -> bool {
        self.options
            .first()
            .is_some_and(|o| o.option_type.is_subcommand())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_builders() {
        let option = CommandOption::string("choice")
            .required()
            .with_choice("Ganyu", "Ganyu Supremacy")
            .with_choice("Furina", "Furina");

        assert!(option.required);
        assert_eq!(option.choices.len(), 2);
        assert_eq!(option.choices[0].value.to_string(), "Ganyu Supremacy");
    }

    #[test]
    fn test_numeric_choice_display_matches_shortest_form() {
        assert_eq!(ChoiceValue::from(2_i64).to_string(), "2");
        assert_eq!(ChoiceValue::from(5.5344342).to_string(), "5.5344342");
    }

    #[test]
    fn test_command_spec_deserializes_with_fresh_id() {
        let yaml = r#"
name: ban
options:
  - name: user
    type: user
    required: true
  - name: reason
  - name: silent
    type: boolean
    flag: true
"#;
        let a: CommandSpec = serde_yaml::from_str(yaml).unwrap();
        let b: CommandSpec = serde_yaml::from_str(yaml).unwrap();

        assert_ne!(a.id(), b.id());
        assert_eq!(a.options().len(), 3);
        assert_eq!(a.options()[0].option_type, OptionType::User);
        assert_eq!(a.options()[1].option_type, OptionType::String);
        assert!(a.find_option("silent").unwrap().flag);
    }

    #[test]
    fn test_choice_table_deserializes_numbers_and_text() {
        let json = r#"{"name":"pick","type":"number","choices":[{"name":"Two","value":2},{"name":"Text","value":"t"}]}"#;
        let option: CommandOption = serde_json::from_str(json).unwrap();

        assert_eq!(option.choices[0].value, ChoiceValue::Number(2.0));
        assert_eq!(option.choices[1].value, ChoiceValue::Text("t".into()));
    }
}
