//! Command declaration validation.
//!
//! Catches declarations the argument parser cannot serve well: option names
//! that no named syntax can spell, duplicate options, and choice tables that
//! do not fit the option type. The parser itself never rejects a declaration,
//! so validation is meant to run once at registration time.
//!
//! # Examples
//!
//! ```
//! use command_args_core::*;
//!
//! let ok = CommandSpec::new("say").with_option(CommandOption::string("text"));
//! assert!(validate_command(&ok).is_empty());
//!
//! let bad = CommandSpec::new("say").with_option(CommandOption::string("two words"));
//! assert!(!validate_command(&bad).is_empty());
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::{ChoiceValue, CommandOption, CommandSpec, OptionType};

/// Command declaration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Command name is empty or whitespace-only.
    #[error("command name cannot be empty")]
    EmptyCommandName,
    /// Two commands in the same set share a name.
    #[error("duplicate command: {0}")]
    DuplicateCommand(String),
    /// Option name is empty.
    #[error("option name cannot be empty")]
    EmptyOptionName,
    /// Option name is not made of ASCII letters, digits and underscores.
    #[error("invalid option name: {0:?}")]
    InvalidOptionName(String),
    /// Two options of one command share a name.
    #[error("duplicate option: {0}")]
    DuplicateOption(String),
    /// Flag marker on an option type that is never read from text.
    #[error("option {0} cannot be a flag")]
    FlagNotParseable(String),
    /// Choices declared on an option type that cannot have them.
    #[error("option {0} cannot declare choices")]
    ChoicesNotSupported(String),
    /// A choice value does not match the option type.
    #[error("choice {choice} of option {option} has a mismatched value type")]
    ChoiceTypeMismatch {
        /// Option name.
        option: String,
        /// Choice name.
        choice: String,
    },
    /// Two choices of one option share a name, ignoring case.
    #[error("duplicate choice {choice} in option {option}")]
    DuplicateChoice {
        /// Option name.
        option: String,
        /// Choice name.
        choice: String,
    },
}

/// Validates a set of commands.
///
/// Stops at the first duplicate name, otherwise validates each command.
///
/// # Examples
///
/// ```
/// use command_args_core::*;
///
/// let commands = vec![CommandSpec::new("ping"), CommandSpec::new("ping")];
/// assert_eq!(
///     validate_commands(&commands),
///     vec![ValidationError::DuplicateCommand("ping".into())],
/// );
/// ```
pub fn validate_commands(commands: &[CommandSpec]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for command in commands {
        let name = command.name();
        if !seen.insert(name) {
            errors.push(ValidationError::DuplicateCommand(name.to_string()));
            return errors;
        }
        errors.extend(validate_command(command));
        if !errors.is_empty() {
            return errors;
        }
    }

    errors
}

/// Validates a single command declaration.
///
/// # Examples
///
/// ```
/// use command_args_core::*;
///
/// let command = CommandSpec::new("pick")
///     .with_option(CommandOption::boolean("yes").with_choice("Yes", "y"));
/// assert_eq!(
///     validate_command(&command),
///     vec![ValidationError::ChoicesNotSupported("yes".into())],
/// );
/// ```
pub fn validate_command(command: &CommandSpec) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if command.name().trim().is_empty() {
        errors.push(ValidationError::EmptyCommandName);
        return errors;
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for option in command.options() {
        if option.name.trim().is_empty() {
            errors.push(ValidationError::EmptyOptionName);
            return errors;
        }
        if !is_valid_option_name(&option.name) {
            errors.push(ValidationError::InvalidOptionName(option.name.clone()));
            return errors;
        }
        if !seen.insert(option.name.as_str()) {
            errors.push(ValidationError::DuplicateOption(option.name.clone()));
            return errors;
        }
        if option.flag && !option.option_type.is_parseable() {
            errors.push(ValidationError::FlagNotParseable(option.name.clone()));
            return errors;
        }
        errors.extend(validate_choices(option));
        if !errors.is_empty() {
            return errors;
        }
    }

    errors
}

fn is_valid_option_name(name: &str) -> bool {
    name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn validate_choices(option: &CommandOption) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if option.choices.is_empty() {
        return errors;
    }

    if !option.option_type.supports_choices() {
        errors.push(ValidationError::ChoicesNotSupported(option.name.clone()));
        return errors;
    }

    let mut seen = HashSet::new();
    for choice in &option.choices {
        let matches_type = match (&choice.value, option.option_type) {
            (ChoiceValue::Text(_), OptionType::String) => true,
            (ChoiceValue::Number(_), OptionType::Number) => true,
            (ChoiceValue::Number(n), OptionType::Integer) => n.fract() == 0.0,
            _ => false,
        };
        if !matches_type {
            errors.push(ValidationError::ChoiceTypeMismatch {
                option: option.name.clone(),
                choice: choice.name.clone(),
            });
            return errors;
        }
        if !seen.insert(choice.name.to_lowercase()) {
            errors.push(ValidationError::DuplicateChoice {
                option: option.name.clone(),
                choice: choice.name.clone(),
            });
            return errors;
        }
    }

    errors
}
