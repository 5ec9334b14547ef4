//! Core types for message-command argument parsing.
//!
//! This crate defines the data model shared by the argument parser and its
//! callers:
//!
//! - [`CommandSpec`]: a command's ordered option slots plus an optional
//!   parser override.
//! - [`CommandOption`]: a slot with its type, flag marker, choice table and
//!   single-value override.
//! - [`ParserOptions`] / [`ParserConfig`]: partial and resolved parser
//!   configuration, loadable from YAML or JSON.
//! - [`MessageContext`]: reply and mention data of the invoking message.
//! - [`ParsedArgs`]: option values and their source spans.
//!
//! Validation ([`validate_command`], [`validate_commands`]) catches
//! declarations the parser cannot serve, such as option names no named
//! syntax can spell.
//!
//! Resolution ([`ParserConfig::resolve`]) layers a command override onto the
//! global configuration.
//!
//! # Example
//!
//! ```
//! use command_args_core::*;
//!
//! let command = CommandSpec::new("eval")
//!     .with_option(CommandOption::string("code").required())
//!     .with_option(CommandOption::boolean("async").as_flag())
//!     .with_parser_options(ParserOptions::eval());
//!
//! assert!(validate_command(&command).is_empty());
//!
//! let global = ParserConfig::default();
//! let config = global.resolve(command.parser_options().unwrap());
//! assert!(config.break_search_on_consume_all_options);
//! ```

mod args;
mod config;
mod error;
mod merge;
mod message;
mod types;
mod validate;

pub use args::{ArgPosition, ParsedArgs};
pub use config::{
    ChoicesOptions, ChoicesResolution, LastOptionTags, LastOptionTagsOptions,
    LastOptionTagsSetting, LongTextTag, NamedSyntax, Nullable, ParserConfig, ParserOptions,
    RepliedUser, RepliedUserOptions, Syntax, SyntaxOptions,
};
pub use error::{ConfigError, Result};
pub use message::MessageContext;
pub use types::*;
pub use validate::{ValidationError, validate_command, validate_commands};
