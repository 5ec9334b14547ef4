//! Message-content argument parsing for chat commands.
//!
//! [`ArgsParser`] splits the text after a command name into the values of
//! the command's declared options. It understands:
//!
//! - positional words, filled in declaration order, with the last slot
//!   taking the rest of the text;
//! - quoted long text (`"..."`, `'...'`, `` `...` ``) and code blocks;
//! - named options (`--name value`, `-name value`, `name: value`);
//! - backslash escapes for every enabled delimiter;
//! - choice tables, resolved case-insensitively.
//!
//! The parser only produces strings. Type conversion and required-option
//! checks are left to the caller.
//!
//! # Example
//!
//! ```
//! use command_args_core::{CommandOption, CommandSpec};
//! use command_args_parser::ArgsParser;
//!
//! let command = CommandSpec::new("ban")
//!     .with_option(CommandOption::user("user").required())
//!     .with_option(CommandOption::string("reason"))
//!     .with_option(CommandOption::boolean("silent").as_flag());
//!
//! let parser = ArgsParser::default();
//! let args = parser.parse(r#"123 "being rude" --silent"#, &command);
//!
//! assert_eq!(args.get("user"), Some("123"));
//! assert_eq!(args.get("reason"), Some("being rude"));
//! assert_eq!(args.get("silent"), Some("true"));
//! ```

mod choices;
mod metadata;
mod regexes;
mod sweep;

use std::sync::Arc;

use command_args_core::{CommandSpec, MessageContext, ParsedArgs, ParserConfig, ParserOptions};

pub use metadata::{CommandMetadata, MetadataCache};

use crate::metadata::GlobalConfig;
use crate::sweep::Sweep;

/// Argument parser bound to one global configuration.
///
/// Cloning is cheap; clones share the configuration and the metadata cache.
#[derive(Debug, Clone)]
pub struct ArgsParser {
    global: Arc<GlobalConfig>,
    cache: Arc<MetadataCache>,
}

impl Default for ArgsParser {
    fn default() -> Self {
        Self::with_config(ParserConfig::default())
    }
}

impl ArgsParser {
    /// Creates a parser from partial options applied over the defaults.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_args_core::{CommandOption, CommandSpec, ParserOptions};
    /// use command_args_parser::ArgsParser;
    ///
    /// let parser = ArgsParser::new(&ParserOptions {
    ///     use_named_with_single_value: Some(true),
    ///     ..ParserOptions::default()
    /// });
    /// let command = CommandSpec::new("t")
    ///     .with_option(CommandOption::string("opt1"))
    ///     .with_option(CommandOption::string("opt2"));
    ///
    /// let args = parser.parse("--opt2 x a", &command);
    /// assert_eq!(args.get("opt1"), Some("a"));
    /// assert_eq!(args.get("opt2"), Some("x"));
    /// ```
    pub fn new(options: &ParserOptions) -> Self {
        Self::with_config(ParserConfig::from_options(options))
    }

    /// Creates a parser from a resolved configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self {
            global: Arc::new(GlobalConfig::new(config)),
            cache: Arc::new(MetadataCache::new()),
        }
    }

    /// Uses `cache` for command metadata, sharing it with other parsers.
    pub fn with_cache(mut self, cache: Arc<MetadataCache>) -> Self {
        self.cache = cache;
        self
    }

    /// The global configuration.
    pub fn config(&self) -> &ParserConfig {
        &self.global.config
    }

    /// The metadata cache.
    pub fn cache(&self) -> &Arc<MetadataCache> {
        &self.cache
    }

    /// Returns the cached metadata of `command`.
    pub fn metadata(&self, command: &CommandSpec) -> Arc<CommandMetadata> {
        self.cache.get_or_build(command)
    }

    /// Returns the configuration `command` is parsed with: the global one
    /// with the command's override applied.
    pub fn config_for(&self, command: &CommandSpec) -> Arc<ParserConfig> {
        self.metadata(command).config_for(&self.global).0
    }

    /// Parses `content` against the options of `command`.
    pub fn parse(&self, content: &str, command: &CommandSpec) -> ParsedArgs {
        self.parse_with(content, command, None)
    }

    /// Parses `content` sent in `message` and attaches the result to it.
    ///
    /// Reply data of the message is used when the configuration allows the
    /// replied-to author to fill a leading user option.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_args_core::{
    ///     CommandOption, CommandSpec, MessageContext, Nullable, ParserOptions, RepliedUserOptions,
    /// };
    /// use command_args_parser::ArgsParser;
    ///
    /// let parser = ArgsParser::new(&ParserOptions {
    ///     use_replied_user_as_an_option: Nullable::Value(RepliedUserOptions::default()),
    ///     ..ParserOptions::default()
    /// });
    /// let command = CommandSpec::new("warn")
    ///     .with_option(CommandOption::user("user"))
    ///     .with_option(CommandOption::string("reason"));
    ///
    /// let mut message = MessageContext::new("1").replying_to("2");
    /// let args = parser.parse_message("spam", &command, &mut message);
    ///
    /// assert_eq!(args.get("user"), Some("2"));
    /// assert_eq!(args.get("reason"), Some("spam"));
    /// assert_eq!(message.args_result(), Some(&args));
    /// ```
    pub fn parse_message(
        &self,
        content: &str,
        command: &CommandSpec,
        message: &mut MessageContext,
    ) -> ParsedArgs {
        let args = self.parse_with(content, command, Some(&*message));
        message.attach_args_result(args.clone());
        args
    }

    fn parse_with(
        &self,
        content: &str,
        command: &CommandSpec,
        message: Option<&MessageContext>,
    ) -> ParsedArgs {
        let metadata = self.metadata(command);
        let (config, regexes) = metadata.config_for(&self.global);
        Sweep::new(content, &metadata, &config, &regexes).run(message)
    }
}

#[cfg(test)]
mod tests {
    use command_args_core::{CommandOption, LastOptionTagsSetting};

    use super::*;

    #[test]
    fn test_command_override_is_applied() {
        let parser = ArgsParser::default();
        let command = CommandSpec::new("eval")
            .with_option(CommandOption::string("code"))
            .with_parser_options(ParserOptions::eval());

        let config = parser.config_for(&command);
        assert!(config.break_search_on_consume_all_options);
        assert!(!parser.config().break_search_on_consume_all_options);
    }

    #[test]
    fn test_override_can_disable_inherited_setting() {
        let parser = ArgsParser::new(&ParserOptions::eval());
        let command = CommandSpec::new("plain")
            .with_option(CommandOption::string("text"))
            .with_parser_options(ParserOptions {
                disable_long_text_tags_in_last_option: Some(LastOptionTagsSetting::Enabled(false)),
                ..ParserOptions::default()
            });

        let config = parser.config_for(&command);
        assert!(config.disable_long_text_tags_in_last_option.is_none());
        assert!(config.break_search_on_consume_all_options);
    }

    #[test]
    fn test_clones_share_cache() {
        let parser = ArgsParser::default();
        let clone = parser.clone();
        let command = CommandSpec::new("say").with_option(CommandOption::string("text"));

        parser.parse("hi", &command);
        assert_eq!(clone.cache().len(), 1);
    }

    #[test]
    fn test_command_without_parseable_options_yields_nothing() {
        let parser = ArgsParser::default();
        let command = CommandSpec::new("upload").with_option(CommandOption::attachment("file"));

        let args = parser.parse("some text", &command);
        assert!(args.is_empty());
        assert_eq!(args.content, "some text");
    }
}
