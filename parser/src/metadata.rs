//! Per-command metadata and its cache.
//!
//! Metadata is derived once per [`CommandSpec`] and shared afterwards. The
//! command's resolved configuration is kept next to it and rebuilt only when
//! the parser-wide configuration it was resolved against changes.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use command_args_core::{CommandId, CommandOption, CommandSpec, ParserConfig, ParserOptions};
use parking_lot::{Mutex, RwLock};
use tracing::trace;

use crate::regexes::SyntaxRegexes;

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// A parser-wide configuration with its compiled patterns.
///
/// Each instance gets a unique generation number; per-command configuration
/// resolved against one generation is reused only for that generation.
#[derive(Debug)]
pub(crate) struct GlobalConfig {
    pub(crate) generation: u64,
    pub(crate) config: Arc<ParserConfig>,
    pub(crate) regexes: Arc<SyntaxRegexes>,
}

impl GlobalConfig {
    pub(crate) fn new(config: ParserConfig) -> Self {
        let regexes = SyntaxRegexes::build(&config);
        Self {
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
            config: Arc::new(config),
            regexes: Arc::new(regexes),
        }
    }
}

#[derive(Debug, Clone)]
struct Resolved {
    generation: u64,
    config: Arc<ParserConfig>,
    regexes: Arc<SyntaxRegexes>,
}

/// Choice table of one option, indexed by lowercased name and value.
#[derive(Debug, Clone)]
pub(crate) struct OptionChoices {
    pub(crate) option: String,
    names: Vec<String>,
    by_name: HashMap<String, usize>,
    by_value: HashMap<String, usize>,
}

impl OptionChoices {
    /// Builds the index from `(name, value)` pairs. The first declaration
    /// of a duplicated key wins.
    pub(crate) fn new<I, N, V>(option: impl Into<String>, choices: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: AsRef<str>,
    {
        let mut names = Vec::new();
        let mut by_name = HashMap::new();
        let mut by_value = HashMap::new();

        for (index, (name, value)) in choices.into_iter().enumerate() {
            let name = name.into();
            by_name.entry(name.to_lowercase()).or_insert(index);
            by_value.entry(value.as_ref().to_lowercase()).or_insert(index);
            names.push(name);
        }

        Self {
            option: option.into(),
            names,
            by_name,
            by_value,
        }
    }

    /// Display name for an already lowercased input.
    pub(crate) fn find(&self, lowered: &str, use_values: bool) -> Option<&str> {
        let index = self.by_name.get(lowered).or_else(|| {
            if use_values {
                self.by_value.get(lowered)
            } else {
                None
            }
        })?;
        self.names.get(*index).map(String::as_str)
    }
}

/// What the parser needs to know about a command.
///
/// # Examples
///
/// ```
/// use command_args_core::{CommandOption, CommandSpec};
/// use command_args_parser::ArgsParser;
///
/// let command = CommandSpec::new("upload")
///     .with_option(CommandOption::attachment("file"))
///     .with_option(CommandOption::string("title"))
///     .with_option(CommandOption::boolean("public").as_flag());
///
/// let metadata = ArgsParser::default().metadata(&command);
/// assert_eq!(metadata.positional_names().collect::<Vec<_>>(), vec!["title"]);
/// assert_eq!(metadata.flag_names().collect::<Vec<_>>(), vec!["public"]);
/// assert_eq!(metadata.option_count(), 2);
/// ```
#[derive(Debug)]
pub struct CommandMetadata {
    name: String,
    positional: Vec<CommandOption>,
    flags: Vec<CommandOption>,
    options: HashMap<String, CommandOption>,
    choices: Vec<OptionChoices>,
    base_config: Option<ParserOptions>,
    resolved: Mutex<Option<Resolved>>,
}

impl CommandMetadata {
    /// Derives metadata from a command declaration.
    ///
    /// Attachment and subcommand-shaped options are left out entirely.
    pub fn from_command(command: &CommandSpec) -> Self {
        let mut positional = Vec::new();
        let mut flags = Vec::new();
        let mut options = HashMap::new();
        let mut choices = Vec::new();

        for option in command.options() {
            if !option.option_type.is_parseable() {
                continue;
            }

            if option.flag {
                flags.push(option.clone());
            } else {
                positional.push(option.clone());
            }
            options.insert(option.name.clone(), option.clone());

            if option.choices.is_empty() {
                continue;
            }
            choices.push(OptionChoices::new(
                option.name.clone(),
                option
                    .choices
                    .iter()
                    .map(|choice| (choice.name.clone(), choice.value.to_string())),
            ));
        }

        trace!(
            command = %command.name(),
            positional = positional.len(),
            flags = flags.len(),
            "Built command metadata"
        );

        Self {
            name: command.name().to_string(),
            positional,
            flags,
            options,
            choices,
            base_config: command.parser_options().cloned(),
            resolved: Mutex::new(None),
        }
    }

    /// Command name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Positional slot names in declaration order.
    pub fn positional_names(&self) -> impl Iterator<Item = &str> {
        self.positional.iter().map(|o| o.name.as_str())
    }

    /// Flag-only option names in declaration order.
    pub fn flag_names(&self) -> impl Iterator<Item = &str> {
        self.flags.iter().map(|o| o.name.as_str())
    }

    /// Number of options the parser can fill.
    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    /// Returns `true` if any option declares choices.
    pub fn has_choices(&self) -> bool {
        !self.choices.is_empty()
    }

    pub(crate) fn positional(&self) -> &[CommandOption] {
        &self.positional
    }

    pub(crate) fn option(&self, name: &str) -> Option<&CommandOption> {
        self.options.get(name)
    }

    pub(crate) fn positional_index(&self, name: &str) -> Option<usize> {
        self.positional.iter().position(|o| o.name == name)
    }

    pub(crate) fn choices(&self) -> &[OptionChoices] {
        &self.choices
    }

    /// Returns the configuration and patterns to parse this command with.
    ///
    /// Commands without an override use the global ones as they are.
    pub(crate) fn config_for(
        &self,
        global: &GlobalConfig,
    ) -> (Arc<ParserConfig>, Arc<SyntaxRegexes>) {
        let Some(base) = &self.base_config else {
            return (global.config.clone(), global.regexes.clone());
        };

        let mut resolved = self.resolved.lock();
        if let Some(cached) = resolved.as_ref().filter(|r| r.generation == global.generation) {
            return (cached.config.clone(), cached.regexes.clone());
        }

        let config = global.config.resolve(base);
        let regexes = if config.syntax == global.config.syntax {
            global.regexes.clone()
        } else {
            Arc::new(SyntaxRegexes::build(&config))
        };
        trace!(
            command = %self.name,
            generation = global.generation,
            "Resolved command parser configuration"
        );

        let entry = Resolved {
            generation: global.generation,
            config: Arc::new(config),
            regexes,
        };
        let out = (entry.config.clone(), entry.regexes.clone());
        *resolved = Some(entry);
        out
    }
}

/// Shared table of command metadata, keyed by [`CommandId`].
///
/// Safe to share between parsers and threads. Building metadata twice for
/// the same command yields equal results, so a lost race only costs time.
///
/// Builder calls give a command a fresh [`CommandId`]. Caching a new id
/// evicts entries for other ids that carry the same command name, so a
/// command rebuilt at runtime replaces its old entry. Distinct commands
/// sharing one name still work but keep evicting each other.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use command_args_core::{CommandOption, CommandSpec, ParserOptions};
/// use command_args_parser::{ArgsParser, MetadataCache};
///
/// let cache = Arc::new(MetadataCache::new());
/// let a = ArgsParser::default().with_cache(cache.clone());
/// let b = ArgsParser::new(&ParserOptions::eval()).with_cache(cache.clone());
///
/// let command = CommandSpec::new("say").with_option(CommandOption::string("text"));
/// a.parse("hi", &command);
/// b.parse("hi", &command);
/// assert_eq!(cache.len(), 1);
///
/// assert!(cache.invalidate(command.id()));
/// assert!(cache.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct MetadataCache {
    entries: RwLock<HashMap<CommandId, Arc<CommandMetadata>>>,
}

impl MetadataCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the metadata of `command`, building it on first use.
    pub fn get_or_build(&self, command: &CommandSpec) -> Arc<CommandMetadata> {
        if let Some(metadata) = self.entries.read().get(&command.id()) {
            return metadata.clone();
        }

        let metadata = Arc::new(CommandMetadata::from_command(command));
        let id = command.id();

        let mut entries = self.entries.write();
        if let Some(cached) = entries.get(&id) {
            return cached.clone();
        }

        let before = entries.len();
        entries.retain(|_, cached| cached.name() != command.name());
        if entries.len() < before {
            trace!(command = %command.name(), "Evicted stale command metadata");
        }
        entries.insert(id, metadata.clone());
        metadata
    }

    /// Drops the metadata of one command. Returns `true` if it was cached.
    pub fn invalidate(&self, id: CommandId) -> bool {
        self.entries.write().remove(&id).is_some()
    }

    /// Drops all cached metadata.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Number of cached commands.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use command_args_core::{OptionType, SyntaxOptions};

    use super::*;

    fn sample_command() -> CommandSpec {
        CommandSpec::new("sample")
            .with_option(CommandOption::new("sub", OptionType::Subcommand))
            .with_option(CommandOption::string("first").with_choice("Ganyu", "Ganyu Supremacy"))
            .with_option(CommandOption::number("second").with_choice("Arlecchino", 5.5344342))
            .with_option(CommandOption::boolean("verbose").as_flag())
    }

    #[test]
    fn test_metadata_splits_positional_and_flags() {
        let metadata = CommandMetadata::from_command(&sample_command());

        assert_eq!(
            metadata.positional_names().collect::<Vec<_>>(),
            vec!["first", "second"]
        );
        assert_eq!(metadata.flag_names().collect::<Vec<_>>(), vec!["verbose"]);
        assert!(metadata.option("sub").is_none());
        assert_eq!(metadata.positional_index("second"), Some(1));
        assert_eq!(metadata.positional_index("verbose"), None);
    }

    #[test]
    fn test_metadata_lowercases_choices() {
        let metadata = CommandMetadata::from_command(&sample_command());
        let choices = metadata.choices();

        assert_eq!(choices.len(), 2);
        assert_eq!(choices[0].find("ganyu", false), Some("Ganyu"));
        assert_eq!(choices[0].find("ganyu supremacy", false), None);
        assert_eq!(choices[0].find("ganyu supremacy", true), Some("Ganyu"));
        assert_eq!(choices[1].find("5.5344342", true), Some("Arlecchino"));
    }

    #[test]
    fn test_config_without_override_is_global() {
        let global = GlobalConfig::new(ParserConfig::default());
        let metadata = CommandMetadata::from_command(&sample_command());

        let (config, regexes) = metadata.config_for(&global);
        assert!(Arc::ptr_eq(&config, &global.config));
        assert!(Arc::ptr_eq(&regexes, &global.regexes));
    }

    #[test]
    fn test_config_is_rebuilt_for_new_generation() {
        let command = sample_command().with_parser_options(ParserOptions {
            syntax: Some(SyntaxOptions {
                long_text_tags: Some(vec![]),
                named_options: None,
            }),
            ..ParserOptions::default()
        });
        let metadata = CommandMetadata::from_command(&command);

        let first = GlobalConfig::new(ParserConfig::default());
        let (a, _) = metadata.config_for(&first);
        let (b, _) = metadata.config_for(&first);
        assert!(Arc::ptr_eq(&a, &b));
        assert!(a.syntax.long_text_tags.is_empty());

        let second = GlobalConfig::new(ParserConfig::default());
        let (c, _) = metadata.config_for(&second);
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(*a, *c);
    }

    #[test]
    fn test_cache_reuses_entries_until_invalidated() {
        let cache = MetadataCache::new();
        let command = sample_command();

        let a = cache.get_or_build(&command);
        let b = cache.get_or_build(&command.clone());
        assert!(Arc::ptr_eq(&a, &b));

        let other = CommandSpec::new("other").with_option(CommandOption::string("text"));
        cache.get_or_build(&other);
        assert_eq!(cache.len(), 2);

        assert!(cache.invalidate(other.id()));
        assert!(!cache.invalidate(other.id()));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_evicts_rebuilt_command() {
        let cache = MetadataCache::new();
        let command = sample_command();
        let old_id = command.id();
        let a = cache.get_or_build(&command);

        let changed = command.with_option(CommandOption::string("third"));
        let c = cache.get_or_build(&changed);
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(cache.len(), 1);
        assert!(!cache.invalidate(old_id));
        assert_eq!(c.positional_names().count(), 3);
    }
}
