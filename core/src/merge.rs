//! Configuration merging.
//!
//! A command's parser override is layered over the parser-wide configuration
//! with [`ParserConfig::resolve`]. Two partial layers can be combined first
//! with [`ParserOptions::merge`], for example to derive a command preset from
//! [`ParserOptions::eval`].
//!
//! The rules are the same for both:
//!
//! - plain fields take the overlay value when it is given;
//! - `syntax` merges per list, a given list replaces the one underneath;
//! - nested feature objects merge field by field, and `null` disables the
//!   feature outright;
//! - `disableLongTextTagsInLastOption: true|false` replaces, an object merges.
//!
//! # Example
//!
//! ```
//! use command_args_core::*;
//!
//! let global = ParserConfig::from_options(&ParserOptions {
//!     resolve_command_options_choices: Nullable::Value(ChoicesOptions {
//!         can_use_directly_value: Some(false),
//!     }),
//!     ..ParserOptions::default()
//! });
//!
//! let command = ParserOptions::eval().merge(&ParserOptions {
//!     use_named_with_single_value: Some(true),
//!     ..ParserOptions::default()
//! });
//!
//! let config = global.resolve(&command);
//! assert!(config.use_named_with_single_value);
//! assert!(config.break_search_on_consume_all_options);
//! assert!(!config.resolve_command_options_choices.unwrap().can_use_directly_value);
//! ```

use crate::config::dedup;
use crate::{
    ChoicesOptions, ChoicesResolution, LastOptionTags, LastOptionTagsOptions,
    LastOptionTagsSetting, Nullable, ParserConfig, ParserOptions, RepliedUser,
    RepliedUserOptions, Syntax, SyntaxOptions,
};

impl ParserConfig {
    /// Applies a partial override on top of this configuration.
    ///
    /// `self` is left untouched. Resolving twice with the same override gives
    /// the same result as resolving once.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_args_core::*;
    ///
    /// let global = ParserConfig::default();
    /// let off = ParserOptions {
    ///     resolve_command_options_choices: Nullable::Null,
    ///     ..ParserOptions::default()
    /// };
    /// assert!(global.resolve(&off).resolve_command_options_choices.is_none());
    ///
    /// let tweak = ParserOptions {
    ///     resolve_command_options_choices: Nullable::Value(ChoicesOptions::default()),
    ///     ..ParserOptions::default()
    /// };
    /// // An empty object keeps the inherited settings.
    /// assert!(global.resolve(&tweak).resolve_command_options_choices.unwrap().can_use_directly_value);
    /// ```
    pub fn resolve(&self, overrides: &ParserOptions) -> ParserConfig {
        ParserConfig {
            syntax: resolve_syntax(&self.syntax, overrides.syntax.as_ref()),
            break_search_on_consume_all_options: overrides
                .break_search_on_consume_all_options
                .unwrap_or(self.break_search_on_consume_all_options),
            use_unique_named_syntax_at_same_time: overrides
                .use_unique_named_syntax_at_same_time
                .unwrap_or(self.use_unique_named_syntax_at_same_time),
            disable_long_text_tags_in_last_option: resolve_last_option_tags(
                self.disable_long_text_tags_in_last_option,
                overrides.disable_long_text_tags_in_last_option,
            ),
            resolve_command_options_choices: resolve_nested(
                self.resolve_command_options_choices,
                &overrides.resolve_command_options_choices,
                |base, o: &ChoicesOptions| ChoicesResolution {
                    can_use_directly_value: o
                        .can_use_directly_value
                        .or(base.map(|b| b.can_use_directly_value))
                        .unwrap_or(true),
                },
            ),
            use_replied_user_as_an_option: resolve_nested(
                self.use_replied_user_as_an_option,
                &overrides.use_replied_user_as_an_option,
                |base, o: &RepliedUserOptions| RepliedUser {
                    require_ping: o
                        .require_ping
                        .or(base.map(|b| b.require_ping))
                        .unwrap_or(false),
                },
            ),
            use_code_block_lang_as_an_option: overrides
                .use_code_block_lang_as_an_option
                .unwrap_or(self.use_code_block_lang_as_an_option),
            use_named_with_single_value: overrides
                .use_named_with_single_value
                .unwrap_or(self.use_named_with_single_value),
            log_result: overrides.log_result.unwrap_or(self.log_result),
        }
    }
}

fn resolve_syntax(base: &Syntax, overrides: Option<&SyntaxOptions>) -> Syntax {
    let Some(overrides) = overrides else {
        return base.clone();
    };
    Syntax {
        long_text_tags: match &overrides.long_text_tags {
            Some(tags) => dedup(tags.clone()),
            None => base.long_text_tags.clone(),
        },
        named_options: match &overrides.named_options {
            Some(named) => dedup(named.clone()),
            None => base.named_options.clone(),
        },
    }
}

fn resolve_last_option_tags(
    base: Option<LastOptionTags>,
    overrides: Option<LastOptionTagsSetting>,
) -> Option<LastOptionTags> {
    match overrides {
        None => base,
        Some(LastOptionTagsSetting::Enabled(false)) => None,
        Some(LastOptionTagsSetting::Enabled(true)) => Some(LastOptionTags::default()),
        Some(LastOptionTagsSetting::Detailed(o)) => Some(LastOptionTags {
            exclude_code_blocks: o
                .exclude_code_blocks
                .or(base.map(|b| b.exclude_code_blocks))
                .unwrap_or(false),
        }),
    }
}

fn resolve_nested<R: Copy, O>(
    base: Option<R>,
    overrides: &Nullable<O>,
    apply: impl FnOnce(Option<R>, &O) -> R,
) -> Option<R> {
    match overrides {
        Nullable::Unset => base,
        Nullable::Null => None,
        Nullable::Value(o) => Some(apply(base, o)),
    }
}

impl ParserOptions {
    /// Layers `overlay` on top of `self`, producing a new partial options set.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_args_core::*;
    ///
    /// let merged = ParserOptions::eval().merge(&ParserOptions {
    ///     disable_long_text_tags_in_last_option: Some(LastOptionTagsSetting::Enabled(false)),
    ///     ..ParserOptions::default()
    /// });
    /// assert_eq!(merged.break_search_on_consume_all_options, Some(true));
    /// assert_eq!(
    ///     merged.disable_long_text_tags_in_last_option,
    ///     Some(LastOptionTagsSetting::Enabled(false)),
    /// );
    /// ```
    pub fn merge(&self, overlay: &ParserOptions) -> ParserOptions {
        ParserOptions {
            syntax: merge_syntax(self.syntax.as_ref(), overlay.syntax.as_ref()),
            break_search_on_consume_all_options: overlay
                .break_search_on_consume_all_options
                .or(self.break_search_on_consume_all_options),
            use_unique_named_syntax_at_same_time: overlay
                .use_unique_named_syntax_at_same_time
                .or(self.use_unique_named_syntax_at_same_time),
            disable_long_text_tags_in_last_option: merge_last_option_tags(
                self.disable_long_text_tags_in_last_option,
                overlay.disable_long_text_tags_in_last_option,
            ),
            resolve_command_options_choices: merge_nested(
                &self.resolve_command_options_choices,
                &overlay.resolve_command_options_choices,
                |base, o| ChoicesOptions {
                    can_use_directly_value: o.can_use_directly_value.or(match base {
                        Nullable::Value(b) => b.can_use_directly_value,
                        Nullable::Null => Some(true),
                        Nullable::Unset => None,
                    }),
                },
            ),
            use_replied_user_as_an_option: merge_nested(
                &self.use_replied_user_as_an_option,
                &overlay.use_replied_user_as_an_option,
                |base, o| RepliedUserOptions {
                    require_ping: o.require_ping.or(match base {
                        Nullable::Value(b) => b.require_ping,
                        Nullable::Null => Some(false),
                        Nullable::Unset => None,
                    }),
                },
            ),
            use_code_block_lang_as_an_option: overlay
                .use_code_block_lang_as_an_option
                .or(self.use_code_block_lang_as_an_option),
            use_named_with_single_value: overlay
                .use_named_with_single_value
                .or(self.use_named_with_single_value),
            log_result: overlay.log_result.or(self.log_result),
        }
    }
}

fn merge_syntax(
    base: Option<&SyntaxOptions>,
    overlay: Option<&SyntaxOptions>,
) -> Option<SyntaxOptions> {
    match (base, overlay) {
        (None, None) => None,
        (Some(only), None) | (None, Some(only)) => Some(only.clone()),
        (Some(base), Some(overlay)) => Some(SyntaxOptions {
            long_text_tags: overlay
                .long_text_tags
                .clone()
                .or_else(|| base.long_text_tags.clone()),
            named_options: overlay
                .named_options
                .clone()
                .or_else(|| base.named_options.clone()),
        }),
    }
}

fn merge_last_option_tags(
    base: Option<LastOptionTagsSetting>,
    overlay: Option<LastOptionTagsSetting>,
) -> Option<LastOptionTagsSetting> {
    match (base, overlay) {
        (base, None) => base,
        (
            Some(LastOptionTagsSetting::Detailed(base)),
            Some(LastOptionTagsSetting::Detailed(overlay)),
        ) => Some(LastOptionTagsSetting::Detailed(LastOptionTagsOptions {
            exclude_code_blocks: overlay.exclude_code_blocks.or(base.exclude_code_blocks),
        })),
        // A plain boolean underneath resolves to the default details.
        (Some(LastOptionTagsSetting::Enabled(_)), Some(LastOptionTagsSetting::Detailed(overlay))) => {
            Some(LastOptionTagsSetting::Detailed(LastOptionTagsOptions {
                exclude_code_blocks: overlay.exclude_code_blocks.or(Some(false)),
            }))
        }
        (_, overlay) => overlay,
    }
}

fn merge_nested<O: Copy>(
    base: &Nullable<O>,
    overlay: &Nullable<O>,
    apply: impl FnOnce(&Nullable<O>, &O) -> O,
) -> Nullable<O> {
    match overlay {
        Nullable::Unset => *base,
        Nullable::Null => Nullable::Null,
        // A disabled base contributes the defaults, not the inherited settings.
        Nullable::Value(o) => Nullable::Value(apply(base, o)),
    }
}

impl From<&ParserConfig> for ParserOptions {
    /// Spells out every field, so resolving the result over any base gives
    /// back the same configuration.
    fn from(config: &ParserConfig) -> Self {
        ParserOptions {
            syntax: Some(SyntaxOptions {
                long_text_tags: Some(config.syntax.long_text_tags.clone()),
                named_options: Some(config.syntax.named_options.clone()),
            }),
            break_search_on_consume_all_options: Some(config.break_search_on_consume_all_options),
            use_unique_named_syntax_at_same_time: Some(
                config.use_unique_named_syntax_at_same_time,
            ),
            disable_long_text_tags_in_last_option: Some(
                match config.disable_long_text_tags_in_last_option {
                    Some(tags) => LastOptionTagsSetting::Detailed(LastOptionTagsOptions {
                        exclude_code_blocks: Some(tags.exclude_code_blocks),
                    }),
                    None => LastOptionTagsSetting::Enabled(false),
                },
            ),
            resolve_command_options_choices: config
                .resolve_command_options_choices
                .map(|c| ChoicesOptions {
                    can_use_directly_value: Some(c.can_use_directly_value),
                })
                .into(),
            use_replied_user_as_an_option: config
                .use_replied_user_as_an_option
                .map(|r| RepliedUserOptions {
                    require_ping: Some(r.require_ping),
                })
                .into(),
            use_code_block_lang_as_an_option: Some(config.use_code_block_lang_as_an_option),
            use_named_with_single_value: Some(config.use_named_with_single_value),
            log_result: Some(config.log_result),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LongTextTag, NamedSyntax};

    fn sample_override() -> ParserOptions {
        ParserOptions {
            syntax: Some(SyntaxOptions {
                long_text_tags: None,
                named_options: Some(vec![NamedSyntax::Colon]),
            }),
            use_unique_named_syntax_at_same_time: Some(true),
            disable_long_text_tags_in_last_option: Some(LastOptionTagsSetting::Enabled(true)),
            use_replied_user_as_an_option: Nullable::Value(RepliedUserOptions::default()),
            ..ParserOptions::default()
        }
    }

    #[test]
    fn test_resolve_empty_override_is_identity() {
        let global = ParserConfig::from_options(&sample_override());
        assert_eq!(global.resolve(&ParserOptions::default()), global);
    }

    #[test]
    fn test_resolve_syntax_per_list() {
        let config = ParserConfig::default().resolve(&sample_override());
        assert_eq!(config.syntax.long_text_tags, LongTextTag::ALL.to_vec());
        assert_eq!(config.syntax.named_options, vec![NamedSyntax::Colon]);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let global = ParserConfig::default();
        let once = global.resolve(&sample_override());
        let twice = global.resolve(&ParserOptions::from(&once));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_resolve_spelled_out_config_ignores_base() {
        let target = ParserConfig::from_options(&sample_override());
        let base = ParserConfig::from_options(&ParserOptions::eval());
        assert_eq!(base.resolve(&ParserOptions::from(&target)), target);
    }

    #[test]
    fn test_last_option_object_merges_with_enabled_base() {
        let base = ParserConfig::from_options(&ParserOptions::eval());
        let config = base.resolve(&ParserOptions {
            disable_long_text_tags_in_last_option: Some(LastOptionTagsSetting::Detailed(
                LastOptionTagsOptions::default(),
            )),
            ..ParserOptions::default()
        });
        assert_eq!(
            config.disable_long_text_tags_in_last_option,
            Some(LastOptionTags {
                exclude_code_blocks: true
            })
        );
    }

    #[test]
    fn test_last_option_false_disables() {
        let base = ParserConfig::from_options(&ParserOptions::eval());
        let config = base.resolve(&ParserOptions {
            disable_long_text_tags_in_last_option: Some(LastOptionTagsSetting::Enabled(false)),
            ..ParserOptions::default()
        });
        assert!(config.disable_long_text_tags_in_last_option.is_none());
    }

    #[test]
    fn test_replied_user_object_over_disabled_base_uses_defaults() {
        let config = ParserConfig::default().resolve(&ParserOptions {
            use_replied_user_as_an_option: Nullable::Value(RepliedUserOptions::default()),
            ..ParserOptions::default()
        });
        assert_eq!(
            config.use_replied_user_as_an_option,
            Some(RepliedUser {
                require_ping: false
            })
        );
    }

    #[test]
    fn test_merge_options_nested_fields() {
        let base = ParserOptions {
            use_replied_user_as_an_option: Nullable::Value(RepliedUserOptions {
                require_ping: Some(true),
            }),
            ..ParserOptions::default()
        };
        let merged = base.merge(&ParserOptions {
            use_replied_user_as_an_option: Nullable::Value(RepliedUserOptions::default()),
            ..ParserOptions::default()
        });
        assert_eq!(
            merged.use_replied_user_as_an_option,
            Nullable::Value(RepliedUserOptions {
                require_ping: Some(true)
            })
        );

        let disabled = base.merge(&ParserOptions {
            use_replied_user_as_an_option: Nullable::Null,
            ..ParserOptions::default()
        });
        assert_eq!(disabled.use_replied_user_as_an_option, Nullable::Null);
    }

    #[test]
    fn test_merge_then_resolve_matches_layered_resolve() {
        let global = ParserConfig::default();
        let a = ParserOptions::eval();
        let b = sample_override();
        assert_eq!(global.resolve(&a.merge(&b)), global.resolve(&a).resolve(&b));
    }
}
