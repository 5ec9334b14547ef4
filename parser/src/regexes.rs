//! Tokenizer and escape-mode patterns.
//!
//! Every pattern is assembled from the delimiters a [`ParserConfig`] actually
//! enables, so a disabled quote or marker disappears from the token classes
//! and from escape detection alike.

use std::sync::LazyLock;

use command_args_core::{LongTextTag, NamedSyntax, ParserConfig};
use regex::{Captures, Regex};

/// Backslashes right after a hyphen-named marker, before `=` or `:`.
pub(crate) static FLAG_SYMBOL_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\\+)([=:])").expect("static regex must compile"));

/// Language line at the top of a code block.
pub(crate) static CODE_BLOCK_LANG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+)\n").expect("static regex must compile"));

/// Which named families a character class covers.
#[derive(Debug, Clone, Copy)]
struct Families {
    hyphen: bool,
    colon: bool,
}

/// Escape-mode patterns that depend on the named families in play.
///
/// Each pattern captures a backslash run and the character it stands before
/// (empty at end of input).
#[derive(Debug)]
pub(crate) struct EscapeModes {
    /// Every enabled delimiter plus whitespace.
    pub(crate) all: Option<Regex>,
    /// Like `all`, without the quote characters.
    pub(crate) all_without_tags: Option<Regex>,
    /// Inside a hyphen-named option value.
    pub(crate) named: Option<Regex>,
    /// Inside a colon-named option value.
    pub(crate) named_dotted: Option<Regex>,
    /// Anchored probe for the character after a backslash run.
    pub(crate) next_char: Option<Regex>,
}

/// Which named family a marker belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NamedFamily {
    Hyphen,
    Colon,
}

/// One recognized token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Token<'h> {
    /// `\\*--name`, `\\*-name`, or `\\*name:`.
    Named {
        escapes: &'h str,
        hyphens: Option<&'h str>,
        name: &'h str,
    },
    /// A single delimiter character.
    Tag(char),
    /// A run of ordinary characters.
    Value(&'h str),
    /// A run of backslashes.
    Backescape(&'h str),
    /// A run of line feeds.
    LineBreak,
}

impl Token<'_> {
    pub(crate) fn family(&self) -> Option<NamedFamily> {
        match self {
            Token::Named { hyphens: Some(_), .. } => Some(NamedFamily::Hyphen),
            Token::Named { hyphens: None, .. } => Some(NamedFamily::Colon),
            _ => None,
        }
    }
}

/// A token and its byte span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TokenMatch<'h> {
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) text: &'h str,
    pub(crate) token: Token<'h>,
}

/// Compiled patterns for one resolved configuration.
#[derive(Debug)]
pub(crate) struct SyntaxRegexes {
    tokens: Regex,
    /// Same alternation without the colon-named branch, used where a
    /// `name:` is really the scheme of a URL.
    tokens_without_dotted: Option<Regex>,
    tag_modes: Vec<(char, Regex)>,
    modes: EscapeModes,
    hyphen_locked: EscapeModes,
    colon_locked: EscapeModes,
}

impl SyntaxRegexes {
    /// Builds every pattern for `config`.
    ///
    /// Patterns only ever contain escaped members of a closed alphabet, so
    /// building cannot fail.
    pub(crate) fn build(config: &ParserConfig) -> Self {
        let syntax = &config.syntax;
        let tags: String = syntax.long_text_tags.iter().map(|t| t.as_char()).collect();
        let enabled = Families {
            hyphen: syntax.has_hyphen_named(),
            colon: syntax.has_colon_named(),
        };
        let hyphen_counts = match (
            syntax.named_options.contains(&NamedSyntax::Hyphen),
            syntax.named_options.contains(&NamedSyntax::DoubleHyphen),
        ) {
            (true, true) => "1,2",
            (true, false) => "1",
            _ => "2",
        };

        let tokens = compile(&token_pattern(&tags, enabled, hyphen_counts, true));
        let tokens_without_dotted = enabled
            .colon
            .then(|| compile(&token_pattern(&tags, enabled, hyphen_counts, false)));

        let tag_modes = tags
            .chars()
            .map(|tag| (tag, compile(&format!(r"(\\+)([{tag}\s]|$)"))))
            .collect();

        Self {
            tokens,
            tokens_without_dotted,
            tag_modes,
            modes: escape_modes(&tags, enabled, enabled),
            hyphen_locked: escape_modes(
                &tags,
                enabled,
                Families {
                    hyphen: enabled.hyphen,
                    colon: false,
                },
            ),
            colon_locked: escape_modes(
                &tags,
                enabled,
                Families {
                    hyphen: false,
                    colon: enabled.colon,
                },
            ),
        }
    }

    /// Escape modes with both named families, or with only the locked one.
    pub(crate) fn modes(&self, lock: Option<NamedFamily>) -> &EscapeModes {
        match lock {
            None => &self.modes,
            Some(NamedFamily::Hyphen) => &self.hyphen_locked,
            Some(NamedFamily::Colon) => &self.colon_locked,
        }
    }

    /// Escape mode inside a long text opened by `tag`.
    pub(crate) fn tag_mode(&self, tag: LongTextTag) -> Option<&Regex> {
        let c = tag.as_char();
        self.tag_modes.iter().find(|(t, _)| *t == c).map(|(_, re)| re)
    }

    /// Iterates over the tokens of `content`.
    pub(crate) fn tokens<'r, 'h>(&'r self, content: &'h str) -> Tokens<'r, 'h> {
        Tokens {
            regexes: self,
            content,
            pos: 0,
        }
    }
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("generated regex must compile")
}

/// Class members for the delimiters, escaped where needed inside `[...]`.
fn render(tags: &str, families: Families) -> String {
    let mut out = String::from(tags);
    if families.hyphen {
        out.push_str(r"\-");
    }
    if families.colon {
        out.push(':');
    }
    out
}

fn token_pattern(tags: &str, enabled: Families, hyphen_counts: &str, with_dotted: bool) -> String {
    let special = !tags.is_empty() || enabled.hyphen || enabled.colon;
    let mut branches = Vec::new();

    let mut named = Vec::new();
    if enabled.hyphen {
        named.push(format!(
            r"(?P<hyphens>-{{{hyphen_counts}}})(?P<hyphensname>[a-zA-Z_][a-zA-Z_0-9]*)[=:]?"
        ));
    }
    if enabled.colon && with_dotted {
        named.push(r"(?P<dotsname>[a-zA-Z_0-9]+)(?P<dots>:)".to_string());
    }
    if !named.is_empty() {
        branches.push(format!(
            r"(?P<named>(?P<escapes>\\*)(?:{}))",
            named.join("|")
        ));
    }

    if special {
        branches.push(format!("(?P<tag>[{}])", render(tags, enabled)));
    }

    let backslash = if special { r"\\" } else { "" };
    branches.push(format!(r"(?P<value>[^\s\x7F{tags}{backslash}]+)"));

    if special {
        branches.push(r"(?P<backescape>\\+)".to_string());
    }

    branches.push(r"(?P<lnb>\n+)".to_string());
    branches.join("|")
}

fn escape_modes(tags: &str, enabled: Families, class: Families) -> EscapeModes {
    let special = !tags.is_empty() || enabled.hyphen || enabled.colon;
    let any_named = enabled.hyphen || enabled.colon;
    let delimiters = render(tags, class);
    let markers = render("", class);

    EscapeModes {
        all: special.then(|| compile(&format!(r"(\\+)([{delimiters}\s]|$)"))),
        all_without_tags: special.then(|| compile(&format!(r"(\\+)([{markers}\s]|$)"))),
        named: any_named.then(|| compile(&format!(r"(\\+)([{markers}\s]|$)"))),
        named_dotted: enabled
            .colon
            .then(|| compile(&format!(r"(\\+)([{markers}\s/]|$)"))),
        next_char: special.then(|| compile(&format!(r"^(?:[{delimiters}\s]|$)"))),
    }
}

/// Token iterator over one input string.
pub(crate) struct Tokens<'r, 'h> {
    regexes: &'r SyntaxRegexes,
    content: &'h str,
    pos: usize,
}

impl<'h> Iterator for Tokens<'_, 'h> {
    type Item = TokenMatch<'h>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.content.len() {
            return None;
        }
        let mut caps = self.regexes.tokens.captures_at(self.content, self.pos)?;

        if caps.name("dots").is_some() && is_url_scheme_end(self.content, caps_end(&caps)) {
            let start = caps_start(&caps);
            let fallback = self.regexes.tokens_without_dotted.as_ref()?;
            caps = fallback.captures_at(self.content, start)?;
        }

        let whole = caps.get(0)?;
        // Every branch consumes at least one character.
        self.pos = whole.end();

        Some(TokenMatch {
            start: whole.start(),
            end: whole.end(),
            text: whole.as_str(),
            token: to_token(&caps)?,
        })
    }
}

fn caps_start(caps: &Captures<'_>) -> usize {
    caps.get(0).map_or(0, |m| m.start())
}

fn caps_end(caps: &Captures<'_>) -> usize {
    caps.get(0).map_or(0, |m| m.end())
}

/// `name:` directly followed by `//` and a visible character.
fn is_url_scheme_end(content: &str, end: usize) -> bool {
    let Some(rest) = content.get(end..) else {
        return false;
    };
    let Some(after) = rest.strip_prefix("//") else {
        return false;
    };
    after
        .chars()
        .next()
        .is_some_and(|c| !c.is_whitespace() && c != '\x7F')
}

fn to_token<'h>(caps: &Captures<'h>) -> Option<Token<'h>> {
    if caps.name("named").is_some() {
        let escapes = caps.name("escapes").map_or("", |m| m.as_str());
        return match caps.name("hyphensname") {
            Some(name) => Some(Token::Named {
                escapes,
                hyphens: caps.name("hyphens").map(|m| m.as_str()),
                name: name.as_str(),
            }),
            None => Some(Token::Named {
                escapes,
                hyphens: None,
                name: caps.name("dotsname")?.as_str(),
            }),
        };
    }
    if let Some(tag) = caps.name("tag") {
        return tag.as_str().chars().next().map(Token::Tag);
    }
    if let Some(value) = caps.name("value") {
        return Some(Token::Value(value.as_str()));
    }
    if let Some(run) = caps.name("backescape") {
        return Some(Token::Backescape(run.as_str()));
    }
    caps.name("lnb").map(|_| Token::LineBreak)
}

#[cfg(test)]
mod tests {
    use command_args_core::{ParserOptions, SyntaxOptions};

    use super::*;

    fn regexes_for(tags: Vec<LongTextTag>, named: Vec<NamedSyntax>) -> SyntaxRegexes {
        let config = ParserConfig::from_options(&ParserOptions {
            syntax: Some(SyntaxOptions {
                long_text_tags: Some(tags),
                named_options: Some(named),
            }),
            ..ParserOptions::default()
        });
        SyntaxRegexes::build(&config)
    }

    fn kinds(regexes: &SyntaxRegexes, content: &str) -> Vec<String> {
        regexes
            .tokens(content)
            .map(|m| match m.token {
                Token::Named { name, .. } => format!("named:{name}"),
                Token::Tag(c) => format!("tag:{c}"),
                Token::Value(v) => format!("value:{v}"),
                Token::Backescape(r) => format!("back:{}", r.len()),
                Token::LineBreak => "lnb".to_string(),
            })
            .collect()
    }

    #[test]
    fn test_default_config_tokens() {
        let regexes = SyntaxRegexes::build(&ParserConfig::default());
        assert_eq!(
            kinds(&regexes, r#"say "hi there" --to bob k: v \"x"#),
            vec![
                "value:say",
                "tag:\"",
                "value:hi",
                "value:there",
                "tag:\"",
                "named:to",
                "value:bob",
                "named:k",
                "value:v",
                "back:1",
                "tag:\"",
                "value:x",
            ]
        );
    }

    #[test]
    fn test_url_scheme_is_not_a_named_option() {
        let regexes = SyntaxRegexes::build(&ParserConfig::default());
        assert_eq!(
            kinds(&regexes, "see https://example.com now"),
            vec!["value:see", "value:https://example.com", "value:now"]
        );
        assert_eq!(kinds(&regexes, "url: //"), vec!["named:url", "value://"]);
    }

    #[test]
    fn test_disabled_syntax_is_plain_text() {
        let regexes = regexes_for(vec![LongTextTag::Backtick], vec![NamedSyntax::DoubleHyphen]);
        assert_eq!(
            kinds(&regexes, r#"a "b" k:v -x --y"#),
            vec![
                "value:a",
                "value:\"b\"",
                "value:k:v",
                "tag:-",
                "value:x",
                "named:y",
            ]
        );
    }

    #[test]
    fn test_no_special_syntax_keeps_backslashes_in_values() {
        let regexes = regexes_for(vec![], vec![]);
        assert_eq!(kinds(&regexes, "a\\b c\n"), vec!["value:a\\b", "value:c", "lnb"]);
        assert!(regexes.modes(None).next_char.is_none());
    }

    #[test]
    fn test_escape_classes_follow_enabled_syntax() {
        let regexes = regexes_for(vec![LongTextTag::DoubleQuote], vec![NamedSyntax::Colon]);
        let modes = regexes.modes(None);

        let all = modes.all.as_ref().unwrap();
        assert!(all.is_match("\\\""));
        assert!(all.is_match("\\:"));
        assert!(!all.is_match("\\-"));

        let without_tags = modes.all_without_tags.as_ref().unwrap();
        assert!(!without_tags.is_match("\\\""));

        let dotted = modes.named_dotted.as_ref().unwrap();
        assert!(dotted.is_match("\\/"));
        assert!(regexes.tag_mode(LongTextTag::SingleQuote).is_none());
    }

    #[test]
    fn test_locked_family_prunes_other_markers() {
        let regexes = SyntaxRegexes::build(&ParserConfig::default());

        let probe = regexes.modes(Some(NamedFamily::Hyphen)).next_char.as_ref().unwrap();
        assert!(probe.is_match("-x"));
        assert!(!probe.is_match(":x"));

        let probe = regexes.modes(Some(NamedFamily::Colon)).next_char.as_ref().unwrap();
        assert!(!probe.is_match("-x"));
        assert!(probe.is_match(":x"));
        assert!(probe.is_match(""));
    }

    #[test]
    fn test_static_patterns() {
        let caps = FLAG_SYMBOL_ESCAPE.captures(r"\\\=value").unwrap();
        assert_eq!(&caps[1], r"\\\");
        assert_eq!(&caps[2], "=");

        let caps = CODE_BLOCK_LANG.captures("rust\nfn main() {}").unwrap();
        assert_eq!(&caps[1], "rust");
        assert!(CODE_BLOCK_LANG.captures("fn main() {}").is_none());
    }
}
