//! The single-pass tokenizer state machine.
//!
//! A [`Sweep`] lives for one parse call. It walks the tokens of the content
//! once and assigns text to option slots while tracking open quotes, open
//! named options, pending backslash escapes and the deferred last slot.

use std::collections::{HashMap, HashSet};

use command_args_core::{
    ArgPosition, CommandOption, LongTextTag, MessageContext, OptionType, ParsedArgs, ParserConfig,
};
use regex::{Captures, Regex};
use tracing::debug;

use crate::choices::resolve_choices;
use crate::metadata::CommandMetadata;
use crate::regexes::{
    CODE_BLOCK_LANG, EscapeModes, FLAG_SYMBOL_ESCAPE, NamedFamily, SyntaxRegexes, Token,
    TokenMatch,
};

fn is_space(c: char) -> bool {
    c.is_whitespace() || c == '\x7F'
}

/// An open quoted span.
#[derive(Debug, Clone, Copy)]
struct LongText {
    quote: LongTextTag,
    /// Just after the first opening quote.
    start: usize,
    /// Just after the last of the consecutive opening quotes.
    to_start: usize,
    /// First quote of a candidate closing run.
    to_end: Option<usize>,
    /// Last quote of that run so far.
    end: Option<usize>,
}

/// An open named option.
#[derive(Debug, Clone, Copy)]
struct NamedState<'a> {
    option: &'a CommandOption,
    /// Just after the marker.
    start: usize,
    /// Start of the marker.
    name_start: usize,
    dotted: bool,
}

/// The last positional slot, waiting for the rest of the text.
#[derive(Debug, Clone)]
struct LatestLongWord<'a> {
    name: &'a str,
    start: usize,
    /// Start of the held text placed in front of the word.
    from: usize,
    unindexed: String,
}

pub(crate) struct Sweep<'a> {
    content: &'a str,
    metadata: &'a CommandMetadata,
    config: &'a ParserConfig,
    regexes: &'a SyntaxRegexes,

    values: HashMap<&'a str, String>,
    positions: HashMap<&'a str, ArgPosition>,
    consumed: Vec<bool>,
    consumed_count: usize,
    filled_flags: HashSet<&'a str>,

    long_text: Option<LongText>,
    /// Span of an odd backslash run that escapes the next delimiter.
    escaping_next: Option<(usize, usize)>,
    /// Text held for the next value, with the offset it starts at.
    unindexed: String,
    unindexed_start: usize,
    named_family: Option<NamedFamily>,
    named: Option<NamedState<'a>>,
    latest_long_word: Option<LatestLongWord<'a>>,
    last_added: Option<&'a str>,
    recently_closed: bool,
    latest_long_word_aggregated: bool,
    has_backescapes: bool,
}

impl<'a> Sweep<'a> {
    pub(crate) fn new(
        content: &'a str,
        metadata: &'a CommandMetadata,
        config: &'a ParserConfig,
        regexes: &'a SyntaxRegexes,
    ) -> Self {
        Self {
            content,
            metadata,
            config,
            regexes,
            values: HashMap::new(),
            positions: HashMap::new(),
            consumed: vec![false; metadata.positional().len()],
            consumed_count: 0,
            filled_flags: HashSet::new(),
            long_text: None,
            escaping_next: None,
            unindexed: String::new(),
            unindexed_start: 0,
            named_family: None,
            named: None,
            latest_long_word: None,
            last_added: None,
            recently_closed: false,
            latest_long_word_aggregated: false,
            has_backescapes: content.contains('\\'),
        }
    }

    pub(crate) fn run(mut self, message: Option<&MessageContext>) -> ParsedArgs {
        if self.metadata.option_count() == 0 {
            return ParsedArgs::new(self.content);
        }

        if self.fill_replied_user(message) && self.all_consumed() {
            return self.finish();
        }

        let regexes = self.regexes;
        let content = self.content;
        for token in regexes.tokens(content) {
            if self.config.break_search_on_consume_all_options && self.all_consumed() {
                break;
            }
            let recently_closed = std::mem::take(&mut self.recently_closed);
            self.step(token, recently_closed);
        }

        let len = self.content.len();
        self.aggregate_latest_long_word(len, "");
        self.aggregate_next_named_option(len);
        self.aggregate_long_text(len);

        self.finish()
    }

    fn finish(mut self) -> ParsedArgs {
        if let Some(settings) = self.config.resolve_command_options_choices {
            resolve_choices(self.metadata.choices(), &mut self.values, settings);
        }

        if self.config.log_result {
            debug!(
                command = %self.metadata.name(),
                values = ?self.values,
                "Parsed command arguments"
            );
        }

        let mut args = ParsedArgs::new(self.content);
        args.values = self
            .values
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect();
        args.positions = self
            .positions
            .into_iter()
            .map(|(name, position)| (name.to_string(), position))
            .collect();
        args
    }

    fn step(&mut self, m: TokenMatch<'a>, recently_closed: bool) {
        if let Token::Named {
            escapes,
            hyphens,
            name,
        } = m.token
        {
            if self.long_text.is_none() {
                self.on_named(m, escapes, hyphens, name, recently_closed);
                return;
            }
        }

        let single = self.named_takes_single_value();

        if single
            && m.token == Token::LineBreak
            && self.long_text.is_none()
            && self.latest_long_word.is_none()
        {
            let end = self.named.map_or(m.start, |n| n.start);
            self.aggregate_next_named_option(end);
            return;
        }

        if self.latest_long_word.is_some() || (self.named.is_some() && !single) {
            return;
        }

        match m.token {
            Token::Backescape(run) => self.on_backescape(m.start, run, recently_closed),
            Token::Tag(tag) => self.on_tag(m.start, tag, recently_closed),
            Token::Value(value) => {
                if single && (self.latest_long_word_aggregated || self.next_slot().is_none()) {
                    return;
                }
                if self.long_text.is_none() {
                    self.on_value(m.start, m.end, value, recently_closed);
                }
            }
            Token::Named { .. } | Token::LineBreak => {}
        }
    }

    fn on_named(
        &mut self,
        m: TokenMatch<'a>,
        escapes: &'a str,
        hyphens: Option<&'a str>,
        name: &'a str,
        recently_closed: bool,
    ) {
        let index = m.start;

        let Some(option) = self.metadata.option(name) else {
            self.literal_named(m, recently_closed);
            return;
        };

        if self.config.use_unique_named_syntax_at_same_time {
            let family = m.token.family();
            match self.named_family {
                None => self.named_family = family,
                Some(locked) if Some(locked) != family => {
                    self.literal_named(m, recently_closed);
                    return;
                }
                Some(_) => {}
            }
        }

        let mut repr = String::new();
        if !escapes.is_empty() {
            let escaping = escapes.len() % 2 == 1;
            repr = "\\".repeat(escapes.len() / 2);

            if let (Some(hyphens), true) = (hyphens, escaping) {
                if self.latest_long_word.is_none() {
                    let text = format!("{repr}{hyphens}{name}");
                    self.aggregate_unindexed_text(index, &text, 0, m.text.len(), true, recently_closed);
                }
                return;
            }
            if self.latest_long_word.is_none() && !repr.is_empty() {
                self.aggregate_unindexed_text(index, &repr, 0, escapes.len(), false, recently_closed);
            }
        }

        if self.named.is_none() && self.latest_long_word.is_none() {
            self.flush_unindexed(index);
        }

        let close_at = if repr.is_empty() {
            index
        } else {
            index + escapes.len()
        };
        self.aggregate_next_named_option(close_at);

        if self.latest_long_word.is_some() {
            self.aggregate_latest_long_word(index, &repr);
        }

        self.named = Some(NamedState {
            option,
            start: m.end,
            name_start: index + escapes.len(),
            dotted: hyphens.is_none(),
        });
    }

    /// Places held text before a named marker takes over.
    fn flush_unindexed(&mut self, end: usize) {
        if self.unindexed.is_empty() {
            return;
        }
        let (from, text) = self.take_unindexed();
        self.aggregate_next_option(&text, (from, end), false);
    }

    fn take_unindexed(&mut self) -> (usize, String) {
        (self.unindexed_start, std::mem::take(&mut self.unindexed))
    }

    /// A marker that does not open an option is ordinary text.
    fn literal_named(&mut self, m: TokenMatch<'a>, recently_closed: bool) {
        if self.latest_long_word.is_some() {
            return;
        }
        self.aggregate_unindexed_text(m.start, m.text, 0, m.text.len(), true, recently_closed);
    }

    fn on_backescape(&mut self, index: usize, run: &str, recently_closed: bool) {
        let next_pos = index + run.len();
        let next = self.char_at(next_pos);

        if let Some(long_text) = self.long_text {
            if next != Some(long_text.quote.as_char()) {
                return;
            }
        }

        let disabled_in_last = self.config.disable_long_text_tags_in_last_option.is_some()
            && self.named.is_none()
            && self.at_last_slot();

        let odd = run.len() % 2 == 1;
        let escapes_quote_literal =
            next.is_some_and(|c| LongTextTag::from_char(c).is_some()) && disabled_in_last;
        let escaping = odd && !escapes_quote_literal && self.probe_next_char(next_pos);

        if escaping {
            self.escaping_next = Some((index, next_pos));
        }
        if self.long_text.is_some() {
            return;
        }

        let mut repr = "\\".repeat(run.len() / 2);
        if odd && !escaping {
            repr.push('\\');
        }
        if !repr.is_empty() {
            self.aggregate_unindexed_text(index, &repr, 0, run.len(), true, recently_closed);
        }
    }

    fn on_tag(&mut self, index: usize, tag: char, recently_closed: bool) {
        let mut buf = [0u8; 4];
        let tag_str: &str = tag.encode_utf8(&mut buf);

        let escaped = self.escaping_next.take().filter(|&(_, end)| end == index);
        if let Some((run_start, _)) = escaped {
            if self.long_text.is_none() {
                self.aggregate_unindexed_text(
                    index,
                    tag_str,
                    index - run_start,
                    1,
                    true,
                    recently_closed,
                );
            }
            return;
        }

        if let Some(disabled) = self.config.disable_long_text_tags_in_last_option {
            let opens_code_block = tag == '`' && self.content[index..].starts_with("```");
            if self.named.is_none()
                && self.long_text.is_none()
                && self.at_last_slot()
                && !(disabled.exclude_code_blocks && opens_code_block)
            {
                self.aggregate_next_option(tag_str, (index, index + 1), false);
                return;
            }
        }

        if tag == '-' || tag == ':' {
            if self.long_text.is_none() {
                self.aggregate_unindexed_text(index, tag_str, 0, 1, true, recently_closed);
            }
            return;
        }

        let Some(quote) = LongTextTag::from_char(tag) else {
            return;
        };
        match self.long_text {
            None => {
                self.long_text = Some(LongText {
                    quote,
                    start: index + 1,
                    to_start: index + 1,
                    to_end: None,
                    end: None,
                });
            }
            Some(long_text) if long_text.quote == quote => self.on_closing_quote(long_text, index),
            Some(_) => {}
        }
    }

    fn on_closing_quote(&mut self, mut lt: LongText, index: usize) {
        if lt.to_start == index {
            lt.to_start += 1;
            self.long_text = Some(lt);
            return;
        }

        let quote = lt.quote.as_char();
        let next_is_same = self.char_at(index + 1) == Some(quote);

        let possibly_end_run = next_is_same
            && (lt.to_end.is_none() || lt.end.is_some_and(|end| end + 1 != index));
        if possibly_end_run {
            lt.to_end = Some(index);
            lt.end = Some(index);
            self.long_text = Some(lt);
            return;
        }

        if next_is_same && lt.end.is_some_and(|end| end + 1 == index) {
            lt.end = Some(index);
            self.long_text = Some(lt);
            return;
        }

        let is_code_block = lt.quote == LongTextTag::Backtick && lt.to_start - lt.start == 2;
        if !is_code_block {
            self.aggregate_long_text(lt.to_end.unwrap_or(index));
            return;
        }

        let (Some(mut to_end), Some(_)) = (lt.to_end, lt.end) else {
            return;
        };
        if index - to_end < 2 {
            return;
        }

        let block = self.slice(lt.to_start, to_end);
        let can_add_lang = self.config.use_code_block_lang_as_an_option && self.named.is_none();

        if let Some(caps) = CODE_BLOCK_LANG.captures(block) {
            let lang_len = caps[0].len();
            if can_add_lang {
                self.aggregate_next_option(&caps[1], (lt.to_start, lt.to_start + lang_len), false);
            }
            lt.to_start += lang_len;
        } else if can_add_lang {
            if let Some(slot) = self.next_slot() {
                self.consume(slot);
            }
        }

        let bytes = self.content.as_bytes();
        if bytes.get(lt.to_start) == Some(&b'\n') {
            lt.to_start += 1;
        }
        if to_end > 0 && bytes.get(to_end - 1) == Some(&b'\n') {
            to_end -= 1;
        }
        lt.to_end = Some(to_end);

        self.long_text = Some(lt);
        self.aggregate_long_text(to_end);
    }

    fn on_value(&mut self, index: usize, end: usize, value: &str, recently_closed: bool) {
        let prev_is_space = self.char_before(index).is_some_and(is_space);
        let place_left = !(recently_closed || !self.unindexed.is_empty() || prev_is_space);

        if place_left {
            if let Some(last) = self.last_added {
                self.append_to(last, value, end);
                return;
            }
        }

        self.aggregate_next_option(value, (index, end), false);
    }

    /// Fills the first slot with the replied-to author when allowed.
    fn fill_replied_user(&mut self, message: Option<&MessageContext>) -> bool {
        let Some(settings) = self.config.use_replied_user_as_an_option else {
            return false;
        };
        let Some(message) = message else {
            return false;
        };
        let Some(replied) = message.replied_author_id.as_deref() else {
            return false;
        };

        let own_message = replied == message.author_id;
        if settings.require_ping && !own_message && !message.mentions(replied) {
            return false;
        }

        let Some(slot) = self.next_slot() else {
            return false;
        };
        let metadata = self.metadata;
        let option = &metadata.positional()[slot];
        if option.option_type != OptionType::User {
            return false;
        }

        self.values.insert(option.name.as_str(), replied.to_string());
        self.consume(slot);
        true
    }

    fn aggregate_next_option(&mut self, value: &str, (start, end): ArgPosition, is_long_text: bool) {
        if let Some(named) = self.named.filter(|n| self.takes_single_value(n)) {
            self.named = None;
            self.set_value(&named.option.name, value.to_string(), (start, end));
            self.recently_closed = true;
            self.mark_named_filled(named.option);
            self.last_added = Some(&named.option.name);
            return;
        }

        if is_long_text && !self.unindexed.is_empty() {
            let (from, saved) = self.take_unindexed();
            self.aggregate_next_option(&saved, (from, start), true);
        }

        let Some(slot) = self.next_slot() else {
            return;
        };
        let metadata = self.metadata;
        let name = metadata.positional()[slot].name.as_str();

        let (from, unindexed) = if self.unindexed.is_empty() {
            (start, String::new())
        } else {
            self.take_unindexed()
        };

        let is_last = self.remaining_slots() == 1;
        if is_last && !is_long_text && self.long_text.is_none() {
            self.latest_long_word = Some(LatestLongWord {
                name,
                start,
                from,
                unindexed: unindexed.clone(),
            });
        }

        self.set_value(name, unindexed + value, (from, end));
        self.consume(slot);
        self.last_added = Some(name);
    }

    fn aggregate_latest_long_word(&mut self, end: usize, post: &str) {
        let Some(word) = self.latest_long_word.take() else {
            return;
        };

        let disabled = self.config.disable_long_text_tags_in_last_option.is_some();
        let literal = disabled
            && self.config.break_search_on_consume_all_options
            && end == self.content.len();

        let sliced = self.slice(word.start, end);
        let body = if literal {
            sliced.to_string()
        } else {
            let modes = self.modes();
            let mode = if disabled {
                modes.all_without_tags.as_ref()
            } else {
                modes.all.as_ref()
            };
            self.sanitize(sliced, mode) + post
        };

        let value = format!("{}{}", word.unindexed, body).trim().to_string();
        self.set_value(word.name, value, (word.from, end));
        self.latest_long_word_aggregated = true;
    }

    fn aggregate_long_text(&mut self, end: usize) {
        let Some(lt) = self.long_text else {
            return;
        };

        let raw = self.slice(lt.to_start, end);
        let value = match self.regexes.tag_mode(lt.quote) {
            Some(mode) => self.sanitize(raw, Some(mode)),
            None => raw.to_string(),
        };

        self.long_text = None;
        self.recently_closed = true;
        self.aggregate_next_option(&value, (lt.to_start, end), true);
    }

    fn aggregate_next_named_option(&mut self, end: usize) {
        let Some(named) = self.named.take() else {
            return;
        };

        let mut slice = self.slice(named.start, end);
        let mut symbol = String::new();
        if !named.dotted {
            if let Some(caps) = FLAG_SYMBOL_ESCAPE.captures(slice) {
                symbol = format!("{}{}", "\\".repeat(caps[1].len() / 2), &caps[2]);
                slice = &slice[caps[0].len()..];
            }
        }

        let modes = self.modes();
        let mode = if named.dotted {
            modes.named_dotted.as_ref()
        } else {
            modes.named.as_ref()
        };
        let value = symbol + self.sanitize(slice, mode).trim();

        self.mark_named_filled(named.option);

        let void_boolean = !named.dotted
            && value.trim_start().is_empty()
            && named.option.option_type == OptionType::Boolean;

        let name = named.option.name.as_str();
        if void_boolean {
            self.set_value(name, "true".to_string(), (named.name_start, named.start));
        } else {
            self.set_value(name, value, (named.start, end));
        }

        self.recently_closed = true;
        self.last_added = Some(name);
    }

    /// Places text that sits between tokens: glued to the previous value,
    /// held for the next one, or as a value of its own.
    fn aggregate_unindexed_text(
        &mut self,
        pos: usize,
        text: &str,
        precedent_len: usize,
        real_len: usize,
        enable_right: bool,
        recently_closed: bool,
    ) {
        if self.named.is_some() {
            return;
        }

        let back = self.char_before(pos.saturating_sub(precedent_len));
        let next = self.char_at(pos + real_len);

        if self.unindexed.is_empty() && !recently_closed && back.is_some_and(|c| !is_space(c)) {
            if let Some(last) = self.last_added {
                self.append_to(last, text, pos + real_len);
                return;
            }
        }

        let start = pos.saturating_sub(precedent_len);
        if enable_right && next.is_some_and(|c| !is_space(c)) {
            if self.unindexed.is_empty() {
                self.unindexed_start = start;
            }
            self.unindexed.push_str(text);
            return;
        }

        self.aggregate_next_option(text, (start, pos + real_len), false);
    }

    fn sanitize(&self, text: &str, mode: Option<&Regex>) -> String {
        match mode {
            Some(re) if self.has_backescapes => re
                .replace_all(text, |caps: &Captures<'_>| {
                    format!("{}{}", "\\".repeat(caps[1].len() / 2), &caps[2])
                })
                .into_owned(),
            _ => text.to_string(),
        }
    }

    fn probe_next_char(&self, pos: usize) -> bool {
        let rest = self.content.get(pos..).unwrap_or("");
        self.modes()
            .next_char
            .as_ref()
            .is_some_and(|re| re.is_match(rest))
    }

    fn modes(&self) -> &'a EscapeModes {
        self.regexes.modes(self.named_family)
    }

    fn named_takes_single_value(&self) -> bool {
        self.named.as_ref().is_some_and(|n| self.takes_single_value(n))
    }

    fn takes_single_value(&self, named: &NamedState<'_>) -> bool {
        named
            .option
            .takes_single_value(self.config.use_named_with_single_value)
    }

    fn set_value(&mut self, name: &'a str, value: String, position: ArgPosition) {
        self.values.insert(name, value);
        self.positions.insert(name, position);
    }

    fn append_to(&mut self, name: &'a str, text: &str, end: usize) {
        self.values.entry(name).or_default().push_str(text);
        if let Some(position) = self.positions.get_mut(name) {
            position.1 = end;
        }
    }

    fn mark_named_filled(&mut self, option: &'a CommandOption) {
        if option.flag {
            self.filled_flags.insert(option.name.as_str());
        } else if let Some(slot) = self.metadata.positional_index(&option.name) {
            self.consume(slot);
        }
    }

    fn next_slot(&self) -> Option<usize> {
        self.consumed.iter().position(|consumed| !consumed)
    }

    fn remaining_slots(&self) -> usize {
        self.consumed.len() - self.consumed_count
    }

    fn at_last_slot(&self) -> bool {
        self.remaining_slots() <= 1
    }

    fn consume(&mut self, slot: usize) {
        if !self.consumed[slot] {
            self.consumed[slot] = true;
            self.consumed_count += 1;
        }
    }

    fn all_consumed(&self) -> bool {
        self.consumed_count + self.filled_flags.len() >= self.metadata.option_count()
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        if start >= end {
            return "";
        }
        self.content.get(start..end).unwrap_or("")
    }

    fn char_at(&self, pos: usize) -> Option<char> {
        self.content.get(pos..)?.chars().next()
    }

    fn char_before(&self, pos: usize) -> Option<char> {
        self.content.get(..pos)?.chars().next_back()
    }
}
