//! Comment-delimited directive syntax.
//!
//! ```text
//! /*= name attrs =*/    block directive
//! //= name attrs =//    inline directive
//! /*~ name attrs ~*/    block comment
//! //~ name attrs ~//    inline comment
//! ```
//!
//! Single-quoted attribute values may contain the closing delimiter.

use crate::directive::{Directive, DirectivePosition, DirectiveType, Marking};
use log::trace;
use regex::Regex;
use std::collections::HashMap;

/// Compiled matchers keyed by their pattern text.
///
/// Owned by a marking instance (or handed to one), so differently
/// configured markings never share state.
#[derive(Debug, Clone, Default)]
pub struct PatternCache {
    patterns: HashMap<String, Regex>,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the matcher for `pattern`, compiling it on first use.
    pub fn compile(&mut self, pattern: &str) -> Result<&Regex, regex::Error> {
        if !self.patterns.contains_key(pattern) {
            let regex = Regex::new(pattern)?;
            self.patterns.insert(pattern.to_string(), regex);
        }
        Ok(&self.patterns[pattern])
    }

    pub fn get(&self, pattern: &str) -> Option<&Regex> {
        self.patterns.get(pattern)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Delimiters of the comment marking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkingSyntax {
    pub block_open: String,
    pub block_close: String,
    pub inline_open: String,
    pub inline_close: String,
    pub directive_sigil: char,
    pub comment_sigil: char,
}

impl Default for MarkingSyntax {
    fn default() -> Self {
        Self {
            block_open: "/*".to_string(),
            block_close: "*/".to_string(),
            inline_open: "//".to_string(),
            inline_close: "//".to_string(),
            directive_sigil: '=',
            comment_sigil: '~',
        }
    }
}

impl MarkingSyntax {
    fn delimiters(&self, kind: DirectiveType) -> (&str, char, &str) {
        match kind {
            DirectiveType::Block => (self.block_open.as_str(), self.directive_sigil, self.block_close.as_str()),
            DirectiveType::Inline => (self.inline_open.as_str(), self.directive_sigil, self.inline_close.as_str()),
            DirectiveType::CommentBlock => (self.block_open.as_str(), self.comment_sigil, self.block_close.as_str()),
            DirectiveType::CommentInline => {
                (self.inline_open.as_str(), self.comment_sigil, self.inline_close.as_str())
            }
        }
    }

    /// Pattern text for one directive type. The quote-aware body consumes
    /// single-quoted runs whole, so a delimiter inside quotes never ends the
    /// match; the plain body stops at the first closing delimiter.
    fn pattern(&self, kind: DirectiveType, quote_aware: bool) -> String {
        let (open, sigil, close) = self.delimiters(kind);
        let sigil = regex::escape(&sigil.to_string());
        let body = if quote_aware { "(?:'[^']*'|[^'])*?" } else { ".*?" };
        format!(
            r"{open}{sigil}\s*(?P<body>{body})\s*{sigil}{close}",
            open = regex::escape(open),
            close = regex::escape(close),
        )
    }
}

#[derive(Debug, Clone)]
pub struct CommentMarking {
    syntax: MarkingSyntax,
    cache: PatternCache,
    patterns: Vec<(DirectiveType, String)>,
    // Used when no quote-aware pattern matches, e.g. for an apostrophe in
    // comment text or an unterminated attribute quote.
    fallbacks: Vec<(DirectiveType, String)>,
}

impl Default for CommentMarking {
    fn default() -> Self {
        Self::new()
    }
}

impl CommentMarking {
    pub fn new() -> Self {
        Self::with_syntax(MarkingSyntax::default())
    }

    pub fn with_syntax(syntax: MarkingSyntax) -> Self {
        Self::with_cache(syntax, PatternCache::new())
    }

    /// Builds a marking on top of an existing cache; patterns already in it
    /// are reused.
    pub fn with_cache(syntax: MarkingSyntax, mut cache: PatternCache) -> Self {
        let build = |quote_aware: bool| -> Vec<(DirectiveType, String)> {
            DirectiveType::ALL
                .iter()
                .map(|kind| (*kind, syntax.pattern(*kind, quote_aware)))
                .collect()
        };
        let patterns = build(true);
        let fallbacks = build(false);
        for (_, pattern) in patterns.iter().chain(&fallbacks) {
            // Every part of the pattern is escaped or constant.
            cache.compile(pattern).expect("marking pattern is valid");
        }
        Self {
            syntax,
            cache,
            patterns,
            fallbacks,
        }
    }

    pub fn syntax(&self) -> &MarkingSyntax {
        &self.syntax
    }

    pub fn cache(&self) -> &PatternCache {
        &self.cache
    }

    fn earliest(&self, patterns: &[(DirectiveType, String)], line: &str) -> Option<DirectivePosition> {
        patterns
            .iter()
            .filter_map(|(kind, pattern)| {
                let regex = self.cache.get(pattern)?;
                self.first_in(*kind, regex, line)
            })
            .min_by_key(|position| position.start)
    }

    fn first_in(&self, kind: DirectiveType, regex: &Regex, line: &str) -> Option<DirectivePosition> {
        regex.captures_iter(line).find_map(|caps| {
            let whole = caps.get(0)?;
            let body = caps.name("body")?.as_str().trim();
            let (key, attrs) = body.split_once(char::is_whitespace).unwrap_or((body, ""));
            let directive = Directive::parse(key, attrs, kind)?;
            Some(DirectivePosition {
                start: whole.start(),
                end: whole.end(),
                directive,
            })
        })
    }
}

impl Marking for CommentMarking {
    fn compose(&self, directive: &Directive) -> String {
        let (open, sigil, close) = self.syntax.delimiters(directive.kind);
        format!("{open}{sigil} {directive} {sigil}{close}")
    }

    fn extract(&self, line: &str) -> Option<DirectivePosition> {
        let found = self
            .earliest(&self.patterns, line)
            .or_else(|| self.earliest(&self.fallbacks, line));
        if let Some(position) = &found {
            trace!(
                "found `{}` at {}..{} in {line:?}",
                position.directive,
                position.start,
                position.end
            );
        }
        found
    }
}
