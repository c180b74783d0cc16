use std::fmt;

/// Directive kinds with fixed meaning to the compiler and renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Predefined {
    None,
    If,
    Else,
    Placeholder,
    Remove,
    Import,
    EndOfTemplate,
    With,
}

impl Predefined {
    const KEYWORDS: &'static [(&'static str, Predefined)] = &[
        ("if", Predefined::If),
        ("else", Predefined::Else),
        ("placeholder", Predefined::Placeholder),
        ("remove", Predefined::Remove),
        ("import", Predefined::Import),
        ("end-of-template", Predefined::EndOfTemplate),
        ("with", Predefined::With),
    ];

    /// Case-sensitive keyword lookup.
    pub fn from_keyword(key: &str) -> Option<Self> {
        Self::KEYWORDS
            .iter()
            .find(|(keyword, _)| *keyword == key)
            .map(|(_, kind)| *kind)
    }

    pub fn keyword(self) -> &'static str {
        Self::KEYWORDS
            .iter()
            .find(|(_, kind)| *kind == self)
            .map_or("", |(keyword, _)| *keyword)
    }

    /// Kinds that never hold children.
    pub fn is_leaf(self) -> bool {
        matches!(self, Predefined::Placeholder | Predefined::Remove | Predefined::Import)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    None,
    Start,
    End,
}

impl Modifier {
    fn suffix(self) -> &'static str {
        match self {
            Modifier::None => "",
            Modifier::Start => "start",
            Modifier::End => "end",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveType {
    Block,
    Inline,
    CommentBlock,
    CommentInline,
}

impl DirectiveType {
    pub const ALL: &'static [DirectiveType] = &[
        DirectiveType::Block,
        DirectiveType::Inline,
        DirectiveType::CommentBlock,
        DirectiveType::CommentInline,
    ];

    pub fn is_comment(self) -> bool {
        matches!(self, DirectiveType::CommentBlock | DirectiveType::CommentInline)
    }

    pub fn is_inline(self) -> bool {
        matches!(self, DirectiveType::Inline | DirectiveType::CommentInline)
    }
}

/// Parsed identity of one marking occurrence.
///
/// Predefined directives carry an empty `name`; the keyword is implied by
/// `predefined`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Directive {
    pub name: String,
    pub predefined: Predefined,
    pub modifier: Modifier,
    pub kind: DirectiveType,
    pub attrs: String,
}

impl Directive {
    pub fn named(name: impl Into<String>, kind: DirectiveType) -> Self {
        Self {
            name: name.into(),
            predefined: Predefined::None,
            modifier: Modifier::None,
            kind,
            attrs: String::new(),
        }
    }

    pub fn predefined(predefined: Predefined, kind: DirectiveType) -> Self {
        Self {
            name: String::new(),
            predefined,
            modifier: Modifier::None,
            kind,
            attrs: String::new(),
        }
    }

    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifier = modifier;
        self
    }

    pub fn with_attrs(mut self, attrs: impl Into<String>) -> Self {
        self.attrs = attrs.into();
        self
    }

    /// Builds a directive from the key token and the text after it.
    ///
    /// The key is first looked up as a predefined keyword; otherwise a
    /// `-start`/`-end` suffix becomes the modifier. A bare `start` or `end`
    /// has an empty name.
    pub fn parse(key: &str, attrs: &str, kind: DirectiveType) -> Option<Self> {
        if key.is_empty() {
            return None;
        }
        let attrs = attrs.trim().to_string();

        if let Some(predefined) = Predefined::from_keyword(key) {
            return Some(Self::predefined(predefined, kind).with_attrs(attrs));
        }

        let (stem, modifier) = if key == "start" {
            ("", Modifier::Start)
        } else if key == "end" {
            ("", Modifier::End)
        } else if let Some(stem) = key.strip_suffix("-start") {
            (stem, Modifier::Start)
        } else if let Some(stem) = key.strip_suffix("-end") {
            (stem, Modifier::End)
        } else {
            (key, Modifier::None)
        };

        let directive = match Predefined::from_keyword(stem) {
            Some(predefined) if modifier != Modifier::None => Self::predefined(predefined, kind),
            _ => Self::named(stem, kind),
        };
        Some(directive.with_modifier(modifier).with_attrs(attrs))
    }

    /// Key token as it appears in source, e.g. `foo-start` or `if`.
    pub fn key(&self) -> String {
        let stem = match self.predefined {
            Predefined::None => self.name.as_str(),
            predefined => predefined.keyword(),
        };
        match (stem.is_empty(), self.modifier) {
            (_, Modifier::None) => stem.to_string(),
            (true, modifier) => modifier.suffix().to_string(),
            (false, modifier) => format!("{stem}-{}", modifier.suffix()),
        }
    }

    /// A generic `end` (no name) closes whatever scope is innermost.
    pub fn is_generic_end(&self) -> bool {
        self.modifier == Modifier::End && self.name.is_empty() && self.predefined == Predefined::None
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())?;
        if !self.attrs.is_empty() {
            write!(f, " {}", self.attrs)?;
        }
        Ok(())
    }
}

/// Where an occurrence sits in its line. Offsets are byte offsets and
/// include the marking punctuation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectivePosition {
    pub start: usize,
    pub end: usize,
    pub directive: Directive,
}

/// A concrete textual syntax for embedding directives in source lines.
pub trait Marking {
    /// Canonical text of one directive.
    fn compose(&self, directive: &Directive) -> String;

    /// First well-formed occurrence in `line`, if any.
    fn extract(&self, line: &str) -> Option<DirectivePosition>;
}

impl<M: Marking + ?Sized> Marking for &M {
    fn compose(&self, directive: &Directive) -> String {
        (**self).compose(directive)
    }

    fn extract(&self, line: &str) -> Option<DirectivePosition> {
        (**self).extract(line)
    }
}
