use std::fmt;
use std::hash::{Hash, Hasher};

/// A contiguous span of the lexed input.
///
/// Lexems compare and hash by their text only; the offset is carried along
/// for error reporting.
#[derive(Debug, Clone, Copy)]
pub struct Lexem<'a> {
    text: &'a str,
    offset: usize,
}

impl<'a> Lexem<'a> {
    pub fn new(text: &'a str, offset: usize) -> Self {
        Self { text, offset }
    }

    /// End-of-input sentinel; the only lexem with empty text.
    pub fn terminal(offset: usize) -> Self {
        Self { text: "", offset }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_terminal(&self) -> bool {
        self.text.is_empty()
    }

    fn first(&self) -> Option<char> {
        self.text.chars().next()
    }

    pub fn is_identifier(&self) -> bool {
        self.first()
            .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
    }

    pub fn is_numeric(&self) -> bool {
        self.first().is_some_and(|c| c.is_ascii_digit())
    }

    pub fn is_whitespace(&self) -> bool {
        self.first().is_some_and(is_space)
    }

    /// The quote character, if this lexem is one.
    pub fn quote(&self) -> Option<char> {
        self.first().filter(|c| is_quote(*c))
    }

    pub fn bracket(&self) -> Option<char> {
        self.first().filter(|c| is_bracket(*c))
    }

    pub fn is_punctuation(&self) -> bool {
        self.first().is_some_and(|c| class_of(c) == CharClass::Punct)
    }
}

impl PartialEq for Lexem<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for Lexem<'_> {}

impl Hash for Lexem<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

impl fmt::Display for Lexem<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_terminal() {
            f.write_str("<end>")
        } else {
            f.write_str(self.text)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Quote,
    Bracket,
    Word,
    Space,
    Punct,
}

fn is_quote(c: char) -> bool {
    matches!(c, '\'' | '`' | '"')
}

fn is_bracket(c: char) -> bool {
    matches!(c, '(' | ')' | '[' | ']' | '{' | '}')
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

fn class_of(c: char) -> CharClass {
    if is_quote(c) {
        CharClass::Quote
    } else if is_bracket(c) {
        CharClass::Bracket
    } else if is_word(c) {
        CharClass::Word
    } else if is_space(c) {
        CharClass::Space
    } else {
        CharClass::Punct
    }
}

/// Splits text into lexems. Never fails: every character lands in exactly
/// one lexem and the lexems, concatenated, give back the input.
#[derive(Clone)]
pub struct Lexer<'a> {
    input: &'a str,
    cursor: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, cursor: 0 }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.cursor..]
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Lexem<'a>;

    fn next(&mut self) -> Option<Lexem<'a>> {
        let rest = self.remaining();
        let first = rest.chars().next()?;
        let class = class_of(first);

        let len = match class {
            // Quotes and brackets never merge, even with an identical neighbour.
            CharClass::Quote | CharClass::Bracket => first.len_utf8(),
            _ => rest
                .char_indices()
                .find(|(_, c)| class_of(*c) != class)
                .map_or(rest.len(), |(i, _)| i),
        };

        let lexem = Lexem::new(&rest[..len], self.cursor);
        self.cursor += len;
        Some(lexem)
    }
}

pub fn lex(input: &str) -> Vec<Lexem<'_>> {
    Lexer::new(input).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(input: &str) -> Vec<&str> {
        lex(input).iter().map(|l| l.text()).collect()
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(lex("").is_empty());
    }

    #[test]
    fn splits_by_character_class() {
        assert_eq!(texts("$foo=1 $bar"), vec!["$foo", "=", "1", " ", "$bar"]);
        assert_eq!(texts("a++ ++"), vec!["a", "++", " ", "++"]);
        assert_eq!(texts("x\t\r\n y"), vec!["x", "\t\r\n ", "y"]);
    }

    #[test]
    fn punctuation_runs_merge_regardless_of_kind() {
        assert_eq!(texts("a+-*/b"), vec!["a", "+-*/", "b"]);
    }

    #[test]
    fn quotes_and_brackets_stay_isolated() {
        assert_eq!(texts("''"), vec!["'", "'"]);
        assert_eq!(texts("((a))"), vec!["(", "(", "a", ")", ")"]);
        assert_eq!(texts("\"`'"), vec!["\"", "`", "'"]);
        assert_eq!(texts("!(x)"), vec!["!", "(", "x", ")"]);
    }

    #[test]
    fn concatenation_reproduces_input() {
        for input in [
            "",
            "if $type$ = byte",
            "  foo bar='=' ((x)) 'it''s' 0xabcd_efff ~~ ünï",
            "a.b,c:d\t\n",
        ] {
            let joined: String = lex(input).iter().map(|l| l.text()).collect();
            assert_eq!(joined, input);
        }
    }

    #[test]
    fn offsets_point_into_input() {
        let input = "ab  ==c";
        for lexem in lex(input) {
            assert_eq!(&input[lexem.offset()..lexem.offset() + lexem.text().len()], lexem.text());
        }
    }

    #[test]
    fn classification() {
        assert!(Lexem::new("$a_b0", 0).is_identifier());
        assert!(!Lexem::new("0", 0).is_identifier());
        assert!(Lexem::new("0xabcd_efff", 0).is_numeric());
        assert!(!Lexem::new("foo", 0).is_numeric());
        assert!(Lexem::new("_x", 0).is_identifier());
        assert!(Lexem::terminal(3).is_terminal());
        assert!(!Lexem::terminal(3).is_identifier());
    }

    #[test]
    fn equality_is_by_text() {
        assert_eq!(Lexem::new("x", 0), Lexem::new("x", 7));
        assert_ne!(Lexem::new("x", 0), Lexem::new("y", 0));
    }
}
