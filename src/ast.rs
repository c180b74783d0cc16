use std::fmt;

macro_rules! op_table {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal,)+ }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }

            /// Exact-text lookup in the fixed table.
            pub fn from_text(text: &str) -> Option<Self> {
                match text {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

op_table! {
    /// Operators allowed between two operands.
    InfixOp {
        Eq => "=",
        EqEq => "==",
        Ne => "!=",
        Lt => "<",
        Gt => ">",
        Le => "<=",
        Ge => ">=",
        Plus => "+",
        Minus => "-",
        Mult => "*",
        Div => "/",
        Rem => "%",
        And => "&&",
        Or => "||",
        BitAnd => "&",
        BitOr => "|",
        Xor => "^",
        Shl => "<<",
        Shr => ">>",
    }
}

op_table! {
    PrefixOp {
        Not => "!",
        Minus => "-",
        Plus => "+",
        Tilde => "~",
        Plus2 => "++",
        Minus2 => "--",
        Star => "*",
        Amp => "&",
    }
}

op_table! {
    PostfixOp {
        Plus2 => "++",
        Minus2 => "--",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BracketKind {
    Paren,  // ( )
    Square, // [ ]
    Curly,  // { }
}

impl BracketKind {
    pub const ALL: &'static [BracketKind] =
        &[BracketKind::Paren, BracketKind::Square, BracketKind::Curly];

    pub fn open(self) -> char {
        match self {
            BracketKind::Paren => '(',
            BracketKind::Square => '[',
            BracketKind::Curly => '{',
        }
    }

    pub fn close(self) -> char {
        match self {
            BracketKind::Paren => ')',
            BracketKind::Square => ']',
            BracketKind::Curly => '}',
        }
    }

    pub fn from_open(c: char) -> Option<Self> {
        Self::ALL.iter().copied().find(|b| b.open() == c)
    }

    pub fn from_close(c: char) -> Option<Self> {
        Self::ALL.iter().copied().find(|b| b.close() == c)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuoteKind {
    Single, // '
    Back,   // `
    Double, // "
}

impl QuoteKind {
    pub fn as_char(self) -> char {
        match self {
            QuoteKind::Single => '\'',
            QuoteKind::Back => '`',
            QuoteKind::Double => '"',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '\'' => Some(QuoteKind::Single),
            '`' => Some(QuoteKind::Back),
            '"' => Some(QuoteKind::Double),
            _ => None,
        }
    }
}

/// What sits between the terms of a [`Expr::Sequence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Separator {
    Dot,
    Comma,
    Colon,
    Whitespace,
}

impl Separator {
    pub fn from_text(text: &str) -> Option<Self> {
        match text {
            "." => Some(Separator::Dot),
            "," => Some(Separator::Comma),
            ":" => Some(Separator::Colon),
            _ => None,
        }
    }

    fn joiner(self) -> &'static str {
        match self {
            Separator::Dot => ".",
            Separator::Comma => ", ",
            Separator::Colon => ":",
            Separator::Whitespace => " ",
        }
    }
}

impl fmt::Display for Separator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Separator::Dot => f.write_str("`.`"),
            Separator::Comma => f.write_str("`,`"),
            Separator::Colon => f.write_str("`:`"),
            Separator::Whitespace => f.write_str("whitespace"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Identifier(String),
    Numeric(String),
    Literal {
        quote: QuoteKind,
        text: String,
    },
    Prefix {
        op: PrefixOp,
        operand: Box<Expr>,
    },
    Postfix {
        operand: Box<Expr>,
        op: PostfixOp,
    },
    Binary {
        left: Box<Expr>,
        op: InfixOp,
        right: Box<Expr>,
    },
    /// Two or more operator/operand pairs kept flat, in source order.
    Chain {
        first: Box<Expr>,
        rest: Vec<(InfixOp, Expr)>,
    },
    Grouped {
        bracket: BracketKind,
        inner: Box<Expr>,
    },
    Sequence {
        terms: Vec<Expr>,
        separator: Separator,
    },
}

impl Expr {
    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Identifier(name.into())
    }

    pub fn numeric(text: impl Into<String>) -> Self {
        Expr::Numeric(text.into())
    }

    pub fn literal(quote: QuoteKind, text: impl Into<String>) -> Self {
        Expr::Literal {
            quote,
            text: text.into(),
        }
    }

    pub fn prefix(op: PrefixOp, operand: Expr) -> Self {
        Expr::Prefix {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn postfix(operand: Expr, op: PostfixOp) -> Self {
        Expr::Postfix {
            operand: Box::new(operand),
            op,
        }
    }

    pub fn binary(left: Expr, op: InfixOp, right: Expr) -> Self {
        Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn grouped(bracket: BracketKind, inner: Expr) -> Self {
        Expr::Grouped {
            bracket,
            inner: Box::new(inner),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Identifier(s) | Expr::Numeric(s) => f.write_str(s),
            Expr::Literal { quote, text } => {
                let q = quote.as_char();
                write!(f, "{q}{text}{q}")
            }
            Expr::Prefix { op, operand } => write!(f, "{op}{operand}"),
            Expr::Postfix { operand, op } => write!(f, "{operand}{op}"),
            Expr::Binary { left, op, right } => write!(f, "{left} {op} {right}"),
            Expr::Chain { first, rest } => {
                write!(f, "{first}")?;
                for (op, operand) in rest {
                    write!(f, " {op} {operand}")?;
                }
                Ok(())
            }
            Expr::Grouped { bracket, inner } => {
                write!(f, "{}{inner}{}", bracket.open(), bracket.close())
            }
            Expr::Sequence { terms, separator } => {
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        f.write_str(separator.joiner())?;
                    }
                    write!(f, "{term}")?;
                }
                Ok(())
            }
        }
    }
}
