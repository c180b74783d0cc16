use crate::ast::{Expr, InfixOp, PrefixOp, Separator};
use crate::error::{EvalError, ParseError};
use crate::options::SyntaxOptions;
use crate::parser::Parser;
use crate::variables::Variables;
use indexmap::IndexMap;

/// Parsed attribute text of one directive.
///
/// The text is read as whitespace-separated terms, each either
/// `name = value` or a bare value. The same parse doubles as a boolean
/// condition over a [`Variables`] environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attrs {
    source: String,
    expr: Option<Expr>,
}

impl Attrs {
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let source = text.trim().to_string();
        if source.is_empty() {
            return Ok(Self::default());
        }

        let options = SyntaxOptions::attributes();
        let mut parser = Parser::new(&source, &options);
        let expr = parser.parse_sequence()?;
        parser.expect_end()?;

        Ok(Self {
            expr: Some(expr),
            source,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_empty(&self) -> bool {
        self.expr.is_none()
    }

    pub fn expr(&self) -> Option<&Expr> {
        self.expr.as_ref()
    }

    fn items(&self) -> &[Expr] {
        match &self.expr {
            None => &[],
            Some(Expr::Sequence {
                terms,
                separator: Separator::Whitespace,
            }) => terms,
            Some(expr) => std::slice::from_ref(expr),
        }
    }

    /// Explicit `name=value` terms by name; bare terms take the default
    /// names in order, skipping names an explicit term already filled.
    /// Bare terms beyond the defaults are dropped.
    pub fn to_named_map(&self, defaults: &[&str]) -> IndexMap<String, String> {
        let mut named = IndexMap::new();
        let mut bare = Vec::new();

        for item in self.items() {
            match item {
                Expr::Binary {
                    left,
                    op: InfixOp::Eq | InfixOp::EqEq,
                    right,
                } if matches!(**left, Expr::Identifier(_)) => {
                    named.insert(left.to_string(), plain_text(right));
                }
                other => bare.push(plain_text(other)),
            }
        }

        let free: Vec<&str> = defaults
            .iter()
            .copied()
            .filter(|name| !named.contains_key(*name))
            .collect();
        for (name, value) in free.into_iter().zip(bare) {
            named.insert(name.to_string(), value);
        }
        named
    }

    /// Value of an explicit `name=value` term.
    pub fn get(&self, name: &str) -> Option<String> {
        self.to_named_map(&[]).shift_remove(name)
    }

    /// Evaluates the attributes as a condition. Empty attributes are true.
    pub fn eval(&self, vars: &Variables) -> Result<bool, EvalError> {
        match &self.expr {
            None => Ok(true),
            Some(expr) => truthy(expr, vars),
        }
    }
}

fn plain_text(expr: &Expr) -> String {
    match expr {
        Expr::Identifier(text) | Expr::Numeric(text) | Expr::Literal { text, .. } => text.clone(),
        other => other.to_string(),
    }
}

fn unsupported(expr: &Expr) -> EvalError {
    EvalError::UnsupportedCondition {
        expr: expr.to_string(),
    }
}

/// Text an operand stands for: variables resolve through the environment
/// (missing means empty), everything else is its own text.
fn value_of(expr: &Expr, vars: &Variables) -> Result<String, EvalError> {
    match expr {
        Expr::Identifier(name) if name.starts_with('$') => {
            Ok(vars.get(name).unwrap_or_default().to_string())
        }
        Expr::Identifier(text) | Expr::Numeric(text) | Expr::Literal { text, .. } => Ok(text.clone()),
        Expr::Grouped { inner, .. } => value_of(inner, vars),
        other => Err(unsupported(other)),
    }
}

fn truthy(expr: &Expr, vars: &Variables) -> Result<bool, EvalError> {
    match expr {
        Expr::Sequence {
            terms,
            separator: Separator::Whitespace,
        } => {
            let mut all = true;
            for term in terms {
                all &= truthy(term, vars)?;
            }
            Ok(all)
        }
        Expr::Identifier(_) | Expr::Numeric(_) | Expr::Literal { .. } => {
            Ok(value_of(expr, vars)?.eq_ignore_ascii_case("true"))
        }
        Expr::Prefix {
            op: PrefixOp::Not,
            operand,
        } => Ok(!truthy(operand, vars)?),
        Expr::Grouped { inner, .. } => truthy(inner, vars),
        Expr::Binary { left, op, right } => {
            eval_chain(expr, left, std::slice::from_ref(&(*op, (**right).clone())), vars)
        }
        Expr::Chain { first, rest } => eval_chain(expr, first, rest, vars),
        Expr::Sequence { .. } | Expr::Prefix { .. } | Expr::Postfix { .. } => Err(unsupported(expr)),
    }
}

/// Weighs a flat operator chain: comparisons first, then `&&`, then `||`.
fn eval_chain(
    whole: &Expr,
    first: &Expr,
    rest: &[(InfixOp, Expr)],
    vars: &Variables,
) -> Result<bool, EvalError> {
    let mut any = false;
    let mut all = true;
    let mut left = first;
    let mut comparison: Option<(InfixOp, &Expr)> = None;

    for (op, operand) in rest {
        match op {
            InfixOp::And | InfixOp::Or => {
                all &= clause(left, comparison, vars)?;
                if *op == InfixOp::Or {
                    any |= all;
                    all = true;
                }
                left = operand;
                comparison = None;
            }
            InfixOp::Eq | InfixOp::EqEq | InfixOp::Ne if comparison.is_none() => {
                comparison = Some((*op, operand));
            }
            _ => return Err(unsupported(whole)),
        }
    }

    all &= clause(left, comparison, vars)?;
    Ok(any || all)
}

fn clause(left: &Expr, comparison: Option<(InfixOp, &Expr)>, vars: &Variables) -> Result<bool, EvalError> {
    match comparison {
        None => truthy(left, vars),
        Some((op, right)) => {
            let equal = value_of(left, vars)? == value_of(right, vars)?;
            Ok(if op == InfixOp::Ne { !equal } else { equal })
        }
    }
}
