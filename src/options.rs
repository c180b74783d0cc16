use crate::ast::{BracketKind, InfixOp, PostfixOp, PrefixOp};
use std::collections::HashSet;
use std::hash::Hash;

/// Allow-list or block-list over one kind of syntax element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter<T: Eq + Hash> {
    All,
    Allow(HashSet<T>),
    Deny(HashSet<T>),
}

impl<T: Eq + Hash> Default for Filter<T> {
    fn default() -> Self {
        Filter::All
    }
}

impl<T: Eq + Hash> Filter<T> {
    pub fn allow(items: impl IntoIterator<Item = T>) -> Self {
        Filter::Allow(items.into_iter().collect())
    }

    pub fn deny(items: impl IntoIterator<Item = T>) -> Self {
        Filter::Deny(items.into_iter().collect())
    }

    pub fn none() -> Self {
        Filter::Allow(HashSet::new())
    }

    pub fn permits(&self, item: &T) -> bool {
        match self {
            Filter::All => true,
            Filter::Allow(set) => set.contains(item),
            Filter::Deny(set) => !set.contains(item),
        }
    }
}

/// Which operators and brackets one parse accepts.
///
/// The default accepts everything in the operator tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyntaxOptions {
    pub infix: Filter<InfixOp>,
    pub prefix: Filter<PrefixOp>,
    pub postfix: Filter<PostfixOp>,
    pub brackets: Filter<BracketKind>,
}

impl SyntaxOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options used for directive attribute text: comparisons, boolean
    /// connectives, negation and round brackets.
    pub fn attributes() -> Self {
        Self {
            infix: Filter::allow([InfixOp::Eq, InfixOp::EqEq, InfixOp::Ne, InfixOp::And, InfixOp::Or]),
            prefix: Filter::allow([PrefixOp::Not]),
            postfix: Filter::none(),
            brackets: Filter::allow([BracketKind::Paren]),
        }
    }

    pub fn allow_infix(mut self, ops: impl IntoIterator<Item = InfixOp>) -> Self {
        self.infix = Filter::allow(ops);
        self
    }

    pub fn deny_infix(mut self, ops: impl IntoIterator<Item = InfixOp>) -> Self {
        self.infix = Filter::deny(ops);
        self
    }

    pub fn allow_prefix(mut self, ops: impl IntoIterator<Item = PrefixOp>) -> Self {
        self.prefix = Filter::allow(ops);
        self
    }

    pub fn deny_prefix(mut self, ops: impl IntoIterator<Item = PrefixOp>) -> Self {
        self.prefix = Filter::deny(ops);
        self
    }

    pub fn allow_postfix(mut self, ops: impl IntoIterator<Item = PostfixOp>) -> Self {
        self.postfix = Filter::allow(ops);
        self
    }

    pub fn deny_postfix(mut self, ops: impl IntoIterator<Item = PostfixOp>) -> Self {
        self.postfix = Filter::deny(ops);
        self
    }

    pub fn allow_brackets(mut self, kinds: impl IntoIterator<Item = BracketKind>) -> Self {
        self.brackets = Filter::allow(kinds);
        self
    }

    pub fn deny_brackets(mut self, kinds: impl IntoIterator<Item = BracketKind>) -> Self {
        self.brackets = Filter::deny(kinds);
        self
    }

    pub fn to_infix_op(&self, text: &str) -> Option<InfixOp> {
        InfixOp::from_text(text).filter(|op| self.infix.permits(op))
    }

    pub fn to_prefix_op(&self, text: &str) -> Option<PrefixOp> {
        PrefixOp::from_text(text).filter(|op| self.prefix.permits(op))
    }

    pub fn to_postfix_op(&self, text: &str) -> Option<PostfixOp> {
        PostfixOp::from_text(text).filter(|op| self.postfix.permits(op))
    }

    pub fn allows_bracket(&self, kind: BracketKind) -> bool {
        self.brackets.permits(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_allows_everything() {
        let options = SyntaxOptions::default();
        assert_eq!(options.to_infix_op("<<"), Some(InfixOp::Shl));
        assert_eq!(options.to_postfix_op("--"), Some(PostfixOp::Minus2));
        assert!(options.allows_bracket(BracketKind::Curly));
    }

    #[test]
    fn unknown_text_is_not_an_operator() {
        assert_eq!(SyntaxOptions::default().to_infix_op("=>"), None);
    }

    #[test]
    fn deny_list_blocks_mapping() {
        let options = SyntaxOptions::new().deny_infix([InfixOp::Mult]);
        assert_eq!(options.to_infix_op("*"), None);
        assert_eq!(options.to_infix_op("+"), Some(InfixOp::Plus));
    }

    #[test]
    fn attribute_preset() {
        let options = SyntaxOptions::attributes();
        assert_eq!(options.to_infix_op("="), Some(InfixOp::Eq));
        assert_eq!(options.to_infix_op("-"), None);
        assert_eq!(options.to_prefix_op("!"), Some(PrefixOp::Not));
        assert_eq!(options.to_postfix_op("++"), None);
        assert!(!options.allows_bracket(BracketKind::Square));
    }
}
