//! markgen: line-oriented source generation driven by directives embedded
//! in comments.
//!
//! A template is ordinary source text. Directives live in comments, so the
//! template itself stays compilable:
//!
//! ```text
//! /*= if $type$ = byte =*/
//! byte[] buffer;
//! /*= else =*/
//! $type$[] buffer;
//! /*= end =*/
//! ```
//!
//! Pipeline:
//! - [`lexer`] splits attribute text into [`Lexem`]s and [`parser`] builds an
//!   [`Expr`] tree from them (no precedence: operator chains stay flat).
//! - A [`Marking`] finds directive occurrences in a line; [`CommentMarking`]
//!   is the `/*= ... =*/` syntax.
//! - [`TemplateCompiler`] assembles literal and directive [`Block`]s into a
//!   [`CompiledTemplate`].
//! - [`Renderer`] walks the tree against a [`Variables`] environment.
//!
//! Everything is synchronous and works on in-memory text.

pub mod ast;
pub mod attrs;
pub mod directive;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod marking;
pub mod options;
pub mod parser;
pub mod template;
pub mod variables;

pub use ast::{BracketKind, Expr, InfixOp, PostfixOp, PrefixOp, QuoteKind, Separator};
pub use attrs::Attrs;
pub use directive::{Directive, DirectivePosition, DirectiveType, Marking, Modifier, Predefined};
pub use error::{CompileError, Error, EvalError, InterpolationError, ParseError, RenderError};
pub use eval::Renderer;
pub use lexer::{lex, Lexem, Lexer};
pub use marking::{CommentMarking, MarkingSyntax, PatternCache};
pub use options::{Filter, SyntaxOptions};
pub use parser::{parse_expression, parse_expressions, parse_term, parse_terms, Parser};
pub use template::{Block, CompiledDirective, CompiledTemplate, TemplateCompiler};
pub use variables::Variables;

/// Splits text into lines on `\n`, `\r\n` or a lone `\r`. A trailing
/// line break does not produce an extra empty line.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = text;

    while let Some(at) = rest.find(['\n', '\r']) {
        lines.push(&rest[..at]);
        let skip = if rest[at..].starts_with("\r\n") { 2 } else { 1 };
        rest = &rest[at + skip..];
    }
    if !rest.is_empty() {
        lines.push(rest);
    }
    lines
}

/// Compiles a whole template text.
pub fn compile_str<M: Marking + ?Sized>(text: &str, marking: &M) -> Result<CompiledTemplate, CompileError> {
    CompiledTemplate::compile(split_lines(text), marking)
}

/// Compiles `template` with the comment marking and renders it against
/// `vars`, joining the output lines with `\n`.
pub fn generate(template: &str, vars: &Variables) -> Result<String, Error> {
    let compiled = compile_str(template, &CommentMarking::new())?;
    let lines = Renderer::new(vars.clone()).render(&compiled)?;
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_lines_handles_all_breaks() {
        assert_eq!(split_lines("a\nb\r\nc\rd"), vec!["a", "b", "c", "d"]);
        assert_eq!(split_lines("a\n\nb\n"), vec!["a", "", "b"]);
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn generate_specializes_a_template() {
        let template = "/*= if $type$ = byte =*/\nbyte[] buffer;\n/*= else =*/\n$type$[] buffer;\n/*= end =*/\n";
        let vars = Variables::of([("type", "byte")]);
        assert_eq!(generate(template, &vars).unwrap(), "byte[] buffer;");
        let vars = Variables::of([("type", "long")]);
        assert_eq!(generate(template, &vars).unwrap(), "long[] buffer;");
    }

    #[test]
    fn comments_never_reach_the_output() {
        let out = generate("a\n/*~ don't edit ~*/\nb", &Variables::new()).unwrap();
        assert_eq!(out, "a\nb");
    }

    #[test]
    fn generate_reports_structure_errors() {
        let err = generate("/*= foo-start =*/\nx", &Variables::new()).unwrap_err();
        assert!(matches!(err, Error::Compile(CompileError::Unclosed { line: 1, .. })));
    }
}
