use crate::attrs::Attrs;
use crate::directive::{Directive, DirectiveType, Marking, Modifier, Predefined};
use crate::error::{CompileError, EvalError, ParseError};
use crate::variables::Variables;
use log::debug;
use std::mem;

/// A directive together with its parsed attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledDirective {
    directive: Directive,
    attrs: Attrs,
}

impl CompiledDirective {
    /// Comments keep free text, so their attributes are never parsed.
    pub fn new(directive: Directive) -> Result<Self, ParseError> {
        let attrs = if directive.kind.is_comment() {
            Attrs::default()
        } else {
            Attrs::parse(&directive.attrs)?
        };
        Ok(Self { directive, attrs })
    }

    pub fn directive(&self) -> &Directive {
        &self.directive
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    /// Empty attribute text is unconditionally true.
    pub fn eval_condition(&self, vars: &Variables) -> Result<bool, EvalError> {
        self.attrs.eval(vars)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Literal(Vec<String>),
    Directive {
        directive: CompiledDirective,
        children: Vec<Block>,
    },
}

impl Block {
    pub fn lines(&self) -> Option<&[String]> {
        match self {
            Block::Literal(lines) => Some(lines),
            Block::Directive { .. } => None,
        }
    }

    pub fn directive(&self) -> Option<&CompiledDirective> {
        match self {
            Block::Literal(_) => None,
            Block::Directive { directive, .. } => Some(directive),
        }
    }

    pub fn children(&self) -> &[Block] {
        match self {
            Block::Literal(_) => &[],
            Block::Directive { children, .. } => children,
        }
    }
}

/// Root list of blocks produced by [`TemplateCompiler`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledTemplate {
    blocks: Vec<Block>,
}

impl CompiledTemplate {
    pub fn compile<I, S, M>(lines: I, marking: &M) -> Result<Self, CompileError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        M: Marking + ?Sized,
    {
        TemplateCompiler::new(marking).compile(lines)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

struct Scope {
    directive: CompiledDirective,
    line: usize,
    children: Vec<Block>,
}

/// Accumulates blocks while the compiler walks the lines.
#[derive(Default)]
struct Builder {
    root: Vec<Block>,
    stack: Vec<Scope>,
    pending: Vec<String>,
}

impl Builder {
    fn children_mut(&mut self) -> &mut Vec<Block> {
        match self.stack.last_mut() {
            Some(scope) => &mut scope.children,
            None => &mut self.root,
        }
    }

    /// Part of a line around an occurrence; blank parts are dropped. Each
    /// kept part becomes a line of its own, so `x = //= placeholder =//;`
    /// yields the lines `x = ` and `;`.
    fn fragment(&mut self, text: &str) {
        if !text.trim().is_empty() {
            self.pending.push(text.to_string());
        }
    }

    fn push(&mut self, block: Block) {
        let children = self.children_mut();
        match block {
            Block::Literal(lines) => match children.last_mut() {
                Some(Block::Literal(previous)) => previous.extend(lines),
                _ => children.push(Block::Literal(lines)),
            },
            block => children.push(block),
        }
    }

    fn flush(&mut self) {
        if !self.pending.is_empty() {
            let lines = mem::take(&mut self.pending);
            self.push(Block::Literal(lines));
        }
    }

    fn leaf(&mut self, directive: CompiledDirective, children: Vec<Block>) {
        self.flush();
        self.push(Block::Directive { directive, children });
    }

    fn open(&mut self, directive: CompiledDirective, line: usize) {
        self.flush();
        debug!("line {line}: open `{}`", directive.directive());
        self.stack.push(Scope {
            directive,
            line,
            children: Vec::new(),
        });
    }

    /// Finalizes the innermost scope and returns its directive.
    fn close(&mut self, closing: &Directive, line: usize) -> Result<Directive, CompileError> {
        self.flush();
        let scope = self.stack.pop().ok_or_else(|| CompileError::UnbalancedEnd {
            line,
            directive: closing.to_string(),
        })?;
        debug!(
            "line {line}: `{closing}` closes `{}` opened on line {}",
            scope.directive.directive(),
            scope.line
        );
        let directive = scope.directive.directive().clone();
        self.push(Block::Directive {
            directive: scope.directive,
            children: scope.children,
        });
        Ok(directive)
    }

    fn finish(mut self) -> Result<CompiledTemplate, CompileError> {
        self.flush();
        if let Some(scope) = self.stack.pop() {
            return Err(CompileError::Unclosed {
                line: scope.line,
                directive: scope.directive.directive().to_string(),
            });
        }
        Ok(CompiledTemplate { blocks: self.root })
    }
}

enum Flow {
    Continue,
    EndOfTemplate(Directive),
}

/// Turns marked-up lines into a [`CompiledTemplate`].
pub struct TemplateCompiler<'m, M: Marking + ?Sized> {
    marking: &'m M,
}

impl<'m, M: Marking + ?Sized> TemplateCompiler<'m, M> {
    pub fn new(marking: &'m M) -> Self {
        Self { marking }
    }

    pub fn compile<I, S>(&self, lines: I) -> Result<CompiledTemplate, CompileError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = Builder::default();
        let mut lines = lines.into_iter().enumerate();

        while let Some((index, line)) = lines.next() {
            let number = index + 1;
            let mut rest = line.as_ref();
            let mut marked = false;

            loop {
                let Some(position) = self.marking.extract(rest) else {
                    if marked {
                        builder.fragment(rest);
                    } else {
                        builder.pending.push(rest.to_string());
                    }
                    break;
                };
                marked = true;
                builder.fragment(&rest[..position.start]);
                let after = &rest[position.end..];

                match dispatch(&mut builder, position.directive, number)? {
                    Flow::Continue => rest = after,
                    Flow::EndOfTemplate(directive) => {
                        debug!("line {number}: end of template");
                        let mut captured = Vec::new();
                        if !after.trim().is_empty() {
                            captured.push(after.to_string());
                        }
                        captured.extend(lines.by_ref().map(|(_, l)| l.as_ref().to_string()));

                        let children = if captured.is_empty() {
                            Vec::new()
                        } else {
                            vec![Block::Literal(captured)]
                        };
                        builder.leaf(compile_directive(directive, number)?, children);
                        return builder.finish();
                    }
                }
            }
        }

        builder.finish()
    }
}

fn compile_directive(directive: Directive, line: usize) -> Result<CompiledDirective, CompileError> {
    CompiledDirective::new(directive).map_err(|source| CompileError::Attrs { line, source })
}

fn is_leaf(directive: &Directive) -> bool {
    directive.kind.is_comment()
        || directive.predefined.is_leaf()
        || (directive.predefined == Predefined::None && directive.kind == DirectiveType::Inline)
}

fn dispatch(builder: &mut Builder, directive: Directive, line: usize) -> Result<Flow, CompileError> {
    if directive.kind.is_comment() {
        builder.leaf(compile_directive(directive, line)?, Vec::new());
        return Ok(Flow::Continue);
    }

    match (directive.predefined, directive.modifier) {
        (Predefined::Else, Modifier::None) => {
            let closed = builder.close(&directive, line)?;
            // The else branch remembers the condition it is the alternative to.
            let alternative = Directive {
                attrs: closed.attrs,
                ..directive
            };
            builder.open(compile_directive(alternative, line)?, line);
        }
        (Predefined::EndOfTemplate, Modifier::None) => return Ok(Flow::EndOfTemplate(directive)),
        (_, Modifier::End) => {
            builder.close(&directive, line)?;
        }
        (_, Modifier::Start) => builder.open(compile_directive(directive, line)?, line),
        _ if is_leaf(&directive) => builder.leaf(compile_directive(directive, line)?, Vec::new()),
        _ => builder.open(compile_directive(directive, line)?, line),
    }
    Ok(Flow::Continue)
}
