use crate::directive::Predefined;
use crate::error::RenderError;
use crate::template::{Block, CompiledDirective, CompiledTemplate};
use crate::variables::Variables;

/// Walks a compiled template and produces output lines.
///
/// `if` renders its children when its condition holds; an `else` directly
/// after it renders exactly when the `if` did not. `with` binds its named
/// attributes for its children. Removed blocks, placeholders, imports,
/// comments and everything after `end-of-template` produce nothing.
pub struct Renderer {
    // `with` blocks push a merged environment; the innermost wins.
    scopes: Vec<Variables>,
}

impl Renderer {
    pub fn new(vars: Variables) -> Self {
        Self { scopes: vec![vars] }
    }

    fn vars(&self) -> &Variables {
        // The base scope is never popped.
        &self.scopes[self.scopes.len() - 1]
    }

    pub fn render(&mut self, template: &CompiledTemplate) -> Result<Vec<String>, RenderError> {
        let mut output = Vec::new();
        self.render_blocks(template.blocks(), &mut output)?;
        Ok(output)
    }

    fn condition(&self, directive: &CompiledDirective) -> Result<bool, RenderError> {
        directive
            .eval_condition(self.vars())
            .map_err(|source| RenderError::Eval {
                directive: directive.directive().to_string(),
                source,
            })
    }

    fn render_blocks(&mut self, blocks: &[Block], output: &mut Vec<String>) -> Result<(), RenderError> {
        // Outcome of the `if` directly before the current block.
        let mut branch_taken: Option<bool> = None;

        for block in blocks {
            let previous = branch_taken.take();
            let (directive, children) = match block {
                Block::Literal(lines) => {
                    for line in lines {
                        let text = self.vars().interpolate(line)?;
                        if text.contains(['\n', '\r']) {
                            return Err(RenderError::EmbeddedLineBreak { line: text });
                        }
                        output.push(text);
                    }
                    continue;
                }
                Block::Directive { directive, children } => (directive, children),
            };

            if directive.directive().kind.is_comment() {
                continue;
            }

            match directive.directive().predefined {
                Predefined::If => {
                    let taken = self.condition(directive)?;
                    if taken {
                        self.render_blocks(children, output)?;
                    }
                    branch_taken = Some(taken);
                }
                Predefined::Else => {
                    let taken = match previous {
                        Some(if_taken) => !if_taken,
                        None => !self.condition(directive)?,
                    };
                    if taken {
                        self.render_blocks(children, output)?;
                    }
                }
                Predefined::With => {
                    let mut bound = Vec::new();
                    for (name, value) in directive.attrs().to_named_map(&[]) {
                        bound.push((name, self.vars().interpolate(&value)?));
                    }
                    let scope = self.vars().merge_and_overwrite_by(&Variables::of(bound));
                    self.scopes.push(scope);
                    let rendered = self.render_blocks(children, output);
                    self.scopes.pop();
                    rendered?;
                }
                Predefined::Remove
                | Predefined::Placeholder
                | Predefined::Import
                | Predefined::EndOfTemplate => {}
                Predefined::None => self.render_blocks(children, output)?,
            }
        }
        Ok(())
    }
}
