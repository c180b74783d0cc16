use markgen::{
    lex, parse_expression, parse_terms, Attrs, Block, CommentMarking, CompileError, CompiledTemplate,
    Directive, DirectiveType, Expr, InfixOp, Marking, Modifier, ParseError, Parser, PostfixOp,
    Predefined, Separator, SyntaxOptions, Variables,
};

// ── Expression layer ──

#[test]
fn lexer_is_total_on_odd_input() {
    let input = "\"''\" ]]((`x`))  <=>=!! ¿ñ? 12ab $ _";
    let joined: String = lex(input).iter().map(|l| l.text()).collect();
    assert_eq!(joined, input);
}

#[test]
fn adjacent_identical_quotes_never_merge() {
    let lexems = lex("\"\"``''");
    assert_eq!(lexems.len(), 6);
    assert!(lexems.iter().all(|l| l.text().len() == 1));
}

#[test]
fn postfix_leaves_second_operator_unconsumed() {
    let options = SyntaxOptions::default();
    let mut parser = Parser::new("a++ ++", &options);
    let operand = parser.parse_operand().unwrap();
    assert_eq!(operand, Expr::postfix(Expr::ident("a"), PostfixOp::Plus2));
    assert_eq!(parser.peek(), Some("++"));
    assert!(!parser.is_at_end());
}

#[test]
fn chains_keep_source_order() {
    let options = SyntaxOptions::default();
    let Expr::Chain { first, rest } = parse_expression("a + b * a", &options).unwrap() else {
        panic!("expected a chain");
    };
    assert_eq!(*first, Expr::ident("a"));
    assert_eq!(
        rest,
        vec![(InfixOp::Plus, Expr::ident("b")), (InfixOp::Mult, Expr::ident("a"))]
    );
}

#[test]
fn separator_consistency() {
    let options = SyntaxOptions::default();
    assert!(matches!(
        parse_terms("a.b,c", &options),
        Err(ParseError::InconsistentSeparator { .. })
    ));
    let mut parser = Parser::new("a.b.c", &options);
    let Expr::Sequence { terms, separator } = parser.parse_sequence().unwrap() else {
        panic!("expected a sequence");
    };
    assert_eq!(separator, Separator::Dot);
    assert_eq!(terms.len(), 3);
}

#[test]
fn colon_sequence_inside_curly_brackets() {
    let options = SyntaxOptions::default();
    let terms = parse_terms("{k:v} x", &options).unwrap();
    assert_eq!(terms.len(), 2);
    assert_eq!(terms[0].to_string(), "{k:v}");
}

#[test]
fn literal_spans_other_quotes_and_brackets() {
    let options = SyntaxOptions::default();
    let expr = parse_expression("`(\"'])`", &options).unwrap();
    assert_eq!(expr.to_string(), "`(\"'])`");
}

// ── Attributes and variables ──

#[test]
fn attribute_conditions_compare_substituted_values() {
    let vars = Variables::of([("$foo", "1"), ("$bar", "2")]);
    assert!(Attrs::parse("$foo=1 $bar=2").unwrap().eval(&vars).unwrap());

    let vars = Variables::of([("$foo", "1"), ("$bar", "5")]);
    assert!(!Attrs::parse("$foo=1 $bar=2").unwrap().eval(&vars).unwrap());
}

#[test]
fn undefined_variable_is_falsy_not_an_error() {
    let attrs = Attrs::parse("$nowhere").unwrap();
    assert!(!attrs.eval(&Variables::new()).unwrap());
    let attrs = Attrs::parse("$nowhere = ''").unwrap();
    assert!(attrs.eval(&Variables::new()).unwrap());
}

#[test]
fn named_map_skips_explicitly_filled_defaults() {
    let attrs = Attrs::parse("first file='x.txt' second").unwrap();
    let map = attrs.to_named_map(&["file", "mode"]);
    assert_eq!(map.get("file").map(String::as_str), Some("x.txt"));
    assert_eq!(map.get("mode").map(String::as_str), Some("first"));
    assert_eq!(map.len(), 2);
}

#[test]
fn interpolation_without_keys_is_identity() {
    let text = "no $placeholders$ here";
    assert_eq!(Variables::new().interpolate(text).unwrap(), text);
}

// ── Marking ──

#[test]
fn quoted_equals_does_not_close_directive() {
    let marking = CommentMarking::new();
    let line = "/*= foo bar='=' =*/";
    let position = marking.extract(line).unwrap();
    assert_eq!(position.end, line.len());
    assert_eq!(position.directive.name, "foo");
    assert_eq!(position.directive.attrs, "bar='='");
}

#[test]
fn compose_then_extract_is_identity() {
    let marking = CommentMarking::new();
    for kind in DirectiveType::ALL.iter().copied() {
        for modifier in [Modifier::None, Modifier::Start, Modifier::End] {
            let directive = Directive::named("gen", kind)
                .with_modifier(modifier)
                .with_attrs("$a = 'x y'");
            let text = marking.compose(&directive);
            assert_eq!(marking.extract(&text).unwrap().directive, directive, "{text}");
        }
    }
}

// ── Compiler ──

fn compile(lines: &[&str]) -> Result<CompiledTemplate, CompileError> {
    CompiledTemplate::compile(lines.iter().copied(), &CommentMarking::new())
}

#[test]
fn start_end_pair_becomes_one_block() {
    let template = compile(&["/*= foo-start =*/", "foo", "/*= foo-end =*/"]).unwrap();
    assert_eq!(template.blocks().len(), 1);
    let block = &template.blocks()[0];
    assert_eq!(block.directive().unwrap().directive().name, "foo");
    assert_eq!(block.children(), &[Block::Literal(vec!["foo".to_string()])]);
}

#[test]
fn if_else_end_become_two_siblings() {
    let template = compile(&["/*= if =*/", "foo", "/*= else =*/", "bar", "/*= end =*/"]).unwrap();
    let kinds: Vec<Predefined> = template
        .blocks()
        .iter()
        .map(|b| b.directive().unwrap().directive().predefined)
        .collect();
    assert_eq!(kinds, vec![Predefined::If, Predefined::Else]);
    assert_eq!(template.blocks()[0].children()[0].lines().unwrap(), ["foo"]);
    assert_eq!(template.blocks()[1].children()[0].lines().unwrap(), ["bar"]);
}

#[test]
fn unknown_names_are_generic_blocks() {
    let template = compile(&["/*= whatever x=1 =*/", "body", "/*= end =*/"]).unwrap();
    let directive = template.blocks()[0].directive().unwrap();
    assert_eq!(directive.directive().name, "whatever");
    assert_eq!(directive.attrs().get("x").as_deref(), Some("1"));
}

#[test]
fn unbalanced_nesting_names_the_line() {
    let err = compile(&["a", "b", "/*= foo-end =*/"]).unwrap_err();
    assert_eq!(err.line(), 3);
    assert!(err.to_string().contains("foo-end"));

    let err = compile(&["/*= outer-start =*/", "/*= inner-start =*/", "/*= end =*/"]).unwrap_err();
    assert_eq!(
        err,
        CompileError::Unclosed {
            line: 1,
            directive: "outer-start".to_string(),
        }
    );
}

#[test]
fn end_of_template_stops_directive_processing() {
    let template = compile(&["/*= end-of-template =*/", "/*= end =*/"]).unwrap();
    assert_eq!(template.blocks().len(), 1);
    assert_eq!(template.blocks()[0].children()[0].lines().unwrap(), ["/*= end =*/"]);
}
